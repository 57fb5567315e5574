use crate::{
    errors::PromptError,
    types::{NewPrescription, Prescription},
};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A trait for the document store that holds prescription records.
///
/// Records are only ever created and read; the store offers no update or delete.
#[async_trait]
pub trait PrescriptionStore: Send + Sync + DynClone + Debug {
    /// Returns the name of the storage provider (e.g., "SQLite").
    fn name(&self) -> &str;

    /// Persists a new record and returns it with its assigned id and timestamp.
    async fn insert_prescription(
        &self,
        prescription: NewPrescription,
    ) -> Result<Prescription, PromptError>;

    /// Fetches a single record by id.
    async fn get_prescription(&self, id: &str) -> Result<Option<Prescription>, PromptError>;

    /// Lists all records of a user, newest first.
    async fn list_prescriptions(&self, user_email: &str)
        -> Result<Vec<Prescription>, PromptError>;
}

dyn_clone::clone_trait_object!(PrescriptionStore);
