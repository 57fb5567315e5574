use crate::{
    errors::PromptError,
    providers::db::storage::PrescriptionStore,
    types::{NewPrescription, Prescription},
};
use async_trait::async_trait;
use chrono::Utc;
use std::fmt::{self, Debug};
use tracing::{debug, info};
use turso::{params, Database, Row, Value as TursoValue};

pub mod sql;

/// A provider for interacting with a local SQLite database using Turso.
///
/// This provider holds a `Database` instance, which manages a connection pool.
/// When cloned, it shares the same underlying database, allowing for concurrent and
/// shared access to the same database file or in-memory instance.
#[derive(Clone)]
pub struct SqliteProvider {
    /// The Turso database instance. It's cloneable and thread-safe.
    pub db: Database,
}

impl SqliteProvider {
    /// Creates a new `SqliteProvider` from a file path or in-memory.
    ///
    /// # Arguments
    ///
    /// * `db_path`: The path to the SQLite database file. Use ":memory:" for a unique,
    ///   isolated in-memory database. To share an in-memory database across multiple
    ///   `SqliteProvider` instances (e.g., in tests), create one provider and
    ///   then `.clone()` it.
    pub async fn new(db_path: &str) -> Result<Self, PromptError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;
        // Use `query` for PRAGMA statements that return a value to avoid "unexpected row" errors.
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        Ok(Self { db })
    }

    /// Wraps an already opened database.
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    /// Ensures that all required application tables and indexes exist.
    /// This function is idempotent and safe to call on every application startup.
    pub async fn initialize_schema(&self) -> Result<(), PromptError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        for statement in sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ())
                .await
                .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Debug for SqliteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteProvider").finish_non_exhaustive()
    }
}

impl AsRef<Database> for SqliteProvider {
    fn as_ref(&self) -> &Database {
        &self.db
    }
}

fn text_column(row: &Row, index: usize) -> Result<String, PromptError> {
    match row.get_value(index)? {
        TursoValue::Text(s) => Ok(s),
        TursoValue::Null => Ok(String::new()),
        other => Err(PromptError::StorageOperationFailed(format!(
            "Expected TEXT in column {index}, found {other:?}"
        ))),
    }
}

/// Maps a `SELECT id, user_email, file_path, extracted_text, created_at` row.
fn row_to_prescription(row: &Row) -> Result<Prescription, PromptError> {
    Ok(Prescription {
        id: text_column(row, 0)?,
        user_email: text_column(row, 1)?,
        file_path: text_column(row, 2)?,
        extracted_text: text_column(row, 3)?,
        created_at: text_column(row, 4)?,
    })
}

#[async_trait]
impl PrescriptionStore for SqliteProvider {
    fn name(&self) -> &str {
        "SQLite"
    }

    async fn insert_prescription(
        &self,
        prescription: NewPrescription,
    ) -> Result<Prescription, PromptError> {
        let record = prescription.into_record(Utc::now());
        let conn = self
            .db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        conn.execute(
            sql::INSERT_PRESCRIPTION,
            params![
                record.id.as_str(),
                record.user_email.as_str(),
                record.file_path.as_str(),
                record.extracted_text.as_str(),
                record.created_at.as_str()
            ],
        )
        .await?;

        info!(id = %record.id, user = %record.user_email, "Stored prescription record.");
        Ok(record)
    }

    async fn get_prescription(&self, id: &str) -> Result<Option<Prescription>, PromptError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        let mut rows = conn.query(sql::SELECT_PRESCRIPTION_BY_ID, params![id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_prescription(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_prescriptions(
        &self,
        user_email: &str,
    ) -> Result<Vec<Prescription>, PromptError> {
        debug!(user = %user_email, "Listing prescriptions.");
        let conn = self
            .db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        let mut rows = conn
            .query(sql::SELECT_PRESCRIPTIONS_BY_USER, params![user_email])
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_prescription(&row)?);
        }
        Ok(records)
    }
}
