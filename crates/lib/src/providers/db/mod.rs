pub mod sqlite;
pub mod storage;

pub use sqlite::SqliteProvider;
pub use storage::PrescriptionStore;
