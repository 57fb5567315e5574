//! # SQLite Specific SQL Queries
//!
//! This module centralizes SQL query strings for the SQLite provider.
//! This makes the core logic cleaner and isolates database-specific syntax.

pub const CREATE_PRESCRIPTIONS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS prescriptions (
        id TEXT PRIMARY KEY,
        user_email TEXT NOT NULL,
        file_path TEXT NOT NULL,
        extracted_text TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
";

pub const CREATE_PRESCRIPTIONS_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_prescriptions_user_email ON prescriptions (user_email);";

/// Every statement needed to bring a fresh database up to the current schema.
pub const ALL_TABLE_CREATION_SQL: &[&str] =
    &[CREATE_PRESCRIPTIONS_TABLE, CREATE_PRESCRIPTIONS_USER_INDEX];

pub const INSERT_PRESCRIPTION: &str = "INSERT INTO prescriptions (id, user_email, file_path, extracted_text, created_at) VALUES (?, ?, ?, ?, ?)";

pub const SELECT_PRESCRIPTION_BY_ID: &str = "SELECT id, user_email, file_path, extracted_text, created_at FROM prescriptions WHERE id = ?";

pub const SELECT_PRESCRIPTIONS_BY_USER: &str = "SELECT id, user_email, file_path, extracted_text, created_at FROM prescriptions WHERE user_email = ? ORDER BY created_at DESC";
