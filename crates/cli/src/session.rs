//! # Local Session File
//!
//! Remembers who is signed in between invocations. The file holds a single JSON
//! object, `{"userEmail": "..."}`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};
use tracing::info;

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_email: String,
}

/// Reads the session file. A missing or unreadable file means nobody is signed in.
pub fn read_session(path: &Path) -> Result<Option<Session>> {
    if !path.exists() {
        info!("Session file {:?} not found.", path);
        return Ok(None);
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    match serde_json::from_reader::<_, Session>(reader) {
        Ok(session) if !session.user_email.trim().is_empty() => Ok(Some(session)),
        Ok(_) => Ok(None),
        Err(e) => {
            info!("Ignoring malformed session file {:?}: {}", path, e);
            Ok(None)
        }
    }
}

pub fn write_session(path: &Path, user_email: &str) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(
        writer,
        &Session {
            user_email: user_email.to_string(),
        },
    )?;
    info!("Stored session for '{}' in {:?}.", user_email, path);
    Ok(())
}

/// Removes the session file. Returns `false` when there was none.
pub fn clear_session(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path)?;
    info!("Removed session file {:?}.", path);
    Ok(true)
}
