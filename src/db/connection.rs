// src/db/connection.rs
//
// Database connection management
//
// PRINCIPLES:
// - One explicit connection; the process is strictly sequential
// - No hidden connection creation
// - Clear error propagation

use rusqlite::Connection;
use std::path::Path;

use crate::error::{AppError, AppResult};

/// Open the ledger database, creating parent directories as needed.
///
/// Connection configuration:
/// - Foreign keys enabled
/// - Busy timeout set to avoid immediate errors if another run overlaps
pub fn open_connection(db_path: &Path) -> AppResult<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(AppError::Io)?;
        }
    }

    let conn = Connection::open(db_path).map_err(AppError::Database)?;

    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )
    .map_err(AppError::Database)?;

    Ok(conn)
}

/// Create a standalone in-memory connection (for testing).
pub fn create_test_connection() -> AppResult<Connection> {
    let conn = Connection::open_in_memory().map_err(AppError::Database)?;

    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(AppError::Database)?;

    Ok(conn)
}
