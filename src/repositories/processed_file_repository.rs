// src/repositories/processed_file_repository.rs
//
// Processed-file ledger
//
// The durable idempotency record: one row per successfully materialized file
// group, keyed by Shoko's file ID. A row exists if and only if the whole
// destination group was materialized; the add/update run filters against
// this set, the cleanup run diffs it against the live catalog.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// One persisted (source file ID → destination path) mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedRecord {
    pub shoko_file_id: i64,
    pub destination_path: PathBuf,
    pub created_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------
// Repository contract
// ---------------------------------------------------------------------
pub trait ProcessedFileRepository {
    /// All file IDs with a recorded mapping.
    fn processed_ids(&self) -> AppResult<HashSet<i64>>;

    /// Insert a new mapping. A duplicate ID violates the primary key and is
    /// surfaced as an error, never a silent success.
    fn record(&self, shoko_file_id: i64, destination_path: &str) -> AppResult<()>;

    /// All recorded mappings whose ID is absent from `current_ids`.
    fn stale_entries(&self, current_ids: &HashSet<i64>) -> AppResult<Vec<ProcessedRecord>>;

    /// Delete the mapping for one file ID.
    fn remove(&self, shoko_file_id: i64) -> AppResult<()>;
}

// ---------------------------------------------------------------------
// SQLite implementation
// ---------------------------------------------------------------------
pub struct SqliteProcessedFileRepository {
    conn: Connection,
}

impl SqliteProcessedFileRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Create the ledger table if it does not exist. Idempotent.
    pub fn initialize(&self) -> AppResult<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS processed_files (
                    shoko_file_id INTEGER PRIMARY KEY,
                    destination_path TEXT NOT NULL,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )",
            )
            .map_err(AppError::Database)?;
        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<ProcessedRecord> {
        let shoko_file_id: i64 = row.get(0)?;
        let destination_path: String = row.get(1)?;
        let created_at_str: Option<String> = row.get(2)?;

        let created_at = match created_at_str {
            Some(s) => {
                // SQLite's CURRENT_TIMESTAMP writes "YYYY-MM-DD HH:MM:SS" (UTC)
                let parsed = DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .or_else(|_| {
                        chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                            .map(|naive| naive.and_utc())
                    })
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            2,
                            rusqlite::types::Type::Text,
                            Box::new(std::io::Error::new(
                                std::io::ErrorKind::InvalidData,
                                format!("Invalid created_at timestamp '{}': {}", s, e),
                            )),
                        )
                    })?;
                Some(parsed)
            }
            None => None,
        };

        Ok(ProcessedRecord {
            shoko_file_id,
            destination_path: PathBuf::from(destination_path),
            created_at,
        })
    }
}

impl ProcessedFileRepository for SqliteProcessedFileRepository {
    fn processed_ids(&self) -> AppResult<HashSet<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT shoko_file_id FROM processed_files")?;

        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(ids)
    }

    fn record(&self, shoko_file_id: i64, destination_path: &str) -> AppResult<()> {
        self.conn.execute(
            "INSERT INTO processed_files (shoko_file_id, destination_path) VALUES (?1, ?2)",
            rusqlite::params![shoko_file_id, destination_path],
        )?;
        Ok(())
    }

    fn stale_entries(&self, current_ids: &HashSet<i64>) -> AppResult<Vec<ProcessedRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT shoko_file_id, destination_path, created_at FROM processed_files",
        )?;

        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records
            .into_iter()
            .filter(|r| !current_ids.contains(&r.shoko_file_id))
            .collect())
    }

    fn remove(&self, shoko_file_id: i64) -> AppResult<()> {
        self.conn.execute(
            "DELETE FROM processed_files WHERE shoko_file_id = ?1",
            rusqlite::params![shoko_file_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_connection;

    fn test_repository() -> SqliteProcessedFileRepository {
        let repo = SqliteProcessedFileRepository::new(create_test_connection().unwrap());
        repo.initialize().unwrap();
        repo
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let repo = test_repository();
        repo.initialize().unwrap();
        assert!(repo.processed_ids().unwrap().is_empty());
    }

    #[test]
    fn test_record_and_processed_ids() {
        let repo = test_repository();

        repo.record(101, "/library/Show (2023)/Season 01/ep.mkv").unwrap();
        repo.record(102, "/library/Show (2023)/Season 01/ep2.mkv").unwrap();

        let ids = repo.processed_ids().unwrap();
        assert_eq!(ids, HashSet::from([101, 102]));
    }

    #[test]
    fn test_duplicate_record_is_an_error() {
        let repo = test_repository();

        repo.record(101, "/library/a.mkv").unwrap();
        let result = repo.record(101, "/library/b.mkv");

        assert!(result.is_err(), "primary-key violation must surface");

        // The original mapping is untouched
        let stale = repo.stale_entries(&HashSet::new()).unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].destination_path, PathBuf::from("/library/a.mkv"));
    }

    #[test]
    fn test_stale_detection() {
        let repo = test_repository();
        repo.record(101, "/lib/a.mkv").unwrap();
        repo.record(102, "/lib/b.mkv").unwrap();
        repo.record(103, "/lib/c.mkv").unwrap();

        let live = HashSet::from([101, 103, 104]);
        let stale = repo.stale_entries(&live).unwrap();

        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].shoko_file_id, 102);
        assert_eq!(stale[0].destination_path, PathBuf::from("/lib/b.mkv"));

        repo.remove(102).unwrap();
        assert_eq!(repo.processed_ids().unwrap(), HashSet::from([101, 103]));
    }

    #[test]
    fn test_created_at_is_populated() {
        let repo = test_repository();
        repo.record(7, "/lib/x.mkv").unwrap();

        let records = repo.stale_entries(&HashSet::new()).unwrap();
        assert!(records[0].created_at.is_some());
    }

    #[test]
    fn test_remove_missing_id_is_noop() {
        let repo = test_repository();
        repo.remove(999).unwrap();
    }
}
