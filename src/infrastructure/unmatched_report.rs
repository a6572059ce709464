// src/infrastructure/unmatched_report.rs
//
// Unmatched items report
//
// The durable, human-readable record of everything an add/update run could
// not resolve. Constructed in main and passed down; overwritten on every
// run so it always reflects the latest state.

use log::info;
use std::path::Path;

use crate::error::{AppError, AppResult};

#[derive(Debug, Default)]
pub struct UnmatchedReport {
    entries: Vec<String>,
}

impl UnmatchedReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for a file whose name is known.
    pub fn push_file(&mut self, filename: &str, file_id: i64, reason: &str) {
        self.entries
            .push(format!("File: '{}' | ID: {} | Reason: {}", filename, file_id, reason));
    }

    /// Entry for a file whose name could not be determined.
    pub fn push_id(&mut self, file_id: i64, reason: &str) {
        self.entries
            .push(format!("File ID: {} | Reason: {}", file_id, reason));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Overwrite the report file with the collected entries.
    pub fn write_to(&self, path: &Path) -> AppResult<()> {
        info!(
            "Writing {} unmatched items to report file: {}",
            self.entries.len(),
            path.display()
        );

        let mut contents = String::from("--- Unmatched Items Report ---\n");
        for line in &self.entries {
            contents.push_str(line);
            contents.push('\n');
        }

        std::fs::write(path, contents).map_err(AppError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_formats() {
        let mut report = UnmatchedReport::new();
        report.push_file("ep 01.mkv", 42, "No TMDb link.");
        report.push_id(43, "Failed to fetch file details from Shoko.");

        assert_eq!(report.len(), 2);
        assert_eq!(
            report.entries[0],
            "File: 'ep 01.mkv' | ID: 42 | Reason: No TMDb link."
        );
        assert_eq!(
            report.entries[1],
            "File ID: 43 | Reason: Failed to fetch file details from Shoko."
        );
    }

    #[test]
    fn test_write_overwrites_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        std::fs::write(&path, "stale contents from an earlier run").unwrap();

        let mut report = UnmatchedReport::new();
        report.push_id(7, "reason");
        report.write_to(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "--- Unmatched Items Report ---\nFile ID: 7 | Reason: reason\n"
        );
    }
}
