// src/infrastructure/logging.rs
//
// Log sink setup
//
// Console plus a size-rotated log file (5 MiB, keep 5). Configured exactly
// once at startup; components only ever use the `log` facade macros.

use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};
use std::path::Path;

use crate::error::{AppError, AppResult};

const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
const KEPT_LOG_FILES: usize = 5;

/// Initialize logging. The returned handle must stay alive for the duration
/// of the process or buffered records are lost.
pub fn init_logging(log_dir: &Path, debug_mode: bool) -> AppResult<LoggerHandle> {
    std::fs::create_dir_all(log_dir).map_err(AppError::Io)?;

    let spec = if debug_mode { "debug" } else { "info" };

    let handle = Logger::try_with_str(spec)
        .map_err(|e| AppError::Config(format!("Invalid log specification: {}", e)))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename("shokolink")
                .suppress_timestamp(),
        )
        .rotate(
            Criterion::Size(MAX_LOG_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEPT_LOG_FILES),
        )
        .append()
        .duplicate_to_stderr(Duplicate::All)
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|e| AppError::Config(format!("Failed to initialize logging: {}", e)))?;

    log::info!("Logging initialized.");
    if debug_mode {
        log::debug!("Debug mode enabled.");
    }

    Ok(handle)
}
