// src/services/sync_service.rs
//
// Sync Service - Run Orchestration
//
// Drives the two workflows: add/update (diff the remote catalog against the
// ledger, resolve and materialize every new file) and cleanup (remove
// destination groups whose source file disappeared upstream).
//
// CRITICAL RULES:
// - Strictly sequential: one file is fully resolved, materialized and
//   recorded before the next begins
// - A per-file failure becomes a report entry and a skip, never an abort
// - The ledger is written only after the whole group materialized
// - Dry-run exercises the full pipeline but records nothing

use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::materialization_service::MaterializationService;
use super::resolution_service::{Resolution, ResolutionService};
use crate::error::AppResult;
use crate::infrastructure::UnmatchedReport;
use crate::integrations::shoko::SourceCatalog;
use crate::repositories::ProcessedFileRepository;

pub struct SyncService {
    source: Arc<dyn SourceCatalog>,
    resolution: ResolutionService,
    materializer: MaterializationService,
    state: Box<dyn ProcessedFileRepository>,
    source_root: PathBuf,
    destination_roots: Vec<PathBuf>,
    report_path: PathBuf,
    dry_run: bool,
}

impl SyncService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn SourceCatalog>,
        resolution: ResolutionService,
        materializer: MaterializationService,
        state: Box<dyn ProcessedFileRepository>,
        source_root: PathBuf,
        destination_roots: Vec<PathBuf>,
        report_path: PathBuf,
        dry_run: bool,
    ) -> Self {
        Self {
            source,
            resolution,
            materializer,
            state,
            source_root,
            destination_roots,
            report_path,
            dry_run,
        }
    }

    // ========================================================================
    // ADD/UPDATE
    // ========================================================================

    pub fn run_add_update(&mut self, report: &mut UnmatchedReport) -> AppResult<()> {
        info!("--- Starting ADD/UPDATE Run ---");
        if self.dry_run {
            warn!("DRY RUN MODE ENABLED: No changes will be made to the filesystem or database.");
        }

        let processed = self.state.processed_ids()?;
        let all_ids = self.source.list_all_file_ids();

        let to_process: Vec<i64> = all_ids
            .into_iter()
            .filter(|id| !processed.contains(id))
            .collect();
        info!("Found {} new files to process.", to_process.len());

        if to_process.is_empty() {
            info!("No new files to process. Library is up to date.");
            report.write_to(&self.report_path)?;
            return Ok(());
        }

        for file_id in to_process {
            // A single bad file must never abort the run.
            if let Err(e) = self.process_file(file_id, report) {
                error!(
                    "An unexpected error occurred processing file ID {}: {}",
                    file_id, e
                );
                report.push_id(file_id, &format!("Unexpected error - {}", e));
            }
        }

        report.write_to(&self.report_path)?;
        info!("--- Add/Update Run Finished ---");
        Ok(())
    }

    fn process_file(&mut self, file_id: i64, report: &mut UnmatchedReport) -> AppResult<()> {
        debug!("--- Processing File ID: {} ---", file_id);

        let file = match self.source.file_details(file_id) {
            Some(file) => file,
            None => {
                warn!("Could not get details for Shoko File ID {}. Skipping.", file_id);
                report.push_id(file_id, "Failed to fetch file details from Shoko.");
                return Ok(());
            }
        };

        let original_filename = match file.original_filename() {
            Some(name) => name.to_string(),
            None => {
                warn!("File ID {} has no recorded location. Skipping.", file_id);
                report.push_id(file_id, "File has no recorded location in Shoko.");
                return Ok(());
            }
        };
        debug!("  File: '{}'", original_filename);

        if file.series_cross_refs.is_empty() {
            let msg = "File is not linked to any series in Shoko. Skipping.";
            warn!("  {}", msg);
            report.push_file(&original_filename, file_id, msg);
            return Ok(());
        }

        let episode_id = match file.first_episode_id() {
            Some(id) => id,
            None => {
                let msg = "File is not linked to any episodes in Shoko. Skipping.";
                warn!("  {}", msg);
                report.push_file(&original_filename, file_id, msg);
                return Ok(());
            }
        };

        let episode = match self.source.episode_details(episode_id) {
            Some(episode) => episode,
            None => {
                let msg = "Could not fetch full episode details from Shoko. Skipping.";
                warn!("  {}", msg);
                report.push_file(&original_filename, file_id, msg);
                return Ok(());
            }
        };
        debug!(
            "  AniDB Type: '{:?}', Title: '{:?}'",
            episode.kind(),
            episode.name
        );

        let (folder, filename) = match self.resolution.resolve(&file, &episode) {
            Resolution::Resolved { folder, filename } => (folder, filename),
            Resolution::Unmatched { reason } => {
                warn!("  {}", reason);
                report.push_file(&original_filename, file_id, &reason);
                return Ok(());
            }
        };
        let destination = folder.join(&filename);

        // relative_path() is present: original_filename was derived from it.
        let relative = file.relative_path().unwrap_or_default();
        let source_path = self.source_root.join(normalize_relative_path(relative));

        if !self.materializer.materialize_group(&source_path, &destination) {
            report.push_file(
                &original_filename,
                file_id,
                "Failed to materialize the destination file group.",
            );
            return Ok(());
        }

        if !self.dry_run {
            info!(
                "  > Successfully processed group for '{}'. Recording in database.",
                original_filename
            );
            self.state.record(file_id, &destination.to_string_lossy())?;
        }

        Ok(())
    }

    // ========================================================================
    // CLEANUP
    // ========================================================================

    pub fn run_cleanup(&mut self) -> AppResult<()> {
        info!("--- Starting CLEANUP Run ---");
        if self.dry_run {
            warn!("DRY RUN MODE ENABLED: No files or database entries will be deleted.");
        }

        let current_ids: HashSet<i64> = self.source.list_all_file_ids().into_iter().collect();
        let stale = self.state.stale_entries(&current_ids)?;

        info!("Found {} stale entries to clean up.", stale.len());
        if stale.is_empty() {
            info!("No stale entries found.");
            return Ok(());
        }

        for entry in stale {
            info!(
                "Stale entry found for Shoko File ID: {} at '{}'",
                entry.shoko_file_id,
                entry.destination_path.display()
            );

            if self.dry_run {
                info!(
                    "  [DRY RUN] Would delete link and DB entry for Shoko File ID: {}",
                    entry.shoko_file_id
                );
                continue;
            }

            self.materializer.remove_stale_group(&entry.destination_path);
            match self.state.remove(entry.shoko_file_id) {
                Ok(()) => info!(
                    "  > Database entry for Shoko File ID {} processed for removal.",
                    entry.shoko_file_id
                ),
                Err(e) => error!("  > FAILED to remove DB entry. Error: {}", e),
            }
        }

        if !self.dry_run {
            let mut pruned: Vec<&Path> = Vec::new();
            for root in &self.destination_roots {
                if !pruned.contains(&root.as_path()) {
                    self.materializer.prune_empty_dirs(root);
                    pruned.push(root.as_path());
                }
            }
        }

        info!("--- Cleanup Run Finished ---");
        Ok(())
    }
}

/// Shoko reports paths with its own separators; rebuild them with this
/// platform's separator, dropping empty components.
fn normalize_relative_path(relative: &str) -> PathBuf {
    relative
        .replace('\\', "/")
        .split('/')
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod path_tests {
    use super::normalize_relative_path;
    use std::path::PathBuf;

    #[test]
    fn test_backslash_paths_are_normalized() {
        assert_eq!(
            normalize_relative_path("Some Show\\Season 1\\ep.mkv"),
            PathBuf::from("Some Show/Season 1/ep.mkv")
        );
    }

    #[test]
    fn test_forward_slash_paths_pass_through() {
        assert_eq!(
            normalize_relative_path("Show/ep.mkv"),
            PathBuf::from("Show/ep.mkv")
        );
    }
}
