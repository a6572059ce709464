// src/services/materialization_service.rs
//
// Materialization Service
//
// Takes one resolved (source, destination) pair and makes it real on disk:
// discovers the sidecar files that must travel with the media file, then
// links/copies/moves the whole group as a single transaction.
//
// CRITICAL RULES:
// - A group succeeds only if every member succeeds
// - On any member failure, already-created destinations are rolled back
// - An existing destination is success, not failure (idempotent re-runs)
// - Dry-run performs no mutation but reports every operation as successful
// - Member failures are handled here; they never escalate past the group

use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use super::resolution_service::stem_of;
use crate::config::{LinkType, PathMapping};

pub struct MaterializationService {
    link_type: LinkType,
    use_relative_symlinks: bool,
    path_mappings: Vec<PathMapping>,
    dry_run: bool,

    /// Directory listings cached per run to bound repeated scans.
    dir_cache: HashMap<PathBuf, Vec<String>>,
}

impl MaterializationService {
    pub fn new(
        link_type: LinkType,
        use_relative_symlinks: bool,
        path_mappings: Vec<PathMapping>,
        dry_run: bool,
    ) -> Self {
        debug!(
            "MaterializationService initialized (Dry Run: {}, Link Type: {})",
            dry_run,
            link_type.as_str()
        );
        Self {
            link_type,
            use_relative_symlinks,
            path_mappings,
            dry_run,
            dir_cache: HashMap::new(),
        }
    }

    // ========================================================================
    // GROUP MATERIALIZATION
    // ========================================================================

    /// Materialize a media file and its sidecars as one atomic group.
    /// Returns true only if the entire group was processed successfully.
    pub fn materialize_group(&mut self, source: &Path, destination: &Path) -> bool {
        let mut files = vec![(source.to_path_buf(), destination.to_path_buf())];

        let dest_parent = destination.parent().map(Path::to_path_buf);
        let dest_stem = destination
            .file_name()
            .and_then(|n| n.to_str())
            .map(stem_of)
            .unwrap_or_default()
            .to_string();

        for (supp_source, supp_ext) in self.find_supplemental_files(source) {
            let supp_dest = match &dest_parent {
                Some(parent) => parent.join(format!("{}{}", dest_stem, supp_ext)),
                None => PathBuf::from(format!("{}{}", dest_stem, supp_ext)),
            };
            files.push((supp_source, supp_dest));
        }

        let mut linked: Vec<PathBuf> = Vec::new();
        for (src, dest) in &files {
            if self.link_single_file(src, dest) {
                if !self.dry_run {
                    linked.push(dest.clone());
                }
            } else {
                error!(
                    "  ! FAILED to process a file in the group for '{}'. Rolling back changes for this group.",
                    display_name(source)
                );
                if !self.dry_run {
                    self.roll_back(&linked);
                }
                return false;
            }
        }

        true
    }

    /// Sidecars: directory entries sharing the media file's basename.
    /// The captured extension is everything after the basename prefix and
    /// may contain several dots (e.g. `.eng.srt`).
    fn find_supplemental_files(&mut self, media_file_path: &Path) -> Vec<(PathBuf, String)> {
        if media_file_path.symlink_metadata().is_err() {
            return Vec::new();
        }

        let source_dir = match media_file_path.parent() {
            Some(dir) => dir.to_path_buf(),
            None => return Vec::new(),
        };
        let media_file_name = match media_file_path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => return Vec::new(),
        };
        let media_basename = stem_of(&media_file_name);

        if !self.dir_cache.contains_key(&source_dir) {
            debug!("  Caching directory contents for: {}", source_dir.display());
            let listing = match fs::read_dir(&source_dir) {
                Ok(entries) => entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| e.file_name().to_str().map(str::to_string))
                    .collect(),
                Err(e) => {
                    error!(
                        "  Could not scan for supplemental files in {}. Error: {}",
                        source_dir.display(),
                        e
                    );
                    Vec::new()
                }
            };
            self.dir_cache.insert(source_dir.clone(), listing);
        }

        let mut supplemental = Vec::new();
        if let Some(listing) = self.dir_cache.get(&source_dir) {
            for filename in listing {
                if filename.starts_with(media_basename) && filename != &media_file_name {
                    let supplemental_ext = filename[media_basename.len()..].to_string();
                    supplemental.push((source_dir.join(filename), supplemental_ext));
                }
            }
        }

        if !supplemental.is_empty() {
            info!(
                "  Found {} supplemental file(s) for '{}'.",
                supplemental.len(),
                display_name(media_file_path)
            );
        }
        supplemental
    }

    fn roll_back(&self, linked: &[PathBuf]) {
        for path in linked {
            if path.symlink_metadata().is_ok() {
                match fs::remove_file(path) {
                    Ok(()) => info!("    - ROLLED BACK (deleted): {}", display_name(path)),
                    Err(e) => error!(
                        "    - FAILED to roll back {}. Error: {}",
                        display_name(path),
                        e
                    ),
                }
            }
        }
    }

    // ========================================================================
    // SINGLE FILE OPERATIONS
    // ========================================================================

    fn link_single_file(&self, source: &Path, dest: &Path) -> bool {
        debug!("    Processing link for: '{}'", display_name(source));
        debug!("      Source: {}", source.display());
        debug!("      Destination: {}", dest.display());

        if dest.symlink_metadata().is_ok() {
            debug!(
                "    Destination already exists, skipping: {}",
                display_name(dest)
            );
            return true;
        }

        if self.dry_run {
            // Still compute the symlink target so the log shows what a real
            // run would point at.
            if self.link_type == LinkType::Symlink {
                self.symlink_target(source, dest);
            }
            info!(
                "    [DRY RUN] Would {} '{}' to '{}'",
                self.link_type.as_str(),
                display_name(source),
                display_name(dest)
            );
            return true;
        }

        let result = self.perform_link(source, dest);
        match result {
            Ok(()) => {
                info!(
                    "    + {}: {}",
                    self.link_type.as_str().to_uppercase(),
                    display_name(dest)
                );
                true
            }
            Err(e) => {
                error!(
                    "    - FAILED to {} '{}'. Error: {}",
                    self.link_type.as_str(),
                    display_name(source),
                    e
                );
                false
            }
        }
    }

    fn perform_link(&self, source: &Path, dest: &Path) -> std::io::Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        match self.link_type {
            LinkType::Copy => copy_preserving_times(source, dest),
            LinkType::Hardlink => fs::hard_link(source, dest),
            LinkType::Move => move_file(source, dest),
            LinkType::Symlink => {
                let target = self.symlink_target(source, dest);
                create_symlink(&target, dest)
            }
        }
    }

    /// Target precedence: configured path mapping, then relative path from
    /// the destination's parent, then the absolute source path.
    fn symlink_target(&self, source: &Path, dest: &Path) -> PathBuf {
        let source_str = source.to_string_lossy();

        for mapping in &self.path_mappings {
            if !mapping.source_prefix.is_empty() && source_str.starts_with(&mapping.source_prefix)
            {
                let mapped = format!(
                    "{}{}",
                    mapping.target_prefix,
                    &source_str[mapping.source_prefix.len()..]
                );
                debug!(
                    "      Applied path mapping: '{}' -> '{}'",
                    mapping.source_prefix, mapping.target_prefix
                );
                debug!("      Server-visible symlink target: {}", mapped);
                return PathBuf::from(mapped);
            }
        }

        if self.use_relative_symlinks {
            if let Some(parent) = dest.parent() {
                let relative = relative_path(source, parent);
                debug!("      Calculated relative symlink target.");
                debug!("      Server-visible symlink target: {}", relative.display());
                return relative;
            }
        }

        debug!("      Server-visible symlink target: {}", source.display());
        source.to_path_buf()
    }

    // ========================================================================
    // CLEANUP
    // ========================================================================

    /// Remove a stale destination file and every sidecar sharing its basename.
    pub fn remove_stale_group(&self, dest_path: &Path) {
        let dest_dir = match dest_path.parent() {
            Some(dir) => dir,
            None => return,
        };
        if !dest_dir.exists() {
            warn!(
                "  > Destination directory not found: {}. Nothing to remove.",
                dest_dir.display()
            );
            return;
        }

        let dest_basename = dest_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(stem_of)
            .unwrap_or_default()
            .to_string();

        let entries: Vec<String> = match fs::read_dir(dest_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().to_str().map(str::to_string))
                .filter(|name| name.starts_with(&dest_basename))
                .collect(),
            Err(e) => {
                error!("  > Could not list {}. Error: {}", dest_dir.display(), e);
                return;
            }
        };

        if entries.is_empty() {
            warn!("  > Link path not found for base '{}'.", dest_basename);
            return;
        }

        for filename in entries {
            let full_path = dest_dir.join(&filename);
            if self.dry_run {
                info!("  [DRY RUN] Would delete stale file: {}", full_path.display());
            } else {
                match fs::remove_file(&full_path) {
                    Ok(()) => info!("  > Link successfully removed: {}", filename),
                    Err(e) => error!(
                        "  > FAILED to remove stale file {}. Error: {}",
                        full_path.display(),
                        e
                    ),
                }
            }
        }
    }

    /// Remove empty directories under the given root, deepest first.
    pub fn prune_empty_dirs(&self, root_dir: &Path) {
        if self.dry_run {
            info!("[DRY RUN] Skipping cleanup of empty directories.");
            return;
        }

        info!("Cleaning up empty directories in destination...");
        for entry in walkdir::WalkDir::new(root_dir)
            .contents_first(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
        {
            let is_empty = fs::read_dir(entry.path())
                .map(|mut contents| contents.next().is_none())
                .unwrap_or(false);

            if is_empty {
                match fs::remove_dir(entry.path()) {
                    Ok(()) => debug!("  > Removed empty directory: {}", entry.path().display()),
                    Err(e) => error!(
                        "  > FAILED to remove empty directory {}. Error: {}",
                        entry.path().display(),
                        e
                    ),
                }
            }
        }
    }
}

// ============================================================================
// FILESYSTEM PRIMITIVES
// ============================================================================

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn copy_preserving_times(source: &Path, dest: &Path) -> std::io::Result<()> {
    fs::copy(source, dest)?;
    if let Ok(metadata) = fs::metadata(source) {
        let mtime = filetime::FileTime::from_last_modification_time(&metadata);
        let atime = filetime::FileTime::from_last_access_time(&metadata);
        // Timestamps are best-effort; the copy itself already succeeded.
        let _ = filetime::set_file_times(dest, atime, mtime);
    }
    Ok(())
}

fn move_file(source: &Path, dest: &Path) -> std::io::Result<()> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        // Rename fails across filesystems; fall back to copy-and-delete.
        Err(_) => {
            copy_preserving_times(source, dest)?;
            fs::remove_file(source)
        }
    }
}

#[cfg(unix)]
fn create_symlink(target: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, dest)
}

#[cfg(windows)]
fn create_symlink(target: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, dest)
}

/// Relative path from `base` to `target` (both absolute), `..`-stepping out
/// of the non-shared suffix of `base`.
fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target_components: Vec<Component> = target.components().collect();
    let base_components: Vec<Component> = base.components().collect();

    let mut shared = 0;
    while shared < target_components.len()
        && shared < base_components.len()
        && target_components[shared] == base_components[shared]
    {
        shared += 1;
    }

    let mut result = PathBuf::new();
    for _ in shared..base_components.len() {
        result.push("..");
    }
    for component in &target_components[shared..] {
        result.push(component.as_os_str());
    }

    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}
