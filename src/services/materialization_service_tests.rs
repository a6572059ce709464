// src/services/materialization_service_tests.rs
//
// Materialization Service Tests
//
// Real-filesystem tests over tempdirs: group discovery, every link type,
// idempotent skips, transactional rollback, dry-run inertness, stale-group
// removal and empty-directory pruning.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::{LinkType, PathMapping};
use crate::services::materialization_service::MaterializationService;

// ============================================================================
// TEST HELPERS
// ============================================================================

struct Fixture {
    _root: TempDir,
    source_dir: PathBuf,
    dest_dir: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let source_dir = root.path().join("source/Some Show");
        let dest_dir = root.path().join("library/Some Show (2023)/Season 01");
        fs::create_dir_all(&source_dir).unwrap();

        Self {
            _root: root,
            source_dir,
            dest_dir,
        }
    }

    fn add_source_file(&self, name: &str) -> PathBuf {
        let path = self.source_dir.join(name);
        fs::write(&path, format!("contents of {}", name)).unwrap();
        path
    }

    fn dest(&self, name: &str) -> PathBuf {
        self.dest_dir.join(name)
    }
}

fn materializer(link_type: LinkType, dry_run: bool) -> MaterializationService {
    MaterializationService::new(link_type, false, Vec::new(), dry_run)
}

// ============================================================================
// GROUP MATERIALIZATION
// ============================================================================

#[test]
fn test_symlink_group_with_sidecars() {
    let fx = Fixture::new();
    let source = fx.add_source_file("ep.mkv");
    fx.add_source_file("ep.eng.srt");
    fx.add_source_file("ep.jpn.ass");
    fx.add_source_file("unrelated.mkv");

    let mut service = materializer(LinkType::Symlink, false);
    let dest = fx.dest("S (2023) - S01E01 - Ep.mkv");
    assert!(service.materialize_group(&source, &dest));

    // Primary plus both sidecars, extension swapped onto the new basename
    assert!(dest.symlink_metadata().is_ok());
    assert!(fx.dest("S (2023) - S01E01 - Ep.eng.srt").symlink_metadata().is_ok());
    assert!(fx.dest("S (2023) - S01E01 - Ep.jpn.ass").symlink_metadata().is_ok());
    assert!(fx.dest("unrelated.mkv").symlink_metadata().is_err());

    // Default symlink target is the absolute source path
    let target = fs::read_link(&dest).unwrap();
    assert_eq!(target, source);
}

#[test]
fn test_copy_group_copies_contents() {
    let fx = Fixture::new();
    let source = fx.add_source_file("movie.mkv");

    let mut service = materializer(LinkType::Copy, false);
    let dest = fx.dest("Movie (2024).mkv");
    assert!(service.materialize_group(&source, &dest));

    assert_eq!(fs::read_to_string(&dest).unwrap(), "contents of movie.mkv");
    assert!(source.exists(), "copy must leave the source in place");
}

#[test]
fn test_hardlink_group_shares_inode() {
    let fx = Fixture::new();
    let source = fx.add_source_file("ep.mkv");

    let mut service = materializer(LinkType::Hardlink, false);
    let dest = fx.dest("Ep.mkv");
    assert!(service.materialize_group(&source, &dest));

    fs::write(&source, "rewritten").unwrap();
    assert_eq!(fs::read_to_string(&dest).unwrap(), "rewritten");
}

#[test]
fn test_move_group_removes_source() {
    let fx = Fixture::new();
    let source = fx.add_source_file("ep.mkv");

    let mut service = materializer(LinkType::Move, false);
    let dest = fx.dest("Ep.mkv");
    assert!(service.materialize_group(&source, &dest));

    assert!(!source.exists());
    assert_eq!(fs::read_to_string(&dest).unwrap(), "contents of ep.mkv");
}

#[test]
fn test_existing_destination_is_skipped_as_success() {
    let fx = Fixture::new();
    let source = fx.add_source_file("ep.mkv");

    fs::create_dir_all(&fx.dest_dir).unwrap();
    let dest = fx.dest("Ep.mkv");
    fs::write(&dest, "already materialized").unwrap();

    let mut service = materializer(LinkType::Copy, false);
    assert!(service.materialize_group(&source, &dest));

    // The existing file is untouched
    assert_eq!(fs::read_to_string(&dest).unwrap(), "already materialized");
}

#[test]
fn test_rollback_removes_earlier_group_members() {
    let fx = Fixture::new();
    let source = fx.add_source_file("ep.mkv");
    // A directory sharing the basename is discovered as a sidecar and makes
    // the copy of the second group member fail.
    fs::create_dir(fx.source_dir.join("ep.extras")).unwrap();

    let mut service = materializer(LinkType::Copy, false);
    let dest = fx.dest("Ep.mkv");
    assert!(!service.materialize_group(&source, &dest));

    // Atomicity: the already-created primary must be rolled back
    assert!(
        dest.symlink_metadata().is_err(),
        "primary destination must not survive a failed group"
    );
}

#[test]
fn test_dry_run_mutates_nothing_but_reports_success() {
    let fx = Fixture::new();
    let source = fx.add_source_file("ep.mkv");
    fx.add_source_file("ep.srt");

    let mut service = materializer(LinkType::Symlink, true);
    let dest = fx.dest("Ep.mkv");
    assert!(service.materialize_group(&source, &dest));

    assert!(!fx.dest_dir.exists(), "dry-run must not create directories");
}

#[test]
fn test_missing_source_directory_still_links_primary() {
    // Supplemental discovery degrades to an empty list when the source
    // cannot be scanned; the primary file is still processed on its own.
    let fx = Fixture::new();
    let source = fx.source_dir.join("ghost.mkv");

    let mut service = materializer(LinkType::Symlink, false);
    let dest = fx.dest("Ghost.mkv");

    // Symlinks may point at nothing; the group still succeeds.
    assert!(service.materialize_group(&source, &dest));
    assert!(dest.symlink_metadata().is_ok());
}

// ============================================================================
// SYMLINK TARGET RESOLUTION
// ============================================================================

#[test]
fn test_relative_symlink_target() {
    let fx = Fixture::new();
    let source = fx.add_source_file("ep.mkv");

    let mut service = MaterializationService::new(LinkType::Symlink, true, Vec::new(), false);
    let dest = fx.dest("Ep.mkv");
    assert!(service.materialize_group(&source, &dest));

    let target = fs::read_link(&dest).unwrap();
    assert!(
        target.starts_with("../"),
        "expected a relative target, got {}",
        target.display()
    );
    // The relative target resolves back to the source file
    assert_eq!(
        fs::canonicalize(fx.dest_dir.join(&target)).unwrap(),
        fs::canonicalize(&source).unwrap()
    );
}

#[test]
fn test_path_mapping_wins_over_relative_symlinks() {
    let fx = Fixture::new();
    let source = fx.add_source_file("ep.mkv");

    let mappings = vec![PathMapping {
        source_prefix: fx.source_dir.to_string_lossy().to_string(),
        target_prefix: "/media/visible".to_string(),
    }];
    let mut service = MaterializationService::new(LinkType::Symlink, true, mappings, false);

    let dest = fx.dest("Ep.mkv");
    assert!(service.materialize_group(&source, &dest));

    let target = fs::read_link(&dest).unwrap();
    assert_eq!(target, Path::new("/media/visible/ep.mkv"));
}

#[test]
fn test_non_matching_mapping_falls_through() {
    let fx = Fixture::new();
    let source = fx.add_source_file("ep.mkv");

    let mappings = vec![PathMapping {
        source_prefix: "/somewhere/else".to_string(),
        target_prefix: "/media/visible".to_string(),
    }];
    let mut service = MaterializationService::new(LinkType::Symlink, false, mappings, false);

    let dest = fx.dest("Ep.mkv");
    assert!(service.materialize_group(&source, &dest));
    assert_eq!(fs::read_link(&dest).unwrap(), source);
}

// ============================================================================
// CLEANUP
// ============================================================================

#[test]
fn test_remove_stale_group_deletes_basename_family() {
    let fx = Fixture::new();
    fs::create_dir_all(&fx.dest_dir).unwrap();
    fs::write(fx.dest("Ep.mkv"), "x").unwrap();
    fs::write(fx.dest("Ep.eng.srt"), "x").unwrap();
    fs::write(fx.dest("Other.mkv"), "x").unwrap();

    let service = materializer(LinkType::Symlink, false);
    service.remove_stale_group(&fx.dest("Ep.mkv"));

    assert!(!fx.dest("Ep.mkv").exists());
    assert!(!fx.dest("Ep.eng.srt").exists());
    assert!(fx.dest("Other.mkv").exists());
}

#[test]
fn test_remove_stale_group_dry_run_keeps_files() {
    let fx = Fixture::new();
    fs::create_dir_all(&fx.dest_dir).unwrap();
    fs::write(fx.dest("Ep.mkv"), "x").unwrap();

    let service = materializer(LinkType::Symlink, true);
    service.remove_stale_group(&fx.dest("Ep.mkv"));

    assert!(fx.dest("Ep.mkv").exists());
}

#[test]
fn test_prune_empty_dirs() {
    let root = tempfile::tempdir().unwrap();
    let keep = root.path().join("Show A (2020)/Season 01");
    let empty = root.path().join("Show B (2021)/Season 02");
    fs::create_dir_all(&keep).unwrap();
    fs::create_dir_all(&empty).unwrap();
    fs::write(keep.join("ep.mkv"), "x").unwrap();

    let service = materializer(LinkType::Symlink, false);
    service.prune_empty_dirs(root.path());

    assert!(keep.join("ep.mkv").exists());
    assert!(!empty.exists());
    assert!(
        !root.path().join("Show B (2021)").exists(),
        "parents emptied by pruning are pruned too"
    );
}

#[test]
fn test_prune_empty_dirs_dry_run_is_inert() {
    let root = tempfile::tempdir().unwrap();
    let empty = root.path().join("Empty Show");
    fs::create_dir_all(&empty).unwrap();

    let service = materializer(LinkType::Symlink, true);
    service.prune_empty_dirs(root.path());

    assert!(empty.exists());
}
