//! End-to-end tests for gist to repository synchronization.
//!
//! These tests exercise the real `SyncEngine` with:
//! - Local Git repos with a bare "origin" for pushes
//! - Real filesystem writes through `RepoTree`
//! - In-memory source files standing in for a fetched gist
//!
//! No network I/O: files are handed to `SyncEngine::sync_files` directly.

use std::path::Path;

use tempfile::TempDir;

use gistsync_core::config::{CommitContext, SyncConfig};
use gistsync_core::errors::{MappingError, SyncError};
use gistsync_core::gist::GistClient;
use gistsync_core::git::GitClient;
use gistsync_core::models::SourceFile;
use gistsync_core::sync_engine::{SyncEngine, SyncOutcome};

// ===========================================================================
// Helpers
// ===========================================================================

struct Fixture {
    work: TempDir,
    origin: TempDir,
}

impl Fixture {
    fn path(&self) -> &Path {
        self.work.path()
    }

    fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path().join(rel)).unwrap()
    }

    fn write(&self, rel: &str, content: &str) {
        let full = self.path().join(rel);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }
}

/// A working repo with one commit on `main`, pushed to a bare origin.
fn setup_repo() -> Fixture {
    let work = tempfile::tempdir().unwrap();
    let origin = tempfile::tempdir().unwrap();
    git2::Repository::init_bare(origin.path()).expect("failed to init bare repo");

    let repo = git2::Repository::init(work.path()).expect("failed to init git repo");
    repo.remote("origin", origin.path().to_str().unwrap())
        .expect("failed to add origin remote");

    let fixture = Fixture { work, origin };
    fixture.write("README.md", "# target repo\n");

    let client = GitClient::new(fixture.path()).unwrap();
    client.stage_paths(&["README.md"]).unwrap();
    client
        .commit("initial commit", "Test User", "test@example.com")
        .expect("failed to create initial commit");

    let head = repo.head().unwrap();
    let head_name = head.shorthand().unwrap_or("master").to_string();
    if head_name != "main" {
        let mut branch = repo
            .find_branch(&head_name, git2::BranchType::Local)
            .unwrap();
        branch.rename("main", true).unwrap();
        repo.set_head("refs/heads/main").unwrap();
    }
    client.push("origin", "main", None).unwrap();

    fixture
}

fn make_config(fixture: &Fixture, extra: &str) -> SyncConfig {
    let toml_str = format!(
        r#"
[gist]
id = "aa5a315d61ae9438b18d"

{}
"#,
        extra
    );
    let mut config: SyncConfig = toml::from_str(&toml_str).unwrap();
    config.repo.path = fixture.path().to_path_buf();
    config.commit.user_name = "Sync Bot".into();
    config.commit.user_email = "sync-bot@example.com".into();
    config.context = CommitContext {
        actor: "octocat".into(),
        git_ref: "refs/heads/main".into(),
    };
    config
}

fn make_engine(fixture: &Fixture, config: &SyncConfig) -> SyncEngine {
    let gist_client = GistClient::new("http://127.0.0.1:9", None).unwrap();
    let git_client = GitClient::new(fixture.path()).unwrap();
    SyncEngine::new(config, gist_client, git_client).unwrap()
}

fn gist_files() -> Vec<SourceFile> {
    vec![
        SourceFile::new("config.json", "{\"debug\": true}\n"),
        SourceFile::new("readme.md", "# shared notes\n"),
    ]
}

fn count_commits(repo_path: &Path) -> usize {
    let repo = git2::Repository::open(repo_path).unwrap();
    let mut revwalk = repo.revwalk().unwrap();
    revwalk.push_head().unwrap();
    revwalk.count()
}

fn head_message(repo_path: &Path) -> String {
    let repo = git2::Repository::open(repo_path).unwrap();
    let commit = repo.head().unwrap().peel_to_commit().unwrap();
    commit.message().unwrap_or("").to_string()
}

fn origin_main(fixture: &Fixture) -> String {
    let bare = git2::Repository::open_bare(fixture.origin.path()).unwrap();
    let oid = bare
        .find_reference("refs/heads/main")
        .unwrap()
        .target()
        .unwrap();
    oid.to_string()
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn test_same_names_commits_and_pushes() {
    let fixture = setup_repo();
    let config = make_config(
        &fixture,
        r#"
[mapping]
target_path = "./config/"

[commit]
message = "Sync from Gist {gist_id} by {actor} ({ref})"
"#,
    );
    let engine = make_engine(&fixture, &config);

    let outcome = engine.sync_files(&gist_files()).unwrap();
    let SyncOutcome::Committed {
        sha,
        written,
        skipped,
        pushed,
    } = outcome.clone()
    else {
        panic!("expected a commit, got {:?}", outcome);
    };

    assert_eq!(written, vec!["config/config.json", "config/readme.md"]);
    assert!(skipped.is_empty());
    assert!(pushed);
    assert_eq!(fixture.read("config/config.json"), "{\"debug\": true}\n");
    assert_eq!(fixture.read("config/readme.md"), "# shared notes\n");
    assert_eq!(count_commits(fixture.path()), 2);
    assert_eq!(
        head_message(fixture.path()),
        "Sync from Gist aa5a315d61ae9438b18d by octocat (refs/heads/main)"
    );
    assert_eq!(origin_main(&fixture), sha);

    let repo = git2::Repository::open(fixture.path()).unwrap();
    let commit = repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(commit.author().name(), Some("Sync Bot"));
    assert_eq!(commit.author().email(), Some("sync-bot@example.com"));
}

#[test]
fn test_overwrite_rerun_without_upstream_change_makes_no_commit() {
    let fixture = setup_repo();
    let config = make_config(&fixture, "");
    let engine = make_engine(&fixture, &config);

    assert!(engine.sync_files(&gist_files()).unwrap().committed());
    let commits = count_commits(fixture.path());

    let outcome = engine.sync_files(&gist_files()).unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::NoTreeChange {
            written: vec!["config.json".into(), "readme.md".into()],
        }
    );
    assert_eq!(count_commits(fixture.path()), commits);
}

#[test]
fn test_overwrite_replaces_changed_content() {
    let fixture = setup_repo();
    fixture.write("config.json", "{\"debug\": false}\n");
    let config = make_config(&fixture, "");
    let engine = make_engine(&fixture, &config);

    assert!(engine.sync_files(&gist_files()).unwrap().committed());
    assert_eq!(fixture.read("config.json"), "{\"debug\": true}\n");
}

#[test]
fn test_skip_existing_leaves_files_and_skips_commit() {
    let fixture = setup_repo();
    fixture.write("config/config.json", "local edits\n");
    let config = make_config(
        &fixture,
        r#"
[mapping]
target_path = "config"

[merge]
strategy = "skip_existing"
"#,
    );
    let engine = make_engine(&fixture, &config);
    let files = vec![SourceFile::new("config.json", "from gist\n")];

    let outcome = engine.sync_files(&files).unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Unchanged {
            skipped: vec!["config/config.json".into()],
        }
    );
    assert_eq!(fixture.read("config/config.json"), "local edits\n");
    assert_eq!(count_commits(fixture.path()), 1);
}

#[test]
fn test_skip_existing_second_run_is_unchanged() {
    let fixture = setup_repo();
    let config = make_config(
        &fixture,
        r#"
[merge]
strategy = "skip_existing"
"#,
    );
    let engine = make_engine(&fixture, &config);

    assert!(engine.sync_files(&gist_files()).unwrap().committed());
    let outcome = engine.sync_files(&gist_files()).unwrap();
    assert!(matches!(outcome, SyncOutcome::Unchanged { ref skipped } if skipped.len() == 2));
    assert_eq!(count_commits(fixture.path()), 2);
}

#[test]
fn test_prefix_strategy() {
    let fixture = setup_repo();
    let config = make_config(
        &fixture,
        r#"
[mapping]
strategy = "prefix"
target_path = "./synced/"
file_prefix = "gist-"

[commit]
push = false
"#,
    );
    let engine = make_engine(&fixture, &config);
    let files = vec![
        SourceFile::new("gist-config.json", "{}"),
        SourceFile::new("other.txt", "plain"),
    ];

    let outcome = engine.sync_files(&files).unwrap();
    assert!(matches!(
        outcome,
        SyncOutcome::Committed { ref written, pushed: false, .. }
            if written == &vec!["synced/config.json".to_string(), "synced/other.txt".to_string()]
    ));
    assert_eq!(fixture.read("synced/config.json"), "{}");
}

#[test]
fn test_explicit_drops_unmapped_files() {
    let fixture = setup_repo();
    let config = make_config(
        &fixture,
        r#"
[mapping]
strategy = "explicit"

[mapping.file_mappings]
"other.json" = "x/y.json"
"#,
    );
    let engine = make_engine(&fixture, &config);

    let outcome = engine
        .sync_files(&[SourceFile::new("config.json", "{}")])
        .unwrap();
    assert_eq!(outcome, SyncOutcome::NothingMapped);
    assert!(!fixture.path().join("x").exists());
}

#[test]
fn test_path_escape_writes_nothing() {
    let fixture = setup_repo();
    let config = make_config(
        &fixture,
        r#"
[mapping]
strategy = "explicit"

[mapping.file_mappings]
"config.json" = "safe/config.json"
"readme.md" = "../outside.md"
"#,
    );
    let engine = make_engine(&fixture, &config);

    let err = engine.sync_files(&gist_files()).unwrap_err();
    assert!(matches!(
        err,
        SyncError::MappingError(MappingError::PathEscape { ref source_name, .. }) if source_name == "readme.md"
    ));
    assert!(!fixture.path().join("safe").exists());
    assert_eq!(count_commits(fixture.path()), 1);
}

#[test]
fn test_duplicate_destination_writes_nothing() {
    let fixture = setup_repo();
    let config = make_config(&fixture, "");
    let engine = make_engine(&fixture, &config);
    let files = vec![
        SourceFile::new("a.json", "1"),
        SourceFile::new("./a.json", "2"),
    ];

    let err = engine.sync_files(&files).unwrap_err();
    assert!(matches!(
        err,
        SyncError::MappingError(MappingError::DuplicateDestination { .. })
    ));
    assert!(!fixture.path().join("a.json").exists());
}

#[test]
fn test_empty_gist() {
    let fixture = setup_repo();
    let config = make_config(&fixture, "");
    let engine = make_engine(&fixture, &config);
    assert_eq!(engine.sync_files(&[]).unwrap(), SyncOutcome::NoSourceFiles);
}

#[test]
fn test_pull_request_delivery_is_unimplemented() {
    let fixture = setup_repo();
    let config = make_config(
        &fixture,
        r#"
[commit]
create_pr = true
"#,
    );
    let engine = make_engine(&fixture, &config);

    let err = engine.sync_files(&gist_files()).unwrap_err();
    assert!(matches!(err, SyncError::Unimplemented(_)));
    assert!(!fixture.path().join("config.json").exists());
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let fixture = setup_repo();
    let config = make_config(
        &fixture,
        r#"
[mapping]
strategy = "explicit"
"#,
    );
    let gist_client = GistClient::new("http://127.0.0.1:9", None).unwrap();
    let git_client = GitClient::new(fixture.path()).unwrap();
    assert!(SyncEngine::new(&config, gist_client, git_client).is_err());
}

#[cfg(unix)]
#[test]
fn test_symlinked_target_directory_is_refused() {
    let fixture = setup_repo();
    let outside = tempfile::tempdir().unwrap();
    std::os::unix::fs::symlink(outside.path(), fixture.path().join("config")).unwrap();
    let config = make_config(
        &fixture,
        r#"
[mapping]
target_path = "./config/"

[merge]
strategy = "skip_existing"
"#,
    );
    let engine = make_engine(&fixture, &config);

    let err = engine.sync_files(&gist_files()).unwrap_err();
    assert!(matches!(
        err,
        SyncError::MappingError(MappingError::PathEscape { .. })
    ));
    assert!(!outside.path().join("config.json").exists());
    assert!(!outside.path().join("readme.md").exists());
    assert_eq!(count_commits(fixture.path()), 1);
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_is_skipped_as_existing() {
    let fixture = setup_repo();
    let outside = tempfile::tempdir().unwrap();
    let target = outside.path().join("dangling.json");
    std::os::unix::fs::symlink(&target, fixture.path().join("config.json")).unwrap();
    let config = make_config(
        &fixture,
        r#"
[merge]
strategy = "skip_existing"
"#,
    );
    let engine = make_engine(&fixture, &config);

    let outcome = engine
        .sync_files(&[SourceFile::new("config.json", "{}")])
        .unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Unchanged {
            skipped: vec!["config.json".into()],
        }
    );
    assert!(!target.exists());
}

#[test]
fn test_file_and_nested_destination_writes_nothing() {
    let fixture = setup_repo();
    let config = make_config(
        &fixture,
        r#"
[mapping]
strategy = "explicit"

[mapping.file_mappings]
"config.json" = "a"
"readme.md" = "a/b"
"#,
    );
    let engine = make_engine(&fixture, &config);

    let err = engine.sync_files(&gist_files()).unwrap_err();
    assert!(matches!(
        err,
        SyncError::MappingError(MappingError::NestedDestination { .. })
    ));
    assert!(!fixture.path().join("a").exists());
}
