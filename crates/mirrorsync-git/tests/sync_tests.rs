//! End-to-end synchronization against throw-away local remotes.

mod common;

use std::fs;
use std::path::Path;

use mirrorsync_core::{Reference, SyncError, SyncSettings};
use mirrorsync_git::{CacheOptions, MirrorState, SyncOptions, SynchronizerRegistry};
use tempfile::TempDir;

use common::{Remote, head, status};

fn cached_registry(cache: &Path) -> SynchronizerRegistry {
    let settings = SyncSettings::builder().cache_root(cache).build().unwrap();
    SynchronizerRegistry::new(&settings)
}

fn reference(s: &str) -> Reference {
    Reference::parse(s).unwrap()
}

#[test]
fn test_refresh_creates_mirror_with_every_branch() {
    let remote = Remote::new();
    remote.branch("develop");
    let cache = TempDir::new().unwrap();
    let registry = cached_registry(cache.path());

    let sync = registry.get_or_create(remote.url());
    assert!(!sync.is_cached());

    sync.refresh().unwrap();

    assert!(sync.is_cached());
    assert_eq!(sync.mirror_state(), MirrorState::Fresh);
    assert!(sync.mirror_path().unwrap().starts_with(cache.path()));
    assert_eq!(
        sync.branches(CacheOptions::default()).unwrap(),
        vec!["develop", "main"]
    );
}

#[test]
fn test_sync_new_directory_matches_commit() {
    let remote = Remote::new();
    remote.commit("manifests/init.pp", "class site {}\n");
    let cache = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let target = work.path().join("modules/site");
    let registry = cached_registry(cache.path());

    let commit = registry
        .get_or_create(remote.url())
        .sync(&target, &reference("main"), SyncOptions::default())
        .unwrap();

    assert_eq!(commit.as_str(), remote.head_of("main"));
    assert_eq!(head(&target), remote.head_of("main"));
    assert_eq!(
        fs::read_to_string(target.join("manifests/init.pp")).unwrap(),
        "class site {}\n"
    );
    assert_eq!(status(&target), "");
}

#[test]
fn test_branch_and_its_commit_give_same_tree() {
    let remote = Remote::new();
    let tip = remote.commit("data.txt", "v2\n");
    let cache = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let registry = cached_registry(cache.path());
    let sync = registry.get_or_create(remote.url());

    let by_name = work.path().join("by-name");
    let by_sha = work.path().join("by-sha");
    sync.sync(&by_name, &reference("main"), SyncOptions::default())
        .unwrap();
    sync.sync(&by_sha, &reference(&tip), SyncOptions::default())
        .unwrap();

    assert_eq!(head(&by_name), head(&by_sha));
    assert_eq!(
        fs::read_to_string(by_name.join("data.txt")).unwrap(),
        fs::read_to_string(by_sha.join("data.txt")).unwrap()
    );
}

#[test]
fn test_switching_to_ancestor_branch_resets_without_merge() {
    let remote = Remote::new();
    let main = remote.head_of("main");
    remote.branch("feature");
    remote.commit("feature.txt", "only on feature\n");
    let cache = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let registry = cached_registry(cache.path());
    let sync = registry.get_or_create(remote.url());
    let target = work.path().join("site");

    sync.sync(&target, &reference("feature"), SyncOptions::default())
        .unwrap();
    assert!(target.join("feature.txt").exists());

    sync.sync(&target, &reference("main"), SyncOptions::default())
        .unwrap();
    assert_eq!(head(&target), main);
    assert!(!target.join("feature.txt").exists());
}

#[test]
fn test_unknown_reference_leaves_directory_untouched() {
    let remote = Remote::new();
    let cache = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let registry = cached_registry(cache.path());
    let sync = registry.get_or_create(remote.url());
    let target = work.path().join("site");

    let before = sync
        .sync(&target, &reference("main"), SyncOptions::default())
        .unwrap();
    fs::write(target.join("README"), "local edit\n").unwrap();

    let err = sync
        .sync(&target, &reference("no-such-branch"), SyncOptions::default())
        .unwrap_err();

    let failure = err.execution().expect("execution failure");
    assert_ne!(failure.exit_code, Some(0));
    assert!(!failure.stderr.is_empty());
    assert_eq!(head(&target), before.as_str());
    assert_eq!(
        fs::read_to_string(target.join("README")).unwrap(),
        "local edit\n"
    );
}

#[test]
fn test_sync_discards_local_modifications() {
    let remote = Remote::new();
    let cache = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let registry = cached_registry(cache.path());
    let sync = registry.get_or_create(remote.url());
    let target = work.path().join("site");

    sync.sync(&target, &reference("main"), SyncOptions::default())
        .unwrap();
    fs::write(target.join("README"), "tampered\n").unwrap();

    sync.sync(&target, &reference("main"), SyncOptions::default())
        .unwrap();

    assert_eq!(fs::read_to_string(target.join("README")).unwrap(), "hello\n");
    assert_eq!(status(&target), "");
}

#[test]
fn test_new_history_needs_forced_refresh() {
    let remote = Remote::new();
    let cache = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let registry = cached_registry(cache.path());
    let sync = registry.get_or_create(remote.url());
    let target = work.path().join("site");

    let first = sync
        .sync(&target, &reference("main"), SyncOptions::default())
        .unwrap();
    let second = remote.commit("README", "hello again\n");

    // Already refreshed during this synchronizer's lifetime.
    let again = sync
        .sync(&target, &reference("main"), SyncOptions::default())
        .unwrap();
    assert_eq!(again, first);

    sync.cache(CacheOptions::forced()).unwrap();
    let updated = sync
        .sync(&target, &reference("main"), SyncOptions::default())
        .unwrap();
    assert_eq!(updated.as_str(), second);
    assert_eq!(
        fs::read_to_string(target.join("README")).unwrap(),
        "hello again\n"
    );
    assert_eq!(sync.refresh_count(), 2);
}

#[test]
fn test_sync_to_annotated_tag() {
    let remote = Remote::new();
    let tagged = remote.commit("VERSION", "1.0.0\n");
    remote.tag("v1.0.0");
    remote.commit("VERSION", "1.1.0-dev\n");
    let cache = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let registry = cached_registry(cache.path());
    let target = work.path().join("site");

    let commit = registry
        .get_or_create(remote.url())
        .sync(&target, &reference("v1.0.0"), SyncOptions::default())
        .unwrap();

    assert_eq!(commit.as_str(), tagged);
    assert_eq!(fs::read_to_string(target.join("VERSION")).unwrap(), "1.0.0\n");
}

#[test]
fn test_refresh_prunes_deleted_branches() {
    let remote = Remote::new();
    remote.branch("short-lived");
    remote.checkout("main");
    let cache = TempDir::new().unwrap();
    let registry = cached_registry(cache.path());
    let sync = registry.get_or_create(remote.url());

    assert_eq!(
        sync.branches(CacheOptions::default()).unwrap(),
        vec!["main", "short-lived"]
    );

    remote.delete_branch("short-lived");
    assert_eq!(
        sync.branches(CacheOptions::forced()).unwrap(),
        vec!["main"]
    );
}

#[test]
fn test_uncached_sync_tracks_remote() {
    let remote = Remote::new();
    let work = TempDir::new().unwrap();
    let registry = SynchronizerRegistry::new(&SyncSettings::default());
    let sync = registry.get_or_create(remote.url());
    let target = work.path().join("site");

    sync.sync(&target, &reference("main"), SyncOptions::default())
        .unwrap();
    assert!(!sync.is_cached());
    assert_eq!(head(&target), remote.head_of("main"));

    let newer = remote.commit("README", "moved on\n");
    let commit = sync
        .sync(&target, &reference("main"), SyncOptions::default())
        .unwrap();

    assert_eq!(commit.as_str(), newer);
    assert_eq!(fs::read_to_string(target.join("README")).unwrap(), "moved on\n");
    assert_eq!(sync.branches(CacheOptions::default()).unwrap(), vec!["main"]);
}

#[test]
fn test_unreachable_remote_is_execution_failure() {
    let cache = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let registry = cached_registry(cache.path());
    let missing = work.path().join("does-not-exist.git");

    let err = registry
        .get_or_create(missing.to_string_lossy().into_owned())
        .sync(work.path().join("site"), &reference("main"), SyncOptions::default())
        .unwrap_err();

    assert!(matches!(err, SyncError::Execution(_)));
    assert!(!work.path().join("site").exists());
}

/// `main` with two commits and an annotated tag on its tip, plus a
/// descendant `feature`. Returns (main~1, main, feature).
fn diverged_remote(remote: &Remote) -> (String, String, String) {
    let base = remote.head_of("main");
    let main = remote.commit("README", "second\n");
    remote.tag("v1.0.0");
    remote.branch("feature");
    let feature = remote.commit("feature.txt", "only on feature\n");
    remote.checkout("main");
    (base, main, feature)
}

fn assert_reference_shapes(sync: &mirrorsync_git::Synchronizer, target: &Path, remote: &Remote) {
    let (base, main, feature) = diverged_remote(remote);
    let cases = [
        ("main", main.as_str()),
        ("main~0", main.as_str()),
        ("refs/heads/main", main.as_str()),
        ("main^", base.as_str()),
        ("v1.0.0", main.as_str()),
        (":/update feature.txt", feature.as_str()),
        (feature.as_str(), feature.as_str()),
    ];

    for (expression, expected) in cases {
        let on_feature = sync
            .sync(target, &reference("feature"), SyncOptions::default())
            .unwrap();
        assert_eq!(on_feature.as_str(), feature);

        let commit = sync
            .sync(target, &reference(expression), SyncOptions::default())
            .unwrap();
        assert_eq!(commit.as_str(), expected, "{} resolved wrongly", expression);
        assert_eq!(head(target), expected);
        assert_eq!(status(target), "");
    }
}

#[test]
fn test_uncached_reference_shapes_follow_remote_after_branch_switch() {
    let remote = Remote::new();
    let work = TempDir::new().unwrap();
    let registry = SynchronizerRegistry::new(&SyncSettings::default());
    let sync = registry.get_or_create(remote.url());

    assert_reference_shapes(&sync, &work.path().join("site"), &remote);
}

#[test]
fn test_cached_reference_shapes_follow_remote_after_branch_switch() {
    let remote = Remote::new();
    let cache = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let registry = cached_registry(cache.path());
    let sync = registry.get_or_create(remote.url());

    assert_reference_shapes(&sync, &work.path().join("site"), &remote);
}

#[test]
fn test_sync_leaves_head_detached() {
    let remote = Remote::new();
    let main = remote.head_of("main");
    remote.branch("feature");
    let feature = remote.commit("feature.txt", "x\n");
    let work = TempDir::new().unwrap();
    let target = work.path().join("site");
    let registry = SynchronizerRegistry::new(&SyncSettings::default());
    let sync = registry.get_or_create(remote.url());

    sync.sync(&target, &reference("feature"), SyncOptions::default())
        .unwrap();

    assert_eq!(head(&target), feature);
    assert_eq!(common::git(&target, &["rev-parse", "--abbrev-ref", "HEAD"]), "HEAD");
    assert_eq!(common::git(&target, &["rev-parse", "refs/heads/main"]), main);
}

#[test]
fn test_uncached_fully_qualified_ref_sees_new_history() {
    let remote = Remote::new();
    let work = TempDir::new().unwrap();
    let target = work.path().join("site");
    let registry = SynchronizerRegistry::new(&SyncSettings::default());
    let sync = registry.get_or_create(remote.url());

    sync.sync(&target, &reference("refs/heads/main"), SyncOptions::default())
        .unwrap();
    let newer = remote.commit("README", "moved on\n");

    let commit = sync
        .sync(&target, &reference("refs/heads/main"), SyncOptions::default())
        .unwrap();
    assert_eq!(commit.as_str(), newer);
}
