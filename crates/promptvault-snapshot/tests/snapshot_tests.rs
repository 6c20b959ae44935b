//! End-to-end snapshot tests over the in-memory and directory blob stores.

use promptvault_snapshot::{
    Bump, IgnoreFilter, JoinMapper, RemoteTier, SnapshotError, SnapshotStore, Tier, VersionId,
};
use promptvault_storage::{BlobStore, FsBlobStore, MemoryBlobStore};
use promptvault_test_utils::fixtures::read_tree;
use promptvault_test_utils::{content, TestPromptTree};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

const PREFIX: &str = "tmp/prompt-artifacts";

fn store_for(local_root: &Path, blobs: Arc<dyn BlobStore>) -> SnapshotStore {
    SnapshotStore::new(local_root, Arc::new(JoinMapper))
        .with_remote(RemoteTier::new(blobs, PREFIX))
        .with_ignore(IgnoreFilter::new(["*.log", "cache/*"]).unwrap())
}

fn without_ignored(files: BTreeMap<String, Vec<u8>>) -> BTreeMap<String, Vec<u8>> {
    files
        .into_iter()
        .filter(|(path, _)| !path.ends_with(".log") && !path.starts_with("cache/"))
        .collect()
}

async fn round_trip(blobs: Arc<dyn BlobStore>) -> BTreeMap<String, Vec<u8>> {
    let tree = TestPromptTree::new()
        .with_sample_prompts()
        .with_prompt("debug.log", "noise")
        .with_prompt("cache/data.yaml", "cached: true\n")
        .with_prompt("cache2/data.yaml", "kept: true\n")
        .with_prompt("binary.bin", vec![0u8, 159, 146, 150])
        .build();
    let store = store_for(&tree.prompts_dir(), blobs);

    let version = store.save_snapshot(Bump::Major).await.unwrap();
    assert_eq!(version.to_string(), "1.0.0");

    let target = tree.path().join("restored");
    let loaded = store
        .load_snapshot(&Tier::Version(version), Some(&target), false)
        .await
        .unwrap();
    assert_eq!(loaded, target);

    let restored = read_tree(&target);
    assert_eq!(restored, without_ignored(tree.prompt_files()));
    restored
}

#[tokio::test]
async fn test_round_trip_memory_store() {
    let restored = round_trip(Arc::new(MemoryBlobStore::new())).await;
    assert!(restored.contains_key("cache2/data.yaml"));
    assert!(!restored.contains_key("debug.log"));
}

#[tokio::test]
async fn test_round_trip_fs_store_matches_memory_store() {
    let bucket = tempfile::tempdir().unwrap();
    let from_fs = round_trip(Arc::new(FsBlobStore::new(bucket.path()))).await;
    let from_memory = round_trip(Arc::new(MemoryBlobStore::new())).await;
    assert_eq!(from_fs, from_memory);

    assert!(bucket
        .path()
        .join(PREFIX)
        .join("Version 1.0.0/generic/metric_1.yaml")
        .is_file());
}

#[tokio::test]
async fn test_versions_accumulate_and_latest_tracks_newest() {
    let tree = TestPromptTree::new().with_sample_prompts().build();
    let blobs = Arc::new(MemoryBlobStore::new());
    let store = store_for(&tree.prompts_dir(), blobs);

    assert!(store.list_versions().await.unwrap().is_empty());
    let first = store.save_snapshot(Bump::Minor).await.unwrap();
    assert_eq!(first.to_string(), "0.1.0");

    tree.write_prompt("generic/metric_1.yaml", "metric_1:\n  description: updated\n");
    let second = store.save_snapshot(Bump::Major).await.unwrap();
    assert_eq!(second.to_string(), "1.0.0");

    let third = store.save_snapshot(Bump::Patch).await.unwrap();
    assert_eq!(third.to_string(), "1.0.1");

    assert_eq!(store.list_versions().await.unwrap(), vec![third, second, first]);

    let old = store
        .load_document_as_str(&["generic", "metric_1"], &Tier::Version(first), None)
        .await
        .unwrap();
    assert!(old.contains("This is a generic prompt."));

    let latest = store
        .load_document(&["generic", "metric_1"], &Tier::Latest)
        .await
        .unwrap();
    assert_eq!(latest["metric_1"]["description"].as_str(), Some("updated"));
}

#[tokio::test]
async fn test_listing_ignores_foreign_keys() {
    let blobs = Arc::new(MemoryBlobStore::with_objects([
        (format!("{PREFIX}/Version 1.0.0/a.yaml"), b"a: 1".to_vec()),
        (format!("{PREFIX}/Version invalid/a.yaml"), b"a: 1".to_vec()),
        (format!("{PREFIX}/Version 2.0.0/a.yaml"), b"a: 2".to_vec()),
        (format!("{PREFIX}/README.md"), b"hello".to_vec()),
        ("elsewhere/Version 9.0.0/a.yaml".to_string(), b"a: 9".to_vec()),
    ]));
    let tree = TestPromptTree::new().build();
    let store = store_for(&tree.prompts_dir(), blobs);

    let versions = store.list_versions().await.unwrap();
    assert_eq!(
        versions,
        vec![VersionId::new(2, 0, 0), VersionId::new(1, 0, 0)]
    );
    assert_eq!(
        store.save_snapshot(Bump::Minor).await.unwrap_err().to_string(),
        format!("Invalid state: no files to snapshot in {}", tree.prompts_dir().display())
    );
}

#[tokio::test]
async fn test_replace_restores_exact_tree() {
    let tree = TestPromptTree::new()
        .with_sample_prompts()
        .with_prompt("flat.yaml", content::FLAT_PROMPT)
        .build();
    let store = store_for(&tree.prompts_dir(), Arc::new(MemoryBlobStore::new()));
    let saved = tree.prompt_files();
    store.save_snapshot(Bump::Major).await.unwrap();

    tree.delete_prompt("flat.yaml");
    tree.write_prompt("scratch.yaml", "temp: true\n");

    store.load_snapshot(&Tier::Latest, None, true).await.unwrap();
    assert_eq!(tree.prompt_files(), saved);

    let field = store
        .load_document_as_str(&["flat"], &Tier::Local, Some("extraction_instructions"))
        .await
        .unwrap();
    assert_eq!(field, "Find the TVPI multiple");
}

#[tokio::test]
async fn test_load_snapshot_error_precedence() {
    let tree = TestPromptTree::new().build();
    let unconfigured = SnapshotStore::new(tree.prompts_dir(), Arc::new(JoinMapper));

    // Configuration is checked before arguments
    let err = unconfigured
        .load_snapshot(&Tier::Latest, None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, SnapshotError::Config(_)));

    let store = store_for(&tree.prompts_dir(), Arc::new(MemoryBlobStore::new()));
    let err = store
        .load_snapshot(&Tier::Latest, None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, SnapshotError::InvalidArgument(_)));

    let err = store
        .load_snapshot(&Tier::Latest, Some(&tree.path().join("out")), false)
        .await
        .unwrap_err();
    assert!(matches!(err, SnapshotError::InvalidState(_)));
}
