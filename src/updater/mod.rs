use log::info;

use crate::engine::models::{ManifestBundle, SliceRequest};
use crate::engine::state::RunError;
use crate::engine::{ManifestApi, fetch_manifest_metadata};
use crate::storage::StorageManager;

/// Rebuild `manifest.zip`, `latest.json` and `README.md` from the published
/// manifest. Runs unconditionally; gating is the caller's job.
///
/// # Errors
/// Fails before touching any file if either fetch fails. A failed write
/// leaves the later files untouched.
pub async fn update_manifest<A: ManifestApi>(
    api: &A,
    storage: &StorageManager,
) -> Result<String, RunError> {
    let metadata = fetch_manifest_metadata(api).await?;

    info!("Fetching Destiny Manifest components...");
    let request = SliceRequest::new(&metadata.tables);
    let slice = api.fetch_slice(&request).await?;

    let bundle = ManifestBundle::from_slice(slice);
    info!(
        "update: bundling tables [{}]",
        bundle.keys().collect::<Vec<_>>().join(", ")
    );
    let payload = bundle.to_json()?;

    storage.write_archive(&payload).await?;
    storage.write_version_marker(&metadata.version).await?;
    storage.write_readme(&metadata.version).await?;
    info!("Uploading changed files to repository...");

    Ok(metadata.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::FakeApi;
    use crate::engine::models::MANIFEST_TABLES;
    use crate::storage::render_readme;
    use std::io::{Cursor, Read};
    use std::path::Path;
    use zip::read::ZipArchive;

    fn all_tables() -> Vec<&'static str> {
        MANIFEST_TABLES.iter().map(|t| t.remote).collect()
    }

    fn archived_manifest(root: &Path) -> serde_json::Value {
        let bytes = std::fs::read(root.join("manifest.zip")).expect("archive");
        let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("zip");
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_name("manifest.json").expect("entry");
        let mut json = String::new();
        entry.read_to_string(&mut json).expect("read entry");
        serde_json::from_str(&json).expect("manifest json")
    }

    fn seed(root: &Path) {
        std::fs::write(root.join("manifest.zip"), b"old archive").expect("seed zip");
        std::fs::write(root.join("latest.json"), "\"old\"").expect("seed marker");
        std::fs::write(root.join("README.md"), "old readme").expect("seed readme");
    }

    #[tokio::test]
    async fn writes_all_three_files_consistently() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = StorageManager::new(dir.path());
        let api = FakeApi::success("v7", &all_tables());

        let version = update_manifest(&api, &storage).await.expect("update");

        assert_eq!(version, "v7");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("latest.json")).expect("marker"),
            "\"v7\""
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("README.md")).expect("readme"),
            render_readme("v7")
        );

        let manifest = archived_manifest(dir.path());
        let keys: Vec<&str> = manifest
            .as_object()
            .expect("object")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            vec!["DamageType", "InventoryItem", "PlugSet", "Season", "Stat", "StatGroup"]
        );
        assert_eq!(
            manifest["InventoryItem"]["1001"]["displayProperties"]["name"],
            "DestinyInventoryItemDefinition"
        );
    }

    #[tokio::test]
    async fn absent_tables_are_left_out_of_the_archive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = StorageManager::new(dir.path());
        let api = FakeApi::success(
            "v8",
            &["DestinyStatDefinition", "DestinyInventoryItemDefinition"],
        );

        update_manifest(&api, &storage).await.expect("update");

        let manifest = archived_manifest(dir.path());
        let object = manifest.as_object().expect("object");
        assert_eq!(object.len(), 2);
        assert!(object.contains_key("Stat"));
        assert!(object.contains_key("InventoryItem"));
        assert!(!object.contains_key("Season"));
    }

    #[tokio::test]
    async fn remote_failure_leaves_files_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed(dir.path());
        let storage = StorageManager::new(dir.path());
        let api = FakeApi::failure("SystemDisabled", "Down for maintenance");

        let err = update_manifest(&api, &storage)
            .await
            .expect_err("remote failure");

        assert!(matches!(err, RunError::Remote { ref status, .. } if status == "SystemDisabled"));
        assert_eq!(api.slice_calls.get(), 0);
        assert_eq!(
            std::fs::read(dir.path().join("manifest.zip")).expect("zip"),
            b"old archive"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("latest.json")).expect("marker"),
            "\"old\""
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("README.md")).expect("readme"),
            "old readme"
        );
    }

    #[tokio::test]
    async fn repeated_runs_are_byte_identical() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = StorageManager::new(dir.path());
        let api = FakeApi::success("v9", &all_tables());

        update_manifest(&api, &storage).await.expect("first run");
        let first_zip = std::fs::read(dir.path().join("manifest.zip")).expect("zip");
        let first_marker = std::fs::read(dir.path().join("latest.json")).expect("marker");

        update_manifest(&api, &storage).await.expect("second run");

        assert_eq!(
            std::fs::read(dir.path().join("manifest.zip")).expect("zip"),
            first_zip
        );
        assert_eq!(
            std::fs::read(dir.path().join("latest.json")).expect("marker"),
            first_marker
        );
    }
}
