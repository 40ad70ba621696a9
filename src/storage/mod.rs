use std::io::{Cursor, Write};
use std::path::Path;

use log::{info, warn};
use tokio::fs;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::env::RepoPaths;
use crate::util::quote_version;

pub const ARCHIVE_ENTRY: &str = "manifest.json";

/// Reads and rewrites the tracked repository files.
pub struct StorageManager {
    paths: RepoPaths,
}

impl StorageManager {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            paths: RepoPaths::new(root),
        }
    }

    /// Version recorded by the last successful update. A repository that has
    /// never been updated reports an empty version.
    pub async fn read_stored_version(&self) -> Result<String, String> {
        let path = self.paths.version_marker();
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!("{} not found; treating stored version as empty", path.display());
                return Ok(String::new());
            }
            Err(err) => return Err(format!("failed to read {}: {err}", path.display())),
        };
        serde_json::from_str(text.trim())
            .map_err(|e| format!("failed to parse {}: {e}", path.display()))
    }

    pub async fn write_archive(&self, payload: &[u8]) -> Result<(), String> {
        let path = self.paths.archive();
        info!(
            "Writing new manifest definitions to '{}'...",
            display_name(&path)
        );
        let bytes = build_archive(ARCHIVE_ENTRY, payload)?;
        fs::write(&path, bytes)
            .await
            .map_err(|e| format!("failed to write {}: {e}", path.display()))
    }

    pub async fn write_version_marker(&self, version: &str) -> Result<(), String> {
        let path = self.paths.version_marker();
        info!("Writing new manifest version to '{}'...", display_name(&path));
        fs::write(&path, quote_version(version))
            .await
            .map_err(|e| format!("failed to write {}: {e}", path.display()))
    }

    pub async fn write_readme(&self, version: &str) -> Result<(), String> {
        let path = self.paths.readme();
        info!("Writing new repository README...");
        fs::write(&path, render_readme(version))
            .await
            .map_err(|e| format!("failed to write {}: {e}", path.display()))
    }
}

/// Build a zip holding `payload` as its only entry. Entry timestamps are
/// pinned so equal payloads give equal archives.
pub fn build_archive(entry: &str, payload: &[u8]) -> Result<Vec<u8>, String> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(entry, options)
        .map_err(|e| format!("zip entry error: {e}"))?;
    writer
        .write_all(payload)
        .map_err(|e| format!("zip write error: {e}"))?;
    let cursor = writer
        .finish()
        .map_err(|e| format!("zip finish error: {e}"))?;
    Ok(cursor.into_inner())
}

pub fn render_readme(version: &str) -> String {
    format!(
        "# d2-manifest-bot\nA GitHub Action for fetching the latest version of Bungie's Destiny Manifest.\n## Current manifest version: \"{version}\""
    )
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
