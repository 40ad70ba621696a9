use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE: &str = "https://www.bungie.net";

const VERSION_MARKER_FILE: &str = "latest.json";
const ARCHIVE_FILE: &str = "manifest.zip";
const README_FILE: &str = "README.md";

/// On-disk layout of the repository the bot keeps up to date.
#[derive(Clone, Debug)]
pub struct RepoPaths {
    root: PathBuf,
}

impl RepoPaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn version_marker(&self) -> PathBuf {
        self.root.join(VERSION_MARKER_FILE)
    }

    pub fn archive(&self) -> PathBuf {
        self.root.join(ARCHIVE_FILE)
    }

    pub fn readme(&self) -> PathBuf {
        self.root.join(README_FILE)
    }
}
