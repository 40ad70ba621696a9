use log::info;

use crate::engine::models::{ManifestMetadata, ManifestSlice, RemoteMetadata, SliceRequest};
use crate::engine::state::RunError;

#[cfg(test)]
pub mod fake;
pub mod models;
pub mod state;

/// Remote side of the bot: the Bungie.net manifest endpoints.
pub trait ManifestApi {
    /// Fetch the current manifest metadata (version and table locations).
    async fn fetch_metadata(&self) -> Result<RemoteMetadata, String>;

    /// Fetch the requested tables. Tables without a content path are left out.
    async fn fetch_slice(&self, request: &SliceRequest<'_>) -> Result<ManifestSlice, String>;
}

/// Fetch metadata and turn a non-Success status into a [`RunError::Remote`].
pub async fn fetch_manifest_metadata<A: ManifestApi>(api: &A) -> Result<ManifestMetadata, RunError> {
    info!("Fetching Destiny Manifest metadata...");
    match api.fetch_metadata().await? {
        RemoteMetadata::Success(metadata) => Ok(metadata),
        RemoteMetadata::Failure {
            status,
            code,
            message,
        } => Err(RunError::Remote {
            status,
            code,
            message,
        }),
    }
}
