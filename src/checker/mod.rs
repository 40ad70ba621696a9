use log::info;

use crate::engine::state::{GateDecision, RunError};
use crate::engine::{ManifestApi, fetch_manifest_metadata};
use crate::workflow::OutputSink;

/// Decide whether the manifest needs refreshing and publish the decision.
/// Nothing on disk is modified.
pub async fn check_manifest<A, S>(
    api: &A,
    current_version: &str,
    sink: &mut S,
) -> Result<GateDecision, RunError>
where
    A: ManifestApi,
    S: OutputSink,
{
    let metadata = fetch_manifest_metadata(api).await?;
    let latest_version = metadata.version;
    info!("Current manifest version: \"{current_version}\".");
    info!("Latest manifest version: \"{latest_version}\".");

    let decision = GateDecision::decide(current_version, &latest_version);
    match &decision {
        GateDecision::UpToDate { version } => sink.notice(&format!(
            "Destiny Manifest is already up-to-date (Version \"{version}\").\nNo changes to the repository were made."
        )),
        GateDecision::UpdateAvailable { latest_version, .. } => sink.notice(&format!(
            "A new version of the Destiny Manifest is available: \"{latest_version}\"."
        )),
    }
    sink.set_outputs(&decision.outputs()).await?;
    Ok(decision)
}
