use std::time::{Duration, Instant};

use futures_util::StreamExt;
use log::{debug, info, warn};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;

use crate::engine::ManifestApi;
use crate::engine::models::{
    DefinitionTable, DestinyManifest, ManifestSlice, RemoteMetadata, ServerResponse, SliceRequest,
};

const MANIFEST_ENDPOINT: &str = "/Platform/Destiny2/Manifest/";
const API_KEY_HEADER: &str = "X-API-Key";
// InventoryItem alone is a few hundred MB of JSON.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);
const MIB: f64 = 1024.0 * 1024.0;

pub struct BungieClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl BungieClient {
    pub fn new(api_base: &str, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("d2-manifest-bot/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|err| {
                warn!("network client: falling back to default HTTP client configuration ({err})");
                Client::new()
            });
        Self::with_client(client, api_base, api_key)
    }

    pub fn with_client(client: Client, api_base: &str, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.api_base, path)
    }

    /// Download a JSON document, logging throughput while the body streams in.
    async fn download_json<T: DeserializeOwned>(&self, url: &str, label: &str) -> Result<T, String> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| format!("{label} request failed: {e}"))?
            .error_for_status()
            .map_err(|e| format!("{label} status error: {e}"))?;

        let total = response.content_length();
        let mut body = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut stream = response.bytes_stream();
        let mut meter = TransferMeter::new(total);

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| format!("{label} stream error: {e}"))?;
            body.extend_from_slice(&chunk);
            if let Some(line) = meter.update(body.len() as u64) {
                debug!("{label}: {line}");
            }
        }

        if let Some(total) = total
            && (body.len() as u64) < total
        {
            return Err(format!(
                "{label} download incomplete: received {} of {} bytes",
                body.len(),
                total
            ));
        }

        serde_json::from_slice(&body).map_err(|e| format!("{label} parse error: {e}"))
    }
}

impl ManifestApi for BungieClient {
    async fn fetch_metadata(&self) -> Result<RemoteMetadata, String> {
        let response = self
            .client
            .get(self.url(MANIFEST_ENDPOINT))
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| format!("manifest metadata request failed: {e}"))?;

        // Maintenance and throttling arrive as non-2xx with a regular envelope.
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| format!("manifest metadata body error: {e}"))?;
        let envelope: ServerResponse<DestinyManifest> = serde_json::from_str(&text)
            .map_err(|e| format!("manifest metadata parse error (HTTP {status}): {e}"))?;
        if envelope.throttle_seconds > 0 {
            debug!(
                "manifest metadata: Bungie asked for {}s throttle",
                envelope.throttle_seconds
            );
        }
        RemoteMetadata::try_from(envelope)
    }

    async fn fetch_slice(&self, request: &SliceRequest<'_>) -> Result<ManifestSlice, String> {
        let mut slice = ManifestSlice::new();
        for table in request.tables {
            let Some(path) = request.location.path_for(request.locale, table.remote) else {
                warn!(
                    "manifest slice: no {} content path for {}; leaving it out",
                    request.locale, table.remote
                );
                continue;
            };
            info!("Fetching {} ({})...", table.remote, request.locale);
            let defs: DefinitionTable = self.download_json(&self.url(path), table.remote).await?;
            debug!("{}: {} definitions", table.remote, defs.len());
            slice.insert(table.remote.to_owned(), defs);
        }
        Ok(slice)
    }
}

/// Rate-limited progress reporting for one body download.
struct TransferMeter {
    total: Option<u64>,
    last_tick: Instant,
    last_bytes: u64,
}

impl TransferMeter {
    fn new(total: Option<u64>) -> Self {
        Self {
            total,
            last_tick: Instant::now(),
            last_bytes: 0,
        }
    }

    fn update(&mut self, received: u64) -> Option<String> {
        let elapsed = self.last_tick.elapsed();
        if elapsed < PROGRESS_INTERVAL {
            return None;
        }
        let rate = received.saturating_sub(self.last_bytes) as f64 / elapsed.as_secs_f64();
        self.last_tick = Instant::now();
        self.last_bytes = received;
        Some(describe_progress(received, self.total, rate))
    }
}

fn describe_progress(received: u64, total: Option<u64>, bytes_per_sec: f64) -> String {
    let done = received as f64 / MIB;
    let rate = bytes_per_sec / MIB;
    match total {
        Some(total) if total > 0 => format!(
            "{done:.1} of {:.1} MiB ({}%) at {rate:.1} MiB/s",
            total as f64 / MIB,
            received.saturating_mul(100) / total
        ),
        _ => format!("{done:.1} MiB at {rate:.1} MiB/s"),
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_owned();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
