use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `ErrorStatus` value Bungie uses for a successful call.
pub const SUCCESS_STATUS: &str = "Success";

pub const MANIFEST_LOCALE: &str = "en";

/// A manifest table we mirror, and the key it is stored under in `manifest.json`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManifestTable {
    pub remote: &'static str,
    pub short: &'static str,
}

pub const MANIFEST_TABLES: [ManifestTable; 6] = [
    ManifestTable {
        remote: "DestinyDamageTypeDefinition",
        short: "DamageType",
    },
    ManifestTable {
        remote: "DestinyInventoryItemDefinition",
        short: "InventoryItem",
    },
    ManifestTable {
        remote: "DestinyPlugSetDefinition",
        short: "PlugSet",
    },
    ManifestTable {
        remote: "DestinySeasonDefinition",
        short: "Season",
    },
    ManifestTable {
        remote: "DestinyStatDefinition",
        short: "Stat",
    },
    ManifestTable {
        remote: "DestinyStatGroupDefinition",
        short: "StatGroup",
    },
];

/// Definitions of one table, keyed by hash.
pub type DefinitionTable = BTreeMap<u32, serde_json::Value>;

/// Fetched tables keyed by their remote name.
pub type ManifestSlice = BTreeMap<String, DefinitionTable>;

/// Bungie.net response envelope shared by every Platform endpoint.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerResponse<T> {
    pub response: Option<T>,
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub throttle_seconds: i64,
    pub error_status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinyManifest {
    pub version: String,
    #[serde(default)]
    pub json_world_component_content_paths: BTreeMap<String, BTreeMap<String, String>>,
}

/// Where each table's JSON lives, per locale.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableLocation {
    paths: BTreeMap<String, BTreeMap<String, String>>,
}

impl TableLocation {
    pub fn new(paths: BTreeMap<String, BTreeMap<String, String>>) -> Self {
        Self { paths }
    }

    pub fn path_for(&self, locale: &str, table: &str) -> Option<&str> {
        self.paths
            .get(locale)
            .and_then(|tables| tables.get(table))
            .map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestMetadata {
    pub version: String,
    pub tables: TableLocation,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteMetadata {
    Success(ManifestMetadata),
    Failure {
        status: String,
        code: i64,
        message: String,
    },
}

impl TryFrom<ServerResponse<DestinyManifest>> for RemoteMetadata {
    type Error = String;

    fn try_from(envelope: ServerResponse<DestinyManifest>) -> Result<Self, Self::Error> {
        if envelope.error_status != SUCCESS_STATUS {
            return Ok(RemoteMetadata::Failure {
                status: envelope.error_status,
                code: envelope.error_code,
                message: envelope.message,
            });
        }
        let manifest = envelope
            .response
            .ok_or("manifest response reported Success without a Response body")?;
        Ok(RemoteMetadata::Success(ManifestMetadata {
            version: manifest.version,
            tables: TableLocation::new(manifest.json_world_component_content_paths),
        }))
    }
}

/// Immutable description of one slice download.
#[derive(Clone, Copy, Debug)]
pub struct SliceRequest<'a> {
    pub location: &'a TableLocation,
    pub tables: &'static [ManifestTable],
    pub locale: &'static str,
}

impl<'a> SliceRequest<'a> {
    pub fn new(location: &'a TableLocation) -> Self {
        Self {
            location,
            tables: &MANIFEST_TABLES,
            locale: MANIFEST_LOCALE,
        }
    }
}

/// The re-keyed structure stored as `manifest.json`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ManifestBundle(BTreeMap<&'static str, DefinitionTable>);

impl ManifestBundle {
    /// Keep only the mirrored tables and move them to their short keys.
    /// Tables missing from the slice stay missing.
    pub fn from_slice(mut slice: ManifestSlice) -> Self {
        let tables = MANIFEST_TABLES
            .iter()
            .filter_map(|table| slice.remove(table.remote).map(|defs| (table.short, defs)))
            .collect();
        Self(tables)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn to_json(&self) -> Result<Vec<u8>, String> {
        serde_json::to_vec(self).map_err(|e| format!("failed to serialize manifest: {e}"))
    }
}
