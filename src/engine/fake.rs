use std::cell::Cell;
use std::collections::BTreeMap;

use serde_json::json;

use crate::engine::ManifestApi;
use crate::engine::models::{
    DefinitionTable, ManifestMetadata, ManifestSlice, RemoteMetadata, SliceRequest, TableLocation,
};

/// In-memory Bungie stand-in. Serves every table it was given a path for.
pub struct FakeApi {
    metadata: RemoteMetadata,
    tables: BTreeMap<String, DefinitionTable>,
    pub slice_calls: Cell<usize>,
}

impl FakeApi {
    pub fn success(version: &str, tables: &[&str]) -> Self {
        let paths = tables
            .iter()
            .map(|name| (name.to_string(), format!("/json/en/{name}-{version}.json")))
            .collect();
        let data = tables
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let hash = 1000 + i as u32;
                let defs = DefinitionTable::from([(
                    hash,
                    json!({ "hash": hash, "displayProperties": { "name": name } }),
                )]);
                (name.to_string(), defs)
            })
            .collect();
        Self {
            metadata: RemoteMetadata::Success(ManifestMetadata {
                version: version.into(),
                tables: TableLocation::new(BTreeMap::from([("en".to_string(), paths)])),
            }),
            tables: data,
            slice_calls: Cell::new(0),
        }
    }

    pub fn failure(status: &str, message: &str) -> Self {
        Self {
            metadata: RemoteMetadata::Failure {
                status: status.into(),
                code: 5,
                message: message.into(),
            },
            tables: BTreeMap::new(),
            slice_calls: Cell::new(0),
        }
    }
}

impl ManifestApi for FakeApi {
    async fn fetch_metadata(&self) -> Result<RemoteMetadata, String> {
        Ok(self.metadata.clone())
    }

    async fn fetch_slice(&self, request: &SliceRequest<'_>) -> Result<ManifestSlice, String> {
        self.slice_calls.set(self.slice_calls.get() + 1);
        let mut slice = ManifestSlice::new();
        for table in request.tables {
            if request.location.path_for(request.locale, table.remote).is_none() {
                continue;
            }
            if let Some(defs) = self.tables.get(table.remote) {
                slice.insert(table.remote.to_string(), defs.clone());
            }
        }
        Ok(slice)
    }
}
