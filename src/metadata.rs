use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::{AssetError, AssetResult};
use crate::types::{Asset, AssetId};

/// Keyed CRUD over asset records. No core logic depends on the backing
/// representation; concurrent updates to the same id resolve as
/// last-write-wins at this layer.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn save(&self, asset: Asset) -> AssetResult<Asset>;
    async fn find_by_id(&self, id: &AssetId) -> AssetResult<Asset>;
    async fn find_by_owner(&self, owner: &str) -> AssetResult<Vec<Asset>>;
    async fn find_by_parent(&self, parent_id: &str) -> AssetResult<Vec<Asset>>;
    async fn delete_by_id(&self, id: &AssetId) -> AssetResult<()>;
}

/// In-memory metadata store for tests and embedded use
#[derive(Default)]
pub struct MemoryMetadataStore {
    records: RwLock<HashMap<AssetId, Asset>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records (test helper)
    pub fn record_count(&self) -> usize {
        self.records.read().len()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn save(&self, asset: Asset) -> AssetResult<Asset> {
        self.records
            .write()
            .insert(asset.id.clone(), asset.clone());
        Ok(asset)
    }

    async fn find_by_id(&self, id: &AssetId) -> AssetResult<Asset> {
        self.records
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| AssetError::not_found(id.as_str()))
    }

    async fn find_by_owner(&self, owner: &str) -> AssetResult<Vec<Asset>> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|a| a.owner == owner)
            .cloned()
            .collect())
    }

    async fn find_by_parent(&self, parent_id: &str) -> AssetResult<Vec<Asset>> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|a| a.parent_id.as_deref() == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn delete_by_id(&self, id: &AssetId) -> AssetResult<()> {
        self.records.write().remove(id);
        Ok(())
    }
}
