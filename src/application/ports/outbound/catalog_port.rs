//! Catalog port - Interface for loading the static monster catalog

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::MonsterCatalog;

/// Port for the static monster catalog resource
///
/// The catalog is loaded once per session and treated as read-only. A load
/// failure must not take the session down; callers degrade by disabling
/// monster-dependent features instead.
#[async_trait]
pub trait CatalogPort: Send + Sync {
    /// Load the full catalog document
    async fn load(&self) -> Result<MonsterCatalog>;
}
