//! Access to the objects kept by the cluster.

#[cfg(test)]
pub(crate) mod inmemory;
mod kube_store;

use async_trait::async_trait;
pub use kube_store::KubeObjectStore;
use thiserror::Error;

use crate::common::ResourceKey;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(ResourceKey),
    #[error("{0} was modified by someone else")]
    Conflict(ResourceKey),
    #[error("{0} has no name")]
    MissingName(ResourceKey),
    #[error("kubernetes api error {0}")]
    Kube(#[from] kube::Error),
    #[error("store unavailable {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ObjectStore<R>: Send + Sync
where
    R: Send + Sync,
{
    async fn get(&self, namespace: &str, name: &str) -> Result<R, StoreError>;
    async fn list_by_label(&self, namespace: &str, selector: &str) -> Result<Vec<R>, StoreError>;
    async fn list_all(&self) -> Result<Vec<R>, StoreError>;
    async fn create(&self, object: &R) -> Result<R, StoreError>;
    /// Fails with [`StoreError::Conflict`] when `object` carries a stale resource version.
    async fn update(&self, object: &R) -> Result<R, StoreError>;
    /// Deleting an object that is already gone succeeds.
    async fn delete(&self, object: &R) -> Result<(), StoreError>;
}
