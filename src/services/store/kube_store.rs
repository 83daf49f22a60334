use std::{fmt::Debug, marker::PhantomData};

use async_trait::async_trait;
use k8s_openapi::{serde::de::DeserializeOwned, NamespaceResourceScope};
use kube::{
    api::{DeleteParams, ListParams, PostParams},
    Api, Client, Resource, ResourceExt,
};
use serde::Serialize;
use tracing::{debug, span, warn, Instrument, Level};

use super::{ObjectStore, StoreError};
use crate::common::{format_resource, ResourceKey};

/// [`ObjectStore`] backed by the Kubernetes API server.
pub struct KubeObjectStore<R> {
    client: Client,
    resource: PhantomData<fn() -> R>,
}

impl<R> Clone for KubeObjectStore<R> {
    fn clone(&self) -> Self {
        Self { client: self.client.clone(), resource: PhantomData }
    }
}

impl<R> KubeObjectStore<R>
where
    R: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
{
    pub fn new(client: Client) -> Self {
        Self { client, resource: PhantomData }
    }

    fn api(&self, namespace: &str) -> Api<R> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn key_of<R>(object: &R) -> Result<ResourceKey, StoreError>
where
    R: Resource<DynamicType = ()>,
{
    let key = ResourceKey::from(object);
    if object.meta().name.is_none() {
        return Err(StoreError::MissingName(key));
    }
    Ok(key)
}

fn map_error(key: ResourceKey, error: kube::Error) -> StoreError {
    match error {
        kube::Error::Api(response) if response.code == 409 => StoreError::Conflict(key),
        kube::Error::Api(response) if response.code == 404 => StoreError::NotFound(key),
        error => StoreError::Kube(error),
    }
}

#[async_trait]
impl<R> ObjectStore<R> for KubeObjectStore<R>
where
    R: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    R: DeserializeOwned + Serialize + Clone + Debug,
    R: Send + Sync + 'static,
{
    async fn get(&self, namespace: &str, name: &str) -> Result<R, StoreError> {
        let key = ResourceKey::of::<R>(namespace, name);
        match self.api(namespace).get_opt(name).await {
            Ok(Some(object)) => Ok(object),
            Ok(None) => Err(StoreError::NotFound(key)),
            Err(e) => Err(map_error(key, e)),
        }
    }

    async fn list_by_label(&self, namespace: &str, selector: &str) -> Result<Vec<R>, StoreError> {
        let span = span!(Level::DEBUG, "ObjectStore", resource = format_resource::<R>(), operation = "ListByLabel", namespace, selector);
        let objects = self.api(namespace).list(&ListParams::default().labels(selector)).instrument(span.clone()).await?;
        span.in_scope(|| debug!("found {} objects", objects.items.len()));
        Ok(objects.items)
    }

    async fn list_all(&self) -> Result<Vec<R>, StoreError> {
        let api: Api<R> = Api::all(self.client.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn create(&self, object: &R) -> Result<R, StoreError> {
        let key = ResourceKey::from(object);
        let span = span!(Level::INFO, "ObjectStore", operation = "Create", id = %key);
        let res = self.api(&key.namespace).create(&PostParams::default(), object).instrument(span.clone()).await;
        match res {
            Ok(created) => {
                span.in_scope(|| debug!("created {}", created.name_any()));
                Ok(created)
            },
            Err(e) => {
                span.in_scope(|| warn!("create failed {e:?}"));
                Err(map_error(key, e))
            },
        }
    }

    async fn update(&self, object: &R) -> Result<R, StoreError> {
        let key = key_of(object)?;
        let span = span!(Level::INFO, "ObjectStore", operation = "Update", id = %key);
        let res = self.api(&key.namespace).replace(&key.name, &PostParams::default(), object).instrument(span.clone()).await;
        match res {
            Ok(updated) => Ok(updated),
            Err(e) => {
                span.in_scope(|| warn!("update failed {e:?}"));
                Err(map_error(key, e))
            },
        }
    }

    async fn delete(&self, object: &R) -> Result<(), StoreError> {
        let key = key_of(object)?;
        let span = span!(Level::INFO, "ObjectStore", operation = "Delete", id = %key);
        match self.api(&key.namespace).delete(&key.name, &DeleteParams::default()).instrument(span.clone()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(response)) if response.code == 404 => {
                span.in_scope(|| debug!("already deleted"));
                Ok(())
            },
            Err(e) => {
                span.in_scope(|| warn!("delete failed {e:?}"));
                Err(map_error(key, e))
            },
        }
    }
}
