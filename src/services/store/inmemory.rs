use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use kube::{Resource, ResourceExt};

use super::{ObjectStore, StoreError};
use crate::common::ResourceKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreOperation {
    List,
    Create,
    Update,
    Delete,
}

/// Writes performed by one or more stores, in order. Entries look like `create VirtualService/default.httpbin`.
pub type Journal = Arc<Mutex<Vec<String>>>;

/// Store keeping objects in memory. Like the API server it assigns uids and resource versions
/// and refuses to create a second object under a taken name.
#[derive(Clone)]
pub struct InMemoryStore<R> {
    objects: Arc<Mutex<BTreeMap<ResourceKey, R>>>,
    counter: Arc<Mutex<u64>>,
    failures: Arc<Mutex<Vec<StoreOperation>>>,
    journal: Journal,
}

impl<R> Default for InMemoryStore<R> {
    fn default() -> Self {
        Self::with_journal(Journal::default())
    }
}

impl<R> InMemoryStore<R> {
    pub fn with_journal(journal: Journal) -> Self {
        Self { objects: Arc::default(), counter: Arc::default(), failures: Arc::default(), journal }
    }
}

fn locked<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex.lock().map_err(|_| StoreError::Unavailable("locking error".to_owned()))
}

fn matches_selector(labels: &BTreeMap<String, String>, selector: &str) -> bool {
    selector.split(',').filter(|term| !term.is_empty()).all(|term| match term.split_once('=') {
        Some((key, value)) => labels.get(key).is_some_and(|v| v == value),
        None => labels.contains_key(term),
    })
}

impl<R> InMemoryStore<R>
where
    R: Resource<DynamicType = ()> + Clone,
{
    /// Makes the next call of `operation` fail.
    pub fn fail_next(&self, operation: StoreOperation) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(operation);
        }
    }

    /// Replaces an object behind the controller's back, bumping its resource version.
    pub fn tamper(&self, name: &str, change: impl FnOnce(&mut R)) {
        if let Ok(mut objects) = self.objects.lock() {
            if let Some(object) = objects.values_mut().find(|object| object.meta().name.as_deref() == Some(name)) {
                change(object);
                let version = object.meta().resource_version.as_deref().and_then(|v| v.parse::<u64>().ok()).unwrap_or_default();
                object.meta_mut().resource_version = Some((version + 1).to_string());
            }
        }
    }

    pub fn objects(&self) -> Vec<R> {
        self.objects.lock().map(|objects| objects.values().cloned().collect()).unwrap_or_default()
    }

    pub fn insert(&self, object: R) {
        if let Ok(mut objects) = self.objects.lock() {
            objects.insert(ResourceKey::from(&object), object);
        }
    }

    fn check_failure(&self, operation: StoreOperation) -> Result<(), StoreError> {
        let mut failures = locked(&self.failures)?;
        if let Some(position) = failures.iter().position(|failure| *failure == operation) {
            failures.remove(position);
            return Err(StoreError::Unavailable(format!("injected {operation:?} failure")));
        }
        Ok(())
    }

    fn record(&self, action: &str, key: &ResourceKey) {
        if let Ok(mut journal) = self.journal.lock() {
            journal.push(format!("{action} {key}"));
        }
    }

    fn next_id(&self) -> Result<u64, StoreError> {
        let mut counter = locked(&self.counter)?;
        *counter += 1;
        Ok(*counter)
    }
}

#[async_trait]
impl<R> ObjectStore<R> for InMemoryStore<R>
where
    R: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    async fn get(&self, namespace: &str, name: &str) -> Result<R, StoreError> {
        let key = ResourceKey::of::<R>(namespace, name);
        locked(&self.objects)?.get(&key).cloned().ok_or(StoreError::NotFound(key))
    }

    async fn list_by_label(&self, namespace: &str, selector: &str) -> Result<Vec<R>, StoreError> {
        self.check_failure(StoreOperation::List)?;
        Ok(locked(&self.objects)?
            .values()
            .filter(|object| object.namespace().as_deref() == Some(namespace) && matches_selector(object.labels(), selector))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<R>, StoreError> {
        self.check_failure(StoreOperation::List)?;
        Ok(self.objects())
    }

    async fn create(&self, object: &R) -> Result<R, StoreError> {
        self.check_failure(StoreOperation::Create)?;
        let key = ResourceKey::from(object);
        if object.meta().name.is_none() {
            return Err(StoreError::MissingName(key));
        }
        let mut objects = locked(&self.objects)?;
        if objects.contains_key(&key) {
            return Err(StoreError::Conflict(key));
        }
        let id = self.next_id()?;
        let mut created = object.clone();
        created.meta_mut().uid = Some(format!("uid-{id}"));
        created.meta_mut().resource_version = Some("1".to_owned());

        objects.insert(key.clone(), created.clone());
        self.record("create", &key);
        Ok(created)
    }

    async fn update(&self, object: &R) -> Result<R, StoreError> {
        self.check_failure(StoreOperation::Update)?;
        let key = ResourceKey::from(object);
        if object.meta().name.is_none() {
            return Err(StoreError::MissingName(key));
        }
        let mut objects = locked(&self.objects)?;
        let stored = objects.get(&key).ok_or_else(|| StoreError::NotFound(key.clone()))?;
        let stored_version = stored.meta().resource_version.clone();
        if stored_version != object.meta().resource_version {
            return Err(StoreError::Conflict(key));
        }
        let version = stored_version.as_deref().and_then(|v| v.parse::<u64>().ok()).unwrap_or_default();
        let mut updated = object.clone();
        updated.meta_mut().resource_version = Some((version + 1).to_string());
        objects.insert(key.clone(), updated.clone());
        self.record("update", &key);
        Ok(updated)
    }

    async fn delete(&self, object: &R) -> Result<(), StoreError> {
        self.check_failure(StoreOperation::Delete)?;
        let key = ResourceKey::from(object);
        if locked(&self.objects)?.remove(&key).is_some() {
            self.record("delete", &key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    use super::*;
    use crate::apis::{VirtualService, VirtualServiceSpec};

    fn named(name: &str) -> VirtualService {
        VirtualService {
            metadata: ObjectMeta {
                name: Some(name.to_owned()),
                namespace: Some("default".to_owned()),
                labels: Some(BTreeMap::from([("owner".to_owned(), "httpbin.default".to_owned())])),
                ..Default::default()
            },
            spec: VirtualServiceSpec::default(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_uid_and_version() {
        let store = InMemoryStore::default();
        let created = store.create(&named("httpbin")).await.unwrap();
        assert_eq!(created.metadata.name.as_deref(), Some("httpbin"));
        assert_eq!(created.metadata.uid.as_deref(), Some("uid-1"));
        assert_eq!(created.metadata.resource_version.as_deref(), Some("1"));
        assert_eq!(store.get("default", "httpbin").await.unwrap(), created);
        assert_eq!(store.list_by_label("default", "owner=httpbin.default").await.unwrap().len(), 1);
        assert!(store.list_by_label("default", "owner=other.default").await.unwrap().is_empty());
        assert!(store.list_by_label("other", "owner=httpbin.default").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_of_taken_name_conflicts() {
        let store = InMemoryStore::default();
        store.create(&named("httpbin")).await.unwrap();
        let mut duplicate = named("httpbin");
        duplicate.spec.hosts = vec!["other.kyma.local".to_owned()];
        assert!(matches!(store.create(&duplicate).await.unwrap_err(), StoreError::Conflict(key) if key.name == "httpbin"));
        assert_eq!(store.objects().len(), 1);
        assert!(store.objects()[0].spec.hosts.is_empty());
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let store = InMemoryStore::default();
        let mut unnamed = named("httpbin");
        unnamed.metadata.name = None;
        assert!(matches!(store.create(&unnamed).await.unwrap_err(), StoreError::MissingName(_)));
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let store = InMemoryStore::default();
        let created = store.create(&named("httpbin")).await.unwrap();
        let updated = store.update(&created).await.unwrap();
        assert_eq!(updated.metadata.resource_version.as_deref(), Some("2"));
        assert!(matches!(store.update(&created).await.unwrap_err(), StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_injected_failure_happens_once() {
        let store: InMemoryStore<VirtualService> = InMemoryStore::default();
        store.fail_next(StoreOperation::List);
        assert!(matches!(store.list_all().await.unwrap_err(), StoreError::Unavailable(_)));
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
