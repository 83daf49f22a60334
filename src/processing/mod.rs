//! Turns an APIRule into one VirtualService and one access rule per secured rule.
//!
//! A pass computes the desired state, fetches what the cluster holds for the APIRule
//! through the owner label, diffs the two and applies the result. Apply runs the
//! VirtualService first and then the access rules in match URL order. The first failing
//! store operation ends the pass; the next pass converges from wherever it stopped.

mod patch;
mod state;
mod strategies;

use std::{collections::BTreeMap, fmt::Display, sync::Arc};

use kube::ResourceExt;
pub use patch::{diff, ObjectChange, Patch};
pub use state::{ActualState, DesiredState};
pub use strategies::{builder_for, AccessStrategy, AuthenticatorBuilder};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use typed_builder::TypedBuilder;

use crate::{
    apis::{APIRule, AccessRule, Rule, VirtualService},
    builders::{access_rule_name, api_rule_owner, match_url, service_host, service_url, AccessRuleObject, RegexRoute, RouteDestination, VirtualServiceObject},
    common::{api_namespace, owner_labels, owner_selector, ResourceKey},
    configuration::Address,
    services::store::{ObjectStore, StoreError},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    VirtualService,
    AccessRule,
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::VirtualService => f.write_str("VirtualService"),
            ObjectKind::AccessRule => f.write_str("AccessRule"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("could not fetch {kind}: {source}")]
    Fetch { kind: ObjectKind, source: StoreError },
    #[error("{kind} {key} was modified concurrently, retry")]
    Conflict { kind: ObjectKind, key: String },
    #[error("could not apply {kind} {key}: {source}")]
    Apply { kind: ObjectKind, key: String, source: StoreError },
    #[error("unsupported access strategy {0}")]
    UnsupportedStrategy(String),
}

impl PartialEq for ProcessingError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ProcessingError::UnsupportedStrategy(a), ProcessingError::UnsupportedStrategy(b)) => a == b,
            (ProcessingError::Conflict { kind: a, key: x }, ProcessingError::Conflict { kind: b, key: y }) => a == b && x == y,
            (ProcessingError::Fetch { kind: a, .. }, ProcessingError::Fetch { kind: b, .. }) => a == b,
            (ProcessingError::Apply { kind: a, key: x, .. }, ProcessingError::Apply { kind: b, key: y, .. }) => a == b && x == y,
            _ => false,
        }
    }
}

impl ProcessingError {
    /// Kind whose reconciliation failed. `None` when nothing was sent to the cluster.
    pub fn kind(&self) -> Option<ObjectKind> {
        match self {
            ProcessingError::Fetch { kind, .. } | ProcessingError::Conflict { kind, .. } | ProcessingError::Apply { kind, .. } => Some(*kind),
            ProcessingError::UnsupportedStrategy(_) => None,
        }
    }
}

type Result<T, E = ProcessingError> = std::result::Result<T, E>;

/// A rule is secured when it has a mutator or an access strategy that needs the authorization proxy.
pub fn is_secured(rule: &Rule) -> bool {
    !rule.mutators.is_empty() || rule.access_strategies.iter().any(|strategy| strategy.name.parse::<AccessStrategy>().map_or(true, AccessStrategy::requires_proxy))
}

#[derive(Clone, TypedBuilder)]
pub struct ReconciliationEngine {
    virtual_services: Arc<dyn ObjectStore<VirtualService>>,
    access_rules: Arc<dyn ObjectStore<AccessRule>>,
    authorization_proxy: Address,
}

impl ReconciliationEngine {
    pub fn virtual_services(&self) -> &Arc<dyn ObjectStore<VirtualService>> {
        &self.virtual_services
    }

    pub fn compute_desired(&self, api: &APIRule) -> Result<DesiredState> {
        let namespace = api_namespace(api);
        let service = &api.spec.service;
        let labels = owner_labels(api);
        let owner = api_rule_owner(api);
        let name = api.metadata.name.clone().unwrap_or_default();

        let mut routes = Vec::with_capacity(api.spec.rules.len());
        let mut access_rules = BTreeMap::new();
        for rule in &api.spec.rules {
            let destination = if is_secured(rule) {
                let authenticators =
                    rule.access_strategies.iter().map(|strategy| Ok(builder_for(&strategy.name)?.build(strategy.config.as_ref()))).collect::<Result<Vec<_>>>()?;
                let url = match_url(&service.host, &rule.path);
                let access_rule: AccessRule = AccessRuleObject::builder()
                    .name(access_rule_name(&name, &url))
                    .namespace(namespace.clone())
                    .labels(labels.clone())
                    .owner(owner.clone())
                    .upstream_url(service_url(&service.name, &namespace, service.port))
                    .match_url(url)
                    .methods(rule.methods.clone())
                    .authenticators(authenticators)
                    .mutators(rule.mutators.clone())
                    .build();
                let key = access_rule.spec.matcher.url.clone();
                if access_rules.insert(key.clone(), access_rule).is_some() {
                    warn!("Rules share the match url {key}, only the last one is kept");
                }
                RouteDestination::builder().host(self.authorization_proxy.hostname.clone()).port(u32::from(self.authorization_proxy.port)).build()
            } else {
                RouteDestination::builder().host(service_host(&service.name, &namespace)).port(service.port).build()
            };
            routes.push(RegexRoute::builder().path(rule.path.clone()).destination(destination).build());
        }

        let virtual_service = VirtualServiceObject::builder()
            .name(name)
            .namespace(namespace)
            .labels(labels)
            .owner(owner)
            .host(service.host.clone())
            .gateway(api.spec.gateway.clone())
            .http(routes)
            .build();
        Ok(DesiredState { virtual_service, access_rules })
    }

    pub async fn fetch_actual(&self, api: &APIRule) -> Result<ActualState> {
        let namespace = api_namespace(api);
        let selector = owner_selector(api);
        let mut virtual_services = self
            .virtual_services
            .list_by_label(&namespace, &selector)
            .await
            .map_err(|source| ProcessingError::Fetch { kind: ObjectKind::VirtualService, source })?;
        if virtual_services.is_empty() {
            virtual_services.extend(self.adoptable_virtual_service(api, &namespace).await?);
        }
        let access_rules = self
            .access_rules
            .list_by_label(&namespace, &selector)
            .await
            .map_err(|source| ProcessingError::Fetch { kind: ObjectKind::AccessRule, source })?;
        Ok(ActualState::from_objects(virtual_services, access_rules))
    }

    /// A virtual service carrying the APIRule's name and a controller reference to it, but not the
    /// owner label. Without it the create would conflict with the object on every pass.
    async fn adoptable_virtual_service(&self, api: &APIRule, namespace: &str) -> Result<Option<VirtualService>> {
        match self.virtual_services.get(namespace, &api.name_any()).await {
            Ok(existing) if is_controlled_by(&existing, api) => {
                warn!("Adopting {} which lost its owner label", existing.name_any());
                Ok(Some(existing))
            },
            Ok(_) | Err(StoreError::NotFound(_)) => Ok(None),
            Err(source) => Err(ProcessingError::Fetch { kind: ObjectKind::VirtualService, source }),
        }
    }

    pub async fn apply(&self, patch: Patch) -> Result<()> {
        apply_change(self.virtual_services.as_ref(), ObjectKind::VirtualService, &patch.virtual_service).await?;
        for change in &patch.stale_virtual_services {
            apply_change(self.virtual_services.as_ref(), ObjectKind::VirtualService, change).await?;
        }
        for change in patch.access_rules.values().chain(&patch.stale_access_rules) {
            apply_change(self.access_rules.as_ref(), ObjectKind::AccessRule, change).await?;
        }
        Ok(())
    }

    /// One full pass for `api`.
    #[instrument(level = "info", name = "ReconciliationEngine", skip_all, fields(id = %ResourceKey::from(api)))]
    pub async fn reconcile(&self, api: &APIRule) -> Result<()> {
        let desired = self.compute_desired(api)?;
        let actual = self.fetch_actual(api).await?;
        let patch = diff(desired, actual);
        if patch.is_noop() {
            debug!("Nothing to change");
        }
        self.apply(patch).await?;
        info!("Reconciled");
        Ok(())
    }
}

fn is_controlled_by<R>(object: &R, api: &APIRule) -> bool
where
    R: kube::Resource,
{
    api.uid().is_some_and(|uid| object.owner_references().iter().any(|owner| owner.uid == uid && owner.controller == Some(true)))
}

fn change_key<R>(change: &ObjectChange<R>) -> String
where
    R: kube::Resource<DynamicType = ()>,
{
    ResourceKey::from(change.object()).to_string()
}

async fn apply_change<R>(store: &dyn ObjectStore<R>, kind: ObjectKind, change: &ObjectChange<R>) -> Result<()>
where
    R: kube::Resource<DynamicType = ()> + Send + Sync,
{
    if change.is_noop() {
        return Ok(());
    }
    let key = change_key(change);
    debug!("{} {key}", change.action());
    let res = match change {
        ObjectChange::Create(object) => store.create(object).await.map(|_| ()),
        ObjectChange::Update { object, .. } => store.update(object).await.map(|_| ()),
        ObjectChange::Delete(object) => store.delete(object).await,
    };
    res.map_err(|source| match source {
        StoreError::Conflict(_) => ProcessingError::Conflict { kind, key: key.clone() },
        source => ProcessingError::Apply { kind, key: key.clone(), source },
    })
}
