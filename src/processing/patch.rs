use std::collections::BTreeMap;

use kube::{core::object::HasSpec, Resource, ResourceExt};

use super::state::{ActualState, DesiredState};
use crate::apis::{AccessRule, VirtualService};

#[derive(Clone, Debug, PartialEq)]
pub enum ObjectChange<R> {
    Create(R),
    /// The existing object carrying the desired spec. `changed` is false when the spec was already up to date.
    Update { object: R, changed: bool },
    Delete(R),
}

impl<R> ObjectChange<R> {
    pub fn object(&self) -> &R {
        match self {
            ObjectChange::Create(object) | ObjectChange::Update { object, .. } | ObjectChange::Delete(object) => object,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, ObjectChange::Update { changed: false, .. })
    }

    pub fn action(&self) -> &'static str {
        match self {
            ObjectChange::Create(_) => "create",
            ObjectChange::Update { .. } => "update",
            ObjectChange::Delete(_) => "delete",
        }
    }
}

/// Store operations turning the actual state into the desired one.
/// `stale_*` hold deletions of owned duplicates.
#[derive(Clone, Debug, PartialEq)]
pub struct Patch {
    pub virtual_service: ObjectChange<VirtualService>,
    pub stale_virtual_services: Vec<ObjectChange<VirtualService>>,
    pub access_rules: BTreeMap<String, ObjectChange<AccessRule>>,
    pub stale_access_rules: Vec<ObjectChange<AccessRule>>,
}

impl Patch {
    pub fn is_noop(&self) -> bool {
        self.virtual_service.is_noop()
            && self.stale_virtual_services.is_empty()
            && self.access_rules.values().all(ObjectChange::is_noop)
            && self.stale_access_rules.is_empty()
    }
}

/// Identity of `existing` is kept. The spec is replaced and the desired labels are put back.
fn update<R>(mut existing: R, desired: &R) -> ObjectChange<R>
where
    R: HasSpec + Resource,
    R::Spec: Clone + PartialEq,
{
    let mut changed = existing.spec() != desired.spec();
    *existing.spec_mut() = desired.spec().clone();
    let labels = existing.labels_mut();
    for (key, value) in desired.labels() {
        if labels.get(key) != Some(value) {
            labels.insert(key.clone(), value.clone());
            changed = true;
        }
    }
    ObjectChange::Update { object: existing, changed }
}

pub fn diff(desired: DesiredState, actual: ActualState) -> Patch {
    let DesiredState { virtual_service: desired_virtual_service, access_rules: desired_access_rules } = desired;
    let ActualState { virtual_service: actual_virtual_service, access_rules: mut actual_access_rules, stale_virtual_services, stale_access_rules } = actual;

    let virtual_service = match actual_virtual_service {
        Some(existing) => update(existing, &desired_virtual_service),
        None => ObjectChange::Create(desired_virtual_service),
    };

    let mut access_rules = BTreeMap::new();
    for (key, desired_access_rule) in desired_access_rules {
        let change = match actual_access_rules.remove(&key) {
            Some(existing) => update(existing, &desired_access_rule),
            None => ObjectChange::Create(desired_access_rule),
        };
        access_rules.insert(key, change);
    }
    for (key, orphan) in actual_access_rules {
        access_rules.insert(key, ObjectChange::Delete(orphan));
    }

    Patch {
        virtual_service,
        stale_virtual_services: stale_virtual_services.into_iter().map(ObjectChange::Delete).collect(),
        access_rules,
        stale_access_rules: stale_access_rules.into_iter().map(ObjectChange::Delete).collect(),
    }
}
