use std::collections::BTreeMap;

use itertools::Itertools;
use kube::ResourceExt;
use tracing::warn;

use crate::apis::{AccessRule, VirtualService};

/// What the cluster should contain for one APIRule. Access rules are keyed by match URL.
#[derive(Clone, Debug, PartialEq)]
pub struct DesiredState {
    pub virtual_service: VirtualService,
    pub access_rules: BTreeMap<String, AccessRule>,
}

/// What the cluster contains for one APIRule, found through the owner label.
/// Objects that lost the duplicate resolution are kept in `stale_*` so they can be deleted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActualState {
    pub virtual_service: Option<VirtualService>,
    pub access_rules: BTreeMap<String, AccessRule>,
    pub stale_virtual_services: Vec<VirtualService>,
    pub stale_access_rules: Vec<AccessRule>,
}

impl ActualState {
    /// Several virtual services for one owner resolve to the one with the smallest name.
    /// Access rules sharing a match URL resolve to the one with the largest name.
    pub fn from_objects(virtual_services: Vec<VirtualService>, access_rules: Vec<AccessRule>) -> Self {
        let mut virtual_services = virtual_services.into_iter().sorted_by_key(ResourceExt::name_any);
        let virtual_service = virtual_services.next();
        let stale_virtual_services = virtual_services.collect::<Vec<_>>();
        if let Some(chosen) = virtual_service.as_ref() {
            if !stale_virtual_services.is_empty() {
                let stale = stale_virtual_services.iter().map(ResourceExt::name_any).collect::<Vec<_>>();
                warn!("Multiple virtual services with the same owner, using {} and deleting {stale:?}", chosen.name_any());
            }
        }

        let mut rules = BTreeMap::new();
        let mut stale_access_rules = vec![];
        for access_rule in access_rules.into_iter().sorted_by_key(ResourceExt::name_any) {
            let key = access_rule.spec.matcher.url.clone();
            if let Some(previous) = rules.insert(key.clone(), access_rule) {
                warn!("Multiple access rules for {key}, deleting {}", previous.name_any());
                stale_access_rules.push(previous);
            }
        }

        Self { virtual_service, access_rules: rules, stale_virtual_services, stale_access_rules }
    }
}
