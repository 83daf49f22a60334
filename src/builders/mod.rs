//! Constructors for the objects the controller writes. No cluster access happens here.

mod access_rule;
mod owner_reference;
mod virtual_service;

use std::collections::BTreeMap;

pub use access_rule::{access_rule_name, match_url, AccessRuleObject, DEFAULT_AUTHORIZER};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
pub use owner_reference::{api_rule_owner, Owner};
pub use virtual_service::{RegexRoute, RouteDestination, VirtualServiceObject};

pub const CLUSTER_DOMAIN: &str = "svc.cluster.local";

/// In-cluster DNS name of a service.
pub fn service_host(name: &str, namespace: &str) -> String {
    format!("{name}.{namespace}.{CLUSTER_DOMAIN}")
}

pub fn service_url(name: &str, namespace: &str, port: u32) -> String {
    format!("http://{}:{port}", service_host(name, namespace))
}

fn object_meta(name: String, namespace: String, labels: BTreeMap<String, String>, owner: OwnerReference) -> ObjectMeta {
    ObjectMeta {
        name: Some(name),
        namespace: Some(namespace),
        labels: Some(labels),
        owner_references: Some(vec![owner]),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_addresses() {
        assert_eq!(service_host("httpbin", "apps"), "httpbin.apps.svc.cluster.local");
        assert_eq!(service_url("httpbin", "apps", 8000), "http://httpbin.apps.svc.cluster.local:8000");
    }
}
