mod resource_key;

use std::collections::BTreeMap;

use kube::ResourceExt;
pub use resource_key::{ResourceKey, DEFAULT_NAMESPACE_NAME};

use crate::apis::APIRule;

/// Label carried by every object created for an APIRule. Its value is `<name>.<namespace>`.
pub const OWNER_LABEL: &str = "owner";

pub fn owner_label_value(name: &str, namespace: &str) -> String {
    format!("{name}.{namespace}")
}

pub fn owner_labels(api: &APIRule) -> BTreeMap<String, String> {
    BTreeMap::from([(OWNER_LABEL.to_owned(), owner_label_value(&api.name_any(), &api_namespace(api)))])
}

/// Label selector matching everything created for `api`.
pub fn owner_selector(api: &APIRule) -> String {
    format!("{OWNER_LABEL}={}", owner_label_value(&api.name_any(), &api_namespace(api)))
}

pub fn api_namespace(api: &APIRule) -> String {
    api.namespace().unwrap_or(DEFAULT_NAMESPACE_NAME.to_owned())
}

pub fn format_resource<R>() -> &'static str {
    std::any::type_name::<R>().split("::").last().unwrap_or_default()
}
