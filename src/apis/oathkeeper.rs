use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Handler;

/// Oathkeeper access rule. Re-exported as [`super::AccessRule`] so it does not clash with APIRule rule entries.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(group = "oathkeeper.ory.sh", version = "v1alpha1", kind = "Rule", plural = "rules", namespaced, derive = "PartialEq")]
pub struct AccessRuleSpec {
    pub upstream: Upstream,
    #[serde(rename = "match")]
    pub matcher: Match,
    #[serde(default)]
    pub authenticators: Vec<Handler>,
    pub authorizer: Handler,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutators: Option<Vec<Handler>>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Upstream {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_host: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Match {
    pub url: String,
    #[serde(default)]
    pub methods: Vec<String>,
}
