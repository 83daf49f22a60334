use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Handler;

/// Exposes a backend service on a public host with per-path access rules.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "gateway.kyma-project.io",
    version = "v1alpha1",
    kind = "APIRule",
    plural = "apirules",
    status = "APIRuleStatus",
    namespaced,
    derive = "PartialEq",
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.APIRuleStatus.code"}"#,
    printcolumn = r#"{"name":"Host","type":"string","jsonPath":".spec.service.host"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct APIRuleSpec {
    pub service: Service,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Service {
    pub name: String,
    pub host: String,
    pub port: u32,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub path: String,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub access_strategies: Vec<Handler>,
    #[serde(default)]
    pub mutators: Vec<Handler>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusCode {
    #[default]
    Ok,
    Skipped,
    Error,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct APIRuleResourceStatus {
    pub code: StatusCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

impl APIRuleResourceStatus {
    pub fn ok() -> Self {
        Self { code: StatusCode::Ok, desc: None }
    }

    pub fn skipped() -> Self {
        Self { code: StatusCode::Skipped, desc: None }
    }

    pub fn error(desc: impl Into<String>) -> Self {
        Self { code: StatusCode::Error, desc: Some(desc.into()) }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct APIRuleStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_processed_time: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(rename = "APIRuleStatus", default, skip_serializing_if = "Option::is_none")]
    pub api_rule_status: Option<APIRuleResourceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_service_status: Option<APIRuleResourceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_rule_status: Option<APIRuleResourceStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_apirule() {
        let yaml = r#"
apiVersion: gateway.kyma-project.io/v1alpha1
kind: APIRule
metadata:
  name: httpbin
  namespace: default
  generation: 2
spec:
  gateway: kyma-gateway.kyma-system.svc.cluster.local
  service:
    name: httpbin
    host: httpbin.kyma.local
    port: 8000
  rules:
    - path: /headers
      methods: ["GET"]
      accessStrategies:
        - handler: jwt
          config:
            required_scope: ["read", "write"]
      mutators:
        - handler: header
    - path: /.*
      accessStrategies:
        - handler: allow
status:
  observedGeneration: 1
  APIRuleStatus:
    code: ERROR
    desc: broken
"#;
        let api: APIRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(api.spec.service.port, 8000);
        assert_eq!(api.spec.rules.len(), 2);
        assert_eq!(api.spec.rules[0].access_strategies[0].name, "jwt");
        assert_eq!(api.spec.rules[0].access_strategies[0].config, Some(serde_json::json!({"required_scope": ["read", "write"]})));
        assert!(api.spec.rules[1].methods.is_empty());
        assert!(api.spec.rules[1].mutators.is_empty());
        let status = api.status.unwrap();
        assert_eq!(status.observed_generation, Some(1));
        assert_eq!(status.api_rule_status, Some(APIRuleResourceStatus::error("broken")));
    }

    #[test]
    fn test_status_codes_serialize_uppercase() {
        let status = APIRuleStatus {
            api_rule_status: Some(APIRuleResourceStatus::ok()),
            virtual_service_status: Some(APIRuleResourceStatus::skipped()),
            access_rule_status: Some(APIRuleResourceStatus::error("failed")),
            ..Default::default()
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["APIRuleStatus"]["code"], "OK");
        assert_eq!(value["virtualServiceStatus"]["code"], "SKIPPED");
        assert_eq!(value["accessRuleStatus"]["code"], "ERROR");
        assert_eq!(value["accessRuleStatus"]["desc"], "failed");
    }
}
