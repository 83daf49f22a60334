//! Field level checks run before an APIRule is reconciled and by the admission webhook.

mod helpers;
mod labels;
mod strategies;

pub use helpers::{has_duplicates, is_config_empty, is_valid_domain_name, is_valid_url};
use kube::ResourceExt;
pub use labels::{verify_label_value, LabelError};
pub use strategies::{AccessStrategyValidator, DummyValidator, JwtValidator, NoConfigValidator, StrategyValidators};
use typed_builder::TypedBuilder;

use crate::{
    apis::{APIRule, Handler, Rule, Service, VirtualService},
    common::{api_namespace, owner_label_value, OWNER_LABEL},
    processing::AccessStrategy,
};

const MAX_DESCRIBED_FAILURES: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub attribute_path: String,
    pub message: String,
}

impl Failure {
    pub fn new(attribute_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { attribute_path: attribute_path.into(), message: message.into() }
    }
}

/// Human readable summary of `failures`, listing at most three of them.
pub fn describe(failures: &[Failure]) -> String {
    if let [failure] = failures {
        return format!("Validation error: Attribute \"{}\": {}", failure.attribute_path, failure.message);
    }
    let mut description = "Multiple validation errors: ".to_owned();
    for failure in failures.iter().take(MAX_DESCRIBED_FAILURES) {
        description.push_str(&format!("\nAttribute \"{}\": {}", failure.attribute_path, failure.message));
    }
    if failures.len() > MAX_DESCRIBED_FAILURES {
        description.push_str(&format!("\n{} more error(s)...", failures.len() - MAX_DESCRIBED_FAILURES));
    }
    description
}

#[derive(Clone, Debug, Default, TypedBuilder)]
pub struct ApiRuleValidator {
    #[builder(default)]
    service_blocklist: Vec<String>,
    #[builder(default)]
    strategies: StrategyValidators,
}

impl ApiRuleValidator {
    /// Checks `api` against itself and against the virtual services already present in the cluster.
    pub fn validate(&self, api: &APIRule, virtual_services: &[VirtualService]) -> Vec<Failure> {
        self.validate_with(api, Some(virtual_services))
    }

    /// Checks that need nothing but the APIRule itself.
    pub fn validate_spec(&self, api: &APIRule) -> Vec<Failure> {
        self.validate_with(api, None)
    }

    fn validate_with(&self, api: &APIRule, virtual_services: Option<&[VirtualService]>) -> Vec<Failure> {
        let mut failures = self.validate_service(".spec.service", &api.spec.service);
        if let Some(virtual_services) = virtual_services {
            failures.extend(self.validate_host_occupancy(".spec.service.host", api, virtual_services));
        }
        failures.extend(self.validate_owner(".metadata.name", api));
        failures.extend(self.validate_rules(".spec.rules", &api.spec.rules));
        failures
    }

    fn validate_owner(&self, attribute_path: &str, api: &APIRule) -> Vec<Failure> {
        let value = owner_label_value(&api.name_any(), &api_namespace(api));
        match verify_label_value(&value) {
            Ok(()) => vec![],
            Err(_) => vec![Failure::new(attribute_path, format!("Owner label value {value} is not a valid label value"))],
        }
    }

    fn validate_service(&self, attribute_path: &str, service: &Service) -> Vec<Failure> {
        let mut failures = vec![];
        if self.service_blocklist.contains(&service.name) {
            failures.push(Failure::new(format!("{attribute_path}.name"), "This service has been blocklisted"));
        }
        if !is_valid_domain_name(&service.host) {
            failures.push(Failure::new(format!("{attribute_path}.host"), "Host is not a valid domain name"));
        }
        failures
    }

    fn validate_host_occupancy(&self, attribute_path: &str, api: &APIRule, virtual_services: &[VirtualService]) -> Vec<Failure> {
        let owner = owner_label_value(&api.name_any(), &api_namespace(api));
        let occupied = virtual_services
            .iter()
            .filter(|vs| vs.labels().get(OWNER_LABEL) != Some(&owner))
            .any(|vs| vs.spec.hosts.iter().any(|host| *host == api.spec.service.host));
        if occupied {
            vec![Failure::new(attribute_path, "This host is occupied by another Virtual Service")]
        } else {
            vec![]
        }
    }

    fn validate_rules(&self, attribute_path: &str, rules: &[Rule]) -> Vec<Failure> {
        if rules.is_empty() {
            return vec![Failure::new(attribute_path, "No rules defined")];
        }
        let mut failures = vec![];
        if has_duplicates(rules) {
            failures.push(Failure::new(attribute_path, "multiple rules defined for the same path"));
        }
        for (i, rule) in rules.iter().enumerate() {
            failures.extend(self.validate_access_strategies(&format!("{attribute_path}[{i}].accessStrategies"), &rule.access_strategies));
        }
        failures
    }

    fn validate_access_strategies(&self, attribute_path: &str, access_strategies: &[Handler]) -> Vec<Failure> {
        if access_strategies.is_empty() {
            return vec![Failure::new(attribute_path, "No accessStrategies defined")];
        }
        access_strategies
            .iter()
            .enumerate()
            .flat_map(|(i, handler)| {
                let strategy_path = format!("{attribute_path}[{i}]");
                match handler.name.parse::<AccessStrategy>() {
                    Ok(strategy) => self.strategies.for_strategy(strategy).validate(&strategy_path, handler),
                    Err(_) => vec![Failure::new(format!("{strategy_path}.handler"), format!("Unsupported accessStrategy: {}", handler.name))],
                }
            })
            .collect()
    }
}
