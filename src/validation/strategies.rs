use serde::Deserialize;

use super::{
    helpers::{is_config_empty, is_valid_url},
    Failure,
};
use crate::{apis::Handler, processing::AccessStrategy};

pub trait AccessStrategyValidator: Send + Sync {
    /// `attribute_path` points at the access strategy entry.
    fn validate(&self, attribute_path: &str, handler: &Handler) -> Vec<Failure>;
}

/// For strategies that take no configuration at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoConfigValidator;

impl AccessStrategyValidator for NoConfigValidator {
    fn validate(&self, attribute_path: &str, handler: &Handler) -> Vec<Failure> {
        if is_config_empty(handler.config.as_ref()) {
            vec![]
        } else {
            vec![Failure::new(format!("{attribute_path}.config"), format!("strategy: {} does not support configuration", handler.name))]
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct JwtConfig {
    #[serde(default)]
    trusted_issuers: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct JwtValidator;

impl AccessStrategyValidator for JwtValidator {
    fn validate(&self, attribute_path: &str, handler: &Handler) -> Vec<Failure> {
        let config_path = format!("{attribute_path}.config");
        let Some(config) = handler.config.as_ref().filter(|config| !is_config_empty(Some(config))) else {
            return vec![Failure::new(config_path, "supplied config cannot be empty")];
        };
        match serde_json::from_value::<JwtConfig>(config.clone()) {
            Ok(config) => config
                .trusted_issuers
                .iter()
                .enumerate()
                .filter(|(_, issuer)| !is_valid_url(issuer))
                .map(|(i, _)| Failure::new(format!("{config_path}.trusted_issuers[{i}]"), "value is empty or not a valid url"))
                .collect(),
            Err(e) => vec![Failure::new(config_path, format!("Can't read json: {e}"))],
        }
    }
}

/// Accepts any configuration. The authorization proxy checks it when loading the rule.
#[derive(Clone, Copy, Debug, Default)]
pub struct DummyValidator;

impl AccessStrategyValidator for DummyValidator {
    fn validate(&self, _attribute_path: &str, _handler: &Handler) -> Vec<Failure> {
        vec![]
    }
}

/// One validator instance per configuration style.
#[derive(Clone, Copy, Debug, Default)]
pub struct StrategyValidators {
    no_config: NoConfigValidator,
    jwt: JwtValidator,
    dummy: DummyValidator,
}

impl StrategyValidators {
    pub fn for_strategy(&self, strategy: AccessStrategy) -> &dyn AccessStrategyValidator {
        match strategy {
            AccessStrategy::Allow | AccessStrategy::Noop | AccessStrategy::Anonymous | AccessStrategy::Unauthorized | AccessStrategy::CookieSession => {
                &self.no_config
            },
            AccessStrategy::Jwt => &self.jwt,
            AccessStrategy::OAuth2Introspection | AccessStrategy::OAuth2ClientCredentials => &self.dummy,
        }
    }
}
