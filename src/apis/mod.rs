//! Resource kinds read and written by the controller.
//!
//! `APIRule` is owned by the user. `VirtualService` and the Oathkeeper `Rule` (named
//! [`AccessRule`] here to avoid clashing with the APIRule rule entries) are owned by the
//! controller and only carry the fields the controller touches.

mod apirule;
mod oathkeeper;
mod virtual_service;

pub use apirule::{APIRule, APIRuleResourceStatus, APIRuleSpec, APIRuleStatus, Rule, Service, StatusCode};
pub use oathkeeper::{AccessRuleSpec, Match, Rule as AccessRule, Upstream};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use virtual_service::{Destination, HTTPMatchRequest, HTTPRoute, HTTPRouteDestination, PortSelector, StringMatch, VirtualService, VirtualServiceSpec};

/// A named handler with an opaque configuration blob.
///
/// Used for APIRule access strategies and mutators as well as for the authenticators,
/// authorizer and mutators of an access rule.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Handler {
    #[serde(rename = "handler")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl Handler {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_owned(), config: None }
    }

    pub fn with_config(name: &str, config: serde_json::Value) -> Self {
        Self { name: name.to_owned(), config: Some(config) }
    }
}
