use std::time::Duration;

mod apirule;
mod status;

pub use apirule::{ApiRuleController, ApiRuleHandler, HandlerOutcome};

#[derive(thiserror::Error, Debug, PartialEq, PartialOrd)]
pub enum ControllerError {
    PatchFailed,
    InvalidPayload(String),
    StoreFailure,
    Processing,
}

const RECONCILE_LONG_WAIT: Duration = Duration::from_secs(3600);
const RECONCILE_ERROR_WAIT: Duration = Duration::from_secs(5);

impl std::fmt::Display for ControllerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
