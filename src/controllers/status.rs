use k8s_openapi::{apimachinery::pkg::apis::meta::v1::Time, chrono::Utc};

use crate::{
    apis::{APIRuleResourceStatus, APIRuleStatus},
    processing::{ObjectKind, ProcessingError},
    validation::{describe, Failure},
};

fn status(
    observed_generation: Option<i64>,
    api_rule: APIRuleResourceStatus,
    virtual_service: APIRuleResourceStatus,
    access_rule: APIRuleResourceStatus,
) -> APIRuleStatus {
    APIRuleStatus {
        last_processed_time: Some(Time(Utc::now())),
        observed_generation,
        api_rule_status: Some(api_rule),
        virtual_service_status: Some(virtual_service),
        access_rule_status: Some(access_rule),
    }
}

pub fn reconciled(generation: Option<i64>) -> APIRuleStatus {
    status(generation, APIRuleResourceStatus::ok(), APIRuleResourceStatus::ok(), APIRuleResourceStatus::ok())
}

/// Nothing was sent to the cluster. The generation still counts as processed since retrying cannot help.
pub fn invalid(generation: Option<i64>, failures: &[Failure]) -> APIRuleStatus {
    status(generation, APIRuleResourceStatus::error(describe(failures)), APIRuleResourceStatus::skipped(), APIRuleResourceStatus::skipped())
}

/// Keeps `observed_generation` so the requeued pass handles the same generation again.
/// A kind is reported `OK` only when it was actually applied before the failure.
pub fn failed(observed_generation: Option<i64>, error: &ProcessingError) -> APIRuleStatus {
    let desc = error.to_string();
    let api_rule = APIRuleResourceStatus::error(desc.clone());
    let (virtual_service, access_rule) = match (error, error.kind()) {
        (_, None) => (APIRuleResourceStatus::skipped(), APIRuleResourceStatus::skipped()),
        (ProcessingError::Fetch { .. }, Some(ObjectKind::AccessRule)) => (APIRuleResourceStatus::skipped(), APIRuleResourceStatus::error(desc)),
        (_, Some(ObjectKind::AccessRule)) => (APIRuleResourceStatus::ok(), APIRuleResourceStatus::error(desc)),
        (_, Some(ObjectKind::VirtualService)) => (APIRuleResourceStatus::error(desc), APIRuleResourceStatus::skipped()),
    };
    status(observed_generation, api_rule, virtual_service, access_rule)
}
