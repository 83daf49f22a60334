use std::sync::Arc;

use futures::FutureExt;
use kube::Client;
use tracing::info;

pub mod admission;
pub mod apis;
pub mod builders;
pub mod common;
pub mod configuration;
pub mod controllers;
pub mod processing;
pub mod services;
pub mod validation;

use apis::{AccessRule, VirtualService};
use configuration::Configuration;
use controllers::{ApiRuleController, ApiRuleHandler};
use processing::ReconciliationEngine;
use services::store::KubeObjectStore;
use validation::ApiRuleValidator;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;

pub async fn start(configuration: Configuration) -> Result<()> {
    info!("APIRule controller started");
    let client = Client::try_default().await?;

    let engine = ReconciliationEngine::builder()
        .virtual_services(Arc::new(KubeObjectStore::<VirtualService>::new(client.clone())))
        .access_rules(Arc::new(KubeObjectStore::<AccessRule>::new(client.clone())))
        .authorization_proxy(configuration.authorization_proxy.address.clone())
        .build();
    let validator = Arc::new(ApiRuleValidator::builder().service_blocklist(configuration.service_blocklist.clone()).build());
    let handler = ApiRuleHandler::builder().engine(engine).validator(Arc::clone(&validator)).build();
    let api_rule_controller = ApiRuleController::new(configuration.controller_name.clone(), client, handler);

    let api_rule_controller_task = async move {
        info!("APIRule controller...started");
        api_rule_controller.get_controller().await;
        info!("APIRule controller...stopped");
        crate::Result::<()>::Ok(())
    };
    let admission_task = admission::start(configuration.admission_interface.clone(), validator);

    let services = vec![api_rule_controller_task.boxed(), admission_task.boxed()];
    futures::future::join_all(services).await.into_iter().collect::<Result<Vec<_>>>()?;
    info!("APIRule controller stopped");
    Ok(())
}
