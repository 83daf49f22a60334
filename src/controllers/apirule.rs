use std::sync::Arc;

use futures::{future::BoxFuture, FutureExt, StreamExt};
use kube::{
    api::{Patch, PatchParams},
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Resource, ResourceExt,
};
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use super::{status, ControllerError, RECONCILE_ERROR_WAIT, RECONCILE_LONG_WAIT};
use crate::{
    apis::{APIRule, APIRuleStatus},
    common::ResourceKey,
    processing::ReconciliationEngine,
    validation::ApiRuleValidator,
};

type Result<T, E = ControllerError> = std::result::Result<T, E>;

/// What a pass produced. `status` is `None` when nothing should be written back.
#[derive(Clone, Debug, PartialEq)]
pub struct HandlerOutcome {
    pub status: Option<APIRuleStatus>,
    pub requeue: bool,
}

impl HandlerOutcome {
    fn unchanged() -> Self {
        Self { status: None, requeue: false }
    }
}

/// Validates an APIRule and drives the engine. Knows nothing about the watch loop.
#[derive(Clone, TypedBuilder)]
pub struct ApiRuleHandler {
    engine: ReconciliationEngine,
    validator: Arc<ApiRuleValidator>,
}

impl ApiRuleHandler {
    #[instrument(level = "info", name = "ApiRuleHandler", skip_all, fields(id = %ResourceKey::from(api)))]
    pub async fn handle(&self, api: &APIRule) -> HandlerOutcome {
        let generation = api.metadata.generation;
        let observed_generation = api.status.as_ref().and_then(|status| status.observed_generation);
        if observed_generation.is_some() && observed_generation == generation {
            debug!("Generation {generation:?} already processed");
            return HandlerOutcome::unchanged();
        }

        let virtual_services = match self.engine.virtual_services().list_all().await {
            Ok(virtual_services) => virtual_services,
            Err(e) => {
                warn!("Can't list virtual services {e}");
                return HandlerOutcome { status: None, requeue: true };
            },
        };

        let failures = self.validator.validate(api, &virtual_services);
        if !failures.is_empty() {
            info!("Invalid {failures:?}");
            return HandlerOutcome { status: Some(status::invalid(generation, &failures)), requeue: false };
        }

        match self.engine.reconcile(api).await {
            Ok(()) => HandlerOutcome { status: Some(status::reconciled(generation)), requeue: false },
            Err(e) => {
                warn!("Reconciliation failed {e}");
                HandlerOutcome { status: Some(status::failed(observed_generation, &e)), requeue: true }
            },
        }
    }
}

struct Context {
    client: kube::Client,
    controller_name: String,
    handler: ApiRuleHandler,
}

pub struct ApiRuleController {
    controller_name: String,
    client: kube::Client,
    api: Api<APIRule>,
    handler: ApiRuleHandler,
}

impl ApiRuleController {
    pub fn new(controller_name: String, client: kube::Client, handler: ApiRuleHandler) -> Self {
        ApiRuleController { controller_name, api: Api::all(client.clone()), client, handler }
    }

    pub fn get_controller(&self) -> BoxFuture<()> {
        let context = Arc::new(Context { client: self.client.clone(), controller_name: self.controller_name.clone(), handler: self.handler.clone() });

        Controller::new(self.api.clone(), Config::default())
            .run(Self::reconcile_api_rule, Self::error_policy, Arc::clone(&context))
            .for_each(|_| futures::future::ready(()))
            .boxed()
    }

    #[allow(clippy::needless_pass_by_value)]
    fn error_policy(_object: Arc<APIRule>, err: &ControllerError, _ctx: Arc<Context>) -> Action {
        match err {
            ControllerError::InvalidPayload(_) => Action::requeue(RECONCILE_LONG_WAIT),
            ControllerError::PatchFailed | ControllerError::StoreFailure | ControllerError::Processing => Action::requeue(RECONCILE_ERROR_WAIT),
        }
    }

    async fn reconcile_api_rule(resource: Arc<APIRule>, ctx: Arc<Context>) -> Result<Action> {
        let Some(name) = resource.meta().name.clone() else {
            return Err(ControllerError::InvalidPayload("Resource name is not provided".to_owned()));
        };

        let Some(maybe_id) = resource.metadata.uid.clone() else {
            return Err(ControllerError::InvalidPayload("Uid must be present".to_owned()));
        };

        let Ok(id) = Uuid::parse_str(&maybe_id) else {
            return Err(ControllerError::InvalidPayload("Uid in wrong format".to_owned()));
        };

        if resource.meta().deletion_timestamp.is_some() {
            debug!("reconcile_api_rule: {id} {name} being deleted, owned objects are garbage collected");
            return Ok(Action::await_change());
        }

        let HandlerOutcome { status, requeue } = ctx.handler.handle(&resource).await;
        let wrote_status = status.is_some();

        if let Some(status) = status {
            let namespace = resource.namespace().unwrap_or_default();
            Self::patch_status(&ctx, &namespace, &name, status).await?;
        }

        match (requeue, wrote_status) {
            (false, _) => Ok(Action::await_change()),
            (true, false) => Err(ControllerError::StoreFailure),
            (true, true) => Err(ControllerError::Processing),
        }
    }

    async fn patch_status(ctx: &Context, namespace: &str, name: &str, status: APIRuleStatus) -> Result<()> {
        let api = Api::<APIRule>::namespaced(ctx.client.clone(), namespace);
        let patch = json!({
            "apiVersion": APIRule::api_version(&()),
            "kind": APIRule::kind(&()),
            "status": status,
        });
        let patch_params = PatchParams::apply(&ctx.controller_name).force();
        match api.patch_status(name, &patch_params, &Patch::Apply(&patch)).await {
            Ok(_) => {
                debug!("patch_status: {namespace}.{name} patch result ok");
                Ok(())
            },
            Err(e) => {
                warn!("patch_status: {namespace}.{name} patch failed {e:?}");
                Err(ControllerError::PatchFailed)
            },
        }
    }
}
