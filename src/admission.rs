use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use kube_core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::{apis::APIRule, configuration::AdmissionInterfaceConfiguration, validation::ApiRuleValidator, Result};

pub const VALIDATE_PATH: &str = "/validate-apirule";

#[derive(Clone)]
pub struct AppState {
    validator: Arc<ApiRuleValidator>,
}

/// Allows or denies an APIRule create or update. Only checks what can be judged from the object itself.
pub async fn validate(State(state): State<Arc<AppState>>, Json(review): Json<AdmissionReview<APIRule>>) -> impl IntoResponse {
    let request: AdmissionRequest<APIRule> = match review.try_into() {
        Ok(request) => request,
        Err(e) => {
            warn!("Invalid admission review {e}");
            return (StatusCode::BAD_REQUEST, Json(AdmissionResponse::invalid(e.to_string()).into_review()));
        },
    };

    let response = evaluate(&state.validator, &request);
    (StatusCode::OK, Json(response.into_review()))
}

fn evaluate(validator: &ApiRuleValidator, request: &AdmissionRequest<APIRule>) -> AdmissionResponse {
    let response = AdmissionResponse::from(request);
    let Some(api) = &request.object else {
        debug!("Nothing to validate for {:?}", request.operation);
        return response;
    };
    let failures = validator.validate_spec(api);
    if failures.is_empty() {
        response
    } else {
        info!("Denied {}/{} {failures:?}", request.namespace.as_deref().unwrap_or_default(), request.name);
        response.deny(crate::validation::describe(&failures))
    }
}

fn create_router(state: Arc<AppState>) -> Router {
    Router::new().route(VALIDATE_PATH, post(validate)).with_state(state)
}

pub async fn start(configuration: Option<AdmissionInterfaceConfiguration>, validator: Arc<ApiRuleValidator>) -> Result<()> {
    let state = Arc::new(AppState { validator });
    let app = create_router(state);
    if let Some(configuration) = configuration {
        let listener = TcpListener::bind(configuration.address.to_ip()?).await?;
        let local_addr = listener.local_addr()?;
        info!("Admission webhook listening on http://{local_addr}{VALIDATE_PATH}");

        axum::serve(listener, app).await?;
    } else {
        info!("Admission webhook not configured");
    }

    Ok(())
}
