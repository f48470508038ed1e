use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use tracing::error;

use crate::{config::config_model::DotEnvyConfig, usecases::expire_billing::ExpireBillingUseCase};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_WORKER/internal/v1/billing/expire" \
//     -H "Authorization: Bearer $INTERNAL_BILLING_TOKEN"

#[derive(Clone)]
pub struct ExpireBillingRouteState {
    config: Arc<DotEnvyConfig>,
    usecase: Arc<ExpireBillingUseCase>,
}

pub fn routes(config: Arc<DotEnvyConfig>, usecase: Arc<ExpireBillingUseCase>) -> Router {
    Router::new()
        .route("/expire", post(expire_billing))
        .with_state(ExpireBillingRouteState { config, usecase })
}

pub async fn expire_billing(
    State(state): State<ExpireBillingRouteState>,
    headers: HeaderMap,
) -> Response {
    let expected_token = match state.config.billing_sweep.internal_token.as_deref() {
        Some(token) => token,
        None => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "billing token is not configured",
            )
                .into_response();
        }
    };

    if let Err(status) = authorize_bearer(&headers, expected_token) {
        return (status, "unauthorized").into_response();
    }

    match state.usecase.run(Utc::now()).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => {
            error!(error = ?err, "expire_billing: usecase failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "billing sweep failed").into_response()
        }
    }
}

fn authorize_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), StatusCode> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token == expected_token {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}
