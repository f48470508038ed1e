use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::usecases::billing_errors::BillingError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Don't leak internal error detail to client
            BillingError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            message,
        });

        (status, body).into_response()
    }
}

/// Extractor failures (bad JSON body, malformed path id) in the `ErrorResponse` shape.
#[derive(Debug)]
pub struct RequestRejection {
    status: StatusCode,
    message: String,
}

impl From<JsonRejection> for RequestRejection {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for RequestRejection {
    fn from(rejection: PathRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for RequestRejection {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            code: self.status.as_u16(),
            message: self.message,
        });

        (self.status, body).into_response()
    }
}

/// Serializes a use case result, mapping failures through `BillingError`.
pub fn respond<T: Serialize>(
    result: Result<T, BillingError>,
    success: StatusCode,
) -> Response {
    match result {
        Ok(body) => (success, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::{FromRequest, Request},
        http::header::CONTENT_TYPE,
    };
    use axum_extra::extract::WithRejection;
    use crates::domain::value_objects::pix_payments::UpdatePixPaymentStatusModel;

    type WebhookBody = WithRejection<Json<UpdatePixPaymentStatusModel>, RequestRejection>;

    async fn error_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn reject_webhook_body(request: Request) -> Response {
        match WebhookBody::from_request(request, &()).await {
            Ok(_) => panic!("body should have been rejected"),
            Err(rejection) => rejection.into_response(),
        }
    }

    #[tokio::test]
    async fn unknown_status_in_body_uses_error_shape() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/pix-payments/webhook")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"id":"123e4567-e89b-12d3-a456-426614174000","status":"refunded"}"#,
            ))
            .unwrap();

        let response = reject_webhook_body(request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = error_body(response).await;
        assert_eq!(body["code"], 422);
        assert!(body["message"].as_str().unwrap().contains("refunded"));
    }

    #[tokio::test]
    async fn missing_content_type_uses_error_shape() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/pix-payments/webhook")
            .body(Body::from("{}"))
            .unwrap();

        let response = reject_webhook_body(request).await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(error_body(response).await["code"], 415);
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let response = BillingError::Internal(anyhow::anyhow!("password=hunter2")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = error_body(response).await;
        assert_eq!(body["code"], 500);
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn domain_errors_keep_their_status() {
        assert_eq!(BillingError::Expired.into_response().status(), StatusCode::GONE);
        assert_eq!(
            BillingError::AlreadyPaid.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            respond::<()>(Err(BillingError::NotFound("pix payment")), StatusCode::OK).status(),
            StatusCode::NOT_FOUND
        );
    }
}
