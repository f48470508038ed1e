use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use crates::{
    domain::{
        repositories::{
            pix_payments::PixPaymentRepository, plans::PlanRepository,
            subscriptions::SubscriptionRepository,
        },
        value_objects::pix_payments::{CreatePixPaymentModel, UpdatePixPaymentStatusModel},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            pix_payments::PixPaymentPostgres, plans::PlanPostgres,
            subscriptions::SubscriptionPostgres,
        },
    },
    payments::pix_client::{PixClientConfig, SandboxPixClient},
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::{RequestRejection, respond},
    usecases::pix_payments::{PixGateway, PixPaymentUseCase},
};

// Sandbox flow
//   curl -X POST "http://localhost:$SERVER_PORT_BACKEND/api/v1/pix-payments" \
//     -H "Authorization: Bearer $USER_JWT" -H "Content-Type: application/json" \
//     -d '{"subscription_id":"<uuid>","amount":"79.90"}'
//   curl -X POST "http://localhost:$SERVER_PORT_BACKEND/api/v1/pix-payments/<payment_id>/confirm" \
//     -H "Authorization: Bearer $USER_JWT"

pub fn routes(db_pool: Arc<PgPoolSquad>, pix_config: PixClientConfig) -> Router {
    let pix_payments_usecase = PixPaymentUseCase::new(
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(PixPaymentPostgres::new(Arc::clone(&db_pool))),
        Arc::new(SandboxPixClient::new(pix_config)),
    );

    Router::new()
        .route(
            "/",
            get(list_my_payments::<PlanPostgres, SubscriptionPostgres, PixPaymentPostgres, SandboxPixClient>)
                .post(create_pix_payment::<PlanPostgres, SubscriptionPostgres, PixPaymentPostgres, SandboxPixClient>),
        )
        .route(
            "/webhook",
            post(update_pix_payment_status::<PlanPostgres, SubscriptionPostgres, PixPaymentPostgres, SandboxPixClient>),
        )
        .route(
            "/pending/:subscription_id",
            get(get_pending_payment_for_subscription::<PlanPostgres, SubscriptionPostgres, PixPaymentPostgres, SandboxPixClient>),
        )
        .route(
            "/:payment_id",
            get(get_my_payment::<PlanPostgres, SubscriptionPostgres, PixPaymentPostgres, SandboxPixClient>),
        )
        .route(
            "/:payment_id/confirm",
            post(confirm_pix_payment::<PlanPostgres, SubscriptionPostgres, PixPaymentPostgres, SandboxPixClient>),
        )
        .with_state(Arc::new(pix_payments_usecase))
}

pub async fn list_my_payments<P, S, Pay, G>(
    State(pix_payments_usecase): State<Arc<PixPaymentUseCase<P, S, Pay, G>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PixPaymentRepository + Send + Sync + 'static,
    G: PixGateway + Send + Sync + 'static,
{
    respond(
        pix_payments_usecase.list_my_payments(&auth).await,
        StatusCode::OK,
    )
}

pub async fn get_my_payment<P, S, Pay, G>(
    State(pix_payments_usecase): State<Arc<PixPaymentUseCase<P, S, Pay, G>>>,
    auth: AuthUser,
    WithRejection(Path(payment_id), _): WithRejection<Path<Uuid>, RequestRejection>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PixPaymentRepository + Send + Sync + 'static,
    G: PixGateway + Send + Sync + 'static,
{
    respond(
        pix_payments_usecase.get_my_payment(&auth, payment_id).await,
        StatusCode::OK,
    )
}

pub async fn get_pending_payment_for_subscription<P, S, Pay, G>(
    State(pix_payments_usecase): State<Arc<PixPaymentUseCase<P, S, Pay, G>>>,
    auth: AuthUser,
    WithRejection(Path(subscription_id), _): WithRejection<Path<Uuid>, RequestRejection>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PixPaymentRepository + Send + Sync + 'static,
    G: PixGateway + Send + Sync + 'static,
{
    respond(
        pix_payments_usecase
            .get_pending_payment_for_subscription(&auth, subscription_id)
            .await,
        StatusCode::OK,
    )
}

pub async fn create_pix_payment<P, S, Pay, G>(
    State(pix_payments_usecase): State<Arc<PixPaymentUseCase<P, S, Pay, G>>>,
    auth: AuthUser,
    WithRejection(Json(create_pix_payment_model), _): WithRejection<
        Json<CreatePixPaymentModel>,
        RequestRejection,
    >,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PixPaymentRepository + Send + Sync + 'static,
    G: PixGateway + Send + Sync + 'static,
{
    respond(
        pix_payments_usecase
            .create_pix_payment(&auth, create_pix_payment_model)
            .await,
        StatusCode::CREATED,
    )
}

pub async fn confirm_pix_payment<P, S, Pay, G>(
    State(pix_payments_usecase): State<Arc<PixPaymentUseCase<P, S, Pay, G>>>,
    auth: AuthUser,
    WithRejection(Path(payment_id), _): WithRejection<Path<Uuid>, RequestRejection>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PixPaymentRepository + Send + Sync + 'static,
    G: PixGateway + Send + Sync + 'static,
{
    respond(
        pix_payments_usecase
            .confirm_pix_payment(&auth, payment_id)
            .await,
        StatusCode::OK,
    )
}

pub async fn update_pix_payment_status<P, S, Pay, G>(
    State(pix_payments_usecase): State<Arc<PixPaymentUseCase<P, S, Pay, G>>>,
    auth: AuthUser,
    WithRejection(Json(update_status_model), _): WithRejection<
        Json<UpdatePixPaymentStatusModel>,
        RequestRejection,
    >,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PixPaymentRepository + Send + Sync + 'static,
    G: PixGateway + Send + Sync + 'static,
{
    respond(
        pix_payments_usecase
            .update_pix_payment_status(&auth, update_status_model)
            .await,
        StatusCode::OK,
    )
}
