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
        value_objects::subscriptions::CreateSubscriptionModel,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            pix_payments::PixPaymentPostgres, plans::PlanPostgres,
            subscriptions::SubscriptionPostgres,
        },
    },
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::{RequestRejection, respond},
    usecases::subscriptions::SubscriptionUseCase,
};

type PostgresSubscriptionUseCase =
    SubscriptionUseCase<PlanPostgres, SubscriptionPostgres, PixPaymentPostgres>;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let subscriptions_usecase: PostgresSubscriptionUseCase = SubscriptionUseCase::new(
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(PixPaymentPostgres::new(Arc::clone(&db_pool))),
    );

    Router::new()
        .route(
            "/",
            get(list_my_subscriptions::<PlanPostgres, SubscriptionPostgres, PixPaymentPostgres>)
                .post(create_subscription::<PlanPostgres, SubscriptionPostgres, PixPaymentPostgres>),
        )
        .route(
            "/active",
            get(get_my_active_subscription::<PlanPostgres, SubscriptionPostgres, PixPaymentPostgres>),
        )
        .route(
            "/:subscription_id",
            get(get_my_subscription::<PlanPostgres, SubscriptionPostgres, PixPaymentPostgres>),
        )
        .route(
            "/:subscription_id/cancel",
            post(cancel_subscription::<PlanPostgres, SubscriptionPostgres, PixPaymentPostgres>),
        )
        .with_state(Arc::new(subscriptions_usecase))
}

pub async fn list_my_subscriptions<P, S, Pay>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<P, S, Pay>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PixPaymentRepository + Send + Sync + 'static,
{
    respond(
        subscriptions_usecase.list_my_subscriptions(&auth).await,
        StatusCode::OK,
    )
}

pub async fn get_my_active_subscription<P, S, Pay>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<P, S, Pay>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PixPaymentRepository + Send + Sync + 'static,
{
    respond(
        subscriptions_usecase.get_my_active_subscription(&auth).await,
        StatusCode::OK,
    )
}

pub async fn get_my_subscription<P, S, Pay>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<P, S, Pay>>>,
    auth: AuthUser,
    WithRejection(Path(subscription_id), _): WithRejection<Path<Uuid>, RequestRejection>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PixPaymentRepository + Send + Sync + 'static,
{
    respond(
        subscriptions_usecase
            .get_my_subscription(&auth, subscription_id)
            .await,
        StatusCode::OK,
    )
}

pub async fn create_subscription<P, S, Pay>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<P, S, Pay>>>,
    auth: AuthUser,
    WithRejection(Json(create_subscription_model), _): WithRejection<
        Json<CreateSubscriptionModel>,
        RequestRejection,
    >,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PixPaymentRepository + Send + Sync + 'static,
{
    respond(
        subscriptions_usecase
            .create_subscription(&auth, create_subscription_model)
            .await,
        StatusCode::CREATED,
    )
}

pub async fn cancel_subscription<P, S, Pay>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<P, S, Pay>>>,
    auth: AuthUser,
    WithRejection(Path(subscription_id), _): WithRejection<Path<Uuid>, RequestRejection>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PixPaymentRepository + Send + Sync + 'static,
{
    respond(
        subscriptions_usecase
            .cancel_subscription(&auth, subscription_id)
            .await,
        StatusCode::OK,
    )
}
