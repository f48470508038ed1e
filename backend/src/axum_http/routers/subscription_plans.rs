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
        repositories::plans::PlanRepository,
        value_objects::plans::{CreatePlanModel, UpdatePlanModel},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::plans::PlanPostgres,
    },
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::{RequestRejection, respond},
    usecases::subscription_plans::PlanCatalogUseCase,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    let plan_usecase = PlanCatalogUseCase::new(Arc::new(plan_repository));

    Router::new()
        .route(
            "/",
            get(list_active_plans::<PlanPostgres>).post(create_plan::<PlanPostgres>),
        )
        .route(
            "/:plan_id",
            get(get_active_plan::<PlanPostgres>).patch(update_plan::<PlanPostgres>),
        )
        .route("/:plan_id/deactivate", post(deactivate_plan::<PlanPostgres>))
        .with_state(Arc::new(plan_usecase))
}

pub async fn list_active_plans<T>(
    State(plan_usecase): State<Arc<PlanCatalogUseCase<T>>>,
) -> impl IntoResponse
where
    T: PlanRepository + Send + Sync + 'static,
{
    respond(plan_usecase.list_active_plans().await, StatusCode::OK)
}

pub async fn get_active_plan<T>(
    State(plan_usecase): State<Arc<PlanCatalogUseCase<T>>>,
    WithRejection(Path(plan_id), _): WithRejection<Path<Uuid>, RequestRejection>,
) -> impl IntoResponse
where
    T: PlanRepository + Send + Sync + 'static,
{
    respond(plan_usecase.get_active_plan(plan_id).await, StatusCode::OK)
}

pub async fn create_plan<T>(
    State(plan_usecase): State<Arc<PlanCatalogUseCase<T>>>,
    auth: AuthUser,
    WithRejection(Json(create_plan_model), _): WithRejection<
        Json<CreatePlanModel>,
        RequestRejection,
    >,
) -> impl IntoResponse
where
    T: PlanRepository + Send + Sync + 'static,
{
    respond(
        plan_usecase.create_plan(&auth, create_plan_model).await,
        StatusCode::CREATED,
    )
}

pub async fn update_plan<T>(
    State(plan_usecase): State<Arc<PlanCatalogUseCase<T>>>,
    auth: AuthUser,
    WithRejection(Path(plan_id), _): WithRejection<Path<Uuid>, RequestRejection>,
    WithRejection(Json(update_plan_model), _): WithRejection<
        Json<UpdatePlanModel>,
        RequestRejection,
    >,
) -> impl IntoResponse
where
    T: PlanRepository + Send + Sync + 'static,
{
    respond(
        plan_usecase
            .update_plan(&auth, plan_id, update_plan_model)
            .await,
        StatusCode::OK,
    )
}

pub async fn deactivate_plan<T>(
    State(plan_usecase): State<Arc<PlanCatalogUseCase<T>>>,
    auth: AuthUser,
    WithRejection(Path(plan_id), _): WithRejection<Path<Uuid>, RequestRejection>,
) -> impl IntoResponse
where
    T: PlanRepository + Send + Sync + 'static,
{
    respond(
        plan_usecase.deactivate_plan(&auth, plan_id).await,
        StatusCode::OK,
    )
}
