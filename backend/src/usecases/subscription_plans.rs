use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    entities::plans::{InsertPlanEntity, UpdatePlanEntity},
    repositories::plans::PlanRepository,
    value_objects::{
        money::AmountMinor,
        plans::{CreatePlanModel, PlanDto, UpdatePlanModel},
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    usecases::billing_errors::{BillingError, UseCaseResult},
};

fn require_admin(auth: &AuthUser) -> UseCaseResult<()> {
    if auth.is_admin() {
        return Ok(());
    }
    warn!(
        user_id = %auth.user_id,
        role = %auth.role,
        "plans: non-admin caller rejected"
    );
    Err(BillingError::Forbidden)
}

fn validated_name(name: &str) -> UseCaseResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BillingError::InvalidInput("plan name must not be empty".into()));
    }
    Ok(name.to_string())
}

pub struct PlanCatalogUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
}

impl<P> PlanCatalogUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>) -> Self {
        Self { plan_repo }
    }

    pub async fn list_active_plans(&self) -> UseCaseResult<Vec<PlanDto>> {
        let plans = self.plan_repo.list_active_plans().await.map_err(|err| {
            error!(db_error = ?err, "plans: failed to list active plans");
            BillingError::Internal(err)
        })?;
        let plan_count = plans.len();
        info!(plan_count, "plans: active plans loaded");
        Ok(plans.into_iter().map(PlanDto::from).collect())
    }

    pub async fn get_active_plan(&self, plan_id: Uuid) -> UseCaseResult<PlanDto> {
        self.plan_repo
            .find_active_plan_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "plans: failed to load plan");
                BillingError::Internal(err)
            })?
            .map(PlanDto::from)
            .ok_or(BillingError::NotFound("plan"))
    }

    pub async fn create_plan(
        &self,
        auth: &AuthUser,
        model: CreatePlanModel,
    ) -> UseCaseResult<PlanDto> {
        require_admin(auth)?;

        let name = validated_name(&model.name)?;
        let price = AmountMinor::parse(&model.price)?;

        let plan = self
            .plan_repo
            .create_plan(InsertPlanEntity {
                name,
                description: model.description,
                price_minor: price.minor(),
                billing_interval: model.interval.as_str().to_string(),
                features: serde_json::json!(model.features),
                is_active: true,
            })
            .await
            .map_err(|err| {
                error!(db_error = ?err, "plans: failed to create plan");
                BillingError::Internal(err)
            })?;

        info!(
            plan_id = %plan.id,
            admin_id = %auth.user_id,
            price = %plan.price,
            interval = %plan.interval,
            "plans: plan created"
        );
        Ok(plan.into())
    }

    pub async fn update_plan(
        &self,
        auth: &AuthUser,
        plan_id: Uuid,
        model: UpdatePlanModel,
    ) -> UseCaseResult<PlanDto> {
        require_admin(auth)?;

        let changes = UpdatePlanEntity {
            name: model.name.as_deref().map(validated_name).transpose()?,
            description: model.description,
            price_minor: model
                .price
                .as_deref()
                .map(AmountMinor::parse)
                .transpose()?
                .map(|price| price.minor()),
            billing_interval: model.interval.map(|interval| interval.as_str().to_string()),
            features: model.features.map(|features| serde_json::json!(features)),
            is_active: model.is_active,
            updated_at: Some(Utc::now()),
        };

        self.apply_update(auth, plan_id, changes).await
    }

    /// Existing subscriptions keep referencing a deactivated plan.
    pub async fn deactivate_plan(&self, auth: &AuthUser, plan_id: Uuid) -> UseCaseResult<PlanDto> {
        require_admin(auth)?;

        let changes = UpdatePlanEntity {
            is_active: Some(false),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };

        self.apply_update(auth, plan_id, changes).await
    }

    async fn apply_update(
        &self,
        auth: &AuthUser,
        plan_id: Uuid,
        changes: UpdatePlanEntity,
    ) -> UseCaseResult<PlanDto> {
        let plan = self
            .plan_repo
            .update_plan(plan_id, changes)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "plans: failed to update plan");
                BillingError::Internal(err)
            })?
            .ok_or(BillingError::NotFound("plan"))?;

        info!(
            %plan_id,
            admin_id = %auth.user_id,
            is_active = plan.is_active,
            "plans: plan updated"
        );
        Ok(plan.into())
    }
}
