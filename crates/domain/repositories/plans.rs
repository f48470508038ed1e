use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::plans::{InsertPlanEntity, PlanEntity, UpdatePlanEntity};

#[automock]
#[async_trait]
pub trait PlanRepository {
    /// Active plans, cheapest first.
    async fn list_active_plans(&self) -> Result<Vec<PlanEntity>>;

    /// Any plan regardless of `is_active`.
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>>;

    async fn find_active_plan_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>>;

    async fn find_by_ids(&self, plan_ids: Vec<Uuid>) -> Result<Vec<PlanEntity>>;

    async fn create_plan(&self, plan: InsertPlanEntity) -> Result<PlanEntity>;

    async fn update_plan(&self, plan_id: Uuid, changes: UpdatePlanEntity)
    -> Result<Option<PlanEntity>>;
}
