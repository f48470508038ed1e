use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::subscription_plans};
use domain::{
    entities::plans::{InsertPlanEntity, PlanEntity, PlanRow, UpdatePlanEntity},
    repositories::plans::PlanRepository,
};

pub struct PlanPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PlanPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

fn into_entities(rows: Vec<PlanRow>) -> Result<Vec<PlanEntity>> {
    rows.into_iter().map(PlanEntity::try_from).collect()
}

#[async_trait]
impl PlanRepository for PlanPostgres {
    async fn list_active_plans(&self) -> Result<Vec<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = subscription_plans::table
            .filter(subscription_plans::is_active.eq(true))
            .order((
                subscription_plans::price_minor.asc(),
                subscription_plans::created_at.asc(),
            ))
            .select(PlanRow::as_select())
            .load::<PlanRow>(&mut conn)?;

        into_entities(rows)
    }

    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = subscription_plans::table
            .filter(subscription_plans::id.eq(plan_id))
            .select(PlanRow::as_select())
            .first::<PlanRow>(&mut conn)
            .optional()?;

        row.map(PlanEntity::try_from).transpose()
    }

    async fn find_active_plan_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = subscription_plans::table
            .filter(subscription_plans::id.eq(plan_id))
            .filter(subscription_plans::is_active.eq(true))
            .select(PlanRow::as_select())
            .first::<PlanRow>(&mut conn)
            .optional()?;

        row.map(PlanEntity::try_from).transpose()
    }

    async fn find_by_ids(&self, plan_ids: Vec<Uuid>) -> Result<Vec<PlanEntity>> {
        if plan_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = subscription_plans::table
            .filter(subscription_plans::id.eq_any(plan_ids))
            .select(PlanRow::as_select())
            .load::<PlanRow>(&mut conn)?;

        into_entities(rows)
    }

    async fn create_plan(&self, plan: InsertPlanEntity) -> Result<PlanEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = insert_into(subscription_plans::table)
            .values(&plan)
            .returning(PlanRow::as_returning())
            .get_result::<PlanRow>(&mut conn)?;

        row.try_into()
    }

    async fn update_plan(
        &self,
        plan_id: Uuid,
        changes: UpdatePlanEntity,
    ) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = update(subscription_plans::table)
            .filter(subscription_plans::id.eq(plan_id))
            .set(&changes)
            .returning(PlanRow::as_returning())
            .get_result::<PlanRow>(&mut conn)
            .optional()?;

        row.map(PlanEntity::try_from).transpose()
    }
}
