use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{PgConnection, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use super::conflicts::{ONE_ACTIVE_SUBSCRIPTION_INDEX, is_unique_violation_on};
use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::subscriptions},
};
use domain::{
    entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
    repositories::{RepositoryConflict, subscriptions::SubscriptionRepository},
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

pub(crate) fn find_current_active(
    conn: &mut PgConnection,
    user_id: Uuid,
    now: DateTime<Utc>,
    excluding: Option<Uuid>,
) -> QueryResult<Option<SubscriptionEntity>> {
    let mut query = subscriptions::table
        .filter(subscriptions::user_id.eq(user_id))
        .filter(subscriptions::status.eq(SubscriptionStatus::Active.as_str()))
        .filter(
            subscriptions::end_date
                .is_null()
                .or(subscriptions::end_date.gt(now)),
        )
        .select(SubscriptionEntity::as_select())
        .into_boxed();

    if let Some(excluded_id) = excluding {
        query = query.filter(subscriptions::id.ne(excluded_id));
    }

    query
        .order(subscriptions::created_at.desc())
        .first::<SubscriptionEntity>(conn)
        .optional()
}

/// Active rows whose end date has passed still hold the one-active-per-user index slot.
pub(crate) fn expire_lapsed_for_user(
    conn: &mut PgConnection,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> QueryResult<usize> {
    update(subscriptions::table)
        .filter(subscriptions::user_id.eq(user_id))
        .filter(subscriptions::status.eq(SubscriptionStatus::Active.as_str()))
        .filter(subscriptions::end_date.le(now))
        .set((
            subscriptions::status.eq(SubscriptionStatus::Expired.as_str()),
            subscriptions::updated_at.eq(now),
        ))
        .execute(conn)
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .order(subscriptions::created_at.desc())
            .select(SubscriptionEntity::as_select())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscriptions::table
            .filter(subscriptions::id.eq(subscription_id))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_id_for_user(
        &self,
        subscription_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscriptions::table
            .filter(subscriptions::id.eq(subscription_id))
            .filter(subscriptions::user_id.eq(user_id))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_current_active_subscription(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        Ok(find_current_active(&mut conn, user_id, now, None)?)
    }

    async fn create_pending_subscription(
        &self,
        subscription: InsertSubscriptionEntity,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<_, anyhow::Error, _>(|conn| {
            if find_current_active(conn, subscription.user_id, now, None)?.is_some() {
                return Err(RepositoryConflict::ActiveSubscriptionExists.into());
            }

            let created = insert_into(subscriptions::table)
                .values(&subscription)
                .returning(SubscriptionEntity::as_returning())
                .get_result::<SubscriptionEntity>(conn)?;

            Ok(created)
        });

        result.map_err(|err| {
            if is_unique_violation_on(&err, ONE_ACTIVE_SUBSCRIPTION_INDEX) {
                RepositoryConflict::ActiveSubscriptionExists.into()
            } else {
                err
            }
        })
    }

    async fn cancel_subscription(
        &self,
        subscription_id: Uuid,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The status guard keeps the first cancellation timestamp under concurrent cancels.
        let result = update(subscriptions::table)
            .filter(subscriptions::id.eq(subscription_id))
            .filter(subscriptions::status.ne(SubscriptionStatus::Cancelled.as_str()))
            .set((
                subscriptions::status.eq(SubscriptionStatus::Cancelled.as_str()),
                subscriptions::cancelled_at.eq(Some(cancelled_at)),
                subscriptions::updated_at.eq(cancelled_at),
            ))
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn expire_lapsed_subscriptions(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let expired = update(subscriptions::table)
            .filter(subscriptions::status.eq(SubscriptionStatus::Active.as_str()))
            .filter(subscriptions::end_date.le(now))
            .set((
                subscriptions::status.eq(SubscriptionStatus::Expired.as_str()),
                subscriptions::updated_at.eq(now),
            ))
            .execute(&mut conn)?;

        Ok(expired)
    }
}
