use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{PgConnection, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    conflicts::{ONE_ACTIVE_SUBSCRIPTION_INDEX, ONE_PENDING_PAYMENT_INDEX, is_unique_violation_on},
    subscriptions::{expire_lapsed_for_user, find_current_active},
};
use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{pix_payments, subscriptions},
    },
};
use domain::{
    entities::pix_payments::{InsertPixPaymentEntity, PixPaymentEntity, PixPaymentStatusChange},
    repositories::{RepositoryConflict, pix_payments::PixPaymentRepository},
    value_objects::enums::{
        pix_payment_statuses::PixPaymentStatus, subscription_statuses::SubscriptionStatus,
    },
};

pub struct PixPaymentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PixPaymentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

fn find_live_pending(
    conn: &mut PgConnection,
    subscription_id: Uuid,
    now: DateTime<Utc>,
) -> QueryResult<Option<PixPaymentEntity>> {
    pix_payments::table
        .filter(pix_payments::subscription_id.eq(subscription_id))
        .filter(pix_payments::status.eq(PixPaymentStatus::Pending.as_str()))
        .filter(pix_payments::expires_at.gt(now))
        .order(pix_payments::created_at.desc())
        .select(PixPaymentEntity::as_select())
        .first::<PixPaymentEntity>(conn)
        .optional()
}

fn activate_subscription(
    conn: &mut PgConnection,
    subscription_id: Uuid,
    now: DateTime<Utc>,
) -> Result<()> {
    let owner = subscriptions::table
        .find(subscription_id)
        .select(subscriptions::user_id)
        .for_update()
        .first::<Uuid>(conn)
        .optional()?
        .ok_or_else(|| anyhow::anyhow!("subscription {subscription_id} vanished during activation"))?;

    expire_lapsed_for_user(conn, owner, now)?;
    if find_current_active(conn, owner, now, Some(subscription_id))?.is_some() {
        return Err(RepositoryConflict::ActiveSubscriptionExists.into());
    }

    update(subscriptions::table.find(subscription_id))
        .set((
            subscriptions::status.eq(SubscriptionStatus::Active.as_str()),
            subscriptions::updated_at.eq(now),
        ))
        .execute(conn)?;

    Ok(())
}

#[async_trait]
impl PixPaymentRepository for PixPaymentPostgres {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<PixPaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = pix_payments::table
            .filter(pix_payments::user_id.eq(user_id))
            .order(pix_payments::created_at.desc())
            .select(PixPaymentEntity::as_select())
            .load::<PixPaymentEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_by_subscriptions(
        &self,
        subscription_ids: Vec<Uuid>,
        limit: Option<usize>,
    ) -> Result<Vec<PixPaymentEntity>> {
        if subscription_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let Some(limit) = limit else {
            let rows = pix_payments::table
                .filter(pix_payments::subscription_id.eq_any(subscription_ids))
                .order(pix_payments::created_at.desc())
                .select(PixPaymentEntity::as_select())
                .load::<PixPaymentEntity>(&mut conn)?;
            return Ok(rows);
        };

        let mut rows = Vec::new();
        for subscription_id in subscription_ids {
            let recent = pix_payments::table
                .filter(pix_payments::subscription_id.eq(subscription_id))
                .order(pix_payments::created_at.desc())
                .limit(limit as i64)
                .select(PixPaymentEntity::as_select())
                .load::<PixPaymentEntity>(&mut conn)?;
            rows.extend(recent);
        }
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(rows)
    }

    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<PixPaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = pix_payments::table
            .filter(pix_payments::id.eq(payment_id))
            .select(PixPaymentEntity::as_select())
            .first::<PixPaymentEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_id_for_user(
        &self,
        payment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PixPaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = pix_payments::table
            .filter(pix_payments::id.eq(payment_id))
            .filter(pix_payments::user_id.eq(user_id))
            .select(PixPaymentEntity::as_select())
            .first::<PixPaymentEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_live_pending_for_subscription(
        &self,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<PixPaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        Ok(find_live_pending(&mut conn, subscription_id, now)?)
    }

    async fn create_pending_payment(
        &self,
        payment: InsertPixPaymentEntity,
    ) -> Result<PixPaymentEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = payment.created_at;
        let subscription_id = payment.subscription_id;

        let result = conn.transaction::<_, anyhow::Error, _>(|conn| {
            update(pix_payments::table)
                .filter(pix_payments::subscription_id.eq(subscription_id))
                .filter(pix_payments::status.eq(PixPaymentStatus::Pending.as_str()))
                .filter(pix_payments::expires_at.le(now))
                .set((
                    pix_payments::status.eq(PixPaymentStatus::Expired.as_str()),
                    pix_payments::updated_at.eq(now),
                ))
                .execute(conn)?;

            if let Some(existing) = find_live_pending(conn, subscription_id, now)? {
                return Ok(existing);
            }

            let created = insert_into(pix_payments::table)
                .values(&payment)
                .returning(PixPaymentEntity::as_returning())
                .get_result::<PixPaymentEntity>(conn)?;

            Ok(created)
        });

        match result {
            Err(err) if is_unique_violation_on(&err, ONE_PENDING_PAYMENT_INDEX) => {
                // Lost the insert race; the winner's row is the idempotent answer.
                find_live_pending(&mut conn, subscription_id, now)?
                    .ok_or_else(|| RepositoryConflict::PendingPaymentExists.into())
            }
            other => other,
        }
    }

    async fn apply_status_change(
        &self,
        change: PixPaymentStatusChange,
    ) -> Result<Option<PixPaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let Some(locked) = pix_payments::table
                .find(change.payment_id)
                .select(PixPaymentEntity::as_select())
                .for_update()
                .first::<PixPaymentEntity>(conn)
                .optional()?
            else {
                return Ok(None);
            };

            let stored = locked.status();
            let expected = change.expected_from.is_none_or(|from| from == stored);
            if !expected || !stored.can_transition_to(change.status) {
                return Err(RepositoryConflict::PaymentStatusMismatch(stored).into());
            }

            let paid_at = match stored {
                PixPaymentStatus::Paid => locked.paid_at.or(change.paid_at),
                _ => change.paid_at,
            };

            let updated = update(pix_payments::table.find(change.payment_id))
                .set((
                    pix_payments::status.eq(change.status.as_str()),
                    pix_payments::transaction_id
                        .eq(change.transaction_id.clone().or(locked.transaction_id)),
                    pix_payments::paid_at.eq(paid_at),
                    pix_payments::updated_at.eq(change.changed_at),
                ))
                .returning(PixPaymentEntity::as_returning())
                .get_result::<PixPaymentEntity>(conn)?;

            if let Some(subscription_id) = change.activate_subscription {
                activate_subscription(conn, subscription_id, change.changed_at)?;
            }

            Ok(Some(updated))
        });

        result.map_err(|err| {
            if is_unique_violation_on(&err, ONE_ACTIVE_SUBSCRIPTION_INDEX) {
                RepositoryConflict::ActiveSubscriptionExists.into()
            } else {
                err
            }
        })
    }

    async fn mark_expired(
        &self,
        payment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<PixPaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let expired = update(pix_payments::table.find(payment_id))
            .filter(pix_payments::status.eq(PixPaymentStatus::Pending.as_str()))
            .set((
                pix_payments::status.eq(PixPaymentStatus::Expired.as_str()),
                pix_payments::updated_at.eq(now),
            ))
            .returning(PixPaymentEntity::as_returning())
            .get_result::<PixPaymentEntity>(&mut conn)
            .optional()?;

        if expired.is_some() {
            return Ok(expired);
        }

        let current = pix_payments::table
            .find(payment_id)
            .select(PixPaymentEntity::as_select())
            .first::<PixPaymentEntity>(&mut conn)
            .optional()?;

        Ok(current)
    }

    async fn expire_lapsed_payments(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let expired = update(pix_payments::table)
            .filter(pix_payments::status.eq(PixPaymentStatus::Pending.as_str()))
            .filter(pix_payments::expires_at.le(now))
            .set((
                pix_payments::status.eq(PixPaymentStatus::Expired.as_str()),
                pix_payments::updated_at.eq(now),
            ))
            .execute(&mut conn)?;

        Ok(expired)
    }
}
