use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity};

#[automock]
#[async_trait]
pub trait SubscriptionRepository {
    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<SubscriptionEntity>>;

    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>>;

    async fn find_by_id_for_user(
        &self,
        subscription_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionEntity>>;

    /// Status `active` with no end date or an end date after `now`.
    async fn find_current_active_subscription(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionEntity>>;

    /// Inserts a pending subscription after re-checking, inside one transaction, that the user
    /// has no current active subscription. Fails with
    /// `RepositoryConflict::ActiveSubscriptionExists` otherwise.
    async fn create_pending_subscription(
        &self,
        subscription: InsertSubscriptionEntity,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionEntity>;

    /// Returns `None` when the row was already cancelled by the time the update ran.
    async fn cancel_subscription(
        &self,
        subscription_id: Uuid,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Option<SubscriptionEntity>>;

    /// Marks every active subscription whose end date is not after `now` as expired.
    async fn expire_lapsed_subscriptions(&self, now: DateTime<Utc>) -> Result<usize>;
}
