use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::pix_payments::{
    InsertPixPaymentEntity, PixPaymentEntity, PixPaymentStatusChange,
};

#[automock]
#[async_trait]
pub trait PixPaymentRepository {
    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<PixPaymentEntity>>;

    /// Newest first, optionally capped at `limit` rows per subscription.
    async fn list_by_subscriptions(
        &self,
        subscription_ids: Vec<Uuid>,
        limit: Option<usize>,
    ) -> Result<Vec<PixPaymentEntity>>;

    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<PixPaymentEntity>>;

    async fn find_by_id_for_user(
        &self,
        payment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PixPaymentEntity>>;

    /// Pending payment for the subscription whose `expires_at` is after `now`.
    async fn find_live_pending_for_subscription(
        &self,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<PixPaymentEntity>>;

    /// Find-or-insert in one transaction: lapsed pending rows for the subscription are expired,
    /// a live pending row is returned untouched, otherwise `payment` is inserted.
    async fn create_pending_payment(
        &self,
        payment: InsertPixPaymentEntity,
    ) -> Result<PixPaymentEntity>;

    /// Locks the payment, checks its stored status, applies the change and, when requested,
    /// activates the owning subscription atomically. Returns `None` when the payment does not
    /// exist. Fails with `RepositoryConflict::PaymentStatusMismatch` carrying the stored status
    /// when the change is not allowed from it, and with
    /// `RepositoryConflict::ActiveSubscriptionExists` if activation would give the user a
    /// second current subscription.
    async fn apply_status_change(
        &self,
        change: PixPaymentStatusChange,
    ) -> Result<Option<PixPaymentEntity>>;

    /// Pending -> expired for one payment. Returns the row as stored after the call.
    async fn mark_expired(
        &self,
        payment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<PixPaymentEntity>>;

    /// Marks every pending payment whose `expires_at` is not after `now` as expired.
    async fn expire_lapsed_payments(&self, now: DateTime<Utc>) -> Result<usize>;
}
