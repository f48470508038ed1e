use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::pix_payment_statuses::PixPaymentStatus,
    infra::db::postgres::schema::pix_payments,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = pix_payments)]
pub struct PixPaymentEntity {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub amount_minor: i64,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub pix_key: String,
    pub pix_qr_code: String,
    pub pix_copy_paste: String,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PixPaymentEntity {
    pub fn status(&self) -> PixPaymentStatus {
        PixPaymentStatus::from_str(&self.status)
    }

    /// Pending and still inside its payment window.
    pub fn is_live_pending(&self, now: DateTime<Utc>) -> bool {
        self.status() == PixPaymentStatus::Pending && self.expires_at > now
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = pix_payments)]
pub struct InsertPixPaymentEntity {
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub amount_minor: i64,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub pix_key: String,
    pub pix_qr_code: String,
    pub pix_copy_paste: String,
    pub created_at: DateTime<Utc>,
}

/// One status write for a payment, checked against the locked row before it is applied.
/// The stored status must allow the move to `status`, and must equal `expected_from` when set.
/// When `activate_subscription` is set the owning subscription is promoted to active in the
/// same transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct PixPaymentStatusChange {
    pub payment_id: Uuid,
    pub expected_from: Option<PixPaymentStatus>,
    pub status: PixPaymentStatus,
    /// Kept from the stored row when `None`.
    pub transaction_id: Option<String>,
    /// Ignored when the stored row is already paid; its original `paid_at` wins.
    pub paid_at: Option<DateTime<Utc>>,
    pub activate_subscription: Option<Uuid>,
    pub changed_at: DateTime<Utc>,
}
