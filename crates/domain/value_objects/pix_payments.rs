use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::pix_payments::PixPaymentEntity,
    value_objects::{
        enums::pix_payment_statuses::PixPaymentStatus, money::AmountMinor,
        subscriptions::SubscriptionDto,
    },
};

/// How long a PIX charge stays payable after it is issued.
pub const PIX_PAYMENT_TTL_MINUTES: i64 = 30;

pub fn pix_payment_expires_at(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + Duration::minutes(PIX_PAYMENT_TTL_MINUTES)
}

/// Payment instructions issued by the PIX provider for one charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixCharge {
    pub pix_key: String,
    pub pix_qr_code: String,
    pub pix_copy_paste: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PixPaymentDto {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub amount: AmountMinor,
    pub status: PixPaymentStatus,
    pub expires_at: DateTime<Utc>,
    pub pix_key: String,
    pub pix_qr_code: String,
    pub pix_copy_paste: String,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Box<SubscriptionDto>>,
}

impl From<PixPaymentEntity> for PixPaymentDto {
    fn from(value: PixPaymentEntity) -> Self {
        let status = value.status();
        Self {
            id: value.id,
            subscription_id: value.subscription_id,
            user_id: value.user_id,
            amount: AmountMinor::from_minor(value.amount_minor),
            status,
            expires_at: value.expires_at,
            pix_key: value.pix_key,
            pix_qr_code: value.pix_qr_code,
            pix_copy_paste: value.pix_copy_paste,
            transaction_id: value.transaction_id,
            paid_at: value.paid_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
            subscription: None,
        }
    }
}

impl PixPaymentDto {
    pub fn with_subscription(mut self, subscription: Option<SubscriptionDto>) -> Self {
        self.subscription = subscription.map(Box::new);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePixPaymentModel {
    pub subscription_id: Uuid,
    pub amount: String,
}

/// Provider notification body, the shape a PIX webhook would deliver.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePixPaymentStatusModel {
    pub id: Uuid,
    pub status: PixPaymentStatus,
    pub transaction_id: Option<String>,
}
