use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::SubscriptionEntity,
    value_objects::{
        enums::subscription_statuses::SubscriptionStatus, pix_payments::PixPaymentDto,
        plans::PlanDto,
    },
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pix_payments: Option<Vec<PixPaymentDto>>,
}

impl From<SubscriptionEntity> for SubscriptionDto {
    fn from(value: SubscriptionEntity) -> Self {
        let status = value.status();
        Self {
            id: value.id,
            user_id: value.user_id,
            plan_id: value.plan_id,
            status,
            start_date: value.start_date,
            end_date: value.end_date,
            cancelled_at: value.cancelled_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
            plan: None,
            pix_payments: None,
        }
    }
}

impl SubscriptionDto {
    pub fn with_plan(mut self, plan: Option<PlanDto>) -> Self {
        self.plan = plan;
        self
    }

    pub fn with_payments(mut self, payments: Vec<PixPaymentDto>) -> Self {
        self.pix_payments = Some(payments);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscriptionModel {
    pub plan_id: Uuid,
}
