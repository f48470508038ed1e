use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::{enums::plan_intervals::PlanInterval, money::AmountMinor},
    infra::db::postgres::schema::subscription_plans,
};

#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntity {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: AmountMinor,
    pub interval: PlanInterval,
    pub features: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw row used for Diesel queries. Features stay as JSON and the interval as text.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_plans)]
pub struct PlanRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_minor: i64,
    pub billing_interval: String,
    pub features: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PlanRow> for PlanEntity {
    type Error = anyhow::Error;

    fn try_from(value: PlanRow) -> Result<Self, Self::Error> {
        let interval = PlanInterval::from_str(&value.billing_interval).ok_or_else(|| {
            anyhow::anyhow!(
                "plan {} has unknown billing interval `{}`",
                value.id,
                value.billing_interval
            )
        })?;
        let features = serde_json::from_value(value.features).unwrap_or_default();

        Ok(Self {
            id: value.id,
            name: value.name,
            description: value.description,
            price: AmountMinor::from_minor(value.price_minor),
            interval,
            features,
            is_active: value.is_active,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = subscription_plans)]
pub struct InsertPlanEntity {
    pub name: String,
    pub description: Option<String>,
    pub price_minor: i64,
    pub billing_interval: String,
    pub features: serde_json::Value,
    pub is_active: bool,
}

/// Partial update; `None` leaves the column untouched. `description: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = subscription_plans)]
pub struct UpdatePlanEntity {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price_minor: Option<i64>,
    pub billing_interval: Option<String>,
    pub features: Option<serde_json::Value>,
    pub is_active: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}
