use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::plans::PlanEntity,
    value_objects::{enums::plan_intervals::PlanInterval, money::AmountMinor},
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanDto {
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

impl From<PlanEntity> for PlanDto {
    fn from(value: PlanEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            price: value.price,
            interval: value.interval,
            features: value.features,
            is_active: value.is_active,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanModel {
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub interval: PlanInterval,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Absent fields are left unchanged. An explicit `"description": null` clears the description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePlanModel {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub description: Option<Option<String>>,
    pub price: Option<String>,
    pub interval: Option<PlanInterval>,
    pub features: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_model_distinguishes_null_from_absent() {
        let absent: UpdatePlanModel = serde_json::from_str(r#"{"name":"Pro"}"#).unwrap();
        assert_eq!(absent.description, None);

        let cleared: UpdatePlanModel = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: UpdatePlanModel = serde_json::from_str(r#"{"description":"x"}"#).unwrap();
        assert_eq!(set.description, Some(Some("x".to_string())));
    }
}
