use std::fmt::Display;

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanInterval {
    Monthly,
    Quarterly,
    Yearly,
}

impl PlanInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanInterval::Monthly => "monthly",
            PlanInterval::Quarterly => "quarterly",
            PlanInterval::Yearly => "yearly",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "monthly" => Some(PlanInterval::Monthly),
            "quarterly" => Some(PlanInterval::Quarterly),
            "yearly" => Some(PlanInterval::Yearly),
            _ => None,
        }
    }

    pub fn months(&self) -> u32 {
        match self {
            PlanInterval::Monthly => 1,
            PlanInterval::Quarterly => 3,
            PlanInterval::Yearly => 12,
        }
    }

    /// End of one billing period starting at `starts_at`. Days past the end of a shorter
    /// month clamp to its last day (Jan 31 + 1 month = Feb 28/29).
    pub fn period_end(&self, starts_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        starts_at.checked_add_months(Months::new(self.months()))
    }
}

impl Display for PlanInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 30, 0).unwrap()
    }

    #[test]
    fn monthly_adds_one_calendar_month() {
        assert_eq!(
            PlanInterval::Monthly.period_end(at(2024, 1, 15)),
            Some(at(2024, 2, 15))
        );
    }

    #[test]
    fn quarterly_adds_three_months() {
        assert_eq!(
            PlanInterval::Quarterly.period_end(at(2024, 1, 15)),
            Some(at(2024, 4, 15))
        );
    }

    #[test]
    fn yearly_adds_one_year() {
        assert_eq!(
            PlanInterval::Yearly.period_end(at(2024, 1, 15)),
            Some(at(2025, 1, 15))
        );
    }

    #[test]
    fn month_end_clamps_to_shorter_month() {
        assert_eq!(
            PlanInterval::Monthly.period_end(at(2024, 1, 31)),
            Some(at(2024, 2, 29))
        );
    }

    #[test]
    fn unknown_interval_is_rejected() {
        assert_eq!(PlanInterval::from_str("weekly"), None);
        assert_eq!(
            PlanInterval::from_str("quarterly"),
            Some(PlanInterval::Quarterly)
        );
    }
}
