use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PixPaymentStatus {
    Pending,
    Paid,
    Expired,
    Cancelled,
}

impl PixPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PixPaymentStatus::Pending => "pending",
            PixPaymentStatus::Paid => "paid",
            PixPaymentStatus::Expired => "expired",
            PixPaymentStatus::Cancelled => "cancelled",
        }
    }

    /// Unknown values read back as `Cancelled`, a terminal state that can never be paid.
    pub fn from_str(value: &str) -> Self {
        match value {
            "pending" => PixPaymentStatus::Pending,
            "paid" => PixPaymentStatus::Paid,
            "expired" => PixPaymentStatus::Expired,
            "cancelled" => PixPaymentStatus::Cancelled,
            _ => PixPaymentStatus::Cancelled,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PixPaymentStatus::Pending)
    }

    /// Pending moves anywhere; terminal states only accept a redelivery of themselves.
    pub fn can_transition_to(&self, next: PixPaymentStatus) -> bool {
        !self.is_terminal() || *self == next
    }
}

impl Display for PixPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_move_to_any_status() {
        for next in [
            PixPaymentStatus::Pending,
            PixPaymentStatus::Paid,
            PixPaymentStatus::Expired,
            PixPaymentStatus::Cancelled,
        ] {
            assert!(PixPaymentStatus::Pending.can_transition_to(next));
        }
    }

    #[test]
    fn terminal_statuses_never_go_back_to_pending() {
        for terminal in [
            PixPaymentStatus::Paid,
            PixPaymentStatus::Expired,
            PixPaymentStatus::Cancelled,
        ] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(PixPaymentStatus::Pending));
            assert!(terminal.can_transition_to(terminal));
        }
        assert!(!PixPaymentStatus::Expired.can_transition_to(PixPaymentStatus::Paid));
    }

    #[test]
    fn serializes_as_lowercase_token() {
        let json = serde_json::to_string(&PixPaymentStatus::Paid).unwrap();
        assert_eq!(json, "\"paid\"");
        let parsed: PixPaymentStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, PixPaymentStatus::Cancelled);
    }
}
