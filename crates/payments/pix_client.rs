use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::value_objects::{money::AmountMinor, pix_payments::PixCharge};

const PIX_GUI: &str = "BR.GOV.BCB.PIX";
const CURRENCY_BRL: &str = "986";

#[derive(Debug, Clone)]
pub struct PixClientConfig {
    pub pix_key: String,
    pub merchant_name: String,
    pub merchant_city: String,
}

/// Offline stand-in for a PIX provider. Charges are built locally as EMV "BR Code"
/// payloads keyed by the paying user, so the same user and amount always produce
/// the same instructions.
pub struct SandboxPixClient {
    config: PixClientConfig,
}

impl SandboxPixClient {
    pub fn new(config: PixClientConfig) -> Self {
        Self { config }
    }

    pub fn issue_charge(&self, user_id: Uuid, amount: AmountMinor) -> PixCharge {
        let merchant_account = format!(
            "{}{}",
            emv_field("00", PIX_GUI),
            emv_field("01", &user_id.to_string())
        );

        let payload = [
            emv_field("00", "01"),
            emv_field("26", &merchant_account),
            emv_field("52", "0000"),
            emv_field("53", CURRENCY_BRL),
            emv_field("54", &amount.to_string()),
            emv_field("58", "BR"),
            emv_field("59", &truncate(&self.config.merchant_name, 25)),
            emv_field("60", &truncate(&self.config.merchant_city, 15)),
            emv_field("62", &emv_field("05", "***")),
            "6304".to_string(),
        ]
        .concat();

        let checksum = crc16_ccitt(payload.as_bytes());

        PixCharge {
            pix_key: self.config.pix_key.clone(),
            pix_copy_paste: format!("{payload}{checksum:04X}"),
            pix_qr_code: payload,
        }
    }

    pub fn new_transaction_id(&self, at: DateTime<Utc>) -> String {
        format!("TXN-{}", at.timestamp_millis())
    }
}

fn emv_field(id: &str, value: &str) -> String {
    format!("{id}{:02}{value}", value.len())
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// CRC-16/CCITT-FALSE, the checksum BR Code payloads end with.
fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for byte in data {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn client() -> SandboxPixClient {
        SandboxPixClient::new(PixClientConfig {
            pix_key: "pix@example.com".to_string(),
            merchant_name: "Example Store".to_string(),
            merchant_city: "SAO PAULO".to_string(),
        })
    }

    #[test]
    fn crc_matches_reference_vector() {
        assert_eq!(crc16_ccitt(b"123456789"), 0x29B1);
    }

    #[test]
    fn charge_is_deterministic_for_user_and_amount() {
        let user_id = Uuid::parse_str("123e4567-e89b-12d3-a456-426614174000").unwrap();
        let amount = AmountMinor::parse("79.90").unwrap();

        let first = client().issue_charge(user_id, amount);
        let second = client().issue_charge(user_id, amount);
        assert_eq!(first, second);

        assert_eq!(first.pix_key, "pix@example.com");
        assert!(first.pix_qr_code.starts_with(
            "00020126580014BR.GOV.BCB.PIX0136123e4567-e89b-12d3-a456-426614174000"
        ));
        assert!(first.pix_qr_code.contains("5303986540579.905802BR"));
        assert!(first.pix_qr_code.contains("5913Example Store6009SAO PAULO62070503***"));
        assert!(first.pix_qr_code.ends_with("6304"));
        assert!(first.pix_copy_paste.starts_with(&first.pix_qr_code));
        assert_eq!(first.pix_copy_paste.len(), first.pix_qr_code.len() + 4);
    }

    #[test]
    fn different_amounts_produce_different_payloads() {
        let user_id = Uuid::new_v4();
        let a = client().issue_charge(user_id, AmountMinor::from_minor(2990));
        let b = client().issue_charge(user_id, AmountMinor::from_minor(7990));
        assert_ne!(a.pix_copy_paste, b.pix_copy_paste);
    }

    #[test]
    fn transaction_id_uses_millisecond_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(client().new_transaction_id(at), "TXN-1705320000000");
    }
}
