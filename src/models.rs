//! Domain types for the structured receipt record.
//!
//! The field names mirror the output contract given to the model exactly;
//! the schema is enforced on deserialization so a reply with extra or
//! misshapen keys is rejected rather than silently accepted.

use serde::{Deserialize, Serialize};

/// One purchased item recognized on the receipt.
///
/// Items without an identifiable price never appear; `price` is a bare
/// positive integer with currency symbols and separators already stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuItem {
    /// Menu name, condensed to a single representative line.
    pub name: String,
    /// Price in whole currency units.
    pub price: u32,
}

/// Structured interpretation of one receipt.
///
/// Values the model could not determine are `null`, never guessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReceiptRecord {
    /// Store name, OCR misreads corrected where context allows.
    pub store_name: Option<String>,
    /// Store address as printed on the receipt.
    pub address: Option<String>,
    /// Priced line items.
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
    /// Total amount paid.
    pub total_price: Option<u32>,
}

impl ReceiptRecord {
    /// The all-null, empty-menu record used whenever the model stage cannot
    /// produce a valid structured result.
    pub fn fallback() -> Self {
        Self {
            store_name: None,
            address: None,
            menu_items: Vec::new(),
            total_price: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_shape() {
        let record = ReceiptRecord::fallback();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "storeName": null,
                "address": null,
                "menuItems": [],
                "totalPrice": null,
            })
        );
    }

    #[test]
    fn test_round_trip() {
        let record = ReceiptRecord {
            store_name: Some("탕화쿵푸마라탕(호계)".to_string()),
            address: Some("경기 안양시 동안구 평촌대로223번길 59".to_string()),
            menu_items: vec![MenuItem {
                name: "마라탕보통맛".to_string(),
                price: 9600,
            }],
            total_price: Some(9600),
        };

        let json = serde_json::to_string(&record).unwrap();
        let parsed: ReceiptRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_missing_keys_default_to_null() {
        let parsed: ReceiptRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, ReceiptRecord::fallback());
    }

    #[test]
    fn test_extra_keys_rejected() {
        let reply = r#"{"storeName": null, "address": null, "menuItems": [], "totalPrice": null, "currency": "KRW"}"#;
        assert!(serde_json::from_str::<ReceiptRecord>(reply).is_err());
    }

    #[test]
    fn test_string_price_rejected() {
        let reply = r#"{"storeName": "가게", "address": null, "menuItems": [{"name": "김치찌개", "price": "8,000"}], "totalPrice": null}"#;
        assert!(serde_json::from_str::<ReceiptRecord>(reply).is_err());
    }
}
