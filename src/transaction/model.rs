//! The transaction record as supplied by the backend.
//!
//! Records are decoded leniently: a date or amount that cannot be parsed is
//! kept as `None` so that one bad row never prevents the rest of the table
//! from rendering.

use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

/// The category label used when the backend does not supply one.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Opaque, backend-assigned identifier for a transaction.
///
/// The backend may use integers or strings, integers are kept as their decimal
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as sent to and received from the backend.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(id) => Ok(Self(id)),
            Value::Number(id) => Ok(Self(id.to_string())),
            other => Err(de::Error::custom(format!(
                "expected a string or integer transaction id, got {other}"
            ))),
        }
    }
}

/// A single bank transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Stable identifier across reloads.
    pub id: TransactionId,
    /// The calendar date, `None` if the backend sent something unparseable.
    #[serde(default, deserialize_with = "deserialize_lenient_date")]
    pub date: Option<Date>,
    /// Display name of the merchant or counterparty.
    #[serde(default, alias = "description")]
    pub merchant: String,
    /// Signed amount, positive is income and negative is spending.
    ///
    /// `None` if the backend sent a non-numeric value.
    #[serde(default, deserialize_with = "deserialize_lenient_amount")]
    pub amount: Option<f64>,
    /// Free-text category label.
    #[serde(default = "uncategorized", deserialize_with = "deserialize_category")]
    pub category: String,
    /// Categorizer confidence in [0, 1].
    #[serde(default, deserialize_with = "deserialize_lenient_confidence")]
    pub confidence: Option<f64>,
}

impl Transaction {
    /// Whether the transaction is money coming in.
    pub fn is_income(&self) -> bool {
        self.amount.is_some_and(|amount| amount > 0.0)
    }

    /// The confidence with absent values treated as zero.
    pub fn confidence_or_zero(&self) -> f64 {
        self.confidence.unwrap_or(0.0).clamp(0.0, 1.0)
    }
}

fn uncategorized() -> String {
    UNCATEGORIZED.to_owned()
}

/// Accepts both `2025-02-01` and `2025-2-1`.
pub(crate) const DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month padding:none]-[day padding:none]");

/// Parse a calendar date from `YYYY-MM-DD`, the non-padded `YYYY-M-D`, or
/// the date part of an ISO 8601 date-time.
pub fn parse_date(text: &str) -> Option<Date> {
    let date_part = text
        .trim()
        .split(['T', ' '])
        .next()
        .filter(|part| !part.is_empty())?;

    Date::parse(date_part, DATE_FORMAT).ok()
}

fn deserialize_lenient_date<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: Deserializer<'de>,
{
    let date = match Value::deserialize(deserializer)? {
        Value::String(text) => parse_date(&text),
        _ => None,
    };

    Ok(date)
}

fn lenient_number(value: Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().replace(['$', ','], "").parse().ok(),
        _ => None,
    };

    number.filter(|number: &f64| number.is_finite())
}

fn deserialize_lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(Value::deserialize(deserializer)?))
}

fn deserialize_lenient_confidence<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(Value::deserialize(deserializer)?).map(|value| value.clamp(0.0, 1.0)))
}

fn deserialize_category<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let category = match Value::deserialize(deserializer)? {
        Value::String(text) if !text.trim().is_empty() => text,
        _ => uncategorized(),
    };

    Ok(category)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::date;

    use super::{Transaction, TransactionId, UNCATEGORIZED, parse_date};

    #[test]
    fn parses_padded_and_unpadded_dates() {
        assert_eq!(parse_date("2025-02-01"), Some(date!(2025 - 02 - 01)));
        assert_eq!(parse_date("2025-2-1"), Some(date!(2025 - 02 - 01)));
        assert_eq!(parse_date("2025-02-1"), Some(date!(2025 - 02 - 01)));
        assert_eq!(parse_date(" 2025-2-01 "), Some(date!(2025 - 02 - 01)));
        assert_eq!(parse_date("2025-10-01T13:45:00"), Some(date!(2025 - 10 - 01)));
    }

    #[test]
    fn rejects_malformed_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2025-13-01"), None);
        assert_eq!(parse_date("2025-02-30"), None);
        assert_eq!(parse_date("2025-02-01-07"), None);
    }

    #[test]
    fn decodes_backend_record() {
        let record = json!({
            "id": 42,
            "date": "2025-09-03",
            "merchant": "Countdown",
            "amount": -54.2,
            "category": "Groceries",
            "confidence": 0.83
        });

        let transaction: Transaction = serde_json::from_value(record).unwrap();

        assert_eq!(transaction.id, TransactionId::new("42"));
        assert_eq!(transaction.date, Some(date!(2025 - 09 - 03)));
        assert_eq!(transaction.merchant, "Countdown");
        assert_eq!(transaction.amount, Some(-54.2));
        assert_eq!(transaction.category, "Groceries");
        assert_eq!(transaction.confidence, Some(0.83));
        assert!(!transaction.is_income());
    }

    #[test]
    fn keeps_malformed_fields_as_none() {
        let record = json!({
            "id": "abc",
            "date": "not a date",
            "merchant": "Mystery",
            "amount": "lots",
            "category": null,
        });

        let transaction: Transaction = serde_json::from_value(record).unwrap();

        assert_eq!(transaction.date, None);
        assert_eq!(transaction.amount, None);
        assert_eq!(transaction.category, UNCATEGORIZED);
        assert_eq!(transaction.confidence, None);
        assert_eq!(transaction.confidence_or_zero(), 0.0);
    }

    #[test]
    fn accepts_numeric_strings_and_description_alias() {
        let record = json!({
            "id": "7",
            "date": "2025-1-9",
            "description": "Salary",
            "amount": "1,250.00",
            "category": "Income",
            "confidence": 1.5
        });

        let transaction: Transaction = serde_json::from_value(record).unwrap();

        assert_eq!(transaction.merchant, "Salary");
        assert_eq!(transaction.amount, Some(1250.0));
        assert_eq!(transaction.confidence, Some(1.0));
        assert!(transaction.is_income());
    }
}
