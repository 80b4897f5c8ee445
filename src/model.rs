// 🧾 Receipt Model - Wire payloads and validated domain types
// Payloads mirror the JSON body; Receipt is what the core scores

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// DOMAIN TYPES (immutable once constructed)
// ============================================================================

/// A single purchased line item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub short_description: String,

    /// Decimal string with two places, e.g. "5.00"
    pub price: String,
}

impl Item {
    pub fn new(short_description: impl Into<String>, price: impl Into<String>) -> Self {
        Item {
            short_description: short_description.into(),
            price: price.into(),
        }
    }
}

/// A submitted purchase receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub retailer: String,
    pub purchase_date: NaiveDate,
    pub purchase_time: NaiveTime,

    /// Decimal string with two places, e.g. "35.35"
    pub total: String,

    /// Never empty once validated
    pub items: Vec<Item>,
}

// ============================================================================
// WIRE PAYLOADS
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    pub short_description: String,
    pub price: String,
}

/// Body of `POST /receipts/process`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPayload {
    pub retailer: String,
    pub purchase_date: String,
    pub purchase_time: String,
    pub total: String,
    pub items: Vec<ItemPayload>,
}

/// Response of `POST /receipts/process`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub id: String,
}

/// Response of `GET /receipts/{id}/points`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsResponse {
    pub points: u64,
}

// ============================================================================
// VALIDATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Word characters as in `\w`: letters, digits and underscore
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Upper bound on whole digits in totals and prices
pub const MAX_AMOUNT_WHOLE_DIGITS: usize = 15;

/// `^\d{1,15}\.\d{2}$`
pub fn is_valid_amount(value: &str) -> bool {
    match value.split_once('.') {
        Some((whole, cents)) => {
            !whole.is_empty()
                && whole.len() <= MAX_AMOUNT_WHOLE_DIGITS
                && whole.chars().all(|c| c.is_ascii_digit())
                && cents.len() == 2
                && cents.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

fn is_valid_retailer(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| is_word_char(c) || c.is_whitespace() || c == '-' || c == '&')
}

fn is_valid_description(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| is_word_char(c) || c.is_whitespace() || c == '-')
}

/// Path identifiers must be non-empty and contain no whitespace
pub fn is_valid_receipt_id(id: &str) -> bool {
    !id.is_empty() && !id.chars().any(char::is_whitespace)
}

/// Accepts `HH:MM` and `HH:MM:SS` (24h)
fn parse_purchase_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

impl TryFrom<ReceiptPayload> for Receipt {
    type Error = Vec<ValidationError>;

    /// Validate every field, collecting all violations before failing
    fn try_from(payload: ReceiptPayload) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();

        if !is_valid_retailer(&payload.retailer) {
            errors.push(ValidationError::new(
                "retailer",
                "Must be non-empty and contain only letters, digits, spaces, '-' or '&'",
            ));
        }

        let purchase_date = NaiveDate::parse_from_str(&payload.purchase_date, "%Y-%m-%d").ok();
        if purchase_date.is_none() {
            errors.push(ValidationError::new(
                "purchaseDate",
                format!("Expected YYYY-MM-DD, got {:?}", payload.purchase_date),
            ));
        }

        let purchase_time = parse_purchase_time(&payload.purchase_time);
        if purchase_time.is_none() {
            errors.push(ValidationError::new(
                "purchaseTime",
                format!("Expected 24h HH:MM, got {:?}", payload.purchase_time),
            ));
        }

        if !is_valid_amount(&payload.total) {
            errors.push(ValidationError::new(
                "total",
                format!(
                    "Expected a decimal amount like 12.34 with at most {} whole digits, got {:?}",
                    MAX_AMOUNT_WHOLE_DIGITS, payload.total
                ),
            ));
        }

        if payload.items.is_empty() {
            errors.push(ValidationError::new("items", "At least one item is required"));
        }

        for (i, item) in payload.items.iter().enumerate() {
            if !is_valid_description(&item.short_description) {
                errors.push(ValidationError::new(
                    format!("items[{}].shortDescription", i),
                    "Must be non-empty and contain only letters, digits, spaces or '-'",
                ));
            }
            if !is_valid_amount(&item.price) {
                errors.push(ValidationError::new(
                    format!("items[{}].price", i),
                    format!(
                        "Expected a decimal amount like 12.34 with at most {} whole digits, got {:?}",
                        MAX_AMOUNT_WHOLE_DIGITS, item.price
                    ),
                ));
            }
        }

        match (purchase_date, purchase_time) {
            (Some(purchase_date), Some(purchase_time)) if errors.is_empty() => Ok(Receipt {
                retailer: payload.retailer,
                purchase_date,
                purchase_time,
                total: payload.total,
                items: payload
                    .items
                    .into_iter()
                    .map(|item| Item::new(item.short_description, item.price))
                    .collect(),
            }),
            _ => Err(errors),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
