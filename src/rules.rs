// 🏷️ Scoring Rules - Seven independent point rules
// Each rule takes only the data it needs; calculate_points sums them

use crate::model::{Item, Receipt};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

const ROUND_TOTAL_POINTS: u64 = 50;
const QUARTER_MULTIPLE_POINTS: u64 = 25;
const POINTS_PER_ITEM_PAIR: u64 = 5;
const ODD_DAY_POINTS: u64 = 6;
const AFTERNOON_POINTS: u64 = 10;

/// 14:00 and 16:00 as minutes since midnight (both exclusive)
const AFTERNOON_START_MINUTES: u32 = 14 * 60;
const AFTERNOON_END_MINUTES: u32 = 16 * 60;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("{field} is not a decimal amount: {value:?}")]
    InvalidAmount { field: String, value: String },

    #[error("{field} must not be negative: {value}")]
    NegativeAmount { field: String, value: String },

    #[error("points for {field} do not fit in an integer")]
    Overflow { field: String },
}

/// Parse a money string exactly; never coerces bad input to zero
pub fn parse_amount(field: &str, value: &str) -> Result<Decimal, ScoringError> {
    let amount = Decimal::from_str(value.trim()).map_err(|_| ScoringError::InvalidAmount {
        field: field.to_string(),
        value: value.to_string(),
    })?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ScoringError::NegativeAmount {
            field: field.to_string(),
            value: value.to_string(),
        });
    }

    Ok(amount)
}

// ============================================================================
// RULES
// ============================================================================

/// One point for every alphanumeric character in the retailer name
pub fn calculate_retailer_points(retailer: &str) -> u64 {
    retailer.chars().filter(|c| c.is_alphanumeric()).count() as u64
}

/// 50 points if the total is a round dollar amount with no cents
pub fn calculate_round_total_points(total: Decimal) -> u64 {
    if total.fract().is_zero() {
        ROUND_TOTAL_POINTS
    } else {
        0
    }
}

/// 25 points if the total is a multiple of 0.25
pub fn calculate_quarter_multiple_points(total: Decimal) -> u64 {
    let quarter = Decimal::new(25, 2);
    if (total % quarter).is_zero() {
        QUARTER_MULTIPLE_POINTS
    } else {
        0
    }
}

/// 5 points for every two items; an odd leftover earns nothing
pub fn calculate_item_count_points(items: &[Item]) -> u64 {
    (items.len() as u64 / 2) * POINTS_PER_ITEM_PAIR
}

/// For each item whose trimmed description length is a multiple of 3,
/// add `ceil(price * 0.2)`
pub fn calculate_item_description_points(items: &[Item]) -> Result<u64, ScoringError> {
    let factor = Decimal::new(2, 1);
    let mut points = 0u64;

    for (i, item) in items.iter().enumerate() {
        let length = item.short_description.trim().chars().count();
        if length % 3 != 0 {
            continue;
        }

        let field = format!("items[{}].price", i);
        let price = parse_amount(&field, &item.price)?;
        let bonus = (price * factor)
            .ceil()
            .to_u64()
            .ok_or_else(|| ScoringError::Overflow { field: field.clone() })?;

        points = points
            .checked_add(bonus)
            .ok_or(ScoringError::Overflow { field })?;
    }

    Ok(points)
}

/// 6 points if the day of the purchase date is odd
pub fn calculate_odd_day_points(purchase_date: NaiveDate) -> u64 {
    if purchase_date.day() % 2 == 1 {
        ODD_DAY_POINTS
    } else {
        0
    }
}

/// 10 points if the purchase was after 14:00 and before 16:00
pub fn calculate_afternoon_purchase_points(purchase_time: NaiveTime) -> u64 {
    let minutes = purchase_time.hour() * 60 + purchase_time.minute();
    if AFTERNOON_START_MINUTES < minutes && minutes < AFTERNOON_END_MINUTES {
        AFTERNOON_POINTS
    } else {
        0
    }
}

// ============================================================================
// SCORING
// ============================================================================

/// Per-rule contributions for one receipt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointsBreakdown {
    pub retailer: u64,
    pub round_total: u64,
    pub quarter_multiple: u64,
    pub item_pairs: u64,
    pub item_descriptions: u64,
    pub odd_day: u64,
    pub afternoon: u64,
}

impl PointsBreakdown {
    /// Sum of all contributions; fails instead of wrapping
    pub fn total(&self) -> Result<u64, ScoringError> {
        [
            self.round_total,
            self.quarter_multiple,
            self.item_pairs,
            self.item_descriptions,
            self.odd_day,
            self.afternoon,
        ]
        .into_iter()
        .try_fold(self.retailer, |sum, points| sum.checked_add(points))
        .ok_or_else(|| ScoringError::Overflow {
            field: "total points".to_string(),
        })
    }
}

/// Apply every rule to a receipt
pub fn score(receipt: &Receipt) -> Result<PointsBreakdown, ScoringError> {
    let total = parse_amount("total", &receipt.total)?;

    Ok(PointsBreakdown {
        retailer: calculate_retailer_points(&receipt.retailer),
        round_total: calculate_round_total_points(total),
        quarter_multiple: calculate_quarter_multiple_points(total),
        item_pairs: calculate_item_count_points(&receipt.items),
        item_descriptions: calculate_item_description_points(&receipt.items)?,
        odd_day: calculate_odd_day_points(receipt.purchase_date),
        afternoon: calculate_afternoon_purchase_points(receipt.purchase_time),
    })
}

/// Total points for a receipt
pub fn calculate_points(receipt: &Receipt) -> Result<u64, ScoringError> {
    score(receipt)?.total()
}

// ============================================================================
// TESTS
// ============================================================================
