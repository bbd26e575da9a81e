use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::aggregate::compute_savings;

/// One spending category as stored by the API.
///
/// `savings` is never stored: it is derived from `limit` and `current_spent`
/// every time it is asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: i64,
    pub category: String,
    pub limit: Decimal,
    pub current_spent: Decimal,
    pub image_url: Option<String>,
}

impl Budget {
    pub fn savings(&self) -> Decimal {
        compute_savings(self.limit, Some(self.current_spent))
    }

    pub fn is_over_budget(&self) -> bool {
        self.current_spent > self.limit
    }

    /// Fraction of the limit already spent, clamped to `0.0..=1.0` for gauges.
    pub fn spent_ratio(&self) -> f64 {
        if self.limit <= Decimal::ZERO {
            return if self.current_spent > Decimal::ZERO { 1.0 } else { 0.0 };
        }
        // A quotient too large for a Decimal is well past the limit.
        self.current_spent
            .checked_div(self.limit)
            .map_or(1.0, |r| r.to_f64().unwrap_or(0.0))
            .clamp(0.0, 1.0)
    }

    /// Find a budget by category name (case-insensitive) in a slice.
    pub fn find_by_category<'a>(budgets: &'a [Budget], category: &str) -> Option<&'a Budget> {
        let lower = category.trim().to_lowercase();
        budgets.iter().find(|b| b.category.to_lowercase() == lower)
    }

    pub fn find_by_id(budgets: &[Budget], id: i64) -> Option<&Budget> {
        budgets.iter().find(|b| b.id == id)
    }
}

impl std::fmt::Display for Budget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.category)
    }
}
