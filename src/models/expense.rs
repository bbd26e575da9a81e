use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: i64,
    /// Free text; expected to match a budget's category.
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
}

impl Expense {
    pub fn matches_category(&self, category: &str) -> bool {
        self.category.trim().eq_ignore_ascii_case(category.trim())
    }

    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}
