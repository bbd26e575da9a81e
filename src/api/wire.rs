//! JSON shapes exchanged with the server, and the parse-and-validate step
//! that turns them into typed models.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ApiError;
use crate::models::{Budget, BudgetPatch, Expense, NewBudget, NewExpense, User};

// ── Incoming ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct RawBudget {
    pub(crate) id: i64,
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default)]
    pub(crate) limit: Option<Value>,
    #[serde(default, alias = "spent", alias = "amount")]
    pub(crate) current_spent: Option<Value>,
    #[serde(default)]
    pub(crate) image_url: Option<String>,
}

impl TryFrom<RawBudget> for Budget {
    type Error = ApiError;

    fn try_from(raw: RawBudget) -> Result<Self, Self::Error> {
        let limit = match raw.limit.as_ref().map(|v| decimal_field("limit", v)) {
            Some(Ok(Some(limit))) => limit,
            Some(Err(e)) => return Err(e),
            _ => {
                return Err(ApiError::InvalidResponse(format!(
                    "budget {} has no limit",
                    raw.id
                )))
            }
        };
        let current_spent = match raw.current_spent.as_ref() {
            Some(v) => decimal_field("current_spent", v)?.unwrap_or(Decimal::ZERO),
            None => Decimal::ZERO,
        };
        Ok(Budget {
            id: raw.id,
            category: raw.category.unwrap_or_default().trim().to_string(),
            limit,
            current_spent,
            image_url: raw.image_url.filter(|u| !u.trim().is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawExpense {
    pub(crate) id: i64,
    #[serde(default)]
    pub(crate) category: Option<String>,
    pub(crate) amount: Value,
    pub(crate) date: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

impl TryFrom<RawExpense> for Expense {
    type Error = ApiError;

    fn try_from(raw: RawExpense) -> Result<Self, Self::Error> {
        let amount = decimal_field("amount", &raw.amount)?
            .filter(|a| *a > Decimal::ZERO)
            .ok_or_else(|| {
                ApiError::InvalidResponse(format!("expense {} has no positive amount", raw.id))
            })?;
        Ok(Expense {
            id: raw.id,
            category: raw.category.unwrap_or_default().trim().to_string(),
            amount,
            date: parse_wire_date(&raw.date)?,
            description: raw.description.filter(|d| !d.trim().is_empty()),
        })
    }
}

/// Numbers arrive as JSON numbers or numeric strings. `null` means absent.
pub(crate) fn decimal_field(field: &str, value: &Value) -> Result<Option<Decimal>, ApiError> {
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Decimal::from(i)),
            None => parse_decimal_str(&n.to_string()),
        },
        Value::String(s) => parse_decimal_str(s.trim()),
        _ => None,
    };
    let decimal = parsed.ok_or_else(|| {
        ApiError::InvalidResponse(format!("{field} is not a number: {value}"))
    })?;
    if decimal < Decimal::ZERO {
        return Err(ApiError::InvalidResponse(format!(
            "{field} cannot be negative: {decimal}"
        )));
    }
    Ok(Some(decimal))
}

fn parse_decimal_str(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Accepts `YYYY-MM-DD`, ISO datetimes, and RFC 2822 (Flask's default
/// datetime rendering).
pub(crate) fn parse_wire_date(raw: &str) -> Result<NaiveDate, ApiError> {
    let trimmed = raw.trim();
    if let Some(prefix) = trimmed.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Ok(date);
        }
    }
    DateTime::parse_from_rfc2822(trimmed)
        .map(|dt| dt.date_naive())
        .map_err(|_| ApiError::InvalidResponse(format!("unrecognized date: {trimmed}")))
}

/// Single records may come bare or wrapped as `{"budget": {...}}`,
/// `{"data": {...}}` and so on. Returns the innermost object that has an `id`.
pub(crate) fn unwrap_record(value: Value, keys: &[&str]) -> Option<Value> {
    if value.get("id").is_some() {
        return Some(value);
    }
    for key in keys {
        if let Some(inner) = value.get(*key) {
            if let Some(found) = unwrap_record(inner.clone(), keys) {
                return Some(found);
            }
        }
    }
    None
}

/// Lists may come bare or wrapped in `data`/`budgets`/`expenses`.
pub(crate) fn unwrap_list(value: Value, keys: &[&str]) -> Result<Vec<Value>, ApiError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => keys
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| ApiError::InvalidResponse("expected a list".into())),
        other => Err(ApiError::InvalidResponse(format!(
            "expected a list, got {other}"
        ))),
    }
}

pub(crate) fn parse_budget(value: Value) -> Result<Budget, ApiError> {
    let raw: RawBudget = serde_json::from_value(value)
        .map_err(|e| ApiError::InvalidResponse(format!("budget: {e}")))?;
    Budget::try_from(raw)
}

pub(crate) fn parse_expense(value: Value) -> Result<Expense, ApiError> {
    let raw: RawExpense = serde_json::from_value(value)
        .map_err(|e| ApiError::InvalidResponse(format!("expense: {e}")))?;
    Expense::try_from(raw)
}

pub(crate) fn parse_user(value: Value) -> Result<User, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse(format!("user: {e}")))
}

/// The token may sit at the top level or under `data`, named `access_token`
/// or `token`.
pub(crate) fn extract_token(value: &Value) -> Option<String> {
    let candidates = [Some(value), value.get("data")];
    candidates
        .into_iter()
        .flatten()
        .flat_map(|v| [v.get("access_token"), v.get("token")])
        .flatten()
        .find_map(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

pub(crate) fn extract_image_url(value: &Value) -> Option<String> {
    value
        .get("image_url")
        .or_else(|| value.get("data").and_then(|d| d.get("image_url")))
        .and_then(Value::as_str)
        .filter(|u| !u.trim().is_empty())
        .map(str::to_string)
}

// ── Outgoing ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct BudgetBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) category: Option<&'a str>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) limit: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) current_spent: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) image_url: Option<&'a str>,
}

impl<'a> From<&'a NewBudget> for BudgetBody<'a> {
    fn from(b: &'a NewBudget) -> Self {
        Self {
            category: Some(&b.category),
            limit: Some(b.limit),
            current_spent: Some(b.current_spent),
            image_url: b.image_url.as_deref(),
        }
    }
}

impl<'a> From<&'a BudgetPatch> for BudgetBody<'a> {
    fn from(p: &'a BudgetPatch) -> Self {
        Self {
            category: p.category.as_deref(),
            limit: p.limit,
            current_spent: p.current_spent,
            image_url: p.image_url.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExpenseBody<'a> {
    pub(crate) category: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    pub(crate) amount: Decimal,
    pub(crate) date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<&'a str>,
}

impl<'a> From<&'a NewExpense> for ExpenseBody<'a> {
    fn from(e: &'a NewExpense) -> Self {
        Self {
            category: &e.category,
            amount: e.amount,
            date: e.date.format("%Y-%m-%d").to_string(),
            description: e.description.as_deref(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct LoginBody<'a> {
    pub(crate) email: &'a str,
    pub(crate) password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RegisterBody<'a> {
    pub(crate) username: &'a str,
    pub(crate) email: &'a str,
    pub(crate) password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ProfileBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) email: Option<&'a str>,
}
