//! Validated inputs for the create/update endpoints.
//!
//! Every draft is checked before a request is built, so a rejected draft never
//! reaches the network.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@ \t\r\n]+@[^@ \t\r\n]+\.[^@ \t\r\n]+$").ok());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Category is required")]
    MissingCategory,
    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: &'static str, value: String },
    #[error("{field} cannot be negative")]
    Negative { field: &'static str },
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Spent ({spent}) cannot exceed the limit ({limit})")]
    SpentExceedsLimit { spent: Decimal, limit: Decimal },
    #[error("Nothing to update")]
    EmptyUpdate,
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Username is required")]
    MissingUsername,
    #[error("Invalid email address: '{0}'")]
    InvalidEmail(String),
    #[error("Password must be at least 8 characters long")]
    ShortPassword,
    #[error("Password is required")]
    MissingPassword,
}

/// Parse a user-typed amount. Accepts thousands separators and a leading `$`,
/// rejects anything non-numeric or negative.
pub fn parse_amount(field: &'static str, input: &str) -> Result<Decimal, ValidationError> {
    let cleaned = input.trim().trim_start_matches('$').replace(',', "");
    let value = Decimal::from_str(&cleaned).map_err(|_| ValidationError::NotANumber {
        field,
        value: input.trim().to_string(),
    })?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::Negative { field });
    }
    Ok(value)
}

pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(input.trim().to_string()))
}

fn check_category(category: &str) -> Result<String, ValidationError> {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingCategory);
    }
    Ok(trimmed.to_string())
}

fn check_non_negative(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::Negative { field });
    }
    Ok(())
}

fn check_email(email: &str) -> Result<String, ValidationError> {
    let normalized = email.trim().to_lowercase();
    let ok = EMAIL_RE
        .as_ref()
        .map_or(normalized.contains('@'), |re| re.is_match(&normalized));
    if !ok {
        return Err(ValidationError::InvalidEmail(email.trim().to_string()));
    }
    Ok(normalized)
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    pub category: String,
    pub limit: Decimal,
    pub current_spent: Decimal,
    pub image_url: Option<String>,
}

impl NewBudget {
    pub fn new(
        category: &str,
        limit: Decimal,
        current_spent: Decimal,
    ) -> Result<Self, ValidationError> {
        let category = check_category(category)?;
        check_non_negative("Limit", limit)?;
        check_non_negative("Spent", current_spent)?;
        if current_spent > limit {
            return Err(ValidationError::SpentExceedsLimit {
                spent: current_spent,
                limit,
            });
        }
        Ok(Self {
            category,
            limit,
            current_spent,
            image_url: None,
        })
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// Partial update of a budget. Overspending is allowed here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetPatch {
    pub category: Option<String>,
    pub limit: Option<Decimal>,
    pub current_spent: Option<Decimal>,
    pub image_url: Option<String>,
}

impl BudgetPatch {
    pub fn spent(current_spent: Decimal) -> Self {
        Self {
            current_spent: Some(current_spent),
            ..Self::default()
        }
    }

    pub fn limit(limit: Decimal) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn category(category: &str) -> Self {
        Self {
            category: Some(category.to_string()),
            ..Self::default()
        }
    }

    pub fn image(image_url: impl Into<String>) -> Self {
        Self {
            image_url: Some(image_url.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.limit.is_none()
            && self.current_spent.is_none()
            && self.image_url.is_none()
    }

    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }
        if let Some(category) = &self.category {
            self.category = Some(check_category(category)?);
        }
        if let Some(limit) = self.limit {
            check_non_negative("Limit", limit)?;
        }
        if let Some(spent) = self.current_spent {
            check_non_negative("Spent", spent)?;
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
}

impl NewExpense {
    pub fn new(
        category: &str,
        amount: Decimal,
        date: NaiveDate,
        description: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let category = check_category(category)?;
        if amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount);
        }
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Ok(Self {
            category,
            amount,
            date,
            description,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn new(username: &str, email: &str, password: &str) -> Result<Self, ValidationError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::MissingUsername);
        }
        let email = check_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::ShortPassword);
        }
        Ok(Self {
            username: username.to_string(),
            email,
            password: password.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.username.is_none() && self.email.is_none() {
            return Err(ValidationError::EmptyUpdate);
        }
        let username = match self.username {
            Some(name) if name.trim().is_empty() => return Err(ValidationError::MissingUsername),
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        let email = self.email.as_deref().map(check_email).transpose()?;
        Ok(Self { username, email })
    }
}

/// Login credentials only need to be present; the server decides the rest.
pub fn check_credentials(email: &str, password: &str) -> Result<String, ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingPassword);
    }
    check_email(email)
}
