#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;

fn make_budget(limit: Decimal, spent: Decimal) -> Budget {
    Budget {
        id: 1,
        category: "Food".into(),
        limit,
        current_spent: spent,
        image_url: None,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ── Budget ────────────────────────────────────────────────────

#[test]
fn test_budget_savings_derived() {
    assert_eq!(make_budget(dec!(1000), dec!(400)).savings(), dec!(600));
    assert_eq!(make_budget(dec!(400), dec!(1000)).savings(), Decimal::ZERO);
}

#[test]
fn test_budget_over_budget_flag() {
    assert!(!make_budget(dec!(500), dec!(500)).is_over_budget());
    assert!(make_budget(dec!(500), dec!(500.01)).is_over_budget());
}

#[test]
fn test_budget_spent_ratio() {
    assert_eq!(make_budget(dec!(200), dec!(50)).spent_ratio(), 0.25);
    assert_eq!(make_budget(dec!(200), dec!(800)).spent_ratio(), 1.0);
    assert_eq!(make_budget(dec!(0), dec!(0)).spent_ratio(), 0.0);
    assert_eq!(make_budget(dec!(0), dec!(5)).spent_ratio(), 1.0);
    assert_eq!(make_budget(dec!(0.01), Decimal::MAX).spent_ratio(), 1.0);
}

#[test]
fn test_budget_find_by_category_case_insensitive() {
    let budgets = vec![make_budget(dec!(10), dec!(0))];
    assert!(Budget::find_by_category(&budgets, "food").is_some());
    assert!(Budget::find_by_category(&budgets, " FOOD ").is_some());
    assert!(Budget::find_by_category(&budgets, "Rent").is_none());
}

#[test]
fn test_budget_display() {
    assert_eq!(format!("{}", make_budget(dec!(1), dec!(0))), "Food");
}

// ── Expense ───────────────────────────────────────────────────

#[test]
fn test_expense_matches_category() {
    let expense = Expense {
        id: 3,
        category: "Transport".into(),
        amount: dec!(12),
        date: date(2024, 1, 5),
        description: None,
    };
    assert!(expense.matches_category("transport"));
    assert!(!expense.matches_category("Food"));
    assert_eq!(expense.description_or_empty(), "");
}

// ── parse_amount / parse_date ─────────────────────────────────

#[test]
fn test_parse_amount_plain_and_formatted() {
    assert_eq!(parse_amount("Limit", "500").unwrap(), dec!(500));
    assert_eq!(parse_amount("Limit", " 1,250.75 ").unwrap(), dec!(1250.75));
    assert_eq!(parse_amount("Limit", "$42").unwrap(), dec!(42));
    assert_eq!(parse_amount("Limit", "0").unwrap(), Decimal::ZERO);
}

#[test]
fn test_parse_amount_rejects_garbage() {
    assert_eq!(
        parse_amount("Limit", "abc"),
        Err(ValidationError::NotANumber {
            field: "Limit",
            value: "abc".into()
        })
    );
    assert!(parse_amount("Limit", "").is_err());
}

#[test]
fn test_parse_amount_rejects_negative() {
    assert_eq!(
        parse_amount("Spent", "-5"),
        Err(ValidationError::Negative { field: "Spent" })
    );
}

#[test]
fn test_parse_date() {
    assert_eq!(parse_date("2024-02-29").unwrap(), date(2024, 2, 29));
    assert!(parse_date("2023-02-29").is_err());
    assert!(parse_date("03/01/2024").is_err());
}

// ── NewBudget ─────────────────────────────────────────────────

#[test]
fn test_new_budget_valid() {
    let b = NewBudget::new("  Food ", dec!(5000), dec!(0)).unwrap();
    assert_eq!(b.category, "Food");
    assert_eq!(b.limit, dec!(5000));
    assert!(b.image_url.is_none());
    let b = b.with_image("/uploads/food.png");
    assert_eq!(b.image_url.as_deref(), Some("/uploads/food.png"));
}

#[test]
fn test_new_budget_requires_category() {
    assert_eq!(
        NewBudget::new("   ", dec!(10), dec!(0)),
        Err(ValidationError::MissingCategory)
    );
}

#[test]
fn test_new_budget_rejects_negative_limit() {
    assert_eq!(
        NewBudget::new("Food", dec!(-1), dec!(0)),
        Err(ValidationError::Negative { field: "Limit" })
    );
}

#[test]
fn test_new_budget_rejects_spent_over_limit() {
    assert!(matches!(
        NewBudget::new("Food", dec!(100), dec!(150)),
        Err(ValidationError::SpentExceedsLimit { .. })
    ));
}

// ── BudgetPatch ───────────────────────────────────────────────

#[test]
fn test_patch_empty_rejected() {
    assert_eq!(
        BudgetPatch::default().validate(),
        Err(ValidationError::EmptyUpdate)
    );
}

#[test]
fn test_patch_allows_overspending() {
    let patch = BudgetPatch::spent(dec!(6000)).validate().unwrap();
    assert_eq!(patch.current_spent, Some(dec!(6000)));
}

#[test]
fn test_patch_trims_category() {
    let patch = BudgetPatch::category("  Groceries ").validate().unwrap();
    assert_eq!(patch.category.as_deref(), Some("Groceries"));
    assert!(BudgetPatch::category(" ").validate().is_err());
}

#[test]
fn test_patch_rejects_negative_limit() {
    assert!(BudgetPatch::limit(dec!(-10)).validate().is_err());
}

// ── NewExpense ────────────────────────────────────────────────

#[test]
fn test_new_expense_valid() {
    let e = NewExpense::new("Food", dec!(12.40), date(2024, 5, 1), Some("  lunch ")).unwrap();
    assert_eq!(e.description.as_deref(), Some("lunch"));
    let e = NewExpense::new("Food", dec!(1), date(2024, 5, 1), Some("   ")).unwrap();
    assert!(e.description.is_none());
}

#[test]
fn test_new_expense_amount_must_be_positive() {
    assert_eq!(
        NewExpense::new("Food", Decimal::ZERO, date(2024, 5, 1), None),
        Err(ValidationError::NonPositiveAmount)
    );
}

// ── Registration / profile / credentials ──────────────────────

#[test]
fn test_registration_normalizes() {
    let r = Registration::new(" wally ", " Wally@Example.COM ", "hunter2hunter2").unwrap();
    assert_eq!(r.username, "wally");
    assert_eq!(r.email, "wally@example.com");
}

#[test]
fn test_registration_rules() {
    assert_eq!(
        Registration::new("", "a@b.co", "longenough"),
        Err(ValidationError::MissingUsername)
    );
    assert!(matches!(
        Registration::new("w", "not-an-email", "longenough"),
        Err(ValidationError::InvalidEmail(_))
    ));
    assert_eq!(
        Registration::new("w", "a@b.co", "short"),
        Err(ValidationError::ShortPassword)
    );
}

#[test]
fn test_profile_update_rules() {
    assert_eq!(
        ProfileUpdate::default().validate(),
        Err(ValidationError::EmptyUpdate)
    );
    let update = ProfileUpdate {
        username: None,
        email: Some("New@Mail.io".into()),
    }
    .validate()
    .unwrap();
    assert_eq!(update.email.as_deref(), Some("new@mail.io"));
    assert!(ProfileUpdate {
        username: Some("  ".into()),
        email: None
    }
    .validate()
    .is_err());
}

#[test]
fn test_check_credentials() {
    assert_eq!(check_credentials("A@b.io", "x").unwrap(), "a@b.io");
    assert_eq!(
        check_credentials("a@b.io", ""),
        Err(ValidationError::MissingPassword)
    );
    assert!(check_credentials("nope", "secret").is_err());
}
