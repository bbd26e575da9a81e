#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;

fn make_budget(id: i64, category: &str, limit: Decimal, spent: Decimal) -> Budget {
    Budget {
        id,
        category: category.into(),
        limit,
        current_spent: spent,
        image_url: None,
    }
}

fn make_expense(id: i64, category: &str, amount: Decimal) -> Expense {
    Expense {
        id,
        category: category.into(),
        amount,
        date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        description: None,
    }
}

// ── compute_savings ───────────────────────────────────────────

#[test]
fn test_savings_under_limit() {
    assert_eq!(compute_savings(dec!(1000), Some(dec!(400))), dec!(600));
}

#[test]
fn test_savings_clamped_when_overspent() {
    assert_eq!(compute_savings(dec!(400), Some(dec!(1000))), Decimal::ZERO);
}

#[test]
fn test_savings_missing_spent_is_zero() {
    assert_eq!(compute_savings(dec!(250.50), None), dec!(250.50));
}

#[test]
fn test_savings_exactly_spent() {
    assert_eq!(compute_savings(dec!(300), Some(dec!(300))), Decimal::ZERO);
}

#[test]
fn test_savings_never_negative() {
    let values = [dec!(0), dec!(0.01), dec!(1), dec!(99.99), dec!(5000), dec!(1000000)];
    for limit in values {
        for spent in values {
            assert!(
                compute_savings(limit, Some(spent)) >= Decimal::ZERO,
                "negative savings for limit={limit} spent={spent}"
            );
        }
    }
}

// ── aggregate_totals ──────────────────────────────────────────

#[test]
fn test_totals_empty() {
    let totals = aggregate_totals(&[]);
    assert_eq!(totals, BudgetTotals::default());
    assert_eq!(totals.total_spent, Decimal::ZERO);
    assert_eq!(totals.total_limit, Decimal::ZERO);
    assert_eq!(totals.total_savings, Decimal::ZERO);
}

#[test]
fn test_totals_with_clamped_item() {
    let budgets = vec![
        make_budget(1, "Food", dec!(500), dec!(200)),
        make_budget(2, "Rent", dec!(300), dec!(300)),
    ];
    let totals = aggregate_totals(&budgets);
    assert_eq!(totals.total_spent, dec!(500));
    assert_eq!(totals.total_limit, dec!(800));
    assert_eq!(totals.total_savings, dec!(300));
}

#[test]
fn test_totals_overspent_item_contributes_no_savings() {
    let budgets = vec![
        make_budget(1, "Food", dec!(500), dec!(100)),
        make_budget(2, "Fun", dec!(100), dec!(400)),
    ];
    let totals = aggregate_totals(&budgets);
    assert_eq!(totals.total_savings, dec!(400));
    assert_eq!(totals.total_spent, dec!(500));
}

#[test]
fn test_totals_idempotent() {
    let budgets = vec![
        make_budget(1, "Food", dec!(5000), dec!(1234.56)),
        make_budget(2, "Transport", dec!(3000), dec!(3500)),
        make_budget(3, "Rent", dec!(20000), dec!(20000)),
    ];
    let first = aggregate_totals(&budgets);
    let second = aggregate_totals(&budgets);
    assert_eq!(first, second);
}

#[test]
fn test_totals_order_independent() {
    let mut budgets = vec![
        make_budget(1, "A", dec!(10), dec!(3)),
        make_budget(2, "B", dec!(20), dec!(25)),
        make_budget(3, "C", dec!(30), dec!(0)),
    ];
    let forward = aggregate_totals(&budgets);
    budgets.reverse();
    assert_eq!(aggregate_totals(&budgets), forward);
}

// ── apply_change ──────────────────────────────────────────────

#[test]
fn test_add_then_overspend_scenario() {
    let mut budgets: Vec<Budget> = Vec::new();

    apply_change(
        &mut budgets,
        Change::Added(make_budget(7, "Food", dec!(5000), dec!(0))),
    );
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].savings(), dec!(5000));
    assert!(!budgets[0].is_over_budget());

    apply_change(
        &mut budgets,
        Change::Updated(make_budget(7, "Food", dec!(5000), dec!(6000))),
    );
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].savings(), Decimal::ZERO);
    assert!(budgets[0].is_over_budget());
}

#[test]
fn test_delete_reduces_totals_by_its_contribution() {
    let mut budgets = vec![
        make_budget(1, "Food", dec!(500), dec!(200)),
        make_budget(2, "Rent", dec!(300), dec!(100)),
        make_budget(3, "Fun", dec!(100), dec!(50)),
    ];
    let before = aggregate_totals(&budgets);
    let removed = budgets[1].clone();

    assert!(apply_change(&mut budgets, Change::Removed(2)));
    assert!(Budget::find_by_id(&budgets, 2).is_none());
    assert_eq!(budgets.len(), 2);

    let after = aggregate_totals(&budgets);
    assert_eq!(after.total_limit, before.total_limit - removed.limit);
    assert_eq!(after.total_spent, before.total_spent - removed.current_spent);
    assert_eq!(after.total_savings, before.total_savings - removed.savings());
}

#[test]
fn test_remove_unknown_id_is_noop() {
    let mut budgets = vec![make_budget(1, "Food", dec!(500), dec!(200))];
    assert!(!apply_change(&mut budgets, Change::Removed(99)));
    assert_eq!(budgets.len(), 1);
}

#[test]
fn test_update_unknown_id_appends() {
    let mut budgets = vec![make_budget(1, "Food", dec!(500), dec!(200))];
    apply_change(
        &mut budgets,
        Change::Updated(make_budget(2, "Rent", dec!(900), dec!(0))),
    );
    assert_eq!(budgets.len(), 2);
    assert_eq!(budgets[1].category, "Rent");
}

#[test]
fn test_update_keeps_position() {
    let mut budgets = vec![
        make_budget(1, "Food", dec!(500), dec!(200)),
        make_budget(2, "Rent", dec!(300), dec!(100)),
        make_budget(3, "Fun", dec!(100), dec!(50)),
    ];
    apply_change(
        &mut budgets,
        Change::Updated(make_budget(2, "Housing", dec!(350), dec!(100))),
    );
    let ids: Vec<i64> = budgets.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(budgets[1].category, "Housing");
}

#[test]
fn test_reload_replaces_everything() {
    let mut budgets = vec![make_budget(1, "Food", dec!(500), dec!(200))];
    apply_change(
        &mut budgets,
        Change::Reloaded(vec![
            make_budget(4, "Gym", dec!(50), dec!(0)),
            make_budget(5, "Books", dec!(80), dec!(10)),
        ]),
    );
    let ids: Vec<i64> = budgets.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![4, 5]);
}

#[test]
fn test_apply_change_works_for_expenses() {
    let mut expenses = vec![make_expense(1, "Food", dec!(12.50))];
    apply_change(&mut expenses, Change::Added(make_expense(2, "Rent", dec!(900))));
    assert!(apply_change(&mut expenses, Change::Removed(1)));
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].id, 2);
}

// ── spending_report ───────────────────────────────────────────

#[test]
fn test_report_percentages() {
    let budgets = vec![
        make_budget(1, "Food", dec!(400), dec!(100)),
        make_budget(2, "Fun", dec!(200), dec!(300)),
    ];
    let report = spending_report(&budgets);
    assert_eq!(report.len(), 2);
    assert_eq!(report[0].percent_spent, Some(dec!(25)));
    assert!(!report[0].over_budget);
    assert_eq!(report[0].savings, dec!(300));
    assert_eq!(report[1].percent_spent, Some(dec!(150)));
    assert!(report[1].over_budget);
    assert_eq!(report[1].savings, Decimal::ZERO);
}

#[test]
fn test_report_zero_limit_has_no_percentage() {
    let report = spending_report(&[make_budget(1, "Misc", dec!(0), dec!(10))]);
    assert_eq!(report[0].percent_spent, None);
    assert!(report[0].over_budget);
}

#[test]
fn test_report_huge_ratio_has_no_percentage() {
    let budgets = [make_budget(1, "Food", dec!(0.01), Decimal::MAX)];
    let report = spending_report(&budgets);
    assert_eq!(report[0].percent_spent, None);
    assert!(report[0].over_budget);
    assert_eq!(report[0].savings, Decimal::ZERO);
}

#[test]
fn test_totals_saturate_instead_of_overflowing() {
    let budgets = vec![
        make_budget(1, "Rent", Decimal::MAX, dec!(10)),
        make_budget(2, "Food", Decimal::MAX, Decimal::MAX),
    ];
    let totals = aggregate_totals(&budgets);
    assert_eq!(totals.total_limit, Decimal::MAX);
    assert_eq!(totals.total_spent, Decimal::MAX);
    assert_eq!(totals.total_savings, Decimal::MAX - dec!(10));
}

#[test]
fn test_percent_of() {
    assert_eq!(percent_of(dec!(1), dec!(3)), Some(dec!(33.33)));
    assert_eq!(percent_of(dec!(5), Decimal::ZERO), None);
    assert_eq!(percent_of(Decimal::MAX, dec!(0.5)), None);
}

// ── expense_breakdown ─────────────────────────────────────────

#[test]
fn test_breakdown_empty() {
    assert!(expense_breakdown(&[]).is_empty());
    assert_eq!(total_expenses(&[]), Decimal::ZERO);
}

#[test]
fn test_breakdown_groups_and_sorts() {
    let expenses = vec![
        make_expense(1, "Food", dec!(100)),
        make_expense(2, "Rent", dec!(600)),
        make_expense(3, "food", dec!(200)),
        make_expense(4, "Transport", dec!(100)),
    ];
    let rows = expense_breakdown(&expenses);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].category, "Rent");
    assert_eq!(rows[0].share, dec!(60));
    assert_eq!(rows[1].category, "Food");
    assert_eq!(rows[1].total, dec!(300));
    assert_eq!(rows[1].count, 2);
    assert_eq!(rows[1].share, dec!(30));
    assert_eq!(rows[2].category, "Transport");
    assert_eq!(total_expenses(&expenses), dec!(1000));
}

#[test]
fn test_breakdown_saturates_huge_amounts() {
    let expenses = vec![
        make_expense(1, "Rent", Decimal::MAX),
        make_expense(2, "Rent", Decimal::MAX),
        make_expense(3, "Food", dec!(1)),
    ];
    let rows = expense_breakdown(&expenses);
    assert_eq!(rows[0].category, "Rent");
    assert_eq!(rows[0].total, Decimal::MAX);
    assert_eq!(rows[0].share, dec!(100));
    assert_eq!(total_expenses(&expenses), Decimal::MAX);
}
