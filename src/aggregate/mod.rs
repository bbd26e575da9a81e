//! Savings and totals over the in-memory budget list, plus the rules for
//! splicing API results back into that list.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::models::{Budget, Expense};

/// `max(limit - spent, 0)`. A missing `spent` counts as zero.
pub fn compute_savings(limit: Decimal, spent: Option<Decimal>) -> Decimal {
    (limit - spent.unwrap_or(Decimal::ZERO)).max(Decimal::ZERO)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BudgetTotals {
    pub total_spent: Decimal,
    pub total_limit: Decimal,
    pub total_savings: Decimal,
}

/// Sums over the list as given. Savings are summed per item after clamping,
/// so an overspent budget contributes zero rather than eating into the others.
/// Sums past `Decimal::MAX` saturate.
pub fn aggregate_totals(budgets: &[Budget]) -> BudgetTotals {
    budgets
        .iter()
        .fold(BudgetTotals::default(), |acc, b| BudgetTotals {
            total_spent: acc.total_spent.saturating_add(b.current_spent),
            total_limit: acc.total_limit.saturating_add(b.limit),
            total_savings: acc.total_savings.saturating_add(b.savings()),
        })
}

/// `part / whole` as a percentage with two decimals. `None` when `whole` is
/// zero or the result does not fit in a `Decimal`.
pub fn percent_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    part.checked_div(whole)?
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|p| p.round_dp(2))
}

/// Anything the API assigns an id to.
pub trait Keyed {
    fn key(&self) -> i64;
}

impl Keyed for Budget {
    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for Expense {
    fn key(&self) -> i64 {
        self.id
    }
}

/// A successful mutation (or refetch) reported by the API.
#[derive(Debug, Clone, PartialEq)]
pub enum Change<T> {
    Reloaded(Vec<T>),
    Added(T),
    Updated(T),
    Removed(i64),
}

/// Apply a change to the cached list. Returns `false` only when a removal
/// did not match anything.
pub fn apply_change<T: Keyed>(list: &mut Vec<T>, change: Change<T>) -> bool {
    match change {
        Change::Reloaded(items) => {
            *list = items;
            true
        }
        Change::Added(item) | Change::Updated(item) => {
            match list.iter_mut().find(|existing| existing.key() == item.key()) {
                Some(slot) => *slot = item,
                None => list.push(item),
            }
            true
        }
        Change::Removed(id) => {
            let before = list.len();
            list.retain(|item| item.key() != id);
            list.len() != before
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub budget_id: i64,
    pub category: String,
    pub spent: Decimal,
    pub limit: Decimal,
    pub savings: Decimal,
    /// `None` when the limit is zero or the percentage overflows.
    pub percent_spent: Option<Decimal>,
    pub over_budget: bool,
}

pub fn spending_report(budgets: &[Budget]) -> Vec<ReportRow> {
    budgets
        .iter()
        .map(|b| ReportRow {
            budget_id: b.id,
            category: b.category.clone(),
            spent: b.current_spent,
            limit: b.limit,
            savings: b.savings(),
            percent_spent: percent_of(b.current_spent, b.limit),
            over_budget: b.is_over_budget(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub total: Decimal,
    pub count: usize,
    /// Share of all recorded expenses, in percent.
    pub share: Decimal,
}

/// Expense totals per category, largest first. Categories are grouped
/// case-insensitively and shown with the first spelling seen.
pub fn expense_breakdown(expenses: &[Expense]) -> Vec<CategoryShare> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, (String, Decimal, usize)> = HashMap::new();
    for e in expenses {
        let key = e.category.trim().to_lowercase();
        let entry = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            (e.category.trim().to_string(), Decimal::ZERO, 0)
        });
        entry.1 = entry.1.saturating_add(e.amount);
        entry.2 += 1;
    }

    let grand_total = total_expenses(expenses);
    let mut rows: Vec<CategoryShare> = order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .map(|(category, total, count)| CategoryShare {
            category,
            total,
            count,
            share: percent_of(total, grand_total).unwrap_or(Decimal::ZERO),
        })
        .collect();
    // Stable sort keeps first-seen order for ties.
    rows.sort_by(|a, b| b.total.cmp(&a.total));
    rows
}

pub fn total_expenses(expenses: &[Expense]) -> Decimal {
    expenses
        .iter()
        .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.amount))
}

#[cfg(test)]
mod tests;
