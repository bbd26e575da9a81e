use std::path::Path;

use anyhow::{Context, Result};

use crate::models::Expense;

pub(crate) const HEADER: [&str; 5] = ["id", "date", "category", "description", "amount"];

/// Write expenses to `path` as CSV, oldest first. Returns the number of rows
/// written (the header is not counted).
pub(crate) fn expenses_to_csv(path: &Path, expenses: &[Expense]) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    wtr.write_record(HEADER)?;

    let mut sorted: Vec<&Expense> = expenses.iter().collect();
    sorted.sort_by_key(|e| (e.date, e.id));

    for expense in &sorted {
        wtr.write_record([
            expense.id.to_string(),
            expense.date.format("%Y-%m-%d").to_string(),
            expense.category.clone(),
            expense.description_or_empty().to_string(),
            format!("{:.2}", expense.amount),
        ])
        .context("Failed to write CSV record")?;
    }
    wtr.flush().context("Failed to flush CSV file")?;

    tracing::info!(rows = sorted.len(), path = %path.display(), "exported expenses");
    Ok(sorted.len())
}

/// Expand a leading `~/` to `$HOME`.
pub(crate) fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = directories::UserDirs::new()
            .map(|d| d.home_dir().display().to_string())
            .or_else(|| std::env::var("HOME").ok())
            .unwrap_or_else(|| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

/// `~/homebudget-expenses-<YYYY-MM-DD>.csv`
pub(crate) fn default_export_path() -> String {
    let today = chrono::Local::now().format("%Y-%m-%d");
    expand_home(&format!("~/homebudget-expenses-{today}.csv"))
}
