use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use rust_decimal::Decimal;

use super::app::{App, PendingAction, Screen};
use crate::export;
use crate::models::{
    parse_amount, parse_date, Budget, BudgetPatch, NewBudget, NewExpense, ProfileUpdate,
    ValidationError,
};
use crate::run::worker::Job;

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit HomeBudget", cmd_quit, r);
    register_command!("quit", "Quit HomeBudget", cmd_quit, r);
    register_command!("d", "Go to Dashboard", cmd_dashboard, r);
    register_command!("dashboard", "Go to Dashboard", cmd_dashboard, r);
    register_command!("b", "Go to Budgets", cmd_budgets, r);
    register_command!("budgets", "Go to Budgets", cmd_budgets, r);
    register_command!("e", "Go to Expenses", cmd_expenses, r);
    register_command!("expenses", "Go to Expenses", cmd_expenses, r);
    register_command!("p", "Go to Profile", cmd_profile, r);
    register_command!("profile", "Go to Profile", cmd_profile, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!("refresh", "Reload budgets and expenses", cmd_refresh, r);
    register_command!("r", "Reload budgets and expenses", cmd_refresh, r);
    register_command!(
        "add-budget",
        "Add budget (e.g. :add-budget Food 5000 [spent] [--image path])",
        cmd_add_budget,
        r
    );
    register_command!(
        "ab",
        "Add budget (e.g. :ab Food 5000 [spent])",
        cmd_add_budget,
        r
    );
    register_command!(
        "set-spent",
        "Set spent on selected budget (e.g. :set-spent 6000)",
        cmd_set_spent,
        r
    );
    register_command!(
        "set-limit",
        "Set limit on selected budget (e.g. :set-limit 8000)",
        cmd_set_limit,
        r
    );
    register_command!(
        "rename",
        "Rename selected budget (e.g. :rename Groceries)",
        cmd_rename,
        r
    );
    register_command!(
        "image",
        "Upload image for selected budget (e.g. :image ~/food.png)",
        cmd_image,
        r
    );
    register_command!(
        "delete-budget",
        "Delete selected budget",
        cmd_delete_budget,
        r
    );
    register_command!(
        "add-expense",
        "Add expense (e.g. :add-expense Food 250 2024-03-01 Lunch)",
        cmd_add_expense,
        r
    );
    register_command!(
        "ae",
        "Add expense (e.g. :ae Food 250 [date] [description])",
        cmd_add_expense,
        r
    );
    register_command!(
        "edit-expense",
        "Replace selected expense (e.g. :edit-expense Food 300 2024-03-01)",
        cmd_edit_expense,
        r
    );
    register_command!(
        "delete-expense",
        "Delete selected expense",
        cmd_delete_expense,
        r
    );
    register_command!(
        "export",
        "Export expenses to CSV (e.g. :export ~/expenses.csv)",
        cmd_export,
        r
    );
    register_command!(
        "username",
        "Change username (e.g. :username amina)",
        cmd_username,
        r
    );
    register_command!(
        "email",
        "Change email (e.g. :email me@example.com)",
        cmd_email,
        r
    );
    register_command!("logout", "Log out", cmd_logout, r);
    register_command!(
        "delete-account",
        "Delete your account and all its data",
        cmd_delete_account,
        r
    );

    r
});

pub(crate) fn handle_command(input: &str, app: &mut App) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        (cmd.run)(args, app)?;
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 2) // aliases make poor suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

// ── Argument parsing ─────────────────────────────────────────

/// Split `<category words...> <limit> [spent]`. The trailing one or two
/// tokens that parse as amounts are the numbers; everything before them is
/// the category.
pub(crate) fn split_budget_args(
    args: &str,
) -> Result<(String, Decimal, Decimal), String> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    // Negative numbers still count as amounts so they get a proper error.
    let is_amount = |s: &str| {
        !matches!(
            parse_amount("Amount", s),
            Err(ValidationError::NotANumber { .. })
        )
    };

    let numeric_tail = tokens
        .iter()
        .rev()
        .take_while(|t| is_amount(t))
        .count()
        .min(2);
    if numeric_tail == 0 || numeric_tail == tokens.len() {
        return Err("Usage: :add-budget <category> <limit> [spent]".into());
    }

    let split = tokens.len() - numeric_tail;
    let category = tokens[..split].join(" ");
    let limit = parse_amount("Limit", tokens[split]).map_err(|e| e.to_string())?;
    let spent = match tokens.get(split + 1) {
        Some(raw) => parse_amount("Spent", raw).map_err(|e| e.to_string())?,
        None => Decimal::ZERO,
    };
    Ok((category, limit, spent))
}

/// Split a trailing `--image <path>` off the arguments. The path runs to the
/// end of the line, so it may contain spaces, and must name an existing file.
pub(crate) fn split_image_flag(args: &str) -> Result<(&str, Option<PathBuf>), String> {
    let Some((rest, raw)) = args.split_once("--image") else {
        return Ok((args, None));
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("--image needs a file path".into());
    }
    let path = PathBuf::from(export::expand_home(raw));
    if !path.is_file() {
        return Err(format!("File not found: {}", path.display()));
    }
    Ok((rest.trim_end(), Some(path)))
}

/// Split `<category> <amount> [YYYY-MM-DD] [description...]`. The category
/// is the longest run of leading words that names an existing budget, or the
/// first word otherwise.
pub(crate) fn parse_expense_args(
    args: &str,
    budgets: &[Budget],
    today: chrono::NaiveDate,
) -> Result<NewExpense, String> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err("Usage: :add-expense <category> <amount> [YYYY-MM-DD] [description]".into());
    }

    let category_len = (1..tokens.len())
        .rev()
        .find(|&n| Budget::find_by_category(budgets, &tokens[..n].join(" ")).is_some())
        .unwrap_or(1);
    let category = tokens[..category_len].join(" ");

    let mut rest = tokens[category_len..].iter();
    let amount_raw = rest.next().copied().unwrap_or("");
    let amount = parse_amount("Amount", amount_raw).map_err(|e| e.to_string())?;

    let remaining: Vec<&str> = rest.copied().collect();
    let (date, description) = match remaining.first() {
        Some(first) if looks_like_date(first) => (
            parse_date(first).map_err(|e| e.to_string())?,
            remaining[1..].join(" "),
        ),
        _ => (today, remaining.join(" ")),
    };

    let description = (!description.is_empty()).then_some(description.as_str());
    NewExpense::new(&category, amount, date, description).map_err(|e| e.to_string())
}

fn looks_like_date(s: &str) -> bool {
    s.len() == 10 && s.as_bytes().get(4) == Some(&b'-') && s.as_bytes().get(7) == Some(&b'-')
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_dashboard(_args: &str, app: &mut App) -> anyhow::Result<()> {
    app.screen = Screen::Dashboard;
    Ok(())
}

fn cmd_budgets(_args: &str, app: &mut App) -> anyhow::Result<()> {
    app.screen = Screen::Budgets;
    Ok(())
}

fn cmd_expenses(_args: &str, app: &mut App) -> anyhow::Result<()> {
    app.screen = Screen::Expenses;
    Ok(())
}

fn cmd_profile(_args: &str, app: &mut App) -> anyhow::Result<()> {
    app.screen = Screen::Profile;
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_refresh(_args: &str, app: &mut App) -> anyhow::Result<()> {
    if app.request(Job::Refresh) {
        app.set_status("Refreshing…");
    }
    Ok(())
}

fn cmd_add_budget(args: &str, app: &mut App) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :add-budget <category> <limit> [spent] [--image path]. Example: :add-budget Food 5000");
        return Ok(());
    }

    let (args, image) = match split_image_flag(args) {
        Ok(split) => split,
        Err(msg) => {
            app.set_status(msg);
            return Ok(());
        }
    };
    let draft = split_budget_args(args)
        .and_then(|(category, limit, spent)| {
            NewBudget::new(&category, limit, spent).map_err(|e| e.to_string())
        });
    let budget = match draft {
        Ok(b) => b,
        Err(msg) => {
            app.set_status(msg);
            return Ok(());
        }
    };

    if Budget::find_by_category(&app.budgets, &budget.category).is_some() {
        app.set_status(format!(
            "Budget '{}' already exists. Use :set-limit or :set-spent",
            budget.category
        ));
        return Ok(());
    }

    let category = budget.category.clone();
    if app.request(|session| Job::CreateBudget {
        session,
        budget,
        image,
    }) {
        app.screen = Screen::Budgets;
        app.set_status(format!("Adding budget: {category}"));
    }
    Ok(())
}

/// Validate `patch` and send it for the selected budget.
fn patch_selected(app: &mut App, patch: BudgetPatch) {
    let Some((id, name)) = app
        .selected_budget()
        .map(|b| (b.id, b.category.clone()))
    else {
        app.set_status("Navigate to Budgets and select one first");
        return;
    };
    match patch.validate() {
        Ok(patch) => {
            if app.request(|session| Job::UpdateBudget { session, id, patch }) {
                app.set_status(format!("Updating budget: {name}"));
            }
        }
        Err(e) => app.set_status(e.to_string()),
    }
}

fn cmd_set_spent(args: &str, app: &mut App) -> anyhow::Result<()> {
    match parse_amount("Spent", args) {
        Ok(spent) => patch_selected(app, BudgetPatch::spent(spent)),
        Err(e) => app.set_status(format!("{e}. Usage: :set-spent <amount>")),
    }
    Ok(())
}

fn cmd_set_limit(args: &str, app: &mut App) -> anyhow::Result<()> {
    match parse_amount("Limit", args) {
        Ok(limit) => patch_selected(app, BudgetPatch::limit(limit)),
        Err(e) => app.set_status(format!("{e}. Usage: :set-limit <amount>")),
    }
    Ok(())
}

fn cmd_rename(args: &str, app: &mut App) -> anyhow::Result<()> {
    patch_selected(app, BudgetPatch::category(args));
    Ok(())
}

fn cmd_image(args: &str, app: &mut App) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :image <path-to-image>");
        return Ok(());
    }
    let path = PathBuf::from(export::expand_home(args));
    if !path.is_file() {
        app.set_status(format!("File not found: {}", path.display()));
        return Ok(());
    }
    let Some(id) = app.selected_budget().map(|b| b.id) else {
        app.set_status("Navigate to Budgets and select one first");
        return Ok(());
    };
    if app.request(|session| Job::SetBudgetImage { session, id, path }) {
        app.set_status("Uploading image…");
    }
    Ok(())
}

fn cmd_delete_budget(_args: &str, app: &mut App) -> anyhow::Result<()> {
    if app.budgets.is_empty() {
        app.set_status("No budgets to delete");
        return Ok(());
    }

    if let Some((id, name)) = app
        .selected_budget()
        .map(|b| (b.id, b.category.clone()))
    {
        app.confirm(
            format!("Delete budget '{name}'?"),
            PendingAction::DeleteBudget { id, name },
        );
    }
    Ok(())
}

fn cmd_add_expense(args: &str, app: &mut App) -> anyhow::Result<()> {
    match parse_expense_args(args, &app.budgets, today()) {
        Ok(expense) => {
            if Budget::find_by_category(&app.budgets, &expense.category).is_none() {
                tracing::debug!(category = %expense.category, "expense category has no budget");
            }
            if app.request(|session| Job::CreateExpense { session, expense }) {
                app.screen = Screen::Expenses;
                app.set_status("Adding expense…");
            }
        }
        Err(msg) => app.set_status(msg),
    }
    Ok(())
}

fn cmd_edit_expense(args: &str, app: &mut App) -> anyhow::Result<()> {
    let Some(id) = app.selected_expense().map(|e| e.id) else {
        app.set_status("Navigate to Expenses and select one first");
        return Ok(());
    };
    match parse_expense_args(args, &app.budgets, today()) {
        Ok(expense) => {
            if app.request(|session| Job::UpdateExpense {
                session,
                id,
                expense,
            }) {
                app.set_status("Updating expense…");
            }
        }
        Err(msg) => app.set_status(msg.replace(":add-expense", ":edit-expense")),
    }
    Ok(())
}

fn cmd_delete_expense(_args: &str, app: &mut App) -> anyhow::Result<()> {
    let Some((id, description)) = app.selected_expense().map(|e| {
        let label = match &e.description {
            Some(d) => format!("{} ({d})", e.category),
            None => format!("{} {}", e.category, e.amount),
        };
        (e.id, label)
    }) else {
        app.set_status("No expenses to delete");
        return Ok(());
    };
    app.confirm(
        format!("Delete expense '{description}'?"),
        PendingAction::DeleteExpense { id, description },
    );
    Ok(())
}

fn cmd_export(args: &str, app: &mut App) -> anyhow::Result<()> {
    let path = if args.is_empty() {
        export::default_export_path()
    } else {
        export::expand_home(args)
    };

    let count = export::expenses_to_csv(Path::new(&path), &app.expenses)?;
    if count == 0 {
        app.set_status(format!("No expenses to export (wrote header to {path})"));
    } else {
        app.set_status(format!("Exported {count} expenses to {path}"));
    }
    Ok(())
}

fn update_profile(app: &mut App, update: ProfileUpdate) {
    let Some(id) = app.user().map(|u| u.id) else {
        app.set_status("Profile not loaded yet. Try :refresh");
        return;
    };
    match update.validate() {
        Ok(update) => {
            if app.request(|session| Job::UpdateProfile {
                session,
                id,
                update,
            }) {
                app.set_status("Updating profile…");
            }
        }
        Err(e) => app.set_status(e.to_string()),
    }
}

fn cmd_username(args: &str, app: &mut App) -> anyhow::Result<()> {
    update_profile(
        app,
        ProfileUpdate {
            username: Some(args.to_string()),
            email: None,
        },
    );
    Ok(())
}

fn cmd_email(args: &str, app: &mut App) -> anyhow::Result<()> {
    update_profile(
        app,
        ProfileUpdate {
            username: None,
            email: Some(args.to_string()),
        },
    );
    Ok(())
}

fn cmd_logout(_args: &str, app: &mut App) -> anyhow::Result<()> {
    app.confirm("Log out?".into(), PendingAction::Logout);
    Ok(())
}

fn cmd_delete_account(_args: &str, app: &mut App) -> anyhow::Result<()> {
    let Some(id) = app.user().map(|u| u.id) else {
        app.set_status("Profile not loaded yet. Try :refresh");
        return Ok(());
    };
    app.confirm(
        "Delete your account and all budgets and expenses? This cannot be undone".into(),
        PendingAction::DeleteAccount { id },
    );
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod commands_tests;
