use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::aggregate::{aggregate_totals, expense_breakdown, spending_report, total_expenses};
use crate::api::{ApiClient, ApiError, BudgetApi};
use crate::config::Config;
use crate::export;
use crate::models::{
    check_credentials, parse_amount, parse_date, Budget, BudgetPatch, NewBudget, NewExpense,
    Registration,
};
use crate::session::{Session, SessionStore};
use crate::ui::commands::split_budget_args;
use crate::ui::util::{format_amount, format_money, truncate};

pub(crate) fn as_cli(args: &[String], config: &Config) -> Result<()> {
    let rest = &args[2..];
    match args[1].as_str() {
        "--help" | "-h" | "help" => {
            print_usage();
            return Ok(());
        }
        "--version" | "-V" | "version" => {
            println!("homebudget {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let cli = Cli::new(config)?;
    match args[1].as_str() {
        "login" => cli.login(rest),
        "register" => cli.register(rest),
        "logout" => cli.logout(),
        "whoami" => cli.whoami(),
        "budgets" | "b" => cli.budgets(),
        "budget" => cli.budget(rest),
        "summary" | "s" => cli.summary(),
        "add-budget" => cli.add_budget(rest),
        "set-spent" => cli.set_spent(rest),
        "delete-budget" => cli.delete_budget(rest),
        "expenses" | "e" => cli.expenses(),
        "add-expense" => cli.add_expense(rest),
        "delete-expense" => cli.delete_expense(rest),
        "export" => cli.export(rest),
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("HomeBudget: budgets and expenses from your HomeBudget server");
    println!();
    println!("Usage: homebudget [command]");
    println!();
    println!("Commands:");
    println!("  (none)                                  Launch interactive TUI");
    println!("  login <email> <password>                Log in and remember the session");
    println!("  register <username> <email> <password>  Create an account and log in");
    println!("  logout                                  Forget the saved session");
    println!("  whoami                                  Show the logged-in user");
    println!("  budgets                                 List budgets");
    println!("  budget <id>                             Show one budget");
    println!("  summary                                 Totals, per-budget report, expense breakdown");
    println!("  add-budget <category> <limit> [spent]   Create a budget");
    println!("    --image <path>                        Upload an image for it first");
    println!("  set-spent <id> <amount>                 Set the amount spent on a budget");
    println!("  delete-budget <id>                      Delete a budget");
    println!("  expenses                                List expenses");
    println!("  add-expense <category> <amount> [YYYY-MM-DD] [description]");
    println!("                                          Record an expense");
    println!("  delete-expense <id>                     Delete an expense");
    println!("  export [path]                           Export expenses to CSV");
    println!("  --help, -h                              Show this help");
    println!("  --version, -V                           Show version");
}

// ── Argument helpers ─────────────────────────────────────────

pub(crate) fn parse_id(raw: Option<&String>, usage: &str) -> Result<i64> {
    let raw = raw.ok_or_else(|| anyhow::anyhow!("Usage: {usage}"))?;
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid id '{raw}'. Usage: {usage}"))
}

/// Pull `--image <path>` out of the argument list.
pub(crate) fn take_image_flag(args: &[String]) -> Result<(Vec<String>, Option<PathBuf>)> {
    let mut rest = Vec::with_capacity(args.len());
    let mut image = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--image" {
            let path = iter
                .next()
                .ok_or_else(|| anyhow::anyhow!("--image needs a file path"))?;
            image = Some(PathBuf::from(export::expand_home(path)));
        } else {
            rest.push(arg.clone());
        }
    }
    Ok((rest, image))
}

/// `<category> <amount> [YYYY-MM-DD] [description...]`. Multi-word
/// categories need shell quoting here.
pub(crate) fn parse_expense(args: &[String], today: NaiveDate) -> Result<NewExpense> {
    const USAGE: &str =
        "Usage: homebudget add-expense <category> <amount> [YYYY-MM-DD] [description]";
    let [category, amount, rest @ ..] = args else {
        anyhow::bail!(USAGE);
    };
    let amount = parse_amount("Amount", amount)?;
    let (date, description) = match rest.split_first() {
        Some((first, tail)) if parse_date(first).is_ok() => (parse_date(first)?, tail),
        _ => (today, rest),
    };
    let description = description.join(" ");
    let description = (!description.is_empty()).then_some(description.as_str());
    Ok(NewExpense::new(category, amount, date, description)?)
}

// ── Commands ─────────────────────────────────────────────────

struct Cli {
    api: ApiClient,
    store: SessionStore,
    currency: String,
}

impl Cli {
    fn new(config: &Config) -> Result<Self> {
        let api = ApiClient::new(&config.api_url, config.timeout)
            .context("Failed to build the HTTP client")?;
        Ok(Self {
            api,
            store: SessionStore::in_dir(&config.data_dir),
            currency: config.currency.clone(),
        })
    }

    fn money(&self, amount: rust_decimal::Decimal) -> String {
        format_money(amount, &self.currency)
    }

    /// Run an authenticated call with the saved session. A rejected token
    /// removes the session file.
    fn authed<T>(&self, call: impl FnOnce(&ApiClient, &Session) -> Result<T, ApiError>) -> Result<T> {
        let session = self.store.load().ok_or_else(|| {
            anyhow::anyhow!("Not logged in. Run `homebudget login <email> <password>` first.")
        })?;
        match call(&self.api, &session) {
            Ok(value) => Ok(value),
            Err(e) if e.is_unauthorized() => {
                self.store.clear()?;
                tracing::info!("saved session rejected by server; cleared");
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save_session(&self, session: &Session) -> Result<()> {
        self.store.save(session)?;
        println!("Logged in as {}", session.display_name());
        Ok(())
    }

    fn login(&self, args: &[String]) -> Result<()> {
        let [email, password] = args else {
            anyhow::bail!("Usage: homebudget login <email> <password>");
        };
        let email = check_credentials(email, password)?;
        let session = self.api.login(&email, password)?;
        self.save_session(&session)
    }

    fn register(&self, args: &[String]) -> Result<()> {
        let [username, email, password] = args else {
            anyhow::bail!("Usage: homebudget register <username> <email> <password>");
        };
        let registration = Registration::new(username, email, password)?;
        let session = self.api.register(&registration)?;
        self.save_session(&session)
    }

    fn logout(&self) -> Result<()> {
        self.store.clear()?;
        println!("Logged out");
        Ok(())
    }

    fn whoami(&self) -> Result<()> {
        let user = self.authed(|api, s| api.current_user(s))?;
        println!("{user} (id {})", user.id);
        Ok(())
    }

    fn budgets(&self) -> Result<()> {
        let budgets = self.authed(|api, s| api.get_budgets(s))?;
        print_budgets(&budgets);
        Ok(())
    }

    fn budget(&self, args: &[String]) -> Result<()> {
        let id = parse_id(args.first(), "homebudget budget <id>")?;
        let budget = self.authed(|api, s| api.get_budget(s, id))?;
        for line in budget_detail(&budget, &self.currency) {
            println!("{line}");
        }
        Ok(())
    }

    fn summary(&self) -> Result<()> {
        let (budgets, expenses) = self.authed(|api, s| {
            let budgets = api.get_budgets(s)?;
            let expenses = api.get_expenses(s)?;
            Ok((budgets, expenses))
        })?;
        let totals = aggregate_totals(&budgets);

        println!("HomeBudget summary");
        println!("{}", "─".repeat(48));
        println!("  Total limit:    {}", self.money(totals.total_limit));
        println!("  Total spent:    {}", self.money(totals.total_spent));
        println!("  Total savings:  {}", self.money(totals.total_savings));
        println!("  Expenses:       {}", self.money(total_expenses(&expenses)));

        if !budgets.is_empty() {
            println!();
            println!("Budgets:");
            for row in spending_report(&budgets) {
                let percent = row
                    .percent_spent
                    .map_or_else(|| "—".to_string(), |p| format!("{p}%"));
                println!(
                    "  {:<22} {:>12} / {:<12} {:>8}{}",
                    truncate(&row.category, 22),
                    format_amount(row.spent),
                    format_amount(row.limit),
                    percent,
                    if row.over_budget { "  OVER" } else { "" }
                );
            }
        }

        let breakdown = expense_breakdown(&expenses);
        if !breakdown.is_empty() {
            println!();
            println!("Expenses by category:");
            for share in breakdown {
                println!(
                    "  {:<22} {:>12} {:>8}  ({} item{})",
                    truncate(&share.category, 22),
                    format_amount(share.total),
                    format!("{}%", share.share),
                    share.count,
                    if share.count == 1 { "" } else { "s" }
                );
            }
        }
        Ok(())
    }

    fn add_budget(&self, args: &[String]) -> Result<()> {
        let (rest, image) = take_image_flag(args)?;
        let (category, limit, spent) =
            split_budget_args(&rest.join(" ")).map_err(|msg| anyhow::anyhow!(msg))?;
        let draft = NewBudget::new(&category, limit, spent)?;
        if let Some(path) = &image {
            if !path.is_file() {
                anyhow::bail!("File not found: {}", path.display());
            }
        }

        let budget = self.authed(|api, s| {
            let draft = match &image {
                Some(path) => draft.with_image(api.upload_image(s, path)?),
                None => draft,
            };
            api.create_budget(s, &draft)
        })?;
        println!(
            "Added budget {} (id {}): limit {}, savings {}",
            budget.category,
            budget.id,
            self.money(budget.limit),
            self.money(budget.savings())
        );
        Ok(())
    }

    fn set_spent(&self, args: &[String]) -> Result<()> {
        const USAGE: &str = "homebudget set-spent <id> <amount>";
        let id = parse_id(args.first(), USAGE)?;
        let raw = args
            .get(1)
            .ok_or_else(|| anyhow::anyhow!("Usage: {USAGE}"))?;
        let patch = BudgetPatch::spent(parse_amount("Spent", raw)?).validate()?;
        let budget = self.authed(|api, s| api.update_budget(s, id, &patch))?;
        println!(
            "{}: spent {} of {}, savings {}{}",
            budget.category,
            self.money(budget.current_spent),
            self.money(budget.limit),
            self.money(budget.savings()),
            if budget.is_over_budget() {
                " (over budget)"
            } else {
                ""
            }
        );
        Ok(())
    }

    fn delete_budget(&self, args: &[String]) -> Result<()> {
        let id = parse_id(args.first(), "homebudget delete-budget <id>")?;
        self.authed(|api, s| api.delete_budget(s, id))?;
        println!("Deleted budget {id}");
        Ok(())
    }

    fn expenses(&self) -> Result<()> {
        let mut expenses = self.authed(|api, s| api.get_expenses(s))?;
        if expenses.is_empty() {
            println!("No expenses");
            return Ok(());
        }
        expenses.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

        println!(
            "{:<6} {:<10} {:<18} {:<30} {:>12}",
            "ID", "Date", "Category", "Description", "Amount"
        );
        println!("{}", "─".repeat(80));
        for e in &expenses {
            println!(
                "{:<6} {:<10} {:<18} {:<30} {:>12}",
                e.id,
                e.date.format("%Y-%m-%d"),
                truncate(&e.category, 18),
                truncate(e.description_or_empty(), 30),
                format_amount(e.amount)
            );
        }
        println!("{}", "─".repeat(80));
        println!("{:>80}", self.money(total_expenses(&expenses)));
        Ok(())
    }

    fn add_expense(&self, args: &[String]) -> Result<()> {
        let draft = parse_expense(args, chrono::Local::now().date_naive())?;
        let expense = self.authed(|api, s| api.create_expense(s, &draft))?;
        println!(
            "Added expense {} (id {}): {} on {}",
            expense.category,
            expense.id,
            self.money(expense.amount),
            expense.date.format("%Y-%m-%d")
        );
        Ok(())
    }

    fn delete_expense(&self, args: &[String]) -> Result<()> {
        let id = parse_id(args.first(), "homebudget delete-expense <id>")?;
        self.authed(|api, s| api.delete_expense(s, id))?;
        println!("Deleted expense {id}");
        Ok(())
    }

    fn export(&self, args: &[String]) -> Result<()> {
        let path = args
            .first()
            .filter(|a| !a.starts_with('-'))
            .map(|a| export::expand_home(a))
            .unwrap_or_else(export::default_export_path);

        let expenses = self.authed(|api, s| api.get_expenses(s))?;
        let count = export::expenses_to_csv(Path::new(&path), &expenses)?;
        if count == 0 {
            println!("No expenses to export (wrote header to {path})");
        } else {
            println!("Exported {count} expenses to {path}");
        }
        Ok(())
    }
}

/// Lines describing a single budget.
pub(crate) fn budget_detail(budget: &Budget, currency: &str) -> Vec<String> {
    let mut lines = vec![
        format!("{} (id {})", budget.category, budget.id),
        format!("  Limit:    {}", format_money(budget.limit, currency)),
        format!("  Spent:    {}", format_money(budget.current_spent, currency)),
        format!("  Savings:  {}", format_money(budget.savings(), currency)),
    ];
    if let Some(url) = &budget.image_url {
        lines.push(format!("  Image:    {url}"));
    }
    lines.push(if budget.is_over_budget() {
        "  Status:   Over budget".to_string()
    } else {
        "  Status:   Within budget".to_string()
    });
    lines
}

fn print_budgets(budgets: &[Budget]) {
    if budgets.is_empty() {
        println!("No budgets");
        return;
    }
    println!(
        "{:<6} {:<22} {:>12} {:>12} {:>12}",
        "ID", "Category", "Limit", "Spent", "Savings"
    );
    println!("{}", "─".repeat(70));
    for b in budgets {
        println!(
            "{:<6} {:<22} {:>12} {:>12} {:>12}{}",
            b.id,
            truncate(&b.category, 22),
            format_amount(b.limit),
            format_amount(b.current_spent),
            format_amount(b.savings()),
            if b.is_over_budget() { "  OVER" } else { "" }
        );
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod cli_tests;
