use crate::aggregate::{aggregate_totals, apply_change, BudgetTotals, Change};
use crate::models::*;
use crate::run::worker::{Job, Outcome};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Login,
    Dashboard,
    Budgets,
    Expenses,
    Profile,
}

impl Screen {
    /// Tabs reachable once logged in.
    pub(crate) fn all() -> &'static [Screen] {
        &[
            Self::Dashboard,
            Self::Budgets,
            Self::Expenses,
            Self::Profile,
        ]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login => write!(f, "Login"),
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Budgets => write!(f, "Budgets"),
            Self::Expenses => write!(f, "Expenses"),
            Self::Profile => write!(f, "Profile"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    /// Typing into the login/registration form.
    Editing,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Editing => write!(f, "EDIT"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingAction {
    DeleteBudget { id: i64, name: String },
    DeleteExpense { id: i64, description: String },
    DeleteAccount { id: i64 },
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoginField {
    Username,
    Email,
    Password,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct LoginForm {
    pub(crate) registering: bool,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
    focus: usize,
}

impl LoginForm {
    pub(crate) fn fields(&self) -> &'static [LoginField] {
        if self.registering {
            &[LoginField::Username, LoginField::Email, LoginField::Password]
        } else {
            &[LoginField::Email, LoginField::Password]
        }
    }

    pub(crate) fn focused(&self) -> LoginField {
        let fields = self.fields();
        fields[self.focus.min(fields.len() - 1)]
    }

    pub(crate) fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields().len();
    }

    pub(crate) fn prev_field(&mut self) {
        let len = self.fields().len();
        self.focus = (self.focus + len - 1) % len;
    }

    pub(crate) fn toggle_register(&mut self) {
        self.registering = !self.registering;
        self.focus = 0;
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focused() {
            LoginField::Username => &mut self.username,
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    pub(crate) fn push(&mut self, c: char) {
        self.focused_mut().push(c);
    }

    pub(crate) fn pop(&mut self) {
        self.focused_mut().pop();
    }

    /// Validated job for the current form contents.
    pub(crate) fn to_job(&self) -> Result<Job, ValidationError> {
        if self.registering {
            let registration = Registration::new(&self.username, &self.email, &self.password)?;
            Ok(Job::Register(registration))
        } else {
            let email = check_credentials(&self.email, &self.password)?;
            Ok(Job::Login {
                email,
                password: self.password.clone(),
            })
        }
    }

    fn clear_secrets(&mut self) {
        self.password.clear();
    }
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,
    pub(crate) currency: String,

    // Auth
    pub(crate) session: Option<Session>,
    /// Set whenever `session` changes; the TUI loop persists it and resets.
    pub(crate) session_changed: bool,
    /// Bumped whenever a session starts or ends. Jobs are sent tagged with
    /// the epoch current at the time; outcomes from an older one are dropped.
    pub(crate) epoch: u64,
    pub(crate) login: LoginForm,

    // Budgets
    pub(crate) budgets: Vec<Budget>,
    pub(crate) budget_index: usize,
    pub(crate) budget_scroll: usize,

    // Expenses
    pub(crate) expenses: Vec<Expense>,
    pub(crate) expense_index: usize,
    pub(crate) expense_scroll: usize,

    // Requests queued for the worker, and whether any are still running.
    pub(crate) outbox: Vec<Job>,
    pub(crate) busy: bool,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new(currency: &str, session: Option<Session>) -> Self {
        let mut app = Self {
            running: true,
            screen: Screen::Login,
            input_mode: InputMode::Editing,
            command_input: String::new(),
            status_message: String::new(),
            show_help: false,
            currency: currency.to_string(),

            session: None,
            session_changed: false,
            epoch: 0,
            login: LoginForm::default(),

            budgets: Vec::new(),
            budget_index: 0,
            budget_scroll: 0,

            expenses: Vec::new(),
            expense_index: 0,
            expense_scroll: 0,

            outbox: Vec::new(),
            busy: false,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        };
        if let Some(session) = session {
            app.start_session(session);
            app.set_status("Resuming saved session");
        }
        app
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    /// Totals over the current list. Computed on demand, never cached.
    pub(crate) fn totals(&self) -> BudgetTotals {
        aggregate_totals(&self.budgets)
    }

    pub(crate) fn over_budget_count(&self) -> usize {
        self.budgets.iter().filter(|b| b.is_over_budget()).count()
    }

    pub(crate) fn selected_budget(&self) -> Option<&Budget> {
        self.budgets.get(self.budget_index)
    }

    pub(crate) fn selected_expense(&self) -> Option<&Expense> {
        self.expenses.get(self.expense_index)
    }

    pub(crate) fn user(&self) -> Option<&User> {
        self.session.as_ref().and_then(|s| s.user.as_ref())
    }

    // ── Requests ─────────────────────────────────────────────

    /// Queue an authenticated job built from the current session.
    /// Without a session the user is sent back to the login screen.
    pub(crate) fn request(&mut self, make: impl FnOnce(Session) -> Job) -> bool {
        match self.session.clone() {
            Some(session) => {
                self.outbox.push(make(session));
                true
            }
            None => {
                self.end_session("Not logged in. Please log in first.");
                false
            }
        }
    }

    pub(crate) fn refresh(&mut self) {
        self.request(Job::Refresh);
    }

    pub(crate) fn submit_login(&mut self) {
        match self.login.to_job() {
            Ok(job) => {
                let verb = if self.login.registering {
                    "Creating account"
                } else {
                    "Logging in"
                };
                self.outbox.push(job);
                self.set_status(format!("{verb}…"));
            }
            Err(e) => self.set_status(e.to_string()),
        }
    }

    // ── Session lifecycle ────────────────────────────────────

    fn start_session(&mut self, session: Session) {
        self.session = Some(session);
        self.session_changed = true;
        self.epoch = self.epoch.wrapping_add(1);
        self.login = LoginForm::default();
        self.screen = Screen::Dashboard;
        self.input_mode = InputMode::Normal;
        self.refresh();
    }

    /// Drop the session and all cached data, and show the login form.
    pub(crate) fn end_session(&mut self, reason: &str) {
        if self.session.take().is_some() {
            self.session_changed = true;
            self.epoch = self.epoch.wrapping_add(1);
            tracing::info!(reason, "session ended");
        }
        self.budgets.clear();
        self.expenses.clear();
        self.budget_index = 0;
        self.budget_scroll = 0;
        self.expense_index = 0;
        self.expense_scroll = 0;
        self.outbox.clear();
        self.pending_action = None;
        self.confirm_message.clear();
        self.login.clear_secrets();
        self.screen = Screen::Login;
        self.input_mode = InputMode::Editing;
        self.set_status(reason);
    }

    // ── Outcomes ─────────────────────────────────────────────

    /// Apply an outcome unless it belongs to a session that has since ended
    /// or been replaced. Returns whether it was applied.
    pub(crate) fn accept_outcome(&mut self, epoch: u64, outcome: Outcome) -> bool {
        if epoch != self.epoch {
            tracing::debug!(epoch, current = self.epoch, "dropping stale outcome");
            return false;
        }
        self.apply_outcome(outcome);
        true
    }

    /// Fold a finished request into the cached state. This is the only place
    /// the budget and expense lists change after a request.
    pub(crate) fn apply_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::LoggedIn(session) => {
                let name = session.display_name().to_string();
                self.start_session(session);
                self.set_status(format!("Welcome, {name}"));
            }
            Outcome::Refreshed {
                user,
                budgets,
                expenses,
            } => {
                if let (Some(user), Some(session)) = (user, self.session.as_mut()) {
                    if session.user.as_ref() != Some(&user) {
                        session.user = Some(user);
                        self.session_changed = true;
                    }
                }
                let (b, e) = (budgets.len(), expenses.len());
                apply_change(&mut self.budgets, Change::Reloaded(budgets));
                apply_change(&mut self.expenses, Change::Reloaded(expenses));
                self.clamp_selection();
                self.set_status(format!(
                    "Loaded {b} budget{} and {e} expense{}",
                    if b == 1 { "" } else { "s" },
                    if e == 1 { "" } else { "s" }
                ));
            }
            Outcome::Budget(change) => self.apply_budget_change(change),
            Outcome::Expense(change) => self.apply_expense_change(change),
            Outcome::ProfileUpdated(user) => {
                let msg = format!("Profile updated: {user}");
                if let Some(session) = self.session.as_mut() {
                    session.user = Some(user);
                    self.session_changed = true;
                }
                self.set_status(msg);
            }
            Outcome::AccountDeleted => self.end_session("Account deleted"),
            Outcome::Failed { action, error } => {
                if error.is_unauthorized() {
                    self.end_session(&error.to_string());
                } else {
                    self.set_status(format!("Failed to {action}: {error}"));
                }
            }
        }
    }

    fn apply_budget_change(&mut self, change: Change<Budget>) {
        let msg = match &change {
            Change::Reloaded(list) => format!("Loaded {} budgets", list.len()),
            Change::Added(b) => format!("Added budget: {}", b.category),
            Change::Updated(b) if b.is_over_budget() => {
                format!("Updated budget: {} (over budget)", b.category)
            }
            Change::Updated(b) => format!("Updated budget: {}", b.category),
            Change::Removed(id) => match Budget::find_by_id(&self.budgets, *id) {
                Some(b) => format!("Deleted budget: {}", b.category),
                None => format!("Deleted budget {id}"),
            },
        };
        let added = matches!(change, Change::Added(_));
        apply_change(&mut self.budgets, change);
        if added {
            self.budget_index = self.budgets.len().saturating_sub(1);
        }
        self.clamp_selection();
        self.set_status(msg);
    }

    fn apply_expense_change(&mut self, change: Change<Expense>) {
        let msg = match &change {
            Change::Reloaded(list) => format!("Loaded {} expenses", list.len()),
            Change::Added(e) => format!("Added expense: {} {}", e.category, e.amount),
            Change::Updated(e) => format!("Updated expense: {} {}", e.category, e.amount),
            Change::Removed(id) => format!("Deleted expense {id}"),
        };
        let added = matches!(change, Change::Added(_));
        apply_change(&mut self.expenses, change);
        if added {
            self.expense_index = self.expenses.len().saturating_sub(1);
        }
        self.clamp_selection();
        self.set_status(msg);
    }

    pub(crate) fn clamp_selection(&mut self) {
        if self.budget_index >= self.budgets.len() {
            self.budget_index = self.budgets.len().saturating_sub(1);
        }
        if self.budget_scroll > self.budget_index {
            self.budget_scroll = self.budget_index;
        }
        if self.expense_index >= self.expenses.len() {
            self.expense_index = self.expenses.len().saturating_sub(1);
        }
        if self.expense_scroll > self.expense_index {
            self.expense_scroll = self.expense_index;
        }
    }

    // ── Confirmation ─────────────────────────────────────────

    pub(crate) fn confirm(&mut self, message: String, action: PendingAction) {
        self.confirm_message = message;
        self.pending_action = Some(action);
        self.input_mode = InputMode::Confirm;
    }

    /// Carry out the pending action after a `y`.
    pub(crate) fn run_pending(&mut self) {
        self.input_mode = InputMode::Normal;
        self.confirm_message.clear();
        let Some(action) = self.pending_action.take() else {
            return;
        };
        match action {
            PendingAction::DeleteBudget { id, name } => {
                if self.request(|session| Job::DeleteBudget { session, id }) {
                    self.set_status(format!("Deleting budget: {name}"));
                }
            }
            PendingAction::DeleteExpense { id, description } => {
                if self.request(|session| Job::DeleteExpense { session, id }) {
                    self.set_status(format!("Deleting expense: {description}"));
                }
            }
            PendingAction::DeleteAccount { id } => {
                if self.request(|session| Job::DeleteAccount { session, id }) {
                    self.set_status("Deleting account…");
                }
            }
            PendingAction::Logout => self.end_session("Logged out"),
        }
    }

    pub(crate) fn cancel_pending(&mut self) {
        self.pending_action = None;
        self.input_mode = InputMode::Normal;
        self.confirm_message.clear();
        self.set_status("Cancelled");
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod app_tests;
