#![allow(clippy::unwrap_used, clippy::panic)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use super::*;
use crate::aggregate::{aggregate_totals, apply_change};

const TOKEN: &str = "fake-token";

#[derive(Default)]
struct FakeState {
    budgets: Vec<Budget>,
    expenses: Vec<Expense>,
    next_id: i64,
    expired: bool,
    uploads: Vec<String>,
}

/// In-memory stand-in for the HTTP API.
#[derive(Clone, Default)]
struct FakeApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    fn check(&self, session: &Session) -> Result<(), ApiError> {
        if self.state.lock().unwrap().expired || session.token != TOKEN {
            return Err(ApiError::Unauthorized);
        }
        Ok(())
    }

    fn next_id(&self) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        state.next_id
    }

    fn user() -> User {
        User {
            id: 1,
            username: "wanjiku".into(),
            email: "wanjiku@example.com".into(),
        }
    }
}

impl BudgetApi for FakeApi {
    fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        if email == "wanjiku@example.com" && password == "correct horse" {
            Ok(Session::new(TOKEN).with_user(Self::user()))
        } else {
            Err(ApiError::Status {
                code: 400,
                message: "Invalid credentials".into(),
            })
        }
    }

    fn register(&self, registration: &Registration) -> Result<Session, ApiError> {
        Ok(Session::new(TOKEN).with_user(User {
            id: 2,
            username: registration.username.clone(),
            email: registration.email.clone(),
        }))
    }

    fn current_user(&self, session: &Session) -> Result<User, ApiError> {
        self.check(session)?;
        Ok(Self::user())
    }

    fn update_user(
        &self,
        session: &Session,
        id: i64,
        update: &ProfileUpdate,
    ) -> Result<User, ApiError> {
        self.check(session)?;
        let mut user = Self::user();
        user.id = id;
        if let Some(name) = &update.username {
            user.username = name.clone();
        }
        Ok(user)
    }

    fn delete_user(&self, session: &Session, _id: i64) -> Result<(), ApiError> {
        self.check(session)
    }

    fn get_budgets(&self, session: &Session) -> Result<Vec<Budget>, ApiError> {
        self.check(session)?;
        Ok(self.state.lock().unwrap().budgets.clone())
    }

    fn get_budget(&self, session: &Session, id: i64) -> Result<Budget, ApiError> {
        self.check(session)?;
        Budget::find_by_id(&self.state.lock().unwrap().budgets, id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("budget {id}")))
    }

    fn create_budget(&self, session: &Session, budget: &NewBudget) -> Result<Budget, ApiError> {
        self.check(session)?;
        let created = Budget {
            id: self.next_id(),
            category: budget.category.clone(),
            limit: budget.limit,
            current_spent: budget.current_spent,
            image_url: budget.image_url.clone(),
        };
        self.state.lock().unwrap().budgets.push(created.clone());
        Ok(created)
    }

    fn update_budget(
        &self,
        session: &Session,
        id: i64,
        patch: &BudgetPatch,
    ) -> Result<Budget, ApiError> {
        self.check(session)?;
        let mut state = self.state.lock().unwrap();
        let budget = state
            .budgets
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("budget {id}")))?;
        if let Some(category) = &patch.category {
            budget.category = category.clone();
        }
        if let Some(limit) = patch.limit {
            budget.limit = limit;
        }
        if let Some(spent) = patch.current_spent {
            budget.current_spent = spent;
        }
        if let Some(url) = &patch.image_url {
            budget.image_url = Some(url.clone());
        }
        Ok(budget.clone())
    }

    fn delete_budget(&self, session: &Session, id: i64) -> Result<(), ApiError> {
        self.check(session)?;
        let mut state = self.state.lock().unwrap();
        let before = state.budgets.len();
        state.budgets.retain(|b| b.id != id);
        if state.budgets.len() == before {
            return Err(ApiError::NotFound(format!("budget {id}")));
        }
        Ok(())
    }

    fn upload_image(&self, session: &Session, path: &Path) -> Result<String, ApiError> {
        self.check(session)?;
        let url = format!("/static/uploads/{}", path.display());
        self.state.lock().unwrap().uploads.push(url.clone());
        Ok(url)
    }

    fn get_expenses(&self, session: &Session) -> Result<Vec<Expense>, ApiError> {
        self.check(session)?;
        Ok(self.state.lock().unwrap().expenses.clone())
    }

    fn create_expense(&self, session: &Session, expense: &NewExpense) -> Result<Expense, ApiError> {
        self.check(session)?;
        let created = Expense {
            id: self.next_id(),
            category: expense.category.clone(),
            amount: expense.amount,
            date: expense.date,
            description: expense.description.clone(),
        };
        self.state.lock().unwrap().expenses.push(created.clone());
        Ok(created)
    }

    fn update_expense(
        &self,
        session: &Session,
        id: i64,
        expense: &NewExpense,
    ) -> Result<Expense, ApiError> {
        self.check(session)?;
        Ok(Expense {
            id,
            category: expense.category.clone(),
            amount: expense.amount,
            date: expense.date,
            description: expense.description.clone(),
        })
    }

    fn delete_expense(&self, session: &Session, id: i64) -> Result<(), ApiError> {
        self.check(session)?;
        self.state.lock().unwrap().expenses.retain(|e| e.id != id);
        Ok(())
    }
}

fn session() -> Session {
    Session::new(TOKEN).with_user(FakeApi::user())
}

fn budget_change(outcome: Outcome) -> Change<Budget> {
    match outcome {
        Outcome::Budget(change) => change,
        other => panic!("expected a budget change, got {other:?}"),
    }
}

// ── execute ───────────────────────────────────────────────────

#[test]
fn test_login_success_and_failure() {
    let api = FakeApi::default();
    let ok = execute(
        &api,
        Job::Login {
            email: "wanjiku@example.com".into(),
            password: "correct horse".into(),
        },
    );
    assert!(matches!(ok, Outcome::LoggedIn(ref s) if s.token == TOKEN));

    let bad = execute(
        &api,
        Job::Login {
            email: "wanjiku@example.com".into(),
            password: "nope".into(),
        },
    );
    assert!(matches!(
        bad,
        Outcome::Failed { action: "log in", error: ApiError::Status { code: 400, .. } }
    ));
}

#[test]
fn test_register_logs_in() {
    let api = FakeApi::default();
    let registration = Registration::new("otieno", "Otieno@Example.com", "longenough").unwrap();
    match execute(&api, Job::Register(registration)) {
        Outcome::LoggedIn(session) => {
            assert_eq!(session.display_name(), "otieno");
            assert_eq!(session.user.unwrap().email, "otieno@example.com");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_food_budget_scenario() {
    let api = FakeApi::default();
    let mut budgets: Vec<Budget> = Vec::new();

    let new = NewBudget::new("Food", dec!(5000), dec!(0)).unwrap();
    let added = execute(
        &api,
        Job::CreateBudget {
            session: session(),
            budget: new,
            image: None,
        },
    );
    apply_change(&mut budgets, budget_change(added));
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].savings(), dec!(5000));
    let id = budgets[0].id;

    let updated = execute(
        &api,
        Job::UpdateBudget {
            session: session(),
            id,
            patch: BudgetPatch::spent(dec!(6000)).validate().unwrap(),
        },
    );
    apply_change(&mut budgets, budget_change(updated));
    assert_eq!(budgets[0].savings(), dec!(0));
    assert!(budgets[0].is_over_budget());

    let totals = aggregate_totals(&budgets);
    assert_eq!(totals.total_spent, dec!(6000));
    assert_eq!(totals.total_limit, dec!(5000));
    assert_eq!(totals.total_savings, dec!(0));
}

#[test]
fn test_delete_budget_reports_removed_id() {
    let api = FakeApi::default();
    let created = api
        .create_budget(&session(), &NewBudget::new("Rent", dec!(100), dec!(10)).unwrap())
        .unwrap();
    let outcome = execute(
        &api,
        Job::DeleteBudget {
            session: session(),
            id: created.id,
        },
    );
    assert_eq!(budget_change(outcome), Change::Removed(created.id));
    assert!(api.get_budgets(&session()).unwrap().is_empty());
}

#[test]
fn test_create_budget_with_image_uploads_first() {
    let api = FakeApi::default();
    let outcome = execute(
        &api,
        Job::CreateBudget {
            session: session(),
            budget: NewBudget::new("Travel", dec!(300), dec!(0)).unwrap(),
            image: Some(PathBuf::from("beach.png")),
        },
    );
    match budget_change(outcome) {
        Change::Added(b) => assert_eq!(b.image_url.as_deref(), Some("/static/uploads/beach.png")),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(api.state.lock().unwrap().uploads.len(), 1);
}

#[test]
fn test_set_budget_image_updates_record() {
    let api = FakeApi::default();
    let created = api
        .create_budget(&session(), &NewBudget::new("Fun", dec!(50), dec!(0)).unwrap())
        .unwrap();
    let outcome = execute(
        &api,
        Job::SetBudgetImage {
            session: session(),
            id: created.id,
            path: PathBuf::from("fun.jpg"),
        },
    );
    match budget_change(outcome) {
        Change::Updated(b) => assert!(b.image_url.is_some()),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_refresh_returns_everything() {
    let api = FakeApi::default();
    api.create_budget(&session(), &NewBudget::new("Food", dec!(10), dec!(1)).unwrap())
        .unwrap();
    api.create_expense(
        &session(),
        &NewExpense::new(
            "Food",
            dec!(1),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            None,
        )
        .unwrap(),
    )
    .unwrap();
    match execute(&api, Job::Refresh(session())) {
        Outcome::Refreshed {
            user,
            budgets,
            expenses,
        } => {
            assert_eq!(user.unwrap().id, 1);
            assert_eq!(budgets.len(), 1);
            assert_eq!(expenses.len(), 1);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_expired_session_fails_unauthorized() {
    let api = FakeApi::default();
    api.state.lock().unwrap().expired = true;
    match execute(&api, Job::Refresh(session())) {
        Outcome::Failed { action, error } => {
            assert_eq!(action, "refresh");
            assert!(error.is_unauthorized());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_expense_jobs() {
    let api = FakeApi::default();
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let outcome = execute(
        &api,
        Job::CreateExpense {
            session: session(),
            expense: NewExpense::new("Food", dec!(20), date, Some("Lunch")).unwrap(),
        },
    );
    let id = match outcome {
        Outcome::Expense(Change::Added(e)) => e.id,
        other => panic!("unexpected {other:?}"),
    };
    let outcome = execute(&api, Job::DeleteExpense { session: session(), id });
    assert!(matches!(outcome, Outcome::Expense(Change::Removed(removed)) if removed == id));
}

#[test]
fn test_profile_jobs() {
    let api = FakeApi::default();
    let update = ProfileUpdate {
        username: Some("wk".into()),
        email: None,
    };
    let outcome = execute(
        &api,
        Job::UpdateProfile {
            session: session(),
            id: 1,
            update,
        },
    );
    assert!(matches!(outcome, Outcome::ProfileUpdated(ref u) if u.username == "wk"));
    let outcome = execute(&api, Job::DeleteAccount { session: session(), id: 1 });
    assert!(matches!(outcome, Outcome::AccountDeleted));
}

// ── Worker thread ─────────────────────────────────────────────

#[test]
fn test_worker_runs_jobs_in_order() {
    let api = FakeApi::default();
    let mut worker = Worker::spawn(api.clone()).unwrap();
    assert!(!worker.is_busy());

    let jobs = [("A", dec!(1)), ("B", dec!(2)), ("C", dec!(3))];
    for (epoch, (category, limit)) in (1u64..).zip(jobs) {
        worker
            .submit(
                epoch,
                Job::CreateBudget {
                    session: session(),
                    budget: NewBudget::new(category, limit, dec!(0)).unwrap(),
                    image: None,
                },
            )
            .unwrap();
    }
    assert!(worker.is_busy());

    let mut seen = Vec::new();
    for _ in 0..3 {
        match worker.wait(Duration::from_secs(5)) {
            Some((epoch, Outcome::Budget(Change::Added(b)))) => seen.push((epoch, b.category)),
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(
        seen,
        vec![(1, "A".to_string()), (2, "B".to_string()), (3, "C".to_string())]
    );
    assert!(!worker.is_busy());
    assert!(worker.poll().unwrap().is_none());
}

#[test]
fn test_worker_reports_failures() {
    let api = FakeApi::default();
    let mut worker = Worker::spawn(api).unwrap();
    worker
        .submit(
            7,
            Job::DeleteBudget {
                session: session(),
                id: 404,
            },
        )
        .unwrap();
    match worker.wait(Duration::from_secs(5)) {
        Some((7, Outcome::Failed { action, error })) => {
            assert_eq!(action, "delete budget");
            assert!(matches!(error, ApiError::NotFound(_)));
        }
        other => panic!("unexpected {other:?}"),
    }
}
