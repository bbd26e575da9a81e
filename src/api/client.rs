use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{multipart, Client, RequestBuilder};
use reqwest::Method;
use serde_json::Value;

use super::error::{error_for_status, ApiError};
use super::wire::{self, BudgetBody, ExpenseBody, LoginBody, ProfileBody, RegisterBody};
use super::BudgetApi;
use crate::models::{
    Budget, BudgetPatch, Expense, NewBudget, NewExpense, ProfileUpdate, Registration, User,
};
use crate::session::Session;

const BUDGET_KEYS: &[&str] = &["budget", "data"];
const EXPENSE_KEYS: &[&str] = &["expense", "data"];
const USER_KEYS: &[&str] = &["data", "user"];

/// Blocking client for the budget/expense/auth API. One method per endpoint;
/// every authenticated call takes the session explicitly.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("homebudget/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    fn authed(&self, method: Method, path: &str, session: &Session) -> RequestBuilder {
        self.request(method, path).bearer_auth(&session.token)
    }

    /// Send, map non-2xx to an error, and decode the body as JSON.
    /// An empty body decodes to `null`.
    fn send(&self, request: RequestBuilder, action: &str) -> Result<Value, ApiError> {
        let response = request.send().map_err(|e| {
            tracing::warn!(action, error = %e, "request failed");
            ApiError::Transport(e)
        })?;
        let status = response.status();
        let body = response.text()?;
        tracing::debug!(action, status = status.as_u16(), "response received");

        if !status.is_success() {
            let err = error_for_status(status.as_u16(), &body, &format!("Failed to {action}"));
            tracing::warn!(action, status = status.as_u16(), error = %err, "request rejected");
            return Err(err);
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("{action}: {e}")))
    }

    fn session_from_auth_response(&self, body: &Value) -> Result<Session, ApiError> {
        let token = wire::extract_token(body).ok_or_else(|| {
            ApiError::InvalidResponse("no access token received from the server".into())
        })?;
        let session = Session::new(token);
        let user = match wire::unwrap_record(body.clone(), USER_KEYS) {
            Some(user) => Some(wire::parse_user(user)?),
            None => match self.current_user(&session) {
                Ok(user) => Some(user),
                Err(e) if e.is_unauthorized() => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, "logged in but could not load the profile");
                    None
                }
            },
        };
        Ok(match user {
            Some(user) => session.with_user(user),
            None => session,
        })
    }
}

impl BudgetApi for ApiClient {
    // ============= Auth & profile =============

    fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let body = self.send(
            self.request(Method::POST, "/login")
                .json(&LoginBody { email, password }),
            "log in",
        )?;
        let session = self.session_from_auth_response(&body)?;
        tracing::info!(user = ?session.user_id(), "logged in");
        Ok(session)
    }

    fn register(&self, registration: &Registration) -> Result<Session, ApiError> {
        let body = self.send(
            self.request(Method::POST, "/user").json(&RegisterBody {
                username: &registration.username,
                email: &registration.email,
                password: &registration.password,
            }),
            "register",
        )?;
        tracing::info!("registered new account");
        if wire::extract_token(&body).is_some() {
            self.session_from_auth_response(&body)
        } else {
            // Some server versions only create the user; log in to get a token.
            self.login(&registration.email, &registration.password)
        }
    }

    fn current_user(&self, session: &Session) -> Result<User, ApiError> {
        let body = self.send(self.authed(Method::GET, "/user", session), "fetch profile")?;
        let record = wire::unwrap_record(body, USER_KEYS)
            .ok_or_else(|| ApiError::InvalidResponse("profile has no id".into()))?;
        wire::parse_user(record)
    }

    fn update_user(
        &self,
        session: &Session,
        id: i64,
        update: &ProfileUpdate,
    ) -> Result<User, ApiError> {
        let body = self.send(
            self.authed(Method::PUT, &format!("/user/{id}"), session)
                .json(&ProfileBody {
                    username: update.username.as_deref(),
                    email: update.email.as_deref(),
                }),
            "update profile",
        )?;
        match wire::unwrap_record(body, USER_KEYS) {
            Some(record) => wire::parse_user(record),
            None => self.current_user(session),
        }
    }

    fn delete_user(&self, session: &Session, id: i64) -> Result<(), ApiError> {
        self.send(
            self.authed(Method::DELETE, &format!("/user/{id}"), session),
            "delete account",
        )?;
        tracing::info!(user = id, "account deleted");
        Ok(())
    }

    // ============= Budgets =============

    fn get_budgets(&self, session: &Session) -> Result<Vec<Budget>, ApiError> {
        let body = self.send(self.authed(Method::GET, "/budgets", session), "fetch budgets")?;
        wire::unwrap_list(body, &["budgets", "data"])?
            .into_iter()
            .map(wire::parse_budget)
            .collect()
    }

    fn get_budget(&self, session: &Session, id: i64) -> Result<Budget, ApiError> {
        let body = self.send(
            self.authed(Method::GET, &format!("/budgets/{id}"), session),
            "fetch budget",
        )?;
        let record = wire::unwrap_record(body, BUDGET_KEYS)
            .ok_or_else(|| ApiError::InvalidResponse(format!("budget {id} missing from response")))?;
        wire::parse_budget(record)
    }

    fn create_budget(&self, session: &Session, budget: &NewBudget) -> Result<Budget, ApiError> {
        let body = self.send(
            self.authed(Method::POST, "/budgets", session)
                .json(&BudgetBody::from(budget)),
            "add budget",
        )?;
        let record = wire::unwrap_record(body, BUDGET_KEYS)
            .ok_or_else(|| ApiError::InvalidResponse("created budget has no id".into()))?;
        let created = wire::parse_budget(record)?;
        tracing::info!(budget = created.id, category = %created.category, "budget created");
        Ok(created)
    }

    fn update_budget(
        &self,
        session: &Session,
        id: i64,
        patch: &BudgetPatch,
    ) -> Result<Budget, ApiError> {
        let body = self.send(
            self.authed(Method::PUT, &format!("/budgets/{id}"), session)
                .json(&BudgetBody::from(patch)),
            "update budget",
        )?;
        tracing::info!(budget = id, "budget updated");
        match wire::unwrap_record(body, BUDGET_KEYS) {
            Some(record) => wire::parse_budget(record),
            None => self.get_budget(session, id),
        }
    }

    fn delete_budget(&self, session: &Session, id: i64) -> Result<(), ApiError> {
        self.send(
            self.authed(Method::DELETE, &format!("/budgets/{id}"), session),
            "delete budget",
        )?;
        tracing::info!(budget = id, "budget deleted");
        Ok(())
    }

    fn upload_image(&self, session: &Session, path: &Path) -> Result<String, ApiError> {
        let form = multipart::Form::new()
            .file("image", path)
            .map_err(|source| ApiError::File {
                path: path.display().to_string(),
                source,
            })?;
        let body = self.send(
            self.authed(Method::POST, "/budgets/upload", session)
                .multipart(form),
            "upload image",
        )?;
        wire::extract_image_url(&body)
            .ok_or_else(|| ApiError::InvalidResponse("upload returned no image_url".into()))
    }

    // ============= Expenses =============

    fn get_expenses(&self, session: &Session) -> Result<Vec<Expense>, ApiError> {
        let body = self.send(self.authed(Method::GET, "/expenses", session), "fetch expenses")?;
        wire::unwrap_list(body, &["expenses", "data"])?
            .into_iter()
            .map(wire::parse_expense)
            .collect()
    }

    fn create_expense(&self, session: &Session, expense: &NewExpense) -> Result<Expense, ApiError> {
        let body = self.send(
            self.authed(Method::POST, "/expenses", session)
                .json(&ExpenseBody::from(expense)),
            "add expense",
        )?;
        let record = wire::unwrap_record(body, EXPENSE_KEYS)
            .ok_or_else(|| ApiError::InvalidResponse("created expense has no id".into()))?;
        let created = wire::parse_expense(record)?;
        tracing::info!(expense = created.id, "expense created");
        Ok(created)
    }

    fn update_expense(
        &self,
        session: &Session,
        id: i64,
        expense: &NewExpense,
    ) -> Result<Expense, ApiError> {
        let body = self.send(
            self.authed(Method::PUT, &format!("/expenses/{id}"), session)
                .json(&ExpenseBody::from(expense)),
            "update expense",
        )?;
        match wire::unwrap_record(body, EXPENSE_KEYS) {
            Some(record) => wire::parse_expense(record),
            None => self
                .get_expenses(session)?
                .into_iter()
                .find(|e| e.id == id)
                .ok_or_else(|| ApiError::NotFound(format!("expense {id}"))),
        }
    }

    fn delete_expense(&self, session: &Session, id: i64) -> Result<(), ApiError> {
        self.send(
            self.authed(Method::DELETE, &format!("/expenses/{id}"), session),
            "delete expense",
        )?;
        tracing::info!(expense = id, "expense deleted");
        Ok(())
    }
}
