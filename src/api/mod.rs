mod client;
mod error;
mod wire;

use std::path::Path;

pub use client::ApiClient;
pub use error::ApiError;

use crate::models::{
    Budget, BudgetPatch, Expense, NewBudget, NewExpense, ProfileUpdate, Registration, User,
};
use crate::session::Session;

/// Every endpoint the client talks to. `ApiClient` is the HTTP implementation;
/// the request worker and the CLI only depend on this trait.
pub trait BudgetApi: Send + 'static {
    fn login(&self, email: &str, password: &str) -> Result<Session, ApiError>;
    fn register(&self, registration: &Registration) -> Result<Session, ApiError>;
    fn current_user(&self, session: &Session) -> Result<User, ApiError>;
    fn update_user(
        &self,
        session: &Session,
        id: i64,
        update: &ProfileUpdate,
    ) -> Result<User, ApiError>;
    fn delete_user(&self, session: &Session, id: i64) -> Result<(), ApiError>;

    fn get_budgets(&self, session: &Session) -> Result<Vec<Budget>, ApiError>;
    fn get_budget(&self, session: &Session, id: i64) -> Result<Budget, ApiError>;
    fn create_budget(&self, session: &Session, budget: &NewBudget) -> Result<Budget, ApiError>;
    fn update_budget(
        &self,
        session: &Session,
        id: i64,
        patch: &BudgetPatch,
    ) -> Result<Budget, ApiError>;
    fn delete_budget(&self, session: &Session, id: i64) -> Result<(), ApiError>;
    fn upload_image(&self, session: &Session, path: &Path) -> Result<String, ApiError>;

    fn get_expenses(&self, session: &Session) -> Result<Vec<Expense>, ApiError>;
    fn create_expense(&self, session: &Session, expense: &NewExpense) -> Result<Expense, ApiError>;
    fn update_expense(
        &self,
        session: &Session,
        id: i64,
        expense: &NewExpense,
    ) -> Result<Expense, ApiError>;
    fn delete_expense(&self, session: &Session, id: i64) -> Result<(), ApiError>;
}
