mod budget;
mod draft;
mod expense;
mod user;

pub use budget::Budget;
pub use draft::{
    check_credentials, parse_amount, parse_date, BudgetPatch, NewBudget, NewExpense,
    ProfileUpdate, Registration, ValidationError, MIN_PASSWORD_LEN,
};
pub use expense::Expense;
pub use user::User;

#[cfg(test)]
mod tests;
