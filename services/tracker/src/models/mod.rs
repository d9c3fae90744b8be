//! Expense tracker models

pub mod category;
pub mod expense;
pub mod user;

pub use category::{Category, CategoryChoice, category_choices};
pub use expense::{Expense, NewExpense};
pub use user::{AuthUser, NewUser, User};
