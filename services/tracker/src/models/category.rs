//! Expense categories: a fixed built-in set plus optional persisted rows

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted category row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// Built-in categories as `(value, label)` pairs, in display order
pub const STATIC_CATEGORIES: [(&str, &str); 6] = [
    ("food", "Food"),
    ("shopping", "Shopping"),
    ("groceries", "Groceries"),
    ("personal", "Personal"),
    ("travel", "Travelling"),
    ("bill", "Bill Payments"),
];

/// One entry of the category dropdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryChoice {
    pub value: String,
    pub label: String,
}

/// Merge the built-in categories with persisted ones.
///
/// `persisted` is expected in name order. A persisted name that duplicates an
/// earlier value is skipped.
pub fn category_choices(persisted: &[Category]) -> Vec<CategoryChoice> {
    let mut choices: Vec<CategoryChoice> = STATIC_CATEGORIES
        .iter()
        .map(|(value, label)| CategoryChoice {
            value: value.to_string(),
            label: label.to_string(),
        })
        .collect();

    for category in persisted {
        if choices.iter().any(|c| c.value == category.name) {
            continue;
        }
        choices.push(CategoryChoice {
            value: category.name.clone(),
            label: category.name.clone(),
        });
    }

    choices
}
