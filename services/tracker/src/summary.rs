//! Per-category spending totals

use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::models::Expense;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: Decimal,
}

/// Running total plus one subtotal per category, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseSummary {
    pub total_amount: Decimal,
    pub by_category: Vec<CategoryTotal>,
}

impl ExpenseSummary {
    pub fn from_expenses(expenses: &[Expense]) -> Self {
        let mut summary = Self::default();

        for expense in expenses {
            summary.total_amount += expense.amount;
            match summary
                .by_category
                .iter_mut()
                .find(|t| t.category == expense.category)
            {
                Some(total) => total.amount += expense.amount,
                None => summary.by_category.push(CategoryTotal {
                    category: expense.category.clone(),
                    amount: expense.amount,
                }),
            }
        }

        summary
    }

    /// Nothing to chart
    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty() || self.total_amount.is_zero()
    }

    /// Subtotal for `category`
    #[cfg(test)]
    pub fn get(&self, category: &str) -> Option<Decimal> {
        self.by_category
            .iter()
            .find(|t| t.category == category)
            .map(|t| t.amount)
    }

    /// `amount` as a percentage of the total
    pub fn percent_of_total(&self, amount: Decimal) -> f64 {
        if self.total_amount.is_zero() {
            return 0.0;
        }
        (amount * Decimal::ONE_HUNDRED / self.total_amount)
            .to_f64()
            .unwrap_or_default()
    }
}

/// Percentage label with one decimal place
pub fn format_percent(percent: f64) -> String {
    format!("{:.1}%", percent)
}
