//! HTML pages

use maud::{DOCTYPE, Markup, PreEscaped, html};
use rust_decimal::Decimal;

use crate::{
    forms::{CSRF_FIELD, ExpenseInput, FormErrors, LoginInput, RegistrationInput},
    models::{AuthUser, CategoryChoice, Expense},
    session::Flash,
    summary::{ExpenseSummary, format_percent},
};

const STYLES: &str = r#"
body { font-family: sans-serif; margin: 0; background: #f6f7f9; color: #222; }
nav { background: #2c3e50; padding: 0.75rem 1.5rem; }
nav a, nav span { color: #fff; margin-right: 1rem; text-decoration: none; }
main { max-width: 48rem; margin: 1.5rem auto; background: #fff; padding: 1.5rem; border-radius: 4px; }
.alert { padding: 0.6rem 1rem; margin-bottom: 1rem; border-radius: 4px; }
.alert-success { background: #d4edda; }
.alert-danger { background: #f8d7da; }
.alert-info { background: #d1ecf1; }
.field { margin-bottom: 1rem; }
.field label { display: block; font-weight: bold; }
.error { display: block; color: #a94442; font-size: 0.9rem; }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 0.4rem; border-bottom: 1px solid #ddd; }
td.amount { text-align: right; }
"#;

fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

fn layout(title: &str, user: Option<&AuthUser>, flashes: &[Flash], content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " - Expense Tracker" }
                style { (PreEscaped(STYLES)) }
            }
            body {
                nav {
                    @if let Some(user) = user {
                        a href="/" { "Home" }
                        a href="/add" { "Add Expense" }
                        a href="/summary" { "Summary" }
                        a href="/logout" { "Logout" }
                        span { "Signed in as " (user.username) }
                    } @else {
                        a href="/login" { "Login" }
                        a href="/register" { "Register" }
                    }
                }
                main {
                    @for flash in flashes {
                        div class={ "alert alert-" (flash.level.as_str()) } { (flash.message) }
                    }
                    (content)
                }
            }
        }
    }
}

fn field_errors(errors: &FormErrors, field: &str) -> Markup {
    html! {
        @for message in errors.field(field) {
            span class="error" { (message) }
        }
    }
}

fn csrf_field(token: &str, errors: &FormErrors) -> Markup {
    html! {
        input type="hidden" name=(CSRF_FIELD) value=(token);
        (field_errors(errors, CSRF_FIELD))
    }
}

pub fn home_page(user: &AuthUser, flashes: &[Flash], expenses: &[Expense]) -> Markup {
    layout(
        "Home",
        Some(user),
        flashes,
        html! {
            h1 { "Your Expenses" }
            @if expenses.is_empty() {
                p { "No expenses recorded yet. " a href="/add" { "Add one" } "." }
            } @else {
                table {
                    thead {
                        tr { th { "Date" } th { "Category" } th { "Amount" } th { "Description" } }
                    }
                    tbody {
                        @for expense in expenses {
                            tr {
                                td { (expense.date.format("%Y-%m-%d")) }
                                td { (expense.category) }
                                td class="amount" { (format_amount(expense.amount)) }
                                td { (expense.description.as_deref().unwrap_or("")) }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn register_page(
    flashes: &[Flash],
    input: &RegistrationInput,
    errors: &FormErrors,
    csrf_token: &str,
) -> Markup {
    layout(
        "Register",
        None,
        flashes,
        html! {
            h1 { "Join Today" }
            form method="post" action="/register" novalidate {
                (csrf_field(csrf_token, errors))
                div class="field" {
                    label for="username" { "Username" }
                    input type="text" id="username" name="username" value=(input.username);
                    (field_errors(errors, "username"))
                }
                div class="field" {
                    label for="email" { "Email" }
                    input type="email" id="email" name="email" value=(input.email);
                    (field_errors(errors, "email"))
                }
                div class="field" {
                    label for="password" { "Password" }
                    input type="password" id="password" name="password";
                    (field_errors(errors, "password"))
                }
                div class="field" {
                    label for="confirm_password" { "Confirm Password" }
                    input type="password" id="confirm_password" name="confirm_password";
                    (field_errors(errors, "confirm_password"))
                }
                button type="submit" { "Sign Up" }
            }
            p { "Already have an account? " a href="/login" { "Sign in" } }
        },
    )
}

pub fn login_page(
    flashes: &[Flash],
    input: &LoginInput,
    errors: &FormErrors,
    csrf_token: &str,
) -> Markup {
    layout(
        "Login",
        None,
        flashes,
        html! {
            h1 { "Log In" }
            form method="post" action="/login" novalidate {
                (csrf_field(csrf_token, errors))
                div class="field" {
                    label for="email" { "Email" }
                    input type="email" id="email" name="email" value=(input.email);
                    (field_errors(errors, "email"))
                }
                div class="field" {
                    label for="password" { "Password" }
                    input type="password" id="password" name="password";
                    (field_errors(errors, "password"))
                }
                button type="submit" { "Login" }
            }
            p { "Need an account? " a href="/register" { "Sign up now" } }
        },
    )
}

pub fn expense_form_page(
    user: &AuthUser,
    flashes: &[Flash],
    input: &ExpenseInput,
    choices: &[CategoryChoice],
    errors: &FormErrors,
    csrf_token: &str,
) -> Markup {
    layout(
        "Add Expense",
        Some(user),
        flashes,
        html! {
            h1 { "Add Expense" }
            form method="post" action="/add" novalidate {
                (csrf_field(csrf_token, errors))
                div class="field" {
                    label for="category" { "Category" }
                    select id="category" name="category" {
                        @for choice in choices {
                            option value=(choice.value) selected[choice.value == input.category] {
                                (choice.label)
                            }
                        }
                    }
                    (field_errors(errors, "category"))
                }
                div class="field" {
                    label for="amount" { "Amount" }
                    input type="number" step="0.01" min="0.01" id="amount" name="amount" value=(input.amount);
                    (field_errors(errors, "amount"))
                }
                div class="field" {
                    label for="date" { "Date" }
                    input type="date" id="date" name="date" value=(input.date);
                    (field_errors(errors, "date"))
                }
                div class="field" {
                    label for="description" { "Description" }
                    textarea id="description" name="description" maxlength="200" { (input.description) }
                    (field_errors(errors, "description"))
                }
                button type="submit" { "Add Expense" }
            }
        },
    )
}

pub fn summary_page(
    user: &AuthUser,
    flashes: &[Flash],
    summary: &ExpenseSummary,
    chart_png_base64: Option<&str>,
) -> Markup {
    layout(
        "Summary",
        Some(user),
        flashes,
        html! {
            h1 { "Expense Summary" }
            p { strong { "Total spent: " } span id="total-amount" { (format_amount(summary.total_amount)) } }
            @if summary.by_category.is_empty() {
                p { "No expenses recorded yet." }
            } @else {
                table {
                    thead { tr { th { "Category" } th { "Amount" } th { "Share" } } }
                    tbody {
                        @for total in &summary.by_category {
                            tr {
                                td { (total.category) }
                                td class="amount" { (format_amount(total.amount)) }
                                td class="amount" { (format_percent(summary.percent_of_total(total.amount))) }
                            }
                        }
                    }
                }
            }
            @if let Some(data) = chart_png_base64 {
                img src={ "data:image/png;base64," (data) } alt="Spending by category";
            }
        },
    )
}

pub fn not_found_page() -> Markup {
    layout(
        "Page Not Found",
        None,
        &[],
        html! {
            h1 { "Page Not Found" }
            p { "The page you requested does not exist. " a href="/" { "Back to home" } }
        },
    )
}

pub fn internal_error_page() -> Markup {
    layout(
        "Server Error",
        None,
        &[],
        html! {
            h1 { "Something Went Wrong" }
            p { "An unexpected error occurred. Your last change was not saved; please try again." }
        },
    )
}
