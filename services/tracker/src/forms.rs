//! Form inputs and their validation
//!
//! Raw inputs are deserialized from `application/x-www-form-urlencoded`
//! bodies with every field defaulting to empty, then validated into typed
//! values or a set of per-field error messages.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{
    models::{CategoryChoice, NewExpense},
    repositories::{StoreResult, UserStore},
    validation::{
        REQUIRED, parse_amount, parse_date, validate_email, validate_length, validate_max_length,
        validate_required,
    },
};

pub const CSRF_FIELD: &str = "csrf_token";

/// Per-field validation messages
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl FormErrors {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    /// Messages recorded for `field`, empty when it passed
    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn check(&mut self, field: &'static str, result: Result<(), String>) -> bool {
        match result {
            Ok(()) => true,
            Err(message) => {
                self.add(field, message);
                false
            }
        }
    }
}

/// Fold a CSRF verdict into a validation outcome
pub fn require_csrf<T>(
    csrf: Result<(), String>,
    outcome: Result<T, FormErrors>,
) -> Result<T, FormErrors> {
    match (csrf, outcome) {
        (Ok(()), outcome) => outcome,
        (Err(message), Ok(_)) => Err(FormErrors::single(CSRF_FIELD, message)),
        (Err(message), Err(mut errors)) => {
            errors.add(CSRF_FIELD, message);
            Err(errors)
        }
    }
}

/// Message shown when a unique user field is already in use
pub fn taken_message(field: &str) -> &'static str {
    match field {
        "username" => "Username is already taken.",
        "email" => "Email is already registered.",
        _ => "This value is already in use.",
    }
}

/// Raw registration form
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrationInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub csrf_token: String,
}

/// Validated registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Raw login form
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub csrf_token: String,
}

/// Validated login credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Raw expense form
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ExpenseInput {
    pub category: String,
    pub amount: String,
    pub date: String,
    pub description: String,
    pub csrf_token: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a registration, including uniqueness of username and email
pub async fn validate_registration(
    input: &RegistrationInput,
    users: &dyn UserStore,
) -> StoreResult<Result<Registration, FormErrors>> {
    let mut errors = FormErrors::default();

    let username = input.username.trim().to_string();
    let username_ok = errors.check("username", validate_required(&username))
        && errors.check("username", validate_length(&username, 2, 20));
    if username_ok && users.find_by_username(&username).await?.is_some() {
        errors.add("username", taken_message("username"));
    }

    let email = normalize_email(&input.email);
    let email_ok = errors.check("email", validate_required(&email))
        && errors.check("email", validate_email(&email));
    if email_ok && users.find_by_email(&email).await?.is_some() {
        errors.add("email", taken_message("email"));
    }

    errors.check("password", validate_required(&input.password));

    if errors.check("confirm_password", validate_required(&input.confirm_password))
        && input.confirm_password != input.password
    {
        errors.add("confirm_password", "Field must be equal to password.");
    }

    if !errors.is_empty() {
        return Ok(Err(errors));
    }

    Ok(Ok(Registration {
        username,
        email,
        password: input.password.clone(),
    }))
}

/// Validate a login form; credentials are checked by the caller
pub fn validate_login(input: &LoginInput) -> Result<Credentials, FormErrors> {
    let mut errors = FormErrors::default();

    let email = normalize_email(&input.email);
    if errors.check("email", validate_required(&email)) {
        errors.check("email", validate_email(&email));
    }

    errors.check("password", validate_required(&input.password));

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(Credentials {
        email,
        password: input.password.clone(),
    })
}

/// Validate an expense against the offered category choices
pub fn validate_expense(
    input: &ExpenseInput,
    choices: &[CategoryChoice],
) -> Result<NewExpense, FormErrors> {
    let mut errors = FormErrors::default();

    // Dropdown values are matched exactly, padding included
    let category = input.category.as_str();
    if errors.check("category", validate_required(category))
        && !choices.iter().any(|c| c.value == category)
    {
        errors.add("category", "Not a valid choice.");
    }

    let amount = if input.amount.trim().is_empty() {
        errors.add("amount", REQUIRED);
        None
    } else {
        parse_amount(&input.amount)
            .map_err(|message| errors.add("amount", message))
            .ok()
    };

    let date = if input.date.trim().is_empty() {
        errors.add("date", REQUIRED);
        None
    } else {
        parse_date(&input.date)
            .map_err(|message| errors.add("date", message))
            .ok()
    };

    let description = input.description.trim();
    errors.check("description", validate_max_length(description, 200));

    match (amount, date) {
        (Some(amount), Some(date)) if errors.is_empty() => Ok(NewExpense {
            category: category.to_string(),
            amount,
            date,
            description: (!description.is_empty()).then(|| description.to_string()),
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, category_choices};
    use crate::repositories::MemoryStore;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn registration(username: &str, email: &str, password: &str, confirm: &str) -> RegistrationInput {
        RegistrationInput {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
            csrf_token: String::new(),
        }
    }

    fn expense(category: &str, amount: &str, date: &str, description: &str) -> ExpenseInput {
        ExpenseInput {
            category: category.to_string(),
            amount: amount.to_string(),
            date: date.to_string(),
            description: description.to_string(),
            csrf_token: String::new(),
        }
    }

    #[tokio::test]
    async fn test_valid_registration_is_normalized() {
        let store = MemoryStore::new();
        let input = registration("  carol ", " Carol@Example.COM ", "pw", "pw");

        let valid = validate_registration(&input, &store).await.unwrap().unwrap();
        assert_eq!(
            valid,
            Registration {
                username: "carol".to_string(),
                email: "carol@example.com".to_string(),
                password: "pw".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_registration_reports_each_field() {
        let store = MemoryStore::new();
        let input = registration("x", "not-an-email", "", "other");

        let errors = validate_registration(&input, &store).await.unwrap().unwrap_err();
        assert_eq!(
            errors.field("username"),
            ["Field must be between 2 and 20 characters long."]
        );
        assert_eq!(errors.field("email"), ["Invalid email address."]);
        assert_eq!(errors.field("password"), [REQUIRED]);
        assert_eq!(
            errors.field("confirm_password"),
            ["Field must be equal to password."]
        );
    }

    #[tokio::test]
    async fn test_registration_detects_taken_username_and_email() {
        let store = MemoryStore::new();
        UserStore::create(
            &store,
            &NewUser {
                username: "dave".to_string(),
                email: "dave@example.com".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap();

        let input = registration("dave", "DAVE@example.com", "pw", "pw");
        let errors = validate_registration(&input, &store).await.unwrap().unwrap_err();
        assert_eq!(errors.field("username"), ["Username is already taken."]);
        assert_eq!(errors.field("email"), ["Email is already registered."]);
        assert!(errors.field("password").is_empty());
    }

    #[test]
    fn test_login_requires_both_fields() {
        let errors = validate_login(&LoginInput::default()).unwrap_err();
        assert_eq!(errors.field("email"), [REQUIRED]);
        assert_eq!(errors.field("password"), [REQUIRED]);

        let errors = validate_login(&LoginInput {
            email: "not-an-email".to_string(),
            password: "pw".to_string(),
            csrf_token: String::new(),
        })
        .unwrap_err();
        assert_eq!(errors.field("email"), ["Invalid email address."]);
        assert!(errors.field("password").is_empty());

        let credentials = validate_login(&LoginInput {
            email: "Erin@Example.com".to_string(),
            password: "pw".to_string(),
            csrf_token: String::new(),
        })
        .unwrap();
        assert_eq!(credentials.email, "erin@example.com");
    }

    #[test]
    fn test_expense_accepts_known_category() {
        let choices = category_choices(&[]);
        let valid = validate_expense(&expense("food", "12.50", "2024-01-01", ""), &choices).unwrap();
        assert_eq!(
            valid,
            NewExpense {
                category: "food".to_string(),
                amount: Decimal::new(1250, 2),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                description: None,
            }
        );
    }

    #[test]
    fn test_expense_rejects_bad_fields() {
        let choices = category_choices(&[]);
        let long = "d".repeat(201);
        let errors =
            validate_expense(&expense("rent", "-3", "yesterday", &long), &choices).unwrap_err();

        assert_eq!(errors.field("category"), ["Not a valid choice."]);
        assert_eq!(errors.field("amount"), ["Amount must be greater than zero."]);
        assert_eq!(errors.field("date"), ["Not a valid date value."]);
        assert_eq!(
            errors.field("description"),
            ["Field cannot be longer than 200 characters."]
        );

        let errors = validate_expense(&expense("", "", "", ""), &choices).unwrap_err();
        assert_eq!(errors.field("category"), [REQUIRED]);

        let errors =
            validate_expense(&expense(" food ", "1", "2024-01-01", ""), &choices).unwrap_err();
        assert_eq!(errors.field("category"), ["Not a valid choice."]);
        assert_eq!(errors.field("amount"), [REQUIRED]);
        assert_eq!(errors.field("date"), [REQUIRED]);
    }

    #[test]
    fn test_csrf_failure_is_added_to_outcome() {
        let ok: Result<u8, FormErrors> = Ok(1);
        assert_eq!(require_csrf(Ok(()), ok.clone()), Ok(1));

        let errors = require_csrf(Err("bad token".to_string()), ok).unwrap_err();
        assert_eq!(errors.field(CSRF_FIELD), ["bad token"]);

        let failed: Result<u8, FormErrors> = Err(FormErrors::single("amount", "nope"));
        let errors = require_csrf(Err("bad token".to_string()), failed).unwrap_err();
        assert_eq!(errors.field("amount"), ["nope"]);
        assert_eq!(errors.field(CSRF_FIELD), ["bad token"]);
    }
}
