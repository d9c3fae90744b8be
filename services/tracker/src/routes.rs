//! Tracker service routes

use std::any::Any;

use axum::{
    Extension, Form, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde_json::json;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    error::{AppError, AppResult},
    forms::{
        ExpenseInput, FormErrors, LoginInput, RegistrationInput, require_csrf, taken_message,
        validate_expense, validate_login, validate_registration,
    },
    middleware::require_auth,
    models::{AuthUser, CategoryChoice, NewUser, category_choices},
    password::{hash_password, verify_against_dummy, verify_password},
    repositories::StoreError,
    session::{Flash, FlashLevel},
    state::AppState,
    summary::ExpenseSummary,
    views,
};

const LOGIN_FAILED: &str = "Login Unsuccessful. Please check email and password";

/// Create the router for the tracker service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/", get(home))
        .route("/logout", get(logout))
        .route("/add", get(add_expense_form).post(add_expense))
        .route("/summary", get(summary))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health_check))
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .merge(protected_routes)
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "expense-tracker"
    }))
}

async fn not_found() -> AppError {
    AppError::NotFound
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        views::internal_error_page(),
    )
        .into_response()
}

/// Whether the request carries a session for an existing user
async fn signed_in(state: &AppState, jar: &CookieJar) -> AppResult<bool> {
    Ok(state
        .sessions
        .current_user(jar, state.users.as_ref())
        .await?
        .is_some())
}

fn render_register(
    state: &AppState,
    jar: CookieJar,
    input: &RegistrationInput,
    errors: &FormErrors,
) -> Response {
    let (jar, flashes) = state.sessions.take_flashes(jar);
    let (jar, token) = state.sessions.csrf_token(jar);
    (jar, views::register_page(&flashes, input, errors, &token)).into_response()
}

async fn register_form(State(state): State<AppState>, jar: CookieJar) -> AppResult<Response> {
    if signed_in(&state, &jar).await? {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(render_register(
        &state,
        jar,
        &RegistrationInput::default(),
        &FormErrors::default(),
    ))
}

async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(mut input): Form<RegistrationInput>,
) -> AppResult<Response> {
    let csrf = state.sessions.verify_csrf(&jar, &input.csrf_token);
    let outcome = validate_registration(&input, state.users.as_ref()).await?;

    // Passwords are never sent back to the browser
    let password = std::mem::take(&mut input.password);
    input.confirm_password.clear();

    let registration = match require_csrf(csrf, outcome) {
        Ok(registration) => registration,
        Err(errors) => return Ok(render_register(&state, jar, &input, &errors)),
    };

    let new_user = NewUser {
        username: registration.username,
        email: registration.email,
        password_hash: hash_password(&password)?,
    };

    match state.users.create(&new_user).await {
        Ok(user) => {
            info!("Registered user {} ({})", user.username, user.id);
            let jar = state.sessions.flash(
                jar,
                FlashLevel::Success,
                "Your account has been created!",
            )?;
            Ok((jar, Redirect::to("/login")).into_response())
        }
        Err(StoreError::Conflict { field }) => {
            warn!("Registration lost a race on {}", field);
            let errors = FormErrors::single(field, taken_message(field));
            Ok(render_register(&state, jar, &input, &errors))
        }
        Err(e) => Err(e.into()),
    }
}

fn render_login(
    state: &AppState,
    jar: CookieJar,
    input: &LoginInput,
    errors: &FormErrors,
    notice: Option<Flash>,
) -> Response {
    let (jar, mut flashes) = state.sessions.take_flashes(jar);
    flashes.extend(notice);
    let (jar, token) = state.sessions.csrf_token(jar);
    (jar, views::login_page(&flashes, input, errors, &token)).into_response()
}

async fn login_form(State(state): State<AppState>, jar: CookieJar) -> AppResult<Response> {
    if signed_in(&state, &jar).await? {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(render_login(
        &state,
        jar,
        &LoginInput::default(),
        &FormErrors::default(),
        None,
    ))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(mut input): Form<LoginInput>,
) -> AppResult<Response> {
    let csrf = state.sessions.verify_csrf(&jar, &input.csrf_token);
    let outcome = validate_login(&input);
    input.password.clear();

    let credentials = match require_csrf(csrf, outcome) {
        Ok(credentials) => credentials,
        Err(errors) => return Ok(render_login(&state, jar, &input, &errors, None)),
    };

    let user = match state.users.find_by_email(&credentials.email).await? {
        Some(user) if verify_password(&credentials.password, &user.password_hash) => Some(user),
        Some(_) => None,
        None => {
            verify_against_dummy(&credentials.password);
            None
        }
    };

    match user {
        Some(user) => {
            let jar = state.sessions.log_in(jar, user.id)?;
            Ok((jar, Redirect::to("/")).into_response())
        }
        None => {
            warn!("Failed login attempt for {}", credentials.email);
            let notice = Flash::new(FlashLevel::Danger, LOGIN_FAILED);
            Ok(render_login(
                &state,
                jar,
                &input,
                &FormErrors::default(),
                Some(notice),
            ))
        }
    }
}

async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Response {
    info!("User {} logged out", user.id);
    let jar = state.sessions.log_out(jar);
    (jar, Redirect::to("/login")).into_response()
}

async fn home(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> AppResult<Response> {
    let expenses = state.expenses.list_by_owner(user.id).await?;
    let (jar, flashes) = state.sessions.take_flashes(jar);
    Ok((jar, views::home_page(&user, &flashes, &expenses)).into_response())
}

async fn expense_choices(state: &AppState) -> AppResult<Vec<CategoryChoice>> {
    let persisted = state.categories.list().await?;
    Ok(category_choices(&persisted))
}

fn render_expense_form(
    state: &AppState,
    jar: CookieJar,
    user: &AuthUser,
    input: &ExpenseInput,
    choices: &[CategoryChoice],
    errors: &FormErrors,
) -> Response {
    let (jar, flashes) = state.sessions.take_flashes(jar);
    let (jar, token) = state.sessions.csrf_token(jar);
    (
        jar,
        views::expense_form_page(user, &flashes, input, choices, errors, &token),
    )
        .into_response()
}

async fn add_expense_form(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> AppResult<Response> {
    let choices = expense_choices(&state).await?;
    let input = ExpenseInput {
        date: Utc::now().date_naive().format("%Y-%m-%d").to_string(),
        ..ExpenseInput::default()
    };
    Ok(render_expense_form(
        &state,
        jar,
        &user,
        &input,
        &choices,
        &FormErrors::default(),
    ))
}

async fn add_expense(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    Form(input): Form<ExpenseInput>,
) -> AppResult<Response> {
    let choices = expense_choices(&state).await?;
    let csrf = state.sessions.verify_csrf(&jar, &input.csrf_token);

    let new_expense = match require_csrf(csrf, validate_expense(&input, &choices)) {
        Ok(new_expense) => new_expense,
        Err(errors) => {
            return Ok(render_expense_form(
                &state, jar, &user, &input, &choices, &errors,
            ));
        }
    };

    let expense = state.expenses.create(user.id, &new_expense).await?;
    info!(
        "User {} added expense {} ({} {})",
        user.id, expense.id, expense.category, expense.amount
    );

    let jar = state
        .sessions
        .flash(jar, FlashLevel::Success, "Expense added!")?;
    Ok((jar, Redirect::to("/")).into_response())
}

async fn summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> AppResult<Response> {
    let expenses = state.expenses.list_by_owner(user.id).await?;
    let summary = ExpenseSummary::from_expenses(&expenses);

    let chart = if summary.is_empty() {
        None
    } else {
        Some(state.charts.render_base64(&summary)?)
    };

    let (jar, flashes) = state.sessions.take_flashes(jar);
    Ok((
        jar,
        views::summary_page(&user, &flashes, &summary, chart.as_deref()),
    )
        .into_response())
}
