//! Middleware gating pages behind an authenticated session

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::{error::AppResult, models::AuthUser, session::FlashLevel, state::AppState};

/// Resolve the session to a user or send the browser to the login page.
///
/// On success the [`AuthUser`] is added to the request extensions for the
/// handler to take as a parameter.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    let user = state
        .sessions
        .current_user(&jar, state.users.as_ref())
        .await?;

    match user {
        Some(user) => {
            req.extensions_mut().insert(AuthUser::from(&user));
            Ok(next.run(req).await)
        }
        None => {
            debug!("Anonymous request to {} redirected to login", req.uri().path());
            let jar = state.sessions.log_out(jar);
            let jar = state.sessions.flash(
                jar,
                FlashLevel::Info,
                "Please log in to access this page.",
            )?;
            Ok((jar, Redirect::to("/login")).into_response())
        }
    }
}
