//! In-process HTTP client for handler tests

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
};
use axum_extra::extract::cookie::Cookie;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    chart::ChartRenderer,
    models::{Expense, NewExpense},
    repositories::{ExpenseStore, MemoryStore, StoreError, StoreResult},
    routes::create_router,
    session::{CSRF_COOKIE, SessionConfig, SessionManager},
    state::AppState,
};

const CSRF_TOKEN: &str = "test-csrf-token";

/// Expense store whose writes always fail, as if the database went away.
///
/// It rejects before storing anything; rollback of a half-done insert is
/// covered against PostgreSQL in `repositories::expense`.
struct FailingExpenses {
    inner: Arc<MemoryStore>,
}

#[async_trait]
impl ExpenseStore for FailingExpenses {
    async fn create(&self, _owner: Uuid, _new_expense: &NewExpense) -> StoreResult<Expense> {
        Err(StoreError::Query(sqlx::Error::PoolTimedOut))
    }

    async fn list_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Expense>> {
        ExpenseStore::list_by_owner(self.inner.as_ref(), owner).await
    }
}

/// A rendered response
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

/// Drives the router like a browser: keeps cookies between requests and
/// fills in the CSRF field on form posts
pub struct TestClient {
    app: Router,
    pub store: Arc<MemoryStore>,
    cookies: BTreeMap<String, String>,
}

impl TestClient {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::with_memory(store.clone(), sessions(), ChartRenderer::without_labels());
        Self::from_state(state, store)
    }

    /// Client whose expense writes fail with a store error
    pub fn with_failing_expenses() -> Self {
        let store = Arc::new(MemoryStore::new());
        let mut state =
            AppState::with_memory(store.clone(), sessions(), ChartRenderer::without_labels());
        state.expenses = Arc::new(FailingExpenses {
            inner: store.clone(),
        });
        Self::from_state(state, store)
    }

    fn from_state(state: AppState, store: Arc<MemoryStore>) -> Self {
        let mut cookies = BTreeMap::new();
        cookies.insert(CSRF_COOKIE.to_string(), CSRF_TOKEN.to_string());
        Self {
            app: create_router(state),
            store,
            cookies,
        }
    }

    /// A second browser talking to the same application
    pub fn fork(&self) -> Self {
        let mut cookies = BTreeMap::new();
        cookies.insert(CSRF_COOKIE.to_string(), CSRF_TOKEN.to_string());
        Self {
            app: self.app.clone(),
            store: self.store.clone(),
            cookies,
        }
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = Request::builder()
            .uri(path)
            .header(COOKIE, self.cookie_header())
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Post a form with the browser's CSRF token added
    pub async fn post(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let token = self.cookies.get(CSRF_COOKIE).cloned().unwrap_or_default();
        let mut fields = fields.to_vec();
        fields.push(("csrf_token", &token));
        self.post_without_csrf(path, &fields).await
    }

    pub async fn post_without_csrf(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(COOKIE, self.cookie_header())
            .body(Body::from(serde_urlencoded::to_string(fields).unwrap()))
            .unwrap();
        self.send(request).await
    }

    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> TestResponse {
        self.post(
            "/register",
            &[
                ("username", username),
                ("email", email),
                ("password", password),
                ("confirm_password", confirm_password),
            ],
        )
        .await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.post("/login", &[("email", email), ("password", password)])
            .await
    }

    /// Register `username` with a derived email and sign in
    pub async fn sign_up_and_in(&mut self, username: &str) {
        let email = format!("{}@example.com", username);
        let response = self.register(username, &email, "password", "password").await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        let response = self.login(&email, "password").await;
        assert_eq!(response.location.as_deref(), Some("/"));
    }

    pub async fn add_expense(
        &mut self,
        category: &str,
        amount: &str,
        date: &str,
        description: &str,
    ) -> TestResponse {
        self.post(
            "/add",
            &[
                ("category", category),
                ("amount", amount),
                ("date", date),
                ("description", description),
            ],
        )
        .await
    }

    fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();

        for header in response.headers().get_all(SET_COOKIE) {
            self.store_cookie(header.to_str().unwrap());
        }

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    fn store_cookie(&mut self, header: &str) {
        let cookie = Cookie::parse(header.to_string()).unwrap();
        let expired = cookie.max_age().is_some_and(|age| age.is_zero());

        if cookie.value().is_empty() || expired {
            self.cookies.remove(cookie.name());
        } else {
            self.cookies
                .insert(cookie.name().to_string(), cookie.value().to_string());
        }
    }
}

fn sessions() -> SessionManager {
    SessionManager::new(SessionConfig {
        secret_key: "test-secret".to_string(),
        ttl_seconds: 3600,
        secure_cookies: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_cookie_headers_update_the_jar() {
        let mut client = TestClient::new();

        client.store_cookie("session=abc.def; Path=/; HttpOnly; SameSite=Lax");
        assert_eq!(client.cookies.get("session").map(String::as_str), Some("abc.def"));

        let mut removal = Cookie::build(("session", "abc.def")).path("/").build();
        removal.make_removal();
        client.store_cookie(&removal.to_string());
        assert!(!client.has_cookie("session"));

        client.store_cookie("flash=queued; Path=/; Max-Age=0");
        assert!(!client.has_cookie("flash"));
        assert!(client.has_cookie(CSRF_COOKIE));
    }
}
