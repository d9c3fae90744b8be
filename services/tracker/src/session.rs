//! Cookie-backed sessions
//!
//! The authenticated user id travels in a `session` cookie holding an HS256
//! JWT signed with the application secret; nothing is stored server-side.
//! The same key signs the one-shot `flash` cookie. CSRF protection uses a
//! double-submit `csrf_token` cookie.

use std::time::{SystemTime, UNIX_EPOCH};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::User,
    repositories::{StoreResult, UserStore},
};

pub const SESSION_COOKIE: &str = "session";
pub const FLASH_COOKIE: &str = "flash";
pub const CSRF_COOKIE: &str = "csrf_token";

/// Flash cookies only need to survive one redirect
const FLASH_TTL_SECONDS: u64 = 300;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Secret used to sign session and flash cookies
    pub secret_key: String,
    /// Session lifetime in seconds
    pub ttl_seconds: u64,
    /// Mark cookies `Secure`
    pub secure_cookies: bool,
}

/// Session claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub sub: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Danger,
    Info,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Danger => "danger",
            FlashLevel::Info => "info",
        }
    }
}

/// One-shot notice shown on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FlashClaims {
    flashes: Vec<Flash>,
    exp: u64,
}

/// Issues, reads and clears the session cookies
#[derive(Clone)]
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: SessionConfig,
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret_key.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    fn cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.config.secure_cookies)
            .build()
    }

    fn removal(&self, name: &'static str) -> Cookie<'static> {
        Cookie::build(name).path("/").build()
    }

    fn encode_session(&self, user_id: Uuid, issued_at: u64) -> AppResult<String> {
        let claims = SessionClaims {
            sub: user_id,
            iat: issued_at,
            exp: issued_at + self.config.ttl_seconds,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Establish a session for `user_id`
    pub fn log_in(&self, jar: CookieJar, user_id: Uuid) -> AppResult<CookieJar> {
        info!("Creating session for user: {}", user_id);
        let token = self.encode_session(user_id, now())?;
        Ok(jar.add(self.cookie(SESSION_COOKIE, token)))
    }

    /// Drop the session cookie
    pub fn log_out(&self, jar: CookieJar) -> CookieJar {
        jar.remove(self.removal(SESSION_COOKIE))
    }

    /// User id carried by a valid, unexpired session cookie
    pub fn current_user_id(&self, jar: &CookieJar) -> Option<Uuid> {
        let token = jar.get(SESSION_COOKIE)?;
        match decode::<SessionClaims>(token.value(), &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims.sub),
            Err(e) => {
                debug!("Ignoring invalid session cookie: {}", e);
                None
            }
        }
    }

    /// The user behind the session, if it names an existing account
    pub async fn current_user(
        &self,
        jar: &CookieJar,
        users: &dyn UserStore,
    ) -> StoreResult<Option<User>> {
        match self.current_user_id(jar) {
            Some(id) => users.find_by_id(id).await,
            None => Ok(None),
        }
    }

    /// Queue a notice for the next rendered page
    pub fn flash(
        &self,
        jar: CookieJar,
        level: FlashLevel,
        message: impl Into<String>,
    ) -> AppResult<CookieJar> {
        let mut flashes = self.read_flashes(&jar);
        flashes.push(Flash::new(level, message));

        let claims = FlashClaims {
            flashes,
            exp: now() + FLASH_TTL_SECONDS,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(jar.add(self.cookie(FLASH_COOKIE, token)))
    }

    /// Consume queued notices
    pub fn take_flashes(&self, jar: CookieJar) -> (CookieJar, Vec<Flash>) {
        if jar.get(FLASH_COOKIE).is_none() {
            return (jar, Vec::new());
        }
        let flashes = self.read_flashes(&jar);
        (jar.remove(self.removal(FLASH_COOKIE)), flashes)
    }

    fn read_flashes(&self, jar: &CookieJar) -> Vec<Flash> {
        jar.get(FLASH_COOKIE)
            .and_then(|cookie| {
                decode::<FlashClaims>(cookie.value(), &self.decoding_key, &self.validation).ok()
            })
            .map(|data| data.claims.flashes)
            .unwrap_or_default()
    }

    /// CSRF token for a form, reusing the one already issued to this browser
    pub fn csrf_token(&self, jar: CookieJar) -> (CookieJar, String) {
        if let Some(existing) = jar.get(CSRF_COOKIE) {
            if !existing.value().is_empty() {
                let token = existing.value().to_string();
                return (jar, token);
            }
        }

        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let jar = jar.add(self.cookie(CSRF_COOKIE, token.clone()));
        (jar, token)
    }

    /// Check a submitted form token against the browser's CSRF cookie
    pub fn verify_csrf(&self, jar: &CookieJar, submitted: &str) -> Result<(), String> {
        if submitted.is_empty() {
            return Err("The CSRF token is missing.".to_string());
        }
        match jar.get(CSRF_COOKIE) {
            Some(cookie) if cookie.value() == submitted => Ok(()),
            _ => Err("The CSRF tokens do not match.".to_string()),
        }
    }
}
