#[cfg(feature = "web")]
use crate::app::{AppState, Flash, FlashKind, redirect_with};
use crate::config::{AdminSecret, Config};
use crate::error::CredentialError;
#[cfg(feature = "web")]
use crate::error::AppError;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
#[cfg(feature = "web")]
use axum::{
    Form,
    extract::{Query, Request, State},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
#[cfg(feature = "web")]
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::collections::HashMap;
#[cfg(feature = "web")]
use std::sync::Arc;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "session";

/// Source of truth for administrator credentials
///
/// Injected into the web state so tests and deployments can supply their own
/// users instead of relying on a compiled-in account.
pub trait CredentialStore: Send + Sync {
    /// Check whether `password` is correct for `username`.
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Credential store holding argon2 password hashes in memory.
#[derive(Debug, Default, Clone)]
pub struct Argon2CredentialStore {
    users: HashMap<String, String>,
}

impl Argon2CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user from a plaintext password, hashing it immediately.
    pub fn with_password(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Self, CredentialError> {
        if username.is_empty() || password.is_empty() {
            return Err(CredentialError::EmptyCredentials);
        }
        let hash = hash_password(password)?;
        self.users.insert(username.to_string(), hash);
        Ok(self)
    }

    /// Add a user from an argon2 PHC string. The hash is validated up front so
    /// a typo shows up at startup rather than as failed logins.
    pub fn with_password_hash(
        mut self,
        username: &str,
        hash: &str,
    ) -> Result<Self, CredentialError> {
        if username.is_empty() {
            return Err(CredentialError::EmptyCredentials);
        }
        PasswordHash::new(hash).map_err(|e| CredentialError::InvalidHash(e.to_string()))?;
        self.users.insert(username.to_string(), hash.to_string());
        Ok(self)
    }

    /// Build the single-administrator store described by the configuration.
    pub fn from_config(config: &Config) -> Result<Self, CredentialError> {
        match &config.admin_secret {
            AdminSecret::Password(password) => {
                Self::new().with_password(&config.admin_username, password)
            }
            AdminSecret::Hash(hash) => Self::new().with_password_hash(&config.admin_username, hash),
        }
    }
}

impl CredentialStore for Argon2CredentialStore {
    fn verify(&self, username: &str, password: &str) -> bool {
        match self.users.get(username) {
            Some(hash) => verify_password(password, hash).unwrap_or_else(|e| {
                log::error!("stored hash for '{}' is unusable: {}", username, e);
                false
            }),
            None => false,
        }
    }
}

/// Hash a password using Argon2
///
/// # Arguments
/// * `password` - The plaintext password to hash
///
/// # Returns
/// * `Result<String, CredentialError>` - The PHC-formatted hash or an error
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hashing(e.to_string()))
}

/// Verify a password against a stored hash
///
/// # Returns
/// * `Result<bool, CredentialError>` - True if the password matches, false if not
///
/// # Errors
/// * Returns an error if the hash is in an invalid format
fn verify_password(password: &str, hash: &str) -> Result<bool, CredentialError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| CredentialError::InvalidHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// An authenticated administrator session
#[derive(Debug, Clone)]
pub struct Session {
    /// Username of the authenticated user
    pub user_id: String,

    /// Time when the session expires
    pub expires_at: SystemTime,
}

/// In-memory session table shared by all requests.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Create a session for `username` and return its id. Expired sessions
    /// are dropped on the way.
    pub fn create_session(&self, username: &str) -> String {
        let session_id = Uuid::new_v4().to_string();
        let now = SystemTime::now();
        let session = Session {
            user_id: username.to_string(),
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, existing| existing.expires_at > now);
        sessions.insert(session_id.clone(), session);

        session_id
    }

    /// Return the username of a live session.
    pub fn validate_session(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);

        sessions
            .get(session_id)
            .filter(|session| session.expires_at > SystemTime::now())
            .map(|session| session.user_id.clone())
    }

    /// Drop a session; returns whether it existed.
    pub fn remove_session(&self, session_id: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Login form data
#[derive(Debug, Deserialize)]
pub struct UserCredentials {
    #[serde(default)]
    pub username: String,

    /// Password in plaintext (only transmitted, never stored)
    #[serde(default)]
    pub password: String,
}

/// Username of the logged-in administrator, attached to protected requests.
#[cfg(feature = "web")]
#[derive(Debug, Clone)]
pub struct AdminUser(pub String);

// Web handler functions below (only compiled with "web" feature)

/// Serve the login page
#[cfg(feature = "web")]
pub async fn serve_login_page(
    State(state): State<Arc<AppState>>,
    Query(flash): Query<Flash>,
) -> Result<Html<String>, AppError> {
    state.render(
        "login",
        &serde_json::json!({ "title": "Admin Login", "flash": flash }),
    )
}

/// Handle login form submissions
///
/// On success a session cookie is set and the browser is sent to `/admin`;
/// otherwise back to the login page with an error message.
#[cfg(feature = "web")]
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(credentials): Form<UserCredentials>,
) -> Result<Response, AppError> {
    let store = state.credentials.clone();
    let username = credentials.username.clone();
    // argon2 verification is deliberately slow
    let verified = tokio::task::spawn_blocking(move || {
        store.verify(&credentials.username, &credentials.password)
    })
    .await?;

    if !verified {
        log::warn!("failed login attempt for '{}'", username);
        return Ok(
            redirect_with("/login", FlashKind::Error, "Invalid username or password.")
                .into_response(),
        );
    }

    let session_id = state.sessions.create_session(&username);
    log::info!("'{}' logged in", username);

    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        jar.add(cookie),
        redirect_with("/admin", FlashKind::Success, "Logged in successfully."),
    )
        .into_response())
}

/// Handle logout: forget the session and clear the cookie.
#[cfg(feature = "web")]
pub async fn handle_logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove_session(cookie.value());
    }

    let mut removal = Cookie::from(SESSION_COOKIE);
    removal.set_path("/");

    (
        jar.remove(removal),
        redirect_with("/", FlashKind::Success, "Logged out successfully."),
    )
        .into_response()
}

/// Authentication middleware
///
/// Lets the request through when it carries a live session cookie, inserting
/// an [`AdminUser`] extension; redirects to the login page otherwise.
#[cfg(feature = "web")]
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(username) = state.session_user(&jar) {
        request.extensions_mut().insert(AdminUser(username));
        return next.run(request).await;
    }

    Redirect::to("/login").into_response()
}
