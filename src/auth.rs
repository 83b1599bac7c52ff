//! Login, registration and logout.
//!
//! These are the only writers of the session. Entering either auth screen
//! wipes it first, so a half-finished login never leaves an old token
//! behind.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::client::ApiClient;
use crate::error::{ApiError, ValidationError};
use crate::session::{Role, SessionError, SessionStore, Tokens};

pub const LOGIN_ENDPOINT: &str = "/users/login/";
pub const REGISTER_ENDPOINT: &str = "/users/register/";

pub const WRONG_CREDENTIALS: &str = "wrong username or password";
pub const LOGIN_FAILED: &str = "login failed, check the server connection";
pub const USERNAME_TAKEN: &str = "username already taken";
pub const WEAK_PASSWORD: &str = "password too weak";
pub const REGISTRATION_FAILED: &str = "registration failed";

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub role: Role,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{}", WRONG_CREDENTIALS)]
    WrongCredentials,

    #[error("{}", LOGIN_FAILED)]
    LoginFailed(#[source] ApiError),

    #[error("{}", USERNAME_TAKEN)]
    UsernameTaken,

    #[error("{}", WEAK_PASSWORD)]
    WeakPassword,

    #[error("{}: {}", REGISTRATION_FAILED, .0.message())]
    RegistrationFailed(#[source] ApiError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("could not store session: {0}")]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
    session: Arc<SessionStore>,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        let session = Arc::clone(client.session());
        Self { client, session }
    }

    /// Called when the login or registration screen is shown.
    pub fn enter_auth_screen(&self) -> Result<(), AuthError> {
        self.session.clear()?;
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        // The old session goes whatever the input looks like
        self.enter_auth_screen()?;

        if username.trim().is_empty() || password.is_empty() {
            return Err(ValidationError::new("username", "username and password are required").into());
        }

        let body = Credentials {
            username: username.trim(),
            password,
        };
        let response: LoginResponse = match self.client.post(LOGIN_ENDPOINT, &body).await {
            Ok(response) => response,
            Err(e) if is_bad_credentials(&e) => {
                tracing::info!("Login rejected for '{}'", username.trim());
                return Err(AuthError::WrongCredentials);
            }
            Err(e) => {
                tracing::error!("Login request failed: {}", e);
                return Err(AuthError::LoginFailed(e));
            }
        };

        let tokens = Tokens {
            access: response.access.clone(),
            refresh: response.refresh.clone(),
        };
        if let Err(e) = self.session.set(tokens, response.role, response.username.clone()) {
            // Reported as a failure, so nothing may stay signed in
            let _ = self.session.clear();
            return Err(e.into());
        }
        tracing::info!("Signed in as {} ({})", response.username, response.role);
        Ok(response)
    }

    /// Create an account. Does not sign in; the user logs in afterwards.
    pub async fn register(&self, registration: &Registration) -> Result<(), AuthError> {
        self.enter_auth_screen()?;

        if registration.username.trim().is_empty() {
            return Err(ValidationError::required("username").into());
        }
        if registration.full_name.trim().is_empty() {
            return Err(ValidationError::new("full_name", "full name is required").into());
        }
        if registration.password.is_empty() {
            return Err(ValidationError::required("password").into());
        }

        match self
            .client
            .post::<_, serde_json::Value>(REGISTER_ENDPOINT, registration)
            .await
        {
            Ok(_) => {
                tracing::info!("Registered '{}'", registration.username);
                Ok(())
            }
            Err(e) if e.has_field_error("username") => Err(AuthError::UsernameTaken),
            Err(e) if e.has_field_error("password") => Err(AuthError::WeakPassword),
            Err(e) => {
                tracing::error!("Registration failed: {}", e);
                Err(AuthError::RegistrationFailed(e))
            }
        }
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        self.session.clear()?;
        tracing::info!("Signed out");
        Ok(())
    }
}

/// A 401, or the 400 with only non-field errors that the login view sends
/// for a bad username/password pair.
fn is_bad_credentials(err: &ApiError) -> bool {
    if err.is_unauthorized() {
        return true;
    }
    err.status() == Some(400)
        && err
            .field_errors()
            .is_some_and(|fields| fields.keys().all(|k| k == "non_field_errors") && !fields.is_empty())
}
