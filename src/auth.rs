//! Authentication and user management.

use crate::error::{AppError, Result};
use crate::session::SessionGate;
use crate::store::{Session, Store, User, now_timestamp};
use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::{OsRng, RngCore},
    },
};
use axum::http::StatusCode;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use thiserror::Error;

/// Identity-provider rejection, one variant per provider error code.
///
/// Each known code carries its fixed human-readable message; unmatched codes
/// fall back to the provider's raw message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Code `email-already-in-use`.
    #[error("This email address is already in use!")]
    EmailAlreadyInUse,

    /// Code `user-not-found`.
    #[error("User not found!")]
    UserNotFound,

    /// Code `wrong-password`.
    #[error("Incorrect password!")]
    WrongPassword,

    /// Code `invalid-email`.
    #[error("Invalid email address!")]
    InvalidEmail,

    /// Code `weak-password`.
    #[error("The password is too weak!")]
    WeakPassword,

    /// Any other provider code: the raw message is surfaced as-is.
    #[error("{0}")]
    Other(String),
}

impl AuthError {
    /// Provider error code for this rejection.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::EmailAlreadyInUse => "email-already-in-use",
            AuthError::UserNotFound => "user-not-found",
            AuthError::WrongPassword => "wrong-password",
            AuthError::InvalidEmail => "invalid-email",
            AuthError::WeakPassword => "weak-password",
            AuthError::Other(_) => "unknown",
        }
    }

    /// HTTP status for this rejection.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::EmailAlreadyInUse => StatusCode::CONFLICT,
            AuthError::UserNotFound | AuthError::WrongPassword => StatusCode::UNAUTHORIZED,
            AuthError::InvalidEmail | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
            AuthError::Other(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Generate a secure random token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Authentication service.
///
/// Publishes every identity change (sign-in, sign-out, startup restore) to
/// the [`SessionGate`].
pub struct AuthService {
    store: Store,
    gate: SessionGate,
    session_duration_days: u32,
    registration_enabled: bool,
}

impl AuthService {
    /// Create a new auth service.
    pub fn new(
        store: Store,
        gate: SessionGate,
        session_duration_days: u32,
        registration_enabled: bool,
    ) -> Self {
        Self {
            store,
            gate,
            session_duration_days,
            registration_enabled,
        }
    }

    /// The session gate this service publishes to.
    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    /// Register a new account. Does not sign the user in.
    pub fn register(&self, email: &str, password: &str) -> Result<User> {
        if !self.registration_enabled {
            return Err(AppError::Auth(AuthError::Other(
                "Registration is disabled".to_string(),
            )));
        }

        self.create_user(email, password)
    }

    /// Create a new account (also used by the admin CLI).
    pub fn create_user(&self, email: &str, password: &str) -> Result<User> {
        validate_email(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash,
            created_at: now_timestamp(),
            last_login: None,
        };

        self.store.create_user(&user)?;
        Ok(user)
    }

    /// Sign in and create a session.
    pub fn login(&self, email: &str, password: &str) -> Result<(User, String)> {
        let user = self
            .store
            .get_user_by_email(email)?
            .ok_or(AppError::Auth(AuthError::UserNotFound))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Auth(AuthError::WrongPassword));
        }

        self.store.update_user_last_login(&user.id)?;

        let token = generate_token();
        let expires_at = now_timestamp() + (self.session_duration_days as i64 * 24 * 60 * 60);

        let session = Session {
            token: token.clone(),
            user_id: user.id.clone(),
            expires_at,
        };

        self.store.create_session(&session)?;
        self.gate.signed_in(user.id.clone());

        Ok((user, token))
    }

    /// Validate a session token and return the user.
    pub fn validate_token(&self, token: &str) -> Result<Option<User>> {
        let session = match self.store.get_session(token)? {
            Some(s) => s,
            None => return Ok(None),
        };

        // Check expiration
        if session.expires_at < now_timestamp() {
            self.store.delete_session(token)?;
            return Ok(None);
        }

        self.store.get_user_by_id(&session.user_id)
    }

    /// Sign out (delete session).
    pub fn logout(&self, token: &str) -> Result<()> {
        self.store.delete_session(token)?;
        self.gate.signed_out();
        Ok(())
    }

    /// Startup session restore: resolve a cached token, if any, and move the
    /// gate from `Loading` to a determinate state.
    pub fn restore(&self, token: Option<&str>) -> Result<()> {
        match token.and_then(|t| self.validate_token(t).transpose()) {
            Some(Ok(user)) => self.gate.signed_in(user.id),
            _ => self.gate.signed_out(),
        }
        Ok(())
    }

    /// Change a user's password.
    pub fn change_password(&self, email: &str, new_password: &str) -> Result<bool> {
        validate_password(new_password)?;

        let password_hash = hash_password(new_password)?;
        self.store.update_user_password(email, &password_hash)
    }

    /// Delete an account.
    pub fn delete_user(&self, email: &str) -> Result<bool> {
        self.store.delete_user(email)
    }

    /// List all accounts.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.store.list_users()
    }
}

fn validate_email(email: &str) -> Result<()> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AppError::Auth(AuthError::InvalidEmail));
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') || email.contains(' ') {
        return Err(AppError::Auth(AuthError::InvalidEmail));
    }

    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.len() < 6 {
        return Err(AppError::Auth(AuthError::WeakPassword));
    }
    Ok(())
}
