//! Session (authentication) state.
//!
//! The session store is a local mock: it checks a fixed demo account and
//! records the signed-in user in storage. It gates whether conversation and
//! settings data may be read or written.

use crate::core::id::generate_id;
use crate::error::{Error, Result};
use crate::storage::{KeyValueStore, TOKEN_KEY, USER_KEY, load_json, save_json};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

/// Email of the built-in demo account.
pub const DEMO_EMAIL: &str = "demo@example.com";

/// Password of the built-in demo account.
pub const DEMO_PASSWORD: &str = "password";

/// Minimum password length accepted at registration.
const MIN_PASSWORD_LEN: usize = 6;

/// Error shown when a stored session cannot be restored.
pub const SESSION_EXPIRED: &str = "Session expired. Please login again.";

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is a valid regex"));

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: String,

    /// Email address.
    pub email: String,

    /// Display name.
    pub name: String,

    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Observable authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    /// Whether a user is signed in.
    pub authenticated: bool,

    /// The signed-in user.
    pub user: Option<User>,

    /// Whether an operation is running.
    pub loading: bool,

    /// Error from the last operation.
    pub error: Option<String>,
}

/// Registration form input.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    /// Display name.
    pub name: String,

    /// Email address.
    pub email: String,

    /// Password.
    pub password: String,

    /// Password confirmation.
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Check every field, returning the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("name", "Name is required"));
        }

        if self.email.trim().is_empty() {
            return Err(Error::validation("email", "Email is required"));
        }
        if !is_valid_email(&self.email) {
            return Err(Error::validation("email", "Email format is invalid"));
        }

        if self.password.is_empty() {
            return Err(Error::validation("password", "Password is required"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::validation(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }

        if self.confirm_password.is_empty() {
            return Err(Error::validation("confirm_password", "Password confirmation is required"));
        }
        if self.confirm_password != self.password {
            return Err(Error::validation("confirm_password", "Passwords do not match"));
        }

        Ok(())
    }
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Holds authentication state backed by a key/value store.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    state: AuthState,
}

impl SessionStore {
    /// Create a signed-out store. Call [`SessionStore::restore`] to pick up a
    /// previous session.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            state: AuthState::default(),
        }
    }

    /// Create a store and restore any persisted session.
    #[must_use]
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        let mut session = Self::new(storage);
        session.restore();
        session
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Whether a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.authenticated
    }

    /// The signed-in user.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    /// Storage this session gates.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    /// Restore the persisted session, if any.
    ///
    /// A token without a stored user is discarded. An unreadable user record
    /// leaves the store signed out with [`SESSION_EXPIRED`] as the error.
    pub fn restore(&mut self) {
        self.state = match self.read_persisted() {
            Ok(Some(user)) => AuthState {
                authenticated: true,
                user: Some(user),
                loading: false,
                error: None,
            },
            Ok(None) => AuthState::default(),
            Err(e) => {
                warn!(error = %e, "failed to restore session");
                AuthState {
                    error: Some(SESSION_EXPIRED.to_string()),
                    ..AuthState::default()
                }
            }
        };
    }

    fn read_persisted(&self) -> Result<Option<User>> {
        if !self.storage.contains(TOKEN_KEY)? {
            return Ok(None);
        }
        let user: Option<User> = load_json(self.storage.as_ref(), USER_KEY)?;
        if user.is_none() {
            debug!("dropping token without user record");
            self.storage.remove(TOKEN_KEY)?;
        }
        Ok(user)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty fields, [`Error::InvalidCredentials`]
    /// for an unknown account, or a storage error. The message is also kept in
    /// [`AuthState::error`].
    pub fn login(&mut self, email: &str, password: &str) -> Result<&User> {
        self.begin();
        let result = self.try_login(email, password);
        self.finish(result)
    }

    fn try_login(&self, email: &str, password: &str) -> Result<User> {
        if email.trim().is_empty() {
            return Err(Error::validation("email", "Email is required"));
        }
        if password.is_empty() {
            return Err(Error::validation("password", "Password is required"));
        }
        if email.trim() != DEMO_EMAIL || password != DEMO_PASSWORD {
            return Err(Error::InvalidCredentials);
        }
        let user = User {
            id: "1".to_string(),
            email: DEMO_EMAIL.to_string(),
            name: "Demo User".to_string(),
            picture: None,
        };
        self.persist(&user)?;
        Ok(user)
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first invalid field, or a storage
    /// error. The message is also kept in [`AuthState::error`].
    pub fn register(&mut self, form: &RegistrationForm) -> Result<&User> {
        self.begin();
        let result = self.try_register(form);
        self.finish(result)
    }

    fn try_register(&self, form: &RegistrationForm) -> Result<User> {
        form.validate()?;
        let user = User {
            id: generate_id(),
            email: form.email.trim().to_string(),
            name: form.name.trim().to_string(),
            picture: None,
        };
        self.persist(&user)?;
        Ok(user)
    }

    /// Sign out.
    ///
    /// Removes the token and user record. Conversation and settings data stay
    /// in storage for the next sign-in.
    pub fn logout(&mut self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "failed to remove session key");
            }
        }
        self.state = AuthState::default();
    }

    fn persist(&self, user: &User) -> Result<()> {
        self.storage.put(TOKEN_KEY, &generate_id())?;
        save_json(self.storage.as_ref(), USER_KEY, user)
    }

    fn begin(&mut self) {
        self.state.loading = true;
        self.state.error = None;
    }

    fn finish(&mut self, result: Result<User>) -> Result<&User> {
        self.state.loading = false;
        match result {
            Ok(user) => {
                self.state.authenticated = true;
                self.state.error = None;
                let user: &User = self.state.user.insert(user);
                Ok(user)
            }
            Err(e) => {
                self.state.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    fn new_session() -> (SessionStore, Arc<MemoryBackend>) {
        let storage = Arc::new(MemoryBackend::new());
        (SessionStore::new(storage.clone()), storage)
    }

    fn valid_form() -> RegistrationForm {
        RegistrationForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        }
    }

    #[test]
    fn email_check() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn starts_signed_out() {
        let (session, _) = new_session();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        assert!(!session.state().loading);
    }

    #[test]
    fn demo_login_persists_token_and_user() {
        let (mut session, storage) = new_session();
        let user = session.login(DEMO_EMAIL, DEMO_PASSWORD).unwrap();
        assert_eq!(user.name, "Demo User");

        assert!(session.is_authenticated());
        assert!(storage.contains(TOKEN_KEY).unwrap());
        assert!(storage.contains(USER_KEY).unwrap());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let (mut session, storage) = new_session();
        let err = session.login(DEMO_EMAIL, "nope").unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));
        assert!(!session.is_authenticated());
        assert_eq!(session.state().error.as_deref(), Some("Invalid credentials"));
        assert!(!session.state().loading);
        assert!(storage.is_empty());
    }

    #[test]
    fn empty_login_fields_fail_validation() {
        let (mut session, _) = new_session();
        let err = session.login("  ", "x").unwrap_err();
        assert!(matches!(err, Error::Validation { field: "email", .. }));
        let err = session.login(DEMO_EMAIL, "").unwrap_err();
        assert!(matches!(err, Error::Validation { field: "password", .. }));
    }

    #[test]
    fn successful_login_clears_previous_error() {
        let (mut session, _) = new_session();
        let _ = session.login(DEMO_EMAIL, "nope");
        session.login(DEMO_EMAIL, DEMO_PASSWORD).unwrap();
        assert!(session.state().error.is_none());
    }

    #[test]
    fn register_signs_in_new_user() {
        let (mut session, _) = new_session();
        let user = session.register(&valid_form()).unwrap().clone();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.name, "Ada");
        assert!(session.is_authenticated());
    }

    fn assert_invalid(form: &RegistrationForm, expected: &str) {
        match form.validate() {
            Err(Error::Validation { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected validation error on {expected}, got {other:?}"),
        }
    }

    #[test]
    fn registration_validation() {
        assert!(valid_form().validate().is_ok());

        let mut form = valid_form();
        form.name.clear();
        assert_invalid(&form, "name");

        let mut form = valid_form();
        form.email.clear();
        assert_invalid(&form, "email");

        let mut form = valid_form();
        form.email = "not-an-email".to_string();
        assert_invalid(&form, "email");

        let mut form = valid_form();
        form.password.clear();
        assert_invalid(&form, "password");

        let mut form = valid_form();
        form.password = "abc".to_string();
        form.confirm_password = "abc".to_string();
        assert_invalid(&form, "password");

        let mut form = valid_form();
        form.confirm_password.clear();
        assert_invalid(&form, "confirm_password");

        let mut form = valid_form();
        form.confirm_password = "different".to_string();
        assert_invalid(&form, "confirm_password");
    }

    #[test]
    fn invalid_registration_writes_nothing() {
        let (mut session, storage) = new_session();
        let form = RegistrationForm {
            password: "abc".to_string(),
            ..valid_form()
        };
        assert!(session.register(&form).is_err());
        assert!(storage.is_empty());
        assert!(session.state().error.is_some());
    }

    #[test]
    fn restore_picks_up_persisted_session() {
        let storage = Arc::new(MemoryBackend::new());
        SessionStore::new(storage.clone())
            .login(DEMO_EMAIL, DEMO_PASSWORD)
            .unwrap();

        let session = SessionStore::open(storage);
        assert!(session.is_authenticated());
        assert_eq!(session.user().unwrap().email, DEMO_EMAIL);
    }

    #[test]
    fn restore_drops_token_without_user() {
        let storage = Arc::new(MemoryBackend::new());
        storage.put(TOKEN_KEY, "orphan").unwrap();

        let session = SessionStore::open(storage.clone());
        assert!(!session.is_authenticated());
        assert!(session.state().error.is_none());
        assert!(!storage.contains(TOKEN_KEY).unwrap());
    }

    #[test]
    fn restore_with_corrupt_user_reports_expired_session() {
        let storage = Arc::new(MemoryBackend::new());
        storage.put(TOKEN_KEY, "t").unwrap();
        storage.put(USER_KEY, "{ broken").unwrap();

        let session = SessionStore::open(storage);
        assert!(!session.is_authenticated());
        assert_eq!(session.state().error.as_deref(), Some(SESSION_EXPIRED));
    }

    #[test]
    fn logout_removes_session_keys_only() {
        let (mut session, storage) = new_session();
        session.login(DEMO_EMAIL, DEMO_PASSWORD).unwrap();
        storage.put("conversations", "[]").unwrap();

        session.logout();

        assert!(!session.is_authenticated());
        assert!(!storage.contains(TOKEN_KEY).unwrap());
        assert!(!storage.contains(USER_KEY).unwrap());
        assert!(storage.contains("conversations").unwrap());
    }
}
