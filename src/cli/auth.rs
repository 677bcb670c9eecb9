//! `parley login`, `register`, `logout` and `whoami` command implementations.

use crate::cli::open_storage;
use crate::config::Config;
use crate::core::{RegistrationForm, SessionStore};
use crate::error::Result;
use crate::storage::KeyValueStore;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// Run the login command.
///
/// Prompts for the password on stdin when it is not given.
///
/// # Errors
///
/// Returns an error if the credentials are rejected or storage fails.
pub fn login(config: &Config, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt("Password: ")?,
    };
    login_with(open_storage(config)?, email, &password, &mut io::stdout().lock())
}

fn login_with(
    storage: Arc<dyn KeyValueStore>,
    email: &str,
    password: &str,
    out: &mut impl Write,
) -> Result<()> {
    let mut session = SessionStore::new(storage);
    let user = session.login(email, password)?;
    writeln!(out, "Logged in as {} <{}>", user.name, user.email)?;
    Ok(())
}

/// Run the register command.
///
/// # Errors
///
/// Returns the first validation failure, or a storage error.
pub fn register(config: &Config, name: &str, email: &str, password: Option<String>) -> Result<()> {
    let (password, confirm_password) = match password {
        Some(p) => (p.clone(), p),
        None => (prompt("Password: ")?, prompt("Confirm password: ")?),
    };
    let form = RegistrationForm {
        name: name.to_string(),
        email: email.to_string(),
        password,
        confirm_password,
    };
    register_with(open_storage(config)?, &form, &mut io::stdout().lock())
}

fn register_with(
    storage: Arc<dyn KeyValueStore>,
    form: &RegistrationForm,
    out: &mut impl Write,
) -> Result<()> {
    let mut session = SessionStore::new(storage);
    let user = session.register(form)?;
    writeln!(out, "Registered and logged in as {} <{}>", user.name, user.email)?;
    Ok(())
}

/// Run the logout command.
///
/// # Errors
///
/// Returns an error if the profile cannot be opened.
pub fn logout(config: &Config) -> Result<()> {
    logout_with(open_storage(config)?, &mut io::stdout().lock())
}

fn logout_with(storage: Arc<dyn KeyValueStore>, out: &mut impl Write) -> Result<()> {
    let mut session = SessionStore::open(storage);
    if !session.is_authenticated() {
        writeln!(out, "Not logged in.")?;
        return Ok(());
    }
    session.logout();
    writeln!(out, "Logged out.")?;
    Ok(())
}

/// Run the whoami command.
///
/// # Errors
///
/// Returns an error if the profile cannot be opened.
pub fn whoami(config: &Config) -> Result<()> {
    whoami_with(open_storage(config)?, &mut io::stdout().lock())
}

fn whoami_with(storage: Arc<dyn KeyValueStore>, out: &mut impl Write) -> Result<()> {
    let session = SessionStore::open(storage);
    match session.user() {
        Some(user) => writeln!(out, "{} <{}> (id {})", user.name, user.email, user.id)?,
        None => match &session.state().error {
            Some(error) => writeln!(out, "Not logged in: {error}")?,
            None => writeln!(out, "Not logged in.")?,
        },
    }
    Ok(())
}

/// Read one line from stdin after printing `label` to stderr.
fn prompt(label: &str) -> Result<String> {
    eprint!("{label}");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::{DEMO_EMAIL, DEMO_PASSWORD, SESSION_EXPIRED};
    use crate::error::Error;
    use crate::storage::{MemoryBackend, TOKEN_KEY, USER_KEY};

    fn output(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn login_demo_account() {
        let storage = Arc::new(MemoryBackend::new());
        let text = output(|out| login_with(storage.clone(), DEMO_EMAIL, DEMO_PASSWORD, out));

        assert!(text.contains("Logged in as Demo User"));
        assert!(storage.contains(TOKEN_KEY).unwrap());
        assert!(storage.contains(USER_KEY).unwrap());
    }

    #[test]
    fn login_wrong_password_is_rejected() {
        let storage = Arc::new(MemoryBackend::new());
        let mut out = Vec::new();
        let result = login_with(storage.clone(), DEMO_EMAIL, "hunter2", &mut out);

        assert!(matches!(result, Err(Error::InvalidCredentials)));
        assert!(out.is_empty());
        assert!(storage.is_empty());
    }

    #[test]
    fn register_then_whoami() {
        let storage = Arc::new(MemoryBackend::new());
        let form = RegistrationForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "analytical".to_string(),
            confirm_password: "analytical".to_string(),
        };
        output(|out| register_with(storage.clone(), &form, out));

        let text = output(|out| whoami_with(storage.clone(), out));
        assert!(text.starts_with("Ada <ada@example.com>"));
    }

    #[test]
    fn register_mismatched_passwords() {
        let storage = Arc::new(MemoryBackend::new());
        let form = RegistrationForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "analytical".to_string(),
            confirm_password: "engine".to_string(),
        };
        let result = register_with(storage.clone(), &form, &mut Vec::new());
        assert!(matches!(
            result,
            Err(Error::Validation {
                field: "confirm_password",
                ..
            })
        ));
        assert!(storage.is_empty());
    }

    #[test]
    fn logout_clears_session_keys_only() {
        let storage = Arc::new(MemoryBackend::new());
        output(|out| login_with(storage.clone(), DEMO_EMAIL, DEMO_PASSWORD, out));
        storage.put("conversations", "[]").unwrap();

        let text = output(|out| logout_with(storage.clone(), out));

        assert_eq!(text, "Logged out.\n");
        assert!(!storage.contains(TOKEN_KEY).unwrap());
        assert!(!storage.contains(USER_KEY).unwrap());
        assert!(storage.contains("conversations").unwrap());
    }

    #[test]
    fn logout_when_signed_out() {
        let storage = Arc::new(MemoryBackend::new());
        let text = output(|out| logout_with(storage, out));
        assert_eq!(text, "Not logged in.\n");
    }

    #[test]
    fn whoami_reports_expired_session() {
        let storage = Arc::new(MemoryBackend::new());
        storage.put(TOKEN_KEY, "t").unwrap();
        storage.put(USER_KEY, "{ broken").unwrap();

        let text = output(|out| whoami_with(storage, out));
        assert_eq!(text, format!("Not logged in: {SESSION_EXPIRED}\n"));
    }
}
