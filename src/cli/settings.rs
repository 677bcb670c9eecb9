//! `parley settings` command implementation.

use crate::cli::{open_storage, require_session};
use crate::config::Config;
use crate::core::{SettingsPatch, SettingsStore, UserSettings};
use crate::error::{Error, Result};
use std::io::{self, Write};

/// Run `settings show`.
///
/// # Errors
///
/// Returns an error if nobody is signed in or the profile cannot be opened.
pub fn show(config: &Config) -> Result<()> {
    let store = open_settings(config)?;
    show_with(&store, &mut io::stdout().lock())
}

fn show_with(store: &SettingsStore, out: &mut impl Write) -> Result<()> {
    if let Some(error) = store.error() {
        writeln!(out, "warning: {error}; showing defaults")?;
    }
    print_settings(store.settings(), out)
}

/// Run `settings set`.
///
/// # Errors
///
/// Returns an error if nothing is given to change, a value is invalid, or
/// storage fails.
pub fn set(config: &Config, patch: &SettingsPatch) -> Result<()> {
    let mut store = open_settings(config)?;
    set_with(&mut store, patch, &mut io::stdout().lock())
}

fn set_with(store: &mut SettingsStore, patch: &SettingsPatch, out: &mut impl Write) -> Result<()> {
    if patch.is_empty() {
        return Err(Error::validation("settings", "Nothing to change"));
    }
    let settings = store.update(patch)?;
    print_settings(settings, out)
}

/// Run `settings reset`.
///
/// # Errors
///
/// Returns an error if nobody is signed in or storage fails.
pub fn reset(config: &Config) -> Result<()> {
    let mut store = open_settings(config)?;
    reset_with(&mut store, &mut io::stdout().lock())
}

fn reset_with(store: &mut SettingsStore, out: &mut impl Write) -> Result<()> {
    store.reset()?;
    writeln!(out, "Settings restored to defaults.")?;
    print_settings(store.settings(), out)
}

fn open_settings(config: &Config) -> Result<SettingsStore> {
    let session = require_session(open_storage(config)?)?;
    Ok(SettingsStore::open(&session))
}

fn print_settings(settings: &UserSettings, out: &mut impl Write) -> Result<()> {
    writeln!(out, "language     {}", settings.language)?;
    writeln!(out, "theme        {}", settings.theme)?;
    writeln!(out, "ai-style     {}", settings.ai_style)?;
    writeln!(out, "temperature  {:.2}", settings.temperature)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::{DEMO_EMAIL, DEMO_PASSWORD};
    use crate::core::{SessionStore, Theme};
    use crate::storage::{KeyValueStore, MemoryBackend, SETTINGS_KEY};
    use std::sync::Arc;

    fn signed_in() -> (SessionStore, Arc<MemoryBackend>) {
        let storage = Arc::new(MemoryBackend::new());
        let mut session = SessionStore::new(storage.clone());
        session.login(DEMO_EMAIL, DEMO_PASSWORD).unwrap();
        (session, storage)
    }

    #[test]
    fn show_defaults() {
        let (session, _) = signed_in();
        let mut out = Vec::new();
        show_with(&SettingsStore::open(&session), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("language     en"));
        assert!(text.contains("theme        light"));
        assert!(text.contains("ai-style     balanced"));
        assert!(text.contains("temperature  0.70"));
    }

    #[test]
    fn show_warns_about_unreadable_settings() {
        let (session, storage) = signed_in();
        storage.put(SETTINGS_KEY, "???").unwrap();

        let mut out = Vec::new();
        show_with(&SettingsStore::open(&session), &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("warning: "));
    }

    #[test]
    fn set_persists_change() {
        let (session, _) = signed_in();
        let mut store = SettingsStore::open(&session);
        let patch = SettingsPatch {
            theme: Some(Theme::Dark),
            ..SettingsPatch::default()
        };

        let mut out = Vec::new();
        set_with(&mut store, &patch, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("theme        dark"));

        let reopened = SettingsStore::open(&session);
        assert_eq!(reopened.settings().theme, Theme::Dark);
    }

    #[test]
    fn set_without_changes_is_rejected() {
        let (session, _) = signed_in();
        let mut store = SettingsStore::open(&session);
        let result = set_with(&mut store, &SettingsPatch::default(), &mut Vec::new());
        assert!(matches!(result, Err(Error::Validation { field: "settings", .. })));
    }

    #[test]
    fn reset_restores_defaults() {
        let (session, storage) = signed_in();
        let mut store = SettingsStore::open(&session);
        let patch = SettingsPatch {
            theme: Some(Theme::Dark),
            ..SettingsPatch::default()
        };
        set_with(&mut store, &patch, &mut Vec::new()).unwrap();

        let mut out = Vec::new();
        reset_with(&mut store, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Settings restored to defaults.\n"));
        assert!(text.contains("theme        light"));
        assert!(!storage.contains(SETTINGS_KEY).unwrap());
    }
}
