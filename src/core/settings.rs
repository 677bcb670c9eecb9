//! User preference state.

use crate::core::session::SessionStore;
use crate::error::{Error, Result};
use crate::storage::{KeyValueStore, SETTINGS_KEY, load_json, save_json};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

/// Error shown when stored settings cannot be read.
pub const SETTINGS_LOAD_FAILED: &str = "Failed to load settings";

/// Color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme (default).
    #[default]
    Light,

    /// Dark theme.
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Dark => f.write_str("dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(Error::validation("theme", format!("unknown theme: {other}"))),
        }
    }
}

/// Tone requested from the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiStyle {
    /// Balanced (default).
    #[default]
    Balanced,

    /// Looser, more imaginative replies.
    Creative,

    /// Terse, factual replies.
    Precise,

    /// Warm, conversational replies.
    Friendly,

    /// Formal replies.
    Professional,
}

impl AiStyle {
    /// Lowercase name as stored.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Creative => "creative",
            Self::Precise => "precise",
            Self::Friendly => "friendly",
            Self::Professional => "professional",
        }
    }
}

impl fmt::Display for AiStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "balanced" => Ok(Self::Balanced),
            "creative" => Ok(Self::Creative),
            "precise" => Ok(Self::Precise),
            "friendly" => Ok(Self::Friendly),
            "professional" => Ok(Self::Professional),
            other => Err(Error::validation("ai_style", format!("unknown AI style: {other}"))),
        }
    }
}

/// Persisted user preferences.
///
/// Missing fields in stored data fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserSettings {
    /// Interface language tag.
    pub language: String,

    /// Color theme.
    pub theme: Theme,

    /// Assistant tone.
    pub ai_style: AiStyle,

    /// Sampling temperature in `[0.0, 1.0]`.
    pub temperature: f32,
}

impl UserSettings {
    /// Bring stored values back within range.
    ///
    /// A blank language or a non-finite temperature falls back to the
    /// default; other temperatures are clamped to `[0.0, 1.0]`.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.language.trim().is_empty() {
            self.language = defaults.language;
        }
        self.temperature = if self.temperature.is_finite() {
            self.temperature.clamp(0.0, 1.0)
        } else {
            defaults.temperature
        };
        self
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            theme: Theme::Light,
            ai_style: AiStyle::Balanced,
            temperature: 0.7,
        }
    }
}

/// A partial settings update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    /// New language tag. Must not be blank.
    pub language: Option<String>,

    /// New color theme.
    pub theme: Option<Theme>,

    /// New assistant tone.
    pub ai_style: Option<AiStyle>,

    /// New temperature, clamped to `[0.0, 1.0]`.
    pub temperature: Option<f32>,
}

impl SettingsPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.language.is_none()
            && self.theme.is_none()
            && self.ai_style.is_none()
            && self.temperature.is_none()
    }

    fn apply(&self, settings: &UserSettings) -> Result<UserSettings> {
        let mut next = settings.clone();
        if let Some(language) = &self.language {
            let language = language.trim();
            if language.is_empty() {
                return Err(Error::validation("language", "Language is required"));
            }
            next.language = language.to_string();
        }
        if let Some(theme) = self.theme {
            next.theme = theme;
        }
        if let Some(style) = self.ai_style {
            next.ai_style = style;
        }
        if let Some(temperature) = self.temperature {
            if !temperature.is_finite() {
                return Err(Error::validation("temperature", "Temperature must be a number"));
            }
            next.temperature = temperature.clamp(0.0, 1.0);
        }
        Ok(next)
    }
}

/// Holds user preferences, persisted while a session is authenticated.
pub struct SettingsStore {
    storage: Arc<dyn KeyValueStore>,
    persist: bool,
    settings: UserSettings,
    error: Option<String>,
}

impl SettingsStore {
    /// Open the settings for `session`.
    ///
    /// Stored settings are read only if the session is authenticated.
    #[must_use]
    pub fn open(session: &SessionStore) -> Self {
        let mut store = Self {
            storage: Arc::clone(session.storage()),
            persist: session.is_authenticated(),
            settings: UserSettings::default(),
            error: None,
        };
        if store.persist {
            match load_json::<UserSettings>(store.storage.as_ref(), SETTINGS_KEY) {
                Ok(Some(settings)) => store.settings = settings.sanitized(),
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "failed to load settings");
                    store.error = Some(SETTINGS_LOAD_FAILED.to_string());
                }
            }
        }
        store
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    /// Error from loading stored settings.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Apply `patch` and persist the merged settings.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid field (nothing changes), or a
    /// storage error if the write fails (the in-memory update is kept).
    pub fn update(&mut self, patch: &SettingsPatch) -> Result<&UserSettings> {
        self.settings = patch.apply(&self.settings)?;
        if self.persist {
            save_json(self.storage.as_ref(), SETTINGS_KEY, &self.settings)?;
        }
        Ok(&self.settings)
    }

    /// Restore defaults and drop the stored settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored settings cannot be removed.
    pub fn reset(&mut self) -> Result<()> {
        self.settings = UserSettings::default();
        self.error = None;
        if self.persist {
            self.storage.remove(SETTINGS_KEY)?;
        }
        Ok(())
    }
}
