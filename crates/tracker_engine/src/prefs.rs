//! Typed view over the key/value store.
//!
//! Reads never fail: a missing key yields the default and an unreadable one
//! is logged and replaced by the default, so startup always proceeds.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracker_core::{AuthTokens, Favorites, Preferences, StoredSession, User};
use tracker_logging::tracker_warn;

use crate::persist::{KeyValueStore, PersistError};

pub const KEY_DARK_MODE: &str = "darkMode";
pub const KEY_NOTIFICATIONS: &str = "notificationsEnabled";
pub const KEY_SOUND: &str = "soundEnabled";
pub const KEY_FAVORITES: &str = "favoriteAds";
pub const KEY_ACCESS_TOKEN: &str = "access_token";
pub const KEY_REFRESH_TOKEN: &str = "refresh_token";
pub const KEY_USER: &str = "user";

pub struct PreferenceStore<S> {
    store: S,
}

impl<S: KeyValueStore> PreferenceStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn load_preferences(&self) -> Preferences {
        let defaults = Preferences::default();
        Preferences {
            dark_mode: self.read_json(KEY_DARK_MODE).unwrap_or(defaults.dark_mode),
            notifications_enabled: self
                .read_json(KEY_NOTIFICATIONS)
                .unwrap_or(defaults.notifications_enabled),
            sound_enabled: self.read_json(KEY_SOUND).unwrap_or(defaults.sound_enabled),
        }
    }

    pub fn save_preferences(&self, preferences: &Preferences) -> Result<(), PersistError> {
        self.write_json(KEY_DARK_MODE, &preferences.dark_mode)?;
        self.write_json(KEY_NOTIFICATIONS, &preferences.notifications_enabled)?;
        self.write_json(KEY_SOUND, &preferences.sound_enabled)
    }

    pub fn load_favorites(&self) -> Favorites {
        self.read_json(KEY_FAVORITES).unwrap_or_default()
    }

    pub fn save_favorites(&self, favorites: &Favorites) -> Result<(), PersistError> {
        self.write_json(KEY_FAVORITES, favorites)
    }

    /// Tokens are stored verbatim; the profile as JSON. A session needs both
    /// an access token and a readable profile, otherwise all three keys are
    /// dropped.
    pub fn load_session(&self) -> Option<StoredSession> {
        let access_token = self.read_raw(KEY_ACCESS_TOKEN).filter(|t| !t.is_empty())?;
        let Some(user) = self.read_json::<User>(KEY_USER) else {
            tracker_warn!("Stored access token has no readable profile; discarding session");
            if let Err(err) = self.clear_session() {
                tracker_warn!("Failed to clear stored session: {}", err);
            }
            return None;
        };
        Some(StoredSession {
            tokens: AuthTokens {
                access_token,
                refresh_token: self.read_raw(KEY_REFRESH_TOKEN).filter(|t| !t.is_empty()),
            },
            user,
        })
    }

    pub fn save_session(&self, session: Option<&StoredSession>) -> Result<(), PersistError> {
        let Some(session) = session else {
            return self.clear_session();
        };
        self.store
            .set(KEY_ACCESS_TOKEN, &session.tokens.access_token)?;
        match session.tokens.refresh_token.as_deref() {
            Some(token) => self.store.set(KEY_REFRESH_TOKEN, token)?,
            None => self.store.remove(KEY_REFRESH_TOKEN)?,
        }
        self.write_json(KEY_USER, &session.user)
    }

    fn clear_session(&self) -> Result<(), PersistError> {
        self.store.remove(KEY_ACCESS_TOKEN)?;
        self.store.remove(KEY_REFRESH_TOKEN)?;
        self.store.remove(KEY_USER)
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(err) => {
                tracker_warn!("Failed to read {}: {}", key, err);
                None
            }
        }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracker_warn!("Ignoring unreadable {}: {}", key, err);
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), PersistError> {
        let encoded = serde_json::to_string(value).map_err(|err| PersistError::Io(err.into()))?;
        self.store.set(key, &encoded)
    }
}
