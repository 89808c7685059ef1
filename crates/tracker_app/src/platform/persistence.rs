use std::path::Path;

use tracker_core::{Favorites, Msg, Preferences, StoredSession};
use tracker_engine::{ensure_state_dir, FileKeyValueStore, KeyValueStore, PreferenceStore};
use tracker_logging::{tracker_error, tracker_info};

pub(crate) fn open(state_dir: &Path) -> PreferenceStore<FileKeyValueStore> {
    if let Err(err) = ensure_state_dir(state_dir) {
        tracker_error!("State directory {:?} unusable: {}", state_dir, err);
    }
    PreferenceStore::new(FileKeyValueStore::new(state_dir.to_path_buf()))
}

/// Everything persisted, as startup messages in the order they must apply.
pub(crate) fn restore<S: KeyValueStore>(prefs: &PreferenceStore<S>) -> Vec<Msg> {
    let preferences = prefs.load_preferences();
    let favorites = prefs.load_favorites();
    let session = prefs.load_session();
    tracker_info!(
        "Restored preferences ({} favorites, session: {})",
        favorites.len(),
        if session.is_some() { "yes" } else { "no" }
    );
    vec![
        Msg::PreferencesRestored {
            preferences,
            favorites,
        },
        Msg::SessionRestored(session),
    ]
}

pub(crate) fn save_preferences<S: KeyValueStore>(prefs: &PreferenceStore<S>, value: &Preferences) {
    if let Err(err) = prefs.save_preferences(value) {
        tracker_error!("Failed to save preferences: {}", err);
    }
}

pub(crate) fn save_favorites<S: KeyValueStore>(prefs: &PreferenceStore<S>, value: &Favorites) {
    if let Err(err) = prefs.save_favorites(value) {
        tracker_error!("Failed to save favorites: {}", err);
    }
}

pub(crate) fn save_session<S: KeyValueStore>(
    prefs: &PreferenceStore<S>,
    value: Option<&StoredSession>,
) {
    if let Err(err) = prefs.save_session(value) {
        tracker_error!("Failed to save session: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn restore_reports_defaults_for_fresh_state_dir() {
        let temp = TempDir::new().unwrap();
        let prefs = open(&temp.path().join("state"));

        let msgs = restore(&prefs);
        assert_eq!(
            msgs,
            vec![
                Msg::PreferencesRestored {
                    preferences: Preferences::default(),
                    favorites: Favorites::new(),
                },
                Msg::SessionRestored(None),
            ]
        );
    }

    #[test]
    fn saved_preferences_are_restored() {
        let temp = TempDir::new().unwrap();
        let prefs = open(temp.path());
        let saved = Preferences {
            dark_mode: true,
            ..Preferences::default()
        };
        save_preferences(&prefs, &saved);

        match restore(&open(temp.path())).remove(0) {
            Msg::PreferencesRestored { preferences, .. } => assert_eq!(preferences, saved),
            other => panic!("unexpected message {other:?}"),
        }
    }
}
