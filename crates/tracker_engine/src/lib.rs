//! Tracker engine: HTTP client, command execution and local persistence.
mod api;
mod engine;
mod notify;
mod persist;
mod poll;
mod prefs;
mod types;

pub use api::{ApiSettings, ReqwestApi, TrackerApi};
pub use engine::EngineHandle;
pub use notify::{NotificationGateway, TerminalGateway};
pub use persist::{
    ensure_state_dir, AtomicFileWriter, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore,
    PersistError,
};
pub use poll::NotificationPoller;
pub use prefs::{
    PreferenceStore, KEY_ACCESS_TOKEN, KEY_DARK_MODE, KEY_FAVORITES, KEY_NOTIFICATIONS,
    KEY_REFRESH_TOKEN, KEY_SOUND, KEY_USER,
};
pub use types::{ApiError, EngineCommand, EngineEvent, FailureKind};
