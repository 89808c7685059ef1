//! Tracker core: pure dashboard state machine, catalog cache and view-model helpers.
mod auth;
mod catalog;
mod effect;
mod links;
mod model;
mod msg;
mod state;
mod update;
mod view_model;

pub use auth::{guard, AuthStore, Route, RouteAccess, SessionState};
pub use catalog::{AdCatalog, ChangeFilter, ChangeLog, CHANGE_LOG_CAP, EXCLUDED_CAP};
pub use effect::Effect;
pub use links::{
    normalize_ad_link, normalize_link_for_domain, LinkRepair, MISSING_LINK, REPAIRS,
    TRACKED_DOMAIN,
};
pub use model::{
    Ad, AdId, AdStats, AuthTokens, ChangeEvent, ChangeKind, CheckStats, FailureKind,
    FavoriteEntry, Favorites, KeywordAd, Preferences, RequestFailure, StoredSession, SystemInfo,
    SystemStats, UpdateBatch, User, UserUpdate,
};
pub use msg::Msg;
pub use state::{
    matches_query, total_pages, AppState, Banner, BannerKind, NotificationPermission, Tab,
    ViewState, BANNER_TIMEOUT_MS, HIGHLIGHT_WINDOW_MS, PAGE_SIZE, STATS_POLL_INTERVAL_MS,
};
pub use update::{update, NOTIFICATION_TITLE};
pub use view_model::{
    display_title, AdCardView, AppViewModel, BannerView, ChangeRowView, ChangesView,
    KeywordFilterView, KeywordSectionView, PaginationView, StatsView, PLACEHOLDER_TITLE,
    SENTINEL_TITLES,
};
