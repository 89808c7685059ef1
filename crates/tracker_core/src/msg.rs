use crate::{
    Ad, AdId, ChangeFilter, Favorites, KeywordAd, NotificationPermission, Preferences,
    RequestFailure, StoredSession, SystemStats, Tab, UpdateBatch, User, UserUpdate,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Monotonic clock tick, milliseconds since the controller started.
    Tick { now_ms: u64 },
    /// Local preferences and favorites loaded at startup.
    PreferencesRestored {
        preferences: Preferences,
        favorites: Favorites,
    },
    /// Persisted credentials loaded at startup (`None` when absent or unreadable).
    SessionRestored(Option<StoredSession>),
    /// Startup finished; perform the initial full fetch.
    Started,

    /// Push channel connected.
    PushConnected,
    /// Push channel lost.
    PushDisconnected,
    /// One `ads_update` batch. `received_at` stands in for a missing timestamp.
    AdsUpdate {
        batch: UpdateBatch,
        received_at: String,
    },

    /// User edited the new-keyword input.
    KeywordInputChanged(String),
    /// User submitted the new-keyword input.
    AddKeywordSubmitted,
    /// User asked to stop tracking a keyword.
    DeleteKeywordClicked(String),
    /// User picked a keyword in the filter (`None` clears it).
    KeywordSelected(Option<String>),
    TabSelected(Tab),
    SearchChanged(String),
    SearchCleared,
    NextPage,
    PrevPage,
    ChangeFilterSelected(ChangeFilter),
    /// User toggled the star on a card. `at` is the wall-clock time of the click.
    FavoriteToggled { ad_id: AdId, at: String },
    ThemeToggled,
    NotificationsToggled,
    SoundToggled,
    PermissionRequested,
    PermissionResolved(NotificationPermission),
    /// Permission the host already holds at startup. Applied silently.
    PermissionRestored(NotificationPermission),
    ManualCheckClicked,
    LoginSubmitted {
        username: String,
        password: String,
        remember_me: bool,
    },
    LogoutClicked,
    Navigate(String),
    UserUpdated(UserUpdate),

    KeywordsLoaded(Result<Vec<String>, RequestFailure>),
    KeywordAdded {
        keyword: String,
        result: Result<(), RequestFailure>,
    },
    KeywordDeleted {
        keyword: String,
        result: Result<(), RequestFailure>,
    },
    RecentAdsLoaded {
        result: Result<Vec<KeywordAd>, RequestFailure>,
        highlight: Vec<AdId>,
    },
    KeywordAdsLoaded {
        keyword: String,
        result: Result<Vec<Ad>, RequestFailure>,
        highlight: Vec<AdId>,
    },
    StatsLoaded(Result<SystemStats, RequestFailure>),
    ManualCheckFinished(Result<(), RequestFailure>),
    LoginFinished(Result<StoredSession, RequestFailure>),
    SessionVerified(Result<User, RequestFailure>),
}
