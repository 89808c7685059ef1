use crate::{AdId, Favorites, Preferences, StoredSession};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchKeywords,
    AddKeyword { keyword: String },
    DeleteKeyword { keyword: String },
    /// Refetch recent ads; ids in `highlight` get the "new" treatment on arrival.
    FetchRecent { highlight: Vec<AdId> },
    FetchKeywordAds { keyword: String, highlight: Vec<AdId> },
    FetchStats,
    ManualCheck,
    Login {
        username: String,
        password: String,
        remember_me: bool,
    },
    Logout { access_token: String },
    VerifySession,
    PersistPreferences(Preferences),
    PersistFavorites(Favorites),
    /// Store or clear credentials; also the bearer used by later requests.
    PersistSession(Option<StoredSession>),
    PlaySound,
    ShowNotification { title: String, body: String },
    RequestNotificationPermission,
}
