use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Stable ad identifier. The server sends it either as a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AdId(String);

impl AdId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AdId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for AdId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for AdId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Integer(i64),
            Float(f64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => AdId(text),
            RawId::Integer(number) => AdId(number.to_string()),
            RawId::Float(number) => AdId(number.to_string()),
        })
    }
}

/// A listing as delivered by the tracker service. Replaced wholesale on refetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ad {
    pub id: AdId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "display_string")]
    pub price: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub date_added: Option<String>,
}

impl Ad {
    /// Minimal ad with only an identifier and a title, mostly useful in tests.
    pub fn titled(id: impl Into<AdId>, title: &str) -> Self {
        Self {
            id: id.into(),
            title: Some(title.to_string()),
            description: None,
            price: None,
            image_url: None,
            link: None,
            date_added: None,
        }
    }
}

/// Prices arrive as strings ("1 500 Kč") but older payloads carry bare numbers.
fn display_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(
        Option::<RawPrice>::deserialize(deserializer)?.map(|raw| match raw {
            RawPrice::Text(text) => text,
            RawPrice::Integer(number) => number.to_string(),
            RawPrice::Float(number) => number.to_string(),
        }),
    )
}

/// An ad paired with the keyword that matched it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordAd {
    pub keyword: String,
    pub ad: Ad,
}

/// One `ads_update` payload from the push channel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateBatch {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub new_ads: Vec<KeywordAd>,
    #[serde(default)]
    pub deleted_ads: Vec<KeywordAd>,
    #[serde(default)]
    pub keywords_with_changes: Vec<String>,
}

impl UpdateBatch {
    pub fn has_changes(&self) -> bool {
        !self.new_ads.is_empty() || !self.deleted_ads.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_changes() && self.keywords_with_changes.is_empty()
    }

    /// Keywords named by the batch, either explicitly or through its items.
    pub fn affected_keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords_with_changes
            .iter()
            .map(String::as_str)
            .chain(self.new_ads.iter().map(|item| item.keyword.as_str()))
            .chain(self.deleted_ads.iter().map(|item| item.keyword.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    New,
    Deleted,
}

/// One entry of the change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub keyword: String,
    pub ad: Ad,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemStats {
    pub checks: CheckStats,
    pub ads: AdStats,
    pub system: SystemInfo,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckStats {
    pub total: u64,
    pub avg_duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdStats {
    pub total_found: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemInfo {
    pub uptime_seconds: f64,
}

/// Profile of the signed-in user as returned by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: Option<String>,
    pub last_login: Option<String>,
    pub keywords_count: u64,
    pub ads_count: u64,
    pub favorites_count: u64,
}

/// Partial profile update merged into the cached user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub keywords_count: Option<u64>,
    pub ads_count: Option<u64>,
    pub favorites_count: Option<u64>,
}

impl User {
    pub fn merge(&mut self, update: UserUpdate) {
        if let Some(username) = update.username {
            self.username = username;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(count) = update.keywords_count {
            self.keywords_count = count;
        }
        if let Some(count) = update.ads_count {
            self.ads_count = count;
        }
        if let Some(count) = update.favorites_count {
            self.favorites_count = count;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Credentials plus cached profile; what survives a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub tokens: AuthTokens,
    pub user: User,
}

/// Persisted user preferences. Notifications and sound default to on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub dark_mode: bool,
    pub notifications_enabled: bool,
    pub sound_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            notifications_enabled: true,
            sound_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub ad: Ad,
    #[serde(rename = "addedAt")]
    pub added_at: String,
}

/// Favorited ads keyed by ad id. Independent of what the catalog currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites(BTreeMap<AdId, FavoriteEntry>);

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &AdId) -> bool {
        self.0.contains_key(id)
    }

    pub fn get(&self, id: &AdId) -> Option<&FavoriteEntry> {
        self.0.get(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adds the ad if absent, removes it otherwise. Returns whether it is now a favorite.
    pub fn toggle(&mut self, ad: Ad, added_at: impl Into<String>) -> bool {
        if self.0.remove(&ad.id).is_some() {
            return false;
        }
        self.0.insert(
            ad.id.clone(),
            FavoriteEntry {
                ad,
                added_at: added_at.into(),
            },
        );
        true
    }

    /// Entries ordered by `added_at`, most recent first.
    pub fn newest_first(&self) -> Vec<&FavoriteEntry> {
        let mut entries: Vec<_> = self.0.values().collect();
        entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        entries
    }
}

/// User-facing failure classes for requests issued on behalf of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport failure or an unreadable response.
    Network,
    /// The server answered but refused (`success: false`, error status).
    Rejected,
    /// 401 from an authenticated request.
    Unauthorized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl RequestFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Network, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Rejected, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(FailureKind::Unauthorized, "unauthorized")
    }
}
