use std::collections::BTreeMap;

use crate::view_model::AppViewModel;
use crate::{
    AdCatalog, AdId, AuthStore, ChangeFilter, ChangeLog, Favorites, Preferences, Route,
    SystemStats,
};

/// How long a newly seen ad keeps its "new" treatment.
pub const HIGHLIGHT_WINDOW_MS: u64 = 10_000;
/// Status banners dismiss themselves after this long.
pub const BANNER_TIMEOUT_MS: u64 = 5_000;
/// Stats are refreshed on this cadence while the clock ticks.
pub const STATS_POLL_INTERVAL_MS: u64 = 10_000;
/// Ads per page in the keyword view.
pub const PAGE_SIZE: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Recent,
    Keywords,
    Favorites,
    Changes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub message: String,
    pub kind: BannerKind,
    pub expires_at_ms: u64,
}

/// Host permission for platform notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationPermission {
    #[default]
    Default,
    Granted,
    Denied,
}

/// Transient UI state. Reset on reload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub tab: Tab,
    pub selected_keyword: Option<String>,
    pub keyword_input: String,
    pub search_query: String,
    pub page: usize,
    pub change_filter: ChangeFilter,
}

/// The whole dashboard state, owned by one controller and mutated only by
/// [`crate::update`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    dirty: bool,
    now_ms: u64,
    next_stats_poll_ms: u64,
    pub(crate) catalog: AdCatalog,
    pub(crate) change_log: ChangeLog,
    pub(crate) favorites: Favorites,
    pub(crate) preferences: Preferences,
    pub(crate) permission: NotificationPermission,
    pub(crate) ui: ViewState,
    pub(crate) highlights: BTreeMap<AdId, u64>,
    pub(crate) banner: Option<Banner>,
    pub(crate) stats: Option<SystemStats>,
    pub(crate) manual_check_in_flight: bool,
    pub(crate) connected: bool,
    pub(crate) auth: AuthStore,
    pub(crate) route: Route,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            ui: ViewState {
                page: 1,
                ..ViewState::default()
            },
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::build(self)
    }

    /// Returns whether anything visible changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn catalog(&self) -> &AdCatalog {
        &self.catalog
    }

    pub fn change_log(&self) -> &ChangeLog {
        &self.change_log
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    pub fn ui(&self) -> &ViewState {
        &self.ui
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn is_highlighted(&self, id: &AdId) -> bool {
        self.highlights
            .get(id)
            .is_some_and(|deadline| *deadline > self.now_ms)
    }

    /// Starts the highlight window for `id`. An ongoing window is not extended.
    pub(crate) fn highlight(&mut self, id: &AdId) {
        let deadline = self.now_ms + HIGHLIGHT_WINDOW_MS;
        self.highlights.entry(id.clone()).or_insert(deadline);
        self.mark_dirty();
    }

    pub(crate) fn show_banner(&mut self, message: impl Into<String>, kind: BannerKind) {
        self.banner = Some(Banner {
            message: message.into(),
            kind,
            expires_at_ms: self.now_ms + BANNER_TIMEOUT_MS,
        });
        self.mark_dirty();
    }

    pub(crate) fn schedule_stats_poll(&mut self) {
        self.next_stats_poll_ms = self.now_ms + STATS_POLL_INTERVAL_MS;
    }

    /// Advances the clock and expires timed state. Returns whether stats are due.
    pub(crate) fn advance_clock(&mut self, now_ms: u64) -> bool {
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;

        let before = self.highlights.len();
        self.highlights.retain(|_, deadline| *deadline > now);
        if self.highlights.len() != before {
            self.mark_dirty();
        }

        if self
            .banner
            .as_ref()
            .is_some_and(|banner| banner.expires_at_ms <= now)
        {
            self.banner = None;
            self.mark_dirty();
        }

        if now >= self.next_stats_poll_ms {
            self.schedule_stats_poll();
            return true;
        }
        false
    }

    /// Ads of the selected keyword that match the search query.
    pub fn filtered_keyword_ads(&self) -> Vec<&crate::Ad> {
        let Some(keyword) = self.ui.selected_keyword.as_deref() else {
            return Vec::new();
        };
        let Some(ads) = self.catalog.keyword_ads(keyword) else {
            return Vec::new();
        };
        let query = self.ui.search_query.trim().to_lowercase();
        ads.iter()
            .filter(|ad| matches_query(ad, &query))
            .collect()
    }

    /// Clamps the page to the current result count.
    pub(crate) fn clamp_page(&mut self) {
        let total = total_pages(self.filtered_keyword_ads().len());
        self.ui.page = self.ui.page.clamp(1, total.max(1));
    }
}

pub fn total_pages(result_count: usize) -> usize {
    result_count.div_ceil(PAGE_SIZE)
}

/// Case-insensitive substring match over title, description and price.
pub fn matches_query(ad: &crate::Ad, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    [&ad.title, &ad.description, &ad.price]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(query))
}
