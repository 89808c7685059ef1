//! Pure projection of [`AppState`] into what the dashboard shows.

use crate::links::{normalize_ad_link, MISSING_LINK};
use crate::state::{matches_query, total_pages};
use crate::{
    Ad, AdId, AppState, BannerKind, ChangeFilter, ChangeKind, NotificationPermission, Route,
    SessionState, Tab, PAGE_SIZE,
};

/// Titles the scraper emits when it found nothing useful.
pub const SENTINEL_TITLES: [&str; 2] = ["No title", "Bazos.cz Advertisement"];
pub const PLACEHOLDER_TITLE: &str = "Bazos Advertisement";
const TITLE_WORDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub route: Route,
    pub session: SessionState,
    pub user_name: Option<String>,
    pub auth_error: Option<String>,
    pub dark_mode: bool,
    pub notifications_enabled: bool,
    pub sound_enabled: bool,
    pub show_permission_prompt: bool,
    pub connected: bool,
    pub tab: Tab,
    pub banner: Option<BannerView>,
    pub keyword_input: String,
    pub keywords: Vec<String>,
    pub keywords_empty_message: Option<&'static str>,
    pub keyword_filter: KeywordFilterView,
    pub recent: Vec<AdCardView>,
    pub recent_empty_message: Option<&'static str>,
    pub keyword_section: KeywordSectionView,
    pub favorites: Vec<AdCardView>,
    pub favorites_empty: bool,
    pub changes: ChangesView,
    pub stats: Option<StatsView>,
    pub manual_check_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerView {
    pub message: String,
    pub kind: BannerKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeywordFilterView {
    pub placeholder: &'static str,
    pub options: Vec<String>,
    pub selected: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdCardView {
    pub id: AdId,
    pub title: String,
    pub price: String,
    pub description: String,
    pub keyword_label: Option<String>,
    pub image_url: Option<String>,
    pub link: String,
    pub date_added: String,
    pub is_new: bool,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaginationView {
    pub visible: bool,
    pub current_page: usize,
    pub total_pages: usize,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeywordSectionView {
    pub heading: String,
    pub search_query: String,
    pub loading: bool,
    pub cards: Vec<AdCardView>,
    pub result_count: usize,
    pub results_label: String,
    pub no_results: bool,
    pub empty_message: Option<&'static str>,
    pub pagination: PaginationView,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangesView {
    pub filter: ChangeFilter,
    pub rows: Vec<ChangeRowView>,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRowView {
    pub kind: ChangeKind,
    pub headline: String,
    pub timestamp: String,
    pub ad_id: AdId,
    pub title: String,
    pub price: String,
    pub description: String,
    pub image_url: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsView {
    pub total_checks: u64,
    pub avg_duration: String,
    pub total_ads: u64,
    pub uptime_minutes: u64,
}

impl AppViewModel {
    pub(crate) fn build(state: &AppState) -> Self {
        let keywords = state.catalog.keywords().to_vec();
        let auth = &state.auth;
        Self {
            route: state.route,
            session: auth.state(),
            user_name: auth.user().map(|user| user.username.clone()),
            auth_error: auth.error().map(str::to_string),
            dark_mode: state.preferences.dark_mode,
            notifications_enabled: state.preferences.notifications_enabled,
            sound_enabled: state.preferences.sound_enabled,
            show_permission_prompt: state.permission == NotificationPermission::Default,
            connected: state.connected,
            tab: state.ui.tab,
            banner: state.banner.as_ref().map(|banner| BannerView {
                message: banner.message.clone(),
                kind: banner.kind,
            }),
            keyword_input: state.ui.keyword_input.clone(),
            keywords_empty_message: keywords.is_empty().then_some("No keywords added yet"),
            keyword_filter: KeywordFilterView {
                placeholder: if keywords.is_empty() {
                    "No keywords available"
                } else {
                    "Select a keyword"
                },
                options: keywords.clone(),
                selected: state.ui.selected_keyword.clone(),
            },
            keywords,
            recent: state
                .catalog
                .recent()
                .iter()
                .map(|item| card(state, &item.ad, Some(&item.keyword)))
                .collect(),
            recent_empty_message: state
                .catalog
                .recent()
                .is_empty()
                .then_some("No recent ads found"),
            keyword_section: keyword_section(state),
            favorites: state
                .favorites
                .newest_first()
                .into_iter()
                .map(|entry| card(state, &entry.ad, None))
                .collect(),
            favorites_empty: state.favorites.is_empty(),
            changes: changes_view(state),
            stats: state.stats.as_ref().map(|stats| StatsView {
                total_checks: stats.checks.total,
                avg_duration: format!("{} ms", stats.checks.avg_duration_ms),
                total_ads: stats.ads.total_found,
                uptime_minutes: (stats.system.uptime_seconds.max(0.0) / 60.0).floor() as u64,
            }),
            manual_check_enabled: !state.manual_check_in_flight,
        }
    }
}

/// Title fallback: explicit title, then the first words of the description,
/// then a placeholder. Sentinel titles count as missing.
pub fn display_title(ad: &Ad) -> String {
    let title = ad.title.as_deref().map(str::trim).unwrap_or_default();
    if !title.is_empty() && !SENTINEL_TITLES.contains(&title) {
        return title.to_string();
    }
    let words: Vec<&str> = ad
        .description
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .take(TITLE_WORDS)
        .collect();
    if words.is_empty() {
        PLACEHOLDER_TITLE.to_string()
    } else {
        format!("{}...", words.join(" "))
    }
}

fn card(state: &AppState, ad: &Ad, keyword_label: Option<&str>) -> AdCardView {
    AdCardView {
        id: ad.id.clone(),
        title: display_title(ad),
        price: non_empty(ad.price.as_deref()).unwrap_or("Price not listed").to_string(),
        description: non_empty(ad.description.as_deref())
            .unwrap_or("No description available")
            .to_string(),
        keyword_label: keyword_label.map(str::to_string),
        image_url: non_empty(ad.image_url.as_deref()).map(str::to_string),
        link: normalize_ad_link(ad.link.as_deref().unwrap_or(MISSING_LINK)),
        date_added: non_empty(ad.date_added.as_deref()).unwrap_or("N/A").to_string(),
        is_new: state.is_highlighted(&ad.id),
        is_favorite: state.favorites.contains(&ad.id),
    }
}

fn keyword_section(state: &AppState) -> KeywordSectionView {
    let Some(keyword) = state.ui.selected_keyword.as_deref() else {
        return KeywordSectionView {
            heading: "Select a keyword above".to_string(),
            results_label: results_label(0),
            ..KeywordSectionView::default()
        };
    };

    let heading = format!("Advertisements for: \"{keyword}\"");
    let Some(all) = state.catalog.keyword_ads(keyword) else {
        return KeywordSectionView {
            heading,
            search_query: state.ui.search_query.clone(),
            loading: true,
            results_label: results_label(0),
            ..KeywordSectionView::default()
        };
    };

    let query = state.ui.search_query.trim().to_lowercase();
    let filtered: Vec<&Ad> = all.iter().filter(|ad| matches_query(ad, &query)).collect();
    let total = total_pages(filtered.len());
    let page = state.ui.page.clamp(1, total.max(1));
    let cards = filtered
        .iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .map(|ad| card(state, ad, None))
        .collect();

    KeywordSectionView {
        heading,
        search_query: state.ui.search_query.clone(),
        loading: false,
        cards,
        result_count: filtered.len(),
        results_label: results_label(filtered.len()),
        no_results: filtered.is_empty(),
        empty_message: if all.is_empty() {
            Some("No ads found for this keyword")
        } else if filtered.is_empty() {
            Some("No ads match your search")
        } else {
            None
        },
        pagination: PaginationView {
            visible: total > 1,
            current_page: page,
            total_pages: total,
            prev_enabled: page > 1,
            next_enabled: page < total,
        },
    }
}

fn changes_view(state: &AppState) -> ChangesView {
    let filter = state.ui.change_filter;
    let rows: Vec<ChangeRowView> = state
        .change_log
        .filtered(filter)
        .map(|event| {
            let action = match event.kind {
                ChangeKind::New => "New ad found",
                ChangeKind::Deleted => "Ad removed",
            };
            ChangeRowView {
                kind: event.kind,
                headline: format!("{action} for keyword \"{}\"", event.keyword),
                timestamp: event.timestamp.clone(),
                ad_id: event.ad.id.clone(),
                title: non_empty(event.ad.title.as_deref())
                    .unwrap_or("Untitled")
                    .to_string(),
                price: non_empty(event.ad.price.as_deref())
                    .unwrap_or("Price not listed")
                    .to_string(),
                description: non_empty(event.ad.description.as_deref())
                    .unwrap_or("No description available")
                    .to_string(),
                image_url: non_empty(event.ad.image_url.as_deref()).map(str::to_string),
                link: non_empty(event.ad.link.as_deref()).map(normalize_ad_link),
            }
        })
        .collect();

    let empty_message = if state.change_log.is_empty() {
        Some("No changes detected yet. Changes will appear here when new ads are found or old ones are removed.")
    } else if rows.is_empty() {
        match filter {
            ChangeFilter::New => Some("No new ads found yet."),
            ChangeFilter::Deleted | ChangeFilter::All => Some("No deleted ads detected yet."),
        }
    } else {
        None
    };

    ChangesView {
        filter,
        rows,
        empty_message,
    }
}

fn results_label(count: usize) -> String {
    if count == 1 {
        "1 result".to_string()
    } else {
        format!("{count} results")
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
