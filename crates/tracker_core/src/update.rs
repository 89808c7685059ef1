use crate::auth::guard;
use crate::{
    display_title, AdId, AppState, BannerKind, ChangeEvent, ChangeKind, Effect, FailureKind, Msg,
    NotificationPermission, RequestFailure, Route, SessionState, Tab, UpdateBatch,
};

/// Title used for platform notifications.
pub const NOTIFICATION_TITLE: &str = "Bazos Ad Tracker";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Tick { now_ms } => {
            if state.advance_clock(now_ms) {
                vec![Effect::FetchStats]
            } else {
                Vec::new()
            }
        }
        Msg::PreferencesRestored {
            preferences,
            favorites,
        } => {
            state.preferences = preferences;
            state.favorites = favorites;
            state.mark_dirty();
            Vec::new()
        }
        Msg::SessionRestored(Some(session)) => {
            if state.auth.restore(session) {
                state.route = guard(state.route, true);
                state.mark_dirty();
                vec![Effect::VerifySession]
            } else {
                Vec::new()
            }
        }
        Msg::SessionRestored(None) => Vec::new(),
        Msg::Started => {
            state.schedule_stats_poll();
            state.mark_dirty();
            initial_fetch()
        }

        Msg::PushConnected => {
            state.connected = true;
            state.show_banner("Connected to server", BannerKind::Success);
            Vec::new()
        }
        Msg::PushDisconnected => {
            state.connected = false;
            state.show_banner("Disconnected from server", BannerKind::Error);
            Vec::new()
        }
        Msg::AdsUpdate { batch, received_at } => reconcile(&mut state, batch, received_at),

        Msg::KeywordInputChanged(text) => {
            if state.ui.keyword_input != text {
                state.ui.keyword_input = text;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::AddKeywordSubmitted => {
            let keyword = state.ui.keyword_input.trim().to_string();
            if keyword.is_empty() {
                state.show_banner("Please enter a keyword", BannerKind::Error);
                Vec::new()
            } else if state.catalog.has_keyword(&keyword) {
                state.show_banner("This keyword is already being tracked", BannerKind::Error);
                Vec::new()
            } else {
                vec![Effect::AddKeyword { keyword }]
            }
        }
        Msg::DeleteKeywordClicked(keyword) => {
            if state.catalog.has_keyword(&keyword) {
                vec![Effect::DeleteKeyword { keyword }]
            } else {
                Vec::new()
            }
        }
        Msg::KeywordSelected(keyword) => select_keyword(&mut state, keyword),
        Msg::TabSelected(tab) => select_tab(&mut state, tab),
        Msg::SearchChanged(query) => {
            state.ui.search_query = query;
            state.ui.page = 1;
            state.mark_dirty();
            Vec::new()
        }
        Msg::SearchCleared => {
            if !state.ui.search_query.is_empty() || state.ui.page != 1 {
                state.ui.search_query.clear();
                state.ui.page = 1;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::NextPage => {
            turn_page(&mut state, 1);
            Vec::new()
        }
        Msg::PrevPage => {
            turn_page(&mut state, -1);
            Vec::new()
        }
        Msg::ChangeFilterSelected(filter) => {
            if state.ui.change_filter != filter {
                state.ui.change_filter = filter;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::FavoriteToggled { ad_id, at } => toggle_favorite(&mut state, &ad_id, at),
        Msg::ThemeToggled => {
            state.preferences.dark_mode = !state.preferences.dark_mode;
            state.mark_dirty();
            vec![Effect::PersistPreferences(state.preferences)]
        }
        Msg::NotificationsToggled => {
            state.preferences.notifications_enabled = !state.preferences.notifications_enabled;
            state.mark_dirty();
            vec![Effect::PersistPreferences(state.preferences)]
        }
        Msg::SoundToggled => {
            state.preferences.sound_enabled = !state.preferences.sound_enabled;
            state.mark_dirty();
            vec![Effect::PersistPreferences(state.preferences)]
        }
        Msg::PermissionRequested => match state.permission {
            NotificationPermission::Default => vec![Effect::RequestNotificationPermission],
            NotificationPermission::Granted | NotificationPermission::Denied => Vec::new(),
        },
        Msg::PermissionResolved(permission) => {
            state.permission = permission;
            state.mark_dirty();
            if permission == NotificationPermission::Granted
                && state.preferences.notifications_enabled
            {
                vec![Effect::ShowNotification {
                    title: NOTIFICATION_TITLE.to_string(),
                    body: "Notifications are now enabled!".to_string(),
                }]
            } else {
                Vec::new()
            }
        }
        Msg::PermissionRestored(permission) => {
            if state.permission != permission {
                state.permission = permission;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ManualCheckClicked => {
            if state.manual_check_in_flight {
                Vec::new()
            } else {
                state.manual_check_in_flight = true;
                state.show_banner("Checking for new ads...", BannerKind::Info);
                vec![Effect::ManualCheck]
            }
        }
        Msg::LoginSubmitted {
            username,
            password,
            remember_me,
        } => {
            if state.auth.begin_login() {
                state.mark_dirty();
                vec![Effect::Login {
                    username,
                    password,
                    remember_me,
                }]
            } else {
                Vec::new()
            }
        }
        Msg::LogoutClicked => logout(&mut state),
        Msg::Navigate(path) => {
            let target = guard(Route::from_path(&path), state.auth.is_authenticated());
            if state.route != target {
                state.route = target;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::UserUpdated(update) => match state.auth.update_user(update) {
            Some(session) => {
                let session = session.clone();
                state.mark_dirty();
                vec![Effect::PersistSession(Some(session))]
            }
            None => Vec::new(),
        },

        Msg::KeywordsLoaded(Ok(keywords)) => {
            state.catalog.set_keywords(keywords);
            if let Some(selected) = state.ui.selected_keyword.as_deref() {
                if !state.catalog.has_keyword(selected) {
                    state.ui.selected_keyword = None;
                    state.ui.search_query.clear();
                    state.ui.page = 1;
                }
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::KeywordsLoaded(Err(failure)) => {
            report_failure(&mut state, "Error fetching keywords", failure)
        }
        Msg::KeywordAdded {
            keyword,
            result: Ok(()),
        } => {
            if state.ui.keyword_input.trim() == keyword {
                state.ui.keyword_input.clear();
            }
            state.catalog.insert_keyword(&keyword);
            state.show_banner("Keyword added successfully", BannerKind::Success);
            vec![Effect::FetchKeywords]
        }
        Msg::KeywordAdded {
            result: Err(failure),
            ..
        } => report_failure(&mut state, "Error", failure),
        Msg::KeywordDeleted {
            keyword,
            result: Ok(()),
        } => {
            state.catalog.remove_keyword(&keyword);
            if state.ui.selected_keyword.as_deref() == Some(keyword.as_str()) {
                state.ui.selected_keyword = None;
                state.ui.search_query.clear();
                state.ui.page = 1;
            }
            state.show_banner("Keyword removed successfully", BannerKind::Success);
            vec![Effect::FetchKeywords]
        }
        Msg::KeywordDeleted {
            result: Err(failure),
            ..
        } => report_failure(&mut state, "Error", failure),
        Msg::RecentAdsLoaded {
            result: Ok(ads),
            highlight,
        } => {
            state.catalog.set_recent(ads);
            apply_highlights(&mut state, &highlight, |state, id| {
                state.catalog.recent().iter().any(|item| &item.ad.id == id)
            });
            state.mark_dirty();
            Vec::new()
        }
        Msg::RecentAdsLoaded {
            result: Err(failure),
            ..
        } => report_failure(&mut state, "Error fetching recent ads", failure),
        Msg::KeywordAdsLoaded {
            keyword,
            result: Ok(ads),
            highlight,
        } => {
            state.catalog.set_keyword_ads(&keyword, ads);
            apply_highlights(&mut state, &highlight, |state, id| {
                state
                    .catalog
                    .keyword_ads(&keyword)
                    .is_some_and(|ads| ads.iter().any(|ad| &ad.id == id))
            });
            if state.ui.selected_keyword.as_deref() == Some(keyword.as_str()) {
                state.clamp_page();
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::KeywordAdsLoaded {
            result: Err(failure),
            ..
        } => report_failure(&mut state, "Error fetching ads", failure),
        Msg::StatsLoaded(Ok(stats)) => {
            state.stats = Some(stats);
            state.mark_dirty();
            Vec::new()
        }
        Msg::StatsLoaded(Err(failure)) => {
            // Stats failures are not worth a banner unless the session died.
            if failure.kind == FailureKind::Unauthorized {
                report_failure(&mut state, "Error fetching stats", failure)
            } else {
                Vec::new()
            }
        }
        Msg::ManualCheckFinished(result) => {
            state.manual_check_in_flight = false;
            state.mark_dirty();
            match result {
                Ok(()) => {
                    state.show_banner("Manual check completed successfully", BannerKind::Success);
                    vec![
                        Effect::FetchRecent {
                            highlight: Vec::new(),
                        },
                        Effect::FetchStats,
                    ]
                }
                Err(failure) => report_failure(&mut state, "Error during manual check", failure),
            }
        }
        Msg::LoginFinished(Ok(session)) => {
            state.auth.login_succeeded(session.clone());
            state.route = guard(Route::Dashboard, true);
            state.mark_dirty();
            let mut effects = vec![Effect::PersistSession(Some(session))];
            effects.extend(initial_fetch());
            effects
        }
        Msg::LoginFinished(Err(_)) if state.auth.state() != SessionState::Authenticating => {
            Vec::new()
        }
        Msg::LoginFinished(Err(failure)) => {
            let message = match failure.kind {
                FailureKind::Rejected => failure.message,
                FailureKind::Network | FailureKind::Unauthorized => {
                    "Login failed. Please try again.".to_string()
                }
            };
            state.auth.login_failed(message);
            state.mark_dirty();
            Vec::new()
        }
        Msg::SessionVerified(Ok(user)) => match state.auth.verified(user) {
            Some(session) => {
                let session = session.clone();
                state.mark_dirty();
                vec![Effect::PersistSession(Some(session))]
            }
            None => Vec::new(),
        },
        Msg::SessionVerified(Err(_)) => logout(&mut state),
    };

    (state, effects)
}

fn initial_fetch() -> Vec<Effect> {
    vec![
        Effect::FetchKeywords,
        Effect::FetchRecent {
            highlight: Vec::new(),
        },
        Effect::FetchStats,
    ]
}

/// Merges one push batch into state and decides which views to refresh.
fn reconcile(state: &mut AppState, batch: UpdateBatch, received_at: String) -> Vec<Effect> {
    let timestamp = batch.timestamp.clone().unwrap_or(received_at);
    let tab = state.ui.tab;

    let mut new_ids: Vec<AdId> = Vec::new();
    for item in &batch.new_ads {
        if !new_ids.contains(&item.ad.id) {
            new_ids.push(item.ad.id.clone());
        }
    }

    let changes = batch
        .new_ads
        .iter()
        .map(|item| (ChangeKind::New, item))
        .chain(batch.deleted_ads.iter().map(|item| (ChangeKind::Deleted, item)));
    for (kind, item) in changes {
        let event = ChangeEvent {
            kind,
            keyword: item.keyword.clone(),
            ad: item.ad.clone(),
            timestamp: timestamp.clone(),
        };
        let selected = state.ui.selected_keyword.as_deref();
        if state.catalog.apply_change(&event, tab, selected) {
            state.highlight(&event.ad.id);
        }
        state.change_log.record(event);
    }

    let new_count = batch.new_ads.len();
    let deleted_count = batch.deleted_ads.len();
    match (new_count, deleted_count) {
        (0, 0) => {}
        (new, 0) => state.show_banner(
            format!("{new} new advertisement(s) found!"),
            BannerKind::Success,
        ),
        (0, deleted) => state.show_banner(
            format!("{deleted} advertisement(s) have been removed."),
            BannerKind::Info,
        ),
        (new, deleted) => state.show_banner(
            format!("{new} new advertisement(s) found, {deleted} removed."),
            BannerKind::Success,
        ),
    }

    let mut effects = Vec::new();
    if !new_ids.is_empty() {
        if state.preferences.sound_enabled {
            effects.push(Effect::PlaySound);
        }
        if state.preferences.notifications_enabled
            && state.permission == NotificationPermission::Granted
        {
            effects.push(Effect::ShowNotification {
                title: NOTIFICATION_TITLE.to_string(),
                body: "New advertisements found!".to_string(),
            });
        }
    }

    if batch.has_changes() {
        let highlight = if tab == Tab::Recent {
            new_ids.clone()
        } else {
            Vec::new()
        };
        effects.push(Effect::FetchRecent { highlight });
    }

    if tab == Tab::Keywords {
        if let Some(selected) = state.ui.selected_keyword.clone() {
            if batch.affected_keywords().any(|keyword| keyword == selected) {
                effects.push(Effect::FetchKeywordAds {
                    keyword: selected,
                    highlight: new_ids.clone(),
                });
            }
        }
    }

    if tab == Tab::Favorites || tab == Tab::Changes {
        state.mark_dirty();
    }

    if batch.has_changes() {
        effects.push(Effect::FetchStats);
    }
    effects.push(Effect::FetchKeywords);
    effects
}

fn select_keyword(state: &mut AppState, keyword: Option<String>) -> Vec<Effect> {
    let keyword = keyword
        .map(|keyword| keyword.trim().to_string())
        .filter(|keyword| !keyword.is_empty());
    state.ui.search_query.clear();
    state.ui.page = 1;
    state.mark_dirty();
    match keyword {
        Some(keyword) => {
            state.ui.selected_keyword = Some(keyword.clone());
            vec![Effect::FetchKeywordAds {
                keyword,
                highlight: Vec::new(),
            }]
        }
        None => {
            state.ui.selected_keyword = None;
            Vec::new()
        }
    }
}

fn select_tab(state: &mut AppState, tab: Tab) -> Vec<Effect> {
    state.ui.tab = tab;
    state.mark_dirty();
    if tab == Tab::Keywords && state.ui.selected_keyword.is_none() {
        if let Some(first) = state.catalog.keywords().first().cloned() {
            return select_keyword(state, Some(first));
        }
    }
    Vec::new()
}

fn turn_page(state: &mut AppState, delta: isize) {
    let total = crate::total_pages(state.filtered_keyword_ads().len()).max(1);
    let next = state.ui.page.saturating_add_signed(delta).clamp(1, total);
    if next != state.ui.page {
        state.ui.page = next;
        state.mark_dirty();
    }
}

fn toggle_favorite(state: &mut AppState, id: &AdId, at: String) -> Vec<Effect> {
    let ad = state
        .favorites
        .get(id)
        .map(|entry| &entry.ad)
        .or_else(|| state.catalog.find_ad(id))
        .or_else(|| state.change_log.find_ad(id))
        .cloned();
    let Some(ad) = ad else {
        return Vec::new();
    };

    let title = display_title(&ad);
    if state.favorites.toggle(ad, at) {
        state.show_banner(format!("Added \"{title}\" to favorites"), BannerKind::Success);
    } else {
        state.show_banner(format!("Removed \"{title}\" from favorites"), BannerKind::Info);
    }
    vec![Effect::PersistFavorites(state.favorites.clone())]
}

fn logout(state: &mut AppState) -> Vec<Effect> {
    let token = state.auth.logout();
    state.route = guard(state.route, false);
    state.mark_dirty();
    let mut effects = Vec::new();
    if let Some(access_token) = token {
        effects.push(Effect::Logout { access_token });
    }
    effects.push(Effect::PersistSession(None));
    effects
}

/// Highlights ids from `ids` that `present` reports as loaded.
fn apply_highlights(
    state: &mut AppState,
    ids: &[AdId],
    present: impl Fn(&AppState, &AdId) -> bool,
) {
    for id in ids {
        if present(state, id) {
            state.highlight(id);
        }
    }
}

/// Surfaces a failed request. A 401 on an authenticated session tears it down.
fn report_failure(state: &mut AppState, context: &str, failure: RequestFailure) -> Vec<Effect> {
    match failure.kind {
        FailureKind::Unauthorized if state.auth.is_authenticated() => {
            state.auth.expire();
            state.route = Route::Login;
            state.mark_dirty();
            vec![Effect::PersistSession(None)]
        }
        FailureKind::Rejected => {
            state.show_banner(failure.message, BannerKind::Error);
            Vec::new()
        }
        FailureKind::Network | FailureKind::Unauthorized => {
            state.show_banner(format!("{context}: {}", failure.message), BannerKind::Error);
            Vec::new()
        }
    }
}
