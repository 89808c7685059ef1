use std::sync::Once;

use pretty_assertions::assert_eq;
use tracker_core::{
    update, Ad, AdId, AppState, BannerKind, ChangeFilter, ChangeKind, Effect, KeywordAd, Msg,
    NotificationPermission, RequestFailure, SystemStats, Tab, UpdateBatch, CHANGE_LOG_CAP,
    HIGHLIGHT_WINDOW_MS,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

fn keyword_ad(keyword: &str, id: &str, title: &str) -> KeywordAd {
    KeywordAd {
        keyword: keyword.to_string(),
        ad: Ad::titled(id, title),
    }
}

fn batch(new_ads: Vec<KeywordAd>, deleted_ads: Vec<KeywordAd>) -> Msg {
    Msg::AdsUpdate {
        batch: UpdateBatch {
            timestamp: Some("2026-03-01T10:00:00".to_string()),
            keywords_with_changes: new_ads
                .iter()
                .chain(deleted_ads.iter())
                .map(|item| item.keyword.clone())
                .collect(),
            new_ads,
            deleted_ads,
        },
        received_at: "2026-03-01T10:00:05".to_string(),
    }
}

fn loaded_dashboard() -> AppState {
    let (state, _) = update(AppState::new(), Msg::KeywordsLoaded(Ok(vec!["laptop".into()])));
    let (state, _) = update(
        state,
        Msg::RecentAdsLoaded {
            result: Ok(vec![keyword_ad("laptop", "1", "Old ThinkPad")]),
            highlight: Vec::new(),
        },
    );
    state
}

#[test]
fn new_ad_on_recent_tab_is_prepended_highlighted_and_logged() {
    init_logging();
    let state = loaded_dashboard();

    let (mut state, effects) = update(
        state,
        batch(vec![keyword_ad("laptop", "42", "ThinkPad X1")], Vec::new()),
    );

    let id = AdId::from("42");
    let recent = state.catalog().recent();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].ad.id, id);
    assert!(state.is_highlighted(&id));
    assert!(state.consume_dirty());

    let logged: Vec<_> = state.change_log().iter().collect();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].kind, ChangeKind::New);
    assert_eq!(logged[0].keyword, "laptop");
    assert_eq!(logged[0].timestamp, "2026-03-01T10:00:00");

    let view = state.view();
    let banner = view.banner.expect("banner");
    assert_eq!(banner.message, "1 new advertisement(s) found!");
    assert_eq!(banner.kind, BannerKind::Success);
    assert!(view.recent[0].is_new);

    assert_eq!(
        effects,
        vec![
            Effect::PlaySound,
            Effect::FetchRecent {
                highlight: vec![id.clone()],
            },
            Effect::FetchStats,
            Effect::FetchKeywords,
        ]
    );

    let (state, _) = update(
        state,
        Msg::Tick {
            now_ms: HIGHLIGHT_WINDOW_MS + 1,
        },
    );
    assert!(!state.is_highlighted(&id));
    assert!(state.view().banner.is_none());
    assert_eq!(state.change_log().len(), 1);
}

#[test]
fn highlight_window_is_not_extended_by_repeat_pushes() {
    init_logging();
    let state = loaded_dashboard();
    let (state, _) = update(state, batch(vec![keyword_ad("laptop", "42", "X1")], Vec::new()));
    let (state, _) = update(state, Msg::Tick { now_ms: 6_000 });
    let (state, _) = update(state, batch(vec![keyword_ad("laptop", "42", "X1")], Vec::new()));

    // Already present in the recent list, so no second insert either.
    assert_eq!(state.catalog().recent().len(), 2);

    let (state, _) = update(state, Msg::Tick { now_ms: 10_500 });
    assert!(!state.is_highlighted(&AdId::from("42")));
}

#[test]
fn deleted_ad_is_hidden_from_refetched_lists() {
    init_logging();
    let state = loaded_dashboard();

    let (state, effects) = update(
        state,
        batch(Vec::new(), vec![keyword_ad("laptop", "1", "Old ThinkPad")]),
    );
    assert!(!effects.contains(&Effect::PlaySound));
    assert_eq!(
        state.view().banner.map(|banner| banner.message),
        Some("1 advertisement(s) have been removed.".to_string())
    );

    let (state, _) = update(
        state,
        Msg::RecentAdsLoaded {
            result: Ok(vec![
                keyword_ad("laptop", "1", "Old ThinkPad"),
                keyword_ad("laptop", "2", "Dell"),
            ]),
            highlight: Vec::new(),
        },
    );
    let ids: Vec<&str> = state
        .catalog()
        .recent()
        .iter()
        .map(|item| item.ad.id.as_str())
        .collect();
    assert_eq!(ids, vec!["2"]);
}

#[test]
fn notification_requires_granted_permission() {
    init_logging();
    let state = loaded_dashboard();
    let (state, _) = update(
        state,
        Msg::PermissionResolved(NotificationPermission::Granted),
    );
    let (state, _) = update(state, Msg::SoundToggled);

    let (_state, effects) = update(state, batch(vec![keyword_ad("laptop", "9", "Acer")], Vec::new()));

    assert!(!effects.contains(&Effect::PlaySound));
    assert!(effects.iter().any(|effect| matches!(
        effect,
        Effect::ShowNotification { body, .. } if body == "New advertisements found!"
    )));
}

#[test]
fn keywords_tab_refetches_only_the_selected_affected_keyword() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::KeywordsLoaded(Ok(vec!["laptop".into(), "phone".into()])),
    );
    let (state, effects) = update(state, Msg::TabSelected(Tab::Keywords));
    assert_eq!(
        effects,
        vec![Effect::FetchKeywordAds {
            keyword: "laptop".into(),
            highlight: Vec::new(),
        }]
    );
    let (state, _) = update(
        state,
        Msg::KeywordAdsLoaded {
            keyword: "laptop".into(),
            result: Ok(vec![Ad::titled("1", "ThinkPad")]),
            highlight: Vec::new(),
        },
    );

    let (state, effects) = update(state, batch(vec![keyword_ad("phone", "5", "Pixel")], Vec::new()));
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::FetchKeywordAds { .. })));
    assert_eq!(
        effects.iter().find(|effect| matches!(effect, Effect::FetchRecent { .. })),
        Some(&Effect::FetchRecent {
            highlight: Vec::new()
        })
    );

    let (state, effects) = update(state, batch(vec![keyword_ad("laptop", "6", "X13")], Vec::new()));
    assert!(effects.contains(&Effect::FetchKeywordAds {
        keyword: "laptop".into(),
        highlight: vec![AdId::from("6")],
    }));
    let ads = state.catalog().keyword_ads("laptop").expect("laptop ads");
    assert_eq!(ads[0].id, AdId::from("6"));
    assert!(state.is_highlighted(&AdId::from("6")));
}

#[test]
fn change_log_keeps_newest_hundred() {
    init_logging();
    let mut state = AppState::new();
    for i in 0..(CHANGE_LOG_CAP + 5) {
        let id = i.to_string();
        (state, _) = update(state, batch(vec![keyword_ad("laptop", &id, "ad")], Vec::new()));
    }

    assert_eq!(state.change_log().len(), CHANGE_LOG_CAP);
    let newest = state.change_log().iter().next().expect("entry");
    assert_eq!(newest.ad.id.as_str(), (CHANGE_LOG_CAP + 4).to_string());

    let (state, _) = update(state, Msg::ChangeFilterSelected(ChangeFilter::Deleted));
    let view = state.view();
    assert!(view.changes.rows.is_empty());
    assert_eq!(view.changes.empty_message, Some("No deleted ads detected yet."));
}

#[test]
fn empty_batch_only_refreshes_keywords() {
    init_logging();
    let (mut state, effects) = update(AppState::new(), batch(Vec::new(), Vec::new()));

    assert_eq!(effects, vec![Effect::FetchKeywords]);
    assert!(state.change_log().is_empty());
    assert!(!state.consume_dirty());
}

#[test]
fn favorites_tab_redraws_on_any_batch() {
    init_logging();
    let (mut state, _) = update(loaded_dashboard(), Msg::TabSelected(Tab::Favorites));
    state.consume_dirty();

    let (mut state, effects) = update(state, batch(Vec::new(), Vec::new()));
    assert_eq!(effects, vec![Effect::FetchKeywords]);
    assert!(state.consume_dirty());
}

#[test]
fn deleted_favorite_stays_in_favorites() {
    init_logging();
    let (state, _) = update(
        loaded_dashboard(),
        Msg::FavoriteToggled {
            ad_id: AdId::from("1"),
            at: "2026-03-01T09:00:00".into(),
        },
    );
    let (state, _) = update(state, Msg::TabSelected(Tab::Favorites));

    let (state, _) = update(
        state,
        batch(Vec::new(), vec![keyword_ad("laptop", "1", "Old ThinkPad")]),
    );
    let (state, _) = update(
        state,
        Msg::RecentAdsLoaded {
            result: Ok(vec![keyword_ad("laptop", "1", "Old ThinkPad")]),
            highlight: Vec::new(),
        },
    );

    assert!(state.catalog().recent().is_empty());
    let view = state.view();
    let favorites: Vec<&str> = view.favorites.iter().map(|card| card.id.as_str()).collect();
    assert_eq!(favorites, vec!["1"]);
    assert!(!view.favorites_empty);
}

#[test]
fn failed_refetch_keeps_cache_and_other_results() {
    init_logging();
    let (state, effects) = update(
        loaded_dashboard(),
        batch(vec![keyword_ad("laptop", "42", "ThinkPad X1")], Vec::new()),
    );
    assert!(effects.contains(&Effect::FetchStats));

    let (state, effects) = update(
        state,
        Msg::RecentAdsLoaded {
            result: Err(RequestFailure::network("timeout")),
            highlight: vec![AdId::from("42")],
        },
    );
    assert!(effects.is_empty());
    let ids: Vec<&str> = state
        .catalog()
        .recent()
        .iter()
        .map(|item| item.ad.id.as_str())
        .collect();
    assert_eq!(ids, vec!["42", "1"]);
    let banner = state.view().banner.expect("banner");
    assert_eq!(banner.message, "Error fetching recent ads: timeout");
    assert_eq!(banner.kind, BannerKind::Error);

    let (state, _) = update(state, Msg::StatsLoaded(Ok(SystemStats::default())));
    let (state, _) = update(
        state,
        Msg::KeywordsLoaded(Ok(vec!["laptop".into(), "phone".into()])),
    );
    assert!(state.view().stats.is_some());
    assert_eq!(state.catalog().keywords(), ["laptop", "phone"]);
    assert_eq!(state.catalog().recent().len(), 2);
}

#[test]
fn mixed_batch_logs_every_change_newest_first() {
    init_logging();
    let (state, effects) = update(
        loaded_dashboard(),
        batch(
            vec![
                keyword_ad("laptop", "42", "ThinkPad X1"),
                keyword_ad("laptop", "43", "ThinkPad T14"),
            ],
            vec![keyword_ad("laptop", "1", "Old ThinkPad")],
        ),
    );

    let banner = state.view().banner.expect("banner");
    assert_eq!(banner.message, "2 new advertisement(s) found, 1 removed.");
    assert_eq!(banner.kind, BannerKind::Success);

    let logged: Vec<(ChangeKind, &str)> = state
        .change_log()
        .iter()
        .map(|event| (event.kind, event.ad.id.as_str()))
        .collect();
    assert_eq!(
        logged,
        vec![
            (ChangeKind::Deleted, "1"),
            (ChangeKind::New, "43"),
            (ChangeKind::New, "42"),
        ]
    );
    assert!(effects.contains(&Effect::FetchRecent {
        highlight: vec![AdId::from("42"), AdId::from("43")],
    }));
}

#[test]
fn restored_permission_enables_notifications_silently() {
    init_logging();
    let (state, effects) = update(
        loaded_dashboard(),
        Msg::PermissionRestored(NotificationPermission::Granted),
    );
    assert!(effects.is_empty());
    assert!(!state.view().show_permission_prompt);

    let (_state, effects) = update(state, batch(vec![keyword_ad("laptop", "9", "Acer")], Vec::new()));
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, Effect::ShowNotification { .. })));
}
