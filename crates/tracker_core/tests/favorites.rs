use std::sync::Once;

use tracker_core::{update, Ad, AdId, AppState, Effect, KeywordAd, Msg, Tab};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

fn with_recent(ads: &[(&str, &str)]) -> AppState {
    let items = ads
        .iter()
        .map(|(id, title)| KeywordAd {
            keyword: "laptop".into(),
            ad: Ad::titled(*id, title),
        })
        .collect();
    let (state, _) = update(
        AppState::new(),
        Msg::RecentAdsLoaded {
            result: Ok(items),
            highlight: Vec::new(),
        },
    );
    state
}

fn toggle(state: AppState, id: &str, at: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::FavoriteToggled {
            ad_id: AdId::from(id),
            at: at.to_string(),
        },
    )
}

#[test]
fn toggling_twice_restores_favorites() {
    init_logging();
    let state = with_recent(&[("7", "ThinkPad")]);
    let before = state.favorites().clone();

    let (state, effects) = toggle(state, "7", "2026-03-01T10:00:00");
    assert!(state.favorites().contains(&AdId::from("7")));
    assert_eq!(effects, vec![Effect::PersistFavorites(state.favorites().clone())]);
    assert_eq!(
        state.view().banner.map(|banner| banner.message),
        Some("Added \"ThinkPad\" to favorites".to_string())
    );

    let (state, effects) = toggle(state, "7", "2026-03-01T10:01:00");
    assert_eq!(state.favorites(), &before);
    assert_eq!(effects, vec![Effect::PersistFavorites(before)]);
}

#[test]
fn favorites_are_listed_newest_first_and_survive_catalog_changes() {
    init_logging();
    let state = with_recent(&[("1", "Older"), ("2", "Newer")]);
    let (state, _) = toggle(state, "1", "2026-03-01T09:00:00");
    let (state, _) = toggle(state, "2", "2026-03-01T11:00:00");

    let (state, _) = update(
        state,
        Msg::RecentAdsLoaded {
            result: Ok(Vec::new()),
            highlight: Vec::new(),
        },
    );
    let (state, _) = update(state, Msg::TabSelected(Tab::Favorites));

    let view = state.view();
    let titles: Vec<&str> = view.favorites.iter().map(|card| card.title.as_str()).collect();
    assert_eq!(titles, vec!["Newer", "Older"]);
    assert!(view.favorites.iter().all(|card| card.is_favorite));

    // Unstarring works from the favorites list even though the catalog no longer holds the ad.
    let (state, _) = toggle(state, "1", "2026-03-01T12:00:00");
    assert_eq!(state.favorites().len(), 1);
}

#[test]
fn unknown_ad_is_ignored() {
    init_logging();
    let (state, effects) = toggle(AppState::new(), "404", "2026-03-01T10:00:00");
    assert!(effects.is_empty());
    assert!(state.favorites().is_empty());
}
