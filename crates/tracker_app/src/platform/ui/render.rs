use tracker_core::{
    AdCardView, AppViewModel, BannerKind, ChangeFilter, ChangeKind, ChangesView,
    KeywordSectionView, Route, SessionState, Tab,
};

const RULE: &str = "------------------------------------------------------------";

/// Projects the view model onto terminal lines, one screen per redraw.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = vec![RULE.to_string(), header(view)];

    if let Some(banner) = &view.banner {
        let tag = match banner.kind {
            BannerKind::Info => "info",
            BannerKind::Success => "ok",
            BannerKind::Error => "error",
        };
        lines.push(format!("[{tag}] {}", banner.message));
    }
    if let Some(error) = &view.auth_error {
        lines.push(format!("[login] {error}"));
    }

    match view.route {
        Route::Home => lines.push("Welcome. Type `go /login` to sign in.".to_string()),
        Route::Login => lines.push("Sign in with: login <user> <password> [remember]".to_string()),
        Route::Register => lines.push("Registration happens on the web dashboard.".to_string()),
        Route::Dashboard => render_dashboard(view, &mut lines),
    }
    lines
}

fn header(view: &AppViewModel) -> String {
    let session = match (&view.session, &view.user_name) {
        (SessionState::Authenticated, Some(name)) => format!("signed in as {name}"),
        (SessionState::Authenticating, _) => "signing in...".to_string(),
        (SessionState::Expired, _) => "session expired".to_string(),
        _ => "signed out".to_string(),
    };
    format!(
        "Bazos Ad Tracker | {} | {} | theme: {} | notifications: {} | sound: {}",
        if view.connected { "live" } else { "offline" },
        session,
        if view.dark_mode { "dark" } else { "light" },
        on_off(view.notifications_enabled),
        on_off(view.sound_enabled),
    )
}

fn render_dashboard(view: &AppViewModel, lines: &mut Vec<String>) {
    if view.show_permission_prompt {
        lines.push("Desktop notifications are off; type `permission` to allow them.".to_string());
    }
    if let Some(stats) = &view.stats {
        lines.push(format!(
            "Checks: {} (avg {}) | Ads found: {} | Uptime: {} min{}",
            stats.total_checks,
            stats.avg_duration,
            stats.total_ads,
            stats.uptime_minutes,
            if view.manual_check_enabled { "" } else { " | checking..." },
        ));
    }
    lines.push(tab_bar(view.tab));

    match view.tab {
        Tab::Recent => {
            lines.push("Recent ads".to_string());
            push_cards(lines, &view.recent, view.recent_empty_message);
        }
        Tab::Keywords => render_keywords(view, lines),
        Tab::Favorites => {
            lines.push("Favorites".to_string());
            push_cards(
                lines,
                &view.favorites,
                view.favorites_empty.then_some("No favorite ads yet"),
            );
        }
        Tab::Changes => render_changes(&view.changes, lines),
    }
}

fn tab_bar(active: Tab) -> String {
    [
        (Tab::Recent, "recent"),
        (Tab::Keywords, "keywords"),
        (Tab::Favorites, "favorites"),
        (Tab::Changes, "changes"),
    ]
    .iter()
    .map(|(tab, name)| {
        if *tab == active {
            format!("[{name}]")
        } else {
            name.to_string()
        }
    })
    .collect::<Vec<_>>()
    .join("  ")
}

fn render_keywords(view: &AppViewModel, lines: &mut Vec<String>) {
    match view.keywords_empty_message {
        Some(message) => lines.push(message.to_string()),
        None => lines.push(format!("Tracked: {}", view.keywords.join(", "))),
    }
    if view.keyword_filter.selected.is_none() {
        lines.push(format!("{} (select <keyword>)", view.keyword_filter.placeholder));
    }
    render_keyword_section(&view.keyword_section, lines);
}

fn render_keyword_section(section: &KeywordSectionView, lines: &mut Vec<String>) {
    lines.push(section.heading.clone());
    if section.loading {
        lines.push("Loading...".to_string());
        return;
    }
    if !section.search_query.is_empty() {
        lines.push(format!(
            "Search \"{}\": {}",
            section.search_query, section.results_label
        ));
    }
    push_cards(lines, &section.cards, section.empty_message);
    let pagination = &section.pagination;
    if pagination.visible {
        lines.push(format!(
            "{}Page {} of {}{}",
            if pagination.prev_enabled { "< prev  " } else { "" },
            pagination.current_page,
            pagination.total_pages,
            if pagination.next_enabled { "  next >" } else { "" },
        ));
    }
}

fn render_changes(changes: &ChangesView, lines: &mut Vec<String>) {
    let filter = match changes.filter {
        ChangeFilter::All => "all",
        ChangeFilter::New => "new",
        ChangeFilter::Deleted => "deleted",
    };
    lines.push(format!("Change log (filter: {filter})"));
    if let Some(message) = changes.empty_message {
        lines.push(message.to_string());
    }
    for row in &changes.rows {
        let marker = match row.kind {
            ChangeKind::New => '+',
            ChangeKind::Deleted => '-',
        };
        lines.push(format!("{marker} {} ({})", row.headline, row.timestamp));
        lines.push(format!("    {} | {} | {}", row.ad_id.as_str(), row.title, row.price));
        if let Some(link) = &row.link {
            lines.push(format!("    {link}"));
        }
    }
}

fn push_cards(lines: &mut Vec<String>, cards: &[AdCardView], empty: Option<&str>) {
    if cards.is_empty() {
        if let Some(message) = empty {
            lines.push(message.to_string());
        }
        return;
    }
    for card in cards {
        let mut title = format!(
            "{}{} {} | {}",
            if card.is_favorite { "* " } else { "  " },
            card.id.as_str(),
            card.title,
            card.price
        );
        if let Some(keyword) = &card.keyword_label {
            title.push_str(&format!(" | {keyword}"));
        }
        if card.is_new {
            title.push_str(" | NEW");
        }
        lines.push(title);
        lines.push(format!("    {} | {}", card.date_added, card.link));
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
