//! Line commands typed at the dashboard prompt.

use tracker_core::{AdId, ChangeFilter, Msg, Tab};

pub const HELP: &str = "\
commands:
  add <keyword>            track a keyword
  del <keyword>            stop tracking a keyword
  select [keyword]         show ads for a keyword (empty clears)
  tab <recent|keywords|favorites|changes>
  search <text> | clear    filter the keyword view
  next | prev              page through the keyword view
  fav <ad-id>              toggle a favorite
  filter <all|new|deleted> filter the change log
  theme | notifications | sound | permission
  check                    run a manual check now
  login <user> <password> [remember]
  logout | go <path> | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Msg(Msg),
    /// Needs the wall-clock time of the click, which the caller stamps.
    ToggleFavorite(AdId),
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "add" => Command::Msg(Msg::KeywordInputChanged(rest.to_string())),
        "del" | "delete" => require(rest, "del <keyword>", |keyword| {
            Msg::DeleteKeywordClicked(keyword.to_string())
        }),
        "select" => Command::Msg(Msg::KeywordSelected(
            (!rest.is_empty()).then(|| rest.to_string()),
        )),
        "tab" => match parse_tab(rest) {
            Some(tab) => Command::Msg(Msg::TabSelected(tab)),
            None => Command::Invalid(format!("unknown tab {rest:?}")),
        },
        "search" => Command::Msg(Msg::SearchChanged(rest.to_string())),
        "clear" => Command::Msg(Msg::SearchCleared),
        "next" => Command::Msg(Msg::NextPage),
        "prev" => Command::Msg(Msg::PrevPage),
        "fav" => match rest {
            "" => Command::Invalid("usage: fav <ad-id>".to_string()),
            id => Command::ToggleFavorite(AdId::new(id)),
        },
        "filter" => match parse_filter(rest) {
            Some(filter) => Command::Msg(Msg::ChangeFilterSelected(filter)),
            None => Command::Invalid(format!("unknown filter {rest:?}")),
        },
        "theme" => Command::Msg(Msg::ThemeToggled),
        "notifications" => Command::Msg(Msg::NotificationsToggled),
        "sound" => Command::Msg(Msg::SoundToggled),
        "permission" => Command::Msg(Msg::PermissionRequested),
        "check" => Command::Msg(Msg::ManualCheckClicked),
        "login" => parse_login(rest),
        "logout" => Command::Msg(Msg::LogoutClicked),
        "go" => {
            let path = if rest.is_empty() { "/" } else { rest };
            Command::Msg(Msg::Navigate(path.to_string()))
        }
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Invalid(format!("unknown command {other:?}; type help")),
    };
    Some(command)
}

/// `add` is two messages: fill the input, then submit it.
pub fn expand(command_msg: Msg) -> Vec<Msg> {
    match command_msg {
        Msg::KeywordInputChanged(text) => {
            vec![Msg::KeywordInputChanged(text), Msg::AddKeywordSubmitted]
        }
        other => vec![other],
    }
}

fn require(rest: &str, usage: &str, build: impl FnOnce(&str) -> Msg) -> Command {
    if rest.is_empty() {
        Command::Invalid(format!("usage: {usage}"))
    } else {
        Command::Msg(build(rest))
    }
}

fn parse_tab(name: &str) -> Option<Tab> {
    match name.to_ascii_lowercase().as_str() {
        "recent" => Some(Tab::Recent),
        "keywords" => Some(Tab::Keywords),
        "favorites" => Some(Tab::Favorites),
        "changes" => Some(Tab::Changes),
        _ => None,
    }
}

fn parse_filter(name: &str) -> Option<ChangeFilter> {
    match name.to_ascii_lowercase().as_str() {
        "all" | "" => Some(ChangeFilter::All),
        "new" => Some(ChangeFilter::New),
        "deleted" => Some(ChangeFilter::Deleted),
        _ => None,
    }
}

fn parse_login(rest: &str) -> Command {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(username), Some(password), remember) => Command::Msg(Msg::LoginSubmitted {
            username: username.to_string(),
            password: password.to_string(),
            remember_me: remember == Some("remember"),
        }),
        _ => Command::Invalid("usage: login <user> <password> [remember]".to_string()),
    }
}
