use std::sync::Once;

use pretty_assertions::assert_eq;
use tracker_core::{
    update, AppState, AuthTokens, Effect, Msg, RequestFailure, Route, SessionState,
    StoredSession, User, UserUpdate,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

fn session() -> StoredSession {
    StoredSession {
        tokens: AuthTokens {
            access_token: "token-1".into(),
            refresh_token: Some("refresh-1".into()),
        },
        user: User {
            id: 3,
            username: "ana".into(),
            email: "ana@example.com".into(),
            ..User::default()
        },
    }
}

fn logged_in() -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::LoginSubmitted {
            username: "ana".into(),
            password: "secret".into(),
            remember_me: true,
        },
    );
    let (state, _) = update(state, Msg::LoginFinished(Ok(session())));
    state
}

#[test]
fn login_persists_session_and_loads_dashboard() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::LoginSubmitted {
            username: "ana".into(),
            password: "secret".into(),
            remember_me: false,
        },
    );
    assert_eq!(state.auth().state(), SessionState::Authenticating);
    assert_eq!(
        effects,
        vec![Effect::Login {
            username: "ana".into(),
            password: "secret".into(),
            remember_me: false,
        }]
    );

    let (state, effects) = update(state, Msg::LoginFinished(Ok(session())));
    assert!(state.auth().is_authenticated());
    assert_eq!(state.route(), Route::Dashboard);
    assert_eq!(effects[0], Effect::PersistSession(Some(session())));
    assert!(effects.contains(&Effect::FetchKeywords));
    assert_eq!(state.view().user_name.as_deref(), Some("ana"));
}

#[test]
fn rejected_login_shows_server_message() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::LoginSubmitted {
            username: "ana".into(),
            password: "wrong".into(),
            remember_me: false,
        },
    );
    let (state, _) = update(
        state,
        Msg::LoginFinished(Err(RequestFailure::rejected("Invalid username or password"))),
    );
    assert_eq!(state.auth().state(), SessionState::Anonymous);
    assert_eq!(state.view().auth_error.as_deref(), Some("Invalid username or password"));
}

#[test]
fn unauthorized_response_expires_session() {
    init_logging();
    let state = logged_in();

    let (state, effects) = update(
        state,
        Msg::KeywordsLoaded(Err(RequestFailure::unauthorized())),
    );

    assert_eq!(state.auth().state(), SessionState::Expired);
    assert_eq!(state.route(), Route::Login);
    assert_eq!(effects, vec![Effect::PersistSession(None)]);
    assert_eq!(
        state.view().auth_error.as_deref(),
        Some("Your session has expired. Please log in again.")
    );

    let (state, _) = update(state, Msg::Navigate("/dashboard".into()));
    assert_eq!(state.route(), Route::Login);
}

#[test]
fn restored_session_is_verified_and_failed_verification_logs_out() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::SessionRestored(Some(session())));
    assert!(state.auth().is_authenticated());
    assert_eq!(effects, vec![Effect::VerifySession]);

    let (state, effects) = update(
        state,
        Msg::SessionVerified(Err(RequestFailure::unauthorized())),
    );
    assert!(!state.auth().is_authenticated());
    assert_eq!(
        effects,
        vec![
            Effect::Logout {
                access_token: "token-1".into()
            },
            Effect::PersistSession(None),
        ]
    );
}

#[test]
fn guards_redirect_navigation() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::Navigate("/dashboard".into()));
    assert_eq!(state.route(), Route::Login);

    let state = logged_in();
    let (state, _) = update(state, Msg::Navigate("/register".into()));
    assert_eq!(state.route(), Route::Dashboard);
    let (state, _) = update(state, Msg::Navigate("/".into()));
    assert_eq!(state.route(), Route::Home);
}

#[test]
fn user_update_is_merged_and_persisted() {
    init_logging();
    let (state, effects) = update(
        logged_in(),
        Msg::UserUpdated(UserUpdate {
            keywords_count: Some(4),
            ..UserUpdate::default()
        }),
    );
    let user = state.auth().user().expect("user");
    assert_eq!(user.keywords_count, 4);
    assert_eq!(user.username, "ana");
    assert!(matches!(effects.as_slice(), [Effect::PersistSession(Some(_))]));
}

#[test]
fn logout_clears_credentials() {
    init_logging();
    let (state, effects) = update(logged_in(), Msg::LogoutClicked);
    assert_eq!(state.auth().state(), SessionState::Anonymous);
    assert_eq!(state.route(), Route::Login);
    assert_eq!(
        effects,
        vec![
            Effect::Logout {
                access_token: "token-1".into()
            },
            Effect::PersistSession(None),
        ]
    );
}

#[test]
fn login_is_refused_while_signed_in() {
    init_logging();
    let (state, effects) = update(
        logged_in(),
        Msg::LoginSubmitted {
            username: "bob".into(),
            password: "other".into(),
            remember_me: false,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.auth().state(), SessionState::Authenticated);

    // A failure with no login in flight leaves the session alone.
    let (state, effects) = update(
        state,
        Msg::LoginFinished(Err(RequestFailure::rejected("Invalid username or password"))),
    );
    assert!(effects.is_empty());
    assert!(state.auth().is_authenticated());
    assert_eq!(state.auth().access_token(), Some("token-1"));

    let (state, effects) = update(state, Msg::KeywordsLoaded(Err(RequestFailure::unauthorized())));
    assert_eq!(state.auth().state(), SessionState::Expired);
    assert_eq!(effects, vec![Effect::PersistSession(None)]);
}

#[test]
fn login_can_start_again_after_expiry() {
    init_logging();
    let (state, _) = update(logged_in(), Msg::KeywordsLoaded(Err(RequestFailure::unauthorized())));
    let (state, effects) = update(
        state,
        Msg::LoginSubmitted {
            username: "ana".into(),
            password: "secret".into(),
            remember_me: false,
        },
    );
    assert_eq!(state.auth().state(), SessionState::Authenticating);
    assert_eq!(effects.len(), 1);
}
