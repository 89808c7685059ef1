use url::Url;

use crate::{StoredSession, User, UserUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated,
    /// A request came back 401; credentials were dropped.
    Expired,
}

/// Session/auth store: the state machine plus the credentials it guards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthStore {
    state: SessionState,
    session: Option<StoredSession>,
    error: Option<String>,
}

impl AuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated && self.session.is_some()
    }

    pub fn session(&self) -> Option<&StoredSession> {
        self.session.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|session| &session.user)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|session| session.tokens.access_token.as_str())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Starts a login from a signed-out store. Returns `false` while a login
    /// is in flight or a session is active.
    pub fn begin_login(&mut self) -> bool {
        match self.state {
            SessionState::Anonymous | SessionState::Expired => {}
            SessionState::Authenticating | SessionState::Authenticated => return false,
        }
        self.state = SessionState::Authenticating;
        self.error = None;
        true
    }

    pub fn login_succeeded(&mut self, session: StoredSession) {
        self.state = SessionState::Authenticated;
        self.session = Some(session);
        self.error = None;
    }

    pub fn login_failed(&mut self, message: impl Into<String>) {
        self.state = SessionState::Anonymous;
        self.session = None;
        self.error = Some(message.into());
    }

    /// Rehydrates persisted credentials. Only applies to a signed-out store.
    pub fn restore(&mut self, session: StoredSession) -> bool {
        match self.state {
            SessionState::Anonymous | SessionState::Expired => {
                self.state = SessionState::Authenticated;
                self.session = Some(session);
                true
            }
            SessionState::Authenticating | SessionState::Authenticated => false,
        }
    }

    /// Verification round-trip succeeded; refresh the cached profile.
    pub fn verified(&mut self, user: User) -> Option<&StoredSession> {
        let session = self.session.as_mut()?;
        session.user = user;
        Some(session)
    }

    pub fn update_user(&mut self, update: UserUpdate) -> Option<&StoredSession> {
        let session = self.session.as_mut()?;
        session.user.merge(update);
        Some(session)
    }

    /// Clears credentials. Returns the token that was in use, if any.
    pub fn logout(&mut self) -> Option<String> {
        self.state = SessionState::Anonymous;
        self.error = None;
        self.session
            .take()
            .map(|session| session.tokens.access_token)
    }

    pub fn expire(&mut self) {
        self.state = SessionState::Expired;
        self.session = None;
        self.error = Some("Your session has expired. Please log in again.".to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Home,
    Login,
    Register,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    RequiresAuth,
    RequiresGuest,
}

impl Route {
    /// Resolves a path; unknown paths fall back to home.
    pub fn from_path(path: &str) -> Route {
        let Ok(base) = Url::parse("http://localhost/") else {
            return Route::Home;
        };
        let Ok(url) = base.join(path.trim()) else {
            return Route::Home;
        };
        match url.path().trim_end_matches('/') {
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/dashboard" => Route::Dashboard,
            _ => Route::Home,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/dashboard",
        }
    }

    pub fn access(self) -> RouteAccess {
        match self {
            Route::Home => RouteAccess::Public,
            Route::Login | Route::Register => RouteAccess::RequiresGuest,
            Route::Dashboard => RouteAccess::RequiresAuth,
        }
    }
}

/// Where navigation to `target` actually lands.
pub fn guard(target: Route, authenticated: bool) -> Route {
    match target.access() {
        RouteAccess::Public => target,
        RouteAccess::RequiresAuth if !authenticated => Route::Login,
        RouteAccess::RequiresGuest if authenticated => Route::Dashboard,
        RouteAccess::RequiresAuth | RouteAccess::RequiresGuest => target,
    }
}
