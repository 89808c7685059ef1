use std::fmt;

use tracker_core::{Ad, AdId, KeywordAd, StoredSession, SystemStats, UpdateBatch, User};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    KeywordsLoaded(Result<Vec<String>, ApiError>),
    KeywordAdded {
        keyword: String,
        result: Result<(), ApiError>,
    },
    KeywordDeleted {
        keyword: String,
        result: Result<(), ApiError>,
    },
    RecentAdsLoaded {
        result: Result<Vec<KeywordAd>, ApiError>,
        highlight: Vec<AdId>,
    },
    KeywordAdsLoaded {
        keyword: String,
        result: Result<Vec<Ad>, ApiError>,
        highlight: Vec<AdId>,
    },
    StatsLoaded(Result<SystemStats, ApiError>),
    ManualCheckFinished(Result<(), ApiError>),
    LoginFinished(Result<StoredSession, ApiError>),
    SessionVerified(Result<User, ApiError>),
    PushConnected,
    PushDisconnected,
    AdsUpdate(UpdateBatch),
}

/// Work the engine performs on behalf of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    FetchKeywords,
    AddKeyword { keyword: String },
    DeleteKeyword { keyword: String },
    FetchRecent { highlight: Vec<AdId> },
    FetchKeywordAds { keyword: String, highlight: Vec<AdId> },
    FetchStats,
    ManualCheck,
    Login {
        username: String,
        password: String,
        remember_me: bool,
    },
    /// Fire-and-forget; local state is cleared regardless of the answer.
    Logout { access_token: String },
    VerifySession,
    /// Bearer used by every later request. Applied in command order.
    SetBearer(Option<String>),
    StartPolling { interval: std::time::Duration },
}

impl EngineCommand {
    /// The event reporting `error` as this command's outcome, if it has one.
    pub fn failed(self, error: ApiError) -> Option<EngineEvent> {
        Some(match self {
            EngineCommand::FetchKeywords => EngineEvent::KeywordsLoaded(Err(error)),
            EngineCommand::AddKeyword { keyword } => EngineEvent::KeywordAdded {
                keyword,
                result: Err(error),
            },
            EngineCommand::DeleteKeyword { keyword } => EngineEvent::KeywordDeleted {
                keyword,
                result: Err(error),
            },
            EngineCommand::FetchRecent { highlight } => EngineEvent::RecentAdsLoaded {
                result: Err(error),
                highlight,
            },
            EngineCommand::FetchKeywordAds { keyword, highlight } => {
                EngineEvent::KeywordAdsLoaded {
                    keyword,
                    result: Err(error),
                    highlight,
                }
            }
            EngineCommand::FetchStats => EngineEvent::StatsLoaded(Err(error)),
            EngineCommand::ManualCheck => EngineEvent::ManualCheckFinished(Err(error)),
            EngineCommand::Login { .. } => EngineEvent::LoginFinished(Err(error)),
            EngineCommand::VerifySession => EngineEvent::SessionVerified(Err(error)),
            EngineCommand::Logout { .. }
            | EngineCommand::SetBearer(_)
            | EngineCommand::StartPolling { .. } => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    /// 401 on a request that carried credentials.
    Unauthorized,
    Timeout,
    Network,
    /// Body was not the JSON shape the endpoint promises.
    Decode,
    /// `success: false` or a non-success `status`.
    Rejected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Unauthorized => write!(f, "unauthorized"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "unexpected response"),
            FailureKind::Rejected => write!(f, "rejected"),
        }
    }
}
