use std::sync::{mpsc, Arc};
use std::thread;

use tracker_logging::{tracker_error, tracker_info, tracker_warn};

use crate::api::{ApiSettings, ReqwestApi, TrackerApi};
use crate::poll::NotificationPoller;
use crate::{ApiError, EngineCommand, EngineEvent, FailureKind};

/// Owns the IO runtime. Commands run concurrently; their events arrive in
/// completion order on [`EngineHandle::try_recv`].
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ApiSettings) -> Self {
        match ReqwestApi::new(settings) {
            Ok(api) => Self::with_api(Arc::new(api)),
            Err(err) => {
                tracker_error!("HTTP client unavailable: {}", err);
                Self::unavailable(err)
            }
        }
    }

    pub fn with_api(api: Arc<dyn TrackerApi>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    tracker_error!("Failed to start IO runtime: {}", err);
                    fail_all(
                        cmd_rx,
                        event_tx,
                        ApiError::new(FailureKind::Network, err.to_string()),
                    );
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    // Applied inline so requests queued after it see the new bearer.
                    EngineCommand::SetBearer(token) => api.set_bearer(token),
                    EngineCommand::StartPolling { interval } => {
                        tracker_info!("Polling for changes every {:?}", interval);
                        let api = api.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            NotificationPoller::new(interval)
                                .run(api.as_ref(), event_tx)
                                .await;
                        });
                    }
                    command => {
                        let api = api.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            handle_command(api.as_ref(), command, event_tx).await;
                        });
                    }
                }
            }
        });

        Self { cmd_tx, event_rx }
    }

    /// A handle whose every command fails with `error`.
    fn unavailable(error: ApiError) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        thread::spawn(move || fail_all(cmd_rx, event_tx, error));
        Self { cmd_tx, event_rx }
    }

    pub fn submit(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    /// A sender for issuing commands from another thread than the one
    /// draining events.
    pub fn command_sender(&self) -> mpsc::Sender<EngineCommand> {
        self.cmd_tx.clone()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}

fn fail_all(
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
    error: ApiError,
) {
    while let Ok(command) = cmd_rx.recv() {
        if let Some(event) = command.failed(error.clone()) {
            let _ = event_tx.send(event);
        }
    }
}

async fn handle_command(
    api: &dyn TrackerApi,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::FetchKeywords => EngineEvent::KeywordsLoaded(api.keywords().await),
        EngineCommand::AddKeyword { keyword } => {
            let result = api.add_keyword(&keyword).await;
            EngineEvent::KeywordAdded { keyword, result }
        }
        EngineCommand::DeleteKeyword { keyword } => {
            let result = api.delete_keyword(&keyword).await;
            EngineEvent::KeywordDeleted { keyword, result }
        }
        EngineCommand::FetchRecent { highlight } => EngineEvent::RecentAdsLoaded {
            result: api.recent_ads().await,
            highlight,
        },
        EngineCommand::FetchKeywordAds { keyword, highlight } => {
            let result = api.keyword_ads(&keyword).await;
            EngineEvent::KeywordAdsLoaded {
                keyword,
                result,
                highlight,
            }
        }
        EngineCommand::FetchStats => EngineEvent::StatsLoaded(api.stats().await),
        EngineCommand::ManualCheck => EngineEvent::ManualCheckFinished(api.manual_check().await),
        EngineCommand::Login {
            username,
            password,
            remember_me,
        } => EngineEvent::LoginFinished(api.login(&username, &password, remember_me).await),
        EngineCommand::VerifySession => EngineEvent::SessionVerified(api.me().await),
        EngineCommand::Logout { access_token } => {
            if let Err(err) = api.logout(&access_token).await {
                tracker_warn!("Logout request failed: {}", err);
            }
            return;
        }
        EngineCommand::SetBearer(_) | EngineCommand::StartPolling { .. } => return,
    };
    let _ = event_tx.send(event);
}
