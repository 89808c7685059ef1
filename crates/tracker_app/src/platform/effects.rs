use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracker_core::{
    Effect, FailureKind, Msg, NotificationPermission, RequestFailure, StoredSession,
};
use tracker_engine::{
    ApiError, EngineCommand, EngineEvent, EngineHandle, KeyValueStore, NotificationGateway,
    PreferenceStore,
};
use tracker_logging::{tracker_info, tracker_warn};

use super::app::Inbox;
use super::persistence;

/// Executes effects: network work goes to the engine, storage and alerts
/// happen inline.
pub struct EffectRunner<S, G> {
    commands: mpsc::Sender<EngineCommand>,
    prefs: PreferenceStore<S>,
    gateway: G,
}

impl<S: KeyValueStore, G: NotificationGateway> EffectRunner<S, G> {
    pub fn new(commands: mpsc::Sender<EngineCommand>, prefs: PreferenceStore<S>, gateway: G) -> Self {
        Self {
            commands,
            prefs,
            gateway,
        }
    }

    /// Points later requests at the credentials of a restored session.
    pub fn adopt_session(&self, session: Option<&StoredSession>) {
        let token = session.map(|session| session.tokens.access_token.clone());
        self.submit(EngineCommand::SetBearer(token));
    }

    pub fn permission(&self) -> NotificationPermission {
        self.gateway.permission()
    }

    pub fn start_polling(&self, interval: Duration) {
        self.submit(EngineCommand::StartPolling { interval });
    }

    /// Runs `effects` in order. Returns messages that resolved synchronously.
    pub fn run(&mut self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut follow_up = Vec::new();
        for effect in effects {
            match effect {
                Effect::FetchKeywords => self.submit(EngineCommand::FetchKeywords),
                Effect::AddKeyword { keyword } => {
                    tracker_info!("Adding keyword {:?}", keyword);
                    self.submit(EngineCommand::AddKeyword { keyword });
                }
                Effect::DeleteKeyword { keyword } => {
                    tracker_info!("Deleting keyword {:?}", keyword);
                    self.submit(EngineCommand::DeleteKeyword { keyword });
                }
                Effect::FetchRecent { highlight } => {
                    self.submit(EngineCommand::FetchRecent { highlight })
                }
                Effect::FetchKeywordAds { keyword, highlight } => {
                    self.submit(EngineCommand::FetchKeywordAds { keyword, highlight })
                }
                Effect::FetchStats => self.submit(EngineCommand::FetchStats),
                Effect::ManualCheck => self.submit(EngineCommand::ManualCheck),
                Effect::Login {
                    username,
                    password,
                    remember_me,
                } => self.submit(EngineCommand::Login {
                    username,
                    password,
                    remember_me,
                }),
                Effect::Logout { access_token } => {
                    self.submit(EngineCommand::Logout { access_token })
                }
                Effect::VerifySession => self.submit(EngineCommand::VerifySession),
                Effect::PersistPreferences(preferences) => {
                    persistence::save_preferences(&self.prefs, &preferences)
                }
                Effect::PersistFavorites(favorites) => {
                    persistence::save_favorites(&self.prefs, &favorites)
                }
                Effect::PersistSession(session) => {
                    persistence::save_session(&self.prefs, session.as_ref());
                    self.adopt_session(session.as_ref());
                }
                Effect::PlaySound => self.gateway.play_sound(),
                Effect::ShowNotification { title, body } => self.gateway.show(&title, &body),
                Effect::RequestNotificationPermission => {
                    let permission = self.gateway.request_permission();
                    follow_up.push(Msg::PermissionResolved(permission));
                }
            }
        }
        follow_up
    }

    fn submit(&self, command: EngineCommand) {
        if self.commands.send(command).is_err() {
            tracker_warn!("Engine is gone; dropping command");
        }
    }
}

/// Drains engine events into the controller inbox until it closes.
pub fn spawn_event_loop(engine: EngineHandle, inbox: mpsc::Sender<Inbox>) {
    thread::spawn(move || loop {
        if let Some(event) = engine.try_recv() {
            let msg = map_event(event, received_at());
            if inbox.send(Inbox::Msg(msg)).is_err() {
                return;
            }
        } else {
            thread::sleep(Duration::from_millis(20));
        }
    });
}

fn received_at() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// `received_at` stamps push batches that arrive without a timestamp.
pub(crate) fn map_event(event: EngineEvent, received_at: String) -> Msg {
    match event {
        EngineEvent::KeywordsLoaded(result) => {
            Msg::KeywordsLoaded(result.map_err(|err| to_failure("keywords", err)))
        }
        EngineEvent::KeywordAdded { keyword, result } => Msg::KeywordAdded {
            keyword,
            result: result.map_err(|err| to_failure("add keyword", err)),
        },
        EngineEvent::KeywordDeleted { keyword, result } => Msg::KeywordDeleted {
            keyword,
            result: result.map_err(|err| to_failure("delete keyword", err)),
        },
        EngineEvent::RecentAdsLoaded { result, highlight } => Msg::RecentAdsLoaded {
            result: result.map_err(|err| to_failure("recent ads", err)),
            highlight,
        },
        EngineEvent::KeywordAdsLoaded {
            keyword,
            result,
            highlight,
        } => Msg::KeywordAdsLoaded {
            keyword,
            result: result.map_err(|err| to_failure("keyword ads", err)),
            highlight,
        },
        EngineEvent::StatsLoaded(result) => {
            Msg::StatsLoaded(result.map_err(|err| to_failure("stats", err)))
        }
        EngineEvent::ManualCheckFinished(result) => {
            Msg::ManualCheckFinished(result.map_err(|err| to_failure("manual check", err)))
        }
        EngineEvent::LoginFinished(result) => {
            Msg::LoginFinished(result.map_err(|err| to_failure("login", err)))
        }
        EngineEvent::SessionVerified(result) => {
            Msg::SessionVerified(result.map_err(|err| to_failure("session check", err)))
        }
        EngineEvent::PushConnected => Msg::PushConnected,
        EngineEvent::PushDisconnected => Msg::PushDisconnected,
        EngineEvent::AdsUpdate(batch) => {
            tracker_info!(
                "Change batch: {} new, {} deleted",
                batch.new_ads.len(),
                batch.deleted_ads.len()
            );
            Msg::AdsUpdate { batch, received_at }
        }
    }
}

fn to_failure(request: &str, err: ApiError) -> RequestFailure {
    tracker_warn!("Request {} failed: {}", request, err);
    match err.kind {
        tracker_engine::FailureKind::Unauthorized => {
            RequestFailure::new(FailureKind::Unauthorized, err.message)
        }
        tracker_engine::FailureKind::Rejected => RequestFailure::rejected(err.message),
        _ => RequestFailure::network(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::{AdId, AuthTokens, Preferences, UpdateBatch, User};
    use tracker_engine::MemoryKeyValueStore;

    #[derive(Default)]
    struct RecordingGateway {
        sounds: usize,
        shown: Vec<String>,
    }

    impl NotificationGateway for RecordingGateway {
        fn permission(&self) -> NotificationPermission {
            NotificationPermission::Granted
        }

        fn request_permission(&mut self) -> NotificationPermission {
            NotificationPermission::Granted
        }

        fn play_sound(&mut self) {
            self.sounds += 1;
        }

        fn show(&mut self, _title: &str, body: &str) {
            self.shown.push(body.to_string());
        }
    }

    fn runner() -> (
        EffectRunner<MemoryKeyValueStore, RecordingGateway>,
        mpsc::Receiver<EngineCommand>,
    ) {
        let (tx, rx) = mpsc::channel();
        let prefs = PreferenceStore::new(MemoryKeyValueStore::new());
        (EffectRunner::new(tx, prefs, RecordingGateway::default()), rx)
    }

    #[test]
    fn network_effects_become_engine_commands() {
        let (mut runner, rx) = runner();
        let follow_up = runner.run(vec![
            Effect::FetchKeywords,
            Effect::FetchKeywordAds {
                keyword: "laptop".into(),
                highlight: vec![AdId::from("42")],
            },
        ]);

        assert!(follow_up.is_empty());
        assert_eq!(rx.try_recv().unwrap(), EngineCommand::FetchKeywords);
        assert_eq!(
            rx.try_recv().unwrap(),
            EngineCommand::FetchKeywordAds {
                keyword: "laptop".into(),
                highlight: vec![AdId::from("42")],
            }
        );
    }

    #[test]
    fn persisted_session_updates_the_bearer() {
        let (mut runner, rx) = runner();
        let session = StoredSession {
            tokens: AuthTokens {
                access_token: "access-1".into(),
                refresh_token: None,
            },
            user: User::default(),
        };
        runner.run(vec![Effect::PersistSession(Some(session.clone()))]);
        assert_eq!(
            rx.try_recv().unwrap(),
            EngineCommand::SetBearer(Some("access-1".into()))
        );
        assert_eq!(runner.prefs.load_session(), Some(session));

        runner.run(vec![Effect::PersistSession(None)]);
        assert_eq!(rx.try_recv().unwrap(), EngineCommand::SetBearer(None));
        assert_eq!(runner.prefs.load_session(), None);
    }

    #[test]
    fn local_effects_run_inline() {
        let (mut runner, rx) = runner();
        let prefs = Preferences {
            sound_enabled: false,
            ..Preferences::default()
        };
        let follow_up = runner.run(vec![
            Effect::PersistPreferences(prefs),
            Effect::PlaySound,
            Effect::ShowNotification {
                title: "Tracker".into(),
                body: "New advertisements found!".into(),
            },
            Effect::RequestNotificationPermission,
        ]);

        assert!(rx.try_recv().is_err());
        assert_eq!(runner.prefs.load_preferences(), prefs);
        assert_eq!(runner.gateway.sounds, 1);
        assert_eq!(runner.gateway.shown, vec!["New advertisements found!"]);
        assert_eq!(
            follow_up,
            vec![Msg::PermissionResolved(NotificationPermission::Granted)]
        );
    }

    #[test]
    fn permission_comes_from_the_gateway() {
        let (runner, _rx) = runner();
        assert_eq!(runner.permission(), NotificationPermission::Granted);
    }

    #[test]
    fn engine_failures_map_to_user_facing_kinds() {
        let msg = map_event(
            EngineEvent::StatsLoaded(Err(ApiError {
                kind: tracker_engine::FailureKind::Unauthorized,
                message: "session is no longer valid".into(),
            })),
            String::new(),
        );
        assert!(matches!(
            msg,
            Msg::StatsLoaded(Err(RequestFailure {
                kind: FailureKind::Unauthorized,
                ..
            }))
        ));

        let msg = map_event(
            EngineEvent::KeywordsLoaded(Err(ApiError {
                kind: tracker_engine::FailureKind::Timeout,
                message: "operation timed out".into(),
            })),
            String::new(),
        );
        assert_eq!(
            msg,
            Msg::KeywordsLoaded(Err(RequestFailure::network(
                "timeout: operation timed out"
            )))
        );
    }

    #[test]
    fn push_batches_are_stamped_on_receipt() {
        let msg = map_event(
            EngineEvent::AdsUpdate(UpdateBatch::default()),
            "2026-03-01T10:00:00.000Z".into(),
        );
        assert_eq!(
            msg,
            Msg::AdsUpdate {
                batch: UpdateBatch::default(),
                received_at: "2026-03-01T10:00:00.000Z".into(),
            }
        );
    }
}
