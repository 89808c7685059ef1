use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use log::LevelFilter;
use tracker_core::{update, AppState, Msg};
use tracker_engine::{EngineHandle, KeyValueStore, NotificationGateway, TerminalGateway};
use tracker_logging::{tracker_info, tracker_warn};

use super::effects::{spawn_event_loop, EffectRunner};
use super::ui::commands::{self, Command};
use super::ui::render;
use super::{config, persistence};

/// Everything the controller thread reacts to.
pub(crate) enum Inbox {
    Msg(Msg),
    Quit,
}

pub fn run_app() -> anyhow::Result<()> {
    let loaded = config::load();
    let config = loaded.config;
    tracker_logging::initialize(config.log_destination.into(), LevelFilter::Info);
    if let Some(warning) = loaded.warning {
        tracker_warn!("Using default configuration: {}", warning);
    }
    tracker_info!("Tracking changes from {}", config.base_url);

    let prefs = persistence::open(&config.state_dir);
    let restored = persistence::restore(&prefs);
    let restored_session = restored.iter().find_map(|msg| match msg {
        Msg::SessionRestored(session) => session.clone(),
        _ => None,
    });

    let engine = EngineHandle::new(config.api_settings());
    let runner = EffectRunner::new(
        engine.command_sender(),
        prefs,
        TerminalGateway::new(io::stdout()),
    );

    let (inbox_tx, inbox_rx) = mpsc::channel::<Inbox>();
    spawn_event_loop(engine, inbox_tx.clone());
    spawn_ticker(config.tick_interval(), inbox_tx.clone());
    spawn_stdin_reader(inbox_tx);

    runner.adopt_session(restored_session.as_ref());

    let mut controller = Controller::new(runner);
    for msg in restored {
        controller.dispatch(msg);
    }
    let permission = controller.runner.permission();
    controller.dispatch(Msg::PermissionRestored(permission));
    controller.dispatch(Msg::Started);
    controller.runner.start_polling(config.poll_interval());
    println!("{}", commands::HELP);

    while let Ok(item) = inbox_rx.recv() {
        match item {
            Inbox::Msg(msg) => controller.dispatch(msg),
            Inbox::Quit => break,
        }
    }
    tracker_info!("Dashboard closed");
    Ok(())
}

struct Controller<S, G> {
    state: AppState,
    runner: EffectRunner<S, G>,
}

impl<S: KeyValueStore, G: NotificationGateway> Controller<S, G> {
    fn new(runner: EffectRunner<S, G>) -> Self {
        Self {
            state: AppState::new(),
            runner,
        }
    }

    /// Applies `msg` and every message its effects resolve to, then redraws
    /// once if anything visible changed.
    fn dispatch(&mut self, msg: Msg) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;
            queue.extend(self.runner.run(effects));
        }
        if self.state.consume_dirty() {
            draw(&render::render(&self.state.view()));
        }
    }
}

fn draw(lines: &[String]) {
    let mut out = io::stdout().lock();
    for line in lines {
        let _ = writeln!(out, "{line}");
    }
    let _ = out.flush();
}

fn spawn_ticker(interval: Duration, inbox: mpsc::Sender<Inbox>) {
    let started = Instant::now();
    thread::spawn(move || loop {
        let now_ms = started.elapsed().as_millis() as u64;
        if inbox.send(Inbox::Msg(Msg::Tick { now_ms })).is_err() {
            return;
        }
        thread::sleep(interval);
    });
}

fn spawn_stdin_reader(inbox: mpsc::Sender<Inbox>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let items = match commands::parse_command(&line) {
                None => continue,
                Some(Command::Msg(msg)) => commands::expand(msg).into_iter().map(Inbox::Msg).collect(),
                Some(Command::ToggleFavorite(ad_id)) => vec![Inbox::Msg(Msg::FavoriteToggled {
                    ad_id,
                    at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                })],
                Some(Command::Help) => {
                    println!("{}", commands::HELP);
                    continue;
                }
                Some(Command::Invalid(reason)) => {
                    println!("{reason}");
                    continue;
                }
                Some(Command::Quit) => vec![Inbox::Quit],
            };
            for item in items {
                if inbox.send(item).is_err() {
                    return;
                }
            }
        }
        let _ = inbox.send(Inbox::Quit);
    });
}
