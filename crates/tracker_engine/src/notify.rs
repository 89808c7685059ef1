use std::io::Write;

use tracker_core::NotificationPermission;
use tracker_logging::{tracker_info, tracker_warn};

/// Host-side alerts: sound and platform notifications.
pub trait NotificationGateway: Send {
    fn permission(&self) -> NotificationPermission;
    fn request_permission(&mut self) -> NotificationPermission;
    fn play_sound(&mut self);
    fn show(&mut self, title: &str, body: &str);
}

/// Alerts on a terminal: the bell for sound, a highlighted line for notifications.
pub struct TerminalGateway<W> {
    out: W,
    permission: NotificationPermission,
}

impl<W: Write + Send> TerminalGateway<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            permission: NotificationPermission::Default,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            tracker_warn!("Failed to write alert: {}", err);
        }
    }
}

impl<W: Write + Send> NotificationGateway for TerminalGateway<W> {
    fn permission(&self) -> NotificationPermission {
        self.permission
    }

    fn request_permission(&mut self) -> NotificationPermission {
        if self.permission == NotificationPermission::Default {
            self.permission = NotificationPermission::Granted;
        }
        self.permission
    }

    fn play_sound(&mut self) {
        self.emit("\x07");
    }

    fn show(&mut self, title: &str, body: &str) {
        if self.permission != NotificationPermission::Granted {
            return;
        }
        tracker_info!("Notification: {} - {}", title, body);
        self.emit(&format!("*** {title}: {body} ***\n"));
    }
}
