// src/server/reload.rs

//! Broadcast hub for live-reload notifications.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::ReloadKind;

/// Messages pushed to connected browsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Reload the whole page.
    Reload,
    /// Re-fetch stylesheets in place.
    Css,
    /// Sent once after the socket opens.
    Connected,
}

impl From<ReloadKind> for ReloadMessage {
    fn from(kind: ReloadKind) -> Self {
        match kind {
            ReloadKind::Full => ReloadMessage::Reload,
            ReloadKind::Styles => ReloadMessage::Css,
        }
    }
}

/// Fan-out of reload messages to every connected browser.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Send to all subscribers. Having none is fine.
    pub fn send(&self, msg: ReloadMessage) {
        let _ = self.sender.send(msg);
    }

    pub fn notify(&self, kind: ReloadKind) {
        tracing::info!(?kind, clients = self.subscriber_count(), "notifying browsers");
        self.send(kind.into());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_broadcasts_messages() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();

        hub.notify(ReloadKind::Styles);

        assert_eq!(rx.try_recv().unwrap(), ReloadMessage::Css);
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_string(&ReloadMessage::Reload).unwrap();
        assert_eq!(json, r#"{"type":"reload"}"#);
    }
}
