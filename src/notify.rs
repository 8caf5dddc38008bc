use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::engine::{OverlayEntry, OverlayKey};
use crate::model::TechId;

const CHANNEL_CAPACITY: usize = 256;

/// Overlay change affecting one technician's row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEvent {
    Applied(OverlayEntry),
    Removed(OverlayKey),
    /// All of the session's overlays were committed or discarded.
    Cleared,
}

/// Broadcast hub for overlay changes, one channel per technician.
#[derive(Default)]
pub struct NotifyHub {
    channels: DashMap<TechId, broadcast::Sender<OverlayEvent>>,
}

impl NotifyHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a technician's overlay changes. Creates the channel if needed.
    pub fn subscribe(&self, tech_id: &TechId) -> broadcast::Receiver<OverlayEvent> {
        let sender = self
            .channels
            .entry(tech_id.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send to one technician's listeners. No-op if nobody is listening.
    pub fn send(&self, tech_id: &TechId, event: &OverlayEvent) {
        if let Some(sender) = self.channels.get(tech_id) {
            let _ = sender.send(event.clone());
        }
    }

    /// Send `Cleared` to every listener.
    pub fn send_cleared(&self) {
        for sender in self.channels.iter() {
            let _ = sender.value().send(OverlayEvent::Cleared);
        }
    }

    /// Drop channels nobody listens to anymore.
    pub fn prune(&self) {
        self.channels.retain(|_, sender| sender.receiver_count() > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = NotifyHub::new();
        let tech = TechId::from("42");
        let mut rx = hub.subscribe(&tech);

        let key = OverlayKey::new(tech.clone(), 1);
        hub.send(&tech, &OverlayEvent::Removed(key.clone()));

        let received = rx.recv().await.unwrap();
        assert_eq!(received, OverlayEvent::Removed(key));
    }

    #[tokio::test]
    async fn numeric_and_string_ids_share_a_channel() {
        let hub = NotifyHub::new();
        let mut rx = hub.subscribe(&TechId::from(42i64));
        hub.send(&TechId::from("42"), &OverlayEvent::Cleared);
        assert_eq!(rx.recv().await.unwrap(), OverlayEvent::Cleared);
    }

    #[tokio::test]
    async fn send_without_subscribers_is_noop() {
        let hub = NotifyHub::new();
        // No subscriber, no panic
        hub.send(&TechId::from("7"), &OverlayEvent::Cleared);
        hub.send_cleared();
    }

    #[tokio::test]
    async fn prune_drops_dead_channels() {
        let hub = NotifyHub::new();
        let rx = hub.subscribe(&TechId::from("1"));
        let _keep = hub.subscribe(&TechId::from("2"));
        drop(rx);
        hub.prune();
        assert_eq!(hub.channels.len(), 1);
    }
}
