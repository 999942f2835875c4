use std::sync::Arc;
use tokio::sync::mpsc;
use crate::participant::{Delivery, Msg, Participant};
use crate::registry::Registry;

// broadcasts waiting for fan-out, across all senders
pub const INTAKE_CAPACITY: usize = 64;

/// Single intake for broadcast messages. One fan-out task drains it, so
/// every participant sees broadcasts in submission order.
#[derive(Clone)]
pub struct Router {
    tx: mpsc::Sender<Msg>,
}

impl Router {
    /// Spawns the fan-out task. It stops once every `Router` clone is dropped.
    pub fn spawn(registry: Registry) -> Self {
        let (tx, rx) = mpsc::channel(INTAKE_CAPACITY);
        tokio::spawn(fan_out(rx, registry));
        Self { tx }
    }

    /// Waits while the intake is full, which holds back a flooding sender
    /// until fan-out and the writers catch up.
    pub async fn submit(&self, msg: impl Into<Msg>) {
        let _ = self.tx.send(msg.into()).await;
    }
}

async fn fan_out(mut rx: mpsc::Receiver<Msg>, registry: Registry) {
    while let Some(msg) = rx.recv().await {
        // joins racing this snapshot may or may not get the message
        for participant in registry.participants() {
            deliver_or_evict(&registry, &participant, msg.clone());
        }
    }
    tracing::debug!("broadcast intake closed");
}

/// Delivers to a registered participant, taking it offline if its mailbox
/// overflowed. Returns whether the message was queued.
pub fn deliver_or_evict(registry: &Registry, participant: &Arc<Participant>, msg: Msg) -> bool {
    match participant.deliver(msg) {
        Delivery::Queued => true,
        Delivery::Closed => false,
        Delivery::Overflow => {
            tracing::warn!("{} can't keep up, disconnecting", participant.addr());
            registry.leave(participant);
            false
        }
    }
}
