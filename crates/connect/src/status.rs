use crate::backend::{ConnectBackend, StatusSource};
use crate::events::ConnectEvent;
use crate::latch::ConnectionLatch;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Polls a status endpoint until the session reports connected.
pub struct StatusPoller<B> {
    backend: Arc<B>,
    source: StatusSource,
    every: Duration,
    latch: ConnectionLatch,
    events: mpsc::UnboundedSender<ConnectEvent>,
}

impl<B: ConnectBackend> StatusPoller<B> {
    pub fn new(
        backend: Arc<B>,
        source: StatusSource,
        every: Duration,
        latch: ConnectionLatch,
        events: mpsc::UnboundedSender<ConnectEvent>,
    ) -> Self {
        Self {
            backend,
            source,
            every,
            latch,
            events,
        }
    }

    /// One poll. Returns `true` once the session is connected, whether this
    /// poll or an earlier one observed it.
    pub async fn poll_once(&self) -> bool {
        if self.latch.is_connected() {
            return true;
        }

        match self.backend.probe(&self.source).await {
            Ok(true) => {
                if self.latch.mark_connected() {
                    info!(source = ?self.source, "WhatsApp session connected");
                    let _ = self.events.send(ConnectEvent::Connected);
                }
                true
            }
            Ok(false) => {
                debug!(source = ?self.source, "Session not connected yet");
                false
            }
            Err(e) => {
                debug!(source = ?self.source, "Status poll failed: {e}");
                false
            }
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if self.poll_once().await {
                break;
            }
        }
    }
}
