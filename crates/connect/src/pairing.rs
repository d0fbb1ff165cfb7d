use crate::backend::ConnectBackend;
use crate::events::ConnectEvent;
use crate::latch::ConnectionLatch;
use crate::retry::{Outcome, RetryPolicy, RetryState, RetryStep};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const CODE_POLICY: RetryPolicy = RetryPolicy::with_retries(3, Duration::from_secs(3));

/// Requests a pairing code for `session`, retrying within its policy.
pub struct PairingRequester<B> {
    backend: Arc<B>,
    session: String,
    policy: RetryPolicy,
    retry: RetryState,
    latch: ConnectionLatch,
    events: mpsc::UnboundedSender<ConnectEvent>,
}

impl<B: ConnectBackend> PairingRequester<B> {
    pub fn new(
        backend: Arc<B>,
        session: String,
        latch: ConnectionLatch,
        events: mpsc::UnboundedSender<ConnectEvent>,
    ) -> Self {
        Self {
            backend,
            session,
            policy: CODE_POLICY,
            retry: RetryState::new(),
            latch,
            events,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn failures(&self) -> u32 {
        self.retry.failures()
    }

    fn emit(&self, event: ConnectEvent) {
        let _ = self.events.send(event);
    }

    pub async fn retry_now(&mut self) -> RetryStep {
        self.retry.reset();
        self.request().await
    }

    pub async fn request(&mut self) -> RetryStep {
        if self.latch.is_connected() {
            return RetryStep::Done;
        }

        self.emit(ConnectEvent::CodeRequesting);
        let result = self.backend.pairing_code(&self.session).await;
        if self.latch.is_connected() {
            return RetryStep::Done;
        }
        match result {
            Ok(code) => {
                debug!(session = %self.session, "Pairing code issued");
                self.emit(ConnectEvent::CodeReady { code });
                self.retry.record(Outcome::Success, &self.policy)
            }
            Err(e) => {
                warn!(session = %self.session, "Pairing code request failed: {e}");
                let step = self.retry.record(Outcome::Hard, &self.policy);
                match step {
                    RetryStep::RetryAfter(_) => self.emit(ConnectEvent::CodeRetrying {
                        attempt: self.retry.failures(),
                        max: self.policy.max_retries(),
                    }),
                    RetryStep::Exhausted => self.emit(ConnectEvent::CodeFailed {
                        message: e.display_message(),
                    }),
                    RetryStep::Done => {}
                }
                step
            }
        }
    }

    pub async fn run(
        mut self,
        mut retries: mpsc::UnboundedReceiver<()>,
        cancel: CancellationToken,
    ) {
        let mut retry_at = Some(Instant::now());
        let mut retries_open = true;

        loop {
            let pending_retry = async move {
                match retry_at {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                cmd = retries.recv(), if retries_open => match cmd {
                    Some(()) => self.retry.reset(),
                    None => {
                        retries_open = false;
                        continue;
                    }
                },
                _ = pending_retry => {}
            }

            if self.latch.is_connected() {
                break;
            }

            retry_at = match self.request().await {
                RetryStep::RetryAfter(delay) => Some(Instant::now() + delay),
                RetryStep::Done | RetryStep::Exhausted => None,
            };
        }
    }
}
