use crate::backend::ConnectBackend;
use crate::events::ConnectEvent;
use crate::latch::ConnectionLatch;
use crate::retry::{Outcome, RetryPolicy, RetryState, RetryStep};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wabot_api::ApiError;

pub const QR_POLICY: RetryPolicy = RetryPolicy::new(5, Duration::from_secs(5));
pub const QR_REFRESH: Duration = Duration::from_secs(20);

/// Loads the QR image, retrying within [`RetryPolicy`] and refreshing it on
/// a fixed interval until the session connects.
pub struct QrLoader<B> {
    backend: Arc<B>,
    session: Option<String>,
    policy: RetryPolicy,
    refresh: Duration,
    retry: RetryState,
    latch: ConnectionLatch,
    events: mpsc::UnboundedSender<ConnectEvent>,
}

impl<B: ConnectBackend> QrLoader<B> {
    pub fn new(
        backend: Arc<B>,
        session: Option<String>,
        latch: ConnectionLatch,
        events: mpsc::UnboundedSender<ConnectEvent>,
    ) -> Self {
        Self {
            backend,
            session,
            policy: QR_POLICY,
            refresh: QR_REFRESH,
            retry: RetryState::new(),
            latch,
            events,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy, refresh: Duration) -> Self {
        self.policy = policy;
        self.refresh = refresh;
        self
    }

    pub fn failures(&self) -> u32 {
        self.retry.failures()
    }

    fn emit(&self, event: ConnectEvent) {
        let _ = self.events.send(event);
    }

    /// Manual retry: forget earlier failures and load now.
    pub async fn retry_now(&mut self) -> RetryStep {
        self.retry.reset();
        self.load().await
    }

    /// One attempt. A no-op once the session is connected.
    pub async fn load(&mut self) -> RetryStep {
        if self.latch.is_connected() {
            return RetryStep::Done;
        }

        self.emit(ConnectEvent::QrLoading);
        let result = self.backend.load_qr(self.session.as_deref()).await;
        if self.latch.is_connected() {
            return RetryStep::Done;
        }
        let outcome = match result {
            Ok(image) => {
                debug!(bytes = image.bytes.len(), "QR code loaded");
                self.emit(ConnectEvent::QrReady { image });
                Outcome::Success
            }
            Err(ApiError::NotReady(message)) => {
                info!("Session starting ({message}), retrying in {:?}", self.policy.delay);
                self.emit(ConnectEvent::QrStarting { message });
                Outcome::Soft
            }
            Err(e) => {
                warn!("QR load failed: {e}");
                Outcome::Hard
            }
        };

        let step = self.retry.record(outcome, &self.policy);
        if outcome == Outcome::Hard {
            match step {
                RetryStep::RetryAfter(_) => self.emit(ConnectEvent::QrRetrying {
                    attempt: self.retry.failures(),
                    max: self.policy.max_failures,
                }),
                RetryStep::Exhausted => self.emit(ConnectEvent::QrFailed),
                RetryStep::Done => {}
            }
        }
        step
    }

    /// Drives loading until cancelled or connected. Each message on
    /// `retries` is a manual retry.
    pub async fn run(
        mut self,
        mut retries: mpsc::UnboundedReceiver<()>,
        cancel: CancellationToken,
    ) {
        let mut refresh = interval(self.refresh);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut retry_at: Option<Instant> = None;
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
                _ = refresh.tick() => {}
            }

            if self.latch.is_connected() {
                break;
            }

            retry_at = match self.load().await {
                RetryStep::RetryAfter(delay) => Some(Instant::now() + delay),
                RetryStep::Done | RetryStep::Exhausted => None,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{png, ScriptedBackend};

    fn loader(
        backend: Arc<ScriptedBackend>,
    ) -> (
        QrLoader<ScriptedBackend>,
        ConnectionLatch,
        mpsc::UnboundedReceiver<ConnectEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let latch = ConnectionLatch::new();
        let loader = QrLoader::new(backend, Some("order-1".to_string()), latch.clone(), tx);
        (loader, latch, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ConnectEvent>) -> Vec<ConnectEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn not_ready_three_times_then_image() {
        let backend = Arc::new(ScriptedBackend::default());
        for _ in 0..3 {
            backend.push_qr(Err(ApiError::NotReady("Creating session".into())));
        }
        backend.push_qr(Ok(png()));
        let (mut loader, _latch, mut rx) = loader(backend);

        for _ in 0..3 {
            assert_eq!(
                loader.load().await,
                RetryStep::RetryAfter(Duration::from_secs(5))
            );
        }
        assert_eq!(loader.load().await, RetryStep::Done);
        assert_eq!(loader.failures(), 0);

        let events = drain(&mut rx);
        assert!(matches!(events.last(), Some(ConnectEvent::QrReady { .. })));
        assert!(!events
            .iter()
            .any(|e| matches!(e, ConnectEvent::QrFailed | ConnectEvent::QrRetrying { .. })));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, ConnectEvent::QrStarting { .. }))
                .count(),
            3
        );
    }

    #[tokio::test]
    async fn not_ready_never_exhausts() {
        let backend = Arc::new(ScriptedBackend::default());
        let (mut loader, _latch, mut rx) = loader(backend);

        for _ in 0..50 {
            assert!(matches!(loader.load().await, RetryStep::RetryAfter(_)));
        }
        assert!(!drain(&mut rx).contains(&ConnectEvent::QrFailed));
    }

    #[tokio::test]
    async fn hard_failures_exhaust_at_ceiling() {
        let backend = Arc::new(ScriptedBackend::default());
        for _ in 0..5 {
            backend.push_qr(Err(ApiError::Status(500)));
        }
        let (mut loader, _latch, mut rx) = loader(backend);

        for n in 1..5 {
            assert!(matches!(loader.load().await, RetryStep::RetryAfter(_)));
            assert_eq!(loader.failures(), n);
        }
        assert_eq!(loader.load().await, RetryStep::Exhausted);
        assert_eq!(loader.failures(), 0);

        let events = drain(&mut rx);
        assert_eq!(events.last(), Some(&ConnectEvent::QrFailed));
        assert!(events.contains(&ConnectEvent::QrRetrying { attempt: 4, max: 5 }));
    }

    #[tokio::test]
    async fn manual_retry_starts_from_zero() {
        let backend = Arc::new(ScriptedBackend::default());
        backend.push_qr(Err(ApiError::Status(500)));
        backend.push_qr(Err(ApiError::Status(500)));
        backend.push_qr(Err(ApiError::Status(500)));
        let (mut loader, _latch, _rx) = loader(backend);

        loader.load().await;
        loader.load().await;
        assert_eq!(loader.failures(), 2);

        loader.retry_now().await;
        assert_eq!(loader.failures(), 1);
    }

    #[tokio::test]
    async fn connected_session_suppresses_loading() {
        let backend = Arc::new(ScriptedBackend::default());
        backend.push_qr(Ok(png()));
        let (mut loader, latch, mut rx) = loader(backend.clone());
        latch.mark_connected();

        assert_eq!(loader.load().await, RetryStep::Done);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(backend.qr_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn connection_during_slow_request_drops_the_result() {
        for result in [Ok(png()), Err(ApiError::Status(500))] {
            let backend = Arc::new(ScriptedBackend::default());
            backend.set_latency(Duration::from_secs(2));
            backend.push_qr(result);
            let (mut loader, latch, mut rx) = loader(backend);

            let (step, ()) = tokio::join!(loader.load(), async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                latch.mark_connected();
            });

            assert_eq!(step, RetryStep::Done);
            assert_eq!(loader.failures(), 0);
            assert_eq!(drain(&mut rx), vec![ConnectEvent::QrLoading]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn run_refreshes_until_connected() {
        let backend = Arc::new(ScriptedBackend::default());
        backend.push_qr(Ok(png()));
        backend.push_qr(Ok(png()));
        let (loader, latch, mut rx) = loader(backend.clone());
        let (_retry_tx, retry_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(loader.run(retry_rx, cancel.clone()));

        tokio::time::sleep(Duration::from_secs(21)).await;
        assert_eq!(backend.qr_calls(), 2);

        latch.mark_connected();
        drain(&mut rx);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.qr_calls(), 2);
        assert!(drain(&mut rx).is_empty());

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_retrying_after_exhaustion_until_manual_retry() {
        let backend = Arc::new(ScriptedBackend::default());
        for _ in 0..5 {
            backend.push_qr(Err(ApiError::Status(500)));
        }
        backend.push_qr(Ok(png()));
        let (loader, _latch, mut rx) = loader(backend.clone());
        let loader = loader.with_policy(QR_POLICY, Duration::from_secs(3600));
        let (retry_tx, retry_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(loader.run(retry_rx, cancel.clone()));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.qr_calls(), 5);
        assert!(drain(&mut rx).contains(&ConnectEvent::QrFailed));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.qr_calls(), 5);

        retry_tx.send(()).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(backend.qr_calls(), 6);
        assert!(matches!(
            drain(&mut rx).last(),
            Some(ConnectEvent::QrReady { .. })
        ));

        cancel.cancel();
        task.await.unwrap();
    }
}
