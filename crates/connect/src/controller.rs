use crate::backend::{ConnectBackend, StatusSource};
use crate::events::{ConnectCommand, ConnectEvent};
use crate::latch::ConnectionLatch;
use crate::pairing::{PairingRequester, CODE_POLICY};
use crate::qr::{QrLoader, QR_POLICY, QR_REFRESH};
use crate::retry::RetryPolicy;
use crate::status::StatusPoller;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use wabot_api::PairingMethod;

/// Which activation screen is being driven.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectPage {
    /// Master-session QR scan.
    QrScan,
    /// Post-signup page keyed by order id; always QR.
    Signup { order_id: String },
    /// Activation page for a named session with a chosen method.
    Pairing {
        session: String,
        method: PairingMethod,
    },
}

impl ConnectPage {
    /// Session name for an order, unless the backend supplied one.
    pub fn pairing_for_order(order_id: &str, session: Option<&str>, method: PairingMethod) -> Self {
        ConnectPage::Pairing {
            session: session
                .map(str::to_string)
                .unwrap_or_else(|| format!("session_{order_id}")),
            method,
        }
    }

    pub fn method(&self) -> PairingMethod {
        match self {
            ConnectPage::Pairing { method, .. } => *method,
            _ => PairingMethod::Qr,
        }
    }

    pub fn status_source(&self) -> StatusSource {
        match self {
            ConnectPage::QrScan => StatusSource::Master,
            ConnectPage::Signup { order_id } => StatusSource::Session(order_id.clone()),
            ConnectPage::Pairing { session, .. } => StatusSource::Pairing(session.clone()),
        }
    }

    fn qr_session(&self) -> Option<String> {
        match self {
            ConnectPage::QrScan => None,
            ConnectPage::Signup { order_id } => Some(order_id.clone()),
            ConnectPage::Pairing { session, .. } => Some(session.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectTimings {
    pub qr_policy: RetryPolicy,
    pub qr_refresh: Duration,
    pub code_policy: RetryPolicy,
    pub master_status_every: Duration,
    pub signup_status_every: Duration,
    pub pairing_status_every: Duration,
}

impl Default for ConnectTimings {
    fn default() -> Self {
        Self {
            qr_policy: QR_POLICY,
            qr_refresh: QR_REFRESH,
            code_policy: CODE_POLICY,
            master_status_every: Duration::from_secs(10),
            signup_status_every: Duration::from_secs(5),
            pairing_status_every: Duration::from_secs(3),
        }
    }
}

impl ConnectTimings {
    fn status_every(&self, page: &ConnectPage) -> Duration {
        match page {
            ConnectPage::QrScan => self.master_status_every,
            ConnectPage::Signup { .. } => self.signup_status_every,
            ConnectPage::Pairing { .. } => self.pairing_status_every,
        }
    }
}

/// Handle to the tasks of one running activation screen. Dropping it
/// cancels them.
pub struct ConnectHandle {
    latch: ConnectionLatch,
    cancel: CancellationToken,
    qr_retry: Option<mpsc::UnboundedSender<()>>,
    code_retry: Option<mpsc::UnboundedSender<()>>,
}

impl ConnectHandle {
    pub fn is_connected(&self) -> bool {
        self.latch.is_connected()
    }

    /// Returns `false` when the page has no task for the command.
    pub fn send(&self, command: ConnectCommand) -> bool {
        let target = match command {
            ConnectCommand::RetryQr => self.qr_retry.as_ref(),
            ConnectCommand::RetryCode => self.code_retry.as_ref(),
        };
        target.is_some_and(|tx| tx.send(()).is_ok())
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ConnectHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawns the status poller plus the QR loader or pairing requester for
/// `page`. Must be called within a tokio runtime.
pub fn start<B: ConnectBackend>(
    backend: Arc<B>,
    page: ConnectPage,
    timings: &ConnectTimings,
    events: mpsc::UnboundedSender<ConnectEvent>,
) -> ConnectHandle {
    let latch = ConnectionLatch::new();
    let cancel = CancellationToken::new();
    info!(?page, "Starting connect controller");

    let poller = StatusPoller::new(
        backend.clone(),
        page.status_source(),
        timings.status_every(&page),
        latch.clone(),
        events.clone(),
    );
    tokio::spawn(poller.run(cancel.child_token()));

    let mut qr_retry = None;
    let mut code_retry = None;
    match page.method() {
        PairingMethod::Qr => {
            let (tx, rx) = mpsc::unbounded_channel();
            let loader = QrLoader::new(backend, page.qr_session(), latch.clone(), events)
                .with_policy(timings.qr_policy, timings.qr_refresh);
            tokio::spawn(loader.run(rx, cancel.child_token()));
            qr_retry = Some(tx);
        }
        PairingMethod::Code => {
            let session = page.qr_session().unwrap_or_default();
            let (tx, rx) = mpsc::unbounded_channel();
            let requester = PairingRequester::new(backend, session, latch.clone(), events)
                .with_policy(timings.code_policy);
            tokio::spawn(requester.run(rx, cancel.child_token()));
            code_retry = Some(tx);
        }
    }

    ConnectHandle {
        latch,
        cancel,
        qr_retry,
        code_retry,
    }
}
