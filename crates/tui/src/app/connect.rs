use std::path::PathBuf;
use std::time::{Duration, Instant};
use wabot_api::{PairingCode, PairingMethod};
use wabot_connect::{ConnectEvent, ConnectPage};

pub const COPIED_LABEL_TTL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrPanel {
    Idle,
    Loading,
    Ready { size: usize, path: Option<PathBuf> },
    Starting(String),
    Retrying { attempt: u32, max: u32 },
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodePanel {
    Idle,
    Requesting,
    Ready(PairingCode),
    Retrying { attempt: u32, max: u32 },
    Failed(String),
}

/// What the connect screen shows. Built up from [`ConnectEvent`]s; frozen
/// once the session is connected.
#[derive(Debug, Clone)]
pub struct ConnectView {
    pub page: ConnectPage,
    pub qr: QrPanel,
    pub code: CodePanel,
    pub connected: bool,
    pub share_link: Option<String>,
    pub copied_until: Option<Instant>,
    pub resetting: bool,
}

impl ConnectView {
    pub fn new(page: ConnectPage, share_link: Option<String>) -> Self {
        Self {
            page,
            qr: QrPanel::Idle,
            code: CodePanel::Idle,
            connected: false,
            share_link,
            copied_until: None,
            resetting: false,
        }
    }

    /// Returns `false` when the event was ignored.
    pub fn apply(&mut self, event: &ConnectEvent) -> bool {
        if self.connected {
            return false;
        }
        match event {
            ConnectEvent::QrLoading => self.qr = QrPanel::Loading,
            ConnectEvent::QrReady { image } => {
                self.qr = QrPanel::Ready {
                    size: image.bytes.len(),
                    path: None,
                }
            }
            ConnectEvent::QrStarting { message } => self.qr = QrPanel::Starting(message.clone()),
            ConnectEvent::QrRetrying { attempt, max } => {
                self.qr = QrPanel::Retrying {
                    attempt: *attempt,
                    max: *max,
                }
            }
            ConnectEvent::QrFailed => self.qr = QrPanel::Failed,
            ConnectEvent::CodeRequesting => self.code = CodePanel::Requesting,
            ConnectEvent::CodeReady { code } => self.code = CodePanel::Ready(code.clone()),
            ConnectEvent::CodeRetrying { attempt, max } => {
                self.code = CodePanel::Retrying {
                    attempt: *attempt,
                    max: *max,
                }
            }
            ConnectEvent::CodeFailed { message } => self.code = CodePanel::Failed(message.clone()),
            ConnectEvent::Connected => self.connected = true,
        }
        true
    }

    pub fn set_qr_path(&mut self, saved: PathBuf) {
        if let QrPanel::Ready { path, .. } = &mut self.qr {
            *path = Some(saved);
        }
    }

    pub fn method(&self) -> PairingMethod {
        self.page.method()
    }

    pub fn copy_visible(&self) -> bool {
        if self.connected {
            return false;
        }
        match self.method() {
            PairingMethod::Code => matches!(self.code, CodePanel::Ready(_)),
            PairingMethod::Qr => self.share_link.is_some(),
        }
    }

    pub fn retry_visible(&self) -> bool {
        if self.connected {
            return false;
        }
        match self.method() {
            PairingMethod::Code => matches!(self.code, CodePanel::Failed(_)),
            PairingMethod::Qr => matches!(self.qr, QrPanel::Failed),
        }
    }

    /// The raw pairing code, or the shareable page link on QR pages.
    pub fn copy_text(&self) -> Option<String> {
        if !self.copy_visible() {
            return None;
        }
        match (&self.code, self.method()) {
            (CodePanel::Ready(code), PairingMethod::Code) => Some(code.as_str().to_string()),
            _ => self.share_link.clone(),
        }
    }

    pub fn mark_copied(&mut self, now: Instant) {
        self.copied_until = Some(now + COPIED_LABEL_TTL);
    }

    pub fn expire_copied(&mut self, now: Instant) {
        if self.copied_until.is_some_and(|until| now >= until) {
            self.copied_until = None;
        }
    }

    pub fn copy_label(&self) -> &'static str {
        if self.copied_until.is_some() {
            "Copied!"
        } else {
            match self.method() {
                PairingMethod::Code => "Copy code",
                PairingMethod::Qr => "Copy link",
            }
        }
    }

    pub fn qr_text(&self) -> String {
        match &self.qr {
            QrPanel::Idle => "Waiting...".to_string(),
            QrPanel::Loading => "Loading QR...".to_string(),
            QrPanel::Ready {
                size,
                path: Some(path),
            } => format!(
                "QR ready ({size} bytes). Open {} and scan it with WhatsApp > Linked devices.",
                path.display()
            ),
            QrPanel::Ready { size, path: None } => format!("QR ready ({size} bytes)."),
            QrPanel::Starting(message) => format!("{message}. Retrying..."),
            QrPanel::Retrying { attempt, max } => {
                format!("Failed to load QR. Retrying ({attempt}/{max})...")
            }
            QrPanel::Failed => "Failed to load QR. Press [r] to retry.".to_string(),
        }
    }

    pub fn code_text(&self) -> String {
        match &self.code {
            CodePanel::Idle => "Waiting...".to_string(),
            CodePanel::Requesting => "Requesting pairing code...".to_string(),
            CodePanel::Ready(code) => code.display(),
            CodePanel::Retrying { attempt, max } => {
                format!("Failed to get code. Retrying ({attempt}/{max})...")
            }
            CodePanel::Failed(message) => format!("{message}. Press [r] to retry."),
        }
    }
}
