use wabot_api::{PairingCode, QrImage};

/// Progress reported by a running connect controller. The UI applies these
/// to its own screen state.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectEvent {
    QrLoading,
    QrReady { image: QrImage },
    /// Backend answered 503; the session is being created or restarted.
    QrStarting { message: String },
    QrRetrying { attempt: u32, max: u32 },
    /// Automatic retries exhausted; only a manual retry continues.
    QrFailed,
    CodeRequesting,
    CodeReady { code: PairingCode },
    CodeRetrying { attempt: u32, max: u32 },
    CodeFailed { message: String },
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectCommand {
    RetryQr,
    RetryCode,
}
