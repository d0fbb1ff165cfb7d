use crate::backend::{ConnectBackend, StatusSource};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use wabot_api::{ApiError, ApiResult, PairingCode, QrImage};

/// Backend that replays queued responses. An empty queue answers with a
/// not-connected probe, a 503 QR and a failed code request.
#[derive(Default)]
pub struct ScriptedBackend {
    qr: Mutex<VecDeque<ApiResult<QrImage>>>,
    codes: Mutex<VecDeque<ApiResult<PairingCode>>>,
    probes: Mutex<VecDeque<ApiResult<bool>>>,
    qr_calls: AtomicUsize,
    code_calls: AtomicUsize,
    probe_calls: AtomicUsize,
    latency: Mutex<Duration>,
}

pub fn png() -> QrImage {
    QrImage {
        bytes: vec![0x89, b'P', b'N', b'G'],
        content_type: "image/png".to_string(),
    }
}

impl ScriptedBackend {
    pub fn push_qr(&self, result: ApiResult<QrImage>) {
        self.qr.lock().unwrap().push_back(result);
    }

    pub fn push_code(&self, result: ApiResult<PairingCode>) {
        self.codes.lock().unwrap().push_back(result);
    }

    pub fn push_probe(&self, result: ApiResult<bool>) {
        self.probes.lock().unwrap().push_back(result);
    }

    /// Every QR and code request takes this long to answer.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    fn latency(&self) -> Duration {
        *self.latency.lock().unwrap()
    }

    pub fn qr_calls(&self) -> usize {
        self.qr_calls.load(Ordering::SeqCst)
    }

    pub fn code_calls(&self) -> usize {
        self.code_calls.load(Ordering::SeqCst)
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }
}

impl ConnectBackend for ScriptedBackend {
    fn load_qr(&self, _session: Option<&str>) -> impl Future<Output = ApiResult<QrImage>> + Send {
        self.qr_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.qr.lock().unwrap().pop_front();
        let latency = self.latency();
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            next.unwrap_or_else(|| Err(ApiError::NotReady("starting".to_string())))
        }
    }

    fn pairing_code(&self, _session: &str) -> impl Future<Output = ApiResult<PairingCode>> + Send {
        self.code_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.codes.lock().unwrap().pop_front();
        let latency = self.latency();
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            next.unwrap_or_else(|| Err(ApiError::Api("no code".to_string())))
        }
    }

    fn probe(&self, _source: &StatusSource) -> impl Future<Output = ApiResult<bool>> + Send {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.probes.lock().unwrap().pop_front();
        async move { next.unwrap_or(Ok(false)) }
    }
}
