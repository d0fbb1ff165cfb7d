use std::future::Future;
use wabot_api::{ApiResult, DashboardApi, PairingCode, QrImage};

/// Which endpoint a status poller asks, and what counts as connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSource {
    /// `/api/waha_status`: master session, `status == WORKING`.
    Master,
    /// `/api/status?session=`: `connected || status == WORKING`.
    Session(String),
    /// `/api/pairing/check-status`: `status == success && session_status == WORKING`.
    Pairing(String),
}

/// The backend calls a connect controller needs. Implemented by
/// [`DashboardApi`]; tests substitute scripted backends.
pub trait ConnectBackend: Send + Sync + 'static {
    fn load_qr(&self, session: Option<&str>) -> impl Future<Output = ApiResult<QrImage>> + Send;

    fn pairing_code(&self, session: &str) -> impl Future<Output = ApiResult<PairingCode>> + Send;

    /// Evaluates the source's success predicate.
    fn probe(&self, source: &StatusSource) -> impl Future<Output = ApiResult<bool>> + Send;
}

impl ConnectBackend for DashboardApi {
    fn load_qr(&self, session: Option<&str>) -> impl Future<Output = ApiResult<QrImage>> + Send {
        self.fetch_qr(session)
    }

    fn pairing_code(&self, session: &str) -> impl Future<Output = ApiResult<PairingCode>> + Send {
        self.request_pairing_code(session)
    }

    fn probe(&self, source: &StatusSource) -> impl Future<Output = ApiResult<bool>> + Send {
        async move {
            match source {
                StatusSource::Master => Ok(self.waha_status().await?.is_working()),
                StatusSource::Session(id) => {
                    Ok(self.session_status(Some(id)).await?.is_connected())
                }
                StatusSource::Pairing(session) => {
                    Ok(self.check_pairing_status(session).await?.is_working())
                }
            }
        }
    }
}
