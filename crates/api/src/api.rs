use crate::error::{ApiError, ApiResult};
use crate::types::{
    ActionResponse, ApiKeyBody, CancelRequest, ChatStats, CounterResponse, CounterUpdate,
    PairingCheckResponse, PairingCode, PairingCodeResponse, ProductForm, QrImage,
    ReactivateRequest, RegisterRequest, RegisterResponse, SessionNameBody, SessionStatus,
    WahaStatus, STATUS_SUCCESS,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = "wabot/0.2";
const LOGIN_PATH: &str = "/dashboard/login";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// HTTP client for the dashboard backend. Cheap to clone; clones share the
/// connection pool and the cookie session established by [`DashboardApi::login`].
#[derive(Clone)]
pub struct DashboardApi {
    client: Client,
    base_url: Url,
}

impl DashboardApi {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Self::with_timeouts(base_url, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeouts(
        base_url: &str,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Resolves a backend-supplied link (absolute or site-relative).
    pub fn resolve(&self, link: &str) -> ApiResult<Url> {
        self.endpoint(link)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        if response.url().path().ends_with(LOGIN_PATH) {
            return Err(ApiError::Auth("Login required".to_string()));
        }
        let status = response.status();
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            if status.is_success() {
                ApiError::Decode(e.to_string())
            } else {
                ApiError::Status(status.as_u16())
            }
        })
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .client
            .post(self.endpoint(path)?)
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.client.post(self.endpoint(path)?).send().await?;
        Self::read_json(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        let response = self.client.get(url).send().await?;
        Self::read_json(response).await
    }

    fn action_result(data: ActionResponse, fallback: &str) -> ApiResult<String> {
        if data.is_success() {
            Ok(data.message.unwrap_or_default())
        } else {
            Err(ApiError::Api(
                data.failure_message().unwrap_or(fallback).to_string(),
            ))
        }
    }

    pub async fn login(&self, phone: &str, pin: &str) -> ApiResult<()> {
        let response = self
            .client
            .post(self.endpoint(LOGIN_PATH)?)
            .form(&[("phone", phone), ("pin", pin)])
            .send()
            .await?;

        if response.url().path().ends_with(LOGIN_PATH) {
            return Err(ApiError::Auth("Login rejected. Check phone and PIN.".to_string()));
        }
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        debug!("Dashboard login succeeded");
        Ok(())
    }

    pub async fn logout(&self) -> ApiResult<()> {
        self.client
            .get(self.endpoint("/dashboard/logout")?)
            .send()
            .await?;
        Ok(())
    }

    /// Fetches the QR image for `session`, or for the master session when
    /// `None`. A 503 means the backend is still (re)starting the session and
    /// surfaces as [`ApiError::NotReady`].
    pub async fn fetch_qr(&self, session: Option<&str>) -> ApiResult<QrImage> {
        let mut url = self.endpoint("/api/qr")?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(session) = session {
                query.append_pair("session", session);
            }
            query.append_pair("t", &chrono::Utc::now().timestamp_millis().to_string());
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if status == StatusCode::SERVICE_UNAVAILABLE {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("Session is starting")
                .to_string();
            return Err(ApiError::NotReady(message));
        }
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        if !content_type.contains("image") {
            return Err(ApiError::Decode(format!(
                "expected an image, got '{content_type}'"
            )));
        }

        let bytes = response.bytes().await?;
        Ok(QrImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }

    pub async fn session_status(&self, session: Option<&str>) -> ApiResult<SessionStatus> {
        let mut url = self.endpoint("/api/status")?;
        if let Some(session) = session {
            url.query_pairs_mut().append_pair("session", session);
        }
        self.get_json(url).await
    }

    pub async fn waha_status(&self) -> ApiResult<WahaStatus> {
        self.get_json(self.endpoint("/api/waha_status")?).await
    }

    pub async fn request_pairing_code(&self, session_name: &str) -> ApiResult<PairingCode> {
        let data: PairingCodeResponse = self
            .post_json("/api/pairing/request-code", &SessionNameBody { session_name })
            .await?;

        match data.code.filter(|c| !c.is_empty()) {
            Some(code) if data.status == STATUS_SUCCESS => Ok(PairingCode::new(code)),
            _ => Err(ApiError::Api(
                data.message
                    .unwrap_or_else(|| "Failed to get pairing code".to_string()),
            )),
        }
    }

    pub async fn check_pairing_status(&self, session_name: &str) -> ApiResult<PairingCheckResponse> {
        self.post_json("/api/pairing/check-status", &SessionNameBody { session_name })
            .await
    }

    pub async fn reset_session(&self) -> ApiResult<()> {
        let data: ActionResponse = self.post_empty("/api/reset_session").await?;
        Self::action_result(data, "Reset failed").map(|_| ())
    }

    /// Unlocks the remote counter for `token` in this cookie session. The
    /// counter endpoint rejects updates for tokens not unlocked this way.
    pub async fn remote_login(&self, token: &str, pin: &str) -> ApiResult<()> {
        let token = token.trim();
        if token.is_empty() || token.contains('/') {
            return Err(ApiError::Api("Enter the remote counter token".to_string()));
        }
        let response = self
            .client
            .post(self.endpoint(&format!("/remote/{token}"))?)
            .form(&[("pin", pin)])
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(ApiError::Auth(
                "Wrong PIN for the remote counter".to_string(),
            )),
            StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                Err(ApiError::Auth("Unknown remote counter token".to_string()))
            }
            status if !status.is_success() => Err(ApiError::Status(status.as_u16())),
            _ => {
                debug!("Remote counter unlocked");
                Ok(())
            }
        }
    }

    /// Unlocks the remote counter and applies `change` to item `index`.
    pub async fn adjust_stock(
        &self,
        token: &str,
        pin: &str,
        index: usize,
        change: i64,
    ) -> ApiResult<Option<i64>> {
        self.remote_login(token, pin).await?;
        self.update_counter(&CounterUpdate {
            hp: token.trim().to_string(),
            index,
            change,
        })
        .await
    }

    /// Adjusts a menu item's stock through the remote counter. `update.hp`
    /// is the remote token, which must already be unlocked with
    /// [`DashboardApi::remote_login`]. Returns the new stock level (`-1`
    /// means unlimited).
    pub async fn update_counter(&self, update: &CounterUpdate) -> ApiResult<Option<i64>> {
        let data: CounterResponse = self.post_json("/api/update_counter", update).await?;
        if data.status == STATUS_SUCCESS {
            Ok(data.new_stok)
        } else {
            Err(ApiError::Api(
                data.error.unwrap_or_else(|| "Counter update failed".to_string()),
            ))
        }
    }

    pub async fn cancel_subscription(&self, request: &CancelRequest) -> ApiResult<String> {
        let data: ActionResponse = self.post_json("/api/subscription/cancel", request).await?;
        Self::action_result(data, "Cancellation failed")
    }

    pub async fn reactivate_subscription(&self, phone_number: &str) -> ApiResult<String> {
        let data: ActionResponse = self
            .post_json(
                "/api/subscription/reactivate",
                &ReactivateRequest { phone_number },
            )
            .await?;
        Self::action_result(data, "Reactivation failed")
    }

    pub async fn test_api_key(&self, api_key: &str) -> ApiResult<()> {
        let data: ActionResponse = self
            .post_json("/dashboard/test_api", &ApiKeyBody { api_key })
            .await?;
        Self::action_result(data, "Connection test failed").map(|_| ())
    }

    pub async fn save_settings(&self, api_key: &str) -> ApiResult<()> {
        let data: ActionResponse = self
            .post_json("/dashboard/save_settings", &ApiKeyBody { api_key })
            .await?;
        Self::action_result(data, "Saving settings failed").map(|_| ())
    }

    pub async fn add_product(&self, form: ProductForm) -> ApiResult<String> {
        let response = self
            .client
            .post(self.endpoint("/dashboard/products/add")?)
            .multipart(form.into_multipart())
            .send()
            .await?;
        let data: ActionResponse = Self::read_json(response).await?;
        Self::action_result(data, "Adding product failed")
    }

    pub async fn edit_product(&self, id: &str, form: ProductForm) -> ApiResult<String> {
        let response = self
            .client
            .post(self.endpoint(&format!("/dashboard/products/edit/{id}"))?)
            .multipart(form.into_multipart())
            .send()
            .await?;
        let data: ActionResponse = Self::read_json(response).await?;
        Self::action_result(data, "Updating product failed")
    }

    pub async fn delete_product(&self, id: &str) -> ApiResult<String> {
        let data: ActionResponse = self
            .post_empty(&format!("/dashboard/products/delete/{id}"))
            .await?;
        Self::action_result(data, "Deleting product failed")
    }

    pub async fn delete_data(&self) -> ApiResult<()> {
        let data: ActionResponse = self.post_empty("/dashboard/delete_data").await?;
        Self::action_result(data, "Deleting data failed").map(|_| ())
    }

    pub async fn chat_stats(&self) -> ApiResult<ChatStats> {
        self.get_json(self.endpoint("/dashboard/api/stats")?).await
    }

    /// Submits a registration and returns the link the backend wants the
    /// user sent to next (activation page or payment page).
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<String> {
        let data: RegisterResponse = self.post_json("/register", request).await?;
        match data.redirect_url.filter(|u| !u.is_empty()) {
            Some(url) if data.status == STATUS_SUCCESS => Ok(url),
            _ => Err(ApiError::Api(
                data.message
                    .unwrap_or_else(|| "Registration failed. Please try again.".to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_base_url() {
        assert!(matches!(
            DashboardApi::new("not a url"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn resolves_relative_and_absolute_links() {
        let api = DashboardApi::new("http://localhost:5000").unwrap();
        assert_eq!(
            api.resolve("/success?order_id=7").unwrap().as_str(),
            "http://localhost:5000/success?order_id=7"
        );
        assert_eq!(
            api.resolve("https://pay.example.com/snap/1").unwrap().host_str(),
            Some("pay.example.com")
        );
    }

    #[test]
    fn action_result_uses_fallback_without_backend_message() {
        let data = ActionResponse {
            status: "error".into(),
            ..Default::default()
        };
        let err = DashboardApi::action_result(data, "fallback").unwrap_err();
        assert_eq!(err.to_string(), "fallback");
    }
}
