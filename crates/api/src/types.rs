use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Value of the `status` field on every successful form/action response.
pub const STATUS_SUCCESS: &str = "success";
/// Session status reported once WhatsApp is linked.
pub const SESSION_WORKING: &str = "WORKING";

/// Generic `{status, message?, error?}` envelope shared by the action endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ActionResponse {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    pub fn failure_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub session: Option<String>,
}

impl SessionStatus {
    /// Predicate used by the connect screens.
    pub fn is_connected(&self) -> bool {
        self.connected || self.status == SESSION_WORKING
    }

    /// Stricter predicate used by the dashboard indicator.
    pub fn is_online(&self) -> bool {
        self.connected && self.status == SESSION_WORKING
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WahaStatus {
    #[serde(default)]
    pub status: String,
}

impl WahaStatus {
    pub fn is_working(&self) -> bool {
        self.status == SESSION_WORKING
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairingCodeResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairingCheckResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub session_status: Option<String>,
}

impl PairingCheckResponse {
    pub fn is_working(&self) -> bool {
        self.status == STATUS_SUCCESS && self.session_status.as_deref() == Some(SESSION_WORKING)
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SessionNameBody<'a> {
    pub session_name: &'a str,
}

/// A pairing code as issued by the backend. Kept verbatim for the copy
/// action; [`PairingCode::display`] groups it for reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingCode {
    raw: String,
}

fn code_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9A-Za-z]").expect("static regex"))
}

impl PairingCode {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn display(&self) -> String {
        let compact = code_separator().replace_all(&self.raw, "");
        if compact.len() == 8 {
            format!("{}-{}", &compact[..4], &compact[4..])
        } else {
            self.raw.clone()
        }
    }
}

impl fmt::Display for PairingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatStats {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub data: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    #[default]
    Trial,
    Starter,
    Business,
    Pro,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Trial, Tier::Starter, Tier::Business, Tier::Pro];

    /// Unknown or missing tiers fall back to the free trial.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "STARTER" => Tier::Starter,
            "BUSINESS" => Tier::Business,
            "PRO" => Tier::Pro,
            _ => Tier::Trial,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Trial => "TRIAL",
            Tier::Starter => "STARTER",
            Tier::Business => "BUSINESS",
            Tier::Pro => "PRO",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingMethod {
    #[default]
    Qr,
    Code,
}

impl PairingMethod {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("code") {
            PairingMethod::Code
        } else {
            PairingMethod::Qr
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PairingMethod::Qr => "qr",
            PairingMethod::Code => "code",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            PairingMethod::Qr => PairingMethod::Code,
            PairingMethod::Code => PairingMethod::Qr,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub phone: String,
    pub name: String,
    pub category: String,
    pub tier: Tier,
    pub pairing_method: PairingMethod,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelRequest {
    pub phone_number: String,
    pub reason: String,
    pub confirm: bool,
}

impl CancelRequest {
    pub const DEFAULT_REASON: &'static str = "No reason provided";

    /// Joins the selected reason and free-text feedback as `reason: feedback`.
    pub fn new(phone_number: &str, reason: &str, feedback: &str) -> Self {
        let reason = if reason.trim().is_empty() {
            Self::DEFAULT_REASON
        } else {
            reason.trim()
        };
        let feedback = feedback.trim();
        let reason = if feedback.is_empty() {
            reason.to_string()
        } else {
            format!("{reason}: {feedback}")
        };
        Self {
            phone_number: phone_number.to_string(),
            reason,
            confirm: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ReactivateRequest<'a> {
    pub phone_number: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ApiKeyBody<'a> {
    #[serde(rename = "apiKey")]
    pub api_key: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CounterUpdate {
    /// Remote counter token (the backend's field name is historical).
    pub hp: String,
    pub index: usize,
    pub change: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CounterResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub new_stok: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Product form as posted by the products page. Field names follow the
/// backend's form keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductForm {
    pub item: String,
    pub price: String,
    pub stock: String,
    pub category: String,
    pub description: String,
    pub image_url: String,
}

impl ProductForm {
    pub(crate) fn into_multipart(self) -> reqwest::multipart::Form {
        reqwest::multipart::Form::new()
            .text("item", self.item)
            .text("harga", self.price)
            .text("stok", self.stock)
            .text("category", self.category)
            .text("description", self.description)
            .text("image_url", self.image_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairing_code_groups_eight_characters() {
        assert_eq!(PairingCode::new("12345678").display(), "1234-5678");
        assert_eq!(PairingCode::new("ABCD-EFGH").display(), "ABCD-EFGH");
        assert_eq!(PairingCode::new("ab cd ef gh").display(), "abcd-efgh");
    }

    #[test]
    fn pairing_code_keeps_unusual_lengths_verbatim() {
        let code = PairingCode::new("12-34");
        assert_eq!(code.display(), "12-34");
        assert_eq!(code.as_str(), "12-34");
    }

    #[test]
    fn cancel_reason_defaults_and_appends_feedback() {
        let req = CancelRequest::new("62811", "", "");
        assert_eq!(req.reason, "No reason provided");
        assert!(req.confirm);

        let req = CancelRequest::new("62811", "Too expensive", "maybe next year");
        assert_eq!(req.reason, "Too expensive: maybe next year");
    }

    #[test]
    fn unknown_tier_falls_back_to_trial() {
        assert_eq!(Tier::parse("business"), Tier::Business);
        assert_eq!(Tier::parse("ENTERPRISE"), Tier::Trial);
        assert_eq!(Tier::parse(""), Tier::Trial);
        assert_eq!(Tier::Pro.next(), Tier::Trial);
    }

    #[test]
    fn register_request_uses_backend_field_names() {
        let req = RegisterRequest {
            phone: "0811".into(),
            name: "Toko Maju".into(),
            category: "food".into(),
            tier: Tier::Starter,
            pairing_method: PairingMethod::Code,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["tier"], "STARTER");
        assert_eq!(json["pairing_method"], "code");
    }

    #[test]
    fn session_status_predicates_differ() {
        let status: SessionStatus =
            serde_json::from_str(r#"{"status":"WORKING","connected":false}"#).unwrap();
        assert!(status.is_connected());
        assert!(!status.is_online());

        let status: SessionStatus =
            serde_json::from_str(r#"{"status":"WORKING","connected":true}"#).unwrap();
        assert!(status.is_online());
    }

    #[test]
    fn pairing_check_requires_both_sentinels() {
        let check: PairingCheckResponse =
            serde_json::from_str(r#"{"status":"success","session_status":"SCAN_QR_CODE"}"#)
                .unwrap();
        assert!(!check.is_working());
        let check: PairingCheckResponse =
            serde_json::from_str(r#"{"status":"success","session_status":"WORKING"}"#).unwrap();
        assert!(check.is_working());
    }

    #[test]
    fn action_failure_prefers_message_then_error() {
        let resp: ActionResponse =
            serde_json::from_str(r#"{"status":"error","error":"bad key"}"#).unwrap();
        assert!(!resp.is_success());
        assert_eq!(resp.failure_message(), Some("bad key"));
    }
}
