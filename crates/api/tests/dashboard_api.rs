use serde_json::json;
use wabot_api::{
    ApiError, CancelRequest, CounterUpdate, DashboardApi, PairingMethod, ProductForm,
    RegisterRequest, Tier,
};
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, DashboardApi) {
    let server = MockServer::start().await;
    let api = match DashboardApi::new(&server.uri()) {
        Ok(api) => api,
        Err(e) => panic!("failed to build client: {e}"),
    };
    (server, api)
}

#[tokio::test]
async fn qr_image_is_returned_with_content_type() {
    let (server, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/qr"))
        .and(query_param("session", "order-42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let image = api.fetch_qr(Some("order-42")).await.unwrap();
    assert_eq!(image.content_type, "image/png");
    assert_eq!(image.bytes, vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn qr_503_is_reported_as_not_ready() {
    let (server, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/qr"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"error": "Creating session... Wait 10s"})),
        )
        .mount(&server)
        .await;

    match api.fetch_qr(None).await {
        Err(ApiError::NotReady(msg)) => assert_eq!(msg, "Creating session... Wait 10s"),
        other => panic!("expected NotReady, got {other:?}"),
    }
}

#[tokio::test]
async fn qr_with_non_image_body_is_a_hard_failure() {
    let (server, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/qr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "QR loading..."})))
        .mount(&server)
        .await;

    assert!(matches!(api.fetch_qr(None).await, Err(ApiError::Decode(_))));
}

#[tokio::test]
async fn qr_404_is_a_status_error() {
    let (server, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/qr"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Session not found"})))
        .mount(&server)
        .await;

    assert!(matches!(api.fetch_qr(Some("x")).await, Err(ApiError::Status(404))));
}

#[tokio::test]
async fn session_status_reports_working() {
    let (server, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .and(query_param("session", "order-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "WORKING",
            "connected": true,
            "session": "session_62811"
        })))
        .mount(&server)
        .await;

    let status = api.session_status(Some("order-1")).await.unwrap();
    assert!(status.is_online());
    assert_eq!(status.session.as_deref(), Some("session_62811"));
}

#[tokio::test]
async fn pairing_code_request_sends_session_name() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/pairing/request-code"))
        .and(body_json(json!({"session_name": "session_62811"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "success", "code": "ABCD1234"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let code = api.request_pairing_code("session_62811").await.unwrap();
    assert_eq!(code.as_str(), "ABCD1234");
    assert_eq!(code.display(), "ABCD-1234");
}

#[tokio::test]
async fn pairing_code_failure_carries_backend_message() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/pairing/request-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "message": "Session starting"
        })))
        .mount(&server)
        .await;

    match api.request_pairing_code("s").await {
        Err(ApiError::Api(msg)) => assert_eq!(msg, "Session starting"),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn reset_session_surfaces_error_field() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/reset_session"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "WAHA down"})))
        .mount(&server)
        .await;

    let err = api.reset_session().await.unwrap_err();
    assert_eq!(err.display_message(), "WAHA down");
}

#[tokio::test]
async fn cancel_subscription_posts_confirmed_reason() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/subscription/cancel"))
        .and(body_json(json!({
            "phone_number": "62811",
            "reason": "Too expensive: later",
            "confirm": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Cancelled with grace period"
        })))
        .mount(&server)
        .await;

    let msg = api
        .cancel_subscription(&CancelRequest::new("62811", "Too expensive", "later"))
        .await
        .unwrap();
    assert_eq!(msg, "Cancelled with grace period");
}

#[tokio::test]
async fn reactivate_rejection_is_an_api_error() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/subscription/reactivate"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": "error",
            "message": "Grace period expired"
        })))
        .mount(&server)
        .await;

    let err = api.reactivate_subscription("62811").await.unwrap_err();
    assert!(matches!(err, ApiError::Api(ref m) if m == "Grace period expired"));
}

#[tokio::test]
async fn settings_use_api_key_field_name() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/dashboard/save_settings"))
        .and(body_json(json!({"apiKey": "AIza-test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .mount(&server)
        .await;

    api.save_settings("AIza-test").await.unwrap();
}

#[tokio::test]
async fn product_add_posts_multipart_fields() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/dashboard/products/add"))
        .and(body_string_contains("name=\"harga\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let form = ProductForm {
        item: "Nasi Goreng".into(),
        price: "15000".into(),
        stock: "10".into(),
        category: "food".into(),
        ..Default::default()
    };
    api.add_product(form).await.unwrap();
}

#[tokio::test]
async fn product_delete_targets_id() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/dashboard/products/delete/17"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "message": "Product not found"
        })))
        .mount(&server)
        .await;

    let err = api.delete_product("17").await.unwrap_err();
    assert_eq!(err.display_message(), "Product not found");
}

#[tokio::test]
async fn counter_update_returns_new_stock() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/update_counter"))
        .and(body_json(json!({"hp": "tok", "index": 2, "change": -1})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "success", "new_stok": 4})),
        )
        .mount(&server)
        .await;

    let stock = api
        .update_counter(&CounterUpdate {
            hp: "tok".into(),
            index: 2,
            change: -1,
        })
        .await
        .unwrap();
    assert_eq!(stock, Some(4));
}

async fn mount_remote_counter(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/remote/a1b2c3d4"))
        .and(body_string_contains("pin=1234"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session=unlocked; Path=/")
                .set_body_string("<html>Counter</html>"),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/remote/a1b2c3d4"))
        .respond_with(ResponseTemplate::new(401).set_body_string("PIN Salah"))
        .with_priority(10)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/update_counter"))
        .and(header("cookie", "session=unlocked"))
        .and(body_json(json!({"hp": "a1b2c3d4", "index": 0, "change": 3})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "success", "new_stok": 7})),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/update_counter"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "unauthorized"})))
        .with_priority(10)
        .mount(server)
        .await;
}

#[tokio::test]
async fn counter_update_without_remote_unlock_is_rejected() {
    let (server, api) = setup().await;
    mount_remote_counter(&server).await;

    let err = api
        .update_counter(&CounterUpdate {
            hp: "a1b2c3d4".into(),
            index: 0,
            change: 3,
        })
        .await
        .unwrap_err();
    assert_eq!(err.display_message(), "unauthorized");
}

#[tokio::test]
async fn adjust_stock_unlocks_remote_counter_first() {
    let (server, api) = setup().await;
    mount_remote_counter(&server).await;

    let stock = api.adjust_stock(" a1b2c3d4 ", "1234", 0, 3).await.unwrap();
    assert_eq!(stock, Some(7));
}

#[tokio::test]
async fn adjust_stock_with_wrong_pin_stops_before_counter() {
    let (server, api) = setup().await;
    mount_remote_counter(&server).await;

    let err = api.adjust_stock("a1b2c3d4", "9999", 0, 3).await.unwrap_err();
    assert!(matches!(err, ApiError::Auth(_)));

    let requests = server.received_requests().await.unwrap();
    assert!(!requests.iter().any(|r| r.url.path() == "/api/update_counter"));
}

#[tokio::test]
async fn unknown_remote_token_is_reported() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/remote/ffffffff"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let err = api.remote_login("ffffffff", "1234").await.unwrap_err();
    assert_eq!(err.display_message(), "Unknown remote counter token");
    assert!(api.remote_login("", "1234").await.is_err());
}

#[tokio::test]
async fn chat_stats_decode() {
    let (server, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/dashboard/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "labels": ["2026-10-12", "2026-10-13"],
            "data": [3, 9]
        })))
        .mount(&server)
        .await;

    let stats = api.chat_stats().await.unwrap();
    assert_eq!(stats.labels.len(), 2);
    assert_eq!(stats.data, vec![3, 9]);
}

#[tokio::test]
async fn register_returns_redirect_url() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_json(json!({
            "phone": "0811",
            "name": "Toko Maju",
            "category": "food",
            "tier": "TRIAL",
            "pairing_method": "qr"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "redirect_url": "/success?order_id=TRIAL-1"
        })))
        .mount(&server)
        .await;

    let url = api
        .register(&RegisterRequest {
            phone: "0811".into(),
            name: "Toko Maju".into(),
            category: "food".into(),
            tier: Tier::Trial,
            pairing_method: PairingMethod::Qr,
        })
        .await
        .unwrap();
    assert_eq!(url, "/success?order_id=TRIAL-1");
}

#[tokio::test]
async fn login_failure_stays_on_login_page() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/dashboard/login"))
        .and(body_string_contains("pin=0000"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Login Gagal</html>"))
        .mount(&server)
        .await;

    assert!(matches!(
        api.login("62811", "0000").await,
        Err(ApiError::Auth(_))
    ));
}

#[tokio::test]
async fn login_success_follows_redirect_to_dashboard() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/dashboard/login"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/dashboard/")
                .insert_header("set-cookie", "session=abc; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dashboard/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Dashboard</html>"))
        .mount(&server)
        .await;

    api.login("62811", "1234").await.unwrap();
}

#[tokio::test]
async fn protected_endpoint_redirecting_to_login_is_auth_error() {
    let (server, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/dashboard/api/stats"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/dashboard/login"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dashboard/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    assert!(matches!(api.chat_stats().await, Err(ApiError::Auth(_))));
}
