use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{CLIENT_ID, CLIENT_SECRET};

#[allow(dead_code)]
pub fn basic_auth_header() -> String {
    format!("Basic {}", STANDARD.encode(format!("{CLIENT_ID}:{CLIENT_SECRET}")))
}

/// Provider token endpoint answering `grant_type` requests with `body`.
#[allow(dead_code)]
pub async fn mount_token_response(
    server: &MockServer,
    grant_type: &str,
    status: u16,
    body: serde_json::Value,
) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header("authorization", basic_auth_header().as_str()))
        .and(body_string_contains(format!("grant_type={grant_type}")))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub fn token_body(access: &str, refresh: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "access_token": access,
        "token_type": "Bearer",
        "scope": "streaming user-read-email user-read-private",
        "expires_in": 3600,
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = serde_json::Value::String(refresh.to_string());
    }
    body
}
