use chrono::{Duration, Utc};
use reqwest::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use playauth::cli::{build_session, ClientOptions};
use playauth::client::RedirectResult;
use playauth::oauth::refresh::NO_TOKEN_MESSAGE;
use playauth::{PlayerSession, TokenRecord};

mod common;

use common::provider_mock::{mount_token_response, token_body};
use common::{authorize, Harness};

/// A harness server, a mock provider, a mock API and a client session wired
/// to all three.
struct Setup {
    _state_dir: tempfile::TempDir,
    harness: Harness,
    provider: MockServer,
    api: MockServer,
    session: PlayerSession,
}

async fn setup() -> Setup {
    let provider = MockServer::start().await;
    let api = MockServer::start().await;
    let harness = Harness::start(&provider.uri()).await;
    let state_dir = tempfile::tempdir().unwrap();
    let session = build_session(&ClientOptions {
        server: harness.url("/"),
        api_url: format!("{}/v1", api.uri()),
        state_dir: Some(state_dir.path().to_path_buf()),
        json: false,
    })
    .unwrap();
    Setup {
        _state_dir: state_dir,
        harness,
        provider,
        api,
        session,
    }
}

fn expired_token(access: &str, refresh: Option<&str>) -> TokenRecord {
    TokenRecord {
        access_token: Some(access.into()),
        refresh_token: refresh.map(String::from),
        expires_at: Some(Utc::now() - Duration::minutes(5)),
        token_type: Some("Bearer".into()),
        scope: None,
    }
}

fn valid_token(access: &str) -> TokenRecord {
    TokenRecord {
        expires_at: Some(Utc::now() + Duration::hours(1)),
        ..expired_token(access, Some("refresh"))
    }
}

fn redirect(state: &str) -> Url {
    Url::parse(&format!("http://localhost:8888/?code=auth-code&state={state}")).unwrap()
}

#[tokio::test]
async fn authorization_then_authenticated_call() {
    let s = setup().await;
    mount_token_response(
        &s.provider,
        "authorization_code",
        200,
        token_body("access-1", Some("refresh-1")),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "listener"})))
        .expect(1)
        .mount(&s.api)
        .await;

    let url = s.session.new_token();
    assert_eq!(url, s.harness.url("/authorizeUrl"));
    let params = authorize(&s.harness).await;

    let result = s.session.complete_authorization(&redirect(&params["state"])).await;
    assert_eq!(result, RedirectResult::Success);
    let stored = s.session.tokens().cache().load();
    assert_eq!(stored.access_token.as_deref(), Some("access-1"));
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-1"));

    s.session.me().await;
    let entries = s.session.events().entries();
    assert!(!s.session.events().has_errors());
    assert_eq!(entries.last().unwrap().value["me"]["id"], "listener");
}

#[tokio::test]
async fn unregistered_redirect_uri_is_reported() {
    let s = setup().await;
    mount_token_response(
        &s.provider,
        "authorization_code",
        400,
        serde_json::json!({"error": "invalid_grant", "error_description": "Invalid redirect URI"}),
    )
    .await;
    let params = authorize(&s.harness).await;

    let result = s.session.complete_authorization(&redirect(&params["state"])).await;
    assert_eq!(result, RedirectResult::InvalidRedirectUri);
    assert_eq!(
        s.session.events().messages(),
        vec!["ERROR: Redirect URI http://localhost:8888/ has not been registered."]
    );
    assert_eq!(s.session.tokens().cache().load(), TokenRecord::default());
}

#[tokio::test]
async fn unknown_state_is_logged_as_error() {
    let s = setup().await;

    let result = s.session.complete_authorization(&redirect("forged")).await;
    assert_eq!(result, RedirectResult::Failed);
    let entries = s.session.events().entries();
    assert!(entries[0].is_error);
    assert_eq!(entries[0].value["error"]["code"], "unknown_state");
    assert!(s.provider.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn expired_token_refreshes_before_call_and_keeps_refresh_token() {
    let s = setup().await;
    s.session
        .tokens()
        .cache()
        .store(&expired_token("access-1", Some("refresh-1")))
        .unwrap();
    mount_token_response(&s.provider, "refresh_token", 200, token_body("access-2", None)).await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "listener"})))
        .expect(1)
        .mount(&s.api)
        .await;

    s.session.me().await;

    let stored = s.session.tokens().cache().load();
    assert_eq!(stored.access_token.as_deref(), Some("access-2"));
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-1"));
    assert!(stored.expires_at.unwrap() > Utc::now());
}

#[tokio::test]
async fn revoked_refresh_token_clears_record() {
    let s = setup().await;
    s.session
        .tokens()
        .cache()
        .store(&expired_token("access-1", Some("refresh-1")))
        .unwrap();
    mount_token_response(
        &s.provider,
        "refresh_token",
        400,
        serde_json::json!({"error": "invalid_grant", "error_description": "Refresh token revoked"}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&s.api)
        .await;

    s.session.me().await;

    assert_eq!(s.session.tokens().cache().load(), TokenRecord::default());
    let entries = s.session.events().entries();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].is_error);
    let text = entries[0].value["me"].as_str().unwrap();
    assert!(text.starts_with("Token has been revoked."));
    assert!(text.ends_with(&s.harness.url("/authorizeUrl")));
}

#[tokio::test]
async fn refresh_with_invalid_request_keeps_record() {
    let s = setup().await;
    let token = valid_token("access-1");
    s.session.tokens().cache().store(&token).unwrap();
    mount_token_response(
        &s.provider,
        "refresh_token",
        400,
        serde_json::json!({"error": "invalid_request"}),
    )
    .await;

    s.session.refresh_token().await;

    assert_eq!(s.session.events().messages(), vec![NO_TOKEN_MESSAGE]);
    assert_eq!(s.session.tokens().cache().load(), token);
}

#[tokio::test]
async fn nothing_playing_on_204() {
    let s = setup().await;
    s.session.tokens().cache().store(&valid_token("access-1")).unwrap();
    Mock::given(method("GET"))
        .and(path("/v1/me/player"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&s.api)
        .await;

    s.session.player_state().await;

    let entries = s.session.events().entries();
    assert_eq!(entries[0].value["playerState"], "Nothing playing right now");
}

#[tokio::test]
async fn transfer_to_missing_device() {
    let s = setup().await;
    s.session.tokens().cache().store(&valid_token("access-1")).unwrap();
    Mock::given(method("PUT"))
        .and(path("/v1/me/player"))
        .and(body_json(serde_json::json!({"device_ids": ["dev-1"]})))
        .respond_with(ResponseTemplate::new(404).set_body_json(
            serde_json::json!({"error": {"status": 404, "message": "Device not found"}}),
        ))
        .mount(&s.api)
        .await;

    s.session.transfer(Some("dev-1")).await;

    let entries = s.session.events().entries();
    assert_eq!(entries[0].value, "Device not found: Try connect first");
    assert!(entries[1].is_error);
    assert_eq!(entries[1].value["transfer"]["status"], 404);
}

#[tokio::test]
async fn play_sends_context_uri_for_albums() {
    let s = setup().await;
    s.session.tokens().cache().store(&valid_token("access-1")).unwrap();
    Mock::given(method("PUT"))
        .and(path("/v1/me/player/play"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({"context_uri": "spotify:album:4aawyAB9vmqN3uQ7FjRGTy"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&s.api)
        .await;

    s.session
        .play("https://open.spotify.com/album/4aawyAB9vmqN3uQ7FjRGTy?si=xyz")
        .await;

    assert!(!s.session.events().has_errors());
    assert_eq!(s.session.events().entries()[0].value["play"]["status"], 204);
}

#[tokio::test]
async fn unauthorized_response_is_not_retried() {
    let s = setup().await;
    let token = valid_token("stale-access");
    s.session.tokens().cache().store(&token).unwrap();
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            serde_json::json!({"error": {"status": 401, "message": "The access token expired"}}),
        ))
        .expect(1)
        .mount(&s.api)
        .await;

    s.session.me().await;

    assert_eq!(
        s.session.events().entries()[0].value["me"]["error"]["status"],
        401
    );
    assert!(s.provider.received_requests().await.unwrap().is_empty());
    assert_eq!(s.session.tokens().cache().load(), token);
}
