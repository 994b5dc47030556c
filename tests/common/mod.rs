pub mod provider_mock;

use std::net::SocketAddr;
use std::sync::Arc;

use playauth::config::{ProviderEndpoints, SettingsStore};
use playauth::{AppState, Clock, SystemClock};

pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";

/// A harness server bound to an ephemeral port, talking to `provider_url`.
#[allow(dead_code)]
pub struct Harness {
    pub dir: tempfile::TempDir,
    pub state: Arc<AppState>,
    pub addr: SocketAddr,
}

#[allow(dead_code)]
impl Harness {
    pub async fn start(provider_url: &str) -> Self {
        Self::start_with_clock(provider_url, Arc::new(SystemClock)).await
    }

    pub async fn start_with_clock(provider_url: &str, clock: Arc<dyn Clock>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".settings.json");
        std::fs::write(
            &path,
            serde_json::to_string(&serde_json::json!({
                "client_id": CLIENT_ID,
                "client_secret": CLIENT_SECRET,
                "redirect_uri": "http://localhost:8888/",
                "player_name": "Test Player",
            }))
            .unwrap(),
        )
        .unwrap();

        let settings = Arc::new(SettingsStore::load_or_init(&path, 8888).unwrap());
        let endpoints = ProviderEndpoints::from_base(provider_url).unwrap();
        let state = Arc::new(AppState::new(settings, endpoints, clock));
        let addr = playauth::server::spawn(state.clone()).await.unwrap();
        Self { dir, state, addr }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}/{}", self.addr, path.trim_start_matches('/'))
    }

    pub fn base_url(&self) -> reqwest::Url {
        reqwest::Url::parse(&self.url("/")).unwrap()
    }
}

/// HTTP client that does not follow redirects, so 302s can be inspected.
#[allow(dead_code)]
pub fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Hit `/authorizeUrl` and return the query parameters of the redirect target.
#[allow(dead_code)]
pub async fn authorize(harness: &Harness) -> std::collections::HashMap<String, String> {
    let resp = no_redirect_client()
        .get(harness.url("/authorizeUrl"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 302);
    let location = resp.headers()["location"].to_str().unwrap().to_string();
    let url = reqwest::Url::parse(&location).unwrap();
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Decode a form-encoded body into key/value pairs.
#[allow(dead_code)]
pub fn form_pairs(body: &[u8]) -> std::collections::HashMap<String, String> {
    let body = String::from_utf8_lossy(body);
    let url = reqwest::Url::parse(&format!("http://form.invalid/?{body}")).unwrap();
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
