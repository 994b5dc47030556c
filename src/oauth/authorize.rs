use reqwest::Url;

use crate::config::ClientCredentials;

use super::verification::VerificationStore;

/// Capabilities requested on every authorization.
pub const SCOPES: &[&str] = &[
    "streaming",
    "user-read-email",
    "user-read-private",
    "user-read-playback-state",
    "user-modify-playback-state",
];

/// Build the provider authorize URL for a brand new authorization attempt.
///
/// Allocates one entry in `store`; the caller redirects the browser to the
/// returned URL.
pub fn build_authorize_url(
    store: &VerificationStore,
    authorize_endpoint: &Url,
    credentials: &ClientCredentials,
) -> Url {
    let entry = store.create();
    let scope = SCOPES.join(" ");

    let mut url = authorize_endpoint.clone();
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &credentials.client_id)
        .append_pair("redirect_uri", &credentials.redirect_uri)
        .append_pair("scope", &scope)
        .append_pair("state", &entry.state)
        .append_pair("code_challenge_method", "S256")
        .append_pair("code_challenge", &entry.code_challenge);

    tracing::info!(client_id = %credentials.client_id, "built authorize URL");
    url
}
