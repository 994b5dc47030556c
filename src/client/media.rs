use crate::error::PlayauthError;

const OPEN_URL_PREFIX: &str = "https://open.spotify.com/";

/// Something playable, e.g. `spotify:album:<id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUri {
    pub kind: String,
    pub id: String,
}

impl MediaUri {
    /// Accepts a share link (`https://open.spotify.com/<kind>/<id>?...`) or a
    /// colon form (`spotify:<kind>:<id>`).
    pub fn parse(input: &str) -> Result<Self, PlayauthError> {
        let input = input.trim();
        let (kind, id) = if let Some(rest) = input.strip_prefix(OPEN_URL_PREFIX) {
            let path = rest.split(['?', '#']).next().unwrap_or_default();
            let mut segments = path.rsplit('/').filter(|s| !s.is_empty());
            let id = segments.next();
            let kind = segments.next();
            (kind, id)
        } else {
            let mut parts = input.split(':').skip(1);
            (parts.next(), parts.next())
        };

        match (kind, id) {
            (Some(kind), Some(id)) if !kind.is_empty() && !id.is_empty() => Ok(Self {
                kind: kind.to_string(),
                id: id.to_string(),
            }),
            _ => Err(PlayauthError::InvalidInput(format!(
                "cannot find a type and id in '{input}'"
            ))),
        }
    }

    pub fn uri(&self) -> String {
        format!("spotify:{}:{}", self.kind, self.id)
    }

    /// Body for `PUT me/player/play`: single items go in `uris`, collections
    /// are a `context_uri`.
    pub fn play_body(&self) -> serde_json::Value {
        match self.kind.as_str() {
            "track" | "episode" => serde_json::json!({ "uris": [self.uri()] }),
            _ => serde_json::json!({ "context_uri": self.uri() }),
        }
    }
}
