use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Random bytes behind each `state` value.
pub const STATE_BYTES: usize = 16;
/// Random bytes behind each code verifier; encodes to 86 characters.
pub const VERIFIER_BYTES: usize = 64;

pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
}

/// URL-safe random token carrying `len` bytes of entropy.
pub fn random_token(len: usize) -> String {
    let buf: Vec<u8> = (0..len).map(|_| rand::random::<u8>()).collect();
    URL_SAFE_NO_PAD.encode(buf)
}

/// S256 transform: base64url (no padding) of the SHA-256 of the verifier.
pub fn derive_challenge(code_verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

pub fn generate_pkce() -> PkceChallenge {
    let code_verifier = random_token(VERIFIER_BYTES);
    let code_challenge = derive_challenge(&code_verifier);

    PkceChallenge {
        code_verifier,
        code_challenge,
    }
}
