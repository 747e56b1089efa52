//! PKCE (RFC 7636) verifier/challenge pairs and OAuth state tokens.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha256};

/// RFC 7636 unreserved characters.
const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
const VERIFIER_LENGTH: usize = 64;
const STATE_LENGTH: usize = 32;

/// A fresh verifier and its S256 challenge.
#[derive(Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl std::fmt::Debug for PkcePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkcePair")
            .field("verifier", &"[REDACTED]")
            .field("challenge", &self.challenge)
            .finish()
    }
}

impl PkcePair {
    #[must_use]
    pub fn generate() -> Self {
        let verifier = random_verifier();
        let challenge = challenge_for(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// `BASE64URL(SHA256(verifier))` without padding.
#[must_use]
pub fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Alphanumeric CSRF token for the OAuth round trip.
#[must_use]
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

fn random_verifier() -> String {
    let mut rng = rand::rng();
    (0..VERIFIER_LENGTH)
        .filter_map(|_| VERIFIER_CHARSET.get(rng.random_range(0..VERIFIER_CHARSET.len())))
        .map(|&b| char::from(b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc7636_appendix_b_vector() {
        assert_eq!(
            challenge_for("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn generated_verifier_is_valid() {
        let pair = PkcePair::generate();
        assert_eq!(pair.verifier.len(), VERIFIER_LENGTH);
        assert!(pair.verifier.bytes().all(|b| VERIFIER_CHARSET.contains(&b)));
        assert_eq!(pair.challenge, challenge_for(&pair.verifier));
        assert_eq!(pair.challenge.len(), 43);
    }

    #[test]
    fn state_is_alphanumeric_and_unique() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), STATE_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
