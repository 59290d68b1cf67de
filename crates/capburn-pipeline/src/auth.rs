//! Shared-secret authentication for render requests.
//!
//! A caller may present the secret in a header (`X-Render-Secret` or
//! `Authorization: Bearer`) or inline in the request body. The header wins
//! when present; the inline field is only consulted without one.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{PipelineError, PipelineResult};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the render secret.
pub const SECRET_HEADER: &str = "x-render-secret";

const DIGEST_KEY: &[u8] = b"capburn-render-secret";

/// Compares presented secrets against the configured one in constant time.
///
/// Both sides are reduced to an HMAC-SHA256 tag first, so neither the
/// content nor the length of the configured secret leaks through timing.
#[derive(Clone)]
pub struct SecretVerifier {
    expected_tag: Option<Vec<u8>>,
}

impl std::fmt::Debug for SecretVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretVerifier")
            .field("configured", &self.expected_tag.is_some())
            .finish()
    }
}

impl SecretVerifier {
    /// An empty secret rejects every request.
    pub fn new(secret: &str) -> Self {
        let expected_tag = if secret.is_empty() {
            None
        } else {
            digest(secret)
        };
        Self { expected_tag }
    }

    /// Check a single presented secret.
    pub fn verify(&self, presented: &str) -> bool {
        let Some(expected) = &self.expected_tag else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(DIGEST_KEY) else {
            return false;
        };
        mac.update(presented.as_bytes());
        mac.verify_slice(expected).is_ok()
    }

    /// Authorize a request from its header credential and inline field.
    pub fn authorize(&self, header: Option<&str>, inline: Option<&str>) -> PipelineResult<()> {
        let presented = match header {
            Some(h) => Some(h),
            None => inline,
        };
        match presented {
            Some(secret) if self.verify(secret) => Ok(()),
            _ => Err(PipelineError::Unauthorized),
        }
    }
}

fn digest(secret: &str) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(DIGEST_KEY).ok()?;
    mac.update(secret.as_bytes());
    Some(mac.finalize().into_bytes().to_vec())
}

/// Extract the token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(authorization: &str) -> Option<&str> {
    let (scheme, token) = authorization.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Pick the header credential: `X-Render-Secret` first, then a bearer token.
pub fn header_credential<'a>(
    secret_header: Option<&'a str>,
    authorization: Option<&'a str>,
) -> Option<&'a str> {
    secret_header
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| authorization.and_then(bearer_token))
}
