//! HS256 access tokens
//!
//! Header and claims are base64url JSON, signed with HMAC-SHA256 over
//! `header.payload`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use super::Role;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token format")]
    Malformed,

    #[error("Invalid signature")]
    BadSignature,

    #[error("Unsupported algorithm")]
    UnsupportedAlgorithm,

    #[error("Token expired")]
    Expired,

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct JwtHeader {
    alg: String,
    typ: String,
}

impl Default for JwtHeader {
    fn default() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix seconds)
    pub iat: u64,
    /// Expiration (Unix seconds)
    pub exp: u64,
}

fn sign(signing_input: &str, secret: &str) -> Result<HmacSha256, TokenError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| TokenError::Encoding(e.to_string()))?;
    mac.update(signing_input.as_bytes());
    Ok(mac)
}

pub(crate) fn encode<T: Serialize>(claims: &T, secret: &str) -> Result<String, TokenError> {
    let header_json =
        serde_json::to_vec(&JwtHeader::default()).map_err(|e| TokenError::Encoding(e.to_string()))?;
    let payload_json = serde_json::to_vec(claims).map_err(|e| TokenError::Encoding(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(payload_json)
    );
    let signature = sign(&signing_input, secret)?.finalize().into_bytes();

    Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
}

fn decode<T: DeserializeOwned>(token: &str, secret: &str) -> Result<T, TokenError> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| TokenError::Malformed)?;
    sign(&format!("{}.{}", header_b64, payload_b64), secret)?
        .verify_slice(&signature)
        .map_err(|_| TokenError::BadSignature)?;

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|_| TokenError::Malformed)?;
    let header: JwtHeader =
        serde_json::from_slice(&header_bytes).map_err(|_| TokenError::Malformed)?;
    if header.alg != "HS256" {
        return Err(TokenError::UnsupportedAlgorithm);
    }

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::Malformed)
}

fn now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Issue an access token valid for `ttl_seconds`
pub fn issue_token(
    user_id: &str,
    email: &str,
    role: Role,
    secret: &str,
    ttl_seconds: u64,
) -> Result<String, TokenError> {
    let iat = now();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        iat,
        exp: iat.saturating_add(ttl_seconds),
    };
    encode(&claims, secret)
}

/// Verify signature and expiry, returning the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let claims: Claims = decode(token, secret)?;
    if claims.exp <= now() {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

/// Token from an `Authorization: Bearer ...` header value
pub fn extract_bearer_token(auth_header: Option<&str>) -> Option<&str> {
    auth_header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
