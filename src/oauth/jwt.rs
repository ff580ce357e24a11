//! Reading, not verifying, JWT bearer tokens.
//!
//! Signatures are the API's business. The caller only needs to know who a
//! token was issued to and when it runs out, so it can fetch a new one.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Claims from a token's payload segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<u64>,
    /// Either a single audience or a list of them.
    #[serde(default)]
    pub aud: Option<Value>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.exp.map(|exp| UNIX_EPOCH + Duration::from_secs(exp))
    }

    /// True once `exp` has passed. Tokens without `exp` never expire here.
    pub fn is_expired(&self) -> bool {
        match self.expires_at() {
            Some(expiry) => SystemTime::now() >= expiry,
            None => false,
        }
    }

    /// Whether `audience` is among the token's audiences.
    pub fn has_audience(&self, audience: &str) -> bool {
        match &self.aud {
            Some(Value::String(aud)) => aud == audience,
            Some(Value::Array(auds)) => auds.iter().any(|aud| aud.as_str() == Some(audience)),
            _ => false,
        }
    }
}

/// Decodes the payload of a `header.payload.signature` token.
pub fn decode_claims(token: &str) -> Result<TokenClaims> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(Error::Decode("token is not a JWT".to_string()));
    };

    // Some issuers pad their segments anyway.
    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::Decode(format!("invalid JWT payload encoding: {e}")))?;

    serde_json::from_slice(&decoded).map_err(|e| Error::Decode(format!("invalid JWT claims: {e}")))
}
