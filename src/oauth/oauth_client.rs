use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::jwt::{self, TokenClaims};
use crate::api::PriceListClient;
use crate::config::{ClientConfig, TokenBodyEncoding};
use crate::error::{Error, Result};

/// Token endpoint path, relative to the machine auth URL.
const TOKEN_PATH: &str = "/api/get";

/// Body of the authorization-code exchange.
#[derive(Serialize)]
struct CodeExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

/// Body of the machine-to-machine request.
#[derive(Serialize)]
struct ClientCredentialsRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

/// A decoded token endpoint response.
///
/// The service has answered with both `access_token` and `token` over time,
/// so both are kept, along with anything else it sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenResponse {
    /// The token to send as `Authorization: Bearer ..`.
    pub fn bearer(&self) -> Option<&str> {
        self.access_token.as_deref().or(self.token.as_deref())
    }

    /// Unverified claims of the bearer token, if it is a JWT.
    pub fn claims(&self) -> Result<TokenClaims> {
        let token = self
            .bearer()
            .ok_or_else(|| Error::Decode("token response has no token".to_string()))?;
        jwt::decode_claims(token)
    }
}

impl PriceListClient {
    /// Exchanges an authorization code for a token.
    ///
    /// `POST {machine_auth_url}/api/get`. The body encoding follows
    /// [`ClientConfig::token_body_encoding`].
    pub async fn get_auth_token(&self, code: &str, redirect_url: &str) -> Result<TokenResponse> {
        // Both credentials travel in the body, alongside the code we were handed back.
        let client_id = self.config.require_client_id()?;
        let client_secret = self.config.require_client_secret()?;
        let payload = CodeExchangeRequest {
            client_id,
            client_secret: client_secret.expose_secret(),
            code,
            redirect_uri: redirect_url,
        };

        let url = ClientConfig::endpoint(&self.config.machine_auth_url, TOKEN_PATH)?;
        tracing::info!("Exchanging authorization code at {}", url);

        // The token service has always been sent JSON under a form content type.
        // We keep doing that unless told otherwise.
        let request = self.http.request(Method::POST, url);
        let request = match self.config.token_body_encoding {
            TokenBodyEncoding::Legacy => {
                let body = serde_json::to_vec(&payload).map_err(|e| {
                    Error::Config(format!("unable to encode token request: {e}"))
                })?;
                request
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(body)
            }
            TokenBodyEncoding::Json => request.json(&payload),
            TokenBodyEncoding::Form => request.form(&payload),
        };

        let token: TokenResponse = self.http.send_json(request).await?;
        self.notify_token(&token);
        Ok(token)
    }

    /// Requests a token with the client credentials alone.
    ///
    /// This is a `GET` carrying a JSON body, which is what the token service
    /// expects. Some proxies strip bodies from `GET` requests.
    pub async fn get_auth_token_machine_to_machine(&self) -> Result<TokenResponse> {
        let client_id = self.config.require_client_id()?;
        let client_secret = self.config.require_client_secret()?;
        let payload = ClientCredentialsRequest {
            client_id,
            client_secret: client_secret.expose_secret(),
        };

        let url = ClientConfig::endpoint(&self.config.machine_auth_url, TOKEN_PATH)?;
        tracing::info!("Requesting machine-to-machine token from {}", url);

        // Yes, a GET with a body. That's what the endpoint wants.
        let request = self.http.request(Method::GET, url).json(&payload);

        let token: TokenResponse = self.http.send_json(request).await?;
        self.notify_token(&token);
        Ok(token)
    }

    #[deprecated(note = "use `get_auth_token_machine_to_machine` instead")]
    pub async fn get_auth_token_machine_to_machin(&self) -> Result<TokenResponse> {
        self.get_auth_token_machine_to_machine().await
    }

    fn notify_token(&self, token: &TokenResponse) {
        // A response without a token is still handed on; the caller decides what to do.
        if token.bearer().is_none() {
            tracing::warn!("Token endpoint answered without a token field");
        }
        if let Some(callback) = &self.config.token_callback {
            callback(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bearer_prefers_access_token() {
        let token: TokenResponse = serde_json::from_value(json!({
            "access_token": "primary",
            "token": "fallback",
            "token_type": "Bearer",
            "expires_in": 86400
        }))
        .unwrap();
        assert_eq!(token.bearer(), Some("primary"));
        assert_eq!(token.expires_in, Some(86400));
    }

    #[test]
    fn bearer_falls_back_to_token() {
        let token: TokenResponse = serde_json::from_value(json!({ "token": "abc" })).unwrap();
        assert_eq!(token.bearer(), Some("abc"));
        assert!(token.extra.is_empty());
    }

    #[test]
    fn unknown_fields_are_kept() {
        let token: TokenResponse = serde_json::from_value(json!({
            "access_token": "t",
            "id_token": "id"
        }))
        .unwrap();
        assert_eq!(token.extra.get("id_token"), Some(&json!("id")));
    }

    #[test]
    fn claims_without_token_is_an_error() {
        let token: TokenResponse = serde_json::from_value(json!({})).unwrap();
        assert!(token.bearer().is_none());
        assert!(matches!(token.claims(), Err(Error::Decode(_))));
    }

    #[test]
    fn legacy_body_is_json() {
        let payload = CodeExchangeRequest {
            client_id: "id",
            client_secret: "secret",
            code: "c0de",
            redirect_uri: "https://app/cb",
        };
        let body: Value = serde_json::from_slice(&serde_json::to_vec(&payload).unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "client_id": "id",
                "client_secret": "secret",
                "code": "c0de",
                "redirect_uri": "https://app/cb"
            })
        );
    }

    #[tokio::test]
    async fn missing_client_id_is_reported_before_secret() {
        let client = PriceListClient::new(ClientConfig::default()).unwrap();

        let err = client.get_auth_token_machine_to_machine().await.unwrap_err();
        assert_eq!(err.to_string(), "configuration error: a client id is required");

        let err = client.get_auth_token("code", "https://app/cb").await.unwrap_err();
        assert_eq!(err.to_string(), "configuration error: a client id is required");
    }

    #[tokio::test]
    async fn missing_secret_is_reported_once_id_is_present() {
        let mut config = ClientConfig::default();
        config.client_id = Some("id".to_string());
        let client = PriceListClient::new(config).unwrap();

        let err = client.get_auth_token_machine_to_machine().await.unwrap_err();
        assert_eq!(err.to_string(), "configuration error: a client secret is required");
    }
}
