use reqwest::header::{HeaderName, HeaderValue, LOCATION};
use reqwest::StatusCode;
use url::Url;

use crate::api::PriceListClient;
use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// A redirect to the identity provider's authorization endpoint.
///
/// Hand it to whatever serves the current HTTP request: respond with
/// [`status`](Self::status) and the [`location_header`](Self::location_header).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRedirect {
    location: Url,
}

impl AuthorizationRedirect {
    /// Always `302 Found`.
    pub fn status(&self) -> StatusCode {
        StatusCode::FOUND
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    /// The `Location` header to send with the redirect.
    pub fn location_header(&self) -> Result<(HeaderName, HeaderValue)> {
        let value = HeaderValue::from_str(self.location.as_str())
            .map_err(|e| Error::Config(format!("invalid Location header: {e}")))?;
        Ok((LOCATION, value))
    }

    pub fn into_url(self) -> Url {
        self.location
    }
}

impl PriceListClient {
    /// The authorization-code URL the user should be sent to.
    ///
    /// Query parameters, in order: `response_type=code`, `client_id`,
    /// `redirect_uri`, `audience`, `scope`.
    pub fn authorization_url(&self, redirect_url: &str) -> Result<Url> {
        let client_id = self.config.require_client_id()?;

        let mut url = ClientConfig::endpoint(&self.config.authorization_url, "/authorize")?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", redirect_url)
            .append_pair("audience", &self.config.audience)
            .append_pair("scope", &self.config.scope);
        Ok(url)
    }

    /// Starts the authorization-code flow.
    ///
    /// Nothing is sent over the network; the returned redirect must be issued
    /// to the user agent by the caller, and the request handled no further.
    pub fn authorize(&self, redirect_url: &str) -> Result<AuthorizationRedirect> {
        let location = self.authorization_url(redirect_url)?;
        tracing::debug!("Redirecting to authorization endpoint {}", location.path());
        Ok(AuthorizationRedirect { location })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn client() -> PriceListClient {
        PriceListClient::with_credentials("abc123", "secret").unwrap()
    }

    #[test]
    fn authorization_url_has_expected_parameters_in_order() {
        let url = client()
            .authorization_url("https://example.com/callback")
            .unwrap();

        assert_eq!(url.host_str(), Some("rapaport-prod.auth0.com"));
        assert_eq!(url.path(), "/authorize");

        let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(
            keys,
            ["response_type", "client_id", "redirect_uri", "audience", "scope"]
        );

        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["client_id"], "abc123");
        assert_eq!(params["redirect_uri"], "https://example.com/callback");
        assert_eq!(params["audience"], "https://pricelist.rapnetapis.com");
        assert_eq!(
            params["scope"],
            "manageListings priceListWeekly instantInventory"
        );
    }

    #[test]
    fn redirect_uri_is_encoded() {
        let url = client()
            .authorization_url("https://example.com/cb?state=a&b=c")
            .unwrap();
        assert!(url
            .as_str()
            .contains("redirect_uri=https%3A%2F%2Fexample.com%2Fcb%3Fstate%3Da%26b%3Dc"));
    }

    #[test]
    fn authorize_returns_found_with_location() {
        let redirect = client().authorize("https://example.com/callback").unwrap();
        assert_eq!(redirect.status(), StatusCode::FOUND);

        let (name, value) = redirect.location_header().unwrap();
        assert_eq!(name, LOCATION);
        assert_eq!(value.to_str().unwrap(), redirect.location().as_str());
        assert!(value.to_str().unwrap().contains("response_type=code"));
    }

    #[test]
    fn authorize_uses_configured_scope_and_audience() {
        let config = ClientConfig::new("id", "secret")
            .with_authorization_url("https://login.example.com/")
            .with_scope("priceListWeekly")
            .with_audience("https://audience.example.com");
        let client = PriceListClient::new(config).unwrap();

        let url = client.authorize("https://app/cb").unwrap().into_url();
        assert!(url.as_str().starts_with("https://login.example.com/authorize?"));
        assert!(url.as_str().contains("scope=priceListWeekly"));
        assert!(url
            .as_str()
            .contains("audience=https%3A%2F%2Faudience.example.com"));
    }

    #[test]
    fn authorize_without_client_id_fails() {
        let client = PriceListClient::new(ClientConfig::default()).unwrap();
        assert!(matches!(
            client.authorize("https://app/cb"),
            Err(Error::Config(_))
        ));
    }
}
