use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use secrecy::ExposeSecret;
use url::Url;

use super::payload::{AcceptType, Payload};
use super::query::{self, PriceItemsQuery, DEFAULT_SHAPE};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http_client::HttpClient;
use crate::oauth::jwt;

/// Client for the RapNet price list API and its token endpoints.
///
/// Every call is a single, independent request. The client holds no tokens;
/// the caller obtains one through the `oauth` operations and passes it back in.
///
/// ```no_run
/// use rapnet_pricelist::{AcceptType, PriceListClient};
///
/// # async fn example() -> rapnet_pricelist::Result<()> {
/// let client = PriceListClient::with_credentials("client-id", "client-secret")?;
/// let token = client.get_auth_token_machine_to_machine().await?;
/// let bearer = token.bearer().unwrap_or_default();
///
/// let prices = client
///     .get_prices_list(bearer, Some("Princess"), AcceptType::Json)
///     .await?;
/// println!("{:?}", prices.as_json());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PriceListClient {
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) http: HttpClient,
}

impl PriceListClient {
    /// Builds a client, and its transport, from the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        tracing::debug!(
            "Creating PriceListClient for {} (auth: {})",
            config.pricelist_url,
            config.machine_auth_url
        );
        let http = HttpClient::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    /// A client against the production services with the given credentials.
    pub fn with_credentials(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        Self::new(ClientConfig::new(client_id, client_secret))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The configured `jwt`, unless it is a JWT whose `exp` has passed.
    ///
    /// Tokens that are not JWTs are returned as-is; only the server can judge them.
    pub fn cached_token(&self) -> Option<&str> {
        let token = self.config.jwt.as_ref()?.expose_secret();
        match jwt::decode_claims(token) {
            Ok(claims) if claims.is_expired() => {
                tracing::debug!("Cached token has expired");
                None
            }
            Ok(_) => Some(token),
            Err(e) => {
                tracing::debug!("Cached token is not a readable JWT ({}), using it as-is", e);
                Some(token)
            }
        }
    }

    /// Retrieves the price list for a shape.
    ///
    /// The body is decoded by the response's content type: JSON is parsed,
    /// XML comes back as text and DBF as bytes.
    pub async fn get_prices_list(
        &self,
        token: &str,
        shape: Option<&str>,
        accept: AcceptType,
    ) -> Result<Payload> {
        let shape = shape.unwrap_or(DEFAULT_SHAPE);
        let url = query::prices_list_url(&self.config.pricelist_url, shape)?;
        self.fetch(token, url, accept).await
    }

    /// Retrieves the price list as normalized CSV.
    pub async fn get_normalized_prices_list(
        &self,
        token: &str,
        shape: Option<&str>,
        csvnormalized: bool,
    ) -> Result<Payload> {
        let url = query::normalized_prices_list_url(
            &self.config.pricelist_url,
            shape.unwrap_or(DEFAULT_SHAPE),
            csvnormalized,
        )?;
        self.fetch(token, url, AcceptType::Csv).await
    }

    /// Retrieves the price items matching a shape, size, color and clarity.
    ///
    /// Fails with [`Error::MissingArgument`](crate::Error::MissingArgument)
    /// before sending anything if a filter is missing.
    pub async fn get_price_items(&self, token: &str, query: &PriceItemsQuery) -> Result<Payload> {
        let url = query::price_items_url(&self.config.pricelist_url, query)?;
        self.fetch(token, url, query.accept_type()).await
    }

    /// Retrieves recent price changes for a shape.
    pub async fn get_prices_changes(&self, token: &str, shape: Option<&str>) -> Result<Payload> {
        let shape = shape.unwrap_or(DEFAULT_SHAPE);
        let url = query::prices_changes_url(&self.config.pricelist_url, shape)?;
        self.fetch(token, url, AcceptType::Json).await
    }

    async fn fetch(&self, token: &str, url: Url, accept: AcceptType) -> Result<Payload> {
        let request = self
            .http
            .request(Method::GET, url)
            .header(ACCEPT, accept.as_mime())
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(token);

        let response = self.http.send(request).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?;

        Payload::decode(accept, content_type.as_deref(), &body)
    }
}
