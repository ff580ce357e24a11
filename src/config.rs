//! Client configuration.
//!
//! Every field is fixed once the client is built. The defaults point at the
//! production RapNet services and must stay byte-for-byte as they are.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::{Error, Result};
use crate::oauth::TokenResponse;

/// Base path of the RapNet technical API.
pub const DEFAULT_BASE_PATH: &str = "https://technet.rapnetapis.com";

/// Interactive (authorization-code) identity provider.
pub const DEFAULT_AUTHORIZATION_URL: &str = "https://rapaport-prod.auth0.com";

/// Token endpoint host used for both code exchange and machine-to-machine tokens.
pub const DEFAULT_MACHINE_AUTH_URL: &str = "https://authztoken.api.rapaport.com";

/// Root of the price list API.
pub const DEFAULT_PRICELIST_URL: &str = "https://technet.rapnetapis.com/pricelist/api";

/// Scopes requested during interactive authorization.
pub const DEFAULT_SCOPE: &str = "manageListings priceListWeekly instantInventory";

/// Audience requested during interactive authorization.
pub const DEFAULT_AUDIENCE: &str = "https://pricelist.rapnetapis.com";

/// Upper bound on a server-provided `Retry-After` delay.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Invoked with every token the client obtains.
pub type TokenCallback = Arc<dyn Fn(&TokenResponse) + Send + Sync>;

/// How the authorization-code exchange encodes its POST body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenBodyEncoding {
    /// JSON body sent with `Content-Type: application/x-www-form-urlencoded`.
    /// This mismatch is what the token service has always received.
    #[default]
    Legacy,
    /// JSON body with a JSON content type.
    Json,
    /// A form-encoded body with a form content type.
    Form,
}

/// Retries performed by the transport on transient statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    retry_statuses: Vec<u16>,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_statuses: vec![429, 503, 500],
            backoff: Duration::from_millis(1500),
        }
    }
}

impl RetryPolicy {
    /// Set the linear backoff base. Attempt `n` (zero-based) waits `base * (n + 1)`.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Additional attempts after the first request.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_statuses(&self) -> &[u16] {
        &self.retry_statuses
    }

    /// Check if a status code should be retried.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Delay before retry number `attempt` (zero-based).
    ///
    /// A `Retry-After` hint from the server takes precedence, capped at one minute.
    pub fn delay_for_attempt(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(hint) => hint.min(MAX_RETRY_AFTER),
            None => self.backoff * (attempt + 1),
        }
    }
}

/// Configuration for a [`PriceListClient`](crate::PriceListClient).
///
/// ```
/// use rapnet_pricelist::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new("my-client-id", "my-client-secret")
///     .with_redirect_uri("https://example.com/callback")
///     .with_timeout(Duration::from_secs(30));
/// assert_eq!(config.client_id.as_deref(), Some("my-client-id"));
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    pub base_path: String,
    pub authorization_url: String,
    pub machine_auth_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub redirect_uri: Option<String>,
    /// Notified after each successful token request. The client keeps nothing.
    pub token_callback: Option<TokenCallback>,
    pub pricelist_url: String,
    /// A previously obtained bearer token, see
    /// [`PriceListClient::cached_token`](crate::PriceListClient::cached_token).
    pub jwt: Option<SecretString>,
    pub scope: String,
    pub audience: String,
    /// Skip TLS certificate verification. Only for test environments.
    pub accept_invalid_certs: bool,
    /// Overall request timeout. `None` keeps the transport default.
    pub timeout: Option<Duration>,
    pub user_agent: String,
    pub retry: RetryPolicy,
    pub token_body_encoding: TokenBodyEncoding,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            authorization_url: DEFAULT_AUTHORIZATION_URL.to_string(),
            machine_auth_url: DEFAULT_MACHINE_AUTH_URL.to_string(),
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            token_callback: None,
            pricelist_url: DEFAULT_PRICELIST_URL.to_string(),
            jwt: None,
            scope: DEFAULT_SCOPE.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            accept_invalid_certs: false,
            timeout: None,
            user_agent: format!("rapnet-pricelist/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryPolicy::default(),
            token_body_encoding: TokenBodyEncoding::default(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_path", &self.base_path)
            .field("authorization_url", &self.authorization_url)
            .field("machine_auth_url", &self.machine_auth_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret)
            .field("redirect_uri", &self.redirect_uri)
            .field("token_callback", &self.token_callback.as_ref().map(|_| "Fn"))
            .field("pricelist_url", &self.pricelist_url)
            .field("jwt", &self.jwt)
            .field("scope", &self.scope)
            .field("audience", &self.audience)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("retry", &self.retry)
            .field("token_body_encoding", &self.token_body_encoding)
            .finish()
    }
}

impl ClientConfig {
    /// Production defaults with the given client credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(SecretString::from(client_secret.into())),
            ..Self::default()
        }
    }

    /// Production defaults overridden by `RAPNET_*` environment variables.
    ///
    /// Unset or empty variables leave the default in place.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(client_id) = env_var("RAPNET_CLIENT_ID") {
            config.client_id = Some(client_id);
        }
        if let Some(secret) = env_var("RAPNET_CLIENT_SECRET") {
            config.client_secret = Some(SecretString::from(secret));
        }
        if let Some(redirect_uri) = env_var("RAPNET_REDIRECT_URI") {
            config.redirect_uri = Some(redirect_uri);
        }
        if let Some(url) = env_var("RAPNET_AUTHORIZATION_URL") {
            config.authorization_url = url;
        }
        if let Some(url) = env_var("RAPNET_MACHINE_AUTH_URL") {
            config.machine_auth_url = url;
        }
        if let Some(url) = env_var("RAPNET_PRICELIST_URL") {
            config.pricelist_url = url;
        }
        if let Some(jwt) = env_var("RAPNET_JWT") {
            config.jwt = Some(SecretString::from(jwt));
        }
        config
    }

    pub fn with_base_path(mut self, url: impl Into<String>) -> Self {
        self.base_path = url.into();
        self
    }

    pub fn with_authorization_url(mut self, url: impl Into<String>) -> Self {
        self.authorization_url = url.into();
        self
    }

    pub fn with_machine_auth_url(mut self, url: impl Into<String>) -> Self {
        self.machine_auth_url = url.into();
        self
    }

    pub fn with_pricelist_url(mut self, url: impl Into<String>) -> Self {
        self.pricelist_url = url.into();
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    pub fn with_token_callback(
        mut self,
        callback: impl Fn(&TokenResponse) + Send + Sync + 'static,
    ) -> Self {
        self.token_callback = Some(Arc::new(callback));
        self
    }

    pub fn with_jwt(mut self, jwt: impl Into<String>) -> Self {
        self.jwt = Some(SecretString::from(jwt.into()));
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Disable TLS certificate verification.
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_token_body_encoding(mut self, encoding: TokenBodyEncoding) -> Self {
        self.token_body_encoding = encoding;
        self
    }

    /// Join `path` onto one of the configured roots.
    pub(crate) fn endpoint(root: &str, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}{}", root.trim_end_matches('/'), path))?)
    }

    pub(crate) fn require_client_id(&self) -> Result<&str> {
        self.client_id
            .as_deref()
            .ok_or_else(|| Error::Config("a client id is required".to_string()))
    }

    pub(crate) fn require_client_secret(&self) -> Result<&SecretString> {
        self.client_secret
            .as_ref()
            .ok_or_else(|| Error::Config("a client secret is required".to_string()))
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
