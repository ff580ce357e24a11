//! Client for the RapNet diamond price list API.
//!
//! The crate wraps the price list endpoints and the two OAuth2 flows that
//! guard them: interactive authorization-code and machine-to-machine.
//! Each operation builds one request, retries it on `429`, `500` and `503`
//! (two extra attempts at most), and decodes the body.
//!
//! ```no_run
//! use rapnet_pricelist::{AcceptType, ClientConfig, PriceItemsQuery, PriceListClient};
//!
//! # async fn example() -> rapnet_pricelist::Result<()> {
//! let client = PriceListClient::new(ClientConfig::from_env())?;
//! let token = client.get_auth_token_machine_to_machine().await?;
//! let bearer = token.bearer().unwrap_or_default();
//!
//! let query = PriceItemsQuery::new().size("1.01").color("G").clarity("VS1");
//! let items = client.get_price_items(bearer, &query).await?;
//! let changes = client.get_prices_changes(bearer, Some("Round")).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
mod http_client;
pub mod oauth;

pub use api::{AcceptType, Payload, PriceItemsQuery, PriceListClient, DEFAULT_SHAPE};
pub use config::{ClientConfig, RetryPolicy, TokenBodyEncoding, TokenCallback};
pub use error::{Error, Result};
pub use oauth::{AuthorizationRedirect, TokenClaims, TokenResponse};
