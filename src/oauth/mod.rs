//! OAuth2 flows in front of the price list API.
//!
//! Two ways to get a bearer token:
//!
//! 1. Authorization code: send the user to [`PriceListClient::authorize`],
//!    receive `?code=..` on the redirect URI, then exchange it with
//!    [`PriceListClient::get_auth_token`].
//! 2. Machine to machine: [`PriceListClient::get_auth_token_machine_to_machine`]
//!    trades the client id and secret for a token directly.
//!
//! [`PriceListClient::authorize`]: crate::PriceListClient::authorize
//! [`PriceListClient::get_auth_token`]: crate::PriceListClient::get_auth_token
//! [`PriceListClient::get_auth_token_machine_to_machine`]: crate::PriceListClient::get_auth_token_machine_to_machine

mod authorize;
pub mod jwt;
mod oauth_client;

pub use authorize::AuthorizationRedirect;
pub use jwt::TokenClaims;
pub use oauth_client::TokenResponse;
