mod client;
mod payload;
mod query;

pub use client::PriceListClient;
pub use payload::{AcceptType, Payload};
pub use query::{PriceItemsQuery, DEFAULT_SHAPE};
