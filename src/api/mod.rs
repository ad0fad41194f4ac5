//! Remote customer API: wire types, auth, and the paginated HTTP client.

mod api_types;
mod auth;
mod client;
mod error;
mod types;

pub use auth::{EnvToken, StaticToken, TokenProvider};
pub use client::{CustomerClient, CustomerSource};
pub use error::ApiError;
pub use types::CustomerRecord;

#[cfg(test)]
pub(crate) use types::customer;
