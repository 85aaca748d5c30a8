//! Hex REST API client

pub mod client;
pub mod error;
pub mod models;
pub mod traits;

pub use client::{HexClient, RequestOptions, DEFAULT_BASE_URL};
pub use error::HexApiError;
pub use models::*;
pub use traits::HexApi;

#[cfg(test)]
pub(crate) mod mock;
