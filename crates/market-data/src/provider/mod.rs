//! Upstream price providers.
//!
//! This module contains:
//! - The `PriceProvider` trait every upstream adapter implements
//! - The Finnhub (quotes) and Alpha Vantage (series) adapters
//! - `ProviderMap`, which routes each operation to its adapter
//!
//! Every adapter owns one circuit breaker and one retry policy for its
//! upstream; see [`crate::resilience`].

mod http;
mod provider_map;
mod traits;

pub mod alpha_vantage;
pub mod finnhub;

pub use http::UPSTREAM_TIMEOUT;
pub use provider_map::ProviderMap;
pub use traits::PriceProvider;
