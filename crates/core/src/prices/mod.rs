//! Price service module.
//!
//! - [`service`] - [`PriceService`], cache-first reads with upstream fill
//! - [`validation`] - Raw request parameters to typed queries
//! - [`fill_lock`] - Per-key locks coalescing concurrent cache fills
//!
//! # Architecture
//!
//! ```text
//! HTTP handler → validation → PriceService → CacheStore
//!                                  ↓ (miss / partial coverage)
//!                             ProviderMap → adapters
//! ```

pub mod fill_lock;
pub mod service;
pub mod validation;


pub use fill_lock::FillLocks;
pub use service::{PriceService, PriceServiceConfig, PriceServiceTrait};
pub use validation::{
    parse_date, parse_date_filter, parse_resolution, parse_symbol_list, HistoricalQuery,
};
