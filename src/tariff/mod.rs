//! Tariff calculation
//!
//! Static rate and multiplier tables plus the engine that prices a shipment.

pub mod engine;
pub mod table;

pub use engine::{Quote, QuoteOptions, QuoteRequest, RateEngine};
pub use table::{ServiceTier, TariffConfig};
