//! Rate Engine
//!
//! Composes a shipping price from a base rate, one weight-bracket factor and
//! any requested surcharge factors. Factors compose multiplicatively, so the
//! order they are applied in never changes the result.

use super::table::{ServiceTier, TariffConfig};
use crate::error::{validate_weight, AppError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Optional surcharges for a quote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct QuoteOptions {
    #[serde(alias = "fragil")]
    pub fragile: bool,
    #[serde(alias = "seguro")]
    pub insured: bool,
    #[serde(alias = "esFeriado", alias = "feriado", alias = "is_holiday")]
    pub holiday: bool,
    #[serde(alias = "temporadaAlta")]
    pub peak_season: bool,
}

/// A single price request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub destination: String,
    pub tier: ServiceTier,
    pub weight_kg: f64,
    #[serde(default)]
    pub options: QuoteOptions,
}

/// A surcharge that was applied to a quote
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedFactor {
    pub name: &'static str,
    pub factor: f64,
}

/// Priced quote with its breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub destination: String,
    pub tier: ServiceTier,
    pub weight_kg: f64,
    pub base_rate: f64,
    /// True when the destination or tier was missing from the rate table
    pub default_rate_used: bool,
    pub bracket: String,
    pub bracket_factor: f64,
    pub surcharges: Vec<AppliedFactor>,
    pub amount: f64,
}

/// Shipping price calculator over immutable reference tables
#[derive(Debug, Clone)]
pub struct RateEngine {
    config: TariffConfig,
}

impl Default for RateEngine {
    fn default() -> Self {
        Self {
            config: TariffConfig::default(),
        }
    }
}

impl RateEngine {
    /// Build an engine, rejecting tables that break the pricing invariants
    pub fn new(config: TariffConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Price for a shipment, rounded to the cent
    pub fn quote(
        &self,
        destination: &str,
        tier: ServiceTier,
        weight_kg: f64,
        options: QuoteOptions,
    ) -> Result<f64, AppError> {
        let request = QuoteRequest {
            destination: destination.to_string(),
            tier,
            weight_kg,
            options,
        };
        Ok(self.quote_detailed(&request)?.amount)
    }

    /// Price for a shipment together with every factor that went into it
    pub fn quote_detailed(&self, request: &QuoteRequest) -> Result<Quote, AppError> {
        validate_weight(request.weight_kg)?;

        let (base_rate, default_rate_used) =
            match self.config.rates.base_rate(&request.destination, request.tier) {
                Some(rate) => (rate, false),
                None => {
                    warn!(
                        "No rate for {} / {}, using default base rate {}",
                        request.destination, request.tier, self.config.default_rate
                    );
                    (self.config.default_rate, true)
                }
            };

        let multipliers = &self.config.multipliers;
        let bracket = multipliers.bracket_for(request.weight_kg).ok_or_else(|| {
            AppError::Internal(format!("No weight bracket covers {} kg", request.weight_kg))
        })?;

        let options = &request.options;
        let surcharges: Vec<AppliedFactor> = [
            (options.fragile, "fragile", multipliers.fragile),
            (options.insured, "insured", multipliers.insured),
            (options.holiday, "holiday", multipliers.holiday),
            (options.peak_season, "peak_season", multipliers.peak_season),
        ]
        .into_iter()
        .filter(|(requested, _, _)| *requested)
        .map(|(_, name, factor)| AppliedFactor { name, factor })
        .collect();

        let raw = surcharges
            .iter()
            .fold(base_rate * bracket.factor, |amount, s| amount * s.factor);
        let amount = round_to_cents(raw);

        debug!(
            "Quote {} / {} / {} kg: base {} x {} ({}) x {} surcharges = {}",
            request.destination,
            request.tier,
            request.weight_kg,
            base_rate,
            bracket.factor,
            bracket.label,
            surcharges.len(),
            amount
        );

        Ok(Quote {
            destination: request.destination.clone(),
            tier: request.tier,
            weight_kg: request.weight_kg,
            base_rate,
            default_rate_used,
            bracket: bracket.label.clone(),
            bracket_factor: bracket.factor,
            surcharges,
            amount,
        })
    }
}

/// Round to two decimals, halves away from zero
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
