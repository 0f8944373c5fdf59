//! Rate and multiplier reference tables
//!
//! Both tables are loaded once (from configuration or the built-in defaults)
//! and never mutated afterwards.

use crate::error::AppError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Base rate used when a destination or tier is missing from the table
pub const DEFAULT_BASE_RATE: f64 = 30.0;

/// Shipping speed class
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ServiceTier {
    Normal,
    Express,
    #[serde(alias = "urgente")]
    Urgent,
}

impl ServiceTier {
    pub const ALL: [ServiceTier; 3] = [ServiceTier::Normal, ServiceTier::Express, ServiceTier::Urgent];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceTier::Normal => "normal",
            ServiceTier::Express => "express",
            ServiceTier::Urgent => "urgent",
        }
    }
}

impl fmt::Display for ServiceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceTier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(ServiceTier::Normal),
            "express" => Ok(ServiceTier::Express),
            "urgent" | "urgente" => Ok(ServiceTier::Urgent),
            other => Err(AppError::InvalidInput(format!(
                "Unknown service tier '{}', expected normal, express or urgent",
                other
            ))),
        }
    }
}

/// Base amounts per tier for one destination
pub type TierRates = BTreeMap<ServiceTier, f64>;

/// Destination name -> tier -> base amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    destinations: BTreeMap<String, TierRates>,
}

impl RateTable {
    /// Base amount for `(destination, tier)`, `None` when either is absent
    pub fn base_rate(&self, destination: &str, tier: ServiceTier) -> Option<f64> {
        self.destinations.get(destination)?.get(&tier).copied()
    }

    fn validate(&self) -> Result<(), AppError> {
        for (destination, tiers) in &self.destinations {
            for (tier, amount) in tiers {
                if !amount.is_finite() || *amount < 0.0 {
                    return Err(AppError::Config(format!(
                        "Rate for {} / {} must be a non-negative number, got {}",
                        destination, tier, amount
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for RateTable {
    fn default() -> Self {
        let rows: [(&str, [f64; 3]); 4] = [
            ("Lima", [15.0, 25.0, 40.0]),
            ("Arequipa", [20.0, 35.0, 55.0]),
            ("Cusco", [25.0, 40.0, 65.0]),
            ("Piura", [22.0, 38.0, 60.0]),
        ];

        let destinations = rows
            .iter()
            .map(|(name, amounts)| {
                let tiers = ServiceTier::ALL
                    .iter()
                    .copied()
                    .zip(amounts.iter().copied())
                    .collect();
                (name.to_string(), tiers)
            })
            .collect();

        Self { destinations }
    }
}

/// One weight range; `max_kg` is inclusive, `None` means unbounded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightBracket {
    pub label: String,
    pub max_kg: Option<f64>,
    pub factor: f64,
}

impl WeightBracket {
    fn new(label: &str, max_kg: Option<f64>, factor: f64) -> Self {
        Self {
            label: label.to_string(),
            max_kg,
            factor,
        }
    }

    fn contains(&self, weight_kg: f64) -> bool {
        self.max_kg.map_or(true, |max| weight_kg <= max)
    }
}

/// Weight brackets plus the flat surcharge multipliers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiplierTable {
    pub weight_brackets: Vec<WeightBracket>,
    pub fragile: f64,
    pub insured: f64,
    pub holiday: f64,
    pub peak_season: f64,
}

impl Default for MultiplierTable {
    fn default() -> Self {
        Self {
            weight_brackets: vec![
                WeightBracket::new("0-1kg", Some(1.0), 1.0),
                WeightBracket::new("1-5kg", Some(5.0), 1.2),
                WeightBracket::new("5-10kg", Some(10.0), 1.5),
                WeightBracket::new("10-20kg", Some(20.0), 2.0),
                WeightBracket::new("20kg+", None, 3.0),
            ],
            fragile: 1.3,
            insured: 1.15,
            holiday: 1.25,
            peak_season: 1.2,
        }
    }
}

impl MultiplierTable {
    /// The single bracket a weight falls into
    pub fn bracket_for(&self, weight_kg: f64) -> Option<&WeightBracket> {
        self.weight_brackets.iter().find(|b| b.contains(weight_kg))
    }

    /// Brackets must ascend, end unbounded, and never get cheaper as weight grows
    fn validate(&self) -> Result<(), AppError> {
        if self.weight_brackets.is_empty() {
            return Err(AppError::Config("At least one weight bracket is required".to_string()));
        }

        let count = self.weight_brackets.len();
        let mut previous_max: Option<f64> = None;
        let mut previous_factor = 0.0_f64;
        for (i, bracket) in self.weight_brackets.iter().enumerate() {
            if !bracket.factor.is_finite() || bracket.factor <= 0.0 {
                return Err(AppError::Config(format!(
                    "Bracket '{}' factor must be positive, got {}",
                    bracket.label, bracket.factor
                )));
            }
            if bracket.factor < previous_factor {
                return Err(AppError::Config(format!(
                    "Bracket '{}' factor {} is lower than the previous bracket",
                    bracket.label, bracket.factor
                )));
            }
            previous_factor = bracket.factor;

            let is_last = i + 1 == count;
            match (bracket.max_kg, is_last) {
                (None, true) => {}
                (None, false) => {
                    return Err(AppError::Config(format!(
                        "Only the last bracket may be unbounded, '{}' is not last",
                        bracket.label
                    )));
                }
                (Some(_), true) => {
                    return Err(AppError::Config(format!(
                        "Last weight bracket '{}' must be unbounded (max_kg: null)",
                        bracket.label
                    )));
                }
                (Some(max), false) => {
                    let ascending = previous_max.map_or(true, |prev| max > prev);
                    if !max.is_finite() || max < 0.0 || !ascending {
                        return Err(AppError::Config(format!(
                            "Bracket '{}' upper bound {} must be finite and above the previous bound",
                            bracket.label, max
                        )));
                    }
                    previous_max = Some(max);
                }
            }
        }

        for (name, factor) in [
            ("fragile", self.fragile),
            ("insured", self.insured),
            ("holiday", self.holiday),
            ("peak_season", self.peak_season),
        ] {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(AppError::Config(format!(
                    "Multiplier '{}' must be positive, got {}",
                    name, factor
                )));
            }
        }
        Ok(())
    }
}

/// Everything the rate engine is constructed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffConfig {
    pub default_rate: f64,
    pub rates: RateTable,
    pub multipliers: MultiplierTable,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            default_rate: DEFAULT_BASE_RATE,
            rates: RateTable::default(),
            multipliers: MultiplierTable::default(),
        }
    }
}

impl TariffConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.default_rate.is_finite() || self.default_rate < 0.0 {
            return Err(AppError::Config(format!(
                "default_rate must be a non-negative number, got {}",
                self.default_rate
            )));
        }
        self.rates.validate()?;
        self.multipliers.validate()
    }
}
