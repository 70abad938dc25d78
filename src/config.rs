use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::inputs::IntoContractDecimal;
use crate::types::ContractError;

/// Engine-wide numeric settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ContractConfig {
    /// Tolerance for ratio and percentage comparisons (0-100 scale).
    pub ratio_tolerance: Decimal,
    /// Decimal places monetary outputs are rounded to.
    pub currency_decimal_places: u32,
    /// Murabaha markup (percent of cost) above which a warning is raised.
    pub max_markup_rate: Decimal,
}

impl Default for ContractConfig {
    fn default() -> Self {
        ContractConfig {
            ratio_tolerance: dec!(0.01),
            currency_decimal_places: 2,
            max_markup_rate: dec!(30),
        }
    }
}

impl std::str::FromStr for ContractConfig {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: ContractConfig = serde_json::from_str(s)
            .map_err(|e| ContractError::Configuration(format!("Failed to parse config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

impl ContractConfig {
    pub fn builder() -> ContractConfigBuilder {
        ContractConfigBuilder::default()
    }

    /// Validates the configuration for logical consistency.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.ratio_tolerance < Decimal::ZERO {
            return Err(ContractError::Configuration("Ratio tolerance must be non-negative".to_string()));
        }
        if self.ratio_tolerance >= Decimal::ONE {
            return Err(ContractError::Configuration(
                "Ratio tolerance must be below one percentage point".to_string(),
            ));
        }
        if self.currency_decimal_places > 8 {
            return Err(ContractError::Configuration(
                "Currency decimal places must be between 0 and 8".to_string(),
            ));
        }
        if self.max_markup_rate <= Decimal::ZERO {
            return Err(ContractError::Configuration("Maximum markup rate must be positive".to_string()));
        }
        Ok(())
    }

    /// Loads configuration from a JSON file.
    pub fn try_from_json(path: &str) -> Result<Self, ContractError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ContractError::Configuration(format!("Failed to read config file: {}", e)))?;
        let config: ContractConfig = content.parse()?;
        tracing::debug!(path, "loaded contract configuration");
        Ok(config)
    }

    /// Returns true when `a` and `b` differ by no more than the ratio tolerance.
    /// Figures too far apart to subtract are never within tolerance.
    pub fn within_tolerance(&self, a: Decimal, b: Decimal) -> bool {
        a.checked_sub(b).is_some_and(|diff| diff.abs() <= self.ratio_tolerance)
    }
}

#[derive(Default)]
pub struct ContractConfigBuilder {
    ratio_tolerance: Option<Decimal>,
    currency_decimal_places: Option<u32>,
    max_markup_rate: Option<Decimal>,
    errors: Vec<ContractError>,
}

impl ContractConfigBuilder {
    pub fn ratio_tolerance(mut self, tolerance: impl IntoContractDecimal) -> Self {
        match tolerance.into_decimal_for("ratioTolerance") {
            Ok(t) => self.ratio_tolerance = Some(t),
            Err(e) => self.errors.push(e),
        }
        self
    }

    pub fn currency_decimal_places(mut self, places: u32) -> Self {
        self.currency_decimal_places = Some(places);
        self
    }

    pub fn max_markup_rate(mut self, rate: impl IntoContractDecimal) -> Self {
        match rate.into_decimal_for("maxMarkupRate") {
            Ok(r) => self.max_markup_rate = Some(r),
            Err(e) => self.errors.push(e),
        }
        self
    }

    pub fn build(self) -> Result<ContractConfig, ContractError> {
        if let Some(e) = self.errors.into_iter().next() {
            return Err(e);
        }

        let defaults = ContractConfig::default();
        let config = ContractConfig {
            ratio_tolerance: self.ratio_tolerance.unwrap_or(defaults.ratio_tolerance),
            currency_decimal_places: self.currency_decimal_places.unwrap_or(defaults.currency_decimal_places),
            max_markup_rate: self.max_markup_rate.unwrap_or(defaults.max_markup_rate),
        };
        config.validate()?;
        Ok(config)
    }
}
