//! Strategy registry.
//!
//! Resolves a contract-type tag to its strategy and dispatches the optional
//! capabilities. The registry is built once and never changes afterwards.

use std::str::FromStr;
use std::sync::LazyLock;

use rust_decimal::Decimal;
use strum::IntoEnumIterator;
use tracing::{debug, warn};

use crate::config::ContractConfig;
use crate::contracts::ijarah::IjarahStrategy;
use crate::contracts::mudarabah::MudarabahStrategy;
use crate::contracts::murabaha::MurabahaStrategy;
use crate::contracts::musharakah::MusharakahStrategy;
use crate::contracts::salam::SalamStrategy;
use crate::terms::ContractTerms;
use crate::traits::ContractStrategy;
use crate::types::{
    ContractError, ContractMetrics, ContractType, EarlySettlement, LossAllocation, PaymentScheduleEntry,
    ProfitDistribution, ValidationResult,
};

static GLOBAL: LazyLock<ContractStrategyFactory> = LazyLock::new(ContractStrategyFactory::new);

pub struct ContractStrategyFactory {
    strategies: Vec<Box<dyn ContractStrategy>>,
}

impl Default for ContractStrategyFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ContractStrategyFactory {
    /// Registry using the default configuration.
    pub fn new() -> Self {
        Self::build(ContractConfig::default())
    }

    /// Registry whose strategies share a custom configuration.
    pub fn with_config(config: ContractConfig) -> Result<Self, ContractError> {
        if let Err(e) = config.validate() {
            warn!(error = %e, "rejected contract configuration");
            return Err(e);
        }
        Ok(Self::build(config))
    }

    /// Registers one strategy per contract type, in declaration order.
    fn build(config: ContractConfig) -> Self {
        let strategies = ContractType::iter()
            .map(|contract_type| -> Box<dyn ContractStrategy> {
                match contract_type {
                    ContractType::Murabaha => Box::new(MurabahaStrategy::new(config.clone())),
                    ContractType::Mudarabah => Box::new(MudarabahStrategy::new(config.clone())),
                    ContractType::Musharakah => Box::new(MusharakahStrategy::new(config.clone())),
                    ContractType::Ijarah => Box::new(IjarahStrategy::new(config.clone())),
                    ContractType::Salam => Box::new(SalamStrategy::new(config.clone())),
                }
            })
            .collect();
        Self { strategies }
    }

    /// Process-wide registry with the default configuration.
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Looks up a strategy by tag, returning `None` for unknown tags.
    pub fn get_strategy(&self, tag: &str) -> Option<&dyn ContractStrategy> {
        match ContractType::from_str(tag) {
            Ok(contract_type) => {
                debug!(%contract_type, "resolved contract strategy");
                self.by_type(contract_type)
            }
            Err(_) => {
                warn!(tag, "unknown contract type");
                None
            }
        }
    }

    /// Resolves the strategy for a terms record by its own tag.
    pub fn strategy_for(&self, terms: &ContractTerms) -> Result<&dyn ContractStrategy, ContractError> {
        let contract_type = terms.contract_type();
        self.by_type(contract_type)
            .ok_or_else(|| ContractError::UnknownContractType(contract_type.to_string()))
    }

    fn by_type(&self, contract_type: ContractType) -> Option<&dyn ContractStrategy> {
        self.strategies
            .iter()
            .find(|s| s.contract_type() == contract_type)
            .map(|s| &**s)
    }

    /// Registered contract types, in registration order.
    pub fn available_types(&self) -> Vec<ContractType> {
        self.strategies.iter().map(|s| s.contract_type()).collect()
    }

    pub fn display_names(&self) -> Vec<(ContractType, &'static str)> {
        self.strategies
            .iter()
            .map(|s| (s.contract_type(), s.display_name()))
            .collect()
    }

    /// Validates typed terms with their own strategy.
    pub fn validate_terms(&self, terms: &ContractTerms) -> ValidationResult {
        match self.strategy_for(terms).and_then(|s| s.validate(terms)) {
            Ok(result) => result,
            Err(e) => ValidationResult::invalid(e.to_string()),
        }
    }

    /// Validates an untrusted terms record under `tag`.
    ///
    /// Never fails: unknown tags and records that do not fit the tag's term
    /// shape are reported as validation errors.
    pub fn validate_contract(&self, tag: &str, terms: &serde_json::Value) -> ValidationResult {
        let Some(strategy) = self.get_strategy(tag) else {
            return ValidationResult::invalid(format!("Unknown contract type: {}", tag));
        };
        let canonical = strategy.contract_type();

        let Some(record) = terms.as_object() else {
            return ValidationResult::invalid("Contract terms must be a JSON object");
        };
        let mut record = record.clone();

        if let Some(declared) = record.get("contractType") {
            let matches = declared
                .as_str()
                .and_then(|s| ContractType::from_str(s).ok())
                .is_some_and(|t| t == canonical);
            if !matches {
                return ValidationResult::invalid(format!(
                    "Contract type mismatch: record is tagged {} but was submitted as {}",
                    declared, canonical
                ));
            }
        }
        record.insert("contractType".to_string(), serde_json::Value::from(canonical.as_ref()));

        match serde_json::from_value::<ContractTerms>(serde_json::Value::Object(record)) {
            Ok(typed) => self.validate_terms(&typed),
            Err(e) => {
                debug!(%canonical, error = %e, "terms record failed to deserialize");
                ValidationResult::invalid(format!("Invalid {} terms: {}", canonical, e))
            }
        }
    }

    pub fn calculate_metrics(&self, terms: &ContractTerms) -> Result<ContractMetrics, ContractError> {
        self.strategy_for(terms)?.calculate_metrics(terms)
    }

    /// Payment schedule for payment-based variants.
    pub fn payment_schedule(&self, terms: &ContractTerms) -> Result<Vec<PaymentScheduleEntry>, ContractError> {
        let strategy = self.strategy_for(terms)?;
        strategy
            .as_payment_based()
            .ok_or(ContractError::UnsupportedCapability {
                contract_type: strategy.contract_type(),
                capability: "payment schedule",
            })?
            .calculate_payment_schedule(terms)
    }

    /// Early settlement for payment-based variants that offer it.
    pub fn early_settlement(&self, terms: &ContractTerms, paid_installments: u32) -> Result<EarlySettlement, ContractError> {
        let strategy = self.strategy_for(terms)?;
        strategy
            .as_payment_based()
            .filter(|payment| payment.supports_early_settlement())
            .ok_or(ContractError::UnsupportedCapability {
                contract_type: strategy.contract_type(),
                capability: "early settlement",
            })?
            .calculate_early_settlement(terms, paid_installments)
    }

    /// Profit distribution for profit-sharing variants.
    pub fn profit_distribution(&self, terms: &ContractTerms, profit: Decimal) -> Result<ProfitDistribution, ContractError> {
        let strategy = self.strategy_for(terms)?;
        strategy
            .as_profit_sharing()
            .ok_or(ContractError::UnsupportedCapability {
                contract_type: strategy.contract_type(),
                capability: "profit distribution",
            })?
            .calculate_profit_distribution(terms, profit)
    }

    pub fn loss_allocation(&self, terms: &ContractTerms, loss: Decimal) -> Result<LossAllocation, ContractError> {
        let strategy = self.strategy_for(terms)?;
        strategy
            .as_profit_sharing()
            .ok_or(ContractError::UnsupportedCapability {
                contract_type: strategy.contract_type(),
                capability: "loss allocation",
            })?
            .calculate_loss_allocation(terms, loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_order() {
        let factory = ContractStrategyFactory::new();
        assert_eq!(
            factory.available_types(),
            vec![
                ContractType::Murabaha,
                ContractType::Mudarabah,
                ContractType::Musharakah,
                ContractType::Ijarah,
                ContractType::Salam,
            ]
        );
        assert_eq!(factory.display_names()[3].1, "Ijarah (Leasing)");
    }

    #[test]
    fn test_get_strategy() {
        let factory = ContractStrategyFactory::global();
        assert!(factory.get_strategy("takaful").is_none());
        assert!(factory.get_strategy("").is_none());

        let strategy = factory.get_strategy("Musharakah").unwrap();
        assert_eq!(strategy.contract_type(), ContractType::Musharakah);
        assert!(strategy.as_profit_sharing().is_some());
        assert!(strategy.as_payment_based().is_none());
    }

    #[test]
    fn test_validate_contract_rejects_bad_records() {
        let factory = ContractStrategyFactory::global();

        let result = factory.validate_contract("salam", &json!([1, 2]));
        assert_eq!(result.errors, vec!["Contract terms must be a JSON object".to_string()]);

        let result = factory.validate_contract("murabaha", &json!({ "costPrice": 100 }));
        assert!(!result.valid);
        assert!(result.errors[0].starts_with("Invalid murabaha terms"));

        let result = factory.validate_contract("murabaha", &json!({ "contractType": "ijarah" }));
        assert!(result.errors[0].starts_with("Contract type mismatch"));
    }

    #[test]
    fn test_registry_covers_every_contract_type() {
        let factory = ContractStrategyFactory::new();
        for contract_type in ContractType::iter() {
            let strategy = factory.by_type(contract_type).unwrap();
            assert_eq!(strategy.contract_type(), contract_type);
        }
    }

    #[test]
    fn test_early_settlement_follows_strategy_support() {
        let factory = ContractStrategyFactory::global();
        let murabaha = factory.get_strategy("murabaha").and_then(|s| s.as_payment_based()).unwrap();
        let ijarah = factory.get_strategy("ijarah").and_then(|s| s.as_payment_based()).unwrap();
        assert!(murabaha.supports_early_settlement());
        assert!(!ijarah.supports_early_settlement());

        let lease = ContractTerms::from_json(
            r#"{"contractType": "ijarah", "amount": "60000", "duration": 36,
                "assetValue": "60000", "monthlyRental": "1000"}"#,
        )
        .unwrap();
        assert_eq!(
            factory.early_settlement(&lease, 1),
            Err(ContractError::UnsupportedCapability {
                contract_type: ContractType::Ijarah,
                capability: "early settlement",
            })
        );
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = ContractConfig {
            ratio_tolerance: Decimal::NEGATIVE_ONE,
            ..Default::default()
        };
        assert!(ContractStrategyFactory::with_config(config).is_err());
    }
}
