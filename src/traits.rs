use rust_decimal::Decimal;

use crate::terms::ContractTerms;
use crate::types::{
    ContractError, ContractMetrics, ContractType, EarlySettlement, LossAllocation, PaymentScheduleEntry,
    ProfitDistribution, ValidationResult,
};

/// Capability set shared by every contract strategy.
///
/// Strategies are stateless apart from their configuration, so a single
/// instance can be shared across threads.
pub trait ContractStrategy: Send + Sync {
    /// Returns the variant this strategy understands.
    fn contract_type(&self) -> ContractType;

    /// Returns the human-readable contract name.
    fn display_name(&self) -> &'static str {
        self.contract_type().display_name()
    }

    fn description(&self) -> &'static str;

    /// Checks the cross-field business and compliance rules.
    ///
    /// Violations are collected into the returned [`ValidationResult`]. An
    /// `Err` is returned only when `terms` belong to a different variant.
    fn validate(&self, terms: &ContractTerms) -> Result<ValidationResult, ContractError>;

    /// Computes the variant-agnostic metrics summary.
    fn calculate_metrics(&self, terms: &ContractTerms) -> Result<ContractMetrics, ContractError>;

    /// Returns the payment-schedule capability, if this variant has one.
    fn as_payment_based(&self) -> Option<&dyn PaymentBasedContract> {
        None
    }

    /// Returns the profit/loss-sharing capability, if this variant has one.
    fn as_profit_sharing(&self) -> Option<&dyn ProfitSharingContract> {
        None
    }
}

/// Contracts repaid through a schedule of installments or rentals.
pub trait PaymentBasedContract: ContractStrategy {
    /// Generates the payment schedule, anchored at the terms' start date.
    fn calculate_payment_schedule(&self, terms: &ContractTerms) -> Result<Vec<PaymentScheduleEntry>, ContractError>;

    fn supports_early_settlement(&self) -> bool {
        false
    }

    /// Computes the amount due to settle after `paid_installments` payments.
    fn calculate_early_settlement(
        &self,
        _terms: &ContractTerms,
        _paid_installments: u32,
    ) -> Result<EarlySettlement, ContractError> {
        Err(ContractError::UnsupportedCapability {
            contract_type: self.contract_type(),
            capability: "early settlement",
        })
    }
}

/// Partnerships that allocate realized profit and loss among parties.
pub trait ProfitSharingContract: ContractStrategy {
    fn calculate_profit_distribution(
        &self,
        terms: &ContractTerms,
        profit: Decimal,
    ) -> Result<ProfitDistribution, ContractError>;

    fn calculate_loss_allocation(&self, terms: &ContractTerms, loss: Decimal) -> Result<LossAllocation, ContractError>;
}
