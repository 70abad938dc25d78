//! # Mudarabah (Profit-Sharing Partnership)
//!
//! The capital provider (rabb-ul-maal) funds the venture and the mudarib
//! manages it. Profit is split by the agreed ratio; financial loss falls on
//! the capital provider alone, the mudarib losing only their effort.

use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{annualized_roi, check_share_sum};
use crate::config::ContractConfig;
use crate::contract_terms;
use crate::inputs::{IntoContractDecimal, accept};
use crate::math::{apportion, percent_of, prorate_annual, round_currency, round_rate};
use crate::terms::{ContractTerms, ProfitCalculationMethod, ReportingFrequency, TermsVariant};
use crate::traits::{ContractStrategy, ProfitSharingContract};
use crate::types::{
    CalculationStep, ContractError, ContractMetrics, ContractType, DistributionEntry, LossAllocation,
    ProfitDistribution, ValidationResult,
};

/// Loss policy. Only the capital provider can bear financial loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum LossDistribution {
    #[default]
    CapitalProviderOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum MudaribAuthority {
    #[default]
    Full,
    Restricted,
    Limited,
}

contract_terms! {
    /// Terms of a Mudarabah partnership.
    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct MudarabahTerms {
        pub capital_amount: Decimal,
        /// Capital provider identifier.
        #[serde(default)]
        pub capital_provider: String,
        /// Mudarib identifier.
        #[serde(default)]
        pub mudarib: String,
        pub investor_profit_share: Decimal,
        pub mudarib_profit_share: Decimal,
        /// Projected annual return (0-100). Indicative only.
        #[serde(default, alias = "expectedReturnRate")]
        pub expected_annual_return: Decimal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub projected_profit: Option<Decimal>,
        #[serde(default)]
        pub loss_distribution: LossDistribution,
        #[serde(default)]
        pub management_fee: Decimal,
        #[serde(default)]
        pub mudarib_authority: MudaribAuthority,
        #[serde(default)]
        pub capital_guarantee: bool,
        #[serde(default)]
        pub reporting_frequency: ReportingFrequency,
        #[serde(default)]
        pub profit_calculation_method: ProfitCalculationMethod,
        #[serde(default)]
        pub business_activity: String,
    }
}

impl MudarabahTerms {
    pub fn new(
        capital_amount: impl Into<Decimal>,
        investor_profit_share: impl Into<Decimal>,
        mudarib_profit_share: impl Into<Decimal>,
    ) -> Self {
        let capital_amount = capital_amount.into();
        Self {
            amount: capital_amount,
            capital_amount,
            investor_profit_share: investor_profit_share.into(),
            mudarib_profit_share: mudarib_profit_share.into(),
            ..Default::default()
        }
    }

    pub fn parties(mut self, capital_provider: impl Into<String>, mudarib: impl Into<String>) -> Self {
        self.capital_provider = capital_provider.into();
        self.mudarib = mudarib.into();
        self
    }

    pub fn expected_annual_return(mut self, rate: impl IntoContractDecimal) -> Self {
        if let Some(r) = accept(rate, "expectedAnnualReturn") {
            self.expected_annual_return = r;
        }
        self
    }

    pub fn projected_profit(mut self, profit: impl IntoContractDecimal) -> Self {
        self.projected_profit = accept(profit, "projectedProfit");
        self
    }
}

fn party_id(id: &str) -> Option<String> {
    (!id.is_empty()).then(|| id.to_string())
}

pub fn validate_mudarabah(terms: &MudarabahTerms, config: &ContractConfig) -> ValidationResult {
    let mut errors = Vec::new();
    terms.validate_base(&mut errors);

    if terms.capital_amount <= Decimal::ZERO {
        errors.push("Capital amount must be positive".to_string());
    }

    for (label, share) in [
        ("Investor", terms.investor_profit_share),
        ("Mudarib", terms.mudarib_profit_share),
    ] {
        if share < Decimal::ZERO || share > Decimal::ONE_HUNDRED {
            errors.push(format!("{} profit share must be between 0 and 100%", label));
        }
    }

    check_share_sum(
        &mut errors,
        "Profit",
        terms.investor_profit_share,
        terms.mudarib_profit_share,
        config,
    );

    if terms.capital_guarantee {
        errors.push("Mudarib may not guarantee the capital; capital guarantee must be disabled".to_string());
    }

    if terms.expected_annual_return < Decimal::ZERO || terms.expected_annual_return > Decimal::ONE_HUNDRED {
        errors.push("Expected annual return must be between 0 and 100%".to_string());
    }
    if terms.management_fee < Decimal::ZERO {
        errors.push("Management fee cannot be negative".to_string());
    }
    if terms.projected_profit.is_some_and(|p| p < Decimal::ZERO) {
        errors.push("Projected profit cannot be negative".to_string());
    }

    ValidationResult::from_errors(errors)
}

/// Projected profit over the whole term.
///
/// Uses the declared projection when present, otherwise prorates the
/// expected annual return over the duration.
pub fn projected_mudarabah_profit(terms: &MudarabahTerms, config: &ContractConfig) -> Result<Decimal, ContractError> {
    match terms.projected_profit {
        Some(profit) => Ok(profit),
        None => {
            let annual = percent_of(terms.capital_amount, terms.expected_annual_return)?;
            let prorated = prorate_annual(annual, terms.duration, "prorating mudarabah profit")?;
            Ok(round_currency(prorated, config.currency_decimal_places))
        }
    }
}

pub fn calculate_mudarabah_metrics(terms: &MudarabahTerms, config: &ContractConfig) -> Result<ContractMetrics, ContractError> {
    let total_return = projected_mudarabah_profit(terms, config)?;
    let shares = apportion(
        total_return,
        &[terms.investor_profit_share, terms.mudarib_profit_share],
        config,
    )?;

    let mut trace = vec![
        CalculationStep::initial("capital", "Capital Provided", terms.capital_amount),
        CalculationStep::rate("expected-annual-return", "Expected Annual Return", terms.expected_annual_return),
        CalculationStep::result("projected-profit", "Projected Profit", total_return),
        CalculationStep::rate("investor-share", "Investor Profit Share", terms.investor_profit_share),
        CalculationStep::result("investor-expected-return", "Investor Expected Return", shares[0]),
        CalculationStep::rate("mudarib-share", "Mudarib Profit Share", terms.mudarib_profit_share),
        CalculationStep::result("mudarib-expected-return", "Mudarib Expected Return", shares[1]),
    ];

    if terms.projected_profit.is_some() && terms.capital_amount > Decimal::ZERO && terms.duration > 0 {
        let roi = annualized_roi(terms.capital_amount, total_return, terms.duration)?;
        trace.push(CalculationStep::rate("annualized-roi", "Annualized ROI", roi));
    }
    trace.push(CalculationStep::info(
        "loss-policy",
        "Losses are borne entirely by the capital provider",
    ));

    Ok(ContractMetrics {
        contract_type: ContractType::Mudarabah,
        total_amount: terms.capital_amount,
        total_return,
        effective_rate: round_rate(terms.expected_annual_return),
        duration: terms.duration,
        calculation_trace: trace,
    })
}

/// Splits a realized profit between the capital provider and the mudarib.
pub fn calculate_mudarabah_distribution(
    terms: &MudarabahTerms,
    profit: Decimal,
    config: &ContractConfig,
) -> Result<ProfitDistribution, ContractError> {
    if profit < Decimal::ZERO {
        return Err(ContractError::invalid_input(
            "profit",
            "profit must not be negative; use the loss allocation for losses",
        ));
    }

    let amounts = apportion(
        profit,
        &[terms.investor_profit_share, terms.mudarib_profit_share],
        config,
    )?;

    Ok(ProfitDistribution {
        total_profit: profit,
        distribution: vec![
            DistributionEntry {
                party: "investor".to_string(),
                party_id: party_id(&terms.capital_provider),
                amount: amounts[0],
                percentage: terms.investor_profit_share,
                capital_remaining: None,
            },
            DistributionEntry {
                party: "mudarib".to_string(),
                party_id: party_id(&terms.mudarib),
                amount: amounts[1],
                percentage: terms.mudarib_profit_share,
                capital_remaining: None,
            },
        ],
    })
}

/// Allocates a realized loss. The capital provider bears all of it.
pub fn calculate_mudarabah_loss(
    terms: &MudarabahTerms,
    loss: Decimal,
    config: &ContractConfig,
) -> Result<LossAllocation, ContractError> {
    if loss < Decimal::ZERO {
        return Err(ContractError::invalid_input("loss", "loss must be given as a positive figure"));
    }

    let investor_loss = round_currency(loss, config.currency_decimal_places);
    let capital_remaining = terms.capital_amount.saturating_sub(investor_loss).max(Decimal::ZERO);

    Ok(LossAllocation {
        total_loss: loss,
        distribution: vec![
            DistributionEntry {
                party: "investor".to_string(),
                party_id: party_id(&terms.capital_provider),
                amount: investor_loss,
                percentage: Decimal::ONE_HUNDRED,
                capital_remaining: Some(capital_remaining),
            },
            DistributionEntry {
                party: "mudarib".to_string(),
                party_id: party_id(&terms.mudarib),
                amount: Decimal::ZERO,
                percentage: Decimal::ZERO,
                capital_remaining: None,
            },
        ],
    })
}

#[derive(Debug, Clone, Default)]
pub struct MudarabahStrategy {
    config: ContractConfig,
}

impl MudarabahStrategy {
    pub fn new(config: ContractConfig) -> Self {
        Self { config }
    }
}

impl ContractStrategy for MudarabahStrategy {
    fn contract_type(&self) -> ContractType {
        ContractType::Mudarabah
    }

    fn description(&self) -> &'static str {
        "Partnership where the capital provider supplies funds and the mudarib supplies expertise. Profits are shared per agreement; losses are borne by the capital provider."
    }

    fn validate(&self, terms: &ContractTerms) -> Result<ValidationResult, ContractError> {
        Ok(validate_mudarabah(MudarabahTerms::extract(terms)?, &self.config))
    }

    fn calculate_metrics(&self, terms: &ContractTerms) -> Result<ContractMetrics, ContractError> {
        calculate_mudarabah_metrics(MudarabahTerms::extract(terms)?, &self.config)
    }

    fn as_profit_sharing(&self) -> Option<&dyn ProfitSharingContract> {
        Some(self)
    }
}

impl ProfitSharingContract for MudarabahStrategy {
    fn calculate_profit_distribution(
        &self,
        terms: &ContractTerms,
        profit: Decimal,
    ) -> Result<ProfitDistribution, ContractError> {
        calculate_mudarabah_distribution(MudarabahTerms::extract(terms)?, profit, &self.config)
    }

    fn calculate_loss_allocation(&self, terms: &ContractTerms, loss: Decimal) -> Result<LossAllocation, ContractError> {
        calculate_mudarabah_loss(MudarabahTerms::extract(terms)?, loss, &self.config)
    }
}
