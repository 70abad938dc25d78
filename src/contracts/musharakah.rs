//! # Musharakah (Joint Venture Partnership)
//!
//! Both partners contribute capital. The profit ratio is negotiable, but each
//! partner's loss share must equal their share of the capital.

use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{annualized_roi, check_share_sum};
use crate::config::ContractConfig;
use crate::contract_terms;
use crate::inputs::{IntoContractDecimal, accept};
use crate::math::{apportion, percent_of, prorate_annual, ratio_percent, round_currency, round_rate, try_add};
use crate::terms::{ContractTerms, TermsVariant};
use crate::traits::{ContractStrategy, ProfitSharingContract};
use crate::types::{
    CalculationStep, ContractError, ContractMetrics, ContractType, DistributionEntry, LossAllocation,
    ProfitDistribution, ValidationResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ManagementStructure {
    #[default]
    Joint,
    Party1,
    Party2,
    ThirdParty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PartnershipType {
    #[default]
    General,
    Limited,
    /// One partner buys out the other's units over the term.
    Diminishing,
}

contract_terms! {
    /// Terms of a two-party Musharakah.
    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct MusharakahTerms {
        pub party1_capital: Decimal,
        pub party2_capital: Decimal,
        /// Declared total; must match the sum of contributions when present.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub total_capital: Option<Decimal>,
        #[serde(default)]
        pub party1_id: String,
        #[serde(default)]
        pub party2_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub party1_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub party2_name: Option<String>,
        pub party1_profit_share: Decimal,
        pub party2_profit_share: Decimal,
        pub party1_loss_share: Decimal,
        pub party2_loss_share: Decimal,
        #[serde(default)]
        pub management_structure: ManagementStructure,
        #[serde(default)]
        pub management_fee: Decimal,
        #[serde(default)]
        pub expected_annual_return: Decimal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub projected_profit: Option<Decimal>,
        #[serde(default)]
        pub partnership_type: PartnershipType,
    }
}

impl MusharakahTerms {
    /// Creates terms for the given capital contributions, with loss shares
    /// set to the capital ratio and profit shared the same way.
    pub fn new(party1_capital: impl Into<Decimal>, party2_capital: impl Into<Decimal>) -> Self {
        let party1_capital = party1_capital.into();
        let party2_capital = party2_capital.into();
        let total = party1_capital.saturating_add(party2_capital);
        let party1_ratio = ratio_percent(party1_capital, total, "musharakah capital ratio").unwrap_or_default();
        let party2_ratio = Decimal::ONE_HUNDRED.saturating_sub(party1_ratio);

        Self {
            amount: total,
            party1_capital,
            party2_capital,
            party1_profit_share: party1_ratio,
            party2_profit_share: party2_ratio,
            party1_loss_share: party1_ratio,
            party2_loss_share: party2_ratio,
            ..Default::default()
        }
    }

    pub fn profit_shares(mut self, party1: impl Into<Decimal>, party2: impl Into<Decimal>) -> Self {
        self.party1_profit_share = party1.into();
        self.party2_profit_share = party2.into();
        self
    }

    pub fn loss_shares(mut self, party1: impl Into<Decimal>, party2: impl Into<Decimal>) -> Self {
        self.party1_loss_share = party1.into();
        self.party2_loss_share = party2.into();
        self
    }

    pub fn parties(mut self, party1_id: impl Into<String>, party2_id: impl Into<String>) -> Self {
        self.party1_id = party1_id.into();
        self.party2_id = party2_id.into();
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

    pub fn combined_capital(&self) -> Result<Decimal, ContractError> {
        try_add(self.party1_capital, self.party2_capital, "musharakah combined capital")
    }

    /// Each partner's share of the combined capital, on the 0-100 scale.
    pub fn capital_ratios(&self) -> Result<(Decimal, Decimal), ContractError> {
        let total = self.combined_capital()?;
        Ok((
            ratio_percent(self.party1_capital, total, "musharakah capital ratio")?,
            ratio_percent(self.party2_capital, total, "musharakah capital ratio")?,
        ))
    }

    fn party_entry(&self, index: u8, amount: Decimal, percentage: Decimal) -> DistributionEntry {
        let (id, name) = match index {
            1 => (&self.party1_id, &self.party1_name),
            _ => (&self.party2_id, &self.party2_name),
        };
        DistributionEntry {
            party: name.clone().unwrap_or_else(|| format!("party{}", index)),
            party_id: (!id.is_empty()).then(|| id.clone()),
            amount,
            percentage,
            capital_remaining: None,
        }
    }
}

pub fn validate_musharakah(terms: &MusharakahTerms, config: &ContractConfig) -> ValidationResult {
    let mut errors = Vec::new();
    terms.validate_base(&mut errors);

    check_share_sum(
        &mut errors,
        "Profit",
        terms.party1_profit_share,
        terms.party2_profit_share,
        config,
    );
    check_share_sum(&mut errors, "Loss", terms.party1_loss_share, terms.party2_loss_share, config);

    // Loss must follow capital, checked per partner so the reviewer sees
    // exactly which side is off.
    match terms.capital_ratios() {
        Ok((party1_ratio, party2_ratio)) => {
            for (label, loss_share, ratio) in [
                ("Party 1", terms.party1_loss_share, party1_ratio),
                ("Party 2", terms.party2_loss_share, party2_ratio),
            ] {
                if !config.within_tolerance(loss_share, ratio) {
                    errors.push(format!(
                        "{} loss share ({}%) must match capital ratio ({:.2}%)",
                        label,
                        loss_share.normalize(),
                        ratio
                    ));
                }
            }
        }
        Err(ContractError::Overflow { .. }) => {
            errors.push("Party capital contributions are out of range".to_string());
        }
        // Zero combined capital is reported by the positive-capital check.
        Err(_) => {}
    }

    if terms.party1_capital <= Decimal::ZERO || terms.party2_capital <= Decimal::ZERO {
        errors.push("Both parties must contribute positive capital".to_string());
    }

    if let (Some(declared), Ok(combined)) = (terms.total_capital, terms.combined_capital()) {
        if !config.within_tolerance(declared, combined) {
            errors.push(format!(
                "Total capital ({}) must equal the sum of party contributions ({})",
                declared, combined
            ));
        }
    }

    if terms.management_fee < Decimal::ZERO {
        errors.push("Management fee cannot be negative".to_string());
    }

    ValidationResult::from_errors(errors)
}

pub fn calculate_musharakah_metrics(
    terms: &MusharakahTerms,
    config: &ContractConfig,
) -> Result<ContractMetrics, ContractError> {
    let total_capital = terms.combined_capital()?;
    let (party1_equity, party2_equity) = terms.capital_ratios()?;

    let total_return = match terms.projected_profit {
        Some(profit) => profit,
        None => {
            let annual = percent_of(total_capital, terms.expected_annual_return)?;
            let prorated = prorate_annual(annual, terms.duration, "prorating musharakah profit")?;
            round_currency(prorated, config.currency_decimal_places)
        }
    };
    let returns = apportion(
        total_return,
        &[terms.party1_profit_share, terms.party2_profit_share],
        config,
    )?;

    let mut trace = vec![
        CalculationStep::initial("party1-capital", "Party 1 Capital", terms.party1_capital),
        CalculationStep::add("party2-capital", "Party 2 Capital", terms.party2_capital),
        CalculationStep::result("total-capital", "Total Capital", total_capital),
        CalculationStep::rate("party1-equity", "Party 1 Equity", round_rate(party1_equity)),
        CalculationStep::rate("party2-equity", "Party 2 Equity", round_rate(party2_equity)),
        CalculationStep::result("projected-profit", "Projected Profit", total_return),
        CalculationStep::result("party1-expected-return", "Party 1 Expected Return", returns[0]),
        CalculationStep::result("party2-expected-return", "Party 2 Expected Return", returns[1]),
    ];
    if terms.projected_profit.is_some() && terms.duration > 0 {
        let roi = annualized_roi(total_capital, total_return, terms.duration)?;
        trace.push(CalculationStep::rate("annualized-roi", "Annualized ROI", roi));
    }

    Ok(ContractMetrics {
        contract_type: ContractType::Musharakah,
        total_amount: total_capital,
        total_return,
        effective_rate: round_rate(terms.expected_annual_return),
        duration: terms.duration,
        calculation_trace: trace,
    })
}

/// Splits a realized profit by the agreed profit shares.
pub fn calculate_musharakah_distribution(
    terms: &MusharakahTerms,
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
        &[terms.party1_profit_share, terms.party2_profit_share],
        config,
    )?;

    Ok(ProfitDistribution {
        total_profit: profit,
        distribution: vec![
            terms.party_entry(1, amounts[0], terms.party1_profit_share),
            terms.party_entry(2, amounts[1], terms.party2_profit_share),
        ],
    })
}

/// Allocates a realized loss by the loss shares.
pub fn calculate_musharakah_loss(
    terms: &MusharakahTerms,
    loss: Decimal,
    config: &ContractConfig,
) -> Result<LossAllocation, ContractError> {
    if loss < Decimal::ZERO {
        return Err(ContractError::invalid_input("loss", "loss must be given as a positive figure"));
    }

    let amounts = apportion(
        loss,
        &[terms.party1_loss_share, terms.party2_loss_share],
        config,
    )?;

    let mut party1 = terms.party_entry(1, amounts[0], terms.party1_loss_share);
    party1.capital_remaining = Some(terms.party1_capital.saturating_sub(amounts[0]).max(Decimal::ZERO));
    let mut party2 = terms.party_entry(2, amounts[1], terms.party2_loss_share);
    party2.capital_remaining = Some(terms.party2_capital.saturating_sub(amounts[1]).max(Decimal::ZERO));

    Ok(LossAllocation {
        total_loss: loss,
        distribution: vec![party1, party2],
    })
}

#[derive(Debug, Clone, Default)]
pub struct MusharakahStrategy {
    config: ContractConfig,
}

impl MusharakahStrategy {
    pub fn new(config: ContractConfig) -> Self {
        Self { config }
    }
}

impl ContractStrategy for MusharakahStrategy {
    fn contract_type(&self) -> ContractType {
        ContractType::Musharakah
    }

    fn description(&self) -> &'static str {
        "Joint venture where all partners contribute capital and share profits per agreement. Losses are shared according to capital contribution ratios."
    }

    fn validate(&self, terms: &ContractTerms) -> Result<ValidationResult, ContractError> {
        Ok(validate_musharakah(MusharakahTerms::extract(terms)?, &self.config))
    }

    fn calculate_metrics(&self, terms: &ContractTerms) -> Result<ContractMetrics, ContractError> {
        calculate_musharakah_metrics(MusharakahTerms::extract(terms)?, &self.config)
    }

    fn as_profit_sharing(&self) -> Option<&dyn ProfitSharingContract> {
        Some(self)
    }
}

impl ProfitSharingContract for MusharakahStrategy {
    fn calculate_profit_distribution(
        &self,
        terms: &ContractTerms,
        profit: Decimal,
    ) -> Result<ProfitDistribution, ContractError> {
        calculate_musharakah_distribution(MusharakahTerms::extract(terms)?, profit, &self.config)
    }

    fn calculate_loss_allocation(&self, terms: &ContractTerms, loss: Decimal) -> Result<LossAllocation, ContractError> {
        calculate_musharakah_loss(MusharakahTerms::extract(terms)?, loss, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn joint_venture() -> MusharakahTerms {
        MusharakahTerms::new(dec!(600000), dec!(400000))
            .profit_shares(dec!(55), dec!(45))
            .loss_shares(dec!(60), dec!(40))
            .duration(36)
    }

    #[test]
    fn test_profit_ratio_may_differ_from_capital() {
        let result = validate_musharakah(&joint_venture(), &ContractConfig::default());
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn test_loss_must_follow_capital() {
        let terms = joint_venture().loss_shares(dec!(50), dec!(50));
        let result = validate_musharakah(&terms, &ContractConfig::default());

        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                "Party 1 loss share (50%) must match capital ratio (60.00%)".to_string(),
                "Party 2 loss share (50%) must match capital ratio (40.00%)".to_string(),
            ]
        );
    }

    #[test]
    fn test_loss_share_within_tolerance() {
        // 1/3 of capital is 33.333...%; 33.33 is inside the 0.01 band.
        let terms = MusharakahTerms::new(dec!(100000), dec!(200000)).loss_shares(dec!(33.33), dec!(66.67)).duration(12);
        let result = validate_musharakah(&terms, &ContractConfig::default());
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn test_declared_total_capital() {
        let mut terms = joint_venture();
        terms.total_capital = Some(dec!(900000));
        let result = validate_musharakah(&terms, &ContractConfig::default());
        assert!(!result.valid);
        assert!(result.errors[0].starts_with("Total capital"));
    }

    #[test]
    fn test_zero_capital_reported() {
        let terms = MusharakahTerms::new(dec!(0), dec!(0)).duration(12);
        let result = validate_musharakah(&terms, &ContractConfig::default());
        assert!(result.errors.contains(&"Both parties must contribute positive capital".to_string()));
    }

    #[test]
    fn test_capital_at_decimal_limit() {
        let mut terms = joint_venture();
        terms.party1_capital = Decimal::MAX;
        terms.party2_capital = Decimal::MAX;
        terms.total_capital = Some(Decimal::MAX);
        terms.party1_loss_share = Decimal::MAX;
        terms.party2_loss_share = Decimal::MAX;

        let result = validate_musharakah(&terms, &ContractConfig::default());
        assert!(!result.valid);
        assert!(result.errors.contains(&"Loss shares are out of range and cannot sum to 100%".to_string()));
        assert!(result.errors.contains(&"Party capital contributions are out of range".to_string()));

        assert!(matches!(
            calculate_musharakah_metrics(&terms, &ContractConfig::default()),
            Err(ContractError::Overflow { .. })
        ));
    }

    #[test]
    fn test_distribution_and_loss() {
        let terms = joint_venture().parties("p-1", "p-2");
        let config = ContractConfig::default();

        let profit = calculate_musharakah_distribution(&terms, dec!(200000), &config).unwrap();
        assert_eq!(profit.distribution[0].amount, dec!(110000));
        assert_eq!(profit.distribution[1].amount, dec!(90000));
        assert_eq!(profit.distribution[0].party, "party1");
        assert_eq!(profit.distribution[1].party_id.as_deref(), Some("p-2"));

        let loss = calculate_musharakah_loss(&terms, dec!(100000), &config).unwrap();
        assert_eq!(loss.distribution[0].amount, dec!(60000));
        assert_eq!(loss.distribution[1].amount, dec!(40000));
        assert_eq!(loss.distribution[0].capital_remaining, Some(dec!(540000)));
        assert_eq!(loss.distribution[1].capital_remaining, Some(dec!(360000)));
    }

    #[test]
    fn test_metrics_equity() {
        let terms = joint_venture().expected_annual_return(10);
        let metrics = calculate_musharakah_metrics(&terms, &ContractConfig::default()).unwrap();
        assert_eq!(metrics.total_amount, dec!(1000000));
        assert_eq!(metrics.total_return, dec!(300000));
        assert_eq!(metrics.step("party1-equity"), Some(dec!(60)));
        assert_eq!(metrics.step("party2-expected-return"), Some(dec!(135000)));
    }
}
