//! # Murabaha (Cost-Plus Sale)
//!
//! The financier buys an asset and resells it to the client at cost plus a
//! disclosed markup, payable in installments or as a lump sum.
//!
//! ## Rules
//! - `sellingPrice == costPrice + profitAmount`.
//! - `profitRate == profitAmount / costPrice * 100`.
//! - Early settlement rebates (ibra') apply to the unearned profit only,
//!   never to the principal.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::ContractConfig;
use crate::contract_terms;
use crate::inputs::{IntoContractDecimal, accept};
use crate::math::{
    add_months, annualized_rate, percent_of, ratio_percent, round_currency, round_rate, split_evenly, try_add, try_sub,
};
use crate::terms::{ContractTerms, InstallmentFrequency, LatePaymentPenalty, TermsVariant};
use crate::traits::{ContractStrategy, PaymentBasedContract};
use crate::types::{
    CalculationStep, ContractError, ContractMetrics, ContractType, EarlySettlement, PaymentScheduleEntry,
    ValidationResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStructure {
    #[default]
    Installment,
    LumpSum,
    /// Installments that start after the deferment period.
    Deferred,
}

contract_terms! {
    /// Terms of a Murabaha sale.
    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct MurabahaTerms {
        pub cost_price: Decimal,
        pub selling_price: Decimal,
        pub profit_amount: Decimal,
        /// Markup as a percentage of cost (0-100).
        pub profit_rate: Decimal,
        #[serde(default)]
        pub payment_structure: PaymentStructure,
        #[serde(default)]
        pub installment_frequency: InstallmentFrequency,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub number_of_installments: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub installment_amount: Option<Decimal>,
        /// Grace period in months before the first installment.
        #[serde(default)]
        pub deferment_period: u32,
        /// Rebate on remaining profit for early settlement (0-100).
        #[serde(default)]
        pub early_settlement_discount: Decimal,
        #[serde(default)]
        pub late_payment_penalty: LatePaymentPenalty,
        #[serde(default)]
        pub asset_description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub asset_cost: Option<Decimal>,
    }
}

impl MurabahaTerms {
    /// Creates terms from the cost price and disclosed profit, deriving the
    /// selling price and profit rate. The duration must still be set.
    pub fn new(cost_price: impl Into<Decimal>, profit_amount: impl Into<Decimal>) -> Self {
        let cost_price = cost_price.into();
        let profit_amount = profit_amount.into();
        let profit_rate = ratio_percent(profit_amount, cost_price, "murabaha profit rate").unwrap_or_default();

        Self {
            amount: cost_price,
            cost_price,
            selling_price: cost_price.saturating_add(profit_amount),
            profit_amount,
            profit_rate,
            ..Default::default()
        }
    }

    pub fn installments(mut self, count: u32) -> Self {
        self.number_of_installments = Some(count);
        self
    }

    pub fn frequency(mut self, frequency: InstallmentFrequency) -> Self {
        self.installment_frequency = frequency;
        self
    }

    pub fn structure(mut self, structure: PaymentStructure) -> Self {
        self.payment_structure = structure;
        self
    }

    pub fn deferment(mut self, months: u32) -> Self {
        self.deferment_period = months;
        self
    }

    pub fn early_settlement_discount(mut self, percentage: impl IntoContractDecimal) -> Self {
        if let Some(p) = accept(percentage, "earlySettlementDiscount") {
            self.early_settlement_discount = p;
        }
        self
    }

    pub fn asset(mut self, description: impl Into<String>, cost: impl IntoContractDecimal) -> Self {
        self.asset_description = description.into();
        self.asset_cost = accept(cost, "assetCost");
        self
    }

    /// Number of schedule entries the terms produce.
    ///
    /// Falls back to one installment per frequency period across the
    /// duration when no explicit count is given.
    pub fn installment_count(&self) -> u32 {
        if self.payment_structure == PaymentStructure::LumpSum {
            return 1;
        }
        self.number_of_installments
            .unwrap_or_else(|| (self.duration / self.installment_frequency.months()).max(1))
    }
}

pub fn validate_murabaha(terms: &MurabahaTerms, config: &ContractConfig) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    terms.validate_base(&mut errors);

    if terms.cost_price <= Decimal::ZERO {
        errors.push("Cost price must be positive".to_string());
    }
    if terms.profit_amount <= Decimal::ZERO {
        errors.push("Profit amount must be positive".to_string());
    }

    match terms.cost_price.checked_add(terms.profit_amount) {
        Some(expected) if config.within_tolerance(terms.selling_price, expected) => {}
        Some(_) => errors.push("Selling price must equal cost price plus profit amount".to_string()),
        None => errors.push("Cost price and profit amount are out of range".to_string()),
    }

    if terms.profit_rate < Decimal::ZERO || terms.profit_rate > Decimal::ONE_HUNDRED {
        errors.push("Profit rate must be between 0 and 100%".to_string());
    }
    if let Ok(expected_rate) = ratio_percent(terms.profit_amount, terms.cost_price, "murabaha profit rate") {
        if !config.within_tolerance(terms.profit_rate, expected_rate) {
            errors.push(format!(
                "Profit rate must match calculated percentage ({:.2}%)",
                expected_rate
            ));
        }
        if expected_rate > config.max_markup_rate {
            warnings.push(format!(
                "Markup of {:.2}% exceeds the recommended limit of {}%",
                expected_rate, config.max_markup_rate
            ));
        }
    }

    if terms.number_of_installments == Some(0) {
        errors.push("Number of installments must be at least 1".to_string());
    }

    if let (Some(installment), Some(count)) = (terms.installment_amount, terms.number_of_installments) {
        if count > 0 {
            let expected = round_currency(terms.selling_price / Decimal::from(count), config.currency_decimal_places);
            if !config.within_tolerance(installment, expected) {
                errors.push(format!(
                    "Installment amount must equal selling price divided by number of installments ({:.2})",
                    expected
                ));
            }
        }
    }

    if terms.early_settlement_discount < Decimal::ZERO || terms.early_settlement_discount > Decimal::ONE_HUNDRED {
        errors.push("Early settlement discount must be between 0 and 100%".to_string());
    }

    ValidationResult::from_errors(errors).with_warnings(warnings)
}

pub fn calculate_murabaha_metrics(terms: &MurabahaTerms, config: &ContractConfig) -> Result<ContractMetrics, ContractError> {
    let markup = try_sub(terms.selling_price, terms.cost_price, "murabaha markup")?;
    let markup_rate = ratio_percent(markup, terms.cost_price, "murabaha markup rate")?;
    let apr = annualized_rate(markup, terms.cost_price, terms.duration, "murabaha APR")?;

    let count = terms.installment_count();
    let installment = if count > 0 {
        round_currency(terms.selling_price / Decimal::from(count), config.currency_decimal_places)
    } else {
        Decimal::ZERO
    };

    let trace = vec![
        CalculationStep::initial("cost-price", "Cost Price", terms.cost_price),
        CalculationStep::add("markup", "Markup", markup),
        CalculationStep::result("selling-price", "Selling Price", terms.selling_price),
        CalculationStep::rate("markup-rate", "Markup Rate", round_rate(markup_rate)),
        CalculationStep::rate("apr", "Annualized Rate", round_rate(apr)),
        CalculationStep::info(
            "payment-structure",
            format!("{} payment(s) of {:.2}", count, installment),
        ),
        CalculationStep::result("installment-amount", "Installment Amount", installment),
    ];

    Ok(ContractMetrics {
        contract_type: ContractType::Murabaha,
        total_amount: terms.selling_price,
        total_return: terms.profit_amount,
        effective_rate: round_rate(apr),
        duration: terms.duration,
        calculation_trace: trace,
    })
}

/// Generates the installment schedule starting at `start`.
///
/// Principal components sum to the cost price and profit components to the
/// disclosed profit; the final installment absorbs the rounding residue.
pub fn calculate_murabaha_payment_schedule(
    terms: &MurabahaTerms,
    start: NaiveDate,
    config: &ContractConfig,
) -> Result<Vec<PaymentScheduleEntry>, ContractError> {
    let total_due = try_add(terms.cost_price, terms.profit_amount, "murabaha amount due")?;

    if terms.payment_structure == PaymentStructure::LumpSum {
        return Ok(vec![PaymentScheduleEntry {
            period_index: 1,
            due_date: add_months(start, terms.duration)?,
            principal: terms.cost_price,
            profit: terms.profit_amount,
            total_payment: total_due,
            remaining_balance: Decimal::ZERO,
        }]);
    }

    let count = terms.installment_count();
    let principals = split_evenly(terms.cost_price, count, config.currency_decimal_places)?;
    let profits = split_evenly(terms.profit_amount, count, config.currency_decimal_places)?;
    let step = terms.installment_frequency.months();

    let mut schedule = Vec::with_capacity(count as usize);
    let mut remaining = total_due;

    for (index, (principal, profit)) in principals.into_iter().zip(profits).enumerate() {
        let offset = step
            .checked_mul(index as u32)
            .and_then(|months| months.checked_add(terms.deferment_period))
            .ok_or_else(|| ContractError::Overflow {
                operation: "murabaha due date offset".to_string(),
            })?;
        let total_payment = try_add(principal, profit, "murabaha installment")?;
        remaining = try_sub(remaining, total_payment, "murabaha remaining balance")?;

        schedule.push(PaymentScheduleEntry {
            period_index: index as u32 + 1,
            due_date: add_months(start, offset)?,
            principal,
            profit,
            total_payment,
            remaining_balance: remaining,
        });
    }

    Ok(schedule)
}

/// Computes the settlement due after `paid_installments` payments.
pub fn calculate_murabaha_early_settlement(
    terms: &MurabahaTerms,
    paid_installments: u32,
    config: &ContractConfig,
) -> Result<EarlySettlement, ContractError> {
    let count = terms.installment_count();
    if paid_installments > count {
        return Err(ContractError::invalid_input(
            "paid_installments",
            format!("{} paid exceeds the {} scheduled installments", paid_installments, count),
        ));
    }

    let principals = split_evenly(terms.cost_price, count, config.currency_decimal_places)?;
    let profits = split_evenly(terms.profit_amount, count, config.currency_decimal_places)?;

    let paid = paid_installments as usize;
    let remaining_principal = remaining_total(&principals[paid..], "remaining principal")?;
    let remaining_profit = remaining_total(&profits[paid..], "remaining profit")?;

    let discount = round_currency(
        percent_of(remaining_profit, terms.early_settlement_discount)?,
        config.currency_decimal_places,
    );

    Ok(EarlySettlement {
        remaining_principal,
        remaining_profit,
        discount,
        settlement_amount: try_sub(
            try_add(remaining_principal, remaining_profit, "early settlement amount")?,
            discount,
            "early settlement amount",
        )?,
    })
}

fn remaining_total(amounts: &[Decimal], operation: &str) -> Result<Decimal, ContractError> {
    amounts
        .iter()
        .try_fold(Decimal::ZERO, |acc, amount| try_add(acc, *amount, operation))
}

#[derive(Debug, Clone, Default)]
pub struct MurabahaStrategy {
    config: ContractConfig,
}

impl MurabahaStrategy {
    pub fn new(config: ContractConfig) -> Self {
        Self { config }
    }
}

impl ContractStrategy for MurabahaStrategy {
    fn contract_type(&self) -> ContractType {
        ContractType::Murabaha
    }

    fn description(&self) -> &'static str {
        "Islamic financing where the financier purchases an asset and sells it to the client at cost plus disclosed markup, payable in installments."
    }

    fn validate(&self, terms: &ContractTerms) -> Result<ValidationResult, ContractError> {
        Ok(validate_murabaha(MurabahaTerms::extract(terms)?, &self.config))
    }

    fn calculate_metrics(&self, terms: &ContractTerms) -> Result<ContractMetrics, ContractError> {
        calculate_murabaha_metrics(MurabahaTerms::extract(terms)?, &self.config)
    }

    fn as_payment_based(&self) -> Option<&dyn PaymentBasedContract> {
        Some(self)
    }
}

impl PaymentBasedContract for MurabahaStrategy {
    fn calculate_payment_schedule(&self, terms: &ContractTerms) -> Result<Vec<PaymentScheduleEntry>, ContractError> {
        let terms = MurabahaTerms::extract(terms)?;
        let start = terms
            .start_date
            .ok_or_else(|| ContractError::MissingField("startDate".to_string()))?;
        calculate_murabaha_payment_schedule(terms, start, &self.config)
    }

    fn supports_early_settlement(&self) -> bool {
        true
    }

    fn calculate_early_settlement(
        &self,
        terms: &ContractTerms,
        paid_installments: u32,
    ) -> Result<EarlySettlement, ContractError> {
        calculate_murabaha_early_settlement(MurabahaTerms::extract(terms)?, paid_installments, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn standard_terms() -> MurabahaTerms {
        MurabahaTerms::new(dec!(1000000), dec!(150000))
            .duration(12)
            .installments(12)
    }

    #[test]
    fn test_murabaha_valid_terms() {
        let terms = standard_terms();
        assert_eq!(terms.selling_price, dec!(1150000));
        assert_eq!(terms.profit_rate, dec!(15));

        let result = validate_murabaha(&terms, &ContractConfig::default());
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_murabaha_price_mismatch() {
        let mut terms = standard_terms();
        terms.selling_price = dec!(1200000);
        terms.profit_rate = dec!(12);

        let result = validate_murabaha(&terms, &ContractConfig::default());
        assert!(!result.valid);
        assert!(result.errors.contains(&"Selling price must equal cost price plus profit amount".to_string()));
        assert!(result.errors.iter().any(|e| e.contains("Profit rate must match calculated percentage (15.00%)")));
    }

    #[test]
    fn test_murabaha_figures_at_decimal_limit() {
        let huge = dec!(60000000000000000000000000000);
        let terms = MurabahaTerms::new(huge, huge).duration(12).installments(12);
        assert_eq!(terms.selling_price, Decimal::MAX);

        let result = validate_murabaha(&terms, &ContractConfig::default());
        assert!(!result.valid);
        assert!(result.errors.contains(&"Cost price and profit amount are out of range".to_string()));

        assert!(matches!(
            calculate_murabaha_payment_schedule(&terms, start(), &ContractConfig::default()),
            Err(ContractError::Overflow { .. })
        ));
    }

    #[test]
    fn test_murabaha_high_markup_warns() {
        let terms = MurabahaTerms::new(dec!(100000), dec!(40000)).duration(12);
        let result = validate_murabaha(&terms, &ContractConfig::default());
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("40.00%"));
    }

    #[test]
    fn test_murabaha_schedule_reconciles() {
        let schedule = calculate_murabaha_payment_schedule(&standard_terms(), start(), &ContractConfig::default()).unwrap();

        assert_eq!(schedule.len(), 12);
        let principal: Decimal = schedule.iter().map(|e| e.principal).sum();
        let profit: Decimal = schedule.iter().map(|e| e.profit).sum();
        assert_eq!(principal, dec!(1000000));
        assert_eq!(profit, dec!(150000));

        assert_eq!(schedule[0].due_date, start());
        assert_eq!(schedule[1].due_date, NaiveDate::from_ymd_opt(2025, 2, 15).unwrap());
        assert_eq!(schedule[11].remaining_balance, Decimal::ZERO);
        assert_eq!(schedule[0].principal, dec!(83333.33));
        assert_eq!(schedule[11].principal, dec!(83333.37));
    }

    #[test]
    fn test_murabaha_schedule_deferment_and_frequency() {
        let terms = MurabahaTerms::new(dec!(90000), dec!(9000))
            .duration(24)
            .frequency(InstallmentFrequency::Quarterly)
            .deferment(3);

        let schedule = calculate_murabaha_payment_schedule(&terms, start(), &ContractConfig::default()).unwrap();
        // 24 months / quarterly = 8 installments, first after 3-month grace.
        assert_eq!(schedule.len(), 8);
        assert_eq!(schedule[0].due_date, NaiveDate::from_ymd_opt(2025, 4, 15).unwrap());
        assert_eq!(schedule[1].due_date, NaiveDate::from_ymd_opt(2025, 7, 15).unwrap());
        assert_eq!(schedule[0].total_payment, dec!(12375));
    }

    #[test]
    fn test_murabaha_lump_sum() {
        let terms = MurabahaTerms::new(dec!(50000), dec!(5000))
            .duration(6)
            .structure(PaymentStructure::LumpSum);

        let schedule = calculate_murabaha_payment_schedule(&terms, start(), &ContractConfig::default()).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].total_payment, dec!(55000));
        assert_eq!(schedule[0].due_date, NaiveDate::from_ymd_opt(2025, 7, 15).unwrap());
    }

    #[test]
    fn test_murabaha_early_settlement() {
        let terms = standard_terms().early_settlement_discount(50);
        let settlement = calculate_murabaha_early_settlement(&terms, 6, &ContractConfig::default()).unwrap();

        assert_eq!(settlement.remaining_profit, dec!(75000));
        assert_eq!(settlement.discount, dec!(37500));
        assert_eq!(settlement.remaining_principal, dec!(500000.02));
        assert_eq!(settlement.settlement_amount, dec!(537500.02));

        assert!(calculate_murabaha_early_settlement(&terms, 13, &ContractConfig::default()).is_err());
    }

    #[test]
    fn test_murabaha_metrics() {
        let metrics = calculate_murabaha_metrics(&standard_terms(), &ContractConfig::default()).unwrap();
        assert_eq!(metrics.total_amount, dec!(1150000));
        assert_eq!(metrics.total_return, dec!(150000));
        assert_eq!(metrics.effective_rate, dec!(15));
        assert_eq!(metrics.step("markup-rate"), Some(dec!(15)));
        assert_eq!(metrics.step("installment-amount"), Some(dec!(95833.33)));
    }

    #[test]
    fn test_murabaha_schedule_requires_start_date() {
        let strategy = MurabahaStrategy::default();
        let terms: ContractTerms = standard_terms().into();
        assert_eq!(
            strategy.calculate_payment_schedule(&terms),
            Err(ContractError::MissingField("startDate".to_string()))
        );
    }
}
