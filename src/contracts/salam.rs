//! # Salam (Forward Purchase)
//!
//! The buyer pays the full price up front for a commodity of defined
//! specification delivered later. The buyer's return is the gap between the
//! delivery value and the advance.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::ContractConfig;
use crate::contract_terms;
use crate::inputs::{IntoContractDecimal, accept};
use crate::math::{annualized_rate, ratio_percent, round_currency, round_rate, try_mul, try_sub};
use crate::terms::{ContractTerms, TermsVariant};
use crate::traits::ContractStrategy;
use crate::types::{CalculationStep, ContractError, ContractMetrics, ContractType, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum QualityGrade {
    Premium,
    #[default]
    Standard,
    Basic,
}

/// Remedy when the seller fails to deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultPenalty {
    Charity,
    #[default]
    Replacement,
    Refund,
}

contract_terms! {
    /// Terms of a Salam forward purchase.
    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct SalamTerms {
        #[serde(default)]
        pub commodity_type: String,
        #[serde(default)]
        pub commodity_description: String,
        pub quantity: Decimal,
        #[serde(default)]
        pub unit: String,
        #[serde(default)]
        pub quality_specifications: Vec<String>,
        #[serde(default)]
        pub quality_grade: QualityGrade,
        pub advance_payment: Decimal,
        /// Current market price per unit.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub spot_price: Option<Decimal>,
        /// Agreed price per unit.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub agreed_price: Option<Decimal>,
        pub delivery_value: Decimal,
        pub payment_date: NaiveDate,
        pub delivery_date: NaiveDate,
        /// Delivery window in days.
        pub delivery_period: u32,
        #[serde(default)]
        pub delivery_location: String,
        #[serde(default)]
        pub inspection_required: bool,
        #[serde(default)]
        pub default_penalty: DefaultPenalty,
    }
}

impl SalamTerms {
    /// Creates terms for an advance paid on `payment_date` against goods
    /// worth `delivery_value` on `delivery_date`.
    pub fn new(
        advance_payment: impl Into<Decimal>,
        delivery_value: impl Into<Decimal>,
        payment_date: NaiveDate,
        delivery_date: NaiveDate,
    ) -> Self {
        let advance_payment = advance_payment.into();
        let days = (delivery_date - payment_date).num_days();

        Self {
            amount: advance_payment,
            advance_payment,
            delivery_value: delivery_value.into(),
            payment_date,
            delivery_date,
            delivery_period: u32::try_from(days).unwrap_or(0),
            start_date: Some(payment_date),
            ..Default::default()
        }
    }

    pub fn commodity(
        mut self,
        commodity_type: impl Into<String>,
        quantity: impl IntoContractDecimal,
        unit: impl Into<String>,
    ) -> Self {
        self.commodity_type = commodity_type.into();
        if let Some(q) = accept(quantity, "quantity") {
            self.quantity = q;
        }
        self.unit = unit.into();
        self
    }

    pub fn quality(mut self, specification: impl Into<String>) -> Self {
        self.quality_specifications.push(specification.into());
        self
    }

    pub fn spot_price(mut self, price: impl IntoContractDecimal) -> Self {
        self.spot_price = accept(price, "spotPrice");
        self
    }

    /// Buyer's discount against the delivery value.
    pub fn discount(&self) -> Result<Decimal, ContractError> {
        try_sub(self.delivery_value, self.advance_payment, "salam discount")
    }
}

pub fn validate_salam(terms: &SalamTerms, _config: &ContractConfig) -> ValidationResult {
    let mut errors = Vec::new();
    terms.validate_base(&mut errors);

    if terms.advance_payment <= Decimal::ZERO {
        errors.push("Advance payment must be positive".to_string());
    }
    if terms.delivery_value <= terms.advance_payment {
        errors.push("Delivery value must be greater than advance payment".to_string());
    }
    if terms.quantity <= Decimal::ZERO {
        errors.push("Quantity must be positive".to_string());
    }
    if terms.delivery_period < 1 {
        errors.push("Delivery period must be at least 1 day".to_string());
    }
    if terms.delivery_date <= terms.payment_date {
        errors.push("Delivery date must be after payment date".to_string());
    }
    if terms.quality_specifications.iter().all(|s| s.trim().is_empty()) {
        errors.push("Quality specifications must be defined".to_string());
    }

    for (label, price) in [("Spot price", terms.spot_price), ("Agreed price", terms.agreed_price)] {
        if price.is_some_and(|p| p <= Decimal::ZERO) {
            errors.push(format!("{} must be positive", label));
        }
    }

    ValidationResult::from_errors(errors)
}

pub fn calculate_salam_metrics(terms: &SalamTerms, config: &ContractConfig) -> Result<ContractMetrics, ContractError> {
    let discount = terms.discount()?;
    let discount_rate = ratio_percent(discount, terms.delivery_value, "salam discount rate")?;
    let annualized = annualized_rate(discount, terms.advance_payment, terms.duration, "salam annualized return")?;

    let mut trace = vec![
        CalculationStep::initial("advance-payment", "Advance Payment", terms.advance_payment),
        CalculationStep::result("delivery-value", "Delivery Value", terms.delivery_value),
        CalculationStep::result("discount", "Buyer Discount", discount),
        CalculationStep::rate("discount-rate", "Discount Rate", round_rate(discount_rate)),
        CalculationStep::rate("annualized-return", "Annualized Return", round_rate(annualized)),
    ];

    if terms.quantity > Decimal::ZERO {
        let unit_price = terms
            .advance_payment
            .checked_div(terms.quantity)
            .ok_or_else(|| ContractError::Overflow {
                operation: "salam advance price per unit".to_string(),
            })?;
        let unit_price = round_currency(unit_price, config.currency_decimal_places);
        trace.push(CalculationStep::result("advance-price-per-unit", "Advance Price per Unit", unit_price));
        if let Some(spot) = terms.spot_price {
            let market_value = try_mul(spot, terms.quantity, "salam spot market value")?;
            let market_value = round_currency(market_value, config.currency_decimal_places);
            trace.push(CalculationStep::result("spot-market-value", "Spot Market Value", market_value));
        }
    }
    trace.push(CalculationStep::info(
        "delivery",
        format!("Delivery due {} ({} day window)", terms.delivery_date, terms.delivery_period),
    ));

    Ok(ContractMetrics {
        contract_type: ContractType::Salam,
        total_amount: terms.advance_payment,
        total_return: discount,
        effective_rate: round_rate(annualized),
        duration: terms.duration,
        calculation_trace: trace,
    })
}

#[derive(Debug, Clone, Default)]
pub struct SalamStrategy {
    config: ContractConfig,
}

impl SalamStrategy {
    pub fn new(config: ContractConfig) -> Self {
        Self { config }
    }
}

impl ContractStrategy for SalamStrategy {
    fn contract_type(&self) -> ContractType {
        ContractType::Salam
    }

    fn description(&self) -> &'static str {
        "Advance payment for future delivery of a commodity with defined specifications, typically agricultural products or standardized goods."
    }

    fn validate(&self, terms: &ContractTerms) -> Result<ValidationResult, ContractError> {
        Ok(validate_salam(SalamTerms::extract(terms)?, &self.config))
    }

    fn calculate_metrics(&self, terms: &ContractTerms) -> Result<ContractMetrics, ContractError> {
        calculate_salam_metrics(SalamTerms::extract(terms)?, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn wheat() -> SalamTerms {
        SalamTerms::new(dec!(450000), dec!(500000), date(2025, 3, 1), date(2025, 9, 1))
            .duration(6)
            .commodity("wheat", 1000, "tonnes")
            .quality("Hard red winter, protein >= 12%")
            .spot_price(dec!(520))
    }

    #[test]
    fn test_salam_valid() {
        let terms = wheat();
        assert_eq!(terms.delivery_period, 184);
        let result = validate_salam(&terms, &ContractConfig::default());
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn test_salam_delivery_value_must_exceed_advance() {
        let terms = SalamTerms::new(dec!(500000), dec!(480000), date(2025, 3, 1), date(2025, 9, 1))
            .duration(6)
            .commodity("wheat", 1000, "tonnes")
            .quality("grade A");
        let result = validate_salam(&terms, &ContractConfig::default());
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["Delivery value must be greater than advance payment".to_string()]);
    }

    #[test]
    fn test_salam_dates_and_specs() {
        let mut terms = SalamTerms::new(dec!(100), dec!(110), date(2025, 3, 1), date(2025, 3, 1)).duration(1);
        terms.quality_specifications.push("   ".to_string());
        let result = validate_salam(&terms, &ContractConfig::default());

        assert!(result.errors.contains(&"Delivery date must be after payment date".to_string()));
        assert!(result.errors.contains(&"Delivery period must be at least 1 day".to_string()));
        assert!(result.errors.contains(&"Quality specifications must be defined".to_string()));
        assert!(result.errors.contains(&"Quantity must be positive".to_string()));
    }

    #[test]
    fn test_salam_figures_at_decimal_limit() {
        let terms = SalamTerms::new(dec!(-1), Decimal::MAX, date(2025, 3, 1), date(2025, 9, 1)).duration(6);
        assert!(matches!(terms.discount(), Err(ContractError::Overflow { .. })));
        assert!(calculate_salam_metrics(&terms, &ContractConfig::default()).is_err());

        let tiny = wheat().commodity("wheat", dec!(0.0000000000000000000000000001), "tonnes");
        assert!(matches!(
            calculate_salam_metrics(&tiny, &ContractConfig::default()),
            Err(ContractError::Overflow { .. })
        ));
    }

    #[test]
    fn test_salam_metrics() {
        let metrics = calculate_salam_metrics(&wheat(), &ContractConfig::default()).unwrap();
        assert_eq!(metrics.total_amount, dec!(450000));
        assert_eq!(metrics.total_return, dec!(50000));
        assert_eq!(metrics.step("discount-rate"), Some(dec!(10)));
        assert_eq!(metrics.step("spot-market-value"), Some(dec!(520000)));
        assert_eq!(metrics.step("advance-price-per-unit"), Some(dec!(450)));
        // 50,000 / 450,000 over six months, annualized.
        assert_eq!(metrics.effective_rate, dec!(22.2222));
    }
}
