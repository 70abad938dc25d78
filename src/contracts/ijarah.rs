//! # Ijarah (Islamic Lease)
//!
//! The lessor keeps ownership of the asset and the lessee pays rent. With a
//! purchase option (ijarah muntahia bittamleek) the lessee may buy the asset
//! at the end of the term.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::ContractConfig;
use crate::contract_terms;
use crate::inputs::{IntoContractDecimal, accept};
use crate::math::{add_months, ratio_percent, round_currency, round_rate, split_evenly, try_mul, try_sub};
use crate::terms::{ContractTerms, InstallmentFrequency, LatePaymentPenalty, ResponsibleParty, TermsVariant};
use crate::traits::{ContractStrategy, PaymentBasedContract};
use crate::types::{CalculationStep, ContractError, ContractMetrics, ContractType, PaymentScheduleEntry, ValidationResult};

contract_terms! {
    /// Terms of an Ijarah lease.
    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct IjarahTerms {
        #[serde(default)]
        pub asset_description: String,
        pub asset_value: Decimal,
        #[serde(default)]
        pub asset_category: String,
        pub monthly_rental: Decimal,
        /// Lease period in months; the base duration is used when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub lease_term: Option<u32>,
        #[serde(default)]
        pub rental_frequency: InstallmentFrequency,
        #[serde(default, alias = "purchaseOption")]
        pub purchase_option_included: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub residual_value: Option<Decimal>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub purchase_price: Option<Decimal>,
        #[serde(default)]
        pub maintenance_responsibility: ResponsibleParty,
        /// Monthly maintenance cost.
        #[serde(default)]
        pub maintenance_cost: Decimal,
        #[serde(default)]
        pub insurance_premium_payer: ResponsibleParty,
        #[serde(default)]
        pub insurance_cost: Decimal,
        #[serde(default)]
        pub late_payment_penalty: LatePaymentPenalty,
        #[serde(default)]
        pub security_deposit: Decimal,
    }
}

impl IjarahTerms {
    pub fn new(asset_value: impl Into<Decimal>, monthly_rental: impl Into<Decimal>) -> Self {
        let asset_value = asset_value.into();
        Self {
            amount: asset_value,
            asset_value,
            monthly_rental: monthly_rental.into(),
            ..Default::default()
        }
    }

    pub fn lease_term(mut self, months: u32) -> Self {
        self.lease_term = Some(months);
        self
    }

    pub fn frequency(mut self, frequency: InstallmentFrequency) -> Self {
        self.rental_frequency = frequency;
        self
    }

    /// Enables the end-of-term purchase option at `price`.
    pub fn purchase_option(mut self, price: impl IntoContractDecimal) -> Self {
        self.purchase_option_included = true;
        self.purchase_price = accept(price, "purchasePrice");
        self
    }

    pub fn residual_value(mut self, value: impl IntoContractDecimal) -> Self {
        self.residual_value = accept(value, "residualValue");
        self
    }

    pub fn maintenance(mut self, responsibility: ResponsibleParty, monthly_cost: impl IntoContractDecimal) -> Self {
        self.maintenance_responsibility = responsibility;
        if let Some(cost) = accept(monthly_cost, "maintenanceCost") {
            self.maintenance_cost = cost;
        }
        self
    }

    pub fn security_deposit(mut self, deposit: impl IntoContractDecimal) -> Self {
        if let Some(d) = accept(deposit, "securityDeposit") {
            self.security_deposit = d;
        }
        self
    }

    pub fn effective_lease_term(&self) -> u32 {
        self.lease_term.unwrap_or(self.duration)
    }

    /// Value the asset is expected to retain at the end of the lease.
    pub fn residual(&self) -> Decimal {
        self.residual_value.or(self.purchase_price).unwrap_or(Decimal::ZERO)
    }

    pub fn total_rentals(&self) -> Result<Decimal, ContractError> {
        try_mul(self.monthly_rental, Decimal::from(self.effective_lease_term()), "ijarah total rentals")
    }

    /// Maintenance cost over the whole lease.
    pub fn total_maintenance(&self) -> Result<Decimal, ContractError> {
        try_mul(self.maintenance_cost, Decimal::from(self.effective_lease_term()), "ijarah maintenance cost")
    }
}

pub fn validate_ijarah(terms: &IjarahTerms, _config: &ContractConfig) -> ValidationResult {
    let mut errors = Vec::new();
    terms.validate_base(&mut errors);

    if terms.asset_value <= Decimal::ZERO {
        errors.push("Asset value must be positive".to_string());
    }
    if terms.monthly_rental <= Decimal::ZERO {
        errors.push("Monthly rental must be positive".to_string());
    } else if terms.total_rentals().is_err() {
        errors.push("Monthly rental is out of range for the lease term".to_string());
    }

    let lease_term = terms.effective_lease_term();
    let period = terms.rental_frequency.months();
    if lease_term < 1 {
        errors.push("Lease term must be at least 1 month".to_string());
    } else if lease_term % period != 0 {
        errors.push(format!(
            "Lease term ({} months) must be a whole number of {}-month rental periods",
            lease_term, period
        ));
    }

    if terms.purchase_option_included {
        let price = terms.purchase_price.or(terms.residual_value).unwrap_or(Decimal::ZERO);
        if price <= Decimal::ZERO {
            errors.push("Purchase price must be positive if purchase option is enabled".to_string());
        }
    }
    if terms.residual() > terms.asset_value {
        errors.push("Residual value cannot exceed asset value".to_string());
    }

    if terms.security_deposit < Decimal::ZERO {
        errors.push("Security deposit cannot be negative".to_string());
    }
    if terms.maintenance_cost < Decimal::ZERO || terms.insurance_cost < Decimal::ZERO {
        errors.push("Maintenance and insurance costs cannot be negative".to_string());
    }

    ValidationResult::from_errors(errors)
}

/// Generates the rental schedule starting at `start`.
///
/// The first rental falls due one period after `start`. Each rental is split
/// into a principal part recovering the asset's depreciation and a profit
/// part; the final period absorbs the rounding residue.
pub fn calculate_ijarah_payment_schedule(
    terms: &IjarahTerms,
    start: NaiveDate,
    config: &ContractConfig,
) -> Result<Vec<PaymentScheduleEntry>, ContractError> {
    let period = terms.rental_frequency.months();
    let periods = terms.effective_lease_term() / period;
    if periods == 0 {
        return Err(ContractError::invalid_input(
            "leaseTerm",
            format!("lease term is shorter than one {}-month rental period", period),
        ));
    }

    let rental = round_currency(
        try_mul(terms.monthly_rental, Decimal::from(period), "ijarah periodic rental")?,
        config.currency_decimal_places,
    );
    let depreciation = try_sub(terms.asset_value, terms.residual(), "ijarah depreciation")?.max(Decimal::ZERO);
    let principals = split_evenly(depreciation, periods, config.currency_decimal_places)?;

    let mut schedule = Vec::with_capacity(periods as usize);
    for (index, principal) in principals.into_iter().enumerate() {
        let number = index as u32 + 1;
        schedule.push(PaymentScheduleEntry {
            period_index: number,
            due_date: add_months(start, period * number)?,
            principal,
            profit: try_sub(rental, principal, "ijarah rental profit")?,
            total_payment: rental,
            remaining_balance: try_mul(rental, Decimal::from(periods - number), "ijarah remaining rentals")?,
        });
    }

    Ok(schedule)
}

pub fn calculate_ijarah_metrics(terms: &IjarahTerms, config: &ContractConfig) -> Result<ContractMetrics, ContractError> {
    let lease_term = terms.effective_lease_term();
    let total_rentals = terms.total_rentals()?;
    let maintenance = terms.total_maintenance()?;
    let residual = terms.residual();
    let depreciation = try_sub(terms.asset_value, residual, "ijarah depreciation")?.max(Decimal::ZERO);

    let monthly_return = ratio_percent(terms.monthly_rental, terms.asset_value, "ijarah monthly return")?;
    let rental_yield = try_mul(monthly_return, Decimal::from(12), "ijarah rental yield")?;
    if terms.monthly_rental.is_zero() {
        return Err(ContractError::DivisionByZero {
            context: "ijarah payback period".to_string(),
        });
    }
    let payback_months = terms
        .asset_value
        .checked_div(terms.monthly_rental)
        .ok_or_else(|| ContractError::Overflow {
            operation: "ijarah payback period".to_string(),
        })?;

    let total_return = round_currency(
        try_sub(total_rentals, maintenance, "ijarah net rental return")?,
        config.currency_decimal_places,
    );

    let mut trace = vec![
        CalculationStep::initial("asset-value", "Asset Value", terms.asset_value),
        CalculationStep::add("total-rentals", "Total Rentals", total_rentals),
        CalculationStep::subtract("maintenance", "Maintenance Cost", maintenance),
        CalculationStep::result("net-return", "Net Rental Return", total_return),
        CalculationStep::result("depreciation", "Depreciation Over Term", depreciation),
        CalculationStep::rate("monthly-return-rate", "Monthly Return Rate", round_rate(monthly_return)),
        CalculationStep::rate("rental-yield", "Annual Rental Yield", round_rate(rental_yield)),
        CalculationStep::result("payback-period", "Payback Period (months)", payback_months.round_dp(2)),
    ];
    if terms.purchase_option_included {
        trace.push(CalculationStep::result("residual-value", "Purchase Price at Term End", residual));
    }
    if terms.security_deposit > Decimal::ZERO {
        trace.push(CalculationStep::info(
            "security-deposit",
            format!("Security deposit of {} held by the lessor", terms.security_deposit),
        ));
    }

    Ok(ContractMetrics {
        contract_type: ContractType::Ijarah,
        total_amount: terms.asset_value,
        total_return,
        effective_rate: round_rate(rental_yield),
        duration: lease_term,
        calculation_trace: trace,
    })
}

#[derive(Debug, Clone, Default)]
pub struct IjarahStrategy {
    config: ContractConfig,
}

impl IjarahStrategy {
    pub fn new(config: ContractConfig) -> Self {
        Self { config }
    }
}

impl ContractStrategy for IjarahStrategy {
    fn contract_type(&self) -> ContractType {
        ContractType::Ijarah
    }

    fn description(&self) -> &'static str {
        "Asset leasing where the lessor retains ownership and the lessee pays rental, optionally purchasing the asset at the end of the term."
    }

    fn validate(&self, terms: &ContractTerms) -> Result<ValidationResult, ContractError> {
        Ok(validate_ijarah(IjarahTerms::extract(terms)?, &self.config))
    }

    fn calculate_metrics(&self, terms: &ContractTerms) -> Result<ContractMetrics, ContractError> {
        calculate_ijarah_metrics(IjarahTerms::extract(terms)?, &self.config)
    }

    fn as_payment_based(&self) -> Option<&dyn PaymentBasedContract> {
        Some(self)
    }
}

impl PaymentBasedContract for IjarahStrategy {
    fn calculate_payment_schedule(&self, terms: &ContractTerms) -> Result<Vec<PaymentScheduleEntry>, ContractError> {
        let terms = IjarahTerms::extract(terms)?;
        let start = terms
            .start_date
            .ok_or_else(|| ContractError::MissingField("startDate".to_string()))?;
        calculate_ijarah_payment_schedule(terms, start, &self.config)
    }
}
