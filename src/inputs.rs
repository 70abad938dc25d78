//! Conversions from loosely typed application figures into `Decimal`.
//!
//! Financing applications arrive with amounts typed as integers, floats or
//! text such as `"1,250,000.00"`. Every conversion names the field it is
//! reading so a rejected figure can be traced back to the application.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::types::ContractError;

/// Converts a caller-supplied figure into a `Decimal` for the named field.
pub trait IntoContractDecimal {
    fn into_decimal_for(self, field: &str) -> Result<Decimal, ContractError>;
}

impl IntoContractDecimal for Decimal {
    fn into_decimal_for(self, _field: &str) -> Result<Decimal, ContractError> {
        Ok(self)
    }
}

macro_rules! impl_into_contract_decimal_int {
    ($($t:ty),*) => {
        $(
            impl IntoContractDecimal for $t {
                fn into_decimal_for(self, _field: &str) -> Result<Decimal, ContractError> {
                    Ok(Decimal::from(self))
                }
            }
        )*
    };
}

impl_into_contract_decimal_int!(i32, u32, i64, u64, isize, usize);

macro_rules! impl_into_contract_decimal_float {
    ($($t:ty),*) => {
        $(
            impl IntoContractDecimal for $t {
                fn into_decimal_for(self, field: &str) -> Result<Decimal, ContractError> {
                    if !self.is_finite() {
                        return Err(ContractError::invalid_input(field, format!("{} is not a finite number", self)));
                    }
                    // The shortest round-trip text keeps 0.1 as 0.1.
                    parse_figure(&self.to_string(), field)
                }
            }
        )*
    };
}

impl_into_contract_decimal_float!(f32, f64);

impl IntoContractDecimal for &str {
    fn into_decimal_for(self, field: &str) -> Result<Decimal, ContractError> {
        parse_figure(self, field)
    }
}

impl IntoContractDecimal for &String {
    fn into_decimal_for(self, field: &str) -> Result<Decimal, ContractError> {
        parse_figure(self, field)
    }
}

impl IntoContractDecimal for String {
    fn into_decimal_for(self, field: &str) -> Result<Decimal, ContractError> {
        parse_figure(&self, field)
    }
}

/// Parses a written figure. Grouping separators (`,` and `_`) are ignored and
/// exponent notation such as `6e28` is accepted.
fn parse_figure(raw: &str, field: &str) -> Result<Decimal, ContractError> {
    let cleaned: String = raw.trim().chars().filter(|c| !matches!(c, ',' | '_')).collect();
    if cleaned.is_empty() {
        return Err(ContractError::invalid_input(field, "empty figure"));
    }

    let parsed = if cleaned.contains(['e', 'E']) {
        Decimal::from_scientific(&cleaned)
    } else {
        Decimal::from_str(&cleaned)
    };

    parsed.map_err(|e| match e {
        rust_decimal::Error::ExceedsMaximumPossibleValue
        | rust_decimal::Error::LessThanMinimumPossibleValue
        | rust_decimal::Error::ScaleExceedsMaximumPrecision(_) => {
            ContractError::invalid_input(field, format!("'{}' is outside the representable range", raw.trim()))
        }
        other => ContractError::invalid_input(field, format!("'{}' is not a number: {}", raw.trim(), other)),
    })
}

/// Converts a builder argument, logging and discarding it when it is rejected.
pub(crate) fn accept(value: impl IntoContractDecimal, field: &str) -> Option<Decimal> {
    match value.into_decimal_for(field) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(field, error = %e, "ignoring rejected figure");
            None
        }
    }
}
