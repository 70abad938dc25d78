//! Decimal helpers shared by the calculation functions.
//!
//! Amounts are rounded half away from zero. Whenever a figure is split into
//! parts, the last part absorbs the rounding residue so that the parts always
//! sum back to the original figure.

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::config::ContractConfig;
use crate::types::ContractError;

fn overflow(operation: &str) -> ContractError {
    ContractError::Overflow {
        operation: operation.to_string(),
    }
}

/// `a + b`, reporting `operation` when the sum leaves the `Decimal` range.
pub fn try_add(a: Decimal, b: Decimal, operation: &str) -> Result<Decimal, ContractError> {
    a.checked_add(b).ok_or_else(|| overflow(operation))
}

/// `a - b`, reporting `operation` when the difference leaves the `Decimal` range.
pub fn try_sub(a: Decimal, b: Decimal, operation: &str) -> Result<Decimal, ContractError> {
    a.checked_sub(b).ok_or_else(|| overflow(operation))
}

/// `a * b`, reporting `operation` when the product leaves the `Decimal` range.
pub fn try_mul(a: Decimal, b: Decimal, operation: &str) -> Result<Decimal, ContractError> {
    a.checked_mul(b).ok_or_else(|| overflow(operation))
}

/// Prorates an annual figure over `months`.
pub fn prorate_annual(annual: Decimal, months: u32, operation: &str) -> Result<Decimal, ContractError> {
    Ok(try_mul(annual, Decimal::from(months), operation)? / dec!(12))
}

pub fn round_currency(value: Decimal, decimal_places: u32) -> Decimal {
    value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero)
}

/// Rates are reported to four decimal places on the 0-100 scale.
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// `amount * percentage / 100`.
pub fn percent_of(amount: Decimal, percentage: Decimal) -> Result<Decimal, ContractError> {
    amount
        .checked_mul(percentage)
        .map(|v| v / dec!(100))
        .ok_or_else(|| ContractError::Overflow {
            operation: "percentage of amount".to_string(),
        })
}

/// `part / whole * 100`.
pub fn ratio_percent(part: Decimal, whole: Decimal, context: &str) -> Result<Decimal, ContractError> {
    if whole.is_zero() {
        return Err(ContractError::DivisionByZero {
            context: context.to_string(),
        });
    }
    part.checked_div(whole)
        .and_then(|r| r.checked_mul(dec!(100)))
        .ok_or_else(|| overflow(context))
}

/// Annualizes a return earned over `months`, on the 0-100 scale.
pub fn annualized_rate(gain: Decimal, base: Decimal, months: u32, context: &str) -> Result<Decimal, ContractError> {
    if months == 0 {
        return Err(ContractError::DivisionByZero {
            context: format!("{} (zero duration)", context),
        });
    }
    let per_term = ratio_percent(gain, base, context)?;
    try_mul(per_term / Decimal::from(months), dec!(12), context)
}

/// Splits `total` into `parts` equal rounded amounts; the last part takes the residue.
pub fn split_evenly(total: Decimal, parts: u32, decimal_places: u32) -> Result<Vec<Decimal>, ContractError> {
    if parts == 0 {
        return Err(ContractError::DivisionByZero {
            context: "splitting amount into zero parts".to_string(),
        });
    }
    let share = round_currency(total / Decimal::from(parts), decimal_places);
    let mut amounts = vec![share; parts as usize];
    let allocated = try_mul(share, Decimal::from(parts - 1), "splitting amount evenly")?;
    if let Some(last) = amounts.last_mut() {
        *last = try_sub(total, allocated, "splitting amount evenly")?;
    }
    Ok(amounts)
}

/// Allocates `total` by percentage shares; the last share takes the residue.
///
/// The residue is only absorbed when the shares cover the whole figure, i.e.
/// they sum to 100 within the configured ratio tolerance. Amounts are rounded
/// to the configured currency precision.
pub fn apportion(total: Decimal, percentages: &[Decimal], config: &ContractConfig) -> Result<Vec<Decimal>, ContractError> {
    let share_total = percentages
        .iter()
        .try_fold(Decimal::ZERO, |acc, pct| try_add(acc, *pct, "summing percentage shares"))?;
    let covers_whole = config.within_tolerance(share_total, Decimal::ONE_HUNDRED);

    let mut amounts = Vec::with_capacity(percentages.len());
    let mut allocated = Decimal::ZERO;

    for (index, pct) in percentages.iter().enumerate() {
        if covers_whole && index + 1 == percentages.len() {
            amounts.push(try_sub(total, allocated, "allocating residue")?);
            break;
        }
        let amount = round_currency(percent_of(total, *pct)?, config.currency_decimal_places);
        allocated = try_add(allocated, amount, "allocating shares")?;
        amounts.push(amount);
    }

    if !covers_whole {
        tracing::debug!(%share_total, "shares do not cover the whole amount");
    }
    Ok(amounts)
}

/// Adds calendar months, clamping to the last day of shorter months.
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, ContractError> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| ContractError::Overflow {
            operation: format!("adding {} months to {}", months, date),
        })
}
