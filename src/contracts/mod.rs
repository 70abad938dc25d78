//! Contract variants.
//!
//! Each module holds the variant's terms, its pure calculation functions,
//! and the strategy that exposes them through the capability traits.

pub mod ijarah;
pub mod mudarabah;
pub mod murabaha;
pub mod musharakah;
pub mod salam;

use rust_decimal::Decimal;

use crate::config::ContractConfig;
use crate::math::{annualized_rate, round_rate};
use crate::types::ContractError;

/// Realized return on `capital`, annualized over `duration` months (0-100 scale).
///
/// Shared by the partnership variants to compare realized performance with
/// the projected annual return.
pub fn annualized_roi(capital: Decimal, profit: Decimal, duration: u32) -> Result<Decimal, ContractError> {
    annualized_rate(profit, capital, duration, "annualized ROI").map(round_rate)
}

/// Records an error unless the two shares sum to 100% within tolerance.
pub(crate) fn check_share_sum(
    errors: &mut Vec<String>,
    label: &str,
    first: Decimal,
    second: Decimal,
    config: &ContractConfig,
) {
    match first.checked_add(second) {
        Some(sum) if config.within_tolerance(sum, Decimal::ONE_HUNDRED) => {}
        Some(_) => errors.push(format!("{} shares must sum to 100%", label)),
        None => errors.push(format!("{} shares are out of range and cannot sum to 100%", label)),
    }
}
