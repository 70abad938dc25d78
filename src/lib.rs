//! # aqd
//!
//! Calculation engine for Islamic financing contracts: Murabaha, Mudarabah,
//! Musharakah, Ijarah and Salam.
//!
//! Terms are validated against their Shariah and business rules, and the
//! engine derives metrics, payment schedules and profit/loss allocations as
//! pure functions of those terms.
//!
//! ```rust
//! use aqd::prelude::*;
//! use rust_decimal_macros::dec;
//!
//! let terms: ContractTerms = MurabahaTerms::new(dec!(1000000), dec!(150000))
//!     .duration(12)
//!     .installments(12)
//!     .into();
//!
//! let factory = ContractStrategyFactory::global();
//! assert!(factory.validate_terms(&terms).valid);
//! ```

pub mod config;
pub mod contracts;
pub mod factory;
pub mod inputs;
pub mod macros;
pub mod math;
pub mod prelude;
pub mod terms;
pub mod traits;
pub mod types;

pub use config::ContractConfig;
pub use factory::ContractStrategyFactory;
pub use terms::ContractTerms;
pub use traits::{ContractStrategy, PaymentBasedContract, ProfitSharingContract};
pub use types::{ContractError, ContractMetrics, ContractType, ValidationResult};
