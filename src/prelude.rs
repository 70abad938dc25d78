//! Prelude module for aqd
//!
//! Re-exports the terms, strategies and result types most callers need.
//!
//! ```rust
//! use aqd::prelude::*;
//! ```

// Core exports
pub use crate::config::{ContractConfig, ContractConfigBuilder};
pub use crate::factory::ContractStrategyFactory;
pub use crate::inputs::IntoContractDecimal;
pub use crate::terms::{
    ContractTerms, InstallmentFrequency, LatePaymentPenalty, ProfitCalculationMethod, ReportingFrequency,
    ResponsibleParty, TermsVariant,
};
pub use crate::traits::{ContractStrategy, PaymentBasedContract, ProfitSharingContract};
pub use crate::types::{
    CalculationStep, ContractError, ContractMetrics, ContractType, DistributionEntry, EarlySettlement,
    LossAllocation, Operation, PaymentScheduleEntry, ProfitDistribution, ValidationResult,
};

// Variant terms and strategies
pub use crate::contracts::annualized_roi;
pub use crate::contracts::ijarah::{IjarahStrategy, IjarahTerms};
pub use crate::contracts::mudarabah::{LossDistribution, MudarabahStrategy, MudarabahTerms, MudaribAuthority};
pub use crate::contracts::murabaha::{MurabahaStrategy, MurabahaTerms, PaymentStructure};
pub use crate::contracts::musharakah::{ManagementStructure, MusharakahStrategy, MusharakahTerms, PartnershipType};
pub use crate::contracts::salam::{DefaultPenalty, QualityGrade, SalamStrategy, SalamTerms};
