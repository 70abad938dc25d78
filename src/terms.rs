//! Contract term definitions.
//!
//! `ContractTerms` is the tagged union handed to the engine. It is tagged on
//! `contractType`, so records stored by the surrounding application
//! deserialize straight into the right variant.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::contracts::ijarah::IjarahTerms;
use crate::contracts::mudarabah::MudarabahTerms;
use crate::contracts::murabaha::MurabahaTerms;
use crate::contracts::musharakah::MusharakahTerms;
use crate::contracts::salam::SalamTerms;
use crate::types::{ContractError, ContractType};

/// How often installments or rentals fall due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum InstallmentFrequency {
    #[default]
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl InstallmentFrequency {
    pub fn months(&self) -> u32 {
        match self {
            InstallmentFrequency::Monthly => 1,
            InstallmentFrequency::Quarterly => 3,
            InstallmentFrequency::SemiAnnual => 6,
            InstallmentFrequency::Annual => 12,
        }
    }
}

/// Treatment of late payments. Late charges may only go to charity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum LatePaymentPenalty {
    #[default]
    Charity,
    #[serde(rename = "none")]
    Waived,
}

/// How often partners receive performance reports and distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ReportingFrequency {
    Monthly,
    #[default]
    Quarterly,
    Annual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum ProfitCalculationMethod {
    #[default]
    #[serde(rename = "net")]
    Net,
    #[serde(rename = "gross")]
    Gross,
    #[serde(rename = "IRR")]
    Irr,
}

/// Who carries a cost such as maintenance or insurance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ResponsibleParty {
    #[default]
    Lessor,
    Lessee,
    Shared,
}

/// Implemented by every variant's term record.
pub trait TermsVariant: Sized {
    const CONTRACT_TYPE: ContractType;

    fn from_terms(terms: &ContractTerms) -> Option<&Self>;

    /// Borrows the variant out of the union, or reports a mismatch.
    fn extract(terms: &ContractTerms) -> Result<&Self, ContractError> {
        Self::from_terms(terms).ok_or_else(|| ContractError::TermsMismatch {
            expected: Self::CONTRACT_TYPE,
            found: terms.contract_type(),
        })
    }
}

/// Terms for any supported contract, keyed by contract type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "contractType", rename_all = "lowercase")]
pub enum ContractTerms {
    Murabaha(MurabahaTerms),
    Mudarabah(MudarabahTerms),
    Musharakah(MusharakahTerms),
    Ijarah(IjarahTerms),
    Salam(SalamTerms),
}

impl ContractTerms {
    pub fn contract_type(&self) -> ContractType {
        match self {
            ContractTerms::Murabaha(_) => ContractType::Murabaha,
            ContractTerms::Mudarabah(_) => ContractType::Mudarabah,
            ContractTerms::Musharakah(_) => ContractType::Musharakah,
            ContractTerms::Ijarah(_) => ContractType::Ijarah,
            ContractTerms::Salam(_) => ContractType::Salam,
        }
    }

    /// Contract duration in months.
    pub fn duration(&self) -> u32 {
        match self {
            ContractTerms::Murabaha(t) => t.duration,
            ContractTerms::Mudarabah(t) => t.duration,
            ContractTerms::Musharakah(t) => t.duration,
            ContractTerms::Ijarah(t) => t.duration,
            ContractTerms::Salam(t) => t.duration,
        }
    }

    /// Parses a `contractType`-tagged terms record.
    pub fn from_json(json: &str) -> Result<Self, ContractError> {
        let terms: ContractTerms = serde_json::from_str(json)?;
        tracing::debug!(contract_type = %terms.contract_type(), "parsed terms record");
        Ok(terms)
    }
}

macro_rules! impl_terms_variant {
    ($($variant:ident => $terms:ty),* $(,)?) => {
        $(
            impl TermsVariant for $terms {
                const CONTRACT_TYPE: ContractType = ContractType::$variant;

                fn from_terms(terms: &ContractTerms) -> Option<&Self> {
                    match terms {
                        ContractTerms::$variant(t) => Some(t),
                        _ => None,
                    }
                }
            }

            impl From<$terms> for ContractTerms {
                fn from(terms: $terms) -> Self {
                    ContractTerms::$variant(terms)
                }
            }
        )*
    };
}

impl_terms_variant!(
    Murabaha => MurabahaTerms,
    Mudarabah => MudarabahTerms,
    Musharakah => MusharakahTerms,
    Ijarah => IjarahTerms,
    Salam => SalamTerms,
);

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_extract_reports_mismatch() {
        let terms: ContractTerms = MurabahaTerms::new(dec!(1000), dec!(100)).into();
        assert!(MurabahaTerms::extract(&terms).is_ok());

        let err = SalamTerms::extract(&terms).unwrap_err();
        assert_eq!(
            err,
            ContractError::TermsMismatch {
                expected: ContractType::Salam,
                found: ContractType::Murabaha
            }
        );
    }

    #[test]
    fn test_from_json() {
        let terms = ContractTerms::from_json(
            r#"{"contractType": "murabaha", "amount": 1000, "duration": 12,
                "costPrice": 1000, "sellingPrice": 1100, "profitAmount": 100, "profitRate": 10}"#,
        )
        .unwrap();
        assert_eq!(terms.contract_type(), ContractType::Murabaha);
        assert_eq!(terms.duration(), 12);

        let err = ContractTerms::from_json(r#"{"contractType": "takaful"}"#).unwrap_err();
        assert!(matches!(err, ContractError::Serialization(_)));
        assert!(ContractTerms::from_json("not json").is_err());
    }

    #[test]
    fn test_frequency_serialization() {
        let json = serde_json::to_string(&InstallmentFrequency::SemiAnnual).unwrap();
        assert_eq!(json, r#""semi-annual""#);
        let penalty: LatePaymentPenalty = serde_json::from_str(r#""none""#).unwrap();
        assert_eq!(penalty, LatePaymentPenalty::Waived);
    }
}
