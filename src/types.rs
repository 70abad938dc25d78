use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of Islamic financing contract variants.
///
/// The tag is fixed once a contract is created and selects both the term
/// shape and the strategy that understands it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ContractType {
    /// Cost-plus sale.
    Murabaha,
    /// Capital provider / entrepreneur partnership.
    Mudarabah,
    /// Joint-venture partnership.
    Musharakah,
    /// Lease.
    Ijarah,
    /// Forward purchase.
    Salam,
}

impl ContractType {
    pub fn display_name(&self) -> &'static str {
        match self {
            ContractType::Murabaha => "Murabaha (Cost-Plus Financing)",
            ContractType::Mudarabah => "Mudarabah (Profit-Sharing Partnership)",
            ContractType::Musharakah => "Musharakah (Joint Venture Partnership)",
            ContractType::Ijarah => "Ijarah (Leasing)",
            ContractType::Salam => "Salam (Forward Purchase)",
        }
    }

    /// Returns true for the variants that produce a payment schedule.
    pub fn is_payment_based(&self) -> bool {
        matches!(self, ContractType::Murabaha | ContractType::Ijarah)
    }

    /// Returns true for the variants that distribute profit and loss among partners.
    pub fn is_profit_sharing(&self) -> bool {
        matches!(self, ContractType::Mudarabah | ContractType::Musharakah)
    }
}

/// The semantic operation performed in a calculation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Initial,
    Add,
    Subtract,
    Rate,
    Result,
    Info,
}

impl Operation {
    fn symbol(&self) -> &'static str {
        match self {
            Operation::Initial | Operation::Info => " ",
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Rate => "%",
            Operation::Result => "=",
        }
    }
}

/// A single step in a contract calculation.
///
/// Steps carry a stable `key` so that callers (reports, certificates) can
/// look up a specific figure without parsing descriptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculationStep {
    pub key: String,
    pub description: String,
    pub amount: Option<Decimal>,
    pub operation: Operation,
}

impl CalculationStep {
    fn with(
        operation: Operation,
        key: impl Into<String>,
        description: impl Into<String>,
        amount: Option<Decimal>,
    ) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            amount,
            operation,
        }
    }

    pub fn initial(key: impl Into<String>, description: impl Into<String>, amount: Decimal) -> Self {
        Self::with(Operation::Initial, key, description, Some(amount))
    }

    pub fn add(key: impl Into<String>, description: impl Into<String>, amount: Decimal) -> Self {
        Self::with(Operation::Add, key, description, Some(amount))
    }

    pub fn subtract(key: impl Into<String>, description: impl Into<String>, amount: Decimal) -> Self {
        Self::with(Operation::Subtract, key, description, Some(amount))
    }

    pub fn rate(key: impl Into<String>, description: impl Into<String>, rate: Decimal) -> Self {
        Self::with(Operation::Rate, key, description, Some(rate))
    }

    pub fn result(key: impl Into<String>, description: impl Into<String>, amount: Decimal) -> Self {
        Self::with(Operation::Result, key, description, Some(amount))
    }

    pub fn info(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with(Operation::Info, key, description, None)
    }
}

/// Variant-agnostic summary produced by every strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractMetrics {
    pub contract_type: ContractType,
    /// Headline amount of the contract (selling price, capital, asset value, advance).
    pub total_amount: Decimal,
    /// Expected or disclosed return over the contract term.
    pub total_return: Decimal,
    /// Effective rate on the 0-100 scale.
    pub effective_rate: Decimal,
    /// Duration in months.
    pub duration: u32,
    /// Step-by-step trace including variant-specific figures.
    pub calculation_trace: Vec<CalculationStep>,
}

impl ContractMetrics {
    /// Looks up the amount recorded under a trace key.
    pub fn step(&self, key: &str) -> Option<Decimal> {
        self.calculation_trace
            .iter()
            .find(|step| step.key == key)
            .and_then(|step| step.amount)
    }

    /// Generates a human-readable explanation of the metrics.
    pub fn explain(&self) -> String {
        use std::fmt::Write;
        let mut output = String::new();

        let _ = writeln!(output, "Metrics for {}:", self.contract_type.display_name());
        let _ = writeln!(output, "{:-<50}", "");

        let width = self
            .calculation_trace
            .iter()
            .map(|step| step.description.len())
            .max()
            .unwrap_or(20)
            .max(20);

        for step in &self.calculation_trace {
            match (step.operation, step.amount) {
                (Operation::Info, _) | (_, None) => {
                    let _ = writeln!(output, "  INFO: {}", step.description);
                }
                (op, Some(amount)) => {
                    let _ = writeln!(
                        output,
                        "  {:<width$} : {} {:>14.2}",
                        step.description,
                        op.symbol(),
                        amount,
                        width = width
                    );
                }
            }
        }

        let _ = writeln!(output, "{:-<50}", "");
        let _ = writeln!(
            output,
            "Total: {:.2} | Return: {:.2} | Rate: {:.2}% | {} months",
            self.total_amount, self.total_return, self.effective_rate, self.duration
        );
        output
    }
}

impl std::fmt::Display for ContractMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: amount {:.2}, return {:.2} ({:.2}%) over {} months",
            self.contract_type, self.total_amount, self.total_return, self.effective_rate, self.duration
        )
    }
}

/// One installment or rental period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentScheduleEntry {
    /// 1-based period number.
    pub period_index: u32,
    pub due_date: chrono::NaiveDate,
    pub principal: Decimal,
    pub profit: Decimal,
    /// principal + profit.
    pub total_payment: Decimal,
    /// Amount still owed after this payment.
    pub remaining_balance: Decimal,
}

/// Amounts due when a cost-plus sale is settled ahead of schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EarlySettlement {
    pub remaining_principal: Decimal,
    pub remaining_profit: Decimal,
    /// Rebate (ibra') on the remaining profit.
    pub discount: Decimal,
    pub settlement_amount: Decimal,
}

/// One party's share of a profit or loss figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributionEntry {
    /// Role label (`investor`, `mudarib`, `party1`, `party2`).
    pub party: String,
    /// Identifier of the party in the originating record, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
    pub amount: Decimal,
    pub percentage: Decimal,
    /// Capital left to the party after a loss has been absorbed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital_remaining: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfitDistribution {
    pub total_profit: Decimal,
    pub distribution: Vec<DistributionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LossAllocation {
    pub total_loss: Decimal,
    pub distribution: Vec<DistributionEntry>,
}

/// Outcome of validating a set of contract terms.
///
/// `errors` is empty iff `valid` is true. Warnings never affect validity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings: Vec::new(),
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self::from_errors(vec![error.into()])
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.valid {
            return write!(f, "VALID");
        }
        write!(f, "INVALID: {}", self.errors.join("; "))
    }
}

/// Errors raised by the engine.
///
/// Business-rule violations are never reported through this type; they are
/// collected in [`ValidationResult`]. These variants indicate misuse by the
/// caller or arithmetic that cannot be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Terms mismatch: {expected} strategy received {found} terms")]
    TermsMismatch {
        expected: ContractType,
        found: ContractType,
    },

    #[error("{contract_type} contracts do not support {capability}")]
    UnsupportedCapability {
        contract_type: ContractType,
        capability: &'static str,
    },

    #[error("Unknown contract type: {0}")]
    UnknownContractType(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Arithmetic overflow: operation '{operation}' failed")]
    Overflow { operation: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ContractError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ContractError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(e: serde_json::Error) -> Self {
        ContractError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_contract_type_parsing() {
        assert_eq!(ContractType::from_str("murabaha").unwrap(), ContractType::Murabaha);
        assert_eq!(ContractType::from_str("Musharakah").unwrap(), ContractType::Musharakah);
        assert!(ContractType::from_str("takaful").is_err());
        assert_eq!(ContractType::Ijarah.to_string(), "ijarah");
    }

    #[test]
    fn test_trace_serialization() {
        let step = CalculationStep::rate("apr", "Annualized Rate", dec!(15));
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains(r#""operation":"rate""#));
        assert!(json.contains(r#""key":"apr""#));
    }

    #[test]
    fn test_validation_result_consistency() {
        assert!(ValidationResult::from_errors(vec![]).valid);
        let invalid = ValidationResult::invalid("boom");
        assert!(!invalid.valid);
        assert_eq!(invalid.to_string(), "INVALID: boom");
    }

    #[test]
    fn test_error_display() {
        let err = ContractError::TermsMismatch {
            expected: ContractType::Murabaha,
            found: ContractType::Salam,
        };
        assert_eq!(err.to_string(), "Terms mismatch: murabaha strategy received salam terms");
    }
}
