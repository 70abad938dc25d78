//! Declarative macros for reducing boilerplate in contract term definitions.
//!
//! The `contract_terms!` macro generates the base fields shared by every
//! contract variant, together with their setters and base validation.

/// Macro for generating contract term structs with the shared base fields.
///
/// This macro generates:
/// - The struct definition with the base fields (`amount`, `duration`,
///   `start_date`, `end_date`) followed by the user-defined fields
/// - Fluent setters: `amount()`, `duration()`, `starts_on()`, `ends_on()`
/// - `validate_base()`, which records violations of the base-field rules
///
/// # Usage
///
/// ```rust,ignore
/// contract_terms! {
///     /// Documentation for the struct
///     #[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
///     #[serde(rename_all = "camelCase")]
///     pub struct MyTerms {
///         pub rate: Decimal,
///     }
/// }
/// ```
///
/// The derive list must include `Default` and `Deserialize`; the variant
/// still writes its own constructor and cross-field validation.
#[macro_export]
macro_rules! contract_terms {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            // === Base Fields (auto-generated) ===
            /// Financing amount requested on the application.
            pub amount: rust_decimal::Decimal,
            /// Contract duration in months.
            pub duration: u32,
            /// Contract start; anchors schedule due dates.
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub start_date: Option<chrono::NaiveDate>,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub end_date: Option<chrono::NaiveDate>,
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $name {
            /// Sets the financing amount requested on the application.
            pub fn amount(mut self, val: impl $crate::inputs::IntoContractDecimal) -> Self {
                if let Some(v) = $crate::inputs::accept(val, "amount") {
                    self.amount = v;
                }
                self
            }

            /// Sets the contract duration in months.
            pub fn duration(mut self, months: u32) -> Self {
                self.duration = months;
                self
            }

            /// Sets the contract start date.
            pub fn starts_on(mut self, date: chrono::NaiveDate) -> Self {
                self.start_date = Some(date);
                self
            }

            /// Sets the contract end date.
            pub fn ends_on(mut self, date: chrono::NaiveDate) -> Self {
                self.end_date = Some(date);
                self
            }

            pub(crate) fn validate_base(&self, errors: &mut Vec<String>) {
                if self.amount <= rust_decimal::Decimal::ZERO {
                    errors.push("Amount must be positive".to_string());
                }
                if self.duration < 1 {
                    errors.push("Duration must be at least 1 month".to_string());
                }
                if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
                    if end <= start {
                        errors.push("End date must be after start date".to_string());
                    }
                }
            }
        }
    };
}
