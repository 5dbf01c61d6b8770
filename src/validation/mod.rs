//! Declarative form schemas.
//!
//! A schema is a set of [`Rule`]s evaluated against the raw form input plus a
//! `build` step that turns accepted input into the typed payload sent to the
//! shop backend. Rules carry two predicates: `when` decides whether the rule
//! applies at all (this is how cross-field requirements such as "payment mode
//! is required when payment status is Received" are expressed) and `check`
//! decides whether the input satisfies it.
//!
//! Only the first failing rule per field is reported, which is what the forms
//! display inline.

pub mod customer;
pub mod device;
pub mod entry;
pub mod model;

use std::fmt;
use validator::ValidateEmail;

pub use customer::CustomerForm;
pub use device::DeviceForm;
pub use entry::EntryForm;
pub use model::ModelForm;

/// A single field-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `field` unless that field already failed.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        if self.has(&field) {
            return;
        }
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Message recorded for `field`, if any.
    #[must_use]
    pub fn message(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn extend(&mut self, other: Self) {
        for error in other.0 {
            self.push(error.field, error.message);
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

/// One declarative constraint over a form of type `T`.
pub struct Rule<T> {
    pub field: &'static str,
    pub message: &'static str,
    pub when: fn(&T) -> bool,
    pub check: fn(&T) -> bool,
}

impl<T> Rule<T> {
    /// A rule that always applies.
    pub const fn new(field: &'static str, message: &'static str, check: fn(&T) -> bool) -> Self {
        Self {
            field,
            message,
            when: always,
            check,
        }
    }

    /// A rule that only applies when `when` holds for the input.
    pub const fn when(
        field: &'static str,
        message: &'static str,
        when: fn(&T) -> bool,
        check: fn(&T) -> bool,
    ) -> Self {
        Self {
            field,
            message,
            when,
            check,
        }
    }
}

fn always<T>(_: &T) -> bool {
    true
}

/// A form input with its rule sets and the typed value it produces.
pub trait Schema: Sized + 'static {
    type Output;

    /// Rule sets to evaluate, in order. Discriminated schemas return a
    /// different combination depending on the input.
    fn rule_sets(&self) -> &'static [&'static [Rule<Self>]];

    /// Produce the typed value. Only called once every rule passed.
    ///
    /// # Errors
    ///
    /// Returns field errors for conversions the rules could not express.
    fn build(&self) -> Result<Self::Output, ValidationErrors>;
}

/// Run every applicable rule, then build the typed value.
///
/// # Errors
///
/// Returns every failing field (first message per field) when any rule fails.
pub fn validate<S: Schema>(input: &S) -> Result<S::Output, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    for rule in input.rule_sets().iter().flat_map(|set| set.iter()) {
        if (rule.when)(input) && !(rule.check)(input) {
            errors.push(rule.field, rule.message);
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    input.build()
}

// == Field predicates ==========================================================

pub(crate) fn present(value: &str) -> bool {
    !value.trim().is_empty()
}

pub(crate) fn is_ten_digits(value: &str) -> bool {
    value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Email address as accepted by `validator` (HTML5 rules). Surrounding
/// whitespace is ignored.
pub(crate) fn is_email(value: &str) -> bool {
    value.trim().validate_email()
}

/// Non-negative decimal amount.
pub(crate) fn is_amount(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .is_ok_and(|n| n.is_finite() && n >= 0.0)
}

pub(crate) fn parse_id(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

pub(crate) fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
