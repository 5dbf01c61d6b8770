use serde::{Deserialize, Serialize};

use super::{Rule, Schema, ValidationErrors, is_email, is_ten_digits, optional, present};
use crate::shop::models::{Customer, CustomerInput};

/// Raw customer form as posted by the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerForm {
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl CustomerForm {
    /// Pre-populate an edit form from a stored customer.
    #[must_use]
    pub fn from_customer(customer: &Customer) -> Self {
        Self {
            name: customer.name.clone(),
            phone: customer.phone.clone(),
            email: customer.email.clone().unwrap_or_default(),
        }
    }
}

const CUSTOMER_RULES: &[Rule<CustomerForm>] = &[
    Rule::new("name", "Name is required", |f: &CustomerForm| present(&f.name)),
    Rule::new("phone", "Phone number must be exactly 10 digits", |f: &CustomerForm| {
        is_ten_digits(&f.phone)
    }),
    Rule::when(
        "email",
        "Invalid email address",
        |f: &CustomerForm| present(&f.email),
        |f: &CustomerForm| is_email(&f.email),
    ),
];

const CUSTOMER_SCHEMA: &[&[Rule<CustomerForm>]] = &[CUSTOMER_RULES];

impl Schema for CustomerForm {
    type Output = CustomerInput;

    fn rule_sets(&self) -> &'static [&'static [Rule<Self>]] {
        CUSTOMER_SCHEMA
    }

    fn build(&self) -> Result<CustomerInput, ValidationErrors> {
        Ok(CustomerInput {
            name: self.name.trim().to_string(),
            phone: self.phone.clone(),
            email: optional(&self.email),
            is_active: true,
        })
    }
}
