//! Mobile-entry schema.
//!
//! The schema is discriminated by `entryType`: every entry runs the common
//! rules, then either the Service rules (repair intake: date, internal
//! reference, model and issue required) or the Sale rules (part number or
//! name and price required, model optional). The typed result carries the
//! branch as [`EntryKind`].

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Rule, Schema, ValidationErrors, is_amount, optional, parse_id, present};
use crate::shop::models::{
    EntryKind, EntryPayload, EntryType, MobileEntry, PaymentMode, PaymentStatus, ProductStatus,
};

/// Raw entry form fields. Reference fields (`customer`, `device`, `model`)
/// hold the selected record's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EntryForm {
    pub entry_type: String,
    pub date: String,
    pub internal_ref: String,
    pub external_ref: String,
    pub customer: String,
    pub device: String,
    pub model: String,
    pub imei: String,
    pub issue: String,
    pub passcode: String,
    pub estimate: String,
    pub product_status: String,
    pub payment_status: String,
    pub payment_mode: String,
    pub part_number_or_name: String,
    pub price: String,
    /// Whether a front image is attached (freshly selected or staged).
    #[serde(skip)]
    pub has_front_image: bool,
    /// Editing keeps the stored front image, so none is required.
    #[serde(skip)]
    pub editing: bool,
}

impl Default for EntryForm {
    fn default() -> Self {
        Self {
            entry_type: EntryType::Service.as_str().to_string(),
            date: String::new(),
            internal_ref: String::new(),
            external_ref: String::new(),
            customer: String::new(),
            device: String::new(),
            model: String::new(),
            imei: String::new(),
            issue: String::new(),
            passcode: String::new(),
            estimate: "0".to_string(),
            product_status: String::new(),
            payment_status: String::new(),
            payment_mode: String::new(),
            part_number_or_name: String::new(),
            price: String::new(),
            has_front_image: false,
            editing: false,
        }
    }
}

impl EntryForm {
    /// A blank intake form dated today with the server-issued reference.
    #[must_use]
    pub fn new_intake(today: NaiveDate, internal_ref: Option<String>) -> Self {
        Self {
            date: today.format("%Y-%m-%d").to_string(),
            internal_ref: internal_ref.unwrap_or_default(),
            product_status: ProductStatus::Received.as_str().to_string(),
            payment_status: PaymentStatus::NotReceived.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Pre-populate an edit form from a listed entry.
    #[must_use]
    pub fn from_entry(entry: &MobileEntry) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let id = |v: Option<i64>| v.map(|id| id.to_string()).unwrap_or_default();
        Self {
            entry_type: entry.entry_type.as_str().to_string(),
            date: entry
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            internal_ref: entry.internal_ref.clone(),
            external_ref: text(&entry.external_ref),
            customer: id(entry.customer_id),
            device: id(entry.device_id),
            model: id(entry.model_id),
            imei: text(&entry.imei),
            issue: text(&entry.issue),
            passcode: text(&entry.passcode),
            estimate: entry.estimate.clone(),
            product_status: entry.product_status.clone(),
            payment_status: entry.payment_status.clone(),
            payment_mode: text(&entry.payment_mode),
            part_number_or_name: text(&entry.part_number_or_name),
            price: text(&entry.price),
            has_front_image: entry.front_image.is_some(),
            editing: true,
        }
    }

    #[must_use]
    pub fn entry_type(&self) -> Option<EntryType> {
        EntryType::parse(&self.entry_type)
    }
}

/// Cross-field predicate: a payment mode is mandatory exactly when the
/// payment has been received.
#[must_use]
pub fn payment_mode_required(form: &EntryForm) -> bool {
    PaymentStatus::parse(&form.payment_status) == Some(PaymentStatus::Received)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn has_entry_type(f: &EntryForm) -> bool {
    f.entry_type().is_some()
}

fn has_customer(f: &EntryForm) -> bool {
    parse_id(&f.customer).is_some()
}

fn has_device(f: &EntryForm) -> bool {
    parse_id(&f.device).is_some()
}

fn has_model(f: &EntryForm) -> bool {
    parse_id(&f.model).is_some()
}

fn has_product_status(f: &EntryForm) -> bool {
    ProductStatus::parse(&f.product_status).is_some()
}

fn has_payment_status(f: &EntryForm) -> bool {
    PaymentStatus::parse(&f.payment_status).is_some()
}

fn has_payment_mode(f: &EntryForm) -> bool {
    PaymentMode::parse(&f.payment_mode).is_some()
}

fn payment_mode_given(f: &EntryForm) -> bool {
    present(&f.payment_mode)
}

fn front_image_required(f: &EntryForm) -> bool {
    !f.editing
}

fn has_front_image(f: &EntryForm) -> bool {
    f.has_front_image
}

fn estimate_given(f: &EntryForm) -> bool {
    present(&f.estimate)
}

fn estimate_valid(f: &EntryForm) -> bool {
    is_amount(&f.estimate)
}

fn date_given(f: &EntryForm) -> bool {
    present(&f.date)
}

fn date_valid(f: &EntryForm) -> bool {
    parse_date(&f.date).is_some()
}

fn has_internal_ref(f: &EntryForm) -> bool {
    present(&f.internal_ref)
}

fn has_issue(f: &EntryForm) -> bool {
    present(&f.issue)
}

fn has_part(f: &EntryForm) -> bool {
    present(&f.part_number_or_name)
}

fn has_price(f: &EntryForm) -> bool {
    present(&f.price)
}

fn price_valid(f: &EntryForm) -> bool {
    is_amount(&f.price)
}

fn model_given(f: &EntryForm) -> bool {
    present(&f.model)
}

const COMMON_RULES: &[Rule<EntryForm>] = &[
    Rule::new("entryType", "Entry type must be Service or Sale", has_entry_type),
    Rule::when("date", "Date is invalid", date_given, date_valid),
    Rule::new("customer", "Customer is required", has_customer),
    Rule::new("device", "Device is required", has_device),
    Rule::when("estimate", "Estimate must be a non-negative amount", estimate_given, estimate_valid),
    Rule::new("productStatus", "Product Status is required", has_product_status),
    Rule::new("paymentStatus", "Payment Status is required", has_payment_status),
    Rule::when(
        "paymentMode",
        "Payment Mode is required when Payment Status is Received",
        payment_mode_required,
        has_payment_mode,
    ),
    Rule::when("paymentMode", "Invalid payment mode", payment_mode_given, has_payment_mode),
    Rule::when("frontImage", "Front Image is required", front_image_required, has_front_image),
];

const SERVICE_RULES: &[Rule<EntryForm>] = &[
    Rule::new("date", "Date is required", date_given),
    Rule::new("internalRef", "Internal Reference is required", has_internal_ref),
    Rule::new("model", "Model is required", has_model),
    Rule::new("issue", "Issue is required", has_issue),
];

const SALE_RULES: &[Rule<EntryForm>] = &[
    Rule::new("partNumberOrName", "Part number or name is required", has_part),
    Rule::new("price", "Price is required", has_price),
    Rule::new("price", "Price must be a non-negative amount", price_valid),
    Rule::when("model", "Model is invalid", model_given, has_model),
];

const SERVICE_SCHEMA: &[&[Rule<EntryForm>]] = &[COMMON_RULES, SERVICE_RULES];
const SALE_SCHEMA: &[&[Rule<EntryForm>]] = &[COMMON_RULES, SALE_RULES];
const TYPE_ONLY_SCHEMA: &[&[Rule<EntryForm>]] = &[COMMON_RULES];

impl Schema for EntryForm {
    type Output = EntryPayload;

    fn rule_sets(&self) -> &'static [&'static [Rule<Self>]] {
        match self.entry_type() {
            Some(EntryType::Service) => SERVICE_SCHEMA,
            Some(EntryType::Sale) => SALE_SCHEMA,
            None => TYPE_ONLY_SCHEMA,
        }
    }

    fn build(&self) -> Result<EntryPayload, ValidationErrors> {
        let missing = |field: &str, message: &str| ValidationErrors::single(field, message);

        let entry_type = self
            .entry_type()
            .ok_or_else(|| missing("entryType", "Entry type must be Service or Sale"))?;
        let customer_id =
            parse_id(&self.customer).ok_or_else(|| missing("customer", "Customer is required"))?;
        let device_id =
            parse_id(&self.device).ok_or_else(|| missing("device", "Device is required"))?;
        let product_status = ProductStatus::parse(&self.product_status)
            .ok_or_else(|| missing("productStatus", "Product Status is required"))?;
        let payment_status = PaymentStatus::parse(&self.payment_status)
            .ok_or_else(|| missing("paymentStatus", "Payment Status is required"))?;

        let date = match parse_date(&self.date) {
            Some(date) => date,
            None if entry_type == EntryType::Sale => Local::now().date_naive(),
            None => return Err(missing("date", "Date is required")),
        };

        let kind = match entry_type {
            EntryType::Service => EntryKind::Service {
                model_id: parse_id(&self.model)
                    .ok_or_else(|| missing("model", "Model is required"))?,
                issue: self.issue.trim().to_string(),
                imei: optional(&self.imei),
                passcode: optional(&self.passcode),
            },
            EntryType::Sale => EntryKind::Sale {
                part_number_or_name: self.part_number_or_name.trim().to_string(),
                price: self.price.trim().to_string(),
                model_id: parse_id(&self.model),
            },
        };

        Ok(EntryPayload {
            internal_ref: optional(&self.internal_ref),
            external_ref: optional(&self.external_ref),
            date,
            customer_id,
            device_id,
            estimate: optional(&self.estimate).unwrap_or_else(|| "0".to_string()),
            product_status,
            payment_status,
            payment_mode: PaymentMode::parse(&self.payment_mode),
            kind,
        })
    }
}
