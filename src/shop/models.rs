use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// == Reference data ===========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, deserialize_with = "de_blank_as_none")]
    pub email: Option<String>,
    #[serde(default = "default_active", alias = "enabled")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,
    pub device_name: String,
    #[serde(default = "default_active", alias = "enabled")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,
    #[serde(deserialize_with = "de_id")]
    pub device_id: i64,
    pub model_name: String,
    #[serde(default = "default_active", alias = "enabled")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

// == Enumerations =============================================================

/// Declares a closed set of wire labels with parsing and display helpers.
macro_rules! label_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            /// Exact, case-sensitive match on the wire label.
            #[must_use]
            pub fn parse(value: &str) -> Option<Self> {
                match value.trim() {
                    $($label => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

label_enum! {
    /// Where the handset is in the repair workflow.
    ProductStatus {
        Received => "Received",
        InProgress => "In progress",
        Return => "Return",
        Ready => "Ready",
        Delivered => "Delivered",
    }
}

label_enum! {
    PaymentStatus {
        Received => "Received",
        NotReceived => "Not received",
        Partial => "Partial",
    }
}

label_enum! {
    PaymentMode {
        Upi => "UPI",
        Card => "Card",
        Cash => "Cash",
    }
}

label_enum! {
    /// Repair work versus an over-the-counter part sale.
    EntryType {
        Service => "Service",
        Sale => "Sale",
    }
}

// == Mobile entries ===========================================================

/// A repair ticket as listed by the backend, flattened for display.
///
/// The list endpoint returns either nested rows
/// (`{ entry, customer, device, model, frontImage, additionalImages }`) or flat
/// ticket objects; both decode into this type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawEntry")]
pub struct MobileEntry {
    pub id: i64,
    pub internal_ref: String,
    pub external_ref: Option<String>,
    pub date: Option<NaiveDate>,
    pub customer_id: Option<i64>,
    pub customer_name: String,
    pub customer_phone: String,
    pub device_id: Option<i64>,
    pub device_name: String,
    pub model_id: Option<i64>,
    pub model_name: String,
    pub imei: Option<String>,
    pub issue: Option<String>,
    pub passcode: Option<String>,
    pub estimate: String,
    pub entry_type: EntryType,
    pub part_number_or_name: Option<String>,
    pub price: Option<String>,
    pub product_status: String,
    pub payment_status: String,
    pub payment_mode: Option<String>,
    pub front_image: Option<String>,
    pub additional_images: Vec<String>,
}

impl MobileEntry {
    #[must_use]
    pub fn display_id(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.id)
    }
}

/// Columns stored on the ticket itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryFields {
    #[serde(deserialize_with = "de_id", alias = "entryId")]
    id: i64,
    #[serde(default, deserialize_with = "de_text")]
    internal_ref: String,
    #[serde(default, deserialize_with = "de_blank_as_none")]
    external_ref: Option<String>,
    #[serde(default, alias = "receivedDate")]
    date: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    customer_id: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_id")]
    device_id: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_id")]
    model_id: Option<i64>,
    #[serde(default, deserialize_with = "de_blank_as_none")]
    imei: Option<String>,
    #[serde(default, deserialize_with = "de_blank_as_none")]
    issue: Option<String>,
    #[serde(default, deserialize_with = "de_blank_as_none")]
    passcode: Option<String>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    estimate: Option<String>,
    #[serde(default)]
    entry_type: Option<String>,
    #[serde(default, deserialize_with = "de_blank_as_none")]
    part_number_or_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    price: Option<String>,
    #[serde(default, alias = "status")]
    product_status: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default, deserialize_with = "de_blank_as_none")]
    payment_mode: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NestedEntry {
    entry: EntryFields,
    #[serde(default)]
    customer: Option<Customer>,
    #[serde(default)]
    device: Option<Device>,
    #[serde(default)]
    model: Option<Model>,
    #[serde(default)]
    front_image: Option<String>,
    #[serde(default)]
    additional_images: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlatEntry {
    #[serde(flatten)]
    entry: EntryFields,
    #[serde(default)]
    customer: Option<String>,
    #[serde(default)]
    contact: Option<String>,
    #[serde(default)]
    device: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    front_image: Option<String>,
    #[serde(default)]
    additional_images: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Nested(NestedEntry),
    Flat(FlatEntry),
}

impl From<RawEntry> for MobileEntry {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Nested(n) => {
                let customer_id = n.customer.as_ref().map(|c| c.id).or(n.entry.customer_id);
                let device_id = n.device.as_ref().map(|d| d.id).or(n.entry.device_id);
                let model_id = n.model.as_ref().map(|m| m.id).or(n.entry.model_id);
                Self::assemble(
                    n.entry,
                    EntryNames {
                        customer_id,
                        customer_name: n.customer.as_ref().map(|c| c.name.clone()),
                        customer_phone: n.customer.map(|c| c.phone),
                        device_id,
                        device_name: n.device.map(|d| d.device_name),
                        model_id,
                        model_name: n.model.map(|m| m.model_name),
                    },
                    n.front_image,
                    n.additional_images,
                )
            }
            RawEntry::Flat(f) => {
                let names = EntryNames {
                    customer_id: f.entry.customer_id,
                    customer_name: f.customer,
                    customer_phone: f.contact,
                    device_id: f.entry.device_id,
                    device_name: f.device,
                    model_id: f.entry.model_id,
                    model_name: f.model,
                };
                Self::assemble(f.entry, names, f.front_image, f.additional_images)
            }
        }
    }
}

struct EntryNames {
    customer_id: Option<i64>,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    device_id: Option<i64>,
    device_name: Option<String>,
    model_id: Option<i64>,
    model_name: Option<String>,
}

impl MobileEntry {
    fn assemble(
        fields: EntryFields,
        names: EntryNames,
        front_image: Option<String>,
        additional_images: Vec<String>,
    ) -> Self {
        Self {
            id: fields.id,
            internal_ref: fields.internal_ref,
            external_ref: fields.external_ref,
            date: fields.date.as_deref().and_then(parse_wire_date),
            customer_id: names.customer_id,
            customer_name: names.customer_name.unwrap_or_default(),
            customer_phone: names.customer_phone.unwrap_or_default(),
            device_id: names.device_id,
            device_name: names.device_name.unwrap_or_default(),
            model_id: names.model_id,
            model_name: names.model_name.unwrap_or_default(),
            imei: fields.imei,
            issue: fields.issue,
            passcode: fields.passcode,
            estimate: fields.estimate.unwrap_or_else(|| "0".to_string()),
            entry_type: fields
                .entry_type
                .as_deref()
                .and_then(EntryType::parse)
                .unwrap_or(EntryType::Service),
            part_number_or_name: fields.part_number_or_name,
            price: fields.price,
            product_status: fields.product_status.unwrap_or_default(),
            payment_status: fields.payment_status.unwrap_or_default(),
            payment_mode: fields.payment_mode,
            front_image: front_image.filter(|s| !s.is_empty()),
            additional_images,
        }
    }
}

/// Accepts `YYYY-MM-DD` and full ISO-8601 timestamps (date part only).
#[must_use]
pub fn parse_wire_date(value: &str) -> Option<NaiveDate> {
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

// == Aggregates ===============================================================

/// Monthly throughput counters for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntriesStats {
    #[serde(default)]
    pub total_entries: u64,
    #[serde(default)]
    pub delivered_count: u64,
    #[serde(default)]
    pub returns_count: u64,
}

/// Outstanding amount for one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPending {
    #[serde(deserialize_with = "de_id")]
    pub customer_id: i64,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default, deserialize_with = "de_f64")]
    pub total_amount_to_be_received: f64,
    #[serde(default)]
    pub pending_entries: Vec<PendingEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEntry {
    #[serde(deserialize_with = "de_id")]
    pub entry_id: i64,
    #[serde(default, deserialize_with = "de_f64")]
    pub estimate: f64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub status: String,
}

// == Request payloads =========================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInput {
    pub device_name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInput {
    pub device_id: i64,
    pub model_name: String,
}

/// Body of `update-model`; absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUpdate {
    pub model_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Body of a toggle call: exactly one boolean field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveToggle {
    pub is_active: bool,
}

/// Structured fields of a repair ticket as sent to `add-entry`/`update-entry`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,
    pub date: NaiveDate,
    pub customer_id: i64,
    pub device_id: i64,
    pub estimate: String,
    pub product_status: ProductStatus,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_mode: Option<PaymentMode>,
    #[serde(flatten)]
    pub kind: EntryKind,
}

/// Branch-specific ticket fields, discriminated by `entryType` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "entryType", rename_all_fields = "camelCase")]
pub enum EntryKind {
    Service {
        model_id: i64,
        issue: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        imei: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        passcode: Option<String>,
    },
    Sale {
        part_number_or_name: String,
        price: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        model_id: Option<i64>,
    },
}

// == Lenient field decoders ===================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Int(i64),
    Float(f64),
    Text(String),
}

fn de_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Int(n) => Ok(n),
        #[allow(clippy::cast_possible_truncation)]
        NumberOrText::Float(f) if f.fract() == 0.0 => Ok(f as i64),
        NumberOrText::Float(f) => Err(serde::de::Error::custom(format!("invalid id {f}"))),
        NumberOrText::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid id {s:?}"))),
    }
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrText::Int(n)) => Some(n),
        #[allow(clippy::cast_possible_truncation)]
        Some(NumberOrText::Float(f)) if f.fract() == 0.0 => Some(f as i64),
        Some(NumberOrText::Text(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn de_opt_amount<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrText::Int(n)) => Some(n.to_string()),
        Some(NumberOrText::Float(f)) => Some(f.to_string()),
        Some(NumberOrText::Text(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

fn de_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(match value {
        #[allow(clippy::cast_precision_loss)]
        Some(NumberOrText::Int(n)) => n as f64,
        Some(NumberOrText::Float(f)) => f,
        Some(NumberOrText::Text(s)) => s.trim().parse().unwrap_or(0.0),
        None => 0.0,
    })
}

fn de_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrText::Int(n)) => n.to_string(),
        Some(NumberOrText::Float(f)) => f.to_string(),
        Some(NumberOrText::Text(s)) => s,
        None => String::new(),
    })
}

fn de_blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
