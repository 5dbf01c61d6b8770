//! Entity form panels.
//!
//! Every form re-renders with the submitted values and the first message per
//! field right under its input.

use std::fmt::Write;

use crate::forms::EntryDraft;
use crate::forms::ModelLookup;
use crate::shop::models::{
    Customer, Device, EntryType, Model, PaymentMode, PaymentStatus, ProductStatus,
};
use crate::validation::{CustomerForm, DeviceForm, ModelForm, ValidationErrors};
use crate::views::html::escape;

/// Input `name`s of the nested add-customer panel.
pub const NEW_CUSTOMER_NAME: &str = "newCustomerName";
pub const NEW_CUSTOMER_PHONE: &str = "newCustomerPhone";
pub const NEW_CUSTOMER_EMAIL: &str = "newCustomerEmail";
/// Input `name` of the nested add-device panel.
pub const NEW_DEVICE_NAME: &str = "newDeviceName";
pub const MODEL_QUERY: &str = "modelQuery";
pub const PENDING_MODEL: &str = "pendingModel";
pub const STAGED_FRONT: &str = "stagedFront";
pub const STAGED_ADDITIONAL: &str = "stagedAdditional";

// == Field helpers =============================================================

fn error_for(errors: &ValidationErrors, field: &str) -> String {
    errors
        .message(field)
        .map(|msg| format!(r#"<div class="field-error">{}</div>"#, escape(msg)))
        .unwrap_or_default()
}

fn required_mark(required: bool) -> &'static str {
    if required { " *" } else { "" }
}

#[must_use]
pub fn text_field(
    label: &str,
    name: &str,
    value: &str,
    errors: &ValidationErrors,
    required: bool,
) -> String {
    input_field(label, name, "text", value, errors, required, false)
}

fn input_field(
    label: &str,
    name: &str,
    input_type: &str,
    value: &str,
    errors: &ValidationErrors,
    required: bool,
    readonly: bool,
) -> String {
    let readonly = if readonly { " readonly" } else { "" };
    format!(
        r#"<div class="field"><label for="{name}">{label}{mark}</label><input id="{name}" name="{name}" type="{input_type}" value="{value}"{readonly}>{error}</div>"#,
        label = escape(label),
        mark = required_mark(required),
        value = escape(value),
        error = error_for(errors, name),
    )
}

/// `<select>` over `(value, label)` options with an empty placeholder.
#[must_use]
pub fn select_field(
    label: &str,
    name: &str,
    options: &[(String, String)],
    selected: &str,
    errors: &ValidationErrors,
    required: bool,
    extra: &str,
) -> String {
    let mut opts = format!(r#"<option value="">Select {}</option>"#, escape(label));
    for (value, text) in options {
        let sel = if value == selected { " selected" } else { "" };
        let _ = write!(
            opts,
            r#"<option value="{}"{sel}>{}</option>"#,
            escape(value),
            escape(text)
        );
    }
    format!(
        r#"<div class="field"><label for="{name}">{label}{mark}</label><select id="{name}" name="{name}"{extra}>{opts}</select>{error}</div>"#,
        label = escape(label),
        mark = required_mark(required),
        error = error_for(errors, name),
    )
}

fn label_options(labels: &[&str]) -> Vec<(String, String)> {
    labels
        .iter()
        .map(|l| ((*l).to_string(), (*l).to_string()))
        .collect()
}

fn form_buttons(submit_label: &str, cancel_href: &str) -> String {
    format!(
        r#"<div class="field"><button type="submit">{}</button> <a href="{}">Cancel</a></div>"#,
        escape(submit_label),
        escape(cancel_href)
    )
}

// == Reference data forms =======================================================

#[must_use]
pub fn customer_form(
    action: &str,
    form: &CustomerForm,
    errors: &ValidationErrors,
    submit_label: &str,
    cancel_href: &str,
) -> String {
    format!(
        r#"<section class="panel"><form method="post" action="{action}">
{name}{phone}{email}{buttons}
</form></section>"#,
        action = escape(action),
        name = text_field("Name", "name", &form.name, errors, true),
        phone = input_field("Phone", "phone", "tel", &form.phone, errors, true, false),
        email = input_field("Email", "email", "email", &form.email, errors, false, false),
        buttons = form_buttons(submit_label, cancel_href),
    )
}

#[must_use]
pub fn device_form(
    action: &str,
    form: &DeviceForm,
    errors: &ValidationErrors,
    submit_label: &str,
    cancel_href: &str,
) -> String {
    format!(
        r#"<section class="panel"><form method="post" action="{action}">
{name}{buttons}
</form></section>"#,
        action = escape(action),
        name = text_field("Device Name", "deviceName", &form.device_name, errors, true),
        buttons = form_buttons(submit_label, cancel_href),
    )
}

#[must_use]
pub fn model_form(
    action: &str,
    form: &ModelForm,
    devices: &[Device],
    errors: &ValidationErrors,
    submit_label: &str,
    cancel_href: &str,
) -> String {
    let options: Vec<(String, String)> = devices
        .iter()
        .map(|d| (d.id.to_string(), d.device_name.clone()))
        .collect();
    format!(
        r#"<section class="panel"><form method="post" action="{action}">
{device}{name}{buttons}
</form></section>"#,
        action = escape(action),
        device = select_field("Device", "deviceId", &options, &form.device_id, errors, true, ""),
        name = text_field("Model Name", "modelName", &form.model_name, errors, true),
        buttons = form_buttons(submit_label, cancel_href),
    )
}

/// Delete confirmation: nothing is removed until this form is posted.
#[must_use]
pub fn confirm_delete(what: &str, action: &str, cancel_href: &str) -> String {
    format!(
        r#"<section class="panel"><p>Delete {}? This cannot be undone.</p>
<form method="post" action="{}"><button type="submit">Delete</button> <a href="{}">Cancel</a></form></section>"#,
        escape(what),
        escape(action),
        escape(cancel_href)
    )
}

// == Mobile entry form ==========================================================

/// Which nested panel of the entry form failed and must be shown open.
#[derive(Debug, Clone, Default)]
pub enum NestedPanel {
    #[default]
    Closed,
    Customer {
        form: CustomerForm,
        errors: ValidationErrors,
    },
    Device {
        form: DeviceForm,
        errors: ValidationErrors,
    },
}

pub struct EntryFormView<'a> {
    pub action: &'a str,
    pub draft: &'a EntryDraft,
    pub errors: &'a ValidationErrors,
    /// Active customers only.
    pub customers: &'a [Customer],
    /// Active devices only.
    pub devices: &'a [Device],
    /// Active models of the selected device.
    pub models: &'a [Model],
    pub nested: &'a NestedPanel,
    /// Images already stored on the entry being edited.
    pub stored_images: &'a [String],
    pub submit_label: &'a str,
}

impl EntryFormView<'_> {
    #[must_use]
    pub fn render(&self) -> String {
        let form = &self.draft.form;
        let errors = self.errors;

        let type_radios: String = EntryType::ALL
            .iter()
            .map(|t| {
                let checked = if form.entry_type == t.as_str() { " checked" } else { "" };
                format!(
                    r#"<label><input type="radio" name="entryType" value="{t}"{checked}> {t}</label> "#
                )
            })
            .collect();

        let customer_options: Vec<(String, String)> = self
            .customers
            .iter()
            .map(|c| (c.id.to_string(), format!("{} ({})", c.name, c.phone)))
            .collect();
        let device_options: Vec<(String, String)> = self
            .devices
            .iter()
            .map(|d| (d.id.to_string(), d.device_name.clone()))
            .collect();

        let mut body = String::new();
        let _ = write!(
            body,
            r#"<section class="panel"><form method="post" action="{action}" enctype="multipart/form-data">
<button type="submit" name="action" value="submit" class="default-action" tabindex="-1" aria-hidden="true">{submit}</button>
<div class="field"><label>Entry Type *</label>{type_radios}{type_error}</div>
{internal_ref}{external_ref}{date}
<div class="field">{customer}{customer_panel}</div>
<div class="field">{device}<button type="submit" name="action" value="select_device" id="load-models" class="no-print">Load models</button>{device_panel}</div>
{model}
{imei}{issue}{passcode}
<fieldset><legend>Sale</legend>{part}{price}</fieldset>
{estimate}{product_status}{payment_status}{payment_mode}
{files}
<div class="field"><button type="submit" name="action" value="submit">{submit}</button> <button type="submit" name="action" value="cancel" formnovalidate>Cancel</button></div>
</form></section>"#,
            action = escape(self.action),
            type_error = error_for(errors, "entryType"),
            internal_ref = input_field(
                "Internal Reference",
                "internalRef",
                "text",
                &form.internal_ref,
                errors,
                true,
                true
            ),
            external_ref = text_field("External Reference", "externalRef", &form.external_ref, errors, false),
            date = input_field("Date", "date", "date", &form.date, errors, true, false),
            customer = select_field(
                "Customer",
                "customer",
                &customer_options,
                &form.customer,
                errors,
                true,
                ""
            ),
            customer_panel = self.customer_panel(),
            device = select_field(
                "Device",
                "device",
                &device_options,
                &form.device,
                errors,
                true,
                r#" onchange="document.getElementById('load-models').click()""#
            ),
            device_panel = self.device_panel(),
            model = self.model_section(),
            imei = text_field("IMEI", "imei", &form.imei, errors, false),
            issue = text_field("Issue", "issue", &form.issue, errors, false),
            passcode = text_field("Passcode", "passcode", &form.passcode, errors, false),
            part = text_field(
                "Part Number or Name",
                "partNumberOrName",
                &form.part_number_or_name,
                errors,
                false
            ),
            price = text_field("Price", "price", &form.price, errors, false),
            estimate = text_field("Estimate", "estimate", &form.estimate, errors, false),
            product_status = select_field(
                "Product Status",
                "productStatus",
                &label_options(&ProductStatus::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>()),
                &form.product_status,
                errors,
                true,
                ""
            ),
            payment_status = select_field(
                "Payment Status",
                "paymentStatus",
                &label_options(&PaymentStatus::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>()),
                &form.payment_status,
                errors,
                true,
                ""
            ),
            payment_mode = select_field(
                "Payment Mode",
                "paymentMode",
                &label_options(&PaymentMode::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>()),
                &form.payment_mode,
                errors,
                false,
                ""
            ),
            files = self.files_section(),
            submit = escape(self.submit_label),
        );
        body
    }

    fn customer_panel(&self) -> String {
        let (form, errors, open) = match self.nested {
            NestedPanel::Customer { form, errors } => (form.clone(), errors.clone(), " open"),
            _ => (CustomerForm::default(), ValidationErrors::new(), ""),
        };
        let remap = |field: &str, name: &str| {
            errors
                .message(field)
                .map(|m| ValidationErrors::single(name, m))
                .unwrap_or_default()
        };
        format!(
            r#"<details{open}><summary>Add customer</summary>{name}{phone}{email}<button type="submit" name="action" value="add_customer">Save customer</button></details>"#,
            name = text_field("Name", NEW_CUSTOMER_NAME, &form.name, &remap("name", NEW_CUSTOMER_NAME), true),
            phone = input_field(
                "Phone",
                NEW_CUSTOMER_PHONE,
                "tel",
                &form.phone,
                &remap("phone", NEW_CUSTOMER_PHONE),
                true,
                false
            ),
            email = input_field(
                "Email",
                NEW_CUSTOMER_EMAIL,
                "email",
                &form.email,
                &remap("email", NEW_CUSTOMER_EMAIL),
                false,
                false
            ),
        )
    }

    fn device_panel(&self) -> String {
        let (form, errors, open) = match self.nested {
            NestedPanel::Device { form, errors } => (form.clone(), errors.clone(), " open"),
            _ => (DeviceForm::default(), ValidationErrors::new(), ""),
        };
        let errors = errors
            .message("deviceName")
            .map(|m| ValidationErrors::single(NEW_DEVICE_NAME, m))
            .unwrap_or_default();
        format!(
            r#"<details{open}><summary>Add device</summary>{name}<button type="submit" name="action" value="add_device">Save device</button></details>"#,
            name = text_field("Device Name", NEW_DEVICE_NAME, &form.device_name, &errors, true),
        )
    }

    fn model_section(&self) -> String {
        let form = &self.draft.form;
        let lookup = &self.draft.lookup;

        let listed: &[Model] = match lookup {
            ModelLookup::Searching { matches, .. } => matches,
            _ => self.models,
        };
        let options: Vec<(String, String)> = listed
            .iter()
            .map(|m| (m.id.to_string(), m.model_name.clone()))
            .collect();
        let required = form.entry_type() != Some(EntryType::Sale);
        let select = select_field("Model", "model", &options, &form.model, self.errors, required, "");

        let query = lookup.query().unwrap_or_default();
        let status = match lookup {
            ModelLookup::Idle => String::new(),
            ModelLookup::Searching { matches, .. } => {
                format!(
                    r#"<p>{} matching model(s). <button type="submit" name="action" value="request_model">Create "{}"</button></p>"#,
                    matches.len(),
                    escape(query)
                )
            }
            ModelLookup::NoMatch { query } => format!(
                r#"<p>No model matches "{q}". <button type="submit" name="action" value="request_model">Create "{q}"</button></p>"#,
                q = escape(query)
            ),
            ModelLookup::ConfirmCreate { name } => format!(
                r#"<p>Create model "{n}" for the selected device?
<input type="hidden" name="{PENDING_MODEL}" value="{n}">
<button type="submit" name="action" value="create_model">Confirm</button>
<button type="submit" name="action" value="cancel_model">Cancel</button></p>"#,
                n = escape(name)
            ),
            ModelLookup::Created { model } => {
                format!(r#"<p>Model "{}" created.</p>"#, escape(&model.model_name))
            }
        };

        format!(
            r#"<div class="field">{select}
<label for="{MODEL_QUERY}">Find or create model</label><input id="{MODEL_QUERY}" name="{MODEL_QUERY}" type="search" value="{q}">
<button type="submit" name="action" value="search_model">Search</button>{status}</div>"#,
            q = escape(query),
        )
    }

    fn files_section(&self) -> String {
        let files = &self.draft.files;
        let mut staged = String::new();

        if let Some(front) = files.front() {
            let _ = write!(
                staged,
                r#"<figure><img class="preview" src="/previews/{id}" alt="{name}"><figcaption>Front: {name} <button type="submit" name="action" value="remove:{id}">Remove</button></figcaption><input type="hidden" name="{STAGED_FRONT}" value="{id}"></figure>"#,
                id = front.preview_id,
                name = escape(&front.attachment.file_name),
            );
        }
        for image in files.additional() {
            let _ = write!(
                staged,
                r#"<figure><img class="preview" src="/previews/{id}" alt="{name}"><figcaption>{name} <button type="submit" name="action" value="remove:{id}">Remove</button></figcaption><input type="hidden" name="{STAGED_ADDITIONAL}" value="{id}"></figure>"#,
                id = image.preview_id,
                name = escape(&image.attachment.file_name),
            );
        }

        let stored: String = self
            .stored_images
            .iter()
            .map(|url| format!(r#"<a href="{u}" target="_blank">{u}</a><br>"#, u = escape(url)))
            .collect();
        let stored = if stored.is_empty() {
            String::new()
        } else {
            format!("<p>Stored images:<br>{stored}</p>")
        };

        let front_required = !self.draft.form.editing;
        format!(
            r#"<div class="field"><label for="frontImage">Front Image{mark}</label><input id="frontImage" name="frontImage" type="file" accept="image/*">{error}</div>
<div class="field"><label for="additionalImages">Additional Images</label><input id="additionalImages" name="additionalImages" type="file" accept="image/*" multiple><small>Files over 8MB are skipped.</small></div>
{stored}{staged}"#,
            mark = required_mark(front_required),
            error = error_for(self.errors, "frontImage"),
        )
    }
}
