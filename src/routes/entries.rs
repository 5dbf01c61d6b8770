//! Mobile entries page.
//!
//! The entry form is a single multipart form whose `action` button decides
//! what a post does:
//!
//! | `action` | Effect |
//! |----------|--------|
//! | `submit` | validate and create/update the entry |
//! | `cancel` | release staged previews, back to the list |
//! | `select_device` | reload the model list for the chosen device |
//! | `search_model` | search the device's models by name |
//! | `request_model` | ask to create the searched name as a new model |
//! | `create_model` / `cancel_model` | confirm or drop that request |
//! | `add_customer` / `add_device` | nested create, then select the new record |
//! | `remove:{previewId}` | drop one staged image |
//!
//! Every action other than a successful submit or cancel re-renders the form
//! with the draft intact, including staged images.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::Local;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::forms::entry::models_for_picker;
use crate::forms::{Attachment, EntryDraft, ImageSlot, ModelLookup};
use crate::routes::{ListQuery, Panel, page, redirect_with_notice};
use crate::shop::models::{Customer, Device, MobileEntry, Model};
use crate::validation::{
    CustomerForm, DeviceForm, EntryForm, ModelForm, ValidationErrors, validate,
};
use crate::views::forms::{
    self, EntryFormView, MODEL_QUERY, NEW_CUSTOMER_EMAIL, NEW_CUSTOMER_NAME, NEW_CUSTOMER_PHONE,
    NEW_DEVICE_NAME, NestedPanel, PENDING_MODEL, STAGED_ADDITIONAL, STAGED_FRONT,
};
use crate::views::html::{self, escape};
use crate::views::{Notice, Table, detail};

const BASE: &str = "/entries";
const TITLE: &str = "Mobile Entries";

// == List and read-only panels ==================================================

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let mut notice = query.notice();

    let panel_html = match query.panel() {
        Panel::Add => match new_draft(&state).await {
            Ok(draft) => {
                let context = FormContext::load(&state, &draft).await;
                context.render(&draft, BASE, &ValidationErrors::new(), &NestedPanel::Closed)
            }
            Err(e) => {
                notice = Some(Notice::error(e.notice("Failed to prepare a new entry")));
                String::new()
            }
        },
        Panel::Edit(id) => match find_entry(&state, id).await {
            Ok(entry) => {
                let draft = EntryDraft::new(EntryForm::from_entry(&entry));
                let mut context = FormContext::load(&state, &draft).await;
                context.stored_images = stored_images(&entry);
                context.render(
                    &draft,
                    &format!("{BASE}/{id}"),
                    &ValidationErrors::new(),
                    &NestedPanel::Closed,
                )
            }
            Err(e) => {
                notice = Some(Notice::error(e.notice("Failed to load entry")));
                String::new()
            }
        },
        Panel::View(id) => match find_entry(&state, id).await {
            Ok(entry) => detail::entry_view(&entry, &state.config.entry_id_prefix, BASE),
            Err(e) => {
                notice = Some(Notice::error(e.notice("Failed to load entry")));
                String::new()
            }
        },
        Panel::ConfirmDelete(id) => forms::confirm_delete(
            &format!("entry {}{id}", state.config.entry_id_prefix),
            &format!("{BASE}/{id}/delete"),
            BASE,
        ),
        Panel::None => String::new(),
    };

    render(&state, &query, panel_html, notice, StatusCode::OK).await
}

pub async fn print(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Html<String>> {
    let entry = find_entry(&state, id).await?;
    let prefix = &state.config.entry_id_prefix;
    Ok(Html(html::print_page(
        &entry.display_id(prefix),
        &detail::entry_ticket(&entry, prefix),
    )))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.queries.delete_entry(id).await {
        Ok(_) => redirect_with_notice(BASE, &Notice::success("Entry deleted successfully"))
            .into_response(),
        Err(e) => {
            tracing::warn!(id, error = %e, "Failed to delete entry");
            let panel = forms::confirm_delete(
                &format!("entry {}{id}", state.config.entry_id_prefix),
                &format!("{BASE}/{id}/delete"),
                BASE,
            );
            let notice = Notice::error(e.notice("Failed to delete entry"));
            render(&state, &ListQuery::default(), panel, Some(notice), e.status()).await
        }
    }
}

// == Form posts =================================================================

pub async fn create(State(state): State<AppState>, multipart: Multipart) -> Response {
    handle_post(&state, None, multipart).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Response {
    handle_post(&state, Some(id), multipart).await
}

async fn handle_post(state: &AppState, id: Option<i64>, multipart: Multipart) -> Response {
    let post = match EntryPost::read(multipart).await {
        Ok(post) => post,
        Err(e) => return e.into_response(),
    };
    let action_url = id.map_or_else(|| BASE.to_string(), |id| format!("{BASE}/{id}"));

    let mut draft = match post.restore_draft(state, id.is_some()).await {
        Ok(draft) => draft,
        Err(e) => return e.into_response(),
    };
    let mut context = FormContext::load(state, &draft).await;
    if let Some(id) = id
        && let Ok(entry) = find_entry(state, id).await
    {
        context.stored_images = stored_images(&entry);
    }
    // Whatever the action, a model outside the chosen device never survives.
    draft.select_device(draft.device_id(), &context.models);
    if draft.lookup == ModelLookup::Idle {
        draft.lookup = ModelLookup::search(&post.model_query, &context.models);
    }

    let mut errors = ValidationErrors::new();
    let mut nested = NestedPanel::Closed;
    let mut notice = None;
    let mut status = StatusCode::OK;

    match post.action.as_str() {
        "submit" => match validate(&draft.form) {
            Ok(payload) => {
                let submission = draft.submission(payload);
                let result = match id {
                    Some(id) => state.queries.update_entry(id, &submission).await,
                    None => state.queries.add_entry(&submission).await,
                };
                match result {
                    Ok(_) => {
                        state.previews.release_all(&draft.files.preview_ids()).await;
                        let message = if id.is_some() {
                            "Entry updated successfully"
                        } else {
                            "Entry added successfully"
                        };
                        tracing::info!(
                            entry_id = ?id,
                            attachments = submission.attachments.len(),
                            "{message}"
                        );
                        return redirect_with_notice(BASE, &Notice::success(message))
                            .into_response();
                    }
                    Err(e) => {
                        tracing::warn!(entry_id = ?id, error = %e, "Failed to save entry");
                        notice = Some(Notice::error(e.notice("Failed to save entry")));
                        status = e.status();
                    }
                }
            }
            Err(field_errors) => {
                errors = field_errors;
                status = StatusCode::UNPROCESSABLE_ENTITY;
            }
        },
        "cancel" => {
            state.previews.release_all(&draft.files.preview_ids()).await;
            return redirect_with_notice(BASE, &Notice::success("Entry form cancelled"))
                .into_response();
        }
        // The device cascade already ran; re-render with the new model list.
        "select_device" => {}
        "search_model" => {
            draft.lookup = ModelLookup::search(&post.model_query, &context.models);
        }
        "request_model" => {
            draft.lookup = ModelLookup::search(&post.model_query, &context.models).request_create();
        }
        "cancel_model" => {
            draft.lookup = draft.lookup.clone().cancel();
        }
        "create_model" => {
            let model_form = ModelForm {
                device_id: draft.form.device.clone(),
                model_name: post.pending_model.clone(),
            };
            match validate(&model_form) {
                Ok(input) => match state.queries.add_model(&input).await {
                    Ok(res) => match state.queries.created_model(&res, &input).await {
                        Ok(Some(model)) => {
                            draft.select_model(&model);
                            draft.lookup = draft.lookup.clone().created(model);
                            context.reload_models(state, draft.device_id()).await;
                            notice = Some(Notice::success("Model created"));
                        }
                        Ok(None) => {
                            context.reload_models(state, draft.device_id()).await;
                            draft.lookup = ModelLookup::Idle;
                            notice = Some(Notice::success("Model created, select it from the list"));
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Could not resolve new model");
                            notice = Some(Notice::error(
                                e.notice("Model created but could not be loaded"),
                            ));
                        }
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to add model");
                        notice = Some(Notice::error(e.notice("Failed to add model")));
                        status = e.status();
                    }
                },
                Err(model_errors) => {
                    if let Some(msg) = model_errors.message("deviceId") {
                        errors.push("device", msg);
                    }
                    if let Some(msg) = model_errors.message("modelName") {
                        errors.push("model", msg);
                    }
                    status = StatusCode::UNPROCESSABLE_ENTITY;
                }
            }
        }
        "add_customer" => match validate(&post.new_customer) {
            Ok(input) => match state.queries.add_customer(&input).await {
                Ok(res) => {
                    match state.queries.created_customer_id(&res, &input).await {
                        Ok(Some(customer_id)) => draft.select_customer(customer_id),
                        Ok(None) => {}
                        Err(e) => tracing::warn!(error = %e, "Could not resolve new customer"),
                    }
                    context.reload_customers(state).await;
                    notice = Some(Notice::success("Customer added successfully"));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to add customer");
                    nested = NestedPanel::Customer {
                        form: post.new_customer.clone(),
                        errors: ValidationErrors::new(),
                    };
                    notice = Some(Notice::error(e.notice("Failed to add customer")));
                    status = e.status();
                }
            },
            Err(customer_errors) => {
                nested = NestedPanel::Customer {
                    form: post.new_customer.clone(),
                    errors: customer_errors,
                };
                status = StatusCode::UNPROCESSABLE_ENTITY;
            }
        },
        "add_device" => match validate(&post.new_device) {
            Ok(input) => match state.queries.add_device(&input).await {
                Ok(res) => {
                    match state.queries.created_device_id(&res, &input).await {
                        Ok(Some(device_id)) => {
                            context.reload_models(state, Some(device_id)).await;
                            draft.select_device(Some(device_id), &context.models);
                        }
                        Ok(None) => {}
                        Err(e) => tracing::warn!(error = %e, "Could not resolve new device"),
                    }
                    context.reload_devices(state).await;
                    notice = Some(Notice::success("Device added successfully"));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to add device");
                    nested = NestedPanel::Device {
                        form: post.new_device.clone(),
                        errors: ValidationErrors::new(),
                    };
                    notice = Some(Notice::error(e.notice("Failed to add device")));
                    status = e.status();
                }
            },
            Err(device_errors) => {
                nested = NestedPanel::Device {
                    form: post.new_device.clone(),
                    errors: device_errors,
                };
                status = StatusCode::UNPROCESSABLE_ENTITY;
            }
        },
        other => match other.strip_prefix("remove:").and_then(|id| id.parse::<Uuid>().ok()) {
            Some(preview_id) => {
                if draft.files.remove(preview_id) {
                    state.previews.release(preview_id).await;
                }
                draft.sync_files();
            }
            None => {
                return AppError::BadRequest(format!("Unknown form action {other:?}"))
                    .into_response();
            }
        },
    }

    let panel = context.render(&draft, &action_url, &errors, &nested);
    render(state, &ListQuery::default(), panel, notice, status).await
}

// == Multipart decoding =========================================================

/// Everything one post of the entry form carries.
#[derive(Debug, Default)]
struct EntryPost {
    action: String,
    fields: Map<String, Value>,
    new_customer: CustomerForm,
    new_device: DeviceForm,
    model_query: String,
    pending_model: String,
    staged_front: Option<Uuid>,
    staged_additional: Vec<Uuid>,
    uploads: Vec<Attachment>,
}

impl EntryPost {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut post = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed form data: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();

            let slot = match name.as_str() {
                "frontImage" => Some(ImageSlot::Front),
                "additionalImages" => Some(ImageSlot::Additional),
                _ => None,
            };
            if let Some(slot) = slot {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
                // Untouched file inputs arrive as empty parts.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                post.uploads.push(Attachment {
                    slot,
                    file_name,
                    content_type,
                    bytes,
                });
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Malformed form field {name}: {e}")))?;

            match name.as_str() {
                "action" => post.action = text,
                NEW_CUSTOMER_NAME => post.new_customer.name = text,
                NEW_CUSTOMER_PHONE => post.new_customer.phone = text,
                NEW_CUSTOMER_EMAIL => post.new_customer.email = text,
                NEW_DEVICE_NAME => post.new_device.device_name = text,
                MODEL_QUERY => post.model_query = text,
                PENDING_MODEL => post.pending_model = text,
                STAGED_FRONT => post.staged_front = text.trim().parse().ok(),
                STAGED_ADDITIONAL => post.staged_additional.extend(text.trim().parse::<Uuid>().ok()),
                _ => {
                    post.fields.insert(name, Value::String(text));
                }
            }
        }

        if post.action.is_empty() {
            post.action = "submit".to_string();
        }
        Ok(post)
    }

    /// Rebuild the draft: posted fields, previously staged images, then the
    /// files uploaded with this post.
    async fn restore_draft(&self, state: &AppState, editing: bool) -> AppResult<EntryDraft> {
        let form: EntryForm = serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| AppError::BadRequest(format!("Malformed entry form: {e}")))?;
        let mut draft = EntryDraft::new(EntryForm { editing, ..form });

        let staged = self.staged_front.iter().chain(self.staged_additional.iter());
        for preview_id in staged {
            if let Some(image) = state.previews.restore(*preview_id).await {
                let superseded = draft.files.select(image);
                state.previews.release_all(&superseded).await;
            }
        }

        for upload in &self.uploads {
            if !upload.is_acceptable() {
                tracing::debug!(
                    file = %upload.file_name,
                    content_type = %upload.content_type,
                    size_bytes = upload.len(),
                    "upload_dropped"
                );
                continue;
            }
            let image = state.previews.stage(upload.clone()).await;
            let superseded = draft.files.select(image);
            state.previews.release_all(&superseded).await;
        }
        draft.sync_files();

        if !self.pending_model.trim().is_empty() {
            draft.lookup = ModelLookup::ConfirmCreate {
                name: self.pending_model.trim().to_string(),
            };
        }

        Ok(draft)
    }
}

// == Rendering ==================================================================

/// Picker data for the entry form.
struct FormContext {
    customers: Vec<Customer>,
    devices: Vec<Device>,
    models: Vec<Model>,
    stored_images: Vec<String>,
}

impl FormContext {
    async fn load(state: &AppState, draft: &EntryDraft) -> Self {
        let mut context = Self {
            customers: Vec::new(),
            devices: Vec::new(),
            models: Vec::new(),
            stored_images: Vec::new(),
        };
        context.reload_customers(state).await;
        context.reload_devices(state).await;
        context.reload_models(state, draft.device_id()).await;
        context
    }

    async fn reload_customers(&mut self, state: &AppState) {
        self.customers = match state.queries.customers().await {
            Ok(customers) => customers.into_iter().filter(|c| c.is_active).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load customers for entry form");
                Vec::new()
            }
        };
    }

    async fn reload_devices(&mut self, state: &AppState) {
        self.devices = match state.queries.devices().await {
            Ok(devices) => devices.into_iter().filter(|d| d.is_active).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load devices for entry form");
                Vec::new()
            }
        };
    }

    async fn reload_models(&mut self, state: &AppState, device_id: Option<i64>) {
        self.models = match device_id {
            Some(device_id) => match state.queries.models_for_device(device_id).await {
                Ok(models) => models_for_picker(&models, device_id),
                Err(e) => {
                    tracing::warn!(device_id, error = %e, "Failed to load models for entry form");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
    }

    fn render(
        &self,
        draft: &EntryDraft,
        action: &str,
        errors: &ValidationErrors,
        nested: &NestedPanel,
    ) -> String {
        let submit_label = if draft.form.editing {
            "Update Entry"
        } else {
            "Add Entry"
        };
        EntryFormView {
            action,
            draft,
            errors,
            customers: &self.customers,
            devices: &self.devices,
            models: &self.models,
            nested,
            stored_images: &self.stored_images,
            submit_label,
        }
        .render()
    }
}

async fn new_draft(state: &AppState) -> AppResult<EntryDraft> {
    let next_id = state.queries.next_entry_id().await?;
    let today = Local::now().date_naive();
    Ok(EntryDraft::new(EntryForm::new_intake(
        today,
        next_id.map(|id| id.to_string()),
    )))
}

async fn find_entry(state: &AppState, id: i64) -> AppResult<MobileEntry> {
    state
        .queries
        .entries()
        .await?
        .into_iter()
        .find(|e| e.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Entry {id} not found")))
}

fn stored_images(entry: &MobileEntry) -> Vec<String> {
    entry
        .front_image
        .iter()
        .chain(entry.additional_images.iter())
        .cloned()
        .collect()
}

async fn render(
    state: &AppState,
    query: &ListQuery,
    panel_html: String,
    mut notice: Option<Notice>,
    status: StatusCode,
) -> Response {
    let entries = match state.queries.entries().await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load entries");
            notice = Some(Notice::error(e.notice("Failed to load entries")));
            Vec::new()
        }
    };

    let prefix = state.config.entry_id_prefix.as_str();
    let pager = query.pager(entries.len(), state.config.default_page_size);
    let table = Table::new()
        .column("ID", |e: &MobileEntry| e.display_id(prefix))
        .column("Internal Ref", |e: &MobileEntry| e.internal_ref.clone())
        .column("Date", |e: &MobileEntry| {
            e.date.map(|d| d.format("%d %b %Y").to_string()).unwrap_or_default()
        })
        .column("Type", |e: &MobileEntry| e.entry_type.to_string())
        .column("Customer", |e: &MobileEntry| e.customer_name.clone())
        .column("Phone", |e: &MobileEntry| e.customer_phone.clone())
        .column("Device", |e: &MobileEntry| e.device_name.clone())
        .column("Model", |e: &MobileEntry| e.model_name.clone())
        .column("Estimate", |e: &MobileEntry| e.estimate.clone())
        .column("Product Status", |e: &MobileEntry| e.product_status.clone())
        .column("Payment Status", |e: &MobileEntry| e.payment_status.clone())
        .link("View", |e: &MobileEntry| query.panel_href(BASE, "view", Some(e.id)))
        .link("Edit", |e: &MobileEntry| query.panel_href(BASE, "edit", Some(e.id)))
        .link("Print", |e: &MobileEntry| format!("{BASE}/{}/print", e.id))
        .link("Delete", |e: &MobileEntry| query.panel_href(BASE, "delete", Some(e.id)));

    let body = format!(
        r#"<p><a href="{add}">Add Entry</a></p>{panel_html}{table}"#,
        add = escape(&query.panel_href(BASE, "add", None)),
        table = table.render(pager.slice(&entries), &pager, BASE),
    );
    page(status, TITLE, BASE, notice.as_ref(), &body)
}
