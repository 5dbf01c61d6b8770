//! Devices page. Inactive devices stay listed and editable here; they are
//! only hidden from the entry form pickers.

use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::common::AppState;
use crate::error::AppError;
use crate::routes::customers::{active_label, toggle_label};
use crate::routes::{ListQuery, Panel, ToggleQuery, page, redirect_with_notice};
use crate::shop::models::Device;
use crate::validation::{DeviceForm, ValidationErrors, validate};
use crate::views::{Notice, Table, forms};

const BASE: &str = "/devices";
const TITLE: &str = "Devices";

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    render(&state, &query, None, query.notice(), StatusCode::OK).await
}

pub async fn create(State(state): State<AppState>, Form(form): Form<DeviceForm>) -> Response {
    let input = match validate(&form) {
        Ok(input) => input,
        Err(errors) => {
            let panel = forms::device_form(BASE, &form, &errors, "Add Device", BASE);
            return render_panel(&state, panel, None, StatusCode::UNPROCESSABLE_ENTITY).await;
        }
    };

    match state.queries.add_device(&input).await {
        Ok(_) => {
            tracing::info!(device = %input.device_name, "Device added");
            redirect_with_notice(BASE, &Notice::success("Device added successfully")).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to add device");
            let panel = forms::device_form(BASE, &form, &ValidationErrors::new(), "Add Device", BASE);
            let notice = Notice::error(e.notice("Failed to add device"));
            render_panel(&state, panel, Some(notice), e.status()).await
        }
    }
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<DeviceForm>,
) -> Response {
    let action = format!("{BASE}/{id}");
    let mut input = match validate(&form) {
        Ok(input) => input,
        Err(errors) => {
            let panel = forms::device_form(&action, &form, &errors, "Update Device", BASE);
            return render_panel(&state, panel, None, StatusCode::UNPROCESSABLE_ENTITY).await;
        }
    };

    // Keep the stored active flag.
    let current = state.queries.devices().await.and_then(|devices| {
        devices
            .into_iter()
            .find(|d| d.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Device {id} not found")))
    });
    match current {
        Ok(current) => input.is_active = current.is_active,
        Err(e) => {
            tracing::warn!(id, error = %e, "Failed to read current device");
            let panel = forms::device_form(
                &action,
                &form,
                &ValidationErrors::new(),
                "Update Device",
                BASE,
            );
            let notice = Notice::error(e.notice("Failed to update device"));
            return render_panel(&state, panel, Some(notice), e.status()).await;
        }
    }

    match state.queries.update_device(id, &input).await {
        Ok(_) => redirect_with_notice(BASE, &Notice::success("Device updated successfully"))
            .into_response(),
        Err(e) => {
            tracing::warn!(id, error = %e, "Failed to update device");
            let panel = forms::device_form(
                &action,
                &form,
                &ValidationErrors::new(),
                "Update Device",
                BASE,
            );
            let notice = Notice::error(e.notice("Failed to update device"));
            render_panel(&state, panel, Some(notice), e.status()).await
        }
    }
}

pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(target): Query<ToggleQuery>,
) -> Response {
    match state.queries.set_device_active(id, target.active).await {
        Ok(_) => {
            let message = if target.active {
                "Device activated"
            } else {
                "Device deactivated"
            };
            redirect_with_notice(BASE, &Notice::success(message)).into_response()
        }
        Err(e) => {
            tracing::warn!(id, error = %e, "Failed to toggle device");
            redirect_with_notice(BASE, &Notice::error(e.notice("Failed to update device")))
                .into_response()
        }
    }
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.queries.delete_device(id).await {
        Ok(_) => redirect_with_notice(BASE, &Notice::success("Device deleted successfully"))
            .into_response(),
        Err(e) => {
            tracing::warn!(id, error = %e, "Failed to delete device");
            let query = ListQuery {
                panel: Some("delete".to_string()),
                id: Some(id),
                ..ListQuery::default()
            };
            let notice = Notice::error(e.notice("Failed to delete device"));
            render(&state, &query, None, Some(notice), e.status()).await
        }
    }
}

async fn render_panel(
    state: &AppState,
    panel: String,
    notice: Option<Notice>,
    status: StatusCode,
) -> Response {
    render(state, &ListQuery::default(), Some(panel), notice, status).await
}

async fn render(
    state: &AppState,
    query: &ListQuery,
    panel_html: Option<String>,
    mut notice: Option<Notice>,
    status: StatusCode,
) -> Response {
    let devices = match state.queries.devices().await {
        Ok(devices) => devices,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load devices");
            notice = Some(Notice::error(e.notice("Failed to load devices")));
            Vec::new()
        }
    };

    let panel_html = panel_html.unwrap_or_else(|| match query.panel() {
        Panel::Add => forms::device_form(
            BASE,
            &DeviceForm::default(),
            &ValidationErrors::new(),
            "Add Device",
            BASE,
        ),
        Panel::Edit(id) => match devices.iter().find(|d| d.id == id) {
            Some(device) => forms::device_form(
                &format!("{BASE}/{id}"),
                &DeviceForm {
                    device_name: device.device_name.clone(),
                },
                &ValidationErrors::new(),
                "Update Device",
                BASE,
            ),
            None => {
                notice.get_or_insert_with(|| Notice::error("Device not found"));
                String::new()
            }
        },
        Panel::ConfirmDelete(id) => {
            let what = devices
                .iter()
                .find(|d| d.id == id)
                .map_or_else(|| format!("device #{id}"), |d| format!("device {}", d.device_name));
            forms::confirm_delete(&what, &format!("{BASE}/{id}/delete"), BASE)
        }
        Panel::View(_) | Panel::None => String::new(),
    });

    let pager = query.pager(devices.len(), state.config.default_page_size);
    let table = Table::new()
        .column("Device Name", |d: &Device| d.device_name.clone())
        .column("Status", |d: &Device| active_label(d.is_active).to_string())
        .link("Edit", |d: &Device| query.panel_href(BASE, "edit", Some(d.id)))
        .button(
            |d: &Device| toggle_label(d.is_active).to_string(),
            |d: &Device| format!("{BASE}/{}/toggle?active={}", d.id, !d.is_active),
        )
        .link("Delete", |d: &Device| query.panel_href(BASE, "delete", Some(d.id)));

    let body = format!(
        r#"<p><a href="{add}">Add Device</a></p>{panel_html}{table}"#,
        add = query.panel_href(BASE, "add", None),
        table = table.render(pager.slice(&devices), &pager, BASE),
    );
    page(status, TITLE, BASE, notice.as_ref(), &body)
}
