//! Models page, optionally filtered to one device (`?device=`).

use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::fmt::Write;

use crate::common::AppState;
use crate::routes::customers::{active_label, toggle_label};
use crate::routes::{ListQuery, Panel, ToggleQuery, page, redirect_with_notice};
use crate::shop::models::{Device, Model, ModelUpdate};
use crate::validation::{ModelForm, ValidationErrors, validate};
use crate::views::html::escape;
use crate::views::{Notice, Table, forms};

const BASE: &str = "/models";
const TITLE: &str = "Models";

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    render(&state, &query, None, query.notice(), StatusCode::OK).await
}

pub async fn create(State(state): State<AppState>, Form(form): Form<ModelForm>) -> Response {
    let devices = state.queries.devices().await.unwrap_or_default();
    let input = match validate(&form) {
        Ok(input) => input,
        Err(errors) => {
            let panel = forms::model_form(BASE, &form, &devices, &errors, "Add Model", BASE);
            return render_panel(&state, panel, None, StatusCode::UNPROCESSABLE_ENTITY).await;
        }
    };

    match state.queries.add_model(&input).await {
        Ok(_) => {
            tracing::info!(device_id = input.device_id, model = %input.model_name, "Model added");
            redirect_with_notice(BASE, &Notice::success("Model added successfully")).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to add model");
            let panel = forms::model_form(
                BASE,
                &form,
                &devices,
                &ValidationErrors::new(),
                "Add Model",
                BASE,
            );
            let notice = Notice::error(e.notice("Failed to add model"));
            render_panel(&state, panel, Some(notice), e.status()).await
        }
    }
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<ModelForm>,
) -> Response {
    let devices = state.queries.devices().await.unwrap_or_default();
    let action = format!("{BASE}/{id}");
    let input = match validate(&form) {
        Ok(input) => input,
        Err(errors) => {
            let panel = forms::model_form(&action, &form, &devices, &errors, "Update Model", BASE);
            return render_panel(&state, panel, None, StatusCode::UNPROCESSABLE_ENTITY).await;
        }
    };

    let update = ModelUpdate {
        model_id: id,
        device_id: Some(input.device_id),
        model_name: Some(input.model_name),
        is_active: None,
    };
    match state.queries.update_model(&update).await {
        Ok(_) => redirect_with_notice(BASE, &Notice::success("Model updated successfully"))
            .into_response(),
        Err(e) => {
            tracing::warn!(id, error = %e, "Failed to update model");
            let panel = forms::model_form(
                &action,
                &form,
                &devices,
                &ValidationErrors::new(),
                "Update Model",
                BASE,
            );
            let notice = Notice::error(e.notice("Failed to update model"));
            render_panel(&state, panel, Some(notice), e.status()).await
        }
    }
}

pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(target): Query<ToggleQuery>,
) -> Response {
    match state.queries.set_model_active(id, target.active).await {
        Ok(_) => {
            let message = if target.active {
                "Model activated"
            } else {
                "Model deactivated"
            };
            redirect_with_notice(BASE, &Notice::success(message)).into_response()
        }
        Err(e) => {
            tracing::warn!(id, error = %e, "Failed to toggle model");
            redirect_with_notice(BASE, &Notice::error(e.notice("Failed to update model")))
                .into_response()
        }
    }
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.queries.delete_model(id).await {
        Ok(_) => redirect_with_notice(BASE, &Notice::success("Model deleted successfully"))
            .into_response(),
        Err(e) => {
            tracing::warn!(id, error = %e, "Failed to delete model");
            let query = ListQuery {
                panel: Some("delete".to_string()),
                id: Some(id),
                ..ListQuery::default()
            };
            let notice = Notice::error(e.notice("Failed to delete model"));
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
    let models = match query.device {
        Some(device_id) => state.queries.models_for_device(device_id).await,
        None => state.queries.all_models().await,
    };
    let models = match models {
        Ok(models) => models,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load models");
            notice = Some(Notice::error(e.notice("Failed to load models")));
            Vec::new()
        }
    };
    let devices = state.queries.devices().await.unwrap_or_default();
    let device_names: HashMap<i64, &str> = devices
        .iter()
        .map(|d| (d.id, d.device_name.as_str()))
        .collect();

    let panel_html = panel_html.unwrap_or_else(|| match query.panel() {
        Panel::Add => {
            let form = ModelForm {
                device_id: query.device.map(|id| id.to_string()).unwrap_or_default(),
                ..ModelForm::default()
            };
            forms::model_form(BASE, &form, &devices, &ValidationErrors::new(), "Add Model", BASE)
        }
        Panel::Edit(id) => match models.iter().find(|m| m.id == id) {
            Some(model) => forms::model_form(
                &format!("{BASE}/{id}"),
                &ModelForm::from_model(model),
                &devices,
                &ValidationErrors::new(),
                "Update Model",
                BASE,
            ),
            None => {
                notice.get_or_insert_with(|| Notice::error("Model not found"));
                String::new()
            }
        },
        Panel::ConfirmDelete(id) => {
            let what = models
                .iter()
                .find(|m| m.id == id)
                .map_or_else(|| format!("model #{id}"), |m| format!("model {}", m.model_name));
            forms::confirm_delete(&what, &format!("{BASE}/{id}/delete"), BASE)
        }
        Panel::View(_) | Panel::None => String::new(),
    });

    let pager = query.pager(models.len(), state.config.default_page_size);
    let table = Table::new()
        .column("Model Name", |m: &Model| m.model_name.clone())
        .column("Device", |m: &Model| {
            device_names
                .get(&m.device_id)
                .map_or_else(|| format!("#{}", m.device_id), |name| (*name).to_string())
        })
        .column("Status", |m: &Model| active_label(m.is_active).to_string())
        .link("Edit", |m: &Model| query.panel_href(BASE, "edit", Some(m.id)))
        .button(
            |m: &Model| toggle_label(m.is_active).to_string(),
            |m: &Model| format!("{BASE}/{}/toggle?active={}", m.id, !m.is_active),
        )
        .link("Delete", |m: &Model| query.panel_href(BASE, "delete", Some(m.id)))
        .carry("device", query.device.map(|id| id.to_string()));

    let body = format!(
        r#"<p><a href="{add}">Add Model</a></p>{filter}{panel_html}{table}"#,
        add = query.panel_href(BASE, "add", None),
        filter = device_filter(&devices, query.device),
        table = table.render(pager.slice(&models), &pager, BASE),
    );
    page(status, TITLE, BASE, notice.as_ref(), &body)
}

fn device_filter(devices: &[Device], selected: Option<i64>) -> String {
    let mut options = String::from(r#"<option value="">All devices</option>"#);
    for device in devices {
        let sel = if Some(device.id) == selected { " selected" } else { "" };
        let _ = write!(
            options,
            r#"<option value="{}"{sel}>{}</option>"#,
            device.id,
            escape(&device.device_name)
        );
    }
    format!(
        r#"<form method="get" action="{BASE}" class="no-print"><label>Device <select name="device" onchange="this.form.submit()">{options}</select></label><noscript><button type="submit">Filter</button></noscript></form>"#
    )
}
