//! Customers page: table, add/edit panel, active toggle, delete confirmation.

use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::common::AppState;
use crate::error::AppError;
use crate::shop::models::Customer;
use crate::routes::{ListQuery, Panel, ToggleQuery, page, redirect_with_notice};
use crate::validation::{CustomerForm, ValidationErrors, validate};
use crate::views::{Notice, Table, forms};

const BASE: &str = "/customers";
const TITLE: &str = "Customers";

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    render(&state, &query, None, query.notice(), StatusCode::OK).await
}

pub async fn create(State(state): State<AppState>, Form(form): Form<CustomerForm>) -> Response {
    let input = match validate(&form) {
        Ok(input) => input,
        Err(errors) => {
            let panel = forms::customer_form(BASE, &form, &errors, "Add Customer", BASE);
            return render_panel(&state, panel, None, StatusCode::UNPROCESSABLE_ENTITY).await;
        }
    };

    match state.queries.add_customer(&input).await {
        Ok(_) => {
            tracing::info!(name = %input.name, "Customer added");
            redirect_with_notice(BASE, &Notice::success("Customer added successfully")).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to add customer");
            let panel =
                forms::customer_form(BASE, &form, &ValidationErrors::new(), "Add Customer", BASE);
            let notice = Notice::error(e.notice("Failed to add customer"));
            render_panel(&state, panel, Some(notice), e.status()).await
        }
    }
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<CustomerForm>,
) -> Response {
    let action = format!("{BASE}/{id}");
    let mut input = match validate(&form) {
        Ok(input) => input,
        Err(errors) => {
            let panel = forms::customer_form(&action, &form, &errors, "Update Customer", BASE);
            return render_panel(&state, panel, None, StatusCode::UNPROCESSABLE_ENTITY).await;
        }
    };

    // Keep the stored active flag.
    let current = state.queries.customers().await.and_then(|customers| {
        customers
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Customer {id} not found")))
    });
    match current {
        Ok(current) => input.is_active = current.is_active,
        Err(e) => {
            tracing::warn!(id, error = %e, "Failed to read current customer");
            let panel = forms::customer_form(
                &action,
                &form,
                &ValidationErrors::new(),
                "Update Customer",
                BASE,
            );
            let notice = Notice::error(e.notice("Failed to update customer"));
            return render_panel(&state, panel, Some(notice), e.status()).await;
        }
    }

    match state.queries.update_customer(id, &input).await {
        Ok(_) => redirect_with_notice(BASE, &Notice::success("Customer updated successfully"))
            .into_response(),
        Err(e) => {
            tracing::warn!(id, error = %e, "Failed to update customer");
            let panel = forms::customer_form(
                &action,
                &form,
                &ValidationErrors::new(),
                "Update Customer",
                BASE,
            );
            let notice = Notice::error(e.notice("Failed to update customer"));
            render_panel(&state, panel, Some(notice), e.status()).await
        }
    }
}

pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(target): Query<ToggleQuery>,
) -> Response {
    match state.queries.set_customer_active(id, target.active).await {
        Ok(_) => {
            let message = if target.active {
                "Customer activated"
            } else {
                "Customer deactivated"
            };
            redirect_with_notice(BASE, &Notice::success(message)).into_response()
        }
        Err(e) => {
            tracing::warn!(id, error = %e, "Failed to toggle customer");
            redirect_with_notice(BASE, &Notice::error(e.notice("Failed to update customer")))
                .into_response()
        }
    }
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.queries.delete_customer(id).await {
        Ok(_) => redirect_with_notice(BASE, &Notice::success("Customer deleted successfully"))
            .into_response(),
        Err(e) => {
            tracing::warn!(id, error = %e, "Failed to delete customer");
            let query = ListQuery {
                panel: Some("delete".to_string()),
                id: Some(id),
                ..ListQuery::default()
            };
            let notice = Notice::error(e.notice("Failed to delete customer"));
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

/// Table plus the panel: `panel_html` when given, otherwise the one the query
/// asks for.
async fn render(
    state: &AppState,
    query: &ListQuery,
    panel_html: Option<String>,
    mut notice: Option<Notice>,
    status: StatusCode,
) -> Response {
    let customers = match state.queries.customers().await {
        Ok(customers) => customers,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load customers");
            notice = Some(Notice::error(e.notice("Failed to load customers")));
            Vec::new()
        }
    };

    let panel_html = match panel_html {
        Some(html) => html,
        None => match query.panel() {
            Panel::Add => forms::customer_form(
                BASE,
                &CustomerForm::default(),
                &ValidationErrors::new(),
                "Add Customer",
                BASE,
            ),
            Panel::Edit(id) => match customers.iter().find(|c| c.id == id) {
                Some(customer) => forms::customer_form(
                    &format!("{BASE}/{id}"),
                    &CustomerForm::from_customer(customer),
                    &ValidationErrors::new(),
                    "Update Customer",
                    BASE,
                ),
                None => {
                    notice.get_or_insert_with(|| Notice::error("Customer not found"));
                    String::new()
                }
            },
            Panel::ConfirmDelete(id) => match customers.iter().find(|c| c.id == id) {
                Some(customer) => forms::confirm_delete(
                    &format!("customer {}", customer.name),
                    &format!("{BASE}/{id}/delete"),
                    BASE,
                ),
                None => forms::confirm_delete(
                    &format!("customer #{id}"),
                    &format!("{BASE}/{id}/delete"),
                    BASE,
                ),
            },
            Panel::View(_) | Panel::None => String::new(),
        },
    };

    let pager = query.pager(customers.len(), state.config.default_page_size);
    let table = Table::new()
        .column("Name", |c: &Customer| c.name.clone())
        .column("Phone", |c: &Customer| c.phone.clone())
        .column("Email", |c: &Customer| c.email.clone().unwrap_or_default())
        .column("Status", |c: &Customer| active_label(c.is_active).to_string())
        .link("Edit", |c: &Customer| query.panel_href(BASE, "edit", Some(c.id)))
        .button(
            |c: &Customer| toggle_label(c.is_active).to_string(),
            |c: &Customer| format!("{BASE}/{}/toggle?active={}", c.id, !c.is_active),
        )
        .link("Delete", |c: &Customer| {
            query.panel_href(BASE, "delete", Some(c.id))
        });

    let body = format!(
        r#"<p><a href="{add}">Add Customer</a></p>{panel_html}{table}"#,
        add = query.panel_href(BASE, "add", None),
        table = table.render(pager.slice(&customers), &pager, BASE),
    );
    page(status, TITLE, BASE, notice.as_ref(), &body)
}

pub(crate) fn active_label(is_active: bool) -> &'static str {
    if is_active { "Active" } else { "Inactive" }
}

pub(crate) fn toggle_label(is_active: bool) -> &'static str {
    if is_active { "Deactivate" } else { "Activate" }
}
