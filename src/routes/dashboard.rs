//! Dashboard: this month's throughput and what customers still owe.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Datelike, Local, NaiveDate};

use crate::common::AppState;
use crate::views::Notice;
use crate::views::html::{escape, money};
use crate::routes::page;

pub async fn home() -> Response {
    Redirect::to("/dashboard").into_response()
}

/// `YYYY-MM` of `date`.
#[must_use]
pub fn year_month(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

pub async fn show(State(state): State<AppState>) -> Response {
    let today = Local::now().date_naive();
    let month = year_month(today);

    let (stats, customers, pending) = futures::join!(
        state.queries.entries_stats(&month),
        state.queries.customers(),
        state.queries.payment_pending(),
    );

    let mut failures = Vec::new();
    let stats = stats
        .map_err(|e| {
            tracing::warn!(error = %e, month = %month, "Failed to load entry statistics");
            failures.push("statistics");
        })
        .ok();
    let customers = customers
        .map_err(|e| {
            tracing::warn!(error = %e, "Failed to load customers");
            failures.push("customers");
        })
        .ok();
    let pending = pending
        .map_err(|e| {
            tracing::warn!(error = %e, "Failed to load payment pending");
            failures.push("payment pending");
        })
        .ok();

    let dash = "-".to_string();
    let card = |label: &str, value: String, href: &str| {
        format!(
            r#"<a class="card" href="{href}"><div>{}</div><strong>{}</strong></a>"#,
            escape(label),
            escape(&value)
        )
    };

    let outstanding = pending
        .as_ref()
        .map(|rows| rows.iter().map(|r| r.total_amount_to_be_received).sum::<f64>());

    let body = format!(
        r#"<p>{month_label}</p><div class="cards">{entries}{customers}{delivered}{returns}{outstanding}</div>"#,
        month_label = escape(&today.format("%B %Y").to_string()),
        entries = card(
            "Entries this month",
            stats.as_ref().map_or_else(|| dash.clone(), |s| s.total_entries.to_string()),
            "/entries"
        ),
        customers = card(
            "Customers",
            customers.as_ref().map_or_else(|| dash.clone(), |c| c.len().to_string()),
            "/customers"
        ),
        delivered = card(
            "Delivered this month",
            stats.as_ref().map_or_else(|| dash.clone(), |s| s.delivered_count.to_string()),
            "/entries"
        ),
        returns = card(
            "Returns this month",
            stats.as_ref().map_or_else(|| dash.clone(), |s| s.returns_count.to_string()),
            "/entries"
        ),
        outstanding = card(
            "Outstanding payments",
            outstanding.map_or_else(|| dash.clone(), money),
            "/payment-pending"
        ),
    );

    let notice = (!failures.is_empty())
        .then(|| Notice::error(format!("Failed to load {}", failures.join(", "))));
    page(StatusCode::OK, "Dashboard", "/dashboard", notice.as_ref(), &body)
}
