//! Outstanding amounts per customer, each with its contributing entries.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use std::fmt::Write;

use crate::common::AppState;
use crate::routes::{ListQuery, page};
use crate::shop::models::{PaymentPending, parse_wire_date};
use crate::views::html::{escape, money};
use crate::views::{Notice, Table};

const BASE: &str = "/payment-pending";

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let mut notice = query.notice();
    let rows = match state.queries.payment_pending().await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load payment pending");
            notice = Some(Notice::error(e.notice("Failed to load payment pending")));
            Vec::new()
        }
    };

    let grand_total: f64 = rows.iter().map(|r| r.total_amount_to_be_received).sum();
    let prefix = state.config.entry_id_prefix.as_str();
    let pager = query.pager(rows.len(), state.config.default_page_size);

    let table = Table::new()
        .column("Customer", |r: &PaymentPending| r.customer_name.clone())
        .column("Outstanding", |r: &PaymentPending| {
            money(r.total_amount_to_be_received)
        })
        .html_column("Entries", |r: &PaymentPending| pending_entries(r, prefix));

    let body = format!(
        r#"<p>Total outstanding: <strong>{}</strong></p>{}"#,
        money(grand_total),
        table.render(pager.slice(&rows), &pager, BASE)
    );
    page(StatusCode::OK, "Payment Pending", BASE, notice.as_ref(), &body)
}

fn pending_entries(row: &PaymentPending, prefix: &str) -> String {
    let mut items = String::new();
    for entry in &row.pending_entries {
        let date = parse_wire_date(&entry.date)
            .map_or_else(|| entry.date.clone(), |d| d.format("%d %b %Y").to_string());
        let _ = write!(
            items,
            r#"<li><a href="/entries?panel=view&amp;id={id}">{prefix}{id}</a> {date} {status} {amount}</li>"#,
            id = entry.entry_id,
            prefix = escape(prefix),
            date = escape(&date),
            status = escape(&entry.status),
            amount = money(entry.estimate),
        );
    }
    format!(
        "<details><summary>{} entr{}</summary><ul>{items}</ul></details>",
        row.pending_entries.len(),
        if row.pending_entries.len() == 1 { "y" } else { "ies" }
    )
}
