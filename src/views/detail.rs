//! Read-only renderings of one mobile entry: the view panel and the printable
//! ticket.

use std::fmt::Write;

use crate::shop::models::{EntryType, MobileEntry};
use crate::views::html::escape;

fn rows(entry: &MobileEntry) -> Vec<(&'static str, String)> {
    let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    let mut rows = vec![
        ("Internal Reference", entry.internal_ref.clone()),
        ("External Reference", opt(&entry.external_ref)),
        (
            "Date",
            entry
                .date
                .map(|d| d.format("%d %b %Y").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        ("Entry Type", entry.entry_type.to_string()),
        ("Customer", entry.customer_name.clone()),
        ("Phone", entry.customer_phone.clone()),
        ("Device", entry.device_name.clone()),
        ("Model", entry.model_name.clone()),
    ];
    match entry.entry_type {
        EntryType::Service => {
            rows.push(("IMEI", opt(&entry.imei)));
            rows.push(("Issue", opt(&entry.issue)));
        }
        EntryType::Sale => {
            rows.push(("Part Number or Name", opt(&entry.part_number_or_name)));
            rows.push(("Price", opt(&entry.price)));
        }
    }
    rows.extend([
        ("Estimate", entry.estimate.clone()),
        ("Product Status", entry.product_status.clone()),
        ("Payment Status", entry.payment_status.clone()),
        ("Payment Mode", opt(&entry.payment_mode)),
    ]);
    rows
}

fn definition_table(rows: &[(&'static str, String)]) -> String {
    let mut out = String::from("<table>");
    for (label, value) in rows {
        let _ = write!(out, "<tr><th>{label}</th><td>{}</td></tr>", escape(value));
    }
    out.push_str("</table>");
    out
}

/// View panel with links to the stored images. The passcode is never shown.
#[must_use]
pub fn entry_view(entry: &MobileEntry, prefix: &str, back_href: &str) -> String {
    let mut images = String::new();
    if let Some(front) = &entry.front_image {
        let _ = write!(
            images,
            r#"<p>Front image: <a href="{u}" target="_blank">{u}</a></p>"#,
            u = escape(front)
        );
    }
    for (i, url) in entry.additional_images.iter().enumerate() {
        let _ = write!(
            images,
            r#"<p>Image {}: <a href="{u}" target="_blank">{u}</a></p>"#,
            i + 1,
            u = escape(url)
        );
    }

    format!(
        r#"<section class="panel"><h2>{id}</h2>{table}{images}
<p><a href="/entries/{raw_id}/print" target="_blank">Print ticket</a> | <a href="{back}">Close</a></p></section>"#,
        id = escape(&entry.display_id(prefix)),
        table = definition_table(&rows(entry)),
        raw_id = entry.id,
        back = escape(back_href),
    )
}

/// Printable intake ticket.
#[must_use]
pub fn entry_ticket(entry: &MobileEntry, prefix: &str) -> String {
    format!(
        r#"<h2>Repair Ticket {id}</h2>{table}
<p style="margin-top:24px">Customer signature: ______________________</p>"#,
        id = escape(&entry.display_id(prefix)),
        table = definition_table(&rows(entry)),
    )
}
