//! Page chrome and small HTML helpers.

use axum::http::StatusCode;

const STYLE: &str = r#"
body{font-family:system-ui,sans-serif;margin:0;color:#1f2933;background:#f5f7fa}
header{background:#1f2933;color:#fff;padding:10px 20px;display:flex;gap:18px;align-items:center}
header a{color:#cbd2d9;text-decoration:none}header a.active{color:#fff;font-weight:600}
main{padding:20px;max-width:1200px;margin:0 auto}
table{border-collapse:collapse;width:100%;background:#fff}
th,td{border-bottom:1px solid #e4e7eb;padding:6px 8px;text-align:left;font-size:14px}
.notice{padding:8px 12px;margin-bottom:12px;border-radius:4px}
.notice.success{background:#e3f9e5;color:#05400a}.notice.error{background:#ffe3e3;color:#610404}
.panel{background:#fff;border:1px solid #e4e7eb;padding:14px;margin-bottom:16px}
.field{margin-bottom:10px}.field label{display:block;font-size:13px;margin-bottom:2px}
.field-error{color:#cf1124;font-size:12px}
.pager{display:flex;gap:10px;align-items:center;margin-top:10px}
.disabled{color:#9aa5b1;pointer-events:none}
.cards{display:flex;gap:14px;flex-wrap:wrap}.card{background:#fff;padding:14px;border:1px solid #e4e7eb;min-width:180px}
img.preview{max-width:120px;max-height:120px;margin:4px;border:1px solid #e4e7eb}
.default-action{position:absolute;left:-10000px;width:1px;height:1px;overflow:hidden}
@media print{header,.no-print{display:none}}
"#;

const NAV: &[(&str, &str)] = &[
    ("/dashboard", "Dashboard"),
    ("/entries", "Mobile Entries"),
    ("/customers", "Customers"),
    ("/devices", "Devices"),
    ("/models", "Models"),
    ("/payment-pending", "Payment Pending"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

impl NoticeLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("error") {
            Self::Error
        } else {
            Self::Success
        }
    }
}

/// One-shot message shown above a page's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        format!(
            r#"<div class="notice {}" role="status">{}</div>"#,
            self.level.as_str(),
            escape(&self.message)
        )
    }
}

/// Escape text for element content and quoted attribute values.
#[must_use]
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full page with navigation. `active` is the nav path to highlight.
#[must_use]
pub fn layout(title: &str, active: &str, notice: Option<&Notice>, body: &str) -> String {
    let nav: String = NAV
        .iter()
        .map(|(href, label)| {
            let class = if *href == active { r#" class="active""# } else { "" };
            format!(r#"<a href="{href}"{class}>{label}</a>"#)
        })
        .collect();
    let notice = notice.map(Notice::render).unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} | Repair Console</title><style>{STYLE}</style></head>
<body>
<header><strong>Repair Console</strong>{nav}</header>
<main>
<h1>{title}</h1>
{notice}{body}
</main>
</body>
</html>"#,
        title = escape(title),
    )
}

/// Bare page for errors that escaped a page container.
#[must_use]
pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = status.canonical_reason().unwrap_or("Error");
    layout(
        title,
        "",
        Some(&Notice::error(message)),
        r#"<p><a href="/dashboard">Back to dashboard</a></p>"#,
    )
}

/// Standalone page without navigation, for printing.
#[must_use]
pub fn print_page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title}</title><style>{STYLE}</style></head>
<body onload="window.print()"><main>{body}</main></body>
</html>"#,
        title = escape(title),
    )
}

/// Format a money amount with two decimals.
#[must_use]
pub fn money(amount: f64) -> String {
    format!("{amount:.2}")
}
