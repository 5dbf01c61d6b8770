pub mod customers;
pub mod dashboard;
pub mod devices;
pub mod entries;
pub mod health;
pub mod models;
pub mod payment_pending;
pub mod previews;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Deserializer};
use std::fmt::Write;
use std::str::FromStr;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::common::AppState;
use crate::pagination::Pager;
use crate::views::html::{self, Notice, NoticeLevel};

/// Which panel a page container shows next to its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    None,
    Add,
    Edit(i64),
    View(i64),
    ConfirmDelete(i64),
}

/// Query string shared by every list page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub panel: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub page: Option<usize>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub size: Option<usize>,
    pub notice: Option<String>,
    pub level: Option<String>,
    /// Device filter on the models page.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub device: Option<i64>,
}

/// Numeric query values from `<select>`s arrive as `""` when nothing is
/// chosen; blank and unparsable values read as absent.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok()))
}

impl ListQuery {
    /// Panel requested by `panel` (+ `id`). Panels that need an id fall back
    /// to `None` without one.
    #[must_use]
    pub fn panel(&self) -> Panel {
        match (self.panel.as_deref(), self.id) {
            (Some("add"), _) => Panel::Add,
            (Some("edit"), Some(id)) => Panel::Edit(id),
            (Some("view"), Some(id)) => Panel::View(id),
            (Some("delete"), Some(id)) => Panel::ConfirmDelete(id),
            _ => Panel::None,
        }
    }

    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        let message = self.notice.as_deref().filter(|m| !m.trim().is_empty())?;
        Some(Notice {
            level: NoticeLevel::parse(self.level.as_deref().unwrap_or_default()),
            message: message.to_string(),
        })
    }

    #[must_use]
    pub fn pager(&self, total: usize, default_size: usize) -> Pager {
        Pager::new(total, self.page, self.size, default_size)
    }

    /// Link to `base` opening `panel` for `id`, keeping the current page and
    /// device filter.
    #[must_use]
    pub fn panel_href(&self, base: &str, panel: &str, id: Option<i64>) -> String {
        let mut href = format!("{base}?panel={panel}");
        if let Some(id) = id {
            let _ = write!(href, "&id={id}");
        }
        if let Some(page) = self.page {
            let _ = write!(href, "&page={page}");
        }
        if let Some(size) = self.size {
            let _ = write!(href, "&size={size}");
        }
        if let Some(device) = self.device {
            let _ = write!(href, "&device={device}");
        }
        href
    }
}

/// Target state of an active-flag toggle.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ToggleQuery {
    pub active: bool,
}

/// 303 back to `path` carrying a one-shot notice.
#[must_use]
pub fn redirect_with_notice(path: &str, notice: &Notice) -> Redirect {
    Redirect::to(&format!(
        "{path}?notice={}&level={}",
        urlencoding::encode(&notice.message),
        notice.level.as_str()
    ))
}

/// Full HTML page with `status`.
#[must_use]
pub fn page(
    status: StatusCode,
    title: &str,
    active: &str,
    notice: Option<&Notice>,
    body: &str,
) -> Response {
    (status, Html(html::layout(title, active, notice, body))).into_response()
}

pub fn build_router(state: AppState) -> Router {
    let max_request_bytes = state.config.max_request_bytes;

    let pages = Router::new()
        .route("/", get(dashboard::home))
        .route("/dashboard", get(dashboard::show))
        .route("/customers", get(customers::list).post(customers::create))
        .route("/customers/{id}", post(customers::update))
        .route("/customers/{id}/toggle", post(customers::toggle))
        .route("/customers/{id}/delete", post(customers::delete))
        .route("/devices", get(devices::list).post(devices::create))
        .route("/devices/{id}", post(devices::update))
        .route("/devices/{id}/toggle", post(devices::toggle))
        .route("/devices/{id}/delete", post(devices::delete))
        .route("/models", get(models::list).post(models::create))
        .route("/models/{id}", post(models::update))
        .route("/models/{id}/toggle", post(models::toggle))
        .route("/models/{id}/delete", post(models::delete))
        .route("/entries", get(entries::list).post(entries::create))
        .route("/entries/{id}", post(entries::update))
        .route("/entries/{id}/print", get(entries::print))
        .route("/entries/{id}/delete", post(entries::delete))
        .route("/payment-pending", get(payment_pending::list))
        .route("/previews/{id}", get(previews::show));

    let health_routes = Router::new().route("/healthz", get(health::healthz));

    Router::new()
        .merge(pages)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(DefaultBodyLimit::max(max_request_bytes))
                .layer(RequestBodyLimitLayer::new(max_request_bytes)),
        )
        .with_state(state)
}
