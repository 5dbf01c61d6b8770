use reqwest::{Client, Method, RequestBuilder, multipart};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::forms::uploads::Attachment;
use crate::shop::models::{
    ActiveToggle, CustomerInput, DeviceInput, EntryPayload, ModelInput, ModelUpdate,
};

/// Multipart part carrying the structured entry fields.
pub const ENTRY_JSON_PART: &str = "entry";

/// Everything needed to create or update one repair ticket.
#[derive(Debug, Clone)]
pub struct EntrySubmission {
    pub payload: EntryPayload,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryEncoding {
    Json,
    Multipart,
}

impl EntrySubmission {
    /// Multipart exactly when there is file data to carry.
    #[must_use]
    pub fn encoding(&self) -> EntryEncoding {
        if self.attachments.is_empty() {
            EntryEncoding::Json
        } else {
            EntryEncoding::Multipart
        }
    }
}

/// Thin wrapper over the shop's REST API.
///
/// Every call is a single attempt. Responses are normalized: an envelope with
/// `info.success == false` becomes [`AppError::Api`] whatever the HTTP status.
pub struct ShopClient {
    http_client: Client,
    base_url: String,
}

impl ShopClient {
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.shop_api_timeout_seconds))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.shop_api_base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client.request(method, self.url(path))
    }

    // == Generic verbs ========================================================

    /// # Errors
    ///
    /// Returns the normalized error for transport, HTTP or envelope failures.
    pub async fn get(&self, path: &str) -> AppResult<Value> {
        self.send(Method::GET, path, self.request(Method::GET, path))
            .await
    }

    /// # Errors
    ///
    /// Returns the normalized error for transport, HTTP or envelope failures.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AppResult<Value> {
        self.send(Method::POST, path, self.request(Method::POST, path).json(body))
            .await
    }

    /// # Errors
    ///
    /// Returns the normalized error for transport, HTTP or envelope failures.
    pub async fn delete(&self, path: &str) -> AppResult<Value> {
        self.send(Method::DELETE, path, self.request(Method::DELETE, path))
            .await
    }

    async fn send(&self, method: Method, path: &str, request: RequestBuilder) -> AppResult<Value> {
        tracing::debug!(%method, path, "shop_request");

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let body = if text.trim().is_empty() {
            Some(Value::Null)
        } else {
            serde_json::from_str::<Value>(&text).ok()
        };

        if !status.is_success() {
            if let Some(message) = body.as_ref().and_then(error_message) {
                tracing::warn!(%method, path, %status, message = %message, "shop_request_rejected");
                return Err(AppError::Api { message });
            }
            tracing::warn!(%method, path, %status, "shop_request_failed");
            return Err(AppError::Http { status, body: text });
        }

        match body {
            Some(value) => check_envelope(value),
            None => {
                tracing::error!(
                    %method,
                    path,
                    body_preview = %text.chars().take(500).collect::<String>(),
                    "Failed to parse shop API response"
                );
                Err(AppError::Internal(format!(
                    "Unreadable response from {path}"
                )))
            }
        }
    }

    // == Devices ==============================================================

    /// Raw device collection (`data.devices`), empty when absent.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn devices(&self) -> AppResult<Value> {
        let res = self.get("get-devices").await?;
        Ok(collection(&res, "devices"))
    }

    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn add_device(&self, device: &DeviceInput) -> AppResult<Value> {
        self.post("add-device", device).await
    }

    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn update_device(&self, id: i64, device: &DeviceInput) -> AppResult<Value> {
        self.post(&format!("update-device/{id}"), device).await
    }

    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn set_device_active(&self, id: i64, is_active: bool) -> AppResult<Value> {
        self.post(&format!("update-device/{id}"), &ActiveToggle { is_active })
            .await
    }

    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn delete_device(&self, id: i64) -> AppResult<Value> {
        self.delete(&format!("delete-device/{id}")).await
    }

    // == Customers ============================================================

    /// Raw customer collection (`data.customers`), empty when absent.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn customers(&self) -> AppResult<Value> {
        let res = self.get("get-customers").await?;
        Ok(collection(&res, "customers"))
    }

    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn add_customer(&self, customer: &CustomerInput) -> AppResult<Value> {
        self.post("add-customer", customer).await
    }

    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn update_customer(&self, id: i64, customer: &CustomerInput) -> AppResult<Value> {
        self.post(&format!("update-customer/{id}"), customer).await
    }

    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn set_customer_active(&self, id: i64, is_active: bool) -> AppResult<Value> {
        self.post(&format!("update-customer/{id}"), &ActiveToggle { is_active })
            .await
    }

    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn delete_customer(&self, id: i64) -> AppResult<Value> {
        self.delete(&format!("delete-customer/{id}")).await
    }

    // == Models ===============================================================

    /// Raw model collection for one device (`data.models`).
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn models_for_device(&self, device_id: i64) -> AppResult<Value> {
        let res = self.get(&format!("get-model?deviceId={device_id}")).await?;
        Ok(collection(&res, "models"))
    }

    /// Raw model collection across all devices (`data.models`).
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn all_models(&self) -> AppResult<Value> {
        let res = self.get("get-all-models").await?;
        Ok(collection(&res, "models"))
    }

    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn add_model(&self, model: &ModelInput) -> AppResult<Value> {
        self.post("add-model", model).await
    }

    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn update_model(&self, update: &ModelUpdate) -> AppResult<Value> {
        self.post("update-model", update).await
    }

    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn delete_model(&self, id: i64) -> AppResult<Value> {
        self.delete(&format!("delete-model/{id}")).await
    }

    // == Entries ==============================================================

    /// Raw entry collection (`data.entries`), empty when absent.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn entries(&self) -> AppResult<Value> {
        let res = self.get("get-entries").await?;
        Ok(collection(&res, "entries"))
    }

    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn add_entry(&self, submission: &EntrySubmission) -> AppResult<Value> {
        self.send_entry("add-entry", submission).await
    }

    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn update_entry(&self, id: i64, submission: &EntrySubmission) -> AppResult<Value> {
        self.send_entry(&format!("update-entry/{id}"), submission)
            .await
    }

    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn delete_entry(&self, id: i64) -> AppResult<Value> {
        self.delete(&format!("delete-entry/{id}")).await
    }

    async fn send_entry(&self, path: &str, submission: &EntrySubmission) -> AppResult<Value> {
        match submission.encoding() {
            EntryEncoding::Json => self.post(path, &submission.payload).await,
            EntryEncoding::Multipart => {
                let form = entry_form(submission)?;
                tracing::debug!(
                    path,
                    attachments = submission.attachments.len(),
                    "Submitting entry as multipart"
                );
                self.send(
                    Method::POST,
                    path,
                    self.request(Method::POST, path).multipart(form),
                )
                .await
            }
        }
    }

    // == Aggregates ===========================================================

    /// Next server-issued internal reference.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn next_entry_id(&self) -> AppResult<Option<i64>> {
        let res = self.get("get-next-entry-id").await?;
        Ok(next_entry_id(&res))
    }

    /// Raw statistics object for `year_month` (`YYYY-MM`).
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn entries_stats(&self, year_month: &str) -> AppResult<Value> {
        let res = self
            .get(&format!(
                "entries-stats?yearMonth={year_month}&deliveredStatus=Delivered&returnsStatus=Return"
            ))
            .await?;
        Ok(stats_object(res))
    }

    /// Raw payment-pending rollup.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn payment_pending(&self) -> AppResult<Value> {
        let res = self.get("get-payment-pending").await?;
        Ok(payment_pending_collection(res))
    }
}

fn entry_form(submission: &EntrySubmission) -> AppResult<multipart::Form> {
    let json = serde_json::to_string(&submission.payload)
        .map_err(|e| AppError::Internal(format!("Failed to encode entry: {e}")))?;

    let mut form = multipart::Form::new().part(
        ENTRY_JSON_PART,
        multipart::Part::text(json).mime_str("application/json")?,
    );

    for attachment in &submission.attachments {
        let part = multipart::Part::bytes(attachment.bytes.to_vec())
            .file_name(attachment.file_name.clone())
            .mime_str(&attachment.content_type)?;
        form = form.part(attachment.slot.part_name(), part);
    }

    Ok(form)
}

// == Envelope handling ========================================================

/// Reject envelopes whose `info.success` flag is `false`.
///
/// # Errors
///
/// Returns `AppError::Api` carrying `info.message` (or a generic message).
pub fn check_envelope(value: Value) -> AppResult<Value> {
    let info = value.get("info");
    if info.and_then(|i| i.get("success")).and_then(Value::as_bool) == Some(false) {
        let message = info
            .and_then(|i| i.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or("An error occurred")
            .to_string();
        return Err(AppError::Api { message });
    }
    Ok(value)
}

/// Server-provided message from an error body, if it has one.
fn error_message(value: &Value) -> Option<String> {
    value
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| {
            value
                .get("info")
                .and_then(|i| i.get("message"))
                .and_then(Value::as_str)
        })
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

/// `data.<key>` when it is an array, otherwise an empty array.
#[must_use]
pub fn collection(value: &Value, key: &str) -> Value {
    match value.get("data").and_then(|d| d.get(key)) {
        Some(items @ Value::Array(_)) => items.clone(),
        _ => Value::Array(Vec::new()),
    }
}

/// Interpret the next-entry-id response: a bare number, a numeric string, or
/// the same wrapped under `data` / `nextEntryId`.
#[must_use]
pub fn next_entry_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(map) => ["nextEntryId", "data", "id"]
            .iter()
            .find_map(|k| map.get(*k))
            .and_then(next_entry_id),
        _ => None,
    }
}

/// Statistics come either bare (`{ totalEntries, ... }`) or under `data`.
fn stats_object(value: Value) -> Value {
    if value.get("totalEntries").is_some() {
        return value;
    }
    match value.get("data") {
        Some(data @ Value::Object(_)) => data.clone(),
        _ => Value::Object(serde_json::Map::new()),
    }
}

/// Payment-pending rows come as a bare array, a `data` array, or
/// `data.paymentPending`.
fn payment_pending_collection(value: Value) -> Value {
    if value.is_array() {
        return value;
    }
    match value.get("data") {
        Some(data @ Value::Array(_)) => data.clone(),
        Some(data) => match data.get("paymentPending") {
            Some(items @ Value::Array(_)) => items.clone(),
            _ => Value::Array(Vec::new()),
        },
        None => Value::Array(Vec::new()),
    }
}

/// Id of the record a write created, when the backend echoes it back as
/// `data.<key>.id` or `data.id`.
#[must_use]
pub fn created_id(value: &Value, key: &str) -> Option<i64> {
    let data = value.get("data")?;
    data.get(key)
        .and_then(|record| record.get("id"))
        .or_else(|| data.get("id"))
        .and_then(|id| match id {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
}
