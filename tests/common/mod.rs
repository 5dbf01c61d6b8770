//! In-process stand-in for the shop backend.
//!
//! Serves the endpoints the console talks to on an ephemeral port and counts
//! the calls tests care about.

#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use repair_console::common::AppState;
use repair_console::config::Config;

#[derive(Default)]
pub struct Calls {
    pub get_customers: AtomicUsize,
    pub add_customer: AtomicUsize,
    pub get_entries: AtomicUsize,
    /// Content type of every `add-entry` request, in order.
    pub entry_content_types: Mutex<Vec<String>>,
    /// Path and JSON body of every `update-*` request, in order.
    pub updates: Mutex<Vec<(String, Value)>>,
}

#[derive(Clone)]
struct Backend {
    calls: Arc<Calls>,
    customers: Arc<Mutex<Vec<Value>>>,
    entries: Arc<Vec<Value>>,
}

pub struct MockShop {
    pub base_url: String,
    pub calls: Arc<Calls>,
}

impl MockShop {
    /// Backend with no customers and no entries.
    pub async fn start() -> Self {
        Self::with_data(Vec::new(), Vec::new()).await
    }

    pub async fn with_data(customers: Vec<Value>, entries: Vec<Value>) -> Self {
        let calls = Arc::new(Calls::default());
        let backend = Backend {
            calls: calls.clone(),
            customers: Arc::new(Mutex::new(customers)),
            entries: Arc::new(entries),
        };

        let app = Router::new()
            .route("/get-customers", get(get_customers))
            .route("/add-customer", post(add_customer))
            .route("/delete-customer/{id}", delete(delete_customer))
            .route("/get-devices", get(get_devices))
            .route("/add-device", post(add_device))
            .route("/update-customer/{id}", post(update_customer))
            .route("/update-device/{id}", post(update_device))
            .route("/get-all-models", get(get_models))
            .route("/get-model", get(get_models))
            .route("/get-entries", get(get_entries))
            .route("/add-entry", post(add_entry))
            .route("/get-next-entry-id", get(next_entry_id))
            .route("/get-payment-pending", get(payment_pending))
            .route("/entries-stats", get(entries_stats))
            .with_state(backend);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock shop");
        let addr = listener.local_addr().expect("mock shop address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock shop server");
        });

        Self {
            base_url: format!("http://{addr}"),
            calls,
        }
    }

    pub fn config(&self) -> Config {
        Config::with_base_url(&self.base_url)
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.config()).expect("app state")
    }

    pub fn get_customers_calls(&self) -> usize {
        self.calls.get_customers.load(Ordering::SeqCst)
    }

    pub fn add_customer_calls(&self) -> usize {
        self.calls.add_customer.load(Ordering::SeqCst)
    }

    pub fn get_entries_calls(&self) -> usize {
        self.calls.get_entries.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> Vec<(String, Value)> {
        self.calls.updates.lock().expect("updates lock").clone()
    }

    pub fn entry_content_types(&self) -> Vec<String> {
        self.calls
            .entry_content_types
            .lock()
            .expect("content types lock")
            .clone()
    }
}

pub fn customer(id: i64, name: &str, phone: &str) -> Value {
    json!({ "id": id, "name": name, "phone": phone, "email": "", "isActive": true })
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({ "info": { "success": true, "message": "OK" }, "data": data }))
}

async fn get_customers(State(backend): State<Backend>) -> Json<Value> {
    backend.calls.get_customers.fetch_add(1, Ordering::SeqCst);
    let customers = backend.customers.lock().expect("customers lock").clone();
    ok(json!({ "customers": customers }))
}

async fn add_customer(State(backend): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    backend.calls.add_customer.fetch_add(1, Ordering::SeqCst);
    let mut customers = backend.customers.lock().expect("customers lock");
    let id = i64::try_from(customers.len()).unwrap_or_default() + 1;
    let mut record = body;
    record["id"] = json!(id);
    customers.push(record.clone());
    ok(json!({ "customer": record }))
}

async fn delete_customer(Path(_id): Path<i64>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CONFLICT,
        Json(json!({ "message": "Customer has open entries" })),
    )
}

async fn get_devices() -> Json<Value> {
    ok(json!({ "devices": [
        { "id": 1, "deviceName": "Phone", "isActive": true },
        { "id": 2, "deviceName": "Tablet", "isActive": false }
    ] }))
}

async fn add_device() -> Json<Value> {
    Json(json!({ "info": { "success": false, "message": "Device already exists" } }))
}

async fn update_customer(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    record_update(&backend, format!("update-customer/{id}"), body)
}

async fn update_device(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    record_update(&backend, format!("update-device/{id}"), body)
}

fn record_update(backend: &Backend, path: String, body: Value) -> Json<Value> {
    backend
        .calls
        .updates
        .lock()
        .expect("updates lock")
        .push((path, body));
    ok(json!({}))
}

/// Models of two devices. `get-model` ignores its `deviceId` filter.
async fn get_models() -> Json<Value> {
    ok(json!({ "models": [
        { "id": 5, "deviceId": 1, "modelName": "Galaxy S21", "isActive": true },
        { "id": 9, "deviceId": 2, "modelName": "Tab S8", "isActive": true }
    ] }))
}

async fn get_entries(State(backend): State<Backend>) -> Json<Value> {
    backend.calls.get_entries.fetch_add(1, Ordering::SeqCst);
    ok(json!({ "entries": backend.entries.as_slice() }))
}

async fn add_entry(
    State(backend): State<Backend>,
    headers: HeaderMap,
    _body: Bytes,
) -> Json<Value> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    backend
        .calls
        .entry_content_types
        .lock()
        .expect("content types lock")
        .push(content_type);
    ok(json!({ "entry": { "id": 77 } }))
}

async fn next_entry_id() -> Json<Value> {
    Json(json!({ "data": 1042 }))
}

async fn payment_pending() -> Json<Value> {
    ok(json!([{
        "customerId": 1,
        "customerName": "Ravi",
        "totalAmountToBeReceived": "1500",
        "pendingEntries": [
            { "entryId": 5, "estimate": 1000, "date": "2025-01-15", "status": "Ready" },
            { "entryId": 6, "estimate": "500", "date": "2025-01-20", "status": "Received" }
        ]
    }]))
}

async fn entries_stats() -> Json<Value> {
    Json(json!({ "totalEntries": 12, "deliveredCount": 7, "returnsCount": 1 }))
}
