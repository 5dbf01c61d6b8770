//! Page-level tests: the router is driven in-process against the mock shop.
//!
//! Run with: cargo test --test console_test

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use common::{MockShop, customer};
use repair_console::routes::build_router;

const BOUNDARY: &str = "console-test-boundary";

fn app(mock: &MockShop) -> Router {
    build_router(mock.state())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    send(app, Request::get(uri).body(Body::empty()).expect("request")).await
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn multipart_post(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

/// Multipart post whose `frontImage` part carries `bytes` as `content_type`.
fn multipart_with_front(
    uri: &str,
    fields: &[(&str, &str)],
    content_type: &str,
    bytes: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"frontImage\"; filename=\"front.jpg\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

/// A complete service entry for device 1 using `model`.
fn service_entry(model: &str) -> Vec<(&str, &str)> {
    vec![
        ("entryType", "Service"),
        ("date", "2025-01-15"),
        ("internalRef", "1042"),
        ("customer", "1"),
        ("device", "1"),
        ("model", model),
        ("issue", "No display"),
        ("productStatus", "Received"),
        ("paymentStatus", "Not received"),
        ("action", "submit"),
    ]
}

#[tokio::test]
async fn healthz_is_ok() {
    let mock = MockShop::start().await;
    let (status, _) = get(app(&mock), "/healthz").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn root_redirects_to_dashboard() {
    let mock = MockShop::start().await;
    let response = app(&mock)
        .oneshot(Request::get("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/dashboard")
    );
}

#[tokio::test]
async fn empty_table_shows_placeholder_row() {
    let mock = MockShop::start().await;
    let (status, body) = get(app(&mock), "/customers").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No records found."));
}

#[tokio::test]
async fn customer_rows_are_listed() {
    let mock = MockShop::with_data(
        vec![customer(1, "Ravi <VIP>", "9000000001")],
        Vec::new(),
    )
    .await;
    let (status, body) = get(app(&mock), "/customers").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Ravi &lt;VIP&gt;"));
    assert!(body.contains("9000000001"));
    assert!(!body.contains("No records found."));
}

#[tokio::test]
async fn invalid_phone_is_reported_inline_without_calling_backend() {
    let mock = MockShop::start().await;
    let (status, body) = send(
        app(&mock),
        form_post("/customers", "name=Asha&phone=12345&email="),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Phone number must be exactly 10 digits"));
    assert!(body.contains(r#"value="Asha""#));
    assert_eq!(mock.add_customer_calls(), 0);
}

#[tokio::test]
async fn valid_customer_is_added_and_redirects_with_notice() {
    let mock = MockShop::start().await;
    let response = app(&mock)
        .oneshot(form_post(
            "/customers",
            "name=Asha&phone=9876543210&email=asha%40example.com",
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(location.starts_with("/customers?notice=Customer%20added%20successfully"));
    assert!(location.ends_with("level=success"));
    assert_eq!(mock.add_customer_calls(), 1);
}

#[tokio::test]
async fn notice_from_query_is_rendered() {
    let mock = MockShop::start().await;
    let (_, body) = get(
        app(&mock),
        "/customers?notice=Customer%20added%20successfully&level=success",
    )
    .await;
    assert!(body.contains("Customer added successfully"));
}

#[tokio::test]
async fn delete_asks_for_confirmation_first() {
    let mock = MockShop::with_data(vec![customer(1, "Ravi", "9000000001")], Vec::new()).await;
    let (status, body) = get(app(&mock), "/customers?panel=delete&id=1").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"action="/customers/1/delete""#));
}

#[tokio::test]
async fn failed_delete_shows_backend_message() {
    let mock = MockShop::with_data(vec![customer(1, "Ravi", "9000000001")], Vec::new()).await;
    let (status, body) = send(
        app(&mock),
        Request::post("/customers/1/delete")
            .body(Body::empty())
            .expect("request"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("Customer has open entries"));
}

#[tokio::test]
async fn new_entry_form_carries_next_reference() {
    let mock = MockShop::start().await;
    let (status, body) = get(app(&mock), "/entries?panel=add").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"name="internalRef" type="text" value="1042" readonly"#));
    assert!(body.contains(r#"enctype="multipart/form-data""#));
}

#[tokio::test]
async fn listed_entry_shows_prefixed_id() {
    let entry = json!({
        "entry": {
            "id": 5,
            "internalRef": "1042",
            "date": "2025-01-15",
            "entryType": "Service",
            "estimate": 1500,
            "productStatus": "Received",
            "paymentStatus": "Not received"
        },
        "customer": { "id": 1, "name": "Ravi", "phone": "9000000001" },
        "device": { "id": 1, "deviceName": "Phone" }
    });
    let mock = MockShop::with_data(Vec::new(), vec![entry]).await;
    let (status, body) = get(app(&mock), "/entries").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ME-5"));
    assert!(body.contains("Ravi"));
    assert!(body.contains("/entries/5/print"));
}

#[tokio::test]
async fn printing_unknown_entry_is_not_found() {
    let mock = MockShop::start().await;
    let (status, _) = get(app(&mock), "/entries/99/print").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn nested_customer_errors_keep_the_entry_draft() {
    let mock = MockShop::start().await;
    let (status, body) = send(
        app(&mock),
        multipart_post(
            "/entries",
            &[
                ("entryType", "Service"),
                ("issue", "No display"),
                ("newCustomerName", "Asha"),
                ("newCustomerPhone", "123"),
                ("action", "add_customer"),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Phone number must be exactly 10 digits"));
    assert!(body.contains(r#"value="No display""#));
    assert_eq!(mock.add_customer_calls(), 0);
}

#[tokio::test]
async fn submitting_incomplete_entry_lists_field_errors() {
    let mock = MockShop::start().await;
    let (status, body) = send(
        app(&mock),
        multipart_post(
            "/entries",
            &[
                ("entryType", "Service"),
                ("paymentStatus", "Received"),
                ("productStatus", "Received"),
                ("action", "submit"),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Customer is required"));
    assert!(body.contains("Payment Mode is required when Payment Status is Received"));
    assert!(body.contains("Front Image is required"));
    assert!(mock.entry_content_types().is_empty());
}

#[tokio::test]
async fn unknown_form_action_is_rejected() {
    let mock = MockShop::start().await;
    let (status, _) = send(
        app(&mock),
        multipart_post("/entries", &[("action", "launch")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dashboard_shows_month_counters_and_outstanding() {
    let mock = MockShop::with_data(vec![customer(1, "Ravi", "9000000001")], Vec::new()).await;
    let (status, body) = get(app(&mock), "/dashboard").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<strong>12</strong>"));
    assert!(body.contains("<strong>7</strong>"));
    assert!(body.contains("<strong>1500.00</strong>"));
    assert!(!body.contains("Failed to load"));
}

#[tokio::test]
async fn payment_pending_lists_contributing_entries() {
    let mock = MockShop::start().await;
    let (status, body) = get(app(&mock), "/payment-pending").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Ravi"));
    assert!(body.contains("2 entries"));
    assert!(body.contains(r#"href="/entries?panel=view&amp;id=6""#));
    assert!(body.contains("Total outstanding: <strong>1500.00</strong>"));
}

#[tokio::test]
async fn submit_clears_model_of_another_device() {
    let mock = MockShop::with_data(vec![customer(1, "Ravi", "9000000001")], Vec::new()).await;
    let (status, body) = send(
        app(&mock),
        multipart_with_front("/entries", &service_entry("9"), "image/jpeg", b"\xff\xd8jpeg"),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Model is required"));
    assert!(mock.entry_content_types().is_empty());
}

#[tokio::test]
async fn submit_with_model_of_selected_device_is_saved() {
    let mock = MockShop::with_data(vec![customer(1, "Ravi", "9000000001")], Vec::new()).await;
    let response = app(&mock)
        .oneshot(multipart_with_front(
            "/entries",
            &service_entry("5"),
            "image/jpeg",
            b"\xff\xd8jpeg",
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let content_types = mock.entry_content_types();
    assert_eq!(content_types.len(), 1);
    assert!(content_types[0].starts_with("multipart/form-data"));
}

#[tokio::test]
async fn non_image_upload_is_not_staged() {
    let mock = MockShop::start().await;
    let (status, body) = send(
        app(&mock),
        multipart_with_front(
            "/entries",
            &[("entryType", "Service"), ("action", "submit")],
            "text/html",
            b"<script>alert(document.cookie)</script>",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Front Image is required"));
    assert!(!body.contains("/previews/"));
}

#[tokio::test]
async fn staged_preview_is_served_without_sniffing() {
    let mock = MockShop::start().await;
    let app = app(&mock);
    let (status, body) = send(
        app.clone(),
        multipart_with_front(
            "/entries",
            &[("entryType", "Service"), ("action", "search_model")],
            "image/png",
            b"\x89PNG",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let marker = r#"src="/previews/"#;
    let start = body.find(marker).expect("staged preview") + marker.len();
    let preview_id = &body[start..start + 36];

    let response = app
        .oneshot(
            Request::get(format!("/previews/{preview_id}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("image/png")
    );
    assert_eq!(
        headers
            .get(header::X_CONTENT_TYPE_OPTIONS)
            .and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
}

#[tokio::test]
async fn entry_form_defaults_to_submit_on_enter() {
    let mock = MockShop::start().await;
    let (_, body) = get(app(&mock), "/entries?panel=add").await;

    let form = body.find("enctype=\"multipart/form-data\"").expect("entry form");
    let first_action = body[form..]
        .find(r#"name="action" value=""#)
        .map(|i| &body[form + i..])
        .expect("first action button");
    assert!(first_action.starts_with(r#"name="action" value="submit""#));
}

#[tokio::test]
async fn toggle_sends_only_the_active_flag() {
    let mock = MockShop::with_data(vec![customer(1, "Ravi", "9000000001")], Vec::new()).await;

    let (status, _) = send(
        app(&mock),
        Request::post("/customers/1/toggle?active=false")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (status, _) = send(
        app(&mock),
        Request::post("/devices/2/toggle?active=true")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    assert_eq!(
        mock.updates(),
        vec![
            ("update-customer/1".to_string(), json!({ "isActive": false })),
            ("update-device/2".to_string(), json!({ "isActive": true })),
        ]
    );
}

#[tokio::test]
async fn editing_inactive_customer_keeps_it_inactive() {
    let mut ravi = customer(1, "Ravi", "9000000001");
    ravi["isActive"] = json!(false);
    let mock = MockShop::with_data(vec![ravi], Vec::new()).await;

    let (status, _) = send(
        app(&mock),
        form_post("/customers/1", "name=Ravi+K&phone=9000000001&email="),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let updates = mock.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, "update-customer/1");
    assert_eq!(updates[0].1["name"], json!("Ravi K"));
    assert_eq!(updates[0].1["isActive"], json!(false));
}

#[tokio::test]
async fn editing_unknown_customer_is_not_sent() {
    let mock = MockShop::start().await;
    let (status, body) = send(
        app(&mock),
        form_post("/customers/42", "name=Asha&phone=9876543210&email="),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Customer 42 not found"));
    assert!(mock.updates().is_empty());
}

#[tokio::test]
async fn devices_page_lists_every_device() {
    let mock = MockShop::start().await;
    let (status, body) = get(app(&mock), "/devices").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Phone"));
    assert!(body.contains("Tablet"));
    assert!(body.contains("Inactive"));
    assert!(body.contains(r#"action="/devices/2/toggle?active=true""#));
}

#[tokio::test]
async fn models_page_keeps_device_filter() {
    let mock = MockShop::start().await;
    let (status, body) = get(app(&mock), "/models?device=1").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Galaxy S21"));
    assert!(!body.contains("Tab S8"));
    assert!(body.contains(r#"href="/models?panel=edit&amp;id=5&amp;device=1""#));
    assert!(body.contains(r#"<input type="hidden" name="device" value="1">"#));

    let (status, body) = get(app(&mock), "/models?panel=edit&id=5&device=1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"action="/models/5""#));
    assert!(body.contains(r#"value="Galaxy S21""#));
}

#[tokio::test]
async fn unfiltered_models_page_names_each_device() {
    let mock = MockShop::start().await;
    let (status, body) = get(app(&mock), "/models").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<td>Galaxy S21</td><td>Phone</td>"));
    assert!(body.contains("<td>Tab S8</td><td>Tablet</td>"));
}
