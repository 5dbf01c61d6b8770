//! Shop client and query layer tests against the in-process backend.
//!
//! Run with: cargo test --test shop_client_test

mod common;

use axum::body::Bytes;
use serde_json::json;
use std::sync::Arc;

use common::{MockShop, customer};
use repair_console::error::AppError;
use repair_console::forms::{Attachment, ImageSlot};
use repair_console::services::{Queries, QueryCache};
use repair_console::shop::client::{EntryEncoding, check_envelope, collection, created_id, next_entry_id};
use repair_console::shop::models::{CustomerInput, DeviceInput};
use repair_console::shop::{EntrySubmission, ShopClient};
use repair_console::validation::{EntryForm, validate};

fn queries(mock: &MockShop) -> Queries {
    let config = mock.config();
    let shop = ShopClient::new(&config).expect("shop client");
    Queries::new(Arc::new(shop), QueryCache::new(&config))
}

fn submission(attachments: Vec<Attachment>) -> EntrySubmission {
    let form = EntryForm {
        date: "2025-01-15".to_string(),
        internal_ref: "1042".to_string(),
        customer: "1".to_string(),
        device: "1".to_string(),
        model: "5".to_string(),
        issue: "Battery drains".to_string(),
        product_status: "Received".to_string(),
        payment_status: "Not received".to_string(),
        has_front_image: true,
        ..EntryForm::default()
    };
    EntrySubmission {
        payload: validate(&form).expect("valid entry"),
        attachments,
    }
}

#[test]
fn envelope_failure_is_an_api_error() {
    let rejected = json!({ "info": { "success": false, "message": "Phone already registered" } });
    match check_envelope(rejected) {
        Err(AppError::Api { message }) => assert_eq!(message, "Phone already registered"),
        other => panic!("expected an API error, got {other:?}"),
    }

    let silent = json!({ "info": { "success": false } });
    match check_envelope(silent) {
        Err(AppError::Api { message }) => assert_eq!(message, "An error occurred"),
        other => panic!("expected an API error, got {other:?}"),
    }

    tokio_test::assert_ok!(check_envelope(json!({ "info": { "success": true }, "data": {} })));
    tokio_test::assert_ok!(check_envelope(json!({ "data": [] })));
}

#[test]
fn missing_collection_reads_as_empty() {
    assert_eq!(collection(&json!({ "data": {} }), "customers"), json!([]));
    assert_eq!(collection(&json!({}), "customers"), json!([]));
    assert_eq!(
        collection(&json!({ "data": { "customers": "oops" } }), "customers"),
        json!([])
    );
    assert_eq!(
        collection(&json!({ "data": { "customers": [{ "id": 1 }] } }), "customers"),
        json!([{ "id": 1 }])
    );
}

#[test]
fn next_entry_id_shapes() {
    assert_eq!(next_entry_id(&json!(1042)), Some(1042));
    assert_eq!(next_entry_id(&json!("1042")), Some(1042));
    assert_eq!(next_entry_id(&json!({ "data": 1042 })), Some(1042));
    assert_eq!(next_entry_id(&json!({ "data": { "nextEntryId": "77" } })), Some(77));
    assert_eq!(next_entry_id(&json!({ "data": null })), None);
    assert_eq!(next_entry_id(&json!("soon")), None);
}

#[test]
fn created_id_reads_echoed_record() {
    assert_eq!(
        created_id(&json!({ "data": { "customer": { "id": 12 } } }), "customer"),
        Some(12)
    );
    assert_eq!(created_id(&json!({ "data": { "id": "13" } }), "customer"), Some(13));
    assert_eq!(created_id(&json!({ "info": { "success": true } }), "customer"), None);
}

#[tokio::test]
async fn add_customer_refetches_list_exactly_once() {
    let mock = MockShop::with_data(vec![customer(1, "Ravi", "9000000001")], Vec::new()).await;
    let queries = queries(&mock);

    let before = queries.customers().await.expect("initial customers");
    assert_eq!(before.len(), 1);
    queries.customers().await.expect("cached customers");
    assert_eq!(mock.get_customers_calls(), 1);

    let input = CustomerInput {
        name: "Asha".to_string(),
        phone: "9876543210".to_string(),
        email: None,
        is_active: true,
    };
    let response = queries.add_customer(&input).await.expect("add customer");
    assert_eq!(mock.add_customer_calls(), 1);
    assert_eq!(
        queries
            .created_customer_id(&response, &input)
            .await
            .expect("created id"),
        Some(2)
    );

    let after = queries.customers().await.expect("refetched customers");
    queries.customers().await.expect("cached again");
    assert_eq!(mock.get_customers_calls(), 2);
    assert!(after.iter().any(|c| c.id == 2 && c.name == "Asha" && c.is_active));
}

#[tokio::test]
async fn rejected_write_leaves_cache_alone() {
    let mock = MockShop::start().await;
    let queries = queries(&mock);

    queries.devices().await.expect("devices");
    let result = queries
        .add_device(&DeviceInput {
            device_name: "Phone".to_string(),
            is_active: true,
        })
        .await;
    match result {
        Err(AppError::Api { message }) => assert_eq!(message, "Device already exists"),
        other => panic!("expected an API error, got {other:?}"),
    }
    assert!(queries.cache().peek("devices").await.is_some());
}

#[tokio::test]
async fn http_error_carries_server_message() {
    let mock = MockShop::start().await;
    let queries = queries(&mock);

    let err = queries.delete_customer(3).await.unwrap_err();
    assert_eq!(err.notice("Failed to delete customer"), "Customer has open entries");
}

#[tokio::test]
async fn entry_is_json_without_files_and_multipart_with_them() {
    let mock = MockShop::start().await;
    let queries = queries(&mock);

    let plain = submission(Vec::new());
    assert_eq!(plain.encoding(), EntryEncoding::Json);
    queries.add_entry(&plain).await.expect("json entry");

    let with_photo = submission(vec![Attachment {
        slot: ImageSlot::Front,
        file_name: "front.jpg".to_string(),
        content_type: "image/jpeg".to_string(),
        bytes: Bytes::from_static(b"\xff\xd8\xff\xe0jpeg"),
    }]);
    assert_eq!(with_photo.encoding(), EntryEncoding::Multipart);
    queries.add_entry(&with_photo).await.expect("multipart entry");

    let content_types = mock.entry_content_types();
    assert_eq!(content_types.len(), 2);
    assert!(content_types[0].starts_with("application/json"));
    assert!(content_types[1].starts_with("multipart/form-data"));
}

#[tokio::test]
async fn next_entry_id_from_backend() {
    let mock = MockShop::start().await;
    let queries = queries(&mock);

    assert_eq!(queries.next_entry_id().await.expect("next id"), Some(1042));
}

#[tokio::test]
async fn device_models_drop_rows_of_other_devices() {
    let mock = MockShop::start().await;
    let queries = queries(&mock);

    let phone: Vec<i64> = queries
        .models_for_device(1)
        .await
        .expect("phone models")
        .iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(phone, [5]);

    let tablet: Vec<i64> = queries
        .models_for_device(2)
        .await
        .expect("tablet models")
        .iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(tablet, [9]);

    assert_eq!(queries.all_models().await.expect("all models").len(), 2);
}
