//! Form schema tests.
//!
//! Run with: cargo test --test validation_test

use repair_console::shop::models::{EntryKind, PaymentMode};
use repair_console::validation::{
    CustomerForm, DeviceForm, EntryForm, ModelForm, validate,
};

fn service_form() -> EntryForm {
    EntryForm {
        entry_type: "Service".to_string(),
        date: "2025-01-15".to_string(),
        internal_ref: "1042".to_string(),
        customer: "1".to_string(),
        device: "2".to_string(),
        model: "3".to_string(),
        issue: "Cracked screen".to_string(),
        estimate: "1500".to_string(),
        product_status: "Received".to_string(),
        payment_status: "Not received".to_string(),
        has_front_image: true,
        ..EntryForm::default()
    }
}

fn sale_form() -> EntryForm {
    EntryForm {
        entry_type: "Sale".to_string(),
        customer: "1".to_string(),
        device: "2".to_string(),
        part_number_or_name: "Tempered glass".to_string(),
        price: "250".to_string(),
        product_status: "Delivered".to_string(),
        payment_status: "Received".to_string(),
        payment_mode: "Cash".to_string(),
        has_front_image: true,
        ..EntryForm::default()
    }
}

#[test]
fn phone_must_be_exactly_ten_digits() {
    let mut form = CustomerForm {
        name: "Asha".to_string(),
        phone: "98765".to_string(),
        email: String::new(),
    };
    let errors = validate(&form).unwrap_err();
    assert_eq!(
        errors.message("phone"),
        Some("Phone number must be exactly 10 digits")
    );

    form.phone = "98765abcde".to_string();
    assert!(validate(&form).unwrap_err().has("phone"));

    form.phone = "98765432100".to_string();
    assert!(validate(&form).unwrap_err().has("phone"));

    form.phone = "9876543210".to_string();
    let input = validate(&form).expect("valid customer");
    assert_eq!(input.phone, "9876543210");
    assert_eq!(input.email, None);
    assert!(input.is_active);
}

#[test]
fn customer_email_is_optional_but_checked() {
    let mut form = CustomerForm {
        name: "Asha".to_string(),
        phone: "9876543210".to_string(),
        email: "not-an-address".to_string(),
    };
    assert_eq!(
        validate(&form).unwrap_err().message("email"),
        Some("Invalid email address")
    );

    for bad in ["a@b..com", "asha@@example.com", "asha @example.com", "@example.com"] {
        form.email = bad.to_string();
        assert!(
            validate(&form).unwrap_err().has("email"),
            "{bad} should be rejected"
        );
    }

    form.email = "asha@example.com".to_string();
    let input = validate(&form).expect("valid customer");
    assert_eq!(input.email.as_deref(), Some("asha@example.com"));
}

#[test]
fn customer_reports_every_failing_field() {
    let form = CustomerForm::default();
    let errors = validate(&form).unwrap_err();
    assert!(errors.has("name"));
    assert!(errors.has("phone"));
    assert!(!errors.has("email"));
}

#[test]
fn device_and_model_names_are_required() {
    let errors = validate(&DeviceForm::default()).unwrap_err();
    assert_eq!(errors.message("deviceName"), Some("Device name is required"));

    let errors = validate(&ModelForm {
        device_id: String::new(),
        model_name: "  ".to_string(),
    })
    .unwrap_err();
    assert!(errors.has("deviceId"));
    assert!(errors.has("modelName"));

    let input = validate(&ModelForm {
        device_id: "4".to_string(),
        model_name: " Galaxy S21 ".to_string(),
    })
    .expect("valid model");
    assert_eq!(input.device_id, 4);
    assert_eq!(input.model_name, "Galaxy S21");
}

#[test]
fn payment_mode_required_only_when_received() {
    let mut form = service_form();
    form.payment_status = "Received".to_string();
    form.payment_mode = String::new();
    let errors = validate(&form).unwrap_err();
    assert_eq!(
        errors.message("paymentMode"),
        Some("Payment Mode is required when Payment Status is Received")
    );

    form.payment_mode = "UPI".to_string();
    let payload = validate(&form).expect("received with mode");
    assert_eq!(payload.payment_mode, Some(PaymentMode::Upi));

    form.payment_status = "Not received".to_string();
    form.payment_mode = String::new();
    let payload = validate(&form).expect("not received without mode");
    assert_eq!(payload.payment_mode, None);

    form.payment_status = "Partial".to_string();
    assert!(validate(&form).is_ok());
}

#[test]
fn unknown_payment_mode_is_rejected() {
    let mut form = service_form();
    form.payment_mode = "Cheque".to_string();
    assert_eq!(
        validate(&form).unwrap_err().message("paymentMode"),
        Some("Invalid payment mode")
    );
}

#[test]
fn service_entry_requires_intake_fields() {
    let form = EntryForm {
        date: String::new(),
        internal_ref: String::new(),
        model: String::new(),
        issue: String::new(),
        ..service_form()
    };
    let errors = validate(&form).unwrap_err();
    for field in ["date", "internalRef", "model", "issue"] {
        assert!(errors.has(field), "expected an error for {field}");
    }
    assert!(!errors.has("partNumberOrName"));
    assert!(!errors.has("price"));

    let payload = validate(&service_form()).expect("valid service entry");
    match payload.kind {
        EntryKind::Service {
            model_id, issue, ..
        } => {
            assert_eq!(model_id, 3);
            assert_eq!(issue, "Cracked screen");
        }
        EntryKind::Sale { .. } => panic!("expected a service entry"),
    }
}

#[test]
fn sale_entry_needs_part_and_price_but_no_model() {
    let payload = validate(&sale_form()).expect("valid sale");
    match payload.kind {
        EntryKind::Sale {
            part_number_or_name,
            price,
            model_id,
        } => {
            assert_eq!(part_number_or_name, "Tempered glass");
            assert_eq!(price, "250");
            assert_eq!(model_id, None);
        }
        EntryKind::Service { .. } => panic!("expected a sale"),
    }

    let form = EntryForm {
        part_number_or_name: String::new(),
        price: String::new(),
        ..sale_form()
    };
    let errors = validate(&form).unwrap_err();
    assert!(errors.has("partNumberOrName"));
    assert_eq!(errors.message("price"), Some("Price is required"));
    assert!(!errors.has("issue"));
    assert!(!errors.has("internalRef"));

    let form = EntryForm {
        price: "-5".to_string(),
        ..sale_form()
    };
    assert_eq!(
        validate(&form).unwrap_err().message("price"),
        Some("Price must be a non-negative amount")
    );
}

#[test]
fn entry_type_must_be_known() {
    let form = EntryForm {
        entry_type: "Rental".to_string(),
        ..service_form()
    };
    assert!(validate(&form).unwrap_err().has("entryType"));
}

#[test]
fn front_image_required_on_create_only() {
    let mut form = EntryForm {
        has_front_image: false,
        ..service_form()
    };
    assert_eq!(
        validate(&form).unwrap_err().message("frontImage"),
        Some("Front Image is required")
    );

    form.editing = true;
    assert!(validate(&form).is_ok());
}

#[test]
fn new_intake_defaults() {
    let today = chrono::NaiveDate::from_ymd_opt(2025, 3, 9).expect("date");
    let form = EntryForm::new_intake(today, Some("1042".to_string()));
    assert_eq!(form.date, "2025-03-09");
    assert_eq!(form.internal_ref, "1042");
    assert_eq!(form.entry_type, "Service");
    assert_eq!(form.product_status, "Received");
    assert_eq!(form.payment_status, "Not received");
    assert!(!form.editing);
}
