//! Dashboard integration tests for invoicing-service.

mod common;

use axum::http::StatusCode;
use common::{body_json, invoice_form, TestApp, ALICE, BOB};

#[tokio::test]
async fn new_user_sees_empty_state() {
    let app = TestApp::spawn();

    let response = app.get("/dashboard", Some(ALICE)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let view = body_json(response).await;
    assert_eq!(view["state"], "empty");
    assert_eq!(view["title"], "No invoices found");
    assert_eq!(view["button_text"], "Create Invoice");
}

#[tokio::test]
async fn widgets_reflect_only_own_invoices() {
    let app = TestApp::spawn();
    let paid_id = app.create_invoice(ALICE, &invoice_form("Globex")).await;
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    app.create_invoice(ALICE, &invoice_form("Initech")).await;
    app.create_invoice(BOB, &invoice_form("Umbrella")).await;
    app.post_empty(&format!("/dashboard/invoices/{}/paid", paid_id), ALICE)
        .await;

    let view = body_json(app.get("/dashboard", Some(ALICE)).await).await;
    assert_eq!(view["state"], "populated");
    assert_eq!(view["blocks"]["total_invoices"], 2);
    assert_eq!(view["blocks"]["paid_invoices"], 1);
    assert_eq!(view["blocks"]["pending_invoices"], 1);
    assert_eq!(view["blocks"]["invoiced"][0]["formatted"], "$900.00");
    assert_eq!(view["blocks"]["collected"][0]["formatted"], "$450.00");
    assert_eq!(view["graph"].as_array().unwrap().len(), 1);

    let recent = view["recent"].as_array().unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent.iter().all(|r| r["client_name"] != "Umbrella"));
    assert_eq!(recent[0]["client_name"], "Initech");
    assert_eq!(recent[0]["initials"], "IN");
}

#[tokio::test]
async fn recent_invoices_are_capped_at_seven() {
    let app = TestApp::spawn();
    for n in 0..9 {
        app.create_invoice(ALICE, &invoice_form(&format!("Client {}", n)))
            .await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let view = body_json(app.get("/dashboard", Some(ALICE)).await).await;
    let recent = view["recent"].as_array().unwrap();
    assert_eq!(recent.len(), 7);
    assert_eq!(recent[0]["client_name"], "Client 8");
    assert_eq!(view["blocks"]["total_invoices"], 9);
}
