#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Duration;
use http_body_util::BodyExt;
use invoicing_service::config::InvoicingConfig;
use invoicing_service::dtos::InvoiceForm;
use invoicing_service::services::{InMemoryInvoiceRepository, SessionVerifier};
use invoicing_service::{build_router, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";
pub const ALICE: &str = "user-alice";
pub const BOB: &str = "user-bob";

/// Router backed by the in-memory store, driven with `oneshot`.
pub struct TestApp {
    pub router: Router,
    pub repository: Arc<InMemoryInvoiceRepository>,
    pub sessions: Arc<SessionVerifier>,
}

impl TestApp {
    pub fn spawn() -> Self {
        let repository = Arc::new(InMemoryInvoiceRepository::new());
        let state = AppState::new(&InvoicingConfig::for_tests(TEST_JWT_SECRET), repository.clone());
        let sessions = state.sessions.clone();

        Self {
            router: build_router(state),
            repository,
            sessions,
        }
    }

    pub fn token_for(&self, user_id: &str) -> String {
        self.sessions
            .issue_token(user_id, &format!("{}@example.com", user_id), Duration::minutes(15))
            .expect("Failed to issue test token")
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed")
    }

    pub async fn get(&self, path: &str, user_id: Option<&str>) -> Response {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(user_id) = user_id {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token_for(user_id)));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, path: &str, user_id: Option<&str>, form: &InvoiceForm) -> Response {
        let body = serde_urlencoded::to_string(form).expect("Failed to encode form");
        self.post_encoded(path, user_id, body).await
    }

    /// Post an already url-encoded body, as a browser form would send it.
    pub async fn post_encoded(&self, path: &str, user_id: Option<&str>, body: String) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(user_id) = user_id {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token_for(user_id)));
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    pub async fn post_empty(&self, path: &str, user_id: &str) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token_for(user_id)))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Create an invoice through the HTTP surface and return its id.
    pub async fn create_invoice(&self, user_id: &str, form: &InvoiceForm) -> String {
        let before = self.invoice_ids(user_id).await;

        let response = self.post_form("/dashboard/invoices", Some(user_id), form).await;
        assert_redirect_to_list(&response);

        self.invoice_ids(user_id)
            .await
            .into_iter()
            .find(|id| !before.contains(id))
            .expect("Created invoice missing from list")
    }

    pub async fn invoice_ids(&self, user_id: &str) -> Vec<String> {
        body_json(self.get("/dashboard/invoices", Some(user_id)).await)
            .await
            .as_array()
            .expect("Invoice list is not an array")
            .iter()
            .filter_map(|item| item["invoice_id"].as_str().map(str::to_string))
            .collect()
    }
}

pub fn invoice_form(client_name: &str) -> InvoiceForm {
    InvoiceForm {
        invoice_name: "Website redesign".to_string(),
        invoice_number: "1".to_string(),
        currency: "USD".to_string(),
        from_name: "Ada Studio".to_string(),
        from_email: "billing@ada.example".to_string(),
        from_address: "1 Main St".to_string(),
        client_name: client_name.to_string(),
        client_email: "ap@client.example".to_string(),
        client_address: "2 Side St".to_string(),
        date: "2025-01-20".to_string(),
        due_date: "30".to_string(),
        invoice_item_description: "Design work".to_string(),
        invoice_item_quantity: "3".to_string(),
        invoice_item_rate: "150".to_string(),
        note: None,
        total: Some("450".to_string()),
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

pub fn assert_redirect_to_list(response: &Response) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/dashboard/invoices"
    );
}
