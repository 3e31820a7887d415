//! HTTP handlers for invoicing-service.

pub mod dashboard;
pub mod health;
pub mod invoices;
pub mod metrics;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_endpoint;
