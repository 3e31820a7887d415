//! Services module for invoicing-service.

pub mod dashboard;
pub mod database;
pub mod metrics;
pub mod repository;
pub mod session;

pub use dashboard::build_dashboard;
pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
pub use repository::{InMemoryInvoiceRepository, InvoiceRepository};
pub use session::{SessionClaims, SessionError, SessionVerifier};
