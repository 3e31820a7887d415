//! Domain models for invoicing-service.

mod currency;
mod invoice;

pub use currency::{Currency, CurrencyError};
pub use invoice::{DueDays, Invoice, InvoiceDraft, InvoiceStatus, PaidTransition};
