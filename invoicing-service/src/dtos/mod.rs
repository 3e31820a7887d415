//! Request and view types exchanged with the dashboard front end.

pub mod dashboard;
pub mod invoice_form;
pub mod invoices;

pub use dashboard::{
    CurrencyTotal, DashboardBlocks, DashboardView, EmptyState, GraphPoint, RecentInvoice,
};
pub use invoice_form::InvoiceForm;
pub use invoices::{InvoiceListItem, InvoiceView, MarkPaidView, TotalPreview, TotalPreviewQuery};
