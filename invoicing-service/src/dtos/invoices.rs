use crate::models::{Currency, DueDays, Invoice, InvoiceStatus};
use crate::utils::format_currency;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Full invoice, used to prefill the edit form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceView {
    pub invoice_id: Uuid,
    pub invoice_name: String,
    pub invoice_number: i32,
    pub currency: Currency,
    pub from_name: String,
    pub from_email: String,
    pub from_address: String,
    pub client_name: String,
    pub client_email: String,
    pub client_address: String,
    pub date: NaiveDate,
    pub due_date: DueDays,
    pub due_label: String,
    pub due_on: NaiveDate,
    pub invoice_item_description: String,
    pub invoice_item_quantity: Decimal,
    pub invoice_item_rate: Decimal,
    pub total: Decimal,
    pub total_formatted: String,
    pub note: Option<String>,
    pub status: InvoiceStatus,
    pub created_utc: DateTime<Utc>,
    pub paid_utc: Option<DateTime<Utc>>,
}

impl From<&Invoice> for InvoiceView {
    fn from(invoice: &Invoice) -> Self {
        Self {
            invoice_id: invoice.invoice_id,
            invoice_name: invoice.invoice_name.clone(),
            invoice_number: invoice.invoice_number,
            currency: invoice.currency,
            from_name: invoice.from_name.clone(),
            from_email: invoice.from_email.clone(),
            from_address: invoice.from_address.clone(),
            client_name: invoice.client_name.clone(),
            client_email: invoice.client_email.clone(),
            client_address: invoice.client_address.clone(),
            date: invoice.issue_date,
            due_date: invoice.due_days,
            due_label: invoice.due_days.label().to_string(),
            due_on: invoice.due_on(),
            invoice_item_description: invoice.item_description.clone(),
            invoice_item_quantity: invoice.item_quantity,
            invoice_item_rate: invoice.item_rate,
            total: invoice.total,
            total_formatted: format_currency(invoice.total, invoice.currency),
            note: invoice.note.clone(),
            status: invoice.status,
            created_utc: invoice.created_utc,
            paid_utc: invoice.paid_utc,
        }
    }
}

/// Row in the invoice list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceListItem {
    pub invoice_id: Uuid,
    pub invoice_number: i32,
    pub client_name: String,
    pub total: Decimal,
    pub total_formatted: String,
    pub currency: Currency,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

impl From<&Invoice> for InvoiceListItem {
    fn from(invoice: &Invoice) -> Self {
        Self {
            invoice_id: invoice.invoice_id,
            invoice_number: invoice.invoice_number,
            client_name: invoice.client_name.clone(),
            total: invoice.total,
            total_formatted: format_currency(invoice.total, invoice.currency),
            currency: invoice.currency,
            status: invoice.status,
            date: invoice.issue_date,
        }
    }
}

/// Confirmation screen shown before marking an invoice paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkPaidView {
    pub title: String,
    pub description: String,
    pub invoice_id: Uuid,
    pub already_paid: bool,
    pub confirm_action: String,
    pub cancel_href: String,
}

/// Query for the live total preview.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TotalPreviewQuery {
    pub quantity: String,
    pub rate: String,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalPreview {
    pub total: Decimal,
    pub currency: Currency,
    pub formatted: String,
}
