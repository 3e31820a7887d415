use crate::models::Currency;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dashboard landing view: either the empty-state prompt or the widgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DashboardView {
    Empty(EmptyState),
    Populated {
        blocks: DashboardBlocks,
        graph: Vec<GraphPoint>,
        recent: Vec<RecentInvoice>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmptyState {
    pub title: String,
    pub description: String,
    pub button_text: String,
    pub href: String,
}

impl Default for EmptyState {
    fn default() -> Self {
        Self {
            title: "No invoices found".to_string(),
            description: "Create an invoice to see it right here".to_string(),
            button_text: "Create Invoice".to_string(),
            href: "/dashboard/invoices/create".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardBlocks {
    pub total_invoices: usize,
    pub paid_invoices: usize,
    pub pending_invoices: usize,
    /// Sum over every invoice, per currency.
    pub invoiced: Vec<CurrencyTotal>,
    /// Sum over paid invoices, per currency.
    pub collected: Vec<CurrencyTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyTotal {
    pub currency: Currency,
    pub amount: Decimal,
    pub formatted: String,
}

/// Paid amounts for one day of the totals graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphPoint {
    pub date: NaiveDate,
    pub amounts: Vec<CurrencyTotal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentInvoice {
    pub invoice_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub initials: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub formatted: String,
}
