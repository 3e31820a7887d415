//! Invoice model for invoicing-service.

use super::Currency;
use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            other => Err(anyhow::anyhow!("Unknown invoice status '{}'", other)),
        }
    }
}

/// Days after the issue date by which payment is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum DueDays {
    OnReceipt,
    Net15,
    Net30,
}

impl DueDays {
    pub fn days(&self) -> i32 {
        match self {
            DueDays::OnReceipt => 0,
            DueDays::Net15 => 15,
            DueDays::Net30 => 30,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DueDays::OnReceipt => "Due on Receipt",
            DueDays::Net15 => "Net 15",
            DueDays::Net30 => "Net 30",
        }
    }

    pub fn from_days(days: i32) -> Option<Self> {
        match days {
            0 => Some(DueDays::OnReceipt),
            15 => Some(DueDays::Net15),
            30 => Some(DueDays::Net30),
            _ => None,
        }
    }
}

impl TryFrom<i32> for DueDays {
    type Error = String;

    fn try_from(days: i32) -> Result<Self, Self::Error> {
        DueDays::from_days(days).ok_or_else(|| format!("Unsupported due date offset {}", days))
    }
}

impl From<DueDays> for i32 {
    fn from(due: DueDays) -> Self {
        due.days()
    }
}

/// Stored invoice. Every instance belongs to exactly one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub owner_id: String,
    pub invoice_name: String,
    pub invoice_number: i32,
    pub currency: Currency,
    pub from_name: String,
    pub from_email: String,
    pub from_address: String,
    pub client_name: String,
    pub client_email: String,
    pub client_address: String,
    pub issue_date: NaiveDate,
    pub due_days: DueDays,
    pub item_description: String,
    pub item_quantity: Decimal,
    pub item_rate: Decimal,
    pub total: Decimal,
    pub note: Option<String>,
    pub status: InvoiceStatus,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub paid_utc: Option<DateTime<Utc>>,
}

impl Invoice {
    /// Build a fresh pending invoice from a validated draft.
    pub fn from_draft(owner_id: &str, draft: &InvoiceDraft) -> Self {
        let now = Utc::now();
        Self {
            invoice_id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            invoice_name: draft.invoice_name.clone(),
            invoice_number: draft.invoice_number,
            currency: draft.currency,
            from_name: draft.from_name.clone(),
            from_email: draft.from_email.clone(),
            from_address: draft.from_address.clone(),
            client_name: draft.client_name.clone(),
            client_email: draft.client_email.clone(),
            client_address: draft.client_address.clone(),
            issue_date: draft.issue_date,
            due_days: draft.due_days,
            item_description: draft.item_description.clone(),
            item_quantity: draft.item_quantity,
            item_rate: draft.item_rate,
            total: draft.total,
            note: draft.note.clone(),
            status: InvoiceStatus::Pending,
            created_utc: now,
            updated_utc: now,
            paid_utc: None,
        }
    }

    /// Overwrite the editable fields with a draft, keeping identity, owner and
    /// status.
    pub fn apply(&mut self, draft: &InvoiceDraft) {
        self.invoice_name = draft.invoice_name.clone();
        self.invoice_number = draft.invoice_number;
        self.currency = draft.currency;
        self.from_name = draft.from_name.clone();
        self.from_email = draft.from_email.clone();
        self.from_address = draft.from_address.clone();
        self.client_name = draft.client_name.clone();
        self.client_email = draft.client_email.clone();
        self.client_address = draft.client_address.clone();
        self.issue_date = draft.issue_date;
        self.due_days = draft.due_days;
        self.item_description = draft.item_description.clone();
        self.item_quantity = draft.item_quantity;
        self.item_rate = draft.item_rate;
        self.total = draft.total;
        self.note = draft.note.clone();
    }

    /// Date payment is expected.
    pub fn due_on(&self) -> NaiveDate {
        self.issue_date
            .checked_add_days(Days::new(self.due_days.days() as u64))
            .unwrap_or(self.issue_date)
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}

/// Validated create/edit input. `total` is always recomputed from quantity and
/// rate before a draft exists.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub invoice_name: String,
    pub invoice_number: i32,
    pub currency: Currency,
    pub from_name: String,
    pub from_email: String,
    pub from_address: String,
    pub client_name: String,
    pub client_email: String,
    pub client_address: String,
    pub issue_date: NaiveDate,
    pub due_days: DueDays,
    pub item_description: String,
    pub item_quantity: Decimal,
    pub item_rate: Decimal,
    pub total: Decimal,
    pub note: Option<String>,
}

/// Outcome of a mark-as-paid request.
#[derive(Debug, Clone, PartialEq)]
pub enum PaidTransition {
    /// The invoice moved from pending to paid on this call.
    Transitioned(Invoice),
    /// The invoice was already paid; nothing changed.
    AlreadyPaid(Invoice),
}

impl PaidTransition {
    pub fn invoice(&self) -> &Invoice {
        match self {
            PaidTransition::Transitioned(invoice) | PaidTransition::AlreadyPaid(invoice) => invoice,
        }
    }
}
