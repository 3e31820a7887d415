//! Create/edit invoice form submission and its validation schema.

use crate::error::InvoiceError;
use crate::models::{Currency, DueDays, InvoiceDraft};
use crate::utils::{line_total, MAX_AMOUNT};
use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::{Validate, ValidationError, ValidationErrors};

/// Raw form fields as posted by the invoice editor, under the editor's
/// camelCase names. Every field arrives as a string and missing fields
/// default to empty so that each one is reported by validation rather than
/// rejected by the decoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct InvoiceForm {
    #[validate(length(min = 1, message = "Invoice name is required"))]
    pub invoice_name: String,

    #[validate(custom(function = "validate_invoice_number"))]
    pub invoice_number: String,

    #[validate(custom(function = "validate_currency"))]
    pub currency: String,

    #[validate(length(min = 1, message = "Your name is required"))]
    pub from_name: String,

    #[validate(
        length(min = 1, message = "Your email is required"),
        email(message = "Invalid email address")
    )]
    pub from_email: String,

    #[validate(length(min = 1, message = "Your address is required"))]
    pub from_address: String,

    #[validate(length(min = 1, message = "Client name is required"))]
    pub client_name: String,

    #[validate(
        length(min = 1, message = "Client email is required"),
        email(message = "Invalid email address")
    )]
    pub client_email: String,

    #[validate(length(min = 1, message = "Client address is required"))]
    pub client_address: String,

    #[validate(custom(function = "validate_issue_date"))]
    pub date: String,

    #[validate(custom(function = "validate_due_date"))]
    pub due_date: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub invoice_item_description: String,

    #[validate(custom(function = "validate_quantity"))]
    pub invoice_item_quantity: String,

    #[validate(custom(function = "validate_rate"))]
    pub invoice_item_rate: String,

    pub note: Option<String>,

    /// Live total computed by the editor. Informational only.
    pub total: Option<String>,
}

impl InvoiceForm {
    /// Validate the submission and convert it into a draft whose total is
    /// recomputed from quantity and rate. Text is trimmed before validation,
    /// so whitespace alone counts as missing.
    pub fn into_draft(self) -> Result<InvoiceDraft, InvoiceError> {
        let form = self.trimmed();
        form.validate().map_err(wire_names)?;

        let item_quantity = field("invoiceItemQuantity", parse_quantity(&form.invoice_item_quantity))?;
        let item_rate = field("invoiceItemRate", parse_rate(&form.invoice_item_rate))?;
        let total = line_total(item_quantity, item_rate)?;

        if let Some(submitted) = form.submitted_total() {
            if submitted != total {
                tracing::warn!(
                    submitted = %submitted,
                    computed = %total,
                    "Submitted total differs from quantity x rate; using computed total"
                );
            }
        }

        Ok(InvoiceDraft {
            invoice_number: field("invoiceNumber", parse_invoice_number(&form.invoice_number))?,
            currency: field("currency", parse_currency(&form.currency))?,
            issue_date: field("date", parse_issue_date(&form.date))?,
            due_days: field("dueDate", parse_due_date(&form.due_date))?,
            invoice_name: form.invoice_name,
            from_name: form.from_name,
            from_email: form.from_email,
            from_address: form.from_address,
            client_name: form.client_name,
            client_email: form.client_email,
            client_address: form.client_address,
            item_description: form.invoice_item_description,
            item_quantity,
            item_rate,
            total,
            note: form.note.filter(|n| !n.is_empty()),
        })
    }

    fn trimmed(self) -> Self {
        let trim = |s: String| s.trim().to_string();
        InvoiceForm {
            invoice_name: trim(self.invoice_name),
            invoice_number: trim(self.invoice_number),
            currency: trim(self.currency),
            from_name: trim(self.from_name),
            from_email: trim(self.from_email),
            from_address: trim(self.from_address),
            client_name: trim(self.client_name),
            client_email: trim(self.client_email),
            client_address: trim(self.client_address),
            date: trim(self.date),
            due_date: trim(self.due_date),
            invoice_item_description: trim(self.invoice_item_description),
            invoice_item_quantity: trim(self.invoice_item_quantity),
            invoice_item_rate: trim(self.invoice_item_rate),
            note: self.note.map(trim),
            total: self.total.map(trim),
        }
    }

    fn submitted_total(&self) -> Option<Decimal> {
        self.total
            .as_deref()
            .filter(|t| !t.is_empty())
            .and_then(|t| Decimal::from_str(t).ok())
    }
}

/// Form name of a struct field, as the editor posts it.
fn wire_name(field: &str) -> &'static str {
    match field {
        "invoice_name" | "invoiceName" => "invoiceName",
        "invoice_number" | "invoiceNumber" => "invoiceNumber",
        "currency" => "currency",
        "from_name" | "fromName" => "fromName",
        "from_email" | "fromEmail" => "fromEmail",
        "from_address" | "fromAddress" => "fromAddress",
        "client_name" | "clientName" => "clientName",
        "client_email" | "clientEmail" => "clientEmail",
        "client_address" | "clientAddress" => "clientAddress",
        "date" => "date",
        "due_date" | "dueDate" => "dueDate",
        "invoice_item_description" | "invoiceItemDescription" => "invoiceItemDescription",
        "invoice_item_quantity" | "invoiceItemQuantity" => "invoiceItemQuantity",
        "invoice_item_rate" | "invoiceItemRate" => "invoiceItemRate",
        "note" => "note",
        "total" => "total",
        _ => "form",
    }
}

/// Re-key derived field errors under the posted form names.
fn wire_names(errors: ValidationErrors) -> ValidationErrors {
    let mut renamed = ValidationErrors::new();
    for (field, errs) in errors.field_errors() {
        let name = wire_name(&field);
        for err in errs.iter() {
            renamed.add(name, err.clone());
        }
    }
    renamed
}

fn field<T>(name: &'static str, result: Result<T, ValidationError>) -> Result<T, ValidationErrors> {
    result.map_err(|err| {
        let mut errors = ValidationErrors::new();
        errors.add(name, err);
        errors
    })
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn parse_invoice_number(value: &str) -> Result<i32, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid("required", "Invoice number is required"));
    }
    match value.parse::<i32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(invalid(
            "invoice_number",
            "Invoice number must be a whole number of at least 1",
        )),
    }
}

fn parse_currency(value: &str) -> Result<Currency, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid("required", "Currency is required"));
    }
    Currency::from_str(value).map_err(|_| invalid("currency", "Currency must be USD or EUR"))
}

/// Accepts a plain calendar date or the editor's ISO timestamp.
fn parse_issue_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid("required", "Date is required"));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| invalid("date", "Date must be YYYY-MM-DD or an ISO 8601 timestamp"))
}

fn parse_due_date(value: &str) -> Result<DueDays, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid("required", "Due date is required"));
    }
    value
        .parse::<i32>()
        .ok()
        .and_then(DueDays::from_days)
        .ok_or_else(|| invalid("due_date", "Due date must be 0, 15 or 30 days"))
}

fn parse_non_negative(
    value: &str,
    required: &'static str,
    malformed: &'static str,
) -> Result<Decimal, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid("required", required));
    }
    let amount = Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| invalid("number", malformed))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(invalid("range", "Must not be negative"));
    }
    if amount.normalize().scale() > 2 {
        return Err(invalid("precision", "At most two decimal places"));
    }
    if amount > MAX_AMOUNT {
        return Err(invalid("range", "Must be at most 999,999,999,999,999.99"));
    }
    Ok(amount)
}

fn parse_quantity(value: &str) -> Result<Decimal, ValidationError> {
    parse_non_negative(value, "Quantity is required", "Quantity must be a number")
}

fn parse_rate(value: &str) -> Result<Decimal, ValidationError> {
    parse_non_negative(value, "Rate is required", "Rate must be a number")
}

fn validate_invoice_number(value: &str) -> Result<(), ValidationError> {
    parse_invoice_number(value).map(|_| ())
}

fn validate_currency(value: &str) -> Result<(), ValidationError> {
    parse_currency(value).map(|_| ())
}

fn validate_issue_date(value: &str) -> Result<(), ValidationError> {
    parse_issue_date(value).map(|_| ())
}

fn validate_due_date(value: &str) -> Result<(), ValidationError> {
    parse_due_date(value).map(|_| ())
}

fn validate_quantity(value: &str) -> Result<(), ValidationError> {
    parse_quantity(value).map(|_| ())
}

fn validate_rate(value: &str) -> Result<(), ValidationError> {
    parse_rate(value).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_core::error::field_messages;

    fn valid_form() -> InvoiceForm {
        InvoiceForm {
            invoice_name: "Website redesign".to_string(),
            invoice_number: "5".to_string(),
            currency: "USD".to_string(),
            from_name: "Ada Studio".to_string(),
            from_email: "billing@ada.example".to_string(),
            from_address: "1 Main St".to_string(),
            client_name: "Globex".to_string(),
            client_email: "ap@globex.example".to_string(),
            client_address: "2 Side St".to_string(),
            date: "2025-01-20".to_string(),
            due_date: "15".to_string(),
            invoice_item_description: "Design work".to_string(),
            invoice_item_quantity: "3".to_string(),
            invoice_item_rate: "150.00".to_string(),
            note: Some("  ".to_string()),
            total: Some("450".to_string()),
        }
    }

    fn failing_fields(form: InvoiceForm) -> Vec<String> {
        match form.into_draft() {
            Err(InvoiceError::Validation(errors)) => field_messages(&errors).into_keys().collect(),
            Err(InvoiceError::Total(_)) => vec!["total".to_string()],
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn valid_form_becomes_draft() {
        let draft = valid_form().into_draft().unwrap();
        assert_eq!(draft.invoice_number, 5);
        assert_eq!(draft.currency, Currency::Usd);
        assert_eq!(draft.due_days, DueDays::Net15);
        assert_eq!(draft.total, Decimal::new(45000, 2));
        assert_eq!(draft.note, None);
    }

    #[test]
    fn submitted_total_is_ignored() {
        let mut form = valid_form();
        form.total = Some("1".to_string());
        let draft = form.into_draft().unwrap();
        assert_eq!(draft.total, Decimal::new(45000, 2));
    }

    #[test]
    fn accepts_iso_timestamp_date() {
        let mut form = valid_form();
        form.date = "2025-01-20T00:00:00.000Z".to_string();
        let draft = form.into_draft().unwrap();
        assert_eq!(draft.issue_date, NaiveDate::from_ymd_opt(2025, 1, 20).unwrap());
    }

    #[test]
    fn missing_field_is_reported_alone() {
        let mut form = valid_form();
        form.client_name = String::new();
        assert_eq!(failing_fields(form), vec!["clientName".to_string()]);
    }

    #[test]
    fn whitespace_only_text_counts_as_missing() {
        let mut form = valid_form();
        form.invoice_name = "   ".to_string();
        form.client_name = "\t ".to_string();
        assert_eq!(
            failing_fields(form),
            vec!["clientName".to_string(), "invoiceName".to_string()]
        );
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let mut form = valid_form();
        form.client_name = "  Globex ".to_string();
        form.client_email = " ap@globex.example ".to_string();
        let draft = form.into_draft().unwrap();
        assert_eq!(draft.client_name, "Globex");
        assert_eq!(draft.client_email, "ap@globex.example");
    }

    #[test]
    fn empty_form_reports_every_required_field() {
        let fields = failing_fields(InvoiceForm::default());
        for name in [
            "invoiceName",
            "invoiceNumber",
            "currency",
            "fromName",
            "fromEmail",
            "fromAddress",
            "clientName",
            "clientEmail",
            "clientAddress",
            "date",
            "dueDate",
            "invoiceItemDescription",
            "invoiceItemQuantity",
            "invoiceItemRate",
        ] {
            assert!(fields.contains(&name.to_string()), "missing {}", name);
        }
        assert!(!fields.contains(&"note".to_string()));
    }

    #[test]
    fn decodes_editor_field_names() {
        let body = "invoiceName=Retainer&invoiceNumber=7&currency=EUR&fromName=Ada\
            &fromEmail=ada%40example.com&fromAddress=1+Main+St&clientName=Globex\
            &clientEmail=ap%40globex.example&clientAddress=2+Side+St&date=2025-02-01\
            &dueDate=0&invoiceItemDescription=Support&invoiceItemQuantity=2\
            &invoiceItemRate=12.5&total=25";
        let form: InvoiceForm = serde_urlencoded::from_str(body).unwrap();
        let draft = form.into_draft().unwrap();
        assert_eq!(draft.invoice_name, "Retainer");
        assert_eq!(draft.currency, Currency::Eur);
        assert_eq!(draft.due_days, DueDays::OnReceipt);
        assert_eq!(draft.total, Decimal::new(25, 0));
    }

    #[test]
    fn rejects_unsupported_enums() {
        let mut form = valid_form();
        form.currency = "GBP".to_string();
        form.due_date = "45".to_string();
        assert_eq!(
            failing_fields(form),
            vec!["currency".to_string(), "dueDate".to_string()]
        );
    }

    #[test]
    fn rejects_negative_and_fractional_cent_amounts() {
        let mut form = valid_form();
        form.invoice_item_quantity = "-1".to_string();
        form.invoice_item_rate = "10.005".to_string();
        assert_eq!(
            failing_fields(form),
            vec![
                "invoiceItemQuantity".to_string(),
                "invoiceItemRate".to_string()
            ]
        );
    }

    #[test]
    fn rejects_amounts_beyond_storage_limit() {
        let mut form = valid_form();
        form.invoice_item_quantity = "50000000000000000000000000000".to_string();
        form.invoice_item_rate = "1000000000000000".to_string();
        assert_eq!(
            failing_fields(form),
            vec![
                "invoiceItemQuantity".to_string(),
                "invoiceItemRate".to_string()
            ]
        );

        let mut form = valid_form();
        form.invoice_item_quantity = "999999999999999.99".to_string();
        form.invoice_item_rate = "2".to_string();
        assert_eq!(failing_fields(form), vec!["total".to_string()]);
    }

    #[test]
    fn rejects_bad_email_and_invoice_number() {
        let mut form = valid_form();
        form.client_email = "not-an-email".to_string();
        form.invoice_number = "0".to_string();
        assert_eq!(
            failing_fields(form),
            vec!["clientEmail".to_string(), "invoiceNumber".to_string()]
        );
    }
}
