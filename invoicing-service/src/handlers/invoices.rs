//! Invoice handlers. Every operation is scoped to the signed-in user; an
//! invoice that is missing, malformed or owned by someone else sends the
//! caller back to the invoice list.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Form, Json,
};
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;
use tracing::instrument;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    dtos::{InvoiceForm, InvoiceListItem, InvoiceView, MarkPaidView, TotalPreview, TotalPreviewQuery},
    error::{InvoiceError, INVOICES_PATH},
    middleware::AuthUser,
    models::{Currency, PaidTransition},
    services::metrics::{INVOICES_TOTAL, INVOICE_AMOUNT_TOTAL, PAID_TRANSITIONS},
    startup::AppState,
    utils::{compute_total, format_currency},
};

fn parse_invoice_id(raw: &str) -> Result<Uuid, InvoiceError> {
    Uuid::parse_str(raw).map_err(|_| InvoiceError::NotAuthorized)
}

/// List the user's invoices, newest first.
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn list_invoices(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<InvoiceListItem>>, InvoiceError> {
    let invoices = state.repository.list_for_owner(&user.user_id, None).await?;
    Ok(Json(invoices.iter().map(InvoiceListItem::from).collect()))
}

/// Create an invoice from the editor form.
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn create_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<InvoiceForm>,
) -> Result<Redirect, InvoiceError> {
    let draft = form.into_draft()?;
    let invoice = state.repository.create(&user.user_id, &draft).await?;

    INVOICES_TOTAL.with_label_values(&["created"]).inc();
    INVOICE_AMOUNT_TOTAL
        .with_label_values(&[invoice.currency.as_str()])
        .inc_by(invoice.total.to_f64().unwrap_or(0.0));

    tracing::info!(
        invoice_id = %invoice.invoice_id,
        currency = invoice.currency.as_str(),
        total = %invoice.total,
        "Invoice created"
    );

    Ok(Redirect::to(INVOICES_PATH))
}

/// Full invoice for prefilling the edit form.
#[instrument(skip_all, fields(user_id = %user.user_id, invoice_id = %invoice_id))]
pub async fn get_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(invoice_id): Path<String>,
) -> Result<Json<InvoiceView>, InvoiceError> {
    let invoice_id = parse_invoice_id(&invoice_id)?;
    let invoice = state
        .repository
        .find_for_owner(&user.user_id, invoice_id)
        .await?
        .ok_or(InvoiceError::NotAuthorized)?;

    Ok(Json(InvoiceView::from(&invoice)))
}

/// Replace an invoice's editable fields from the editor form.
#[instrument(skip_all, fields(user_id = %user.user_id, invoice_id = %invoice_id))]
pub async fn update_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(invoice_id): Path<String>,
    Form(form): Form<InvoiceForm>,
) -> Result<Redirect, InvoiceError> {
    let invoice_id = parse_invoice_id(&invoice_id)?;

    // Ownership is checked before validation so that a foreign id never
    // learns anything from the error shape.
    state
        .repository
        .find_for_owner(&user.user_id, invoice_id)
        .await?
        .ok_or(InvoiceError::NotAuthorized)?;

    let draft = form.into_draft()?;
    let invoice = state
        .repository
        .update_for_owner(&user.user_id, invoice_id, &draft)
        .await?
        .ok_or(InvoiceError::NotAuthorized)?;

    INVOICES_TOTAL.with_label_values(&["updated"]).inc();
    tracing::info!(invoice_id = %invoice.invoice_id, total = %invoice.total, "Invoice updated");

    Ok(Redirect::to(INVOICES_PATH))
}

/// Confirmation view shown before marking an invoice paid.
#[instrument(skip_all, fields(user_id = %user.user_id, invoice_id = %invoice_id))]
pub async fn confirm_mark_paid(
    State(state): State<AppState>,
    user: AuthUser,
    Path(invoice_id): Path<String>,
) -> Result<Json<MarkPaidView>, InvoiceError> {
    let invoice_id = parse_invoice_id(&invoice_id)?;
    let invoice = state
        .repository
        .find_for_owner(&user.user_id, invoice_id)
        .await?
        .ok_or(InvoiceError::NotAuthorized)?;

    Ok(Json(MarkPaidView {
        title: "Confirm Action".to_string(),
        description: "Confirm marking this invoice as paid.".to_string(),
        invoice_id: invoice.invoice_id,
        already_paid: invoice.is_paid(),
        confirm_action: format!("{}/{}/paid", INVOICES_PATH, invoice.invoice_id),
        cancel_href: INVOICES_PATH.to_string(),
    }))
}

/// Move an invoice from pending to paid. Repeats are accepted and change
/// nothing.
#[instrument(skip_all, fields(user_id = %user.user_id, invoice_id = %invoice_id))]
pub async fn mark_paid(
    State(state): State<AppState>,
    user: AuthUser,
    Path(invoice_id): Path<String>,
) -> Result<Redirect, InvoiceError> {
    let invoice_id = parse_invoice_id(&invoice_id)?;
    let transition = state
        .repository
        .mark_paid(&user.user_id, invoice_id)
        .await?
        .ok_or(InvoiceError::NotAuthorized)?;

    match transition {
        PaidTransition::Transitioned(invoice) => {
            PAID_TRANSITIONS.inc();
            INVOICES_TOTAL.with_label_values(&["paid"]).inc();
            tracing::info!(invoice_id = %invoice.invoice_id, "Invoice marked paid");
        }
        PaidTransition::AlreadyPaid(invoice) => {
            tracing::info!(invoice_id = %invoice.invoice_id, "Invoice already paid");
        }
    }

    Ok(Redirect::to(INVOICES_PATH))
}

/// Live `quantity x rate` preview for the editor. Unparseable numbers count
/// as zero; an unsupported currency is rejected.
pub async fn total_preview(
    _user: AuthUser,
    Query(query): Query<TotalPreviewQuery>,
) -> Result<Json<TotalPreview>, InvoiceError> {
    let currency = Currency::from_str(query.currency.trim()).map_err(|e| {
        let mut error = ValidationError::new("currency");
        error.message = Some(e.to_string().into());
        let mut errors = ValidationErrors::new();
        errors.add("currency", error);
        errors
    })?;

    let total = compute_total(&query.quantity, &query.rate)?;

    Ok(Json(TotalPreview {
        total,
        currency,
        formatted: format_currency(total, currency),
    }))
}
