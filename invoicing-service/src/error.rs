//! Error type for invoice handlers.

use crate::services::metrics::ERRORS_TOTAL;
use crate::utils::TotalError;
use axum::response::{IntoResponse, Redirect, Response};
use service_core::error::AppError;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

/// Where callers land when an invoice is missing or belongs to someone else.
pub const INVOICES_PATH: &str = "/dashboard/invoices";

#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Not found, not owned, or not a valid id. Deliberately indistinguishable.
    #[error("Invoice not available")]
    NotAuthorized,

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Total(#[from] TotalError),

    #[error(transparent)]
    App(#[from] AppError),
}

impl InvoiceError {
    fn kind(&self) -> &'static str {
        match self {
            InvoiceError::NotAuthorized => "not_authorized",
            InvoiceError::Validation(_) | InvoiceError::Total(_) => "validation",
            InvoiceError::App(AppError::DatabaseError(_)) => "database",
            InvoiceError::App(_) => "internal",
        }
    }
}

impl IntoResponse for InvoiceError {
    fn into_response(self) -> Response {
        ERRORS_TOTAL.with_label_values(&[self.kind()]).inc();

        match self {
            InvoiceError::NotAuthorized => Redirect::to(INVOICES_PATH).into_response(),
            InvoiceError::Validation(errors) => AppError::ValidationError(errors).into_response(),
            InvoiceError::Total(err) => {
                let mut error = ValidationError::new("total");
                error.message = Some(err.to_string().into());
                let mut errors = ValidationErrors::new();
                errors.add("total", error);
                AppError::ValidationError(errors).into_response()
            }
            InvoiceError::App(err) => err.into_response(),
        }
    }
}
