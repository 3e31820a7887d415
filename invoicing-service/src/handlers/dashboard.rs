use crate::dtos::DashboardView;
use crate::error::InvoiceError;
use crate::middleware::AuthUser;
use crate::services::build_dashboard;
use crate::startup::AppState;
use axum::{extract::State, Json};
use chrono::Utc;
use tracing::instrument;

/// Dashboard widgets for the signed-in user, built from one listing.
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DashboardView>, InvoiceError> {
    let invoices = state.repository.list_for_owner(&user.user_id, None).await?;
    Ok(Json(build_dashboard(&invoices, Utc::now().date_naive())))
}
