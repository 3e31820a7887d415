//! PostgreSQL invoice repository for invoicing-service.

use crate::models::{Currency, DueDays, Invoice, InvoiceDraft, InvoiceStatus, PaidTransition};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::repository::InvoiceRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const INVOICE_COLUMNS: &str = "invoice_id, owner_id, invoice_name, invoice_number, currency, \
    from_name, from_email, from_address, client_name, client_email, client_address, \
    issue_date, due_days, item_description, item_quantity, item_rate, total, note, \
    status, created_utc, updated_utc, paid_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "invoicing-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    async fn fetch_owned(&self, owner_id: &str, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let record = sqlx::query_as::<_, InvoiceRecord>(&format!(
            "SELECT {} FROM invoices WHERE invoice_id = $1 AND owner_id = $2",
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        record.map(Invoice::try_from).transpose()
    }
}

/// Row shape as stored; enums are kept as their text and integer codes.
#[derive(Debug, FromRow)]
struct InvoiceRecord {
    invoice_id: Uuid,
    owner_id: String,
    invoice_name: String,
    invoice_number: i32,
    currency: String,
    from_name: String,
    from_email: String,
    from_address: String,
    client_name: String,
    client_email: String,
    client_address: String,
    issue_date: NaiveDate,
    due_days: i32,
    item_description: String,
    item_quantity: Decimal,
    item_rate: Decimal,
    total: Decimal,
    note: Option<String>,
    status: String,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
    paid_utc: Option<DateTime<Utc>>,
}

impl TryFrom<InvoiceRecord> for Invoice {
    type Error = AppError;

    fn try_from(record: InvoiceRecord) -> Result<Self, Self::Error> {
        let invoice_id = record.invoice_id;
        let corrupt = |what: String| {
            AppError::DatabaseError(anyhow::anyhow!("Invoice {} has {}", invoice_id, what))
        };

        let currency = Currency::from_str(&record.currency).map_err(|e| corrupt(e.to_string()))?;
        let due_days = DueDays::try_from(record.due_days).map_err(corrupt)?;
        let status = InvoiceStatus::from_str(&record.status).map_err(|e| corrupt(e.to_string()))?;

        Ok(Invoice {
            invoice_id: record.invoice_id,
            owner_id: record.owner_id,
            invoice_name: record.invoice_name,
            invoice_number: record.invoice_number,
            currency,
            from_name: record.from_name,
            from_email: record.from_email,
            from_address: record.from_address,
            client_name: record.client_name,
            client_email: record.client_email,
            client_address: record.client_address,
            issue_date: record.issue_date,
            due_days,
            item_description: record.item_description,
            item_quantity: record.item_quantity,
            item_rate: record.item_rate,
            total: record.total,
            note: record.note,
            status,
            created_utc: record.created_utc,
            updated_utc: record.updated_utc,
            paid_utc: record.paid_utc,
        })
    }
}

#[async_trait]
impl InvoiceRepository for Database {
    #[instrument(skip_all, fields(owner_id = %owner_id))]
    async fn create(&self, owner_id: &str, draft: &InvoiceDraft) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let record = sqlx::query_as::<_, InvoiceRecord>(&format!(
            r#"
            INSERT INTO invoices (
                invoice_id, owner_id, invoice_name, invoice_number, currency,
                from_name, from_email, from_address, client_name, client_email, client_address,
                issue_date, due_days, item_description, item_quantity, item_rate, total, note,
                status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, 'pending')
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&draft.invoice_name)
        .bind(draft.invoice_number)
        .bind(draft.currency.as_str())
        .bind(&draft.from_name)
        .bind(&draft.from_email)
        .bind(&draft.from_address)
        .bind(&draft.client_name)
        .bind(&draft.client_email)
        .bind(&draft.client_address)
        .bind(draft.issue_date)
        .bind(draft.due_days.days())
        .bind(&draft.item_description)
        .bind(draft.item_quantity)
        .bind(draft.item_rate)
        .bind(draft.total)
        .bind(&draft.note)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)))?;

        timer.observe_duration();

        let invoice = Invoice::try_from(record)?;
        info!(invoice_id = %invoice.invoice_id, "Invoice created");
        Ok(invoice)
    }

    #[instrument(skip_all, fields(owner_id = %owner_id, invoice_id = %invoice_id))]
    async fn find_for_owner(
        &self,
        owner_id: &str,
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = self.fetch_owned(owner_id, invoice_id).await?;

        timer.observe_duration();
        Ok(invoice)
    }

    #[instrument(skip_all, fields(owner_id = %owner_id, invoice_id = %invoice_id))]
    async fn update_for_owner(
        &self,
        owner_id: &str,
        invoice_id: Uuid,
        draft: &InvoiceDraft,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice"])
            .start_timer();

        let record = sqlx::query_as::<_, InvoiceRecord>(&format!(
            r#"
            UPDATE invoices SET
                invoice_name = $3, invoice_number = $4, currency = $5,
                from_name = $6, from_email = $7, from_address = $8,
                client_name = $9, client_email = $10, client_address = $11,
                issue_date = $12, due_days = $13, item_description = $14,
                item_quantity = $15, item_rate = $16, total = $17, note = $18,
                updated_utc = NOW()
            WHERE invoice_id = $1 AND owner_id = $2
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .bind(owner_id)
        .bind(&draft.invoice_name)
        .bind(draft.invoice_number)
        .bind(draft.currency.as_str())
        .bind(&draft.from_name)
        .bind(&draft.from_email)
        .bind(&draft.from_address)
        .bind(&draft.client_name)
        .bind(&draft.client_email)
        .bind(&draft.client_address)
        .bind(draft.issue_date)
        .bind(draft.due_days.days())
        .bind(&draft.item_description)
        .bind(draft.item_quantity)
        .bind(draft.item_rate)
        .bind(draft.total)
        .bind(&draft.note)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)))?;

        timer.observe_duration();

        let invoice = record.map(Invoice::try_from).transpose()?;
        if invoice.is_some() {
            info!("Invoice updated");
        }
        Ok(invoice)
    }

    #[instrument(skip_all, fields(owner_id = %owner_id))]
    async fn list_for_owner(
        &self,
        owner_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        // LIMIT NULL means no limit in PostgreSQL.
        let records = sqlx::query_as::<_, InvoiceRecord>(&format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE owner_id = $1
            ORDER BY created_utc DESC
            LIMIT $2
            "#,
            INVOICE_COLUMNS
        ))
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        records.into_iter().map(Invoice::try_from).collect()
    }

    #[instrument(skip_all, fields(owner_id = %owner_id, invoice_id = %invoice_id))]
    async fn mark_paid(
        &self,
        owner_id: &str,
        invoice_id: Uuid,
    ) -> Result<Option<PaidTransition>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["mark_invoice_paid"])
            .start_timer();

        // Guarded on status so that only one concurrent caller wins.
        let record = sqlx::query_as::<_, InvoiceRecord>(&format!(
            r#"
            UPDATE invoices
            SET status = 'paid', paid_utc = NOW(), updated_utc = NOW()
            WHERE invoice_id = $1 AND owner_id = $2 AND status = 'pending'
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to mark invoice paid: {}", e)))?;

        let transition = match record {
            Some(record) => Some(PaidTransition::Transitioned(Invoice::try_from(record)?)),
            None => self
                .fetch_owned(owner_id, invoice_id)
                .await?
                .map(PaidTransition::AlreadyPaid),
        };

        timer.observe_duration();
        Ok(transition)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}
