//! Owner-scoped invoice storage.

use crate::models::{Invoice, InvoiceDraft, InvoiceStatus, PaidTransition};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use service_core::error::AppError;
use uuid::Uuid;

/// Persistence for invoices. Every lookup and write takes the caller's owner
/// id; a record owned by someone else behaves exactly like a missing one.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Persist a new pending invoice for `owner_id`.
    async fn create(&self, owner_id: &str, draft: &InvoiceDraft) -> Result<Invoice, AppError>;

    async fn find_for_owner(
        &self,
        owner_id: &str,
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, AppError>;

    /// Replace the editable fields. Status and timestamps other than
    /// `updated_utc` are left alone.
    async fn update_for_owner(
        &self,
        owner_id: &str,
        invoice_id: Uuid,
        draft: &InvoiceDraft,
    ) -> Result<Option<Invoice>, AppError>;

    /// Newest first.
    async fn list_for_owner(
        &self,
        owner_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Invoice>, AppError>;

    /// Move a pending invoice to paid. Concurrent callers see exactly one
    /// `Transitioned`.
    async fn mark_paid(
        &self,
        owner_id: &str,
        invoice_id: Uuid,
    ) -> Result<Option<PaidTransition>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// Process-local store used for development and tests.
#[derive(Default)]
pub struct InMemoryInvoiceRepository {
    invoices: DashMap<Uuid, Invoice>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn create(&self, owner_id: &str, draft: &InvoiceDraft) -> Result<Invoice, AppError> {
        let invoice = Invoice::from_draft(owner_id, draft);
        self.invoices.insert(invoice.invoice_id, invoice.clone());
        Ok(invoice)
    }

    async fn find_for_owner(
        &self,
        owner_id: &str,
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, AppError> {
        Ok(self
            .invoices
            .get(&invoice_id)
            .filter(|entry| entry.owner_id == owner_id)
            .map(|entry| entry.clone()))
    }

    async fn update_for_owner(
        &self,
        owner_id: &str,
        invoice_id: Uuid,
        draft: &InvoiceDraft,
    ) -> Result<Option<Invoice>, AppError> {
        let Some(mut entry) = self.invoices.get_mut(&invoice_id) else {
            return Ok(None);
        };
        if entry.owner_id != owner_id {
            return Ok(None);
        }
        entry.apply(draft);
        entry.updated_utc = Utc::now();
        Ok(Some(entry.clone()))
    }

    async fn list_for_owner(
        &self,
        owner_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Invoice>, AppError> {
        let mut invoices: Vec<Invoice> = self
            .invoices
            .iter()
            .filter(|entry| entry.owner_id == owner_id)
            .map(|entry| entry.value().clone())
            .collect();
        invoices.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
        if let Some(limit) = limit {
            invoices.truncate(limit.max(0) as usize);
        }
        Ok(invoices)
    }

    async fn mark_paid(
        &self,
        owner_id: &str,
        invoice_id: Uuid,
    ) -> Result<Option<PaidTransition>, AppError> {
        // The shard write lock is held for the whole check-and-set.
        let Some(mut entry) = self.invoices.get_mut(&invoice_id) else {
            return Ok(None);
        };
        if entry.owner_id != owner_id {
            return Ok(None);
        }
        if entry.is_paid() {
            return Ok(Some(PaidTransition::AlreadyPaid(entry.clone())));
        }
        let now = Utc::now();
        entry.status = InvoiceStatus::Paid;
        entry.paid_utc = Some(now);
        entry.updated_utc = now;
        Ok(Some(PaidTransition::Transitioned(entry.clone())))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, DueDays};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn draft(client: &str) -> InvoiceDraft {
        InvoiceDraft {
            invoice_name: "Retainer".to_string(),
            invoice_number: 1,
            currency: Currency::Eur,
            from_name: "Me".to_string(),
            from_email: "me@example.com".to_string(),
            from_address: "Here".to_string(),
            client_name: client.to_string(),
            client_email: "client@example.com".to_string(),
            client_address: "There".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            due_days: DueDays::OnReceipt,
            item_description: "Hours".to_string(),
            item_quantity: Decimal::new(2, 0),
            item_rate: Decimal::new(5000, 2),
            total: Decimal::new(10000, 2),
            note: None,
        }
    }

    #[tokio::test]
    async fn other_owners_cannot_see_or_change_invoice() {
        let repo = InMemoryInvoiceRepository::new();
        let invoice = repo.create("alice", &draft("Globex")).await.unwrap();

        assert!(repo.find_for_owner("bob", invoice.invoice_id).await.unwrap().is_none());
        assert!(repo
            .update_for_owner("bob", invoice.invoice_id, &draft("Hijacked"))
            .await
            .unwrap()
            .is_none());
        assert!(repo.mark_paid("bob", invoice.invoice_id).await.unwrap().is_none());
        assert!(repo.list_for_owner("bob", None).await.unwrap().is_empty());

        let stored = repo
            .find_for_owner("alice", invoice.invoice_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, invoice);
    }

    #[tokio::test]
    async fn update_keeps_status_and_creation_time() {
        let repo = InMemoryInvoiceRepository::new();
        let invoice = repo.create("alice", &draft("Globex")).await.unwrap();
        repo.mark_paid("alice", invoice.invoice_id).await.unwrap();

        let updated = repo
            .update_for_owner("alice", invoice.invoice_id, &draft("Initech"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.client_name, "Initech");
        assert_eq!(updated.status, InvoiceStatus::Paid);
        assert_eq!(updated.created_utc, invoice.created_utc);
    }

    #[tokio::test]
    async fn list_is_newest_first_with_limit() {
        let repo = InMemoryInvoiceRepository::new();
        for client in ["first", "second", "third"] {
            repo.create("alice", &draft(client)).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let all = repo.list_for_owner("alice", None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].client_name, "third");

        let limited = repo.list_for_owner("alice", Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn mark_paid_is_idempotent() {
        let repo = InMemoryInvoiceRepository::new();
        let invoice = repo.create("alice", &draft("Globex")).await.unwrap();

        let first = repo.mark_paid("alice", invoice.invoice_id).await.unwrap().unwrap();
        let paid_at = match first {
            PaidTransition::Transitioned(ref paid) => paid.paid_utc,
            other => panic!("expected transition, got {:?}", other),
        };

        let second = repo.mark_paid("alice", invoice.invoice_id).await.unwrap().unwrap();
        match second {
            PaidTransition::AlreadyPaid(paid) => assert_eq!(paid.paid_utc, paid_at),
            other => panic!("expected already paid, got {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_mark_paid_transitions_once() {
        let repo = Arc::new(InMemoryInvoiceRepository::new());
        let invoice = repo.create("alice", &draft("Globex")).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let repo = repo.clone();
                let id = invoice.invoice_id;
                tokio::spawn(async move { repo.mark_paid("alice", id).await })
            })
            .collect();

        let mut transitioned = 0;
        for handle in handles {
            if let Some(PaidTransition::Transitioned(_)) = handle.await.unwrap().unwrap() {
                transitioned += 1;
            }
        }
        assert_eq!(transitioned, 1);
    }
}
