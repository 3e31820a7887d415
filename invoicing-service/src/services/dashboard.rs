//! Summary widgets computed from an owner's invoices.

use crate::dtos::{
    CurrencyTotal, DashboardBlocks, DashboardView, EmptyState, GraphPoint, RecentInvoice,
};
use crate::models::{Currency, Invoice};
use crate::utils::format_currency;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Number of entries in the recent-invoices widget.
pub const RECENT_LIMIT: usize = 7;

/// Window covered by the totals graph, in days.
pub const GRAPH_WINDOW_DAYS: u64 = 30;

/// Build the dashboard for one owner. `invoices` must already be scoped to
/// that owner.
pub fn build_dashboard(invoices: &[Invoice], today: NaiveDate) -> DashboardView {
    if invoices.is_empty() {
        return DashboardView::Empty(EmptyState::default());
    }

    DashboardView::Populated {
        blocks: blocks(invoices),
        graph: paid_graph(invoices, today),
        recent: recent(invoices, RECENT_LIMIT),
    }
}

pub fn blocks(invoices: &[Invoice]) -> DashboardBlocks {
    let paid: Vec<&Invoice> = invoices.iter().filter(|i| i.is_paid()).collect();

    DashboardBlocks {
        total_invoices: invoices.len(),
        paid_invoices: paid.len(),
        pending_invoices: invoices.len() - paid.len(),
        invoiced: currency_totals(invoices.iter()),
        collected: currency_totals(paid.into_iter()),
    }
}

/// Paid invoices created within the graph window, summed per creation day.
pub fn paid_graph(invoices: &[Invoice], today: NaiveDate) -> Vec<GraphPoint> {
    let since = today
        .checked_sub_days(Days::new(GRAPH_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MIN);

    let mut by_day: BTreeMap<NaiveDate, Vec<&Invoice>> = BTreeMap::new();
    for invoice in invoices.iter().filter(|i| i.is_paid()) {
        let day = invoice.created_utc.date_naive();
        if day >= since && day <= today {
            by_day.entry(day).or_default().push(invoice);
        }
    }

    by_day
        .into_iter()
        .map(|(date, day_invoices)| GraphPoint {
            date,
            amounts: currency_totals(day_invoices.into_iter()),
        })
        .collect()
}

/// Most recently created invoices, newest first.
pub fn recent(invoices: &[Invoice], limit: usize) -> Vec<RecentInvoice> {
    let mut sorted: Vec<&Invoice> = invoices.iter().collect();
    sorted.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));

    sorted
        .into_iter()
        .take(limit)
        .map(|invoice| RecentInvoice {
            invoice_id: invoice.invoice_id,
            client_name: invoice.client_name.clone(),
            client_email: invoice.client_email.clone(),
            initials: initials(&invoice.client_name),
            amount: invoice.total,
            currency: invoice.currency,
            formatted: format_currency(invoice.total, invoice.currency),
        })
        .collect()
}

/// First two characters of a name, upper-cased.
pub fn initials(name: &str) -> String {
    name.chars().take(2).flat_map(char::to_uppercase).collect()
}

fn currency_totals<'a>(invoices: impl Iterator<Item = &'a Invoice>) -> Vec<CurrencyTotal> {
    let mut sums: BTreeMap<Currency, Decimal> = BTreeMap::new();
    for invoice in invoices {
        let sum = sums.entry(invoice.currency).or_insert(Decimal::ZERO);
        *sum = sum.checked_add(invoice.total).unwrap_or_else(|| {
            tracing::warn!(
                currency = invoice.currency.as_str(),
                "Currency total overflowed; reporting the maximum"
            );
            Decimal::MAX
        });
    }

    sums.into_iter()
        .map(|(currency, amount)| CurrencyTotal {
            currency,
            amount,
            formatted: format_currency(amount, currency),
        })
        .collect()
}
