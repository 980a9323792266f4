//! # Report Types
//!
//! Plain structured results produced by the reporting engine. No currency
//! symbols, no locale strings - the presentation layer renders these
//! however it likes.
//!
//! All figures are integer cents. An empty report window is not an error:
//! it yields zero-valued aggregates and empty lists.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Sales Report
// =============================================================================

/// Units sold per product (top-seller rows).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUnits {
    pub name: String,
    pub units: i64,
}

/// Sales figures for a period.
///
/// `gross_cents` counts what was rung up before discounts; net sales
/// subtract both the discounts given and the refunds paid out:
/// `net_sales_cents = gross_cents - discount_cents - returns_cents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReport {
    pub gross_cents: i64,
    pub discount_cents: i64,
    pub returns_cents: i64,
    pub net_sales_cents: i64,
    pub ticket_count: i64,
    /// Top 5 products by units sold, excluding non-inventoried products.
    pub top_products: Vec<ProductUnits>,
}

// =============================================================================
// Profit Report
// =============================================================================

/// Estimated profit breakdown for a period.
///
/// Recharges have no cost basis: their profit is the fixed commission per
/// unit sold, reported separately from goods profit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitReport {
    /// Revenue before discounts.
    pub gross_revenue_cents: i64,
    /// Σ(quantity × purchase cost) over stock-tracked lines in range.
    pub cost_of_goods_cents: i64,
    pub discount_cents: i64,
    pub returns_cents: i64,
    pub expenses_cents: i64,
    /// Revenue from recharge lines (face amounts + commissions).
    pub recharge_revenue_cents: i64,
    /// Pure recharge profit: units sold × fixed commission.
    pub recharge_profit_cents: i64,
    /// (gross − discounts) − returns − expenses.
    pub net_profit_cents: i64,
}

// =============================================================================
// Cash Balance
// =============================================================================

/// Estimated cash-drawer position for a period.
///
/// The starting balance is injected by the caller; the engine never reads
/// configuration itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashBalanceReport {
    pub starting_cents: i64,
    pub net_sales_cents: i64,
    pub returns_cents: i64,
    pub expenses_cents: i64,
    /// starting + net sales − returns − expenses.
    pub ending_cents: i64,
}

// =============================================================================
// Journal
// =============================================================================

/// What kind of ledger row a journal entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalKind {
    Sale,
    Expense,
    Return,
}

/// One row of the unified chronological ledger view.
///
/// `source_id` is the row id within its own table so the display layer can
/// drill back (e.g. reprint a sale's ticket). Return rows also carry the
/// original sale id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub at: DateTime<Utc>,
    pub kind: JournalKind,
    pub source_id: i64,
    /// For returns: the sale being reversed.
    pub sale_id: Option<i64>,
    /// For expenses: the recorded description.
    pub detail: Option<String>,
    /// Positive for sales, negative for expenses and returns.
    pub amount_cents: i64,
}

// =============================================================================
// Breakdowns & Trends
// =============================================================================

/// Revenue grouped by category for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRevenue {
    /// Category name; uncategorized products group under "Sin Categoría".
    pub category: String,
    pub revenue_cents: i64,
}

/// Revenue grouped by product for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRevenue {
    pub name: String,
    pub revenue_cents: i64,
}

/// Total sales for one calendar day of the trend window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub total_cents: i64,
}

/// Headline numbers for the dashboard cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub net_sales_today_cents: i64,
    pub tickets_today: i64,
    /// Stock-tracked products at or below the low-stock threshold.
    pub low_stock_count: i64,
}
