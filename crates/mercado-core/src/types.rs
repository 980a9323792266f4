//! # Domain Types
//!
//! Core domain types used throughout Mercado POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐          │
//! │  │    Product    │   │     Sale      │   │ ReturnRecord  │          │
//! │  │ ───────────── │   │ ───────────── │   │ ───────────── │          │
//! │  │ id            │   │ id            │   │ id            │          │
//! │  │ barcode       │   │ created_at    │   │ sale_id (FK)  │          │
//! │  │ price_cents   │   │ total_cents   │   │ refund_cents  │          │
//! │  │ stock, kind   │   │ + SaleItems   │   │ quantity      │          │
//! │  └───────────────┘   └───────────────┘   └───────────────┘          │
//! │                                                                     │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐          │
//! │  │  ProductKind  │   │     Role      │   │ PaymentMethod │          │
//! │  │ ───────────── │   │ ───────────── │   │ ───────────── │          │
//! │  │ Standard      │   │ Admin         │   │ Cash          │          │
//! │  │ NonInventoried│   │ Cashier       │   │ Card          │          │
//! │  └───────────────┘   └───────────────┘   └───────────────┘          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product Kind
// =============================================================================

/// How a product's stock field behaves.
///
/// The airtime-recharge product is distinguished by this explicit flag set
/// at creation time, never by matching its display name. Renaming or
/// localizing the product cannot silently change its behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// Real physical inventory: sales decrement stock, returns restore it.
    Standard,
    /// A service entry (airtime recharge). The stock field is a running
    /// counter, not inventory: sales and returns never touch it, and the
    /// product is excluded from cost, profit-by-product and low-stock math.
    NonInventoried,
}

impl Default for ProductKind {
    fn default() -> Self {
        ProductKind::Standard
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Surrogate identifier (rowid).
    pub id: i64,

    /// Unique business identifier (EAN-13, UPC-A, or an internal code).
    pub barcode: String,

    /// Display name shown to cashier and on the ticket.
    pub name: String,

    /// Free-text description.
    pub description: String,

    /// Sale price in cents.
    pub price_cents: i64,

    /// Purchase cost in cents (for profit calculations).
    pub cost_cents: i64,

    /// Current stock level. Policy keeps this non-negative for standard
    /// products; for non-inventoried products it is a counter.
    pub stock: i64,

    /// Whether stock is real inventory or a counter.
    pub kind: ProductKind,

    /// Optional category reference.
    pub category_id: Option<i64>,
}

impl Product {
    /// Returns the sale price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the purchase cost as a Money type.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// Whether sales and returns move this product's stock.
    #[inline]
    pub fn is_stock_tracked(&self) -> bool {
        self.kind == ProductKind::Standard
    }
}

/// Payload for creating a product (id not yet assigned).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub barcode: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub cost_cents: i64,
    pub stock: i64,
    pub kind: ProductKind,
    pub category_id: Option<i64>,
}

// =============================================================================
// Category
// =============================================================================

/// A product category. Created explicitly or implicitly during bulk import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    /// Unique name.
    pub name: String,
}

// =============================================================================
// Users
// =============================================================================

/// Access role. Admin unlocks the administrative windows; cashiers only
/// ring up sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Cashier,
}

/// A credential record. Only the user store reads the hash field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// User listing row. Listings never expose password hashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
}

// =============================================================================
// Sale
// =============================================================================

/// A completed checkout transaction. Immutable after creation; the only
/// later mutation of its effects is a [`ReturnRecord`].
///
/// ## Invariants
/// - `total_cents = subtotal_cents - discount_cents`
/// - `subtotal_cents = Σ item.subtotal_cents`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
}

/// A line item in a persisted sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    /// Product name at time of sale (frozen). For recharges this carries
    /// the face amount, e.g. "Recarga Celular $20.00".
    pub name_snapshot: String,
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen, decoupled from the
    /// product's current list price).
    pub unit_price_cents: i64,
    /// Line total (unit_price × quantity).
    pub subtotal_cents: i64,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

/// Sale engine input: one line of a checkout, produced by [`crate::Cart`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

/// A sale together with its line items, for ticket reprints and returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleWithItems {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Returns
// =============================================================================

/// Return engine input: one returned line derived from a prior sale's items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnLine {
    pub product_id: i64,
    pub quantity: i64,
    pub refund_cents: i64,
}

/// A persisted return row. One row per returned line; a sale may accumulate
/// several returns over time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReturnRecord {
    pub id: i64,
    /// The sale this return reverses (partially or fully).
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub refund_cents: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Expense
// =============================================================================

/// A cash outflow not tied to inventory purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub amount_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_kind_default() {
        assert_eq!(ProductKind::default(), ProductKind::Standard);
    }

    #[test]
    fn test_stock_tracking_follows_kind() {
        let mut product = Product {
            id: 1,
            barcode: "750103131001".to_string(),
            name: "Lápiz HB #2".to_string(),
            description: String::new(),
            price_cents: 350,
            cost_cents: 150,
            stock: 100,
            kind: ProductKind::Standard,
            category_id: None,
        };
        assert!(product.is_stock_tracked());

        product.kind = ProductKind::NonInventoried;
        assert!(!product.is_stock_tracked());
    }

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&Role::Cashier).unwrap(), "\"cashier\"");
    }
}
