//! # mercado-core: Pure Business Logic for Mercado POS
//!
//! This crate is the **heart** of Mercado POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Mercado POS Architecture                       │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │        Presentation layer (windows, tickets, exports)         │  │
//! │  │                      — out of scope —                         │  │
//! │  └─────────────────────────────┬─────────────────────────────────┘  │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼─────────────────────────────────┐  │
//! │  │               ★ mercado-core (THIS CRATE) ★                   │  │
//! │  │                                                               │  │
//! │  │  ┌─────────┐ ┌─────────┐ ┌────────┐ ┌─────────┐ ┌──────────┐ │  │
//! │  │  │  types  │ │  money  │ │  cart  │ │ period  │ │validation│ │  │
//! │  │  │ Product │ │  Money  │ │  Cart  │ │DateRange│ │  rules   │ │  │
//! │  │  │  Sale   │ │ (cents) │ │recharge│ │ resolve │ │  checks  │ │  │
//! │  │  └─────────┘ └─────────┘ └────────┘ └─────────┘ └──────────┘ │  │
//! │  │                                                               │  │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS          │  │
//! │  └─────────────────────────────┬─────────────────────────────────┘  │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼─────────────────────────────────┐  │
//! │  │                 mercado-db (Database Layer)                   │  │
//! │  │        SQLite queries, migrations, sale/return/report engines │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, ReturnRecord, Expense, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Checkout cart: stock checks, recharge accumulation, discount
//! - [`period`] - Report window resolution (day/week/month) and date helpers
//! - [`report`] - Plain report result types consumed by the display layer
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod period;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use period::{DateRange, Period};
pub use report::*;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Fixed commission added to the face amount of every airtime recharge,
/// in cents. A $20.00 recharge rings up as $21.00.
pub const RECHARGE_COMMISSION_CENTS: i64 = 100;

/// Stock level at or below which a product counts as "low stock".
/// Non-inventoried products are never reported as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// Maximum quantity of a single item in cart
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum lines allowed in a single cart
pub const MAX_CART_ITEMS: usize = 100;

/// Username of the bootstrap administrator created on an empty user store.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Password of the bootstrap administrator.
///
/// ## Deliberate Weak Default
/// This account exists so a fresh install can be opened at all; it is
/// documented and intended to be changed immediately after first login.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";
