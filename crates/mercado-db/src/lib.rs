//! # mercado-db: Database Layer for Mercado POS
//!
//! This crate provides database access for the Mercado POS system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Mercado POS Data Flow                             │
//! │                                                                         │
//! │  Caller (register UI / admin screens / CLI)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    mercado-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ products      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ sales/returns │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ users/reports │    │ ...          │  │   │
//! │  │   │ Management    │    │ expenses/...  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (./mercado.db)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (catalog, sales, reports, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mercado_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./mercado.db")).await?;
//! db.users().ensure_default_admin().await?;
//!
//! let product = db.products().get_by_barcode("7501031310017").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::expense::ExpenseRepository;
pub use repository::import::{ImportReport, ImportRepository};
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::returns::ReturnRepository;
pub use repository::sale::SaleRepository;
pub use repository::user::UserRepository;
