//! # Repository Module
//!
//! Database repository implementations for Mercado POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller (UI / CLI / tests)                                             │
//! │       │                                                                 │
//! │       │  db.products().get_by_barcode("7501031310017")                 │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── get_by_barcode(&self, barcode)                                    │
//! │  ├── create(&self, new_product)                                        │
//! │  ├── adjust_stock(&self, id, delta)                                    │
//! │  └── low_stock(&self)                                                  │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • Multi-statement invariants live in one transaction                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD, stock adjustments, low-stock
//! - [`category::CategoryRepository`] - Category management
//! - [`user::UserRepository`] - Credentials, roles, default-admin bootstrap
//! - [`sale::SaleRepository`] - Transactional checkout engine
//! - [`returns::ReturnRepository`] - Transactional return engine
//! - [`expense::ExpenseRepository`] - Expense ledger
//! - [`report::ReportRepository`] - Aggregation queries and the journal
//! - [`import::ImportRepository`] - Bulk catalog import from delimited text

pub mod category;
pub mod expense;
pub mod import;
pub mod product;
pub mod report;
pub mod returns;
pub mod sale;
pub mod user;
