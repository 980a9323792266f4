//! # Bulk Catalog Import
//!
//! Loads products from delimited text, one product per line:
//!
//! ```text
//! barcode,name,price,cost,stock,category
//! 7501031310017,Lápiz HB #2,3.50,1.50,100,Papelería
//! 7501031310024,Cuaderno Profesional,25.00,15.00,40,Papelería
//! ```
//!
//! - Prices are decimal pesos and are parsed to cents without floats
//! - The category column is optional; unknown names are created on the fly
//! - Bad lines and duplicate barcodes are skipped and reported, they never
//!   abort the rest of the batch

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::category::CategoryRepository;
use crate::repository::product::ProductRepository;
use mercado_core::{NewProduct, ProductKind};

/// Outcome of one import batch.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Products inserted.
    pub created: usize,
    /// Lines skipped (parse failure or duplicate barcode).
    pub skipped: usize,
    /// One message per skipped line, with its 1-based line number.
    pub errors: Vec<String>,
}

/// Bulk catalog importer.
#[derive(Debug, Clone)]
pub struct ImportRepository {
    pool: SqlitePool,
}

impl ImportRepository {
    /// Creates a new ImportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ImportRepository { pool }
    }

    /// Imports products from comma-delimited text.
    ///
    /// Blank lines are ignored. Every other line either becomes a product
    /// or an entry in [`ImportReport::errors`].
    pub async fn import_text(&self, text: &str) -> DbResult<ImportReport> {
        let products = ProductRepository::new(self.pool.clone());
        let categories = CategoryRepository::new(self.pool.clone());

        let mut report = ImportReport::default();

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let parsed = match parse_line(line) {
                Ok(parsed) => parsed,
                Err(reason) => {
                    report.skipped += 1;
                    report.errors.push(format!("line {line_no}: {reason}"));
                    continue;
                }
            };

            let category_id = match &parsed.category {
                Some(name) => Some(categories.find_or_create(name).await?.id),
                None => None,
            };

            let new = NewProduct {
                barcode: parsed.barcode,
                name: parsed.name,
                description: String::new(),
                price_cents: parsed.price_cents,
                cost_cents: parsed.cost_cents,
                stock: parsed.stock,
                kind: ProductKind::Standard,
                category_id,
            };

            match products.create(&new).await {
                Ok(product) => {
                    debug!(barcode = %product.barcode, "Imported product");
                    report.created += 1;
                }
                Err(DbError::UniqueViolation { .. }) => {
                    report.skipped += 1;
                    report
                        .errors
                        .push(format!("line {line_no}: barcode '{}' already exists", new.barcode));
                }
                Err(DbError::Validation(e)) => {
                    report.skipped += 1;
                    report.errors.push(format!("line {line_no}: {e}"));
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            created = report.created,
            skipped = report.skipped,
            "Import batch finished"
        );
        Ok(report)
    }
}

struct ParsedLine {
    barcode: String,
    name: String,
    price_cents: i64,
    cost_cents: i64,
    stock: i64,
    category: Option<String>,
}

/// Parses one `barcode,name,price,cost,stock[,category]` line.
fn parse_line(line: &str) -> Result<ParsedLine, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if !(5..=6).contains(&fields.len()) {
        return Err(format!("expected 5 or 6 fields, got {}", fields.len()));
    }

    let price_cents = parse_money(fields[2]).ok_or_else(|| format!("bad price '{}'", fields[2]))?;
    let cost_cents = parse_money(fields[3]).ok_or_else(|| format!("bad cost '{}'", fields[3]))?;
    let stock: i64 = fields[4]
        .parse()
        .map_err(|_| format!("bad stock '{}'", fields[4]))?;

    let category = fields
        .get(5)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    Ok(ParsedLine {
        barcode: fields[0].to_string(),
        name: fields[1].to_string(),
        price_cents,
        cost_cents,
        stock,
        category,
    })
}

/// Parses a decimal money string ("25", "25.5", "$25.50") to cents.
///
/// Integer arithmetic only: "0.1" is exactly 10 cents here, never
/// 9.9999... like a float round-trip could produce.
fn parse_money(raw: &str) -> Option<i64> {
    let raw = raw.trim().trim_start_matches('$');
    if raw.is_empty() {
        return None;
    }

    let (whole, frac) = match raw.split_once('.') {
        Some((w, f)) => (w, f),
        None => (raw, ""),
    };

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    if whole < 0 {
        return None;
    }

    let cents = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        2 => frac.parse::<i64>().ok()?,
        _ => return None,
    };
    if cents < 0 {
        return None;
    }

    Some(whole * 100 + cents)
}

// =============================================================================
// Unit Tests
// =============================================================================
