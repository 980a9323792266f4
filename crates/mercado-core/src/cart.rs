//! # Checkout Cart
//!
//! The in-progress sale being assembled at the register, before the sale
//! engine commits it.
//!
//! ## Cart Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Cart → Sale Engine                            │
//! │                                                                     │
//! │  Scan barcode ───► add_product(product, qty)                        │
//! │                      │  requested + in_cart ≤ live stock?           │
//! │                      │  no → InsufficientStock                      │
//! │                      ▼                                              │
//! │  Recharge ───────► add_recharge(product, face_cents)                │
//! │                      │  unit = face + $1.00 commission              │
//! │                      │  same unit price already in cart? merge      │
//! │                      ▼                                              │
//! │  Apply discount ─► set_discount_percent(0..=100)                    │
//! │                      ▼                                              │
//! │  Checkout ───────► lines() + discount_cents() → SaleEngine          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock-sufficiency check reads the live stock on the `Product` the
//! caller passes in; it is not a reservation. A single active terminal per
//! data store is assumed.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Product, ProductKind, SaleLine};
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, RECHARGE_COMMISSION_CENTS};

/// One line of the in-progress sale.
///
/// Prices are frozen when the line is created; later catalog edits do not
/// reprice a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: i64,
    /// Display label. For recharges this includes the face amount,
    /// e.g. "Recarga Celular $20.00".
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub kind: ProductKind,
}

impl CartItem {
    /// Line total (unit price × quantity).
    #[inline]
    pub fn subtotal_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Standard lines are unique by product id (re-adding merges quantities)
/// - Recharge lines are unique by (product id, unit price)
/// - Quantities are positive; the discount is a whole percent of 0..=100
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
    discount_percent: i64,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a stock-tracked product, merging with an existing line.
    ///
    /// Fails with [`CoreError::InsufficientStock`] when the requested
    /// quantity plus what the cart already holds exceeds the product's
    /// live stock.
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if product.kind == ProductKind::NonInventoried {
            return Err(CoreError::NotAnInventoryItem {
                name: product.name.clone(),
            });
        }

        let in_cart = self
            .items
            .iter()
            .find(|item| item.product_id == product.id)
            .map(|item| item.quantity)
            .unwrap_or(0);

        if in_cart + quantity > product.stock {
            return Err(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock,
                requested: in_cart + quantity,
            });
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            item.quantity += quantity;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        self.items.push(CartItem {
            product_id: product.id,
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            kind: product.kind,
        });
        Ok(())
    }

    /// Adds one airtime recharge at a caller-chosen face amount.
    ///
    /// The unit price is the face amount plus the fixed commission.
    /// A recharge of the same resulting unit price already in the cart
    /// accumulates into that line instead of creating a duplicate.
    /// Recharges never touch stock here or in the sale engine.
    pub fn add_recharge(&mut self, product: &Product, face_amount_cents: i64) -> CoreResult<()> {
        if product.kind != ProductKind::NonInventoried {
            return Err(CoreError::NotRechargeable {
                name: product.name.clone(),
            });
        }

        if face_amount_cents <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "face amount".to_string(),
            }
            .into());
        }

        let unit_price_cents = face_amount_cents + RECHARGE_COMMISSION_CENTS;

        if let Some(item) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product.id && i.unit_price_cents == unit_price_cents)
        {
            item.quantity += 1;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        self.items.push(CartItem {
            product_id: product.id,
            name: format!("{} {}", product.name, Money::from_cents(face_amount_cents)),
            unit_price_cents,
            quantity: 1,
            kind: product.kind,
        });
        Ok(())
    }

    /// Removes a line by position.
    pub fn remove_line(&mut self, index: usize) -> CoreResult<()> {
        if index >= self.items.len() {
            return Err(CoreError::LineNotFound { index });
        }
        self.items.remove(index);
        Ok(())
    }

    /// Sets the cart-level discount as a whole percent of the subtotal.
    pub fn set_discount_percent(&mut self, percent: i64) -> CoreResult<()> {
        if !(0..=100).contains(&percent) {
            return Err(ValidationError::OutOfRange {
                field: "discount percent".to_string(),
                min: 0,
                max: 100,
            }
            .into());
        }
        self.discount_percent = percent;
        Ok(())
    }

    /// Clears all lines and the discount.
    pub fn clear(&mut self) {
        self.items.clear();
        self.discount_percent = 0;
    }

    /// The lines currently in the cart.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of line subtotals, before discount.
    pub fn subtotal_cents(&self) -> i64 {
        self.items.iter().map(|i| i.subtotal_cents()).sum()
    }

    /// Discount amount derived from the percent, rounded half up.
    pub fn discount_cents(&self) -> i64 {
        Money::from_cents(self.subtotal_cents())
            .percent(self.discount_percent)
            .cents()
    }

    /// Amount to pay: subtotal − discount.
    pub fn total_cents(&self) -> i64 {
        self.subtotal_cents() - self.discount_cents()
    }

    /// Converts the cart into sale engine input.
    pub fn lines(&self) -> Vec<SaleLine> {
        self.items
            .iter()
            .map(|item| SaleLine {
                product_id: item.product_id,
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price_cents,
                subtotal_cents: item.subtotal_cents(),
            })
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pencil(stock: i64) -> Product {
        Product {
            id: 1,
            barcode: "7501031310017".to_string(),
            name: "Lápiz HB #2".to_string(),
            description: String::new(),
            price_cents: 350,
            cost_cents: 150,
            stock,
            kind: ProductKind::Standard,
            category_id: Some(1),
        }
    }

    fn recharge() -> Product {
        Product {
            id: 99,
            barcode: "RECARGA-001".to_string(),
            name: "Recarga Celular".to_string(),
            description: String::new(),
            price_cents: 0,
            cost_cents: 0,
            stock: 0,
            kind: ProductKind::NonInventoried,
            category_id: None,
        }
    }

    #[test]
    fn test_add_and_merge() {
        let mut cart = Cart::new();
        let product = pencil(10);

        cart.add_product(&product, 2).unwrap();
        cart.add_product(&product, 3).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.subtotal_cents(), 5 * 350);
    }

    #[test]
    fn test_insufficient_stock_counts_cart_contents() {
        let mut cart = Cart::new();
        let product = pencil(5);

        cart.add_product(&product, 3).unwrap();
        let err = cart.add_product(&product, 3).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            }
        ));
        // the failed add left the cart unchanged
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn test_sale_on_exhausted_stock_fails() {
        let mut cart = Cart::new();
        let product = pencil(2);
        let err = cart.add_product(&product, 3).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_recharge_price_includes_commission() {
        let mut cart = Cart::new();
        cart.add_recharge(&recharge(), 2000).unwrap();

        let item = &cart.items()[0];
        assert_eq!(item.unit_price_cents, 2100); // $20.00 + $1.00
        assert_eq!(item.name, "Recarga Celular $20.00");
        assert_eq!(cart.subtotal_cents(), 2100);
    }

    #[test]
    fn test_equal_recharges_accumulate() {
        let mut cart = Cart::new();
        let product = recharge();

        cart.add_recharge(&product, 2000).unwrap();
        cart.add_recharge(&product, 2000).unwrap();
        cart.add_recharge(&product, 5000).unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.items()[1].unit_price_cents, 5100);
    }

    #[test]
    fn test_recharge_requires_non_inventoried_kind() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.add_recharge(&pencil(10), 2000),
            Err(CoreError::NotRechargeable { .. })
        ));
        assert!(matches!(
            cart.add_product(&recharge(), 1),
            Err(CoreError::NotAnInventoryItem { .. })
        ));
    }

    #[test]
    fn test_discount_percent() {
        let mut cart = Cart::new();
        cart.add_product(&pencil(10), 2).unwrap(); // $7.00
        cart.set_discount_percent(10).unwrap();

        assert_eq!(cart.subtotal_cents(), 700);
        assert_eq!(cart.discount_cents(), 70);
        assert_eq!(cart.total_cents(), 630);

        assert!(cart.set_discount_percent(101).is_err());
        assert!(cart.set_discount_percent(-1).is_err());
    }

    #[test]
    fn test_lines_carry_frozen_prices() {
        let mut cart = Cart::new();
        let mut product = pencil(10);
        cart.add_product(&product, 1).unwrap();

        // a later catalog reprice does not touch the cart
        product.price_cents = 999;
        let lines = cart.lines();
        assert_eq!(lines[0].unit_price_cents, 350);
        assert_eq!(lines[0].subtotal_cents, 350);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add_product(&pencil(10), 1).unwrap();

        assert!(cart.remove_line(3).is_err());
        cart.remove_line(0).unwrap();
        assert!(cart.is_empty());

        cart.add_product(&pencil(10), 1).unwrap();
        cart.set_discount_percent(50).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.discount_cents(), 0);
    }
}
