// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Cart management.
//!
//! A cart is an ordered collection of line items owned by one browsing
//! session. Lines are unique per product; insertion order is preserved
//! for display only. Totals are always derived from the lines, never
//! stored alongside them.
//!
//! # Example
//!
//! ```
//! use checkout_core_rs::{Cart, CatalogProduct, ProductId};
//! use chrono::Utc;
//! use rust_decimal_macros::dec;
//!
//! let soap = CatalogProduct::new(ProductId::new("soap"), "Black Soap", dec!(500.00));
//! let mut cart = Cart::new();
//! cart.add(&soap, 2, Utc::now());
//! assert_eq!(cart.total_price(), dec!(1000.00));
//! ```

use crate::base::ProductId;
use crate::pricing::{CatalogProduct, effective_price};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One cart line: a product reference with quantity and the unit price
/// captured when the line was last touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    /// Product name, denormalized for display.
    pub name: String,
    pub quantity: u32,
    /// Effective unit price at the time of the last add/update.
    pub unit_price: Decimal,
    /// Regular unit price, kept for strike-through display.
    pub original_unit_price: Decimal,
}

impl CartLine {
    /// `unit_price * quantity`.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Ordered cart owned by a single browsing session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Adds `quantity` of `product`, merging into an existing line.
    ///
    /// The effective price is captured at this moment; merging into an
    /// existing line re-captures the price for the whole line. A zero
    /// quantity is ignored.
    pub fn add(&mut self, product: &CatalogProduct, quantity: u32, now: DateTime<Utc>) {
        if quantity == 0 {
            return;
        }
        let unit_price = effective_price(product, now);
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity += quantity;
            line.unit_price = unit_price;
            line.original_unit_price = product.base_selling_price;
            return;
        }
        self.lines.push(CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            quantity,
            unit_price,
            original_unit_price: product.base_selling_price,
        });
    }

    /// Sets the quantity of the line for `product`.
    ///
    /// A quantity of zero removes the line. Touching the line re-captures
    /// the effective price. Returns `false` when no line exists for the
    /// product (and the quantity was non-zero).
    pub fn update_quantity(
        &mut self,
        product: &CatalogProduct,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> bool {
        if quantity == 0 {
            return self.remove(&product.id);
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity = quantity;
            line.unit_price = effective_price(product, now);
            line.original_unit_price = product.base_selling_price;
            true
        } else {
            false
        }
    }

    /// Removes the line for `product_id`. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.product_id != product_id);
        self.lines.len() < before
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Sum of all line quantities.
    pub fn total_item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of `unit_price * quantity` over all lines, recomputed on
    /// every call.
    pub fn total_price(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Takes an owned copy of the lines for order creation.
    ///
    /// The snapshot is detached: later cart mutations do not affect it.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
        }
    }
}

/// Detached copy of cart lines handed to the order ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of line totals.
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}
