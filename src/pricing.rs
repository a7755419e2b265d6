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

//! Effective price computation for catalog products.
//!
//! A product may carry a time-bounded promotional price. The effective
//! price is evaluated at the moment a cart line is touched, never
//! re-evaluated continuously: a captured line price stays stable until
//! the line is mutated again or the order snapshot is taken.

use crate::base::ProductId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Time-bounded promotional price attached to a catalog product.
///
/// Read-only to this crate; maintained by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionWindow {
    /// Discounted unit price while the window applies.
    pub promo_price: Option<Decimal>,
    /// Inclusive start of the window; `None` means unbounded.
    pub starts_at: Option<DateTime<Utc>>,
    /// Inclusive end of the window; `None` means unbounded.
    pub ends_at: Option<DateTime<Utc>>,
    /// Merchant toggle for the promotion.
    pub is_active: bool,
}

impl PromotionWindow {
    /// Whether the promotional price applies at `now`.
    ///
    /// A window with no price is never applicable even when flagged
    /// active, and a window whose start lies after its end is treated
    /// as never active. Both bounds are inclusive.
    pub fn applies_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active || self.promo_price.is_none() {
            return false;
        }
        if let (Some(starts), Some(ends)) = (self.starts_at, self.ends_at) {
            if starts > ends {
                return false;
            }
        }
        if self.starts_at.is_some_and(|starts| now < starts) {
            return false;
        }
        if self.ends_at.is_some_and(|ends| now > ends) {
            return false;
        }
        true
    }
}

/// Catalog view of a product, as consumed by the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    /// Regular unit price before any promotion.
    pub base_selling_price: Decimal,
    pub promotion: Option<PromotionWindow>,
}

impl CatalogProduct {
    pub fn new(id: ProductId, name: impl Into<String>, base_selling_price: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            base_selling_price,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, promotion: PromotionWindow) -> Self {
        self.promotion = Some(promotion);
        self
    }
}

/// Returns the unit price of `product` effective at `now`.
pub fn effective_price(product: &CatalogProduct, now: DateTime<Utc>) -> Decimal {
    match &product.promotion {
        Some(window) if window.applies_at(now) => {
            window.promo_price.unwrap_or(product.base_selling_price)
        }
        _ => product.base_selling_price,
    }
}
