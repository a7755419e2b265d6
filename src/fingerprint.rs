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

//! Checkout fingerprints.
//!
//! A fingerprint is a SHA-256 digest over a stable serialization of the
//! cart lines plus the selected payment method. Lines are sorted by
//! product id and monetary values are rounded and normalized before
//! hashing, so cart insertion order and cosmetic decimal differences
//! (`10.5` vs `10.50`) never invalidate a resumable session.

use crate::base::Fingerprint;
use crate::cart::CartLine;
use crate::order::PaymentMethod;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// Decimal places used when normalizing monetary values for hashing.
const MONEY_DP: u32 = 2;

fn normalized(amount: Decimal) -> String {
    amount.round_dp(MONEY_DP).normalize().to_string()
}

/// Computes the fingerprint of `lines` paid with `method`.
pub fn compute(lines: &[CartLine], method: PaymentMethod) -> Fingerprint {
    let mut sorted: Vec<&CartLine> = lines.iter().collect();
    sorted.sort_by(|a, b| a.product_id.cmp(&b.product_id));

    let mut hasher = Sha256::new();
    for line in &sorted {
        hasher.update(line.product_id.0.as_bytes());
        hasher.update(b"|");
        hasher.update(line.quantity.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(normalized(line.unit_price).as_bytes());
        hasher.update(b";");
    }
    let total: Decimal = sorted.iter().map(|l| l.line_total()).sum();
    hasher.update(normalized(total).as_bytes());
    hasher.update(b"|");
    hasher.update(method.as_str().as_bytes());

    Fingerprint(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::ProductId;
    use rust_decimal_macros::dec;

    fn line(id: &str, quantity: u32, unit_price: Decimal) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            name: id.to_string(),
            quantity,
            unit_price,
            original_unit_price: unit_price,
        }
    }

    #[test]
    fn insertion_order_does_not_change_fingerprint() {
        let a = vec![line("soap", 2, dec!(500.00)), line("oil", 1, dec!(1000.00))];
        let b = vec![line("oil", 1, dec!(1000.00)), line("soap", 2, dec!(500.00))];

        assert_eq!(
            compute(&a, PaymentMethod::Gateway),
            compute(&b, PaymentMethod::Gateway)
        );
    }

    #[test]
    fn trailing_zeros_do_not_change_fingerprint() {
        let a = vec![line("soap", 2, dec!(10.5))];
        let b = vec![line("soap", 2, dec!(10.50))];

        assert_eq!(
            compute(&a, PaymentMethod::Gateway),
            compute(&b, PaymentMethod::Gateway)
        );
    }

    #[test]
    fn quantity_change_changes_fingerprint() {
        let a = vec![line("soap", 2, dec!(500.00))];
        let b = vec![line("soap", 3, dec!(500.00))];

        assert_ne!(
            compute(&a, PaymentMethod::Gateway),
            compute(&b, PaymentMethod::Gateway)
        );
    }

    #[test]
    fn payment_method_changes_fingerprint() {
        let lines = vec![line("soap", 2, dec!(500.00))];

        assert_ne!(
            compute(&lines, PaymentMethod::Gateway),
            compute(&lines, PaymentMethod::BankTransfer)
        );
    }

    #[test]
    fn price_change_changes_fingerprint() {
        let a = vec![line("oil", 1, dec!(1200.00))];
        let b = vec![line("oil", 1, dec!(1000.00))];

        assert_ne!(
            compute(&a, PaymentMethod::Gateway),
            compute(&b, PaymentMethod::Gateway)
        );
    }
}
