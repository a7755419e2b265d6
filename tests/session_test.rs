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

//! Session reconciliation integration tests.

use checkout_core_rs::{
    CartLine, CartSnapshot, CheckoutSession, Customer, Ledger, OrderStatus, PaymentMethod,
    ProductId, ReconcileOutcome, ShippingAddress, ShippingDetails, TransitionProof, reconcile,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn make_line(id: &str, quantity: u32, unit_price: Decimal) -> CartLine {
    CartLine {
        product_id: ProductId::new(id),
        name: id.to_string(),
        quantity,
        unit_price,
        original_unit_price: unit_price,
    }
}

fn small_cart() -> CartSnapshot {
    CartSnapshot {
        lines: vec![make_line("soap", 2, dec!(500.00))],
    }
}

fn bigger_cart() -> CartSnapshot {
    CartSnapshot {
        lines: vec![
            make_line("soap", 2, dec!(500.00)),
            make_line("oil", 1, dec!(1200.00)),
        ],
    }
}

fn make_customer() -> Customer {
    Customer {
        name: "Amina Bello".to_string(),
        email: "amina@example.com".to_string(),
        phone: "+2348012345678".to_string(),
    }
}

fn make_shipping() -> ShippingDetails {
    ShippingDetails {
        address: ShippingAddress {
            address: "12 Marina Road".to_string(),
            city: "Lagos".to_string(),
            state: "Lagos".to_string(),
        },
        fee: dec!(500.00),
    }
}

#[test]
fn no_session_creates_a_new_order() {
    let ledger = Ledger::new();
    let result = reconcile(
        &ledger,
        small_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::Gateway,
        None,
    )
    .unwrap();

    assert_eq!(result.outcome, ReconcileOutcome::Created);
    assert_eq!(result.order.status, OrderStatus::PendingPayment);
    assert_eq!(result.session.order_number, result.order.order_number);
    assert_eq!(result.session.fingerprint, result.order.fingerprint);
}

#[test]
fn unretrievable_order_creates_a_new_one() {
    let ledger = Ledger::new();
    // Session left over from a ledger that no longer has the order.
    let first = reconcile(
        &ledger,
        small_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::Gateway,
        None,
    )
    .unwrap();
    let stale = CheckoutSession {
        order_number: checkout_core_rs::OrderNumber("ORD-evicted".to_string()),
        ..first.session
    };

    let result = reconcile(
        &ledger,
        small_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::Gateway,
        Some(stale),
    )
    .unwrap();

    assert_eq!(result.outcome, ReconcileOutcome::Created);
    assert_ne!(result.order.order_number, first.order.order_number);
}

#[test]
fn unchanged_cart_resumes_pending_order() {
    let ledger = Ledger::new();
    let first = reconcile(
        &ledger,
        small_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::Gateway,
        None,
    )
    .unwrap();

    let result = reconcile(
        &ledger,
        small_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::Gateway,
        Some(first.session.clone()),
    )
    .unwrap();

    assert_eq!(result.outcome, ReconcileOutcome::Resumed);
    assert_eq!(result.order.order_number, first.order.order_number);
    assert_eq!(result.session.payment_reference, first.session.payment_reference);
    assert_eq!(ledger.len(), 1);
}

#[test]
fn changed_cart_updates_pending_order_in_place() {
    let ledger = Ledger::new();
    let first = reconcile(
        &ledger,
        small_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::Gateway,
        None,
    )
    .unwrap();

    let result = reconcile(
        &ledger,
        bigger_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::Gateway,
        Some(first.session.clone()),
    )
    .unwrap();

    assert_eq!(result.outcome, ReconcileOutcome::Updated);
    assert_eq!(result.order.order_number, first.order.order_number);
    assert_eq!(result.order.status, OrderStatus::PendingPayment);
    assert_eq!(result.order.subtotal, dec!(2200.00));
    assert_ne!(result.session.fingerprint, first.session.fingerprint);
    assert_eq!(ledger.len(), 1);
}

#[test]
fn changed_payment_method_counts_as_changed_intent() {
    let ledger = Ledger::new();
    let first = reconcile(
        &ledger,
        small_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::Gateway,
        None,
    )
    .unwrap();

    let result = reconcile(
        &ledger,
        small_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::BankTransfer,
        Some(first.session.clone()),
    )
    .unwrap();

    assert_eq!(result.outcome, ReconcileOutcome::Updated);
    assert_eq!(result.order.order_number, first.order.order_number);
    assert_eq!(result.order.payment_method, PaymentMethod::BankTransfer);
}

#[test]
fn changed_cart_after_completion_starts_a_new_order() {
    let ledger = Ledger::new();
    let first = reconcile(
        &ledger,
        small_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::Gateway,
        None,
    )
    .unwrap();
    ledger
        .transition(
            &first.order.order_number,
            OrderStatus::Completed,
            &TransitionProof::with_transaction(first.order.payment_reference.clone(), "txn-1"),
        )
        .unwrap();

    let result = reconcile(
        &ledger,
        bigger_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::Gateway,
        Some(first.session.clone()),
    )
    .unwrap();

    // Money has moved; the prior order number is never reused.
    assert_eq!(result.outcome, ReconcileOutcome::Restarted);
    assert_ne!(result.order.order_number, first.order.order_number);
    assert_eq!(result.order.status, OrderStatus::PendingPayment);
    assert_eq!(ledger.len(), 2);

    let completed = ledger.get(&first.order.order_number).unwrap();
    assert_eq!(completed.status, OrderStatus::Completed);
}

#[test]
fn unchanged_cart_after_completion_resumes_for_status_display() {
    let ledger = Ledger::new();
    let first = reconcile(
        &ledger,
        small_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::Gateway,
        None,
    )
    .unwrap();
    ledger
        .transition(
            &first.order.order_number,
            OrderStatus::Completed,
            &TransitionProof::with_transaction(first.order.payment_reference.clone(), "txn-1"),
        )
        .unwrap();

    let result = reconcile(
        &ledger,
        small_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::Gateway,
        Some(first.session.clone()),
    )
    .unwrap();

    // No duplicate order for money that already moved.
    assert_eq!(result.outcome, ReconcileOutcome::Resumed);
    assert_eq!(result.order.order_number, first.order.order_number);
    assert_eq!(result.session.last_known_status, OrderStatus::Completed);
    assert_eq!(ledger.len(), 1);
}

#[test]
fn cancelled_order_restarts_even_with_unchanged_cart() {
    let ledger = Ledger::new();
    let first = reconcile(
        &ledger,
        small_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::Gateway,
        None,
    )
    .unwrap();
    ledger
        .transition(
            &first.order.order_number,
            OrderStatus::Cancelled,
            &TransitionProof::new(first.order.payment_reference.clone()),
        )
        .unwrap();

    let result = reconcile(
        &ledger,
        small_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::Gateway,
        Some(first.session.clone()),
    )
    .unwrap();

    // The cancelled attempt's reference was rotated; it can never be
    // paid. A fresh order carries the new attempt.
    assert_eq!(result.outcome, ReconcileOutcome::Restarted);
    assert_ne!(result.order.order_number, first.order.order_number);
    assert_eq!(ledger.len(), 2);
}

#[test]
fn session_tracks_rotated_reference_after_update_away_from_gateway() {
    let ledger = Ledger::new();
    let first = reconcile(
        &ledger,
        small_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::Gateway,
        None,
    )
    .unwrap();

    let result = reconcile(
        &ledger,
        small_cart(),
        make_customer(),
        make_shipping(),
        PaymentMethod::BankTransfer,
        Some(first.session.clone()),
    )
    .unwrap();

    assert_ne!(
        result.session.payment_reference,
        first.session.payment_reference
    );
}
