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

//! Session reconciliation.
//!
//! On every checkout entry the reconciler compares the cached
//! [`CheckoutSession`] against the current cart and decides whether to
//! resume the previous order, update it in place, or start a new one.
//! Once an order has reached a terminal status its number is never
//! reused; a changed cart then always produces a brand-new order.

use crate::base::{Fingerprint, OrderNumber, PaymentReference};
use crate::cart::CartSnapshot;
use crate::error::CheckoutError;
use crate::fingerprint;
use crate::ledger::Ledger;
use crate::order::{Customer, Order, OrderStatus, PaymentMethod, ShippingDetails};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Locally cached checkout state, persisted client-side between page
/// loads. All fields are written and cleared together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub order_number: OrderNumber,
    pub fingerprint: Fingerprint,
    pub payment_reference: PaymentReference,
    pub last_known_status: OrderStatus,
}

impl CheckoutSession {
    /// Captures the session fields from an order snapshot.
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_number: order.order_number.clone(),
            fingerprint: order.fingerprint.clone(),
            payment_reference: order.payment_reference.clone(),
            last_known_status: order.status,
        }
    }
}

/// What the reconciler decided to do on checkout entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No usable session; a new order was created.
    Created,
    /// The cached order still matches the cart; continue with it.
    Resumed,
    /// The cached order was still pending and was updated in place.
    Updated,
    /// The cached order was terminal (or cancelled); a new order was
    /// created and the stale session discarded.
    Restarted,
}

/// Result of one reconciliation pass: the decision, the authoritative
/// order, and the fresh session to cache in place of the old one.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub outcome: ReconcileOutcome,
    pub order: Order,
    pub session: CheckoutSession,
}

/// Reconciles the cached session with the current cart on checkout
/// entry.
///
/// - No session, or its order is not retrievable: create a new order.
/// - Fingerprints match and the order is still payable (or already
///   awaiting confirmation / completed): resume it. A matching but
///   cancelled order is restarted - its payment reference was rotated
///   and the attempt can never be paid.
/// - Fingerprints differ and the order is still `pending_payment`:
///   update it in place, keeping the order number.
/// - Fingerprints differ and the order is terminal: start a brand-new
///   order. Once money has moved (or a cancellation was recorded) the
///   prior order number is never reused.
///
/// # Errors
///
/// Propagates [`Ledger::create`]/[`Ledger::update`] failures
/// ([`CheckoutError::EmptyCart`], [`CheckoutError::ValidationFailed`]).
pub fn reconcile(
    ledger: &Ledger,
    snapshot: CartSnapshot,
    customer: Customer,
    shipping: ShippingDetails,
    payment_method: PaymentMethod,
    cached: Option<CheckoutSession>,
) -> Result<Reconciliation, CheckoutError> {
    let current = fingerprint::compute(&snapshot.lines, payment_method);

    let Some(session) = cached else {
        return create(ledger, snapshot, customer, shipping, payment_method, ReconcileOutcome::Created);
    };

    let Some(order) = ledger.get(&session.order_number) else {
        debug!(order = %session.order_number, "cached order not retrievable; starting fresh");
        return create(ledger, snapshot, customer, shipping, payment_method, ReconcileOutcome::Created);
    };

    if session.fingerprint == current {
        if order.status == OrderStatus::Cancelled {
            return create(
                ledger,
                snapshot,
                customer,
                shipping,
                payment_method,
                ReconcileOutcome::Restarted,
            );
        }
        debug!(order = %order.order_number, status = %order.status, "resuming cached checkout");
        let session = CheckoutSession::from_order(&order);
        return Ok(Reconciliation {
            outcome: ReconcileOutcome::Resumed,
            order,
            session,
        });
    }

    if order.status == OrderStatus::PendingPayment {
        let updated = ledger.update(
            &session.order_number,
            snapshot,
            customer,
            shipping,
            payment_method,
        )?;
        let session = CheckoutSession::from_order(&updated);
        return Ok(Reconciliation {
            outcome: ReconcileOutcome::Updated,
            order: updated,
            session,
        });
    }

    create(
        ledger,
        snapshot,
        customer,
        shipping,
        payment_method,
        ReconcileOutcome::Restarted,
    )
}

fn create(
    ledger: &Ledger,
    snapshot: CartSnapshot,
    customer: Customer,
    shipping: ShippingDetails,
    payment_method: PaymentMethod,
    outcome: ReconcileOutcome,
) -> Result<Reconciliation, CheckoutError> {
    let order = ledger.create(snapshot, customer, shipping, payment_method)?;
    let session = CheckoutSession::from_order(&order);
    Ok(Reconciliation {
        outcome,
        order,
        session,
    })
}
