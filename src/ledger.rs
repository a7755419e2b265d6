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

//! Order ledger.
//!
//! The [`Ledger`] is the authoritative record of checkout attempts,
//! keyed by order number. It owns the status state machine and all
//! valid transitions.
//!
//! # Concurrency
//!
//! Orders live in a [`DashMap`] of per-order cells, each guarded by its
//! own mutex. Every `update`/`transition`/`reopen` on one order number
//! serializes through that mutex, which yields the required guarantee:
//! at most one successful transition into a terminal status per order.
//! The loser of a race observes the already-applied state - a repeat of
//! the same target with matching proof is a no-op success, a conflicting
//! target fails, and an edit against a finalized order fails. Terminal
//! wins over edit.

use crate::base::OrderNumber;
use crate::cart::CartSnapshot;
use crate::error::CheckoutError;
use crate::order::{
    Customer, Order, OrderStatus, PaymentMethod, ShippingDetails, TransitionProof,
};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use tracing::warn;

/// One ledger slot. The mutex makes all mutations of a single order
/// mutually exclusive.
#[derive(Debug)]
struct OrderCell {
    inner: Mutex<Order>,
}

impl OrderCell {
    fn new(order: Order) -> Self {
        Self {
            inner: Mutex::new(order),
        }
    }
}

/// Authoritative ledger of checkout attempts.
///
/// # Invariants
///
/// - Order numbers are issued once and never reused, even after
///   cancellation.
/// - Only `pending_payment` orders are editable; terminal orders never
///   change again.
/// - At most one transition into a terminal status succeeds per order.
#[derive(Debug, Default)]
pub struct Ledger {
    orders: DashMap<OrderNumber, OrderCell>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Ledger {
            orders: DashMap::new(),
        }
    }

    /// Creates a new order from a cart snapshot, allocating a fresh
    /// order number and payment reference. Status starts at
    /// `pending_payment`.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`] - snapshot has zero lines.
    /// - [`CheckoutError::ValidationFailed`] - missing customer or
    ///   shipping fields.
    pub fn create(
        &self,
        snapshot: CartSnapshot,
        customer: Customer,
        shipping: ShippingDetails,
        payment_method: PaymentMethod,
    ) -> Result<Order, CheckoutError> {
        let order = Order::place(snapshot, customer, shipping, payment_method)?;
        let placed = order.clone();
        self.orders
            .insert(order.order_number.clone(), OrderCell::new(order));
        Ok(placed)
    }

    /// Replaces the snapshot of a still-pending order, keeping its
    /// order number. An update that does not change the fingerprint
    /// returns the order untouched.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::OrderNotFound`] - unknown order number.
    /// - [`CheckoutError::NotMutable`] - order already terminal.
    /// - [`CheckoutError::EmptyCart`] / [`CheckoutError::ValidationFailed`] -
    ///   as for [`Ledger::create`].
    pub fn update(
        &self,
        order_number: &OrderNumber,
        snapshot: CartSnapshot,
        customer: Customer,
        shipping: ShippingDetails,
        payment_method: PaymentMethod,
    ) -> Result<Order, CheckoutError> {
        let cell = self
            .orders
            .get(order_number)
            .ok_or(CheckoutError::OrderNotFound)?;
        let mut order = cell.inner.lock();
        order.apply_update(snapshot, customer, shipping, payment_method)?;
        Ok(order.clone())
    }

    /// Applies a status transition backed by proof.
    ///
    /// A repeated delivery of an already-applied transition (same
    /// target, matching proof) succeeds without changing anything.
    /// `ReferenceMismatch` and `AlreadyFinalized` indicate a replay or
    /// logic problem and are logged for the operator; callers must not
    /// retry them.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::OrderNotFound`] - unknown order number.
    /// - [`CheckoutError::InvalidTransition`] - target is not terminal.
    /// - [`CheckoutError::ReferenceMismatch`] - proof reference differs.
    /// - [`CheckoutError::AlreadyFinalized`] - conflicting terminal
    ///   status already recorded.
    pub fn transition(
        &self,
        order_number: &OrderNumber,
        target: OrderStatus,
        proof: &TransitionProof,
    ) -> Result<Order, CheckoutError> {
        let cell = self
            .orders
            .get(order_number)
            .ok_or(CheckoutError::OrderNotFound)?;
        let mut order = cell.inner.lock();
        match order.apply_transition(target, proof) {
            Ok(_) => Ok(order.clone()),
            Err(err @ CheckoutError::ReferenceMismatch) => {
                warn!(
                    order = %order_number,
                    target = %target,
                    presented = %proof.reference,
                    "transition rejected: payment reference mismatch"
                );
                Err(err)
            }
            Err(err @ CheckoutError::AlreadyFinalized) => {
                warn!(
                    order = %order_number,
                    current = %order.status,
                    target = %target,
                    "transition rejected: order already finalized"
                );
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Restarts the payment attempt of a still-pending order, rotating
    /// its payment reference.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::OrderNotFound`] - unknown order number.
    /// - [`CheckoutError::InvalidTransition`] - order is terminal.
    pub fn reopen(&self, order_number: &OrderNumber) -> Result<Order, CheckoutError> {
        let cell = self
            .orders
            .get(order_number)
            .ok_or(CheckoutError::OrderNotFound)?;
        let mut order = cell.inner.lock();
        order.apply_reopen()?;
        Ok(order.clone())
    }

    /// Returns a snapshot of the order, if present.
    pub fn get(&self, order_number: &OrderNumber) -> Option<Order> {
        self.orders
            .get(order_number)
            .map(|cell| cell.inner.lock().clone())
    }

    /// Rehydrates a previously persisted order, e.g. at boot or in the
    /// settlement replay tool. Returns `false` when the order number is
    /// already present; the existing record wins.
    pub fn restore(&self, order: Order) -> bool {
        match self.orders.entry(order.order_number.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(OrderCell::new(order));
                true
            }
        }
    }

    /// Snapshot of every order in the ledger.
    pub fn orders(&self) -> Vec<Order> {
        self.orders
            .iter()
            .map(|cell| cell.value().inner.lock().clone())
            .collect()
    }

    /// Number of orders in the ledger.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
