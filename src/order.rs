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

//! Order entity and status state machine.
//!
//! Statuses:
//! - [`PendingPayment`] → [`PendingConfirmation`] (bank transfer, awaiting
//!   manual review)
//! - [`PendingPayment`] → [`Completed`] (gateway-confirmed)
//! - [`PendingPayment`] → [`Cancelled`] (gateway flow aborted)
//!
//! All three targets are terminal: no client-driven edit or transition
//! leaves them. Cancelling rotates the payment reference so a replayed
//! stale reference can never confirm an abandoned attempt.
//!
//! [`PendingPayment`]: OrderStatus::PendingPayment
//! [`PendingConfirmation`]: OrderStatus::PendingConfirmation
//! [`Completed`]: OrderStatus::Completed
//! [`Cancelled`]: OrderStatus::Cancelled

use crate::base::{Fingerprint, OrderNumber, PaymentReference};
use crate::cart::{CartLine, CartSnapshot};
use crate::error::{CheckoutError, FieldViolation};
use crate::fingerprint;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places of the order currency (kobo precision).
const MONEY_DP: u32 = 2;

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Awaiting payment; the only status that permits edits.
    PendingPayment,
    /// Bank transfer reported, awaiting manual reconciliation.
    PendingConfirmation,
    /// Gateway-confirmed payment.
    Completed,
    /// Payment attempt aborted by the shopper or the gateway.
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::PendingConfirmation => "pending_confirmation",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending_payment" => Some(OrderStatus::PendingPayment),
            "pending_confirmation" => Some(OrderStatus::PendingConfirmation),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether the status permits no further client-driven changes.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::PendingPayment)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the shopper pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Hosted gateway checkout (card, USSD, etc.).
    Gateway,
    /// Manual bank transfer, reconciled out of band.
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Gateway => "gateway",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Customer contact details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Delivery address captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub state: String,
}

/// Shipping address plus the fee quoted upstream for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub address: ShippingAddress,
    pub fee: Decimal,
}

/// Evidence accompanying a status transition: the payment reference of
/// the attempt and, for completions, the gateway transaction id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionProof {
    pub reference: PaymentReference,
    pub transaction_id: Option<String>,
}

impl TransitionProof {
    pub fn new(reference: PaymentReference) -> Self {
        Self {
            reference,
            transaction_id: None,
        }
    }

    pub fn with_transaction(reference: PaymentReference, transaction_id: impl Into<String>) -> Self {
        Self {
            reference,
            transaction_id: Some(transaction_id.into()),
        }
    }
}

/// Authoritative record of one checkout attempt.
///
/// Created once, mutated only through the ledger's operations, never
/// deleted: cancelled and abandoned orders are retained for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_number: OrderNumber,
    pub fingerprint: Fingerprint,
    pub customer: Customer,
    pub shipping_address: ShippingAddress,
    /// Immutable snapshot copied from the cart at creation/update time.
    pub line_items: Vec<CartLine>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub grand_total: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_reference: PaymentReference,
    /// Gateway transaction id, recorded on completion.
    pub transaction_id: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a new order from a cart snapshot, status `PendingPayment`.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`] - the snapshot has zero lines.
    /// - [`CheckoutError::ValidationFailed`] - missing customer or
    ///   shipping fields.
    pub(crate) fn place(
        snapshot: CartSnapshot,
        customer: Customer,
        shipping: ShippingDetails,
        payment_method: PaymentMethod,
    ) -> Result<Self, CheckoutError> {
        if snapshot.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        validate_details(&customer, &shipping)?;

        let now = Utc::now();
        let subtotal = snapshot.subtotal().round_dp(MONEY_DP);
        let shipping_cost = shipping.fee.round_dp(MONEY_DP);
        Ok(Order {
            order_number: OrderNumber::generate(),
            fingerprint: fingerprint::compute(&snapshot.lines, payment_method),
            customer,
            shipping_address: shipping.address,
            line_items: snapshot.lines,
            subtotal,
            shipping_cost,
            grand_total: subtotal + shipping_cost,
            payment_method,
            payment_reference: PaymentReference::generate(),
            transaction_id: None,
            status: OrderStatus::PendingPayment,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the snapshot and fingerprint in place.
    ///
    /// An update whose fingerprint equals the stored one is a no-op and
    /// returns `false` without touching the order. The payment reference
    /// is regenerated when the method moves away from the gateway, so an
    /// in-flight gateway attempt cannot settle an order that is no
    /// longer paying through it.
    pub(crate) fn apply_update(
        &mut self,
        snapshot: CartSnapshot,
        customer: Customer,
        shipping: ShippingDetails,
        payment_method: PaymentMethod,
    ) -> Result<bool, CheckoutError> {
        if self.status.is_terminal() {
            return Err(CheckoutError::NotMutable);
        }

        let next_fingerprint = fingerprint::compute(&snapshot.lines, payment_method);
        if next_fingerprint == self.fingerprint {
            return Ok(false);
        }

        if snapshot.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        validate_details(&customer, &shipping)?;

        if self.payment_method == PaymentMethod::Gateway
            && payment_method != PaymentMethod::Gateway
        {
            self.payment_reference = PaymentReference::generate();
        }

        self.subtotal = snapshot.subtotal().round_dp(MONEY_DP);
        self.shipping_cost = shipping.fee.round_dp(MONEY_DP);
        self.grand_total = self.subtotal + self.shipping_cost;
        self.fingerprint = next_fingerprint;
        self.customer = customer;
        self.shipping_address = shipping.address;
        self.line_items = snapshot.lines;
        self.payment_method = payment_method;
        self.updated_at = Utc::now();
        Ok(true)
    }

    /// Moves the order to `target`, validating the proof.
    ///
    /// Returns `true` when the status changed and `false` for a
    /// tolerated duplicate delivery (already in `target` with matching
    /// proof). The state is left untouched on every error.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::InvalidTransition`] - `target` is not a
    ///   terminal status.
    /// - [`CheckoutError::ReferenceMismatch`] - proof reference differs
    ///   from the reference on the order.
    /// - [`CheckoutError::AlreadyFinalized`] - the order already sits in
    ///   a different terminal status.
    pub(crate) fn apply_transition(
        &mut self,
        target: OrderStatus,
        proof: &TransitionProof,
    ) -> Result<bool, CheckoutError> {
        if target == OrderStatus::PendingPayment {
            return Err(CheckoutError::InvalidTransition);
        }
        if proof.reference != self.payment_reference {
            return Err(CheckoutError::ReferenceMismatch);
        }
        if self.status == target {
            // Duplicate webhook delivery; already applied.
            return Ok(false);
        }
        if self.status.is_terminal() {
            return Err(CheckoutError::AlreadyFinalized);
        }

        match target {
            OrderStatus::Completed => {
                self.transaction_id = proof.transaction_id.clone();
            }
            OrderStatus::Cancelled => {
                // A replayed reference from the aborted attempt must
                // never be able to confirm this order later.
                self.payment_reference = PaymentReference::generate();
            }
            OrderStatus::PendingConfirmation => {}
            OrderStatus::PendingPayment => unreachable!(),
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(true)
    }

    /// Restarts the payment attempt by rotating the reference.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidTransition`] - the order is terminal.
    pub(crate) fn apply_reopen(&mut self) -> Result<(), CheckoutError> {
        if self.status.is_terminal() {
            return Err(CheckoutError::InvalidTransition);
        }
        self.payment_reference = PaymentReference::generate();
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Checks required customer and shipping fields, collecting every
/// violation before failing.
pub(crate) fn validate_details(
    customer: &Customer,
    shipping: &ShippingDetails,
) -> Result<(), CheckoutError> {
    let mut violations = Vec::new();

    if customer.name.trim().is_empty() {
        violations.push(FieldViolation::new("name", "is required"));
    }
    if customer.email.trim().is_empty() {
        violations.push(FieldViolation::new("email", "is required"));
    } else if !customer.email.contains('@') {
        violations.push(FieldViolation::new("email", "must be a valid email address"));
    }
    if customer.phone.trim().is_empty() {
        violations.push(FieldViolation::new("phone", "is required"));
    }
    if shipping.address.address.trim().is_empty() {
        violations.push(FieldViolation::new("shipping.address", "is required"));
    }
    if shipping.address.city.trim().is_empty() {
        violations.push(FieldViolation::new("shipping.city", "is required"));
    }
    if shipping.address.state.trim().is_empty() {
        violations.push(FieldViolation::new("shipping.state", "is required"));
    }
    if shipping.fee < Decimal::ZERO {
        violations.push(FieldViolation::new("shipping.fee", "must not be negative"));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(CheckoutError::ValidationFailed { violations })
    }
}
