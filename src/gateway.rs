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

//! Payment adapter.
//!
//! Translates the two inbound gateway signals into ledger transitions:
//!
//! - **Client confirmation**: browser-reported success or abort.
//!   Untrusted. Under [`TrustMode::WebhookVerified`] a reported success
//!   only triggers an outbound verification call; the order completes
//!   once the provider confirms the charge. [`TrustMode::ClientConfirmed`]
//!   exists for deployments without a webhook channel and accepts the
//!   client report as sufficient proof - an explicit trust trade-off
//!   chosen at construction time.
//! - **Provider webhook**: server-to-server, trusted, carries the real
//!   transaction id. Transitions directly.
//!
//! Outbound verification retries with bounded exponential backoff; an
//! exhausted verification is recorded on the unverified queue for
//! manual reconciliation instead of being dropped, and the order stays
//! `pending_payment`.

use crate::base::{OrderNumber, PaymentReference};
use crate::error::CheckoutError;
use crate::ledger::Ledger;
use crate::order::{Order, OrderStatus, TransitionProof};
use chrono::{DateTime, Utc};
use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Transient failure talking to the payment provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Verification call timed out
    #[error("gateway verification timed out")]
    Timeout,

    /// Provider returned a transport-level failure
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// Provider-verified charge details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayment {
    pub transaction_id: String,
}

/// Outbound verification client for the payment provider.
///
/// Implementations look up a charge by its payment reference. Calls are
/// synchronous; the adapter owns retry and backoff.
pub trait GatewayClient {
    fn verify(&self, reference: &PaymentReference) -> Result<VerifiedPayment, GatewayError>;
}

/// Which signal is allowed to finalize a paid order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustMode {
    /// Only a provider-verified charge completes an order. Client
    /// confirmations trigger a verification call.
    #[default]
    WebhookVerified,
    /// No webhook channel exists; the client confirmation is accepted
    /// as sufficient proof.
    ClientConfirmed,
}

/// Bounded exponential backoff for outbound verification calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles per attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given zero-based failed attempt.
    fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// A verification that exhausted its retries, kept for manual
/// reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnverifiedEvent {
    pub order_number: OrderNumber,
    pub reference: PaymentReference,
    pub attempts: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Queue of unverified payment events with duplicate suppression.
///
/// Combines a [`DashMap`] keyed by payment reference for O(1) duplicate
/// checking with a [`SegQueue`] preserving arrival order for the
/// reconciliation worklist.
#[derive(Debug, Default)]
pub struct UnverifiedQueue {
    events: DashMap<PaymentReference, UnverifiedEvent>,
    arrival: SegQueue<PaymentReference>,
}

impl UnverifiedQueue {
    pub fn new() -> Self {
        Self {
            events: DashMap::new(),
            arrival: SegQueue::new(),
        }
    }

    /// Records an event unless one with the same reference is already
    /// queued. Returns whether the event was recorded.
    pub fn push(&self, event: UnverifiedEvent) -> bool {
        match self.events.entry(event.reference.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                self.arrival.push(event.reference.clone());
                entry.insert(event);
                true
            }
        }
    }

    /// Drains all queued events in arrival order.
    pub fn drain(&self) -> Vec<UnverifiedEvent> {
        let mut drained = Vec::new();
        while let Some(reference) = self.arrival.pop() {
            if let Some((_, event)) = self.events.remove(&reference) {
                drained.push(event);
            }
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Boundary object between the payment gateway and the order ledger.
pub struct PaymentAdapter<G: GatewayClient> {
    ledger: Arc<Ledger>,
    gateway: G,
    trust: TrustMode,
    retry: RetryPolicy,
    unverified: UnverifiedQueue,
}

impl<G: GatewayClient> PaymentAdapter<G> {
    /// Creates an adapter in the default [`TrustMode::WebhookVerified`].
    pub fn new(ledger: Arc<Ledger>, gateway: G) -> Self {
        Self::with_config(ledger, gateway, TrustMode::default(), RetryPolicy::default())
    }

    pub fn with_config(
        ledger: Arc<Ledger>,
        gateway: G,
        trust: TrustMode,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            ledger,
            gateway,
            trust,
            retry,
            unverified: UnverifiedQueue::new(),
        }
    }

    /// Browser-reported payment success.
    ///
    /// Under [`TrustMode::WebhookVerified`] the charge is verified with
    /// the provider first; under [`TrustMode::ClientConfirmed`] the
    /// report alone completes the order.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::GatewayUnverified`] when every verification
    /// attempt failed - the event is then queued for manual
    /// reconciliation and the order stays `pending_payment`. Ledger
    /// transition errors pass through unchanged.
    pub fn client_confirmed(
        &self,
        order_number: &OrderNumber,
        reference: PaymentReference,
    ) -> Result<Order, CheckoutError> {
        match self.trust {
            TrustMode::ClientConfirmed => self.ledger.transition(
                order_number,
                OrderStatus::Completed,
                &TransitionProof::new(reference),
            ),
            TrustMode::WebhookVerified => {
                let verified = self.verify_with_retry(order_number, &reference)?;
                self.ledger.transition(
                    order_number,
                    OrderStatus::Completed,
                    &TransitionProof::with_transaction(reference, verified.transaction_id),
                )
            }
        }
    }

    /// Browser-reported abort: the gateway modal was closed without
    /// completing payment. Cancels the order; the ledger rotates the
    /// payment reference as part of the cancellation.
    pub fn client_cancelled(
        &self,
        order_number: &OrderNumber,
        reference: PaymentReference,
    ) -> Result<Order, CheckoutError> {
        self.ledger.transition(
            order_number,
            OrderStatus::Cancelled,
            &TransitionProof::new(reference),
        )
    }

    /// Shopper reported a manual bank transfer; the order awaits
    /// out-of-band reconciliation.
    pub fn bank_transfer_reported(
        &self,
        order_number: &OrderNumber,
        reference: PaymentReference,
    ) -> Result<Order, CheckoutError> {
        self.ledger.transition(
            order_number,
            OrderStatus::PendingConfirmation,
            &TransitionProof::new(reference),
        )
    }

    /// Trusted provider webhook for a successful charge.
    pub fn webhook_charge_succeeded(
        &self,
        order_number: &OrderNumber,
        reference: PaymentReference,
        transaction_id: impl Into<String>,
    ) -> Result<Order, CheckoutError> {
        self.ledger.transition(
            order_number,
            OrderStatus::Completed,
            &TransitionProof::with_transaction(reference, transaction_id),
        )
    }

    /// Trusted provider webhook for a failed or abandoned charge.
    pub fn webhook_charge_failed(
        &self,
        order_number: &OrderNumber,
        reference: PaymentReference,
    ) -> Result<Order, CheckoutError> {
        self.ledger.transition(
            order_number,
            OrderStatus::Cancelled,
            &TransitionProof::new(reference),
        )
    }

    /// Events that exhausted verification, for the reconciliation
    /// worklist.
    pub fn unverified(&self) -> &UnverifiedQueue {
        &self.unverified
    }

    fn verify_with_retry(
        &self,
        order_number: &OrderNumber,
        reference: &PaymentReference,
    ) -> Result<VerifiedPayment, CheckoutError> {
        let attempts = self.retry.max_attempts.max(1);
        for attempt in 0..attempts {
            match self.gateway.verify(reference) {
                Ok(verified) => return Ok(verified),
                Err(err) => {
                    warn!(
                        order = %order_number,
                        reference = %reference,
                        attempt = attempt + 1,
                        %err,
                        "gateway verification attempt failed"
                    );
                    if attempt + 1 < attempts {
                        std::thread::sleep(self.retry.delay_after(attempt));
                    }
                }
            }
        }

        let recorded = self.unverified.push(UnverifiedEvent {
            order_number: order_number.clone(),
            reference: reference.clone(),
            attempts,
            recorded_at: Utc::now(),
        });
        warn!(
            order = %order_number,
            reference = %reference,
            newly_recorded = recorded,
            "gateway verification exhausted; event queued for manual reconciliation"
        );
        Err(CheckoutError::GatewayUnverified)
    }
}
