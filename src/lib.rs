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

//! # Checkout Core
//!
//! This library provides a checkout orchestration engine for storefront
//! carts: cart pricing, idempotent order creation and update, the order
//! status state machine, and reconciliation between a locally cached
//! checkout session and the authoritative server-side order.
//!
//! ## Core Components
//!
//! - [`Cart`]: Session-owned line items with captured effective prices
//! - [`Ledger`]: Authoritative order records and the status state machine
//! - [`PaymentAdapter`]: Translates gateway signals into ledger transitions
//! - [`reconcile`]: Resume/update/create decision on checkout entry
//! - [`CheckoutError`]: Error taxonomy for checkout failures
//!
//! ## Example
//!
//! ```
//! use checkout_core_rs::{
//!     Cart, CatalogProduct, Customer, Ledger, OrderStatus, PaymentMethod, ProductId,
//!     ShippingAddress, ShippingDetails, TransitionProof,
//! };
//! use chrono::Utc;
//! use rust_decimal_macros::dec;
//!
//! let soap = CatalogProduct::new(ProductId::new("soap"), "Black Soap", dec!(500.00));
//! let mut cart = Cart::new();
//! cart.add(&soap, 2, Utc::now());
//!
//! let ledger = Ledger::new();
//! let order = ledger
//!     .create(
//!         cart.snapshot(),
//!         Customer {
//!             name: "Amina Bello".to_string(),
//!             email: "amina@example.com".to_string(),
//!             phone: "+2348012345678".to_string(),
//!         },
//!         ShippingDetails {
//!             address: ShippingAddress {
//!                 address: "12 Marina Road".to_string(),
//!                 city: "Lagos".to_string(),
//!                 state: "Lagos".to_string(),
//!             },
//!             fee: dec!(500.00),
//!         },
//!         PaymentMethod::Gateway,
//!     )
//!     .unwrap();
//! assert_eq!(order.status, OrderStatus::PendingPayment);
//! assert_eq!(order.grand_total, dec!(1500.00));
//!
//! // Provider webhook confirms the charge.
//! let proof = TransitionProof::with_transaction(order.payment_reference.clone(), "txn-1");
//! let completed = ledger
//!     .transition(&order.order_number, OrderStatus::Completed, &proof)
//!     .unwrap();
//! assert_eq!(completed.status, OrderStatus::Completed);
//! ```
//!
//! ## Thread Safety
//!
//! The ledger serializes all mutations of a single order through a
//! per-order lock, so concurrent delivery of a client confirmation and
//! a provider webhook records at most one terminal status per order.

pub mod base;
pub mod cart;
pub mod error;
pub mod fingerprint;
pub mod gateway;
pub mod ledger;
pub mod order;
pub mod pricing;
pub mod session;

pub use base::{Fingerprint, OrderNumber, PaymentReference, ProductId};
pub use cart::{Cart, CartLine, CartSnapshot};
pub use error::{CheckoutError, FieldViolation};
pub use gateway::{
    GatewayClient, GatewayError, PaymentAdapter, RetryPolicy, TrustMode, UnverifiedEvent,
    UnverifiedQueue, VerifiedPayment,
};
pub use ledger::Ledger;
pub use order::{
    Customer, Order, OrderStatus, PaymentMethod, ShippingAddress, ShippingDetails,
    TransitionProof,
};
pub use pricing::{CatalogProduct, PromotionWindow, effective_price};
pub use session::{CheckoutSession, Reconciliation, ReconcileOutcome, reconcile};
