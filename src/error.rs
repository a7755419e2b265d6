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

//! Error types for checkout processing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single failed field check, reported back to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Dotted path of the offending field, e.g. `shipping.city`.
    pub field: String,
    /// Human-readable message for that field.
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Checkout processing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// Order creation or update was attempted with zero line items
    #[error("cart has no line items")]
    EmptyCart,

    /// Referenced order number does not exist
    #[error("order not found")]
    OrderNotFound,

    /// Edit attempted on an order that already reached a terminal status
    #[error("order is no longer editable")]
    NotMutable,

    /// Requested status change is not permitted from the current status
    #[error("invalid status transition")]
    InvalidTransition,

    /// Proof carries a payment reference that does not match the order
    #[error("payment reference does not match")]
    ReferenceMismatch,

    /// Order was already finalized with a conflicting terminal status
    #[error("order already finalized")]
    AlreadyFinalized,

    /// Payment provider could not be reached to verify the charge
    #[error("payment could not be verified with the gateway")]
    GatewayUnverified,

    /// Required customer or shipping fields are missing or malformed
    #[error("validation failed: {}", join_violations(.violations))]
    ValidationFailed { violations: Vec<FieldViolation> },
}

impl CheckoutError {
    /// Stable machine-readable code for the wire contract.
    pub fn code(&self) -> &'static str {
        match self {
            CheckoutError::EmptyCart => "EMPTY_CART",
            CheckoutError::OrderNotFound => "ORDER_NOT_FOUND",
            CheckoutError::NotMutable => "NOT_MUTABLE",
            CheckoutError::InvalidTransition => "INVALID_TRANSITION",
            CheckoutError::ReferenceMismatch => "REFERENCE_MISMATCH",
            CheckoutError::AlreadyFinalized => "ALREADY_FINALIZED",
            CheckoutError::GatewayUnverified => "GATEWAY_UNVERIFIED",
            CheckoutError::ValidationFailed { .. } => "VALIDATION_FAILED",
        }
    }
}
