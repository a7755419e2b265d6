//! Simple REST API server example for the checkout engine.
//!
//! Run with: `cargo run --example server`
//!
//! The adapter runs in client-confirmed trust mode: this deployment has
//! no webhook channel, so a browser-reported success is accepted as
//! sufficient proof. Deployments with a webhook channel should use
//! `TrustMode::WebhookVerified` and a real `GatewayClient`.
//!
//! ## Endpoints
//!
//! - `POST /orders/place` - Create an order from the submitted cart
//! - `POST /orders/{orderNumber}/update` - Replace a pending order's contents
//! - `POST /orders/update-status/{orderNumber}` - Report a payment outcome
//! - `GET /orders/{orderNumber}` - Fetch an order snapshot
//!
//! ## Example Usage
//!
//! ```bash
//! # Place an order
//! curl -X POST http://localhost:3000/orders/place \
//!   -H "Content-Type: application/json" \
//!   -d '{"customer": {"name": "Amina Bello", "email": "amina@example.com", "phone": "+2348012345678"},
//!        "shipping": {"address": "12 Marina Road", "city": "Lagos", "state": "Lagos", "fee": "500.00"},
//!        "lineItems": [{"productId": "soap", "name": "Black Soap", "quantity": 2, "unitPrice": "500.00"}],
//!        "paymentMethod": "gateway"}'
//!
//! # Report payment success
//! curl -X POST http://localhost:3000/orders/update-status/ORD-... \
//!   -H "Content-Type: application/json" \
//!   -d '{"status": "completed", "paymentReference": "PAY-..."}'
//!
//! # Fetch the order
//! curl http://localhost:3000/orders/ORD-...
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use checkout_core_rs::{
    CartLine, CartSnapshot, CheckoutError, Customer, FieldViolation, GatewayClient, GatewayError,
    Ledger, Order, OrderNumber, OrderStatus, PaymentAdapter, PaymentMethod, PaymentReference,
    ProductId, RetryPolicy, ShippingAddress, ShippingDetails, TrustMode, VerifiedPayment,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

// === Request/Response DTOs ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub original_unit_price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRequest {
    pub address: String,
    pub city: String,
    pub state: String,
    pub fee: Decimal,
}

/// Request body for placing or updating an order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub customer: Customer,
    pub shipping: ShippingRequest,
    pub line_items: Vec<LineItemRequest>,
    pub payment_method: PaymentMethod,
}

impl OrderRequest {
    fn into_parts(self) -> (CartSnapshot, Customer, ShippingDetails, PaymentMethod) {
        let lines = self
            .line_items
            .into_iter()
            .map(|item| CartLine {
                product_id: ProductId::new(item.product_id),
                name: item.name,
                quantity: item.quantity,
                unit_price: item.unit_price,
                original_unit_price: item.original_unit_price.unwrap_or(item.unit_price),
            })
            .collect();
        (
            CartSnapshot { lines },
            self.customer,
            ShippingDetails {
                address: ShippingAddress {
                    address: self.shipping.address,
                    city: self.shipping.city,
                    state: self.shipping.state,
                },
                fee: self.shipping.fee,
            },
            self.payment_method,
        )
    }
}

/// Request body for reporting a payment outcome.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: String,
    pub payment_reference: String,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlacedResponse {
    pub order_number: OrderNumber,
    pub payment_reference: PaymentReference,
    pub status: OrderStatus,
}

impl From<Order> for OrderPlacedResponse {
    fn from(order: Order) -> Self {
        Self {
            order_number: order.order_number,
            payment_reference: order.payment_reference,
            status: order.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: OrderStatus,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<FieldViolation>>,
}

// === Gateway stub ===

/// Placeholder gateway for the client-confirmed deployment; never
/// consulted because client reports are trusted directly.
pub struct NoWebhookGateway;

impl GatewayClient for NoWebhookGateway {
    fn verify(&self, _reference: &PaymentReference) -> Result<VerifiedPayment, GatewayError> {
        Err(GatewayError::Unavailable(
            "no verification channel configured".to_string(),
        ))
    }
}

// === Application State ===

/// Shared application state containing the ledger and payment adapter.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub adapter: Arc<PaymentAdapter<NoWebhookGateway>>,
}

// === Error Handling ===

/// Wrapper for converting `CheckoutError` into HTTP responses.
pub struct AppError(CheckoutError);

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CheckoutError::EmptyCart | CheckoutError::ValidationFailed { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CheckoutError::OrderNotFound => StatusCode::NOT_FOUND,
            CheckoutError::NotMutable
            | CheckoutError::InvalidTransition
            | CheckoutError::ReferenceMismatch
            | CheckoutError::AlreadyFinalized => StatusCode::CONFLICT,
            CheckoutError::GatewayUnverified => StatusCode::BAD_GATEWAY,
        };

        let violations = match &self.0 {
            CheckoutError::ValidationFailed { violations } => Some(violations.clone()),
            _ => None,
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: self.0.code().to_string(),
                violations,
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// POST /orders/place - Create an order from the submitted cart.
async fn place_order(
    State(state): State<AppState>,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<OrderPlacedResponse>), AppError> {
    let (snapshot, customer, shipping, method) = request.into_parts();
    let order = state.ledger.create(snapshot, customer, shipping, method)?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// POST /orders/{orderNumber}/update - Replace a pending order's contents.
async fn update_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Json(request): Json<OrderRequest>,
) -> Result<Json<OrderPlacedResponse>, AppError> {
    let (snapshot, customer, shipping, method) = request.into_parts();
    let order = state.ledger.update(
        &OrderNumber(order_number),
        snapshot,
        customer,
        shipping,
        method,
    )?;
    Ok(Json(order.into()))
}

/// POST /orders/update-status/{orderNumber} - Report a payment outcome.
///
/// Serves both the client-confirmation and webhook paths: a body with a
/// transaction id is treated as the provider's signal, one without as
/// the browser's.
async fn update_status(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let order_number = OrderNumber(order_number);
    let reference = PaymentReference(request.payment_reference);
    let target = OrderStatus::parse(&request.status).ok_or(CheckoutError::InvalidTransition)?;

    let order = match (target, request.transaction_id) {
        (OrderStatus::Completed, Some(transaction_id)) => state
            .adapter
            .webhook_charge_succeeded(&order_number, reference, transaction_id)?,
        (OrderStatus::Completed, None) => {
            state.adapter.client_confirmed(&order_number, reference)?
        }
        (OrderStatus::Cancelled, _) => {
            state.adapter.client_cancelled(&order_number, reference)?
        }
        (OrderStatus::PendingConfirmation, _) => state
            .adapter
            .bank_transfer_reported(&order_number, reference)?,
        (OrderStatus::PendingPayment, _) => return Err(CheckoutError::InvalidTransition.into()),
    };

    Ok(Json(StatusResponse {
        status: order.status,
    }))
}

/// GET /orders/{orderNumber} - Fetch an order snapshot for resumption.
async fn get_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<Json<Order>, AppError> {
    state
        .ledger
        .get(&OrderNumber(order_number))
        .map(Json)
        .ok_or_else(|| AppError(CheckoutError::OrderNotFound))
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/orders/place", post(place_order))
        .route("/orders/{order_number}/update", post(update_order))
        .route("/orders/update-status/{order_number}", post(update_status))
        .route("/orders/{order_number}", get(get_order))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let ledger = Arc::new(Ledger::new());
    let adapter = Arc::new(PaymentAdapter::with_config(
        ledger.clone(),
        NoWebhookGateway,
        TrustMode::ClientConfirmed,
        RetryPolicy::default(),
    ));
    let state = AppState { ledger, adapter };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Checkout API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  POST /orders/place                        - Place an order");
    println!("  POST /orders/:orderNumber/update          - Update a pending order");
    println!("  POST /orders/update-status/:orderNumber   - Report a payment outcome");
    println!("  GET  /orders/:orderNumber                 - Fetch an order");

    axum::serve(listener, app).await.unwrap();
}
