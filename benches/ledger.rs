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

//! Benchmarks for the order ledger.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Order placement throughput
//! - Status transitions on existing orders
//! - Parallel placement and completion across many orders
//! - Fingerprint computation on growing carts

use checkout_core_rs::{
    CartLine, CartSnapshot, Customer, Ledger, OrderStatus, PaymentMethod, ProductId,
    ShippingAddress, ShippingDetails, TransitionProof, fingerprint,
};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rayon::prelude::*;
use rust_decimal::Decimal;

// =============================================================================
// Helper Functions
// =============================================================================

fn make_lines(count: usize) -> Vec<CartLine> {
    (0..count)
        .map(|i| CartLine {
            product_id: ProductId::new(format!("product-{i}")),
            name: format!("Product {i}"),
            quantity: (i as u32 % 5) + 1,
            unit_price: Decimal::new(50_000 + i as i64 * 100, 2),
            original_unit_price: Decimal::new(50_000 + i as i64 * 100, 2),
        })
        .collect()
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
        fee: Decimal::new(50_000, 2),
    }
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("create");
    for line_count in [1usize, 5, 20] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::from_parameter(line_count),
            &line_count,
            |b, &count| {
                let ledger = Ledger::new();
                let lines = make_lines(count);
                b.iter(|| {
                    let snapshot = CartSnapshot {
                        lines: lines.clone(),
                    };
                    black_box(
                        ledger
                            .create(
                                snapshot,
                                make_customer(),
                                make_shipping(),
                                PaymentMethod::Gateway,
                            )
                            .unwrap(),
                    )
                });
            },
        );
    }
    group.finish();
}

fn bench_transition(c: &mut Criterion) {
    c.bench_function("transition_completed", |b| {
        let ledger = Ledger::new();
        b.iter_batched(
            || {
                ledger
                    .create(
                        CartSnapshot {
                            lines: make_lines(3),
                        },
                        make_customer(),
                        make_shipping(),
                        PaymentMethod::Gateway,
                    )
                    .unwrap()
            },
            |order| {
                let proof =
                    TransitionProof::with_transaction(order.payment_reference.clone(), "txn-1");
                black_box(
                    ledger
                        .transition(&order.order_number, OrderStatus::Completed, &proof)
                        .unwrap(),
                )
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_parallel_checkout(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_checkout");
    group.throughput(Throughput::Elements(1000));
    group.bench_function("place_and_complete_1000", |b| {
        b.iter(|| {
            let ledger = Ledger::new();
            (0..1000).into_par_iter().for_each(|_| {
                let order = ledger
                    .create(
                        CartSnapshot {
                            lines: make_lines(3),
                        },
                        make_customer(),
                        make_shipping(),
                        PaymentMethod::Gateway,
                    )
                    .unwrap();
                let proof =
                    TransitionProof::with_transaction(order.payment_reference.clone(), "txn-1");
                ledger
                    .transition(&order.order_number, OrderStatus::Completed, &proof)
                    .unwrap();
            });
            black_box(ledger.len())
        });
    });
    group.finish();
}

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");
    for line_count in [1usize, 10, 50] {
        group.bench_with_input(
            BenchmarkId::from_parameter(line_count),
            &line_count,
            |b, &count| {
                let lines = make_lines(count);
                b.iter(|| black_box(fingerprint::compute(&lines, PaymentMethod::Gateway)));
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_create,
    bench_transition,
    bench_parallel_checkout,
    bench_fingerprint
);
criterion_main!(benches);
