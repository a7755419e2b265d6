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

use checkout_core_rs::{Ledger, Order, OrderStatus, PaymentReference, TransitionProof};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

/// Settlement Replay - reconcile provider settlements against orders
///
/// Rehydrates the order ledger from a JSONL export of order snapshots,
/// replays a provider settlement CSV through the status state machine,
/// and outputs the final order states to stdout.
#[derive(Parser, Debug)]
#[command(name = "checkout-core-rs")]
#[command(about = "Replays provider settlement files against an order export", long_about = None)]
struct Args {
    /// Path to JSONL file with one order snapshot per line
    #[arg(value_name = "ORDERS")]
    orders: PathBuf,

    /// Path to settlement CSV with columns: order,status,reference,transaction
    #[arg(value_name = "SETTLEMENTS")]
    settlements: PathBuf,
}

fn main() {
    let args = Args::parse();

    let orders_file = match File::open(&args.orders) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening orders file '{}': {}", args.orders.display(), e);
            process::exit(1);
        }
    };

    let ledger = match hydrate_orders(BufReader::new(orders_file)) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("Error reading orders: {}", e);
            process::exit(1);
        }
    };

    let settlements_file = match File::open(&args.settlements) {
        Ok(f) => f,
        Err(e) => {
            eprintln!(
                "Error opening settlements file '{}': {}",
                args.settlements.display(),
                e
            );
            process::exit(1);
        }
    };

    if let Err(e) = replay_settlements(&ledger, BufReader::new(settlements_file)) {
        eprintln!("Error replaying settlements: {}", e);
        process::exit(1);
    }

    if let Err(e) = write_orders(&ledger, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Loads order snapshots from a JSONL reader into a fresh ledger.
///
/// Each line holds one serialized order. Blank lines are skipped;
/// malformed lines are skipped with a note in debug builds, matching
/// the settlement replay policy of never aborting a reconciliation run
/// over individual bad records.
pub fn hydrate_orders<R: BufRead>(reader: R) -> Result<Ledger, std::io::Error> {
    let ledger = Ledger::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Order>(&line) {
            Ok(order) => {
                if !ledger.restore(order) {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping duplicate order snapshot");
                }
            }
            Err(_e) => {
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed order line: {}", _e);
            }
        }
    }

    Ok(ledger)
}

/// Raw CSV record of one settlement row.
///
/// Fields: `order, status, reference, transaction`
#[derive(Debug, Deserialize)]
struct SettlementRecord {
    order: String,
    status: String,
    reference: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    transaction: Option<String>,
}

impl SettlementRecord {
    /// Converts the row into a transition target and proof.
    ///
    /// Returns `None` for unknown statuses.
    fn into_transition(self) -> Option<(checkout_core_rs::OrderNumber, OrderStatus, TransitionProof)> {
        let target = OrderStatus::parse(self.status.to_lowercase().as_str())?;
        let reference = PaymentReference(self.reference);
        let proof = match self.transaction {
            Some(transaction_id) if !transaction_id.is_empty() => {
                TransitionProof::with_transaction(reference, transaction_id)
            }
            _ => TransitionProof::new(reference),
        };
        Some((checkout_core_rs::OrderNumber(self.order), target, proof))
    }
}

/// Replays settlement rows against the ledger.
///
/// Rows that reference unknown orders, carry mismatched references, or
/// target already-finalized orders are skipped; a reconciliation run
/// reports them without stopping.
///
/// # CSV Format
///
/// Expected columns: `order, status, reference, transaction`
/// - `order`: Order number
/// - `status`: Target status (completed, cancelled, pending_confirmation)
/// - `reference`: Payment reference of the attempt
/// - `transaction`: Gateway transaction id (optional except for completed)
pub fn replay_settlements<R: Read>(ledger: &Ledger, reader: R) -> Result<(), csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true) // Allow missing transaction field
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<SettlementRecord>() {
        match result {
            Ok(record) => {
                let Some((order_number, target, proof)) = record.into_transition() else {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping settlement row with unknown status");
                    continue;
                };

                if let Err(_e) = ledger.transition(&order_number, target, &proof) {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping settlement for {}: {}", order_number, _e);
                }
            }
            Err(_e) => {
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed settlement row: {}", _e);
                continue;
            }
        }
    }

    Ok(())
}

/// Writes final order states as CSV.
///
/// Columns: `order, status, grand_total, reference, transaction`
pub fn write_orders<W: Write>(ledger: &Ledger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(["order", "status", "grand_total", "reference", "transaction"])?;

    let mut orders = ledger.orders();
    orders.sort_by(|a, b| a.order_number.0.cmp(&b.order_number.0));

    for order in orders {
        wtr.write_record([
            order.order_number.0.as_str(),
            order.status.as_str(),
            &order.grand_total.to_string(),
            order.payment_reference.0.as_str(),
            order.transaction_id.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
