//! Commission aggregation for the partner dashboard
//!
//! Two pieces live here:
//!
//! - [`aggregate`], the pure single-pass calculation that turns a sequence
//!   of orders into a [`CommissionSummary`]
//! - [`OrderLedger`], the ingestion boundary that validates orders before
//!   they can reach the aggregator
//!
//! Validation happens only at the ledger: once an order is in, aggregation
//! is total and cannot fail. All money math uses `rust_decimal`, so totals
//! are exact; rounding to cents is a presentation concern.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::model::{CommissionSummary, Order, OrderStatus};

/// Errors raised when ingesting an order into the ledger
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    /// The order has a negative amount or a rate outside [0, 1]
    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// An order with the same id is already in the ledger
    #[error("order {id} already exists")]
    DuplicateOrder { id: String },
}

/// In-memory order ledger
///
/// The reference implementation hard-codes its orders; this keeps the same
/// fixture behind [`OrderLedger::demo`] but accepts new orders through
/// [`OrderLedger::ingest`], which enforces the shape the aggregator relies
/// on. The aggregator itself never validates.
#[derive(Debug, Clone, Default)]
pub struct OrderLedger {
    orders: Vec<Order>,
}

impl OrderLedger {
    /// Creates an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the three demo orders from the partner portal fixture
    ///
    /// All at $120 and a 20% rate: one paid referral, one paid direct,
    /// one pending referral.
    pub fn demo() -> Self {
        let mut ledger = Self::new();
        let amount = Decimal::new(120, 0);
        let rate = Decimal::new(2, 1); // 0.2
        let fixtures = [
            ("ord_1001", "Smith Family", OrderStatus::Paid, true),
            ("ord_1002", "Nguyen Family", OrderStatus::Paid, false),
            ("ord_1003", "Garcia Family", OrderStatus::Pending, true),
        ];
        for (id, buyer, status, from_referral) in fixtures {
            let order = Order {
                id: id.to_string(),
                buyer_name: buyer.to_string(),
                amount_usd: amount,
                status,
                from_referral,
                commission_rate: rate,
                created_at: chrono::Utc::now(),
            };
            // Fixture values are well-formed, ingest cannot fail here
            ledger.ingest(order).expect("demo fixture rejected");
        }
        ledger
    }

    /// Validates and appends an order
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidOrder`] for an empty id, a negative amount,
    ///   or a commission rate outside [0, 1]
    /// - [`LedgerError::DuplicateOrder`] if the id is already present
    pub fn ingest(&mut self, order: Order) -> Result<(), LedgerError> {
        if order.id.trim().is_empty() {
            return Err(LedgerError::InvalidOrder {
                reason: "order id must not be empty".to_string(),
            });
        }
        if order.amount_usd < Decimal::ZERO {
            return Err(LedgerError::InvalidOrder {
                reason: format!("amount_usd must be >= 0, got {}", order.amount_usd),
            });
        }
        if order.commission_rate < Decimal::ZERO || order.commission_rate > Decimal::ONE {
            return Err(LedgerError::InvalidOrder {
                reason: format!(
                    "commission_rate must be within [0, 1], got {}",
                    order.commission_rate
                ),
            });
        }
        if self.orders.iter().any(|o| o.id == order.id) {
            return Err(LedgerError::DuplicateOrder { id: order.id });
        }

        self.orders.push(order);
        Ok(())
    }

    /// Current ledger contents, in ingestion order
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }
}

/// Computes the partner summary over a sequence of orders
///
/// Single pass; the accumulation is commutative, so iteration order never
/// affects the result. Filtering rules:
///
/// - status = paid contributes to `paid_order_count` and `gross_paid_usd`
///   regardless of referral origin
/// - status = paid AND from_referral additionally contributes to
///   `referred_order_count` and `commission_owed_usd` (amount x rate)
/// - pending and refunded orders contribute nothing
///
/// An empty input yields the all-zero summary. Pure function, recomputed on
/// every read.
pub fn aggregate(orders: &[Order]) -> CommissionSummary {
    let mut summary = CommissionSummary::default();

    for order in orders {
        if order.status != OrderStatus::Paid {
            continue;
        }
        summary.paid_order_count += 1;
        summary.gross_paid_usd += order.amount_usd;

        if order.from_referral {
            summary.referred_order_count += 1;
            summary.commission_owed_usd += order.amount_usd * order.commission_rate;
        }
    }

    summary
}
