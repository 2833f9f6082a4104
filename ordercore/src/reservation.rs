//! Inventory reservation.
//!
//! Each line is reserved by one conditional decrement at the storage layer
//! ("subtract `q` only if stock is at least `q`"). Lines are reserved in
//! [`LineKey`](crate::LineKey) order, never in submission order, so two orders
//! that share rows acquire them in the same sequence and cannot deadlock each
//! other.
//!
//! A failed line aborts the whole order. Nothing here undoes earlier
//! reservations itself: the caller rolls the enclosing transaction back.

use crate::errors::{OrderError, OrderResult};
use crate::ledger::record_movement;
use crate::normalize::NormalizedLine;
use ordercore_types::{StockDirection, StockLogEntry, StoreTransaction};
use tracing::{instrument, warn};

/// Lines in the order their stock rows must be locked.
pub fn reservation_order(lines: &[NormalizedLine]) -> Vec<NormalizedLine> {
    let mut ordered = lines.to_vec();
    ordered.sort_by_key(|line| line.key);
    ordered
}

/// Reserve stock for every line inside `tx`, writing one OUT ledger entry per
/// successful decrement.
///
/// # Errors
///
/// `Conflict` ("insufficient stock") as soon as one line cannot be reserved.
/// The transaction must then be rolled back.
#[instrument(name = "ordercore.reserve_lines", skip_all, fields(lines = lines.len()))]
pub async fn reserve_lines<T>(
    tx: &mut T,
    lines: &[NormalizedLine],
) -> OrderResult<Vec<StockLogEntry>>
where
    T: StoreTransaction + Send,
{
    let mut entries = Vec::with_capacity(lines.len());

    for line in reservation_order(lines) {
        let target = line.key.stock_target();
        if !tx.reserve_stock(target, line.quantity).await? {
            warn!(
                stock_target = %target,
                quantity = %line.quantity,
                "[ordercore.reservation.insufficient_stock] reservation failed"
            );
            return Err(OrderError::conflict(format!("insufficient stock for {target}")));
        }
        entries.push(record_movement(tx, target, line.quantity, StockDirection::Out).await?);
    }

    Ok(entries)
}
