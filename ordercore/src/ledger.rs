use crate::errors::OrderResult;
use ordercore_types::{Quantity, StockDirection, StockLogEntry, StockTarget, StoreTransaction};
use tracing::debug;

/// Append one ledger entry for a stock movement, inside `tx`.
pub(crate) async fn record_movement<T>(
    tx: &mut T,
    target: StockTarget,
    quantity: Quantity,
    direction: StockDirection,
) -> OrderResult<StockLogEntry>
where
    T: StoreTransaction + Send,
{
    let entry = StockLogEntry::record(target, quantity, direction);
    tx.append_stock_log(&entry).await?;
    debug!(
        stock_target = %target,
        quantity = %quantity,
        direction = %direction,
        "[ordercore.ledger.recorded] stock movement logged"
    );
    Ok(entry)
}

/// Ledger movement that takes stock from `current` to `new`, if any.
pub(crate) fn movement_between(current: u32, new: u32) -> Option<(Quantity, StockDirection)> {
    let direction = if new > current {
        StockDirection::In
    } else {
        StockDirection::Out
    };
    Quantity::try_new(current.abs_diff(new))
        .ok()
        .map(|quantity| (quantity, direction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raising_stock_is_an_inbound_movement() {
        let (quantity, direction) = movement_between(4, 10).expect("movement");

        assert_eq!((quantity.get(), direction), (6, StockDirection::In));
    }

    #[test]
    fn lowering_stock_is_an_outbound_movement() {
        let (quantity, direction) = movement_between(10, 3).expect("movement");

        assert_eq!((quantity.get(), direction), (7, StockDirection::Out));
    }

    #[test]
    fn unchanged_stock_is_no_movement() {
        assert_eq!(movement_between(8, 8), None);
    }
}
