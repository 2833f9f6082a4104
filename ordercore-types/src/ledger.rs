use crate::catalog::StockTarget;
use crate::ids::{ProductId, StockLogEntryId, VariantId};
use crate::money::Quantity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockDirection {
    In,
    Out,
}

impl StockDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            StockDirection::In => "IN",
            StockDirection::Out => "OUT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "IN" => Some(StockDirection::In),
            "OUT" => Some(StockDirection::Out),
            _ => None,
        }
    }
}

impl fmt::Display for StockDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only audit record of one stock mutation.
///
/// The quantity is always a positive magnitude; the direction carries the sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLogEntry {
    pub id: StockLogEntryId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub quantity: Quantity,
    pub direction: StockDirection,
    pub created_at: DateTime<Utc>,
}

impl StockLogEntry {
    /// Build a fresh entry for a movement against `target`, stamped now.
    pub fn record(target: StockTarget, quantity: Quantity, direction: StockDirection) -> Self {
        Self {
            id: StockLogEntryId::generate(),
            product_id: target.product_id(),
            variant_id: target.variant_id(),
            quantity,
            direction,
            created_at: Utc::now(),
        }
    }

    /// Signed effect of this entry on the stock counter.
    pub fn signed_quantity(&self) -> i64 {
        let magnitude = i64::from(self.quantity.get());
        match self.direction {
            StockDirection::In => magnitude,
            StockDirection::Out => -magnitude,
        }
    }
}
