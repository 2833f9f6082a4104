use crate::errors::{OrderError, OrderResult};
use ordercore_types::{ProductId, Quantity, StockTarget, VariantId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// One raw line of a client order request. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub quantity: Quantity,
}

/// Identity of an order line: the `(product, variant)` pair.
///
/// A missing variant is its own key, distinct from every variant id.
///
/// Keys are totally ordered by product id, then variant id with `None` sorting
/// last. Reservations follow this order so that concurrent orders touching
/// overlapping rows contend for them in the same sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
}

impl LineKey {
    /// The stock counter this line draws from.
    pub fn stock_target(self) -> StockTarget {
        match self.variant_id {
            Some(variant_id) => StockTarget::Variant {
                product_id: self.product_id,
                variant_id,
            },
            None => StockTarget::Product(self.product_id),
        }
    }
}

impl Ord for LineKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.product_id
            .cmp(&other.product_id)
            .then_with(|| match (self.variant_id, other.variant_id) {
                (Some(left), Some(right)) => left.cmp(&right),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    }
}

impl PartialOrd for LineKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stock_target())
    }
}

/// A deduplicated order line with its summed quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedLine {
    pub key: LineKey,
    pub quantity: Quantity,
}

impl NormalizedLine {
    pub fn product_id(&self) -> ProductId {
        self.key.product_id
    }

    pub fn variant_id(&self) -> Option<VariantId> {
        self.key.variant_id
    }
}

/// Collapse raw requests into one line per `(product, variant)` key.
///
/// Lines keep the position of the first occurrence of their key. Downstream
/// steps never see duplicate keys.
///
/// # Errors
///
/// - `InvalidRequest` if no lines were supplied
/// - `InvalidRequest` if a summed quantity does not fit the quantity range
pub fn normalize_lines(requests: &[OrderLineRequest]) -> OrderResult<Vec<NormalizedLine>> {
    if requests.is_empty() {
        return Err(OrderError::invalid("order must contain at least one line"));
    }

    let mut positions: HashMap<LineKey, usize> = HashMap::with_capacity(requests.len());
    let mut lines: Vec<NormalizedLine> = Vec::with_capacity(requests.len());

    for request in requests {
        let key = LineKey {
            product_id: request.product_id,
            variant_id: request.variant_id,
        };

        match positions.get(&key) {
            Some(&position) => {
                let line = &mut lines[position];
                line.quantity = line.quantity.checked_add(request.quantity).ok_or_else(|| {
                    OrderError::invalid(format!("quantity for {key} is too large"))
                })?;
            }
            None => {
                let _ = positions.insert(key, lines.len());
                lines.push(NormalizedLine {
                    key,
                    quantity: request.quantity,
                });
            }
        }
    }

    Ok(lines)
}
