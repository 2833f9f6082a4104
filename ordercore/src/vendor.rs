use crate::errors::{OrderError, OrderResult};
use crate::normalize::NormalizedLine;
use crate::validate::ResolvedCatalog;
use ordercore_types::VendorId;
use std::collections::BTreeSet;
use tracing::warn;

/// The one vendor every line of the order resolves to.
///
/// An order always settles to exactly one vendor; lines spanning two or more
/// vendors are rejected before any stock is touched.
pub fn single_vendor(lines: &[NormalizedLine], catalog: &ResolvedCatalog) -> OrderResult<VendorId> {
    let mut vendors = BTreeSet::new();
    for line in lines {
        let _ = vendors.insert(catalog.product(line.product_id())?.vendor_id);
    }

    let mut distinct = vendors.into_iter();
    match (distinct.next(), distinct.next()) {
        (Some(vendor_id), None) => Ok(vendor_id),
        (Some(_), Some(_)) => {
            warn!(
                lines = lines.len(),
                "[ordercore.vendor.multi_vendor] order spans more than one vendor"
            );
            Err(OrderError::invalid("multi-vendor order not allowed"))
        }
        (None, _) => Err(OrderError::invalid("order must contain at least one line")),
    }
}
