//! Shared validation predicates for domain types.
//!
//! This module contains validation functions used by nutype-based text types
//! across the ordercore crates.

/// Validation predicate: reject control characters.
///
/// Names, attribute labels and address lines are echoed back to clients and
/// printed on shipping labels, so embedded newlines, tabs or NULs are refused.
pub(crate) fn no_control_characters(s: &str) -> bool {
    !s.chars().any(char::is_control)
}
