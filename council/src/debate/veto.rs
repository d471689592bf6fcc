//! Veto resolution.
//!
//! When several personas veto in the same round, the one registered first
//! is reported. This is an arbitrary but stable tie-break: it says nothing
//! about which veto carries the most weight.

use super::decision::Decision;

/// First decision, in registration order, that is an honoured veto.
///
/// Vetoes from personas without veto power are ignored.
pub fn find_veto(decisions: &[Decision]) -> Option<&Decision> {
    decisions.iter().find(|d| d.is_veto())
}
