//! New-item detection between two snapshots

use std::collections::HashSet;

use crate::models::ExtractedItem;

/// Items of `current` whose identity key does not occur in `previous`.
///
/// Items without an identity key are never reported. Output keeps the
/// order of `current`. An item whose key was already seen is not reported
/// even if its other fields changed.
pub fn diff(previous: &[ExtractedItem], current: &[ExtractedItem]) -> Vec<ExtractedItem> {
    let seen: HashSet<&str> = previous.iter().filter_map(ExtractedItem::identity_key).collect();

    current
        .iter()
        .filter(|item| matches!(item.identity_key(), Some(key) if !seen.contains(key)))
        .cloned()
        .collect()
}
