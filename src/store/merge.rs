use std::collections::HashSet;

use crate::models::quotes::Quote;

/// Appends every incoming quote whose key isn't already in `existing` (or earlier in
/// `incoming`), returning the updated collection and how many were appended.
pub fn merge(
    existing: Vec<Quote>,
    incoming: impl IntoIterator<Item = Quote>,
) -> (Vec<Quote>, usize) {
    let mut keys: HashSet<_> = existing.iter().map(Quote::key).collect();
    let mut updated = existing;
    let mut added = 0;

    for quote in incoming {
        if keys.insert(quote.key()) {
            updated.push(quote);
            added += 1;
        }
    }

    (updated, added)
}
