//! Server-wins reconciliation of a local quote list against a remote snapshot.

use std::collections::HashSet;

use shared::domain::{Quote, QuoteId};

/// Combines `local` and `remote` by quote id.
///
/// The result holds every remote quote in remote order, followed by the local
/// quotes the remote did not claim, in their original order. A remote quote
/// replaces a local one with the same id as a whole record. Local quotes
/// without an id are always kept.
pub fn merge_quotes(local: &[Quote], remote: &[Quote]) -> Vec<Quote> {
    let remote_ids: HashSet<QuoteId> = remote.iter().filter_map(|quote| quote.id).collect();

    let mut merged = Vec::with_capacity(remote.len() + local.len());
    merged.extend(remote.iter().cloned());
    merged.extend(
        local
            .iter()
            .filter(|quote| quote.id.map_or(true, |id| !remote_ids.contains(&id)))
            .cloned(),
    );
    merged
}

#[cfg(test)]
#[path = "tests/merge_tests.rs"]
mod tests;
