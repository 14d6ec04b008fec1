//! Deterministic alias table construction

use jkc_format::{KeyPattern, KeyTable};
use std::collections::BTreeSet;

/// Assign generated aliases to sorted candidate names
///
/// The i-th name in lexicographic order is offered `pattern.generate(i)`; the
/// pair is kept only when the alias is strictly shorter than the name.
pub fn build_table(names: &BTreeSet<String>, pattern: &KeyPattern) -> KeyTable {
    build_table_with(names, pattern, |_| false)
}

/// [`build_table`] that also refuses aliases for which `is_reserved` holds
///
/// Callers pass the set of key names already present in the data so that an
/// alias can never collide with a key left verbatim.
pub fn build_table_with<F>(names: &BTreeSet<String>, pattern: &KeyPattern, is_reserved: F) -> KeyTable
where
    F: Fn(&str) -> bool,
{
    let mut table = KeyTable::new();
    for (index, name) in names.iter().enumerate() {
        let alias = pattern.generate(index);
        if alias.chars().count() >= name.chars().count() {
            continue;
        }
        if is_reserved(&alias) {
            tracing::trace!(%name, %alias, "alias collides with an existing key");
            continue;
        }
        if !table.insert(name.as_str(), alias.as_str()) {
            tracing::debug!(%name, %alias, "generator repeated an alias; keeping canonical name");
        }
    }
    tracing::debug!(
        candidates = names.len(),
        entries = table.len(),
        pattern = pattern.name(),
        "built key table"
    );
    table
}
