//! Envelope-level compress, expand and view

use crate::collector::{collect_keys, is_record_array, observed_keys};
use crate::namespace::build_table_with;
use crate::transform::{compress_tree, expand_tree};
use crate::view::{view_tree, ViewValue};
use crate::CompressOptions;
use jkc_format::constants::EXPAND_MAX_DEPTH;
use jkc_format::{Envelope, KeyTable, Result};
use serde_json::Value;

/// Whether compressing `value` can shorten anything
///
/// True for a single record or a non-empty array whose elements are all
/// records. Never fails.
pub fn is_compressible(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => is_record_array(items),
        _ => false,
    }
}

/// Compress a record or array of records into a REST envelope
///
/// Non-compressible input is carried through unchanged with an empty table.
pub fn compress(data: &Value, opts: &CompressOptions) -> Result<Envelope> {
    opts.validate()?;
    let pattern = Some(opts.key_pattern.name().to_string());

    if !is_compressible(data) {
        tracing::debug!("input is not compressible; passing through");
        return Ok(Envelope::new(KeyTable::new(), data.clone(), pattern));
    }

    let names = match data {
        Value::Array(items) => collect_keys(items, opts),
        other => collect_keys(std::slice::from_ref(other), opts),
    };
    let reserved = observed_keys(data, opts.effective_depth().max(EXPAND_MAX_DEPTH));
    let table = build_table_with(&names, &opts.key_pattern, |alias| reserved.contains(alias));
    let renamed = compress_tree(data, &table, opts);

    tracing::debug!(
        candidates = names.len(),
        aliases = table.len(),
        "compressed tree"
    );
    Ok(Envelope::new(table, renamed, pattern))
}

/// Restore canonical names from an envelope
pub fn expand(envelope: &Envelope) -> Value {
    expand_tree(&envelope.data, &envelope.table)
}

/// Parse a wire envelope and expand it
///
/// Fails with `MalformedEnvelope` when `value` is not a well-formed envelope.
pub fn expand_value(value: &Value) -> Result<Value> {
    let envelope = Envelope::from_value(value)?;
    Ok(expand(&envelope))
}

/// Lazy canonical-name view over an envelope's data
pub fn view(envelope: &Envelope) -> ViewValue<'_> {
    view_tree(&envelope.data, &envelope.table)
}
