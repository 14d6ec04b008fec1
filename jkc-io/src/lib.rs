//! JKC I/O - Reader/writer level APIs
//!
//! This crate wires the codec to byte streams:
//!
//! - Compress and expand whole JSON documents from `Read` to `Write`
//! - Path-addressed compression of response documents
//! - Ordered fixed-size batch compression of NDJSON streams
//! - Size statistics and envelope inspection

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod stats;

// Re-export commonly used types
pub use batch::{compress_ndjson, BatchCompressor, NdjsonRecords};
pub use jkc_codec::{CompressOptions, NestedHandling, PathOptions};
pub use jkc_format::{Envelope, JkcError, KeyPattern, KeyTable, PathEnvelope, Result, TreePath};
pub use stats::CompressionStats;

use jkc_format::constants::FIELD_DATA;
use jkc_format::is_path_envelope;
use serde_json::{Map, Value};
use std::io::{self, BufWriter, Read, Write};

/// Layout of written JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStyle {
    /// Single line
    #[default]
    Compact,
    /// Indented
    Pretty,
}

/// Read one JSON document
///
/// Input holding several whitespace-separated values (NDJSON) is gathered into
/// an array of those values.
pub fn read_document<R: Read>(mut input: R) -> Result<Value> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;

    let mut values = serde_json::Deserializer::from_str(&text)
        .into_iter::<Value>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    match values.len() {
        0 => Err(JkcError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input contains no JSON document",
        ))),
        1 => Ok(values.remove(0)),
        count => {
            tracing::debug!(count, "read newline-delimited input as an array");
            Ok(Value::Array(values))
        }
    }
}

/// Write one JSON document followed by a newline
pub fn write_document<W: Write>(output: W, value: &Value, style: OutputStyle) -> Result<()> {
    let mut writer = BufWriter::new(output);
    match style {
        OutputStyle::Compact => serde_json::to_writer(&mut writer, value)?,
        OutputStyle::Pretty => serde_json::to_writer_pretty(&mut writer, value)?,
    }
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Compress a JSON document into a REST envelope
pub fn compress_document<R: Read, W: Write>(
    input: R,
    output: W,
    opts: &CompressOptions,
    style: OutputStyle,
) -> Result<CompressionStats> {
    let data = read_document(input)?;
    let envelope = jkc_codec::compress(&data, opts)?;
    let wire = envelope.to_value();
    let stats = CompressionStats::measure(&data, &wire, envelope.table.len())?;
    write_document(output, &wire, style)?;
    Ok(stats)
}

/// Compress every qualifying array of a response document
///
/// A document carrying a top-level `data` field (a GraphQL response) is
/// compressed below that field, and its other top-level fields (`errors`,
/// `extensions`) travel verbatim in the envelope. Anything else is treated as
/// the payload itself.
pub fn compress_paths_document<R: Read, W: Write>(
    input: R,
    output: W,
    opts: &PathOptions,
    style: OutputStyle,
) -> Result<CompressionStats> {
    let document = read_document(input)?;
    let (payload, extra) = split_response(&document);
    let original = if extra.is_empty() { payload } else { &document };

    let envelope = jkc_codec::compress_paths(payload, opts)?.with_extra(extra)?;
    let wire = envelope.to_value();
    let stats = CompressionStats::measure(original, &wire, envelope.meta.table.len())?;
    write_document(output, &wire, style)?;
    Ok(stats)
}

fn split_response(document: &Value) -> (&Value, Map<String, Value>) {
    let Value::Object(map) = document else {
        return (document, Map::new());
    };
    match map.get(FIELD_DATA) {
        Some(payload) => {
            let extra = map
                .iter()
                .filter(|(key, _)| key.as_str() != FIELD_DATA)
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            (payload, extra)
        }
        None => (document, Map::new()),
    }
}

// Payload alone, or the whole response when it carried fields beside `data`
fn restore_response(payload: Value, extra: Map<String, Value>) -> Value {
    if extra.is_empty() {
        return payload;
    }
    let mut response = Map::new();
    response.insert(FIELD_DATA.to_string(), payload);
    response.extend(extra);
    Value::Object(response)
}

/// Expand a REST or path-addressed envelope back into the original document
pub fn expand_document<R: Read, W: Write>(input: R, output: W, style: OutputStyle) -> Result<()> {
    let wire = read_document(input)?;
    let restored = expand_wire(&wire)?;
    write_document(output, &restored, style)
}

/// Expand either envelope kind
///
/// Fails with `MalformedEnvelope` when `wire` is neither.
pub fn expand_wire(wire: &Value) -> Result<Value> {
    if is_path_envelope(wire) {
        let envelope = PathEnvelope::from_value(wire)?;
        let payload = jkc_codec::expand_paths(&envelope)?;
        return Ok(restore_response(payload, envelope.extra));
    }
    jkc_codec::expand_value(wire)
}

/// Which envelope kind a document holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    /// `{marker, version, table, data}`
    Rest,
    /// `{data, meta: {version, table, paths}}`
    PathAddressed,
}

/// Summary of a compressed document
#[derive(Debug, Clone)]
pub struct Inspection {
    /// Envelope kind
    pub kind: EnvelopeKind,
    /// Alias table
    pub table: KeyTable,
    /// Generator name recorded by REST envelopes
    pub pattern: Option<String>,
    /// Located arrays of path-addressed envelopes
    pub paths: Vec<TreePath>,
    /// Expanded size against wire size
    pub stats: CompressionStats,
}

/// Parse an envelope and measure it against its expansion
pub fn inspect_document<R: Read>(input: R) -> Result<Inspection> {
    let wire = read_document(input)?;

    if is_path_envelope(&wire) {
        let envelope = PathEnvelope::from_value(&wire)?;
        let expanded = restore_response(jkc_codec::expand_paths(&envelope)?, envelope.extra);
        let stats = CompressionStats::measure(&expanded, &wire, envelope.meta.table.len())?;
        return Ok(Inspection {
            kind: EnvelopeKind::PathAddressed,
            table: envelope.meta.table,
            pattern: None,
            paths: envelope.meta.paths,
            stats,
        });
    }

    let envelope = Envelope::from_value(&wire)?;
    let expanded = jkc_codec::expand(&envelope);
    let stats = CompressionStats::measure(&expanded, &wire, envelope.table.len())?;
    Ok(Inspection {
        kind: EnvelopeKind::Rest,
        table: envelope.table,
        pattern: envelope.pattern,
        paths: Vec::new(),
        stats,
    })
}
