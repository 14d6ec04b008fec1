//! Ordered fixed-size batch compression over record streams

use crate::stats::CompressionStats;
use jkc_codec::{compress, CompressOptions};
use jkc_format::{Envelope, JkcError, Result};
use serde_json::Value;
use std::io::{BufRead, BufWriter, Write};

/// Iterator over newline-delimited JSON values
///
/// Blank lines are skipped. Each item is parsed independently, so a bad line
/// yields an error without consuming its neighbours.
pub struct NdjsonRecords<R> {
    reader: R,
    line: String,
    line_no: usize,
}

impl<R: BufRead> NdjsonRecords<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
        }
    }

    /// Number of lines consumed so far
    pub fn line_number(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> Iterator for NdjsonRecords<R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_no += 1;
                    let trimmed = self.line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str(trimmed).map_err(JkcError::from));
                }
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}

/// Compresses a record stream in fixed-size batches
///
/// Every batch is compressed on its own, producing an envelope with its own
/// table. Envelopes are yielded strictly in the order their batches were read,
/// and a batch is only read once the previous envelope has been taken. The
/// iterator stops after the first source error; records already read into
/// that batch are discarded.
pub struct BatchCompressor<I> {
    records: I,
    batch_size: usize,
    options: CompressOptions,
    emitted: usize,
    failed: bool,
}

impl<I> BatchCompressor<I>
where
    I: Iterator<Item = Result<Value>>,
{
    /// Create a batch compressor
    ///
    /// Fails with `InvalidOption` for a zero batch size or invalid options.
    pub fn new(records: I, batch_size: usize, options: CompressOptions) -> Result<Self> {
        if batch_size == 0 {
            return Err(JkcError::InvalidOption(
                "batch size must be at least 1".to_string(),
            ));
        }
        options.validate()?;
        Ok(Self {
            records,
            batch_size,
            options,
            emitted: 0,
            failed: false,
        })
    }

    /// Number of envelopes yielded so far
    pub fn batches_emitted(&self) -> usize {
        self.emitted
    }
}

impl<I> Iterator for BatchCompressor<I>
where
    I: Iterator<Item = Result<Value>>,
{
    type Item = Result<Envelope>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            match self.records.next() {
                Some(Ok(record)) => batch.push(record),
                Some(Err(err)) => {
                    self.failed = true;
                    return Some(Err(err));
                }
                None => break,
            }
        }
        if batch.is_empty() {
            return None;
        }

        let records = batch.len();
        let result = compress(&Value::Array(batch), &self.options);
        match &result {
            Ok(envelope) => {
                tracing::debug!(
                    batch = self.emitted,
                    records,
                    aliases = envelope.table.len(),
                    "compressed batch"
                );
                self.emitted += 1;
            }
            Err(_) => self.failed = true,
        }
        Some(result)
    }
}

/// Compress an NDJSON stream, writing one envelope per line
///
/// `on_batch` is called after each envelope is written with the number of
/// records it held. Returns the accumulated size statistics.
pub fn compress_ndjson<R, W, F>(
    input: R,
    output: W,
    batch_size: usize,
    options: &CompressOptions,
    mut on_batch: F,
) -> Result<CompressionStats>
where
    R: BufRead,
    W: Write,
    F: FnMut(usize),
{
    let mut writer = BufWriter::new(output);
    let mut totals = CompressionStats::default();
    let records = NdjsonRecords::new(input);
    let batches = BatchCompressor::new(records, batch_size, options.clone())?;

    for envelope in batches {
        let envelope = envelope?;
        let wire = envelope.to_value();
        let records = envelope.data.as_array().map_or(1, Vec::len);
        let original = jkc_codec::expand(&envelope);
        let stats = CompressionStats::measure(&original, &wire, envelope.table.len())?;
        totals.accumulate(&stats);

        serde_json::to_writer(&mut writer, &wire)?;
        writer.write_all(b"\n")?;
        on_batch(records);
    }

    writer.flush()?;
    Ok(totals)
}
