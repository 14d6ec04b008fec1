//! Size accounting for compressed documents

use jkc_format::Result;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::io::{self, Write};

/// Compact serialized sizes before and after compression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CompressionStats {
    /// Bytes of the original document, serialized compactly
    pub original_bytes: usize,
    /// Bytes of the wire envelope, serialized compactly
    pub compressed_bytes: usize,
    /// Number of aliases in the key table
    pub table_entries: usize,
}

impl CompressionStats {
    /// Measure an original document against its wire envelope
    pub fn measure(original: &Value, envelope: &Value, table_entries: usize) -> Result<Self> {
        Ok(Self {
            original_bytes: serialized_len(original)?,
            compressed_bytes: serialized_len(envelope)?,
            table_entries,
        })
    }

    /// Fraction of the original size saved, negative when the envelope is larger
    pub fn savings_ratio(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        1.0 - self.compressed_bytes as f64 / self.original_bytes as f64
    }

    /// Bytes saved, negative when the envelope is larger
    pub fn bytes_saved(&self) -> i64 {
        self.original_bytes as i64 - self.compressed_bytes as i64
    }

    /// Fold another document's numbers into this one
    pub fn accumulate(&mut self, other: &CompressionStats) {
        self.original_bytes += other.original_bytes;
        self.compressed_bytes += other.compressed_bytes;
        self.table_entries += other.table_entries;
    }
}

impl fmt::Display for CompressionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} bytes ({:.1}% saved, {} aliases)",
            self.original_bytes,
            self.compressed_bytes,
            self.savings_ratio() * 100.0,
            self.table_entries
        )
    }
}

/// Length of the compact serialization, without buffering it
pub fn serialized_len(value: &Value) -> Result<usize> {
    let mut counter = ByteCounter(0);
    serde_json::to_writer(&mut counter, value)?;
    Ok(counter.0)
}

struct ByteCounter(usize);

impl Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
