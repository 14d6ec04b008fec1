//! Key generators mapping a sequence index to a short alias

use crate::error::{JkcError, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Caller-supplied alias function
pub type CustomGenerator = Arc<dyn Fn(usize) -> String + Send + Sync>;

/// Suffix style appended after a fixed prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixStyle {
    /// `prefix + index`
    Numeric,
    /// `prefix + alpha(index)`
    Alpha,
}

/// Key generator preset or custom function
///
/// Every preset is a total, deterministic function and injective over
/// indices; a custom function is used verbatim.
#[derive(Clone, Default)]
pub enum KeyPattern {
    /// `a`..`z`, `aa`, `ab`, ... (bijective base 26)
    #[default]
    Alpha,
    /// Decimal index
    Numeric,
    /// `a1`..`a9`, `b1`..`b9`, ...
    Alphanumeric,
    /// `_`, then the alpha sequence
    Short,
    /// Fixed prefix followed by a numeric or alpha suffix
    Prefixed {
        /// Literal prefix
        prefix: String,
        /// Suffix style
        style: PrefixStyle,
    },
    /// Caller-supplied function
    Custom(CustomGenerator),
}

impl KeyPattern {
    /// Wrap a function as a custom generator
    pub fn custom<F>(generate: F) -> Self
    where
        F: Fn(usize) -> String + Send + Sync + 'static,
    {
        KeyPattern::Custom(Arc::new(generate))
    }

    /// Produce the alias for `index`
    pub fn generate(&self, index: usize) -> String {
        match self {
            KeyPattern::Alpha => alpha(index),
            KeyPattern::Numeric => index.to_string(),
            KeyPattern::Alphanumeric => alphanumeric(index),
            KeyPattern::Short => short(index),
            KeyPattern::Prefixed { prefix, style } => match style {
                PrefixStyle::Numeric => format!("{prefix}{index}"),
                PrefixStyle::Alpha => format!("{prefix}{}", alpha(index)),
            },
            KeyPattern::Custom(generate) => generate(index),
        }
    }

    /// Generator name recorded in the envelope `pattern` field
    pub fn name(&self) -> &'static str {
        match self {
            KeyPattern::Alpha => "alpha",
            KeyPattern::Numeric => "numeric",
            KeyPattern::Alphanumeric => "alphanumeric",
            KeyPattern::Short => "short",
            KeyPattern::Prefixed { .. } => "prefixed",
            KeyPattern::Custom(_) => "custom",
        }
    }

    /// Whether this pattern can be rebuilt from its textual form
    pub fn is_custom(&self) -> bool {
        matches!(self, KeyPattern::Custom(_))
    }
}

impl fmt::Debug for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPattern::Prefixed { prefix, style } => f
                .debug_struct("Prefixed")
                .field("prefix", prefix)
                .field("style", style)
                .finish(),
            KeyPattern::Custom(_) => f.write_str("Custom(<fn>)"),
            other => f.write_str(other.name()),
        }
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPattern::Prefixed {
                prefix,
                style: PrefixStyle::Numeric,
            } => write!(f, "prefixed:{prefix}"),
            KeyPattern::Prefixed {
                prefix,
                style: PrefixStyle::Alpha,
            } => write!(f, "prefixed-alpha:{prefix}"),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for KeyPattern {
    type Err = JkcError;

    /// Parse `alpha`, `numeric`, `alphanumeric`, `short`,
    /// `prefixed:<prefix>` or `prefixed-alpha:<prefix>`
    fn from_str(s: &str) -> Result<Self> {
        if let Some(prefix) = s.strip_prefix("prefixed-alpha:") {
            return Ok(KeyPattern::Prefixed {
                prefix: prefix.to_string(),
                style: PrefixStyle::Alpha,
            });
        }
        if let Some(prefix) = s.strip_prefix("prefixed:") {
            return Ok(KeyPattern::Prefixed {
                prefix: prefix.to_string(),
                style: PrefixStyle::Numeric,
            });
        }
        match s {
            "alpha" => Ok(KeyPattern::Alpha),
            "numeric" => Ok(KeyPattern::Numeric),
            "alphanumeric" => Ok(KeyPattern::Alphanumeric),
            "short" => Ok(KeyPattern::Short),
            "custom" => Err(JkcError::InvalidOption(
                "custom key patterns must be supplied as a function".to_string(),
            )),
            other => Err(JkcError::InvalidOption(format!(
                "unknown key pattern '{other}' (expected alpha, numeric, alphanumeric, short, prefixed:<p> or prefixed-alpha:<p>)"
            ))),
        }
    }
}

/// Bijective base-26: `0 -> a`, `25 -> z`, `26 -> aa`
pub fn alpha(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    letters.into_iter().map(char::from).collect()
}

/// Letter block of nine followed by digit 1-9
pub fn alphanumeric(index: usize) -> String {
    let block = crate::constants::ALPHANUMERIC_BLOCK;
    format!("{}{}", alpha(index / block), index % block + 1)
}

/// `_` for index 0, alpha of `index - 1` afterwards
pub fn short(index: usize) -> String {
    match index {
        0 => "_".to_string(),
        n => alpha(n - 1),
    }
}
