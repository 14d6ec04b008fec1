//! TOML configuration file support
//!
//! A config file mirrors the compress flags:
//!
//! ```toml
//! min_key_length = 4
//! max_depth = 6
//! pattern = "alphanumeric"
//! nested = "arrays"
//! homogeneous_only = true
//! exclude = ["id"]
//! include = ["ts"]
//!
//! [graphql]
//! min_array_length = 3
//! exclude_paths = ["data.viewer"]
//! ```
//!
//! Command-line flags override file values; list flags extend the file lists.

use jkc_codec::{CompressOptions, NestedHandling, PathOptions};
use jkc_format::{JkcError, KeyPattern, Result, TreePath};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// File-level compression settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    pub min_key_length: Option<usize>,
    pub max_depth: Option<usize>,
    pub pattern: Option<String>,
    pub nested: Option<String>,
    pub homogeneous_only: Option<bool>,
    pub exclude: Vec<String>,
    pub include: Vec<String>,
    pub graphql: GraphqlConfig,
}

/// Settings used only by path-addressed compression
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphqlConfig {
    pub min_array_length: Option<usize>,
    pub exclude_paths: Vec<String>,
}

impl CompressConfig {
    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text).map_err(|err| match err {
            JkcError::Config(reason) => {
                JkcError::Config(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })
    }

    /// Parse config text
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| JkcError::Config(err.to_string()))
    }

    /// Resolve into codec options, validating every string setting
    pub fn to_options(&self) -> Result<CompressOptions> {
        let defaults = CompressOptions::default();
        let key_pattern = match &self.pattern {
            Some(name) => name.parse::<KeyPattern>()?,
            None => defaults.key_pattern,
        };
        let nested_handling = match &self.nested {
            Some(mode) => mode.parse::<NestedHandling>()?,
            None => defaults.nested_handling,
        };

        let options = CompressOptions {
            min_key_length: self.min_key_length.unwrap_or(defaults.min_key_length),
            max_depth: self.max_depth.unwrap_or(defaults.max_depth),
            key_pattern,
            nested_handling,
            homogeneous_only: self.homogeneous_only.unwrap_or(defaults.homogeneous_only),
            exclude_keys: self.exclude.iter().cloned().collect(),
            include_keys: self.include.iter().cloned().collect(),
        };
        options.validate()?;
        Ok(options)
    }

    /// Resolve into path-addressed options
    pub fn to_path_options(&self) -> Result<PathOptions> {
        let defaults = PathOptions::default();
        let exclude_paths = self
            .graphql
            .exclude_paths
            .iter()
            .map(|path| path.parse::<TreePath>())
            .collect::<Result<Vec<_>>>()?;
        let min_array_length = self
            .graphql
            .min_array_length
            .unwrap_or(defaults.min_array_length);
        if min_array_length == 0 {
            return Err(JkcError::InvalidOption(
                "min_array_length must be at least 1".to_string(),
            ));
        }

        Ok(PathOptions {
            compress: self.to_options()?,
            min_array_length,
            exclude_paths,
            predicate: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_matches_defaults() {
        let options = CompressConfig::parse("").unwrap().to_options().unwrap();
        let defaults = CompressOptions::default();
        assert_eq!(options.min_key_length, defaults.min_key_length);
        assert_eq!(options.max_depth, defaults.max_depth);
        assert_eq!(options.nested_handling, defaults.nested_handling);
        assert_eq!(options.key_pattern.name(), "alpha");
    }

    #[test]
    fn test_full_config() {
        let config = CompressConfig::parse(
            r#"
            min_key_length = 4
            max_depth = 6
            pattern = "prefixed:k"
            nested = "arrays"
            homogeneous_only = true
            exclude = ["identifier"]
            include = ["ts"]

            [graphql]
            min_array_length = 3
            exclude_paths = ["data.viewer", "data.items[0].tags"]
            "#,
        )
        .unwrap();

        let options = config.to_options().unwrap();
        assert_eq!(options.min_key_length, 4);
        assert_eq!(options.max_depth, 6);
        assert_eq!(options.key_pattern.generate(0), "k0");
        assert_eq!(options.nested_handling, NestedHandling::Arrays);
        assert!(options.homogeneous_only);
        assert!(options.exclude_keys.contains("identifier"));
        assert!(options.include_keys.contains("ts"));

        let paths = config.to_path_options().unwrap();
        assert_eq!(paths.min_array_length, 3);
        assert_eq!(paths.exclude_paths[1].to_string(), "data.items[0].tags");
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(matches!(
            CompressConfig::parse("min_key_len = 4"),
            Err(JkcError::Config(_))
        ));
    }

    #[test]
    fn test_bad_values_rejected() {
        let bad_pattern = CompressConfig {
            pattern: Some("custom".to_string()),
            ..CompressConfig::default()
        };
        assert!(matches!(
            bad_pattern.to_options(),
            Err(JkcError::InvalidOption(_))
        ));

        let too_deep = CompressConfig {
            max_depth: Some(500),
            ..CompressConfig::default()
        };
        assert!(too_deep.to_options().is_err());

        let bad_path = CompressConfig {
            graphql: GraphqlConfig {
                exclude_paths: vec!["data..x".to_string()],
                ..GraphqlConfig::default()
            },
            ..CompressConfig::default()
        };
        assert!(matches!(
            bad_path.to_path_options(),
            Err(JkcError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_load_reports_file_name() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_depth = \"deep\"").unwrap();
        let err = CompressConfig::load(file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(&file.path().display().to_string()));
    }
}
