//! JKC CLI - Command-line tool for JSON Key Compaction
//!
//! This binary provides command-line interfaces for:
//! - compress: JSON/NDJSON records → REST envelope
//! - expand: REST or path-addressed envelope → original JSON
//! - inspect: key table and size statistics of an envelope
//! - batch: NDJSON stream → one envelope per fixed-size batch
//! - graphql: GraphQL response → path-addressed envelope

mod config;

use clap::{Args, Parser, Subcommand, ValueEnum};
use config::CompressConfig;
use indicatif::{ProgressBar, ProgressStyle};
use jkc_io::{
    compress_document, compress_ndjson, compress_paths_document, expand_document,
    inspect_document, CompressionStats, EnvelopeKind, Inspection, OutputStyle,
};
use serde_json::{json, Map, Value};
use std::error::Error;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jkc")]
#[command(about = "JSON Key Compaction CLI tool")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress JSON records into a REST envelope
    Compress {
        /// Input file (JSON document or NDJSON)
        input: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        options: CompressArgs,
        /// Indent the output
        #[arg(long)]
        pretty: bool,
    },
    /// Expand a REST or path-addressed envelope
    Expand {
        /// Input file (envelope)
        input: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Indent the output
        #[arg(long)]
        pretty: bool,
    },
    /// Show the key table and size statistics of an envelope
    ///
    /// Examples:
    ///   jkc inspect users.jkc.json
    ///   jkc inspect users.jkc.json --format json
    Inspect {
        /// Input file (envelope)
        input: PathBuf,
        /// Output format (table, json)
        #[arg(long, value_enum, default_value_t = InspectFormat::Table)]
        format: InspectFormat,
    },
    /// Compress an NDJSON stream in fixed-size batches, one envelope per line
    Batch {
        /// Input file (NDJSON)
        input: PathBuf,
        /// Output file (NDJSON of envelopes)
        #[arg(short, long)]
        output: PathBuf,
        /// Records per envelope
        #[arg(long, default_value = "1000")]
        batch_size: usize,
        #[command(flatten)]
        options: CompressArgs,
        /// Show progress spinner while compressing
        #[arg(long)]
        progress: bool,
    },
    /// Compress every record array of a GraphQL response
    Graphql {
        /// Input file (GraphQL response or bare payload)
        input: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Arrays shorter than this are left alone
        #[arg(long)]
        min_array_length: Option<usize>,
        /// Path never compressed, e.g. data.viewer.friends (repeatable)
        #[arg(long = "exclude-path")]
        exclude_paths: Vec<String>,
        #[command(flatten)]
        options: CompressArgs,
        /// Indent the output
        #[arg(long)]
        pretty: bool,
    },
}

/// Flags shared by every compressing subcommand
#[derive(Args, Debug, Default, Clone)]
struct CompressArgs {
    /// Key pattern (alpha, numeric, alphanumeric, short, prefixed:<p>, prefixed-alpha:<p>)
    #[arg(long)]
    pattern: Option<String>,
    /// Minimum key length eligible for aliasing
    #[arg(long)]
    min_key_length: Option<usize>,
    /// Maximum recursion depth
    #[arg(long)]
    max_depth: Option<usize>,
    /// Nested handling (deep, shallow, arrays, or a depth)
    #[arg(long)]
    nested: Option<String>,
    /// Only alias keys present on every sibling record
    #[arg(long)]
    homogeneous_only: bool,
    /// Key never aliased (repeatable)
    #[arg(long)]
    exclude: Vec<String>,
    /// Key always considered regardless of length (repeatable)
    #[arg(long)]
    include: Vec<String>,
    /// TOML config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
}

impl CompressArgs {
    /// Load the config file, if any, and layer the flags over it
    fn resolve(&self) -> Result<CompressConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => CompressConfig::load(path)?,
            None => CompressConfig::default(),
        };
        if let Some(pattern) = &self.pattern {
            config.pattern = Some(pattern.clone());
        }
        if let Some(min_key_length) = self.min_key_length {
            config.min_key_length = Some(min_key_length);
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = Some(max_depth);
        }
        if let Some(nested) = &self.nested {
            config.nested = Some(nested.clone());
        }
        if self.homogeneous_only {
            config.homogeneous_only = Some(true);
        }
        config.exclude.extend(self.exclude.iter().cloned());
        config.include.extend(self.include.iter().cloned());
        Ok(config)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum InspectFormat {
    Table,
    Json,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compress {
            input,
            output,
            options,
            pretty,
        } => {
            handle_compress(&input, &output, &options, pretty)?;
        }
        Commands::Expand {
            input,
            output,
            pretty,
        } => {
            handle_expand(&input, &output, pretty)?;
        }
        Commands::Inspect { input, format } => {
            let stdout = std::io::stdout();
            handle_inspect(&input, format, &mut stdout.lock())?;
        }
        Commands::Batch {
            input,
            output,
            batch_size,
            options,
            progress,
        } => {
            handle_batch(&input, &output, batch_size, &options, progress)?;
        }
        Commands::Graphql {
            input,
            output,
            min_array_length,
            exclude_paths,
            options,
            pretty,
        } => {
            handle_graphql(&input, &output, min_array_length, exclude_paths, &options, pretty)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn output_style(pretty: bool) -> OutputStyle {
    if pretty {
        OutputStyle::Pretty
    } else {
        OutputStyle::Compact
    }
}

fn handle_compress(
    input: &Path,
    output: &Path,
    args: &CompressArgs,
    pretty: bool,
) -> Result<CompressionStats, Box<dyn Error>> {
    let start = Instant::now();
    let options = args.resolve()?.to_options()?;
    tracing::debug!(?options, "resolved compress options");

    let stats = compress_document(
        File::open(input)?,
        File::create(output)?,
        &options,
        output_style(pretty),
    )?;
    report("Compressed", output, &stats, start.elapsed())?;
    Ok(stats)
}

fn handle_expand(input: &Path, output: &Path, pretty: bool) -> Result<(), Box<dyn Error>> {
    let start = Instant::now();
    expand_document(File::open(input)?, File::create(output)?, output_style(pretty))?;
    let mut stderr = std::io::stderr().lock();
    writeln!(
        &mut stderr,
        "Expanded to {} (elapsed: {:.2?})",
        output.display(),
        start.elapsed()
    )?;
    Ok(())
}

fn handle_inspect<W: Write>(
    input: &Path,
    format: InspectFormat,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let inspection = inspect_document(File::open(input)?)?;
    match format {
        InspectFormat::Table => print_inspect_table(&inspection, out)?,
        InspectFormat::Json => print_inspect_json(&inspection, out)?,
    }
    Ok(())
}

fn kind_name(kind: EnvelopeKind) -> &'static str {
    match kind {
        EnvelopeKind::Rest => "rest",
        EnvelopeKind::PathAddressed => "path-addressed",
    }
}

fn print_inspect_table<W: Write>(
    inspection: &Inspection,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    writeln!(out, "Envelope: {}", kind_name(inspection.kind))?;
    if let Some(pattern) = &inspection.pattern {
        writeln!(out, "Pattern:  {}", pattern)?;
    }
    writeln!(out, "Size:     {}", inspection.stats)?;

    if !inspection.paths.is_empty() {
        writeln!(out, "\nPaths:")?;
        for path in &inspection.paths {
            writeln!(out, "  {}", path)?;
        }
    }

    writeln!(out, "\nKey table ({} entries):", inspection.table.len())?;
    let width = inspection
        .table
        .iter()
        .map(|(alias, _)| alias.chars().count())
        .max()
        .unwrap_or(0);
    for (alias, canonical) in inspection.table.iter() {
        writeln!(out, "  {:<width$}  {}", alias, canonical, width = width)?;
    }
    Ok(())
}

fn print_inspect_json<W: Write>(
    inspection: &Inspection,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let mut summary = Map::new();
    summary.insert("kind".to_string(), json!(kind_name(inspection.kind)));
    if let Some(pattern) = &inspection.pattern {
        summary.insert("pattern".to_string(), json!(pattern));
    }
    summary.insert("table".to_string(), inspection.table.to_json());
    summary.insert("paths".to_string(), serde_json::to_value(&inspection.paths)?);
    summary.insert("stats".to_string(), serde_json::to_value(inspection.stats)?);
    summary.insert(
        "savings_ratio".to_string(),
        json!(inspection.stats.savings_ratio()),
    );

    serde_json::to_writer_pretty(&mut *out, &Value::Object(summary))?;
    writeln!(out)?;
    Ok(())
}

fn handle_batch(
    input: &Path,
    output: &Path,
    batch_size: usize,
    args: &CompressArgs,
    show_progress: bool,
) -> Result<CompressionStats, Box<dyn Error>> {
    let start = Instant::now();
    let options = args.resolve()?.to_options()?;

    let mut progress_bar = show_progress.then(|| create_spinner("Compressing batches"));
    let mut records = 0usize;
    let mut batches = 0usize;
    let stats = compress_ndjson(
        BufReader::new(File::open(input)?),
        File::create(output)?,
        batch_size,
        &options,
        |count| {
            records += count;
            batches += 1;
            if let Some(pb) = &progress_bar {
                pb.inc(count as u64);
            }
        },
    )?;

    let elapsed = start.elapsed();
    let secs = elapsed.as_secs_f64().max(f64::EPSILON);
    if let Some(pb) = progress_bar.take() {
        pb.finish_with_message(format!(
            "Compressed {} records into {} envelopes in {:.2?} ({:.1} rec/s)",
            records,
            batches,
            elapsed,
            records as f64 / secs
        ));
    }
    report("Compressed", output, &stats, elapsed)?;
    Ok(stats)
}

fn handle_graphql(
    input: &Path,
    output: &Path,
    min_array_length: Option<usize>,
    exclude_paths: Vec<String>,
    args: &CompressArgs,
    pretty: bool,
) -> Result<CompressionStats, Box<dyn Error>> {
    let start = Instant::now();
    let mut config = args.resolve()?;
    if let Some(min_array_length) = min_array_length {
        config.graphql.min_array_length = Some(min_array_length);
    }
    config.graphql.exclude_paths.extend(exclude_paths);
    let options = config.to_path_options()?;

    let stats = compress_paths_document(
        File::open(input)?,
        File::create(output)?,
        &options,
        output_style(pretty),
    )?;
    report("Compressed", output, &stats, start.elapsed())?;
    Ok(stats)
}

fn report(
    verb: &str,
    output: &Path,
    stats: &CompressionStats,
    elapsed: Duration,
) -> Result<(), Box<dyn Error>> {
    let mut stderr = std::io::stderr().lock();
    writeln!(
        &mut stderr,
        "{} to {} ({}, elapsed: {:.2?})",
        verb,
        output.display(),
        stats,
        elapsed
    )?;
    Ok(())
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Paths {
        _dir: TempDir,
        input: PathBuf,
        packed: PathBuf,
        restored: PathBuf,
    }

    fn temp_paths(input: &str) -> Paths {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths {
            input: dir.path().join("input.json"),
            packed: dir.path().join("packed.json"),
            restored: dir.path().join("restored.json"),
            _dir: dir,
        };
        fs::write(&paths.input, input).unwrap();
        paths
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn compress_and_expand_roundtrip() {
        let data = r#"[{"firstName":"John","lastName":"Doe"},{"firstName":"Jane","lastName":"Smith"}]"#;
        let paths = temp_paths(data);

        let stats =
            handle_compress(&paths.input, &paths.packed, &CompressArgs::default(), false).unwrap();
        assert_eq!(stats.table_entries, 2);
        assert_eq!(
            read_json(&paths.packed)["table"],
            json!({"a": "firstName", "b": "lastName"})
        );

        handle_expand(&paths.packed, &paths.restored, true).unwrap();
        assert_eq!(
            read_json(&paths.restored),
            serde_json::from_str::<Value>(data).unwrap()
        );
    }

    #[test]
    fn flags_override_config_file() {
        let paths = temp_paths(r#"[{"identifier":1,"status":"ok"}]"#);
        let config_path = paths.input.with_file_name("jkc.toml");
        fs::write(&config_path, "pattern = \"numeric\"\nexclude = [\"status\"]\n").unwrap();

        let args = CompressArgs {
            pattern: Some("short".to_string()),
            config: Some(config_path),
            ..CompressArgs::default()
        };
        let resolved = args.resolve().unwrap();
        assert_eq!(resolved.pattern.as_deref(), Some("short"));
        assert_eq!(resolved.exclude, vec!["status".to_string()]);

        handle_compress(&paths.input, &paths.packed, &args, false).unwrap();
        let wire = read_json(&paths.packed);
        assert_eq!(wire["table"], json!({"_": "identifier"}));
        assert_eq!(wire["pattern"], json!("short"));
    }

    #[test]
    fn invalid_pattern_flag_is_reported() {
        let paths = temp_paths(r#"[{"identifier":1}]"#);
        let args = CompressArgs {
            pattern: Some("zigzag".to_string()),
            ..CompressArgs::default()
        };
        let err = handle_compress(&paths.input, &paths.packed, &args, false).unwrap_err();
        assert!(err.to_string().contains("zigzag"));
    }

    #[test]
    fn inspect_table_lists_aliases() {
        let paths = temp_paths(r#"[{"firstName":"John"},{"firstName":"Jane"}]"#);
        handle_compress(&paths.input, &paths.packed, &CompressArgs::default(), false).unwrap();

        let mut out = Vec::new();
        handle_inspect(&paths.packed, InspectFormat::Table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Envelope: rest"));
        assert!(text.contains("Pattern:  alpha"));
        assert!(text.contains("  a  firstName"));
    }

    #[test]
    fn inspect_json_parses() {
        let paths = temp_paths(r#"{"data":{"items":[{"title":"x"},{"title":"y"}]}}"#);
        handle_graphql(
            &paths.input,
            &paths.packed,
            None,
            Vec::new(),
            &CompressArgs::default(),
            false,
        )
        .unwrap();

        let mut out = Vec::new();
        handle_inspect(&paths.packed, InspectFormat::Json, &mut out).unwrap();
        let summary: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(summary["kind"], json!("path-addressed"));
        assert_eq!(summary["paths"], json!(["data.items"]));
        assert_eq!(summary["table"], json!({"a": "title"}));
    }

    #[test]
    fn batch_writes_one_envelope_per_batch() {
        let lines: String = (0..5)
            .map(|i| format!("{{\"sequence\":{i},\"eventName\":\"tick\"}}\n"))
            .collect();
        let paths = temp_paths(&lines);

        handle_batch(&paths.input, &paths.packed, 2, &CompressArgs::default(), false).unwrap();
        let written = fs::read_to_string(&paths.packed).unwrap();
        assert_eq!(written.lines().count(), 3);
    }

    #[test]
    fn graphql_exclude_path_flag() {
        let paths = temp_paths(
            r#"{"data":{"users":[{"name":"a"},{"name":"b"}],"teams":[{"name":"c"},{"name":"d"}]}}"#,
        );
        handle_graphql(
            &paths.input,
            &paths.packed,
            Some(2),
            vec!["data.teams".to_string()],
            &CompressArgs::default(),
            false,
        )
        .unwrap();

        let wire = read_json(&paths.packed);
        assert_eq!(wire["meta"]["paths"], json!(["data.users"]));
        assert_eq!(wire["data"]["teams"], json!([{"name": "c"}, {"name": "d"}]));
    }
}
