//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::builtin::stddev_registry;
use crate::domain::error::PresetError;
use crate::domain::preset_loader::load_registry;
use crate::domain::record::ParamRecord;
use crate::domain::registry::LayerRegistry;
use crate::domain::resolver::Resolver;
use crate::domain::schema::{ParamField, RecordKind};
use crate::domain::symbols::parse_symbols;
use crate::domain::timeframe::Timeframe;

#[derive(Parser, Debug)]
#[command(name = "stg-stddev", about = "StdDev strategy parameter presets")]
pub struct Cli {
    /// Log progress
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Log every registered layer
    #[arg(long, global = true)]
    pub debug: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the effective parameters for a symbol and timeframe
    Resolve {
        #[arg(short, long)]
        kind: String,
        #[arg(short, long)]
        symbol: Option<String>,
        #[arg(short, long)]
        timeframe: Option<String>,
        #[arg(short, long)]
        presets: Option<PathBuf>,
    },
    /// Write resolved parameters for many symbols and timeframes as CSV
    Table {
        #[arg(short, long)]
        kind: String,
        #[arg(long)]
        symbols: String,
        #[arg(long)]
        timeframes: String,
        #[arg(short, long)]
        presets: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List registered layers
    Layers {
        #[arg(short, long)]
        presets: Option<PathBuf>,
    },
    /// Validate a preset file
    Validate {
        #[arg(short, long)]
        presets: PathBuf,
    },
    /// Show the parameter schema
    Schema,
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose, cli.debug);

    let result = match cli.command {
        Command::Resolve {
            kind,
            symbol,
            timeframe,
            presets,
        } => run_resolve(&kind, symbol.as_deref(), timeframe.as_deref(), presets.as_deref()),
        Command::Table {
            kind,
            symbols,
            timeframes,
            presets,
            output,
        } => run_table(&kind, &symbols, &timeframes, presets.as_deref(), output.as_deref()),
        Command::Layers { presets } => run_layers(presets.as_deref()),
        Command::Validate { presets } => run_validate(&presets),
        Command::Schema => {
            print!("{}", render_schema());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

fn init_logging(verbose: bool, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A subscriber may already be installed when run() is called repeatedly.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Loads the preset file at `path`, or the built-in catalog when absent.
pub fn load_presets(path: Option<&Path>) -> Result<LayerRegistry, PresetError> {
    match path {
        Some(path) => {
            info!("loading presets from {}", path.display());
            let adapter =
                FileConfigAdapter::from_file(path).map_err(|e| PresetError::ConfigParse {
                    file: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            load_registry(&adapter)
        }
        None => stddev_registry(),
    }
}

pub fn parse_timeframes(input: &str) -> Result<Vec<Timeframe>, PresetError> {
    let mut timeframes = Vec::new();
    for token in input.split(',') {
        let tf: Timeframe = token.parse()?;
        if !timeframes.contains(&tf) {
            timeframes.push(tf);
        }
    }
    Ok(timeframes)
}

/// Renders a record as `key = value` lines, in schema order.
pub fn render_record(record: &ParamRecord) -> String {
    let mut out = String::new();
    for (field, value) in record.iter() {
        let _ = writeln!(out, "{} = {}", field, value);
    }
    out
}

pub fn render_layers(registry: &LayerRegistry) -> String {
    let mut out = String::new();
    for layer in registry.layers() {
        let parent = layer
            .parent
            .and_then(|id| registry.layer(id))
            .map(|p| p.key.to_string())
            .unwrap_or_else(|| "-".to_string());
        let fields: Vec<&str> = layer.overrides.fields().map(ParamField::key).collect();
        let _ = writeln!(
            out,
            "{:<28} parent: {:<22} overrides: {}",
            layer.key.to_string(),
            parent,
            if fields.is_empty() {
                "-".to_string()
            } else {
                fields.join(", ")
            }
        );
    }
    out
}

pub fn render_schema() -> String {
    let mut out = String::new();
    for kind in RecordKind::ALL {
        let _ = writeln!(out, "[{}]", kind.defaults_name());
        for field in kind.fields() {
            let _ = writeln!(
                out,
                "{:<24} default {:<6} {}",
                field.key(),
                field.default_value().to_string(),
                field.domain()
            );
        }
    }
    out
}

/// Writes one CSV row per (symbol, timeframe) with the layer that resolved it
/// and every field of `kind`.
pub fn write_table<W: io::Write>(
    registry: &LayerRegistry,
    kind: RecordKind,
    symbols: &[String],
    timeframes: &[Timeframe],
    writer: W,
) -> Result<(), PresetError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["symbol".to_string(), "timeframe".to_string(), "layer".to_string()];
    header.extend(kind.fields().map(|field| field.key().to_string()));
    wtr.write_record(&header)?;

    let resolver = Resolver::new(registry);
    for symbol in symbols {
        for tf in timeframes {
            let layer = registry
                .layer(registry.lookup(kind, Some(symbol.as_str()), Some(*tf)))
                .map(|layer| layer.key.to_string())
                .unwrap_or_default();
            let record = resolver.resolve(kind, Some(symbol.as_str()), Some(*tf));

            let mut row = vec![symbol.clone(), tf.to_string(), layer];
            row.extend(record.iter().map(|(_, value)| value.to_string()));
            wtr.write_record(&row)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

fn run_resolve(
    kind: &str,
    symbol: Option<&str>,
    timeframe: Option<&str>,
    presets: Option<&Path>,
) -> Result<(), PresetError> {
    let kind: RecordKind = kind.parse()?;
    let timeframe = timeframe.map(str::parse::<Timeframe>).transpose()?;
    let registry = load_presets(presets)?;

    let layer = registry.lookup(kind, symbol, timeframe);
    if let Some(layer) = registry.layer(layer) {
        info!("resolving through {}", layer.key);
    }
    let record = Resolver::new(&registry).resolve(kind, symbol, timeframe);
    print!("{}", render_record(&record));
    Ok(())
}

fn run_table(
    kind: &str,
    symbols: &str,
    timeframes: &str,
    presets: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), PresetError> {
    let kind: RecordKind = kind.parse()?;
    let symbols = parse_symbols(symbols)?;
    let timeframes = parse_timeframes(timeframes)?;
    let registry = load_presets(presets)?;

    match output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            write_table(&registry, kind, &symbols, &timeframes, file)?;
            info!("table written to {}", path.display());
        }
        None => write_table(&registry, kind, &symbols, &timeframes, io::stdout().lock())?,
    }
    Ok(())
}

fn run_layers(presets: Option<&Path>) -> Result<(), PresetError> {
    let registry = load_presets(presets)?;
    print!("{}", render_layers(&registry));
    Ok(())
}

fn run_validate(presets: &Path) -> Result<(), PresetError> {
    let registry = load_presets(Some(presets))?;
    println!(
        "{}: {} timeframe layers, {} preset layers, symbols: {}",
        presets.display(),
        registry.timeframe_layer_count(),
        registry.preset_layer_count(),
        registry.symbols().join(", ")
    );
    Ok(())
}
