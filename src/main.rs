use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use sqlmint::builder::{BatchReport, ModelBuilder};
use sqlmint::codegen::{EmissionOptions, HeaderOptions, MiscOptions, StrOptions};
use sqlmint::config::DbConfig;
use sqlmint::introspect::TableFilter;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum CliStrings {
    /// `String`
    #[default]
    String,
    /// `Box<str>`
    Boxed,
    /// `Arc<str>`
    Shared,
}

impl From<CliStrings> for StrOptions {
    fn from(strings: CliStrings) -> Self {
        match strings {
            CliStrings::String => StrOptions::string(),
            CliStrings::Boxed => StrOptions::boxed(),
            CliStrings::Shared => StrOptions::shared(),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum CliPreset {
    /// Private fields with accessors, `Display` and comments
    #[default]
    Max,
    /// Public fields and the table contract only
    Min,
    /// Public fields only
    Var,
}

impl From<CliPreset> for MiscOptions {
    fn from(preset: CliPreset) -> Self {
        match preset {
            CliPreset::Max => MiscOptions::max(),
            CliPreset::Min => MiscOptions::min(),
            CliPreset::Var => MiscOptions::var(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "sqlmint")]
#[command(version, about, long_about = None)]
struct Cli {
    /// SQLite database file (overrides DB_PATH)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Path to .env file for connection config
    #[arg(long, default_value = "./.env")]
    env_file: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "SQL")]
    output: PathBuf,

    /// Generate a single model for this table or view
    #[arg(long)]
    table: Option<String>,

    /// Custom select statement describing the model given by --table
    #[arg(long, requires = "table")]
    query: Option<String>,

    /// Extra catalog filter, e.g. "AND name LIKE 'app_%'"
    #[arg(long = "where", default_value = "")]
    where_clause: String,

    /// Comma-separated list of tables to include (default: all)
    #[arg(long, value_delimiter = ',')]
    tables: Option<Vec<String>>,

    /// Comma-separated list of tables to exclude
    #[arg(long, value_delimiter = ',')]
    exclude: Option<Vec<String>>,

    /// String type used by generated models
    #[arg(long, value_enum, default_value_t = CliStrings::String)]
    strings: CliStrings,

    /// Model preset
    #[arg(long, value_enum, default_value_t = CliPreset::Max)]
    preset: CliPreset,

    /// Map columns to i64, f64 and strings only
    #[arg(long)]
    basic_types: bool,

    /// Model name prefix
    #[arg(long, default_value = "sql_")]
    prefix: String,

    /// Model name suffix
    #[arg(long, default_value = "")]
    suffix: String,

    /// Field separator used by the generated Display impl
    #[arg(long, default_value = ",")]
    delimiter: String,

    /// Write a mod.rs listing every generated model
    #[arg(long)]
    module_index: bool,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn emission_options(&self) -> EmissionOptions {
        let misc = MiscOptions {
            delimiter: self.delimiter.clone(),
            basic_types_only: self.basic_types,
            ..self.preset.into()
        };
        let header = HeaderOptions {
            dest_dir: self.output.clone(),
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
            module_index: self.module_index,
            ..HeaderOptions::default()
        };
        EmissionOptions::new(self.strings.into(), misc, header)
    }
}

fn main() {
    if let Err(e) = run() {
        error!(error = ?e, "Fatal error");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("sqlmint v{}", env!("CARGO_PKG_VERSION"));
    info!(
        output = ?cli.output,
        table = ?cli.table,
        strings = ?cli.strings,
        preset = ?cli.preset,
        "Starting code generation"
    );

    // Load configuration
    let config = match &cli.database {
        Some(path) => DbConfig::new(path),
        None => DbConfig::load(&cli.env_file).context("Failed to load database configuration")?,
    };
    debug!(config = ?config, "Loaded configuration");

    let options = cli.emission_options();
    debug!(options = ?options, "Emission options");

    let mut builder = ModelBuilder::open(&config, options)
        .with_context(|| format!("Failed to open database at {}", config.path.display()))?;

    if let Some(table) = &cli.table {
        let created = builder
            .create_header(table, None, cli.query.as_deref())
            .with_context(|| format!("Failed to introspect {}", table))?;
        if !created {
            bail!("Failed to write model for {}", table);
        }
    } else {
        // Build table filter
        let filter = TableFilter {
            include: cli.tables.clone(),
            exclude: cli.exclude.clone(),
        };

        if !filter.is_empty() {
            debug!(filter = ?filter, "Table filter configured");
        }

        let where_clause = join_fragments(&cli.where_clause, &filter.to_sql_fragment());
        let report = builder
            .create_all_headers(&where_clause)
            .context("Failed to read schema catalog")?;
        summarize(&report);

        if report.written.is_empty() && report.failed.is_empty() {
            warn!("No tables found after filtering");
        }
    }

    for path in builder.headers_created() {
        debug!(path = ?path, "Created");
    }
    builder.close().context("Failed to close database")?;

    Ok(())
}

fn join_fragments(first: &str, second: &str) -> String {
    [first.trim(), second.trim()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn summarize(report: &BatchReport) {
    for failure in &report.failed {
        warn!(table = ?failure.table, reason = ?failure.reason, "Model not generated");
    }
    if let Some(index) = &report.index {
        info!(path = ?index, "Module index written");
    }
    info!(
        written = report.written.len(),
        failed = report.failed.len(),
        "Done"
    );
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}
