//! `heatmap`: generate operation heat maps from evaluation results.
//!
//! Reads evaluation rows (JSON/YAML), rolls them up against an operation
//! catalog and prints the resulting markers as text, JSON or YAML.

mod logging;
mod report;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};

use heatmap_core::{
    analyze, generate_heatmap, load_inputs, load_records, normalize_records, Catalog,
    CatalogSource, HeatmapConfig, MarkerFormat,
};

use report::{analysis_to_text, HeatmapReport};

#[derive(Parser)]
#[command(
    name = "heatmap",
    version,
    about = "Roll evaluation results up into an operation heat map"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve every catalog operation and print its marker.
    Generate(GenerateArgs),
    /// Print quality metrics for a set of evaluation records.
    Analyze {
        /// Evaluation records (.json, .yaml, .yml)
        #[arg(long)]
        records: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the built-in AVL-DRIVE catalog.
    Catalog {
        #[arg(long, value_enum, default_value_t = DocumentFormat::Yaml)]
        format: DocumentFormat,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Evaluation records (.json, .yaml, .yml)
    #[arg(long)]
    records: PathBuf,

    /// Operation catalog (.json, .yaml, .yml); defaults to the built-in AVL-DRIVE catalog
    #[arg(long, conflicts_with = "infer_catalog")]
    catalog: Option<PathBuf>,

    /// Derive the catalog from the record codes instead of loading one
    #[arg(long)]
    infer_catalog: bool,

    /// Heat map config (.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the sub-operation marker style
    #[arg(long, value_enum)]
    marker_format: Option<MarkerArg>,

    /// Emit N/A rows for parents with no data
    #[arg(long)]
    emit_unresolved_parents: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DocumentFormat {
    Json,
    Yaml,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum MarkerArg {
    DotOnly,
    DotPlusWord,
}

impl From<MarkerArg> for MarkerFormat {
    fn from(arg: MarkerArg) -> Self {
        match arg {
            MarkerArg::DotOnly => MarkerFormat::DotOnly,
            MarkerArg::DotPlusWord => MarkerFormat::DotPlusWord,
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Generate(args) => cmd_generate(args),
        Command::Analyze { records, format } => cmd_analyze(&records, format),
        Command::Catalog { format } => cmd_catalog(format),
    }
}

fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let source = catalog_source(&args);
    let inputs = load_inputs(&args.records, source, args.config.as_deref())
        .with_context(|| format!("load inputs for {}", args.records.display()))?;

    let config = apply_overrides(inputs.config, &args);
    let catalog = inputs.catalog;
    let rows = inputs.records;

    for code in catalog.shape_overrides() {
        if let Some(node) = catalog.get(code.as_str()) {
            warn!(
                code = %code,
                role = node.role().label(),
                "Catalog role differs from the role implied by the code"
            );
        }
    }
    info!(
        catalog = catalog.name(),
        operations = catalog.len(),
        records = rows.len(),
        "Generating heat map"
    );

    let heatmap = generate_heatmap(&catalog, &rows, &config);
    let report = HeatmapReport::new(&catalog, &config, heatmap);

    let rendered = match args.format {
        OutputFormat::Text => report.to_text(),
        OutputFormat::Json => to_json(&report)?,
        OutputFormat::Yaml => to_yaml(&report)?,
    };

    emit(&rendered, args.output.as_deref())
}

fn catalog_source(args: &GenerateArgs) -> CatalogSource<'_> {
    match (&args.catalog, args.infer_catalog) {
        (Some(path), _) => CatalogSource::File(path),
        (None, true) => CatalogSource::Inferred,
        (None, false) => CatalogSource::AvlDrive,
    }
}

/// Command-line flags win over the config file.
fn apply_overrides(mut config: HeatmapConfig, args: &GenerateArgs) -> HeatmapConfig {
    if let Some(marker) = args.marker_format {
        config.marker_format = marker.into();
    }
    if args.emit_unresolved_parents {
        config.emit_unresolved_parents = true;
    }
    config
}

fn cmd_analyze(records: &Path, format: OutputFormat) -> Result<()> {
    let rows = load_records(records)
        .with_context(|| format!("load records from {}", records.display()))?;
    let analysis = analyze(&normalize_records(&rows));

    let rendered = match format {
        OutputFormat::Text => analysis_to_text(&analysis),
        OutputFormat::Json => to_json(&analysis)?,
        OutputFormat::Yaml => to_yaml(&analysis)?,
    };

    emit(&rendered, None)
}

fn cmd_catalog(format: DocumentFormat) -> Result<()> {
    let document = Catalog::avl_drive().to_document();

    let rendered = match format {
        DocumentFormat::Json => to_json(&document)?,
        DocumentFormat::Yaml => to_yaml(&document)?,
    };

    emit(&rendered, None)
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value).context("serialize JSON")?;
    json.push('\n');
    Ok(json)
}

fn to_yaml<T: Serialize>(value: &T) -> Result<String> {
    serde_yaml::to_string(value).context("serialize YAML")
}

fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("write {}", path.display()))?;
            info!(path = %path.display(), "Report written");
            Ok(())
        }
        None => {
            print!("{}", rendered);
            Ok(())
        }
    }
}
