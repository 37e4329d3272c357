//! coda - compositional data transforms from the command line.
//!
//! Reads and writes tab-separated tables whose first column is a sample ID.

use clap::{Parser, Subcommand, ValueEnum};
use geochem_coda::data::{CompositionTable, LogRatioTable, TransformKind};
use geochem_coda::error::{CodaError, Result};
use geochem_coda::pipeline::{Pipeline, PipelineConfig};
use geochem_coda::transform::{AlrReference, BoxCoxConfig, LogRatioKind};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Transform selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Method {
    /// Additive log-ratio
    Alr,
    /// Centred log-ratio
    Clr,
    /// Isometric log-ratio
    Ilr,
    /// Box-Cox power transform
    Boxcox,
}

/// Log-ratio transform used for the mean
#[derive(Debug, Clone, Copy, ValueEnum)]
enum MeanMethod {
    Alr,
    Clr,
    Ilr,
}

/// Output format for printed results
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Yaml,
}

/// Compositional data analysis transforms
#[derive(Parser)]
#[command(name = "coda")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline from a YAML configuration file
    Run {
        /// Path to pipeline configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Path to input table TSV
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the resulting TSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Apply a forward transform
    Transform {
        /// Path to input table TSV
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the transformed TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Transform to apply
        #[arg(short, long, value_enum)]
        method: Method,

        /// ALR denominator index (negative counts from the end)
        #[arg(long, default_value = "-1", allow_negative_numbers = true)]
        ind: isize,

        /// ALR denominator column name (overrides --ind)
        #[arg(long)]
        reference: Option<String>,

        /// Keep the redundant ALR column
        #[arg(long)]
        null_col: bool,

        /// Fixed Box-Cox lambda (searched when omitted)
        #[arg(long, allow_negative_numbers = true)]
        lambda: Option<f64>,

        /// Lower bound of the lambda search grid
        #[arg(long, default_value = "-1.0", allow_negative_numbers = true)]
        search_min: f64,

        /// Upper bound of the lambda search grid
        #[arg(long, default_value = "5.0", allow_negative_numbers = true)]
        search_max: f64,

        /// Number of lambda grid points
        #[arg(long, default_value = "100")]
        search_steps: usize,
    },

    /// Invert a transform previously written by `coda transform`
    Inverse {
        /// Path to transformed TSV
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the recovered composition TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Transform to invert
        #[arg(short, long, value_enum)]
        method: Method,

        /// ALR denominator index used in the forward transform
        #[arg(long, default_value = "-1", allow_negative_numbers = true)]
        ind: isize,

        /// The input still has the redundant ALR column
        #[arg(long)]
        null_col: bool,

        /// Names of the recovered parts (comma-separated)
        #[arg(long)]
        columns: Option<String>,

        /// Box-Cox lambda used in the forward transform
        #[arg(long, allow_negative_numbers = true)]
        lambda: Option<f64>,
    },

    /// Renormalise a table to a fixed total
    Renormalise {
        /// Path to input table TSV
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the renormalised TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Sub-composition to renormalise (comma-separated, default: all columns)
        #[arg(long)]
        components: Option<String>,

        /// Closure total
        #[arg(long, default_value = "100.0")]
        scale: f64,
    },

    /// Print the log-ratio mean composition of a table
    Mean {
        /// Path to input table TSV
        #[arg(short, long)]
        input: PathBuf,

        /// Log-ratio transform used for averaging
        #[arg(short, long, value_enum, default_value = "clr")]
        method: MeanMethod,

        /// ALR denominator index
        #[arg(long, default_value = "-1", allow_negative_numbers = true)]
        ind: isize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Generate an example pipeline configuration
    Example {
        /// Output path for the example YAML
        #[arg(short, long, default_value = "pipeline.yaml")]
        output: PathBuf,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            input,
            output,
        } => cmd_run(&config, &input, &output),

        Commands::Transform {
            input,
            output,
            method,
            ind,
            reference,
            null_col,
            lambda,
            search_min,
            search_max,
            search_steps,
        } => {
            let reference = match reference {
                Some(name) => AlrReference::Column(name),
                None => AlrReference::Index(ind),
            };
            let boxcox = BoxCoxConfig {
                lambda,
                search_space: (search_min, search_max),
                search_steps,
            };
            cmd_transform(&input, &output, method, &reference, null_col, &boxcox)
        }

        Commands::Inverse {
            input,
            output,
            method,
            ind,
            null_col,
            columns,
            lambda,
        } => cmd_inverse(&input, &output, method, ind, null_col, columns.as_deref(), lambda),

        Commands::Renormalise {
            input,
            output,
            components,
            scale,
        } => cmd_renormalise(&input, &output, components.as_deref(), scale),

        Commands::Mean {
            input,
            method,
            ind,
            format,
        } => cmd_mean(&input, method, ind, format),

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn load_table(path: &PathBuf) -> Result<CompositionTable> {
    let table = CompositionTable::from_tsv(path)?;
    info!(path = ?path, rows = table.n_rows(), cols = table.n_cols(), "loaded table");
    Ok(table)
}

/// Run a pipeline from configuration
fn cmd_run(config_path: &PathBuf, input_path: &PathBuf, output_path: &PathBuf) -> Result<()> {
    info!(path = ?config_path, "loading pipeline configuration");
    let config_str = std::fs::read_to_string(config_path)?;
    let config = PipelineConfig::from_yaml(&config_str)?;

    let table = load_table(input_path)?;
    let output = Pipeline::from_config(&config).run(&table)?;

    output.to_tsv(output_path)?;
    info!(path = ?output_path, rows = output.n_rows(), "wrote pipeline output");
    Ok(())
}

/// Apply a forward transform
fn cmd_transform(
    input_path: &PathBuf,
    output_path: &PathBuf,
    method: Method,
    reference: &AlrReference,
    null_col: bool,
    boxcox: &BoxCoxConfig,
) -> Result<()> {
    let table = load_table(input_path)?;

    let transformed = match method {
        Method::Alr => table.alr(reference, null_col)?,
        Method::Clr => table.clr()?,
        Method::Ilr => table.ilr()?,
        Method::Boxcox => table.boxcox(boxcox)?,
    };

    transformed.to_tsv(output_path)?;
    info!(transform = %transformed.transform, path = ?output_path, "wrote transformed table");

    match transformed.transform {
        TransformKind::BoxCox { lambda } => println!("lambda\t{}", lambda),
        TransformKind::Alr { index, .. } => println!("ind\t{}", index),
        _ => {}
    }
    Ok(())
}

/// Invert a transformed table
fn cmd_inverse(
    input_path: &PathBuf,
    output_path: &PathBuf,
    method: Method,
    ind: isize,
    null_col: bool,
    columns: Option<&str>,
    lambda: Option<f64>,
) -> Result<()> {
    let coords = load_table(input_path)?;
    let width = coords.n_cols();

    let (kind, n_parts) = match method {
        Method::Alr => {
            let n_parts = if null_col { width } else { width + 1 };
            let index = geochem_coda::transform::alr::resolve_index(ind, n_parts)?;
            (TransformKind::Alr { index, null_col }, n_parts)
        }
        Method::Clr => (TransformKind::Clr, width),
        Method::Ilr => (TransformKind::Ilr, width + 1),
        Method::Boxcox => {
            let lambda = lambda.ok_or_else(|| {
                CodaError::InvalidParameter(
                    "Inverting Box-Cox requires the forward --lambda".to_string(),
                )
            })?;
            (TransformKind::BoxCox { lambda }, width)
        }
    };

    let inverts_to = match columns {
        Some(list) => split_list(list),
        None => (1..=n_parts).map(|k| format!("x{}", k)).collect(),
    };

    let table = LogRatioTable::from_parts(
        coords.data().clone(),
        coords.columns().to_vec(),
        coords.index().to_vec(),
        inverts_to,
        kind,
    )?;
    let recovered = table.invert()?.with_index_name(coords.index_name());

    recovered.to_tsv(output_path)?;
    info!(transform = %kind, path = ?output_path, "wrote recovered composition");
    Ok(())
}

/// Renormalise a table
fn cmd_renormalise(
    input_path: &PathBuf,
    output_path: &PathBuf,
    components: Option<&str>,
    scale: f64,
) -> Result<()> {
    let table = load_table(input_path)?;
    let components = components.map(split_list).unwrap_or_default();

    let renormalised = table.renormalise(&components, scale);
    renormalised.to_tsv(output_path)?;
    info!(path = ?output_path, scale, "wrote renormalised table");
    Ok(())
}

/// Print the log-ratio mean of a table
fn cmd_mean(input_path: &PathBuf, method: MeanMethod, ind: isize, format: Format) -> Result<()> {
    let table = load_table(input_path)?;
    let kind = match method {
        MeanMethod::Alr => LogRatioKind::Alr {
            ind,
            null_col: false,
        },
        MeanMethod::Clr => LogRatioKind::Clr,
        MeanMethod::Ilr => LogRatioKind::Ilr,
    };

    let mean = table.logratiomean(&kind)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&mean)?),
        Format::Yaml => println!("{}", serde_yaml::to_string(&mean)?),
        Format::Text => {
            println!("Log-ratio mean ({} samples)", table.n_rows());
            println!("============");
            for (name, value) in mean.iter() {
                println!("  {:<12} {:.6}", name, value);
            }
        }
    }

    Ok(())
}

/// Generate example pipeline configuration
fn cmd_example(output_path: &PathBuf) -> Result<()> {
    let pipeline = Pipeline::new()
        .name("example-majors")
        .renormalise(&["SiO2", "TiO2", "Al2O3", "FeO", "MgO", "CaO", "Na2O", "K2O"], 100.0)
        .ilr()
        .invert()
        .logratiomean(LogRatioKind::Clr);

    let config = pipeline.to_config(Some(
        "Renormalise major oxides, round-trip through ILR and take the CLR mean",
    ));
    let yaml = config.to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    info!(path = ?output_path, "wrote example pipeline");
    println!("{}", yaml);

    Ok(())
}
