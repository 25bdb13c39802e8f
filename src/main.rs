use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rixs_ops::config::{load_config_or_default, Config};
use rixs_ops::logging::{init_logging, new_correlation_id, MetricsCollector};
use rixs_ops::pipeline::{
    params_from_value, Dispatch, Dispatcher, OperationFamily, OperationKind, Record, ResultMap,
};
use rixs_ops::{
    image_from_rows, Alignment, Filter, Integration, Manipulation, Normalization, OwnerToken,
    Stats2D,
};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "rixs")]
#[command(about = "Filter, align, integrate and summarize 2-D RIXS detector images")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (JSON or TOML)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one operation on an image
    Run {
        #[arg(short, long, value_enum)]
        family: FamilyName,

        /// Operation name, e.g. maxAlignment
        #[arg(short, long)]
        op: String,

        /// Image as a JSON array of rows
        #[arg(short, long)]
        image: PathBuf,

        /// JSON object, inline or as a file, overriding the configured parameters
        #[arg(short, long)]
        params: Option<String>,

        /// Write the result record here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run every operation of a family and merge the results
    RunAll {
        #[arg(short, long, value_enum)]
        family: FamilyName,

        #[arg(short, long)]
        image: PathBuf,

        #[arg(short, long)]
        params: Option<String>,

        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List the operations of every family
    Ops,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FamilyName {
    Filter,
    Alignment,
    Integration,
    Normalization,
    Manipulation,
    Stats,
}

/// What to run: a single named operation or the whole family.
enum Selection<'a> {
    One(&'a str),
    All,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config_or_default(cli.config.as_deref());
    match cli.verbose {
        0 => {}
        1 => config.logging.global_level = "debug".to_string(),
        _ => {
            config.logging.global_level = "trace".to_string();
            config.logging.algorithm_level = "trace".to_string();
        }
    }
    let _guard = init_logging(&config.logging)?;
    let correlation_id = new_correlation_id();
    tracing::debug!(%correlation_id, "Starting rixs");

    match cli.command {
        Commands::Run {
            family,
            op,
            image,
            params,
            output,
        } => {
            let record = dispatch(&config, family, Selection::One(&op), &image, params.as_deref())?;
            emit(&record, output.as_deref())
        }
        Commands::RunAll {
            family,
            image,
            params,
            output,
        } => {
            let record = dispatch(&config, family, Selection::All, &image, params.as_deref())?;
            emit(&record, output.as_deref())
        }
        Commands::Ops => {
            print_ops(&Filter);
            print_ops(&Alignment::default());
            print_ops(&Integration);
            print_ops(&Normalization);
            print_ops(&Manipulation);
            print_ops(&Stats2D::default());
            Ok(())
        }
    }
}

fn dispatch(
    config: &Config,
    family: FamilyName,
    selection: Selection<'_>,
    image_path: &Path,
    overrides: Option<&str>,
) -> Result<ResultMap> {
    let overrides = match overrides {
        Some(text) if text.trim_start().starts_with('{') => {
            serde_json::from_str(text).context("parsing --params")?
        }
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading parameters {}", path))?;
            serde_json::from_str(&content).with_context(|| format!("parsing parameters {}", path))?
        }
        None => Value::Null,
    };
    let request = Request {
        image_path,
        selection,
        overrides,
    };
    match family {
        FamilyName::Filter => request.execute(Filter, &config.filter),
        FamilyName::Alignment => request.execute(Alignment::default(), &config.alignment),
        FamilyName::Integration => request.execute(Integration, &config.integration),
        FamilyName::Normalization => request.execute(Normalization, &config.normalization),
        FamilyName::Manipulation => request.execute(Manipulation, &config.manipulation),
        FamilyName::Stats => request.execute(Stats2D::default(), &config.stats),
    }
}

struct Request<'a> {
    image_path: &'a Path,
    selection: Selection<'a>,
    overrides: Value,
}

impl Request<'_> {
    fn execute<F>(self, family: F, defaults: &F::Params) -> Result<ResultMap>
    where
        F: OperationFamily,
        F::Params: Serialize,
    {
        let content = fs::read_to_string(self.image_path)
            .with_context(|| format!("reading image {}", self.image_path.display()))?;
        let rows: Vec<Vec<f64>> = serde_json::from_str(&content)
            .with_context(|| format!("parsing image {}", self.image_path.display()))?;
        let image = image_from_rows(&rows)?;

        let mut params = serde_json::to_value(defaults)?;
        if let (Value::Object(base), Value::Object(extra)) = (&mut params, self.overrides) {
            base.extend(extra);
        }
        let params: F::Params = params_from_value(params)?;
        tracing::debug!(?params, "Resolved parameters");

        let owner = OwnerToken::new(self.image_path.display().to_string(), 0);
        let metrics = Arc::new(MetricsCollector::new(true));
        let dispatcher = Dispatcher::new(owner.clone(), family).with_metrics(Arc::clone(&metrics));

        let record = match self.selection {
            Selection::One(name) => {
                match dispatcher.invoke_named(name, &owner, image.view(), &params)? {
                    Dispatch::Completed(output) => output.to_record(),
                    Dispatch::Stale => bail!("request for {} was dropped as stale", name),
                }
            }
            Selection::All => match dispatcher.invoke_all(&owner, image.view(), &params)? {
                Dispatch::Completed(combined) => combined.to_record(),
                Dispatch::Stale => bail!("request was dropped as stale"),
            },
        };

        for kind in F::Kind::all() {
            if let Some(stats) = metrics.calculate_stats(kind.name()) {
                tracing::debug!(op = kind.name(), mean_ms = stats.mean_ms, "Operation timing");
            }
        }
        Ok(record)
    }
}

fn emit(record: &ResultMap, output: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(record)?;
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("writing result to {}", path.display()))?;
            tracing::info!(path = %path.display(), "Result written");
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn print_ops<F: OperationFamily>(family: &F) {
    let names: Vec<&str> = F::Kind::all().iter().map(|kind| kind.name()).collect();
    println!("{}: {}", family.family_name(), names.join(", "));
}
