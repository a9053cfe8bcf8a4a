//! Rainfall gateway entrypoint: transforms prediction forms offline or forwards
//! them, and the stats / regional / health lookups, to the prediction service.

use clap::{Parser, Subcommand};
use rainfall_gateway::{
    config::GatewayConfig,
    features::{tables::region_listing, FeatureTransformer, FeatureVector, RawFormInput},
    gateway::BackendGateway,
    logging::StructuredLogger,
    prediction::PredictionInterpreter,
    GatewayError,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "rainfall-gateway")]
#[command(about = "Rainfall prediction gateway")]
struct Cli {
    /// Path to the JSON config file.
    #[arg(long, env = "RAINFALL_CONFIG_PATH", default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the prediction service's health endpoints in order.
    Health,

    /// Fetch aggregate rainfall statistics.
    Stats,

    /// Fetch statistics for one subdivision.
    Regional {
        #[arg(long)]
        subdivision: Option<String>,
    },

    /// Transform a form and send it for prediction.
    Predict {
        #[command(flatten)]
        input: InputArgs,

        /// Wrap the response with a rain verdict and confidence band.
        #[arg(long)]
        summary: bool,
    },

    /// Print the feature vector for a form without contacting the service.
    Transform {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Print a form pre-filled with a subdivision's typical rainfall.
    Template {
        #[arg(long, default_value = "KERALA")]
        subdivision: String,
    },

    /// List subdivisions by region group.
    Regions,
}

#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct InputArgs {
    /// Form JSON (`year`, `month`, `season`, `subdivision`, `rainToday`, `monthlyRainfall`).
    #[arg(long)]
    form: Option<PathBuf>,

    /// Loose feature record JSON, sanitized and re-encoded before sending.
    #[arg(long)]
    features: Option<PathBuf>,
}

/// Transformed input plus the form's annual total, when the input was a form.
struct PreparedInput {
    features: FeatureVector,
    annual: Option<f64>,
}

fn read_json(path: &Path) -> Result<Value, BoxError> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn prepare(input: &InputArgs, transformer: &FeatureTransformer) -> Result<PreparedInput, BoxError> {
    if let Some(path) = &input.form {
        let form: RawFormInput = serde_json::from_value(read_json(path)?)?;
        info!(subdivision = %form.subdivision, year = form.year, month = %form.month, "transforming form");
        return Ok(PreparedInput {
            features: transformer.transform_form(&form),
            annual: Some(form.annual_rainfall()),
        });
    }
    if let Some(path) = &input.features {
        let raw = read_json(path)?;
        return Ok(PreparedInput {
            features: transformer.transform(&raw),
            annual: None,
        });
    }
    Err("either --form or --features is required".into())
}

fn print(value: &impl Serialize) -> Result<(), BoxError> {
    StructuredLogger::emit_json(value, &mut std::io::stdout().lock())?;
    Ok(())
}

/// Print the success body or the error envelope; failures exit non-zero.
fn report<T: Serialize>(result: Result<T, GatewayError>) -> Result<ExitCode, BoxError> {
    match result {
        Ok(body) => {
            print(&body)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            warn!(error = %e, http_status = e.http_status(), "gateway call failed");
            print(&e.envelope())?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn connect(config: &GatewayConfig) -> Result<BackendGateway, BoxError> {
    info!(base_url = %config.backend.base_url, "prediction service");
    Ok(BackendGateway::new(config.backend.clone())?)
}

fn main() -> Result<ExitCode, BoxError> {
    let cli = Cli::parse();
    let (config, config_problem) = GatewayConfig::load_with_env(&cli.config);

    StructuredLogger::init(config.log.json, &config.log.level);
    if let Some(e) = config_problem {
        warn!(error = %e, "config file ignored; using defaults");
    }

    let transformer = FeatureTransformer::new(config.transform.clone());

    match cli.command {
        Commands::Transform { input } => {
            let prepared = prepare(&input, &transformer)?;
            print(&prepared.features)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Template { subdivision } => {
            print(&RawFormInput::template(&subdivision))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Regions => {
            print(&region_listing())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Health => report(connect(&config)?.probe_health()),
        Commands::Stats => report(connect(&config)?.forward_stats()),
        Commands::Regional { subdivision } => {
            report(connect(&config)?.forward_regional_data(subdivision.as_deref()))
        }
        Commands::Predict { input, summary } => {
            let prepared = prepare(&input, &transformer)?;
            let result = connect(&config)?.forward_predict(&prepared.features);
            if !summary {
                return report(result);
            }
            let interpreter = PredictionInterpreter::new(config.prediction.clone());
            report(result.map(|response| {
                let summary = interpreter.summarize(&response, prepared.annual);
                json!({ "response": response, "summary": summary })
            }))
        }
    }
}
