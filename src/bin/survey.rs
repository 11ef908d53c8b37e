#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use survey_harness::brands::{BrandLookup, GeneratorBrandLookup};
use survey_harness::catalog::MetadataCatalog;
use survey_harness::config::{load_config, SurveyConfig};
use survey_harness::export::{catalog_sheets, ExportFormat, ExportInput, Workbook};
use survey_harness::gateway::{ChatGateway, NoopUsageSink, ProviderGateway, StderrUsageSink};
use survey_harness::generator::{GatewayGenerator, TextGenerator};
use survey_harness::pipeline::{GeneratedSurvey, SurveyPipeline};
use survey_harness::survey::{Methodology, SurveySpec};
use survey_harness::SurveyError;

#[derive(Parser)]
#[command(name = "survey", version, about = "Market-research survey planner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SpecArgs {
    /// Path to a SurveySpec JSON file
    #[arg(long, group = "input")]
    request: Option<PathBuf>,
    /// Survey objective (instead of --request)
    #[arg(long, group = "input", requires = "audience")]
    objective: Option<String>,
    #[arg(long)]
    audience: Option<String>,
    /// Length of interview in minutes
    #[arg(long)]
    loi: Option<u32>,
    #[arg(long)]
    market: Option<String>,
    #[arg(long)]
    population: Option<u32>,
    #[arg(long, value_enum)]
    methodology: Option<CliMethodology>,
    /// Planner config (.json or .toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify, budget and plan batches without calling a model
    Plan {
        #[command(flatten)]
        spec: SpecArgs,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a full questionnaire (requires OPENROUTER_API_KEY)
    Generate {
        #[command(flatten)]
        spec: SpecArgs,
        /// Session JSON output
        #[arg(long)]
        out: PathBuf,
        /// Also write these export formats next to the session file
        #[arg(long, value_enum)]
        export: Vec<CliFormat>,
        /// Skip the model brand lookup and use the static table
        #[arg(long)]
        no_brand_lookup: bool,
        /// Print one usage JSON line per provider call to stderr
        #[arg(long)]
        usage_log: bool,
    },
    /// Render a saved session in another format
    Export {
        #[arg(long)]
        session: PathBuf,
        #[arg(long, value_enum)]
        format: CliFormat,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the metadata catalog as workbook sheets
    Catalog {
        /// Output file; `.xlsx` writes a workbook, anything else JSON
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    Text,
    Markdown,
    Document,
    Workbook,
}

impl From<CliFormat> for ExportFormat {
    fn from(f: CliFormat) -> Self {
        match f {
            CliFormat::Text => ExportFormat::Text,
            CliFormat::Markdown => ExportFormat::Markdown,
            CliFormat::Document => ExportFormat::Document,
            CliFormat::Workbook => ExportFormat::Workbook,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMethodology {
    Online,
    Phone,
    FaceToFace,
    MobileApp,
}

impl From<CliMethodology> for Methodology {
    fn from(m: CliMethodology) -> Self {
        match m {
            CliMethodology::Online => Methodology::Online,
            CliMethodology::Phone => Methodology::Phone,
            CliMethodology::FaceToFace => Methodology::FaceToFace,
            CliMethodology::MobileApp => Methodology::MobileApp,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { spec, out } => {
            let config = load_config_opt(spec.config.as_deref())?;
            let survey = build_spec(&spec)?;
            let plan = SurveyPipeline::new(config).plan(&survey, None).await?;
            match out {
                Some(path) => write_json(&path, &plan)?,
                None => println!("{}", serde_json::to_string_pretty(&plan)?),
            }
        }
        Commands::Generate {
            spec,
            out,
            export,
            no_brand_lookup,
            usage_log,
        } => {
            let config = load_config_opt(spec.config.as_deref())?;
            let survey = build_spec(&spec)?;
            survey.validate()?;

            let gateway: Arc<dyn ChatGateway> = if usage_log {
                Arc::new(
                    ProviderGateway::from_env(Arc::new(StderrUsageSink))
                        .map_err(|e| SurveyError::configuration(e.to_string()))?,
                )
            } else {
                Arc::new(
                    ProviderGateway::from_env(Arc::new(NoopUsageSink))
                        .map_err(|e| SurveyError::configuration(e.to_string()))?,
                )
            };

            let run_id = Uuid::new_v4();
            let generator: Arc<dyn TextGenerator> =
                Arc::new(GatewayGenerator::new(gateway, config.model.clone()).with_run(run_id));
            let lookup = (config.brand_lookup && !no_brand_lookup)
                .then(|| GeneratorBrandLookup::new(generator.clone()));

            let session = SurveyPipeline::new(config)
                .generate(
                    run_id,
                    &survey,
                    generator.as_ref(),
                    lookup.as_ref().map(|l| l as &dyn BrandLookup),
                )
                .await?;

            write_json(&out, &session)?;
            for format in export {
                let format = ExportFormat::from(format);
                let path = out.with_extension(format!(
                    "{}.{}",
                    format.as_str(),
                    format.exporter().extension()
                ));
                write_export(&session, format, &path)?;
                eprintln!("[survey] wrote {}", path.display());
            }

            let report = &session.report;
            eprintln!(
                "[survey] {} of {} questions, {} discrepancies, cost ${:.4}",
                report.actual_count,
                report.planned_total,
                report.discrepancies.len(),
                session.usage.cost_dollars()
            );
            for d in &report.discrepancies {
                eprintln!("[survey]   {}", d.describe());
            }
        }
        Commands::Export {
            session,
            format,
            out,
        } => {
            let raw = std::fs::read_to_string(&session)?;
            let session: GeneratedSurvey = serde_json::from_str(&raw)?;
            write_export(&session, format.into(), &out)?;
        }
        Commands::Catalog { out } => {
            let sheets = catalog_sheets(MetadataCatalog::global());
            match out {
                Some(path) if has_extension(&path, "xlsx") => {
                    std::fs::write(&path, Workbook { sheets }.to_xlsx()?)?
                }
                Some(path) => write_json(&path, &sheets)?,
                None => println!("{}", serde_json::to_string_pretty(&sheets)?),
            }
        }
    }

    Ok(())
}

fn load_config_opt(path: Option<&Path>) -> Result<SurveyConfig, SurveyError> {
    match path {
        Some(p) => load_config(p),
        None => Ok(SurveyConfig::default()),
    }
}

fn build_spec(args: &SpecArgs) -> Result<SurveySpec, Box<dyn std::error::Error>> {
    let mut spec = if let Some(path) = &args.request {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str::<SurveySpec>(&raw)?
    } else if let (Some(objective), Some(audience)) = (&args.objective, &args.audience) {
        SurveySpec::new(objective.clone(), audience.clone())
    } else {
        return Err("provide --request or --objective with --audience".into());
    };
    if let Some(loi) = args.loi {
        spec = spec.loi(loi);
    }
    if let Some(market) = &args.market {
        spec = spec.market(market.clone());
    }
    if let Some(population) = args.population {
        spec = spec.population(population);
    }
    if let Some(methodology) = args.methodology {
        spec = spec.methodology(methodology.into());
    }
    Ok(spec)
}

fn write_export(
    session: &GeneratedSurvey,
    format: ExportFormat,
    path: &Path,
) -> Result<(), SurveyError> {
    let bytes = format.exporter().export(&ExportInput::from_session(session))?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), std::io::Error> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}
