//! @ai:module:intent CLI for pairwise model benchmarks
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pairbench::{
    capability::list_capabilities,
    config::{BenchmarkConfig, DomainConfig, ModelConfig},
    dataset::{DatasetLoader, DatasetLoaderTrait},
    gateway::{GatewaySpec, MockGateway, ModelGateway, ProviderGateway},
    judge::JudgeProtocol,
    report::{comparison_table, load_run_result, summary_table, ReportGenerator},
    runner::Orchestrator,
    TestCase,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const DEFAULT_CONFIG_FILE: &str = "pairbench.toml";

/// Judge reply used for dry runs
const DRY_RUN_VERDICT: &str =
    r#"{"winner":"tie","score_A":5,"score_B":5,"reasons":["dry run: no judge call made"]}"#;

#[derive(Parser)]
#[command(name = "pairbench")]
#[command(about = "Pairwise LLM benchmark with an LLM judge and position-swap mitigation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a benchmark over a dataset
    Run {
        /// Path to a JSONL dataset file or a directory of them
        #[arg(short, long)]
        dataset: PathBuf,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Models to compare as provider/model (pass exactly twice)
        #[arg(short, long)]
        models: Vec<String>,

        /// Judge model as provider/model
        #[arg(long)]
        judge: Option<String>,

        /// Standalone domain TOML file
        #[arg(long)]
        domain: Option<PathBuf>,

        /// Only run the first N test cases
        #[arg(long)]
        max_items: Option<usize>,

        /// Test cases processed at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Abort on the first failed case instead of skipping it
        #[arg(long)]
        fail_fast: bool,

        /// Run without making API calls
        #[arg(long)]
        dry_run: bool,

        /// Output directory for results
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report formats (json, jsonl, markdown)
        #[arg(short, long)]
        format: Vec<String>,
    },

    /// Generate reports from a saved JSON result
    Report {
        /// Path to results JSON file
        #[arg(short, long)]
        results: PathBuf,

        /// Output directory for reports
        #[arg(short, long, default_value = "reports")]
        output: PathBuf,

        /// Report formats (json, jsonl, markdown)
        #[arg(short, long, default_values_t = vec!["markdown".to_string()])]
        format: Vec<String>,
    },

    /// Compare several saved JSON results
    Compare {
        /// Result files to compare
        #[arg(required = true)]
        results: Vec<PathBuf>,
    },

    /// Validate a dataset (and optionally a configuration)
    Validate {
        #[arg(short, long)]
        dataset: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List available capabilities
    Capabilities,

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },
}

struct RunArgs {
    dataset: PathBuf,
    config: Option<PathBuf>,
    models: Vec<String>,
    judge: Option<String>,
    domain: Option<PathBuf>,
    max_items: Option<usize>,
    concurrency: Option<usize>,
    fail_fast: bool,
    dry_run: bool,
    output: Option<PathBuf>,
    format: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pairbench=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            dataset,
            config,
            models,
            judge,
            domain,
            max_items,
            concurrency,
            fail_fast,
            dry_run,
            output,
            format,
        } => {
            run_benchmark(RunArgs {
                dataset,
                config,
                models,
                judge,
                domain,
                max_items,
                concurrency,
                fail_fast,
                dry_run,
                output,
                format,
            })
            .await
        }
        Commands::Report {
            results,
            output,
            format,
        } => generate_reports(results, output, format),
        Commands::Compare { results } => compare_results(results),
        Commands::Validate { dataset, config } => validate(dataset, config),
        Commands::Capabilities => {
            for (name, description) in list_capabilities() {
                println!("{:<20} {}", name, description);
            }
            Ok(())
        }
        Commands::Init { output } => init_config(output),
    }
}

/// @ai:intent Run a benchmark end to end and write the reports
/// @ai:effects network, fs:read, fs:write
async fn run_benchmark(args: RunArgs) -> Result<()> {
    let config = build_config(&args)?;
    config.validate()?;

    let loader = DatasetLoader::new();
    let dataset = loader
        .load_limited(&args.dataset, config.settings.max_items)
        .with_context(|| format!("Failed to load dataset {}", args.dataset.display()))?;

    if dataset.is_empty() {
        tracing::warn!("Dataset {} contains no test cases", args.dataset.display());
        return Ok(());
    }

    tracing::info!(
        "Loaded {} test cases from {}",
        dataset.len(),
        args.dataset.display()
    );

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight cases");
            flag.store(true, Ordering::SeqCst);
        }
    });

    if config.settings.dry_run {
        tracing::info!("Dry run: no API calls will be made");
        let gateway_a = Arc::new(MockGateway::new(format!(
            "[DRY RUN] response from {}",
            config.models[0].identity().display_name()
        )));
        let gateway_b = Arc::new(MockGateway::new(format!(
            "[DRY RUN] response from {}",
            config.models[1].identity().display_name()
        )));
        let judge = Arc::new(MockGateway::new(DRY_RUN_VERDICT));
        execute(&config, &dataset, gateway_a, gateway_b, judge, cancel).await
    } else {
        let settings = &config.settings;
        let connect = |spec: GatewaySpec| {
            ProviderGateway::connect(&spec, settings.requests_per_minute, settings.gateway_retries)
                .with_context(|| format!("Failed to set up {} gateway", spec.provider))
        };
        let gateway_a = Arc::new(connect(GatewaySpec::from(&config.models[0]))?);
        let gateway_b = Arc::new(connect(GatewaySpec::from(&config.models[1]))?);
        let judge = Arc::new(connect(GatewaySpec::from(&config.judge))?);
        execute(&config, &dataset, gateway_a, gateway_b, judge, cancel).await
    }
}

/// @ai:intent Orchestrate the run, print the summary and write every report
/// @ai:effects network, fs:write
async fn execute<G: ModelGateway, J: ModelGateway>(
    config: &BenchmarkConfig,
    dataset: &[TestCase],
    gateway_a: Arc<G>,
    gateway_b: Arc<G>,
    judge_gateway: Arc<J>,
    cancel: Arc<AtomicBool>,
) -> Result<()> {
    let judge = JudgeProtocol::from_config(judge_gateway, &config.judge);
    let orchestrator =
        Orchestrator::new(config, gateway_a, gateway_b, judge)?.with_cancel_flag(cancel);

    let result = orchestrator.run(dataset).await?;

    println!("\n{}", summary_table(&result));
    for failure in &result.failures {
        println!(
            "  failed: {} [{}] at {} ({}): {}",
            failure.case_id, failure.capability, failure.stage, failure.model, failure.error
        );
    }

    let paths = ReportGenerator::new().generate_all(
        &result,
        &config.output.directory,
        &config.output.formats,
    )?;
    for path in paths {
        println!("Saved {}", path.display());
    }

    Ok(())
}

/// @ai:intent Apply CLI overrides on top of the loaded configuration
/// @ai:effects fs:read
fn build_config(args: &RunArgs) -> Result<BenchmarkConfig> {
    let mut config = load_or_default_config(args.config.clone())?;

    if !args.models.is_empty() {
        config.models = args
            .models
            .iter()
            .map(|spec| ModelConfig::from_spec(spec))
            .collect::<Result<Vec<_>, _>>()?;
    }

    if let Some(judge) = &args.judge {
        let spec = ModelConfig::from_spec(judge)?;
        config.judge.provider = spec.provider;
        config.judge.model = spec.model;
    }

    if let Some(domain) = &args.domain {
        config.domain = DomainConfig::load(domain)?;
    }

    if args.max_items.is_some() {
        config.settings.max_items = args.max_items;
    }
    if let Some(concurrency) = args.concurrency {
        config.settings.concurrency = concurrency;
    }
    config.settings.fail_fast |= args.fail_fast;
    config.settings.dry_run |= args.dry_run;

    if let Some(output) = &args.output {
        config.output.directory = output.clone();
    }
    if !args.format.is_empty() {
        config.output.formats = args.format.clone();
    }

    Ok(config)
}

/// @ai:intent Re-render reports from a saved JSON result
/// @ai:effects fs:read, fs:write
fn generate_reports(results_path: PathBuf, output_dir: PathBuf, formats: Vec<String>) -> Result<()> {
    let result = load_run_result(&results_path)?;
    let paths = ReportGenerator::new().generate_all(&result, &output_dir, &formats)?;
    for path in paths {
        println!("Saved {}", path.display());
    }
    Ok(())
}

/// @ai:intent Print a table across several saved results
/// @ai:effects fs:read
fn compare_results(paths: Vec<PathBuf>) -> Result<()> {
    let results = paths
        .iter()
        .map(|path| load_run_result(path))
        .collect::<Result<Vec<_>>>()?;
    println!("{}", comparison_table(&results));
    Ok(())
}

/// @ai:intent Check a dataset (and configuration) without calling any model
/// @ai:effects fs:read
fn validate(dataset: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let config = load_or_default_config(config)?;
    config.validate()?;

    let cases = DatasetLoader::new().load(&dataset)?;

    let mut by_category: BTreeMap<&str, usize> = BTreeMap::new();
    for case in &cases {
        *by_category.entry(case.category.as_str()).or_default() += 1;
    }

    println!("Dataset validation passed!");
    println!("Total test cases: {}", cases.len());
    for (category, count) in by_category {
        println!("  - {}: {}", category, count);
    }

    Ok(())
}

/// @ai:intent Initialize default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    let config = BenchmarkConfig::default();
    config.save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:intent Load configuration or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<PathBuf>) -> Result<BenchmarkConfig> {
    let path = path.or_else(|| {
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        default_path.exists().then_some(default_path)
    });

    match path {
        Some(p) => Ok(BenchmarkConfig::load(&p)?),
        None => Ok(BenchmarkConfig::default()),
    }
}
