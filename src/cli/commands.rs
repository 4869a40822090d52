//! CLI command definitions for ideaforge.
//!
//! Wires the store, generation client, corpus and catalog together, then
//! dispatches to the pipeline. The `explore` command polls the store for
//! progress until the batch reaches a terminal state.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::corpus::FileCorpus;
use crate::llm::LiteLlmClient;
use crate::model::{ReportStatus, ScopeReport};
use crate::pipeline::{
    BatchCoordinator, ExplorationEngine, PipelineConfig, SynthesisEngine,
};
use crate::store::{ExplorationStore, PgStore};

/// Seconds between progress polls while waiting on a batch.
const POLL_INTERVAL_SECS: u64 = 5;

/// Concept exploration and report synthesis over a document corpus.
#[derive(Parser)]
#[command(name = "ideaforge")]
#[command(about = "Explore product concepts across audience segments and opportunity themes")]
#[command(version)]
#[command(
    long_about = "ideaforge runs an exploration batch over every (segment, theme) pattern, \
scores the generated concepts, and synthesizes per-segment and overview reports.\n\n\
Example usage:\n  ideaforge explore --corpus ./corpus\n  ideaforge reports <batch-id> --json"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Optional YAML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Start an exploration batch over the full pattern universe.
    #[command(alias = "run")]
    Explore(ExploreArgs),

    /// Show progress of a batch.
    Status(StatusArgs),

    /// Cancel a running batch at the next chunk boundary.
    Cancel(BatchIdArgs),

    /// Resume any batch left running by a previous process.
    Resume,

    /// Synthesize (or regenerate) all scope reports for a batch.
    Synthesize(SynthesizeArgs),

    /// Show the scope reports of a batch, filling in missing scopes first.
    Reports(ReportsArgs),

    /// Delete all batches, result items and reports.
    #[command(name = "delete-all")]
    DeleteAll(DeleteAllArgs),
}

/// Arguments for `ideaforge explore`.
#[derive(Parser, Debug)]
pub struct ExploreArgs {
    /// Directory of .md/.txt corpus documents.
    #[arg(long, env = "IDEAFORGE_CORPUS_DIR")]
    pub corpus: Option<PathBuf>,

    /// Return immediately instead of waiting for the batch to finish.
    #[arg(long)]
    pub detach: bool,
}

/// Arguments for `ideaforge status`.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Batch id to inspect.
    pub batch_id: Uuid,

    /// Output the status as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for commands addressing one batch.
#[derive(Parser, Debug)]
pub struct BatchIdArgs {
    /// Batch id to operate on.
    pub batch_id: Uuid,
}

/// Arguments for `ideaforge synthesize`.
#[derive(Parser, Debug)]
pub struct SynthesizeArgs {
    /// Batch id to synthesize reports for.
    pub batch_id: Uuid,

    /// Delete existing reports and regenerate every scope.
    #[arg(long)]
    pub regenerate: bool,
}

/// Arguments for `ideaforge reports`.
#[derive(Parser, Debug)]
pub struct ReportsArgs {
    /// Batch id to show reports for.
    pub batch_id: Uuid,

    /// Output the reports as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `ideaforge delete-all`.
#[derive(Parser, Debug)]
pub struct DeleteAllArgs {
    /// Skip the confirmation prompt.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Parse CLI arguments without running the command.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_yaml_file(path)?,
        None => PipelineConfig::default(),
    }
    .with_env_overrides()?;

    match cli.command {
        Commands::Explore(args) => {
            if let Some(corpus) = args.corpus {
                config.corpus_dir = corpus;
            }
            config.validate()?;
            run_explore_command(config, args.detach).await?;
        }
        Commands::Status(args) => {
            config.validate()?;
            run_status_command(config, args).await?;
        }
        Commands::Cancel(args) => {
            config.validate()?;
            let pipeline = Pipeline::build(config).await?;
            pipeline.coordinator.cancel_batch(args.batch_id).await?;
            println!("Cancellation requested for batch {}", args.batch_id);
        }
        Commands::Resume => {
            config.validate()?;
            run_resume_command(config).await?;
        }
        Commands::Synthesize(args) => {
            config.validate()?;
            run_synthesize_command(config, args).await?;
        }
        Commands::Reports(args) => {
            config.validate()?;
            run_reports_command(config, args).await?;
        }
        Commands::DeleteAll(args) => {
            config.validate()?;
            run_delete_all_command(config, args).await?;
        }
    }
    Ok(())
}

/// Fully wired pipeline components.
struct Pipeline {
    coordinator: Arc<BatchCoordinator>,
    synthesis: Arc<SynthesisEngine>,
    catalog: Arc<Catalog>,
    store: Arc<dyn ExplorationStore>,
}

impl Pipeline {
    /// Connects the store, applies migrations, and wires everything together.
    async fn build(config: PipelineConfig) -> anyhow::Result<Self> {
        let catalog = match &config.catalog_file {
            Some(path) => Catalog::from_json_file(path)?,
            None => Catalog::default(),
        };
        let catalog = Arc::new(catalog);

        let store = PgStore::connect(&config.database_url).await?;
        store.run_migrations().await?;
        let store: Arc<dyn ExplorationStore> = Arc::new(store);

        let llm = Arc::new(LiteLlmClient::from_env()?);
        let corpus = Arc::new(FileCorpus::new(config.corpus_dir.clone()));

        let engine = Arc::new(ExplorationEngine::new(
            Arc::clone(&store),
            llm.clone() as Arc<dyn crate::llm::LlmProvider>,
            corpus,
            Arc::clone(&catalog),
            config.clone(),
        ));

        let coordinator = Arc::new(BatchCoordinator::new(
            Arc::clone(&store),
            engine,
            Arc::clone(&catalog),
        ));

        let synthesis = Arc::new(SynthesisEngine::new(
            Arc::clone(&store),
            llm as Arc<dyn crate::llm::LlmProvider>,
            config,
        ));

        Ok(Self {
            coordinator,
            synthesis,
            catalog,
            store,
        })
    }
}

/// Starts a batch and, unless detached, polls until it reaches a terminal
/// state.
async fn run_explore_command(config: PipelineConfig, detach: bool) -> anyhow::Result<()> {
    let pipeline = Pipeline::build(config).await?;

    let started = pipeline.coordinator.start_batch().await?;
    println!(
        "Started batch {} ({} patterns)",
        started.batch_id, started.total_patterns
    );

    if detach {
        return Ok(());
    }

    loop {
        tokio::time::sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;

        let view = pipeline.coordinator.get_status(started.batch_id).await;
        info!(
            state = %view.state,
            completed = view.completed_patterns,
            total = view.total_patterns,
            items = view.total_result_items,
            errors = view.error_count,
            "Batch progress"
        );

        if view.state != "running" {
            println!(
                "Batch {} finished: {} ({}/{} patterns, {} result items, {} errors)",
                started.batch_id,
                view.state,
                view.completed_patterns,
                view.total_patterns,
                view.total_result_items,
                view.error_count,
            );
            break;
        }
    }

    Ok(())
}

async fn run_status_command(config: PipelineConfig, args: StatusArgs) -> anyhow::Result<()> {
    let pipeline = Pipeline::build(config).await?;
    let view = pipeline.coordinator.get_status(args.batch_id).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("State:           {}", view.state);
    println!(
        "Patterns:        {}/{}",
        view.completed_patterns, view.total_patterns
    );
    println!("Result items:    {}", view.total_result_items);
    println!("Current chunk:   {}", view.current_chunk_label);
    println!("Pattern errors:  {}", view.error_count);

    Ok(())
}

/// Resumes interrupted batches and waits for them to finish.
async fn run_resume_command(config: PipelineConfig) -> anyhow::Result<()> {
    let pipeline = Pipeline::build(config).await?;

    let resumed = pipeline.coordinator.resume_running_batches().await?;
    if resumed.is_empty() {
        println!("No interrupted batches found");
        return Ok(());
    }
    println!("Resumed {} batch(es)", resumed.len());

    loop {
        tokio::time::sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;

        let mut all_done = true;
        for batch_id in &resumed {
            let view = pipeline.coordinator.get_status(*batch_id).await;
            if view.state == "running" {
                all_done = false;
            }
        }
        if all_done {
            println!("All resumed batches finished");
            return Ok(());
        }
    }
}

async fn run_synthesize_command(config: PipelineConfig, args: SynthesizeArgs) -> anyhow::Result<()> {
    let pipeline = Pipeline::build(config).await?;
    let scopes = pipeline.catalog.scopes();

    if args.regenerate {
        pipeline
            .synthesis
            .regenerate(args.batch_id, &scopes)
            .await?;
    } else {
        pipeline
            .synthesis
            .auto_fill_missing(args.batch_id, &scopes)
            .await?;
    }

    let reports = pipeline.store.reports_for_batch(args.batch_id).await?;
    println!("Synthesized {} scope report(s)", reports.len());
    for report in &reports {
        println!("  {} [{}]", report.scope_name, report.status);
    }

    Ok(())
}

async fn run_reports_command(config: PipelineConfig, args: ReportsArgs) -> anyhow::Result<()> {
    let pipeline = Pipeline::build(config).await?;
    let scopes = pipeline.catalog.scopes();

    let reports = pipeline.synthesis.reports(args.batch_id, &scopes).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        print_report(report);
    }

    Ok(())
}

async fn run_delete_all_command(config: PipelineConfig, args: DeleteAllArgs) -> anyhow::Result<()> {
    if !args.yes {
        anyhow::bail!("Refusing to delete all data without --yes");
    }

    let pipeline = Pipeline::build(config).await?;
    let deleted = pipeline.coordinator.delete_all().await?;
    println!("Deleted {} batch(es) and all associated data", deleted);

    Ok(())
}

fn print_report(report: &ScopeReport) {
    println!("\n## {} [{}]", report.scope_name, report.status);
    match report.status {
        ReportStatus::Completed => {
            for section in &report.sections {
                println!("\n### {}\n{}", section.heading, section.body);
            }
        }
        ReportStatus::Failed => {
            println!(
                "Synthesis failed: {}",
                report.error.as_deref().unwrap_or("unknown error")
            );
        }
        ReportStatus::Generating => {
            println!("Synthesis still in progress");
        }
    }
}
