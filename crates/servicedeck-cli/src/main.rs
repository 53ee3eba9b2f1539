//! servicedeck CLI
//!
//! Headless front end over the engine: generate a service deck from an event
//! file, scaffold a starter template, or list a deck's slides.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::{anyhow, bail, Context as _};
use clap::{Parser, Subcommand};
use serde::Serialize;

use servicedeck_lib::core::deck::scaffold::scaffold_template;
use servicedeck_lib::jobs::{
    GenerationJob, GenerationRequest, JobEvent, JobProcessor, JobState, JobStatusReport,
    Shutdown, WorkerPool, WorkerPoolConfig,
};
use servicedeck_lib::{
    load_template, save_deck, AppSettings, EventInfo, GenerationPipeline, GenerationReport,
    SettingsManager, TemplateContract,
};

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "servicedeck", version, about = "Generate service slide decks from a template")]
struct Cli {
    /// Directory for daily-rolling log files (stderr only when omitted).
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the deck for one event and print its final status as JSON.
    Generate(GenerateArgs),
    /// Write a starter template satisfying a template contract.
    ScaffoldTemplate(ScaffoldArgs),
    /// List the slides of a deck with their texts.
    Inspect(InspectArgs),
    /// Show or reset the persisted settings.
    Settings(SettingsArgs),
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Event metadata JSON.
    #[arg(long)]
    event: PathBuf,

    /// Template deck (overrides settings).
    #[arg(long)]
    template: Option<PathBuf>,

    /// Output root; the deck goes to `generated_decks/` inside it.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Template contract: `v1`, `v2`, or a contract JSON file.
    #[arg(long)]
    contract: Option<String>,

    /// Cover label language (`en` or `ko`).
    #[arg(long)]
    language: Option<String>,

    /// Settings directory (defaults to the platform data dir).
    #[arg(long)]
    settings_dir: Option<PathBuf>,

    /// Correlation id for the job (a fresh ULID when omitted).
    #[arg(long)]
    job_id: Option<String>,
}

#[derive(Parser, Debug)]
struct ScaffoldArgs {
    /// Output deck path.
    #[arg(long)]
    out: PathBuf,

    /// Template contract: `v1`, `v2`, or a contract JSON file.
    #[arg(long, default_value = "v1")]
    contract: String,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Deck to list.
    deck: PathBuf,
}

#[derive(Parser, Debug)]
struct SettingsArgs {
    #[command(subcommand)]
    action: SettingsAction,

    /// Settings directory (defaults to the platform data dir).
    #[arg(long, global = true)]
    settings_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Print the effective settings as JSON.
    Show,
    /// Delete the settings file and print the defaults.
    Reset,
}

/// Final output of `generate`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateOutput {
    status: JobStatusReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<GenerationReport>,
}

/// Installs the global subscriber. Returns false when one was already set.
fn init_logging(log_dir: Option<&Path>) -> bool {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Logs go to stderr so stdout stays parseable JSON.
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions));

    let file_layer = log_dir.and_then(|dir| {
        std::fs::create_dir_all(dir).ok()?;
        let file_appender = tracing_appender::rolling::daily(dir, "servicedeck.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(guard);
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);

    match tracing::subscriber::set_global_default(subscriber) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("logging already initialised, keeping the existing subscriber: {e}");
            false
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_dir.as_deref());

    match cli.cmd {
        Command::Generate(args) => {
            let failed = cmd_generate(args).await?;
            if failed {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::ScaffoldTemplate(args) => cmd_scaffold(args),
        Command::Inspect(args) => cmd_inspect(args),
        Command::Settings(args) => cmd_settings(args),
    }
}

fn settings_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("servicedeck")
    })
}

/// Loads settings and applies command-line overrides
fn resolve_settings(args: &GenerateArgs) -> AppSettings {
    let manager = SettingsManager::new(settings_dir(args.settings_dir.clone()));
    let mut settings = manager.load();
    tracing::debug!("Settings loaded from {}", manager.settings_path().display());

    if let Some(contract) = &args.contract {
        settings.generation.contract_version = contract.clone();
    }
    if let Some(language) = &args.language {
        settings.general.language = language.clone();
    }
    if let Some(template) = &args.template {
        settings.generation.template_path = Some(template.display().to_string());
    }
    if let Some(out_dir) = &args.out_dir {
        settings.generation.output_dir = Some(out_dir.display().to_string());
    }
    settings
}

/// Runs one generation job to completion. Returns whether it failed.
async fn cmd_generate(args: GenerateArgs) -> anyhow::Result<bool> {
    let settings = resolve_settings(&args);

    let event_json = std::fs::read_to_string(&args.event)
        .with_context(|| format!("read event file '{}'", args.event.display()))?;
    let event: EventInfo = serde_json::from_str(&event_json)
        .with_context(|| format!("parse event file '{}'", args.event.display()))?;

    let template = settings
        .generation
        .template_path
        .clone()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("no template given: pass --template or set generation.templatePath"))?;
    let out_dir = settings
        .generation
        .output_dir
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let pipeline = GenerationPipeline::from_settings(&settings).context("configure pipeline")?;
    let request = GenerationRequest::new(event, template, out_dir);
    request
        .validate(pipeline.contract())
        .map_err(|e| anyhow!("invalid generation request: {e}"))?;

    let mut pool = WorkerPool::new(WorkerPoolConfig::from(&settings.workers));
    let mut events = pool
        .take_event_receiver()
        .ok_or_else(|| anyhow!("job event receiver already taken"))?;
    let shutdown = Shutdown::new();
    let workers = pool.spawn_workers(Arc::new(JobProcessor::new(pipeline)), shutdown.clone());

    let progress_log = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let JobEvent::Progress {
                job_id,
                percent,
                message,
            } = event
            {
                tracing::info!("[{}] {:>3}% {}", job_id, percent, message);
            }
        }
    });

    let mut job = GenerationJob::new(request);
    if let Some(id) = args.job_id {
        job = job.with_id(id);
    }
    let job_id = pool.submit(job).context("submit generation job")?;
    let job = pool
        .wait_for(&job_id)
        .await
        .ok_or_else(|| anyhow!("job {job_id} disappeared from the pool"))?;

    shutdown.trigger();
    for worker in workers {
        let _ = worker.await;
    }
    drop(pool);
    let _ = progress_log.await;

    let output = GenerateOutput {
        status: job.status_report(),
        report: job.report.clone(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(job.state == JobState::Failed)
}

fn cmd_scaffold(args: ScaffoldArgs) -> anyhow::Result<()> {
    let contract = TemplateContract::resolve(&args.contract)
        .with_context(|| format!("resolve contract '{}'", args.contract))?;
    let deck = scaffold_template(&contract)?;

    if args.out.exists() {
        bail!("refusing to overwrite '{}'", args.out.display());
    }
    save_deck(&deck, &args.out)?;

    eprintln!(
        "wrote {} ({} slides, contract {})",
        args.out.display(),
        deck.len(),
        contract.version
    );
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let deck = load_template(&args.deck)
        .with_context(|| format!("open deck '{}'", args.deck.display()))?;

    println!(
        "{} ({} slides, contract {})",
        deck.meta.title,
        deck.len(),
        deck.meta.contract_version.as_deref().unwrap_or("unknown")
    );
    for (index, slide) in deck.slides().iter().enumerate() {
        let texts: Vec<String> = slide
            .texts()
            .iter()
            .map(|t| t.replace('\n', " / "))
            .filter(|t| !t.is_empty())
            .collect();
        println!("{:>3} [{}] {}", index, slide.layout_id, texts.join(" | "));
    }
    Ok(())
}

fn cmd_settings(args: SettingsArgs) -> anyhow::Result<()> {
    let manager = SettingsManager::new(settings_dir(args.settings_dir));
    let settings = match args.action {
        SettingsAction::Show => manager.load(),
        SettingsAction::Reset => {
            let defaults = manager.reset().map_err(|e| anyhow!(e))?;
            eprintln!("reset {}", manager.settings_path().display());
            defaults
        }
    };
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn generate_args(settings_dir: &Path) -> GenerateArgs {
        GenerateArgs {
            event: PathBuf::from("event.json"),
            template: None,
            out_dir: None,
            contract: None,
            language: None,
            settings_dir: Some(settings_dir.to_path_buf()),
            job_id: None,
        }
    }

    #[test]
    fn test_flags_override_settings() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());
        let mut saved = AppSettings::default();
        saved.generation.template_path = Some("/srv/saved.deck".to_string());
        saved.generation.output_dir = Some("/srv/decks".to_string());
        manager.save(&saved).unwrap();

        let mut args = generate_args(dir.path());
        args.template = Some(PathBuf::from("/tmp/override.deck"));
        args.contract = Some("v2".to_string());

        let settings = resolve_settings(&args);
        assert_eq!(
            settings.generation.template_path.as_deref(),
            Some("/tmp/override.deck")
        );
        assert_eq!(settings.generation.output_dir.as_deref(), Some("/srv/decks"));
        assert_eq!(settings.generation.contract_version, "v2");
    }

    #[test]
    fn test_cli_parses_generate() {
        let cli = Cli::try_parse_from([
            "servicedeck",
            "generate",
            "--event",
            "event.json",
            "--contract",
            "v2",
            "--log-dir",
            "/tmp/logs",
        ])
        .unwrap();

        assert_eq!(cli.log_dir, Some(PathBuf::from("/tmp/logs")));
        match cli.cmd {
            Command::Generate(args) => {
                assert_eq!(args.event, PathBuf::from("event.json"));
                assert_eq!(args.contract.as_deref(), Some("v2"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_init_logging_twice_keeps_first_subscriber() {
        init_logging(None);
        assert!(!init_logging(None));
    }

    #[test]
    fn test_settings_reset_removes_saved_file() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());
        let mut saved = AppSettings::default();
        saved.general.language = "ko".to_string();
        manager.save(&saved).unwrap();

        let cli = Cli::try_parse_from([
            "servicedeck",
            "settings",
            "reset",
            "--settings-dir",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();
        match cli.cmd {
            Command::Settings(args) => cmd_settings(args).unwrap(),
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(!manager.settings_path().exists());
        assert_eq!(manager.load(), AppSettings::default());
    }

    #[test]
    fn test_scaffold_then_inspect() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("template.deck");

        cmd_scaffold(ScaffoldArgs {
            out: out.clone(),
            contract: "v2".to_string(),
        })
        .unwrap();
        assert_eq!(load_template(&out).unwrap().len(), 39);

        cmd_inspect(InspectArgs { deck: out.clone() }).unwrap();
        assert!(cmd_scaffold(ScaffoldArgs {
            out,
            contract: "v2".to_string(),
        })
        .is_err());
    }
}
