//! CLI entrypoint for llm-consensus
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use consensus_application::{ConsensusParams, RunConsensusInput, RunConsensusUseCase};
use consensus_domain::{Model, OutputFormat, RunId};
use consensus_infrastructure::{
    ChannelRunLogger, ConfigLoader, FileConfig, FileResponseStore, OpenAiGateway, ReportWriter,
    load_models_file,
};
use consensus_presentation::{
    Cli, ConsoleFormatter, MarkdownFormatter, ProgressReporter, render,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = if cli.no_config {
        ConfigLoader::load_defaults()?
    } else {
        ConfigLoader::load(cli.config.as_deref())?
    };
    config.validate()?;

    if cli.show_config {
        show_config(&cli, &config);
        return Ok(());
    }

    if cli.no_color || !config.output.color {
        colored::control::set_override(false);
    }

    info!("Starting llm-consensus");

    let prompt = read_prompt(&cli)?;
    let models = resolve_models(&cli, &config)?;
    let params = resolve_params(&cli, &config)?;
    let run_id = match &cli.run_id {
        Some(id) => RunId::parse(id.as_str())?,
        None => RunId::generate(),
    };
    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output.dir.clone());
    let format: OutputFormat = cli
        .output
        .map(Into::into)
        .or(config.output.format)
        .unwrap_or_default();
    let save_report = !cli.no_save && config.output.save_report;

    // === Dependency Injection ===
    let (endpoint, api_key) = config.api.credentials()?;
    let gateway = Arc::new(OpenAiGateway::new(endpoint, api_key)?);
    let store = Arc::new(FileResponseStore::new(output_dir.clone()));
    let logger = Arc::new(ChannelRunLogger::new(output_dir.clone()));

    if !cli.quiet {
        eprintln!();
        eprintln!("Run:    {}", run_id);
        eprintln!(
            "Models: {}",
            models
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        eprintln!(
            "Judge:  {}",
            params.judge.as_ref().unwrap_or(&models[0])
        );
        eprintln!("Log:    {}", logger.path_for(&run_id).display());
        eprintln!();
    }

    let use_case =
        RunConsensusUseCase::new(gateway, store, params).with_logger(logger.clone());
    let input = RunConsensusInput::new(prompt, models).with_run_id(run_id.clone());

    // Execute with or without progress reporting
    let outcome = if cli.quiet {
        use_case.execute(input).await
    } else {
        let progress = ProgressReporter::new();
        use_case.execute_with_progress(input, &progress).await
    };

    // Flush the run log whether or not the run succeeded
    logger.shutdown().await;
    let result = outcome.with_context(|| format!("Consensus run {} failed", run_id))?;

    println!("{}", render(&ConsoleFormatter, &result, format));

    if save_report {
        let writer = ReportWriter::new(output_dir);
        match writer.save(&run_id, &MarkdownFormatter::format(&result)).await {
            Ok(path) if !cli.quiet => eprintln!("Report saved to {}", path.display()),
            Ok(_) => {}
            Err(e) => warn!("Failed to save report: {}", e),
        }
    }

    Ok(())
}

/// Prompt from the positional argument or `--prompt-file`
fn read_prompt(cli: &Cli) -> Result<String> {
    let prompt = match (&cli.prompt, &cli.prompt_file) {
        (Some(prompt), _) => prompt.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt file {}", path.display()))?,
        (None, None) => bail!("A prompt is required: pass it as an argument or use --prompt-file"),
    };
    if prompt.trim().is_empty() {
        bail!("The prompt is empty");
    }
    Ok(prompt)
}

/// Models from `-m`, then `--models-file`, then the config file
fn resolve_models(cli: &Cli, config: &FileConfig) -> Result<Vec<Model>> {
    let models = if !cli.model.is_empty() {
        cli.model
            .iter()
            .map(|name| name.parse::<Model>())
            .collect::<Result<Vec<_>, _>>()?
    } else if let Some(path) = &cli.models_file {
        load_models_file(path)?
    } else {
        config.consensus.parse_models()?
    };

    if models.is_empty() {
        bail!("No models configured: use -m, --models-file or [consensus] models in the config");
    }
    Ok(models)
}

/// Config values overridden by command-line flags
fn resolve_params(cli: &Cli, config: &FileConfig) -> Result<ConsensusParams> {
    let mut params = config.consensus.to_params()?;

    if let Some(secs) = cli.timeout {
        if secs == 0 {
            bail!("--timeout cannot be 0");
        }
        params = params.with_agent_timeout(Duration::from_secs(secs));
    }
    if let Some(judge) = &cli.judge {
        params = params.with_judge(Some(judge.parse::<Model>()?));
    }
    if let Some(domain) = &cli.domain {
        params = params.with_domain(domain.trim());
    }
    if cli.theoretical_framework {
        params = params.with_theoretical_framework(true);
    }
    Ok(params)
}

fn show_config(cli: &Cli, config: &FileConfig) {
    for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
        println!("{}", line);
    }

    let unset = || "(unset)".to_string();
    println!();
    println!("Effective configuration:");
    println!(
        "  api.endpoint                     = {}",
        config.api.endpoint.clone().unwrap_or_else(unset)
    );
    println!(
        "  api.api_key                      = {}",
        config.api.masked_key().unwrap_or_else(unset)
    );
    println!(
        "  consensus.models                 = [{}]",
        config.consensus.models.join(", ")
    );
    println!(
        "  consensus.models_file            = {}",
        config
            .consensus
            .models_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(unset)
    );
    println!(
        "  consensus.judge                  = {}",
        config.consensus.judge.clone().unwrap_or_else(unset)
    );
    println!("  consensus.domain                 = {}", config.consensus.domain);
    println!(
        "  consensus.agent_timeout_seconds  = {}",
        config.consensus.agent_timeout_seconds
    );
    println!(
        "  consensus.max_synthesis_attempts = {}",
        config.consensus.max_synthesis_attempts
    );
    println!(
        "  consensus.heartbeat_seconds      = {}",
        config.consensus.heartbeat_seconds
    );
    println!(
        "  output.dir                       = {}",
        config.output.dir.display()
    );
    println!("  output.save_report               = {}", config.output.save_report);
    println!(
        "  output.format                    = {}",
        config.output.format.unwrap_or_default()
    );
}
