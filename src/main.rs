use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::path::PathBuf;

use kgentik::{FailurePolicy, KgentikError, KgentikTools, ToolSource};

mod cli;

use cli::Cli;
use cli::commands::Commands;

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kgentik")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("kgentik.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn source_label(source: ToolSource) -> ColoredString {
    match source {
        ToolSource::Local => source.as_str().green(),
        ToolSource::Team => source.as_str().cyan(),
        ToolSource::Community => source.as_str().magenta(),
    }
}

fn print_failure(err: &KgentikError) {
    match err {
        KgentikError::ResolutionFailed { failures } => {
            eprintln!("{} {} tool(s) failed to resolve", "Error:".red().bold(), failures.len());
            for failure in failures {
                eprintln!("  {} {}", "-".red(), failure);
            }
        }
        other => eprintln!("{} {}", "Error:".red().bold(), other),
    }
}

fn handle_check(tools: &KgentikTools, verbose: bool) -> Result<()> {
    let configuration = tools.load_configuration()?;
    println!(
        "{} {} ({} tool(s))",
        "Valid:".green().bold(),
        tools.config_path().display(),
        configuration.len()
    );
    for (position, declaration) in configuration.tools.iter().enumerate() {
        let location = declaration
            .file
            .as_ref()
            .map(|file| format!(" {}", file.display()))
            .unwrap_or_default();
        println!(
            "  {:>2}. {} [{}]{}",
            position,
            declaration.name.bold(),
            source_label(declaration.source),
            location.dimmed()
        );
        if verbose && let Some(description) = &declaration.description {
            println!("      {}", description.dimmed());
        }
    }
    Ok(())
}

async fn handle_list(tools: KgentikTools, collect_all: bool, json: bool) -> Result<()> {
    let tools = if collect_all {
        tools.with_policy(FailurePolicy::CollectAll)
    } else {
        tools
    };
    let set = match tools.get_tools().await {
        Ok(set) => set,
        Err(e) => {
            print_failure(&e);
            return Err(eyre!("Resolution failed for {}", tools.config_path().display()));
        }
    };

    if json {
        let schemas: Vec<_> = set.definitions().iter().map(|d| d.to_function_schema()).collect();
        println!("{}", serde_json::to_string_pretty(&schemas)?);
        return Ok(());
    }

    println!("{} {} tool(s)", "Resolved".green().bold(), set.len());
    for handle in &set {
        println!(
            "  {} [{}] {}",
            handle.name().bold(),
            source_label(handle.source()),
            handle.description()
        );
    }
    Ok(())
}

async fn handle_call(tools: &KgentikTools, name: &str, args: &str) -> Result<()> {
    let arguments: serde_json::Value =
        serde_json::from_str(args).context("Failed to parse --args as JSON")?;

    let set = tools.get_tools().await.context("Failed to resolve tools")?;
    let handle = set
        .get(name)
        .ok_or_else(|| eyre!("Tool '{}' is not declared in {}", name, tools.config_path().display()))?;

    info!("Calling '{}' ({})", name, handle.source());
    let result = handle
        .invoke(arguments)
        .await
        .with_context(|| format!("Tool '{}' failed", name))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn run_application(cli: &Cli, tools: KgentikTools) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{} {}", "Using".yellow(), tools);
    }

    match &cli.command {
        Some(Commands::Check) => handle_check(&tools, cli.is_verbose()),
        None => handle_list(tools, false, false).await,
        Some(Commands::List { collect_all, json }) => handle_list(tools, *collect_all, *json).await,
        Some(Commands::Call { name, args }) => handle_call(&tools, name, args).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();

    let tools = KgentikTools::new(cli.config.clone()).context("Failed to locate configuration")?;

    info!("Starting with config from: {}", tools.config_path().display());

    run_application(&cli, tools).await.context("Application failed")?;

    Ok(())
}
