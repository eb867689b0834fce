use anyhow::{bail, Context, Result};
use axoncore::{ExecutionStatus, NeuronStatus};
use axonruntime::{load_synapse_dir, Executor, HistoryManager, OutputSink};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "axon")]
#[command(about = "Runbook orchestrator: fire synapses of shell-script neurons", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a synapse directory
    Fire {
        /// Directory containing config.yml and neurons/
        dir: PathBuf,

        /// Environment pairs for condition evaluation, as KEY=VALUE
        #[arg(short, long = "env", value_parser = parse_key_val)]
        env: Vec<(String, String)>,
    },

    /// Validate a synapse directory without executing it
    Validate {
        dir: PathBuf,
    },

    /// Show past executions of a synapse
    History {
        name: String,
    },

    /// Show the detailed logs of one execution
    Logs {
        name: String,
        execution_id: Uuid,
    },
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("invalid KEY=VALUE pair: {raw}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Fire { dir, env } => fire(dir, env.into_iter().collect()).await,
        Commands::Validate { dir } => validate(dir),
        Commands::History { name } => history(&name),
        Commands::Logs { name, execution_id } => logs(&name, execution_id),
    }
}

async fn fire(dir: PathBuf, env: HashMap<String, String>) -> Result<()> {
    let synapse = load_synapse_dir(&dir)
        .with_context(|| format!("failed to load synapse from {}", dir.display()))?;

    let history = Arc::new(HistoryManager::with_default_dir()?);
    let mut executor = Executor::new(Some(history), OutputSink::stdout());
    executor.set_environment(env);

    let record = executor.execute(&synapse, &dir).await?;

    println!();
    println!(
        "Synapse {} finished: {} ({} ms, execution {})",
        synapse.name,
        status_label(record.status),
        record.duration_ms,
        record.id
    );
    for result in &record.neuron_results {
        println!(
            "  {:<10} {} (exit {})",
            neuron_status_label(result.status),
            result.name,
            result.exit_code
        );
    }

    if record.status == ExecutionStatus::Partial {
        bail!("one or more neurons failed");
    }
    Ok(())
}

fn validate(dir: PathBuf) -> Result<()> {
    let synapse = load_synapse_dir(&dir)
        .with_context(|| format!("failed to load synapse from {}", dir.display()))?;
    println!(
        "Synapse '{}' is valid ({} neurons, {:?} execution)",
        synapse.name,
        synapse.neurons.len(),
        synapse.execution
    );
    Ok(())
}

fn history(name: &str) -> Result<()> {
    let manager = HistoryManager::with_default_dir()?;
    let records = manager.get_history(name)?;
    if records.is_empty() {
        println!("No executions recorded for '{name}'");
        return Ok(());
    }

    for record in &records {
        println!(
            "{}  {}  {:<8}  {} ms  {} neurons",
            record.id,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            status_label(record.status),
            record.duration_ms,
            record.neuron_results.len()
        );
    }
    Ok(())
}

fn logs(name: &str, execution_id: Uuid) -> Result<()> {
    let manager = HistoryManager::with_default_dir()?;
    let record = manager.get_execution_logs(name, execution_id)?;

    println!(
        "Execution {} of '{}' at {}: {}",
        record.id,
        record.synapse_name,
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        status_label(record.status)
    );
    if let Some(message) = &record.error_message {
        println!("Error: {message}");
    }
    for result in &record.neuron_results {
        println!();
        println!(
            "--- {} [{}] exit {} ({} ms)",
            result.name,
            neuron_status_label(result.status),
            result.exit_code,
            result.duration_ms
        );
        if !result.stdout.is_empty() {
            println!("stdout:\n{}", result.stdout.trim_end());
        }
        if !result.stderr.is_empty() {
            println!("stderr:\n{}", result.stderr.trim_end());
        }
        if let Some(error) = &result.error {
            println!("error: {error}");
        }
    }
    Ok(())
}

fn status_label(status: ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::Running => "running",
        ExecutionStatus::Success => "success",
        ExecutionStatus::Failed => "failed",
        ExecutionStatus::Partial => "partial",
    }
}

fn neuron_status_label(status: NeuronStatus) -> &'static str {
    match status {
        NeuronStatus::Success => "success",
        NeuronStatus::Failed => "failed",
        NeuronStatus::Skipped => "skipped",
    }
}
