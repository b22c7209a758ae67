//! loopwatch - developer harness for the conversation monitor
//!
//! Replays recorded transcripts through a fresh monitor and prints how the
//! conversation's stage, score and loop count evolve turn by turn.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use loopwatch::{ContextLabel, ConversationMonitor, MonitorConfig, MonitorError, Role};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "loopwatch")]
#[command(version = "0.1.0")]
#[command(about = "Conversation progress and loop-detection monitor", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Monitor configuration file (.json or .toml)
    #[arg(short, long, global = true, env = "LOOPWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON transcript through the monitor
    Replay {
        /// Transcript file: [{"role": "user"|"agent", "text": "...", "context": "..."}]
        transcript: PathBuf,

        /// Session id to record the transcript under
        #[arg(short, long, default_value = "replay")]
        session: String,

        /// Print the final status snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Print the intervention prompt after the last turn
        #[arg(long)]
        prompt: bool,
    },

    /// Validate and print the effective configuration
    Config,
}

/// One transcript entry. Role and context stay strings here so that bad
/// values are rejected by the library's own parsers.
#[derive(Debug, Deserialize)]
struct TranscriptTurn {
    role: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    context: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    if let Err(err) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        let code = err
            .downcast_ref::<MonitorError>()
            .map_or(1, MonitorError::exit_code);
        std::process::exit(code);
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        "loopwatch=debug,info"
    } else {
        "loopwatch=info,warn"
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<MonitorConfig> {
    match path {
        Some(path) => MonitorConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(MonitorConfig::default()),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Replay {
            transcript,
            session,
            json,
            prompt,
        } => replay(config, &transcript, &session, json, prompt),

        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn replay(
    config: MonitorConfig,
    transcript: &Path,
    session: &str,
    json: bool,
    prompt: bool,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(transcript)
        .with_context(|| format!("reading transcript {}", transcript.display()))?;
    let turns: Vec<TranscriptTurn> = serde_json::from_str(&content)
        .map_err(MonitorError::from)
        .with_context(|| format!("parsing transcript {}", transcript.display()))?;

    let monitor = ConversationMonitor::new(config);

    if !json {
        println!(
            "\n{} {} ({} turns)",
            "Replay:".cyan().bold(),
            transcript.display(),
            turns.len()
        );
        println!("{}", "─".repeat(60));
    }

    for (index, turn) in turns.iter().enumerate() {
        let role: Role = turn
            .role
            .parse()
            .with_context(|| format!("turn {}", index))?;
        let context = turn
            .context
            .as_deref()
            .map(str::parse::<ContextLabel>)
            .transpose()
            .with_context(|| format!("turn {}", index))?;

        let status = monitor.add_message(session, role, &turn.text, context);

        if !json {
            let marker = if status.needs_intervention {
                " !".red().bold().to_string()
            } else {
                String::new()
            };
            println!(
                "   {:>3} {:<5} {}{}",
                index,
                role.to_string(),
                status.summary(),
                marker
            );
        }
    }

    let status = monitor.status(session);
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{}", "─".repeat(60));
        println!(
            "   Path: {}",
            status
                .resolution_path
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        println!(
            "   Guidance: {} - {}",
            status.guidance.issue.to_string().yellow(),
            status.guidance.suggestion
        );
    }

    if prompt {
        let text = monitor.intervention_prompt(session);
        if text.is_empty() {
            println!("{}", "No intervention needed".green());
        } else {
            println!("{}", text);
        }
    }

    Ok(())
}
