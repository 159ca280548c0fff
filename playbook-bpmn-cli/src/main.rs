//! playbook-bpmn - convert YAML security playbooks to BPMN 2.0 XML
//!
//! Usage:
//!   playbook-bpmn batch
//!   playbook-bpmn convert <file> --phase <dir>

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod convert;
mod discovery;

use config::{ConverterConfig, CONFIG_ENV_VAR};
use convert::Converter;

const DEFAULT_LOG_FILTER: &str = "playbook_bpmn=info,playbook_bpmn_core=info";

#[derive(Parser)]
#[command(name = "playbook-bpmn")]
#[command(about = "Convert YAML security playbooks into BPMN 2.0 process diagrams")]
struct Cli {
    /// Converter config file (YAML)
    #[arg(long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Output directory (overrides config)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Playbooks root directory (overrides config)
    #[arg(long, global = true)]
    playbooks: Option<PathBuf>,

    /// Also write the combined playbook YAML
    #[arg(long, global = true)]
    emit_yaml: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Discover and convert every playbook under the playbooks root
    Batch {
        /// Only convert these playbook directories
        #[arg(long = "only", value_name = "PLAYBOOK")]
        only: Vec<String>,
    },

    /// Convert a single playbook file
    Convert {
        /// Playbook YAML file
        file: PathBuf,
        /// Phase directory used for module lookup (defaults to the file's directory)
        #[arg(long)]
        phase: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let mut config = ConverterConfig::load(cli.config.as_deref())?;
    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    if let Some(playbooks) = cli.playbooks {
        config.playbooks_root = playbooks;
    }
    if cli.emit_yaml {
        config.emit_combined_yaml = true;
    }

    match cli.command {
        Command::Batch { only } => {
            if !only.is_empty() {
                config.only_playbooks = Some(only);
            }
            let report = Converter::new(config).run_batch()?;
            for (file, reason) in &report.failed {
                eprintln!("FAILED {}: {}", file.display(), reason);
            }
            if !report.is_success() {
                bail!(
                    "{} of {} playbooks failed",
                    report.failed.len(),
                    report.failed.len() + report.converted.len()
                );
            }
        }
        Command::Convert { file, phase } => {
            let phase_dir = match phase {
                Some(dir) => dir,
                None => file
                    .parent()
                    .map(Path::to_path_buf)
                    .context("Cannot derive phase directory from file path")?,
            };
            let converter = Converter::new(config);
            let (conversion, path) = converter.convert_file(&file, &phase_dir)?;
            for diagnostic in &conversion.diagnostics {
                eprintln!("{}", diagnostic);
            }
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        None => {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}
