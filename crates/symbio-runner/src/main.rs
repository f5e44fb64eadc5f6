//! Head-less runner for symbiosis experiments.

mod logging;
mod recorder;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use logging::LogFormat;
use recorder::DataRecorder;
use std::path::PathBuf;
use symbio_core::SymConfig;
use symbio_world::Experiment;
use tracing::info;

#[derive(Parser)]
#[command(name = "symbio")]
#[command(about = "Host-symbiont co-evolution simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an experiment
    Run {
        /// JSON configuration file; defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override one option, e.g. `--set SEED=4`
        #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,

        #[arg(long, value_enum, default_value = "text")]
        log_format: LogFormat,
    },
    /// Write the default configuration to a file
    Init {
        #[arg(short, long, default_value = "symbio.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            overrides,
            log_format,
        } => {
            logging::init_logging(log_format)?;
            let config = load_config(config, &overrides)?;
            run(config)
        }
        Commands::Init { output } => {
            let json = serde_json::to_string_pretty(&SymConfig::default())?;
            std::fs::write(&output, json)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("Default configuration written to {}", output.display());
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>, overrides: &[String]) -> Result<SymConfig> {
    let mut config = match path {
        Some(path) => SymConfig::load(&path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => SymConfig::default(),
    };

    for entry in overrides {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("override `{}` is not of the form KEY=VALUE", entry);
        };
        config
            .set_option(key.trim(), value.trim())
            .with_context(|| format!("applying override `{}`", entry))?;
    }

    config.validate()?;
    Ok(config)
}

fn run(config: SymConfig) -> Result<()> {
    let mut experiment = Experiment::new(config)?;
    info!(
        run_id = %experiment.run_id(),
        seed = experiment.seed(),
        hosts = experiment.world().size(),
        "Experiment ready"
    );

    let output = DataRecorder::output_path(experiment.config(), experiment.seed());
    let mut recorder = match output {
        Some(path) => Some(DataRecorder::create(
            path,
            experiment.run_id(),
            experiment.seed(),
            experiment.config(),
        )?),
        None => None,
    };

    experiment.run_with(|stats| match recorder.as_mut() {
        Some(recorder) => recorder.record(stats),
        None => Ok(()),
    })?;

    if let Some(recorder) = recorder {
        let path = recorder.path().to_path_buf();
        let samples = recorder.finish()?;
        info!(path = %path.display(), samples, "Data written");
    }

    let result = experiment.finish();
    if result.final_stats.is_extinct() {
        info!(update = result.final_stats.update, "Host population went extinct");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_applied() {
        let overrides = vec!["SEED=4".to_string(), "GRID= true".to_string()];
        let config = load_config(None, &overrides).unwrap();
        assert_eq!(config.seed, 4);
        assert!(config.grid);
    }

    #[test]
    fn test_malformed_override_rejected() {
        assert!(load_config(None, &["SEED".to_string()]).is_err());
        assert!(load_config(None, &["NOT_AN_OPTION=1".to_string()]).is_err());
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let overrides = vec!["BURST_SIZE=7".to_string()];
        assert!(load_config(None, &overrides).is_err());
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::parse_from(["symbio", "run", "--set", "SEED=3", "-s", "UPDATES=5"]);
        match cli.command {
            Commands::Run { overrides, config, log_format } => {
                assert_eq!(overrides, vec!["SEED=3", "UPDATES=5"]);
                assert!(config.is_none());
                assert_eq!(log_format, LogFormat::Text);
            }
            Commands::Init { .. } => panic!("expected run"),
        }
    }
}
