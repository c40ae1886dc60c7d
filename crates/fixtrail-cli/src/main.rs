mod nmea;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing::{info, warn};

use fixtrail_log::{doctor, Fix, FixLog, WriterConfig};

#[derive(Debug, Parser)]
#[command(name = "fixtrail", version, about = "fixtrail - fixed-column text log of positioning fixes")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check the configuration without writing anything.
    Doctor,
    /// Feed the configured source into the text log until it ends or Ctrl-C.
    Run {
        /// Echo every fix to the log (overrides writer.debug).
        #[arg(long)]
        debug: bool,
    },
}

#[derive(Debug, serde::Deserialize)]
struct Config {
    output: OutputCfg,
    #[serde(default)]
    writer: WriterConfig,
    source: SourceCfg,
}

#[derive(Debug, serde::Deserialize)]
struct OutputCfg { path: String }

#[derive(Debug, serde::Deserialize)]
struct SourceCfg {
    kind: String,
    nmea_file: Option<String>,
    #[serde(default)]
    follow: bool,
}

fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).context("read config")?;
    toml::from_str(&s).context("parse config toml")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => run_doctor(&cfg)?,
        Command::Run { debug } => run(&cfg, debug).await?,
    }
    Ok(())
}

fn run_doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");

    doctor::check_output_path(Path::new(&cfg.output.path))?;
    doctor::check_writer_config(&cfg.writer)?;

    match cfg.source.kind.as_str() {
        "nmea-file" => {
            let f = cfg.source.nmea_file.as_ref().context("source.nmea_file missing")?;
            anyhow::ensure!(Path::new(f).is_file(), "source.nmea_file {} not found", f);
        }
        other => anyhow::bail!("unknown source.kind: {}", other),
    }

    info!("doctor: OK");
    Ok(())
}

async fn run(cfg: &Config, debug: bool) -> Result<()> {
    info!("run: starting");
    run_doctor(cfg)?;

    let mut src = match cfg.source.kind.as_str() {
        "nmea-file" => nmea::NmeaSource::file(
            cfg.source.nmea_file.as_ref().context("source.nmea_file missing")?,
            cfg.source.follow,
        )?,
        other => anyhow::bail!("unknown source.kind: {}", other),
    };

    let log = FixLog::open(&cfg.output.path, &cfg.writer)
        .await
        .context("open output")?;
    if debug {
        log.set_debug(true);
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    // Errors end the track but still go through the final flush below.
    let mut result = Ok(());
    loop {
        tokio::select! {
            next = src.next_fix() => match next {
                Ok(Some(fix)) => {
                    if let Err(e) = log.submit(Fix::Observed(fix)) {
                        result = Err(e).context("submit fix");
                        break;
                    }
                }
                Ok(None) => {
                    info!("run: end of track");
                    break;
                }
                Err(e) => {
                    warn!("source failed: {:#}", e);
                    break;
                }
            },
            _ = &mut ctrl_c => {
                info!("run: interrupted");
                break;
            }
        }
    }

    let submitted = log.submitted();
    log.request_stop();
    log.join().await.context("writer task")?;
    info!(submitted, path = %cfg.output.path, "run: done");
    result
}
