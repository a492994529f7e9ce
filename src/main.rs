// src/main.rs

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::{debug, info};

use alsa_explore::catalog::RateLadder;
use alsa_explore::config::ExploreConfig;

/// Command-line arguments for alsa-explore
#[derive(Parser, Debug)]
#[command(name = "alsa-explore")]
#[command(
    version,
    about = "Lists the ALSA playback devices, mixers, rates and formats usable by Shairport Sync",
    long_about = None
)]
struct Args {
    /// List every playback device with its full rate and format matrix
    #[arg(short, long)]
    extended: bool,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Scan the 48000-family rates instead of the 44100 family
    #[arg(long)]
    alternate: bool,

    /// Probe this PCM instead of enumerating the sound cards (repeatable)
    #[arg(long = "device", value_name = "NAME")]
    devices: Vec<String>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn load_config(args: &Args) -> Result<ExploreConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let config = ExploreConfig::load(path)?;
            info!("[explore] loaded {}", path);
            config
        }
        None => ExploreConfig::default(),
    };

    config.extended |= args.extended;
    config.json |= args.json;
    if args.alternate {
        config.ladder = RateLadder::Alternate;
    }
    if !args.devices.is_empty() {
        config.devices = args.devices.clone();
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;
    debug!("[explore] {:?}", config);

    explore(&config)
}

#[cfg(feature = "audio")]
fn explore(config: &ExploreConfig) -> Result<ExitCode> {
    use alsa_explore::backend::{AlsaCards, AlsaMixer, AlsaPcm};
    use alsa_explore::core::{NullSink, StdoutSink};
    use alsa_explore::report::{DeviceTarget, Explorer, ReportOptions, enumerate_targets};

    let targets = if config.devices.is_empty() {
        enumerate_targets(&AlsaCards)?
    } else {
        config
            .devices
            .iter()
            .map(|name| DeviceTarget::from_name(name))
            .collect()
    };

    if targets.is_empty() {
        log::error!("[explore] no sound cards found");
        return Ok(ExitCode::FAILURE);
    }

    let options = ReportOptions {
        extended: config.extended,
        ladder: config.ladder,
        include_alternate: config.include_alternate,
    };
    let explorer = Explorer::new(&AlsaPcm, &AlsaMixer, options);

    if config.json {
        let report = explorer.run(&targets, &config.device_dir, &mut NullSink);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        explorer.run(&targets, &config.device_dir, &mut StdoutSink);
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(not(feature = "audio"))]
fn explore(_config: &ExploreConfig) -> Result<ExitCode> {
    anyhow::bail!("built without ALSA support; rebuild with the `audio` feature")
}
