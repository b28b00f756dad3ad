// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
mod audio;
mod config;
mod dispatch;
mod instrument;
mod midi;
mod samples;
#[cfg(test)]
mod testutil;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use clap::{crate_version, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::{Logging, SamplerConfig};
use dispatch::Dispatcher;
use instrument::Instrument;
use samples::{NoteRegistry, SampleLoader};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A MIDI-triggered sample player.",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// The path to the sampler config. Starts the sampler.
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available MIDI devices.
    MidiDevices {},
    /// Lists the available audio output devices.
    Devices {},
    /// Validates a sampler config and prints it with defaults applied.
    Verify {
        /// The path to the sampler config.
        config: PathBuf,
    },
}

/// Initializes the tracing subscriber. RUST_LOG takes precedence over the config's toggles.
fn init_tracing(logging: &Logging) -> Result<(), Box<dyn Error>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(logging.filter_directives())?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match (cli.command, cli.config) {
        (Some(Commands::MidiDevices {}), _) => {
            init_tracing(&Logging::default())?;
            let devices = midi::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        (Some(Commands::Devices {}), _) => {
            init_tracing(&Logging::default())?;
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        (Some(Commands::Verify { config }), _) => {
            let config = SamplerConfig::deserialize(&config)?;
            print!("{}", config.to_yaml()?);
        }
        (None, Some(config)) => start(&config)?,
        (None, None) => {
            return Err("a config path or a subcommand is required, see --help".into());
        }
    }

    Ok(())
}

/// Starts the sampler. Only returns on startup errors.
fn start(config_path: &Path) -> Result<(), Box<dyn Error>> {
    let config = SamplerConfig::deserialize(config_path)?;
    init_tracing(config.logging())?;
    info!(target: "main", config = ?config_path, "Starting up!");

    let backend = midi::backend();
    let instruments = Instrument::attach_all(config.instruments(), backend.as_ref())?;
    if instruments.is_empty() {
        error!(target: "main", "No instruments found. Quitting.");
        process::exit(1);
    }

    let device = audio::get_device(config.audio())?;
    info!(target: "main", device = %device, "Audio output ready.");

    let mut loader = SampleLoader::new(device.sample_rate());
    let registry = NoteRegistry::load(&config, &mut loader)?;
    if registry.is_empty() {
        warn!(target: "main", "No samples configured, nothing will play.");
    }

    Dispatcher::new(instruments, registry, device).run()
}
