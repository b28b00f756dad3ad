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
use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};

mod audio;
mod error;
mod instrument;
mod logging;
mod sample;

pub use self::audio::{Audio, DEFAULT_DEVICE};
pub use self::error::ConfigError;
pub use self::instrument::Instrument;
pub use self::logging::Logging;
pub use self::sample::{Sample, CENTER_PAN, COUNT_RESET, COUNT_UP};

/// The configuration for the sampler.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct SamplerConfig {
    /// The MIDI instruments to attach.
    #[serde(default)]
    instruments: Vec<Instrument>,

    /// The samples to load, in trigger order.
    #[serde(default)]
    samples: Vec<Sample>,

    /// The audio output configuration.
    #[serde(default)]
    audio: Audio,

    /// Log facility toggles.
    #[serde(default)]
    logging: Logging,

    /// The directory relative sample paths are resolved against.
    #[serde(skip)]
    base_path: PathBuf,
}

impl SamplerConfig {
    /// Parses and validates a sampler config from a YAML file.
    pub fn deserialize(path: &Path) -> Result<SamplerConfig, ConfigError> {
        let config = Config::builder()
            .add_source(File::new(&path.to_string_lossy(), FileFormat::Yaml))
            .build()?
            .try_deserialize::<SamplerConfig>()?;

        let base_path = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.with_base_path(base_path)
    }

    /// Parses and validates a sampler config from a YAML string.
    #[cfg(test)]
    pub fn from_yaml(yaml: &str, base_path: &Path) -> Result<SamplerConfig, ConfigError> {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize::<SamplerConfig>()?
            .with_base_path(base_path.to_path_buf())
    }

    fn with_base_path(mut self, base_path: PathBuf) -> Result<SamplerConfig, ConfigError> {
        self.base_path = base_path;
        self.validate()?;
        Ok(self)
    }

    /// Validates everything that deserialization can't catch on its own.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.instruments.is_empty() {
            return Err(ConfigError::NoInstruments);
        }
        for (index, instrument) in self.instruments.iter().enumerate() {
            instrument.validate(index)?;
        }
        for (index, sample) in self.samples.iter().enumerate() {
            sample.validate(index)?;
        }
        self.audio.validate()
    }

    /// Gets the instrument configurations.
    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Gets the sample configurations.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Gets the audio configuration.
    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Gets the logging configuration.
    pub fn logging(&self) -> &Logging {
        &self.logging
    }

    /// Resolves a sample path relative to the config file.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.base_path.join(path)
        }
    }

    /// Renders the effective configuration, with defaults filled in, as YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yml::to_string(self)?)
    }
}
