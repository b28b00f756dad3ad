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
use serde::{Deserialize, Serialize};

use super::error::{check_range, ConfigError};

/// Selects the host's default output device.
pub const DEFAULT_DEVICE: &str = "default";

/// The default output sample rate.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// The default number of voices that can sound at once.
pub const DEFAULT_MAX_VOICES: usize = 128;

/// The default output buffer size in frames. Small, since pad hits should sound immediately.
pub const DEFAULT_BUFFER_SIZE: usize = 512;

const MIN_BUFFER_SIZE: i64 = 16;
const MAX_BUFFER_SIZE: i64 = 8192;

/// A YAML representation of the audio output configuration.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Audio {
    /// The audio device, matched as a substring of the device name.
    #[serde(default = "default_device")]
    device: String,

    /// The output sample rate. Samples are converted to this rate when loaded.
    #[serde(default = "default_sample_rate")]
    sample_rate: u32,

    /// The maximum number of concurrent voices. The oldest voice is stolen past this.
    #[serde(default = "default_max_voices")]
    max_voices: usize,

    /// The output stream buffer size in frames. Clamped to what the device supports.
    buffer_size: Option<usize>,
}

fn default_device() -> String {
    DEFAULT_DEVICE.to_string()
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_max_voices() -> usize {
    DEFAULT_MAX_VOICES
}

impl Default for Audio {
    fn default() -> Self {
        Audio {
            device: default_device(),
            sample_rate: default_sample_rate(),
            max_voices: default_max_voices(),
            buffer_size: None,
        }
    }
}

impl Audio {
    /// New will create a new audio configuration.
    #[cfg(test)]
    pub fn new(device: &str) -> Audio {
        Audio {
            device: device.to_string(),
            ..Default::default()
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "audio.sample_rate".to_string(),
            self.sample_rate as i64,
            8000,
            384000,
        )?;
        check_range(
            "audio.max_voices".to_string(),
            self.max_voices as i64,
            1,
            1024,
        )?;
        if let Some(buffer_size) = self.buffer_size {
            check_range(
                "audio.buffer_size".to_string(),
                buffer_size as i64,
                MIN_BUFFER_SIZE,
                MAX_BUFFER_SIZE,
            )?;
        }
        Ok(())
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Returns the sample rate from the configuration.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the voice limit from the configuration.
    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    /// Returns the stream buffer size in frames.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE)
    }
}
