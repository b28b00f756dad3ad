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
use std::{error::Error, fmt, sync::Arc, time::Duration};

use crate::config;

pub mod cpal;
pub mod mixer;
pub mod mock;
mod thread_priority;

pub use mixer::Clip;

/// Identifies a sample across play and stop calls. Every voice started for a sample carries it.
pub type SampleId = usize;

/// Independent left and right channel gains for a voice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gains {
    pub left: f32,
    pub right: f32,
}

impl Default for Gains {
    fn default() -> Self {
        Gains {
            left: 1.0,
            right: 1.0,
        }
    }
}

pub trait Device: fmt::Display {
    /// Starts a new voice playing the clip for the given sample.
    fn play(&self, sample: SampleId, clip: &Clip, gains: Option<Gains>)
        -> Result<(), Box<dyn Error>>;

    /// Silences every voice of the sample immediately.
    fn stop(&self, sample: SampleId) -> Result<(), Box<dyn Error>>;

    /// Fades every voice of the sample out over the given duration.
    fn fade_out(&self, sample: SampleId, duration: Duration) -> Result<(), Box<dyn Error>>;

    /// The output sample rate. Clips must be loaded at this rate.
    fn sample_rate(&self) -> u32;
}

/// Converts a duration to a number of frames at the given sample rate.
pub fn duration_to_frames(duration: Duration, sample_rate: u32) -> u64 {
    (duration.as_secs_f64() * sample_rate as f64).round() as u64
}

/// Lists the names of output devices known to cpal.
pub fn list_devices() -> Result<Vec<String>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets the device for the given configuration.
pub fn get_device(config: &config::Audio) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device, config.sample_rate())));
    };

    Ok(Arc::new(cpal::Device::get(config)?))
}
