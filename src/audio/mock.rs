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

use parking_lot::Mutex;
use tracing::debug;

use super::{Clip, Gains, SampleId};

/// A call made against the mock device.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Play {
        sample: SampleId,
        gains: Option<Gains>,
    },
    Stop {
        sample: SampleId,
    },
    FadeOut {
        sample: SampleId,
        duration: Duration,
    },
}

/// A mock device. Doesn't actually play anything, it only records what it was asked to do.
#[derive(Clone)]
pub struct Device {
    name: String,
    sample_rate: u32,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str, sample_rate: u32) -> Device {
        Device {
            name: name.to_string(),
            sample_rate,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns every call made so far, oldest first.
    #[cfg(test)]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Forgets all calls made so far.
    #[cfg(test)]
    pub fn reset(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: Call) {
        debug!(device = self.name, call = ?call, "Mock audio call.");
        self.calls.lock().push(call);
    }
}

impl super::Device for Device {
    fn play(
        &self,
        sample: SampleId,
        _: &Clip,
        gains: Option<Gains>,
    ) -> Result<(), Box<dyn Error>> {
        self.record(Call::Play { sample, gains });
        Ok(())
    }

    fn stop(&self, sample: SampleId) -> Result<(), Box<dyn Error>> {
        self.record(Call::Stop { sample });
        Ok(())
    }

    fn fade_out(&self, sample: SampleId, duration: Duration) -> Result<(), Box<dyn Error>> {
        self.record(Call::FadeOut { sample, duration });
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
