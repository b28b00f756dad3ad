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
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{check_range, ConfigError};

/// Path sentinel that increments the counter instead of playing audio.
pub const COUNT_UP: &str = "COUNT_UP";

/// Path sentinel that resets the counter instead of playing audio.
pub const COUNT_RESET: &str = "COUNT_RESET";

/// Pan value for a centered sample. No gains are applied at this value.
pub const CENTER_PAN: u8 = 127;

const MAX_NOTE: i64 = 127;
const MAX_PAN: i64 = 255;
const MAX_MILLIS: i64 = u32::MAX as i64;

/// A YAML representation of a sample bound to a note.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Sample {
    /// The MIDI note that triggers this sample.
    note: i64,

    /// The audio file to play, or one of the counter sentinels.
    path: Option<String>,

    /// One-shot samples play to completion and ignore Note Off.
    #[serde(default)]
    one_shot: bool,

    /// Fade out time in milliseconds when stopped. Stops immediately if unset.
    fade_out: Option<i64>,

    /// Restricts the sample to the instrument with this uid.
    instrument: Option<String>,

    /// Stereo position, 0 is full left and 255 is full right.
    #[serde(default = "default_pan")]
    pan: i64,

    /// Stops any playing instance of this sample before playing it again.
    #[serde(default)]
    no_overlap: bool,

    /// Minimum time in milliseconds between two triggers. Zero disables debouncing.
    #[serde(default)]
    debounce: i64,
}

fn default_pan() -> i64 {
    CENTER_PAN as i64
}

impl Sample {
    pub(super) fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if self.path.is_none() {
            return Err(ConfigError::MissingSamplePath {
                index,
                note: self.note,
            });
        }
        check_range(format!("samples[{}].note", index), self.note, 0, MAX_NOTE)?;
        check_range(format!("samples[{}].pan", index), self.pan, 0, MAX_PAN)?;
        check_range(
            format!("samples[{}].debounce", index),
            self.debounce,
            0,
            MAX_MILLIS,
        )?;
        if let Some(fade_out) = self.fade_out {
            check_range(
                format!("samples[{}].fade_out", index),
                fade_out,
                0,
                MAX_MILLIS,
            )?;
        }
        Ok(())
    }

    /// Gets the note. Only valid after validation.
    pub fn note(&self) -> u8 {
        self.note as u8
    }

    /// Gets the path, which is guaranteed to be present after validation.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns true if this sample ignores Note Off.
    pub fn one_shot(&self) -> bool {
        self.one_shot
    }

    /// Gets the fade out duration.
    pub fn fade_out(&self) -> Option<Duration> {
        self.fade_out
            .map(|millis| Duration::from_millis(millis as u64))
    }

    /// Gets the uid of the instrument this sample is restricted to.
    pub fn instrument(&self) -> Option<&str> {
        self.instrument.as_deref()
    }

    /// Gets the pan. Only valid after validation.
    pub fn pan(&self) -> u8 {
        self.pan as u8
    }

    /// Returns true if a new trigger should stop playing instances first.
    pub fn no_overlap(&self) -> bool {
        self.no_overlap
    }

    /// Gets the debounce interval, if debouncing is enabled.
    pub fn debounce(&self) -> Option<Duration> {
        if self.debounce > 0 {
            Some(Duration::from_millis(self.debounce as u64))
        } else {
            None
        }
    }
}
