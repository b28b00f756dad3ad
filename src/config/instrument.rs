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

/// Device numbers are bounded only to keep the value inside a usize on every target.
const MAX_DEVICE_NUMBER: i64 = u16::MAX as i64;

/// A YAML representation of a MIDI instrument.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Instrument {
    /// The identifier that samples use to restrict themselves to this instrument.
    uid: Option<String>,

    /// A substring of the MIDI device name.
    name: Option<String>,

    /// The index of the MIDI device, as listed by the midi-devices command.
    device_number: Option<i64>,

    /// Some devices send Note On with a velocity of zero instead of Note Off.
    #[serde(default)]
    zero_velocity_for_note_off: bool,
}

impl Instrument {
    /// Creates a new instrument configuration.
    #[cfg(test)]
    pub fn new(
        uid: Option<&str>,
        name: Option<&str>,
        device_number: Option<usize>,
        zero_velocity_for_note_off: bool,
    ) -> Instrument {
        Instrument {
            uid: uid.map(str::to_string),
            name: name.map(str::to_string),
            device_number: device_number.map(|number| number as i64),
            zero_velocity_for_note_off,
        }
    }

    pub(super) fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if self.name.is_none() && self.device_number.is_none() {
            return Err(ConfigError::ImpossibleInstrument { index });
        }
        if let Some(device_number) = self.device_number {
            check_range(
                format!("instruments[{}].device_number", index),
                device_number,
                0,
                MAX_DEVICE_NUMBER,
            )?;
        }
        Ok(())
    }

    /// Returns the identifier of the instrument. Falls back to the name and then the device
    /// number if no uid was given.
    pub fn uid(&self) -> String {
        if let Some(uid) = &self.uid {
            return uid.clone();
        }
        if let Some(name) = &self.name {
            return name.clone();
        }
        format!("device-{}", self.device_number.unwrap_or_default())
    }

    /// Returns the device name substring to match.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the device index to match.
    pub fn device_number(&self) -> Option<usize> {
        self.device_number.map(|number| number as usize)
    }

    /// Returns true if Note On with zero velocity should be treated as Note Off.
    pub fn zero_velocity_for_note_off(&self) -> bool {
        self.zero_velocity_for_note_off
    }
}
