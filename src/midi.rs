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
use std::{error::Error, fmt};

mod decode;
mod midir;
#[cfg(test)]
mod mock;

pub use decode::{decode, DecodeError, DecodedMessage, EventKind};

/// A MIDI device as seen during enumeration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    /// The index of the device in the enumeration.
    index: usize,
    /// The name the host reports for the device.
    name: String,
    /// Whether the device can be opened for input.
    is_input: bool,
}

impl DeviceInfo {
    pub fn new(index: usize, name: &str, is_input: bool) -> DeviceInfo {
        DeviceInfo {
            index,
            name: name.to_string(),
            is_input,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_input(&self) -> bool {
        self.is_input
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.index,
            self.name,
            if self.is_input {
                "input"
            } else {
                "not input, ignored"
            }
        )
    }
}

/// An opened MIDI input.
pub trait Input: fmt::Display {
    /// Returns the next pending raw message without blocking.
    fn poll(&mut self) -> Option<Vec<u8>>;
}

/// Enumerates and opens MIDI devices.
pub trait Backend {
    /// Lists all devices. Inputs come first, so their indices are stable between runs with the
    /// same hardware attached.
    fn devices(&self) -> Result<Vec<DeviceInfo>, Box<dyn Error>>;

    /// Opens the given input device. Realtime and sysex traffic is filtered out.
    fn open(&self, device: &DeviceInfo) -> Result<Box<dyn Input>, Box<dyn Error>>;
}

/// Gets the backend for the host's MIDI system.
pub fn backend() -> Box<dyn Backend> {
    Box::new(midir::Backend)
}

/// Lists devices known to midir.
pub fn list_devices() -> Result<Vec<DeviceInfo>, Box<dyn Error>> {
    backend().devices()
}
