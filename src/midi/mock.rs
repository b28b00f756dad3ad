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
use std::{collections::VecDeque, error::Error, fmt, sync::Arc};

use parking_lot::Mutex;

use super::DeviceInfo;

/// A mock input. Messages sent through any clone are polled by every other clone.
#[derive(Clone)]
pub struct Input {
    name: String,
    pending: Arc<Mutex<VecDeque<Vec<u8>>>>,
}

impl Input {
    pub fn new(name: &str) -> Input {
        Input {
            name: name.to_string(),
            pending: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Queues a raw message to be polled.
    pub fn send(&self, raw_event: &[u8]) {
        self.pending.lock().push_back(raw_event.to_vec());
    }

    /// Returns the number of messages that have not been polled yet.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }
}

impl super::Input for Input {
    fn poll(&mut self) -> Option<Vec<u8>> {
        self.pending.lock().pop_front()
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}

/// A mock backend with a fixed set of devices.
pub struct Backend {
    devices: Vec<(DeviceInfo, Input)>,
}

impl Backend {
    /// Creates a backend with the given (name, is_input) devices, indexed in order.
    pub fn new(devices: &[(&str, bool)]) -> Backend {
        Backend {
            devices: devices
                .iter()
                .enumerate()
                .map(|(index, (name, is_input))| {
                    (DeviceInfo::new(index, name, *is_input), Input::new(name))
                })
                .collect(),
        }
    }

    /// Gets a handle to the named device's input queue.
    pub fn input(&self, name: &str) -> Input {
        self.devices
            .iter()
            .find(|(device, _)| device.name() == name)
            .map(|(_, input)| input.clone())
            .expect("no mock device with that name")
    }
}

impl super::Backend for Backend {
    fn devices(&self) -> Result<Vec<DeviceInfo>, Box<dyn Error>> {
        Ok(self.devices.iter().map(|(device, _)| device.clone()).collect())
    }

    fn open(&self, device: &DeviceInfo) -> Result<Box<dyn super::Input>, Box<dyn Error>> {
        match self.devices.get(device.index()) {
            Some((info, input)) if info.is_input() => Ok(Box::new(input.clone())),
            Some((info, _)) => Err(format!("{} is not an input device", info.name()).into()),
            None => Err(format!("no device at index {}", device.index()).into()),
        }
    }
}
