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

use crossbeam_channel::{Receiver, TryRecvError};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput};
use tracing::{debug, error, span, Level};

use super::DeviceInfo;

/// The midir backend.
pub struct Backend;

/// An input opened through midir. The midir callback runs on its own thread and forwards raw
/// messages here, where they wait until polled.
pub struct Input {
    name: String,
    /// Held so the connection stays open.
    _connection: MidiInputConnection<()>,
    receiver: Receiver<Vec<u8>>,
}

impl super::Backend for Backend {
    fn devices(&self) -> Result<Vec<DeviceInfo>, Box<dyn Error>> {
        let input = MidiInput::new("padsampler input listing")?;
        let output = MidiOutput::new("padsampler output listing")?;

        let mut devices = Vec::new();
        for port in input.ports() {
            devices.push(DeviceInfo::new(
                devices.len(),
                &input.port_name(&port)?,
                true,
            ));
        }
        for port in output.ports() {
            devices.push(DeviceInfo::new(
                devices.len(),
                &output.port_name(&port)?,
                false,
            ));
        }

        Ok(devices)
    }

    fn open(&self, device: &DeviceInfo) -> Result<Box<dyn super::Input>, Box<dyn Error>> {
        let span = span!(Level::INFO, "open input (midir)");
        let _enter = span.enter();

        if !device.is_input() {
            return Err(format!("{} is not an input device", device.name()).into());
        }

        let mut input = MidiInput::new("padsampler input")?;
        // Drops sysex, timing clock and active sensing before they reach the callback.
        input.ignore(Ignore::All);

        let port = input
            .ports()
            .into_iter()
            .nth(device.index())
            .ok_or_else(|| format!("no input port at index {}", device.index()))?;
        let port_name = input.port_name(&port)?;
        if port_name != device.name() {
            return Err(format!(
                "input port {} changed from {} to {} since listing",
                device.index(),
                device.name(),
                port_name
            )
            .into());
        }

        let (sender, receiver) = crossbeam_channel::unbounded();
        let connection = input.connect(
            &port,
            "padsampler input watcher",
            move |_, raw_event, _| {
                if let Err(e) = sender.send(Vec::from(raw_event)) {
                    error!(
                        err = format!("{:?}", e),
                        "Error sending MIDI event to receiver."
                    );
                }
            },
            (),
        )?;

        debug!(device = port_name, "Opened MIDI input.");

        Ok(Box::new(Input {
            name: port_name,
            _connection: connection,
            receiver,
        }))
    }
}

impl super::Input for Input {
    fn poll(&mut self) -> Option<Vec<u8>> {
        match self.receiver.try_recv() {
            Ok(raw_event) => Some(raw_event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                error!(device = self.name, "MIDI input disconnected.");
                None
            }
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Input)", self.name)
    }
}
