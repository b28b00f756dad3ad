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
use std::fmt;

use thiserror::Error;
use tracing::{info, span, warn, Level};

use crate::config;
use crate::midi::{self, DecodeError, DecodedMessage, DeviceInfo};

#[derive(Error, Debug)]
pub enum InstrumentError {
    #[error("no input device matches {0}")]
    NotFound(String),

    #[error("unable to open {device}: {reason}")]
    Device { device: String, reason: String },
}

/// A configured instrument bound to an opened MIDI input.
pub struct Instrument {
    uid: String,
    zero_velocity_for_note_off: bool,
    input: Box<dyn midi::Input>,
}

impl Instrument {
    /// Attaches the first input device whose index equals the configured device number or whose
    /// name contains the configured name.
    pub fn attach(
        config: &config::Instrument,
        devices: &[DeviceInfo],
        backend: &dyn midi::Backend,
    ) -> Result<Instrument, InstrumentError> {
        let uid = config.uid();
        let device = devices
            .iter()
            .filter(|device| device.is_input())
            .find(|device| {
                config.device_number() == Some(device.index())
                    || config
                        .name()
                        .is_some_and(|name| device.name().contains(name))
            })
            .ok_or_else(|| InstrumentError::NotFound(uid.clone()))?;

        let input = backend
            .open(device)
            .map_err(|e| InstrumentError::Device {
                device: device.name().to_string(),
                reason: e.to_string(),
            })?;

        info!(target: "main", uid, device = device.name(), "Attached!");
        Ok(Instrument {
            uid,
            zero_velocity_for_note_off: config.zero_velocity_for_note_off(),
            input,
        })
    }

    /// Attaches every configured instrument that matches a device. Instruments that don't match
    /// are skipped with a warning.
    pub fn attach_all(
        configs: &[config::Instrument],
        backend: &dyn midi::Backend,
    ) -> Result<Vec<Instrument>, Box<dyn std::error::Error>> {
        let span = span!(Level::INFO, "attach instruments");
        let _enter = span.enter();

        info!(target: "main", "Attaching instruments...");
        let devices = backend.devices()?;
        for device in &devices {
            info!(target: "main", "Device {}", device);
        }

        let mut instruments = Vec::with_capacity(configs.len());
        for config in configs {
            match Instrument::attach(config, &devices, backend) {
                Ok(instrument) => instruments.push(instrument),
                Err(e) => warn!(target: "main", err = e.to_string(), "No device found, skipping"),
            }
        }
        Ok(instruments)
    }

    /// Polls the next pending message and decodes it. Never blocks.
    pub fn poll_and_decode(&mut self) -> Option<Result<DecodedMessage, DecodeError>> {
        loop {
            let raw = self.input.poll()?;
            if raw.is_empty() {
                continue;
            }
            return Some(midi::decode(&raw, self.zero_velocity_for_note_off));
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.uid, self.input)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::midi::test::Backend;
    use crate::midi::EventKind;

    fn backend() -> Backend {
        Backend::new(&[
            ("MPD218 Out", false),
            ("MPD218 In", true),
            ("Keystation", true),
        ])
    }

    fn attach(config: config::Instrument, backend: &Backend) -> Result<Instrument, InstrumentError> {
        let devices = midi::Backend::devices(backend).unwrap();
        Instrument::attach(&config, &devices, backend)
    }

    #[test]
    fn test_attach_by_name_skips_outputs() {
        let backend = backend();
        let instrument = attach(
            config::Instrument::new(Some("pads"), Some("MPD218"), None, false),
            &backend,
        )
        .unwrap();

        assert_eq!(instrument.uid(), "pads");
        assert_eq!(instrument.to_string(), "pads (MPD218 In (Mock))");
    }

    #[test]
    fn test_attach_by_index() {
        let backend = backend();
        let instrument =
            attach(config::Instrument::new(None, None, Some(2), false), &backend).unwrap();

        assert_eq!(instrument.uid(), "device-2");
        assert_eq!(instrument.to_string(), "device-2 (Keystation (Mock))");
    }

    #[test]
    fn test_attach_index_or_name() {
        let backend = backend();
        // The index matches an earlier device than the name does, so the index wins.
        let instrument = attach(
            config::Instrument::new(Some("keys"), Some("Keystation"), Some(1), false),
            &backend,
        )
        .unwrap();

        assert_eq!(instrument.to_string(), "keys (MPD218 In (Mock))");
    }

    #[test]
    fn test_attach_not_found() {
        let backend = backend();
        assert!(matches!(
            attach(config::Instrument::new(None, Some("Launchpad"), None, false), &backend),
            Err(InstrumentError::NotFound(uid)) if uid == "Launchpad"
        ));
        // Output devices never match, even by index.
        assert!(matches!(
            attach(config::Instrument::new(None, None, Some(0), false), &backend),
            Err(InstrumentError::NotFound(_))
        ));
    }

    #[test]
    fn test_attach_all_skips_unmatched() {
        let backend = backend();
        let instruments = Instrument::attach_all(
            &[
                config::Instrument::new(None, Some("Launchpad"), None, false),
                config::Instrument::new(None, Some("Keystation"), None, false),
            ],
            &backend,
        )
        .unwrap();

        assert_eq!(instruments.len(), 1);
        assert_eq!(instruments[0].uid(), "Keystation");
    }

    #[test]
    fn test_poll_and_decode() {
        let backend = backend();
        let input = backend.input("MPD218 In");
        let mut instrument = attach(
            config::Instrument::new(None, Some("MPD218"), None, true),
            &backend,
        )
        .unwrap();

        assert!(instrument.poll_and_decode().is_none());

        input.send(&[]);
        input.send(&[0x91, 36, 0]);
        input.send(&[0xF8]);

        let message = instrument.poll_and_decode().unwrap().unwrap();
        assert_eq!(message.kind, EventKind::NoteOff);
        assert_eq!(message.channel.as_int(), 1);
        assert_eq!(message.data1.as_int(), 36);

        assert!(matches!(
            instrument.poll_and_decode(),
            Some(Err(DecodeError::UnrecognizedStatus(0xF8)))
        ));
        assert!(instrument.poll_and_decode().is_none());
        assert_eq!(input.pending(), 0);
    }
}
