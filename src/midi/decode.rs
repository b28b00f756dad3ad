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

//! Decoding of raw channel voice messages into the events the sampler reacts to.

use std::fmt;

use midly::num::{u4, u7};

/// Number of channels in each status family.
const MIDI_CHANNELS: u8 = 16;

/// The kinds of channel voice messages the sampler recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NoteOff,
    NoteOn,
    ControlChange,
}

impl EventKind {
    const ALL: [EventKind; 3] = [
        EventKind::NoteOff,
        EventKind::NoteOn,
        EventKind::ControlChange,
    ];

    /// The status byte for this kind on channel 0.
    pub const fn base(self) -> u8 {
        match self {
            EventKind::NoteOff => 0x80,
            EventKind::NoteOn => 0x90,
            EventKind::ControlChange => 0xB0,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::NoteOff => "note_off",
            EventKind::NoteOn => "note_on",
            EventKind::ControlChange => "control_change",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unrecognized MIDI status 0x{0:02X}")]
    UnrecognizedStatus(u8),

    #[error("Empty MIDI message")]
    Empty,
}

/// A decoded channel voice message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedMessage {
    pub kind: EventKind,
    pub channel: u4,
    /// The note for note messages, the controller for control changes.
    pub data1: u7,
    /// The velocity for note messages, the value for control changes.
    pub data2: u7,
}

/// Decodes a status byte into its kind and channel. Note On with zero velocity is reported as
/// Note Off when `zero_velocity_is_note_off` is set.
pub fn decode_status(
    status: u8,
    data2: u8,
    zero_velocity_is_note_off: bool,
) -> Result<(EventKind, u4), DecodeError> {
    let kind = EventKind::ALL
        .into_iter()
        .find(|kind| status >= kind.base() && status < kind.base() + MIDI_CHANNELS)
        .ok_or(DecodeError::UnrecognizedStatus(status))?;
    let channel = u4::from_int_lossy(status - kind.base());

    if zero_velocity_is_note_off && kind == EventKind::NoteOn && data2 == 0 {
        return Ok((EventKind::NoteOff, channel));
    }
    Ok((kind, channel))
}

/// Decodes a raw message. Missing data bytes are treated as zero.
pub fn decode(raw: &[u8], zero_velocity_is_note_off: bool) -> Result<DecodedMessage, DecodeError> {
    let status = *raw.first().ok_or(DecodeError::Empty)?;
    let data1 = raw.get(1).copied().unwrap_or(0);
    let data2 = raw.get(2).copied().unwrap_or(0);

    let (kind, channel) = decode_status(status, data2, zero_velocity_is_note_off)?;
    Ok(DecodedMessage {
        kind,
        channel,
        data1: u7::from_int_lossy(data1),
        data2: u7::from_int_lossy(data2),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_every_status_byte() {
        for status in 0..=u8::MAX {
            let result = decode_status(status, 64, false);
            match status {
                0x80..=0x8F => {
                    assert_eq!(result, Ok((EventKind::NoteOff, u4::new(status - 0x80))))
                }
                0x90..=0x9F => {
                    assert_eq!(result, Ok((EventKind::NoteOn, u4::new(status - 0x90))))
                }
                0xB0..=0xBF => assert_eq!(
                    result,
                    Ok((EventKind::ControlChange, u4::new(status - 0xB0)))
                ),
                _ => assert_eq!(result, Err(DecodeError::UnrecognizedStatus(status))),
            }
        }
    }

    #[test]
    fn test_zero_velocity_quirk() {
        assert_eq!(
            decode_status(0x93, 0, true),
            Ok((EventKind::NoteOff, u4::new(3)))
        );
        // Without the quirk, zero velocity stays a Note On.
        assert_eq!(
            decode_status(0x93, 0, false),
            Ok((EventKind::NoteOn, u4::new(3)))
        );
        // Only zero velocity is reclassified.
        assert_eq!(
            decode_status(0x93, 1, true),
            Ok((EventKind::NoteOn, u4::new(3)))
        );
        // The quirk never touches other kinds.
        assert_eq!(
            decode_status(0xB1, 0, true),
            Ok((EventKind::ControlChange, u4::new(1)))
        );
        assert_eq!(
            decode_status(0x81, 0, true),
            Ok((EventKind::NoteOff, u4::new(1)))
        );
    }

    #[test]
    fn test_decode_message() {
        let message = decode(&[0x9A, 60, 100], false).unwrap();
        assert_eq!(message.kind, EventKind::NoteOn);
        assert_eq!(message.channel.as_int(), 10);
        assert_eq!(message.data1.as_int(), 60);
        assert_eq!(message.data2.as_int(), 100);

        let message = decode(&[0x9A, 60, 0], true).unwrap();
        assert_eq!(message.kind, EventKind::NoteOff);
        assert_eq!(message.channel.as_int(), 10);
    }

    #[test]
    fn test_decode_short_and_empty() {
        let message = decode(&[0x80, 61], false).unwrap();
        assert_eq!(message.kind, EventKind::NoteOff);
        assert_eq!(message.data1.as_int(), 61);
        assert_eq!(message.data2.as_int(), 0);

        assert_eq!(decode(&[], false), Err(DecodeError::Empty));
        assert_eq!(
            decode(&[0xF8], false),
            Err(DecodeError::UnrecognizedStatus(0xF8))
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(EventKind::NoteOn.to_string(), "note_on");
        assert_eq!(EventKind::NoteOff.to_string(), "note_off");
        assert_eq!(EventKind::ControlChange.to_string(), "control_change");
    }
}
