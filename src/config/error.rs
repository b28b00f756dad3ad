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

/// Typed error for config load/parse/validation failures so callers can distinguish
/// e.g. a malformed file from a sample with no path without string matching.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config load/parse error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Unable to serialize config: {0}")]
    Serialize(#[from] serde_yml::Error),

    #[error("Sample {index} (note {note}) has no path")]
    MissingSamplePath { index: usize, note: i64 },

    #[error("Instrument {index} must specify a name or a device_number")]
    ImpossibleInstrument { index: usize },

    #[error("No instruments are configured")]
    NoInstruments,

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Checks that the given value is within the inclusive range, naming the offending field otherwise.
pub(super) fn check_range(field: String, value: i64, min: i64, max: i64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
