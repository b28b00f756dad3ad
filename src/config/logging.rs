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

/// Per-facility log toggles. Each facility is a tracing target.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Logging {
    /// Every decoded MIDI message. Noisy, so off by default.
    #[serde(default)]
    midi: bool,

    /// Sample playback.
    #[serde(default = "enabled")]
    player: bool,

    /// Startup and device attachment.
    #[serde(default = "enabled")]
    main: bool,
}

fn enabled() -> bool {
    true
}

impl Default for Logging {
    fn default() -> Self {
        Logging {
            midi: false,
            player: true,
            main: true,
        }
    }
}

impl Logging {
    /// Builds tracing filter directives for the facility toggles.
    pub fn filter_directives(&self) -> String {
        let level = |enabled: bool| if enabled { "info" } else { "off" };
        format!(
            "warn,padsampler=info,midi={},player={},main={}",
            level(self.midi),
            level(self.player),
            level(self.main)
        )
    }
}
