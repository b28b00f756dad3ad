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

//! MIDI-triggered sample playback.
//!
//! This module provides:
//! - Sample loading and caching (in-memory for zero-latency playback)
//! - Per-sample playback policy (debounce, overlap, pan, fade out)
//! - The note to sample registry

mod loader;
mod registry;
mod sample;

pub use loader::SampleLoader;
pub use registry::NoteRegistry;
pub use sample::{Counter, PlayOutcome, StopOutcome};

#[cfg(test)]
pub use sample::{Action, Sample};
