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
use std::collections::HashMap;

use tracing::{info, span, Level};

use super::loader::{LoadError, SampleLoader};
use super::sample::{Action, Sample};
use crate::config::{SamplerConfig, COUNT_RESET, COUNT_UP};

/// Maps note numbers to the samples they trigger, in configuration order.
#[derive(Default)]
pub struct NoteRegistry {
    notes: HashMap<u8, Vec<Sample>>,
}

impl NoteRegistry {
    /// Loads every configured sample. Each sample's id is its index in the configuration.
    pub fn load(config: &SamplerConfig, loader: &mut SampleLoader) -> Result<Self, LoadError> {
        let span = span!(Level::INFO, "load samples");
        let _enter = span.enter();

        info!(target: "main", "Loading samples...");
        let mut registry = NoteRegistry::default();
        for (id, sample) in config.samples().iter().enumerate() {
            let path = sample.path().unwrap_or_default();
            let action = match path {
                COUNT_UP => Action::CountUp,
                COUNT_RESET => Action::CountReset,
                _ => Action::Play(loader.load(&config.resolve_path(path))?),
            };
            registry.insert(sample.note(), Sample::new(id, sample, action));
        }

        info!(
            target: "main",
            samples = registry.len(),
            notes = registry.note_count(),
            memory_kb = loader.total_memory_usage() / 1024,
            "Samples loaded."
        );
        Ok(registry)
    }

    /// Appends a sample to the note.
    pub fn insert(&mut self, note: u8, sample: Sample) {
        self.notes.entry(note).or_default().push(sample);
    }

    /// Gets the samples bound to a note.
    pub fn samples_mut(&mut self, note: u8) -> Option<&mut [Sample]> {
        self.notes.get_mut(&note).map(Vec::as_mut_slice)
    }

    /// The total number of samples.
    pub fn len(&self) -> usize {
        self.notes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// The number of notes with at least one sample.
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }
}
