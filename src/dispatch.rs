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
use std::{sync::Arc, time::Instant};

use tracing::{debug, info, warn};

use crate::audio;
use crate::instrument::Instrument;
use crate::midi::{DecodedMessage, EventKind};
use crate::samples::{Counter, NoteRegistry, PlayOutcome, StopOutcome};

/// Owns everything the event loop touches. Nothing here is shared with other threads.
pub struct Dispatcher {
    instruments: Vec<Instrument>,
    registry: NoteRegistry,
    counter: Counter,
    device: Arc<dyn audio::Device>,
}

impl Dispatcher {
    pub fn new(
        instruments: Vec<Instrument>,
        registry: NoteRegistry,
        device: Arc<dyn audio::Device>,
    ) -> Dispatcher {
        Dispatcher {
            instruments,
            registry,
            counter: Counter::default(),
            device,
        }
    }

    /// Polls every instrument forever.
    pub fn run(&mut self) -> ! {
        info!(target: "main", "Ready!");
        loop {
            if self.poll_once() == 0 {
                std::hint::spin_loop();
            }
        }
    }

    /// Drains the pending messages of every instrument once. Returns the number of messages
    /// handled, including ones that failed to decode.
    pub fn poll_once(&mut self) -> usize {
        let Dispatcher {
            instruments,
            registry,
            counter,
            device,
        } = self;

        let mut handled = 0;
        for instrument in instruments.iter_mut() {
            while let Some(result) = instrument.poll_and_decode() {
                handled += 1;
                match result {
                    Ok(message) => handle_message(
                        instrument.uid(),
                        message,
                        registry,
                        counter,
                        &**device,
                    ),
                    Err(e) => {
                        info!(target: "midi", instrument = instrument.uid(), err = e.to_string(), "Dropped message")
                    }
                }
            }
        }
        handled
    }

    /// Gets the current counter value.
    #[cfg(test)]
    pub fn counter(&self) -> u64 {
        self.counter.value()
    }
}

fn handle_message(
    uid: &str,
    message: DecodedMessage,
    registry: &mut NoteRegistry,
    counter: &mut Counter,
    device: &dyn audio::Device,
) {
    let channel = message.channel.as_int();
    let note = message.data1.as_int();
    info!(
        target: "midi",
        instrument = uid,
        kind = %message.kind,
        channel,
        data1 = note,
        data2 = message.data2.as_int(),
        "Message"
    );

    if message.kind == EventKind::ControlChange {
        return;
    }

    let Some(samples) = registry.samples_mut(note) else {
        warn!(target: "player", "No sample for note {} on channel {}", note, channel);
        return;
    };

    let now = Instant::now();
    for sample in samples
        .iter_mut()
        .filter(|sample| sample.matches_instrument(uid))
    {
        match message.kind {
            EventKind::NoteOn => {
                if sample.play(device, counter, now) == PlayOutcome::Failed {
                    debug!(target: "player", sample = %sample, "Play failed");
                }
            }
            EventKind::NoteOff if !sample.one_shot() => {
                if sample.stop(device) == StopOutcome::Ignored {
                    debug!(target: "player", sample = %sample, "Nothing to stop");
                }
            }
            _ => {}
        }
    }
}
