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
// Core voice mixing logic that can be used by both CPAL and test implementations
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use super::{Gains, SampleId};

/// Number of output channels the mixer produces. Frames are interleaved left/right.
pub const OUTPUT_CHANNELS: usize = 2;

/// Audio held in memory as stereo frames at the output sample rate.
/// The data is stored in an Arc so every voice shares one copy.
#[derive(Clone, Debug)]
pub struct Clip {
    frames: Arc<Vec<[f32; OUTPUT_CHANNELS]>>,
}

impl Clip {
    pub fn new(frames: Vec<[f32; OUTPUT_CHANNELS]>) -> Clip {
        Clip {
            frames: Arc::new(frames),
        }
    }

    /// Returns the number of stereo frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Returns the memory size in bytes.
    pub fn memory_size(&self) -> usize {
        self.frames.len() * std::mem::size_of::<[f32; OUTPUT_CHANNELS]>()
    }

    /// Returns true if both clips share the same audio data.
    #[cfg(test)]
    pub fn shares_data(&self, other: &Clip) -> bool {
        Arc::ptr_eq(&self.frames, &other.frames)
    }

    /// Gets a frame by index.
    #[cfg(test)]
    pub fn frame(&self, index: usize) -> Option<[f32; OUTPUT_CHANNELS]> {
        self.frames.get(index).copied()
    }
}

/// Commands sent from the dispatch thread to whichever thread owns the mixer.
pub enum MixerCommand {
    /// Starts a new voice for the sample.
    Play {
        sample: SampleId,
        clip: Clip,
        gains: Option<Gains>,
    },
    /// Silences every voice of the sample.
    Stop { sample: SampleId },
    /// Ramps every voice of the sample down to silence over the given number of frames.
    FadeOut { sample: SampleId, frames: u64 },
}

/// A linear ramp down to silence.
#[derive(Clone, Copy, Debug)]
struct Fade {
    remaining: u64,
    total: u64,
}

/// One playing instance of a sample.
struct Voice {
    sample: SampleId,
    clip: Clip,
    position: usize,
    gains: Gains,
    fade: Option<Fade>,
}

impl Voice {
    /// Returns the next frame scaled by gains and fade, or None once the voice is done.
    fn next_frame(&mut self) -> Option<[f32; OUTPUT_CHANNELS]> {
        let [left, right] = *self.clip.frames.get(self.position)?;
        self.position += 1;

        let level = match self.fade.as_mut() {
            Some(fade) => {
                if fade.remaining == 0 {
                    return None;
                }
                let level = fade.remaining as f32 / fade.total as f32;
                fade.remaining -= 1;
                level
            }
            None => 1.0,
        };

        Some([
            left * self.gains.left * level,
            right * self.gains.right * level,
        ])
    }
}

/// Tracks how many voices the mixer has stolen since the last report.
pub struct StolenVoices {
    count: Arc<AtomicU64>,
    reported: AtomicU64,
}

impl StolenVoices {
    /// Returns the number of voices stolen since the previous call.
    pub fn take_unreported(&self) -> u64 {
        let count = self.count.load(Ordering::Relaxed);
        count.saturating_sub(self.reported.swap(count, Ordering::Relaxed))
    }
}

/// Voice mixer that's independent of any audio backend.
pub struct AudioMixer {
    /// Voices in the order they started. The oldest is first.
    voices: Vec<Voice>,
    /// The maximum number of concurrent voices.
    max_voices: usize,
    /// Total voices stolen so far. Reported from the dispatch thread.
    stolen_voices: Arc<AtomicU64>,
}

impl AudioMixer {
    /// Creates a new audio mixer.
    pub fn new(max_voices: usize) -> Self {
        Self {
            voices: Vec::with_capacity(max_voices),
            max_voices: max_voices.max(1),
            stolen_voices: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns a reader for the stolen voice count that can live on another thread.
    pub fn stolen_voices(&self) -> StolenVoices {
        StolenVoices {
            count: self.stolen_voices.clone(),
            reported: AtomicU64::new(0),
        }
    }

    /// Applies a command from the dispatch thread.
    pub fn apply(&mut self, command: MixerCommand) {
        match command {
            MixerCommand::Play {
                sample,
                clip,
                gains,
            } => self.add_voice(sample, clip, gains),
            MixerCommand::Stop { sample } => self.stop(sample),
            MixerCommand::FadeOut { sample, frames } => self.fade_out(sample, frames),
        }
    }

    fn add_voice(&mut self, sample: SampleId, clip: Clip, gains: Option<Gains>) {
        if self.voices.len() >= self.max_voices {
            // Steal the oldest voice.
            self.voices.remove(0);
            self.stolen_voices.fetch_add(1, Ordering::Relaxed);
        }

        self.voices.push(Voice {
            sample,
            clip,
            position: 0,
            gains: gains.unwrap_or_default(),
            fade: None,
        });
    }

    fn stop(&mut self, sample: SampleId) {
        self.voices.retain(|voice| voice.sample != sample);
    }

    fn fade_out(&mut self, sample: SampleId, frames: u64) {
        if frames == 0 {
            self.stop(sample);
            return;
        }

        for voice in self.voices.iter_mut().filter(|voice| voice.sample == sample) {
            // A fade already in progress that ends sooner is left alone.
            if voice.fade.is_some_and(|fade| fade.remaining <= frames) {
                continue;
            }
            let level = voice
                .fade
                .map(|fade| fade.remaining as f32 / fade.total as f32)
                .unwrap_or(1.0);
            voice.gains.left *= level;
            voice.gains.right *= level;
            voice.fade = Some(Fade {
                remaining: frames,
                total: frames,
            });
        }
    }

    /// Mixes interleaved stereo frames into the output buffer, overwriting its contents.
    /// Finished voices are removed.
    pub fn process_into_output(&mut self, output: &mut [f32]) {
        output.fill(0.0);

        self.voices.retain_mut(|voice| {
            for frame in output.chunks_exact_mut(OUTPUT_CHANNELS) {
                match voice.next_frame() {
                    Some([left, right]) => {
                        frame[0] += left;
                        frame[1] += right;
                    }
                    None => return false,
                }
            }
            true
        });
    }

    /// Returns the number of voices currently sounding.
    #[cfg(test)]
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Returns the number of voices sounding for the given sample.
    #[cfg(test)]
    pub fn voices_for(&self, sample: SampleId) -> usize {
        self.voices
            .iter()
            .filter(|voice| voice.sample == sample)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_clip(frames: usize, value: f32) -> Clip {
        Clip::new(vec![[value, value]; frames])
    }

    fn play(mixer: &mut AudioMixer, sample: SampleId, clip: &Clip, gains: Option<Gains>) {
        mixer.apply(MixerCommand::Play {
            sample,
            clip: clip.clone(),
            gains,
        });
    }

    #[test]
    fn test_basic_mixing() {
        let mut mixer = AudioMixer::new(8);
        play(&mut mixer, 0, &Clip::new(vec![[0.5, 0.25], [0.8, 0.4]]), None);
        play(&mut mixer, 1, &Clip::new(vec![[0.1, 0.1]]), None);

        let mut output = vec![1.0; 6];
        mixer.process_into_output(&mut output);

        assert_eq!(output, vec![0.6, 0.35, 0.8, 0.4, 0.0, 0.0]);
        // Both clips ran out, so both voices are gone.
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_gains() {
        let mut mixer = AudioMixer::new(8);
        play(
            &mut mixer,
            0,
            &constant_clip(4, 1.0),
            Some(Gains {
                left: 1.0,
                right: 0.0,
            }),
        );

        let mut output = vec![0.0; 4];
        mixer.process_into_output(&mut output);

        assert_eq!(output, vec![1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_stop_only_affects_sample() {
        let mut mixer = AudioMixer::new(8);
        let clip = constant_clip(100, 0.5);
        play(&mut mixer, 0, &clip, None);
        play(&mut mixer, 0, &clip, None);
        play(&mut mixer, 1, &clip, None);

        mixer.apply(MixerCommand::Stop { sample: 0 });

        assert_eq!(mixer.voices_for(0), 0);
        assert_eq!(mixer.voices_for(1), 1);
    }

    #[test]
    fn test_fade_out() {
        let mut mixer = AudioMixer::new(8);
        play(&mut mixer, 3, &constant_clip(100, 1.0), None);

        mixer.apply(MixerCommand::FadeOut {
            sample: 3,
            frames: 4,
        });

        let mut output = vec![0.0; 8];
        mixer.process_into_output(&mut output);
        assert_eq!(output, vec![1.0, 1.0, 0.75, 0.75, 0.5, 0.5, 0.25, 0.25]);
        // Still registered until the next frame finds the ramp exhausted.
        let mut output = vec![0.0; 2];
        mixer.process_into_output(&mut output);
        assert_eq!(output, vec![0.0, 0.0]);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_zero_length_fade_stops() {
        let mut mixer = AudioMixer::new(8);
        play(&mut mixer, 3, &constant_clip(100, 1.0), None);

        mixer.apply(MixerCommand::FadeOut {
            sample: 3,
            frames: 0,
        });

        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_shorter_fade_wins() {
        let mut mixer = AudioMixer::new(8);
        play(&mut mixer, 3, &constant_clip(100, 1.0), None);

        mixer.apply(MixerCommand::FadeOut {
            sample: 3,
            frames: 2,
        });
        mixer.apply(MixerCommand::FadeOut {
            sample: 3,
            frames: 50,
        });

        let mut output = vec![0.0; 6];
        mixer.process_into_output(&mut output);
        assert_eq!(output, vec![1.0, 1.0, 0.5, 0.5, 0.0, 0.0]);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_voice_stealing() {
        let mut mixer = AudioMixer::new(2);
        play(&mut mixer, 0, &constant_clip(10, 0.1), None);
        play(&mut mixer, 1, &constant_clip(10, 0.2), None);
        play(&mut mixer, 2, &constant_clip(10, 0.4), None);

        assert_eq!(mixer.active_voices(), 2);
        assert_eq!(mixer.voices_for(0), 0);
        assert_eq!(mixer.voices_for(1), 1);
        assert_eq!(mixer.voices_for(2), 1);
    }

    #[test]
    fn test_stolen_voices_counted() {
        let mut mixer = AudioMixer::new(1);
        let stolen = mixer.stolen_voices();
        play(&mut mixer, 0, &constant_clip(10, 0.1), None);
        assert_eq!(stolen.take_unreported(), 0);

        play(&mut mixer, 1, &constant_clip(10, 0.1), None);
        play(&mut mixer, 2, &constant_clip(10, 0.1), None);
        assert_eq!(stolen.take_unreported(), 2);
        assert_eq!(stolen.take_unreported(), 0);
        assert_eq!(mixer.active_voices(), 1);

        play(&mut mixer, 3, &constant_clip(10, 0.1), None);
        assert_eq!(stolen.take_unreported(), 1);
    }

    #[test]
    fn test_clip_memory_size() {
        assert_eq!(constant_clip(10, 0.0).memory_size(), 80);
        assert_eq!(constant_clip(10, 0.0).frame_count(), 10);
    }
}
