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
use std::{
    fmt,
    time::{Duration, Instant},
};

use tracing::{error, info};

use crate::audio::{self, Clip, Gains, SampleId};
use crate::config::{self, CENTER_PAN};

/// What triggering a sample does.
#[derive(Clone, Debug)]
pub enum Action {
    /// Plays the clip.
    Play(Clip),
    /// Increments the counter.
    CountUp,
    /// Resets the counter.
    CountReset,
}

/// A trigger counter driven by the counter sentinels.
#[derive(Debug, Default)]
pub struct Counter {
    value: u64,
}

impl Counter {
    pub fn increment(&mut self) -> u64 {
        self.value += 1;
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }

    #[cfg(test)]
    pub fn value(&self) -> u64 {
        self.value
    }
}

/// The result of a play request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Triggered again within the debounce interval.
    Debounced,
    /// The counter was incremented to the given value.
    CounterIncremented(u64),
    /// The counter was reset.
    CounterReset,
    /// A new voice was started.
    Played,
    /// The audio device refused the request.
    Failed,
}

/// The result of a stop request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    FadingOut(Duration),
    /// Counter samples have nothing to stop.
    Ignored,
}

/// Converts a pan position into channel gains. Center pan applies no gains.
pub fn pan_gains(pan: u8) -> Option<Gains> {
    if pan == CENTER_PAN {
        return None;
    }
    let right = pan as f32 / 255.0;
    Some(Gains {
        left: 1.0 - right,
        right,
    })
}

/// A playable sample bound to a note.
pub struct Sample {
    id: SampleId,
    path: String,
    action: Action,
    one_shot: bool,
    fade_out: Option<Duration>,
    instrument: Option<String>,
    pan: u8,
    no_overlap: bool,
    debounce: Option<Duration>,
    last_played: Option<Instant>,
}

impl Sample {
    /// Creates a sample from its configuration. The id must be unique across all samples.
    pub fn new(id: SampleId, config: &config::Sample, action: Action) -> Sample {
        Sample {
            id,
            path: config.path().unwrap_or_default().to_string(),
            action,
            one_shot: config.one_shot(),
            fade_out: config.fade_out(),
            instrument: config.instrument().map(str::to_string),
            pan: config.pan(),
            no_overlap: config.no_overlap(),
            debounce: config.debounce(),
            last_played: None,
        }
    }

    /// Triggers the sample.
    pub fn play(
        &mut self,
        device: &dyn audio::Device,
        counter: &mut Counter,
        now: Instant,
    ) -> PlayOutcome {
        if let (Some(debounce), Some(last_played)) = (self.debounce, self.last_played) {
            if now.saturating_duration_since(last_played) < debounce {
                info!(target: "player", path = self.path, "Ignored key bounce");
                return PlayOutcome::Debounced;
            }
        }
        self.last_played = Some(now);

        let clip = match &self.action {
            Action::CountUp => {
                let count = counter.increment();
                info!(target: "player", count, "Counter incremented");
                return PlayOutcome::CounterIncremented(count);
            }
            Action::CountReset => {
                counter.reset();
                info!(target: "player", "Counter reset");
                return PlayOutcome::CounterReset;
            }
            Action::Play(clip) => clip,
        };

        if self.no_overlap {
            self.stop(device);
        }

        if let Err(e) = device.play(self.id, clip, pan_gains(self.pan)) {
            error!(target: "player", path = self.path, err = e.to_string(), "Unable to play sample");
            return PlayOutcome::Failed;
        }

        info!(
            target: "player",
            path = self.path,
            mode = if self.one_shot { "one-shot" } else { "sustain" },
            "Play"
        );
        PlayOutcome::Played
    }

    /// Stops every playing instance of the sample, fading out if configured.
    pub fn stop(&self, device: &dyn audio::Device) -> StopOutcome {
        if !matches!(self.action, Action::Play(_)) {
            return StopOutcome::Ignored;
        }

        let (result, outcome) = match self.fade_out {
            Some(fade_out) => (
                device.fade_out(self.id, fade_out),
                StopOutcome::FadingOut(fade_out),
            ),
            None => (device.stop(self.id), StopOutcome::Stopped),
        };

        match result {
            Ok(()) => match outcome {
                StopOutcome::FadingOut(fade_out) => info!(
                    target: "player",
                    path = self.path,
                    fade_out_ms = fade_out.as_millis(),
                    "Fade out"
                ),
                _ => info!(target: "player", path = self.path, "Stop"),
            },
            Err(e) => {
                error!(target: "player", path = self.path, err = e.to_string(), "Unable to stop sample")
            }
        }
        outcome
    }

    /// Returns true if a note from the given instrument may trigger this sample.
    pub fn matches_instrument(&self, uid: &str) -> bool {
        self.instrument
            .as_deref()
            .map_or(true, |instrument| instrument == uid)
    }

    /// Returns true if the sample ignores Note Off.
    pub fn one_shot(&self) -> bool {
        self.one_shot
    }

    /// Gets the configured path.
    #[cfg(test)]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.id)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::audio::mock::{self, Call};

    fn sample(yaml: &str, id: SampleId) -> Sample {
        let config: config::Sample = ::config::Config::builder()
            .add_source(::config::File::from_str(yaml, ::config::FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let action = match config.path() {
            Some(config::COUNT_UP) => Action::CountUp,
            Some(config::COUNT_RESET) => Action::CountReset,
            _ => Action::Play(Clip::new(vec![[0.0, 0.0]; 16])),
        };
        Sample::new(id, &config, action)
    }

    #[test]
    fn test_debounce() {
        let device = mock::Device::get("mock", 44100);
        let mut counter = Counter::default();
        let mut sample = sample("{note: 36, path: kick.wav, debounce: 200}", 0);

        let start = Instant::now();
        assert_eq!(
            sample.play(&device, &mut counter, start),
            PlayOutcome::Played
        );
        assert_eq!(
            sample.play(&device, &mut counter, start + Duration::from_millis(150)),
            PlayOutcome::Debounced
        );
        // The bounce didn't move the window.
        assert_eq!(
            sample.play(&device, &mut counter, start + Duration::from_millis(200)),
            PlayOutcome::Played
        );
        assert_eq!(
            sample.play(&device, &mut counter, start + Duration::from_millis(450)),
            PlayOutcome::Played
        );

        let plays = device
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Play { .. }))
            .count();
        assert_eq!(plays, 3);
    }

    #[test]
    fn test_no_debounce_plays_every_time() {
        let device = mock::Device::get("mock", 44100);
        let mut counter = Counter::default();
        let mut sample = sample("{note: 36, path: kick.wav}", 0);

        let now = Instant::now();
        assert_eq!(sample.play(&device, &mut counter, now), PlayOutcome::Played);
        assert_eq!(sample.play(&device, &mut counter, now), PlayOutcome::Played);
        assert_eq!(device.calls().len(), 2);
    }

    #[test]
    fn test_no_overlap_stops_first() {
        let device = mock::Device::get("mock", 44100);
        let mut counter = Counter::default();
        let mut sample = sample("{note: 36, path: kick.wav, no_overlap: true}", 4);

        let now = Instant::now();
        sample.play(&device, &mut counter, now);
        sample.play(&device, &mut counter, now);

        assert_eq!(
            device.calls(),
            vec![
                Call::Stop { sample: 4 },
                Call::Play {
                    sample: 4,
                    gains: None
                },
                Call::Stop { sample: 4 },
                Call::Play {
                    sample: 4,
                    gains: None
                },
            ]
        );
    }

    #[test]
    fn test_no_overlap_uses_fade_out() {
        let device = mock::Device::get("mock", 44100);
        let mut counter = Counter::default();
        let mut sample = sample(
            "{note: 36, path: kick.wav, no_overlap: true, fade_out: 50}",
            1,
        );

        sample.play(&device, &mut counter, Instant::now());

        assert_eq!(
            device.calls()[0],
            Call::FadeOut {
                sample: 1,
                duration: Duration::from_millis(50)
            }
        );
    }

    #[test]
    fn test_pan_gains() {
        assert_eq!(pan_gains(127), None);

        let left = pan_gains(0).expect("pan 0 should have gains");
        assert_eq!(left.left, 1.0);
        assert_eq!(left.right, 0.0);

        let right = pan_gains(255).expect("pan 255 should have gains");
        assert!(right.left.abs() < 1e-6);
        assert_eq!(right.right, 1.0);
    }

    #[test]
    fn test_play_applies_pan() {
        let device = mock::Device::get("mock", 44100);
        let mut counter = Counter::default();
        let mut sample = sample("{note: 36, path: kick.wav, pan: 0}", 2);

        sample.play(&device, &mut counter, Instant::now());

        assert_eq!(
            device.calls(),
            vec![Call::Play {
                sample: 2,
                gains: Some(Gains {
                    left: 1.0,
                    right: 0.0
                })
            }]
        );
    }

    #[test]
    fn test_stop() {
        let device = mock::Device::get("mock", 44100);
        let immediate = sample("{note: 36, path: kick.wav}", 0);
        let faded = sample("{note: 36, path: pad.wav, fade_out: 250}", 1);

        assert_eq!(immediate.stop(&device), StopOutcome::Stopped);
        assert_eq!(
            faded.stop(&device),
            StopOutcome::FadingOut(Duration::from_millis(250))
        );
        assert_eq!(
            device.calls(),
            vec![
                Call::Stop { sample: 0 },
                Call::FadeOut {
                    sample: 1,
                    duration: Duration::from_millis(250)
                }
            ]
        );
    }

    #[test]
    fn test_counter_samples() {
        let device = mock::Device::get("mock", 44100);
        let mut counter = Counter::default();
        let mut up = sample("{note: 40, path: COUNT_UP}", 0);
        let mut reset = sample("{note: 41, path: COUNT_RESET}", 1);

        let now = Instant::now();
        assert_eq!(
            up.play(&device, &mut counter, now),
            PlayOutcome::CounterIncremented(1)
        );
        assert_eq!(
            up.play(&device, &mut counter, now),
            PlayOutcome::CounterIncremented(2)
        );
        assert_eq!(
            reset.play(&device, &mut counter, now),
            PlayOutcome::CounterReset
        );
        assert_eq!(counter.value(), 0);
        assert_eq!(up.stop(&device), StopOutcome::Ignored);
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_matches_instrument() {
        let any = sample("{note: 36, path: kick.wav}", 0);
        let bound = sample("{note: 36, path: kick.wav, instrument: A}", 1);

        assert!(any.matches_instrument("A"));
        assert!(any.matches_instrument("B"));
        assert!(bound.matches_instrument("A"));
        assert!(!bound.matches_instrument("B"));
    }
}
