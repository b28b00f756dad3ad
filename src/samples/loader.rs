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

//! Sample loading and caching.
//!
//! Samples are decoded entirely into memory at startup so triggering them never touches the disk.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use thiserror::Error;
use tracing::{debug, info};

use crate::audio::Clip;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("unable to open {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to decode {}: {}", .path.display(), .source)]
    Decode {
        path: PathBuf,
        source: SymphoniaError,
    },

    #[error("{} has no audio track", .path.display())]
    NoTrack { path: PathBuf },

    #[error("{} does not specify a sample rate", .path.display())]
    UnknownSampleRate { path: PathBuf },
}

/// Audio as decoded from a file, already folded to stereo.
struct DecodedAudio {
    frames: Vec<[f32; 2]>,
    channels: usize,
    sample_rate: u32,
}

/// Manages loading and caching of sample data.
pub struct SampleLoader {
    /// Cache of loaded clips by file path.
    cache: HashMap<PathBuf, Clip>,
    /// Target sample rate for transcoding (matches audio output).
    target_sample_rate: u32,
}

impl SampleLoader {
    /// Creates a new sample loader.
    pub fn new(target_sample_rate: u32) -> Self {
        Self {
            cache: HashMap::new(),
            target_sample_rate,
        }
    }

    /// Loads a sample from a file into memory.
    /// Returns a cached version if already loaded.
    pub fn load(&mut self, path: &Path) -> Result<Clip, LoadError> {
        if let Some(clip) = self.cache.get(path) {
            debug!(path = ?path, "Using cached sample");
            return Ok(clip.clone());
        }

        info!(path = ?path, "Loading sample into memory");
        let decoded = decode_file(path)?;

        let frames = if decoded.sample_rate != self.target_sample_rate {
            info!(
                source_rate = decoded.sample_rate,
                target_rate = self.target_sample_rate,
                "Transcoding sample"
            );
            transcode_frames(
                &decoded.frames,
                decoded.sample_rate,
                self.target_sample_rate,
            )
        } else {
            decoded.frames
        };

        let clip = Clip::new(frames);
        let duration =
            Duration::from_secs_f64(clip.frame_count() as f64 / self.target_sample_rate as f64);

        info!(
            path = ?path,
            channels = decoded.channels,
            sample_rate = self.target_sample_rate,
            duration_ms = duration.as_millis(),
            memory_kb = clip.memory_size() / 1024,
            "Sample loaded"
        );

        self.cache.insert(path.to_path_buf(), clip.clone());
        Ok(clip)
    }

    /// Returns the total memory used by cached samples.
    pub fn total_memory_usage(&self) -> usize {
        self.cache.values().map(Clip::memory_size).sum()
    }
}

impl std::fmt::Debug for SampleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleLoader")
            .field("cached_samples", &self.cache.len())
            .field("target_sample_rate", &self.target_sample_rate)
            .field("total_memory_kb", &(self.total_memory_usage() / 1024))
            .finish()
    }
}

/// Decodes the first audio track of a file into stereo frames.
fn decode_file(path: &Path) -> Result<DecodedAudio, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let decode_error = |source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(decode_error)?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| LoadError::NoTrack {
            path: path.to_path_buf(),
        })?;
    let track_id = track.id;
    let params = track.codec_params.clone();
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| LoadError::UnknownSampleRate {
            path: path.to_path_buf(),
        })?;

    let mut decoder = get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(decode_error)?;

    let mut frames = Vec::new();
    let mut channels = params.channels.map(|c| c.count()).unwrap_or(0);
    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(decode_error(e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt packet is skipped rather than failing the whole file.
            Err(SymphoniaError::DecodeError(e)) => {
                debug!(path = ?path, err = e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(decode_error(e)),
        };

        let spec = *decoded.spec();
        channels = spec.channels.count();
        if channels == 0 {
            continue;
        }
        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        frames.extend(to_stereo(buffer.samples(), channels));
    }

    Ok(DecodedAudio {
        frames,
        channels,
        sample_rate,
    })
}

/// Folds interleaved samples into stereo frames. Mono is copied to both sides and anything wider
/// keeps its first two channels.
fn to_stereo(samples: &[f32], channels: usize) -> impl Iterator<Item = [f32; 2]> + '_ {
    samples.chunks_exact(channels).map(move |frame| {
        if channels == 1 {
            [frame[0], frame[0]]
        } else {
            [frame[0], frame[1]]
        }
    })
}

/// Transcodes frames from one sample rate to another using linear interpolation.
fn transcode_frames(frames: &[[f32; 2]], source_rate: u32, target_rate: u32) -> Vec<[f32; 2]> {
    let ratio = target_rate as f64 / source_rate as f64;
    let target_frames = (frames.len() as f64 * ratio).ceil() as usize;

    (0..target_frames)
        .map(|target_frame| {
            let source_pos = target_frame as f64 / ratio;
            let source_frame = source_pos.floor() as usize;
            let frac = source_pos.fract() as f32;

            let s0 = frames.get(source_frame).copied().unwrap_or([0.0, 0.0]);
            let s1 = frames.get(source_frame + 1).copied().unwrap_or(s0);
            [
                s0[0] + (s1[0] - s0[0]) * frac,
                s0[1] + (s1[1] - s0[1]) * frac,
            ]
        })
        .collect()
}
