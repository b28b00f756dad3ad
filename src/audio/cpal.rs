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
use std::{error::Error, fmt, thread, time::Duration};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info, span, warn, Level};

use super::mixer::{AudioMixer, MixerCommand, StolenVoices, OUTPUT_CHANNELS};
use super::thread_priority::CallbackPriority;
use super::{duration_to_frames, Clip, Gains, SampleId};
use crate::config;

/// A small wrapper around a cpal output stream. The stream lives on its own thread and owns the
/// mixer; everything else talks to it through the command channel.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The sample rate the stream runs at.
    sample_rate: u32,
    /// The mixer's voice limit.
    max_voices: usize,
    /// Commands for the mixer inside the stream callback.
    commands: Sender<MixerCommand>,
    /// Voices the mixer dropped at the voice limit, logged from here instead of the callback.
    stolen_voices: StolenVoices,
    /// Handle to the output thread (keeps it alive).
    _output_thread: thread::JoinHandle<()>,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (SampleRate={}) ({})",
            self.name,
            self.sample_rate,
            self.host_id.name()
        )
    }
}

impl Device {
    /// Lists the names of cpal output devices.
    pub fn list() -> Result<Vec<String>, Box<dyn Error>> {
        Ok(Device::list_cpal_devices()?
            .into_iter()
            .map(|(host_id, name, _)| format!("{} ({})", name, host_id.name()))
            .collect())
    }

    /// Lists cpal output devices along with their host and name.
    fn list_cpal_devices() -> Result<Vec<(cpal::HostId, String, cpal::Device)>, Box<dyn Error>> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                devices.push((host_id, device.name()?, device));
            }
        }

        devices.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(devices)
    }

    /// Finds the device whose name contains the configured name. "default" picks the host's
    /// default output device.
    fn find(name: &str) -> Result<(cpal::HostId, String, cpal::Device), Box<dyn Error>> {
        if name == config::DEFAULT_DEVICE {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or("no default output device found")?;
            return Ok((host.id(), device.name()?, device));
        }

        let mut matches = Device::list_cpal_devices()?
            .into_iter()
            .filter(|(_, device_name, _)| device_name.contains(name))
            .collect::<Vec<_>>();

        if matches.is_empty() {
            return Err(format!("no device found with name {}", name).into());
        }
        if matches.len() > 1 {
            return Err(format!(
                "found too many devices that match ({}), use a less ambiguous device name",
                matches
                    .iter()
                    .map(|(_, device_name, _)| device_name.clone())
                    .collect::<Vec<String>>()
                    .join(", ")
            )
            .into());
        }

        // We've verified that there's only one element in the vector, so this should be safe.
        Ok(matches.swap_remove(0))
    }

    /// Gets the given cpal device and starts its output stream.
    pub fn get(config: &config::Audio) -> Result<Device, Box<dyn Error>> {
        let span = span!(Level::INFO, "open output (cpal)");
        let _enter = span.enter();

        let (host_id, name, device) = Device::find(config.device())?;
        let stream_config = output_config(&device, config.sample_rate())?;
        let sample_rate = stream_config.sample_rate().0;

        let (commands, command_rx) = crossbeam_channel::unbounded();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), String>>(1);
        let mixer = AudioMixer::new(config.max_voices());
        let stolen_voices = mixer.stolen_voices();
        let buffer_size = stream_buffer_size(config.buffer_size(), stream_config.buffer_size());

        // The stream is created inside the thread and never leaves it.
        let output_thread = thread::spawn(move || {
            let stream = match build_stream(
                &device,
                &stream_config,
                buffer_size,
                mixer,
                command_rx,
            ) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(e.to_string()));
                return;
            }
            let _ = ready_tx.send(Ok(()));

            // Keep the stream alive.
            loop {
                thread::park();
            }
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(format!("unable to start output stream: {}", e).into()),
            Err(_) => return Err("output thread exited before the stream started".into()),
        }

        info!(
            device = name,
            host = host_id.name(),
            sample_rate,
            buffer_size = ?buffer_size,
            max_voices = config.max_voices(),
            "Audio output started."
        );

        Ok(Device {
            name,
            host_id,
            sample_rate,
            max_voices: config.max_voices(),
            commands,
            stolen_voices,
            _output_thread: output_thread,
        })
    }

    fn send(&self, command: MixerCommand) -> Result<(), Box<dyn Error>> {
        self.commands
            .send(command)
            .map_err(|_| "audio output thread is gone")?;
        Ok(())
    }
}

impl super::Device for Device {
    fn play(
        &self,
        sample: SampleId,
        clip: &Clip,
        gains: Option<Gains>,
    ) -> Result<(), Box<dyn Error>> {
        let stolen = self.stolen_voices.take_unreported();
        if stolen > 0 {
            warn!(
                target: "player",
                stolen,
                max_voices = self.max_voices,
                "Voice limit reached, oldest voices were stolen"
            );
        }
        self.send(MixerCommand::Play {
            sample,
            clip: clip.clone(),
            gains,
        })
    }

    fn stop(&self, sample: SampleId) -> Result<(), Box<dyn Error>> {
        self.send(MixerCommand::Stop { sample })
    }

    fn fade_out(&self, sample: SampleId, duration: Duration) -> Result<(), Box<dyn Error>> {
        self.send(MixerCommand::FadeOut {
            sample,
            frames: duration_to_frames(duration, self.sample_rate),
        })
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Picks the device's default output config, switched to the requested sample rate when the
/// device supports it.
fn output_config(
    device: &cpal::Device,
    sample_rate: u32,
) -> Result<cpal::SupportedStreamConfig, Box<dyn Error>> {
    let default_config = device.default_output_config()?;
    if default_config.sample_rate().0 == sample_rate {
        return Ok(default_config);
    }

    let supported = device.supported_output_configs()?.find(|range| {
        range.channels() == default_config.channels()
            && range.sample_format() == default_config.sample_format()
            && range.min_sample_rate().0 <= sample_rate
            && sample_rate <= range.max_sample_rate().0
    });

    match supported {
        Some(range) => Ok(range.with_sample_rate(cpal::SampleRate(sample_rate))),
        None => {
            warn!(
                requested = sample_rate,
                using = default_config.sample_rate().0,
                "Sample rate not supported by device, using its default"
            );
            Ok(default_config)
        }
    }
}

/// Picks a fixed buffer size as close to the requested one as the device allows.
fn stream_buffer_size(
    requested: usize,
    supported: &cpal::SupportedBufferSize,
) -> cpal::BufferSize {
    let requested = u32::try_from(requested).unwrap_or(u32::MAX);
    match supported {
        cpal::SupportedBufferSize::Range { min, max } => {
            let clamped = requested.clamp(*min, (*max).max(*min));
            if clamped != requested {
                warn!(
                    requested,
                    using = clamped,
                    min,
                    max,
                    "Buffer size not supported by device, clamping"
                );
            }
            cpal::BufferSize::Fixed(clamped)
        }
        cpal::SupportedBufferSize::Unknown => cpal::BufferSize::Fixed(requested),
    }
}

fn build_stream(
    device: &cpal::Device,
    stream_config: &cpal::SupportedStreamConfig,
    buffer_size: cpal::BufferSize,
    mixer: AudioMixer,
    commands: Receiver<MixerCommand>,
) -> Result<cpal::Stream, Box<dyn Error>> {
    let mut config = stream_config.config();
    config.buffer_size = buffer_size;
    match stream_config.sample_format() {
        cpal::SampleFormat::F32 => build_typed_stream::<f32>(device, &config, mixer, commands),
        cpal::SampleFormat::I16 => build_typed_stream::<i16>(device, &config, mixer, commands),
        cpal::SampleFormat::I32 => build_typed_stream::<i32>(device, &config, mixer, commands),
        cpal::SampleFormat::U16 => build_typed_stream::<u16>(device, &config, mixer, commands),
        other => Err(format!("Unsupported output sample format {:?}", other).into()),
    }
}

fn build_typed_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut mixer: AudioMixer,
    commands: Receiver<MixerCommand>,
) -> Result<cpal::Stream, Box<dyn Error>>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let device_channels = config.channels as usize;
    let mut priority = CallbackPriority::from_env();
    let mut scratch: Vec<f32> = Vec::new();

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            priority.apply();

            while let Ok(command) = commands.try_recv() {
                mixer.apply(command);
            }

            let frames = data.len() / device_channels;
            // Only allocates when the host hands us a bigger buffer than before.
            scratch.resize(frames * OUTPUT_CHANNELS, 0.0);
            mixer.process_into_output(&mut scratch);

            for (out, mixed) in data
                .chunks_mut(device_channels)
                .zip(scratch.chunks_exact(OUTPUT_CHANNELS))
            {
                write_frame(out, mixed);
            }
        },
        |err| error!("CPAL output stream error: {}", err),
        None,
    )?;

    Ok(stream)
}

/// Writes one stereo frame to a device frame of any width. Mono devices get the average, extra
/// channels get silence.
fn write_frame<T>(out: &mut [T], mixed: &[f32])
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    if out.len() == 1 {
        out[0] = T::from_sample(((mixed[0] + mixed[1]) / 2.0).clamp(-1.0, 1.0));
        return;
    }
    for (index, sample) in out.iter_mut().enumerate() {
        let value = mixed.get(index).copied().unwrap_or(0.0);
        *sample = T::from_sample(value.clamp(-1.0, 1.0));
    }
}
