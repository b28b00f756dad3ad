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

//! Scheduling for the output callback thread.
//!
//! The callback drains pad triggers from the command channel and mixes them, so any preemption
//! there shows up as latency between a hit and its sound. cpal owns the thread, which means the
//! priority can only be raised from inside the first callback.

use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};
use tracing::{info, warn};

/// Used when PADSAMPLER_THREAD_PRIORITY is unset or not a number from 0 to 99.
const DEFAULT_PRIORITY: u8 = 70;

fn parse_priority(value: &str) -> Option<ThreadPriorityValue> {
    match value.trim().parse::<u8>() {
        Ok(n) if n < 100 => ThreadPriorityValue::try_from(n).ok(),
        _ => None,
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Priority settings for the mixer callback, read from the environment while the stream is
/// being built.
#[derive(Debug)]
pub struct CallbackPriority {
    priority: Option<ThreadPriorityValue>,
    realtime: bool,
    applied: bool,
}

impl CallbackPriority {
    /// Reads PADSAMPLER_THREAD_PRIORITY and PADSAMPLER_DISABLE_RT_AUDIO.
    pub fn from_env() -> CallbackPriority {
        let priority = std::env::var("PADSAMPLER_THREAD_PRIORITY")
            .ok()
            .and_then(|v| parse_priority(&v))
            .or_else(|| ThreadPriorityValue::try_from(DEFAULT_PRIORITY).ok());
        let realtime = !std::env::var("PADSAMPLER_DISABLE_RT_AUDIO")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);
        CallbackPriority {
            priority,
            realtime,
            applied: false,
        }
    }

    /// Raises the calling thread's priority. Called at the top of every mixer callback, but only
    /// the first call does anything.
    pub fn apply(&mut self) {
        if self.applied {
            return;
        }
        self.applied = true;

        let Some(priority) = self.priority else {
            return;
        };
        let priority = ThreadPriority::Crossplatform(priority);
        let _ = set_current_thread_priority(priority);

        #[cfg(unix)]
        if self.realtime {
            use thread_priority::unix::{
                set_thread_priority_and_policy, thread_native_id, RealtimeThreadSchedulePolicy,
                ThreadSchedulePolicy,
            };
            match set_thread_priority_and_policy(
                thread_native_id(),
                priority,
                ThreadSchedulePolicy::Realtime(RealtimeThreadSchedulePolicy::Fifo),
            ) {
                Ok(()) => info!("Mixer callback running with SCHED_FIFO"),
                Err(e) => warn!(
                    err = %e,
                    "Unable to use SCHED_FIFO for the mixer callback, pad latency may jitter"
                ),
            }
        }
        #[cfg(not(unix))]
        let _ = self.realtime;
    }
}
