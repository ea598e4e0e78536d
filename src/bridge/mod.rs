// SPDX-FileCopyrightText: The midibridge authors
// SPDX-License-Identifier: MPL-2.0

//! Native entry point for MIDI input received by a foreign runtime
//!
//! On platforms where the OS MIDI service is only accessible from a
//! managed runtime, e.g. the Java `MidiManager` on Android, the device is
//! opened by the host application. The received bytes are then passed
//! across the language boundary into a single, process-wide sink.

use std::{
    cell::Cell,
    sync::{Mutex, MutexGuard, OnceLock, PoisonError},
    time::Instant,
};

use crate::{midi::handle_midi_input, BoxedMidiInputHandler, TimeStamp};

#[cfg(feature = "jni")]
pub mod jni;

#[cfg(test)]
mod tests;

static MIDI_INPUT_SINK: Mutex<Option<BoxedMidiInputHandler>> = Mutex::new(None);

static EPOCH: OnceLock<Instant> = OnceLock::new();

thread_local! {
    // Set while the sink is invoked on this thread.
    static FORWARDING: Cell<bool> = const { Cell::new(false) };
}

struct ForwardingScope;

impl ForwardingScope {
    fn enter() -> Self {
        FORWARDING.with(|forwarding| forwarding.set(true));
        Self
    }
}

impl Drop for ForwardingScope {
    fn drop(&mut self) {
        FORWARDING.with(|forwarding| forwarding.set(false));
    }
}

fn is_forwarding() -> bool {
    FORWARDING.with(Cell::get)
}

fn lock_midi_input_sink() -> MutexGuard<'static, Option<BoxedMidiInputHandler>> {
    // The sink is still usable after a handler has panicked.
    MIDI_INPUT_SINK
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Time elapsed since the first invocation, i.e. the origin is arbitrary.
fn now() -> TimeStamp {
    TimeStamp::from_duration(EPOCH.get_or_init(Instant::now).elapsed())
}

/// Install the sink for all forwarded MIDI input.
///
/// Returns the sink that is no longer registered: the previously
/// registered sink, if any.
///
/// The sink is invoked while holding a global lock and must not block
/// for a long time. Sinks cannot be (un-)registered from within a sink.
/// Such a request is rejected and `sink` is returned unchanged.
pub fn register_midi_input_sink(sink: BoxedMidiInputHandler) -> Option<BoxedMidiInputHandler> {
    if is_forwarding() {
        log::error!("Cannot register MIDI input sink from within a sink");
        return Some(sink);
    }
    // Initialize the epoch before receiving the first input.
    EPOCH.get_or_init(Instant::now);
    let replaced = lock_midi_input_sink().replace(sink);
    if replaced.is_some() {
        log::info!("Replaced MIDI input sink");
    } else {
        log::info!("Registered MIDI input sink");
    }
    replaced
}

/// Remove the registered sink.
///
/// Rejected and returns `None` when invoked from within a sink.
pub fn unregister_midi_input_sink() -> Option<BoxedMidiInputHandler> {
    if is_forwarding() {
        log::error!("Cannot unregister MIDI input sink from within a sink");
        return None;
    }
    let unregistered = lock_midi_input_sink().take();
    if unregistered.is_some() {
        log::info!("Unregistered MIDI input sink");
    }
    unregistered
}

#[must_use]
pub fn is_midi_input_sink_registered() -> bool {
    // The lock is already held while forwarding.
    is_forwarding() || lock_midi_input_sink().is_some()
}

/// Forward received MIDI bytes to the registered sink.
///
/// Only the first `length` bytes of `data` are forwarded. A `length` that
/// exceeds `data` is truncated. The time stamp is assigned on arrival.
///
/// Returns `true` if the bytes have been accepted by the sink.
pub fn forward_midi_input(data: &[u8], length: i32) -> bool {
    if is_forwarding() {
        log::error!("Cannot forward MIDI input from within a sink");
        return false;
    }
    let Ok(length) = usize::try_from(length) else {
        log::warn!("Dropping MIDI input with invalid length {length}");
        return false;
    };
    if length > data.len() {
        log::debug!(
            "Truncating MIDI input length from {length} to {data_len}",
            data_len = data.len()
        );
    }
    let input = &data[..length.min(data.len())];
    if input.is_empty() {
        log::debug!("Ignoring empty MIDI input");
        return false;
    }
    let ts = now();
    let mut registered = lock_midi_input_sink();
    let Some(sink) = registered.as_mut() else {
        log::debug!("Dropping MIDI input {ts} {input:x?}: No sink registered");
        return false;
    };
    let _scope = ForwardingScope::enter();
    handle_midi_input(ts, input, sink)
}
