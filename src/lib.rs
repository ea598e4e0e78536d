// SPDX-FileCopyrightText: The midibridge authors
// SPDX-License-Identifier: MPL-2.0

#![allow(rustdoc::invalid_rust_codeblocks)]
#![doc = include_str!("../README.md")]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(unreachable_pub)]
#![warn(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(rustdoc::broken_intra_doc_links)]
// Repetitions of module/type names occur frequently when using many
// modules for keeping the size of the source files handy. Often
// types have the same name as their parent module.
#![allow(clippy::module_name_repetitions)]
// Repeating the type name in `..Default::default()` expressions
// is not needed since the context is obvious.
#![allow(clippy::default_trait_access)]

use std::{fmt, time::Duration};

pub mod bridge;
pub use self::bridge::{
    forward_midi_input, is_midi_input_sink_registered, register_midi_input_sink,
    unregister_midi_input_sink,
};

pub mod midi;
pub use self::midi::{
    BoxedMidiInputHandler, MidiDeviceId, MidiDeviceInfo, MidiInputBackend, MidiInputConfig,
    MidiInputConnection, MidiInputFn, MidiInputHandler, MidiInputManager, MidiInputState,
    MidiPortError, NewMidiInputHandler,
};

#[cfg(feature = "midir")]
pub use self::midi::midir::{MidirBackend, MidirInputConnection};

#[cfg(feature = "jni")]
pub use ::jni;

/// Monotonic time stamp with microsecond precision.
///
/// The origin is unspecified and depends on the source of the
/// time stamp. Only differences between time stamps from the
/// same source are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct TimeStamp(u64);

impl TimeStamp {
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    #[must_use]
    pub const fn to_micros(self) -> u64 {
        self.0
    }

    /// Saturates at [`u64::MAX`] microseconds.
    #[must_use]
    pub fn from_duration(duration: Duration) -> Self {
        Self(u64::try_from(duration.as_micros()).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(micros) = self;
        write!(f, "@{micros} \u{00B5}s")
    }
}
