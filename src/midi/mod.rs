// SPDX-FileCopyrightText: The midibridge authors
// SPDX-License-Identifier: MPL-2.0

use std::{
    borrow::Cow,
    error::Error as StdError,
    ops::{Deref, DerefMut},
};

use derive_more::{Display, From};
use thiserror::Error;

use crate::TimeStamp;

mod manager;
pub use self::manager::{MidiInputConfig, MidiInputManager, MidiInputState};

#[cfg(feature = "midir")]
pub mod midir;


#[derive(Debug, Error)]
pub enum MidiPortError {
    #[error("device not available")]
    DeviceNotAvailable,
    #[error("input port {port_index} not available (number of input ports: {port_count})")]
    InputPortNotAvailable { port_index: usize, port_count: usize },
    #[error("backend: {source}")]
    Backend {
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },
}

/// Device identifier assigned by the [`MidiInputBackend`]
///
/// Only valid while the backend is alive. Must not be stored persistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From)]
#[repr(transparent)]
pub struct MidiDeviceId(u32);

impl MidiDeviceId {
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Properties of a MIDI device as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiDeviceInfo {
    pub id: MidiDeviceId,

    /// Human-readable name
    ///
    /// Not all devices report a name.
    pub name: Option<String>,

    /// Number of input ports that could be connected to a [`MidiInputHandler`]
    pub input_port_count: usize,
}

impl MidiDeviceInfo {
    #[must_use]
    pub const fn has_input_ports(&self) -> bool {
        self.input_port_count > 0
    }

    /// The name for presenting the device to users.
    ///
    /// Falls back to a generic name derived from the id for unnamed devices.
    #[must_use]
    pub fn display_name(&self) -> Cow<'_, str> {
        match &self.name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("MIDI Device {id}", id = self.id)),
        }
    }
}

/// Passive callback for sinking raw MIDI input bytes
///
/// The bytes are passed on verbatim. They might contain a single message,
/// multiple messages, or only a fragment of a message.
pub trait MidiInputHandler: Send {
    /// Invoked for each incoming chunk of bytes.
    ///
    /// Returns `true` if the input has been accepted and handled
    /// or `false` otherwise.
    #[must_use]
    fn handle_midi_input(&mut self, ts: TimeStamp, input: &[u8]) -> bool;
}

impl<D> MidiInputHandler for D
where
    D: DerefMut + Send,
    <D as Deref>::Target: MidiInputHandler,
{
    fn handle_midi_input(&mut self, ts: TimeStamp, input: &[u8]) -> bool {
        self.deref_mut().handle_midi_input(ts, input)
    }
}

pub type BoxedMidiInputHandler = Box<dyn MidiInputHandler + 'static>;

/// Adapts a closure or function into a [`MidiInputHandler`].
#[derive(Debug, Clone, Copy)]
pub struct MidiInputFn<F>(pub F);

impl<F> MidiInputHandler for MidiInputFn<F>
where
    F: FnMut(TimeStamp, &[u8]) -> bool + Send,
{
    fn handle_midi_input(&mut self, ts: TimeStamp, input: &[u8]) -> bool {
        (self.0)(ts, input)
    }
}

/// Creates a new handler each time an input port is opened.
pub trait NewMidiInputHandler {
    type MidiInputHandler: MidiInputHandler + 'static;

    #[must_use]
    fn new_midi_input_handler(&self, device: &MidiDeviceInfo) -> Self::MidiInputHandler;
}

impl<F, H> NewMidiInputHandler for F
where
    F: Fn() -> H,
    H: MidiInputHandler + 'static,
{
    type MidiInputHandler = H;

    fn new_midi_input_handler(&self, _device: &MidiDeviceInfo) -> Self::MidiInputHandler {
        self()
    }
}

/// An open device with a connected input port.
///
/// Dropping the connection without closing it also releases all
/// resources, but any errors are silently discarded.
pub trait MidiInputConnection {
    /// Close both the input port and the device.
    fn close(self) -> Result<(), MidiPortError>;
}

/// OS service for enumerating and opening MIDI devices
pub trait MidiInputBackend {
    type Connection: MidiInputConnection;

    /// Enumerate all currently available devices.
    ///
    /// The order is defined by the backend and should be stable
    /// while the set of connected devices does not change.
    #[must_use]
    fn devices(&self) -> Vec<MidiDeviceInfo>;

    /// Open a device and connect one of its input ports.
    ///
    /// All input received on the port is passed to `handler` until the
    /// returned connection is closed or dropped.
    fn open_input_port(
        &mut self,
        device: &MidiDeviceInfo,
        port_index: usize,
        handler: BoxedMidiInputHandler,
    ) -> Result<Self::Connection, MidiPortError>;
}

/// Adapter for the backend callbacks
pub(crate) fn handle_midi_input<H>(ts: TimeStamp, input: &[u8], handler: &mut H) -> bool
where
    H: MidiInputHandler + ?Sized,
{
    log::trace!("Received MIDI input: {ts} {input:0x?}");
    let handled = handler.handle_midi_input(ts, input);
    if !handled {
        log::warn!("Unhandled MIDI input {ts} {input:x?}");
    }
    handled
}
