// SPDX-FileCopyrightText: The midibridge authors
// SPDX-License-Identifier: MPL-2.0

use std::borrow::Cow;

use super::{
    MidiDeviceInfo, MidiInputBackend, MidiInputConnection as _, MidiPortError,
    NewMidiInputHandler,
};


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiInputConfig {
    /// Client name announced to the OS MIDI service
    pub client_name: Cow<'static, str>,

    /// Index of the input port of the selected device
    pub input_port_index: usize,
}

impl MidiInputConfig {
    pub const DEFAULT_CLIENT_NAME: &'static str = "midibridge";
}

impl Default for MidiInputConfig {
    fn default() -> Self {
        Self {
            client_name: Cow::Borrowed(Self::DEFAULT_CLIENT_NAME),
            input_port_index: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MidiInputState {
    /// No OS MIDI service available.
    Unsupported,
    Disabled,
    /// Enabled, but no input device has been opened.
    Idle,
    Connected,
}

struct OpenedMidiInput<C> {
    device: MidiDeviceInfo,
    connection: C,
}

/// Enables and disables MIDI input from the first available device.
///
/// Only a single device is opened at a time. The device is selected
/// once when enabling the input. Devices that are connected later
/// are only considered after disabling and re-enabling the input.
#[allow(missing_debug_implementations)]
pub struct MidiInputManager<B, F>
where
    B: MidiInputBackend,
{
    backend: Option<B>,
    config: MidiInputConfig,
    new_input_handler: F,
    enabled: bool,
    opened: Option<OpenedMidiInput<B::Connection>>,
}

impl<B, F> MidiInputManager<B, F>
where
    B: MidiInputBackend,
    F: NewMidiInputHandler,
{
    /// Create a new manager.
    ///
    /// `None` indicates that MIDI is not supported on this platform. The
    /// manager is still usable, but all operations are no-ops.
    #[must_use]
    pub fn new(backend: Option<B>, config: MidiInputConfig, new_input_handler: F) -> Self {
        if backend.is_some() {
            log::info!("MIDI support detected");
        } else {
            log::warn!("MIDI not supported on this device");
        }
        Self {
            backend,
            config,
            new_input_handler,
            enabled: false,
            opened: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &MidiInputConfig {
        &self.config
    }

    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.backend.is_some()
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled && self.is_supported()
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.opened.is_some()
    }

    /// The currently opened device.
    #[must_use]
    pub fn connected_device(&self) -> Option<&MidiDeviceInfo> {
        self.opened.as_ref().map(|opened| &opened.device)
    }

    #[must_use]
    pub const fn state(&self) -> MidiInputState {
        if !self.is_supported() {
            return MidiInputState::Unsupported;
        }
        if !self.enabled {
            return MidiInputState::Disabled;
        }
        if self.is_connected() {
            MidiInputState::Connected
        } else {
            MidiInputState::Idle
        }
    }

    /// Enable or disable MIDI input.
    ///
    /// The enabled state reflects the request even if no input device
    /// could be opened.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !self.is_supported() {
            log::warn!("MIDI not supported - cannot enable");
            return;
        }
        if enabled == self.enabled {
            return;
        }
        if enabled {
            self.start_input();
        } else {
            self.stop_input();
        }
        self.enabled = enabled;
        log::info!("MIDI {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Display names of all devices with input ports.
    #[must_use]
    pub fn available_devices(&self) -> Vec<String> {
        let Some(backend) = &self.backend else {
            return Vec::new();
        };
        backend
            .devices()
            .iter()
            .filter(|device| device.has_input_ports())
            .map(|device| device.display_name().into_owned())
            .collect()
    }

    /// Close all devices and release the backend.
    ///
    /// The manager becomes unsupported and all further operations
    /// are no-ops.
    pub fn cleanup(&mut self) {
        self.stop_input();
        self.enabled = false;
        if self.backend.take().is_some() {
            log::debug!("Released MIDI backend");
        }
    }

    fn start_input(&mut self) {
        debug_assert!(!self.is_connected());
        let Some(backend) = &mut self.backend else {
            return;
        };
        let Some(device) = backend
            .devices()
            .into_iter()
            .find(MidiDeviceInfo::has_input_ports)
        else {
            log::info!("No MIDI input devices found");
            return;
        };
        let handler = Box::new(self.new_input_handler.new_midi_input_handler(&device));
        match backend.open_input_port(&device, self.config.input_port_index, handler) {
            Ok(connection) => {
                log::info!(
                    "MIDI device opened: {device_name}",
                    device_name = device.display_name()
                );
                self.opened = Some(OpenedMidiInput { device, connection });
            }
            Err(err) => {
                log_open_error(&device, self.config.input_port_index, &err);
            }
        }
    }

    fn stop_input(&mut self) {
        if let Some(OpenedMidiInput { device, connection }) = self.opened.take() {
            if let Err(err) = connection.close() {
                log::error!(
                    "Error closing MIDI device {device_name}: {err}",
                    device_name = device.display_name()
                );
            }
        }
        debug_assert!(!self.is_connected());
        log::info!("MIDI input stopped");
    }
}

fn log_open_error(device: &MidiDeviceInfo, port_index: usize, err: &MidiPortError) {
    let device_name = device.display_name();
    match err {
        MidiPortError::InputPortNotAvailable { .. } => {
            log::error!("Failed to open MIDI input port {port_index} of {device_name}: {err}");
        }
        MidiPortError::DeviceNotAvailable | MidiPortError::Backend { .. } => {
            log::error!("Failed to open MIDI device {device_name}: {err}");
        }
    }
}
