// SPDX-FileCopyrightText: The midibridge authors
// SPDX-License-Identifier: MPL-2.0

use std::borrow::Cow;

use midir::{ConnectError, ConnectErrorKind, Ignore, InitError, MidiInput};
use thiserror::Error;

use super::{
    handle_midi_input, BoxedMidiInputHandler, MidiDeviceId, MidiDeviceInfo, MidiInputBackend,
    MidiInputConfig, MidiInputConnection, MidiPortError,
};
use crate::TimeStamp;


/// Each port is exposed as a separate device with a single input port.
const INPUT_PORT_COUNT: usize = 1;

/// Connect failure without the returned [`MidiInput`], which is neither
/// needed nor `Sync`.
#[derive(Debug, Error)]
#[error("failed to connect input port: {kind}")]
struct ConnectInputError {
    kind: ConnectErrorKind,
}

impl From<InitError> for MidiPortError {
    fn from(err: InitError) -> Self {
        MidiPortError::Backend {
            source: Box::new(err),
        }
    }
}

impl From<ConnectError<MidiInput>> for MidiPortError {
    fn from(err: ConnectError<MidiInput>) -> Self {
        MidiPortError::Backend {
            source: Box::new(ConnectInputError { kind: err.kind() }),
        }
    }
}

/// Input connection driven by [`midir`].
#[allow(missing_debug_implementations)]
pub struct MidirInputConnection {
    device_name: String,
    connection: midir::MidiInputConnection<BoxedMidiInputHandler>,
}

impl MidiInputConnection for MidirInputConnection {
    fn close(self) -> Result<(), MidiPortError> {
        let Self {
            device_name,
            connection,
        } = self;
        // Closing the input port also releases the client, there is
        // no separate device to close.
        let (_input, _handler) = connection.close();
        log::debug!("Closed MIDI input port of {device_name}");
        Ok(())
    }
}

/// Enumerates and opens MIDI input ports with [`midir`].
#[allow(missing_debug_implementations)]
pub struct MidirBackend {
    client_name: Cow<'static, str>,
    input: MidiInput,
}

impl MidirBackend {
    pub fn new(config: &MidiInputConfig) -> Result<Self, MidiPortError> {
        let client_name = config.client_name.clone();
        let input = new_midi_input(&client_name)?;
        Ok(Self { client_name, input })
    }

    /// Probe for MIDI support.
    ///
    /// Returns `None` if the platform does not provide a MIDI service.
    #[must_use]
    pub fn probe(config: &MidiInputConfig) -> Option<Self> {
        match Self::new(config) {
            Ok(backend) => Some(backend),
            Err(err) => {
                log::warn!("Failed to initialize MIDI input: {err}");
                None
            }
        }
    }
}

/// Select the port of `device` among the currently enumerated `ports`.
///
/// The enumeration order might have changed since the device has been
/// listed. The port at the index of the device must still have the same name.
fn select_input_port<'a, P>(
    ports: &'a [P],
    port_name: impl Fn(&P) -> Option<String>,
    device: &MidiDeviceInfo,
    port_index: usize,
) -> Result<&'a P, MidiPortError> {
    if port_index >= INPUT_PORT_COUNT {
        return Err(MidiPortError::InputPortNotAvailable {
            port_index,
            port_count: INPUT_PORT_COUNT,
        });
    }
    let Some(port) = usize::try_from(device.id.value())
        .ok()
        .and_then(|index| ports.get(index))
    else {
        return Err(MidiPortError::DeviceNotAvailable);
    };
    if port_name(port) != device.name {
        log::debug!("MIDI input port #{id} has been replaced", id = device.id);
        return Err(MidiPortError::DeviceNotAvailable);
    }
    Ok(port)
}

fn new_midi_input(client_name: &str) -> Result<MidiInput, InitError> {
    let mut input = MidiInput::new(client_name)?;
    // Forward all bytes unfiltered, including SysEx, timing, and active sensing.
    input.ignore(Ignore::None);
    Ok(input)
}

impl MidiInputBackend for MidirBackend {
    type Connection = MidirInputConnection;

    fn devices(&self) -> Vec<MidiDeviceInfo> {
        self.input
            .ports()
            .iter()
            .enumerate()
            .filter_map(|(index, port)| {
                let Ok(id) = u32::try_from(index) else {
                    log::warn!("Ignoring MIDI input port #{index}");
                    return None;
                };
                let name = match self.input.port_name(port) {
                    Ok(name) => Some(name),
                    Err(err) => {
                        log::debug!("Failed to query name of MIDI input port #{index}: {err}");
                        None
                    }
                };
                Some(MidiDeviceInfo {
                    id: MidiDeviceId::new(id),
                    name,
                    input_port_count: INPUT_PORT_COUNT,
                })
            })
            .collect()
    }

    fn open_input_port(
        &mut self,
        device: &MidiDeviceInfo,
        port_index: usize,
        handler: BoxedMidiInputHandler,
    ) -> Result<Self::Connection, MidiPortError> {
        let ports = self.input.ports();
        let port = select_input_port(
            &ports,
            |port| self.input.port_name(port).ok(),
            device,
            port_index,
        )?;
        let input = new_midi_input(&self.client_name)?;
        let device_name = device.display_name().into_owned();
        let connection = input.connect(
            port,
            &device_name,
            |micros, bytes, handler| {
                handle_midi_input(TimeStamp::from_micros(micros), bytes, handler);
            },
            handler,
        )?;
        Ok(MidirInputConnection {
            device_name,
            connection,
        })
    }
}
