// SPDX-FileCopyrightText: The midibridge authors
// SPDX-License-Identifier: MPL-2.0

use std::io::stdin;

use midibridge::{MidiInputConfig, MidiInputFn, MidiInputManager, MidirBackend, TimeStamp};

fn print_midi_input(ts: TimeStamp, input: &[u8]) -> bool {
    println!("{ts}: {input:02x?} (len = {input_len})", input_len = input.len());
    true
}

fn main() {
    pretty_env_logger::init();
    match run() {
        Ok(()) => (),
        Err(err) => println!("Error: {err}"),
    }
}

fn run() -> anyhow::Result<()> {
    let config = MidiInputConfig::default();
    let backend = MidirBackend::probe(&config);
    let mut manager = MidiInputManager::new(backend, config, || MidiInputFn(print_midi_input));
    if !manager.is_supported() {
        anyhow::bail!("MIDI not supported");
    }

    println!("\nAvailable devices:");
    for device_name in manager.available_devices() {
        println!("- {device_name}");
    }

    manager.set_enabled(true);
    let Some(device) = manager.connected_device() else {
        anyhow::bail!("no MIDI input device connected");
    };
    println!(
        "{device_name}: connected, press ENTER to exit...",
        device_name = device.display_name()
    );

    let mut line = String::new();
    stdin().read_line(&mut line)?;

    manager.set_enabled(false);
    manager.cleanup();
    Ok(())
}
