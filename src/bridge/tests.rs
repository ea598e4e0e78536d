// SPDX-FileCopyrightText: The midibridge authors
// SPDX-License-Identifier: MPL-2.0

use std::sync::{mpsc, Mutex};

use super::*;
use crate::MidiInputFn;

// All tests share the process-wide sink.
static SERIAL: Mutex<()> = Mutex::new(());

fn channel_sink(accept: bool) -> (BoxedMidiInputHandler, mpsc::Receiver<(TimeStamp, Vec<u8>)>) {
    let (tx, rx) = mpsc::channel();
    let sink: BoxedMidiInputHandler = Box::new(MidiInputFn(move |ts: TimeStamp, input: &[u8]| {
        tx.send((ts, input.to_vec())).unwrap();
        accept
    }));
    (sink, rx)
}

#[test]
fn forward_without_sink() {
    let _serial = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    drop(unregister_midi_input_sink());

    assert!(!is_midi_input_sink_registered());
    assert!(!forward_midi_input(&[0x90, 0x3c, 0x7f], 3));
}

#[test]
fn forward_copies_the_given_length() {
    let _serial = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    let (sink, rx) = channel_sink(true);
    drop(register_midi_input_sink(sink));

    assert!(forward_midi_input(&[0xb0, 0x07, 0x64, 0x00], 3));
    assert!(forward_midi_input(&[0xf8], 1));

    assert_eq!(vec![0xb0, 0x07, 0x64], rx.try_recv().unwrap().1);
    assert_eq!(vec![0xf8], rx.try_recv().unwrap().1);
    assert!(unregister_midi_input_sink().is_some());
}

#[test]
fn forward_truncates_excessive_length() {
    let _serial = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    let (sink, rx) = channel_sink(true);
    drop(register_midi_input_sink(sink));

    assert!(forward_midi_input(&[0xc0, 0x05], 16));

    assert_eq!(vec![0xc0, 0x05], rx.try_recv().unwrap().1);
    drop(unregister_midi_input_sink());
}

#[test]
fn forward_drops_empty_and_negative_lengths() {
    let _serial = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    let (sink, rx) = channel_sink(true);
    drop(register_midi_input_sink(sink));

    assert!(!forward_midi_input(&[0x90, 0x3c, 0x7f], 0));
    assert!(!forward_midi_input(&[0x90, 0x3c, 0x7f], -1));
    assert!(!forward_midi_input(&[], 3));

    assert!(rx.try_recv().is_err());
    drop(unregister_midi_input_sink());
}

#[test]
fn forward_reports_rejected_input() {
    let _serial = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    let (sink, rx) = channel_sink(false);
    drop(register_midi_input_sink(sink));

    assert!(!forward_midi_input(&[0xfe], 1));

    assert_eq!(vec![0xfe], rx.try_recv().unwrap().1);
    drop(unregister_midi_input_sink());
}

#[test]
fn register_replaces_previous_sink() {
    let _serial = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    drop(unregister_midi_input_sink());
    let (first, first_rx) = channel_sink(true);
    let (second, second_rx) = channel_sink(true);

    assert!(register_midi_input_sink(first).is_none());
    assert!(register_midi_input_sink(second).is_some());
    assert!(forward_midi_input(&[0x80, 0x3c, 0x00], 3));

    assert!(first_rx.try_recv().is_err());
    assert_eq!(vec![0x80, 0x3c, 0x00], second_rx.try_recv().unwrap().1);
    drop(unregister_midi_input_sink());
}

#[test]
fn time_stamps_are_monotonic() {
    let _serial = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    let (sink, rx) = channel_sink(true);
    drop(register_midi_input_sink(sink));

    assert!(forward_midi_input(&[0xf8], 1));
    assert!(forward_midi_input(&[0xf8], 1));

    let (first, _) = rx.try_recv().unwrap();
    let (second, _) = rx.try_recv().unwrap();
    assert!(first <= second);
    drop(unregister_midi_input_sink());
}

#[test]
fn sink_cannot_reenter_the_registry() {
    let _serial = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    let (tx, rx) = mpsc::channel();
    let sink: BoxedMidiInputHandler = Box::new(MidiInputFn(move |_ts: TimeStamp, _input: &[u8]| {
        let (replacement, _) = channel_sink(true);
        let rejected = register_midi_input_sink(replacement).is_some();
        let unregistered = unregister_midi_input_sink().is_some();
        let nested = forward_midi_input(&[0xf8], 1);
        tx.send((rejected, unregistered, nested, is_midi_input_sink_registered()))
            .unwrap();
        true
    }));
    drop(register_midi_input_sink(sink));

    assert!(forward_midi_input(&[0xfa], 1));
    assert_eq!((true, false, false, true), rx.try_recv().unwrap());

    // The original sink is still registered and the scope has been left.
    assert!(forward_midi_input(&[0xfc], 1));
    assert!(rx.try_recv().is_ok());
    assert!(unregister_midi_input_sink().is_some());
    assert!(!is_midi_input_sink_registered());
}

#[cfg(feature = "jni")]
mod jni {
    crate::export_midi_input_callback!(Java_org_example_midi_MidiInput_onMidiMessageReceived);

    #[test]
    fn exported_callback_has_jni_signature() {
        let _: for<'local> extern "system" fn(
            ::jni::JNIEnv<'local>,
            ::jni::objects::JClass<'local>,
            ::jni::objects::JByteArray<'local>,
            ::jni::sys::jint,
        ) = Java_org_example_midi_MidiInput_onMidiMessageReceived;
    }
}
