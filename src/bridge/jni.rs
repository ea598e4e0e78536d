// SPDX-FileCopyrightText: The midibridge authors
// SPDX-License-Identifier: MPL-2.0

//! JNI adapter
//!
//! The Java side copies each received chunk into a new `byte[]` and invokes
//! a static native method with the signature
//!
//! ```java
//! public static native void onMidiMessageReceived(byte[] data, int length);
//! ```
//!
//! The exported symbol name depends on the package and class of the host
//! application and is generated with [`export_midi_input_callback!`](crate::export_midi_input_callback).

use ::jni::{objects::JByteArray, sys::jint, JNIEnv};

use super::forward_midi_input;

/// Forward the contents of a Java `byte[]` to the registered sink.
///
/// Errors are logged and the input is dropped. Exceptions are never
/// thrown back into the Java runtime.
pub fn on_midi_message_received(env: &JNIEnv<'_>, data: &JByteArray<'_>, length: jint) {
    if data.is_null() {
        log::warn!("Dropping MIDI input: null array");
        return;
    }
    match env.convert_byte_array(data) {
        Ok(bytes) => {
            forward_midi_input(&bytes, length);
        }
        Err(err) => {
            log::error!("Failed to read MIDI input from Java array: {err}");
        }
    }
}

/// Export the native method that receives MIDI input from Java.
///
/// The argument is the mangled JNI symbol name of the `native` method, i.e.
/// `Java_<package>_<class>_onMidiMessageReceived` with all dots in the package
/// name replaced by underscores.
///
/// ```ignore
/// midibridge::export_midi_input_callback!(Java_org_example_app_MidiInput_onMidiMessageReceived);
/// ```
#[macro_export]
macro_rules! export_midi_input_callback {
    ($symbol:ident) => {
        #[allow(non_snake_case, unreachable_pub, unsafe_code)]
        #[no_mangle]
        pub extern "system" fn $symbol<'local>(
            env: $crate::jni::JNIEnv<'local>,
            _class: $crate::jni::objects::JClass<'local>,
            data: $crate::jni::objects::JByteArray<'local>,
            length: $crate::jni::sys::jint,
        ) {
            $crate::bridge::jni::on_midi_message_received(&env, &data, length);
        }
    };
}
