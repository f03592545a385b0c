//! `usb-device`-backed implementation of the device-facing port

mod descriptors;
mod device;

pub use device::{MidiClass, UsbMidiPort};
