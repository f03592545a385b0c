//! Router core for a USB-MIDI bridge
//!
//! `midibridge` moves MIDI between a USB host port (where a
//! class-compliant controller plugs in), a USB device port (through
//! which the bridge shows up as a USB-MIDI device on a computer), and
//! a TRS/DIN serial MIDI output. Inbound USB-MIDI packets are
//! captured into a bounded ring without blocking the host poll path,
//! then fanned out in order to the device endpoint and the serial
//! link, with backpressure expressed as deferral instead of loss.
//!
//! The controller stacks themselves stay outside the crate: implement
//! [`HostPort`] and [`DevicePort`] over your platform's USB stacks
//! (a [`usb-device`] backed device port lives in [`midi`]), hand a
//! UART to [`SerialMidi`], and run [`MidiBridge::run`].
//!
//! [`usb-device`]: https://crates.io/crates/usb-device

#![no_std]

#[macro_use]
mod log;

mod bridge;
mod capture;
mod dispatch;
mod packet;
mod port;
mod queue;
mod serial;

pub mod midi;

pub use bridge::{MidiBridge, DEFAULT_QUEUE_SLOTS};
pub use capture::capture_packets;
pub use dispatch::{
    DeferReason, DispatchConfig, DispatchOutcome, OutboundDispatch, PacketSink,
};
pub use packet::{message_length, UsbMidiPacket};
pub use port::{DevicePort, HostEvent, HostPort, TransferStatus};
pub use queue::PacketQueue;
pub use serial::{SerialMidi, MIDI_BAUD};
