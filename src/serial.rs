//! TRS/DIN serial MIDI output
//!
//! Strips the USB framing off a packet and puts the bare MIDI bytes
//! on a UART. Writes block until the peripheral accepts the bytes;
//! at DIN rate that's 320 µs per byte, which the dispatch loop
//! tolerates by design.

use crate::dispatch::PacketSink;
use crate::packet::UsbMidiPacket;
use embedded_hal::blocking::serial::Write;

/// Standard DIN MIDI baud rate. The UART handed to [`SerialMidi`] is
/// expected to be configured for this, 8N1, no flow control.
pub const MIDI_BAUD: u32 = 31250;

pub struct SerialMidi<W> {
    uart: W,
}

impl<W: Write<u8>> SerialMidi<W> {
    pub fn new(uart: W) -> Self {
        SerialMidi { uart }
    }

    /// Send the MIDI bytes of one USB-MIDI packet.
    ///
    /// The CIN decides how many of the three data bytes are real;
    /// reserved CINs frame nothing and produce no serial output.
    pub fn send_packet(&mut self, packet: &UsbMidiPacket) -> Result<(), W::Error> {
        let midi = packet.midi_bytes();
        if midi.is_empty() {
            return Ok(());
        }
        self.uart.bwrite_all(midi)
    }

    /// Send pre-framed MIDI bytes as-is, bypassing CIN decoding.
    pub fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), W::Error> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.uart.bwrite_all(bytes)
    }
}

impl<W: Write<u8>> PacketSink for SerialMidi<W> {
    fn accept(&mut self, packet: &UsbMidiPacket) {
        // the packet is already committed to the device path, so a
        // UART error can only be noted, not unwound
        if self.send_packet(packet).is_err() {
            warn!("serial midi write failed");
        }
    }
}
