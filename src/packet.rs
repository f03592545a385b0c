//! USB-MIDI event packets and Code Index Number framing

/// One USB-MIDI event packet.
///
/// Byte 0 carries the cable number (high nibble) and the Code Index
/// Number (low nibble); bytes 1..4 carry up to three MIDI bytes. The
/// cable number is not used for routing here, but it passes through
/// the pipeline untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsbMidiPacket([u8; 4]);

impl UsbMidiPacket {
    /// Wire size of a packet.
    pub const SIZE: usize = 4;

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        UsbMidiPacket(bytes)
    }

    pub fn bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn cable_number(&self) -> u8 {
        self.0[0] >> 4
    }

    pub fn code_index_number(&self) -> u8 {
        self.0[0] & 0x0F
    }

    /// The MIDI bytes framed by the CIN, without the USB header byte.
    ///
    /// Empty for reserved CINs.
    pub fn midi_bytes(&self) -> &[u8] {
        &self.0[1..1 + message_length(self.code_index_number())]
    }
}

impl From<[u8; 4]> for UsbMidiPacket {
    fn from(bytes: [u8; 4]) -> Self {
        UsbMidiPacket::from_bytes(bytes)
    }
}

/// How many of a packet's data bytes make up a real MIDI message,
/// per its Code Index Number.
///
/// Total over the 4-bit domain; only the low nibble of `cin` is read.
pub fn message_length(cin: u8) -> usize {
    match cin & 0x0F {
        0x0 => 0, // reserved
        0x1 => 0, // reserved
        0x2 => 2, // two-byte system common (e.g. MTC, song select)
        0x3 => 3, // three-byte system common (e.g. SPP)
        0x4 => 3, // sysex starts or continues
        0x5 => 1, // single-byte system common or sysex ends
        0x6 => 2, // sysex ends with following two bytes
        0x7 => 3, // sysex ends with following three bytes
        0x8 => 3, // note-off
        0x9 => 3, // note-on
        0xA => 3, // poly-keypress
        0xB => 3, // control change
        0xC => 2, // program change
        0xD => 2, // channel pressure
        0xE => 3, // pitch bend
        _ => 1,   // 0xF: single byte (real-time)
    }
}
