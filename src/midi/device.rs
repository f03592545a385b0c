use super::descriptors::*;
use crate::packet::UsbMidiPacket;
use crate::port::DevicePort;
use crate::queue::PacketQueue;
use usb_device::device::{UsbDevice, UsbDeviceBuilder, UsbDeviceState, UsbVidPid};
use usb_device::{class_prelude::*, Result, UsbError};

/// Egress ring slots; 16 usable packets, one bulk endpoint's worth.
const EGRESS_SLOTS: usize = 17;

/// USB-MIDI streaming class with a single bulk IN endpoint.
///
/// Packets written here are buffered in a small egress ring and pushed
/// into the endpoint as the host polls it, so `write_capacity` is a
/// real query rather than a guess about endpoint readiness.
pub struct MidiClass<'a, B: UsbBus> {
    audio_control_interface: InterfaceNumber,
    midi_streaming_interface: InterfaceNumber,
    midi_out: EndpointIn<'a, B>,
    egress: PacketQueue<EGRESS_SLOTS>,
}

impl<'a, B: UsbBus> MidiClass<'a, B> {
    pub fn new(alloc: &'a UsbBusAllocator<B>) -> Self {
        MidiClass {
            audio_control_interface: alloc.interface(),
            midi_streaming_interface: alloc.interface(),
            midi_out: alloc.bulk(64),
            egress: PacketQueue::new(),
        }
    }

    /// Room left in the egress buffer, in bytes.
    pub fn write_capacity(&self) -> usize {
        UsbMidiPacket::SIZE * (EGRESS_SLOTS - 1 - self.egress.len())
    }

    /// Queue one packet for the IN endpoint; `false` when full.
    pub fn write_packet(&mut self, packet: UsbMidiPacket) -> bool {
        self.egress.try_push(packet)
    }

    /// Push queued packets into the endpoint until it reports busy.
    pub fn flush(&mut self) {
        while let Some(packet) = self.egress.peek_front() {
            match self.midi_out.write(packet.bytes()) {
                Ok(_) => self.egress.pop_front(),
                // endpoint still busy with the previous bulk packet
                Err(_) => break,
            }
        }
    }
}

impl<B: UsbBus> UsbClass<B> for MidiClass<'_, B> {
    fn get_configuration_descriptors(&self, writer: &mut DescriptorWriter) -> Result<()> {
        // Audio control
        writer.interface(self.audio_control_interface, AUDIO_CLASS, AUDIO_CONTROL, 0)?;
        writer.write(
            CS_INTERFACE,
            &[
                AC_HEADER, // audio control header
                0x00,
                0x01, // revision (little endian)
                0x09,
                0x00,                                 // total length -- just this header
                0x01,                                 // number of streaming interfaces = 1
                self.midi_streaming_interface.into(), // interface for MIDI streaming
            ],
        )?;

        // MIDI streaming
        writer.interface(
            self.midi_streaming_interface,
            AUDIO_CLASS,
            MIDI_STREAMING,
            0,
        )?;

        let total_len = MS_HEADER_SIZE + MIDI_IN_JACK_SIZE + MIDI_OUT_JACK_SIZE;
        writer.write(
            CS_INTERFACE,
            &[
                MS_HEADER, // MIDI Header
                0x00,
                0x01, // revision (little endian)
                (total_len & 0xFF) as u8,
                ((total_len & 0xFF00) >> 8) as u8, // total length (little endian)
            ],
        )?;

        writer.write(
            CS_INTERFACE,
            &[
                MIDI_IN_JACK,
                EXTERNAL,
                EXTERNAL_IN_JACK,
                0x00, // unused
            ],
        )?;

        writer.write(
            CS_INTERFACE,
            &[
                MIDI_OUT_JACK,
                EMBEDDED,
                EMBEDDED_OUT_JACK,
                0x01,             // one input pin
                EXTERNAL_IN_JACK, // wired from the external jack
                0x01,             // source pin
                0x00,             // unused
            ],
        )?;

        writer.endpoint(&self.midi_out)?;
        writer.write(
            CS_ENDPOINT,
            &[
                MS_GENERAL, // MIDI general endpoint
                0x01,       // number of embedded jacks
                EMBEDDED_OUT_JACK,
            ],
        )?;

        Ok(())
    }
}

/// The device-facing half of the bridge: `usb-device` device plus
/// MIDI class, presented to the router as a [`DevicePort`].
pub struct UsbMidiPort<'a, B: UsbBus> {
    device: UsbDevice<'a, B>,
    class: MidiClass<'a, B>,
}

impl<'a, B: UsbBus> UsbMidiPort<'a, B> {
    pub fn new(alloc: &'a UsbBusAllocator<B>) -> Self {
        let class = MidiClass::new(alloc);
        let device = UsbDeviceBuilder::new(alloc, UsbVidPid(0x16c0, 0x27dd))
            .manufacturer("midibridge")
            .product("USB MIDI Bridge")
            .serial_number("0.1.0")
            .build();
        UsbMidiPort { device, class }
    }

    /// Build around an already-configured `UsbDevice`, e.g. one with
    /// board-specific descriptor strings.
    pub fn with_device(device: UsbDevice<'a, B>, class: MidiClass<'a, B>) -> Self {
        UsbMidiPort { device, class }
    }
}

impl<'a, B: UsbBus> DevicePort for UsbMidiPort<'a, B> {
    type Error = UsbError;

    fn is_mounted(&self) -> bool {
        self.device.state() == UsbDeviceState::Configured
    }

    fn write_capacity(&self) -> usize {
        self.class.write_capacity()
    }

    fn write_packet(&mut self, packet: UsbMidiPacket) -> core::result::Result<(), UsbError> {
        if self.class.write_packet(packet) {
            Ok(())
        } else {
            Err(UsbError::WouldBlock)
        }
    }

    fn service(&mut self) {
        self.device.poll(&mut [&mut self.class]);
        self.class.flush();
    }
}
