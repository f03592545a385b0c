//! Narrow interfaces to the USB host and device stacks
//!
//! The bridge never talks to a controller driver directly. The host
//! stack (enumeration, descriptor parsing, transfer plumbing) sits
//! behind [`HostPort`]; the device stack (endpoint FIFOs, class
//! descriptors) behind [`DevicePort`]. Both are serviced from the
//! scheduler's single thread, so neither trait needs to be `Sync`.

use crate::packet::UsbMidiPacket;
use core::fmt::Debug;

/// Completion status of a host-side receive transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferStatus {
    Success,
    Failed,
}

/// Work surfaced by one host-stack servicing pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostEvent {
    /// An upstream MIDI controller finished enumerating and its IN
    /// endpoint is open. The bridge reacts by submitting the first
    /// receive transfer.
    Attached,
    /// The outstanding receive transfer finished. `len` is the actual
    /// byte count; the data is at [`HostPort::rx_bytes`]. Only scanned
    /// when `status` is [`TransferStatus::Success`], since a failed
    /// transfer leaves stale bytes in the buffer.
    RxComplete { status: TransferStatus, len: usize },
}

/// The USB host controller stack, as seen from the router.
pub trait HostPort {
    type Error: Debug;

    /// Drive pending host-stack work. Returns at most one event per
    /// call; the scheduler calls it until `None` to drain a tick.
    fn service(&mut self) -> Option<HostEvent>;

    /// Receive buffer of the most recently completed transfer.
    fn rx_bytes(&self) -> &[u8];

    /// (Re)submit the inbound receive transfer on the opened endpoint.
    ///
    /// Must happen after every [`HostEvent::RxComplete`], success or
    /// failure; a missed resubmission stalls all future inbound MIDI.
    fn submit_rx(&mut self) -> Result<(), Self::Error>;
}

/// The USB device-side MIDI interface, as seen from the router.
///
/// Exactly the surface the dispatch loop needs: a mount check, a
/// capacity query, a 4-byte stream write, and a hook to let the stack
/// run so previously written data drains out.
pub trait DevicePort {
    type Error: Debug;

    /// Whether the downstream computer has configured the interface.
    fn is_mounted(&self) -> bool;

    /// Bytes the outbound MIDI stream can accept right now.
    fn write_capacity(&self) -> usize;

    /// Write one packet. Callers gate on `write_capacity() >= 4`.
    fn write_packet(&mut self, packet: UsbMidiPacket) -> Result<(), Self::Error>;

    /// Run the device stack's pending work.
    fn service(&mut self);
}
