//! Inbound packet capture
//!
//! Runs once per completed host receive transfer, between the
//! completion and the resubmission, so it must not block.

use crate::packet::UsbMidiPacket;
use crate::queue::PacketQueue;

/// Scan a completed receive transfer and enqueue its packets.
///
/// The buffer is walked in exact 4-byte strides; a trailing partial
/// stride is ignored. Strides whose CIN nibble is zero are idle
/// filler from the host controller and are skipped. When the ring is
/// full the packet is dropped on the floor: there is no flow-control
/// channel back to the controller, so sustained overload sheds input
/// rather than stalling the host poll path.
///
/// Returns the number of packets enqueued.
pub fn capture_packets<const N: usize>(bytes: &[u8], queue: &mut PacketQueue<N>) -> usize {
    let mut captured = 0;
    for stride in bytes.chunks_exact(UsbMidiPacket::SIZE) {
        if stride[0] & 0x0F == 0 {
            continue;
        }
        let packet = UsbMidiPacket::from_bytes([stride[0], stride[1], stride[2], stride[3]]);
        if queue.try_push(packet) {
            captured += 1;
        }
    }
    captured
}
