//! Outbound fan-out from the packet ring to the device port and sink
//!
//! A packet leaves the ring only after the device port has accepted
//! it; everything short of that defers the packet to the next tick.
//! Ingress may shed load, egress never does.

use crate::packet::UsbMidiPacket;
use crate::port::DevicePort;
use crate::queue::PacketQueue;

/// Consumer of packets that cleared the device path.
///
/// Injected at construction; called exactly once per packet, after
/// the device port accepted it and before the packet is retired from
/// the ring. The serial transport is the production implementation.
pub trait PacketSink {
    fn accept(&mut self, packet: &UsbMidiPacket);
}

/// Why a drain pass stopped before emptying the ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeferReason {
    /// The computer hasn't configured the MIDI interface; nothing can
    /// be forwarded, everything stays queued.
    NotMounted,
    /// The device-side stream stayed short of packet room across the
    /// whole retry budget.
    AwaitingCapacity,
}

/// Result of one drain pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchOutcome {
    /// The ring was already empty.
    Idle,
    /// Every queued packet was forwarded.
    Drained(usize),
    /// `sent` packets were forwarded, then the pass gave up for this
    /// tick; the head packet stays queued for retry.
    Deferred { sent: usize, reason: DeferReason },
}

#[derive(Clone, Copy, Debug)]
pub struct DispatchConfig {
    /// Device-stack service calls to spend waiting for packet room
    /// before deferring. Each retry services the stack once, so this
    /// bounds how long a tick can stall on a congested endpoint.
    pub max_capacity_retries: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        // enough service calls to flush a full 64-byte bulk endpoint
        DispatchConfig {
            max_capacity_retries: 16,
        }
    }
}

/// Drains the packet ring toward the device port, fanning accepted
/// packets out to the sink.
pub struct OutboundDispatch<S> {
    sink: S,
    config: DispatchConfig,
}

impl<S: PacketSink> OutboundDispatch<S> {
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, DispatchConfig::default())
    }

    pub fn with_config(sink: S, config: DispatchConfig) -> Self {
        OutboundDispatch { sink, config }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// One drain pass: forward packets until the ring is empty or the
    /// device path pushes back.
    pub fn drain<P: DevicePort, const N: usize>(
        &mut self,
        queue: &mut PacketQueue<N>,
        port: &mut P,
    ) -> DispatchOutcome {
        if queue.is_empty() {
            return DispatchOutcome::Idle;
        }

        let mut sent = 0;
        while let Some(packet) = queue.peek_front() {
            if !port.is_mounted() {
                return self.deferred(sent, DeferReason::NotMounted);
            }

            let mut retries = 0;
            while port.write_capacity() < UsbMidiPacket::SIZE {
                if retries == self.config.max_capacity_retries {
                    return self.deferred(sent, DeferReason::AwaitingCapacity);
                }
                // let the stack push out previously written data
                port.service();
                retries += 1;
            }

            if port.write_packet(packet).is_err() {
                // capacity said yes but the stack refused; treat it as
                // momentary backpressure and retry next tick
                warn!("device port rejected packet after capacity check");
                return self.deferred(sent, DeferReason::AwaitingCapacity);
            }

            self.sink.accept(&packet);
            queue.pop_front();
            sent += 1;
        }
        DispatchOutcome::Drained(sent)
    }

    fn deferred(&self, sent: usize, reason: DeferReason) -> DispatchOutcome {
        trace!("dispatch deferred: {}", reason);
        DispatchOutcome::Deferred { sent, reason }
    }
}

#[cfg(test)]
mod test {
    use super::{DeferReason, DispatchConfig, DispatchOutcome, OutboundDispatch, PacketSink};
    use crate::packet::UsbMidiPacket;
    use crate::port::DevicePort;
    use crate::queue::PacketQueue;

    struct FakePort {
        mounted: bool,
        capacity: usize,
        /// service calls needed before capacity recovers to 64
        ready_after: u32,
        services: u32,
        reject_writes: bool,
        writes: [[u8; 4]; 8],
        written: usize,
    }

    impl FakePort {
        fn ready() -> Self {
            FakePort {
                mounted: true,
                capacity: 64,
                ready_after: 0,
                services: 0,
                reject_writes: false,
                writes: [[0; 4]; 8],
                written: 0,
            }
        }

        fn congested(ready_after: u32) -> Self {
            FakePort {
                capacity: 0,
                ready_after,
                ..Self::ready()
            }
        }
    }

    impl DevicePort for FakePort {
        type Error = ();

        fn is_mounted(&self) -> bool {
            self.mounted
        }

        fn write_capacity(&self) -> usize {
            self.capacity
        }

        fn write_packet(&mut self, packet: UsbMidiPacket) -> Result<(), ()> {
            if self.reject_writes {
                return Err(());
            }
            self.writes[self.written] = *packet.bytes();
            self.written += 1;
            Ok(())
        }

        fn service(&mut self) {
            self.services += 1;
            if self.ready_after > 0 && self.services >= self.ready_after {
                self.capacity = 64;
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        packets: [[u8; 4]; 8],
        count: usize,
    }

    impl PacketSink for RecordingSink {
        fn accept(&mut self, packet: &UsbMidiPacket) {
            self.packets[self.count] = *packet.bytes();
            self.count += 1;
        }
    }

    fn queue_of(tags: &[u8]) -> PacketQueue<8> {
        let mut queue = PacketQueue::new();
        for &tag in tags {
            assert!(queue.try_push(UsbMidiPacket::from_bytes([0x09, 0x90, tag, 0x7F])));
        }
        queue
    }

    #[test]
    fn empty_ring_is_idle() {
        let mut queue = PacketQueue::<8>::new();
        let mut port = FakePort::ready();
        let mut dispatch = OutboundDispatch::new(RecordingSink::default());

        assert_eq!(dispatch.drain(&mut queue, &mut port), DispatchOutcome::Idle);
        assert_eq!(port.written, 0);
    }

    #[test]
    fn drains_in_order_and_fans_out() {
        let mut queue = queue_of(&[1, 2, 3]);
        let mut port = FakePort::ready();
        let mut dispatch = OutboundDispatch::new(RecordingSink::default());

        assert_eq!(
            dispatch.drain(&mut queue, &mut port),
            DispatchOutcome::Drained(3)
        );
        assert!(queue.is_empty());
        assert_eq!(port.written, 3);
        for (i, tag) in [1u8, 2, 3].iter().enumerate() {
            assert_eq!(port.writes[i], [0x09, 0x90, *tag, 0x7F]);
            assert_eq!(dispatch.sink().packets[i], [0x09, 0x90, *tag, 0x7F]);
        }
    }

    #[test]
    fn unmounted_port_defers_everything() {
        let mut queue = queue_of(&[1, 2]);
        let mut port = FakePort {
            mounted: false,
            ..FakePort::ready()
        };
        let mut dispatch = OutboundDispatch::new(RecordingSink::default());

        assert_eq!(
            dispatch.drain(&mut queue, &mut port),
            DispatchOutcome::Deferred {
                sent: 0,
                reason: DeferReason::NotMounted,
            }
        );
        assert_eq!(queue.len(), 2);
        assert_eq!(port.written, 0);
        assert_eq!(dispatch.sink().count, 0);
    }

    #[test]
    fn congestion_exhausts_retry_budget_then_defers() {
        let mut queue = queue_of(&[1]);
        let mut port = FakePort::congested(u32::MAX);
        let mut dispatch = OutboundDispatch::with_config(
            RecordingSink::default(),
            DispatchConfig {
                max_capacity_retries: 5,
            },
        );

        assert_eq!(
            dispatch.drain(&mut queue, &mut port),
            DispatchOutcome::Deferred {
                sent: 0,
                reason: DeferReason::AwaitingCapacity,
            }
        );
        // the retry budget was spent servicing the stack
        assert_eq!(port.services, 5);
        // the packet is still at the head for the next tick
        assert_eq!(queue.len(), 1);
        assert_eq!(dispatch.sink().count, 0);
    }

    #[test]
    fn recovered_capacity_delivers_exactly_once() {
        let mut queue = queue_of(&[9]);
        let mut port = FakePort::congested(3);
        let mut dispatch = OutboundDispatch::new(RecordingSink::default());

        assert_eq!(
            dispatch.drain(&mut queue, &mut port),
            DispatchOutcome::Drained(1)
        );
        assert_eq!(port.services, 3);
        assert_eq!(port.written, 1);
        assert_eq!(dispatch.sink().count, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn deferred_packet_retries_next_tick() {
        let mut queue = queue_of(&[5]);
        let mut port = FakePort::congested(u32::MAX);
        let mut dispatch = OutboundDispatch::with_config(
            RecordingSink::default(),
            DispatchConfig {
                max_capacity_retries: 2,
            },
        );

        assert!(matches!(
            dispatch.drain(&mut queue, &mut port),
            DispatchOutcome::Deferred { .. }
        ));

        // next tick the endpoint has room; the same packet goes out once
        port.capacity = 64;
        assert_eq!(
            dispatch.drain(&mut queue, &mut port),
            DispatchOutcome::Drained(1)
        );
        assert_eq!(port.written, 1);
        assert_eq!(port.writes[0], [0x09, 0x90, 5, 0x7F]);
        assert_eq!(dispatch.sink().count, 1);
    }

    #[test]
    fn sink_runs_only_after_port_success() {
        let mut queue = queue_of(&[1]);
        let mut port = FakePort {
            reject_writes: true,
            ..FakePort::ready()
        };
        let mut dispatch = OutboundDispatch::new(RecordingSink::default());

        assert_eq!(
            dispatch.drain(&mut queue, &mut port),
            DispatchOutcome::Deferred {
                sent: 0,
                reason: DeferReason::AwaitingCapacity,
            }
        );
        assert_eq!(dispatch.sink().count, 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn partial_drain_reports_sent_count() {
        let mut queue = queue_of(&[1, 2, 3]);
        let mut port = FakePort::ready();
        let mut dispatch = OutboundDispatch::with_config(
            RecordingSink::default(),
            DispatchConfig {
                max_capacity_retries: 1,
            },
        );

        // room for two packets, then the stream stays congested
        port.capacity = 8;
        struct CountingPort(FakePort);
        impl DevicePort for CountingPort {
            type Error = ();
            fn is_mounted(&self) -> bool {
                self.0.is_mounted()
            }
            fn write_capacity(&self) -> usize {
                self.0.capacity
            }
            fn write_packet(&mut self, packet: UsbMidiPacket) -> Result<(), ()> {
                self.0.capacity -= UsbMidiPacket::SIZE;
                self.0.write_packet(packet)
            }
            fn service(&mut self) {
                self.0.services += 1;
            }
        }
        let mut port = CountingPort(port);

        assert_eq!(
            dispatch.drain(&mut queue, &mut port),
            DispatchOutcome::Deferred {
                sent: 2,
                reason: DeferReason::AwaitingCapacity,
            }
        );
        assert_eq!(queue.len(), 1);
        assert_eq!(dispatch.sink().count, 2);
    }
}
