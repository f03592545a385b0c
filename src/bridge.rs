//! The cooperative scheduler tying the ports to the router
//!
//! One `MidiBridge` instance owns the whole routing context: the
//! packet ring, the dispatcher, and both port handles. Nothing lives
//! in statics, so independent bridges can coexist and tests can spin
//! one up around mock ports.

use crate::capture::capture_packets;
use crate::dispatch::{DispatchConfig, DispatchOutcome, OutboundDispatch, PacketSink};
use crate::port::{DevicePort, HostEvent, HostPort, TransferStatus};
use crate::queue::PacketQueue;

/// Ring slots used by firmware builds (63 usable packets).
pub const DEFAULT_QUEUE_SLOTS: usize = 64;

pub struct MidiBridge<H, D, S, const N: usize = DEFAULT_QUEUE_SLOTS> {
    host: H,
    device: D,
    dispatch: OutboundDispatch<S>,
    queue: PacketQueue<N>,
}

impl<H, D, S, const N: usize> MidiBridge<H, D, S, N>
where
    H: HostPort,
    D: DevicePort,
    S: PacketSink,
{
    pub fn new(host: H, device: D, sink: S) -> Self {
        Self::with_config(host, device, sink, DispatchConfig::default())
    }

    pub fn with_config(host: H, device: D, sink: S, config: DispatchConfig) -> Self {
        MidiBridge {
            host,
            device,
            dispatch: OutboundDispatch::with_config(sink, config),
            queue: PacketQueue::new(),
        }
    }

    /// One scheduler tick: drain host events (feeding inbound
    /// capture), service the device stack, then run dispatch once.
    pub fn poll(&mut self) -> DispatchOutcome {
        while let Some(event) = self.host.service() {
            match event {
                HostEvent::Attached => {
                    // begin streaming as soon as the controller's IN
                    // endpoint is open
                    if self.host.submit_rx().is_err() {
                        warn!("initial receive submission failed");
                    }
                }
                HostEvent::RxComplete { status, len } => {
                    if status == TransferStatus::Success {
                        let bytes = self.host.rx_bytes();
                        let len = len.min(bytes.len());
                        capture_packets(&bytes[..len], &mut self.queue);
                    }
                    // resubmit even after a failed transfer; failures
                    // are transient and polling must not gap
                    if self.host.submit_rx().is_err() {
                        warn!("receive resubmission failed");
                    }
                }
            }
        }
        self.device.service();
        self.dispatch.drain(&mut self.queue, &mut self.device)
    }

    /// Run the bridge forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.poll();
        }
    }

    /// Packets captured but not yet forwarded.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// The outbound sink, e.g. to push raw bytes at the serial output.
    pub fn sink_mut(&mut self) -> &mut S {
        self.dispatch.sink_mut()
    }
}
