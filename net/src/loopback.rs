//! Loopback link device.
//!
//! Implements [`LinkDevice`] with a small internal ring: `tx()` parks frames,
//! [`pop_frame`](Loopback::pop_frame) hands them back out in FIFO order for
//! local delivery.  No wire, no driver.  Doubles as the capture device for
//! the in-tree test suites, which inspect exactly what the resolver put on
//! the "wire".
//!
//! The ring is behind a `spin::Mutex` because `tx()` takes `&self` — the
//! device seam mandates interior mutability.

use spin::Mutex;

use super::netdev::{LinkDevice, LinkFeatures, LinkStats};
use super::packetbuf::PacketBuf;
use super::types::{MacAddr, NetError};

/// Number of frames the loopback ring can park.
const LOOPBACK_RING: usize = 8;

struct LoopbackInner {
    /// Parked frames, oldest at `head`.
    frames: [Option<PacketBuf>; LOOPBACK_RING],
    head: usize,
    len: usize,
    /// Cumulative statistics.
    stats: LinkStats,
}

/// Loopback link device with a FIFO frame ring.
pub struct Loopback {
    mac: MacAddr,
    inner: Mutex<LoopbackInner>,
}

impl Loopback {
    /// Create a loopback device with an empty ring.
    pub const fn new(mac: MacAddr) -> Self {
        Self {
            mac,
            inner: Mutex::new(LoopbackInner {
                frames: [const { None }; LOOPBACK_RING],
                head: 0,
                len: 0,
                stats: LinkStats::new(),
            }),
        }
    }

    /// Take the oldest parked frame, if any.
    pub fn pop_frame(&self) -> Option<PacketBuf> {
        let mut inner = self.inner.lock();
        if inner.len == 0 {
            return None;
        }
        let slot = inner.head;
        let frame = inner.frames[slot].take();
        inner.head = (inner.head + 1) % LOOPBACK_RING;
        inner.len -= 1;
        if let Some(frame) = &frame {
            inner.stats.rx_packets += 1;
            inner.stats.rx_bytes += frame.len() as u64;
        }
        frame
    }

    /// Number of frames currently parked.
    pub fn pending(&self) -> usize {
        self.inner.lock().len
    }
}

impl LinkDevice for Loopback {
    fn tx(&self, frame: PacketBuf) -> Result<(), NetError> {
        let mut inner = self.inner.lock();
        if inner.len == LOOPBACK_RING {
            return Err(NetError::NoBufferSpace);
        }
        let slot = (inner.head + inner.len) % LOOPBACK_RING;
        inner.stats.tx_packets += 1;
        inner.stats.tx_bytes += frame.len() as u64;
        inner.frames[slot] = Some(frame);
        inner.len += 1;
        Ok(())
    }

    fn mac(&self) -> MacAddr {
        self.mac
    }

    fn mtu(&self) -> u16 {
        65535
    }

    fn features(&self) -> LinkFeatures {
        LinkFeatures::LOOPBACK | LinkFeatures::BROADCAST | LinkFeatures::MULTICAST
    }

    fn stats(&self) -> LinkStats {
        self.inner.lock().stats
    }
}
