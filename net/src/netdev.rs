//! Link device seam: the boundary between drivers (which move bytes) and the
//! stack (which understands protocols).
//!
//! Only [`PacketBuf`] crosses this boundary.  Every method takes `&self`;
//! implementations use interior mutability for their own state so the
//! single-threaded stack can hold a plain shared reference to the device for
//! the interface's whole lifetime.

use core::fmt;

use bitflags::bitflags;

use super::packetbuf::PacketBuf;
use super::types::{MacAddr, NetError};

// =============================================================================
// LinkDevice trait
// =============================================================================

/// Abstraction for a link-layer device (NIC, loopback, test harness, …).
///
/// `tx()` consumes the frame: on `Ok` the buffer now belongs to the driver
/// (typically moved into a TX ring); on `Err` it was dropped and its pool
/// slot reclaimed.  `tx()` must not call back into the stack.
pub trait LinkDevice {
    /// Enqueue one fully-formed Ethernet frame for transmission.
    ///
    /// Returns `Err(NoBufferSpace)` if the device queue is full.
    fn tx(&self, frame: PacketBuf) -> Result<(), NetError>;

    /// Hardware MAC address.
    fn mac(&self) -> MacAddr;

    /// Maximum transmission unit (payload bytes, excluding Ethernet header).
    fn mtu(&self) -> u16;

    /// Capability flags advertised by the driver.
    fn features(&self) -> LinkFeatures;

    /// Read-only snapshot of device statistics.
    fn stats(&self) -> LinkStats;
}

// =============================================================================
// LinkStats
// =============================================================================

/// Read-only snapshot of link device statistics.
///
/// Counters are monotonically increasing; the driver updates them on its
/// data path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Total frames received successfully.
    pub rx_packets: u64,
    /// Total frames transmitted successfully.
    pub tx_packets: u64,
    /// Total bytes received.
    pub rx_bytes: u64,
    /// Total bytes transmitted.
    pub tx_bytes: u64,
}

impl LinkStats {
    /// Create a zeroed stats snapshot.
    pub const fn new() -> Self {
        Self {
            rx_packets: 0,
            tx_packets: 0,
            rx_bytes: 0,
            tx_bytes: 0,
        }
    }
}

impl fmt::Display for LinkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rx: {} pkts/{} bytes, tx: {} pkts/{} bytes",
            self.rx_packets, self.rx_bytes, self.tx_packets, self.tx_bytes
        )
    }
}

// =============================================================================
// LinkFeatures
// =============================================================================

bitflags! {
    /// Capability flags advertised by a link device.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct LinkFeatures: u32 {
        /// Device can deliver link-level broadcast frames.
        const BROADCAST = 1 << 0;
        /// Device can deliver link-level multicast frames.
        const MULTICAST = 1 << 1;
        /// Transmitted frames come straight back — no wire attached.
        const LOOPBACK  = 1 << 2;
    }
}

impl Default for LinkFeatures {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for LinkFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(none)");
        }
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                write!(f, " | ")?;
            }
            write!(f, "{name}")?;
            first = false;
        }
        Ok(())
    }
}
