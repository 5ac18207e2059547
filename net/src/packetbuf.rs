//! Pool-backed packet buffer with header push/pull.
//!
//! `PacketBuf` is the single currency exchanged between the resolver, the IP
//! layer, and link devices.  It is **move-only** — it deliberately does not
//! implement `Clone` — so a frame has exactly one owner at any time: handing
//! a buffer to a device, or parking it on a pending cache entry, is a move.
//! Dropping a buffer returns its slot to the global
//! [`PACKET_POOL`](super::pool::PACKET_POOL).
//!
//! # Layout
//!
//! ```text
//! |<-- headroom -->|<-- payload (head..tail) -->|<-- tailroom -->|
//! 0            head                          tail           capacity
//! ```
//!
//! * TX path: [`alloc`](PacketBuf::alloc) starts with `head = tail =
//!   HEADROOM`.  Headers are prepended via [`push_header`](PacketBuf::push_header);
//!   payload is appended via [`append`](PacketBuf::append).
//! * RX path: [`from_raw_copy`](PacketBuf::from_raw_copy) starts with
//!   `head = 0`, `tail = data.len()`.  Headers are consumed via
//!   [`pull_header`](PacketBuf::pull_header) — and can be re-exposed later by
//!   pushing the same length back, which is how an ARP request is turned into
//!   a reply in place.

use core::fmt;

use super::pool::{BUF_SIZE, PACKET_POOL};
use super::types::NetError;

/// Reserved headroom in each pooled TX buffer (bytes).
///
/// The deepest prepend this stack performs is the 14-byte Ethernet header;
/// the rest is spare for future layers.
pub const HEADROOM: u16 = 64;

/// A network packet buffer backed by one pool slot.
///
/// See [module documentation](self) for layout and ownership semantics.
pub struct PacketBuf {
    slot: u16,
    /// Start of the active data region within the backing slot.
    head: u16,
    /// End of the active data region (exclusive).
    tail: u16,
}

impl Drop for PacketBuf {
    fn drop(&mut self) {
        PACKET_POOL.release(self.slot);
    }
}

// -- Debug: metadata only, never dump raw buffer contents ---------------------

impl fmt::Debug for PacketBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PacketBuf {{ slot={}, head={}, tail={}, len={} }}",
            self.slot,
            self.head,
            self.tail,
            self.len()
        )
    }
}

// =============================================================================
// Constructors
// =============================================================================

impl PacketBuf {
    /// Allocate an empty buffer from the global pool with [`HEADROOM`]
    /// reserved.
    ///
    /// Used by the **TX path** to build outgoing frames.  Returns `None` if
    /// the pool is exhausted.
    pub fn alloc() -> Option<Self> {
        let slot = PACKET_POOL.alloc()?;
        Some(Self {
            slot,
            head: HEADROOM,
            tail: HEADROOM,
        })
    }

    /// Allocate a buffer and copy raw frame data into it.
    ///
    /// Used by the **RX path** when copying out of a DMA ring.  The data
    /// starts at offset 0 so positions match raw wire offsets.
    ///
    /// Returns `None` if the pool is exhausted or `data.len() > BUF_SIZE`.
    pub fn from_raw_copy(data: &[u8]) -> Option<Self> {
        if data.len() > BUF_SIZE {
            return None;
        }
        let slot = PACKET_POOL.alloc()?;
        // SAFETY: the slot was just allocated; we are its only owner.
        unsafe {
            core::ptr::copy_nonoverlapping(data.as_ptr(), PACKET_POOL.slot_data(slot), data.len());
        }
        Some(Self {
            slot,
            head: 0,
            tail: data.len() as u16,
        })
    }
}

// =============================================================================
// Internal buffer access
// =============================================================================

impl PacketBuf {
    /// Shared reference to the entire backing slot.
    #[inline]
    fn data(&self) -> &[u8] {
        // SAFETY: we own this slot — exclusive access guaranteed by move-only
        // semantics (no Clone).
        unsafe { core::slice::from_raw_parts(PACKET_POOL.slot_data(self.slot), BUF_SIZE) }
    }

    /// Mutable reference to the entire backing slot.
    #[inline]
    fn data_mut(&mut self) -> &mut [u8] {
        // SAFETY: we own this slot and hold `&mut self` — exclusive access.
        unsafe { core::slice::from_raw_parts_mut(PACKET_POOL.slot_data(self.slot), BUF_SIZE) }
    }
}

// =============================================================================
// Header push/pull and payload access
// =============================================================================

impl PacketBuf {
    /// Number of active payload bytes (`tail - head`).
    #[inline]
    pub fn len(&self) -> usize {
        (self.tail - self.head) as usize
    }

    /// `true` if the active region is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Active data region `data[head..tail]`.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.data()[self.head as usize..self.tail as usize]
    }

    /// Mutable active data region `data[head..tail]`.
    #[inline]
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let h = self.head as usize;
        let t = self.tail as usize;
        &mut self.data_mut()[h..t]
    }

    /// Prepend `len` bytes of header space by extending `head` backward into
    /// the headroom.
    ///
    /// Returns a mutable slice over the newly exposed bytes (caller fills in
    /// the header).  Fails with [`NoBufferSpace`](NetError::NoBufferSpace)
    /// when the headroom is insufficient.
    pub fn push_header(&mut self, len: usize) -> Result<&mut [u8], NetError> {
        let len16 = len as u16;
        if self.head < len16 {
            return Err(NetError::NoBufferSpace);
        }
        self.head -= len16;
        let h = self.head as usize;
        Ok(&mut self.data_mut()[h..h + len])
    }

    /// Consume `len` bytes from the front of the active region.
    ///
    /// Returns a shared slice over the consumed bytes.  Fails with
    /// [`InvalidArgument`](NetError::InvalidArgument) if `len > self.len()`.
    pub fn pull_header(&mut self, len: usize) -> Result<&[u8], NetError> {
        if len > self.len() {
            return Err(NetError::InvalidArgument);
        }
        let old_head = self.head as usize;
        self.head += len as u16;
        Ok(&self.data()[old_head..old_head + len])
    }

    /// Append `src` bytes at the tail end of the active region.
    ///
    /// Fails with [`NoBufferSpace`](NetError::NoBufferSpace) if the remaining
    /// tailroom cannot hold `src`.
    pub fn append(&mut self, src: &[u8]) -> Result<(), NetError> {
        let new_tail = self.tail as usize + src.len();
        if new_tail > BUF_SIZE {
            return Err(NetError::NoBufferSpace);
        }
        let t = self.tail as usize;
        self.data_mut()[t..new_tail].copy_from_slice(src);
        self.tail = new_tail as u16;
        Ok(())
    }
}
