//! Pre-allocated packet buffer pool with lock-free allocation.
//!
//! Fixed backing storage in BSS, carved into [`POOL_SIZE`] slots of
//! [`BUF_SIZE`] bytes each.  A single interface with a bounded resolver
//! table needs few buffers in flight, so the free set is kept as **one
//! atomic word** — one bit per slot, set meaning free.  Allocation clears
//! the lowest set bit with a CAS; release is a single `fetch_or`.  There is
//! no per-slot chain to corrupt and no ABA hazard: the map is plain state,
//! not a linked structure, and a double release shows up as an
//! already-set bit.
//!
//! A fixed pool keeps the resolver's failure mode honest: when the map runs
//! out of bits, `alloc()` returns `None` and callers surface `OutOfMemory`
//! instead of fragmenting a heap the target may not even have.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Size of each packet buffer slot in bytes.
///
/// Covers a maximum Ethernet frame (1518) plus [`HEADROOM`] with room to
/// spare.
///
/// [`HEADROOM`]: super::packetbuf::HEADROOM
pub const BUF_SIZE: usize = 1600;

/// Number of pre-allocated buffer slots.
///
/// Bounded by the bits of the free map — the shift below refuses to
/// compile for anything past 64.
pub const POOL_SIZE: usize = 64;

/// Free-map value with one set bit per slot.
const FULL_MAP: u64 = u64::MAX >> (64 - POOL_SIZE);

// =============================================================================
// Static backing storage
// =============================================================================

/// Raw buffer storage — [`POOL_SIZE`] slots of [`BUF_SIZE`] bytes, 64-byte
/// aligned.
///
/// Interior mutability via `UnsafeCell` is sound because the allocation
/// discipline guarantees that each slot is owned by at most one
/// [`PacketBuf`](super::packetbuf::PacketBuf) at any time.
#[repr(C, align(64))]
struct PoolStorage {
    slots: UnsafeCell<[[u8; BUF_SIZE]; POOL_SIZE]>,
}

// SAFETY: Slot access is serialized by the pool ownership model.  A slot is
// accessed exclusively by its owning PacketBuf (move-only, no Clone).
unsafe impl Sync for PoolStorage {}

static POOL_STORAGE: PoolStorage = PoolStorage {
    slots: UnsafeCell::new([[0u8; BUF_SIZE]; POOL_SIZE]),
};

// =============================================================================
// PacketPool
// =============================================================================

/// Lock-free packet buffer pool over a one-word free map.
pub struct PacketPool {
    /// One bit per slot; set = free.  All zeros until [`init`](Self::init).
    free_map: AtomicU64,
    /// Guards against a second `init` handing out slots twice.
    initialized: AtomicBool,
}

/// The global packet pool singleton.
///
/// Call [`PacketPool::init`] once before any stack code allocates.
pub static PACKET_POOL: PacketPool = PacketPool {
    free_map: AtomicU64::new(0),
    initialized: AtomicBool::new(false),
};

impl PacketPool {
    /// Mark every slot free.
    ///
    /// Must run before the first allocation; subsequent calls are harmless
    /// no-ops.
    pub fn init(&self) {
        if self.initialized.swap(true, Ordering::AcqRel) {
            return;
        }
        self.free_map.store(FULL_MAP, Ordering::Release);
    }

    /// Allocate a buffer slot.
    ///
    /// Claims the lowest free bit.  Returns `None` if the pool is exhausted
    /// (or not yet initialized).
    pub fn alloc(&self) -> Option<u16> {
        loop {
            let map = self.free_map.load(Ordering::Acquire);
            if map == 0 {
                return None;
            }
            let slot = map.trailing_zeros() as u16;
            let claimed = map & !(1u64 << slot);
            if self
                .free_map
                .compare_exchange_weak(map, claimed, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return Some(slot);
            }
            core::hint::spin_loop();
        }
    }

    /// Return a buffer slot to the pool.
    ///
    /// Called by [`PacketBuf::drop`](super::packetbuf::PacketBuf).  The slot
    /// must have been previously allocated from this pool, and the caller
    /// must not access its data afterwards.
    pub fn release(&self, slot: u16) {
        debug_assert!(
            (slot as usize) < POOL_SIZE,
            "release: slot index {} out of bounds",
            slot
        );
        let bit = 1u64 << slot;
        let before = self.free_map.fetch_or(bit, Ordering::AcqRel);
        debug_assert!(before & bit == 0, "release: slot {} was already free", slot);
    }

    /// Number of free buffer slots (diagnostic).
    #[inline]
    pub fn available(&self) -> usize {
        self.free_map.load(Ordering::Relaxed).count_ones() as usize
    }

    /// Whether the pool has been initialized.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Raw pointer to the first byte of slot `slot`.
    ///
    /// The returned pointer is valid for [`BUF_SIZE`] bytes.  The caller must
    /// own the slot and ensure no aliasing mutable references exist before
    /// dereferencing.
    #[inline]
    pub(crate) fn slot_data(&self, slot: u16) -> *mut u8 {
        debug_assert!((slot as usize) < POOL_SIZE);
        // SAFETY: UnsafeCell grants interior mutability.  The offset stays
        // in-bounds because slot < POOL_SIZE and each slot is BUF_SIZE bytes.
        unsafe { (POOL_STORAGE.slots.get() as *mut u8).add(slot as usize * BUF_SIZE) }
    }
}
