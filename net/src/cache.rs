//! ARP cache: a bounded table of address bindings with a per-slot lifecycle.
//!
//! Each of the [`ARP_TABLE_SIZE`] slots walks `Empty → Pending → Stable →
//! Empty`.  A `Pending` slot is an in-flight resolution: the request has gone
//! out broadcast and at most one deferred datagram waits on the answer.  A
//! `Stable` slot is immediately usable for transmission and is refreshed by
//! every frame heard from its owner.
//!
//! The cache is a plain owned value — one per interface, no global, no lock.
//! Every operation takes `&mut self` and runs to completion; the host stack's
//! serialized event pump is the only concurrency model supported.
//!
//! # Aging
//!
//! The embedder calls [`tick`](ArpCache::tick) roughly every 10 seconds.
//! `Stable` entries survive [`ARP_MAXAGE`] ticks, `Pending` entries only
//! [`ARP_MAXPENDING`]; an over-age entry is recycled within the same call,
//! dropping any datagram still parked on it.

use core::fmt;

use ember_lib::klog_debug;

use super::iface::Iface;
use super::packetbuf::PacketBuf;
use super::types::{Ipv4Addr, MacAddr, NetError};
use super::{ARP_MAXAGE, ARP_MAXPENDING, ARP_TABLE_SIZE, ETHERTYPE_IPV4, arp, ethernet};

// =============================================================================
// ArpEntry
// =============================================================================

/// One cache slot.
///
/// The variant data carries everything the state needs and nothing more: an
/// `Empty` slot holds neither address nor datagram, and only `Pending` can
/// park one.
pub enum ArpEntry {
    /// Unused slot.
    Empty,
    /// Request sent, reply awaited.  `queued` holds the at-most-one datagram
    /// deferred until the binding resolves.
    Pending {
        ip: Ipv4Addr,
        age: u8,
        queued: Option<PacketBuf>,
    },
    /// Binding known and usable for immediate transmission.
    Stable { ip: Ipv4Addr, mac: MacAddr, age: u8 },
}

impl fmt::Debug for ArpEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Pending { ip, age, queued } => {
                write!(f, "Pending({}, age={}, queued={})", ip, age, queued.is_some())
            }
            Self::Stable { ip, mac, age } => write!(f, "Stable({} -> {}, age={})", ip, mac, age),
        }
    }
}

// =============================================================================
// ArpCache
// =============================================================================

/// Bounded ARP cache for a single interface.
///
/// See [module documentation](self) for the lifecycle and concurrency model.
pub struct ArpCache {
    entries: [ArpEntry; ARP_TABLE_SIZE],
}

impl ArpCache {
    /// Create a cache with every slot empty.
    pub const fn new() -> Self {
        Self {
            entries: [const { ArpEntry::Empty }; ARP_TABLE_SIZE],
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// MAC bound to `ip`, if the entry is stable.
    ///
    /// Pending entries answer `None` — their binding is not usable yet.
    pub fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        self.entries.iter().find_map(|entry| match entry {
            ArpEntry::Stable {
                ip: bound_ip, mac, ..
            } if *bound_ip == ip => Some(*mac),
            _ => None,
        })
    }

    /// `true` if a resolution for `ip` is in flight.
    pub fn is_pending(&self, ip: Ipv4Addr) -> bool {
        self.entries.iter().any(
            |entry| matches!(entry, ArpEntry::Pending { ip: pending_ip, .. } if *pending_ip == ip),
        )
    }

    /// `true` if a datagram is parked on the pending entry for `ip`.
    pub fn has_queued(&self, ip: Ipv4Addr) -> bool {
        self.entries.iter().any(|entry| {
            matches!(
                entry,
                ArpEntry::Pending { ip: pending_ip, queued: Some(_), .. } if *pending_ip == ip
            )
        })
    }

    /// Stable binding stored in slot `slot`, if any (table introspection for
    /// diagnostics and `ifconfig`-style tooling).
    pub fn entry(&self, slot: usize) -> Option<(Ipv4Addr, MacAddr)> {
        match self.entries.get(slot) {
            Some(ArpEntry::Stable { ip, mac, .. }) => Some((*ip, *mac)),
            _ => None,
        }
    }

    /// Number of non-empty slots.
    pub fn occupied(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !matches!(entry, ArpEntry::Empty))
            .count()
    }

    /// Dump all slots for debugging.
    pub fn dump(&self) {
        for (slot, entry) in self.entries.iter().enumerate() {
            klog_debug!("  [{}] {:?}", slot, entry);
        }
    }

    // =========================================================================
    // Learn path
    // =========================================================================

    /// Learn (or refresh) the binding `ip -> mac`.
    ///
    /// - A matching `Pending` entry turns `Stable` and its deferred datagram,
    ///   if any, is transmitted before this returns: destination filled in
    ///   from the fresh binding, source and ethertype from the interface.
    /// - A matching `Stable` entry has its MAC overwritten and age reset.
    /// - With no match and `allow_insert`, a slot is claimed via
    ///   [`find_slot`](Self::find_slot) — silently giving up when every slot
    ///   is in flight.  Without `allow_insert` this is a pure snoop and never
    ///   creates entries.
    ///
    /// `0.0.0.0` is never learned.
    pub fn insert_or_update(
        &mut self,
        iface: &Iface<'_>,
        ip: Ipv4Addr,
        mac: MacAddr,
        allow_insert: bool,
    ) {
        if ip.is_unspecified() {
            return;
        }

        for entry in self.entries.iter_mut() {
            match entry {
                ArpEntry::Pending {
                    ip: pending_ip,
                    queued,
                    ..
                } if *pending_ip == ip => {
                    let deferred = queued.take();
                    *entry = ArpEntry::Stable { ip, mac, age: 0 };
                    klog_debug!("arpcache: {} resolved to {}", ip, mac);
                    if let Some(mut frame) = deferred {
                        ethernet::fill_header(frame.payload_mut(), mac, iface.mac(), ETHERTYPE_IPV4);
                        if let Err(err) = iface.tx(frame) {
                            klog_debug!("arpcache: deferred tx for {} failed: {}", ip, err);
                        }
                    }
                    return;
                }
                ArpEntry::Stable {
                    ip: bound_ip,
                    mac: bound_mac,
                    age,
                } if *bound_ip == ip => {
                    *bound_mac = mac;
                    *age = 0;
                    return;
                }
                _ => {}
            }
        }

        if !allow_insert {
            return;
        }
        let Some(slot) = self.find_slot() else {
            klog_debug!("arpcache: table full, cannot learn {}", ip);
            return;
        };
        self.entries[slot] = ArpEntry::Stable { ip, mac, age: 0 };
        klog_debug!("arpcache: learned {} -> {}", ip, mac);
    }

    // =========================================================================
    // Aging
    // =========================================================================

    /// Age every slot by one tick and recycle the ones past their limit.
    ///
    /// Recycling a pending entry drops its parked datagram — the original
    /// sender returned long ago and is not told.
    pub fn tick(&mut self) {
        for entry in self.entries.iter_mut() {
            let expired = match entry {
                ArpEntry::Empty => false,
                ArpEntry::Pending { ip, age, .. } => {
                    *age = age.saturating_add(1);
                    if *age >= ARP_MAXPENDING {
                        klog_debug!("arpcache: request for {} went unanswered", ip);
                        true
                    } else {
                        false
                    }
                }
                ArpEntry::Stable { ip, age, .. } => {
                    *age = age.saturating_add(1);
                    if *age >= ARP_MAXAGE {
                        klog_debug!("arpcache: {} aged out", ip);
                        true
                    } else {
                        false
                    }
                }
            };
            if expired {
                // Dropping the slot releases any queued frame to the pool.
                *entry = ArpEntry::Empty;
            }
        }
    }

    // =========================================================================
    // Query
    // =========================================================================

    /// Solicit `target_ip` and attach or transmit `datagram`.
    ///
    /// Order is fixed: the request goes out first (so its buffer is built and
    /// handed off before the cache mutates), then the entry is located or
    /// created, then the datagram handled:
    ///
    /// - stable entry: header filled from the binding, transmitted now;
    /// - pending entry: datagram parked (a previous occupant is dropped —
    ///   newest wins);
    /// - no entry creatable: `OutOfMemory`.
    ///
    /// A request-buffer allocation failure is recorded in the result but does
    /// not stop entry creation.
    pub fn query(
        &mut self,
        iface: &Iface<'_>,
        target_ip: Ipv4Addr,
        datagram: Option<PacketBuf>,
    ) -> Result<(), NetError> {
        if target_ip.is_unspecified() {
            return Err(NetError::InvalidArgument);
        }

        let mut result = arp::send_request(iface, target_ip);

        let slot = match self.index_of(target_ip) {
            Some(slot) => slot,
            None => {
                let Some(slot) = self.find_slot() else {
                    klog_debug!("arpcache: no slot free for {}", target_ip);
                    return Err(NetError::OutOfMemory);
                };
                self.entries[slot] = ArpEntry::Pending {
                    ip: target_ip,
                    age: 0,
                    queued: None,
                };
                slot
            }
        };

        let Some(frame) = datagram else {
            return result;
        };
        match &mut self.entries[slot] {
            ArpEntry::Stable { mac, .. } => {
                let mac = *mac;
                let mut frame = frame;
                ethernet::fill_header(frame.payload_mut(), mac, iface.mac(), ETHERTYPE_IPV4);
                result = iface.tx(frame);
            }
            ArpEntry::Pending { queued, .. } => {
                if queued.is_some() {
                    klog_debug!("arpcache: replacing queued datagram for {}", target_ip);
                }
                *queued = Some(frame);
            }
            // The slot was matched or freshly created above.
            ArpEntry::Empty => {}
        }
        result
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    /// Slot holding `ip` in any non-empty state.
    fn index_of(&self, ip: Ipv4Addr) -> Option<usize> {
        self.entries.iter().position(|entry| match entry {
            ArpEntry::Pending { ip: entry_ip, .. } | ArpEntry::Stable { ip: entry_ip, .. } => {
                *entry_ip == ip
            }
            ArpEntry::Empty => false,
        })
    }

    /// Claim a slot for a new entry: the first empty one, else the oldest
    /// stable one (reset before return).  Pending slots are in-flight state
    /// and never evicted; if every slot is pending there is no room.
    fn find_slot(&mut self) -> Option<usize> {
        let mut victim: Option<(usize, u8)> = None;
        for (slot, entry) in self.entries.iter().enumerate() {
            match entry {
                ArpEntry::Empty => return Some(slot),
                ArpEntry::Stable { age, .. } => {
                    let older = match victim {
                        Some((_, oldest)) => *age > oldest,
                        None => true,
                    };
                    if older {
                        victim = Some((slot, *age));
                    }
                }
                ArpEntry::Pending { .. } => {}
            }
        }
        let (slot, _) = victim?;
        if let ArpEntry::Stable { ip, .. } = &self.entries[slot] {
            klog_debug!("arpcache: recycling {} for a new entry", ip);
        }
        self.entries[slot] = ArpEntry::Empty;
        Some(slot)
    }
}
