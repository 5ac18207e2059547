//! ARP protocol handler — wire codec, inbound processing, and frame
//! construction.
//!
//! Implements RFC 826 ARP for Ethernet/IPv4.  Incoming ARP frames are parsed,
//! validated, and fed to the [`ArpCache`](super::cache::ArpCache):
//!
//! - **Reply** (`oper=2`): updates the cache, which flushes any deferred
//!   datagram; a registered hook is told about replies addressed to us.
//! - **Request** (`oper=1`) for our IP: the inbound buffer is rewritten into
//!   the reply and sent straight back.
//! - **Any ARP**: opportunistically refreshes the cache; frames addressed to
//!   us may also create a new entry (their sender is about to talk to us).

use ember_lib::klog_debug;

use super::cache::ArpCache;
use super::iface::Iface;
use super::packetbuf::PacketBuf;
use super::types::{Ipv4Addr, MacAddr, NetError};
use super::{
    ARP_HEADER_LEN, ARP_HLEN_ETHERNET, ARP_HTYPE_ETHERNET, ARP_OPER_REPLY, ARP_OPER_REQUEST,
    ARP_PLEN_IPV4, ARP_PTYPE_IPV4, ETH_ADDR_LEN, ETH_HEADER_LEN, ETHERTYPE_ARP, ETHERTYPE_IPV4,
    IPV4_HEADER_LEN, ethernet,
};

// =============================================================================
// Wire codec
// =============================================================================

/// Parsed ARP-over-Ethernet header.
///
/// Only the variable fields are carried; the fixed ones (hardware type,
/// protocol type, address lengths) are validated on parse and emitted as
/// constants on write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArpHeader {
    pub opcode: u16,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Addr,
}

impl ArpHeader {
    /// Parse the 28-octet header at the start of `data`.
    ///
    /// Returns `None` for short frames or any hardware/protocol mismatch.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < ARP_HEADER_LEN {
            return None;
        }
        let htype = u16::from_be_bytes([data[0], data[1]]);
        let ptype = u16::from_be_bytes([data[2], data[3]]);
        let hlen = data[4];
        let plen = data[5];
        if htype != ARP_HTYPE_ETHERNET
            || ptype != ARP_PTYPE_IPV4
            || hlen != ARP_HLEN_ETHERNET
            || plen != ARP_PLEN_IPV4
        {
            return None;
        }
        Some(Self {
            opcode: u16::from_be_bytes([data[6], data[7]]),
            sender_mac: MacAddr([data[8], data[9], data[10], data[11], data[12], data[13]]),
            sender_ip: Ipv4Addr([data[14], data[15], data[16], data[17]]),
            target_mac: MacAddr([data[18], data[19], data[20], data[21], data[22], data[23]]),
            target_ip: Ipv4Addr([data[24], data[25], data[26], data[27]]),
        })
    }

    /// Serialize into the fixed 28-octet wire layout.
    pub fn write(&self, out: &mut [u8; ARP_HEADER_LEN]) {
        out[0..2].copy_from_slice(&ARP_HTYPE_ETHERNET.to_be_bytes());
        out[2..4].copy_from_slice(&ARP_PTYPE_IPV4.to_be_bytes());
        out[4] = ARP_HLEN_ETHERNET;
        out[5] = ARP_PLEN_IPV4;
        out[6..8].copy_from_slice(&self.opcode.to_be_bytes());
        out[8..14].copy_from_slice(&self.sender_mac.0);
        out[14..18].copy_from_slice(&self.sender_ip.0);
        out[18..24].copy_from_slice(&self.target_mac.0);
        out[24..28].copy_from_slice(&self.target_ip.0);
    }
}

// =============================================================================
// handle_rx
// =============================================================================

/// Handle an incoming ARP frame.
///
/// The packet's `head` points at the first byte of the ARP header; the
/// Ethernet header precedes it in the buffer (consumed by the ingress
/// pipeline via `pull_header`).  The buffer is owned by this call: it goes
/// back on the wire as a reply, or it is dropped on return.
pub fn handle_rx(iface: &Iface<'_>, cache: &mut ArpCache, pkt: PacketBuf) {
    let header = {
        let data = pkt.payload();
        if data.len() < ARP_HEADER_LEN {
            klog_debug!("arp: frame too short ({} < {})", data.len(), ARP_HEADER_LEN);
            return;
        }
        match ArpHeader::parse(data) {
            Some(header) => header,
            None => {
                klog_debug!("arp: malformed header");
                return;
            }
        }
    };

    let for_us = !iface.ipv4_addr.is_unspecified() && header.target_ip == iface.ipv4_addr;

    // RFC 826 learn step: frames addressed to us may create an entry (their
    // sender is about to talk to us); anything else only refreshes.
    cache.insert_or_update(iface, header.sender_ip, header.sender_mac, for_us);

    match header.opcode {
        ARP_OPER_REQUEST => {
            if for_us {
                send_reply_in_place(iface, pkt, &header);
            } else if iface.ipv4_addr.is_unspecified() {
                // No address yet — nothing to answer with.
            } else {
                klog_debug!("arp: request for {} is not for us", header.target_ip);
            }
        }
        ARP_OPER_REPLY => {
            klog_debug!("arp: reply from {} ({})", header.sender_ip, header.sender_mac);
            if for_us {
                if let Some(hook) = iface.arp_reply_hook() {
                    hook(iface, header.sender_ip);
                }
            }
        }
        oper => {
            klog_debug!("arp: unknown opcode {}", oper);
        }
    }
}

/// Rewrite an inbound request into the reply and transmit it.
///
/// The 28-octet payload is overwritten in place and the Ethernet header the
/// ingress path consumed is re-exposed with `push_header` — no second buffer
/// is allocated.
fn send_reply_in_place(iface: &Iface<'_>, mut pkt: PacketBuf, request: &ArpHeader) {
    let reply = ArpHeader {
        opcode: ARP_OPER_REPLY,
        sender_mac: iface.mac(),
        sender_ip: iface.ipv4_addr,
        target_mac: request.sender_mac,
        target_ip: request.sender_ip,
    };
    {
        let data = pkt.payload_mut();
        let Ok(body) = <&mut [u8; ARP_HEADER_LEN]>::try_from(&mut data[..ARP_HEADER_LEN]) else {
            return;
        };
        reply.write(body);
    }

    match pkt.push_header(ETH_HEADER_LEN) {
        Ok(eth) => {
            eth[..ETH_ADDR_LEN].copy_from_slice(&request.sender_mac.0);
            eth[ETH_ADDR_LEN..ETH_ADDR_LEN * 2].copy_from_slice(&iface.mac().0);
            eth[ETH_ADDR_LEN * 2..ETH_HEADER_LEN].copy_from_slice(&ETHERTYPE_ARP.to_be_bytes());
        }
        Err(_) => {
            klog_debug!("arp: reply dropped, no room for the ethernet header");
            return;
        }
    }

    klog_debug!(
        "arp: replying to {} ({})",
        request.sender_ip,
        request.sender_mac
    );
    if let Err(err) = iface.tx(pkt) {
        klog_debug!("arp: reply tx failed: {}", err);
    }
}

// =============================================================================
// snoop_rx
// =============================================================================

/// Passively learn from an inbound IPv4 frame before the IP layer sees it.
///
/// The packet's `head` points at the Ethernet header.  If the frame carries
/// IPv4 from an on-link source, the sender's binding is learned; the buffer
/// is never altered or consumed.
pub fn snoop_rx(iface: &Iface<'_>, cache: &mut ArpCache, frame: &PacketBuf) {
    if iface.ipv4_addr.is_unspecified() {
        return;
    }
    let data = frame.payload();
    if data.len() < ETH_HEADER_LEN + IPV4_HEADER_LEN {
        return;
    }
    if ethernet::ethertype(data) != Some(ETHERTYPE_IPV4) {
        return;
    }
    let ip_header = &data[ETH_HEADER_LEN..];
    if (ip_header[0] >> 4) != 4 {
        return;
    }
    let Some(src_mac) = ethernet::src_mac(data) else {
        return;
    };
    let src_ip = Ipv4Addr([ip_header[12], ip_header[13], ip_header[14], ip_header[15]]);
    if iface.is_local(src_ip) {
        cache.insert_or_update(iface, src_ip, src_mac, true);
    }
}

// =============================================================================
// Request emission
// =============================================================================

/// Broadcast an ARP request for `target_ip`.
///
/// The request buffer is allocated, transmitted, and out of our hands before
/// this returns.
pub fn send_request(iface: &Iface<'_>, target_ip: Ipv4Addr) -> Result<(), NetError> {
    let Some(mut pkt) = PacketBuf::alloc() else {
        klog_debug!("arp: request for {} dropped, pool exhausted", target_ip);
        return Err(NetError::OutOfMemory);
    };

    let eth = pkt.push_header(ETH_HEADER_LEN)?;
    eth[..ETH_ADDR_LEN].copy_from_slice(&MacAddr::BROADCAST.0);
    eth[ETH_ADDR_LEN..ETH_ADDR_LEN * 2].copy_from_slice(&iface.mac().0);
    eth[ETH_ADDR_LEN * 2..ETH_HEADER_LEN].copy_from_slice(&ETHERTYPE_ARP.to_be_bytes());

    let header = ArpHeader {
        opcode: ARP_OPER_REQUEST,
        sender_mac: iface.mac(),
        sender_ip: iface.ipv4_addr,
        target_mac: MacAddr::ZERO,
        target_ip,
    };
    let mut body = [0u8; ARP_HEADER_LEN];
    header.write(&mut body);
    pkt.append(&body)?;

    klog_debug!("arp: requesting {}", target_ip);
    iface.tx(pkt)
}

/// Gratuitous ARP: announce our own binding, or probe for a conflict after an
/// address change.  The request goes out with sender and target both set to
/// the local address.
pub fn announce(iface: &Iface<'_>, cache: &mut ArpCache) -> Result<(), NetError> {
    cache.query(iface, iface.ipv4_addr, None)
}
