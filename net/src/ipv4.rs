//! IPv4 outbound dispatcher.
//!
//! [`send`] is the egress entry point the IP layer calls with a finished
//! datagram.  It reserves the Ethernet header, picks the destination MAC —
//! broadcast, synthesized multicast, or unicast through the ARP cache — and
//! hands the frame to the interface's device.
//!
//! Buffer ownership through this path: on success the frame has moved to the
//! driver or is parked in the cache; on an error this module created, the
//! frame has already been dropped and its pool slot reclaimed.

use ember_lib::klog_debug;

use super::cache::ArpCache;
use super::iface::Iface;
use super::packetbuf::PacketBuf;
use super::types::{Ipv4Addr, MacAddr, NetError};
use super::{ETH_HEADER_LEN, ETHERTYPE_IPV4, ethernet};

/// Send an IPv4 datagram to `dst_ip` through `iface`.
///
/// The packet's `head` points at the IP header; this call grows it by the
/// Ethernet header.
///
/// Destination selection:
/// 1. Unspecified, limited-broadcast, or our subnet-directed broadcast
///    address → `ff:ff:ff:ff:ff:ff`, transmitted immediately.
/// 2. `224.0.0.0/4` → the mapped Ethernet group address, transmitted
///    immediately.
/// 3. Anything else is unicast: off-link destinations are re-keyed to the
///    gateway (`NetworkUnreachable` if none is configured), then resolved via
///    the cache — a stable binding transmits now, otherwise
///    [`ArpCache::query`] solicits the peer and parks the datagram.
pub fn send(
    iface: &Iface<'_>,
    cache: &mut ArpCache,
    dst_ip: Ipv4Addr,
    mut pkt: PacketBuf,
) -> Result<(), NetError> {
    if pkt.push_header(ETH_HEADER_LEN).is_err() {
        klog_debug!("ipv4: no headroom for the ethernet header");
        return Err(NetError::NoBufferSpace);
    }

    if dst_ip.is_unspecified() || dst_ip.is_broadcast() || dst_ip == iface.broadcast() {
        ethernet::fill_header(pkt.payload_mut(), MacAddr::BROADCAST, iface.mac(), ETHERTYPE_IPV4);
        return iface.tx(pkt);
    }

    if dst_ip.is_multicast() {
        let group_mac = ethernet::ipv4_multicast_mac(dst_ip);
        ethernet::fill_header(pkt.payload_mut(), group_mac, iface.mac(), ETHERTYPE_IPV4);
        return iface.tx(pkt);
    }

    let next_hop = if iface.is_local(dst_ip) {
        dst_ip
    } else if iface.gateway.is_unspecified() {
        klog_debug!("ipv4: {} is off-link and no gateway is configured", dst_ip);
        return Err(NetError::NetworkUnreachable);
    } else {
        iface.gateway
    };

    if let Some(mac) = cache.lookup(next_hop) {
        ethernet::fill_header(pkt.payload_mut(), mac, iface.mac(), ETHERTYPE_IPV4);
        return iface.tx(pkt);
    }
    cache.query(iface, next_hop, Some(pkt))
}
