//! Tests for the ARP codec and inbound handling.
//!
//! Covers:
//! - header serialize/parse round-trip
//! - malformed-frame rejection
//! - request-for-us reply emission (in place, no second buffer)
//! - passive snoop of IPv4 traffic
//! - reply hook notification
//! - gratuitous announcement shape

use core::sync::atomic::{AtomicU32, Ordering};

use ember_lib::testing::TestResult;
use ember_lib::{assert_eq_test, assert_test, pass};

use crate::arp::{self, ArpHeader};
use crate::cache::ArpCache;
use crate::ethernet;
use crate::iface::Iface;
use crate::loopback::Loopback;
use crate::packetbuf::PacketBuf;
use crate::pool::PACKET_POOL;
use crate::types::{Ipv4Addr, MacAddr};
use crate::{
    ARP_HEADER_LEN, ARP_OPER_REPLY, ARP_OPER_REQUEST, ETH_HEADER_LEN, ETHERTYPE_ARP,
    ETHERTYPE_IPV4,
};

// =============================================================================
// Helpers
// =============================================================================

const LOCAL_MAC: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x02]);
const LOCAL_IP: Ipv4Addr = Ipv4Addr([10, 0, 0, 2]);
const NETMASK: Ipv4Addr = Ipv4Addr([255, 255, 255, 0]);
const GATEWAY: Ipv4Addr = Ipv4Addr([10, 0, 0, 1]);

fn ensure_pool_init() {
    PACKET_POOL.init();
}

fn test_iface(dev: &Loopback) -> Iface<'_> {
    Iface::new(dev, LOCAL_IP, NETMASK, GATEWAY)
}

/// Build a raw ARP-over-Ethernet frame.
fn arp_frame(
    eth_dst: MacAddr,
    opcode: u16,
    sender_mac: MacAddr,
    sender_ip: Ipv4Addr,
    target_mac: MacAddr,
    target_ip: Ipv4Addr,
) -> [u8; ETH_HEADER_LEN + ARP_HEADER_LEN] {
    let mut frame = [0u8; ETH_HEADER_LEN + ARP_HEADER_LEN];
    ethernet::fill_header(&mut frame, eth_dst, sender_mac, ETHERTYPE_ARP);
    let header = ArpHeader {
        opcode,
        sender_mac,
        sender_ip,
        target_mac,
        target_ip,
    };
    let body = <&mut [u8; ARP_HEADER_LEN]>::try_from(&mut frame[ETH_HEADER_LEN..])
        .expect("frame tail is exactly one ARP header");
    header.write(body);
    frame
}

/// Feed a raw frame through the ingress convention: copy into a pool buffer,
/// consume the Ethernet header, hand the rest to the ARP handler.
fn rx_arp(iface: &Iface<'_>, cache: &mut ArpCache, frame: &[u8]) {
    let mut pkt = PacketBuf::from_raw_copy(frame).expect("pool should have capacity");
    pkt.pull_header(ETH_HEADER_LEN).expect("frame carries an ethernet header");
    arp::handle_rx(iface, cache, pkt);
}

// =============================================================================
// Codec
// =============================================================================

pub fn test_header_roundtrip() -> TestResult {
    let header = ArpHeader {
        opcode: ARP_OPER_REPLY,
        sender_mac: MacAddr([0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01]),
        sender_ip: Ipv4Addr([192, 0, 2, 1]),
        target_mac: MacAddr([0x02, 0x11, 0x22, 0x33, 0x44, 0x55]),
        target_ip: Ipv4Addr([192, 0, 2, 99]),
    };

    let mut wire = [0u8; ARP_HEADER_LEN];
    header.write(&mut wire);
    let parsed = ArpHeader::parse(&wire).expect("self-built header must parse");
    assert_eq_test!(parsed, header, "round-trip must reproduce every field");

    pass!()
}

pub fn test_parse_rejects_malformed() -> TestResult {
    let good = arp_frame(
        MacAddr::BROADCAST,
        ARP_OPER_REQUEST,
        MacAddr([0x02, 0, 0, 0, 0, 7]),
        Ipv4Addr([10, 0, 0, 7]),
        MacAddr::ZERO,
        LOCAL_IP,
    );
    let body = &good[ETH_HEADER_LEN..];
    assert_test!(ArpHeader::parse(body).is_some(), "well-formed header parses");

    assert_test!(
        ArpHeader::parse(&body[..ARP_HEADER_LEN - 1]).is_none(),
        "short frame is rejected"
    );

    let mut bad_htype = [0u8; ARP_HEADER_LEN];
    bad_htype.copy_from_slice(body);
    bad_htype[1] = 6; // hardware type 6 (IEEE 802) — not ours
    assert_test!(ArpHeader::parse(&bad_htype).is_none());

    let mut bad_plen = [0u8; ARP_HEADER_LEN];
    bad_plen.copy_from_slice(body);
    bad_plen[5] = 16; // protocol length of an IPv6 address
    assert_test!(ArpHeader::parse(&bad_plen).is_none());

    pass!()
}

// =============================================================================
// Request handling
// =============================================================================

pub fn test_request_for_us_gets_reply() -> TestResult {
    ensure_pool_init();
    let lo = Loopback::new(LOCAL_MAC);
    let iface = test_iface(&lo);
    let mut cache = ArpCache::new();

    let peer_mac = MacAddr([0x02, 0, 0, 0, 0, 0x07]);
    let peer_ip = Ipv4Addr([10, 0, 0, 7]);
    let request = arp_frame(
        MacAddr::BROADCAST,
        ARP_OPER_REQUEST,
        peer_mac,
        peer_ip,
        MacAddr::ZERO,
        LOCAL_IP,
    );
    rx_arp(&iface, &mut cache, &request);

    assert_eq_test!(lo.pending(), 1, "exactly one reply frame emitted");
    let reply = lo.pop_frame().expect("reply frame");
    let data = reply.payload();
    assert_eq_test!(&data[..6], &peer_mac.0[..], "ethernet dest is the asker");
    assert_eq_test!(&data[6..12], &LOCAL_MAC.0[..], "ethernet source is us");
    assert_eq_test!(ethernet::ethertype(data), Some(ETHERTYPE_ARP));

    let header = ArpHeader::parse(&data[ETH_HEADER_LEN..]).expect("reply parses");
    assert_eq_test!(header.opcode, ARP_OPER_REPLY);
    assert_eq_test!(header.sender_mac, LOCAL_MAC);
    assert_eq_test!(header.sender_ip, LOCAL_IP);
    assert_eq_test!(header.target_mac, peer_mac);
    assert_eq_test!(header.target_ip, peer_ip);

    // Asking about us also teaches us the asker's binding.
    assert_eq_test!(cache.lookup(peer_ip), Some(peer_mac));

    pass!()
}

pub fn test_request_not_for_us_is_silent() -> TestResult {
    ensure_pool_init();
    let lo = Loopback::new(LOCAL_MAC);
    let iface = test_iface(&lo);
    let mut cache = ArpCache::new();

    let request = arp_frame(
        MacAddr::BROADCAST,
        ARP_OPER_REQUEST,
        MacAddr([0x02, 0, 0, 0, 0, 0x07]),
        Ipv4Addr([10, 0, 0, 7]),
        MacAddr::ZERO,
        Ipv4Addr([10, 0, 0, 9]),
    );
    rx_arp(&iface, &mut cache, &request);

    assert_eq_test!(lo.pending(), 0, "no reply for someone else's address");
    assert_eq_test!(
        cache.occupied(),
        0,
        "a frame not for us must not create entries"
    );

    pass!()
}

pub fn test_unknown_opcode_learns_but_stays_quiet() -> TestResult {
    ensure_pool_init();
    let lo = Loopback::new(LOCAL_MAC);
    let iface = test_iface(&lo);
    let mut cache = ArpCache::new();

    let peer_mac = MacAddr([0x02, 0, 0, 0, 0, 0x07]);
    let peer_ip = Ipv4Addr([10, 0, 0, 7]);
    let frame = arp_frame(
        MacAddr::BROADCAST,
        9, // RARP-era opcode — not ours
        peer_mac,
        peer_ip,
        MacAddr::ZERO,
        LOCAL_IP,
    );
    rx_arp(&iface, &mut cache, &frame);

    assert_eq_test!(lo.pending(), 0, "unknown opcode emits nothing");
    assert_eq_test!(
        cache.lookup(peer_ip),
        Some(peer_mac),
        "the learn step runs before opcode dispatch"
    );

    pass!()
}

// =============================================================================
// Reply handling
// =============================================================================

static HOOK_SENDER: AtomicU32 = AtomicU32::new(0);

fn record_reply(_iface: &Iface<'_>, sender: Ipv4Addr) {
    HOOK_SENDER.store(sender.to_u32_be(), Ordering::Relaxed);
}

pub fn test_reply_hook_notified() -> TestResult {
    ensure_pool_init();
    let lo = Loopback::new(LOCAL_MAC);
    let mut iface = test_iface(&lo);
    iface.set_arp_reply_hook(record_reply);
    let mut cache = ArpCache::new();

    HOOK_SENDER.store(0, Ordering::Relaxed);
    let peer_ip = Ipv4Addr([10, 0, 0, 7]);
    let reply = arp_frame(
        LOCAL_MAC,
        ARP_OPER_REPLY,
        MacAddr([0x02, 0, 0, 0, 0, 0x07]),
        peer_ip,
        LOCAL_MAC,
        LOCAL_IP,
    );
    rx_arp(&iface, &mut cache, &reply);

    assert_eq_test!(
        HOOK_SENDER.load(Ordering::Relaxed),
        peer_ip.to_u32_be(),
        "hook sees the reply sender"
    );

    pass!()
}

// =============================================================================
// IPv4 snoop
// =============================================================================

/// Build a minimal IPv4-over-Ethernet frame (header fields beyond addresses
/// are not inspected by the snoop path).
fn ipv4_frame(src_mac: MacAddr, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> [u8; 34] {
    let mut frame = [0u8; 34];
    ethernet::fill_header(&mut frame, LOCAL_MAC, src_mac, ETHERTYPE_IPV4);
    let ip = &mut frame[ETH_HEADER_LEN..];
    ip[0] = 0x45; // version 4, IHL 5
    ip[8] = 64; // TTL
    ip[12..16].copy_from_slice(&src_ip.0);
    ip[16..20].copy_from_slice(&dst_ip.0);
    frame
}

pub fn test_snoop_learns_on_link_source() -> TestResult {
    ensure_pool_init();
    let lo = Loopback::new(LOCAL_MAC);
    let iface = test_iface(&lo);
    let mut cache = ArpCache::new();

    let peer_mac = MacAddr([0x02, 0, 0, 0, 0, 0x07]);
    let peer_ip = Ipv4Addr([10, 0, 0, 7]);
    let frame = ipv4_frame(peer_mac, peer_ip, LOCAL_IP);
    let pkt = PacketBuf::from_raw_copy(&frame).expect("pool should have capacity");
    arp::snoop_rx(&iface, &mut cache, &pkt);

    assert_eq_test!(cache.lookup(peer_ip), Some(peer_mac));
    assert_eq_test!(pkt.len(), frame.len(), "snoop never consumes the buffer");

    pass!()
}

pub fn test_snoop_ignores_off_link_source() -> TestResult {
    ensure_pool_init();
    let lo = Loopback::new(LOCAL_MAC);
    let iface = test_iface(&lo);
    let mut cache = ArpCache::new();

    let frame = ipv4_frame(
        MacAddr([0x02, 0, 0, 0, 0, 0x55]),
        Ipv4Addr([192, 168, 1, 5]),
        LOCAL_IP,
    );
    let pkt = PacketBuf::from_raw_copy(&frame).expect("pool should have capacity");
    arp::snoop_rx(&iface, &mut cache, &pkt);

    assert_eq_test!(cache.occupied(), 0, "off-link sources are not learned");

    pass!()
}

// =============================================================================
// Gratuitous announcement
// =============================================================================

pub fn test_announce_shape() -> TestResult {
    ensure_pool_init();
    let lo = Loopback::new(LOCAL_MAC);
    let iface = test_iface(&lo);
    let mut cache = ArpCache::new();

    assert_test!(arp::announce(&iface, &mut cache).is_ok());

    assert_eq_test!(lo.pending(), 1);
    let frame = lo.pop_frame().expect("announcement frame");
    let data = frame.payload();
    assert_eq_test!(&data[..6], &MacAddr::BROADCAST.0[..]);
    assert_eq_test!(ethernet::ethertype(data), Some(ETHERTYPE_ARP));

    let header = ArpHeader::parse(&data[ETH_HEADER_LEN..]).expect("announcement parses");
    assert_eq_test!(header.opcode, ARP_OPER_REQUEST);
    assert_eq_test!(header.sender_ip, LOCAL_IP, "sender is our address");
    assert_eq_test!(header.target_ip, LOCAL_IP, "target is our address too");
    assert_eq_test!(header.target_mac, MacAddr::ZERO);

    pass!()
}

// =============================================================================
// Test suite registration
// =============================================================================

ember_lib::define_test_suite!(
    arp,
    [
        test_header_roundtrip,
        test_parse_rejects_malformed,
        test_request_for_us_gets_reply,
        test_request_not_for_us_is_silent,
        test_unknown_opcode_learns_but_stays_quiet,
        test_reply_hook_notified,
        test_snoop_learns_on_link_source,
        test_snoop_ignores_off_link_source,
        test_announce_shape,
    ]
);
