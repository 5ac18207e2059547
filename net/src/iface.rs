//! Interface descriptor: per-interface IPv4 configuration plus the link
//! device it transmits through.
//!
//! One `Iface` exists per link device.  It is the single source of truth for
//! "our address" questions — the resolver never reaches around it.  The
//! address triple can be rewritten in place when a DHCP lease lands or a
//! static assignment changes ([`configure`](Iface::configure)); a gratuitous
//! announcement after such a change is the caller's move
//! ([`arp::announce`](super::arp::announce)).

use core::fmt;

use ember_lib::klog_debug;

use super::netdev::{LinkDevice, LinkStats};
use super::packetbuf::PacketBuf;
use super::types::{Ipv4Addr, MacAddr, NetError};

/// Hook invoked when an ARP reply addressed to us arrives.
///
/// A DHCP client registers this to detect address-probe answers: a reply for
/// the address it is about to claim means the lease is already in use.
pub type ArpReplyHook = fn(&Iface<'_>, Ipv4Addr);

/// A configured network interface.
pub struct Iface<'d> {
    /// IPv4 address assigned to this interface (`UNSPECIFIED` before
    /// configuration).
    pub ipv4_addr: Ipv4Addr,
    /// Subnet mask (e.g. `255.255.255.0`).
    pub netmask: Ipv4Addr,
    /// Default gateway (`UNSPECIFIED` if none).
    pub gateway: Ipv4Addr,
    dev: &'d dyn LinkDevice,
    arp_reply_hook: Option<ArpReplyHook>,
}

impl<'d> Iface<'d> {
    /// Create an interface with a static address assignment.
    pub fn new(
        dev: &'d dyn LinkDevice,
        ipv4_addr: Ipv4Addr,
        netmask: Ipv4Addr,
        gateway: Ipv4Addr,
    ) -> Self {
        klog_debug!(
            "iface: up, {}/{} gw {} mac {} mtu {} features {}",
            ipv4_addr,
            netmask.to_u32_be().leading_ones(),
            gateway,
            dev.mac(),
            dev.mtu(),
            dev.features(),
        );
        Self {
            ipv4_addr,
            netmask,
            gateway,
            dev,
            arp_reply_hook: None,
        }
    }

    /// Create an interface with no address yet (pre-DHCP).
    pub fn unconfigured(dev: &'d dyn LinkDevice) -> Self {
        Self {
            ipv4_addr: Ipv4Addr::UNSPECIFIED,
            netmask: Ipv4Addr::UNSPECIFIED,
            gateway: Ipv4Addr::UNSPECIFIED,
            dev,
            arp_reply_hook: None,
        }
    }

    /// Rewrite the address triple (DHCP lease arrival or static change).
    pub fn configure(&mut self, ipv4_addr: Ipv4Addr, netmask: Ipv4Addr, gateway: Ipv4Addr) {
        self.ipv4_addr = ipv4_addr;
        self.netmask = netmask;
        self.gateway = gateway;
        klog_debug!(
            "iface: reconfigured to {}/{} gw {}",
            ipv4_addr,
            netmask.to_u32_be().leading_ones(),
            gateway,
        );
    }

    /// Register the ARP reply notification hook.
    pub fn set_arp_reply_hook(&mut self, hook: ArpReplyHook) {
        self.arp_reply_hook = Some(hook);
    }

    /// The registered ARP reply hook, if any.
    #[inline]
    pub fn arp_reply_hook(&self) -> Option<ArpReplyHook> {
        self.arp_reply_hook
    }

    /// The subnet-directed broadcast address: `addr | !netmask`.
    #[inline]
    pub fn broadcast(&self) -> Ipv4Addr {
        let addr = self.ipv4_addr.to_u32_be();
        let mask = self.netmask.to_u32_be();
        Ipv4Addr::from_u32_be(addr | !mask)
    }

    /// `true` if `ip` is on the directly connected subnet.
    #[inline]
    pub fn is_local(&self, ip: Ipv4Addr) -> bool {
        Ipv4Addr::in_subnet(ip, self.ipv4_addr, self.netmask)
    }

    /// Prefix length of the netmask (`255.255.255.0` → 24).
    #[inline]
    pub fn prefix_len(&self) -> u8 {
        self.netmask.to_u32_be().leading_ones() as u8
    }

    /// Hardware address of the underlying device.
    #[inline]
    pub fn mac(&self) -> MacAddr {
        self.dev.mac()
    }

    /// MTU of the underlying device.
    #[inline]
    pub fn mtu(&self) -> u16 {
        self.dev.mtu()
    }

    /// Statistics snapshot of the underlying device.
    pub fn link_stats(&self) -> LinkStats {
        self.dev.stats()
    }

    /// Transmit a fully-formed Ethernet frame through the device.
    ///
    /// Ownership of `frame` moves to the driver on success; on failure it is
    /// dropped and its pool slot reclaimed.
    #[inline]
    pub fn tx(&self, frame: PacketBuf) -> Result<(), NetError> {
        self.dev.tx(frame)
    }
}

impl fmt::Debug for Iface<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Iface {{ {}/{} gw {} mac {} }}",
            self.ipv4_addr,
            self.prefix_len(),
            self.gateway,
            self.mac(),
        )
    }
}
