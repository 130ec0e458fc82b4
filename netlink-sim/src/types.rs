//! # Netlink Entity Model
//!
//! ## Purpose
//!
//! This module defines the value types exchanged through the [`crate::socket::NetlinkSocket`]
//! capability trait: network interfaces, interface addresses, routes with their
//! next-hops, and the error taxonomy of the simulated configuration store.
//!
//! ## How it works
//!
//! Every type is a plain value with public fields. Equality and hashing follow the
//! entity's *identity*, the key under which the kernel (and the simulator) files it,
//! not its full attribute set: a `Link` is identified by its interface index, a `Route`
//! by its `(protocol, destination)` pair. Attributes carried alongside the identity are
//! informational and are compared by inspecting fields directly.
//!
//! ## Main components
//!
//! - `Link`, `IfAddress`, `Neighbor`: interface-scoped entities.
//! - `Route`, `RouteDestination`, `NextHop`: protocol-scoped routing entries.
//! - `RouteFilter`: wildcard-capable match used by route enumeration.
//! - `Error`: the failure kinds an operation's future can resolve to.

use ipnet::IpNet;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;

/// Largest value an MPLS label can take (20-bit field, RFC 3032).
pub const MPLS_LABEL_MAX: u32 = (1 << 20) - 1;

/// Failure kinds carried through an operation's future.
///
/// Enumeration operations never produce an error; "no matches" is an empty list.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A delete referenced a key absent from the relevant table.
    #[error("entry not found")]
    NotFound,
    /// A route destination failed validation and was never scheduled.
    #[error("invalid route destination: {0}")]
    InvalidDestination(String),
    /// The event loop was dropped while the operation was pending. A correctly
    /// assembled process keeps the loop alive for the lifetime of every handle,
    /// so observing this indicates a lifecycle bug in the embedding code.
    #[error("simulator event loop disconnected")]
    Disconnected,
}

/// A network interface entry.
#[derive(Clone, Debug)]
pub struct Link {
    /// The interface index; the link's identity.
    pub if_index: u32,
    /// The interface name (e.g. "vethTestX"). Informational only.
    pub name: String,
    /// Whether the interface is administratively up.
    pub up: bool,
    /// Whether the interface is a loopback device.
    pub loopback: bool,
}

impl Link {
    /// Creates an up, non-loopback link.
    pub fn new(if_index: u32, name: impl Into<String>) -> Self {
        Self {
            if_index,
            name: name.into(),
            up: true,
            loopback: false,
        }
    }
}

// Identity comparison: two links are the same entry when they name the same
// interface index, whatever their current attributes.
impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.if_index == other.if_index
    }
}

impl Eq for Link {}

impl Hash for Link {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.if_index.hash(state);
    }
}

/// An IP network bound to a specific interface.
///
/// The `(if_index, net)` pair is the whole identity; there are no further attributes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IfAddress {
    /// The interface the address is attached to.
    pub if_index: u32,
    /// The address together with its prefix length.
    pub net: IpNet,
}

impl IfAddress {
    pub fn new(if_index: u32, net: IpNet) -> Self {
        Self { if_index, net }
    }
}

/// An egress interface plus optional gateway used to forward traffic for a route.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NextHop {
    /// The outgoing interface index.
    pub if_index: u32,
    /// The next-hop address, if the route is not directly connected.
    pub gateway: Option<IpAddr>,
}

impl NextHop {
    pub fn new(if_index: u32, gateway: Option<IpAddr>) -> Self {
        Self { if_index, gateway }
    }
}

/// The destination a route maps: an IP prefix for unicast routes or a numeric
/// label for label-switched routes. The two kinds live in independent tables,
/// so a prefix and a label whose encodings coincide can never collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouteDestination {
    Prefix(IpNet),
    Mpls(u32),
}

impl RouteDestination {
    /// Checks that the destination has a valid encoding: a prefix must be in
    /// canonical form (no host bits set below the mask) and an MPLS label must
    /// fit in its 20-bit field.
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            RouteDestination::Prefix(net) => {
                if *net != net.trunc() {
                    return Err(Error::InvalidDestination(format!(
                        "prefix {net} has host bits set"
                    )));
                }
                Ok(())
            }
            RouteDestination::Mpls(label) => {
                if *label > MPLS_LABEL_MAX {
                    return Err(Error::InvalidDestination(format!(
                        "MPLS label {label} exceeds 20 bits"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// A protocol-scoped mapping from a destination to a set of next-hops.
///
/// `protocol` is the numeric tag of the control-plane process that installed the
/// route; it partitions the route tables. An empty next-hop set is legal and
/// represents a blackhole-style entry.
#[derive(Clone, Debug)]
pub struct Route {
    /// The installing protocol identifier.
    pub protocol: u8,
    /// The destination this route maps.
    pub destination: RouteDestination,
    /// The next-hops, in the order supplied by the installer.
    pub next_hops: Vec<NextHop>,
}

impl Route {
    /// Creates a route with no next-hops; extend `next_hops` to add some.
    pub fn new(protocol: u8, destination: RouteDestination) -> Self {
        Self {
            protocol,
            destination,
            next_hops: Vec::new(),
        }
    }

    pub fn with_next_hops(mut self, next_hops: Vec<NextHop>) -> Self {
        self.next_hops = next_hops;
        self
    }
}

// Identity comparison: the (protocol, destination) key. Next-hops are the
// entry's payload and are replaced wholesale on re-add.
impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.protocol == other.protocol && self.destination == other.destination
    }
}

impl Eq for Route {}

impl Hash for Route {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.protocol.hash(state);
        self.destination.hash(state);
    }
}

/// A match over stored routes. `None` fields are wildcards, so the default
/// filter selects every route across every protocol.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteFilter {
    pub protocol: Option<u8>,
    pub destination: Option<RouteDestination>,
}

impl RouteFilter {
    pub fn protocol(protocol: u8) -> Self {
        Self {
            protocol: Some(protocol),
            destination: None,
        }
    }

    /// True when every populated filter field equals the route's corresponding field.
    pub fn matches(&self, route: &Route) -> bool {
        if self.protocol.is_some_and(|p| p != route.protocol) {
            return false;
        }
        if self
            .destination
            .as_ref()
            .is_some_and(|d| *d != route.destination)
        {
            return false;
        }
        true
    }
}

/// A neighbor (ARP/NDP) entry.
///
/// The simulator keeps no neighbor state; this type exists so the capability
/// trait's `get_all_neighbors` has a result shape shared with a real backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Neighbor {
    /// The interface this neighbor was learned on.
    pub if_index: u32,
    /// The neighbor's IP address.
    pub addr: IpAddr,
    /// The neighbor's link-layer address, if resolved.
    pub lladdr: Option<[u8; 6]>,
}
