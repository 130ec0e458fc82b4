//! # Simulated Kernel Configuration Tables
//!
//! ## Purpose
//!
//! Holds the link, address, and route tables the simulator stands in for, and
//! provides the upsert/remove/enumerate primitives the event loop applies.
//!
//! ## How it works
//!
//! - Links are keyed by interface index; re-adding an index replaces the prior
//!   attributes, the same way a real interface table reflects latest-known state.
//! - Addresses are grouped per interface and keep insertion order within a group.
//! - Routes are partitioned first by installing protocol, then by destination
//!   kind: prefix-keyed unicast routes and label-keyed MPLS routes live in
//!   independent tables, so coinciding encodings never collide.
//! - Every table is an ordered map. Enumeration order (interface index ascending,
//!   protocol ascending, destination ascending) is an observable contract that
//!   deterministic assertions rely on.
//!
//! ## Main components
//!
//! - `NetState`: the four tables plus their mutation and snapshot-read primitives.

use std::collections::BTreeMap;

use ipnet::IpNet;

use crate::types::{Error, IfAddress, Link, Route, RouteDestination, RouteFilter};

/// The simulated kernel state. Exclusively owned by the event loop task; reads
/// hand out clones, never references, so no caller can observe a table mid-mutation.
#[derive(Debug, Default)]
pub struct NetState {
    links: BTreeMap<u32, Link>,
    // per-interface address lists, insertion-ordered within an interface
    addrs: BTreeMap<u32, Vec<IfAddress>>,
    unicast: BTreeMap<u8, BTreeMap<IpNet, Route>>,
    mpls: BTreeMap<u8, BTreeMap<u32, Route>>,
}

impl NetState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the link keyed by its interface index.
    pub fn upsert_link(&mut self, link: Link) {
        self.links.insert(link.if_index, link);
    }

    /// Appends the address to its interface's list unless the exact
    /// (interface, network) pair is already present, in which case this is a no-op.
    pub fn upsert_address(&mut self, addr: IfAddress) {
        let list = self.addrs.entry(addr.if_index).or_default();
        if !list.contains(&addr) {
            list.push(addr);
        }
    }

    /// Removes the exact (interface, network) pair.
    pub fn remove_address(&mut self, addr: &IfAddress) -> Result<(), Error> {
        let list = self.addrs.get_mut(&addr.if_index).ok_or(Error::NotFound)?;
        let pos = list.iter().position(|a| a == addr).ok_or(Error::NotFound)?;
        list.remove(pos);
        if list.is_empty() {
            self.addrs.remove(&addr.if_index);
        }
        Ok(())
    }

    /// Inserts or replaces the route keyed by (protocol, destination). On replace
    /// the prior entry's next-hop set is discarded wholesale, never merged.
    pub fn upsert_route(&mut self, route: Route) {
        match route.destination {
            RouteDestination::Prefix(net) => {
                self.unicast
                    .entry(route.protocol)
                    .or_default()
                    .insert(net, route);
            }
            RouteDestination::Mpls(label) => {
                self.mpls
                    .entry(route.protocol)
                    .or_default()
                    .insert(label, route);
            }
        }
    }

    /// Removes the route keyed by (protocol, destination).
    pub fn remove_route(
        &mut self,
        protocol: u8,
        destination: &RouteDestination,
    ) -> Result<(), Error> {
        let removed = match destination {
            RouteDestination::Prefix(net) => self
                .unicast
                .get_mut(&protocol)
                .and_then(|table| table.remove(net)),
            RouteDestination::Mpls(label) => self
                .mpls
                .get_mut(&protocol)
                .and_then(|table| table.remove(label)),
        };
        removed.map(|_| ()).ok_or(Error::NotFound)
    }

    /// Snapshot of every link, interface index ascending.
    pub fn links(&self) -> Vec<Link> {
        self.links.values().cloned().collect()
    }

    /// Snapshot of every address: interface index ascending, insertion order
    /// within an interface.
    pub fn addresses(&self) -> Vec<IfAddress> {
        self.addrs.values().flatten().cloned().collect()
    }

    /// Snapshot of every route matching the filter: the unicast partition first,
    /// then MPLS, each protocol ascending and destination ascending within it.
    /// Populated filter fields must equal the stored route's fields; empty fields
    /// are wildcards, so the default filter selects everything.
    pub fn routes(&self, filter: &RouteFilter) -> Vec<Route> {
        let mut out = Vec::new();
        for table in self.unicast.values() {
            for route in table.values() {
                if filter.matches(route) {
                    out.push(route.clone());
                }
            }
        }
        for table in self.mpls.values() {
            for route in table.values() {
                if filter.matches(route) {
                    out.push(route.clone());
                }
            }
        }
        out
    }
}
