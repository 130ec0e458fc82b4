//! # FIB Installation Benchmark Harness
//!
//! ## Purpose
//!
//! Measures how fast bulk route installation completes through the simulated
//! netlink backend: seed two virtual interfaces, install a batch of unicast
//! routes with large next-hop sets, and time from first issue to last
//! completion.
//!
//! ## How it works
//!
//! All inputs are explicit configuration ([`BenchConfig`]); prefix and
//! next-hop generation happens before the clock starts, so only the
//! issue-and-await phase is measured. The whole batch is issued back-to-back
//! and awaited afterwards. The simulator applies it FIFO on its event loop,
//! so awaiting the futures measures actual completion, not just submission.
//!
//! ## Main components
//!
//! - `BenchConfig`: route count, next-hop count, prefix length, protocol id.
//! - `PrefixGenerator`: unique random IPv6 prefixes and random next-hop sets.
//! - `run_once()`: one measured installation pass, with verification.

use std::collections::BTreeSet;
use std::net::Ipv6Addr;
use std::time::{Duration, Instant};

use ipnet::{IpNet, Ipv6Net};
use netlink_sim::{
    Link, NetlinkSocket as _, NextHop, Route, RouteDestination, RouteFilter, SimNetlink,
};
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};

/// First seeded virtual interface (index 0).
pub const VETH_NAME_X: &str = "vethTestX";
/// Second seeded virtual interface (index 1); routes egress here.
pub const VETH_NAME_Y: &str = "vethTestY";

pub const VETH_INDEX_X: u32 = 0;
pub const VETH_INDEX_Y: u32 = 1;

/// Benchmark parameters. Kept as explicit configuration passed into the
/// harness rather than process-wide state.
#[derive(Clone, Debug)]
pub struct BenchConfig {
    /// Number of unicast routes to install in one batch.
    pub routes: usize,
    /// Next-hops per route.
    pub next_hops: usize,
    /// Prefix length of every generated destination.
    pub prefix_len: u8,
    /// Protocol identifier the routes are installed under.
    pub protocol: u8,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            routes: 1000,
            next_hops: 128,
            prefix_len: 128,
            protocol: 99,
        }
    }
}

/// Random generator for benchmark inputs. Seedable so runs can be reproduced.
pub struct PrefixGenerator {
    rng: StdRng,
}

impl PrefixGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generates `count` distinct random IPv6 prefixes of the given length.
    ///
    /// Fails instead of looping when the request is unsatisfiable: a prefix
    /// length beyond 128, or more distinct prefixes than the length can hold.
    pub fn ipv6_prefixes(&mut self, count: usize, prefix_len: u8) -> anyhow::Result<Vec<Ipv6Net>> {
        anyhow::ensure!(prefix_len <= 128, "prefix length /{prefix_len} exceeds 128");
        let space = 1u128.checked_shl(u32::from(prefix_len)).unwrap_or(u128::MAX);
        anyhow::ensure!(
            count as u128 <= space,
            "{count} distinct prefixes do not fit in a /{prefix_len}"
        );
        let mut set = BTreeSet::new();
        while set.len() < count {
            let addr = Ipv6Addr::from(self.rng.r#gen::<u128>());
            // truncation keeps the prefix canonical for any length
            if let Ok(net) = Ipv6Net::new(addr, prefix_len) {
                set.insert(net.trunc());
            }
        }
        Ok(set.into_iter().collect())
    }

    /// Generates `count` next-hops over the given interface, each with a
    /// random link-local gateway.
    pub fn next_hops(&mut self, count: usize, if_index: u32) -> Vec<NextHop> {
        (0..count)
            .map(|_| {
                let host: u64 = self.rng.r#gen();
                let gateway = Ipv6Addr::from((0xfe80_u128 << 112) | host as u128);
                NextHop::new(if_index, Some(gateway.into()))
            })
            .collect()
    }
}

impl Default for PrefixGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one measured installation pass.
#[derive(Clone, Debug)]
pub struct BenchReport {
    /// Wall time from first route issued to last completion observed.
    pub elapsed: Duration,
    /// Routes visible through `get_routes` after the batch completed.
    pub installed: usize,
}

/// Runs one installation pass: build the simulator, seed the two interfaces,
/// install the batch, await completion, verify, and tear the batch down again.
/// Only the install phase is timed. Must run within a tokio runtime.
pub async fn run_once(
    cfg: &BenchConfig,
    generator: &mut PrefixGenerator,
) -> anyhow::Result<BenchReport> {
    let nl = SimNetlink::spawn();
    nl.init().await?;
    nl.add_link(Link::new(VETH_INDEX_X, VETH_NAME_X)).await?;
    nl.add_link(Link::new(VETH_INDEX_Y, VETH_NAME_Y)).await?;

    // generation is not part of the measurement
    let routes: Vec<Route> = generator
        .ipv6_prefixes(cfg.routes, cfg.prefix_len)?
        .into_iter()
        .map(|net| {
            Route::new(cfg.protocol, RouteDestination::Prefix(IpNet::V6(net)))
                .with_next_hops(generator.next_hops(cfg.next_hops, VETH_INDEX_Y))
        })
        .collect();

    let start = Instant::now();
    let pending: Vec<_> = routes.iter().map(|r| nl.add_route(r.clone())).collect();
    for fut in pending {
        fut.await?;
    }
    let elapsed = start.elapsed();

    let installed = nl.get_routes(RouteFilter::protocol(cfg.protocol)).await?.len();

    let pending: Vec<_> = routes
        .iter()
        .map(|r| nl.delete_route(Route::new(cfg.protocol, r.destination.clone())))
        .collect();
    for fut in pending {
        fut.await?;
    }
    let remaining = nl.get_routes(RouteFilter::default()).await?.len();
    if remaining != 0 {
        log::warn!("{remaining} routes left behind after teardown");
    }

    Ok(BenchReport { elapsed, installed })
}
