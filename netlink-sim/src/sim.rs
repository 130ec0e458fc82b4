//! # In-Memory Netlink Simulator
//!
//! ## Purpose
//!
//! This module provides [`SimNetlink`], a drop-in [`NetlinkSocket`] backend that
//! keeps the link, address, and route tables in process memory instead of the
//! kernel. It lets control-plane logic (a FIB handler, a benchmark) run
//! deterministically without privileges, real interfaces, or a netlink socket.
//!
//! ## How it works
//!
//! A handle/driver pair implements the single-writer event loop: [`SimNetlink`]
//! handles (cheaply cloneable, usable from any thread) package each call as an
//! [`Op`] carrying a oneshot responder and push it onto an unbounded channel;
//! [`SimDriver`] owns the [`NetState`] tables and drains the channel FIFO,
//! applying one operation at a time and fulfilling its responder. Because the
//! driver is the only code touching the tables, no two mutations are ever
//! concurrent and a read scheduled after a write observes that write. This is
//! the same happens-before contract a real backend provides through the kernel.
//!
//! Malformed route destinations are rejected on the calling side, before an `Op`
//! is ever scheduled. A caller that stops waiting (drops or times out its future)
//! does not cancel anything: the driver still applies the operation and the
//! result is discarded.
//!
//! ## Main components
//!
//! - `SimNetlink`: the handle implementing [`NetlinkSocket`].
//! - `SimDriver`: the event loop; run it where the embedding process wants
//!   (typically `tokio::spawn`).

use tokio::sync::{mpsc, oneshot};

use crate::socket::{NetlinkSocket, OpFuture};
use crate::store::NetState;
use crate::types::{Error, IfAddress, Link, Neighbor, Route, RouteFilter};

type Responder<T> = oneshot::Sender<Result<T, Error>>;

enum Op {
    AddLink(Link, Responder<()>),
    AddRoute(Route, Responder<()>),
    DeleteRoute(Route, Responder<()>),
    GetRoutes(RouteFilter, Responder<Vec<Route>>),
    AddIfAddress(IfAddress, Responder<()>),
    DeleteIfAddress(IfAddress, Responder<()>),
    GetAllIfAddresses(Responder<Vec<IfAddress>>),
    GetAllLinks(Responder<Vec<Link>>),
    GetAllNeighbors(Responder<Vec<Neighbor>>),
}

/// Handle to the simulated netlink backend. Clone freely; all clones feed the
/// same event loop and share one total order over their operations.
#[derive(Clone)]
pub struct SimNetlink {
    tx: mpsc::UnboundedSender<Op>,
}

impl SimNetlink {
    /// Creates a handle/driver pair. The embedding process decides where the
    /// driver runs; nothing executes until it does.
    pub fn new() -> (Self, SimDriver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self { tx },
            SimDriver {
                rx,
                state: NetState::new(),
            },
        )
    }

    /// Convenience constructor: spawns the driver onto the current tokio
    /// runtime and returns the handle. Must be called within a runtime.
    pub fn spawn() -> Self {
        let (handle, driver) = Self::new();
        tokio::spawn(driver.run());
        handle
    }

    fn schedule<T, F>(&self, make: F) -> OpFuture<T>
    where
        F: FnOnce(Responder<T>) -> Op,
    {
        let (done, rx) = oneshot::channel();
        match self.tx.send(make(done)) {
            Ok(()) => OpFuture::pending(rx),
            Err(_) => OpFuture::ready(Err(Error::Disconnected)),
        }
    }
}

impl NetlinkSocket for SimNetlink {
    /// No-op: the simulator has no external resource to initialize.
    fn init(&self) -> OpFuture<()> {
        OpFuture::ready(Ok(()))
    }

    fn add_link(&self, link: Link) -> OpFuture<()> {
        self.schedule(|done| Op::AddLink(link, done))
    }

    fn add_route(&self, route: Route) -> OpFuture<()> {
        if let Err(e) = route.destination.validate() {
            return OpFuture::ready(Err(e));
        }
        self.schedule(|done| Op::AddRoute(route, done))
    }

    fn delete_route(&self, route: Route) -> OpFuture<()> {
        if let Err(e) = route.destination.validate() {
            return OpFuture::ready(Err(e));
        }
        self.schedule(|done| Op::DeleteRoute(route, done))
    }

    fn get_routes(&self, filter: RouteFilter) -> OpFuture<Vec<Route>> {
        self.schedule(|done| Op::GetRoutes(filter, done))
    }

    fn add_if_address(&self, addr: IfAddress) -> OpFuture<()> {
        self.schedule(|done| Op::AddIfAddress(addr, done))
    }

    fn delete_if_address(&self, addr: IfAddress) -> OpFuture<()> {
        self.schedule(|done| Op::DeleteIfAddress(addr, done))
    }

    fn get_all_if_addresses(&self) -> OpFuture<Vec<IfAddress>> {
        self.schedule(Op::GetAllIfAddresses)
    }

    fn get_all_links(&self) -> OpFuture<Vec<Link>> {
        self.schedule(Op::GetAllLinks)
    }

    /// Always resolves to an empty list: the simulator keeps no neighbor table.
    /// This is contractual, not a stub; none of the consumers exercised against
    /// the simulator read neighbor state.
    fn get_all_neighbors(&self) -> OpFuture<Vec<Neighbor>> {
        self.schedule(Op::GetAllNeighbors)
    }
}

/// The simulator's event loop: the single execution context that owns the
/// tables and applies operations strictly in scheduling order.
pub struct SimDriver {
    rx: mpsc::UnboundedReceiver<Op>,
    state: NetState,
}

impl SimDriver {
    /// Drains operations until every [`SimNetlink`] handle is dropped.
    pub async fn run(mut self) {
        while let Some(op) = self.rx.recv().await {
            self.apply(op);
        }
        log::debug!("netlink simulator event loop terminated");
    }

    fn apply(&mut self, op: Op) {
        // A send failure means the caller stopped waiting; the mutation has
        // already taken effect and the result is discarded.
        match op {
            Op::AddLink(link, done) => {
                self.state.upsert_link(link);
                let _ = done.send(Ok(()));
            }
            Op::AddRoute(route, done) => {
                self.state.upsert_route(route);
                let _ = done.send(Ok(()));
            }
            Op::DeleteRoute(route, done) => {
                let _ = done.send(self.state.remove_route(route.protocol, &route.destination));
            }
            Op::GetRoutes(filter, done) => {
                let _ = done.send(Ok(self.state.routes(&filter)));
            }
            Op::AddIfAddress(addr, done) => {
                self.state.upsert_address(addr);
                let _ = done.send(Ok(()));
            }
            Op::DeleteIfAddress(addr, done) => {
                let _ = done.send(self.state.remove_address(&addr));
            }
            Op::GetAllIfAddresses(done) => {
                let _ = done.send(Ok(self.state.addresses()));
            }
            Op::GetAllLinks(done) => {
                let _ = done.send(Ok(self.state.links()));
            }
            Op::GetAllNeighbors(done) => {
                let _ = done.send(Ok(Vec::new()));
            }
        }
    }
}
