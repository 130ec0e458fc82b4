//! # Netlink Capability Trait
//!
//! ## Purpose
//!
//! This module defines [`NetlinkSocket`], the polymorphic contract shared by a real
//! kernel-backed netlink implementation and the in-memory simulator, together with
//! [`OpFuture`], the asynchronous handle every operation returns.
//!
//! ## How it works
//!
//! Control-plane code is written against the trait, so the assembling process picks
//! the backend: the simulator in tests and benchmarks, the real socket in production.
//! Methods are deliberately *not* `async fn`: each call packages the operation, hands
//! it to the backend's event loop, and returns an [`OpFuture`] immediately without
//! blocking the caller. The future resolves exactly once with the operation's result;
//! failures travel inside it and are never raised across the asynchronous boundary.
//!
//! An [`OpFuture`] is either already resolved (input rejected before scheduling, or
//! the loop is gone) or pending on a oneshot receiver the loop fulfills.
//!
//! ## Main components
//!
//! - `NetlinkSocket`: add/delete/get for links, addresses, routes, and neighbors,
//!   plus the one-time `init` hook.
//! - `OpFuture<T>`: a `Future<Output = Result<T, Error>>` resolved exactly once.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::types::{Error, IfAddress, Link, Neighbor, Route, RouteFilter};

/// The asynchronous result handle of a netlink operation.
///
/// Dropping the future does not cancel the operation: the backend still applies
/// it in order, and the result is simply discarded.
pub struct OpFuture<T> {
    state: OpState<T>,
}

enum OpState<T> {
    Ready(Option<Result<T, Error>>),
    Pending(oneshot::Receiver<Result<T, Error>>),
}

impl<T> OpFuture<T> {
    /// An already-resolved future, used for results known before scheduling.
    pub fn ready(result: Result<T, Error>) -> Self {
        Self {
            state: OpState::Ready(Some(result)),
        }
    }

    /// A future fulfilled by the backend sending on the paired oneshot.
    pub fn pending(rx: oneshot::Receiver<Result<T, Error>>) -> Self {
        Self {
            state: OpState::Pending(rx),
        }
    }
}

// OpFuture never pins its payload; the result is moved out on completion.
impl<T> Unpin for OpFuture<T> {}

impl<T> Future for OpFuture<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            OpState::Ready(slot) => Poll::Ready(slot.take().unwrap_or(Err(Error::Disconnected))),
            OpState::Pending(rx) => match Pin::new(rx).poll(cx) {
                Poll::Ready(Ok(result)) => Poll::Ready(result),
                // sender dropped without responding: the loop was torn down
                Poll::Ready(Err(_)) => Poll::Ready(Err(Error::Disconnected)),
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

/// The kernel network-configuration contract: links, interface addresses, routes,
/// and neighbors, each behind an asynchronous add/delete/get surface.
///
/// Implementations serialize all operations through a single execution context, so
/// an operation scheduled after another observes its effects, and two mutations are
/// never concurrent. Callers on arbitrary threads share a total order over all
/// operations; cross-caller ordering follows scheduling time, not call issuance.
pub trait NetlinkSocket {
    /// One-time initialization hook, invoked before first use. Backends with no
    /// external resource to set up resolve immediately.
    fn init(&self) -> OpFuture<()>;

    /// Inserts or replaces the link keyed by its interface index. Idempotent;
    /// also the seam test setup uses to seed interfaces.
    fn add_link(&self, link: Link) -> OpFuture<()>;

    /// Inserts or replaces the route keyed by (protocol, destination), replacing
    /// any prior next-hop set wholesale. Fails with
    /// [`Error::InvalidDestination`] before scheduling if the destination is
    /// malformed.
    fn add_route(&self, route: Route) -> OpFuture<()>;

    /// Removes the route keyed by the given route's (protocol, destination);
    /// next-hops are ignored. Fails with [`Error::NotFound`] if absent.
    fn delete_route(&self, route: Route) -> OpFuture<()>;

    /// Point-in-time snapshot of the routes matching the filter. Never fails;
    /// an unmatched filter yields an empty list.
    fn get_routes(&self, filter: RouteFilter) -> OpFuture<Vec<Route>>;

    /// Adds the (interface, network) pair; a no-op if already present.
    fn add_if_address(&self, addr: IfAddress) -> OpFuture<()>;

    /// Removes the (interface, network) pair. Fails with [`Error::NotFound`]
    /// if absent.
    fn delete_if_address(&self, addr: IfAddress) -> OpFuture<()>;

    /// Point-in-time snapshot of every interface address.
    fn get_all_if_addresses(&self) -> OpFuture<Vec<IfAddress>>;

    /// Point-in-time snapshot of every link.
    fn get_all_links(&self) -> OpFuture<Vec<Link>>;

    /// Point-in-time snapshot of the neighbor table.
    fn get_all_neighbors(&self) -> OpFuture<Vec<Neighbor>>;
}
