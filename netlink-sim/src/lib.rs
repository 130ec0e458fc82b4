// Public modules and re-exports
pub mod sim;
pub mod socket;
pub mod store;
pub mod types;

pub use sim::{SimDriver, SimNetlink};
pub use socket::{NetlinkSocket, OpFuture};
pub use store::NetState;
pub use types::{
    Error, IfAddress, Link, MPLS_LABEL_MAX, Neighbor, NextHop, Route, RouteDestination,
    RouteFilter,
};
