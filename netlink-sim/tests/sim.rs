// End-to-end tests driving the simulator through the NetlinkSocket trait on a
// tokio runtime, the way the FIB benchmark harness does.

use ipnet::{IpNet, Ipv6Net};
use netlink_sim::{
    Error, IfAddress, Link, NetlinkSocket as _, NextHop, Route, RouteDestination, RouteFilter,
    SimNetlink,
};
use std::net::Ipv6Addr;

fn net(s: &str) -> IpNet {
    s.parse().unwrap()
}

/// A /128 destination derived from a counter, so bulk tests get unique prefixes.
fn host_prefix(i: u128) -> RouteDestination {
    let addr = Ipv6Addr::from((0x2001_0db8_u128 << 96) | i);
    RouteDestination::Prefix(IpNet::V6(Ipv6Net::new(addr, 128).unwrap()))
}

fn next_hops_over(if_index: u32, count: usize) -> Vec<NextHop> {
    (0..count)
        .map(|i| {
            NextHop::new(
                if_index,
                Some(Ipv6Addr::from((0xfe80_u128 << 112) | i as u128).into()),
            )
        })
        .collect()
}

#[tokio::test]
async fn init_resolves_immediately() {
    let nl = SimNetlink::spawn();
    nl.init().await.unwrap();
}

#[tokio::test]
async fn link_seeding_and_idempotent_re_add() {
    let nl = SimNetlink::spawn();
    nl.add_link(Link::new(0, "vethTestX")).await.unwrap();
    nl.add_link(Link::new(1, "vethTestY")).await.unwrap();

    // re-add with different attributes keeps a single entry, latest attributes
    nl.add_link(Link {
        if_index: 1,
        name: "vethTestY".to_string(),
        up: false,
        loopback: false,
    })
    .await
    .unwrap();

    let links = nl.get_all_links().await.unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].name, "vethTestX");
    assert!(!links[1].up);
}

#[tokio::test]
async fn address_lifecycle_and_not_found() {
    let nl = SimNetlink::spawn();
    let addr = IfAddress::new(0, net("192.168.1.1/24"));

    // deleting before adding fails through the future, not a panic or silent no-op
    assert_eq!(
        nl.delete_if_address(addr.clone()).await,
        Err(Error::NotFound)
    );

    nl.add_if_address(addr.clone()).await.unwrap();
    nl.add_if_address(addr.clone()).await.unwrap(); // idempotent
    assert_eq!(nl.get_all_if_addresses().await.unwrap(), vec![addr.clone()]);

    nl.delete_if_address(addr.clone()).await.unwrap();
    assert!(nl.get_all_if_addresses().await.unwrap().is_empty());
    assert_eq!(nl.delete_if_address(addr).await, Err(Error::NotFound));
}

#[tokio::test]
async fn malformed_destination_is_rejected_before_scheduling() {
    let nl = SimNetlink::spawn();

    let bad_prefix = Route::new(99, RouteDestination::Prefix(net("10.0.0.1/8")));
    assert!(matches!(
        nl.add_route(bad_prefix).await,
        Err(Error::InvalidDestination(_))
    ));

    let bad_label = Route::new(99, RouteDestination::Mpls(1 << 20));
    assert!(matches!(
        nl.delete_route(bad_label).await,
        Err(Error::InvalidDestination(_))
    ));

    assert!(nl.get_routes(RouteFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn issuance_order_is_apply_order() {
    let nl = SimNetlink::spawn();

    // issue adds for D1, D2, D3 and a delete of D2 back-to-back, then await all
    let d1 = nl.add_route(Route::new(99, host_prefix(1)));
    let d2 = nl.add_route(Route::new(99, host_prefix(2)));
    let d3 = nl.add_route(Route::new(99, host_prefix(3)));
    let del = nl.delete_route(Route::new(99, host_prefix(2)));

    d1.await.unwrap();
    d2.await.unwrap();
    d3.await.unwrap();
    del.await.unwrap();

    let dests: Vec<RouteDestination> = nl
        .get_routes(RouteFilter::default())
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.destination)
        .collect();
    assert_eq!(dests, vec![host_prefix(1), host_prefix(3)]);
}

#[tokio::test]
async fn dropped_future_does_not_cancel_the_operation() {
    let nl = SimNetlink::spawn();

    // caller "times out": the future is dropped without being awaited
    drop(nl.add_route(Route::new(99, host_prefix(7))));

    // a read scheduled afterwards still observes the write
    let routes = nl.get_routes(RouteFilter::protocol(99)).await.unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].destination, host_prefix(7));
}

#[tokio::test]
async fn neighbors_are_contractually_empty() {
    let nl = SimNetlink::spawn();
    nl.add_link(Link::new(0, "vethTestX")).await.unwrap();
    nl.add_if_address(IfAddress::new(0, net("10.0.0.1/24")))
        .await
        .unwrap();
    nl.add_route(Route::new(99, host_prefix(1))).await.unwrap();

    assert!(nl.get_all_neighbors().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_a_total_order() {
    let nl = SimNetlink::spawn();
    nl.add_link(Link::new(1, "vethTestY")).await.unwrap();

    // 8 tasks, each installing 50 routes under its own protocol id
    let mut tasks = Vec::new();
    for proto in 0..8u8 {
        let nl = nl.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..50u128 {
                let route = Route::new(100 + proto, host_prefix(i))
                    .with_next_hops(next_hops_over(1, 1));
                nl.add_route(route).await.unwrap();
            }
            // this task's reads see all of this task's writes
            let mine = nl.get_routes(RouteFilter::protocol(100 + proto)).await.unwrap();
            assert_eq!(mine.len(), 50);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(nl.get_routes(RouteFilter::default()).await.unwrap().len(), 400);
}

#[tokio::test]
async fn fib_benchmark_scenario() {
    const ROUTES: u128 = 1000;
    const NEXT_HOPS: usize = 128;

    let nl = SimNetlink::spawn();
    nl.add_link(Link::new(0, "vethTestX")).await.unwrap();
    nl.add_link(Link::new(1, "vethTestY")).await.unwrap();

    // issue the whole batch, then await completion
    let pending: Vec<_> = (0..ROUTES)
        .map(|i| {
            nl.add_route(
                Route::new(99, host_prefix(i)).with_next_hops(next_hops_over(1, NEXT_HOPS)),
            )
        })
        .collect();
    for fut in pending {
        fut.await.unwrap();
    }

    let routes = nl.get_routes(RouteFilter::default()).await.unwrap();
    assert_eq!(routes.len(), ROUTES as usize);
    assert!(routes.iter().all(|r| r.next_hops.len() == NEXT_HOPS));

    let pending: Vec<_> = (0..ROUTES)
        .map(|i| nl.delete_route(Route::new(99, host_prefix(i))))
        .collect();
    for fut in pending {
        fut.await.unwrap();
    }
    assert!(nl.get_routes(RouteFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn trait_object_backend_selection() {
    // assembling code picks the backend behind a trait object
    let nl: Box<dyn netlink_sim::NetlinkSocket> = Box::new(SimNetlink::spawn());
    nl.init().await.unwrap();
    nl.add_link(Link::new(0, "vethTestX")).await.unwrap();
    assert_eq!(nl.get_all_links().await.unwrap().len(), 1);
}
