//! Behavioural tests for `RoadNetwork` routing using rstest-bdd.

use std::cell::RefCell;

use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use waypost_core::{
    NoRouteError, RoadNetwork, RouteOutcome, RoutingConfig, RoutingService,
    routing::VertexId, test_support::grid_network,
};

const SOUTH_WEST: Coord<f64> = Coord { x: 0.0, y: 0.0 };
const NORTH_EAST: Coord<f64> = Coord { x: 0.02, y: 0.02 };

#[derive(Debug, Default)]
struct RoutingWorld {
    network: RefCell<Option<RoadNetwork>>,
    config: RefCell<RoutingConfig>,
    outcome: RefCell<Option<Result<RouteOutcome, NoRouteError>>>,
}

impl RoutingWorld {
    fn route(&self, from: Coord<f64>, to: Coord<f64>) {
        let guard = self.network.borrow();
        let network = guard.as_ref().expect("network should be initialised");
        let outcome = network.route(from, to, &self.config.borrow());
        self.outcome.replace(Some(outcome));
    }

    fn found(&self) -> RouteOutcome {
        self.outcome
            .borrow()
            .clone()
            .expect("a route should have been attempted")
            .expect("routing should succeed")
    }
}

#[fixture]
fn world() -> RoutingWorld {
    RoutingWorld::default()
}

#[given("a three by three grid network")]
fn given_grid(world: &RoutingWorld) {
    let network = grid_network(3, 3, 0.01).expect("valid grid");
    world.network.replace(Some(network));
}

#[given("an empty road network")]
fn given_empty(world: &RoutingWorld) {
    world.network.replace(Some(RoadNetwork::empty()));
}

#[given("routing ignores edge direction")]
fn given_undirected(world: &RoutingWorld) {
    world.config.replace(RoutingConfig::undirected());
}

#[when("I route from the south west corner to the north east corner")]
fn route_north_east(world: &RoutingWorld) {
    world.route(SOUTH_WEST, NORTH_EAST);
}

#[when("I route from the north east corner to the south west corner")]
fn route_south_west(world: &RoutingWorld) {
    world.route(NORTH_EAST, SOUTH_WEST);
}

#[then("the route costs 4")]
fn then_cost_four(world: &RoutingWorld) {
    assert_eq!(world.found().total_cost(), Some(4.0));
}

#[then("the route starts at vertex 1 and ends at vertex 9")]
fn then_endpoints(world: &RoutingWorld) {
    let outcome = world.found();
    let steps = outcome.steps().expect("a path");
    assert_eq!(steps.first().map(|s| s.node), Some(VertexId(1)));
    assert_eq!(steps.last().map(|s| s.node), Some(VertexId(9)));
    assert!(
        steps.windows(2).all(|pair| match pair {
            [a, b] => a.agg_cost <= b.agg_cost && b.seq == a.seq + 1,
            _ => true,
        }),
        "aggregate cost must not decrease along the path"
    );
}

#[then("no path is found")]
fn then_no_path(world: &RoutingWorld) {
    assert_eq!(world.found(), RouteOutcome::NoPath);
}

#[then("routing fails because the network is empty")]
fn then_empty_graph(world: &RoutingWorld) {
    let outcome = world.outcome.borrow();
    assert_eq!(outcome.as_ref(), Some(&Err(NoRouteError::EmptyGraph)));
}

#[scenario(path = "tests/features/routing.feature", index = 0)]
fn cheapest_route(world: RoutingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/routing.feature", index = 1)]
fn directed_edges(world: RoutingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/routing.feature", index = 2)]
fn undirected_edges(world: RoutingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/routing.feature", index = 3)]
fn empty_network(world: RoutingWorld) {
    let _ = world;
}
