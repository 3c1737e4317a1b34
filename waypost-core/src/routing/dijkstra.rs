//! Single-pair Dijkstra over the adjacency lists of a [`Graph`].

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use super::graph::{EdgeId, Graph};

/// Predecessor of a settled slot: previous slot, edge taken and its cost.
type Link = (usize, EdgeId, f64);

/// Result of a search: the visited slots in path order with the edge that
/// reached each one, plus how many slots were settled.
pub(crate) struct Search {
    pub(crate) path: Option<Vec<(usize, Option<(EdgeId, f64)>, f64)>>,
    pub(crate) settled: usize,
}

/// Run Dijkstra from `start` to `end`.
///
/// The queue orders by accumulated cost, then by slot, so equal-cost
/// frontiers expand the lower vertex id first. `undirected` also walks the
/// reverse adjacency.
pub(crate) fn shortest_path(graph: &Graph, start: usize, end: usize, undirected: bool) -> Search {
    let size = graph.vertices.len();
    let mut best = vec![f64::INFINITY; size];
    let mut links: Vec<Option<Link>> = vec![None; size];
    let mut settled = vec![false; size];
    let mut settled_count = 0_usize;
    let mut queue = BinaryHeap::new();

    if let Some(slot) = best.get_mut(start) {
        *slot = 0.0;
        queue.push(Reverse((OrderedFloat(0.0), start)));
    }

    while let Some(Reverse((OrderedFloat(cost), slot))) = queue.pop() {
        match settled.get_mut(slot) {
            Some(done) if !*done => *done = true,
            _ => continue,
        }
        settled_count += 1;
        if slot == end {
            return Search {
                path: Some(unwind(&links, &best, start, end)),
                settled: settled_count,
            };
        }

        let forward = graph.forward.get(slot).into_iter().flatten();
        let backward = graph
            .reverse
            .get(slot)
            .into_iter()
            .flatten()
            .filter(|_| undirected);
        for arc in forward.chain(backward) {
            let candidate = cost + arc.cost;
            let Some(current) = best.get_mut(arc.to) else {
                continue;
            };
            if candidate < *current {
                *current = candidate;
                if let Some(link) = links.get_mut(arc.to) {
                    *link = Some((slot, arc.edge, arc.cost));
                }
                queue.push(Reverse((OrderedFloat(candidate), arc.to)));
            }
        }
    }

    Search {
        path: None,
        settled: settled_count,
    }
}

fn unwind(
    links: &[Option<Link>],
    best: &[f64],
    start: usize,
    end: usize,
) -> Vec<(usize, Option<(EdgeId, f64)>, f64)> {
    let mut reversed = Vec::new();
    let mut slot = end;
    while slot != start {
        let Some(Some((previous, edge, cost))) = links.get(slot).copied() else {
            break;
        };
        let total = best.get(slot).copied().unwrap_or(f64::INFINITY);
        reversed.push((slot, Some((edge, cost)), total));
        slot = previous;
    }
    reversed.push((start, None, 0.0));
    reversed.reverse();
    reversed
}
