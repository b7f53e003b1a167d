use crate::math::{SAME_PIXEL_LIMIT, ZERO_LIMIT};

use super::arena::{Arena, Id};
use super::edge::{Edge, EdgeStep};
use super::polygon::{ActiveEdgePair, Polygon};
use super::Metrics;

enum Pairing {
    Pair(Id<Edge>, Id<Edge>),
    Single(Id<Edge>),
    Discarded,
}

/// Removes and returns the first candidate starting within a pixel of `x`.
fn take_near(candidates: &mut Vec<Id<Edge>>, edges: &Arena<Edge>, x: f32) -> Option<Id<Edge>> {
    let pos = candidates
        .iter()
        .position(|&id| (edges[id].x - x).abs() < SAME_PIXEL_LIMIT)?;
    Some(candidates.remove(pos))
}

/// Looks for the partner of `first`. Horizontal edges met on the way are dropped and the search
/// continues from their far end.
fn find_partner(first: Id<Edge>, candidates: &mut Vec<Id<Edge>>, edges: &Arena<Edge>) -> Pairing {
    let mut current = first;
    let mut x = edges[first].x;
    loop {
        let mut left = current;
        let mut right = take_near(candidates, edges, x);
        if let Some(found) = right {
            if edges[found].is_horizontal() {
                right = Some(left);
                left = found;
            }
        }

        match edges[left].step {
            EdgeStep::Horizontal(end_x) => {
                log::trace!("dropping horizontal edge {left:?}, searching from x = {end_x}");
                x = end_x;
                match right {
                    Some(next) => current = next,
                    None => return Pairing::Discarded,
                }
            }
            EdgeStep::Sloped(_) => {
                return match right {
                    Some(right) => Pairing::Pair(left, right),
                    None => Pairing::Single(left),
                }
            }
        }
    }
}

/// Orders two edges by x, breaking ties by slope.
fn order(a: Id<Edge>, b: Id<Edge>, edges: &Arena<Edge>) -> (Id<Edge>, Id<Edge>) {
    let (ea, eb) = (&edges[a], &edges[b]);
    let swap = ea.x > eb.x + ZERO_LIMIT || ((ea.x - eb.x).abs() < ZERO_LIMIT && ea.dx() > eb.dx());
    if swap {
        (b, a)
    } else {
        (a, b)
    }
}

/// Pairs up the edges of `polygon_id` that start on `row`, appending the new pairs to `pairs`.
pub(super) fn insert_active_edge_pairs(
    row: usize,
    polygon_id: Id<Polygon>,
    polygons: &mut Arena<Polygon>,
    edges: &Arena<Edge>,
    pairs: &mut Vec<ActiveEdgePair>,
    metrics: &mut Metrics,
) {
    let polygon = &mut polygons[polygon_id];

    let mut starting: Vec<Id<Edge>> = polygon
        .edges
        .iter()
        .copied()
        .filter(|&id| edges[id].y == row)
        .collect();
    // Descending, so popping yields the leftmost edge.
    starting.sort_by(|&a, &b| edges[b].x.total_cmp(&edges[a].x));

    while let Some(first) = starting.pop() {
        let (left, right) = match find_partner(first, &mut starting, edges) {
            Pairing::Discarded => continue,
            Pairing::Pair(left, right) => (left, right),
            Pairing::Single(left) => {
                let claimed = polygon
                    .unpaired
                    .iter()
                    .position(|&id| edges[id].y == edges[left].y);
                match claimed {
                    Some(pos) => (left, polygon.unpaired.remove(pos)),
                    None => {
                        log::trace!("edge {left:?} on row {row} has no partner yet");
                        polygon.unpaired.push(left);
                        continue;
                    }
                }
            }
        };

        let (left, right) = order(left, right, edges);
        pairs.push(ActiveEdgePair::new(left, right, edges, polygon_id, polygon));
        metrics.edge_pairs += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::vec::{Vec3, Vec4};

    fn edge(edges: &mut Arena<Edge>, a: [f32; 2], b: [f32; 2]) -> Id<Edge> {
        edges.alloc(Edge::new(
            Vec3::from([a[0], a[1], 1.]),
            Vec3::from([b[0], b[1], 1.]),
            None,
        ))
    }

    fn polygon(polygons: &mut Arena<Polygon>, edge_ids: Vec<Id<Edge>>) -> Id<Polygon> {
        polygons.alloc(Polygon {
            plane: Vec4::from([0., 0., 1., -1.]),
            color: Rgba::WHITE,
            dy: 41,
            edges: edge_ids,
            unpaired: Vec::new(),
            textures: None,
        })
    }

    #[test]
    fn apex_edges_pair_left_to_right() {
        let mut edges = Arena::new();
        let mut polygons = Arena::new();
        let flat = edge(&mut edges, [10., 10.], [50., 10.]);
        let right = edge(&mut edges, [50., 10.], [30., 40.]);
        let left = edge(&mut edges, [30., 40.], [10., 10.]);
        let id = polygon(&mut polygons, vec![flat, right, left]);

        let mut pairs = Vec::new();
        let mut metrics = Metrics::new();
        insert_active_edge_pairs(40, id, &mut polygons, &edges, &mut pairs, &mut metrics);
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].left, pairs[0].right), (left, right));

        // The flat bottom only steers pairing and never forms a pair.
        pairs.clear();
        insert_active_edge_pairs(10, id, &mut polygons, &edges, &mut pairs, &mut metrics);
        assert!(pairs.is_empty());
        assert!(polygons[id].unpaired.is_empty());
        assert_eq!(metrics.edge_pairs, 1);
    }

    #[test]
    fn flat_top_pairs_across_horizontal_edge() {
        let mut edges = Arena::new();
        let mut polygons = Arena::new();
        let right = edge(&mut edges, [30., 10.], [50., 40.]);
        let top = edge(&mut edges, [50., 40.], [10., 40.]);
        let left = edge(&mut edges, [10., 40.], [30., 10.]);
        let id = polygon(&mut polygons, vec![right, top, left]);

        let mut pairs = Vec::new();
        insert_active_edge_pairs(40, id, &mut polygons, &edges, &mut pairs, &mut Metrics::new());
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].left, pairs[0].right), (left, right));
        assert!(polygons[id].unpaired.is_empty());
    }

    #[test]
    fn lonely_edge_waits_in_pool() {
        let mut edges = Arena::new();
        let mut polygons = Arena::new();
        let lonely = edge(&mut edges, [10., 30.], [20., 10.]);
        let id = polygon(&mut polygons, vec![lonely]);

        let mut pairs = Vec::new();
        insert_active_edge_pairs(30, id, &mut polygons, &edges, &mut pairs, &mut Metrics::new());
        assert!(pairs.is_empty());
        assert_eq!(polygons[id].unpaired, vec![lonely]);
    }

    #[test]
    fn depth_steps_follow_plane() {
        let mut edges = Arena::new();
        let mut polygons = Arena::new();
        let a = edge(&mut edges, [10., 20.], [10., 0.]);
        let b = edge(&mut edges, [10., 20.], [30., 0.]);
        let id = polygon(&mut polygons, vec![a, b]);
        polygons[id].plane = Vec4::from([1., 2., 4., 0.]);

        let mut pairs = Vec::new();
        insert_active_edge_pairs(20, id, &mut polygons, &edges, &mut pairs, &mut Metrics::new());
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].left, pairs[0].right), (a, b));
        assert_eq!((pairs[0].dz_x, pairs[0].dz_y), (-0.25, 0.5));
    }
}
