use crate::color::PixelFormat;
use crate::math::SAME_PIXEL_LIMIT;
use crate::texture::sample_average;
use crate::Pixel;

use super::arena::{Arena, Id};
use super::edge::Edge;
use super::polygon::{ActiveEdgePair, Polygon};
use super::Metrics;

/// Scratch state for the row being drawn.
pub(super) struct Scanline<'a> {
    pub depth: &'a mut [f32],
    pub pixels: &'a mut [Pixel],
    pub format: PixelFormat,
    pub metrics: &'a mut Metrics,
}

/// Removes and returns an unpaired edge whose x is within a pixel of `x`.
fn take_continuation(unpaired: &mut Vec<Id<Edge>>, edges: &Arena<Edge>, x: f32) -> Option<Id<Edge>> {
    let pos = unpaired
        .iter()
        .position(|&id| (edges[id].x - x).abs() < SAME_PIXEL_LIMIT)?;
    Some(unpaired.remove(pos))
}

/// Column span `[start, end]` covered by the pair on this row, clamped to the row. Only pixels
/// whose centers lie between the two edges are covered.
fn span(pair: &ActiveEdgePair, edges: &Arena<Edge>, width: usize) -> Option<(usize, usize)> {
    if width == 0 {
        return None;
    }
    let start = edges[pair.left].x.ceil() as i64;
    let end = edges[pair.right].x.floor() as i64;
    let max = width as i64 - 1;
    if start > end || end < 0 || start > max {
        return None;
    }
    if start < 0 || end > max {
        log::debug!("span [{start}, {end}] exceeds the row, clamping");
    }
    Some((start.max(0) as usize, end.min(max) as usize))
}

/// Fills the pair's span on the current row, then steps it to the next row, splicing in
/// continuation edges from the polygon's unpaired pool where one side ran out.
pub(super) fn draw_edge_pair(
    pair: &mut ActiveEdgePair,
    edges: &mut Arena<Edge>,
    polygon: &mut Polygon,
    line: &mut Scanline,
) {
    let textures = polygon.textures.as_deref().filter(|set| !set.is_empty());

    if let Some((start, end)) = span(pair, edges, line.pixels.len()) {
        let n = (end - start + 1) as f32;
        let z_end = pair.z_l + pair.dz_x * n;
        let dtex = (pair.t_r * z_end - pair.t_l * pair.z_l) / n;

        let mut z_x = pair.z_l;
        let mut t_x = pair.t_l;
        for x in start..=end {
            if z_x > line.depth[x] {
                line.depth[x] = z_x;
                let color = textures
                    .and_then(|set| sample_average(set, t_x))
                    .unwrap_or(polygon.color);
                line.pixels[x] = line.format.encode(color);
                line.metrics.pixels_written += 1;
            }

            let z_prev = z_x;
            z_x += pair.dz_x;
            if textures.is_some() {
                t_x = (t_x * z_prev + dtex) / z_x;
            }
        }
    }

    let textured = textures.is_some();

    let (z_l_prev, z_r_prev) = (pair.z_l, pair.z_r);
    let (t_l_prev, t_r_prev) = (pair.t_l, pair.t_r);
    pair.z_l += pair.dz_x * edges[pair.left].dx() + pair.dz_y;
    pair.z_r += pair.dz_x * edges[pair.right].dx() + pair.dz_y;
    if textured {
        pair.t_l = (pair.t_l * z_l_prev + edges[pair.left].dtex) / pair.z_l;
        pair.t_r = (pair.t_r * z_r_prev + edges[pair.right].dtex) / pair.z_r;
    }

    let mut left_advanced = edges[pair.left].advance();
    let right_advanced = edges[pair.right].advance();

    if edges[pair.left].dy <= 0 && edges[pair.right].dy >= 0 {
        let x = edges[pair.left].x;
        if let Some(next) = take_continuation(&mut polygon.unpaired, edges, x) {
            log::trace!("left edge continues with {next:?}");
            pair.left = next;
            pair.z_l = edges[next].z;
            pair.t_l = edges[next].tex;
            left_advanced = false;
            // The other side already moved to the next row.
            if right_advanced {
                edges[pair.right].retreat();
                pair.z_r = z_r_prev;
                pair.t_r = t_r_prev;
            }
        }
    }

    if edges[pair.right].dy <= 0 && edges[pair.left].dy >= 0 {
        let x = edges[pair.right].x;
        if let Some(next) = take_continuation(&mut polygon.unpaired, edges, x) {
            log::trace!("right edge continues with {next:?}");
            pair.right = next;
            pair.z_r = edges[next].z;
            pair.t_r = edges[next].tex;
            if left_advanced {
                edges[pair.left].retreat();
                pair.z_l = z_l_prev;
                pair.t_l = t_l_prev;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::color::Rgba;
    use crate::texture::Texture;
    use crate::vec::{Vec2, Vec3, Vec4};

    const WIDTH: usize = 32;

    fn p(x: f32, y: f32, z: f32) -> Vec3 {
        Vec3::from([x, y, z])
    }

    fn tex() -> Option<[Vec2; 2]> {
        Some([Vec2::from([0., 1.]), Vec2::from([0., 0.])])
    }

    fn polygon(edges: Vec<Id<Edge>>, unpaired: Vec<Id<Edge>>) -> Polygon {
        Polygon {
            // Depth grows by one per row down and is flat across a row.
            plane: Vec4::from([0., 1., 1., -21.]),
            color: Rgba::WHITE,
            dy: 20,
            edges,
            unpaired,
            textures: Some(Rc::from(vec![Texture::new(1, 1, vec![Rgba::WHITE]).unwrap()])),
        }
    }

    #[test]
    fn exhausted_right_edge_continues_and_left_rolls_back() {
        let mut edges = Arena::new();
        let l = edges.alloc(Edge::new(p(10., 20., 1.), p(0., 1., 20.), tex()));
        let r = edges.alloc(Edge::new(p(20., 20., 1.), p(24., 19., 2.), tex()));
        let next = edges.alloc(Edge::new(p(24., 18., 3.), p(30., 10., 11.), tex()));

        let mut polygons = Arena::new();
        let id = polygons.alloc(polygon(vec![l, r, next], vec![next]));
        let mut pair = ActiveEdgePair::new(l, r, &edges, id, &polygons[id]);

        let mut depth = vec![0.0; WIDTH];
        let mut pixels = vec![[0; 4]; WIDTH];
        let mut metrics = Metrics::new();
        let mut line = Scanline {
            depth: &mut depth,
            pixels: &mut pixels,
            format: PixelFormat::Rgba,
            metrics: &mut metrics,
        };

        draw_edge_pair(&mut pair, &mut edges, &mut polygons[id], &mut line);
        assert_eq!(line.metrics.pixels_written, 11);
        assert_eq!(pair.right, r);
        let (z_l, t_l) = (pair.z_l, pair.t_l);
        let (dy, x) = (edges[l].dy, edges[l].x);
        assert_eq!((z_l, dy, x), (2., 19, 9.5));

        // The right edge runs out on this row and `next` starts where it ended.
        draw_edge_pair(&mut pair, &mut edges, &mut polygons[id], &mut line);
        assert_eq!(pair.right, next);
        assert_eq!(pair.z_r, 3.);
        assert_eq!(pair.t_r, edges[next].tex);
        assert_eq!((pair.z_l, pair.t_l), (z_l, t_l));
        assert_eq!((edges[l].dy, edges[l].x), (dy, x));
        assert!(polygons[id].unpaired.is_empty());
    }

    #[test]
    fn span_covers_pixel_centers_between_edges() {
        let mut edges = Arena::new();
        let l = edges.alloc(Edge::new(p(10.2, 5., 1.), p(10.2, 0., 1.), None));
        let r = edges.alloc(Edge::new(p(12.8, 5., 1.), p(12.8, 0., 1.), None));
        let wide_l = edges.alloc(Edge::new(p(-3.5, 5., 1.), p(-3.5, 0., 1.), None));
        let wide_r = edges.alloc(Edge::new(p(40.2, 5., 1.), p(40.2, 0., 1.), None));
        let thin_r = edges.alloc(Edge::new(p(10.7, 5., 1.), p(10.7, 0., 1.), None));

        let mut polygons = Arena::new();
        let id = polygons.alloc(polygon(vec![l, r], Vec::new()));
        let pair = |left, right| ActiveEdgePair::new(left, right, &edges, id, &polygons[id]);

        assert_eq!(span(&pair(l, r), &edges, WIDTH), Some((11, 12)));
        assert_eq!(span(&pair(wide_l, wide_r), &edges, WIDTH), Some((0, WIDTH - 1)));
        assert_eq!(span(&pair(l, thin_r), &edges, WIDTH), None);
        assert_eq!(span(&pair(l, r), &edges, 0), None);
    }
}
