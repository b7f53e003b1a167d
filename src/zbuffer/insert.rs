use crate::color::Rgba;
use crate::error::RasterError;
use crate::math::{
    compute_normal, compute_plane, compute_z, ClipRect, Plane, DEPTH_SCALE, SAME_PIXEL_LIMIT,
    ZERO_LIMIT,
};
use crate::scene::{Face, Geometry};
use crate::texture::TextureSet;
use crate::vec::{Vec2, Vec3};

use super::edge::Edge;
use super::polygon::Polygon;
use super::ZBufferScanLine;

/// A polygon corner in screen space: pixel x and y, reciprocal depth in z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVertex {
    pub position: Vec3,
    pub tex_coord: Vec2,
}

impl ScreenVertex {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        ScreenVertex {
            position: Vec3::from([x, y, z]),
            tex_coord: Vec2::zero(),
        }
    }

    pub fn with_tex_coord(mut self, u: f32, v: f32) -> Self {
        self.tex_coord = Vec2::from([u, v]);
        self
    }

    fn xy(&self) -> Vec2 {
        self.position.xy()
    }
}

/// `tex * z` is affine in screen space, so three vertices determine it everywhere on the plane.
struct TexInterpolator {
    origin: Vec2,
    e1: Vec2,
    e2: Vec2,
    q: [Vec2; 3],
    denom: f32,
}

fn cross2(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

impl TexInterpolator {
    fn fit(a: &ScreenVertex, b: &ScreenVertex, c: &ScreenVertex) -> Self {
        let origin = a.xy();
        let e1 = b.xy() - origin;
        let e2 = c.xy() - origin;
        TexInterpolator {
            origin,
            e1,
            e2,
            q: [a, b, c].map(|v| v.tex_coord * v.position.z),
            denom: cross2(e1, e2),
        }
    }

    /// Texture coordinate at `p`, whose reciprocal depth is `z`.
    fn at(&self, p: Vec2, z: f32) -> Option<Vec2> {
        if self.denom.abs() < f32::EPSILON || z == 0.0 {
            return None;
        }
        let d = p - self.origin;
        let l1 = cross2(d, self.e2) / self.denom;
        let l2 = cross2(self.e1, d) / self.denom;
        let l0 = 1.0 - l1 - l2;
        Some((self.q[0] * l0 + self.q[1] * l1 + self.q[2] * l2) / z)
    }
}

/// Depth at a point moved by clipping. Falls back to the segment when the plane is edge-on.
fn depth_at(plane: Plane, p: Vec2, a: &ScreenVertex, b: &ScreenVertex) -> f32 {
    if plane.z.abs() >= ZERO_LIMIT {
        return compute_z(plane, p.x, p.y);
    }
    let full = (b.xy() - a.xy()).mag();
    let f = if full > 0.0 { (p - a.xy()).mag() / full } else { 0.0 };
    a.position.z + (b.position.z - a.position.z) * f
}

/// Clips the segment `a -> b` to the viewport. Moved endpoints get their depth from the plane and
/// their texture coordinate from the distance along the original segment.
fn clip_edge(
    a: &ScreenVertex,
    b: &ScreenVertex,
    plane: Plane,
    rect: &ClipRect,
    textured: bool,
) -> Option<(ScreenVertex, ScreenVertex)> {
    let (p1, p2) = rect.clip_segment(a.xy(), b.xy())?;
    let full = (b.xy() - a.xy()).mag();

    let moved = |p: Vec2, original: &ScreenVertex| {
        if p == original.xy() {
            return *original;
        }
        let z = depth_at(plane, p, a, b);
        let tex_coord = if textured && full > 0.0 && z != 0.0 {
            let f = (p - a.xy()).mag() / full;
            let qa = a.tex_coord * a.position.z;
            let qb = b.tex_coord * b.position.z;
            (qa + (qb - qa) * f) / z
        } else {
            original.tex_coord
        };
        ScreenVertex {
            position: Vec3::from([p.x, p.y, z]),
            tex_coord,
        }
    };

    Some((moved(p1, a), moved(p2, b)))
}

/// Collects the edges of one polygon while its clipped boundary is walked.
struct Outline<'a> {
    rect: ClipRect,
    plane: Plane,
    tex: Option<&'a TexInterpolator>,
    counter_clockwise: bool,
    first: Option<ScreenVertex>,
    last_end: Option<ScreenVertex>,
    edges: Vec<Edge>,
    top: i32,
    bottom: i32,
    malformed: usize,
}

impl<'a> Outline<'a> {
    fn new(rect: ClipRect, plane: Plane, tex: Option<&'a TexInterpolator>, counter_clockwise: bool) -> Self {
        Outline {
            rect,
            plane,
            tex,
            counter_clockwise,
            first: None,
            last_end: None,
            edges: Vec::new(),
            top: -1,
            bottom: i32::MAX,
            malformed: 0,
        }
    }

    fn push_segment(&mut self, start: ScreenVertex, end: ScreenVertex) {
        match self.last_end {
            None => self.first = Some(start),
            Some(last_end) => self.bridge(last_end, start),
        }
        self.add_edge(start, end);
        self.last_end = Some(end);
    }

    fn close(&mut self) {
        if let (Some(last_end), Some(first)) = (self.last_end, self.first) {
            self.bridge(last_end, first);
        }
    }

    /// Joins two boundary points left apart by clipping, following the viewport border.
    fn bridge(&mut self, from: ScreenVertex, to: ScreenVertex) {
        if (to.xy() - from.xy()).mag() <= SAME_PIXEL_LIMIT {
            return;
        }
        let mut prev = from;
        for corner in self.rect.corners_between(from.xy(), to.xy(), self.counter_clockwise) {
            let vertex = self.corner_vertex(corner, &from, &to);
            self.add_edge(prev, vertex);
            prev = vertex;
        }
        self.add_edge(prev, to);
    }

    fn corner_vertex(&self, corner: Vec2, from: &ScreenVertex, to: &ScreenVertex) -> ScreenVertex {
        let z = depth_at(self.plane, corner, from, to);
        let tex_coord = self
            .tex
            .and_then(|tex| tex.at(corner, z))
            .unwrap_or(from.tex_coord);
        ScreenVertex {
            position: Vec3::from([corner.x, corner.y, z]),
            tex_coord,
        }
    }

    fn add_edge(&mut self, mut p1: ScreenVertex, mut p2: ScreenVertex) {
        for p in [&mut p1, &mut p2] {
            let xy = p.xy();
            if !self.rect.contains(xy) {
                log::warn!("edge endpoint ({}, {}) lies outside the viewport, clamping", xy.x, xy.y);
                self.malformed += 1;
                let clamped = self.rect.clamp(xy);
                p.position.x = clamped.x;
                p.position.y = clamped.y;
            }
        }

        let tex = self.tex.map(|_| [p1.tex_coord, p2.tex_coord]);
        let edge = Edge::new(p1.position, p2.position, tex);
        self.top = self.top.max(edge.y as i32);
        self.bottom = self.bottom.min(edge.bottom());
        self.edges.push(edge);
    }
}

impl ZBufferScanLine {
    /// Projects `face` of `geometry` with the current MVP matrix and records it for the next
    /// [`ZBufferScanLine::draw`]. Faces behind the eye, facing away or outside the viewport are
    /// dropped silently.
    pub fn insert_polygon(
        &mut self,
        face: &Face,
        geometry: &Geometry,
        use_texture: bool,
    ) -> Result<(), RasterError> {
        if face.indices.len() < 3 {
            return Err(RasterError::InvalidFace(format!(
                "a face needs at least 3 vertices, got {}",
                face.indices.len()
            )));
        }
        if let Some(&index) = face.indices.iter().find(|&&i| i >= geometry.vertices.len()) {
            return Err(RasterError::InvalidFace(format!(
                "vertex index {index} out of range for {} vertices",
                geometry.vertices.len()
            )));
        }

        let (max_x, max_y) = (self.rect.max_x, self.rect.max_y);
        let mut projected = Vec::with_capacity(face.indices.len());
        let mut beyond_far = 0;
        for &index in &face.indices {
            let vertex = &geometry.vertices[index];
            let clip = self.mvp * vertex.position.to_hom();
            if !(clip.w >= self.near) || !clip.to_array().iter().all(|c| c.is_finite()) {
                self.metrics.behind_culled += 1;
                return Ok(());
            }
            if clip.w > self.far {
                beyond_far += 1;
            }
            let ndc = clip.xyz() / clip.w;
            projected.push(ScreenVertex {
                position: Vec3::from([
                    (ndc.x + 0.5) * max_x,
                    (ndc.y + 0.5) * max_y,
                    DEPTH_SCALE / clip.w,
                ]),
                tex_coord: vertex.tex_coord,
            });
        }
        if beyond_far == projected.len() {
            self.metrics.behind_culled += 1;
            return Ok(());
        }

        let textures = use_texture.then(|| geometry.textures.clone());
        let color = geometry.vertices[face.indices[0]].color;
        self.insert_screen_polygon(&projected, color, textures)
    }

    /// Records a polygon given directly in screen space. `textures` selects textured filling;
    /// an empty set fills with `color` instead.
    pub fn insert_screen_polygon(
        &mut self,
        vertices: &[ScreenVertex],
        color: Rgba,
        textures: Option<TextureSet>,
    ) -> Result<(), RasterError> {
        let [a, b, c, ..] = vertices else {
            return Err(RasterError::InvalidFace(format!(
                "a face needs at least 3 vertices, got {}",
                vertices.len()
            )));
        };

        let normal = compute_normal(a.position, b.position, c.position);
        // Also rejects degenerate faces, whose normal is NaN.
        if !(normal.dot(self.view_dir) >= ZERO_LIMIT) {
            self.metrics.backfaces_culled += 1;
            return Ok(());
        }

        let plane = compute_plane(normal, a.position);
        let textures = textures.filter(|set| !set.is_empty());
        let tex = textures.as_ref().map(|_| TexInterpolator::fit(a, b, c));

        let mut outline = Outline::new(self.rect, plane, tex.as_ref(), normal.z > 0.0);
        for (i, start) in vertices.iter().enumerate() {
            let end = &vertices[(i + 1) % vertices.len()];
            if let Some((p1, p2)) = clip_edge(start, end, plane, &self.rect, tex.is_some()) {
                outline.push_segment(p1, p2);
            }
        }
        outline.close();

        let Outline {
            edges,
            top,
            bottom,
            malformed,
            ..
        } = outline;
        self.metrics.malformed_edges += malformed;

        if edges.is_empty() || top < 0 {
            self.metrics.clipped_away += 1;
            return Ok(());
        }

        self.metrics.edges_generated += edges.len();
        let edges = edges.into_iter().map(|edge| self.edges.alloc(edge)).collect();
        let id = self.polygons.alloc(Polygon {
            plane,
            color,
            dy: top - bottom + 1,
            edges,
            unpaired: Vec::new(),
            textures,
        });
        self.polygon_table[top as usize].push(id);
        self.num_polygons += 1;
        self.metrics.polygons_inserted += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec::Vec4;

    #[test]
    fn clipped_endpoint_takes_plane_depth() {
        let rect = ClipRect::new(64, 64);
        let a = ScreenVertex::new(10., 10., 1.);
        let b = ScreenVertex::new(640., 10., 1.);
        let plane = compute_plane(Vec3::from([0., 0., 1.]), a.position);
        let (p1, p2) = clip_edge(&a, &b, plane, &rect, false).unwrap();
        assert_eq!(p1, a);
        assert_eq!(p2.position.to_array(), [63., 10., 1.]);
    }

    #[test]
    fn clipped_texture_coordinate_is_perspective_correct() {
        let rect = ClipRect::new(11, 11);
        let a = ScreenVertex::new(0., 5., 1.).with_tex_coord(0., 0.);
        let b = ScreenVertex::new(20., 5., 3.).with_tex_coord(1., 0.);
        // z = 1 + x / 10
        let plane = Vec4::from([-0.1, 0., 1., -1.]);
        let (p1, p2) = clip_edge(&a, &b, plane, &rect, true).unwrap();
        assert_eq!(p1, a);
        assert_eq!(p2.position.x, 10.);
        assert!((p2.position.z - 2.).abs() < 1e-5);
        // Halfway across the screen is three quarters of the way in texture space.
        assert!((p2.tex_coord.x - 0.75).abs() < 1e-5);
    }

    #[test]
    fn bridge_passes_through_corners() {
        let rect = ClipRect::new(11, 11);
        let plane = compute_plane(Vec3::from([0., 0., 1.]), Vec3::from([0., 0., 1.]));
        let mut outline = Outline::new(rect, plane, None, true);
        outline.bridge(ScreenVertex::new(5., 0., 1.), ScreenVertex::new(10., 5., 1.));
        assert_eq!(outline.edges.len(), 2);
        assert_eq!((outline.top, outline.bottom), (5, 0));

        let mut outline = Outline::new(rect, plane, None, true);
        outline.bridge(ScreenVertex::new(5., 5.2, 1.), ScreenVertex::new(5., 5.5, 1.));
        assert!(outline.edges.is_empty());
    }

    #[test]
    fn interpolator_recovers_vertex_coordinates() {
        let a = ScreenVertex::new(0., 0., 1.).with_tex_coord(0., 0.);
        let b = ScreenVertex::new(10., 0., 2.).with_tex_coord(1., 0.);
        let c = ScreenVertex::new(0., 10., 4.).with_tex_coord(0., 1.);
        let tex = TexInterpolator::fit(&a, &b, &c);
        let at_c = tex.at(c.xy(), 4.).unwrap();
        assert!((at_c - c.tex_coord).mag() < 1e-6);
        let at_b = tex.at(b.xy(), 2.).unwrap();
        assert!((at_b - b.tex_coord).mag() < 1e-6);
    }
}
