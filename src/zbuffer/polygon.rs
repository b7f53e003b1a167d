use crate::color::Rgba;
use crate::math::{Plane, ZERO_LIMIT};
use crate::texture::TextureSet;
use crate::vec::Vec2;

use super::arena::{Arena, Id};
use super::edge::Edge;

/// A face after projection and clipping, ready to be scan converted.
pub struct Polygon {
    pub plane: Plane,
    pub color: Rgba,
    /// Rows left until the polygon retires.
    pub dy: i32,
    pub edges: Vec<Id<Edge>>,
    /// Edges that started without a partner, waiting to continue or complete a pair.
    pub unpaired: Vec<Id<Edge>>,
    pub textures: Option<TextureSet>,
}

impl Polygon {
    pub fn is_textured(&self) -> bool {
        self.textures.is_some()
    }
}

/// Left and right boundary of the span a polygon covers on the current row.
#[derive(Debug, Clone)]
pub struct ActiveEdgePair {
    pub left: Id<Edge>,
    pub right: Id<Edge>,
    pub z_l: f32,
    pub z_r: f32,
    /// Depth change per pixel to the right.
    pub dz_x: f32,
    /// Depth change per row down.
    pub dz_y: f32,
    pub t_l: Vec2,
    pub t_r: Vec2,
    pub polygon: Id<Polygon>,
}

impl ActiveEdgePair {
    pub fn new(
        left: Id<Edge>,
        right: Id<Edge>,
        edges: &Arena<Edge>,
        polygon_id: Id<Polygon>,
        polygon: &Polygon,
    ) -> Self {
        let plane = polygon.plane;
        let (dz_x, dz_y) = if plane.z < ZERO_LIMIT {
            (0.0, 0.0)
        } else {
            (-plane.x / plane.z, plane.y / plane.z)
        };
        let (t_l, t_r) = if polygon.is_textured() {
            (edges[left].tex, edges[right].tex)
        } else {
            (Vec2::zero(), Vec2::zero())
        };

        ActiveEdgePair {
            left,
            right,
            z_l: edges[left].z,
            z_r: edges[right].z,
            dz_x,
            dz_y,
            t_l,
            t_r,
            polygon: polygon_id,
        }
    }
}
