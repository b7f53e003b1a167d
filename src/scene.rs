use std::rc::Rc;

use crate::color::Rgba;
use crate::error::RasterError;
use crate::texture::TextureSet;
use crate::vec::{Mat4x4, Vec2, Vec3};
use crate::zbuffer::ZBufferScanLine;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub tex_coord: Vec2,
    pub color: Rgba,
}

impl Vertex {
    pub fn new(position: Vec3, tex_coord: Vec2, color: Rgba) -> Self {
        Vertex {
            position,
            tex_coord,
            color,
        }
    }
}

/// Planar convex polygon, as counter-clockwise indices into its geometry's vertices. The first
/// vertex's color is the face color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    pub indices: Vec<usize>,
}

impl Face {
    pub fn new(indices: impl Into<Vec<usize>>) -> Self {
        Face {
            indices: indices.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
    pub textures: TextureSet,
}

#[rustfmt::skip]
const CUBE_VERTICES: [[[f32; 3]; 4]; 6] = [
    // back
    [[ 1.,  1., -1.], [ 1., -1., -1.], [-1., -1., -1.], [-1.,  1., -1.]],
    // front
    [[-1., -1.,  1.], [ 1., -1.,  1.], [ 1.,  1.,  1.], [-1.,  1.,  1.]],
    // left
    [[-1.,  1., -1.], [-1., -1., -1.], [-1., -1.,  1.], [-1.,  1.,  1.]],
    // right
    [[ 1.,  1.,  1.], [ 1., -1.,  1.], [ 1., -1., -1.], [ 1.,  1., -1.]],
    // bottom
    [[-1., -1.,  1.], [-1., -1., -1.], [ 1., -1., -1.], [ 1., -1.,  1.]],
    // top
    [[-1.,  1., -1.], [-1.,  1.,  1.], [ 1.,  1.,  1.], [ 1.,  1., -1.]],
];

pub const CUBE_COLORS: [Rgba; 6] = [
    Rgba::opaque(255, 255, 0),
    Rgba::opaque(255, 0, 255),
    Rgba::opaque(0, 255, 255),
    Rgba::opaque(255, 0, 0),
    Rgba::opaque(0, 255, 0),
    Rgba::opaque(0, 0, 255),
];

const QUAD_VERTICES: [[f32; 3]; 4] = [[-1., -1., 0.], [1., -1., 0.], [1., 1., 0.], [-1., 1., 0.]];
const TRIANGLE_VERTICES: [[f32; 3]; 3] = [[0., 0.5, 0.], [-0.5, -0.5, 0.], [0.5, -0.5, 0.]];
const QUAD_TEX_COORDS: [[f32; 2]; 4] = [[0., 0.], [1., 0.], [1., 1.], [0., 1.]];

impl Geometry {
    pub fn new(vertices: Vec<Vertex>, faces: Vec<Face>) -> Self {
        Geometry {
            vertices,
            faces,
            textures: Rc::from(Vec::new()),
        }
    }

    pub fn with_textures(mut self, textures: TextureSet) -> Self {
        self.textures = textures;
        self
    }

    /// Cube spanning `[-1, 1]` on every axis, one color per face (back, front, left, right,
    /// bottom, top). Each face maps the full texture.
    pub fn cube(colors: [Rgba; 6]) -> Self {
        let mut vertices = Vec::with_capacity(24);
        let mut faces = Vec::with_capacity(6);
        for (quad, (corners, color)) in CUBE_VERTICES.iter().zip(colors).enumerate() {
            for (&corner, &tex_coord) in corners.iter().zip(&QUAD_TEX_COORDS) {
                vertices.push(Vertex::new(
                    Vec3::from(corner),
                    Vec2::from(tex_coord),
                    color,
                ));
            }
            faces.push(Face::new((0..4).map(|i| quad * 4 + i).collect::<Vec<_>>()));
        }
        Geometry::new(vertices, faces)
    }

    /// Square spanning `[-1, 1]` in the xy plane, facing +z.
    pub fn quad(color: Rgba) -> Self {
        let vertices = QUAD_VERTICES
            .iter()
            .zip(&QUAD_TEX_COORDS)
            .map(|(&p, &t)| Vertex::new(Vec3::from(p), Vec2::from(t), color))
            .collect();
        Geometry::new(vertices, vec![Face::new([0, 1, 2, 3])])
    }

    pub fn triangle(color: Rgba) -> Self {
        let vertices = TRIANGLE_VERTICES
            .iter()
            .map(|&p| Vertex::new(Vec3::from(p), Vec2::zero(), color))
            .collect();
        Geometry::new(vertices, vec![Face::new([0, 1, 2])])
    }

    pub fn textured_quad(textures: TextureSet) -> Self {
        Geometry::quad(Rgba::WHITE).with_textures(textures)
    }
}

/// An object placed in the world: shared geometry plus its model matrix.
#[derive(Debug, Clone)]
pub struct Drawable {
    pub geometries: Vec<Rc<Geometry>>,
    pub model: Mat4x4,
    pub use_texture: bool,
}

impl Drawable {
    pub fn new(geometry: Rc<Geometry>, model: Mat4x4) -> Self {
        let use_texture = !geometry.textures.is_empty();
        Drawable {
            geometries: vec![geometry],
            model,
            use_texture,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view, in degrees.
    pub fovy: f32,
    pub ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4x4 {
        Mat4x4::look_at(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4x4 {
        Mat4x4::perspective(self.ratio, self.fovy, self.near, self.far)
    }

    /// Projection times view.
    pub fn transform_matrix(&self) -> Mat4x4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Rotates the eye around the target, about the up axis, by `angle` radians.
    pub fn orbit(&mut self, angle: f32) {
        let axis = self.up.normalize();
        let offset = self.position - self.target;
        let (sin, cos) = angle.sin_cos();
        let rotated = offset * cos
            + axis.cross(offset) * sin
            + axis * (axis.dot(offset) * (1. - cos));
        self.position = self.target + rotated;
    }
}

/// Feeds every face of `drawables` to `zbuffer` as seen from `camera`. Does not reset or draw.
pub fn insert_drawables(
    zbuffer: &mut ZBufferScanLine,
    camera: &Camera,
    drawables: &[Drawable],
    allow_textures: bool,
) -> Result<(), RasterError> {
    let view_projection = camera.transform_matrix();
    for drawable in drawables {
        zbuffer.set_mvp(view_projection * drawable.model);
        for geometry in &drawable.geometries {
            for face in &geometry.faces {
                zbuffer.insert_polygon(face, geometry, allow_textures && drawable.use_texture)?;
            }
        }
    }
    Ok(())
}
