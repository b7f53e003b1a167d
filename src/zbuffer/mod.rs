//! Scanline Z-buffer rasterizer.
//!
//! A frame is produced by [`ZBufferScanLine::reset`], any number of
//! [`ZBufferScanLine::insert_polygon`] calls and a final [`ZBufferScanLine::draw`]. Insertion
//! projects, culls and clips each face and files it under its topmost row. Drawing then sweeps
//! the rows from the top of the image down, pairing up the edges that start on each row and
//! filling the spans between them against a single row of depth values.
//!
//! Depth is kept as `DEPTH_SCALE / w`, which is affine in screen space, so both depth and
//! `tex * depth` can be stepped linearly along edges and spans.

mod arena;
mod edge;
mod fill;
mod insert;
mod pairing;
mod polygon;

pub use arena::{Arena, Id};
pub use edge::{Edge, EdgeStep};
pub use insert::ScreenVertex;
pub use polygon::{ActiveEdgePair, Polygon};

use crate::buf::{MatrixSlice, MatrixSliceMut};
use crate::color::{PixelFormat, Rgba};
use crate::config::RenderingConfig;
use crate::error::RasterError;
use crate::math::ClipRect;
use crate::vec::{Mat4x4, Vec3};
use crate::Pixel;

use fill::{draw_edge_pair, Scanline};
use pairing::insert_active_edge_pairs;

pub struct ZBufferScanLine {
    width: usize,
    height: usize,
    near: f32,
    far: f32,
    rect: ClipRect,
    mvp: Mat4x4,
    view_dir: Vec3,
    background: Rgba,
    format: PixelFormat,
    frame: Vec<Pixel>,
    depth_row: Vec<f32>,
    /// Polygons filed under their topmost row.
    polygon_table: Vec<Vec<Id<Polygon>>>,
    edges: Arena<Edge>,
    polygons: Arena<Polygon>,
    active_polygons: Vec<Id<Polygon>>,
    active_pairs: Vec<ActiveEdgePair>,
    num_polygons: usize,
    metrics: Metrics,
}

impl ZBufferScanLine {
    /// Renderer for a `width x height` frame. Fails on an empty frame or unless
    /// `0 < near < far`.
    pub fn new(width: usize, height: usize, near: f32, far: f32) -> Result<Self, RasterError> {
        let config = RenderingConfig {
            near,
            far,
            ..RenderingConfig::new(width, height)
        };
        ZBufferScanLine::from_config(&config)
    }

    pub fn from_config(config: &RenderingConfig) -> Result<Self, RasterError> {
        config.validate()?;
        let &RenderingConfig {
            width,
            height,
            near,
            far,
            background,
            pixel_format: format,
            ..
        } = config;
        Ok(ZBufferScanLine {
            width,
            height,
            near,
            far,
            rect: ClipRect::new(width, height),
            mvp: Mat4x4::identity(),
            view_dir: Vec3::from([0., 0., 1.]),
            background,
            format,
            frame: vec![format.encode(background); width * height],
            depth_row: vec![f32::NEG_INFINITY; width],
            polygon_table: vec![Vec::new(); height],
            edges: Arena::new(),
            polygons: Arena::new(),
            active_polygons: Vec::new(),
            active_pairs: Vec::new(),
            num_polygons: 0,
            metrics: Metrics::new(),
        })
    }

    pub fn set_background(&mut self, background: Rgba) {
        self.background = background;
        self.clear_frame();
    }

    /// Byte order of the frame. Clears the frame to the background.
    pub fn set_pixel_format(&mut self, format: PixelFormat) {
        self.format = format;
        self.clear_frame();
    }

    fn clear_frame(&mut self) {
        MatrixSliceMut::new(&mut self.frame, self.width, self.height)
            .fill(self.format.encode(self.background));
    }

    /// Model-view-projection matrix applied by [`ZBufferScanLine::insert_polygon`].
    pub fn set_mvp(&mut self, mvp: Mat4x4) {
        self.mvp = mvp;
    }

    /// Direction faces must point towards, in screen space, to survive culling.
    pub fn set_view_dir(&mut self, view_dir: Vec3) {
        self.view_dir = view_dir;
    }

    /// Drops every polygon and edge of the previous frame.
    pub fn reset(&mut self) {
        self.active_polygons.clear();
        self.active_pairs.clear();
        for row in &mut self.polygon_table {
            row.clear();
        }
        self.edges.clear();
        self.polygons.clear();
        self.num_polygons = 0;
        self.metrics.clear();
    }

    /// Draws every row, top to bottom.
    pub fn draw(&mut self) {
        for row in (0..self.height).rev() {
            self.draw_line(row);
        }
        log::debug!(
            "drew {} polygons, {} pixels written",
            self.num_polygons,
            self.metrics.pixels_written
        );
    }

    /// Draws row `index` (row 0 is the bottom of the image). Rows must be drawn in decreasing
    /// order starting at `height - 1`; stopping early leaves the remaining rows untouched.
    pub fn draw_line(&mut self, index: usize) {
        if index >= self.height {
            log::warn!("row {index} is outside a frame of height {}", self.height);
            return;
        }

        self.depth_row.fill(f32::NEG_INFINITY);
        let mut frame = MatrixSliceMut::new(&mut self.frame, self.width, self.height);
        let pixels = frame.row_mut(index);
        pixels.fill(self.format.encode(self.background));

        self.active_polygons
            .extend(self.polygon_table[index].iter().copied());

        for &polygon in &self.active_polygons {
            insert_active_edge_pairs(
                index,
                polygon,
                &mut self.polygons,
                &self.edges,
                &mut self.active_pairs,
                &mut self.metrics,
            );
        }

        let mut line = Scanline {
            depth: &mut self.depth_row,
            pixels,
            format: self.format,
            metrics: &mut self.metrics,
        };
        for pair in &mut self.active_pairs {
            let polygon = &mut self.polygons[pair.polygon];
            draw_edge_pair(pair, &mut self.edges, polygon, &mut line);
        }

        for &polygon in &self.active_polygons {
            self.polygons[polygon].dy -= 1;
        }

        let (edges, polygons) = (&self.edges, &self.polygons);
        self.active_pairs.retain(|pair| {
            polygons[pair.polygon].dy > 0 && (edges[pair.left].dy > 0 || edges[pair.right].dy > 0)
        });
        self.active_polygons.retain(|&id| polygons[id].dy > 0);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    /// Polygons recorded since the last reset.
    pub fn num_polygons(&self) -> usize {
        self.num_polygons
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// The frame, indexed by `(x, y)` with y pointing up.
    pub fn frame(&self) -> MatrixSlice<'_, Pixel> {
        MatrixSlice::new(&self.frame, self.width, self.height)
    }

    /// Color at `(x, y)`, decoded from the pixel format.
    pub fn color_at(&self, x: usize, y: usize) -> Rgba {
        self.format.decode(self.frame()[(x, y)])
    }

    /// Copies the frame into `out` with the top row first, as image files and window surfaces
    /// expect.
    pub fn write_top_down(&self, out: &mut [u8]) -> Result<(), RasterError> {
        let expected = self.width * self.height * 4;
        if out.len() != expected {
            return Err(RasterError::BufferSize {
                width: self.width,
                height: self.height,
                expected,
                actual: out.len(),
            });
        }
        let row_bytes = self.width * 4;
        for (dst, src) in out.chunks_exact_mut(row_bytes).zip(self.frame().rows_rev()) {
            for (dst, pixel) in dst.chunks_exact_mut(4).zip(src) {
                dst.copy_from_slice(pixel);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub polygons_inserted: usize,
    pub backfaces_culled: usize,
    pub behind_culled: usize,
    pub clipped_away: usize,
    pub edges_generated: usize,
    pub edge_pairs: usize,
    pub pixels_written: usize,
    pub malformed_edges: usize,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics::default()
    }

    pub fn clear(&mut self) {
        *self = Metrics::new();
    }
}

impl std::fmt::Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let &Metrics {
            polygons_inserted,
            backfaces_culled,
            behind_culled,
            clipped_away,
            edges_generated,
            edge_pairs,
            pixels_written,
            malformed_edges,
        } = self;
        writeln!(f, "render metrics:")?;
        writeln!(f, "\tpolygons inserted: {polygons_inserted}")?;
        writeln!(f, "\tbackfaces culled: {backfaces_culled}")?;
        writeln!(f, "\tbehind culled: {behind_culled}")?;
        writeln!(f, "\tclipped away: {clipped_away}")?;
        writeln!(f, "\tedges generated: {edges_generated}")?;
        writeln!(f, "\tedge pairs: {edge_pairs}")?;
        writeln!(f, "\tpixels written: {pixels_written}")?;
        if malformed_edges > 0 {
            writeln!(f, "\tmalformed edges: {malformed_edges}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> [ScreenVertex; 3] {
        [
            ScreenVertex::new(10., 10., 1.),
            ScreenVertex::new(50., 10., 1.),
            ScreenVertex::new(30., 40., 1.),
        ]
    }

    #[test]
    fn reset_is_idempotent() {
        let mut zbuffer = ZBufferScanLine::new(64, 64, 0.1, 100.).unwrap();
        zbuffer.reset();
        zbuffer
            .insert_screen_polygon(&triangle(), Rgba::WHITE, None)
            .unwrap();
        assert_eq!(zbuffer.num_polygons(), 1);
        zbuffer.reset();
        zbuffer.reset();
        assert_eq!(zbuffer.num_polygons(), 0);
        assert!(zbuffer.edges.is_empty());
        assert!(zbuffer.polygons.is_empty());
        assert!(zbuffer.polygon_table.iter().all(Vec::is_empty));
        assert!(zbuffer.active_pairs.is_empty());
        assert_eq!(*zbuffer.metrics(), Metrics::new());
    }

    #[test]
    fn polygon_is_filed_under_top_row() {
        let mut zbuffer = ZBufferScanLine::new(64, 64, 0.1, 100.).unwrap();
        zbuffer
            .insert_screen_polygon(&triangle(), Rgba::WHITE, None)
            .unwrap();
        assert_eq!(zbuffer.polygon_table[40].len(), 1);
        let id = zbuffer.polygon_table[40][0];
        assert_eq!(zbuffer.polygons[id].dy, 31);
        assert_eq!(zbuffer.polygons[id].edges.len(), 3);
    }

    #[test]
    fn everything_retires_after_draw() {
        let mut zbuffer = ZBufferScanLine::new(64, 64, 0.1, 100.).unwrap();
        zbuffer
            .insert_screen_polygon(&triangle(), Rgba::WHITE, None)
            .unwrap();
        zbuffer.draw();
        assert!(zbuffer.active_pairs.is_empty());
        assert!(zbuffer.active_polygons.is_empty());
        assert!(zbuffer.metrics().pixels_written > 0);
    }

    #[test]
    fn back_facing_polygon_is_culled() {
        let mut zbuffer = ZBufferScanLine::new(64, 64, 0.1, 100.).unwrap();
        let mut reversed = triangle();
        reversed.reverse();
        zbuffer
            .insert_screen_polygon(&reversed, Rgba::WHITE, None)
            .unwrap();
        assert_eq!(zbuffer.num_polygons(), 0);
        assert_eq!(zbuffer.metrics().backfaces_culled, 1);
    }

    #[test]
    fn too_few_vertices_is_an_error() {
        let mut zbuffer = ZBufferScanLine::new(64, 64, 0.1, 100.).unwrap();
        let result = zbuffer.insert_screen_polygon(&triangle()[..2], Rgba::WHITE, None);
        assert!(matches!(result, Err(RasterError::InvalidFace(_))));
    }

    #[test]
    fn empty_frame_is_rejected() {
        for (width, height) in [(8, 0), (0, 8), (0, 0)] {
            let result = ZBufferScanLine::new(width, height, 0.1, 100.);
            assert!(matches!(result, Err(RasterError::InvalidConfig(_))));
        }
        assert!(ZBufferScanLine::new(8, 8, 1., 0.5).is_err());
        assert!(ZBufferScanLine::new(1, 1, 0.1, 100.).is_ok());
    }

    #[test]
    fn top_down_copy_flips_rows() {
        let mut zbuffer = ZBufferScanLine::new(2, 2, 0.1, 100.).unwrap();
        zbuffer.set_pixel_format(PixelFormat::Rgba);
        zbuffer.frame[0] = [1, 2, 3, 4];
        let mut out = [0u8; 16];
        zbuffer.write_top_down(&mut out).unwrap();
        assert_eq!(out[8..12], [1, 2, 3, 4]);
        assert!(zbuffer.write_top_down(&mut [0u8; 15]).is_err());
    }
}
