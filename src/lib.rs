//! Software scan-line Z-buffer rasterizer.
//!
//! Polygons are projected, clipped to the viewport and bucketed by their top scan line. Each
//! call to [`ZBufferScanLine::draw`] then walks the rows from top to bottom keeping only the
//! polygons and edge pairs that cross the current row, with a single row of depth values.

pub mod buf;
pub mod color;
pub mod config;
pub mod error;
pub mod math;
pub mod scene;
pub mod texture;
pub mod vec;
pub mod zbuffer;

pub type Pixel = [u8; 4];

pub use color::{PixelFormat, Rgba};
pub use error::RasterError;
pub use zbuffer::{Metrics, ScreenVertex, ZBufferScanLine};
