use thiserror::Error;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Invalid face: {0}")]
    InvalidFace(String),
    #[error("Buffer of {actual} bytes cannot hold a {width}x{height} frame ({expected} bytes)")]
    BufferSize {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid rendering config: {0}")]
    InvalidConfig(String),
    #[error("Texture error: {0}")]
    Texture(#[from] image::ImageError),
}
