use std::path::Path;
use std::rc::Rc;

use crate::color::Rgba;
use crate::error::RasterError;
use crate::math::wrap_uv;
use crate::vec::Vec2;

/// Textures bound to one geometry. Shared between the geometry and every polygon inserted from it.
pub type TextureSet = Rc<[Texture]>;

/// RGBA8 texels stored row-major, first row at the top of the image.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: usize,
    height: usize,
    texels: Vec<Rgba>,
}

impl Texture {
    pub fn new(width: usize, height: usize, texels: Vec<Rgba>) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidConfig(format!(
                "texture must not be empty, got {width}x{height}"
            )));
        }
        if texels.len() != width * height {
            return Err(RasterError::BufferSize {
                width,
                height,
                expected: width * height * 4,
                actual: texels.len() * 4,
            });
        }
        Ok(Texture {
            width,
            height,
            texels,
        })
    }

    /// Builds a texture from tightly packed 8-bit gray, RGB or RGBA data. Missing alpha is opaque.
    pub fn from_channels(
        width: usize,
        height: usize,
        channels: usize,
        bytes: &[u8],
    ) -> Result<Self, RasterError> {
        let expected = width * height * channels;
        if bytes.len() != expected {
            return Err(RasterError::BufferSize {
                width,
                height,
                expected,
                actual: bytes.len(),
            });
        }
        let texels = match channels {
            1 => bytes.iter().map(|&l| Rgba::opaque(l, l, l)).collect(),
            3 => bytes
                .chunks_exact(3)
                .map(|rgb| Rgba::opaque(rgb[0], rgb[1], rgb[2]))
                .collect(),
            4 => bytes
                .chunks_exact(4)
                .map(|px| Rgba::new(px[0], px[1], px[2], px[3]))
                .collect(),
            _ => {
                return Err(RasterError::InvalidConfig(format!(
                    "unsupported texture channel count {channels}"
                )))
            }
        };
        Texture::new(width, height, texels)
    }

    pub fn from_image(image: &image::RgbaImage) -> Result<Self, RasterError> {
        let (width, height) = image.dimensions();
        Texture::from_channels(width as usize, height as usize, 4, image.as_raw())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RasterError> {
        let path = path.as_ref();
        let image = image::open(path)?.into_rgba8();
        log::debug!(
            "loaded texture {path:?} ({}x{})",
            image.width(),
            image.height()
        );
        Texture::from_image(&image)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn texel(&self, x: usize, y: usize) -> Rgba {
        self.texels[y * self.width + x]
    }

    /// Nearest texel to `uv`, with `v = 0` at the bottom of the image. Coordinates outside `[0, 1]`
    /// wrap around.
    #[inline]
    pub fn sample_nearest(&self, uv: Vec2) -> Rgba {
        let s = wrap_uv(uv.x) * (self.width - 1) as f32;
        let t = wrap_uv(uv.y) * (self.height - 1) as f32;
        // `as` saturates, so NaN lands on texel 0.
        let x = (s.round() as usize).min(self.width - 1);
        let y = self.height - 1 - (t.round() as usize).min(self.height - 1);
        self.texel(x, y)
    }
}

/// Per channel mean of the nearest texel of every texture. `None` if there are no textures.
pub fn sample_average(textures: &[Texture], uv: Vec2) -> Option<Rgba> {
    if textures.is_empty() {
        return None;
    }

    let mut sum = [0u32; 4];
    for texture in textures {
        let texel = texture.sample_nearest(uv).to_array();
        for (acc, chan) in sum.iter_mut().zip(texel) {
            *acc += chan as u32;
        }
    }
    let count = textures.len() as u32;
    Some(Rgba::from(sum.map(|chan| (chan / count) as u8)))
}
