use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::color::{PixelFormat, Rgba};
use crate::error::RasterError;
use crate::scene::{Camera, Drawable, Geometry, CUBE_COLORS};
use crate::texture::{Texture, TextureSet};
use crate::vec::{Mat4x4, Vec3};

#[derive(Clone, Deserialize)]
pub struct Scene {
    pub rendering: RenderingConfig,
    pub camera: CameraConfig,
    #[serde(default)]
    pub objects: Vec<Object>,
}

impl Scene {
    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read file {path:?}"))?;
        Scene::from_toml_str(&contents).with_context(|| format!("failed to parse scene {path:?}"))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let scene: Scene = toml::from_str(contents)?;
        scene.rendering.validate()?;
        Ok(scene)
    }

    pub fn camera(&self) -> Camera {
        let rendering = &self.rendering;
        self.camera
            .into_camera(rendering.width as f32 / rendering.height as f32, rendering.near, rendering.far)
    }

    /// Builds the scene objects, loading textures relative to `base_dir`.
    pub fn load_drawables(&self, base_dir: impl AsRef<Path>) -> Result<Vec<Drawable>> {
        let base_dir = base_dir.as_ref();
        self.objects
            .iter()
            .enumerate()
            .map(|(i, object)| {
                object
                    .to_drawable(base_dir)
                    .with_context(|| format!("failed to build object #{i} ({:?})", object.kind))
            })
            .collect()
    }
}

#[derive(Clone, Deserialize)]
pub struct Object {
    pub kind: ObjectKind,
    #[serde(default = "Vec3::zero", deserialize_with = "detail::deser_vec3")]
    pub position: Vec3,
    /// Euler angles measured in degrees
    #[serde(default = "Vec3::zero", deserialize_with = "detail::deser_vec3")]
    pub rotation: Vec3,
    #[serde(default = "Vec3::one", deserialize_with = "detail::deser_vec3")]
    pub scale: Vec3,
    #[serde(default)]
    pub color: Option<Rgba>,
    #[serde(default)]
    pub textures: Vec<PathBuf>,
}

impl Object {
    pub fn model_matrix(&self) -> Mat4x4 {
        self.position.to_translation()
            * self.rotation.map(f32::to_radians).to_rotation()
            * self.scale.to_scale()
    }

    fn load_textures(&self, base_dir: &Path) -> Result<TextureSet> {
        let textures = self
            .textures
            .iter()
            .map(|path| {
                let path = base_dir.join(path);
                Texture::load(&path).with_context(|| format!("failed to load texture {path:?}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Rc::from(textures))
    }

    pub fn to_drawable(&self, base_dir: &Path) -> Result<Drawable> {
        let textures = self.load_textures(base_dir)?;
        let color = self.color.unwrap_or(Rgba::WHITE);
        let geometry = match self.kind {
            ObjectKind::Cube => Geometry::cube(self.color.map_or(CUBE_COLORS, |color| [color; 6])),
            ObjectKind::Quad => Geometry::quad(color),
            ObjectKind::Triangle => Geometry::triangle(color),
            ObjectKind::TexturedQuad => {
                if textures.is_empty() {
                    bail!("a textured quad needs at least one texture");
                }
                Geometry::textured_quad(textures.clone())
            }
        };
        Ok(Drawable::new(
            Rc::new(geometry.with_textures(textures)),
            self.model_matrix(),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ObjectKind {
    #[serde(rename = "cube")]
    Cube,
    #[serde(rename = "quad")]
    Quad,
    #[serde(rename = "triangle")]
    Triangle,
    #[serde(rename = "textured-quad")]
    TexturedQuad,
}

#[derive(Clone, Copy, Deserialize)]
pub struct CameraConfig {
    #[serde(deserialize_with = "detail::deser_vec3")]
    pub position: Vec3,
    #[serde(default = "Vec3::zero", deserialize_with = "detail::deser_vec3")]
    pub target: Vec3,
    #[serde(default = "CameraConfig::default_axis")]
    pub up: Axis,
    #[serde(default = "CameraConfig::default_fovy")]
    pub fovy: f32,
}

impl CameraConfig {
    pub fn into_camera(self, ratio: f32, near: f32, far: f32) -> Camera {
        Camera {
            position: self.position,
            target: self.target,
            up: self.up.into_vec(),
            fovy: self.fovy,
            ratio,
            near,
            far,
        }
    }

    fn default_axis() -> Axis {
        Axis::Y
    }

    fn default_fovy() -> f32 {
        45.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Axis {
    #[serde(rename = "x")]
    X,
    #[serde(rename = "-x")]
    NegativeX,
    #[serde(rename = "y")]
    Y,
    #[serde(rename = "-y")]
    NegativeY,
    #[serde(rename = "z")]
    Z,
    #[serde(rename = "-z")]
    NegativeZ,
}

impl Axis {
    pub fn into_vec(self) -> Vec3 {
        use Axis::*;

        match self {
            X => Vec3::from([1., 0., 0.]),
            NegativeX => Vec3::from([-1., 0., 0.]),
            Y => Vec3::from([0., 1., 0.]),
            NegativeY => Vec3::from([0., -1., 0.]),
            Z => Vec3::from([0., 0., 1.]),
            NegativeZ => Vec3::from([0., 0., -1.]),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RenderingConfig {
    pub width: usize,
    pub height: usize,
    #[serde(default = "RenderingConfig::near_default")]
    pub near: f32,
    #[serde(default = "RenderingConfig::far_default")]
    pub far: f32,
    #[serde(default = "RenderingConfig::background_default")]
    pub background: Rgba,
    #[serde(default, rename = "pixel-format")]
    pub pixel_format: PixelFormat,
    /// Whether objects with textures are drawn textured.
    #[serde(default = "RenderingConfig::textures_default")]
    pub textures: bool,
}

impl RenderingConfig {
    pub fn new(width: usize, height: usize) -> Self {
        RenderingConfig {
            width,
            height,
            near: RenderingConfig::near_default(),
            far: RenderingConfig::far_default(),
            background: RenderingConfig::background_default(),
            pixel_format: PixelFormat::default(),
            textures: RenderingConfig::textures_default(),
        }
    }

    pub fn validate(&self) -> Result<(), RasterError> {
        if self.width == 0 || self.height == 0 {
            return Err(RasterError::InvalidConfig(format!(
                "frame size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(RasterError::InvalidConfig(format!(
                "expected 0 < near < far, got near = {} and far = {}",
                self.near, self.far
            )));
        }
        Ok(())
    }

    fn near_default() -> f32 {
        0.1
    }

    fn far_default() -> f32 {
        100.
    }

    fn background_default() -> Rgba {
        Rgba::BACKGROUND
    }

    fn textures_default() -> bool {
        true
    }
}

mod detail {
    use serde::de::{Deserialize, Deserializer};

    use crate::vec::Vec3;

    pub fn deser_vec3<'de, D>(deserializer: D) -> Result<Vec3, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Vec3::from(<[f32; 3] as Deserialize>::deserialize(deserializer)?))
    }
}
