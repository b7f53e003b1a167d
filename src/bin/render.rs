use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};

use zscan::{
    config::Scene,
    scene::insert_drawables,
    PixelFormat, ZBufferScanLine,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args_os().skip(1);
    let Some(scene_path) = args.next().map(PathBuf::from) else {
        bail!("usage: zscan-render <scene.toml> [output.png]");
    };
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("frame.png"));

    let scene = Scene::load_toml(&scene_path)?;
    let base_dir = scene_path.parent().unwrap_or(Path::new("."));
    let drawables = scene.load_drawables(base_dir)?;
    let camera = scene.camera();

    let mut rendering = scene.rendering;
    // PNG wants RGBA byte order regardless of what the scene asks for.
    rendering.pixel_format = PixelFormat::Rgba;
    let mut zbuffer = ZBufferScanLine::from_config(&rendering)?;

    let start = Instant::now();
    zbuffer.reset();
    insert_drawables(&mut zbuffer, &camera, &drawables, rendering.textures)?;
    zbuffer.draw();
    log::info!(
        "rendered {} polygons in {:?}",
        zbuffer.num_polygons(),
        start.elapsed()
    );
    print!("{}", zbuffer.metrics());

    let mut bytes = vec![0u8; rendering.width * rendering.height * 4];
    zbuffer.write_top_down(&mut bytes)?;
    let image = image::RgbaImage::from_raw(rendering.width as u32, rendering.height as u32, bytes)
        .context("frame does not match the image size")?;
    image
        .save(&output)
        .with_context(|| format!("failed to write image {output:?}"))?;
    log::info!("wrote {output:?}");

    Ok(())
}
