//! Rasterization pipeline: scene → pixel buffer → PNG bytes.

use crate::scene;
use kurbo::Rect;
use resvg::{tiny_skia, usvg};
use thiserror::Error;
use timeboard_core::document::Document;

/// Fixed padding around the included cells' union, in world units.
pub const EXPORT_PADDING: f64 = 24.0;

/// Rasterization errors.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("scene parse failed: {0}")]
    Scene(String),
    #[error("pixmap allocation failed ({0}x{1})")]
    Allocation(u32, u32),
    #[error("png encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
}

/// A finished straight-alpha RGBA pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8, `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl Bitmap {
    /// Encode as PNG for the export collaborator.
    pub fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.data)?;
        }
        Ok(out)
    }
}

/// Rasterize the document, optionally restricted to a world-space region.
///
/// A cell is included iff its bounding box intersects the region (always,
/// when no region is given); a connection needs both endpoints included.
/// An empty document or region yields `Ok(None)`, a no-op rather than an
/// error.
pub fn render_document(
    doc: &Document,
    region: Option<Rect>,
    scale: f64,
) -> Result<Option<Bitmap>, RasterError> {
    let Some(scene) = scene::build_scene(doc, region) else {
        return Ok(None);
    };
    let scale = scale.clamp(0.1, 8.0);

    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(&scene.svg, &options)
        .map_err(|e| RasterError::Scene(e.to_string()))?;

    let width = (scene.width * scale).ceil().max(1.0) as u32;
    let height = (scene.height * scale).ceil().max(1.0) as u32;
    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or(RasterError::Allocation(width, height))?;

    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale as f32, scale as f32),
        &mut pixmap.as_mut(),
    );
    log::debug!("rasterized {}x{} export bitmap", width, height);

    // Demultiply into a straight-alpha buffer for the collaborator.
    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    Ok(Some(Bitmap {
        width,
        height,
        data,
    }))
}
