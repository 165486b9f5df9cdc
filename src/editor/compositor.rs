//! Rasterizes an edit session into a final image.
//!
//! The base raster is the decoded source, optionally cut down to the crop
//! rectangle. Filter, brightness and contrast are then applied in one pass per
//! pixel, in that order, with each stage clamped to `[0, 1]` before the next.
//! That matches a compositing context configured with
//! `<filter> brightness(b%) contrast(c%)`, where every filter function clamps
//! its own output.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use tracing::debug;

use super::session::{ColorFilter, CropRegion, EditParams};
use crate::error::ViewerError;
use crate::image_loader::decode_image;

/// Luminance weights used by `grayscale(100%)`.
const GRAYSCALE: [[f32; 3]; 3] = [
    [0.2126, 0.7152, 0.0722],
    [0.2126, 0.7152, 0.0722],
    [0.2126, 0.7152, 0.0722],
];

/// Color matrix used by `sepia(100%)`.
const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Encoded output of a commit.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    /// PNG bytes.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decodes `source`, crops, applies the effects and encodes the result as PNG.
pub fn render_edit(
    source: &[u8],
    crop: Option<CropRegion>,
    params: EditParams,
) -> Result<RenderedImage, ViewerError> {
    let decoded = decode_image(source)?;
    let (natural_w, natural_h) = decoded.dimensions();
    if natural_w == 0 || natural_h == 0 {
        return Err(ViewerError::Render("source image has no pixels".to_string()));
    }

    let base = match crop {
        Some(region) => {
            let rect = region
                .to_source(natural_w, natural_h)
                .ok_or_else(|| {
                    ViewerError::Render("crop region is empty or outside the image".to_string())
                })?;
            debug!(?rect, natural_w, natural_h, "Cropping base raster");
            decoded.crop_imm(rect.x, rect.y, rect.width, rect.height)
        }
        None => decoded,
    };

    let mut raster = base.to_rgba8();
    apply_effects(&mut raster, params);

    let (width, height) = raster.dimensions();
    let bytes = encode_png(raster)?;
    debug!(width, height, encoded = bytes.len(), "Rendered edited image");

    Ok(RenderedImage {
        bytes,
        width,
        height,
    })
}

/// Applies filter, brightness and contrast in place. Alpha is untouched.
pub fn apply_effects(raster: &mut RgbaImage, params: EditParams) {
    if params.is_identity() {
        return;
    }

    let brightness = params.brightness.as_factor();
    let contrast = params.contrast.as_factor();

    for pixel in raster.pixels_mut() {
        let rgb = [
            f32::from(pixel[0]) / 255.0,
            f32::from(pixel[1]) / 255.0,
            f32::from(pixel[2]) / 255.0,
        ];
        let out = composite(rgb, params.filter, brightness, contrast);
        pixel[0] = to_channel(out[0]);
        pixel[1] = to_channel(out[1]);
        pixel[2] = to_channel(out[2]);
    }
}

fn composite(rgb: [f32; 3], filter: ColorFilter, brightness: f32, contrast: f32) -> [f32; 3] {
    let filtered = match filter {
        ColorFilter::None => rgb,
        ColorFilter::Grayscale => multiply(&GRAYSCALE, rgb),
        ColorFilter::Sepia => multiply(&SEPIA, rgb),
        ColorFilter::Invert => rgb.map(|v| 1.0 - v),
    };
    filtered.map(|v| {
        let v = (v.clamp(0.0, 1.0) * brightness).clamp(0.0, 1.0);
        ((v - 0.5) * contrast + 0.5).clamp(0.0, 1.0)
    })
}

fn multiply(matrix: &[[f32; 3]; 3], rgb: [f32; 3]) -> [f32; 3] {
    let row = |r: &[f32; 3]| r[0] * rgb[0] + r[1] * rgb[1] + r[2] * rgb[2];
    [row(&matrix[0]), row(&matrix[1]), row(&matrix[2])]
}

fn to_channel(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

fn encode_png(raster: RgbaImage) -> Result<Vec<u8>, ViewerError> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(raster)
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| ViewerError::Render(format!("Failed to encode edited image: {e}")))?;
    Ok(out.into_inner())
}
