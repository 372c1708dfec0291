use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// A rectangle in relative coordinates (0.0 to 1.0).
/// Used for regions of interest that scale with the screenshot size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelativeRect {
    /// X position of top-left corner (0.0 = left edge, 1.0 = right edge)
    pub x: f32,
    /// Y position of top-left corner (0.0 = top edge, 1.0 = bottom edge)
    pub y: f32,
    /// Width as fraction of image width
    pub width: f32,
    /// Height as fraction of image height
    pub height: f32,
}

impl RelativeRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Decodes PNG/JPEG/etc. bytes into an RGBA image.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes).context("Failed to decode screenshot")?;
    Ok(img.to_rgba8())
}

/// Shrinks the image so its longest side is at most `max_side`, keeping the
/// aspect ratio. Images already small enough are returned unchanged.
pub fn downscale(img: RgbaImage, max_side: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let longest = w.max(h);
    if max_side == 0 || longest <= max_side {
        return img;
    }

    let scale = max_side as f32 / longest as f32;
    let nw = ((w as f32 * scale).round() as u32).max(1);
    let nh = ((h as f32 * scale).round() as u32).max(1);
    image::imageops::resize(&img, nw, nh, FilterType::Triangle)
}

/// Crops a sub-region from an image using relative coordinates.
///
/// Converts the relative rect (0.0–1.0) to absolute pixel coordinates,
/// clamps to image bounds, and returns the cropped sub-image.
pub fn crop_region(img: &RgbaImage, region: &RelativeRect) -> RgbaImage {
    let (w, h) = img.dimensions();

    let x0 = ((region.x * w as f32) as u32).min(w);
    let y0 = ((region.y * h as f32) as u32).min(h);
    let rw = ((region.width * w as f32) as u32).min(w - x0);
    let rh = ((region.height * h as f32) as u32).min(h - y0);

    image::imageops::crop_imm(img, x0, y0, rw, rh).to_image()
}
