pub mod engine;
pub mod fragment;
pub mod preprocess;
pub mod setup;

pub use engine::TesseractRecognizer;
pub use fragment::{BoundingBox, TextFragment};
pub use preprocess::{crop_region, decode, downscale, RelativeRect};
pub use setup::{locate_tesseract, TesseractPaths};

use anyhow::Result;
use image::RgbaImage;
use std::sync::Arc;

/// Characters a score crop can contain.
pub const NUMERAL_ALLOWLIST: &str = "0123456789.,";

/// Characters a handle crop can contain.
pub const HANDLE_ALLOWLIST: &str =
    "@_0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Image handed to a recognizer: the caller's original encoded bytes, or an
/// already decoded (usually cropped) image.
#[derive(Clone, Debug)]
pub enum ImageInput {
    Encoded(Arc<[u8]>),
    Decoded(RgbaImage),
}

/// Per-call recognition options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecognizeOptions {
    /// Restricts recognized characters when set.
    pub allowlist: Option<&'static str>,
}

impl RecognizeOptions {
    pub fn with_allowlist(allowlist: &'static str) -> Self {
        Self {
            allowlist: Some(allowlist),
        }
    }
}

/// Text recognition engine. Loaded once and shared read-only between
/// concurrent requests, so implementations must tolerate concurrent calls.
pub trait Recognizer: Send + Sync {
    /// Full-detail pass: fragments with bounding boxes and confidences.
    fn recognize(&self, input: &ImageInput, options: &RecognizeOptions) -> Result<Vec<TextFragment>>;

    /// Low-detail pass: recognized strings only, in reading order.
    fn read_text(&self, input: &ImageInput, options: &RecognizeOptions) -> Result<Vec<String>> {
        Ok(self
            .recognize(input, options)?
            .into_iter()
            .map(|f| f.text)
            .collect())
    }
}
