//! Runs blocking recognition work off the async request path.
//!
//! Each call is dispatched to tokio's blocking thread pool, so a slow
//! recognition never stalls the runtime's worker threads. A call that was
//! already dispatched runs to completion even if the request awaiting it is
//! dropped.

use image::RgbaImage;
use std::sync::Arc;

use crate::error::{ExtractError, Result};
use crate::ocr::{self, ImageInput, RecognizeOptions, Recognizer, TextFragment};

#[derive(Clone)]
pub struct RecognitionWorker {
    recognizer: Arc<dyn Recognizer>,
}

impl RecognitionWorker {
    pub fn new(recognizer: Arc<dyn Recognizer>) -> Self {
        Self { recognizer }
    }

    /// Full-detail recognition.
    pub async fn recognize(&self, input: ImageInput, options: RecognizeOptions) -> Result<Vec<TextFragment>> {
        let recognizer = Arc::clone(&self.recognizer);
        tokio::task::spawn_blocking(move || recognizer.recognize(&input, &options))
            .await?
            .map_err(ExtractError::Recognition)
    }

    /// Low-detail recognition (strings only).
    pub async fn read_text(&self, input: ImageInput, options: RecognizeOptions) -> Result<Vec<String>> {
        let recognizer = Arc::clone(&self.recognizer);
        tokio::task::spawn_blocking(move || recognizer.read_text(&input, &options))
            .await?
            .map_err(ExtractError::Recognition)
    }

    /// Decodes and downscales the screenshot. A decode failure is not an error
    /// here: it only means the fast path is unavailable.
    pub async fn decode(&self, bytes: Arc<[u8]>, max_side: u32) -> Result<Option<RgbaImage>> {
        let decoded = tokio::task::spawn_blocking(move || {
            ocr::decode(&bytes).map(|img| ocr::downscale(img, max_side))
        })
        .await?;

        match decoded {
            Ok(img) => Ok(Some(img)),
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "Screenshot decode failed, skipping fast path");
                Ok(None)
            }
        }
    }
}
