//! Social Score Verifier
//!
//! Reads a dashboard screenshot (Wallchain, Kaito, Xeet, Cookie or Mindoshare)
//! through a text recognizer, identifies the dashboard, locates the score and
//! the account handle, and maps the score to a reward tier.

pub mod config;
pub mod error;
pub mod extract;
pub mod history;
pub mod ocr;
pub mod paths;
pub mod pipeline;
pub mod verify;

pub use error::ExtractError;
pub use extract::{analyze_fragments, ExtractionOutcome, Source, SourceHint};
pub use ocr::{BoundingBox, Recognizer, TextFragment};
pub use pipeline::{ExtractionPipeline, PipelineSettings};
pub use verify::{Tier, VerificationRecord, VerificationResult};
