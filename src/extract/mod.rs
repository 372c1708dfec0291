//! Score extraction from recognized text fragments.
//!
//! This module provides:
//! - Dashboard classification by keyword priority
//! - Label-anchored score location with per-source strategies
//! - `@handle` discovery
//!
//! Everything here is a pure function of the fragment set.

pub mod handle;
pub mod locator;
pub mod numeral;
pub mod source;
pub mod strategy;

pub use handle::find_handle;
pub use locator::{LabelMatch, LocatorParams, SearchDirection};
pub use source::{classify, classify_texts, Source, SourceHint};
pub use strategy::{locate_score, strategy_for, FALLBACK_SEQUENCE};

use serde::{Deserialize, Serialize};

use crate::ocr::TextFragment;

/// What the engine read off one screenshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub source: Source,
    /// Verbatim numeral with grouping separators removed.
    pub score: Option<String>,
    pub handle: Option<String>,
    pub used_fast_path: bool,
}

/// Classifies a full fragment set (unless a fixed hint is given, which is
/// authoritative), then locates the score and handle.
pub fn analyze_fragments(fragments: &[TextFragment], hint: SourceHint) -> ExtractionOutcome {
    let source = hint.fixed().unwrap_or_else(|| classify(fragments));
    ExtractionOutcome {
        source,
        score: locate_score(fragments, source),
        handle: find_handle(fragments.iter().map(|f| f.text.as_str())),
        used_fast_path: false,
    }
}
