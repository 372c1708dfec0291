//! Region-of-interest fast path.
//!
//! Full-frame recognition dominates the cost of a request, while dashboards put
//! their name, score and handle in predictable places. This pass runs cheap
//! text-only recognition on a few small crops and reports whether the result
//! is good enough to skip the full frame.
//!
//! Crops lose the surrounding layout, so scores here are ranked by magnitude
//! after a per-source plausibility floor, not by glyph height and distance.

use image::RgbaImage;

use super::worker::RecognitionWorker;
use crate::error::Result;
use crate::extract::numeral::{clean_numeral, parse_value};
use crate::extract::{classify_texts, find_handle, Source, SourceHint};
use crate::ocr::{crop_region, ImageInput, RecognizeOptions, RelativeRect, HANDLE_ALLOWLIST, NUMERAL_ALLOWLIST};

/// Crops tried, in order, to identify the dashboard.
pub const CLASSIFY_REGIONS: [RelativeRect; 3] = [
    RelativeRect::new(0.0, 0.0, 1.0, 0.2),
    RelativeRect::new(0.0, 0.0, 0.5, 0.5),
    RelativeRect::new(0.0, 0.0, 1.0, 0.5),
];

/// Crops tried, in order, to find the `@handle` (profile headers sit on top).
pub const HANDLE_REGIONS: [RelativeRect; 2] = [
    RelativeRect::new(0.0, 0.0, 0.6, 0.15),
    RelativeRect::new(0.0, 0.0, 1.0, 0.3),
];

/// Score crops for one source plus the smallest value accepted as a score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreRoi {
    pub regions: &'static [RelativeRect],
    pub min_plausible: f64,
}

const WALLCHAIN_ROI: ScoreRoi = ScoreRoi {
    regions: &[
        RelativeRect::new(0.2, 0.15, 0.6, 0.35),
        RelativeRect::new(0.0, 0.1, 1.0, 0.5),
    ],
    // Percent changes next to the score read as small numbers.
    min_plausible: 10.0,
};

const KAITO_ROI: ScoreRoi = ScoreRoi {
    regions: &[
        RelativeRect::new(0.0, 0.15, 0.6, 0.35),
        RelativeRect::new(0.0, 0.1, 1.0, 0.5),
    ],
    min_plausible: 1.0,
};

const XEET_ROI: ScoreRoi = ScoreRoi {
    regions: &[
        RelativeRect::new(0.1, 0.1, 0.8, 0.35),
        RelativeRect::new(0.0, 0.0, 1.0, 0.5),
    ],
    // Ranks and streak counters stay below this.
    min_plausible: 50.0,
};

const COOKIE_ROI: ScoreRoi = ScoreRoi {
    regions: &[
        RelativeRect::new(0.0, 0.2, 1.0, 0.4),
        RelativeRect::new(0.0, 0.1, 1.0, 0.6),
    ],
    min_plausible: 1.0,
};

const MINDOSHARE_ROI: ScoreRoi = ScoreRoi {
    regions: &[
        RelativeRect::new(0.0, 0.1, 0.6, 0.3),
        RelativeRect::new(0.0, 0.0, 1.0, 0.5),
    ],
    min_plausible: 1.0,
};

pub fn score_roi(source: Source) -> Option<&'static ScoreRoi> {
    match source {
        Source::Wallchain => Some(&WALLCHAIN_ROI),
        Source::Kaito => Some(&KAITO_ROI),
        Source::Xeet => Some(&XEET_ROI),
        Source::Cookie => Some(&COOKIE_ROI),
        Source::Mindoshare => Some(&MINDOSHARE_ROI),
        Source::Unknown => None,
    }
}

/// Picks the largest plausible numeral from crop text.
pub fn pick_score<'a>(texts: impl IntoIterator<Item = &'a str>, roi: &ScoreRoi) -> Option<String> {
    let mut best: Option<(f64, String)> = None;
    for token in texts.into_iter().flat_map(str::split_whitespace) {
        let Some(numeral) = clean_numeral(token) else {
            continue;
        };
        let Some(value) = parse_value(&numeral) else {
            continue;
        };
        if value < roi.min_plausible {
            continue;
        }
        if best.as_ref().is_none_or(|(top, _)| value > *top) {
            best = Some((value, numeral));
        }
    }
    best.map(|(_, numeral)| numeral)
}

/// What the fast path found.
#[derive(Clone, Debug, PartialEq)]
pub struct FastPathResult {
    /// Source identified from the crops alone.
    pub classified: Source,
    /// Source used for the score search (hint, else `classified`).
    pub source: Source,
    pub score: Option<String>,
    pub handle: Option<String>,
    /// A fixed hint was given and the crops identified a different dashboard.
    pub hint_conflict: bool,
}

impl FastPathResult {
    /// Trustworthy enough to skip the full-frame pass.
    pub fn is_successful(&self) -> bool {
        !self.hint_conflict && self.source != Source::Unknown && self.score.is_some()
    }
}

async fn read_region(
    worker: &RecognitionWorker,
    image: &RgbaImage,
    region: &RelativeRect,
    options: RecognizeOptions,
) -> Result<Vec<String>> {
    let crop = crop_region(image, region);
    if crop.width() == 0 || crop.height() == 0 {
        return Ok(Vec::new());
    }
    worker.read_text(ImageInput::Decoded(crop), options).await
}

/// Runs the cheap crop passes on a decoded (downscaled) screenshot.
///
/// Recognizer faults propagate; nothing found is reported through the result.
pub async fn run_fast_path(
    worker: &RecognitionWorker,
    image: &RgbaImage,
    hint: SourceHint,
) -> Result<FastPathResult> {
    let mut classified = Source::Unknown;
    for region in &CLASSIFY_REGIONS {
        let texts = read_region(worker, image, region, RecognizeOptions::default()).await?;
        classified = classify_texts(texts.iter().map(String::as_str));
        if classified != Source::Unknown {
            break;
        }
    }

    let source = hint.fixed().unwrap_or(classified);
    let hint_conflict = hint
        .fixed()
        .is_some_and(|fixed| classified != Source::Unknown && classified != fixed);

    // A conflict forces the full pass, so searching crops for a score is wasted work.
    let mut score = None;
    if !hint_conflict {
        if let Some(roi) = score_roi(source) {
            for region in roi.regions {
                let options = RecognizeOptions::with_allowlist(NUMERAL_ALLOWLIST);
                let texts = read_region(worker, image, region, options).await?;
                score = pick_score(texts.iter().map(String::as_str), roi);
                if score.is_some() {
                    break;
                }
            }
        }
    }

    let mut handle = None;
    for region in &HANDLE_REGIONS {
        let options = RecognizeOptions::with_allowlist(HANDLE_ALLOWLIST);
        let texts = read_region(worker, image, region, options).await?;
        handle = find_handle(texts.iter().map(String::as_str));
        if handle.is_some() {
            break;
        }
    }

    tracing::debug!(
        classified = %classified,
        source = %source,
        score = ?score,
        handle = ?handle,
        hint_conflict,
        "Fast path finished"
    );

    Ok(FastPathResult {
        classified,
        source,
        score,
        handle,
        hint_conflict,
    })
}
