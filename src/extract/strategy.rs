//! Per-dashboard score strategies.
//!
//! Each known source wires the label-anchored locator with its own label text,
//! search direction and tolerance. Screenshots that could not be classified try
//! a fixed fallback sequence of strategies instead.

use super::locator::{locate, LabelMatch, LocatorParams, SearchDirection};
use super::source::Source;
use crate::ocr::TextFragment;

const WALLCHAIN: LocatorParams = LocatorParams {
    labels: &[LabelMatch::Exact("score")],
    direction: SearchDirection::Below,
    tolerance_px: 100.0,
};

// The caption may be read as one fragment or split into "Total" and "Yaps".
const KAITO: LocatorParams = LocatorParams {
    labels: &[
        LabelMatch::ContainsAll(&["total", "yaps"]),
        LabelMatch::Exact("yaps"),
        LabelMatch::Exact("total"),
    ],
    direction: SearchDirection::Below,
    tolerance_px: 300.0,
};

const XEET: LocatorParams = LocatorParams {
    labels: &[
        LabelMatch::ContainsAll(&["xeet", "earned"]),
        LabelMatch::ContainsAny(&["earned"]),
    ],
    direction: SearchDirection::Above,
    tolerance_px: 200.0,
};

// Tiled layout: no reliable vertical axis, so search a radius around the caption.
const COOKIE: LocatorParams = LocatorParams {
    labels: &[
        LabelMatch::ContainsAny(&["total snaps earned", "snaps earned"]),
        LabelMatch::ContainsAny(&["snaps", "earned"]),
    ],
    direction: SearchDirection::Radius,
    tolerance_px: 300.0,
};

const MINDOSHARE: LocatorParams = LocatorParams {
    labels: &[LabelMatch::ContainsAll(&["kol score"])],
    direction: SearchDirection::Above,
    tolerance_px: 100.0,
};

/// Strategies tried, in order, when the source is unknown.
pub const FALLBACK_SEQUENCE: [Source; 3] = [Source::Mindoshare, Source::Wallchain, Source::Kaito];

/// Returns the locator configuration for a known source, `None` for `Unknown`.
pub fn strategy_for(source: Source) -> Option<&'static LocatorParams> {
    match source {
        Source::Wallchain => Some(&WALLCHAIN),
        Source::Kaito => Some(&KAITO),
        Source::Xeet => Some(&XEET),
        Source::Cookie => Some(&COOKIE),
        Source::Mindoshare => Some(&MINDOSHARE),
        Source::Unknown => None,
    }
}

/// Locates the score for `source`. For `Unknown`, the first non-empty result of
/// the fallback sequence wins.
pub fn locate_score(fragments: &[TextFragment], source: Source) -> Option<String> {
    match strategy_for(source) {
        Some(params) => locate(fragments, params),
        None => FALLBACK_SEQUENCE
            .iter()
            .filter_map(|s| strategy_for(*s))
            .find_map(|params| locate(fragments, params)),
    }
}
