//! Label-anchored score search.
//!
//! Finds a caption fragment (e.g. "Score"), then picks the best numeric fragment
//! positioned relative to it. Candidates are ranked by glyph height first (the
//! headline number is rendered larger than percentages and ranks next to it),
//! then by distance from the label.

use std::cmp::Ordering;

use super::numeral::clean_numeral;
use crate::ocr::{BoundingBox, TextFragment};

/// Text test applied to a case-folded, trimmed fragment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LabelMatch {
    /// Whole fragment equals the word.
    Exact(&'static str),
    /// Fragment contains every listed word.
    ContainsAll(&'static [&'static str]),
    /// Fragment contains at least one listed word.
    ContainsAny(&'static [&'static str]),
}

impl LabelMatch {
    pub fn matches(&self, text: &str) -> bool {
        let folded = text.trim().to_lowercase();
        match self {
            LabelMatch::Exact(word) => folded == *word,
            LabelMatch::ContainsAll(words) => words.iter().all(|w| folded.contains(w)),
            LabelMatch::ContainsAny(words) => words.iter().any(|w| folded.contains(w)),
        }
    }
}

/// Where the score sits relative to its label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchDirection {
    /// Candidate top edge at or below the label's bottom edge, horizontally aligned.
    Below,
    /// Candidate bottom edge at or above the label's top edge, horizontally aligned.
    Above,
    /// Candidate center within a Euclidean radius of the label center.
    Radius,
}

/// Parameters for one label-anchored search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocatorParams {
    /// Label tests in priority order; the first test that matches any fragment
    /// picks the label.
    pub labels: &'static [LabelMatch],
    pub direction: SearchDirection,
    /// Maximum horizontal offset (Below/Above) or radius (Radius), exclusive.
    pub tolerance_px: f32,
}

/// A numeric fragment that passed the positional constraints.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ScoreCandidate {
    pub height_px: f32,
    pub distance_px: f32,
    pub raw_text: String,
}

/// Returns the first fragment matched by the highest-priority label test.
pub fn find_label<'a>(fragments: &'a [TextFragment], labels: &[LabelMatch]) -> Option<&'a TextFragment> {
    labels
        .iter()
        .find_map(|label| fragments.iter().find(|f| label.matches(&f.text)))
}

/// Distance from the label when `candidate` satisfies the directional and
/// tolerance constraints, otherwise `None`.
fn placement(label: &BoundingBox, candidate: &BoundingBox, params: &LocatorParams) -> Option<f32> {
    match params.direction {
        SearchDirection::Below => {
            let offset_x = (candidate.center_x() - label.center_x()).abs();
            (offset_x < params.tolerance_px && candidate.top >= label.bottom)
                .then(|| candidate.top - label.bottom)
        }
        SearchDirection::Above => {
            let offset_x = (candidate.center_x() - label.center_x()).abs();
            (offset_x < params.tolerance_px && candidate.bottom <= label.top)
                .then(|| label.top - candidate.bottom)
        }
        SearchDirection::Radius => {
            let dx = candidate.center_x() - label.center_x();
            let dy = candidate.center_y() - label.center_y();
            let dist = (dx * dx + dy * dy).sqrt();
            (dist < params.tolerance_px).then_some(dist)
        }
    }
}

/// Taller first, then closer. Equal keys keep scan order (the sort is stable).
fn rank(a: &ScoreCandidate, b: &ScoreCandidate) -> Ordering {
    b.height_px
        .total_cmp(&a.height_px)
        .then_with(|| a.distance_px.total_cmp(&b.distance_px))
}

pub(crate) fn collect_candidates(
    fragments: &[TextFragment],
    label: &TextFragment,
    params: &LocatorParams,
) -> Vec<ScoreCandidate> {
    let mut candidates: Vec<ScoreCandidate> = fragments
        .iter()
        .filter_map(|fragment| {
            let raw_text = clean_numeral(&fragment.text)?;
            let distance_px = placement(&label.bbox, &fragment.bbox, params)?;
            Some(ScoreCandidate {
                height_px: fragment.bbox.height(),
                distance_px,
                raw_text,
            })
        })
        .collect();
    candidates.sort_by(rank);
    candidates
}

/// Runs the label-anchored search. Returns the winning numeral with grouping
/// separators stripped, or `None` when no label or no candidate is found.
pub fn locate(fragments: &[TextFragment], params: &LocatorParams) -> Option<String> {
    let label = find_label(fragments, params.labels)?;
    collect_candidates(fragments, label, params)
        .into_iter()
        .next()
        .map(|c| c.raw_text)
}
