//! Dashboard source identification.
//!
//! A screenshot is attributed to a dashboard by keyword presence in the
//! case-folded text. Keyword groups are tested in a fixed priority order and the
//! first hit wins, since some words ("earned", "score") appear on several
//! dashboards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ocr::TextFragment;

/// The dashboards a screenshot can come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Wallchain,
    Kaito,
    Xeet,
    Cookie,
    Mindoshare,
    Unknown,
}

impl Source {
    /// All known sources in classification priority order.
    pub const KNOWN: [Source; 5] = [
        Source::Wallchain,
        Source::Kaito,
        Source::Xeet,
        Source::Cookie,
        Source::Mindoshare,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Source::Wallchain => "Wallchain",
            Source::Kaito => "Kaito",
            Source::Xeet => "Xeet",
            Source::Cookie => "Cookie",
            Source::Mindoshare => "Mindoshare",
            Source::Unknown => "Unknown",
        }
    }

    /// Keywords (lowercase) whose presence identifies this source.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Source::Wallchain => &["wallchain", "quacks", "quack balance"],
            Source::Kaito => &["kaito", "total yaps", "earned yaps"],
            Source::Xeet => &["xeet", "xeets earned"],
            Source::Cookie => &["cookie", "snaps earned", "total snaps"],
            Source::Mindoshare => &["kol score", "mindoshare"],
            Source::Unknown => &[],
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Caller-supplied override for classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceHint {
    #[default]
    Auto,
    Fixed(Source),
}

impl SourceHint {
    pub fn fixed(&self) -> Option<Source> {
        match self {
            SourceHint::Auto => None,
            SourceHint::Fixed(source) => Some(*source),
        }
    }
}

impl FromStr for SourceHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        if wanted == "auto" {
            return Ok(SourceHint::Auto);
        }
        Source::KNOWN
            .iter()
            .find(|source| source.name().to_lowercase() == wanted)
            .map(|source| SourceHint::Fixed(*source))
            .ok_or_else(|| {
                format!(
                    "unknown source '{}' (expected auto, wallchain, kaito, xeet, cookie or mindoshare)",
                    s
                )
            })
    }
}

/// Classifies a sequence of recognized strings. Never fails; returns
/// `Source::Unknown` when no keyword group matches.
pub fn classify_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Source {
    let blob = texts
        .into_iter()
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    Source::KNOWN
        .into_iter()
        .find(|source| source.keywords().iter().any(|kw| blob.contains(kw)))
        .unwrap_or(Source::Unknown)
}

/// Classifies a fragment set by its text.
pub fn classify(fragments: &[TextFragment]) -> Source {
    classify_texts(fragments.iter().map(|f| f.text.as_str()))
}
