use serde::{Deserialize, Serialize};

use crate::extract::numeral::parse_value;
use crate::extract::Source;

/// Role names granted for each tier, lowest first.
pub const TIER_ROLE_NAMES: [&str; 3] = ["Signal Lite", "Signal Amplifier", "Top Signal"];

/// Reward band derived from a dashboard score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    #[default]
    None,
    Lite,
    Amplifier,
    Top,
}

impl Tier {
    /// Role name for the tier, `None` for `Tier::None`.
    pub fn role_name(&self) -> Option<&'static str> {
        match self {
            Tier::None => None,
            Tier::Lite => Some(TIER_ROLE_NAMES[0]),
            Tier::Amplifier => Some(TIER_ROLE_NAMES[1]),
            Tier::Top => Some(TIER_ROLE_NAMES[2]),
        }
    }
}

/// Maps a score to a tier using the source's thresholds.
///
/// Bounds are deliberately uneven between sources; values falling in a gap
/// (e.g. Wallchain 75.5) get no tier. Unparsable text yields `Tier::None`.
pub fn tier_for(source: Source, score: &str) -> Tier {
    let Some(x) = parse_value(score) else {
        return Tier::None;
    };

    match source {
        Source::Kaito => {
            if x >= 1000.0 {
                Tier::Top
            } else if x >= 200.0 {
                Tier::Amplifier
            } else if x > 50.0 {
                Tier::Lite
            } else {
                Tier::None
            }
        }
        Source::Wallchain => {
            if x >= 401.0 {
                Tier::Top
            } else if (76.0..=400.0).contains(&x) {
                Tier::Amplifier
            } else if x > 10.0 && x <= 75.0 {
                Tier::Lite
            } else {
                Tier::None
            }
        }
        Source::Cookie => {
            if x >= 401.0 {
                Tier::Top
            } else if (201.0..=400.0).contains(&x) {
                Tier::Amplifier
            } else if (10.0..=200.0).contains(&x) {
                Tier::Lite
            } else {
                Tier::None
            }
        }
        Source::Xeet => {
            if x >= 1100.0 {
                Tier::Top
            } else if (301.0..1100.0).contains(&x) {
                Tier::Amplifier
            } else if (100.0..=300.0).contains(&x) {
                Tier::Lite
            } else {
                Tier::None
            }
        }
        Source::Mindoshare | Source::Unknown => Tier::None,
    }
}
