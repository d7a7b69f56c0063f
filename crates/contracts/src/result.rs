//! ClassificationResult - output of one window evaluation

use serde::{Deserialize, Serialize};

use crate::{IconTag, LabelDistribution, RefinedLabel, StreamId, TopClass};

/// Prefix shown before refined labels
pub const DISPLAY_PREFIX: &str = "You are currently: ";

/// One refined label per evaluated window
///
/// Immutable; the engine keeps no history of past results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Stream the window belongs to
    pub stream_id: StreamId,

    /// Evaluation counter of the stream, starting at 0
    pub window_index: u64,

    /// Timestamp of the newest sample in the window
    pub timestamp: f64,

    /// Argmax of the model output
    pub top_class: TopClass,

    /// Refined posture or motion
    pub refined: RefinedLabel,

    /// Icon key for the top class
    pub icon: IconTag,

    /// Raw model scores
    pub distribution: LabelDistribution,

    /// Session step total, set for locomotion windows only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_count: Option<u64>,
}

impl ClassificationResult {
    /// Bare refined label text
    pub fn text(&self) -> &'static str {
        self.refined.text()
    }

    /// Text as presented to the wearer
    pub fn display_text(&self) -> String {
        if self.refined.is_refined() {
            format!("{}{}", DISPLAY_PREFIX, self.refined.text())
        } else {
            self.refined.text().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActivityClass;

    fn result(refined: RefinedLabel, top: ActivityClass) -> ClassificationResult {
        ClassificationResult {
            stream_id: "respeck".into(),
            window_index: 0,
            timestamp: 1.0,
            top_class: TopClass::Known(top),
            refined,
            icon: IconTag::for_top_class(TopClass::Known(top)),
            distribution: LabelDistribution::default(),
            step_count: None,
        }
    }

    #[test]
    fn test_display_text() {
        let sitting = result(RefinedLabel::Sitting, ActivityClass::SittingStanding);
        assert_eq!(sitting.display_text(), "You are currently: Sitting");
        assert_eq!(sitting.icon, IconTag::Sitting);

        let falling = result(RefinedLabel::Falling, ActivityClass::Falling);
        assert_eq!(falling.display_text(), "Falling");
    }

    #[test]
    fn test_json_omits_missing_step_count() {
        let r = result(RefinedLabel::LyingOnBack, ActivityClass::LyingDown);
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("step_count"));
        assert!(json.contains("\"refined\":\"lying_on_back\""));
        let back: ClassificationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
