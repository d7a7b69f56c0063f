//! Label set, model output and refined labels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse activity classes produced by the model
///
/// The declaration order is the model's output order and encodes precedence:
/// on equal scores the lower index wins, so `Falling` is checked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityClass {
    Falling,
    SittingStanding,
    LyingDown,
    Walking,
    Running,
}

impl ActivityClass {
    /// All classes in model output order
    pub const ALL: [ActivityClass; 5] = [
        ActivityClass::Falling,
        ActivityClass::SittingStanding,
        ActivityClass::LyingDown,
        ActivityClass::Walking,
        ActivityClass::Running,
    ];

    /// Number of model outputs
    pub const COUNT: usize = Self::ALL.len();

    /// Class at a model output index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Model output index of this class
    pub fn index(self) -> usize {
        self as usize
    }

    /// Walking and Running drive the step counter
    pub fn is_locomotion(self) -> bool {
        matches!(self, Self::Walking | Self::Running)
    }

    /// Display name used in reports
    pub fn name(self) -> &'static str {
        match self {
            Self::Falling => "Falling",
            Self::SittingStanding => "Sitting/Standing",
            Self::LyingDown => "Lying",
            Self::Walking => "Walking",
            Self::Running => "Running",
        }
    }
}

impl fmt::Display for ActivityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Winner of the argmax over a [`LabelDistribution`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopClass {
    /// Index inside the known label set
    Known(ActivityClass),
    /// Index the label set does not cover
    Unknown(usize),
}

impl TopClass {
    /// Map a model output index to a top class
    pub fn from_index(index: usize) -> Self {
        ActivityClass::from_index(index)
            .map(Self::Known)
            .unwrap_or(Self::Unknown(index))
    }

    /// Known class, if any
    pub fn class(self) -> Option<ActivityClass> {
        match self {
            Self::Known(class) => Some(class),
            Self::Unknown(_) => None,
        }
    }

    /// Metrics/log key
    pub fn key(self) -> &'static str {
        match self {
            Self::Known(ActivityClass::Falling) => "falling",
            Self::Known(ActivityClass::SittingStanding) => "sitting_standing",
            Self::Known(ActivityClass::LyingDown) => "lying_down",
            Self::Known(ActivityClass::Walking) => "walking",
            Self::Known(ActivityClass::Running) => "running",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Model scores aligned to [`ActivityClass::ALL`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelDistribution(Vec<f64>);

impl LabelDistribution {
    pub fn new(scores: Vec<f64>) -> Self {
        Self(scores)
    }

    pub fn scores(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Index of the highest score
    ///
    /// Ties resolve to the lowest index. NaN scores never win. Returns `None`
    /// when no score is comparable.
    pub fn top_index(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, &score) in self.0.iter().enumerate() {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((index, score)),
            }
        }
        best.map(|(index, _)| index)
    }

    /// Top class of this distribution
    pub fn top_class(&self) -> Option<TopClass> {
        self.top_index().map(TopClass::from_index)
    }

    /// Score of a known class
    pub fn score(&self, class: ActivityClass) -> Option<f64> {
        self.0.get(class.index()).copied()
    }
}

impl From<Vec<f64>> for LabelDistribution {
    fn from(scores: Vec<f64>) -> Self {
        Self(scores)
    }
}

impl From<[f64; ActivityClass::COUNT]> for LabelDistribution {
    fn from(scores: [f64; ActivityClass::COUNT]) -> Self {
        Self(scores.to_vec())
    }
}

/// Refined posture or motion label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinedLabel {
    Falling,
    DeskWork,
    Sitting,
    Standing,
    SittingBentBackward,
    SittingBentForward,
    LyingOnBack,
    LyingOnRight,
    LyingOnLeft,
    LyingOnStomach,
    Walking,
    ClimbingStairs,
    DescendingStairs,
    Running,
    GeneralMovement,
}

impl RefinedLabel {
    /// Human-readable label
    pub fn text(self) -> &'static str {
        match self {
            Self::Falling => "Falling",
            Self::DeskWork => "Doing Desk Work",
            Self::Sitting => "Sitting",
            Self::Standing => "Standing",
            Self::SittingBentBackward => "Sitting bent backward",
            Self::SittingBentForward => "Sitting bent forward",
            Self::LyingOnBack => "Lying Down on Back",
            Self::LyingOnRight => "Lying Down on Right",
            Self::LyingOnLeft => "Lying Down on Left",
            Self::LyingOnStomach => "Lying Down on Stomach",
            Self::Walking => "Walking",
            Self::ClimbingStairs => "Climbing Stairs",
            Self::DescendingStairs => "Descending Stairs",
            Self::Running => "Running",
            Self::GeneralMovement => "General Movement",
        }
    }

    /// Whether the label came out of a refinement rule rather than verbatim
    pub fn is_refined(self) -> bool {
        !matches!(self, Self::Falling | Self::Running | Self::GeneralMovement)
    }
}

impl fmt::Display for RefinedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Icon key shown next to a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconTag {
    Falling,
    Sitting,
    Lying,
    Walking,
    Running,
    GeneralMovement,
}

impl IconTag {
    /// Icon for a top class
    pub fn for_top_class(top: TopClass) -> Self {
        match top {
            TopClass::Known(ActivityClass::Falling) => Self::Falling,
            TopClass::Known(ActivityClass::SittingStanding) => Self::Sitting,
            TopClass::Known(ActivityClass::LyingDown) => Self::Lying,
            TopClass::Known(ActivityClass::Walking) => Self::Walking,
            TopClass::Known(ActivityClass::Running) => Self::Running,
            TopClass::Unknown(_) => Self::GeneralMovement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_first_index_wins() {
        let dist = LabelDistribution::from([0.1, 0.4, 0.4, 0.05, 0.05]);
        assert_eq!(dist.top_index(), Some(1));
        assert_eq!(
            dist.top_class(),
            Some(TopClass::Known(ActivityClass::SittingStanding))
        );
    }

    #[test]
    fn test_argmax_all_equal_picks_falling() {
        let dist = LabelDistribution::from([0.2; 5]);
        assert_eq!(
            dist.top_class(),
            Some(TopClass::Known(ActivityClass::Falling))
        );
    }

    #[test]
    fn test_argmax_skips_nan() {
        let dist = LabelDistribution::new(vec![f64::NAN, 0.1, 0.3, f64::NAN, 0.2]);
        assert_eq!(dist.top_index(), Some(2));

        let all_nan = LabelDistribution::new(vec![f64::NAN; 5]);
        assert_eq!(all_nan.top_index(), None);
        assert_eq!(LabelDistribution::default().top_index(), None);
    }

    #[test]
    fn test_out_of_range_index_is_unknown() {
        let dist = LabelDistribution::new(vec![0.0, 0.1, 0.1, 0.1, 0.1, 0.6]);
        assert_eq!(dist.top_class(), Some(TopClass::Unknown(5)));
        assert_eq!(TopClass::Unknown(5).key(), "unknown");
        assert_eq!(
            IconTag::for_top_class(TopClass::Unknown(5)),
            IconTag::GeneralMovement
        );
    }

    #[test]
    fn test_locomotion_classes() {
        assert!(ActivityClass::Walking.is_locomotion());
        assert!(ActivityClass::Running.is_locomotion());
        assert!(!ActivityClass::LyingDown.is_locomotion());
    }

    #[test]
    fn test_refined_text() {
        assert_eq!(RefinedLabel::DeskWork.text(), "Doing Desk Work");
        assert_eq!(RefinedLabel::SittingBentForward.to_string(), "Sitting bent forward");
        assert!(RefinedLabel::Sitting.is_refined());
        assert!(!RefinedLabel::Running.is_refined());
    }
}
