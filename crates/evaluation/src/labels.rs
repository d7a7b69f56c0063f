//! Ground-truth activity names of the labelled data set

use contracts::{ActivityClass, RefinedLabel};

/// Rows with this activity are left out of the evaluation
pub const MOVEMENT: &str = "Movement";

/// Coarse class the model is trained to predict for an activity name
pub fn coarse_class(activity: &str) -> Option<ActivityClass> {
    let class = match activity {
        "Climbing stairs" | "Descending stairs" | "Walking at normal speed" => {
            ActivityClass::Walking
        }
        "Desk work" | "Sitting" | "Sitting bent backward" | "Sitting bent forward"
        | "Standing" => ActivityClass::SittingStanding,
        "Falling on knees" | "Falling on the back" | "Falling on the left"
        | "Falling on the right" => ActivityClass::Falling,
        "Lying down left" | "Lying down on back" | "Lying down on stomach"
        | "Lying down right" => ActivityClass::LyingDown,
        "Running" => ActivityClass::Running,
        _ => return None,
    };
    Some(class)
}

/// Refined label matching an activity name, when the post-classifier
/// distinguishes it
pub fn expected_refined(activity: &str) -> Option<RefinedLabel> {
    let label = match activity {
        "Desk work" => RefinedLabel::DeskWork,
        "Sitting" => RefinedLabel::Sitting,
        "Standing" => RefinedLabel::Standing,
        "Sitting bent backward" => RefinedLabel::SittingBentBackward,
        "Sitting bent forward" => RefinedLabel::SittingBentForward,
        "Lying down on back" => RefinedLabel::LyingOnBack,
        "Lying down right" => RefinedLabel::LyingOnRight,
        "Lying down left" => RefinedLabel::LyingOnLeft,
        "Lying down on stomach" => RefinedLabel::LyingOnStomach,
        "Walking at normal speed" => RefinedLabel::Walking,
        "Climbing stairs" => RefinedLabel::ClimbingStairs,
        "Descending stairs" => RefinedLabel::DescendingStairs,
        _ => return None,
    };
    Some(label)
}
