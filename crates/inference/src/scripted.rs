//! Scripted engine for tests and demos.

use contracts::{
    ActivityClass, InferenceEngine, InferenceError, LabelDistribution, Sample, WindowLayout,
};

/// Replays a fixed list of outputs, cycling when exhausted
#[derive(Debug, Clone)]
pub struct ScriptedEngine {
    outputs: Vec<Result<LabelDistribution, InferenceError>>,
    cursor: usize,
    calls: usize,
}

impl ScriptedEngine {
    pub fn new(outputs: Vec<Result<LabelDistribution, InferenceError>>) -> Self {
        Self {
            outputs,
            cursor: 0,
            calls: 0,
        }
    }

    /// Always picks `class`
    pub fn constant(class: ActivityClass) -> Self {
        Self::new(vec![Ok(one_hot(class))])
    }

    /// Picks the given classes in turn
    pub fn sequence(classes: &[ActivityClass]) -> Self {
        Self::new(classes.iter().map(|c| Ok(one_hot(*c))).collect())
    }

    /// Always fails with `error`
    pub fn failing(error: InferenceError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Number of `run` calls so far
    pub fn calls(&self) -> usize {
        self.calls
    }
}

/// Distribution with all mass on one class
pub fn one_hot(class: ActivityClass) -> LabelDistribution {
    let mut scores = [0.0; ActivityClass::COUNT];
    scores[class.index()] = 1.0;
    LabelDistribution::from(scores)
}

impl InferenceEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn run(
        &mut self,
        _window: &[Sample],
        _layout: WindowLayout,
    ) -> Result<LabelDistribution, InferenceError> {
        self.calls += 1;
        if self.outputs.is_empty() {
            return Err(InferenceError::Unavailable);
        }
        let output = self.outputs[self.cursor % self.outputs.len()].clone();
        self.cursor += 1;
        output
    }
}
