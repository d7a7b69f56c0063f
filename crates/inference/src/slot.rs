//! Model slot that can be empty.

use contracts::{InferenceEngine, InferenceError, LabelDistribution, Sample, WindowLayout};

use crate::BoxedEngine;

/// Holds the model once it is loaded
///
/// Reports [`InferenceError::Unavailable`] while empty, so a stream can start
/// before its model is ready and pick it up on a later window.
pub struct ModelSlot<E = BoxedEngine> {
    engine: Option<E>,
}

impl<E> Default for ModelSlot<E> {
    fn default() -> Self {
        Self { engine: None }
    }
}

impl<E: InferenceEngine> ModelSlot<E> {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn loaded(engine: E) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    /// Install a model, returning the previous one
    pub fn install(&mut self, engine: E) -> Option<E> {
        tracing::info!(model = engine.name(), "model installed");
        self.engine.replace(engine)
    }

    pub fn unload(&mut self) -> Option<E> {
        self.engine.take()
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.is_some()
    }
}

impl<E: InferenceEngine> InferenceEngine for ModelSlot<E> {
    fn name(&self) -> &str {
        self.engine.as_ref().map_or("empty", |e| e.name())
    }

    fn run(
        &mut self,
        window: &[Sample],
        layout: WindowLayout,
    ) -> Result<LabelDistribution, InferenceError> {
        match self.engine.as_mut() {
            Some(engine) => engine.run(window, layout),
            None => Err(InferenceError::Unavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedEngine;
    use contracts::ActivityClass;

    #[test]
    fn test_empty_slot_is_unavailable() {
        let mut slot: ModelSlot<ScriptedEngine> = ModelSlot::empty();
        assert!(!slot.is_loaded());
        assert_eq!(slot.name(), "empty");
        assert_eq!(
            slot.run(&[], WindowLayout::new(2, 25)),
            Err(InferenceError::Unavailable)
        );
    }

    #[test]
    fn test_install_and_unload() {
        let mut slot = ModelSlot::empty();
        assert!(slot
            .install(ScriptedEngine::constant(ActivityClass::Running))
            .is_none());
        let dist = slot.run(&[], WindowLayout::new(2, 25)).unwrap();
        assert_eq!(dist.top_index(), Some(ActivityClass::Running.index()));

        assert!(slot.unload().is_some());
        assert!(slot.run(&[], WindowLayout::new(2, 25)).is_err());
    }
}
