//! Independent engines for several streams.

use std::collections::HashMap;
use std::fmt;

use contracts::{
    ClassificationResult, ContractError, InferenceEngine, MonitorConfig, Sample, StreamConfig,
    StreamId,
};

use crate::engine::ClassificationEngine;

/// One [`ClassificationEngine`] per stream
///
/// Streams share no mutable state; a sample only ever reaches the engine of
/// its own stream.
pub struct SessionSet<E> {
    sessions: HashMap<StreamId, ClassificationEngine<E>>,
}

impl<E: InferenceEngine> fmt::Debug for SessionSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.sessions.iter()).finish()
    }
}

impl<E> Default for SessionSet<E> {
    fn default() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }
}

impl<E: InferenceEngine> SessionSet<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one engine per configured stream, `model_for` supplies each model
    pub fn from_config<F>(config: &MonitorConfig, mut model_for: F) -> Result<Self, ContractError>
    where
        F: FnMut(&StreamConfig) -> Result<E, ContractError>,
    {
        let mut set = Self::new();
        for stream in &config.streams {
            let model = model_for(stream)?;
            set.insert(ClassificationEngine::new(
                stream.id.clone(),
                config.pipeline_for(stream),
                model,
            ));
        }
        Ok(set)
    }

    /// Register an engine, replacing any previous engine of the same stream
    pub fn insert(&mut self, engine: ClassificationEngine<E>) -> Option<ClassificationEngine<E>> {
        self.sessions.insert(engine.stream_id().clone(), engine)
    }

    /// Route a sample to its stream's engine
    pub fn submit(
        &mut self,
        stream_id: &str,
        sample: Sample,
    ) -> Result<Option<ClassificationResult>, ContractError> {
        self.sessions
            .get_mut(stream_id)
            .ok_or_else(|| ContractError::UnknownStream {
                stream_id: stream_id.into(),
            })?
            .submit(sample)
    }

    pub fn get(&self, stream_id: &str) -> Option<&ClassificationEngine<E>> {
        self.sessions.get(stream_id)
    }

    pub fn get_mut(&mut self, stream_id: &str) -> Option<&mut ClassificationEngine<E>> {
        self.sessions.get_mut(stream_id)
    }

    /// Drop a stream's session
    pub fn remove(&mut self, stream_id: &str) -> Option<ClassificationEngine<E>> {
        self.sessions.remove(stream_id)
    }

    pub fn stream_ids(&self) -> impl Iterator<Item = &StreamId> {
        self.sessions.keys()
    }

    pub fn engines(&self) -> impl Iterator<Item = &ClassificationEngine<E>> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ConfigVersion, InferenceError, LabelDistribution, PipelineConfig, SensorKind, Vector3,
        WindowLayout,
    };

    struct Constant(LabelDistribution);

    impl InferenceEngine for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn run(
            &mut self,
            _window: &[Sample],
            _layout: WindowLayout,
        ) -> Result<LabelDistribution, InferenceError> {
            Ok(self.0.clone())
        }
    }

    fn config() -> MonitorConfig {
        let mut thingy_pipeline = PipelineConfig::default();
        thingy_pipeline.window.length = 20;
        thingy_pipeline.window.retain = 10;
        MonitorConfig {
            version: ConfigVersion::V1,
            streams: vec![
                StreamConfig {
                    id: "respeck".into(),
                    sensor: SensorKind::Respeck,
                    sample_rate_hz: 25.0,
                    pipeline: None,
                },
                StreamConfig {
                    id: "thingy".into(),
                    sensor: SensorKind::Thingy,
                    sample_rate_hz: 25.0,
                    pipeline: Some(thingy_pipeline),
                },
            ],
            pipeline: PipelineConfig::default(),
            model: Default::default(),
            ingestion: Default::default(),
            sinks: Vec::new(),
        }
    }

    fn sample(i: usize) -> Sample {
        Sample::new(i as f64, Vector3::new(0.0, 0.0, 1.0), Vector3::default())
    }

    #[test]
    fn test_streams_are_independent() {
        let mut sessions = SessionSet::from_config(&config(), |_| {
            Ok(Constant(LabelDistribution::from([1.0, 0.0, 0.0, 0.0, 0.0])))
        })
        .unwrap();
        assert_eq!(sessions.len(), 2);

        let mut thingy_results = 0;
        for i in 0..20 {
            if sessions.submit("thingy", sample(i)).unwrap().is_some() {
                thingy_results += 1;
            }
        }
        assert_eq!(thingy_results, 1);
        assert_eq!(sessions.get("respeck").unwrap().buffered(), 0);
        assert_eq!(sessions.get("thingy").unwrap().windows_evaluated(), 1);

        for i in 0..49 {
            assert!(sessions.submit("respeck", sample(i)).unwrap().is_none());
        }
        let result = sessions.submit("respeck", sample(49)).unwrap().unwrap();
        assert_eq!(result.stream_id, "respeck");
        assert_eq!(result.window_index, 0);
    }

    #[test]
    fn test_unknown_stream() {
        let mut sessions: SessionSet<Constant> = SessionSet::new();
        let err = sessions.submit("ghost", sample(0)).unwrap_err();
        assert!(matches!(err, ContractError::UnknownStream { .. }));
    }

    #[test]
    fn test_model_factory_error_propagates() {
        let result: Result<SessionSet<Constant>, _> = SessionSet::from_config(&config(), |_| {
            Err(ContractError::Inference(InferenceError::Unavailable))
        });
        assert!(result.is_err());
    }
}
