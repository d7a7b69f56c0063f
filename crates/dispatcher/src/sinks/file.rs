//! FileSink - one JSONL file per stream

use contracts::{ClassificationResult, ContractError, ResultSink, StreamId};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output directory; results land in `<base_path>/<stream_id>.jsonl`
    pub base_path: PathBuf,
}

impl FileSinkConfig {
    /// Config from the sink's `params`; `path` is required
    pub fn from_params(params: &HashMap<String, String>) -> std::io::Result<Self> {
        let base_path = params.get("path").map(PathBuf::from).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing 'path' parameter")
        })?;
        Ok(Self { base_path })
    }
}

/// Appends results as JSON lines
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writers: HashMap<StreamId, BufWriter<File>>,
}

impl FileSink {
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            config,
            writers: HashMap::new(),
        })
    }

    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params)?)
    }

    /// File holding the results of `stream_id`
    pub fn stream_path(&self, stream_id: &str) -> PathBuf {
        stream_file(&self.config.base_path, stream_id)
    }

    fn append(&mut self, result: &ClassificationResult) -> std::io::Result<()> {
        if !self.writers.contains_key(&result.stream_id) {
            let path = stream_file(&self.config.base_path, &result.stream_id);
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            debug!(sink = %self.name, path = %path.display(), "opened result file");
            self.writers
                .insert(result.stream_id.clone(), BufWriter::new(file));
        }

        if let Some(writer) = self.writers.get_mut(&result.stream_id) {
            serde_json::to_writer(&mut *writer, result)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }

    fn flush_all(&mut self) -> std::io::Result<()> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

fn stream_file(base: &Path, stream_id: &str) -> PathBuf {
    base.join(format!("{stream_id}.jsonl"))
}

impl ResultSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, result),
        fields(sink = %self.name, stream_id = %result.stream_id)
    )]
    async fn write(&mut self, result: &ClassificationResult) -> Result<(), ContractError> {
        self.append(result).map_err(|e| {
            error!(sink = %self.name, error = %e, "write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.flush_all()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        let flushed = self.flush_all();
        self.writers.clear();
        debug!(sink = %self.name, "file sink closed");
        flushed.map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }
}
