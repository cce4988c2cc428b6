use super::PipelineOutput;
use crate::compiler::CompileState;
use crate::file_processor::FileMetadata;
use crate::registry::{EngineRegistry, RegistrySummary};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PipelineStats {
    pub source_bytes: u64,
    pub line_count: usize,
    pub objects: RegistrySummary,
    pub read_duration: Duration,
    pub compile_duration: Duration,
}

impl PipelineStats {
    pub fn total_duration(&self) -> Duration {
        self.read_duration + self.compile_duration
    }

    /// Source bytes compiled per second
    pub fn processing_rate(&self) -> f64 {
        let seconds = self.total_duration().as_secs_f64();
        if seconds > 0.0 {
            self.source_bytes as f64 / seconds
        } else {
            0.0
        }
    }
}

/// A script that compiled cleanly, with the objects it defined
#[derive(Debug)]
pub struct PipelineResult {
    pub file_metadata: FileMetadata,
    pub registry: EngineRegistry,
    pub environment: BTreeMap<String, String>,
    pub state: CompileState,
    pub stats: PipelineStats,
}

impl PipelineResult {
    pub fn output(&self, file_path: &str) -> PipelineOutput {
        PipelineOutput::new(file_path, self)
    }

    pub fn log_success(&self, file_path: &str) {
        crate::log_success!(
            crate::logging::codes::success::COMPILE_COMMITTED,
            "Script compiled",
            "file" => file_path,
            "objects" => self.stats.objects.total(),
            "duration_ms" => format!("{:.2}", self.stats.total_duration().as_secs_f64() * 1000.0),
            "bytes_per_sec" => format!("{:.0}", self.stats.processing_rate())
        );
    }
}
