use super::PipelineResult;
use crate::compiler::CompileState;
use crate::registry::{Compositor, GpuProgram, Material, ParticleSystem, RegistrySummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Serializable snapshot of one compiled script
#[derive(Debug, Serialize)]
pub struct PipelineOutput {
    pub file: String,
    pub compiled_at: DateTime<Utc>,
    pub state: CompileState,
    pub summary: RegistrySummary,
    pub environment: BTreeMap<String, String>,
    pub compositors: Vec<Compositor>,
    pub materials: Vec<Material>,
    pub particle_systems: Vec<ParticleSystem>,
    pub gpu_programs: Vec<GpuProgram>,
}

impl PipelineOutput {
    pub fn new(file: &str, result: &PipelineResult) -> Self {
        Self {
            file: file.to_string(),
            compiled_at: Utc::now(),
            state: result.state,
            summary: result.stats.objects,
            environment: result.environment.clone(),
            compositors: result.registry.compositors().to_vec(),
            materials: result.registry.materials().to_vec(),
            particle_systems: result.registry.particle_systems().to_vec(),
            gpu_programs: result.registry.gpu_programs().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
