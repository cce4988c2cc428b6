//! Engine objects produced by translation
//!
//! The registry is created by the caller and passed into every compile, so
//! several scripts can build into one registry and independent compiles never
//! share state. Translators reach the objects they populate through
//! [`ContextHandle`]s, which are index paths that stay valid for the life of
//! the registry.

pub mod compositor;
pub mod material;
pub mod particle;
pub mod program;

pub use compositor::{
    ClearBuffers, ClearSettings, CompositionPass, Compositor, CompositorTechnique, PassInput,
    StencilSettings, TargetPass, TargetSlot, TextureDefinition, TextureSize,
};
pub use material::{
    AddressModes, Material, MaterialPass, MaterialTechnique, ProgramRef, ProgramRefSlot, SceneBlend,
    TextureSource, TextureUnit, TrackVertexColour,
};
pub use particle::{ParticleAffector, ParticleEmitter, ParticleSystem};
pub use program::{
    AutoExtra, GpuProgram, GpuProgramType, ParameterSlot, ParameterValue, ProgramParameters,
};

use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColourValue {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColourValue {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Path from the registry root to one engine object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContextHandle {
    Compositor {
        compositor: usize,
    },
    CompositorTechnique {
        compositor: usize,
        technique: usize,
    },
    TargetPass {
        compositor: usize,
        technique: usize,
        target: TargetSlot,
    },
    CompositionPass {
        compositor: usize,
        technique: usize,
        target: TargetSlot,
        pass: usize,
    },
    Material {
        material: usize,
    },
    MaterialTechnique {
        material: usize,
        technique: usize,
    },
    MaterialPass {
        material: usize,
        technique: usize,
        pass: usize,
    },
    TextureUnit {
        material: usize,
        technique: usize,
        pass: usize,
        unit: usize,
    },
    ParticleSystem {
        system: usize,
    },
    ParticleEmitter {
        system: usize,
        emitter: usize,
    },
    ParticleAffector {
        system: usize,
        affector: usize,
    },
    GpuProgram {
        program: usize,
    },
}

impl ContextHandle {
    pub fn compositor_technique(self, technique: usize) -> Option<Self> {
        match self {
            Self::Compositor { compositor } => Some(Self::CompositorTechnique {
                compositor,
                technique,
            }),
            _ => None,
        }
    }

    pub fn target_pass(self, target: TargetSlot) -> Option<Self> {
        match self {
            Self::CompositorTechnique {
                compositor,
                technique,
            } => Some(Self::TargetPass {
                compositor,
                technique,
                target,
            }),
            _ => None,
        }
    }

    pub fn composition_pass(self, pass: usize) -> Option<Self> {
        match self {
            Self::TargetPass {
                compositor,
                technique,
                target,
            } => Some(Self::CompositionPass {
                compositor,
                technique,
                target,
                pass,
            }),
            _ => None,
        }
    }

    pub fn material_technique(self, technique: usize) -> Option<Self> {
        match self {
            Self::Material { material } => Some(Self::MaterialTechnique {
                material,
                technique,
            }),
            _ => None,
        }
    }

    pub fn material_pass(self, pass: usize) -> Option<Self> {
        match self {
            Self::MaterialTechnique {
                material,
                technique,
            } => Some(Self::MaterialPass {
                material,
                technique,
                pass,
            }),
            _ => None,
        }
    }

    pub fn texture_unit(self, unit: usize) -> Option<Self> {
        match self {
            Self::MaterialPass {
                material,
                technique,
                pass,
            } => Some(Self::TextureUnit {
                material,
                technique,
                pass,
                unit,
            }),
            _ => None,
        }
    }

    pub fn particle_emitter(self, emitter: usize) -> Option<Self> {
        match self {
            Self::ParticleSystem { system } => Some(Self::ParticleEmitter { system, emitter }),
            _ => None,
        }
    }

    pub fn particle_affector(self, affector: usize) -> Option<Self> {
        match self {
            Self::ParticleSystem { system } => Some(Self::ParticleAffector { system, affector }),
            _ => None,
        }
    }
}

/// Object counts for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySummary {
    pub compositors: usize,
    pub materials: usize,
    pub particle_systems: usize,
    pub gpu_programs: usize,
}

impl RegistrySummary {
    pub fn total(&self) -> usize {
        self.compositors + self.materials + self.particle_systems + self.gpu_programs
    }
}

#[derive(Debug, Default)]
pub struct EngineRegistry {
    compositors: Vec<Compositor>,
    compositor_names: HashMap<String, usize>,
    materials: Vec<Material>,
    material_names: HashMap<String, usize>,
    particle_systems: Vec<ParticleSystem>,
    particle_system_names: HashMap<String, usize>,
    gpu_programs: Vec<GpuProgram>,
    gpu_program_names: HashMap<String, usize>,
}

/// Index of `name`, resetting an existing entry so a redefinition replaces
/// the old content instead of adding to it
fn create_or_reset<T>(
    items: &mut Vec<T>,
    names: &mut HashMap<String, usize>,
    name: &str,
    make: impl Fn(&str) -> T,
) -> usize {
    match names.get(name) {
        Some(&index) => {
            items[index] = make(name);
            index
        }
        None => {
            items.push(make(name));
            names.insert(name.to_string(), items.len() - 1);
            items.len() - 1
        }
    }
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_or_get_compositor(&mut self, name: &str) -> ContextHandle {
        let compositor = create_or_reset(
            &mut self.compositors,
            &mut self.compositor_names,
            name,
            Compositor::new,
        );
        ContextHandle::Compositor { compositor }
    }

    pub fn create_or_get_material(&mut self, name: &str) -> ContextHandle {
        let material = create_or_reset(
            &mut self.materials,
            &mut self.material_names,
            name,
            Material::new,
        );
        ContextHandle::Material { material }
    }

    pub fn create_or_get_particle_system(&mut self, name: &str) -> ContextHandle {
        let system = create_or_reset(
            &mut self.particle_systems,
            &mut self.particle_system_names,
            name,
            ParticleSystem::new,
        );
        ContextHandle::ParticleSystem { system }
    }

    pub fn create_or_get_gpu_program(
        &mut self,
        name: &str,
        program_type: GpuProgramType,
    ) -> ContextHandle {
        let program = create_or_reset(
            &mut self.gpu_programs,
            &mut self.gpu_program_names,
            name,
            |name| GpuProgram::new(name, program_type),
        );
        ContextHandle::GpuProgram { program }
    }

    pub fn compositor(&self, name: &str) -> Option<&Compositor> {
        self.compositor_names
            .get(name)
            .and_then(|&i| self.compositors.get(i))
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.material_names
            .get(name)
            .and_then(|&i| self.materials.get(i))
    }

    pub fn particle_system(&self, name: &str) -> Option<&ParticleSystem> {
        self.particle_system_names
            .get(name)
            .and_then(|&i| self.particle_systems.get(i))
    }

    pub fn gpu_program(&self, name: &str) -> Option<&GpuProgram> {
        self.gpu_program_names
            .get(name)
            .and_then(|&i| self.gpu_programs.get(i))
    }

    pub fn compositors(&self) -> &[Compositor] {
        &self.compositors
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn particle_systems(&self) -> &[ParticleSystem] {
        &self.particle_systems
    }

    pub fn gpu_programs(&self) -> &[GpuProgram] {
        &self.gpu_programs
    }

    pub fn summary(&self) -> RegistrySummary {
        RegistrySummary {
            compositors: self.compositors.len(),
            materials: self.materials.len(),
            particle_systems: self.particle_systems.len(),
            gpu_programs: self.gpu_programs.len(),
        }
    }

    // ------------------------------------------------------------------
    // Handle resolution. Each returns None when the handle is of another
    // kind or points past the end of a list.
    // ------------------------------------------------------------------

    pub fn compositor_mut(&mut self, handle: ContextHandle) -> Option<&mut Compositor> {
        match handle {
            ContextHandle::Compositor { compositor } => self.compositors.get_mut(compositor),
            _ => None,
        }
    }

    pub fn compositor_technique_mut(
        &mut self,
        handle: ContextHandle,
    ) -> Option<&mut CompositorTechnique> {
        match handle {
            ContextHandle::CompositorTechnique {
                compositor,
                technique,
            } => self
                .compositors
                .get_mut(compositor)?
                .techniques
                .get_mut(technique),
            _ => None,
        }
    }

    fn target_in(
        &mut self,
        compositor: usize,
        technique: usize,
        target: TargetSlot,
    ) -> Option<&mut TargetPass> {
        let technique = self
            .compositors
            .get_mut(compositor)?
            .techniques
            .get_mut(technique)?;
        match target {
            TargetSlot::Output => Some(&mut technique.output),
            TargetSlot::Intermediate(index) => technique.target_passes.get_mut(index),
        }
    }

    pub fn target_pass_mut(&mut self, handle: ContextHandle) -> Option<&mut TargetPass> {
        match handle {
            ContextHandle::TargetPass {
                compositor,
                technique,
                target,
            } => self.target_in(compositor, technique, target),
            _ => None,
        }
    }

    pub fn composition_pass_mut(&mut self, handle: ContextHandle) -> Option<&mut CompositionPass> {
        match handle {
            ContextHandle::CompositionPass {
                compositor,
                technique,
                target,
                pass,
            } => self
                .target_in(compositor, technique, target)?
                .passes
                .get_mut(pass),
            _ => None,
        }
    }

    pub fn material_mut(&mut self, handle: ContextHandle) -> Option<&mut Material> {
        match handle {
            ContextHandle::Material { material } => self.materials.get_mut(material),
            _ => None,
        }
    }

    pub fn material_technique_mut(
        &mut self,
        handle: ContextHandle,
    ) -> Option<&mut MaterialTechnique> {
        match handle {
            ContextHandle::MaterialTechnique {
                material,
                technique,
            } => self.materials.get_mut(material)?.techniques.get_mut(technique),
            _ => None,
        }
    }

    pub fn material_pass_mut(&mut self, handle: ContextHandle) -> Option<&mut MaterialPass> {
        match handle {
            ContextHandle::MaterialPass {
                material,
                technique,
                pass,
            } => self
                .materials
                .get_mut(material)?
                .techniques
                .get_mut(technique)?
                .passes
                .get_mut(pass),
            _ => None,
        }
    }

    pub fn texture_unit_mut(&mut self, handle: ContextHandle) -> Option<&mut TextureUnit> {
        match handle {
            ContextHandle::TextureUnit {
                material,
                technique,
                pass,
                unit,
            } => self
                .materials
                .get_mut(material)?
                .techniques
                .get_mut(technique)?
                .passes
                .get_mut(pass)?
                .texture_units
                .get_mut(unit),
            _ => None,
        }
    }

    pub fn particle_system_mut(&mut self, handle: ContextHandle) -> Option<&mut ParticleSystem> {
        match handle {
            ContextHandle::ParticleSystem { system } => self.particle_systems.get_mut(system),
            _ => None,
        }
    }

    pub fn gpu_program_mut(&mut self, handle: ContextHandle) -> Option<&mut GpuProgram> {
        match handle {
            ContextHandle::GpuProgram { program } => self.gpu_programs.get_mut(program),
            _ => None,
        }
    }
}
