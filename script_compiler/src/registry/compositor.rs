//! Compositor object graph

use super::ColourValue;
use crate::script_enum::{CompareFunction, InputMode, PassType, StencilOperation};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Compositor {
    pub name: String,
    pub techniques: Vec<CompositorTechnique>,
}

impl Compositor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            techniques: Vec::new(),
        }
    }

    pub fn create_technique(&mut self) -> usize {
        self.techniques.push(CompositorTechnique::default());
        self.techniques.len() - 1
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompositorTechnique {
    pub texture_definitions: Vec<TextureDefinition>,
    pub target_passes: Vec<TargetPass>,
    pub output: TargetPass,
}

impl CompositorTechnique {
    pub fn create_target_pass(&mut self) -> usize {
        self.target_passes.push(TargetPass::default());
        self.target_passes.len() - 1
    }

    pub fn texture_definition(&self, name: &str) -> Option<&TextureDefinition> {
        self.texture_definitions.iter().find(|t| t.name == name)
    }
}

/// Render texture dimension, absolute or relative to the final target
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TextureSize {
    Absolute(u32),
    TargetScaled(f32),
}

impl Default for TextureSize {
    fn default() -> Self {
        TextureSize::TargetScaled(1.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextureDefinition {
    pub name: String,
    pub width: TextureSize,
    pub height: TextureSize,
    pub formats: Vec<String>,
}

/// Which target of a technique a handle points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TargetSlot {
    Output,
    Intermediate(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetPass {
    pub input: InputMode,
    pub output_name: Option<String>,
    pub only_initial: bool,
    pub visibility_mask: u32,
    pub lod_bias: f32,
    pub material_scheme: String,
    pub shadows: bool,
    pub passes: Vec<CompositionPass>,
}

impl Default for TargetPass {
    fn default() -> Self {
        Self {
            input: InputMode::None,
            output_name: None,
            only_initial: false,
            visibility_mask: 0xFFFF_FFFF,
            lod_bias: 1.0,
            material_scheme: String::new(),
            shadows: true,
            passes: Vec::new(),
        }
    }
}

impl TargetPass {
    pub fn create_pass(&mut self, pass_type: PassType) -> usize {
        self.passes.push(CompositionPass::new(pass_type));
        self.passes.len() - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClearBuffers {
    pub colour: bool,
    pub depth: bool,
    pub stencil: bool,
}

impl Default for ClearBuffers {
    fn default() -> Self {
        Self {
            colour: true,
            depth: true,
            stencil: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearSettings {
    pub buffers: ClearBuffers,
    pub colour: ColourValue,
    pub depth: f32,
    pub stencil: u32,
}

impl Default for ClearSettings {
    fn default() -> Self {
        Self {
            buffers: ClearBuffers::default(),
            colour: ColourValue::BLACK,
            depth: 1.0,
            stencil: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StencilSettings {
    pub check: bool,
    pub func: CompareFunction,
    pub ref_value: u32,
    pub mask: u32,
    pub fail_op: StencilOperation,
    pub depth_fail_op: StencilOperation,
    pub pass_op: StencilOperation,
    pub two_sided: bool,
}

impl Default for StencilSettings {
    fn default() -> Self {
        Self {
            check: true,
            func: CompareFunction::AlwaysPass,
            ref_value: 0,
            mask: 0xFFFF_FFFF,
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::Keep,
            pass_op: StencilOperation::Keep,
            two_sided: false,
        }
    }
}

/// Texture bound to a render_quad material sampler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassInput {
    pub id: u32,
    pub name: String,
    pub mrt_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionPass {
    pub pass_type: PassType,
    pub identifier: u32,
    pub first_render_queue: u8,
    pub last_render_queue: u8,
    pub material_name: Option<String>,
    pub inputs: Vec<PassInput>,
    pub clear: ClearSettings,
    pub stencil: StencilSettings,
}

impl CompositionPass {
    pub fn new(pass_type: PassType) -> Self {
        Self {
            pass_type,
            identifier: 0,
            first_render_queue: 0,
            last_render_queue: 95,
            material_name: None,
            inputs: Vec::new(),
            clear: ClearSettings::default(),
            stencil: StencilSettings::default(),
        }
    }

    /// Bind `name` to input `id`, replacing an earlier binding of that id
    pub fn set_input(&mut self, id: u32, name: &str, mrt_index: u32) {
        self.inputs.retain(|input| input.id != id);
        self.inputs.push(PassInput {
            id,
            name: name.to_string(),
            mrt_index,
        });
        self.inputs.sort_by_key(|input| input.id);
    }
}
