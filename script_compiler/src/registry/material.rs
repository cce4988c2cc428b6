//! Material object graph

use super::{ColourValue, ProgramParameters};
use crate::script_enum::{
    CompareFunction, CullingMode, ManualCullingMode, PolygonMode, SceneBlendFactor,
    SceneBlendOperation, SceneBlendType, ShadeOptions, TextureAddressing, TextureFiltering,
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub name: String,
    pub lod_distances: Vec<f32>,
    pub receive_shadows: bool,
    pub techniques: Vec<MaterialTechnique>,
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            lod_distances: Vec::new(),
            receive_shadows: true,
            techniques: Vec::new(),
        }
    }

    pub fn create_technique(&mut self) -> usize {
        self.techniques.push(MaterialTechnique::default());
        self.techniques.len() - 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialTechnique {
    pub name: Option<String>,
    pub scheme: String,
    pub lod_index: u16,
    pub passes: Vec<MaterialPass>,
}

impl Default for MaterialTechnique {
    fn default() -> Self {
        Self {
            name: None,
            scheme: "Default".to_string(),
            lod_index: 0,
            passes: Vec::new(),
        }
    }
}

impl MaterialTechnique {
    pub fn create_pass(&mut self) -> usize {
        self.passes.push(MaterialPass::default());
        self.passes.len() - 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialPass {
    pub name: Option<String>,
    pub ambient: ColourValue,
    pub diffuse: ColourValue,
    pub specular: ColourValue,
    pub shininess: f32,
    pub emissive: ColourValue,
    pub scene_blend: Option<SceneBlend>,
    /// Colour and alpha blending set apart
    pub separate_scene_blend: Option<(SceneBlend, SceneBlend)>,
    pub scene_blend_op: SceneBlendOperation,
    pub separate_scene_blend_op: Option<(SceneBlendOperation, SceneBlendOperation)>,
    pub vertex_colour_tracking: TrackVertexColour,
    pub depth_check: bool,
    pub depth_write: bool,
    pub depth_func: CompareFunction,
    pub cull_hardware: CullingMode,
    pub cull_software: ManualCullingMode,
    pub lighting: bool,
    pub shading: ShadeOptions,
    pub polygon_mode: PolygonMode,
    pub max_lights: u16,
    pub program_refs: BTreeMap<ProgramRefSlot, ProgramRef>,
    pub texture_units: Vec<TextureUnit>,
}

impl Default for MaterialPass {
    fn default() -> Self {
        Self {
            name: None,
            ambient: ColourValue::WHITE,
            diffuse: ColourValue::WHITE,
            specular: ColourValue::BLACK,
            shininess: 0.0,
            emissive: ColourValue::BLACK,
            scene_blend: None,
            separate_scene_blend: None,
            scene_blend_op: SceneBlendOperation::Add,
            separate_scene_blend_op: None,
            vertex_colour_tracking: TrackVertexColour::default(),
            depth_check: true,
            depth_write: true,
            depth_func: CompareFunction::LessEqual,
            cull_hardware: CullingMode::Clockwise,
            cull_software: ManualCullingMode::Back,
            lighting: true,
            shading: ShadeOptions::Gouraud,
            polygon_mode: PolygonMode::Solid,
            max_lights: 8,
            program_refs: BTreeMap::new(),
            texture_units: Vec::new(),
        }
    }
}

impl MaterialPass {
    pub fn create_texture_unit(&mut self) -> usize {
        self.texture_units.push(TextureUnit::default());
        self.texture_units.len() - 1
    }
}

/// A blend preset, or explicit source and destination factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SceneBlend {
    Type(SceneBlendType),
    Factors {
        source: SceneBlendFactor,
        dest: SceneBlendFactor,
    },
}

/// Material colours replaced by the vertex colour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackVertexColour {
    pub ambient: bool,
    pub diffuse: bool,
    pub specular: bool,
    pub emissive: bool,
}

/// Program stage a pass binds a program to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ProgramRefSlot {
    Vertex,
    Fragment,
    Geometry,
    ShadowCasterVertex,
    ShadowReceiverVertex,
    ShadowReceiverFragment,
}

/// A program used by a pass, with the pass's own parameter values
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgramRef {
    pub program: String,
    pub parameters: ProgramParameters,
}

/// Addressing per texture coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AddressModes {
    pub u: TextureAddressing,
    pub v: TextureAddressing,
    pub w: TextureAddressing,
}

impl AddressModes {
    pub fn uniform(mode: TextureAddressing) -> Self {
        Self {
            u: mode,
            v: mode,
            w: mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextureUnit {
    pub name: Option<String>,
    pub texture: Option<String>,
    pub address_modes: AddressModes,
    pub filtering: TextureFiltering,
    pub tex_coord_set: u32,
    pub max_anisotropy: u32,
    pub texture_source: Option<TextureSource>,
}

impl Default for TextureUnit {
    fn default() -> Self {
        Self {
            name: None,
            texture: None,
            address_modes: AddressModes::default(),
            filtering: TextureFiltering::Bilinear,
            tex_coord_set: 0,
            max_anisotropy: 1,
            texture_source: None,
        }
    }
}

/// External texture producer plugged into a texture unit
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextureSource {
    pub source_type: String,
    pub parameters: BTreeMap<String, String>,
}
