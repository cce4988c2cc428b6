//! GPU programs and the parameter bindings passes attach to them

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GpuProgramType {
    Vertex,
    Fragment,
    Geometry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuProgram {
    pub name: String,
    pub program_type: GpuProgramType,
    /// Shading language or assembler family, e.g. `glsl`, `hlsl`, `asm`
    pub language: String,
    pub source: Option<String>,
    pub syntax: Option<String>,
    /// Language specific properties kept as written
    pub custom_parameters: BTreeMap<String, String>,
    pub default_parameters: ProgramParameters,
}

impl GpuProgram {
    pub fn new(name: &str, program_type: GpuProgramType) -> Self {
        Self {
            name: name.to_string(),
            program_type,
            language: String::new(),
            source: None,
            syntax: None,
            custom_parameters: BTreeMap::new(),
            default_parameters: ProgramParameters::default(),
        }
    }
}

/// Where a constant is bound in the program
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterSlot {
    Named(String),
    Indexed(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParameterValue {
    Float(Vec<f32>),
    Int(Vec<i32>),
    Matrix4([f32; 16]),
    Auto { constant: String, extra: AutoExtra },
}

/// Extra argument carried by an auto constant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AutoExtra {
    None,
    Int(u32),
    Real(f32),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgramParameters {
    pub named: BTreeMap<String, ParameterValue>,
    pub indexed: BTreeMap<u32, ParameterValue>,
    pub shared: Vec<String>,
}

impl ProgramParameters {
    /// Bind `value`, replacing whatever the slot held before
    pub fn set(&mut self, slot: ParameterSlot, value: ParameterValue) {
        match slot {
            ParameterSlot::Named(name) => {
                self.named.insert(name, value);
            }
            ParameterSlot::Indexed(index) => {
                self.indexed.insert(index, value);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.indexed.is_empty() && self.shared.is_empty()
    }
}

/// Kind of extra argument an auto constant takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoDataType {
    None,
    Int,
    Real,
}

const AUTO_CONSTANTS: &[(&str, AutoDataType)] = &[
    ("world_matrix", AutoDataType::None),
    ("inverse_world_matrix", AutoDataType::None),
    ("transpose_world_matrix", AutoDataType::None),
    ("inverse_transpose_world_matrix", AutoDataType::None),
    ("world_matrix_array_3x4", AutoDataType::None),
    ("world_matrix_array", AutoDataType::None),
    ("view_matrix", AutoDataType::None),
    ("inverse_view_matrix", AutoDataType::None),
    ("transpose_view_matrix", AutoDataType::None),
    ("inverse_transpose_view_matrix", AutoDataType::None),
    ("projection_matrix", AutoDataType::None),
    ("inverse_projection_matrix", AutoDataType::None),
    ("transpose_projection_matrix", AutoDataType::None),
    ("inverse_transpose_projection_matrix", AutoDataType::None),
    ("viewproj_matrix", AutoDataType::None),
    ("inverse_viewproj_matrix", AutoDataType::None),
    ("transpose_viewproj_matrix", AutoDataType::None),
    ("inverse_transpose_viewproj_matrix", AutoDataType::None),
    ("worldview_matrix", AutoDataType::None),
    ("inverse_worldview_matrix", AutoDataType::None),
    ("transpose_worldview_matrix", AutoDataType::None),
    ("inverse_transpose_worldview_matrix", AutoDataType::None),
    ("worldviewproj_matrix", AutoDataType::None),
    ("inverse_worldviewproj_matrix", AutoDataType::None),
    ("transpose_worldviewproj_matrix", AutoDataType::None),
    ("inverse_transpose_worldviewproj_matrix", AutoDataType::None),
    ("render_target_flipping", AutoDataType::None),
    ("vertex_winding", AutoDataType::None),
    ("fog_colour", AutoDataType::None),
    ("fog_params", AutoDataType::None),
    ("surface_ambient_colour", AutoDataType::None),
    ("surface_diffuse_colour", AutoDataType::None),
    ("surface_specular_colour", AutoDataType::None),
    ("surface_emissive_colour", AutoDataType::None),
    ("surface_shininess", AutoDataType::None),
    ("light_count", AutoDataType::None),
    ("ambient_light_colour", AutoDataType::None),
    ("light_diffuse_colour", AutoDataType::Int),
    ("light_specular_colour", AutoDataType::Int),
    ("light_attenuation", AutoDataType::Int),
    ("spotlight_params", AutoDataType::Int),
    ("light_position", AutoDataType::Int),
    ("light_position_object_space", AutoDataType::Int),
    ("light_position_view_space", AutoDataType::Int),
    ("light_direction", AutoDataType::Int),
    ("light_direction_object_space", AutoDataType::Int),
    ("light_direction_view_space", AutoDataType::Int),
    ("light_distance_object_space", AutoDataType::Int),
    ("light_power", AutoDataType::Int),
    ("light_diffuse_colour_power_scaled", AutoDataType::Int),
    ("light_specular_colour_power_scaled", AutoDataType::Int),
    ("light_diffuse_colour_array", AutoDataType::Int),
    ("light_specular_colour_array", AutoDataType::Int),
    ("light_diffuse_colour_power_scaled_array", AutoDataType::Int),
    ("light_specular_colour_power_scaled_array", AutoDataType::Int),
    ("light_attenuation_array", AutoDataType::Int),
    ("light_position_array", AutoDataType::Int),
    ("light_position_object_space_array", AutoDataType::Int),
    ("light_position_view_space_array", AutoDataType::Int),
    ("light_direction_array", AutoDataType::Int),
    ("light_direction_object_space_array", AutoDataType::Int),
    ("light_direction_view_space_array", AutoDataType::Int),
    ("light_distance_object_space_array", AutoDataType::Int),
    ("light_power_array", AutoDataType::Int),
    ("spotlight_params_array", AutoDataType::Int),
    ("derived_ambient_light_colour", AutoDataType::None),
    ("derived_scene_colour", AutoDataType::None),
    ("derived_light_diffuse_colour", AutoDataType::Int),
    ("derived_light_specular_colour", AutoDataType::Int),
    ("derived_light_diffuse_colour_array", AutoDataType::Int),
    ("derived_light_specular_colour_array", AutoDataType::Int),
    ("light_number", AutoDataType::Int),
    ("light_casts_shadows", AutoDataType::Int),
    ("shadow_extrusion_distance", AutoDataType::Int),
    ("camera_position", AutoDataType::None),
    ("camera_position_object_space", AutoDataType::None),
    ("texture_viewproj_matrix", AutoDataType::Int),
    ("texture_viewproj_matrix_array", AutoDataType::Int),
    ("texture_worldviewproj_matrix", AutoDataType::Int),
    ("texture_worldviewproj_matrix_array", AutoDataType::Int),
    ("spotlight_viewproj_matrix", AutoDataType::Int),
    ("spotlight_worldviewproj_matrix", AutoDataType::Int),
    ("custom", AutoDataType::Int),
    ("time", AutoDataType::Real),
    ("time_0_x", AutoDataType::Real),
    ("costime_0_x", AutoDataType::Real),
    ("sintime_0_x", AutoDataType::Real),
    ("tantime_0_x", AutoDataType::Real),
    ("time_0_x_packed", AutoDataType::Real),
    ("time_0_1", AutoDataType::Real),
    ("costime_0_1", AutoDataType::Real),
    ("sintime_0_1", AutoDataType::Real),
    ("tantime_0_1", AutoDataType::Real),
    ("time_0_1_packed", AutoDataType::Real),
    ("time_0_2pi", AutoDataType::Real),
    ("costime_0_2pi", AutoDataType::Real),
    ("sintime_0_2pi", AutoDataType::Real),
    ("tantime_0_2pi", AutoDataType::Real),
    ("time_0_2pi_packed", AutoDataType::Real),
    ("frame_time", AutoDataType::Real),
    ("fps", AutoDataType::None),
    ("viewport_width", AutoDataType::None),
    ("viewport_height", AutoDataType::None),
    ("inverse_viewport_width", AutoDataType::None),
    ("inverse_viewport_height", AutoDataType::None),
    ("viewport_size", AutoDataType::None),
    ("view_direction", AutoDataType::None),
    ("view_side_vector", AutoDataType::None),
    ("view_up_vector", AutoDataType::None),
    ("fov", AutoDataType::None),
    ("near_clip_distance", AutoDataType::None),
    ("far_clip_distance", AutoDataType::None),
    ("pass_number", AutoDataType::None),
    ("pass_iteration_number", AutoDataType::None),
    ("animation_parametric", AutoDataType::Int),
    ("texture_size", AutoDataType::Int),
    ("inverse_texture_size", AutoDataType::Int),
    ("packed_texture_size", AutoDataType::Int),
    ("texture_matrix", AutoDataType::Int),
    ("lod_camera_position", AutoDataType::None),
    ("lod_camera_position_object_space", AutoDataType::None),
    ("light_custom", AutoDataType::Int),
];

/// Extra argument kind of a named auto constant, or `None` for an unknown name
pub fn auto_constant_data_type(name: &str) -> Option<AutoDataType> {
    AUTO_CONSTANTS
        .iter()
        .find(|(constant, _)| constant.eq_ignore_ascii_case(name))
        .map(|(_, data_type)| *data_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_a_slot_replaces_it() {
        let mut parameters = ProgramParameters::default();
        parameters.set(
            ParameterSlot::Named("tint".into()),
            ParameterValue::Auto {
                constant: "fog_colour".into(),
                extra: AutoExtra::None,
            },
        );
        parameters.set(ParameterSlot::Named("tint".into()), ParameterValue::Float(vec![1.0]));
        parameters.set(ParameterSlot::Indexed(4), ParameterValue::Int(vec![2, 0, 0, 0]));

        assert_eq!(parameters.named["tint"], ParameterValue::Float(vec![1.0]));
        assert_eq!(parameters.indexed[&4], ParameterValue::Int(vec![2, 0, 0, 0]));
        assert!(!parameters.is_empty());
    }

    #[test]
    fn test_auto_constant_lookup() {
        assert_eq!(auto_constant_data_type("worldviewproj_matrix"), Some(AutoDataType::None));
        assert_eq!(auto_constant_data_type("Light_Position"), Some(AutoDataType::Int));
        assert_eq!(auto_constant_data_type("time_0_x"), Some(AutoDataType::Real));
        assert_eq!(auto_constant_data_type("sunlight"), None);
    }
}
