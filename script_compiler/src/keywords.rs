//! Script keyword table
//!
//! Keyword ids are what the AST stores on objects, properties and atoms.
//! Ids 1 and 2 are reserved for the boolean built-ins (`on`/`true`/`yes` and
//! `off`/`false`/`no`); table keywords are numbered from 3 in declaration
//! order. Matching is case sensitive.
use serde::{Deserialize, Serialize};

/// Id of `on`, `true` and `yes`
pub const ID_ON: u32 = 1;
/// Id of `off`, `false` and `no`
pub const ID_OFF: u32 = 2;
/// Id of the first table keyword
pub const FIRST_KEYWORD_ID: u32 = 3;

macro_rules! define_keywords {
    ($($variant:ident => $text:literal),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Keyword {
            $($variant),+
        }

        impl Keyword {
            /// Every keyword in id order
            pub const ALL: &'static [Keyword] = &[$(Keyword::$variant),+];

            /// Exact spelling in script source
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text),+
                }
            }

            /// Parse with exact case matching
            pub fn from_str(s: &str) -> Option<Self> {
                match s {
                    $($text => Some(Keyword::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

define_keywords! {
    // === MATERIAL ===
    Material => "material",
    Technique => "technique",
    Pass => "pass",
    TextureUnit => "texture_unit",
    Scheme => "scheme",
    LodIndex => "lod_index",
    LodDistances => "lod_distances",
    ReceiveShadows => "receive_shadows",
    Ambient => "ambient",
    Diffuse => "diffuse",
    Specular => "specular",
    Emissive => "emissive",
    SceneBlend => "scene_blend",
    Add => "add",
    Modulate => "modulate",
    ColourBlend => "colour_blend",
    AlphaBlend => "alpha_blend",
    DepthCheck => "depth_check",
    DepthWrite => "depth_write",
    DepthFunc => "depth_func",
    AlwaysFail => "always_fail",
    AlwaysPass => "always_pass",
    LessEqual => "less_equal",
    Less => "less",
    Equal => "equal",
    NotEqual => "not_equal",
    GreaterEqual => "greater_equal",
    Greater => "greater",
    CullHardware => "cull_hardware",
    Clockwise => "clockwise",
    Anticlockwise => "anticlockwise",
    CullSoftware => "cull_software",
    Back => "back",
    Front => "front",
    None => "none",
    Lighting => "lighting",
    Shading => "shading",
    Flat => "flat",
    Gouraud => "gouraud",
    Phong => "phong",
    PolygonMode => "polygon_mode",
    Solid => "solid",
    Wireframe => "wireframe",
    Points => "points",
    MaxLights => "max_lights",

    // === TEXTURE UNIT ===
    Texture => "texture",
    TexCoordSet => "tex_coord_set",
    TexAddressMode => "tex_address_mode",
    Wrap => "wrap",
    Clamp => "clamp",
    Mirror => "mirror",
    Border => "border",
    Filtering => "filtering",
    Bilinear => "bilinear",
    Trilinear => "trilinear",
    Anisotropic => "anisotropic",
    MaxAnisotropy => "max_anisotropy",
    TextureSource => "texture_source",

    // === PARTICLE SYSTEM ===
    ParticleSystem => "particle_system",
    Emitter => "emitter",
    Affector => "affector",
    Quota => "quota",
    ParticleWidth => "particle_width",
    ParticleHeight => "particle_height",

    // === COMPOSITOR ===
    Compositor => "compositor",
    Target => "target",
    TargetOutput => "target_output",
    TargetWidth => "target_width",
    TargetHeight => "target_height",
    TargetWidthScaled => "target_width_scaled",
    TargetHeightScaled => "target_height_scaled",
    Input => "input",
    Previous => "previous",
    OnlyInitial => "only_initial",
    VisibilityMask => "visibility_mask",
    LodBias => "lod_bias",
    MaterialScheme => "material_scheme",
    Shadows => "shadows",
    Clear => "clear",
    Stencil => "stencil",
    RenderScene => "render_scene",
    RenderQuad => "render_quad",
    Identifier => "identifier",
    FirstRenderQueue => "first_render_queue",
    LastRenderQueue => "last_render_queue",
    Buffers => "buffers",
    Colour => "colour",
    Depth => "depth",
    ColourValue => "colour_value",
    DepthValue => "depth_value",
    StencilValue => "stencil_value",
    Check => "check",
    CompFunc => "comp_func",
    RefValue => "ref_value",
    Mask => "mask",
    FailOp => "fail_op",
    DepthFailOp => "depth_fail_op",
    PassOp => "pass_op",
    Keep => "keep",
    Zero => "zero",
    Replace => "replace",
    Increment => "increment",
    Decrement => "decrement",
    IncrementWrap => "increment_wrap",
    DecrementWrap => "decrement_wrap",
    Invert => "invert",
    TwoSided => "two_sided",

    // === GPU PROGRAMS ===
    VertexProgram => "vertex_program",
    FragmentProgram => "fragment_program",
    GeometryProgram => "geometry_program",
    VertexProgramRef => "vertex_program_ref",
    FragmentProgramRef => "fragment_program_ref",
    GeometryProgramRef => "geometry_program_ref",
    ShadowCasterVertexProgramRef => "shadow_caster_vertex_program_ref",
    ShadowReceiverVertexProgramRef => "shadow_receiver_vertex_program_ref",
    ShadowReceiverFragmentProgramRef => "shadow_receiver_fragment_program_ref",
    Source => "source",
    Syntax => "syntax",
    DefaultParams => "default_params",
    ParamIndexed => "param_indexed",
    ParamNamed => "param_named",
    ParamIndexedAuto => "param_indexed_auto",
    ParamNamedAuto => "param_named_auto",
    SharedParamsRef => "shared_params_ref",

    // === BLENDING ===
    VertexColour => "vertexcolour",
    SeparateSceneBlend => "separate_scene_blend",
    SceneBlendOp => "scene_blend_op",
    SeparateSceneBlendOp => "separate_scene_blend_op",
}

impl Keyword {
    pub fn id(self) -> u32 {
        FIRST_KEYWORD_ID + self as u32
    }

    pub fn from_id(id: u32) -> Option<Self> {
        let index = id.checked_sub(FIRST_KEYWORD_ID)?;
        Self::ALL.get(index as usize).copied()
    }

    /// Keywords that open an object block at the top level
    pub const fn is_top_level_object(self) -> bool {
        matches!(
            self,
            Self::Material
                | Self::Compositor
                | Self::ParticleSystem
                | Self::VertexProgram
                | Self::FragmentProgram
                | Self::GeometryProgram
        )
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Id of a boolean built-in word
pub fn builtin_id(word: &str) -> Option<u32> {
    match word {
        "on" | "true" | "yes" => Some(ID_ON),
        "off" | "false" | "no" => Some(ID_OFF),
        _ => None,
    }
}

/// Keyword id of `word`, or 0 when it is not a keyword
pub fn keyword_id(word: &str) -> u32 {
    builtin_id(word)
        .or_else(|| Keyword::from_str(word).map(Keyword::id))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids() {
        for word in ["on", "true", "yes"] {
            assert_eq!(keyword_id(word), ID_ON);
        }
        for word in ["off", "false", "no"] {
            assert_eq!(keyword_id(word), ID_OFF);
        }
        assert_eq!(keyword_id("On"), 0);
    }

    #[test]
    fn test_ids_round_trip_every_keyword() {
        for keyword in Keyword::ALL {
            assert!(keyword.id() >= FIRST_KEYWORD_ID);
            assert_eq!(Keyword::from_id(keyword.id()), Some(*keyword));
            assert_eq!(Keyword::from_str(keyword.as_str()), Some(*keyword));
        }
    }

    #[test]
    fn test_unknown_ids() {
        assert_eq!(Keyword::from_id(0), None);
        assert_eq!(Keyword::from_id(ID_OFF), None);
        assert_eq!(Keyword::from_id(u32::MAX), None);
        assert_eq!(keyword_id("MyComp"), 0);
    }

    #[test]
    fn test_top_level_objects() {
        assert!(Keyword::Compositor.is_top_level_object());
        assert!(Keyword::FragmentProgram.is_top_level_object());
        assert!(!Keyword::Pass.is_top_level_object());
        assert!(!Keyword::FragmentProgramRef.is_top_level_object());
        assert_eq!(Keyword::RenderScene.to_string(), "render_scene");
    }
}
