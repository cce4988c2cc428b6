//! Script spellings for enum-valued properties
//!
//! Each enum is declared with [`define_script_enum!`], which generates a
//! static `(spelling, value)` table. Lookup ignores ASCII case and returns
//! `None` for an unknown word; callers report that as a compile error.

pub trait ScriptEnum: Sized + Copy + PartialEq + 'static {
    const ENTRIES: &'static [(&'static str, Self)];

    fn lookup(value: &str) -> Option<Self> {
        Self::ENTRIES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(value))
            .map(|(_, variant)| *variant)
    }

    fn script_name(self) -> &'static str {
        Self::ENTRIES
            .iter()
            .find(|(_, variant)| *variant == self)
            .map_or("", |(name, _)| *name)
    }

    /// Accepted spellings, for diagnostics
    fn script_names() -> Vec<&'static str> {
        Self::ENTRIES.iter().map(|(name, _)| *name).collect()
    }
}

macro_rules! define_script_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $crate::script_enum::ScriptEnum for $name {
            const ENTRIES: &'static [(&'static str, Self)] = &[$(($text, $name::$variant)),+];
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::script_enum::ScriptEnum::script_name(*self))
            }
        }
    };

    ($(#[$meta:meta])* $name:ident (default $default:ident) { $($body:tt)+ }) => {
        $crate::script_enum::define_script_enum!($(#[$meta])* $name { $($body)+ });

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }
    };
}

pub(crate) use define_script_enum;

define_script_enum! {
    TextureAddressing (default Wrap) {
        Wrap => "wrap",
        Clamp => "clamp",
        Mirror => "mirror",
        Border => "border",
    }
}

define_script_enum! {
    TextureFiltering (default Bilinear) {
        None => "none",
        Bilinear => "bilinear",
        Trilinear => "trilinear",
        Anisotropic => "anisotropic",
    }
}

define_script_enum! {
    CompareFunction (default LessEqual) {
        AlwaysFail => "always_fail",
        AlwaysPass => "always_pass",
        Less => "less",
        LessEqual => "less_equal",
        Equal => "equal",
        NotEqual => "not_equal",
        GreaterEqual => "greater_equal",
        Greater => "greater",
    }
}

define_script_enum! {
    SceneBlendType {
        Add => "add",
        Modulate => "modulate",
        ColourBlend => "colour_blend",
        AlphaBlend => "alpha_blend",
    }
}

define_script_enum! {
    /// Source or destination weight of a two-factor blend
    SceneBlendFactor {
        One => "one",
        Zero => "zero",
        DestColour => "dest_colour",
        SrcColour => "src_colour",
        OneMinusDestColour => "one_minus_dest_colour",
        OneMinusSrcColour => "one_minus_src_colour",
        DestAlpha => "dest_alpha",
        SrcAlpha => "src_alpha",
        OneMinusDestAlpha => "one_minus_dest_alpha",
        OneMinusSrcAlpha => "one_minus_src_alpha",
    }
}

define_script_enum! {
    SceneBlendOperation (default Add) {
        Add => "add",
        Subtract => "subtract",
        ReverseSubtract => "reverse_subtract",
        Min => "min",
        Max => "max",
    }
}

define_script_enum! {
    /// Hardware culling by vertex winding
    CullingMode (default Clockwise) {
        Clockwise => "clockwise",
        Anticlockwise => "anticlockwise",
        None => "none",
    }
}

define_script_enum! {
    /// Software culling by face normal
    ManualCullingMode (default Back) {
        Back => "back",
        Front => "front",
        None => "none",
    }
}

define_script_enum! {
    ShadeOptions (default Gouraud) {
        Flat => "flat",
        Gouraud => "gouraud",
        Phong => "phong",
    }
}

define_script_enum! {
    PolygonMode (default Solid) {
        Solid => "solid",
        Wireframe => "wireframe",
        Points => "points",
    }
}

define_script_enum! {
    /// What a compositor target pass starts from
    InputMode (default None) {
        None => "none",
        Previous => "previous",
    }
}

define_script_enum! {
    PassType {
        Clear => "clear",
        Stencil => "stencil",
        RenderScene => "render_scene",
        RenderQuad => "render_quad",
    }
}

define_script_enum! {
    StencilOperation (default Keep) {
        Keep => "keep",
        Zero => "zero",
        Replace => "replace",
        Increment => "increment",
        Decrement => "decrement",
        IncrementWrap => "increment_wrap",
        DecrementWrap => "decrement_wrap",
        Invert => "invert",
    }
}

/// Spelling list joined for an error message, e.g. `wrap|clamp|mirror|border`
pub fn expected_names<E: ScriptEnum>() -> String {
    E::script_names().join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(TextureAddressing::lookup("wrap"), Some(TextureAddressing::Wrap));
        assert_eq!(TextureAddressing::lookup("CLAMP"), Some(TextureAddressing::Clamp));
        assert_eq!(PassType::lookup("Render_Scene"), Some(PassType::RenderScene));
        assert_eq!(
            SceneBlendFactor::lookup("One_Minus_Src_Alpha"),
            Some(SceneBlendFactor::OneMinusSrcAlpha)
        );
    }

    #[test]
    fn test_unknown_spelling_is_none() {
        assert_eq!(TextureAddressing::lookup("repeat"), None);
        assert_eq!(StencilOperation::lookup(""), None);
    }

    #[test]
    fn test_script_name_and_display() {
        assert_eq!(CompareFunction::NotEqual.script_name(), "not_equal");
        assert_eq!(SceneBlendType::AlphaBlend.to_string(), "alpha_blend");
        assert_eq!(expected_names::<InputMode>(), "none|previous");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TextureFiltering::default(), TextureFiltering::Bilinear);
        assert_eq!(StencilOperation::default(), StencilOperation::Keep);
        assert_eq!(CullingMode::default(), CullingMode::Clockwise);
        assert_eq!(SceneBlendOperation::default(), SceneBlendOperation::Add);
    }
}
