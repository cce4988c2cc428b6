//! Material scripts: material, technique, pass, texture_unit, texture_source

use super::{values, DispatchKey, TranslationContext, Translator};
use crate::ast::{NodeId, PropertyNode};
use crate::compiler::CompileErrorCode;
use crate::keywords::Keyword;
use crate::registry::{
    AddressModes, ColourValue, ContextHandle, MaterialPass, SceneBlend, TextureSource, TextureUnit,
};
use crate::script_enum::{
    expected_names, CompareFunction, CullingMode, ManualCullingMode, PolygonMode, SceneBlendFactor,
    SceneBlendOperation, SceneBlendType, ShadeOptions, TextureAddressing, TextureFiltering,
};

pub struct MaterialTranslator;

impl Translator for MaterialTranslator {
    fn name(&self) -> &'static str {
        "material"
    }

    fn dispatch_keys(&self) -> &'static [DispatchKey] {
        &[(Keyword::Material, None)]
    }

    fn translate(&self, cx: &mut TranslationContext<'_>, node: NodeId) {
        let Some(object) = cx.object(node) else {
            return;
        };
        if object.name.is_empty() {
            cx.error(CompileErrorCode::ObjectNameExpected, node, Some("material must be given a name"));
            return;
        }

        let handle = cx.registry.create_or_get_material(&object.name);
        cx.set_context(node, handle);

        cx.walk_children(node, |cx, child, property| match property.keyword() {
            Some(Keyword::LodDistances) => {
                if let Some(distances) = cx.read_floats(child, property) {
                    if let Some(material) = cx.registry.material_mut(handle) {
                        material.lod_distances = distances;
                    }
                }
            }
            Some(Keyword::ReceiveShadows) => {
                if let Some(flag) = cx.read_bool(child, property) {
                    if let Some(material) = cx.registry.material_mut(handle) {
                        material.receive_shadows = flag;
                    }
                }
            }
            _ => cx.unexpected(child),
        });
    }
}

pub struct MaterialTechniqueTranslator;

impl Translator for MaterialTechniqueTranslator {
    fn name(&self) -> &'static str {
        "material technique"
    }

    fn dispatch_keys(&self) -> &'static [DispatchKey] {
        &[(Keyword::Technique, Some(Keyword::Material))]
    }

    fn translate(&self, cx: &mut TranslationContext<'_>, node: NodeId) {
        let Some(object) = cx.object(node) else {
            return;
        };
        let handle = cx.parent_context(node).and_then(|parent| {
            let material = cx.registry.material_mut(parent)?;
            let index = material.create_technique();
            if !object.name.is_empty() {
                material.techniques[index].name = Some(object.name.clone());
            }
            parent.material_technique(index)
        });
        let Some(handle) = handle else {
            cx.error(CompileErrorCode::ObjectAllocationError, node, Some("no material for technique"));
            return;
        };
        cx.set_context(node, handle);

        cx.walk_children(node, |cx, child, property| match property.keyword() {
            Some(Keyword::Scheme) => {
                if let Some(scheme) = cx.read_string(child, property) {
                    if let Some(technique) = cx.registry.material_technique_mut(handle) {
                        technique.scheme = scheme;
                    }
                }
            }
            Some(Keyword::LodIndex) => {
                if let Some(index) = cx.read_uint_as::<u16>(child, property) {
                    if let Some(technique) = cx.registry.material_technique_mut(handle) {
                        technique.lod_index = index;
                    }
                }
            }
            _ => cx.unexpected(child),
        });
    }
}

pub struct MaterialPassTranslator;

impl Translator for MaterialPassTranslator {
    fn name(&self) -> &'static str {
        "material pass"
    }

    fn dispatch_keys(&self) -> &'static [DispatchKey] {
        &[(Keyword::Pass, Some(Keyword::Technique))]
    }

    fn translate(&self, cx: &mut TranslationContext<'_>, node: NodeId) {
        let Some(object) = cx.object(node) else {
            return;
        };
        let handle = cx.parent_context(node).and_then(|parent| {
            let technique = cx.registry.material_technique_mut(parent)?;
            let index = technique.create_pass();
            if !object.name.is_empty() {
                technique.passes[index].name = Some(object.name.clone());
            }
            parent.material_pass(index)
        });
        let Some(handle) = handle else {
            cx.error(CompileErrorCode::ObjectAllocationError, node, Some("no technique for pass"));
            return;
        };
        cx.set_context(node, handle);

        cx.walk_children(node, |cx, child, property| {
            translate_pass_property(cx, handle, child, property)
        });
    }
}

fn with_pass(
    cx: &mut TranslationContext<'_>,
    handle: ContextHandle,
    node: NodeId,
    apply: impl FnOnce(&mut MaterialPass),
) {
    match cx.registry.material_pass_mut(handle) {
        Some(pass) => apply(pass),
        None => cx.error(CompileErrorCode::ObjectAllocationError, node, None),
    }
}

fn translate_pass_property(
    cx: &mut TranslationContext<'_>,
    handle: ContextHandle,
    node: NodeId,
    property: &PropertyNode,
) {
    let Some(keyword) = property.keyword() else {
        cx.unexpected(node);
        return;
    };

    match keyword {
        Keyword::Ambient | Keyword::Diffuse | Keyword::Emissive => {
            translate_colour(cx, handle, node, property, keyword)
        }
        Keyword::Specular => translate_specular(cx, handle, node, property),
        Keyword::SceneBlend => translate_scene_blend(cx, handle, node, property),
        Keyword::SeparateSceneBlend => translate_separate_scene_blend(cx, handle, node, property),
        Keyword::SceneBlendOp => {
            if let Some(op) = cx.read_enum::<SceneBlendOperation>(node, property) {
                with_pass(cx, handle, node, |p| p.scene_blend_op = op);
            }
        }
        Keyword::SeparateSceneBlendOp => translate_separate_scene_blend_op(cx, handle, node, property),
        Keyword::DepthCheck => {
            if let Some(flag) = cx.read_bool(node, property) {
                with_pass(cx, handle, node, |p| p.depth_check = flag);
            }
        }
        Keyword::DepthWrite => {
            if let Some(flag) = cx.read_bool(node, property) {
                with_pass(cx, handle, node, |p| p.depth_write = flag);
            }
        }
        Keyword::DepthFunc => {
            if let Some(func) = cx.read_enum::<CompareFunction>(node, property) {
                with_pass(cx, handle, node, |p| p.depth_func = func);
            }
        }
        Keyword::CullHardware => {
            if let Some(mode) = cx.read_enum::<CullingMode>(node, property) {
                with_pass(cx, handle, node, |p| p.cull_hardware = mode);
            }
        }
        Keyword::CullSoftware => {
            if let Some(mode) = cx.read_enum::<ManualCullingMode>(node, property) {
                with_pass(cx, handle, node, |p| p.cull_software = mode);
            }
        }
        Keyword::Lighting => {
            if let Some(flag) = cx.read_bool(node, property) {
                with_pass(cx, handle, node, |p| p.lighting = flag);
            }
        }
        Keyword::Shading => {
            if let Some(shading) = cx.read_enum::<ShadeOptions>(node, property) {
                with_pass(cx, handle, node, |p| p.shading = shading);
            }
        }
        Keyword::PolygonMode => {
            if let Some(mode) = cx.read_enum::<PolygonMode>(node, property) {
                with_pass(cx, handle, node, |p| p.polygon_mode = mode);
            }
        }
        Keyword::MaxLights => {
            if let Some(count) = cx.read_uint_as::<u16>(node, property) {
                with_pass(cx, handle, node, |p| p.max_lights = count);
            }
        }
        _ => cx.unexpected(node),
    }
}

fn tracks_vertex_colour(cx: &TranslationContext<'_>, property: &PropertyNode) -> bool {
    property
        .values
        .first()
        .is_some_and(|&id| cx.tree[id].id() == Keyword::VertexColour.id())
}

/// Colour and tracking flag a colour property writes
fn colour_target(pass: &mut MaterialPass, keyword: Keyword) -> Option<(&mut ColourValue, &mut bool)> {
    let tracking = &mut pass.vertex_colour_tracking;
    match keyword {
        Keyword::Ambient => Some((&mut pass.ambient, &mut tracking.ambient)),
        Keyword::Diffuse => Some((&mut pass.diffuse, &mut tracking.diffuse)),
        Keyword::Emissive => Some((&mut pass.emissive, &mut tracking.emissive)),
        _ => None,
    }
}

/// `ambient|diffuse|emissive r g b [a]`, or `vertexcolour` to take the
/// colour from the vertices
fn translate_colour(
    cx: &mut TranslationContext<'_>,
    handle: ContextHandle,
    node: NodeId,
    property: &PropertyNode,
    keyword: Keyword,
) {
    if property.values.is_empty() {
        let message = format!("{} requires a colour", property.name);
        cx.error(CompileErrorCode::NumberExpected, node, Some(&message));
        return;
    }
    if property.values.len() > 4 {
        let message = format!("{} must have at most 4 arguments", property.name);
        cx.error(CompileErrorCode::FewerParametersExpected, node, Some(&message));
        return;
    }
    if tracks_vertex_colour(cx, property) {
        with_pass(cx, handle, node, |p| {
            if let Some((_, tracked)) = colour_target(p, keyword) {
                *tracked = true;
            }
        });
        return;
    }
    match values::get_colour(&*cx.tree, &property.values) {
        Some(colour) => with_pass(cx, handle, node, |p| {
            if let Some((target, _)) = colour_target(p, keyword) {
                *target = colour;
            }
        }),
        None => {
            let message = format!(
                "{} requires 3 or 4 colour arguments, or a \"vertexcolour\" directive",
                property.name
            );
            cx.error(CompileErrorCode::InvalidParameters, node, Some(&message));
        }
    }
}

/// `specular r g b [a] shininess` or `specular vertexcolour [shininess]`
fn translate_specular(
    cx: &mut TranslationContext<'_>,
    handle: ContextHandle,
    node: NodeId,
    property: &PropertyNode,
) {
    let Some((&shininess, colour)) = property.values.split_last() else {
        cx.error(CompileErrorCode::NumberExpected, node, Some("specular requires a colour and shininess"));
        return;
    };
    if property.values.len() > 5 {
        cx.error(CompileErrorCode::FewerParametersExpected, node, Some("specular takes at most 5 arguments"));
        return;
    }
    if tracks_vertex_colour(cx, property) {
        let shininess = match property.values.len() {
            1 => None,
            _ => match values::get_float(&cx.tree[shininess]) {
                Some(value) => Some(value),
                None => {
                    cx.error(CompileErrorCode::InvalidParameters, node, Some("specular shininess must be a number"));
                    return;
                }
            },
        };
        with_pass(cx, handle, node, |p| {
            p.vertex_colour_tracking.specular = true;
            if let Some(shininess) = shininess {
                p.shininess = shininess;
            }
        });
        return;
    }

    let colour = values::get_colour(&*cx.tree, colour);
    let shininess = values::get_float(&cx.tree[shininess]);
    match (colour, shininess) {
        (Some(colour), Some(shininess)) => with_pass(cx, handle, node, |p| {
            p.specular = colour;
            p.shininess = shininess;
        }),
        _ => cx.error(
            CompileErrorCode::InvalidParameters,
            node,
            Some("specular expects 3 or 4 colour channels and a shininess"),
        ),
    }
}

/// One blend value: a preset type, or a factor pair
fn scene_blend_of(cx: &TranslationContext<'_>, values: &[NodeId]) -> Option<SceneBlend> {
    match values {
        [blend] => values::get_enum::<SceneBlendType>(&cx.tree[*blend]).map(SceneBlend::Type),
        [source, dest] => Some(SceneBlend::Factors {
            source: values::get_enum::<SceneBlendFactor>(&cx.tree[*source])?,
            dest: values::get_enum::<SceneBlendFactor>(&cx.tree[*dest])?,
        }),
        _ => None,
    }
}

/// `scene_blend <type>` or `scene_blend <source factor> <dest factor>`
fn translate_scene_blend(
    cx: &mut TranslationContext<'_>,
    handle: ContextHandle,
    node: NodeId,
    property: &PropertyNode,
) {
    match property.values.len() {
        0 => cx.error(CompileErrorCode::StringExpected, node, Some("scene_blend requires a blend type")),
        1 | 2 => match scene_blend_of(cx, &property.values) {
            Some(blend) => with_pass(cx, handle, node, |p| p.scene_blend = Some(blend)),
            None => {
                let message = format!(
                    "scene_blend expects {} or two of {}",
                    expected_names::<SceneBlendType>(),
                    expected_names::<SceneBlendFactor>()
                );
                cx.error(CompileErrorCode::InvalidParameters, node, Some(&message));
            }
        },
        _ => cx.error(
            CompileErrorCode::FewerParametersExpected,
            node,
            Some("scene_blend supports at most 2 arguments"),
        ),
    }
}

/// `separate_scene_blend <colour type> <alpha type>`, or four factors:
/// colour source, colour dest, alpha source, alpha dest
fn translate_separate_scene_blend(
    cx: &mut TranslationContext<'_>,
    handle: ContextHandle,
    node: NodeId,
    property: &PropertyNode,
) {
    let blends = match property.values.as_slice() {
        [] => {
            cx.error(CompileErrorCode::StringExpected, node, Some("separate_scene_blend requires arguments"));
            return;
        }
        [colour, alpha] => scene_blend_of(cx, &[*colour]).zip(scene_blend_of(cx, &[*alpha])),
        [_, _, _, _] => {
            let (colour, alpha) = property.values.split_at(2);
            scene_blend_of(cx, colour).zip(scene_blend_of(cx, alpha))
        }
        _ => {
            cx.error(
                CompileErrorCode::FewerParametersExpected,
                node,
                Some("separate_scene_blend must have 2 or 4 arguments"),
            );
            return;
        }
    };
    match blends {
        Some(blends) => with_pass(cx, handle, node, |p| p.separate_scene_blend = Some(blends)),
        None => cx.error(
            CompileErrorCode::InvalidParameters,
            node,
            Some("separate_scene_blend expects 2 blend types or 4 blend factors"),
        ),
    }
}

/// `separate_scene_blend_op <colour op> <alpha op>`
fn translate_separate_scene_blend_op(
    cx: &mut TranslationContext<'_>,
    handle: ContextHandle,
    node: NodeId,
    property: &PropertyNode,
) {
    let (colour, alpha) = match property.values.as_slice() {
        [] => {
            cx.error(CompileErrorCode::StringExpected, node, Some("separate_scene_blend_op requires arguments"));
            return;
        }
        [colour, alpha] => (*colour, *alpha),
        _ => {
            cx.error(
                CompileErrorCode::FewerParametersExpected,
                node,
                Some("separate_scene_blend_op must have 2 arguments"),
            );
            return;
        }
    };
    let colour = values::get_enum::<SceneBlendOperation>(&cx.tree[colour]);
    let alpha = values::get_enum::<SceneBlendOperation>(&cx.tree[alpha]);
    match colour.zip(alpha) {
        Some(ops) => with_pass(cx, handle, node, |p| p.separate_scene_blend_op = Some(ops)),
        None => {
            let message = format!(
                "separate_scene_blend_op expects two of {}",
                expected_names::<SceneBlendOperation>()
            );
            cx.error(CompileErrorCode::InvalidParameters, node, Some(&message));
        }
    }
}

pub struct TextureUnitTranslator;

impl Translator for TextureUnitTranslator {
    fn name(&self) -> &'static str {
        "texture unit"
    }

    fn dispatch_keys(&self) -> &'static [DispatchKey] {
        &[(Keyword::TextureUnit, Some(Keyword::Pass))]
    }

    fn translate(&self, cx: &mut TranslationContext<'_>, node: NodeId) {
        let Some(object) = cx.object(node) else {
            return;
        };
        let handle = cx.parent_context(node).and_then(|parent| {
            let pass = cx.registry.material_pass_mut(parent)?;
            let index = pass.create_texture_unit();
            if !object.name.is_empty() {
                pass.texture_units[index].name = Some(object.name.clone());
            }
            parent.texture_unit(index)
        });
        let Some(handle) = handle else {
            cx.error(CompileErrorCode::ObjectAllocationError, node, Some("no pass for texture_unit"));
            return;
        };
        cx.set_context(node, handle);

        cx.walk_children(node, |cx, child, property| {
            translate_unit_property(cx, handle, child, property)
        });
    }
}

fn with_unit(
    cx: &mut TranslationContext<'_>,
    handle: ContextHandle,
    node: NodeId,
    apply: impl FnOnce(&mut TextureUnit),
) {
    match cx.registry.texture_unit_mut(handle) {
        Some(unit) => apply(unit),
        None => cx.error(CompileErrorCode::ObjectAllocationError, node, None),
    }
}

fn translate_unit_property(
    cx: &mut TranslationContext<'_>,
    handle: ContextHandle,
    node: NodeId,
    property: &PropertyNode,
) {
    match property.keyword() {
        // `texture <file> [type..]`; only the file name is kept
        Some(Keyword::Texture) => {
            let name = property.values.first().and_then(|&id| values::get_string(&cx.tree[id]));
            match name {
                Some(name) => with_unit(cx, handle, node, |u| u.texture = Some(name)),
                None => cx.error(CompileErrorCode::StringExpected, node, Some("texture file expected")),
            }
        }
        Some(Keyword::TexAddressMode) => translate_address_mode(cx, handle, node, property),
        Some(Keyword::Filtering) => {
            if let Some(filtering) = cx.read_enum::<TextureFiltering>(node, property) {
                with_unit(cx, handle, node, |u| u.filtering = filtering);
            }
        }
        Some(Keyword::TexCoordSet) => {
            if let Some(set) = cx.read_uint(node, property) {
                with_unit(cx, handle, node, |u| u.tex_coord_set = set);
            }
        }
        Some(Keyword::MaxAnisotropy) => {
            if let Some(level) = cx.read_uint(node, property) {
                with_unit(cx, handle, node, |u| u.max_anisotropy = level);
            }
        }
        _ => cx.unexpected(node),
    }
}

/// One mode for every axis, or separate u, v and w modes
fn translate_address_mode(
    cx: &mut TranslationContext<'_>,
    handle: ContextHandle,
    node: NodeId,
    property: &PropertyNode,
) {
    let modes: Option<Vec<TextureAddressing>> = property
        .values
        .iter()
        .map(|&id| values::get_enum::<TextureAddressing>(&cx.tree[id]))
        .collect();

    let modes = match modes.as_deref() {
        Some([]) => {
            cx.error(CompileErrorCode::StringExpected, node, Some("tex_address_mode requires a mode"));
            return;
        }
        Some(&[mode]) => AddressModes::uniform(mode),
        Some(&[u, v]) => AddressModes {
            u,
            v,
            w: TextureAddressing::default(),
        },
        Some(&[u, v, w]) => AddressModes { u, v, w },
        Some(_) => {
            cx.error(
                CompileErrorCode::FewerParametersExpected,
                node,
                Some("tex_address_mode takes at most 3 arguments"),
            );
            return;
        }
        None => {
            let message = format!(
                "tex_address_mode expects {}",
                expected_names::<TextureAddressing>()
            );
            cx.error(CompileErrorCode::InvalidParameters, node, Some(&message));
            return;
        }
    };
    with_unit(cx, handle, node, |u| u.address_modes = modes);
}

/// `texture_source <type>`; every property becomes a source parameter
pub struct TextureSourceTranslator;

impl Translator for TextureSourceTranslator {
    fn name(&self) -> &'static str {
        "texture source"
    }

    fn dispatch_keys(&self) -> &'static [DispatchKey] {
        &[(Keyword::TextureSource, Some(Keyword::TextureUnit))]
    }

    fn translate(&self, cx: &mut TranslationContext<'_>, node: NodeId) {
        let Some(object) = cx.object(node) else {
            return;
        };
        let Some(source_type) = object
            .values
            .first()
            .and_then(|&id| values::get_string(&cx.tree[id]))
        else {
            cx.error(CompileErrorCode::StringExpected, node, Some("texture_source requires a type"));
            return;
        };
        let Some(handle) = cx.parent_context(node) else {
            cx.error(CompileErrorCode::ObjectAllocationError, node, Some("no texture_unit for source"));
            return;
        };

        let mut source = TextureSource {
            source_type,
            ..TextureSource::default()
        };
        for child in cx.children(node) {
            match cx.tree[child].as_property() {
                Some(property) => {
                    let value = cx.joined_values(property);
                    source.parameters.insert(property.name.clone(), value);
                }
                None => cx.unexpected(child),
            }
        }

        match cx.registry.texture_unit_mut(handle) {
            Some(unit) => {
                unit.texture_source = Some(source);
                cx.set_context(node, handle);
            }
            None => cx.error(CompileErrorCode::ObjectAllocationError, node, None),
        }
    }
}
