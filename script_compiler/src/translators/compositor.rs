//! Compositor scripts
//!
//! ```text
//! compositor Bloom
//! {
//!     technique
//!     {
//!         texture rt0 target_width_scaled 0.5 target_height_scaled 0.5 PF_A8R8G8B8
//!         target rt0 { input previous }
//!         target_output
//!         {
//!             input none
//!             pass render_quad
//!             {
//!                 material Bloom/Blur
//!                 input 0 rt0
//!             }
//!         }
//!     }
//! }
//! ```

use super::{values, DispatchKey, TranslationContext, Translator};
use crate::ast::{NodeId, PropertyNode};
use crate::compiler::CompileErrorCode;
use crate::keywords::Keyword;
use crate::registry::{ContextHandle, TargetSlot, TextureDefinition, TextureSize};
use crate::script_enum::{expected_names, CompareFunction, InputMode, PassType, StencilOperation};

pub struct CompositorTranslator;

impl Translator for CompositorTranslator {
    fn name(&self) -> &'static str {
        "compositor"
    }

    fn dispatch_keys(&self) -> &'static [DispatchKey] {
        &[(Keyword::Compositor, None)]
    }

    fn translate(&self, cx: &mut TranslationContext<'_>, node: NodeId) {
        let Some(object) = cx.object(node) else {
            return;
        };
        if object.name.is_empty() {
            cx.error(
                CompileErrorCode::ObjectNameExpected,
                node,
                Some("compositor must be given a name"),
            );
            return;
        }

        let handle = cx.registry.create_or_get_compositor(&object.name);
        cx.set_context(node, handle);

        cx.walk_children(node, |cx, child, _| cx.unexpected(child));
    }
}

pub struct CompositorTechniqueTranslator;

impl Translator for CompositorTechniqueTranslator {
    fn name(&self) -> &'static str {
        "compositor technique"
    }

    fn dispatch_keys(&self) -> &'static [DispatchKey] {
        &[(Keyword::Technique, Some(Keyword::Compositor))]
    }

    fn translate(&self, cx: &mut TranslationContext<'_>, node: NodeId) {
        let handle = cx.parent_context(node).and_then(|parent| {
            let technique = cx.registry.compositor_mut(parent)?.create_technique();
            parent.compositor_technique(technique)
        });
        let Some(handle) = handle else {
            cx.error(CompileErrorCode::ObjectAllocationError, node, Some("no compositor for technique"));
            return;
        };
        cx.set_context(node, handle);

        cx.walk_children(node, |cx, child, property| match property.keyword() {
            Some(Keyword::Texture) => translate_texture_definition(cx, child, property, handle),
            _ => cx.unexpected(child),
        });
    }
}

fn texture_size(
    cx: &TranslationContext<'_>,
    args: &[NodeId],
    whole: Keyword,
    scaled: Keyword,
) -> Option<(TextureSize, usize)> {
    let first = &cx.tree[*args.first()?];
    let keyword = first.as_atom().and_then(|a| Keyword::from_id(a.id));
    if keyword == Some(whole) {
        return Some((TextureSize::TargetScaled(1.0), 1));
    }
    if keyword == Some(scaled) {
        let factor = values::get_float(&cx.tree[*args.get(1)?])?;
        return Some((TextureSize::TargetScaled(factor), 2));
    }
    values::get_uint(first).map(|size| (TextureSize::Absolute(size), 1))
}

/// `texture <name> <width> <height> <format..>`, where a size is a pixel
/// count, `target_width`/`target_height`, or the `_scaled` forms with a factor
fn translate_texture_definition(
    cx: &mut TranslationContext<'_>,
    node: NodeId,
    property: &PropertyNode,
    technique: ContextHandle,
) {
    let args = &property.values;
    let Some(name) = args.first().and_then(|&id| values::get_string(&cx.tree[id])) else {
        cx.error(CompileErrorCode::StringExpected, node, Some("texture definition needs a name"));
        return;
    };

    let mut rest = &args[1..];
    let Some((width, used)) = texture_size(cx, rest, Keyword::TargetWidth, Keyword::TargetWidthScaled)
    else {
        cx.error(CompileErrorCode::InvalidParameters, node, Some("texture width expected"));
        return;
    };
    rest = &rest[used..];
    let Some((height, used)) =
        texture_size(cx, rest, Keyword::TargetHeight, Keyword::TargetHeightScaled)
    else {
        cx.error(CompileErrorCode::InvalidParameters, node, Some("texture height expected"));
        return;
    };
    rest = &rest[used..];

    let formats: Vec<String> = rest
        .iter()
        .filter_map(|&id| values::get_string(&cx.tree[id]))
        .collect();
    if formats.is_empty() {
        cx.error(CompileErrorCode::StringExpected, node, Some("pixel format expected"));
        return;
    }

    let definition = TextureDefinition {
        name,
        width,
        height,
        formats,
    };
    match cx.registry.compositor_technique_mut(technique) {
        Some(technique) => {
            technique.texture_definitions.retain(|t| t.name != definition.name);
            technique.texture_definitions.push(definition);
        }
        None => cx.error(CompileErrorCode::ObjectAllocationError, node, None),
    }
}

/// `target <name>` and `target_output`
pub struct TargetTranslator;

impl Translator for TargetTranslator {
    fn name(&self) -> &'static str {
        "compositor target"
    }

    fn dispatch_keys(&self) -> &'static [DispatchKey] {
        &[
            (Keyword::Target, Some(Keyword::Technique)),
            (Keyword::TargetOutput, Some(Keyword::Technique)),
        ]
    }

    fn translate(&self, cx: &mut TranslationContext<'_>, node: NodeId) {
        let Some(object) = cx.object(node) else {
            return;
        };
        let is_output = object.keyword() == Some(Keyword::TargetOutput);
        if !is_output && object.name.is_empty() {
            cx.error(CompileErrorCode::ObjectNameExpected, node, Some("target must be given a name"));
            return;
        }

        let handle = cx.parent_context(node).and_then(|parent| {
            let technique = cx.registry.compositor_technique_mut(parent)?;
            let slot = if is_output {
                TargetSlot::Output
            } else {
                let index = technique.create_target_pass();
                technique.target_passes[index].output_name = Some(object.name.clone());
                TargetSlot::Intermediate(index)
            };
            parent.target_pass(slot)
        });
        let Some(handle) = handle else {
            cx.error(CompileErrorCode::ObjectAllocationError, node, Some("no technique for target"));
            return;
        };
        cx.set_context(node, handle);

        cx.walk_children(node, |cx, child, property| {
            let Some(keyword) = property.keyword() else {
                cx.unexpected(child);
                return;
            };
            match keyword {
                Keyword::Input => {
                    if let Some(mode) = cx.read_enum::<InputMode>(child, property) {
                        with_target(cx, handle, child, |t| t.input = mode);
                    }
                }
                Keyword::OnlyInitial => {
                    if let Some(flag) = cx.read_bool(child, property) {
                        with_target(cx, handle, child, |t| t.only_initial = flag);
                    }
                }
                Keyword::VisibilityMask => {
                    if let Some(mask) = cx.read_uint(child, property) {
                        with_target(cx, handle, child, |t| t.visibility_mask = mask);
                    }
                }
                Keyword::LodBias => {
                    if let Some(bias) = cx.read_float(child, property) {
                        with_target(cx, handle, child, |t| t.lod_bias = bias);
                    }
                }
                Keyword::MaterialScheme => {
                    if let Some(scheme) = cx.read_string(child, property) {
                        with_target(cx, handle, child, |t| t.material_scheme = scheme);
                    }
                }
                Keyword::Shadows => {
                    if let Some(flag) = cx.read_bool(child, property) {
                        with_target(cx, handle, child, |t| t.shadows = flag);
                    }
                }
                _ => cx.unexpected(child),
            }
        });
    }
}

fn with_target(
    cx: &mut TranslationContext<'_>,
    handle: ContextHandle,
    node: NodeId,
    apply: impl FnOnce(&mut crate::registry::TargetPass),
) {
    match cx.registry.target_pass_mut(handle) {
        Some(target) => apply(target),
        None => cx.error(CompileErrorCode::ObjectAllocationError, node, None),
    }
}

/// `pass <type>` inside a target
pub struct CompositionPassTranslator;

impl Translator for CompositionPassTranslator {
    fn name(&self) -> &'static str {
        "composition pass"
    }

    fn dispatch_keys(&self) -> &'static [DispatchKey] {
        &[
            (Keyword::Pass, Some(Keyword::Target)),
            (Keyword::Pass, Some(Keyword::TargetOutput)),
        ]
    }

    fn translate(&self, cx: &mut TranslationContext<'_>, node: NodeId) {
        let Some(object) = cx.object(node) else {
            return;
        };
        let Some(&type_node) = object.values.first() else {
            cx.error(CompileErrorCode::StringExpected, node, Some("pass type expected"));
            return;
        };
        let Some(pass_type) = values::get_enum::<PassType>(&cx.tree[type_node]) else {
            let message = format!(
                "pass type must be one of {}",
                expected_names::<PassType>()
            );
            cx.error(CompileErrorCode::InvalidParameters, node, Some(&message));
            return;
        };

        let handle = cx.parent_context(node).and_then(|parent| {
            let pass = cx.registry.target_pass_mut(parent)?.create_pass(pass_type);
            parent.composition_pass(pass)
        });
        let Some(handle) = handle else {
            cx.error(CompileErrorCode::ObjectAllocationError, node, Some("no target for pass"));
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
    apply: impl FnOnce(&mut crate::registry::CompositionPass),
) {
    match cx.registry.composition_pass_mut(handle) {
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
        Keyword::Material => {
            if let Some(name) = cx.read_string(node, property) {
                with_pass(cx, handle, node, |p| p.material_name = Some(name));
            }
        }
        Keyword::Input => translate_pass_input(cx, handle, node, property),
        Keyword::Identifier => {
            if let Some(id) = cx.read_uint(node, property) {
                with_pass(cx, handle, node, |p| p.identifier = id);
            }
        }
        Keyword::FirstRenderQueue => {
            if let Some(queue) = cx.read_uint_as::<u8>(node, property) {
                with_pass(cx, handle, node, |p| p.first_render_queue = queue);
            }
        }
        Keyword::LastRenderQueue => {
            if let Some(queue) = cx.read_uint_as::<u8>(node, property) {
                with_pass(cx, handle, node, |p| p.last_render_queue = queue);
            }
        }
        Keyword::Buffers => translate_clear_buffers(cx, handle, node, property),
        Keyword::ColourValue => {
            if let Some(colour) = cx.read_colour(node, property) {
                with_pass(cx, handle, node, |p| p.clear.colour = colour);
            }
        }
        Keyword::DepthValue => {
            if let Some(depth) = cx.read_float(node, property) {
                with_pass(cx, handle, node, |p| p.clear.depth = depth);
            }
        }
        Keyword::StencilValue => {
            if let Some(value) = cx.read_uint(node, property) {
                with_pass(cx, handle, node, |p| p.clear.stencil = value);
            }
        }
        Keyword::Check => {
            if let Some(flag) = cx.read_bool(node, property) {
                with_pass(cx, handle, node, |p| p.stencil.check = flag);
            }
        }
        Keyword::CompFunc => {
            if let Some(func) = cx.read_enum::<CompareFunction>(node, property) {
                with_pass(cx, handle, node, |p| p.stencil.func = func);
            }
        }
        Keyword::RefValue => {
            if let Some(value) = cx.read_uint(node, property) {
                with_pass(cx, handle, node, |p| p.stencil.ref_value = value);
            }
        }
        Keyword::Mask => {
            if let Some(mask) = cx.read_uint(node, property) {
                with_pass(cx, handle, node, |p| p.stencil.mask = mask);
            }
        }
        Keyword::FailOp => {
            if let Some(op) = cx.read_enum::<StencilOperation>(node, property) {
                with_pass(cx, handle, node, |p| p.stencil.fail_op = op);
            }
        }
        Keyword::DepthFailOp => {
            if let Some(op) = cx.read_enum::<StencilOperation>(node, property) {
                with_pass(cx, handle, node, |p| p.stencil.depth_fail_op = op);
            }
        }
        Keyword::PassOp => {
            if let Some(op) = cx.read_enum::<StencilOperation>(node, property) {
                with_pass(cx, handle, node, |p| p.stencil.pass_op = op);
            }
        }
        Keyword::TwoSided => {
            if let Some(flag) = cx.read_bool(node, property) {
                with_pass(cx, handle, node, |p| p.stencil.two_sided = flag);
            }
        }
        _ => cx.unexpected(node),
    }
}

/// `input <id> <texture> [mrt index]`
fn translate_pass_input(
    cx: &mut TranslationContext<'_>,
    handle: ContextHandle,
    node: NodeId,
    property: &PropertyNode,
) {
    let args = &property.values;
    if args.len() < 2 {
        cx.error(CompileErrorCode::StringExpected, node, Some("input needs an id and a texture name"));
        return;
    }
    if args.len() > 3 {
        cx.error(CompileErrorCode::FewerParametersExpected, node, Some("input takes at most 3 arguments"));
        return;
    }

    let id = values::get_uint(&cx.tree[args[0]]);
    let name = values::get_string(&cx.tree[args[1]]);
    let mrt_index = match args.get(2) {
        Some(&index) => values::get_uint(&cx.tree[index]),
        None => Some(0),
    };

    match (id, name, mrt_index) {
        (Some(id), Some(name), Some(mrt_index)) => {
            with_pass(cx, handle, node, |p| p.set_input(id, &name, mrt_index));
        }
        _ => cx.error(
            CompileErrorCode::InvalidParameters,
            node,
            Some("input expects <id> <texture> [mrt index]"),
        ),
    }
}

/// `buffers colour depth stencil`, any subset
fn translate_clear_buffers(
    cx: &mut TranslationContext<'_>,
    handle: ContextHandle,
    node: NodeId,
    property: &PropertyNode,
) {
    let mut buffers = crate::registry::ClearBuffers {
        colour: false,
        depth: false,
        stencil: false,
    };
    for &value in &property.values {
        let keyword = cx.tree[value].as_atom().and_then(|a| Keyword::from_id(a.id));
        match keyword {
            Some(Keyword::Colour) => buffers.colour = true,
            Some(Keyword::Depth) => buffers.depth = true,
            Some(Keyword::Stencil) => buffers.stencil = true,
            _ => {
                cx.error(
                    CompileErrorCode::InvalidParameters,
                    node,
                    Some("buffers expects colour, depth or stencil"),
                );
                return;
            }
        }
    }
    with_pass(cx, handle, node, |p| p.clear.buffers = buffers);
}

#[cfg(test)]
mod tests {
    use crate::compiler::{CompileErrorCode, ScriptCompiler};
    use crate::registry::{EngineRegistry, TextureSize};
    use crate::script_enum::{CompareFunction, InputMode, PassType, StencilOperation};

    fn compile(source: &str) -> (EngineRegistry, Vec<CompileErrorCode>) {
        let mut registry = EngineRegistry::new();
        let mut compiler = ScriptCompiler::new();
        compiler.compile(source, "test.compositor", &mut registry);
        let codes = compiler.errors().iter().map(|e| e.code).collect();
        (registry, codes)
    }

    #[test]
    fn test_full_compositor() {
        let (registry, errors) = compile(
            r#"
compositor Bloom
{
    technique
    {
        texture rt0 target_width_scaled 0.5 256 PF_A8R8G8B8
        target rt0
        {
            input previous
            only_initial on
            visibility_mask 0x0F
        }
        target_output
        {
            input none
            pass clear
            {
                buffers colour depth
                colour_value 0 0 0 0
            }
            pass stencil
            {
                comp_func not_equal
                pass_op replace
                ref_value 1
            }
            pass render_quad
            {
                material Bloom/Blur
                input 0 rt0
                identifier 7
            }
        }
    }
}
"#,
        );
        assert_eq!(errors, vec![]);

        let bloom = registry.compositor("Bloom").unwrap();
        let technique = &bloom.techniques[0];
        let texture = technique.texture_definition("rt0").unwrap();
        assert_eq!(texture.width, TextureSize::TargetScaled(0.5));
        assert_eq!(texture.height, TextureSize::Absolute(256));
        assert_eq!(texture.formats, vec!["PF_A8R8G8B8"]);

        let target = &technique.target_passes[0];
        assert_eq!(target.output_name.as_deref(), Some("rt0"));
        assert_eq!(target.input, InputMode::Previous);
        assert!(target.only_initial);
        assert_eq!(target.visibility_mask, 0x0F);

        let output = &technique.output;
        assert_eq!(output.passes.len(), 3);
        assert_eq!(output.passes[0].pass_type, PassType::Clear);
        assert!(!output.passes[0].clear.buffers.stencil);
        assert_eq!(output.passes[0].clear.colour.a, 0.0);
        assert_eq!(output.passes[1].stencil.func, CompareFunction::NotEqual);
        assert_eq!(output.passes[1].stencil.pass_op, StencilOperation::Replace);
        assert_eq!(output.passes[1].stencil.ref_value, 1);

        let quad = &output.passes[2];
        assert_eq!(quad.material_name.as_deref(), Some("Bloom/Blur"));
        assert_eq!(quad.inputs[0].name, "rt0");
        assert_eq!(quad.identifier, 7);
    }

    #[test]
    fn test_bad_properties_are_reported_and_skipped() {
        let (registry, errors) = compile(
            "compositor C\n{\n technique\n {\n  target_output\n  {\n   lod_bias fast\n   shadows off\n   sparkle 3\n   pass render_scene\n   {\n    last_render_queue 300\n   }\n  }\n }\n}\n",
        );
        assert_eq!(
            errors,
            vec![
                CompileErrorCode::InvalidParameters,
                CompileErrorCode::UnexpectedToken,
                CompileErrorCode::InvalidParameters,
            ]
        );

        let output = &registry.compositor("C").unwrap().techniques[0].output;
        assert!(!output.shadows);
        assert_eq!(output.passes[0].last_render_queue, 95);
    }

    #[test]
    fn test_pass_needs_known_type() {
        let (_, errors) = compile(
            "compositor C\n{\n technique\n {\n  target_output\n  {\n   pass render_everything\n   {\n   }\n  }\n }\n}\n",
        );
        assert_eq!(errors, vec![CompileErrorCode::InvalidParameters]);
    }

    #[test]
    fn test_target_needs_name() {
        let (_, errors) = compile("compositor C\n{\n technique\n {\n  target\n  {\n  }\n }\n}\n");
        assert_eq!(errors, vec![CompileErrorCode::ObjectNameExpected]);
    }
}
