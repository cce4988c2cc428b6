//! GPU program declarations and the program references inside passes
//!
//! `vertex_program`, `fragment_program` and `geometry_program` create a
//! [`GpuProgram`] in the registry. A pass binds one with a `*_program_ref`
//! block, which must name a program translated earlier and may override its
//! parameters.

use super::{values, DispatchKey, TranslationContext, Translator};
use crate::ast::{NodeId, ObjectNode, PropertyNode};
use crate::compiler::CompileErrorCode;
use crate::keywords::Keyword;
use crate::registry::program::{auto_constant_data_type, AutoDataType};
use crate::registry::{
    AutoExtra, GpuProgram, GpuProgramType, ParameterSlot, ParameterValue, ProgramParameters,
    ProgramRef, ProgramRefSlot,
};

/// Auto constants whose missing extra argument means index 0
const EXTRA_DEFAULTS_TO_ZERO: &[&str] = &[
    "texture_viewproj_matrix",
    "texture_worldviewproj_matrix",
    "spotlight_viewproj_matrix",
    "spotlight_worldviewproj_matrix",
];

fn program_type_of(keyword: Keyword) -> Option<GpuProgramType> {
    match keyword {
        Keyword::VertexProgram => Some(GpuProgramType::Vertex),
        Keyword::FragmentProgram => Some(GpuProgramType::Fragment),
        Keyword::GeometryProgram => Some(GpuProgramType::Geometry),
        _ => None,
    }
}

fn ref_slot(keyword: Keyword) -> Option<ProgramRefSlot> {
    match keyword {
        Keyword::VertexProgramRef => Some(ProgramRefSlot::Vertex),
        Keyword::FragmentProgramRef => Some(ProgramRefSlot::Fragment),
        Keyword::GeometryProgramRef => Some(ProgramRefSlot::Geometry),
        Keyword::ShadowCasterVertexProgramRef => Some(ProgramRefSlot::ShadowCasterVertex),
        Keyword::ShadowReceiverVertexProgramRef => Some(ProgramRefSlot::ShadowReceiverVertex),
        Keyword::ShadowReceiverFragmentProgramRef => Some(ProgramRefSlot::ShadowReceiverFragment),
        _ => None,
    }
}

/// `<kind>_program <name> <language> { ... }`
pub struct GpuProgramTranslator;

impl Translator for GpuProgramTranslator {
    fn name(&self) -> &'static str {
        "gpu program"
    }

    fn dispatch_keys(&self) -> &'static [DispatchKey] {
        &[
            (Keyword::VertexProgram, None),
            (Keyword::FragmentProgram, None),
            (Keyword::GeometryProgram, None),
        ]
    }

    fn translate(&self, cx: &mut TranslationContext<'_>, node: NodeId) {
        let Some(object) = cx.object(node) else {
            return;
        };
        let Some(program_type) = object.keyword().and_then(program_type_of) else {
            cx.unexpected(node);
            return;
        };
        if object.name.is_empty() {
            cx.error(CompileErrorCode::ObjectNameExpected, node, Some("gpu program must be given a name"));
            return;
        }
        let Some(language) = object
            .values
            .first()
            .and_then(|&id| values::get_string(&cx.tree[id]))
        else {
            cx.error(CompileErrorCode::StringExpected, node, Some("gpu program requires a language"));
            return;
        };

        let handle = cx.registry.create_or_get_gpu_program(&object.name, program_type);
        cx.set_context(node, handle);

        let mut program = GpuProgram::new(&object.name, program_type);
        program.language = language;

        for child in cx.children(node) {
            match cx.tree.object(child).map(ObjectNode::keyword) {
                Some(Some(Keyword::DefaultParams)) => {
                    translate_program_parameters(cx, child, &mut program.default_parameters);
                }
                Some(_) => cx.unexpected(child),
                None => match cx.tree.property(child).cloned() {
                    Some(property) => translate_program_property(cx, child, &property, &mut program),
                    None => cx.unexpected(child),
                },
            }
        }

        match cx.registry.gpu_program_mut(handle) {
            Some(slot) => *slot = program,
            None => cx.error(CompileErrorCode::ObjectAllocationError, node, None),
        }
    }
}

fn translate_program_property(
    cx: &mut TranslationContext<'_>,
    node: NodeId,
    property: &PropertyNode,
    program: &mut GpuProgram,
) {
    match property.keyword() {
        Some(Keyword::Source) => {
            if let Some(source) = cx.read_string(node, property) {
                program.source = Some(source);
            }
        }
        Some(Keyword::Syntax) => {
            if let Some(syntax) = cx.read_string(node, property) {
                program.syntax = Some(syntax);
            }
        }
        // everything else is for the language backend
        _ => {
            let value = cx.joined_values(property);
            program.custom_parameters.insert(property.name.clone(), value);
        }
    }
}

/// `vertex_program_ref <program> { ... }` and its fragment, geometry and
/// shadow variants
pub struct ProgramRefTranslator;

impl Translator for ProgramRefTranslator {
    fn name(&self) -> &'static str {
        "program reference"
    }

    fn dispatch_keys(&self) -> &'static [DispatchKey] {
        &[
            (Keyword::VertexProgramRef, Some(Keyword::Pass)),
            (Keyword::FragmentProgramRef, Some(Keyword::Pass)),
            (Keyword::GeometryProgramRef, Some(Keyword::Pass)),
            (Keyword::ShadowCasterVertexProgramRef, Some(Keyword::Pass)),
            (Keyword::ShadowReceiverVertexProgramRef, Some(Keyword::Pass)),
            (Keyword::ShadowReceiverFragmentProgramRef, Some(Keyword::Pass)),
        ]
    }

    fn translate(&self, cx: &mut TranslationContext<'_>, node: NodeId) {
        let Some(object) = cx.object(node) else {
            return;
        };
        let Some(slot) = object.keyword().and_then(ref_slot) else {
            cx.unexpected(node);
            return;
        };
        if object.name.is_empty() {
            let message = format!("{} must name a gpu program", object.cls);
            cx.error(CompileErrorCode::ObjectNameExpected, node, Some(&message));
            return;
        }
        if cx.registry.gpu_program(&object.name).is_none() {
            let message = format!("gpu program '{}' is not defined", object.name);
            cx.error(CompileErrorCode::ReferenceToNonExistingObject, node, Some(&message));
            return;
        }
        let Some(handle) = cx.parent_context(node) else {
            cx.error(CompileErrorCode::ObjectAllocationError, node, Some("no pass for program reference"));
            return;
        };

        let mut parameters = ProgramParameters::default();
        translate_program_parameters(cx, node, &mut parameters);

        match cx.registry.material_pass_mut(handle) {
            Some(pass) => {
                pass.program_refs.insert(
                    slot,
                    ProgramRef {
                        program: object.name,
                        parameters,
                    },
                );
            }
            None => cx.error(CompileErrorCode::ObjectAllocationError, node, None),
        }
    }
}

/// Read every `param_*` and `shared_params_ref` child of `node` into
/// `parameters`. Later properties overwrite earlier ones bound to the same slot.
pub fn translate_program_parameters(
    cx: &mut TranslationContext<'_>,
    node: NodeId,
    parameters: &mut ProgramParameters,
) {
    let mut animation_parametrics = 0;

    for child in cx.children(node) {
        let Some(property) = cx.tree.property(child).cloned() else {
            cx.unexpected(child);
            continue;
        };
        match property.keyword() {
            Some(Keyword::SharedParamsRef) => {
                let name = match property.values.as_slice() {
                    [value] => values::get_string(&cx.tree[*value]),
                    _ => None,
                };
                match name {
                    Some(name) => parameters.shared.push(name),
                    None => cx.error(
                        CompileErrorCode::InvalidParameters,
                        child,
                        Some("shared_params_ref requires a single parameter"),
                    ),
                }
            }
            Some(Keyword::ParamNamed) => translate_constant(cx, child, &property, true, parameters),
            Some(Keyword::ParamIndexed) => translate_constant(cx, child, &property, false, parameters),
            Some(Keyword::ParamNamedAuto) => {
                translate_auto_constant(cx, child, &property, true, parameters, &mut animation_parametrics)
            }
            Some(Keyword::ParamIndexedAuto) => {
                translate_auto_constant(cx, child, &property, false, parameters, &mut animation_parametrics)
            }
            _ => cx.unexpected(child),
        }
    }
}

fn parameter_slot(
    cx: &mut TranslationContext<'_>,
    node: NodeId,
    value: NodeId,
    named: bool,
) -> Option<ParameterSlot> {
    if named {
        match values::get_string(&cx.tree[value]) {
            Some(name) => return Some(ParameterSlot::Named(name)),
            None => {
                cx.error(CompileErrorCode::InvalidParameters, node, Some("parameter name expected"));
                return None;
            }
        }
    }
    match values::get_uint(&cx.tree[value]) {
        Some(index) => Some(ParameterSlot::Indexed(index)),
        None => {
            cx.error(CompileErrorCode::NumberExpected, node, Some("parameter index expected"));
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstantType {
    Float(usize),
    Int(usize),
    Matrix4,
}

/// `float`, `float<N>`, `int`, `int<N>` or `matrix4x4`
fn parse_constant_type(text: &str) -> Option<ConstantType> {
    fn element_count(suffix: &str) -> Option<usize> {
        if suffix.is_empty() {
            return Some(1);
        }
        suffix.parse().ok().filter(|&count| count > 0)
    }

    if text == "matrix4x4" {
        return Some(ConstantType::Matrix4);
    }
    if let Some(suffix) = text.strip_prefix("float") {
        return element_count(suffix).map(ConstantType::Float);
    }
    if let Some(suffix) = text.strip_prefix("int") {
        return element_count(suffix).map(ConstantType::Int);
    }
    None
}

/// `param_named <name> <type> <values..>` or `param_indexed <index> <type> <values..>`
fn translate_constant(
    cx: &mut TranslationContext<'_>,
    node: NodeId,
    property: &PropertyNode,
    named: bool,
    parameters: &mut ProgramParameters,
) {
    let (slot, kind, numbers) = match property.values.as_slice() {
        [slot, kind, numbers @ ..] if !numbers.is_empty() => (*slot, *kind, numbers),
        _ => {
            let message = format!("{} requires at least 3 arguments", property.name);
            cx.error(CompileErrorCode::InvalidParameters, node, Some(&message));
            return;
        }
    };
    let Some(slot) = parameter_slot(cx, node, slot, named) else {
        return;
    };
    let Some(kind) = values::get_string(&cx.tree[kind]).and_then(|text| parse_constant_type(&text)) else {
        cx.error(
            CompileErrorCode::InvalidParameters,
            node,
            Some("incorrect type specified; only variants of int and float allowed"),
        );
        return;
    };

    let value = match kind {
        ConstantType::Matrix4 => {
            let floats: Option<Vec<f32>> = numbers.iter().map(|&id| values::get_float(&cx.tree[id])).collect();
            floats
                .filter(|floats| floats.len() >= 16)
                .and_then(|floats| <[f32; 16]>::try_from(&floats[..16]).ok())
                .map(ParameterValue::Matrix4)
                .ok_or("incorrect matrix4x4 declaration")
        }
        ConstantType::Float(count) => {
            let floats: Option<Vec<f32>> = numbers.iter().map(|&id| values::get_float(&cx.tree[id])).collect();
            floats
                .map(|mut floats| {
                    floats.resize(count, 0.0);
                    ParameterValue::Float(floats)
                })
                .ok_or("incorrect float constant declaration")
        }
        ConstantType::Int(count) => {
            let ints: Option<Vec<i32>> = numbers.iter().map(|&id| values::get_int(&cx.tree[id])).collect();
            ints.map(|mut ints| {
                ints.resize(count, 0);
                ParameterValue::Int(ints)
            })
            .ok_or("incorrect integer constant declaration")
        }
    };

    match value {
        Ok(value) => parameters.set(slot, value),
        Err(message) => cx.error(CompileErrorCode::NumberExpected, node, Some(message)),
    }
}

/// `param_named_auto <name> <constant> [extra..]` and the indexed form
fn translate_auto_constant(
    cx: &mut TranslationContext<'_>,
    node: NodeId,
    property: &PropertyNode,
    named: bool,
    parameters: &mut ProgramParameters,
    animation_parametrics: &mut u32,
) {
    let [slot, constant, extras @ ..] = property.values.as_slice() else {
        let message = format!("{} requires a name or index and an auto constant", property.name);
        cx.error(CompileErrorCode::InvalidParameters, node, Some(&message));
        return;
    };
    let Some(slot) = parameter_slot(cx, node, *slot, named) else {
        return;
    };
    let Some(constant) = values::get_string(&cx.tree[*constant]).map(|c| c.to_ascii_lowercase()) else {
        cx.error(CompileErrorCode::InvalidParameters, node, Some("auto constant name expected"));
        return;
    };
    let Some(data_type) = auto_constant_data_type(&constant) else {
        let message = format!("unknown auto constant '{}'", constant);
        cx.error(CompileErrorCode::InvalidParameters, node, Some(&message));
        return;
    };

    let extra = match data_type {
        AutoDataType::None => AutoExtra::None,
        AutoDataType::Int if constant == "animation_parametric" => {
            let index = *animation_parametrics;
            *animation_parametrics += 1;
            AutoExtra::Int(index)
        }
        AutoDataType::Int => match extras {
            [] if EXTRA_DEFAULTS_TO_ZERO.contains(&constant.as_str()) => AutoExtra::Int(0),
            [] => return missing_extra(cx, node, &constant),
            [first] => match values::get_uint(&cx.tree[*first]) {
                Some(info) => AutoExtra::Int(info),
                None => return invalid_extra(cx, node, "invalid auto constant extra info parameter"),
            },
            [low, high, ..] => {
                let low = values::get_uint(&cx.tree[*low]);
                let high = values::get_uint(&cx.tree[*high]);
                match (low, high) {
                    (Some(low), Some(high)) => AutoExtra::Int(low | (high << 16)),
                    _ => return invalid_extra(cx, node, "invalid auto constant extra info parameter"),
                }
            }
        },
        AutoDataType::Real if constant == "time" || constant == "frame_time" => {
            let factor = extras.first().and_then(|&id| values::get_float(&cx.tree[id]));
            AutoExtra::Real(factor.unwrap_or(1.0))
        }
        AutoDataType::Real => match extras.first() {
            Some(&first) => match values::get_float(&cx.tree[first]) {
                Some(info) => AutoExtra::Real(info),
                None => return invalid_extra(cx, node, "incorrect float argument definition in extra parameters"),
            },
            None => return missing_extra(cx, node, &constant),
        },
    };

    parameters.set(slot, ParameterValue::Auto { constant, extra });
}

fn missing_extra(cx: &mut TranslationContext<'_>, node: NodeId, constant: &str) {
    let message = format!("extra parameters required by constant definition {}", constant);
    cx.error(CompileErrorCode::NumberExpected, node, Some(&message));
}

fn invalid_extra(cx: &mut TranslationContext<'_>, node: NodeId, message: &str) {
    cx.error(CompileErrorCode::InvalidParameters, node, Some(message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ScriptCompiler;
    use crate::registry::EngineRegistry;
    use assert_matches::assert_matches;

    fn compile(source: &str) -> (EngineRegistry, Vec<CompileErrorCode>) {
        let mut registry = EngineRegistry::new();
        let mut compiler = ScriptCompiler::new();
        compiler.compile(source, "test.program", &mut registry);
        let codes = compiler.errors().iter().map(|e| e.code).collect();
        (registry, codes)
    }

    #[test]
    fn test_constant_types() {
        assert_eq!(parse_constant_type("float"), Some(ConstantType::Float(1)));
        assert_eq!(parse_constant_type("float4"), Some(ConstantType::Float(4)));
        assert_eq!(parse_constant_type("int3"), Some(ConstantType::Int(3)));
        assert_eq!(parse_constant_type("matrix4x4"), Some(ConstantType::Matrix4));
        assert_eq!(parse_constant_type("float0"), None);
        assert_eq!(parse_constant_type("double2"), None);
    }

    #[test]
    fn test_vertex_program_with_source() {
        let (registry, errors) = compile("vertex_program V glsl\n{\n    source v.vert\n}\n");
        assert_eq!(errors, vec![]);

        let program = registry.gpu_program("V").unwrap();
        assert_eq!(program.program_type, GpuProgramType::Vertex);
        assert_eq!(program.language, "glsl");
        assert_eq!(program.source.as_deref(), Some("v.vert"));
        assert_eq!(registry.summary().gpu_programs, 1);
    }

    #[test]
    fn test_program_properties_and_default_params() {
        let (registry, errors) = compile(
            r#"
fragment_program Blur hlsl
{
    source blur.hlsl
    syntax ps_2_0
    entry_point main_fp
    target ps_2_0 ps_3_0
    default_params
    {
        param_named radius float 2.5
        param_named tint float4 1 0.5
        param_indexed 2 int2 7 8
        param_named_auto wvp worldviewproj_matrix
        param_named_auto light light_position 1
        param_indexed_auto 4 time_0_x 120
        param_named_auto clock time
        shared_params_ref Globals
    }
}
"#,
        );
        assert_eq!(errors, vec![]);

        let program = registry.gpu_program("Blur").unwrap();
        assert_eq!(program.program_type, GpuProgramType::Fragment);
        assert_eq!(program.syntax.as_deref(), Some("ps_2_0"));
        assert_eq!(program.custom_parameters["entry_point"], "main_fp");
        assert_eq!(program.custom_parameters["target"], "ps_2_0 ps_3_0");

        let params = &program.default_parameters;
        assert_eq!(params.named["radius"], ParameterValue::Float(vec![2.5]));
        assert_eq!(params.named["tint"], ParameterValue::Float(vec![1.0, 0.5, 0.0, 0.0]));
        assert_eq!(params.indexed[&2], ParameterValue::Int(vec![7, 8]));
        assert_matches!(
            &params.named["wvp"],
            ParameterValue::Auto { constant, extra: AutoExtra::None } if constant == "worldviewproj_matrix"
        );
        assert_matches!(&params.named["light"], ParameterValue::Auto { extra: AutoExtra::Int(1), .. });
        assert_matches!(&params.indexed[&4], ParameterValue::Auto { extra: AutoExtra::Real(r), .. } if *r == 120.0);
        assert_matches!(&params.named["clock"], ParameterValue::Auto { extra: AutoExtra::Real(r), .. } if *r == 1.0);
        assert_eq!(params.shared, vec!["Globals".to_string()]);
    }

    #[test]
    fn test_program_errors() {
        let (registry, errors) = compile("vertex_program\n{\n}\ngeometry_program G\n{\n}\n");
        assert_eq!(
            errors,
            vec![CompileErrorCode::ObjectNameExpected, CompileErrorCode::StringExpected]
        );
        assert_eq!(registry.summary().gpu_programs, 0);
    }

    #[test]
    fn test_parameter_errors_keep_siblings() {
        let (registry, errors) = compile(
            r#"
vertex_program V cg
{
    default_params
    {
        param_indexed first float 1
        param_named a double 1
        param_named b float x
        param_named m matrix4x4 1 0 0 0
        param_named_auto c sunlight
        param_named_auto d light_position
        param_named_auto e texture_viewproj_matrix
        shared_params_ref
        unknown_param 1
        param_named ok float 3
    }
}
"#,
        );
        assert_eq!(
            errors,
            vec![
                CompileErrorCode::NumberExpected,
                CompileErrorCode::InvalidParameters,
                CompileErrorCode::NumberExpected,
                CompileErrorCode::NumberExpected,
                CompileErrorCode::InvalidParameters,
                CompileErrorCode::NumberExpected,
                CompileErrorCode::InvalidParameters,
                CompileErrorCode::UnexpectedToken,
            ]
        );
        let params = &registry.gpu_program("V").unwrap().default_parameters;
        assert_eq!(params.named["ok"], ParameterValue::Float(vec![3.0]));
        assert_matches!(&params.named["e"], ParameterValue::Auto { extra: AutoExtra::Int(0), .. });
        assert!(!params.named.contains_key("a"));
    }

    #[test]
    fn test_pass_binds_program_reference() {
        let (registry, errors) = compile(
            r#"
vertex_program Skin glsl
{
    source skin.vert
}

material Hero
{
    technique
    {
        pass
        {
            vertex_program_ref Skin
            {
                param_named_auto wvp worldviewproj_matrix
                param_named scale float 2
            }
            shadow_caster_vertex_program_ref Skin
            {
            }
        }
    }
}
"#,
        );
        assert_eq!(errors, vec![]);

        let pass = &registry.material("Hero").unwrap().techniques[0].passes[0];
        let vertex = &pass.program_refs[&ProgramRefSlot::Vertex];
        assert_eq!(vertex.program, "Skin");
        assert_eq!(vertex.parameters.named["scale"], ParameterValue::Float(vec![2.0]));
        assert!(pass.program_refs[&ProgramRefSlot::ShadowCasterVertex].parameters.is_empty());
        assert!(!pass.program_refs.contains_key(&ProgramRefSlot::Fragment));
    }

    #[test]
    fn test_program_reference_errors() {
        let (registry, errors) = compile(
            "material M\n{\n technique\n {\n  pass\n  {\n   vertex_program_ref V\n   {\n   }\n   fragment_program_ref\n   {\n   }\n  }\n }\n}\n",
        );
        assert_eq!(
            errors,
            vec![
                CompileErrorCode::ReferenceToNonExistingObject,
                CompileErrorCode::ObjectNameExpected,
            ]
        );
        let pass = &registry.material("M").unwrap().techniques[0].passes[0];
        assert!(pass.program_refs.is_empty());
    }
}
