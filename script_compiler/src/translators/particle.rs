//! Particle system scripts
//!
//! Emitter and affector parameters depend on the plugin that implements the
//! type, so anything the system does not know is stored as text.

use super::{values, DispatchKey, TranslationContext, Translator};
use crate::ast::NodeId;
use crate::compiler::CompileErrorCode;
use crate::keywords::Keyword;
use std::collections::BTreeMap;

pub struct ParticleSystemTranslator;

impl Translator for ParticleSystemTranslator {
    fn name(&self) -> &'static str {
        "particle system"
    }

    fn dispatch_keys(&self) -> &'static [DispatchKey] {
        &[(Keyword::ParticleSystem, None)]
    }

    fn translate(&self, cx: &mut TranslationContext<'_>, node: NodeId) {
        let Some(object) = cx.object(node) else {
            return;
        };
        if object.name.is_empty() {
            cx.error(
                CompileErrorCode::ObjectNameExpected,
                node,
                Some("particle_system must be given a name"),
            );
            return;
        }

        let handle = cx.registry.create_or_get_particle_system(&object.name);
        cx.set_context(node, handle);

        cx.walk_children(node, |cx, child, property| match property.keyword() {
            Some(Keyword::Quota) => {
                if let Some(quota) = cx.read_uint(child, property) {
                    if let Some(system) = cx.registry.particle_system_mut(handle) {
                        system.quota = quota;
                    }
                }
            }
            Some(Keyword::Material) => {
                if let Some(material) = cx.read_string(child, property) {
                    if let Some(system) = cx.registry.particle_system_mut(handle) {
                        system.material = Some(material);
                    }
                }
            }
            Some(Keyword::ParticleWidth) => {
                if let Some(width) = cx.read_float(child, property) {
                    if let Some(system) = cx.registry.particle_system_mut(handle) {
                        system.particle_width = width;
                    }
                }
            }
            Some(Keyword::ParticleHeight) => {
                if let Some(height) = cx.read_float(child, property) {
                    if let Some(system) = cx.registry.particle_system_mut(handle) {
                        system.particle_height = height;
                    }
                }
            }
            _ => {
                let value = cx.joined_values(property);
                if let Some(system) = cx.registry.particle_system_mut(handle) {
                    system.parameters.insert(property.name.clone(), value);
                }
            }
        });
    }
}

/// Type from the first value, then parameters from every property
fn collect_parameters(
    cx: &mut TranslationContext<'_>,
    node: NodeId,
    what: &str,
) -> Option<(String, BTreeMap<String, String>)> {
    let object = cx.object(node)?;
    let Some(kind) = object
        .values
        .first()
        .and_then(|&id| values::get_string(&cx.tree[id]))
    else {
        let message = format!("{} requires a type", what);
        cx.error(CompileErrorCode::StringExpected, node, Some(&message));
        return None;
    };

    let mut parameters = BTreeMap::new();
    for child in cx.children(node) {
        match cx.tree[child].as_property() {
            Some(property) => {
                let value = cx.joined_values(property);
                parameters.insert(property.name.clone(), value);
            }
            None => cx.unexpected(child),
        }
    }
    Some((kind, parameters))
}

pub struct ParticleEmitterTranslator;

impl Translator for ParticleEmitterTranslator {
    fn name(&self) -> &'static str {
        "particle emitter"
    }

    fn dispatch_keys(&self) -> &'static [DispatchKey] {
        &[(Keyword::Emitter, Some(Keyword::ParticleSystem))]
    }

    fn translate(&self, cx: &mut TranslationContext<'_>, node: NodeId) {
        let Some((emitter_type, parameters)) = collect_parameters(cx, node, "emitter") else {
            return;
        };
        let handle = cx.parent_context(node).and_then(|parent| {
            let system = cx.registry.particle_system_mut(parent)?;
            let index = system.add_emitter(&emitter_type);
            system.emitters[index].parameters = parameters;
            parent.particle_emitter(index)
        });
        match handle {
            Some(handle) => cx.set_context(node, handle),
            None => cx.error(CompileErrorCode::ObjectAllocationError, node, Some("no particle_system for emitter")),
        }
    }
}

pub struct ParticleAffectorTranslator;

impl Translator for ParticleAffectorTranslator {
    fn name(&self) -> &'static str {
        "particle affector"
    }

    fn dispatch_keys(&self) -> &'static [DispatchKey] {
        &[(Keyword::Affector, Some(Keyword::ParticleSystem))]
    }

    fn translate(&self, cx: &mut TranslationContext<'_>, node: NodeId) {
        let Some((affector_type, parameters)) = collect_parameters(cx, node, "affector") else {
            return;
        };
        let handle = cx.parent_context(node).and_then(|parent| {
            let system = cx.registry.particle_system_mut(parent)?;
            let index = system.add_affector(&affector_type);
            system.affectors[index].parameters = parameters;
            parent.particle_affector(index)
        });
        match handle {
            Some(handle) => cx.set_context(node, handle),
            None => cx.error(CompileErrorCode::ObjectAllocationError, node, Some("no particle_system for affector")),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler::{CompileErrorCode, ScriptCompiler};
    use crate::registry::EngineRegistry;

    #[test]
    fn test_particle_system() {
        let mut registry = EngineRegistry::new();
        let mut compiler = ScriptCompiler::new();
        let ok = compiler.compile(
            r#"
particle_system Smoke
{
    quota 500
    material Smoke/Puff
    particle_width 35
    particle_height 35
    cull_each true

    emitter Point
    {
        angle 11
        emission_rate 15
        colour 0.3 0.3 0.3 1
    }

    affector ColourFader
    {
        alpha -0.2
    }
}
"#,
            "smoke.particle",
            &mut registry,
        );
        assert!(ok, "{:?}", compiler.errors());

        let smoke = registry.particle_system("Smoke").unwrap();
        assert_eq!(smoke.quota, 500);
        assert_eq!(smoke.material.as_deref(), Some("Smoke/Puff"));
        assert_eq!(smoke.particle_width, 35.0);
        assert_eq!(smoke.parameters["cull_each"], "true");

        assert_eq!(smoke.emitters[0].emitter_type, "Point");
        assert_eq!(smoke.emitters[0].parameters["colour"], "0.3 0.3 0.3 1");
        assert_eq!(smoke.affectors[0].affector_type, "ColourFader");
        assert_eq!(smoke.affectors[0].parameters["alpha"], "-0.2");
    }

    #[test]
    fn test_emitter_needs_type() {
        let mut registry = EngineRegistry::new();
        let mut compiler = ScriptCompiler::new();
        let ok = compiler.compile(
            "particle_system P\n{\n emitter\n {\n }\n quota two\n}\n",
            "p.particle",
            &mut registry,
        );
        assert!(!ok);
        let codes: Vec<_> = compiler.errors().iter().map(|e| e.code).collect();
        assert_eq!(
            codes,
            vec![CompileErrorCode::StringExpected, CompileErrorCode::InvalidParameters]
        );
        assert!(registry.particle_system("P").unwrap().emitters.is_empty());
    }
}
