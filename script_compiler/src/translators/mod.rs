//! Translators turn object nodes into engine objects
//!
//! A [`TranslatorRegistry`] picks the translator for an object from its
//! keyword and its parent's keyword. Translators report problems through the
//! [`TranslationContext`] and keep going, so one bad property never hides the
//! errors that follow it.

pub mod compositor;
pub mod context;
pub mod material;
pub mod particle;
pub mod program;
pub mod values;

pub use context::TranslationContext;
pub use values::{get_bool, get_colour, get_enum, get_float, get_int, get_string, get_uint};

use crate::ast::{NodeId, ObjectNode};
use crate::keywords::Keyword;
use crate::log_warning;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

/// Object keyword, and the parent keyword it applies under. `None` matches
/// any parent.
pub type DispatchKey = (Keyword, Option<Keyword>);

pub trait Translator: Send + Sync {
    fn name(&self) -> &'static str;

    fn dispatch_keys(&self) -> &'static [DispatchKey];

    fn check_for(&self, node: &ObjectNode, parent: Option<&ObjectNode>) -> bool {
        let Some(keyword) = node.keyword() else {
            return false;
        };
        let parent = parent.and_then(ObjectNode::keyword);
        self.dispatch_keys()
            .iter()
            .any(|&(k, p)| k == keyword && (p.is_none() || p == parent))
    }

    fn translate(&self, cx: &mut TranslationContext<'_>, node: NodeId);
}

#[derive(Default)]
pub struct TranslatorRegistry {
    translators: Vec<Box<dyn Translator>>,
    scoped: HashMap<(Keyword, Keyword), usize>,
    defaults: HashMap<Keyword, usize>,
    custom: Vec<usize>,
}

impl TranslatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in translator
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let builtins: Vec<Box<dyn Translator>> = vec![
            Box::new(compositor::CompositorTranslator),
            Box::new(compositor::CompositorTechniqueTranslator),
            Box::new(compositor::TargetTranslator),
            Box::new(compositor::CompositionPassTranslator),
            Box::new(material::MaterialTranslator),
            Box::new(material::MaterialTechniqueTranslator),
            Box::new(material::MaterialPassTranslator),
            Box::new(material::TextureUnitTranslator),
            Box::new(material::TextureSourceTranslator),
            Box::new(particle::ParticleSystemTranslator),
            Box::new(particle::ParticleEmitterTranslator),
            Box::new(particle::ParticleAffectorTranslator),
            Box::new(program::GpuProgramTranslator),
            Box::new(program::ProgramRefTranslator),
        ];
        for translator in builtins {
            registry.register(translator);
        }
        registry
    }

    /// Add `translator` under its dispatch keys. Keys that already belong to
    /// another translator keep their first owner and are returned.
    pub fn register(&mut self, translator: Box<dyn Translator>) -> Vec<DispatchKey> {
        let index = self.translators.len();
        let mut duplicates = Vec::new();

        for &key in translator.dispatch_keys() {
            let inserted = match key {
                (keyword, Some(parent)) => insert_first(&mut self.scoped, (keyword, parent), index),
                (keyword, None) => insert_first(&mut self.defaults, keyword, index),
            };
            if !inserted {
                duplicates.push(key);
            }
        }

        for (keyword, parent) in &duplicates {
            log_warning!("Duplicate translator registration ignored",
                "translator" => translator.name(),
                "keyword" => keyword,
                "parent" => parent.map_or("any", Keyword::as_str)
            );
        }

        self.translators.push(translator);
        duplicates
    }

    /// Add a translator consulted through `check_for` after the keyed lookups
    pub fn register_custom(&mut self, translator: Box<dyn Translator>) {
        self.custom.push(self.translators.len());
        self.translators.push(translator);
    }

    pub fn find(&self, node: &ObjectNode, parent: Option<&ObjectNode>) -> Option<&dyn Translator> {
        let keyword = node.keyword();
        let parent_keyword = parent.and_then(ObjectNode::keyword);

        let keyed = keyword.and_then(|k| {
            parent_keyword
                .and_then(|p| self.scoped.get(&(k, p)))
                .or_else(|| self.defaults.get(&k))
        });

        keyed
            .or_else(|| {
                self.custom
                    .iter()
                    .find(|&&i| self.translators[i].check_for(node, parent))
            })
            .map(|&i| self.translators[i].as_ref())
    }

    pub fn len(&self) -> usize {
        self.translators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }
}

fn insert_first<K: Eq + Hash>(map: &mut HashMap<K, usize>, key: K, index: usize) -> bool {
    match map.entry(key) {
        Entry::Occupied(_) => false,
        Entry::Vacant(slot) => {
            slot.insert(index);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, &'static [DispatchKey]);

    impl Translator for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn dispatch_keys(&self) -> &'static [DispatchKey] {
            self.1
        }

        fn translate(&self, _cx: &mut TranslationContext<'_>, _node: NodeId) {}
    }

    fn object(cls: &str) -> ObjectNode {
        ObjectNode::new(cls, "")
    }

    #[test]
    fn test_scoped_keys_win_over_defaults() {
        let mut registry = TranslatorRegistry::new();
        registry.register(Box::new(Named("any pass", &[(Keyword::Pass, None)])));
        registry.register(Box::new(Named(
            "material pass",
            &[(Keyword::Pass, Some(Keyword::Technique))],
        )));

        let pass = object("pass");
        let technique = object("technique");
        let target = object("target");
        assert_eq!(registry.find(&pass, Some(&technique)).unwrap().name(), "material pass");
        assert_eq!(registry.find(&pass, Some(&target)).unwrap().name(), "any pass");
        assert_eq!(registry.find(&pass, None).unwrap().name(), "any pass");
    }

    #[test]
    fn test_duplicates_keep_first_registration() {
        let mut registry = TranslatorRegistry::new();
        registry.register(Box::new(Named("first", &[(Keyword::Material, None)])));
        let duplicates = registry.register(Box::new(Named("second", &[(Keyword::Material, None)])));

        assert_eq!(duplicates, vec![(Keyword::Material, None)]);
        assert_eq!(registry.find(&object("material"), None).unwrap().name(), "first");
    }

    #[test]
    fn test_custom_translators_match_by_predicate() {
        struct Water;
        impl Translator for Water {
            fn name(&self) -> &'static str {
                "water"
            }
            fn dispatch_keys(&self) -> &'static [DispatchKey] {
                &[]
            }
            fn check_for(&self, node: &ObjectNode, _parent: Option<&ObjectNode>) -> bool {
                node.cls == "water_surface"
            }
            fn translate(&self, _cx: &mut TranslationContext<'_>, _node: NodeId) {}
        }

        let mut registry = TranslatorRegistry::with_defaults();
        registry.register_custom(Box::new(Water));

        assert_eq!(registry.find(&object("water_surface"), None).unwrap().name(), "water");
        assert!(registry.find(&object("lake"), None).is_none());
    }

    #[test]
    fn test_defaults_cover_every_builtin_without_duplicates() {
        let registry = TranslatorRegistry::with_defaults();
        assert_eq!(registry.len(), 14);

        let compositor = object("compositor");
        let technique = object("technique");
        let material = object("material");
        assert_eq!(
            registry.find(&technique, Some(&compositor)).unwrap().name(),
            "compositor technique"
        );
        assert_eq!(
            registry.find(&technique, Some(&material)).unwrap().name(),
            "material technique"
        );
        let pass = object("pass");
        assert_eq!(
            registry.find(&object("fragment_program_ref"), Some(&pass)).unwrap().name(),
            "program reference"
        );
        assert_eq!(registry.find(&object("vertex_program"), None).unwrap().name(), "gpu program");
    }
}
