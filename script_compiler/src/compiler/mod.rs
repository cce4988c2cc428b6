//! Script compiler
//!
//! [`ScriptCompiler::compile`] runs script text through the whole chain:
//!
//! ```text
//! lex -> parse -> pre_conversion -> AST -> imports -> inheritance
//!     -> variables -> post_conversion -> translate
//! ```
//!
//! Script errors never abort the compile once an AST exists. They pile up as
//! [`CompileError`]s so one run reports every mistake, and the compile counts
//! as successful only when none were raised.

mod diagnostics;
mod error;
pub mod listener;

pub use diagnostics::Diagnostics;
pub use error::{CompileError, CompileErrorCode};
pub use listener::{CompilerEvent, CompilerListener, DirectoryImporter};

use crate::ast::{AbstractTree, AbstractTreeBuilder, NodeId, NodeKind};
use crate::config::compile_time::parser::MAX_VARIABLE_EXPANSION_DEPTH;
use crate::config::compile_time::translation::{MAX_IMPORT_DEPTH, MAX_OVERLAY_DEPTH};
use crate::config::runtime::CompilerPreferences;
use crate::logging::codes;
use crate::registry::EngineRegistry;
use crate::script::{ConcreteNode, ScriptLexer, ScriptParser, ScriptResult};
use crate::translators::{TranslationContext, TranslatorRegistry};
use crate::{log_debug, log_success};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Where a compile unit is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CompileState {
    #[default]
    Idle,
    Parsing,
    Translating,
    Committed,
    Failed,
}

/// Stages run before translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileFlags {
    pub do_imports: bool,
    pub do_objects: bool,
    pub do_variables: bool,
    /// Report top-level objects no translator claims; otherwise they are skipped
    pub report_untranslated: bool,
}

impl Default for CompileFlags {
    fn default() -> Self {
        Self {
            do_imports: true,
            do_objects: true,
            do_variables: true,
            report_untranslated: true,
        }
    }
}

impl From<&CompilerPreferences> for CompileFlags {
    fn from(preferences: &CompilerPreferences) -> Self {
        Self {
            do_imports: preferences.process_imports,
            do_objects: preferences.process_objects,
            do_variables: preferences.process_variables,
            report_untranslated: preferences.report_untranslated_objects,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ImportRequest {
    All,
    Named(Vec<String>),
}

struct ImportedScript {
    tree: AbstractTree,
    roots: Vec<NodeId>,
}

pub struct ScriptCompiler {
    diagnostics: Diagnostics,
    translators: TranslatorRegistry,
    environment: BTreeMap<String, String>,
    imports: HashMap<String, ImportedScript>,
    /// Scripts whose imports are being resolved, to stop import cycles
    loading: HashSet<String>,
    flags: CompileFlags,
    state: CompileState,
}

impl Default for ScriptCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptCompiler {
    pub fn new() -> Self {
        Self {
            diagnostics: Diagnostics::new(),
            translators: TranslatorRegistry::with_defaults(),
            environment: BTreeMap::new(),
            imports: HashMap::new(),
            loading: HashSet::new(),
            flags: CompileFlags::default(),
            state: CompileState::Idle,
        }
    }

    /// Stages [`Self::compile`] runs
    pub fn with_flags(mut self, flags: CompileFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn from_preferences(preferences: &CompilerPreferences) -> Self {
        Self::new().with_flags(CompileFlags::from(preferences))
    }

    pub fn with_listener(mut self, listener: impl CompilerListener + 'static) -> Self {
        self.set_listener(Box::new(listener));
        self
    }

    pub fn set_listener(&mut self, listener: Box<dyn CompilerListener>) {
        self.diagnostics.set_listener(listener);
    }

    pub fn take_listener(&mut self) -> Option<Box<dyn CompilerListener>> {
        self.diagnostics.take_listener()
    }

    /// Register extra translators here before compiling
    pub fn translators_mut(&mut self) -> &mut TranslatorRegistry {
        &mut self.translators
    }

    /// Errors from the last compile, in the order they were raised
    pub fn errors(&self) -> &[CompileError] {
        self.diagnostics.errors()
    }

    pub fn state(&self) -> CompileState {
        self.state
    }

    /// Top-level `set` variables of the last compile
    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    pub fn add_error(&mut self, code: CompileErrorCode, file: &str, line: u32, message: Option<&str>) {
        self.diagnostics.add_error(code, file, line, message);
    }

    /// Compile `script` into `registry`. Returns true when no errors were raised.
    pub fn compile(&mut self, script: &str, source_name: &str, registry: &mut EngineRegistry) -> bool {
        self.reset();
        self.state = CompileState::Parsing;
        self.loading.insert(source_name.to_string());

        let mut nodes = match parse_source(script, source_name) {
            Ok(nodes) => nodes,
            Err(error) => {
                self.diagnostics.add(CompileError::from_script_error(&error));
                return self.finish(source_name);
            }
        };
        if let Some(listener) = self.diagnostics.listener_mut() {
            listener.pre_conversion(source_name, &mut nodes);
        }

        let mut tree = AbstractTree::new();
        let (roots, environment) = self.convert(&mut tree, &nodes, source_name);
        self.environment.extend(environment);
        log_success!(codes::success::AST_CONSTRUCTION_COMPLETE, "Abstract tree built",
            "file" => source_name,
            "nodes" => tree.len()
        );

        self.run(&mut tree, roots, self.flags, registry, source_name)
    }

    /// Compile an already built tree. `flags` picks the stages that run before
    /// translation.
    pub fn compile_ast(
        &mut self,
        tree: &mut AbstractTree,
        roots: Vec<NodeId>,
        flags: CompileFlags,
        registry: &mut EngineRegistry,
    ) -> bool {
        self.reset();
        self.state = CompileState::Parsing;
        let source = roots
            .first()
            .map(|&root| tree[root].file.to_string())
            .unwrap_or_default();
        self.loading.insert(source.clone());
        self.run(tree, roots, flags, registry, &source)
    }

    fn reset(&mut self) {
        self.diagnostics.clear();
        self.environment.clear();
        self.imports.clear();
        self.loading.clear();
        self.state = CompileState::Idle;
    }

    fn run(
        &mut self,
        tree: &mut AbstractTree,
        mut roots: Vec<NodeId>,
        flags: CompileFlags,
        registry: &mut EngineRegistry,
        source: &str,
    ) -> bool {
        if flags.do_imports {
            roots = self.process_imports(tree, roots, 0);
            log_success!(codes::success::IMPORTS_PROCESSED, "Imports processed",
                "file" => source,
                "scripts" => self.imports.len()
            );
        }
        if flags.do_objects {
            let top = roots.clone();
            self.process_objects(tree, &roots, &top);
            log_success!(codes::success::INHERITANCE_PROCESSED, "Inheritance processed", "file" => source);
        }
        if flags.do_variables {
            roots = self.expand_variables(tree, roots, 0);
            log_success!(codes::success::VARIABLES_EXPANDED, "Variables expanded", "file" => source);
        }

        if let Some(listener) = self.diagnostics.listener_mut() {
            if !listener.post_conversion(tree, &roots) {
                log_debug!("Compile stopped before translation", "file" => source);
                return self.finish(source);
            }
        }

        self.state = CompileState::Translating;
        let mut cx = TranslationContext::new(tree, registry, &mut self.diagnostics, &self.translators);
        let mut translated = 0;
        for &root in &roots {
            let Some(object) = cx.tree.object(root) else {
                continue;
            };
            if object.is_abstract {
                continue;
            }
            if !flags.report_untranslated && self.translators.find(object, None).is_none() {
                log_debug!("No translator for top-level object", "class" => &object.cls, "file" => source);
                continue;
            }
            cx.dispatch(root);
            translated += 1;
        }
        log_success!(codes::success::TRANSLATION_COMPLETE, "Translation complete",
            "file" => source,
            "objects" => translated
        );

        self.finish(source)
    }

    fn finish(&mut self, source: &str) -> bool {
        if self.diagnostics.has_errors() {
            self.state = CompileState::Failed;
            log_debug!("Compile failed", "file" => source, "errors" => self.diagnostics.errors().len());
            false
        } else {
            self.state = CompileState::Committed;
            log_success!(codes::success::COMPILE_COMMITTED, "Compile committed", "file" => source);
            true
        }
    }

    fn convert(
        &mut self,
        tree: &mut AbstractTree,
        nodes: &[ConcreteNode],
        file: &str,
    ) -> (Vec<NodeId>, Vec<(String, String)>) {
        let diagnostics = &mut self.diagnostics;
        let output = AbstractTreeBuilder::new(tree, file)
            .with_name_exclusion(|cls, parent| diagnostics.name_exclusion(cls, parent))
            .build(nodes);

        for error in output.errors {
            self.diagnostics.add(error);
        }
        (output.roots, output.environment)
    }

    fn error_at(&mut self, tree: &AbstractTree, node: NodeId, code: CompileErrorCode, message: &str) {
        let at = &tree[node];
        self.diagnostics.add_error(code, &at.file, at.line, Some(message));
    }

    /// Replace top-level import nodes with the objects they request. Imported
    /// objects go in front of the local ones.
    fn process_imports(&mut self, tree: &mut AbstractTree, roots: Vec<NodeId>, depth: usize) -> Vec<NodeId> {
        let mut requests: BTreeMap<String, ImportRequest> = BTreeMap::new();
        let mut local = Vec::with_capacity(roots.len());

        for root in roots {
            let NodeKind::Import { target, source } = &tree[root].kind else {
                local.push(root);
                continue;
            };
            let (target, source) = (target.clone(), source.clone());
            if !self.load_import(tree, root, &source, depth) {
                continue;
            }

            if target == "*" {
                requests.insert(source, ImportRequest::All);
                continue;
            }
            let found = self
                .imports
                .get(&source)
                .and_then(|script| locate_target(&script.tree, &script.roots, &target));
            if found.is_none() {
                let message = format!("\"{}\" is not defined in {}", target, source);
                self.error_at(tree, root, CompileErrorCode::ReferenceToNonExistingObject, &message);
                continue;
            }
            match requests
                .entry(source)
                .or_insert_with(|| ImportRequest::Named(Vec::new()))
            {
                ImportRequest::Named(names) => names.push(target),
                ImportRequest::All => {}
            }
        }

        let mut merged = Vec::new();
        for (source, request) in &requests {
            let Some(script) = self.imports.get(source) else {
                continue;
            };
            let wanted: Vec<NodeId> = match request {
                ImportRequest::All => script.roots.clone(),
                ImportRequest::Named(names) => names
                    .iter()
                    .filter_map(|name| locate_target(&script.tree, &script.roots, name))
                    .collect(),
            };
            for id in wanted {
                merged.push(tree.graft(&script.tree, id, None));
            }
        }
        merged.extend(local);
        merged
    }

    /// Load, convert and cache `source` unless it is cached already
    fn load_import(&mut self, tree: &AbstractTree, at: NodeId, source: &str, depth: usize) -> bool {
        if self.imports.contains_key(source) {
            return true;
        }
        if depth >= MAX_IMPORT_DEPTH || self.loading.contains(source) {
            let message = format!("import of \"{}\" is recursive", source);
            self.error_at(tree, at, CompileErrorCode::ReferenceToNonExistingObject, &message);
            return false;
        }

        let Some(text) = self
            .diagnostics
            .listener_mut()
            .and_then(|listener| listener.import_file(source))
        else {
            let message = format!("could not import \"{}\"", source);
            self.error_at(tree, at, CompileErrorCode::ReferenceToNonExistingObject, &message);
            return false;
        };
        let nodes = match parse_source(&text, source) {
            Ok(nodes) => nodes,
            Err(error) => {
                self.diagnostics.add(CompileError::from_script_error(&error));
                return false;
            }
        };

        self.loading.insert(source.to_string());
        let mut imported = AbstractTree::new();
        let (roots, environment) = self.convert(&mut imported, &nodes, source);
        for (name, value) in environment {
            self.environment.entry(name).or_insert(value);
        }
        let roots = self.process_imports(&mut imported, roots, depth + 1);
        let top = roots.clone();
        self.process_objects(&mut imported, &roots, &top);
        self.loading.remove(source);

        log_debug!("Script imported", "import" => source, "objects" => roots.len());
        self.imports.insert(
            source.to_string(),
            ImportedScript {
                tree: imported,
                roots,
            },
        );
        true
    }

    /// Overlay base objects onto every object that names them, then fold
    /// inherited nodes in front of each object's own children
    fn process_objects(&mut self, tree: &mut AbstractTree, nodes: &[NodeId], top: &[NodeId]) {
        for &id in nodes {
            let Some(object) = tree.object_mut(id) else {
                continue;
            };
            let bases = std::mem::take(&mut object.bases);

            for base in &bases {
                match locate_target(tree, top, base) {
                    Some(source) if source != id => self.overlay(tree, source, id, 0),
                    Some(_) => {
                        let message = format!("\"{}\" cannot inherit from itself", base);
                        self.error_at(tree, id, CompileErrorCode::ObjectBaseNotFound, &message);
                    }
                    None => {
                        let message = format!("base object \"{}\" not found", base);
                        self.error_at(tree, id, CompileErrorCode::ObjectBaseNotFound, &message);
                    }
                }
            }

            let children = tree
                .object(id)
                .map(|object| object.children.clone())
                .unwrap_or_default();
            self.process_objects(tree, &children, top);

            if let Some(object) = tree.object_mut(id) {
                let mut merged = std::mem::take(&mut object.overrides);
                merged.append(&mut object.children);
                object.children = merged;
            }
        }
    }

    /// Copy the contents of base object `src` into `dest`. Object children
    /// pair up with `dest` children first by class and name, then unnamed
    /// base objects pair with the next `dest` child of their class. Paired
    /// objects overlay recursively; unpaired ones are copied in.
    fn overlay(&mut self, tree: &mut AbstractTree, src: NodeId, dest: NodeId, depth: usize) {
        if depth >= MAX_OVERLAY_DEPTH {
            self.error_at(tree, dest, CompileErrorCode::ObjectBaseNotFound, "inheritance is nested too deeply");
            return;
        }
        let Some(source) = tree.object(src).cloned() else {
            return;
        };

        if let Some(target) = tree.object_mut(dest) {
            for (name, value) in source.variables() {
                if target.get_variable(name).is_none() {
                    target.set_variable(name, value);
                }
            }
        }

        let mut pairs: Vec<(NodeId, Option<NodeId>)> = Vec::new();
        for &child in source.overrides.iter().chain(&source.children) {
            if tree.object(child).is_some() {
                pairs.push((child, None));
            } else {
                let copy = tree.deep_clone(child, Some(dest));
                if let Some(target) = tree.object_mut(dest) {
                    target.overrides.push(copy);
                }
            }
        }

        let dest_children: Vec<NodeId> = tree
            .object(dest)
            .map(|object| object.children.clone())
            .unwrap_or_default()
            .into_iter()
            .filter(|&child| tree.object(child).is_some())
            .collect();

        let mut min_index: HashMap<NodeId, usize> = HashMap::new();
        let mut paired: HashSet<NodeId> = HashSet::new();
        let mut max_index = 0;
        for &child in &dest_children {
            min_index.insert(child, max_index);
            let Some(node) = tree.object(child) else {
                continue;
            };
            if node.name.is_empty() {
                continue;
            }
            let matched = pairs.iter().position(|&(base, _)| {
                tree.object(base)
                    .is_some_and(|b| b.cls == node.cls && b.name == node.name)
            });
            let Some(j) = matched else {
                continue;
            };
            if pairs[j].1.is_some() {
                let message = format!("{} \"{}\" overrides its base more than once", node.cls, node.name);
                self.error_at(tree, child, CompileErrorCode::DuplicateOverride, &message);
            } else {
                pairs[j].1 = Some(child);
                max_index = max_index.max(j);
                min_index.insert(child, max_index);
                paired.insert(child);
            }
        }

        for &child in &dest_children {
            if paired.contains(&child) {
                continue;
            }
            let Some(cls) = tree.object(child).map(|object| object.cls.clone()) else {
                continue;
            };
            let start = min_index.get(&child).copied().unwrap_or(0);
            let free = pairs.iter_mut().skip(start).find(|(base, target)| {
                target.is_none()
                    && tree
                        .object(*base)
                        .is_some_and(|b| b.name.is_empty() && b.cls == cls)
            });
            if let Some(pair) = free {
                pair.1 = Some(child);
            }
        }

        let mut insert_at = 0;
        for (base, target) in pairs {
            match target {
                Some(target) => {
                    self.overlay(tree, base, target, depth + 1);
                    insert_at = tree
                        .object(dest)
                        .and_then(|object| object.children.iter().position(|&c| c == target))
                        .map_or(insert_at, |i| i + 1);
                }
                None => {
                    let copy = tree.deep_clone(base, Some(dest));
                    if let Some(object) = tree.object_mut(dest) {
                        let at = insert_at.min(object.children.len());
                        object.children.insert(at, copy);
                    }
                    insert_at += 1;
                }
            }
        }
    }

    /// Replace variable references in `ids` and below with their values.
    /// Abstract objects are left alone.
    fn expand_variables(&mut self, tree: &mut AbstractTree, ids: Vec<NodeId>, depth: usize) -> Vec<NodeId> {
        let mut expanded = Vec::with_capacity(ids.len());
        for id in ids {
            match &tree[id].kind {
                NodeKind::Object(object) if !object.is_abstract => {
                    let values = object.values.clone();
                    let children = object.children.clone();
                    let values = self.expand_variables(tree, values, depth);
                    let children = self.expand_variables(tree, children, depth);
                    if let Some(object) = tree.object_mut(id) {
                        object.values = values;
                        object.children = children;
                    }
                    expanded.push(id);
                }
                NodeKind::Property(property) => {
                    let values = property.values.clone();
                    let values = self.expand_variables(tree, values, depth);
                    if let NodeKind::Property(property) = &mut tree[id].kind {
                        property.values = values;
                    }
                    expanded.push(id);
                }
                NodeKind::VariableGet { name } => {
                    let name = name.clone();
                    expanded.extend(self.expand_variable(tree, id, &name, depth));
                }
                _ => expanded.push(id),
            }
        }
        expanded
    }

    fn expand_variable(&mut self, tree: &mut AbstractTree, id: NodeId, name: &str, depth: usize) -> Vec<NodeId> {
        let value = tree
            .lookup_variable(id, name)
            .or_else(|| self.environment.get(name).cloned());
        let Some(value) = value else {
            let message = format!("{} is not defined", name);
            self.error_at(tree, id, CompileErrorCode::UndefinedVariable, &message);
            return Vec::new();
        };
        if depth >= MAX_VARIABLE_EXPANSION_DEPTH {
            let message = format!("{} expands into itself", name);
            self.error_at(tree, id, CompileErrorCode::UndefinedVariable, &message);
            return Vec::new();
        }
        let Some(owner) = tree.parent(id) else {
            return Vec::new();
        };

        let file = tree[id].file.to_string();
        let line = tree[id].line;
        let tokens = match ScriptLexer::tokenize(&value, &file)
            .and_then(|tokens| ScriptParser::parse_chunk(&tokens, &file))
        {
            Ok(tokens) => tokens,
            Err(error) => {
                self.diagnostics.add(CompileError::from_script_error(&error));
                return Vec::new();
            }
        };

        let values = AbstractTreeBuilder::new(tree, &file).build_values(&tokens, owner);
        for &value in &values {
            tree[value].line = line;
        }
        self.expand_variables(tree, values, depth + 1)
    }
}

fn parse_source(script: &str, file: &str) -> ScriptResult<Vec<ConcreteNode>> {
    let tokens = ScriptLexer::tokenize(script, file)?;
    log_success!(codes::success::LEXING_COMPLETE, "Lexing completed",
        "file" => file,
        "tokens" => tokens.len()
    );
    let nodes = ScriptParser::parse(&tokens, file)?;
    log_success!(codes::success::PARSE_COMPLETE, "Parse completed",
        "file" => file,
        "nodes" => nodes.len()
    );
    Ok(nodes)
}

/// Last top-level object named `name`, so later definitions win
fn locate_target(tree: &AbstractTree, roots: &[NodeId], name: &str) -> Option<NodeId> {
    roots
        .iter()
        .rev()
        .copied()
        .find(|&id| tree.object(id).is_some_and(|object| object.name == name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NodeId, ObjectNode};
    use crate::registry::ColourValue;
    use crate::script::parse_script;
    use crate::script_enum::PassType;
    use crate::translators::{DispatchKey, Translator};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn compile(source: &str) -> (ScriptCompiler, EngineRegistry, bool) {
        let mut compiler = ScriptCompiler::new();
        let mut registry = EngineRegistry::new();
        let ok = compiler.compile(source, "test.material", &mut registry);
        (compiler, registry, ok)
    }

    fn error_codes(compiler: &ScriptCompiler) -> Vec<CompileErrorCode> {
        compiler.errors().iter().map(|e| e.code).collect()
    }

    #[test]
    fn test_compositor_end_to_end() {
        let (compiler, registry, ok) =
            compile("compositor MyComp { technique { target_output { pass render_scene { } } } }");
        assert!(ok, "{:?}", compiler.errors());
        assert!(compiler.errors().is_empty());
        assert_eq!(compiler.state(), CompileState::Committed);

        let compositor = registry.compositor("MyComp").unwrap();
        assert_eq!(compositor.techniques.len(), 1);
        let output = &compositor.techniques[0].output;
        assert_eq!(output.passes.len(), 1);
        assert_eq!(output.passes[0].pass_type, PassType::RenderScene);
    }

    #[test]
    fn test_missing_compositor_name() {
        let (compiler, registry, ok) = compile("compositor { }");
        assert!(!ok);
        assert_eq!(compiler.state(), CompileState::Failed);
        assert_eq!(registry.summary().compositors, 0);
        assert_eq!(error_codes(&compiler), vec![CompileErrorCode::ObjectNameExpected]);
    }

    #[test]
    fn test_inheritance_colon_needs_a_base() {
        let (compiler, _, ok) = compile("compositor A : {\n}\n");
        assert!(!ok);
        assert_eq!(error_codes(&compiler).first(), Some(&CompileErrorCode::ObjectNameExpected));
    }

    #[test]
    fn test_syntax_error_stops_before_translation() {
        let (compiler, registry, ok) = compile("material Broken\n{\n  technique\n  {\n");
        assert!(!ok);
        assert_eq!(error_codes(&compiler), vec![CompileErrorCode::ScriptSyntaxError]);
        assert_eq!(registry.summary().total(), 0);
    }

    #[test]
    fn test_errors_reset_between_compiles() {
        let mut compiler = ScriptCompiler::new();
        let mut registry = EngineRegistry::new();
        assert!(!compiler.compile("compositor { }", "a.compositor", &mut registry));
        assert!(compiler.compile("set $x 1\nmaterial Ok { }", "b.material", &mut registry));
        assert!(compiler.errors().is_empty());
        assert_eq!(compiler.environment().get("$x").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_inheritance_overlays_bases() {
        let (compiler, registry, ok) = compile(
            r#"
abstract pass Lit
{
    lighting on
    ambient 0.2 0.2 0.2
}

material Base
{
    technique
    {
        pass Main
        {
            diffuse 1 0 0
            depth_write off
        }
    }
}

material Derived : Base
{
    technique
    {
        pass Main : Lit
        {
            diffuse 0 1 0
        }
    }
}
"#,
        );
        assert!(ok, "{:?}", compiler.errors());
        assert!(registry.material("Lit").is_none());

        let base = &registry.material("Base").unwrap().techniques[0].passes[0];
        assert_eq!(base.diffuse, ColourValue::new(1.0, 0.0, 0.0, 1.0));

        let derived = registry.material("Derived").unwrap();
        assert_eq!(derived.techniques.len(), 1);
        let pass = &derived.techniques[0].passes[0];
        assert_eq!(pass.name.as_deref(), Some("Main"));
        assert_eq!(pass.diffuse, ColourValue::new(0.0, 1.0, 0.0, 1.0));
        assert!(!pass.depth_write);
        assert_eq!(pass.ambient, ColourValue::new(0.2, 0.2, 0.2, 1.0));
    }

    #[test]
    fn test_unpaired_base_objects_are_copied_in() {
        let (compiler, registry, ok) = compile(
            "material Base\n{\n technique Low\n {\n }\n technique High\n {\n }\n}\n\
             material Derived : Base\n{\n technique High\n {\n  scheme hdr\n }\n}\n",
        );
        assert!(ok, "{:?}", compiler.errors());
        let techniques = &registry.material("Derived").unwrap().techniques;
        let names: Vec<_> = techniques.iter().map(|t| t.name.as_deref()).collect();
        assert_eq!(names, vec![Some("Low"), Some("High")]);
        assert_eq!(techniques[1].scheme, "hdr");
    }

    #[test]
    fn test_inheritance_errors() {
        let (compiler, registry, ok) = compile("material A : Missing\n{\n}\n");
        assert!(!ok);
        assert_eq!(error_codes(&compiler), vec![CompileErrorCode::ObjectBaseNotFound]);
        assert!(registry.material("A").is_some());

        let (compiler, _, ok) = compile(
            "material Base\n{\n technique T\n {\n }\n}\n\
             material D : Base\n{\n technique T\n {\n }\n technique T\n {\n }\n}\n",
        );
        assert!(!ok);
        assert_eq!(error_codes(&compiler), vec![CompileErrorCode::DuplicateOverride]);
    }

    #[test]
    fn test_variables_expand_from_scope_and_environment() {
        let (compiler, registry, ok) = compile(
            r#"
set $alpha 0.5
material Fade
{
    set $colour "1 0 0"
    technique
    {
        pass
        {
            diffuse $colour $alpha
        }
    }
}
"#,
        );
        assert!(ok, "{:?}", compiler.errors());
        let pass = &registry.material("Fade").unwrap().techniques[0].passes[0];
        assert_eq!(pass.diffuse, ColourValue::new(1.0, 0.0, 0.0, 0.5));
    }

    #[test]
    fn test_undefined_variable() {
        let (compiler, _, ok) = compile("material M\n{\n technique\n {\n  pass\n  {\n   diffuse $nope\n  }\n }\n}\n");
        assert!(!ok);
        let codes = error_codes(&compiler);
        assert_eq!(codes[0], CompileErrorCode::UndefinedVariable);
        assert_eq!(compiler.errors()[0].line, 7);
    }

    struct Library;

    impl CompilerListener for Library {
        fn import_file(&mut self, name: &str) -> Option<String> {
            (name == "base.material").then(|| {
                "material Shared\n{\n technique\n {\n  pass\n  {\n   ambient 0.5 0.5 0.5\n  }\n }\n}\n"
                    .to_string()
            })
        }
    }

    #[test]
    fn test_imports_feed_inheritance() {
        let mut compiler = ScriptCompiler::new().with_listener(Library);
        let mut registry = EngineRegistry::new();
        let ok = compiler.compile(
            "import Shared from \"base.material\"\nmaterial Child : Shared\n{\n}\n",
            "child.material",
            &mut registry,
        );
        assert!(ok, "{:?}", compiler.errors());

        let child = &registry.material("Child").unwrap().techniques[0].passes[0];
        assert_eq!(child.ambient, ColourValue::new(0.5, 0.5, 0.5, 1.0));
        assert!(registry.material("Shared").is_some());
    }

    #[test]
    fn test_import_failures() {
        let mut compiler = ScriptCompiler::new().with_listener(Library);
        let mut registry = EngineRegistry::new();
        let ok = compiler.compile(
            "import * from \"nowhere.material\"\nimport Other from \"base.material\"\n",
            "main.material",
            &mut registry,
        );
        assert!(!ok);
        assert_eq!(
            error_codes(&compiler),
            vec![
                CompileErrorCode::ReferenceToNonExistingObject,
                CompileErrorCode::ReferenceToNonExistingObject
            ]
        );

        // no listener means nothing can be imported
        let (compiler, _, ok) = compile("import * from \"base.material\"\n");
        assert!(!ok);
        assert_eq!(error_codes(&compiler), vec![CompileErrorCode::ReferenceToNonExistingObject]);
    }

    #[test]
    fn test_post_conversion_can_stop_the_compile() {
        struct Stop;
        impl CompilerListener for Stop {
            fn post_conversion(&mut self, tree: &AbstractTree, roots: &[NodeId]) -> bool {
                assert_eq!(tree.object(roots[0]).unwrap().name, "Red");
                false
            }
        }

        let mut compiler = ScriptCompiler::new().with_listener(Stop);
        let mut registry = EngineRegistry::new();
        assert!(compiler.compile("material Red\n{\n}\n", "red.material", &mut registry));
        assert_eq!(registry.summary().total(), 0);
    }

    #[test]
    fn test_compile_ast_honours_flags() {
        let nodes = parse_script("material A : Missing\n{\n}\n", "a.material").unwrap();
        let mut tree = AbstractTree::new();
        let roots = AbstractTreeBuilder::new(&mut tree, "a.material").build(&nodes).roots;

        let mut compiler = ScriptCompiler::new();
        let mut registry = EngineRegistry::new();
        let flags = CompileFlags {
            do_objects: false,
            ..CompileFlags::default()
        };
        assert!(compiler.compile_ast(&mut tree, roots, flags, &mut registry));
        assert!(registry.material("A").is_some());
    }

    #[test]
    fn test_custom_translators_and_unknown_objects() {
        struct Water(Arc<AtomicUsize>);
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
            fn translate(&self, _cx: &mut TranslationContext<'_>, _node: NodeId) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let mut compiler = ScriptCompiler::new();
        compiler.translators_mut().register_custom(Box::new(Water(Arc::clone(&calls))));

        let mut registry = EngineRegistry::new();
        let ok = compiler.compile(
            "water_surface Lake\n{\n}\nlava_surface Pit\n{\n}\n",
            "world.material",
            &mut registry,
        );
        assert!(!ok);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(error_codes(&compiler), vec![CompileErrorCode::UnexpectedToken]);
    }

    #[test]
    fn test_untranslated_objects_can_be_skipped() {
        let preferences = CompilerPreferences {
            process_imports: true,
            process_objects: true,
            process_variables: true,
            report_untranslated_objects: false,
        };
        let mut compiler = ScriptCompiler::from_preferences(&preferences);
        let mut registry = EngineRegistry::new();

        let ok = compiler.compile(
            "lava_surface Pit\n{\n}\nmaterial Rock\n{\n}\n",
            "world.material",
            &mut registry,
        );
        assert!(ok, "{:?}", compiler.errors());
        assert!(registry.material("Rock").is_some());
    }

    #[test]
    fn test_listener_name_exclusion() {
        struct Unnamed;
        impl CompilerListener for Unnamed {
            fn handle_event(&mut self, event: &CompilerEvent<'_>) -> Option<bool> {
                match event {
                    CompilerEvent::NameExclusion { cls: "particle_system", .. } => Some(true),
                    _ => None,
                }
            }
        }

        let mut compiler = ScriptCompiler::new().with_listener(Unnamed);
        let mut registry = EngineRegistry::new();
        assert!(!compiler.compile("particle_system Smoke\n{\n}\n", "s.particle", &mut registry));
        assert_eq!(error_codes(&compiler), vec![CompileErrorCode::ObjectNameExpected]);
    }
}
