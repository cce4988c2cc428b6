//! Concrete tree to abstract tree conversion

use super::{AbstractNode, AbstractTree, AtomNode, NodeId, NodeKind, ObjectNode, PropertyNode};
use crate::compiler::{CompileError, CompileErrorCode};
use crate::keywords::{keyword_id, Keyword};
use crate::script::{ConcreteNode, ScriptToken, TokenKind};
use std::sync::Arc;

/// Decides whether an object of class `cls` inside `parent` takes no name.
/// `Some` overrides the built-in rules.
pub type NameExclusionHook<'h> = dyn FnMut(&str, Option<&str>) -> Option<bool> + 'h;

/// Result of converting one script
#[derive(Debug, Default)]
pub struct BuildOutput {
    pub roots: Vec<NodeId>,
    pub errors: Vec<CompileError>,
    /// Top-level `set` statements, in source order
    pub environment: Vec<(String, String)>,
}

pub struct AbstractTreeBuilder<'t> {
    tree: &'t mut AbstractTree,
    file: Arc<str>,
    exclusion_hook: Option<Box<NameExclusionHook<'t>>>,
    output: BuildOutput,
}

impl<'t> AbstractTreeBuilder<'t> {
    pub fn new(tree: &'t mut AbstractTree, file: &str) -> Self {
        Self {
            tree,
            file: Arc::from(file),
            exclusion_hook: None,
            output: BuildOutput::default(),
        }
    }

    pub fn with_name_exclusion(
        mut self,
        hook: impl FnMut(&str, Option<&str>) -> Option<bool> + 't,
    ) -> Self {
        self.exclusion_hook = Some(Box::new(hook));
        self
    }

    pub fn build(mut self, nodes: &[ConcreteNode]) -> BuildOutput {
        for node in nodes {
            if let Some(id) = self.visit(node, None) {
                self.output.roots.push(id);
            }
        }
        self.output
    }

    /// Value nodes for `tokens`, parented to `parent`
    pub fn build_values(&mut self, tokens: &[ScriptToken], parent: NodeId) -> Vec<NodeId> {
        tokens
            .iter()
            .map(|token| self.value_node(token, parent))
            .collect()
    }

    fn visit(&mut self, node: &ConcreteNode, parent: Option<NodeId>) -> Option<NodeId> {
        match node {
            ConcreteNode::Import {
                target,
                source,
                line,
            } => {
                let kind = NodeKind::Import {
                    target: target.clone(),
                    source: source.clone(),
                };
                Some(self.add(kind, *line, parent))
            }
            ConcreteNode::VariableAssign { name, values, .. } => {
                // a lone quote stores its contents so it expands to plain values
                let value = match values.as_slice() {
                    [only] if only.kind == TokenKind::Quote => only.text.clone(),
                    _ => values
                        .iter()
                        .map(ScriptToken::to_source)
                        .collect::<Vec<_>>()
                        .join(" "),
                };
                match parent.and_then(|p| self.tree.object_mut(p)) {
                    Some(object) => object.set_variable(name, &value),
                    None => self.output.environment.push((name.clone(), value)),
                }
                None
            }
            ConcreteNode::Statement {
                header,
                block: Some(block),
                line,
            } => self.visit_object(header, block, *line, parent),
            ConcreteNode::Statement {
                header,
                block: None,
                line,
            } => self.visit_property(header, *line, parent),
        }
    }

    fn visit_object(
        &mut self,
        header: &[ScriptToken],
        block: &[ConcreteNode],
        line: u32,
        parent: Option<NodeId>,
    ) -> Option<NodeId> {
        let mut tokens = header.iter().peekable();

        let mut object = ObjectNode::default();
        if header.len() > 1 && header[0].is_word("abstract") {
            object.is_abstract = true;
            tokens.next();
        }

        let cls = match tokens.next() {
            Some(token) if token.kind != TokenKind::Colon => token,
            _ => {
                self.output.errors.push(
                    CompileError::new(CompileErrorCode::ObjectNameExpected, &self.file, line)
                        .with_message("object class expected"),
                );
                return None;
            }
        };
        object.cls = cls.text.clone();
        object.id = keyword_id(&cls.text);

        if !self.is_name_excluded(&object.cls, parent) {
            if let Some(token) = tokens.next_if(|t| t.kind != TokenKind::Colon) {
                object.name = token.text.clone();
            }
        }

        let id = self.add(NodeKind::Object(object), line, parent);

        let mut values = Vec::new();
        let mut inherits = false;
        for token in tokens.by_ref() {
            if token.kind == TokenKind::Colon {
                inherits = true;
                break;
            }
            values.push(self.value_node(token, id));
        }
        let bases: Vec<&ScriptToken> = tokens.collect();
        if inherits && (bases.is_empty() || bases.iter().any(|t| t.kind == TokenKind::Colon)) {
            self.output.errors.push(
                CompileError::new(CompileErrorCode::ObjectNameExpected, &self.file, line)
                    .with_message("base object name expected after ':'"),
            );
        }
        let bases: Vec<String> = bases
            .into_iter()
            .filter(|t| t.kind != TokenKind::Colon)
            .map(|t| t.text.clone())
            .collect();

        let mut children = Vec::new();
        for child in block {
            if let Some(child_id) = self.visit(child, Some(id)) {
                children.push(child_id);
            }
        }

        if let Some(object) = self.tree.object_mut(id) {
            object.values = values;
            object.bases = bases;
            object.children = children;
        }
        Some(id)
    }

    fn visit_property(
        &mut self,
        header: &[ScriptToken],
        line: u32,
        parent: Option<NodeId>,
    ) -> Option<NodeId> {
        let (name, rest) = header.split_first()?;
        let property = PropertyNode {
            name: name.text.clone(),
            id: keyword_id(&name.text),
            values: Vec::new(),
        };
        let id = self.add(NodeKind::Property(property), line, parent);

        let values = self.build_values(rest, id);
        if let NodeKind::Property(property) = &mut self.tree[id].kind {
            property.values = values;
        }
        Some(id)
    }

    fn value_node(&mut self, token: &ScriptToken, parent: NodeId) -> NodeId {
        let kind = match token.kind {
            TokenKind::Variable => NodeKind::VariableGet {
                name: token.text.clone(),
            },
            TokenKind::Quote => NodeKind::Atom(AtomNode {
                value: token.text.clone(),
                id: 0,
                quoted: true,
            }),
            _ => NodeKind::Atom(AtomNode {
                value: token.text.clone(),
                id: keyword_id(&token.text),
                quoted: false,
            }),
        };
        self.add(kind, token.line, Some(parent))
    }

    fn add(&mut self, kind: NodeKind, line: u32, parent: Option<NodeId>) -> NodeId {
        let node = AbstractNode::new(kind, Arc::clone(&self.file), line);
        self.tree.add_child(node, parent)
    }

    fn is_name_excluded(&mut self, cls: &str, parent: Option<NodeId>) -> bool {
        let parent_cls = parent.and_then(|p| self.tree.object(p)).map(|o| o.cls.as_str());
        if let Some(hook) = self.exclusion_hook.as_mut() {
            if let Some(excluded) = hook(cls, parent_cls) {
                return excluded;
            }
        }

        let parent_keyword = parent_cls.and_then(Keyword::from_str);
        match Keyword::from_str(cls) {
            Some(Keyword::Emitter | Keyword::Affector) => {
                parent_keyword == Some(Keyword::ParticleSystem)
            }
            Some(Keyword::TextureSource) => parent_keyword == Some(Keyword::TextureUnit),
            // compositor passes are named by type at any depth
            Some(Keyword::Pass) => {
                let mut current = parent;
                while let Some(id) = current {
                    if self.tree.object(id).and_then(ObjectNode::keyword) == Some(Keyword::Compositor) {
                        return true;
                    }
                    current = self.tree.parent(id);
                }
                false
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parse_script;
    use assert_matches::assert_matches;

    fn build(source: &str) -> (AbstractTree, BuildOutput) {
        let nodes = parse_script(source, "test.script").unwrap();
        let mut tree = AbstractTree::new();
        let output = AbstractTreeBuilder::new(&mut tree, "test.script").build(&nodes);
        (tree, output)
    }

    #[test]
    fn test_object_header() {
        let (tree, output) = build("abstract material Base 1 2 : Parent Other\n{\n}\n");
        assert!(output.errors.is_empty());

        let object = tree.object(output.roots[0]).unwrap();
        assert!(object.is_abstract);
        assert_eq!(object.cls, "material");
        assert_eq!(object.name, "Base");
        assert_eq!(object.bases, vec!["Parent", "Other"]);
        assert_eq!(object.values.len(), 2);
        assert_eq!(object.keyword(), Some(Keyword::Material));
    }

    #[test]
    fn test_properties_and_atoms() {
        let (tree, output) = build("material M {\n  lighting off\n  texture \"my file.png\" $v\n}");
        let object = tree.object(output.roots[0]).unwrap();
        let lighting = tree.property(object.children[0]).unwrap();
        assert_eq!(lighting.keyword(), Some(Keyword::Lighting));

        let off = tree.atom(lighting.values[0]).unwrap();
        assert_eq!(off.id, crate::keywords::ID_OFF);

        let texture = tree.property(object.children[1]).unwrap();
        let file = tree.atom(texture.values[0]).unwrap();
        assert!(file.quoted);
        assert_eq!(file.value, "my file.png");
        assert_matches!(&tree[texture.values[1]].kind, NodeKind::VariableGet { name } if name == "$v");
        assert_eq!(tree.parent(texture.values[1]), Some(object.children[1]));
    }

    #[test]
    fn test_builtin_name_exclusion() {
        let (tree, output) = build(
            "particle_system Smoke {\n emitter Point {\n }\n}\ncompositor C {\n technique {\n  target_output {\n   pass render_quad {\n   }\n  }\n }\n}",
        );
        let system = tree.object(output.roots[0]).unwrap();
        let emitter = tree.object(system.children[0]).unwrap();
        assert_eq!(emitter.name, "");
        assert_eq!(tree.atom(emitter.values[0]).unwrap().value, "Point");

        let compositor = tree.object(output.roots[1]).unwrap();
        let technique = tree.object(compositor.children[0]).unwrap();
        let target = tree.object(technique.children[0]).unwrap();
        let pass = tree.object(target.children[0]).unwrap();
        assert_eq!(pass.name, "");
        assert_eq!(tree.atom(pass.values[0]).unwrap().value, "render_quad");
    }

    #[test]
    fn test_material_pass_keeps_its_name() {
        let (tree, output) = build("material M {\n technique {\n  pass Main {\n  }\n }\n}");
        let material = tree.object(output.roots[0]).unwrap();
        let technique = tree.object(material.children[0]).unwrap();
        assert_eq!(tree.object(technique.children[0]).unwrap().name, "Main");
    }

    #[test]
    fn test_exclusion_hook_overrides() {
        let nodes = parse_script("material M {\n technique Fancy {\n }\n}", "m.material").unwrap();
        let mut tree = AbstractTree::new();
        let mut asked = Vec::new();
        let output = AbstractTreeBuilder::new(&mut tree, "m.material")
            .with_name_exclusion(|cls, parent| {
                asked.push((cls.to_string(), parent.map(str::to_string)));
                (cls == "technique").then_some(true)
            })
            .build(&nodes);

        let material = tree.object(output.roots[0]).unwrap();
        let technique = tree.object(material.children[0]).unwrap();
        assert_eq!(technique.name, "");
        assert_eq!(asked[0], ("material".to_string(), None));
        assert_eq!(asked[1].1.as_deref(), Some("material"));
    }

    #[test]
    fn test_variable_scopes() {
        let (tree, output) = build("set $top 1 2\nmaterial M {\n set $inner \"a b\"\n}");
        assert_eq!(output.environment, vec![("$top".to_string(), "1 2".to_string())]);
        let material = tree.object(output.roots[0]).unwrap();
        assert_eq!(material.get_variable("$inner"), Some("a b"));
        assert!(material.children.is_empty());
    }

    #[test]
    fn test_missing_class_reports_object_name_expected() {
        let (_, output) = build(": Base {\n}\n");
        assert!(output.roots.is_empty());
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].code, CompileErrorCode::ObjectNameExpected);
    }

    #[test]
    fn test_colon_without_base_reports_object_name_expected() {
        let (tree, output) = build("compositor A : {\n}\nmaterial B : : C {\n}\n");
        assert_eq!(output.roots.len(), 2);
        assert_eq!(output.errors.len(), 2);
        assert!(output
            .errors
            .iter()
            .all(|e| e.code == CompileErrorCode::ObjectNameExpected));

        let compositor = tree.object(output.roots[0]).unwrap();
        assert_eq!(compositor.name, "A");
        assert!(compositor.bases.is_empty());
        assert_eq!(tree.object(output.roots[1]).unwrap().bases, vec!["C"]);
    }

    #[test]
    fn test_imports_become_nodes() {
        let (tree, output) = build("import * from \"base.material\"\n");
        assert_matches!(
            &tree[output.roots[0]].kind,
            NodeKind::Import { target, source } if target == "*" && source == "base.material"
        );
    }
}
