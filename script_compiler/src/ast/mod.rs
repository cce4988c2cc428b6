//! Abstract syntax tree
//!
//! Nodes live in an arena owned by [`AbstractTree`] and refer to each other by
//! [`NodeId`]. A node's `parent` is a back reference only; the owning edges
//! are the `values`, `children` and `overrides` lists. Nodes unlinked from
//! those lists stay in the arena but are unreachable.

pub mod builder;

pub use builder::AbstractTreeBuilder;

use crate::keywords::Keyword;
use crate::registry::ContextHandle;
use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectNode {
    pub cls: String,
    pub name: String,
    /// Keyword id of `cls`, 0 when it is not a keyword
    pub id: u32,
    pub is_abstract: bool,
    pub values: Vec<NodeId>,
    pub children: Vec<NodeId>,
    pub bases: Vec<String>,
    /// Nodes inherited from bases, moved in front of `children` once
    /// inheritance has been processed
    pub overrides: Vec<NodeId>,
    variables: BTreeMap<String, String>,
    /// Engine object this node was translated into
    pub context: Option<ContextHandle>,
}

impl ObjectNode {
    pub fn new(cls: &str, name: &str) -> Self {
        Self {
            cls: cls.to_string(),
            name: name.to_string(),
            id: crate::keywords::keyword_id(cls),
            ..Self::default()
        }
    }

    pub fn keyword(&self) -> Option<Keyword> {
        Keyword::from_id(self.id)
    }

    pub fn set_variable(&mut self, name: &str, value: &str) {
        self.variables.insert(name.to_string(), value.to_string());
    }

    pub fn get_variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }
}

#[derive(Debug, Clone, Default)]
pub struct PropertyNode {
    pub name: String,
    pub id: u32,
    pub values: Vec<NodeId>,
}

impl PropertyNode {
    pub fn keyword(&self) -> Option<Keyword> {
        Keyword::from_id(self.id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AtomNode {
    pub value: String,
    pub id: u32,
    /// Written as a quoted string in the script
    pub quoted: bool,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Object(ObjectNode),
    Property(PropertyNode),
    Atom(AtomNode),
    VariableGet { name: String },
    Import { target: String, source: String },
}

#[derive(Debug, Clone)]
pub struct AbstractNode {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub file: Arc<str>,
    pub line: u32,
}

impl AbstractNode {
    pub fn new(kind: NodeKind, file: Arc<str>, line: u32) -> Self {
        Self {
            kind,
            parent: None,
            file,
            line,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectNode> {
        match &self.kind {
            NodeKind::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ObjectNode> {
        match &mut self.kind {
            NodeKind::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyNode> {
        match &self.kind {
            NodeKind::Property(property) => Some(property),
            _ => None,
        }
    }

    pub fn as_atom(&self) -> Option<&AtomNode> {
        match &self.kind {
            NodeKind::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    /// Keyword id of an object, property or atom
    pub fn id(&self) -> u32 {
        match &self.kind {
            NodeKind::Object(object) => object.id,
            NodeKind::Property(property) => property.id,
            NodeKind::Atom(atom) => atom.id,
            _ => 0,
        }
    }

    /// Script text of a value node
    pub fn value_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Atom(atom) => Some(&atom.value),
            NodeKind::VariableGet { name } => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AbstractTree {
    nodes: Vec<AbstractNode>,
}

impl AbstractTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: AbstractNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Add `node` with `parent` as its back reference
    pub fn add_child(&mut self, node: AbstractNode, parent: Option<NodeId>) -> NodeId {
        let id = self.add(node);
        self.nodes[id.0].parent = parent;
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&AbstractNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn object(&self, id: NodeId) -> Option<&ObjectNode> {
        self.get(id)?.as_object()
    }

    pub fn object_mut(&mut self, id: NodeId) -> Option<&mut ObjectNode> {
        self.nodes.get_mut(id.0)?.as_object_mut()
    }

    pub fn property(&self, id: NodeId) -> Option<&PropertyNode> {
        self.get(id)?.as_property()
    }

    pub fn atom(&self, id: NodeId) -> Option<&AtomNode> {
        self.get(id)?.as_atom()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// Closest enclosing object, starting with the parent of `id`
    pub fn parent_object(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(candidate) = current {
            if self.object(candidate).is_some() {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    /// Context handle of the closest enclosing object
    pub fn parent_context(&self, id: NodeId) -> Option<ContextHandle> {
        self.object(self.parent_object(id)?)?.context
    }

    /// Look `name` up in the object scopes enclosing `id`, innermost first.
    /// `id` itself is searched when it is an object.
    pub fn lookup_variable(&self, id: NodeId, name: &str) -> Option<String> {
        let mut current = Some(id);
        while let Some(candidate) = current {
            if let Some(value) = self.object(candidate).and_then(|o| o.get_variable(name)) {
                return Some(value.to_string());
            }
            current = self.parent(candidate);
        }
        None
    }

    /// Copy the subtree at `id`. The copy gets `parent` as its back reference
    /// and no engine context.
    pub fn deep_clone(&mut self, id: NodeId, parent: Option<NodeId>) -> NodeId {
        self.copy_subtree(None, id, parent)
    }

    /// Copy the subtree at `id` of another tree into this one
    pub fn graft(&mut self, from: &AbstractTree, id: NodeId, parent: Option<NodeId>) -> NodeId {
        self.copy_subtree(Some(from), id, parent)
    }

    /// `from` of `None` copies within this tree
    fn copy_subtree(&mut self, from: Option<&AbstractTree>, id: NodeId, parent: Option<NodeId>) -> NodeId {
        let mut node = from.unwrap_or(&*self)[id].clone();
        node.parent = parent;
        if let NodeKind::Object(object) = &mut node.kind {
            object.context = None;
        }

        let mut kind = node.kind.clone();
        let new_id = self.add(node);
        match &mut kind {
            NodeKind::Object(object) => {
                object.values = self.copy_list(from, &object.values, new_id);
                object.children = self.copy_list(from, &object.children, new_id);
                object.overrides = self.copy_list(from, &object.overrides, new_id);
            }
            NodeKind::Property(property) => {
                property.values = self.copy_list(from, &property.values, new_id);
            }
            _ => {}
        }
        self[new_id].kind = kind;
        new_id
    }

    fn copy_list(&mut self, from: Option<&AbstractTree>, ids: &[NodeId], parent: NodeId) -> Vec<NodeId> {
        ids.iter()
            .map(|&id| self.copy_subtree(from, id, Some(parent)))
            .collect()
    }

    /// Render a subtree as indented text, for debugging and tests
    pub fn dump(&self, roots: &[NodeId]) -> String {
        let mut out = String::new();
        for &root in roots {
            self.dump_node(root, 0, &mut out);
        }
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let values = |ids: &[NodeId]| {
            ids.iter()
                .filter_map(|&v| self[v].value_text())
                .collect::<Vec<_>>()
                .join(" ")
        };

        match &self[id].kind {
            NodeKind::Object(object) => {
                out.push_str(&format!(
                    "{}{}{} {} [{}]\n",
                    indent,
                    if object.is_abstract { "abstract " } else { "" },
                    object.cls,
                    object.name,
                    values(&object.values)
                ));
                for &child in object.overrides.iter().chain(&object.children) {
                    self.dump_node(child, depth + 1, out);
                }
            }
            NodeKind::Property(property) => {
                out.push_str(&format!("{}{} = {}\n", indent, property.name, values(&property.values)));
            }
            NodeKind::Atom(atom) => out.push_str(&format!("{}{}\n", indent, atom.value)),
            NodeKind::VariableGet { name } => out.push_str(&format!("{}{}\n", indent, name)),
            NodeKind::Import { target, source } => {
                out.push_str(&format!("{}import {} from {}\n", indent, target, source))
            }
        }
    }
}

impl Index<NodeId> for AbstractTree {
    type Output = AbstractNode;

    fn index(&self, id: NodeId) -> &AbstractNode {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for AbstractTree {
    fn index_mut(&mut self, id: NodeId) -> &mut AbstractNode {
        &mut self.nodes[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> Arc<str> {
        Arc::from("test.material")
    }

    fn object(tree: &mut AbstractTree, cls: &str, name: &str, parent: Option<NodeId>) -> NodeId {
        let id = tree.add_child(
            AbstractNode::new(NodeKind::Object(ObjectNode::new(cls, name)), file(), 1),
            parent,
        );
        if let Some(parent) = parent {
            tree.object_mut(parent).unwrap().children.push(id);
        }
        id
    }

    #[test]
    fn test_object_keyword_ids() {
        let node = ObjectNode::new("compositor", "Bloom");
        assert_eq!(node.keyword(), Some(Keyword::Compositor));
        assert_eq!(ObjectNode::new("my_thing", "").id, 0);
    }

    #[test]
    fn test_variable_scope_chain() {
        let mut tree = AbstractTree::new();
        let material = object(&mut tree, "material", "Red", None);
        let technique = object(&mut tree, "technique", "", Some(material));
        let pass = object(&mut tree, "pass", "", Some(technique));

        tree.object_mut(material).unwrap().set_variable("$c", "1 0 0");
        tree.object_mut(technique).unwrap().set_variable("$c", "0 1 0");

        assert_eq!(tree.lookup_variable(pass, "$c").as_deref(), Some("0 1 0"));
        assert_eq!(tree.lookup_variable(material, "$c").as_deref(), Some("1 0 0"));
        assert_eq!(tree.lookup_variable(pass, "$missing"), None);
        assert_eq!(tree.parent_object(pass), Some(technique));
    }

    #[test]
    fn test_deep_clone_rewires_parents_and_drops_context() {
        let mut tree = AbstractTree::new();
        let material = object(&mut tree, "material", "Base", None);
        let technique = object(&mut tree, "technique", "", Some(material));
        tree.object_mut(material).unwrap().context =
            Some(ContextHandle::Material { material: 0 });

        let copy = tree.deep_clone(material, None);
        let copied_children = tree.object(copy).unwrap().children.clone();

        assert_ne!(copy, material);
        assert!(tree.object(copy).unwrap().context.is_none());
        assert_eq!(copied_children.len(), 1);
        assert_ne!(copied_children[0], technique);
        assert_eq!(tree.parent(copied_children[0]), Some(copy));
        assert_eq!(tree.parent(technique), Some(material));
    }

    #[test]
    fn test_graft_copies_between_trees() {
        let mut imported = AbstractTree::new();
        let base = object(&mut imported, "material", "Base", None);
        object(&mut imported, "technique", "", Some(base));

        let mut tree = AbstractTree::new();
        object(&mut tree, "material", "Local", None);
        let copy = tree.graft(&imported, base, None);

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.object(copy).unwrap().name, "Base");
        let child = tree.object(copy).unwrap().children[0];
        assert_eq!(tree.object(child).unwrap().cls, "technique");
        assert_eq!(tree.parent(child), Some(copy));
    }

    #[test]
    fn test_dump_indents_children() {
        let mut tree = AbstractTree::new();
        let material = object(&mut tree, "material", "Base", None);
        object(&mut tree, "technique", "", Some(material));

        assert_eq!(tree.dump(&[material]), "material Base []\n  technique  []\n");
    }
}
