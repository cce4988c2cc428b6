//! State a translator works against

use super::values;
use super::TranslatorRegistry;
use crate::ast::{AbstractTree, NodeId, NodeKind, ObjectNode, PropertyNode};
use crate::compiler::{CompileError, CompileErrorCode, Diagnostics};
use crate::registry::{ColourValue, ContextHandle, EngineRegistry};
use crate::script_enum::{expected_names, ScriptEnum};

pub struct TranslationContext<'c> {
    pub tree: &'c mut AbstractTree,
    pub registry: &'c mut EngineRegistry,
    diagnostics: &'c mut Diagnostics,
    translators: &'c TranslatorRegistry,
}

impl<'c> TranslationContext<'c> {
    pub fn new(
        tree: &'c mut AbstractTree,
        registry: &'c mut EngineRegistry,
        diagnostics: &'c mut Diagnostics,
        translators: &'c TranslatorRegistry,
    ) -> Self {
        Self {
            tree,
            registry,
            diagnostics,
            translators,
        }
    }

    /// Translate an object node with whichever translator claims it
    pub fn dispatch(&mut self, node: NodeId) {
        let translators = self.translators;
        let Some(object) = self.tree.object(node) else {
            return;
        };
        let parent = self.tree.parent_object(node).and_then(|p| self.tree.object(p));

        match translators.find(object, parent) {
            Some(translator) => translator.translate(self, node),
            None => {
                let message = format!("no translator for '{}'", object.cls);
                self.error(CompileErrorCode::UnexpectedToken, node, Some(&message));
            }
        }
    }

    /// Record an error at `node`'s location
    pub fn error(&mut self, code: CompileErrorCode, node: NodeId, message: Option<&str>) {
        let at = &self.tree[node];
        let mut error = CompileError::new(code, &at.file, at.line);
        if let Some(message) = message {
            error = error.with_message(message);
        }
        self.diagnostics.add(error);
    }

    /// Copy of an object node's header; children are walked with [`Self::children`]
    pub fn object(&self, node: NodeId) -> Option<ObjectNode> {
        self.tree.object(node).cloned()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree
            .object(node)
            .map(|object| object.children.clone())
            .unwrap_or_default()
    }

    pub fn set_context(&mut self, node: NodeId, handle: ContextHandle) {
        if let Some(object) = self.tree.object_mut(node) {
            object.context = Some(handle);
        }
    }

    pub fn parent_context(&self, node: NodeId) -> Option<ContextHandle> {
        self.tree.parent_context(node)
    }

    /// Report a child property no translator case handled
    pub fn unexpected(&mut self, node: NodeId) {
        let message = match &self.tree[node].kind {
            NodeKind::Property(property) => format!("token \"{}\" is not recognized", property.name),
            NodeKind::Object(object) => format!("object \"{}\" is not allowed here", object.cls),
            _ => "token is not recognized".to_string(),
        };
        self.error(CompileErrorCode::UnexpectedToken, node, Some(&message));
    }

    /// Dispatch object children and hand property children to `on_property`
    pub fn walk_children(
        &mut self,
        node: NodeId,
        mut on_property: impl FnMut(&mut Self, NodeId, &PropertyNode),
    ) {
        for child in self.children(node) {
            match &self.tree[child].kind {
                NodeKind::Object(_) => self.dispatch(child),
                NodeKind::Property(property) => {
                    let property = property.clone();
                    on_property(self, child, &property);
                }
                _ => self.unexpected(child),
            }
        }
    }

    /// The only value of a property. An empty list reports `missing`; more
    /// than one value reports `FewerParametersExpected`.
    pub fn single_value(
        &mut self,
        node: NodeId,
        property: &PropertyNode,
        missing: CompileErrorCode,
    ) -> Option<NodeId> {
        match property.values.as_slice() {
            [value] => Some(*value),
            [] => {
                let message = format!("{} requires a value", property.name);
                self.error(missing, node, Some(&message));
                None
            }
            _ => {
                let message = format!("{} must have at most 1 argument", property.name);
                self.error(CompileErrorCode::FewerParametersExpected, node, Some(&message));
                None
            }
        }
    }

    fn invalid<T>(&mut self, node: NodeId, property: &PropertyNode, expected: &str) -> Option<T> {
        let message = format!("{} expects {}", property.name, expected);
        self.error(CompileErrorCode::InvalidParameters, node, Some(&message));
        None
    }

    pub fn read_string(&mut self, node: NodeId, property: &PropertyNode) -> Option<String> {
        let value = self.single_value(node, property, CompileErrorCode::StringExpected)?;
        match values::get_string(&self.tree[value]) {
            Some(text) => Some(text),
            None => self.invalid(node, property, "a string"),
        }
    }

    pub fn read_float(&mut self, node: NodeId, property: &PropertyNode) -> Option<f32> {
        let value = self.single_value(node, property, CompileErrorCode::NumberExpected)?;
        match values::get_float(&self.tree[value]) {
            Some(number) => Some(number),
            None => self.invalid(node, property, "a number"),
        }
    }

    pub fn read_uint(&mut self, node: NodeId, property: &PropertyNode) -> Option<u32> {
        let value = self.single_value(node, property, CompileErrorCode::NumberExpected)?;
        match values::get_uint(&self.tree[value]) {
            Some(number) => Some(number),
            None => self.invalid(node, property, "an unsigned integer"),
        }
    }

    /// Unsigned value that must also fit `T`
    pub fn read_uint_as<T: TryFrom<u32>>(&mut self, node: NodeId, property: &PropertyNode) -> Option<T> {
        let number = self.read_uint(node, property)?;
        match T::try_from(number) {
            Ok(value) => Some(value),
            Err(_) => self.invalid(node, property, "a smaller value"),
        }
    }

    pub fn read_bool(&mut self, node: NodeId, property: &PropertyNode) -> Option<bool> {
        let value = self.single_value(node, property, CompileErrorCode::StringExpected)?;
        match values::get_bool(&self.tree[value]) {
            Some(flag) => Some(flag),
            None => self.invalid(node, property, "true or false"),
        }
    }

    pub fn read_enum<E: ScriptEnum>(&mut self, node: NodeId, property: &PropertyNode) -> Option<E> {
        let value = self.single_value(node, property, CompileErrorCode::StringExpected)?;
        match values::get_enum::<E>(&self.tree[value]) {
            Some(variant) => Some(variant),
            None => self.invalid(node, property, &expected_names::<E>()),
        }
    }

    pub fn read_colour(&mut self, node: NodeId, property: &PropertyNode) -> Option<ColourValue> {
        if property.values.is_empty() {
            let message = format!("{} requires a colour", property.name);
            self.error(CompileErrorCode::NumberExpected, node, Some(&message));
            return None;
        }
        if property.values.len() > 4 {
            let message = format!("{} must have at most 4 arguments", property.name);
            self.error(CompileErrorCode::FewerParametersExpected, node, Some(&message));
            return None;
        }
        match values::get_colour(&*self.tree, &property.values) {
            Some(colour) => Some(colour),
            None => self.invalid(node, property, "3 or 4 numbers"),
        }
    }

    /// Every value of `property` as a float
    pub fn read_floats(&mut self, node: NodeId, property: &PropertyNode) -> Option<Vec<f32>> {
        let numbers: Option<Vec<f32>> = property
            .values
            .iter()
            .map(|&id| values::get_float(&self.tree[id]))
            .collect();
        match numbers {
            Some(numbers) => Some(numbers),
            None => self.invalid(node, property, "numbers"),
        }
    }

    /// Values joined back into text, for free-form parameters
    pub fn joined_values(&self, property: &PropertyNode) -> String {
        values::join_values(&*self.tree, &property.values)
    }
}
