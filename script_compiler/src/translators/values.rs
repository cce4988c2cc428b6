//! Coercion of AST values into engine types
//!
//! These return `None` when a node does not hold the requested kind of value;
//! the caller decides which compile error that is.

use crate::ast::{AbstractNode, AbstractTree, NodeId, NodeKind};
use crate::keywords::{ID_OFF, ID_ON};
use crate::registry::ColourValue;
use crate::script_enum::ScriptEnum;

fn atom_text(node: &AbstractNode) -> Option<&str> {
    match &node.kind {
        NodeKind::Atom(atom) => Some(&atom.value),
        _ => None,
    }
}

pub fn get_string(node: &AbstractNode) -> Option<String> {
    atom_text(node).map(str::to_string)
}

pub fn get_float(node: &AbstractNode) -> Option<f32> {
    atom_text(node)?.parse::<f32>().ok().filter(|v| v.is_finite())
}

pub fn get_int(node: &AbstractNode) -> Option<i32> {
    atom_text(node)?.parse().ok()
}

/// Decimal, or hexadecimal with a `0x` prefix
pub fn get_uint(node: &AbstractNode) -> Option<u32> {
    let text = atom_text(node)?;
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

pub fn get_bool(node: &AbstractNode) -> Option<bool> {
    match &node.kind {
        NodeKind::Atom(atom) if atom.id == ID_ON => Some(true),
        NodeKind::Atom(atom) if atom.id == ID_OFF => Some(false),
        _ => None,
    }
}

pub fn get_enum<E: ScriptEnum>(node: &AbstractNode) -> Option<E> {
    E::lookup(atom_text(node)?)
}

/// Three or four floats; alpha defaults to 1
pub fn get_colour(tree: &AbstractTree, values: &[NodeId]) -> Option<ColourValue> {
    if !(3..=4).contains(&values.len()) {
        return None;
    }
    let mut channels = [1.0f32; 4];
    for (channel, &id) in channels.iter_mut().zip(values) {
        *channel = get_float(&tree[id])?;
    }
    let [r, g, b, a] = channels;
    Some(ColourValue::new(r, g, b, a))
}

/// Values joined back into one space separated string
pub fn join_values(tree: &AbstractTree, values: &[NodeId]) -> String {
    values
        .iter()
        .filter_map(|&id| tree[id].value_text())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AtomNode;
    use crate::keywords::keyword_id;
    use crate::script_enum::TextureAddressing;
    use std::sync::Arc;

    fn atom(value: &str) -> AbstractNode {
        AbstractNode::new(
            NodeKind::Atom(AtomNode {
                value: value.to_string(),
                id: keyword_id(value),
                quoted: false,
            }),
            Arc::from("t.material"),
            1,
        )
    }

    #[test]
    fn test_numbers() {
        assert_eq!(get_float(&atom("0.5")), Some(0.5));
        assert_eq!(get_float(&atom("-2")), Some(-2.0));
        assert_eq!(get_float(&atom("abc")), None);
        assert_eq!(get_float(&atom("inf")), None);
        assert_eq!(get_int(&atom("-7")), Some(-7));
        assert_eq!(get_uint(&atom("-7")), None);
        assert_eq!(get_uint(&atom("0xFF")), Some(255));
        assert_eq!(get_uint(&atom("12")), Some(12));
    }

    #[test]
    fn test_bools_use_builtin_ids() {
        assert_eq!(get_bool(&atom("on")), Some(true));
        assert_eq!(get_bool(&atom("false")), Some(false));
        assert_eq!(get_bool(&atom("maybe")), None);
    }

    #[test]
    fn test_enums() {
        assert_eq!(get_enum::<TextureAddressing>(&atom("Mirror")), Some(TextureAddressing::Mirror));
        assert_eq!(get_enum::<TextureAddressing>(&atom("tile")), None);
    }

    #[test]
    fn test_colours() {
        let mut tree = AbstractTree::new();
        let ids: Vec<NodeId> = ["1", "0.5", "0"].iter().map(|v| tree.add(atom(v))).collect();
        assert_eq!(get_colour(&tree, &ids), Some(ColourValue::new(1.0, 0.5, 0.0, 1.0)));
        assert_eq!(get_colour(&tree, &ids[..2]), None);

        let bad = tree.add(atom("red"));
        assert_eq!(get_colour(&tree, &[ids[0], ids[1], bad]), None);
        assert_eq!(join_values(&tree, &ids), "1 0.5 0");
    }
}
