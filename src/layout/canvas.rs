//! Flow canvas placement
//!
//! Inserted nodes are laid out on a diagonal starting one offset below and to
//! the right of the last positioned node. They never overlap each other, but
//! nothing stops them from landing on unrelated nodes elsewhere on the canvas.

use serde_json::Value;

use crate::error::MergeError;

use super::types::NodePos;

/// Name of the flow element collection
pub const NODES: &str = "nodes";

/// Position of the `index`-th inserted node (0-based)
pub fn node_position(prev: NodePos, index: usize, offset: f64) -> NodePos {
    let step = offset + index as f64 * offset;
    NodePos::new(prev.x + step, prev.y + step)
}

/// Position of the last node that has coordinates
///
/// Config nodes carry no `x`/`y`, so they are skipped.
pub fn canvas_anchor(nodes: &[Value]) -> Result<NodePos, MergeError> {
    if nodes.is_empty() {
        return Err(MergeError::empty(NODES));
    }
    nodes
        .iter()
        .rev()
        .find_map(NodePos::from_node)
        .ok_or_else(|| MergeError::target("no node in the flow has x/y coordinates"))
}

/// Assign diagonal positions to template nodes, in fragment order
pub fn place_nodes(nodes: &mut [Value], anchor: NodePos, offset: f64) -> Result<(), MergeError> {
    for (index, node) in nodes.iter_mut().enumerate() {
        let map = node
            .as_object_mut()
            .ok_or_else(|| MergeError::template_shape("flow template nodes must be objects"))?;
        node_position(anchor, index, offset).write_to(map);
    }
    Ok(())
}
