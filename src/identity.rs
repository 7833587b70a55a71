//! Identifier assignment for merged elements
//!
//! Flow nodes are re-keyed with fresh ids and every internal reference between
//! nodes of the same fragment is rewritten. Dashboard panels get a numeric id
//! derived from the current time.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::MergeError;

/// Node fields holding ids of other nodes
pub const REFERENCE_FIELDS: &[&str] = &["wires", "links"];

/// Field holding the id of the flow a node belongs to
pub const FLOW_FIELD: &str = "z";

/// How many times a colliding id is regenerated before giving up
pub const MAX_ID_ATTEMPTS: usize = 16;

/// Source of fresh element identifiers
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// Random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic ids `prefix1`, `prefix2`, ...
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// Outcome of re-keying a fragment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemapReport {
    /// Old id -> new id, in fragment order
    pub mapping: Vec<(String, String)>,
    /// Referenced ids that name no node of the fragment, left as they were
    pub external_references: Vec<String>,
}

impl RemapReport {
    /// New id assigned to a node that had `old` before the remap
    pub fn new_id(&self, old: &str) -> Option<&str> {
        self.mapping
            .iter()
            .find(|(from, _)| from == old)
            .map(|(_, to)| to.as_str())
    }

    /// Ids of the inserted nodes, in fragment order
    pub fn inserted_ids(&self) -> Vec<String> {
        self.mapping.iter().map(|(_, to)| to.clone()).collect()
    }
}

/// Collect the string ids of a node collection
pub fn node_ids(nodes: &[Value]) -> HashSet<String> {
    nodes
        .iter()
        .filter_map(|n| n.get("id").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

/// Give every node a fresh id, move it into `flow_id`, and rewrite references
///
/// Generated ids never collide with `existing` or with each other.
pub fn remap_nodes(
    nodes: &mut [Value],
    flow_id: &str,
    existing: &HashSet<String>,
    ids: &mut dyn IdGenerator,
) -> Result<RemapReport, MergeError> {
    let mut issued: HashSet<String> = HashSet::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut mapping = Vec::with_capacity(nodes.len());

    for node in nodes.iter() {
        let old = node
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| MergeError::template_shape("every flow template node needs a string id"))?;
        if !seen.insert(old) {
            return Err(MergeError::template_shape(format!(
                "node id '{old}' appears more than once in the template"
            )));
        }
        let new = fresh_id(ids, existing, &issued)?;
        issued.insert(new.clone());
        mapping.push((old.to_string(), new));
    }

    let lookup: HashMap<&str, &str> = mapping
        .iter()
        .map(|(old, new)| (old.as_str(), new.as_str()))
        .collect();
    let mut external = Vec::new();

    for (node, (_, new)) in nodes.iter_mut().zip(mapping.iter()) {
        let Some(map) = node.as_object_mut() else {
            return Err(MergeError::template_shape("flow template nodes must be objects"));
        };
        map.insert("id".to_string(), Value::String(new.clone()));
        map.insert(FLOW_FIELD.to_string(), Value::String(flow_id.to_string()));

        for field in REFERENCE_FIELDS {
            if let Some(refs) = map.get_mut(*field) {
                rewrite_references(refs, &lookup, &mut external);
            }
        }
    }

    for id in &external {
        warn!(id = %id, "template references a node outside the fragment");
    }
    debug!(count = mapping.len(), flow_id, "remapped template nodes");

    Ok(RemapReport {
        mapping,
        external_references: external,
    })
}

/// Draw an id that is neither pre-existing nor already issued
fn fresh_id(
    ids: &mut dyn IdGenerator,
    existing: &HashSet<String>,
    issued: &HashSet<String>,
) -> Result<String, MergeError> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let candidate = ids.next_id();
        if !existing.contains(&candidate) && !issued.contains(&candidate) {
            return Ok(candidate);
        }
    }
    Err(MergeError::IdExhausted {
        attempts: MAX_ID_ATTEMPTS,
    })
}

/// Rewrite every id string inside a (possibly nested) reference list
fn rewrite_references(value: &mut Value, lookup: &HashMap<&str, &str>, external: &mut Vec<String>) {
    match value {
        Value::String(id) => match lookup.get(id.as_str()) {
            Some(new) => *id = new.to_string(),
            None => {
                if !external.contains(id) {
                    external.push(id.clone());
                }
            }
        },
        Value::Array(items) => {
            for item in items {
                rewrite_references(item, lookup, external);
            }
        }
        _ => {}
    }
}

/// Numeric panel id from a millisecond timestamp, unique among `existing`
pub fn panel_id(now_ms: i64, existing: &HashSet<i64>) -> i64 {
    let mut id = now_ms;
    while existing.contains(&id) {
        id += 1;
    }
    id
}

/// Numeric ids of a panel collection
pub fn panel_ids(panels: &[Value]) -> HashSet<i64> {
    panels
        .iter()
        .filter_map(|p| p.get("id").and_then(Value::as_i64))
        .collect()
}
