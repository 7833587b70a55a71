//! Merging template fragments into dashboards and flows
//!
//! A merge works on a private copy of the target. The caller's document is
//! only ever borrowed, and the augmented copy comes back on full success, so a
//! failure at any step leaves nothing half-applied.

use serde_json::Value;
use tracing::{debug, info};

use crate::error::MergeError;
use crate::identity::{
    node_ids, panel_id, panel_ids, remap_nodes, IdGenerator, RemapReport, UuidGenerator,
};
use crate::layout::{canvas_anchor, grid_anchor, place_nodes, place_panel, LayoutConfig, NODES, PANELS};
use crate::template::{fill, ValueResolver};

/// Result of merging a panel into a dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct PanelMerge {
    /// The dashboard with the new panel appended
    pub document: Value,
    /// Id given to the new panel
    pub panel_id: i64,
}

/// Result of merging nodes into a flow
#[derive(Debug, Clone, PartialEq)]
pub struct FlowMerge {
    /// The flow with the new nodes appended
    pub document: Value,
    /// Id mapping and foreign references of the inserted nodes
    pub report: RemapReport,
}

impl FlowMerge {
    /// Ids of the inserted nodes, in template order
    pub fn inserted_ids(&self) -> Vec<String> {
        self.report.inserted_ids()
    }
}

/// Merges templates into target documents
pub struct Merger {
    layout: LayoutConfig,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Fn() -> i64>,
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}

impl Merger {
    /// Merger with default layout, random node ids and the system clock
    pub fn new() -> Self {
        Self {
            layout: LayoutConfig::default(),
            ids: Box::new(UuidGenerator),
            clock: Box::new(|| chrono::Utc::now().timestamp_millis()),
        }
    }

    /// Set the layout configuration
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Set the node id generator
    pub fn with_id_generator(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Set the millisecond clock used for panel ids
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Append one panel from `template` to a dashboard
    ///
    /// `target` is the dashboard object holding a `panels` array. The panel is
    /// placed next to the last panel, gets a timestamp id, and has its
    /// placeholders filled through `resolver`.
    pub fn merge_panel(
        &mut self,
        target: &Value,
        template: &str,
        resolver: &mut dyn ValueResolver,
    ) -> Result<PanelMerge, MergeError> {
        let panels = collection(target, PANELS)?;
        let anchor = grid_anchor(panels)?;
        let existing = panel_ids(panels);

        let filled = fill(template, resolver)?;
        let mut panel: Value = serde_json::from_str(&filled)
            .map_err(|e| MergeError::from(e).with_filled_text(&filled))?;
        let map = panel
            .as_object_mut()
            .ok_or_else(|| MergeError::template_shape("panel template must be a JSON object"))?;

        place_panel(map, anchor, self.layout.grid_columns)?;
        let id = panel_id((self.clock)(), &existing);
        map.insert("id".to_string(), Value::from(id));
        debug!(id, ?anchor, "placed panel");

        let mut document = target.clone();
        collection_mut(&mut document, PANELS)?.push(panel);
        info!(id, "merged panel into dashboard");

        Ok(PanelMerge {
            document,
            panel_id: id,
        })
    }

    /// Append the nodes of `template` to a flow
    ///
    /// `target` is a flow object with an `id` and a `nodes` array; `template`
    /// is an array of node objects. Nodes are laid out on a diagonal after the
    /// last positioned node and re-keyed with fresh ids.
    pub fn merge_flow(
        &mut self,
        target: &Value,
        template: &str,
        resolver: &mut dyn ValueResolver,
    ) -> Result<FlowMerge, MergeError> {
        let flow_id = target
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| MergeError::target("flow has no string id"))?
            .to_string();
        let nodes = collection(target, NODES)?;
        let anchor = canvas_anchor(nodes)?;
        let existing = node_ids(nodes);

        let filled = fill(template, resolver)?;
        let fragment: Value = serde_json::from_str(&filled)
            .map_err(|e| MergeError::from(e).with_filled_text(&filled))?;
        let Value::Array(mut fragment) = fragment else {
            return Err(MergeError::template_shape(
                "flow template must be a JSON array of nodes",
            ));
        };

        place_nodes(&mut fragment, anchor, self.layout.node_offset)?;
        let report = remap_nodes(&mut fragment, &flow_id, &existing, self.ids.as_mut())?;

        let mut document = target.clone();
        collection_mut(&mut document, NODES)?.extend(fragment);
        info!(
            flow = %flow_id,
            inserted = report.mapping.len(),
            "merged nodes into flow"
        );

        Ok(FlowMerge { document, report })
    }
}

/// Borrow a document's element collection
fn collection<'a>(document: &'a Value, key: &str) -> Result<&'a Vec<Value>, MergeError> {
    document
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| MergeError::target(format!("document has no '{key}' array")))
}

fn collection_mut<'a>(document: &'a mut Value, key: &str) -> Result<&'a mut Vec<Value>, MergeError> {
    document
        .get_mut(key)
        .and_then(Value::as_array_mut)
        .ok_or_else(|| MergeError::target(format!("document has no '{key}' array")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SequentialIds;
    use crate::template::MapResolver;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn merger() -> Merger {
        Merger::new()
            .with_id_generator(Box::new(SequentialIds::new("node-")))
            .with_clock(|| 1_700_000_000_000)
    }

    #[test]
    fn test_merge_panel_places_and_ids() {
        let dashboard = json!({
            "title": "Plant",
            "panels": [{"id": 1, "gridPos": {"x": 0, "y": 0, "w": 6, "h": 4}}]
        });
        let template = r#"{"title":"{{TITLE}}","gridPos":{"x":0,"y":0,"w":6,"h":4}}"#;
        let mut resolver = MapResolver::new().with_text("TITLE", "Boiler");

        let merged = merger().merge_panel(&dashboard, template, &mut resolver).unwrap();

        assert_eq!(merged.panel_id, 1_700_000_000_000);
        assert_eq!(
            merged.document["panels"][1],
            json!({
                "title": "Boiler",
                "gridPos": {"x": 6, "y": 0, "w": 6, "h": 4},
                "id": 1_700_000_000_000i64
            })
        );
        assert_eq!(dashboard["panels"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_merge_panel_rejects_array_template() {
        let dashboard = json!({"panels": [{"gridPos": {"x": 0, "y": 0, "w": 6, "h": 4}}]});
        let err = merger()
            .merge_panel(&dashboard, "[]", &mut MapResolver::new())
            .unwrap_err();
        assert!(matches!(err, MergeError::MalformedTemplate { .. }));
    }

    #[test]
    fn test_merge_panel_without_panels_array() {
        let dashboard = json!({"title": "no panels"});
        let err = merger()
            .merge_panel(&dashboard, "{}", &mut MapResolver::new())
            .unwrap_err();
        assert!(matches!(err, MergeError::MalformedTarget { .. }));
    }

    #[test]
    fn test_merge_flow_sets_flow_id() {
        let flow = json!({
            "id": "flow-1",
            "label": "Plant",
            "nodes": [{"id": "n1", "z": "flow-1", "x": 100, "y": 100, "wires": []}]
        });
        let template = r#"[{"id":"A","z":"tpl","type":"inject","wires":[["B"]]},{"id":"B","z":"tpl","type":"debug","wires":[]}]"#;

        let merged = merger()
            .merge_flow(&flow, template, &mut MapResolver::new())
            .unwrap();

        let nodes = merged.document["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(
            nodes[1],
            json!({"id": "node-1", "z": "flow-1", "type": "inject", "wires": [["node-2"]], "x": 200, "y": 200})
        );
        assert_eq!(nodes[2]["x"], json!(300));
        assert_eq!(merged.inserted_ids(), vec!["node-1".to_string(), "node-2".to_string()]);
    }

    #[test]
    fn test_merge_flow_rejects_object_template() {
        let flow = json!({"id": "f", "nodes": [{"id": "n1", "x": 0, "y": 0}]});
        let err = merger()
            .merge_flow(&flow, r#"{"id":"A"}"#, &mut MapResolver::new())
            .unwrap_err();
        assert!(matches!(err, MergeError::MalformedTemplate { .. }));
    }

    #[test]
    fn test_merge_flow_requires_flow_id() {
        let flow = json!({"nodes": [{"id": "n1", "x": 0, "y": 0}]});
        let err = merger()
            .merge_flow(&flow, "[]", &mut MapResolver::new())
            .unwrap_err();
        assert!(matches!(err, MergeError::MalformedTarget { .. }));
    }
}
