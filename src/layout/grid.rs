//! Dashboard grid placement
//!
//! A new panel goes to the right of the last panel when there is room for
//! another panel of the same width, and starts a new row otherwise.

use serde_json::{Map, Value};

use crate::error::MergeError;

use super::types::GridPos;

/// Name of the dashboard element collection
pub const PANELS: &str = "panels";

/// Position `(x, y)` for the panel following `prev`
///
/// `None` when the coordinates are too large to compute with.
pub fn next_grid_position(prev: GridPos, columns: i64) -> Option<(i64, i64)> {
    let reach = prev.w.checked_mul(2).and_then(|w| prev.x.checked_add(w))?;
    if reach > columns {
        Some((0, prev.bottom()?))
    } else {
        Some((prev.right()?, prev.y))
    }
}

/// Grid rectangle of the last panel, the anchor for the next one
pub fn grid_anchor(panels: &[Value]) -> Result<GridPos, MergeError> {
    let last = panels.last().ok_or_else(|| MergeError::empty(PANELS))?;
    GridPos::from_panel(last).ok_or_else(|| {
        MergeError::target("last panel has no complete gridPos {x, y, w, h}")
    })
}

/// Move a template panel to its allocated cell, keeping its own size
pub fn place_panel(
    panel: &mut Map<String, Value>,
    anchor: GridPos,
    columns: i64,
) -> Result<(), MergeError> {
    let (x, y) = next_grid_position(anchor, columns)
        .ok_or_else(|| MergeError::target("last panel gridPos is out of range"))?;
    let grid = panel
        .get_mut("gridPos")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| MergeError::template_shape("panel template has no gridPos object"))?;
    grid.insert("x".to_string(), Value::from(x));
    grid.insert("y".to_string(), Value::from(y));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wraps_to_new_row() {
        let prev = GridPos::new(18, 0, 6, 4);
        assert_eq!(next_grid_position(prev, 24), Some((0, 4)));
    }

    #[test]
    fn test_places_alongside() {
        let prev = GridPos::new(0, 0, 6, 4);
        assert_eq!(next_grid_position(prev, 24), Some((6, 0)));
    }

    #[test]
    fn test_exact_fit_stays_on_row() {
        // 12 + 2 * 6 = 24 is not beyond the grid
        let prev = GridPos::new(12, 8, 6, 3);
        assert_eq!(next_grid_position(prev, 24), Some((18, 8)));
    }

    #[test]
    fn test_full_width_panel_wraps() {
        let prev = GridPos::new(0, 10, 24, 8);
        assert_eq!(next_grid_position(prev, 24), Some((0, 18)));
    }

    #[test]
    fn test_huge_grid_pos_does_not_overflow() {
        assert_eq!(next_grid_position(GridPos::new(0, 0, i64::MAX / 2 + 1, 4), 24), None);
        assert_eq!(next_grid_position(GridPos::new(0, i64::MAX, 30, 4), 24), None);
        assert_eq!(next_grid_position(GridPos::new(i64::MAX - 1, 0, 1, 4), i64::MAX), None);

        let mut panel = json!({"gridPos": {"x": 0, "y": 0, "w": 6, "h": 4}});
        let map = panel.as_object_mut().unwrap();
        assert!(matches!(
            place_panel(map, GridPos::new(0, i64::MAX, 30, 4), 24),
            Err(MergeError::MalformedTarget { .. })
        ));
    }

    #[test]
    fn test_grid_anchor_uses_last_panel() {
        let panels = vec![
            json!({"gridPos": {"x": 0, "y": 0, "w": 6, "h": 4}}),
            json!({"gridPos": {"x": 6, "y": 0, "w": 6, "h": 4}}),
        ];
        assert_eq!(grid_anchor(&panels).unwrap(), GridPos::new(6, 0, 6, 4));
    }

    #[test]
    fn test_grid_anchor_empty() {
        let err = grid_anchor(&[]).unwrap_err();
        assert!(matches!(err, MergeError::EmptyTargetCollection { ref collection } if collection == "panels"));
    }

    #[test]
    fn test_grid_anchor_without_grid_pos() {
        let panels = vec![json!({"title": "legacy"})];
        assert!(matches!(
            grid_anchor(&panels),
            Err(MergeError::MalformedTarget { .. })
        ));
    }

    #[test]
    fn test_place_panel_keeps_size() {
        let mut panel = json!({"gridPos": {"x": 99, "y": 99, "w": 8, "h": 5}});
        let map = panel.as_object_mut().unwrap();
        place_panel(map, GridPos::new(0, 0, 6, 4), 24).unwrap();
        assert_eq!(panel["gridPos"], json!({"x": 6, "y": 0, "w": 8, "h": 5}));
    }

    #[test]
    fn test_place_panel_requires_grid_pos() {
        let mut panel = json!({"title": "x"});
        let map = panel.as_object_mut().unwrap();
        assert!(matches!(
            place_panel(map, GridPos::new(0, 0, 6, 4), 24),
            Err(MergeError::MalformedTemplate { .. })
        ));
    }
}
