//! Position types read from and written to JSON elements

use serde_json::{Map, Value};

/// A dashboard panel's grid rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPos {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl GridPos {
    pub fn new(x: i64, y: i64, w: i64, h: i64) -> Self {
        Self { x, y, w, h }
    }

    /// Read the `gridPos` object of a panel
    ///
    /// Returns `None` unless all four fields are present and integral.
    pub fn from_panel(panel: &Value) -> Option<Self> {
        let pos = panel.get("gridPos")?;
        Some(Self {
            x: int_field(pos, "x")?,
            y: int_field(pos, "y")?,
            w: int_field(pos, "w")?,
            h: int_field(pos, "h")?,
        })
    }

    /// Right edge column, `None` on overflow
    pub fn right(&self) -> Option<i64> {
        self.x.checked_add(self.w)
    }

    /// Bottom edge row, `None` on overflow
    pub fn bottom(&self) -> Option<i64> {
        self.y.checked_add(self.h)
    }
}

/// A flow node's canvas position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePos {
    pub x: f64,
    pub y: f64,
}

impl NodePos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Read the `x`/`y` fields of a node
    pub fn from_node(node: &Value) -> Option<Self> {
        Some(Self {
            x: node.get("x")?.as_f64()?,
            y: node.get("y")?.as_f64()?,
        })
    }

    /// Write this position into a node object
    pub fn write_to(&self, node: &mut Map<String, Value>) {
        node.insert("x".to_string(), number_value(self.x));
        node.insert("y".to_string(), number_value(self.y));
    }
}

/// Largest float magnitude that still converts to `i64` exactly
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Read an integral field, accepting `4` and `4.0` alike
fn int_field(value: &Value, key: &str) -> Option<i64> {
    let field = value.get(key)?;
    if let Some(n) = field.as_i64() {
        return Some(n);
    }
    let f = field.as_f64()?;
    (f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT).then_some(f as i64)
}

/// JSON number for a coordinate, integral values written without a fraction
pub fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}
