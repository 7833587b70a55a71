//! Position allocation for merged elements
//!
//! Dashboard panels live on a fixed-width grid, flow nodes on a free canvas.
//! Both are placed relative to the last element already in the target.

pub mod canvas;
pub mod config;
pub mod grid;
pub mod types;

pub use canvas::{canvas_anchor, node_position, place_nodes, NODES};
pub use config::LayoutConfig;
pub use grid::{grid_anchor, next_grid_position, place_panel, PANELS};
pub use types::{number_value, GridPos, NodePos};
