//! Visualization module: renderable geometry for fitted models.

pub mod grid;
pub use grid::{decision_boundary, linspace, regression_line, Bounds};

/// Points per axis of the decision-boundary mesh
pub const GRID_RESOLUTION: usize = 50;

/// Margin added beyond the observed range on every side
pub const GRID_PADDING: f64 = 1.0;

/// Samples along a fitted regression line
pub const LINE_SAMPLES: usize = 100;
