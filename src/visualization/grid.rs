//! Decision-boundary mesh and regression-line sampling
//!
//! Every classifier is evaluated on the same kind of mesh: `linspace` over
//! each padded axis, laid out row-major with `x[i][j] = xs[j]` and
//! `y[i][j] = ys[i]`.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::{GRID_PADDING, GRID_RESOLUTION, LINE_SAMPLES};
use crate::data::{Coordinate, DecisionBoundary, Point};
use crate::error::{Result, SketchError};
use crate::training::{Classifier, LinearRegression};

/// Observed extent of a point set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_points(points: &[Point]) -> Result<Self> {
        if points.is_empty() {
            return Err(SketchError::ComputationError(
                "cannot compute bounds of an empty point set".to_string(),
            ));
        }
        let mut bounds = Bounds {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for p in points {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Ok(bounds)
    }
}

/// `n` evenly spaced values from `start` to `stop` inclusive
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Evaluate a classifier over the padded 50×50 mesh
pub fn decision_boundary(model: &dyn Classifier, bounds: &Bounds) -> Result<DecisionBoundary> {
    let xs = linspace(bounds.min_x - GRID_PADDING, bounds.max_x + GRID_PADDING, GRID_RESOLUTION);
    let ys = linspace(bounds.min_y - GRID_PADDING, bounds.max_y + GRID_PADDING, GRID_RESOLUTION);

    let mut mesh = Array2::zeros((GRID_RESOLUTION * GRID_RESOLUTION, 2));
    for (i, &yv) in ys.iter().enumerate() {
        for (j, &xv) in xs.iter().enumerate() {
            let r = i * GRID_RESOLUTION + j;
            mesh[[r, 0]] = xv;
            mesh[[r, 1]] = yv;
        }
    }

    let labels = model.predict_labels(&mesh)?;
    if labels.len() != mesh.nrows() {
        return Err(SketchError::ComputationError(format!(
            "grid evaluation returned {} labels for {} cells",
            labels.len(),
            mesh.nrows()
        )));
    }

    let x = vec![xs.clone(); GRID_RESOLUTION];
    let y = ys.iter().map(|&yv| vec![yv; GRID_RESOLUTION]).collect();
    let flat = labels.to_vec();
    let z = flat
        .chunks(GRID_RESOLUTION)
        .map(|row| row.iter().map(|&v| v.round() as i64).collect())
        .collect();

    Ok(DecisionBoundary { x, y, z })
}

/// Sample a fitted single-feature line over the padded x range
pub fn regression_line(model: &LinearRegression, min_x: f64, max_x: f64) -> Result<Vec<Coordinate>> {
    let xs = linspace(min_x - GRID_PADDING, max_x + GRID_PADDING, LINE_SAMPLES);
    let column = Array2::from_shape_vec((xs.len(), 1), xs.clone())?;
    let ys = model.predict(&column)?;

    Ok(xs
        .into_iter()
        .zip(ys.iter())
        .map(|(x, &y)| Coordinate { x, y })
        .collect())
}
