//! Surface samples and critical-point markers for a 3D plot.
//!
//! Nothing is drawn here. [`PlotData::to_plotly_json`] emits a surface trace
//! and a marker trace that a Plotly front end can render as-is.

use log::{debug, warn};
use serde_json::{json, Value};

use crate::classify::{Classification, ClassifiedPoint};
use crate::evaluate::{evaluate, Bindings};
use crate::syntax::Expr;

/// `f` sampled on a square grid. `z[i][j]` is `f(xs[i], ys[j])`; points where
/// `f` cannot be evaluated are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceGrid {
  pub xs: Vec<f64>,
  pub ys: Vec<f64>,
  pub z: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
  pub x: f64,
  pub y: f64,
  pub z: f64,
  pub classification: Classification,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotData {
  pub surface: SurfaceGrid,
  pub markers: Vec<Marker>,
}

/// Sample `f` at `points + 1` evenly spaced values from `-range` to `range`
/// on each axis.
pub fn sample_surface(f: &Expr, range: f64, points: usize) -> SurfaceGrid {
  let step = 2.0 * range / points as f64;
  let axis: Vec<f64> = (0..=points).map(|i| -range + i as f64 * step).collect();

  let mut missing = 0usize;
  let z: Vec<Vec<f64>> = axis
    .iter()
    .map(|&x| {
      axis
        .iter()
        .map(|&y| {
          let value = evaluate(f, &Bindings::xy(x, y)).unwrap_or(f64::NAN);
          if !value.is_finite() {
            missing += 1;
          }
          value
        })
        .collect()
    })
    .collect();

  let total = axis.len() * axis.len();
  if missing == total {
    warn!("surface has no finite samples in [-{range}, {range}]");
  } else if missing > 0 {
    debug!("{missing} of {total} surface samples are not finite");
  }

  SurfaceGrid {
    xs: axis.clone(),
    ys: axis,
    z,
  }
}

/// Markers for the classified points that lie inside the plotted square.
/// A point where `f` is undefined or infinite is drawn at `z = 0`.
pub fn critical_markers(
  f: &Expr,
  points: &[ClassifiedPoint],
  range: f64,
) -> Vec<Marker> {
  points
    .iter()
    .filter(|cp| cp.point.x.abs() <= range && cp.point.y.abs() <= range)
    .map(|cp| Marker {
      x: cp.point.x,
      y: cp.point.y,
      z: evaluate(f, &Bindings::xy(cp.point.x, cp.point.y))
        .ok()
        .filter(|z| z.is_finite())
        .unwrap_or(0.0),
      classification: cp.classification,
    })
    .collect()
}

impl PlotData {
  pub fn build(
    f: &Expr,
    points: &[ClassifiedPoint],
    range: f64,
    grid_points: usize,
  ) -> Self {
    PlotData {
      surface: sample_surface(f, range, grid_points),
      markers: critical_markers(f, points, range),
    }
  }

  /// Plotly traces: `[surface, scatter3d]`. Non-finite samples become
  /// `null`, which Plotly draws as gaps.
  pub fn to_plotly_json(&self) -> Value {
    let surface = &self.surface;
    // Plotly indexes z by row = y, column = x.
    let rows: Vec<Vec<f64>> = (0..surface.ys.len())
      .map(|j| surface.z.iter().map(|column| column[j]).collect())
      .collect();

    let labels: Vec<String> = self
      .markers
      .iter()
      .map(|m| m.classification.to_string())
      .collect();
    let colors: Vec<&str> = self
      .markers
      .iter()
      .map(|m| m.classification.color())
      .collect();

    json!([
      {
        "type": "surface",
        "name": "Function Surface",
        "x": surface.xs,
        "y": surface.ys,
        "z": rows,
        "colorscale": "Viridis",
        "opacity": 0.9,
        "showscale": false,
        "contours": {
          "z": {
            "show": true,
            "usecolormap": true,
            "highlightcolor": "white",
            "project": { "z": true }
          }
        }
      },
      {
        "type": "scatter3d",
        "name": "Critical Points",
        "mode": "markers",
        "x": self.markers.iter().map(|m| m.x).collect::<Vec<_>>(),
        "y": self.markers.iter().map(|m| m.y).collect::<Vec<_>>(),
        "z": self.markers.iter().map(|m| m.z).collect::<Vec<_>>(),
        "marker": {
          "size": 8,
          "color": colors,
          "symbol": "diamond",
          "line": { "color": "white", "width": 1 }
        },
        "text": labels,
        "hoverinfo": "text"
      }
    ])
  }
}
