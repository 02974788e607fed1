//! The full pipeline: text -> expression -> derivatives -> stationary points
//! -> classifications -> plot samples. Every stage is a plain value.

use std::fmt;

use log::debug;
use serde_json::{json, Value};

use crate::calculus::{Gradient, HessianExprs, X, Y};
use crate::classify::{classify_point, ClassifiedPoint};
use crate::plot::PlotData;
use crate::solve::{
  find_stationary_points, NewtonSolver, StationaryOutcome, StationarySolver,
};
use crate::syntax::{free_variables, parse_expression, Expr};
use crate::Error;

pub const DEFAULT_PLOT_RANGE: f64 = 5.0;
pub const MIN_PLOT_RANGE: f64 = 1.0;
pub const MAX_PLOT_RANGE: f64 = 20.0;
pub const DEFAULT_GRID_POINTS: usize = 50;
pub const DEFAULT_SEEDS_PER_AXIS: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
  /// Half-width of the square around the origin that is plotted and
  /// searched for stationary points.
  pub plot_range: f64,
  /// Grid intervals per axis for the surface samples.
  pub grid_points: usize,
  /// Newton seeds per axis.
  pub seeds_per_axis: usize,
}

impl Default for AnalysisOptions {
  fn default() -> Self {
    AnalysisOptions {
      plot_range: DEFAULT_PLOT_RANGE,
      grid_points: DEFAULT_GRID_POINTS,
      seeds_per_axis: DEFAULT_SEEDS_PER_AXIS,
    }
  }
}

impl AnalysisOptions {
  pub fn validate(&self) -> Result<(), Error> {
    if !(MIN_PLOT_RANGE..=MAX_PLOT_RANGE).contains(&self.plot_range) {
      return Err(Error::InvalidPlotRange(self.plot_range));
    }
    if self.grid_points == 0 {
      return Err(Error::InvalidGrid("grid points"));
    }
    if self.seeds_per_axis == 0 {
      return Err(Error::InvalidGrid("seeds per axis"));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
  pub function: Expr,
  pub gradient: Gradient,
  pub hessian: HessianExprs,
  pub stationary: StationaryOutcome,
  pub critical_points: Vec<ClassifiedPoint>,
  pub plot: PlotData,
}

/// Parse `input` and check that it is a function of `x` and `y` only.
pub fn parse_function(input: &str) -> Result<Expr, Error> {
  let function = parse_expression(input)?;
  if let Some(name) = free_variables(&function)
    .into_iter()
    .find(|name| name.as_str() != X && name.as_str() != Y)
  {
    return Err(Error::UnknownSymbol(name));
  }
  Ok(function)
}

/// Analyze `input` with the built-in Newton solver, seeded over the plot
/// range.
pub fn analyze(input: &str, options: &AnalysisOptions) -> Result<Analysis, Error> {
  let solver = NewtonSolver::new(options.plot_range, options.seeds_per_axis);
  analyze_with(input, options, &solver)
}

pub fn analyze_with(
  input: &str,
  options: &AnalysisOptions,
  solver: &dyn StationarySolver,
) -> Result<Analysis, Error> {
  if input.trim().is_empty() {
    return Err(Error::EmptyInput);
  }
  options.validate()?;

  let function = parse_function(input)?;
  let gradient = Gradient::of(&function)?;
  let hessian = HessianExprs::of(&gradient)?;
  debug!(
    "f = {function}, df/dx = {}, df/dy = {}",
    gradient.dfdx, gradient.dfdy
  );

  let stationary = find_stationary_points(solver, &gradient, &hessian);
  let critical_points = match &stationary {
    StationaryOutcome::Candidates(points) => points
      .iter()
      .map(|&p| Ok(classify_point(p, hessian.evaluate_at(p)?)))
      .collect::<Result<Vec<_>, Error>>()?,
    _ => Vec::new(),
  };
  debug!("{} critical point(s) classified", critical_points.len());

  let plot = PlotData::build(
    &function,
    &critical_points,
    options.plot_range,
    options.grid_points,
  );

  Ok(Analysis {
    function,
    gradient,
    hessian,
    stationary,
    critical_points,
    plot,
  })
}

impl Analysis {
  /// Explanation shown instead of a list when there is nothing to list.
  pub fn message(&self) -> Option<String> {
    match &self.stationary {
      StationaryOutcome::GradientNeverVanishes => {
        Some("No critical points (derivatives do not vanish).".to_string())
      }
      StationaryOutcome::Candidates(points) if points.is_empty() => {
        Some("No real critical points found.".to_string())
      }
      StationaryOutcome::Candidates(_) => None,
      StationaryOutcome::SolverFailed(reason) => {
        Some(format!("Solver failed: {reason}"))
      }
    }
  }

  pub fn to_json(&self) -> Value {
    let points: Vec<Value> = self
      .critical_points
      .iter()
      .map(|cp| {
        json!({
          "x": cp.point.x,
          "y": cp.point.y,
          "type": cp.classification.to_string(),
          "determinant": cp.determinant,
          "hessian": {
            "fxx": cp.hessian.fxx,
            "fyy": cp.hessian.fyy,
            "fxy": cp.hessian.fxy,
            "fyx": cp.hessian.fyx,
          }
        })
      })
      .collect();

    json!({
      "function": self.function.to_string(),
      "partial_derivatives": {
        "dfdx": self.gradient.dfdx.to_string(),
        "dfdy": self.gradient.dfdy.to_string(),
      },
      "second_partial_derivatives": {
        "d2fdx2": self.hessian.d2fdx2.to_string(),
        "d2fdy2": self.hessian.d2fdy2.to_string(),
        "d2fdxdy": self.hessian.d2fdxdy.to_string(),
        "d2fdydx": self.hessian.d2fdydx.to_string(),
      },
      "critical_points": points,
      "message": self.message(),
      "plot": self.plot.to_plotly_json(),
    })
  }
}

impl fmt::Display for Analysis {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "f(x, y) = {}", self.function)?;
    writeln!(f)?;
    writeln!(f, "Partial derivatives:")?;
    writeln!(f, "  df/dx = {}", self.gradient.dfdx)?;
    writeln!(f, "  df/dy = {}", self.gradient.dfdy)?;
    writeln!(f)?;
    writeln!(f, "Second partial derivatives:")?;
    writeln!(f, "  d2f/dx2  = {}", self.hessian.d2fdx2)?;
    writeln!(f, "  d2f/dy2  = {}", self.hessian.d2fdy2)?;
    writeln!(f, "  d2f/dxdy = {}", self.hessian.d2fdxdy)?;
    writeln!(f, "  d2f/dydx = {}", self.hessian.d2fdydx)?;
    writeln!(f)?;
    writeln!(f, "Critical points:")?;
    if let Some(message) = self.message() {
      return writeln!(f, "  {message}");
    }
    for cp in &self.critical_points {
      writeln!(
        f,
        "  {}: {} (D = {})",
        cp.point, cp.classification, cp.determinant
      )?;
    }
    Ok(())
  }
}
