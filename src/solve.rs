//! Stationary points: real solutions of `∂f/∂x = 0` and `∂f/∂y = 0`.

use log::{debug, trace};

use crate::calculus::{Gradient, HessianExprs};
use crate::classify::{HessianEntries, Point2};
use crate::evaluate::{evaluate, Bindings};
use crate::syntax::{free_variables, Expr};
use crate::Error;

const STEP_TOLERANCE: f64 = 1e-12;
// Near a degenerate minimum Newton converges only linearly; once the
// gradient is already tiny, a step of this size is accepted.
const SLOW_STEP_TOLERANCE: f64 = 1e-11;
const RESIDUAL_TOLERANCE: f64 = 1e-6;
const SNAP_TOLERANCE: f64 = 1e-9;
const DEDUP_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub enum StationaryOutcome {
  /// A gradient component is a nonzero constant, so no point is stationary.
  GradientNeverVanishes,
  /// Real stationary points. May be empty when the solver found no real
  /// root in its search region.
  Candidates(Vec<Point2>),
  SolverFailed(String),
}

/// Anything that can find the real roots of a gradient.
pub trait StationarySolver {
  fn solve(
    &self,
    gradient: &Gradient,
    hessian: &HessianExprs,
  ) -> StationaryOutcome;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Component {
  Varies,
  IdenticallyZero,
  ConstantNonzero,
}

fn component(expr: &Expr) -> Result<Component, Error> {
  if !free_variables(expr).is_empty() {
    return Ok(Component::Varies);
  }
  // A non-finite constant never equals zero either.
  Ok(if evaluate(expr, &Bindings::new())? == 0.0 {
    Component::IdenticallyZero
  } else {
    Component::ConstantNonzero
  })
}

/// Screen out degenerate gradients, then hand the rest to `solver`.
pub fn find_stationary_points(
  solver: &dyn StationarySolver,
  gradient: &Gradient,
  hessian: &HessianExprs,
) -> StationaryOutcome {
  let shapes = match (component(&gradient.dfdx), component(&gradient.dfdy)) {
    (Ok(a), Ok(b)) => (a, b),
    (Err(e), _) | (_, Err(e)) => {
      return StationaryOutcome::SolverFailed(e.to_string());
    }
  };

  match shapes {
    (Component::ConstantNonzero, _) | (_, Component::ConstantNonzero) => {
      debug!(
        "gradient ({}, {}) never vanishes",
        gradient.dfdx, gradient.dfdy
      );
      StationaryOutcome::GradientNeverVanishes
    }
    (Component::IdenticallyZero, _) | (_, Component::IdenticallyZero) => {
      StationaryOutcome::SolverFailed(
        "stationary points are not isolated: a partial derivative vanishes identically"
          .to_string(),
      )
    }
    _ => solver.solve(gradient, hessian),
  }
}

/// Multi-start Newton iteration on the gradient, using the analytic
/// Hessian as its Jacobian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonSolver {
  /// Seeds cover `[-radius, radius]` on both axes.
  pub radius: f64,
  pub seeds_per_axis: usize,
  pub max_iterations: usize,
}

impl Default for NewtonSolver {
  fn default() -> Self {
    NewtonSolver {
      radius: 5.0,
      seeds_per_axis: 11,
      max_iterations: 500,
    }
  }
}

impl NewtonSolver {
  pub fn new(radius: f64, seeds_per_axis: usize) -> Self {
    NewtonSolver {
      radius,
      seeds_per_axis,
      ..Self::default()
    }
  }

  fn seeds(&self) -> Vec<Point2> {
    let n = self.seeds_per_axis.max(1);
    if n == 1 {
      return vec![Point2::new(0.0, 0.0)];
    }
    let step = 2.0 * self.radius / (n - 1) as f64;
    let start = -self.radius;
    (0..n)
      .flat_map(|i| {
        (0..n).map(move |j| {
          Point2::new(start + i as f64 * step, start + j as f64 * step)
        })
      })
      .collect()
  }

  fn newton(
    &self,
    gradient: &Gradient,
    hessian: &HessianExprs,
    seed: Point2,
  ) -> Result<Option<Point2>, Error> {
    let mut p = seed;
    for iteration in 0..self.max_iterations {
      let (gx, gy) = gradient.evaluate_at(p)?;
      if gx == 0.0 && gy == 0.0 {
        trace!("seed {seed}: exact root {p} at iteration {iteration}");
        return Ok(Some(p));
      }
      let h = hessian.evaluate_at(p)?;
      let (dx, dy) = match newton_step(h, gx, gy) {
        Some(step) => step,
        None => {
          trace!("seed {seed}: abandoned at iteration {iteration} at {p}");
          return Ok(None);
        }
      };

      p = Point2::new(p.x - dx, p.y - dy);
      if !(p.x.is_finite() && p.y.is_finite()) {
        return Ok(None);
      }

      let size = dx.hypot(dy);
      let scale = 1.0 + p.x.hypot(p.y);
      if size <= SLOW_STEP_TOLERANCE * scale {
        let (gx, gy) = gradient.evaluate_at(p)?;
        let residual = gx.hypot(gy);
        if residual < RESIDUAL_TOLERANCE {
          trace!("seed {seed}: converged to {p} after {iteration} iterations");
          return Ok(Some(p));
        }
        if size <= STEP_TOLERANCE * scale {
          trace!("seed {seed}: stalled at {p} with residual {residual}");
          return Ok(None);
        }
      }
    }
    trace!("seed {seed}: no convergence");
    Ok(None)
  }
}

impl StationarySolver for NewtonSolver {
  fn solve(
    &self,
    gradient: &Gradient,
    hessian: &HessianExprs,
  ) -> StationaryOutcome {
    let seeds = self.seeds();
    let mut found: Vec<Point2> = Vec::new();

    for seed in &seeds {
      match self.newton(gradient, hessian, *seed) {
        Ok(Some(p)) => {
          let p = Point2::new(snap(p.x), snap(p.y));
          if !found.iter().any(|q| is_same_point(q, &p)) {
            found.push(p);
          }
        }
        Ok(None) => {}
        Err(e) => return StationaryOutcome::SolverFailed(e.to_string()),
      }
    }

    found.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    debug!(
      "newton: {} stationary point(s) from {} seeds",
      found.len(),
      seeds.len()
    );
    StationaryOutcome::Candidates(found)
  }
}

/// Solve `J * (dx, dy) = (gx, gy)` for the Jacobian `[[fxx, fxy], [fyx,
/// fyy]]`. Rows are scaled to unit size first so that tiny second
/// derivatives near a degenerate point do not underflow the determinant.
fn newton_step(h: HessianEntries, gx: f64, gy: f64) -> Option<(f64, f64)> {
  let s1 = h.fxx.abs().max(h.fxy.abs());
  let s2 = h.fyx.abs().max(h.fyy.abs());
  if s1 == 0.0 || s2 == 0.0 {
    return None;
  }
  let (a, b, g1) = (h.fxx / s1, h.fxy / s1, gx / s1);
  let (c, d, g2) = (h.fyx / s2, h.fyy / s2, gy / s2);
  let det = a * d - b * c;
  if det == 0.0 || !det.is_finite() || !g1.is_finite() || !g2.is_finite() {
    return None;
  }
  Some(((d * g1 - b * g2) / det, (a * g2 - c * g1) / det))
}

// Round values that are integers up to iteration noise; also maps -0 to 0.
fn snap(v: f64) -> f64 {
  let rounded = v.round();
  let v = if (v - rounded).abs() < SNAP_TOLERANCE {
    rounded
  } else {
    v
  };
  if v == 0.0 {
    0.0
  } else {
    v
  }
}

fn is_same_point(a: &Point2, b: &Point2) -> bool {
  (a.x - b.x).abs() < DEDUP_TOLERANCE && (a.y - b.y).abs() < DEDUP_TOLERANCE
}
