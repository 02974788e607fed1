//! Second-derivative test for stationary points of `f(x, y)`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
  pub x: f64,
  pub y: f64,
}

impl Point2 {
  pub fn new(x: f64, y: f64) -> Self {
    Point2 { x, y }
  }
}

impl fmt::Display for Point2 {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "(x = {}, y = {})", self.x, self.y)
  }
}

/// Second partial derivatives evaluated at a point.
///
/// `fyx` is kept for display only. Classification reads `fxy` and never
/// compares the two mixed partials.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HessianEntries {
  pub fxx: f64,
  pub fyy: f64,
  pub fxy: f64,
  pub fyx: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
  LocalMinimum,
  LocalMaximum,
  Saddle,
  Inconclusive,
}

impl Classification {
  /// Marker color used when plotting a point of this kind.
  pub fn color(self) -> &'static str {
    match self {
      Classification::LocalMaximum => "rgb(255, 65, 54)",
      Classification::LocalMinimum => "rgb(46, 204, 113)",
      Classification::Saddle => "rgb(30, 144, 255)",
      Classification::Inconclusive => "rgb(255, 215, 0)",
    }
  }
}

impl fmt::Display for Classification {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Classification::LocalMinimum => "Local Minimum",
      Classification::LocalMaximum => "Local Maximum",
      Classification::Saddle => "Saddle Point",
      Classification::Inconclusive => "Inconclusive (D = 0)",
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedPoint {
  pub point: Point2,
  pub classification: Classification,
  /// Hessian determinant `fxx * fyy - fxy^2`
  pub determinant: f64,
  pub hessian: HessianEntries,
}

/// Classify a stationary point from its second partials.
///
/// Returns the Hessian determinant `D = fxx * fyy - fxy^2` together with
/// the classification:
///
/// - `D > 0` and `fxx > 0`: local minimum
/// - `D > 0` otherwise (including `fxx == 0`): local maximum
/// - `D < 0`: saddle
/// - `D == 0`: inconclusive; there is no tolerance band
///
/// Any non-finite input is inconclusive, whatever sign `D` ends up with.
pub fn classify(fxx: f64, fyy: f64, fxy: f64) -> (f64, Classification) {
  let d = fxx * fyy - fxy * fxy;

  if !(fxx.is_finite() && fyy.is_finite() && fxy.is_finite()) {
    return (d, Classification::Inconclusive);
  }

  let classification = if d > 0.0 {
    if fxx > 0.0 {
      Classification::LocalMinimum
    } else {
      Classification::LocalMaximum
    }
  } else if d < 0.0 {
    Classification::Saddle
  } else {
    Classification::Inconclusive
  };

  (d, classification)
}

pub fn classify_point(point: Point2, hessian: HessianEntries) -> ClassifiedPoint {
  let (determinant, classification) =
    classify(hessian.fxx, hessian.fyy, hessian.fxy);
  ClassifiedPoint {
    point,
    classification,
    determinant,
    hessian,
  }
}
