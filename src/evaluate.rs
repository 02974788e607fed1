//! Numeric evaluation of expression trees.
//!
//! Variables are resolved through explicit [`Bindings`], never by rewriting
//! the expression text, so a name is only ever matched as a whole token.

use std::collections::HashMap;

use crate::syntax::{BinaryOperator, Expr, UnaryOperator};
use crate::Error;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
  values: HashMap<String, f64>,
}

impl Bindings {
  pub fn new() -> Self {
    Self::default()
  }

  /// Bindings for the two coordinates of the plane.
  pub fn xy(x: f64, y: f64) -> Self {
    Self::new().with("x", x).with("y", y)
  }

  /// Returns a copy with `name` bound to `value`, shadowing any
  /// previous binding of the same name.
  pub fn with(mut self, name: &str, value: f64) -> Self {
    self.values.insert(name.to_string(), value);
    self
  }

  pub fn get(&self, name: &str) -> Option<f64> {
    self.values.get(name).copied()
  }
}

/// Evaluate `expr` to a real number.
///
/// Only an unbound variable is an error. Domain violations such as
/// `ln(-1)` or `1/0` yield NaN or an infinity and are left to the caller.
pub fn evaluate(expr: &Expr, bindings: &Bindings) -> Result<f64, Error> {
  match expr {
    Expr::Integer(n) => Ok(*n as f64),
    Expr::Real(x) => Ok(*x),
    Expr::Constant(name) => constant_value(name),
    Expr::Identifier(name) => bindings
      .get(name)
      .ok_or_else(|| Error::UnboundVariable(name.clone())),
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => Ok(-evaluate(operand, bindings)?),
    Expr::BinaryOp { op, left, right } => {
      let a = evaluate(left, bindings)?;
      let b = evaluate(right, bindings)?;
      Ok(match op {
        BinaryOperator::Plus => a + b,
        BinaryOperator::Minus => a - b,
        BinaryOperator::Times => a * b,
        BinaryOperator::Divide => a / b,
        BinaryOperator::Power => power(a, right, b),
      })
    }
    Expr::FunctionCall { name, args } => {
      let [arg] = args.as_slice() else {
        return Err(Error::UnknownFunction(format!(
          "{name} with {} arguments",
          args.len()
        )));
      };
      let u = evaluate(arg, bindings)?;
      apply_function(name, u)
    }
  }
}

fn constant_value(name: &str) -> Result<f64, Error> {
  match name {
    "pi" => Ok(std::f64::consts::PI),
    "e" => Ok(std::f64::consts::E),
    _ => Err(Error::UnknownSymbol(name.to_string())),
  }
}

// Integer exponents go through powi so that negative bases keep a real
// result, e.g. (-2)^3 = -8.
fn power(base: f64, exponent_expr: &Expr, exponent: f64) -> f64 {
  match exponent_expr {
    Expr::Integer(n) if i32::try_from(*n).is_ok() => base.powi(*n as i32),
    _ if exponent.fract() == 0.0 && exponent.abs() <= i32::MAX as f64 => {
      base.powi(exponent as i32)
    }
    _ => base.powf(exponent),
  }
}

fn apply_function(name: &str, u: f64) -> Result<f64, Error> {
  Ok(match name {
    "sin" => u.sin(),
    "cos" => u.cos(),
    "tan" => u.tan(),
    "asin" => u.asin(),
    "acos" => u.acos(),
    "atan" => u.atan(),
    "sinh" => u.sinh(),
    "cosh" => u.cosh(),
    "tanh" => u.tanh(),
    "exp" => u.exp(),
    "ln" | "log" => u.ln(),
    "sqrt" => u.sqrt(),
    "abs" => u.abs(),
    _ => return Err(Error::UnknownFunction(name.to_string())),
  })
}
