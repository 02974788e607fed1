//! Symbolic differentiation and simplification of expression trees, plus the
//! gradient and Hessian of a function of `x` and `y`.

use crate::classify::{HessianEntries, Point2};
use crate::evaluate::{evaluate, Bindings};
use crate::syntax::{BinaryOperator, Expr, UnaryOperator};
use crate::Error;

pub const X: &str = "x";
pub const Y: &str = "y";

/// First partial derivatives of `f`.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
  pub dfdx: Expr,
  pub dfdy: Expr,
}

impl Gradient {
  pub fn of(f: &Expr) -> Result<Self, Error> {
    Ok(Gradient {
      dfdx: differentiate(f, X)?,
      dfdy: differentiate(f, Y)?,
    })
  }

  pub fn evaluate_at(&self, p: Point2) -> Result<(f64, f64), Error> {
    let bindings = Bindings::xy(p.x, p.y);
    Ok((
      evaluate(&self.dfdx, &bindings)?,
      evaluate(&self.dfdy, &bindings)?,
    ))
  }
}

/// Second partial derivatives of `f`. Both mixed partials are derived
/// independently from the two gradient components.
#[derive(Debug, Clone, PartialEq)]
pub struct HessianExprs {
  pub d2fdx2: Expr,
  pub d2fdy2: Expr,
  pub d2fdxdy: Expr,
  pub d2fdydx: Expr,
}

impl HessianExprs {
  pub fn of(gradient: &Gradient) -> Result<Self, Error> {
    Ok(HessianExprs {
      d2fdx2: differentiate(&gradient.dfdx, X)?,
      d2fdy2: differentiate(&gradient.dfdy, Y)?,
      d2fdxdy: differentiate(&gradient.dfdx, Y)?,
      d2fdydx: differentiate(&gradient.dfdy, X)?,
    })
  }

  pub fn evaluate_at(&self, p: Point2) -> Result<HessianEntries, Error> {
    let bindings = Bindings::xy(p.x, p.y);
    Ok(HessianEntries {
      fxx: evaluate(&self.d2fdx2, &bindings)?,
      fyy: evaluate(&self.d2fdy2, &bindings)?,
      fxy: evaluate(&self.d2fdxdy, &bindings)?,
      fyx: evaluate(&self.d2fdydx, &bindings)?,
    })
  }
}

/// Check if expression is constant with respect to a variable
pub fn is_constant_wrt(expr: &Expr, var: &str) -> bool {
  match expr {
    Expr::Integer(_) | Expr::Real(_) | Expr::Constant(_) => true,
    Expr::Identifier(name) => name != var,
    Expr::BinaryOp { left, right, .. } => {
      is_constant_wrt(left, var) && is_constant_wrt(right, var)
    }
    Expr::UnaryOp { operand, .. } => is_constant_wrt(operand, var),
    Expr::FunctionCall { args, .. } => {
      args.iter().all(|e| is_constant_wrt(e, var))
    }
  }
}

/// Differentiate an expression with respect to a variable. The result is
/// simplified.
pub fn differentiate(expr: &Expr, var: &str) -> Result<Expr, Error> {
  use BinaryOperator::*;

  match expr {
    Expr::Integer(_) | Expr::Real(_) | Expr::Constant(_) => {
      Ok(Expr::Integer(0))
    }

    Expr::Identifier(name) => {
      if name == var {
        Ok(Expr::Integer(1))
      } else {
        Ok(Expr::Integer(0))
      }
    }

    Expr::BinaryOp { op, left, right } => match op {
      Plus | Minus => {
        let da = differentiate(left, var)?;
        let db = differentiate(right, var)?;
        Ok(simplify(Expr::binary(*op, da, db)))
      }
      Times => {
        // Product rule: (a*b)' = a'*b + a*b'
        let da = differentiate(left, var)?;
        let db = differentiate(right, var)?;
        Ok(simplify(Expr::binary(
          Plus,
          Expr::binary(Times, da, (**right).clone()),
          Expr::binary(Times, (**left).clone(), db),
        )))
      }
      Divide => {
        // Quotient rule: (a/b)' = (a'*b - a*b') / b^2
        let da = differentiate(left, var)?;
        let db = differentiate(right, var)?;
        Ok(simplify(Expr::binary(
          Divide,
          Expr::binary(
            Minus,
            Expr::binary(Times, da, (**right).clone()),
            Expr::binary(Times, (**left).clone(), db),
          ),
          Expr::binary(Power, (**right).clone(), Expr::Integer(2)),
        )))
      }
      Power => differentiate_power(expr, left, right, var),
    },

    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => {
      let d = differentiate(operand, var)?;
      Ok(simplify(Expr::negate(d)))
    }

    Expr::FunctionCall { name, args } => {
      let [u] = args.as_slice() else {
        return Err(Error::UnknownFunction(format!(
          "{name} with {} arguments",
          args.len()
        )));
      };
      let du = differentiate(u, var)?;
      if matches!(du, Expr::Integer(0)) {
        return Ok(Expr::Integer(0));
      }
      let outer = outer_derivative(name, u)?;
      Ok(simplify(Expr::binary(Times, outer, du)))
    }
  }
}

fn differentiate_power(
  expr: &Expr,
  base: &Expr,
  exponent: &Expr,
  var: &str,
) -> Result<Expr, Error> {
  use BinaryOperator::*;

  if is_constant_wrt(exponent, var) {
    // Power rule: (f^n)' = n * f^(n-1) * f'
    let df = differentiate(base, var)?;
    return Ok(simplify(Expr::binary(
      Times,
      Expr::binary(
        Times,
        exponent.clone(),
        Expr::binary(
          Power,
          base.clone(),
          Expr::binary(Minus, exponent.clone(), Expr::Integer(1)),
        ),
      ),
      df,
    )));
  }

  let dg = differentiate(exponent, var)?;
  if matches!(base, Expr::Constant(c) if c == "e") {
    // (e^g)' = e^g * g'
    return Ok(simplify(Expr::binary(Times, expr.clone(), dg)));
  }
  if is_constant_wrt(base, var) {
    // (a^g)' = a^g * ln(a) * g'
    return Ok(simplify(Expr::binary(
      Times,
      Expr::binary(Times, expr.clone(), Expr::call("ln", base.clone())),
      dg,
    )));
  }

  // (f^g)' = f^g * (g' * ln(f) + g * f' / f)
  let df = differentiate(base, var)?;
  Ok(simplify(Expr::binary(
    Times,
    expr.clone(),
    Expr::binary(
      Plus,
      Expr::binary(Times, dg, Expr::call("ln", base.clone())),
      Expr::binary(
        Divide,
        Expr::binary(Times, exponent.clone(), df),
        base.clone(),
      ),
    ),
  )))
}

/// Derivative of a named function with respect to its argument `u`.
fn outer_derivative(name: &str, u: &Expr) -> Result<Expr, Error> {
  use BinaryOperator::*;

  let one = || Expr::Integer(1);
  let u_squared = || Expr::binary(Power, u.clone(), Expr::Integer(2));

  Ok(match name {
    "sin" => Expr::call("cos", u.clone()),
    "cos" => Expr::negate(Expr::call("sin", u.clone())),
    "tan" => Expr::binary(
      Divide,
      one(),
      Expr::binary(Power, Expr::call("cos", u.clone()), Expr::Integer(2)),
    ),
    "asin" => Expr::binary(
      Divide,
      one(),
      Expr::call("sqrt", Expr::binary(Minus, one(), u_squared())),
    ),
    "acos" => Expr::negate(Expr::binary(
      Divide,
      one(),
      Expr::call("sqrt", Expr::binary(Minus, one(), u_squared())),
    )),
    "atan" => {
      Expr::binary(Divide, one(), Expr::binary(Plus, one(), u_squared()))
    }
    "sinh" => Expr::call("cosh", u.clone()),
    "cosh" => Expr::call("sinh", u.clone()),
    "tanh" => Expr::binary(
      Divide,
      one(),
      Expr::binary(Power, Expr::call("cosh", u.clone()), Expr::Integer(2)),
    ),
    "exp" => Expr::call("exp", u.clone()),
    "ln" | "log" => Expr::binary(Divide, one(), u.clone()),
    "sqrt" => Expr::binary(
      Divide,
      one(),
      Expr::binary(Times, Expr::Integer(2), Expr::call("sqrt", u.clone())),
    ),
    "abs" => Expr::binary(Divide, u.clone(), Expr::call("abs", u.clone())),
    _ => return Err(Error::UnknownFunction(name.to_string())),
  })
}

fn is_zero(expr: &Expr) -> bool {
  matches!(expr.as_number(), Some(v) if v == 0.0)
}

fn is_one(expr: &Expr) -> bool {
  matches!(expr.as_number(), Some(v) if v == 1.0)
}

fn is_minus_one(expr: &Expr) -> bool {
  matches!(expr.as_number(), Some(v) if v == -1.0)
}

/// Simplify an expression
pub fn simplify(expr: Expr) -> Expr {
  match expr {
    Expr::BinaryOp { op, left, right } => {
      simplify_binary(op, simplify(*left), simplify(*right))
    }
    Expr::UnaryOp { op, operand } => match simplify(*operand) {
      Expr::Integer(n) => match n.checked_neg() {
        Some(m) => Expr::Integer(m),
        None => Expr::negate(Expr::Integer(n)),
      },
      Expr::Real(x) => Expr::Real(-x),
      // -(-x) = x
      Expr::UnaryOp { operand: inner, .. } => *inner,
      other => Expr::UnaryOp {
        op,
        operand: Box::new(other),
      },
    },
    Expr::FunctionCall { name, args } => Expr::FunctionCall {
      name,
      args: args.into_iter().map(simplify).collect(),
    },
    _ => expr,
  }
}

// Both operands are already simplified.
fn simplify_binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
  use BinaryOperator::*;

  if let Some(folded) = fold_numbers(op, &left, &right) {
    return folded;
  }

  match op {
    // 0 + x = x, x + 0 = x
    Plus if is_zero(&left) => return right,
    Plus if is_zero(&right) => return left,
    // x - 0 = x, 0 - x = -x
    Minus if is_zero(&right) => return left,
    Minus if is_zero(&left) => return simplify(Expr::negate(right)),
    // 0 * x = 0, 1 * x = x, -1 * x = -x
    Times if is_zero(&left) || is_zero(&right) => return Expr::Integer(0),
    Times if is_one(&left) => return right,
    Times if is_one(&right) => return left,
    Times if is_minus_one(&left) => return simplify(Expr::negate(right)),
    Times if is_minus_one(&right) => return simplify(Expr::negate(left)),
    // x / 1 = x, 0 / x = 0
    Divide if is_one(&right) => return left,
    Divide if is_zero(&left) => return Expr::Integer(0),
    // x^0 = 1, x^1 = x, 1^x = 1
    Power if is_zero(&right) => return Expr::Integer(1),
    Power if is_one(&right) => return left,
    Power if is_one(&left) => return Expr::Integer(1),
    _ => {}
  }

  match (op, left, right) {
    // a + (-b) = a - b
    (Plus, l, Expr::UnaryOp { operand, .. }) => Expr::binary(Minus, l, *operand),
    // a - (-b) = a + b
    (Minus, l, Expr::UnaryOp { operand, .. }) => Expr::binary(Plus, l, *operand),
    (Minus, l, Expr::Integer(n)) if n < 0 && n != i128::MIN => {
      Expr::binary(Plus, l, Expr::Integer(-n))
    }
    // Pull signs out of products: (-a)*b = -(a*b)
    (Times, Expr::UnaryOp { operand, .. }, r) => {
      simplify(Expr::negate(simplify_binary(Times, *operand, r)))
    }
    (Times, l, Expr::UnaryOp { operand, .. }) => {
      simplify(Expr::negate(simplify_binary(Times, l, *operand)))
    }
    // Numeric coefficient first: x*3 = 3*x
    (Times, l, r) if r.as_number().is_some() && l.as_number().is_none() => {
      simplify_binary(Times, r, l)
    }
    // Merge coefficients: 3*(2*x) = 6*x
    (
      Times,
      l,
      Expr::BinaryOp {
        op: Times,
        left: inner_left,
        right: inner_right,
      },
    ) if l.as_number().is_some() && inner_left.as_number().is_some() => {
      let coefficient = simplify_binary(Times, l, *inner_left);
      simplify_binary(Times, coefficient, *inner_right)
    }
    (op, l, r) => Expr::binary(op, l, r),
  }
}

fn fold_numbers(op: BinaryOperator, left: &Expr, right: &Expr) -> Option<Expr> {
  use BinaryOperator::*;

  match (left, right) {
    (Expr::Integer(a), Expr::Integer(b)) => {
      let (a, b) = (*a, *b);
      let folded = match op {
        Plus => a.checked_add(b),
        Minus => a.checked_sub(b),
        Times => a.checked_mul(b),
        // Only exact quotients fold; 1/2 stays symbolic.
        Divide if b != 0 && a.checked_rem(b) == Some(0) => a.checked_div(b),
        Divide => None,
        Power => u32::try_from(b).ok().and_then(|e| a.checked_pow(e)),
      };
      folded.map(Expr::Integer)
    }
    _ => {
      let a = left.as_number()?;
      let b = right.as_number()?;
      Some(Expr::Real(match op {
        Plus => a + b,
        Minus => a - b,
        Times => a * b,
        Divide => a / b,
        Power => a.powf(b),
      }))
    }
  }
}
