use std::collections::BTreeSet;
use std::fmt;

use pest::iterators::Pair;

use crate::{Error, Rule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
  Plus,
  Minus,
  Times,
  Divide,
  Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
  Minus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Integer(i128),
  Real(f64),
  Identifier(String),
  /// `pi` or `e`
  Constant(String),
  UnaryOp {
    op: UnaryOperator,
    operand: Box<Expr>,
  },
  BinaryOp {
    op: BinaryOperator,
    left: Box<Expr>,
    right: Box<Expr>,
  },
  FunctionCall {
    name: String,
    args: Vec<Expr>,
  },
}

impl Expr {
  pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
    Expr::BinaryOp {
      op,
      left: Box::new(left),
      right: Box::new(right),
    }
  }

  pub fn negate(operand: Expr) -> Expr {
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand: Box::new(operand),
    }
  }

  pub fn call(name: &str, arg: Expr) -> Expr {
    Expr::FunctionCall {
      name: name.to_string(),
      args: vec![arg],
    }
  }

  pub fn variable(name: &str) -> Expr {
    Expr::Identifier(name.to_string())
  }

  /// Numeric value of a literal, if this node is one.
  pub fn as_number(&self) -> Option<f64> {
    match self {
      Expr::Integer(n) => Some(*n as f64),
      Expr::Real(x) => Some(*x),
      _ => None,
    }
  }
}

/// Parse a function of `x` and `y` into an expression tree.
pub fn parse_expression(input: &str) -> Result<Expr, Error> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Err(Error::EmptyInput);
  }

  let mut pairs = crate::parse(trimmed)?;
  let program = pairs.next().ok_or(Error::EmptyInput)?;
  let expression = program
    .into_inner()
    .find(|p| p.as_rule() == Rule::Expression)
    .ok_or(Error::EmptyInput)?;

  pair_to_expr(expression)
}

pub fn pair_to_expr(pair: Pair<Rule>) -> Result<Expr, Error> {
  match pair.as_rule() {
    Rule::Expression => {
      let mut acc: Option<Expr> = None;
      let mut pending = BinaryOperator::Plus;
      for child in pair.into_inner() {
        if child.as_rule() == Rule::AddOp {
          pending = if child.as_str() == "-" {
            BinaryOperator::Minus
          } else {
            BinaryOperator::Plus
          };
          continue;
        }
        let term = pair_to_expr(child)?;
        acc = Some(match acc {
          None => term,
          Some(left) => Expr::binary(pending, left, term),
        });
      }
      acc.ok_or(Error::EmptyInput)
    }
    Rule::Term => {
      let mut acc: Option<Expr> = None;
      let mut pending: Option<BinaryOperator> = None;
      for child in pair.into_inner() {
        if child.as_rule() == Rule::MulOp {
          pending = Some(if child.as_str() == "/" {
            BinaryOperator::Divide
          } else {
            BinaryOperator::Times
          });
          continue;
        }
        let factor = pair_to_expr(child)?;
        // Juxtaposed factors have no operator between them.
        let op = pending.take().unwrap_or(BinaryOperator::Times);
        acc = Some(match acc {
          None => factor,
          Some(left) => Expr::binary(op, left, factor),
        });
      }
      acc.ok_or(Error::EmptyInput)
    }
    Rule::Signed => {
      let mut negations = 0usize;
      let mut operand = None;
      for child in pair.into_inner() {
        match child.as_rule() {
          Rule::Sign => {
            if child.as_str() == "-" {
              negations += 1;
            }
          }
          _ => operand = Some(pair_to_expr(child)?),
        }
      }
      let operand = operand.ok_or(Error::EmptyInput)?;
      if negations % 2 == 0 {
        return Ok(operand);
      }
      Ok(match operand {
        Expr::Integer(n) => match n.checked_neg() {
          Some(m) => Expr::Integer(m),
          None => Expr::negate(Expr::Integer(n)),
        },
        Expr::Real(x) => Expr::Real(-x),
        other => Expr::negate(other),
      })
    }
    Rule::Power => {
      let mut inner = pair.into_inner();
      let base = pair_to_expr(inner.next().ok_or(Error::EmptyInput)?)?;
      match inner.next() {
        Some(exponent) => Ok(Expr::binary(
          BinaryOperator::Power,
          base,
          pair_to_expr(exponent)?,
        )),
        None => Ok(base),
      }
    }
    Rule::FunctionCall => {
      let mut inner = pair.into_inner();
      let name = inner.next().ok_or(Error::EmptyInput)?.as_str().to_string();
      let arg = pair_to_expr(inner.next().ok_or(Error::EmptyInput)?)?;
      Ok(Expr::FunctionCall {
        name,
        args: vec![arg],
      })
    }
    Rule::Number => Ok(parse_number(pair.as_str())),
    Rule::Constant => Ok(Expr::Constant(pair.as_str().to_string())),
    Rule::Identifier => Ok(Expr::Identifier(pair.as_str().to_string())),
    _ => Err(Error::UnknownSymbol(pair.as_str().to_string())),
  }
}

fn parse_number(text: &str) -> Expr {
  if !text.contains(['.', 'e', 'E']) {
    if let Ok(n) = text.parse::<i128>() {
      return Expr::Integer(n);
    }
  }
  Expr::Real(text.parse::<f64>().unwrap_or(f64::NAN))
}

/// Names of all variables occurring in `expr`.
pub fn free_variables(expr: &Expr) -> BTreeSet<String> {
  let mut names = BTreeSet::new();
  collect_variables(expr, &mut names);
  names
}

fn collect_variables(expr: &Expr, names: &mut BTreeSet<String>) {
  match expr {
    Expr::Identifier(name) => {
      names.insert(name.clone());
    }
    Expr::UnaryOp { operand, .. } => collect_variables(operand, names),
    Expr::BinaryOp { left, right, .. } => {
      collect_variables(left, names);
      collect_variables(right, names);
    }
    Expr::FunctionCall { args, .. } => {
      for arg in args {
        collect_variables(arg, names);
      }
    }
    Expr::Integer(_) | Expr::Real(_) | Expr::Constant(_) => {}
  }
}

// Binding strength used when printing. Negative literals bind like a
// unary minus.
fn precedence(expr: &Expr) -> u8 {
  match expr {
    Expr::BinaryOp { op, .. } => match op {
      BinaryOperator::Plus | BinaryOperator::Minus => 1,
      BinaryOperator::Times | BinaryOperator::Divide => 2,
      BinaryOperator::Power => 4,
    },
    Expr::UnaryOp { .. } => 3,
    Expr::Integer(n) if *n < 0 => 3,
    Expr::Real(x) if x.is_sign_negative() => 3,
    _ => 5,
  }
}

fn write_wrapped(
  f: &mut fmt::Formatter<'_>,
  expr: &Expr,
  parens: bool,
) -> fmt::Result {
  if parens {
    write!(f, "({expr})")
  } else {
    write!(f, "{expr}")
  }
}

impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Expr::Integer(n) => write!(f, "{n}"),
      Expr::Real(x) => write!(f, "{x}"),
      Expr::Identifier(name) | Expr::Constant(name) => f.write_str(name),
      Expr::UnaryOp { operand, .. } => {
        f.write_str("-")?;
        let p = precedence(operand);
        write_wrapped(f, operand, p < 2 || p == 3)
      }
      Expr::FunctionCall { name, args } => {
        write!(f, "{name}(")?;
        for (i, arg) in args.iter().enumerate() {
          if i > 0 {
            f.write_str(", ")?;
          }
          write!(f, "{arg}")?;
        }
        f.write_str(")")
      }
      Expr::BinaryOp { op, left, right } => {
        let pl = precedence(left);
        let pr = precedence(right);
        match op {
          BinaryOperator::Plus => {
            write!(f, "{left}")?;
            match right.as_ref() {
              Expr::Integer(n) if *n < 0 => {
                write!(f, " - {}", n.unsigned_abs())
              }
              Expr::Real(x) if x.is_sign_negative() => write!(f, " - {}", -x),
              Expr::UnaryOp { operand, .. } => {
                f.write_str(" - ")?;
                write_wrapped(f, operand, precedence(operand) <= 1)
              }
              _ => write!(f, " + {right}"),
            }
          }
          BinaryOperator::Minus => {
            write!(f, "{left} - ")?;
            write_wrapped(f, right, pr <= 1 || pr == 3)
          }
          BinaryOperator::Times => {
            write_wrapped(f, left, pl < 2)?;
            f.write_str("*")?;
            write_wrapped(f, right, pr < 2 || pr == 3)
          }
          BinaryOperator::Divide => {
            write_wrapped(f, left, pl < 2)?;
            f.write_str("/")?;
            write_wrapped(f, right, pr <= 3)
          }
          BinaryOperator::Power => {
            write_wrapped(f, left, pl <= 4)?;
            f.write_str("^")?;
            write_wrapped(f, right, pr < 4)
          }
        }
      }
    }
  }
}
