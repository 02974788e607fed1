use approx::assert_relative_eq;
use critpoint::calculus::is_constant_wrt;
use critpoint::syntax::BinaryOperator;
use critpoint::{
  differentiate, evaluate, parse_expression, simplify, Bindings, Expr,
  Gradient, HessianExprs, Point2,
};

mod calculus_tests {
  use super::*;

  fn d(input: &str, var: &str) -> String {
    differentiate(&parse_expression(input).unwrap(), var)
      .unwrap()
      .to_string()
  }

  fn hessian_of(input: &str) -> HessianExprs {
    let gradient = Gradient::of(&parse_expression(input).unwrap()).unwrap();
    HessianExprs::of(&gradient).unwrap()
  }

  mod symbolic_derivatives {
    use super::*;

    #[test]
    fn paraboloid() {
      assert_eq!(d("x^2 + y^2", "x"), "2*x");
      assert_eq!(d("x^2 + y^2", "y"), "2*y");

      let h = hessian_of("x^2 + y^2");
      assert_eq!(h.d2fdx2.to_string(), "2");
      assert_eq!(h.d2fdy2.to_string(), "2");
      assert_eq!(h.d2fdxdy.to_string(), "0");
      assert_eq!(h.d2fdydx.to_string(), "0");
    }

    #[test]
    fn saddle() {
      assert_eq!(d("x^2 - y^2", "y"), "-2*y");
      assert_eq!(hessian_of("x^2 - y^2").d2fdy2.to_string(), "-2");
    }

    #[test]
    fn cubic() {
      assert_eq!(d("x^3 + y^3-3x-3y", "x"), "3*x^2 - 3");
      assert_eq!(d("x^3 + y^3-3x-3y", "y"), "3*y^2 - 3");

      let h = hessian_of("x^3 + y^3-3x-3y");
      assert_eq!(h.d2fdx2.to_string(), "6*x");
      assert_eq!(h.d2fdy2.to_string(), "6*y");
      assert_eq!(h.d2fdxdy.to_string(), "0");
      assert_eq!(h.d2fdydx.to_string(), "0");
    }

    #[test]
    fn product() {
      assert_eq!(d("x*y", "x"), "y");
      assert_eq!(hessian_of("x*y").d2fdxdy.to_string(), "1");
    }

    #[test]
    fn constants_vanish() {
      assert_eq!(d("5", "x"), "0");
      assert_eq!(d("pi * y", "x"), "0");
      assert_eq!(d("x + 1", "x"), "1");
    }
  }

  mod numeric_agreement {
    use super::*;

    const H: f64 = 1e-6;

    fn check(input: &str, x: f64, y: f64) {
      let f = parse_expression(input).unwrap();
      let gradient = Gradient::of(&f).unwrap();
      let at = |x: f64, y: f64| evaluate(&f, &Bindings::xy(x, y)).unwrap();

      let fd_x = (at(x + H, y) - at(x - H, y)) / (2.0 * H);
      let fd_y = (at(x, y + H) - at(x, y - H)) / (2.0 * H);
      let (gx, gy) = gradient.evaluate_at(Point2::new(x, y)).unwrap();

      assert_relative_eq!(gx, fd_x, epsilon = 1e-6, max_relative = 1e-5);
      assert_relative_eq!(gy, fd_y, epsilon = 1e-6, max_relative = 1e-5);
    }

    #[test]
    fn chain_rule_for_every_function() {
      for input in [
        "sin(x*y)",
        "cos(x^2 + y)",
        "tan(x - y)",
        "asin(x*y/2)",
        "acos(x*y/2)",
        "atan(x/y)",
        "sinh(x + y)",
        "cosh(x*y)",
        "tanh(2x - y)",
        "exp(x)*cos(y)",
        "ln(x^2 + y^2 + 1)",
        "log(x + 2y)",
        "sqrt(x^2 + y + 1)",
        "abs(x - 2y)",
      ] {
        check(input, 0.7, 0.4);
      }
    }

    #[test]
    fn power_rules() {
      check("x^y", 0.7, 0.4);
      check("2^(x*y)", 0.7, 0.4);
      check("e^(x*y)", 0.7, 0.4);
      check("x^0.5 * y^-2", 0.7, 0.4);
      check("(x + y)^(x*y)", 0.7, 0.4);
    }

    #[test]
    fn quotient_rule() {
      check("x / (1 + y^2)", 0.7, 0.4);
      check("(x^2 - y) / (x + y)", 0.7, 0.4);
    }

    #[test]
    fn mixed_partials_agree_for_smooth_functions() {
      let h = hessian_of("sin(x*y) + x^2 y^3");
      let bindings = Bindings::xy(0.3, -1.2);
      let fxy = evaluate(&h.d2fdxdy, &bindings).unwrap();
      let fyx = evaluate(&h.d2fdydx, &bindings).unwrap();
      assert_relative_eq!(fxy, fyx, max_relative = 1e-12);
    }

    #[test]
    fn hessian_entries_at_point() {
      let entries = hessian_of("x^3 + y^3-3x-3y")
        .evaluate_at(Point2::new(-1.0, 1.0))
        .unwrap();
      assert_eq!(entries.fxx, -6.0);
      assert_eq!(entries.fyy, 6.0);
      assert_eq!(entries.fxy, 0.0);
      assert_eq!(entries.fyx, 0.0);
    }
  }

  mod simplify_tests {
    use super::*;

    fn x() -> Expr {
      Expr::variable("x")
    }

    #[test]
    fn identities() {
      let zero_plus = Expr::binary(BinaryOperator::Plus, Expr::Integer(0), x());
      assert_eq!(simplify(zero_plus), x());

      let times_one = Expr::binary(BinaryOperator::Times, x(), Expr::Integer(1));
      assert_eq!(simplify(times_one), x());

      let to_zero = Expr::binary(BinaryOperator::Power, x(), Expr::Integer(0));
      assert_eq!(simplify(to_zero), Expr::Integer(1));
    }

    #[test]
    fn constant_folding() {
      let quotient =
        Expr::binary(BinaryOperator::Divide, Expr::Integer(6), Expr::Integer(3));
      assert_eq!(simplify(quotient), Expr::Integer(2));

      let half =
        Expr::binary(BinaryOperator::Divide, Expr::Integer(1), Expr::Integer(2));
      assert_eq!(simplify(half).to_string(), "1/2");

      let power =
        Expr::binary(BinaryOperator::Power, Expr::Integer(2), Expr::Integer(10));
      assert_eq!(simplify(power), Expr::Integer(1024));

      let mixed =
        Expr::binary(BinaryOperator::Times, Expr::Real(0.5), Expr::Integer(3));
      assert_eq!(simplify(mixed), Expr::Real(1.5));
    }

    #[test]
    fn coefficients() {
      let trailing = Expr::binary(BinaryOperator::Times, x(), Expr::Integer(3));
      assert_eq!(simplify(trailing).to_string(), "3*x");

      let nested = Expr::binary(
        BinaryOperator::Times,
        Expr::Integer(3),
        Expr::binary(BinaryOperator::Times, Expr::Integer(2), x()),
      );
      assert_eq!(simplify(nested).to_string(), "6*x");
    }

    #[test]
    fn signs() {
      let minus_negative =
        Expr::binary(BinaryOperator::Minus, x(), Expr::Integer(-2));
      assert_eq!(simplify(minus_negative).to_string(), "x + 2");

      let times_minus_one =
        Expr::binary(BinaryOperator::Times, Expr::Integer(-1), x());
      assert_eq!(simplify(times_minus_one).to_string(), "-x");

      let double_negation = Expr::negate(Expr::negate(x()));
      assert_eq!(simplify(double_negation), x());
    }
  }

  #[test]
  fn constant_wrt() {
    let f = parse_expression("x^2 + sin(y)").unwrap();
    assert!(!is_constant_wrt(&f, "x"));
    assert!(!is_constant_wrt(&f, "y"));
    assert!(is_constant_wrt(&f, "z"));
  }
}
