use critpoint::solve::find_stationary_points;
use critpoint::{
  parse_expression, Gradient, HessianExprs, NewtonSolver, Point2,
  StationaryOutcome, StationarySolver,
};

mod solver_tests {
  use super::*;

  /// Fails loudly if the screening step lets a degenerate gradient through.
  struct UnreachableSolver;

  impl StationarySolver for UnreachableSolver {
    fn solve(&self, _: &Gradient, _: &HessianExprs) -> StationaryOutcome {
      StationaryOutcome::SolverFailed("solver should not run".to_string())
    }
  }

  fn derivatives(input: &str) -> (Gradient, HessianExprs) {
    let f = parse_expression(input).unwrap();
    let gradient = Gradient::of(&f).unwrap();
    let hessian = HessianExprs::of(&gradient).unwrap();
    (gradient, hessian)
  }

  fn stationary(input: &str) -> StationaryOutcome {
    let (gradient, hessian) = derivatives(input);
    find_stationary_points(&NewtonSolver::default(), &gradient, &hessian)
  }

  fn screened(input: &str) -> StationaryOutcome {
    let (gradient, hessian) = derivatives(input);
    find_stationary_points(&UnreachableSolver, &gradient, &hessian)
  }

  mod newton {
    use super::*;

    #[test]
    fn paraboloid_has_single_point() {
      assert_eq!(
        stationary("x^2 + y^2"),
        StationaryOutcome::Candidates(vec![Point2::new(0.0, 0.0)])
      );
    }

    #[test]
    fn saddle_has_single_point() {
      assert_eq!(
        stationary("x^2 - y^2"),
        StationaryOutcome::Candidates(vec![Point2::new(0.0, 0.0)])
      );
    }

    #[test]
    fn cubic_has_four_points_in_order() {
      assert_eq!(
        stationary("x^3 + y^3-3x-3y"),
        StationaryOutcome::Candidates(vec![
          Point2::new(-1.0, -1.0),
          Point2::new(-1.0, 1.0),
          Point2::new(1.0, -1.0),
          Point2::new(1.0, 1.0),
        ])
      );
    }

    #[test]
    fn shifted_minimum() {
      assert_eq!(
        stationary("(x - 2)^2 + (y + 3)^2"),
        StationaryOutcome::Candidates(vec![Point2::new(2.0, -3.0)])
      );
    }

    #[test]
    fn degenerate_hessian_still_converges() {
      assert_eq!(
        stationary("x^4 + y^4"),
        StationaryOutcome::Candidates(vec![Point2::new(0.0, 0.0)])
      );
    }

    #[test]
    fn high_multiplicity_points_are_found() {
      for input in ["x^10 + y^10", "x^12 + y^2"] {
        assert_eq!(
          stationary(input),
          StationaryOutcome::Candidates(vec![Point2::new(0.0, 0.0)]),
          "{input}"
        );
      }
    }

    #[test]
    fn complex_roots_give_empty_candidates() {
      // df/dx = x^2 + 1 has no real root
      assert_eq!(
        stationary("x^3/3 + x + y^2"),
        StationaryOutcome::Candidates(vec![])
      );
    }

    #[test]
    fn single_seed_starts_at_origin() {
      let (gradient, hessian) = derivatives("(x - 1)^2 + y^2");
      let solver = NewtonSolver::new(5.0, 1);
      assert_eq!(
        solver.solve(&gradient, &hessian),
        StationaryOutcome::Candidates(vec![Point2::new(1.0, 0.0)])
      );
    }
  }

  mod screening {
    use super::*;

    #[test]
    fn constant_nonzero_partial_never_vanishes() {
      assert_eq!(screened("x + 1"), StationaryOutcome::GradientNeverVanishes);
      assert_eq!(
        screened("2x + y^2"),
        StationaryOutcome::GradientNeverVanishes
      );
    }

    #[test]
    fn vanishing_partial_is_not_isolated() {
      for input in ["5", "x^2", "y^3 - y"] {
        match screened(input) {
          StationaryOutcome::SolverFailed(reason) => {
            assert!(reason.contains("not isolated"), "{input}: {reason}");
          }
          other => panic!("{input}: expected SolverFailed, got {other:?}"),
        }
      }
    }

    #[test]
    fn varying_gradient_reaches_solver() {
      assert_eq!(
        screened("x^2 + y^2"),
        StationaryOutcome::SolverFailed("solver should not run".to_string())
      );
    }
  }
}
