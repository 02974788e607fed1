use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

pub mod analysis;
pub mod calculus;
pub mod classify;
pub mod evaluate;
pub mod gallery;
pub mod plot;
pub mod solve;
pub mod syntax;

pub use analysis::{analyze, analyze_with, Analysis, AnalysisOptions};
pub use calculus::{differentiate, simplify, Gradient, HessianExprs};
pub use classify::{
  classify, classify_point, Classification, ClassifiedPoint, HessianEntries,
  Point2,
};
pub use evaluate::{evaluate, Bindings};
pub use plot::{PlotData, SurfaceGrid};
pub use solve::{NewtonSolver, StationaryOutcome, StationarySolver};
pub use syntax::{parse_expression, Expr};

#[derive(Parser)]
#[grammar = "expression.pest"]
pub struct ExpressionParser;

#[derive(Error, Debug)]
pub enum Error {
  #[error("Please enter a function")]
  EmptyInput,
  #[error("Parse error: {0}")]
  Parse(#[from] Box<pest::error::Error<Rule>>),
  #[error("Unknown symbol '{0}': only x and y may appear as variables")]
  UnknownSymbol(String),
  #[error("Unknown function '{0}'")]
  UnknownFunction(String),
  #[error("No value bound for variable '{0}'")]
  UnboundVariable(String),
  #[error(
    "Plot range must be between {min} and {max}, got {0}",
    min = analysis::MIN_PLOT_RANGE,
    max = analysis::MAX_PLOT_RANGE
  )]
  InvalidPlotRange(f64),
  #[error("{0} must be at least 1")]
  InvalidGrid(&'static str),
}

impl ExpressionParser {
  pub fn parse_program(
    input: &str,
  ) -> Result<pest::iterators::Pairs<'_, Rule>, Box<pest::error::Error<Rule>>>
  {
    Self::parse(Rule::Program, input).map_err(Box::new)
  }
}

pub fn parse(
  input: &str,
) -> Result<pest::iterators::Pairs<'_, Rule>, Box<pest::error::Error<Rule>>> {
  ExpressionParser::parse_program(input)
}
