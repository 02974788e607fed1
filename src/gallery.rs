use rand::seq::SliceRandom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Example {
  pub name: &'static str,
  pub function: &'static str,
}

pub const EXAMPLES: &[Example] = &[
  // Minimum at (0, 0)
  Example {
    name: "Paraboloid",
    function: "x^2 + y^2",
  },
  // Saddle at (0, 0)
  Example {
    name: "Saddle",
    function: "x^2 - y^2",
  },
  // Minimum, maximum and two saddles at (±1, ±1)
  Example {
    name: "Cubic",
    function: "x^3 + y^3-3x-3y",
  },
];

pub fn find_example(name: &str) -> Option<&'static Example> {
  EXAMPLES.iter().find(|e| e.name.eq_ignore_ascii_case(name))
}

pub fn random_example() -> &'static Example {
  EXAMPLES
    .choose(&mut rand::thread_rng())
    .unwrap_or(&EXAMPLES[0])
}
