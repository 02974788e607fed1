use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use critpoint::analysis::{
  DEFAULT_GRID_POINTS, DEFAULT_PLOT_RANGE, DEFAULT_SEEDS_PER_AXIS,
};
use critpoint::{analyze, gallery, AnalysisOptions};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Find and classify the critical points of f(x, y)
  Analyze {
    /// The function, e.g. "x^3 + y^3 - 3x - 3y"
    function: String,
    #[command(flatten)]
    output: OutputArgs,
  },
  /// List the example functions
  Examples {
    /// Show only the example with this name
    name: Option<String>,
  },
  /// Analyze a randomly chosen example function
  Random {
    #[command(flatten)]
    output: OutputArgs,
  },
}

#[derive(Args)]
struct OutputArgs {
  /// Half-width of the square that is plotted and searched
  #[arg(long, default_value_t = DEFAULT_PLOT_RANGE)]
  range: f64,
  /// Grid intervals per axis for the surface samples
  #[arg(long, default_value_t = DEFAULT_GRID_POINTS)]
  grid: usize,
  /// Newton seeds per axis
  #[arg(long, default_value_t = DEFAULT_SEEDS_PER_AXIS)]
  seeds: usize,
  /// Print the analysis as JSON
  #[arg(long)]
  json: bool,
  /// Write Plotly traces for the surface and its critical points to FILE
  #[arg(long, value_name = "FILE")]
  plot: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
  env_logger::init();
  let cli = Cli::parse();

  match cli.command {
    Commands::Analyze { function, output } => run(&function, &output),
    Commands::Examples { name } => {
      let examples: Vec<&gallery::Example> = match name {
        Some(name) => gallery::find_example(&name)
          .map(|e| vec![e])
          .with_context(|| format!("no example named '{name}'"))?,
        None => gallery::EXAMPLES.iter().collect(),
      };
      for example in examples {
        println!("{:<12} {}", example.name, example.function);
      }
      Ok(())
    }
    Commands::Random { output } => {
      let example = gallery::random_example();
      println!("{}: {}\n", example.name, example.function);
      run(example.function, &output)
    }
  }
}

fn run(function: &str, args: &OutputArgs) -> anyhow::Result<()> {
  let options = AnalysisOptions {
    plot_range: args.range,
    grid_points: args.grid,
    seeds_per_axis: args.seeds,
  };
  let analysis = analyze(function, &options)?;

  if args.json {
    println!("{}", serde_json::to_string_pretty(&analysis.to_json())?);
  } else {
    print!("{analysis}");
  }

  if let Some(path) = &args.plot {
    let traces = serde_json::to_string_pretty(&analysis.plot.to_plotly_json())?;
    fs::write(path, traces).with_context(|| {
      format!("failed to write plot data to {}", path.display())
    })?;
  }
  Ok(())
}
