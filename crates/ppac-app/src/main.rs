use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ppac_app::lotka_volterra::{self, LotkaVolterraParams};
use ppac_app::render::TextRenderer;
use ppac_app::report::{self, OutputFormat};
use ppac_app::{RunParameters, RunReport, execute, load_sweep};
use ppac_core::{GenerationObserver, Neighborhood, RuleSet};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "ppac",
    version,
    about = "Run the stochastic predator-prey cellular automaton"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single simulation and report its population history.
    Run {
        #[command(flatten)]
        run: RunArgs,
        #[command(flatten)]
        output: OutputArgs,
        /// Print the grid to stderr every N generations.
        #[arg(long, value_name = "N")]
        show_grid: Option<u64>,
    },
    /// Run every parameter set in a JSON array file.
    Sweep {
        /// JSON file holding an array of run parameter objects.
        file: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Integrate the continuous Lotka-Volterra equations for comparison.
    Reference {
        #[command(flatten)]
        params: ReferenceArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// Write the report to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long, default_value_t = 400)]
    initial_prey: usize,
    #[arg(long, default_value_t = 200)]
    initial_predators: usize,
    /// Side length of a square board.
    #[arg(long, default_value_t = 40)]
    board_size: usize,
    #[arg(long)]
    rows: Option<usize>,
    #[arg(long)]
    cols: Option<usize>,
    #[arg(long, default_value_t = 0.7)]
    prey_birth_rate: f64,
    #[arg(long, default_value_t = 0.5)]
    prey_death_rate: f64,
    #[arg(long, default_value_t = 0.8)]
    predator_birth_rate: f64,
    #[arg(long, default_value_t = 0.4)]
    predator_death_rate: f64,
    /// Generations to run.
    #[arg(long, default_value_t = 800, conflicts_with = "until_extinct")]
    iterations: u64,
    /// Run until the population terminates instead of a fixed count.
    #[arg(long)]
    until_extinct: bool,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum, default_value_t = NeighborhoodArg::Moore)]
    neighborhood: NeighborhoodArg,
    #[arg(long, value_enum, default_value_t = RuleSetArg::Flat)]
    rule_set: RuleSetArg,
    /// Update cells in parallel from per-cell random streams.
    #[arg(long)]
    parallel: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NeighborhoodArg {
    Moore,
    VonNeumann,
}

impl From<NeighborhoodArg> for Neighborhood {
    fn from(arg: NeighborhoodArg) -> Self {
        match arg {
            NeighborhoodArg::Moore => Neighborhood::Moore,
            NeighborhoodArg::VonNeumann => Neighborhood::VonNeumann,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RuleSetArg {
    /// Predators die at a flat rate.
    Flat,
    /// Predators need prey nearby; births need a local prey majority.
    PreyGated,
}

impl From<RuleSetArg> for RuleSet {
    fn from(arg: RuleSetArg) -> Self {
        match arg {
            RuleSetArg::Flat => RuleSet::FlatPredatorDeath,
            RuleSetArg::PreyGated => RuleSet::PreyGated,
        }
    }
}

impl From<RunArgs> for RunParameters {
    fn from(args: RunArgs) -> Self {
        Self {
            initial_prey: args.initial_prey,
            initial_predators: args.initial_predators,
            board_size: args.board_size,
            rows: args.rows,
            cols: args.cols,
            prey_birth_rate: args.prey_birth_rate,
            prey_death_rate: args.prey_death_rate,
            predator_birth_rate: args.predator_birth_rate,
            predator_death_rate: args.predator_death_rate,
            iterations: (!args.until_extinct).then_some(args.iterations),
            seed: args.seed,
            neighborhood: args.neighborhood.into(),
            rule_set: args.rule_set.into(),
            parallel: args.parallel,
        }
    }
}

#[derive(Args, Debug)]
struct ReferenceArgs {
    #[arg(long, default_value_t = 0.5)]
    prey_birth_rate: f64,
    #[arg(long, default_value_t = 0.1)]
    predation_rate: f64,
    #[arg(long, default_value_t = 0.5)]
    predator_death_rate: f64,
    #[arg(long, default_value_t = 0.015)]
    predator_birth_rate: f64,
    #[arg(long, default_value_t = 1000.0)]
    initial_prey: f64,
    #[arg(long, default_value_t = 0.0)]
    initial_predators: f64,
    #[arg(long, default_value_t = 0.01)]
    dt: f64,
    #[arg(long, default_value_t = 4500)]
    steps: usize,
}

impl From<ReferenceArgs> for LotkaVolterraParams {
    fn from(args: ReferenceArgs) -> Self {
        Self {
            prey_birth_rate: args.prey_birth_rate,
            predation_rate: args.predation_rate,
            predator_death_rate: args.predator_death_rate,
            predator_birth_rate: args.predator_birth_rate,
            initial_prey: args.initial_prey,
            initial_predators: args.initial_predators,
            dt: args.dt,
            steps: args.steps,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            run,
            output,
            show_grid,
        } => {
            let parameters = RunParameters::from(run);
            let observer = show_grid.map(|interval| {
                Box::new(TextRenderer::with_interval(io::stderr(), interval))
                    as Box<dyn GenerationObserver>
            });
            let report = execute(&parameters, observer).context("invalid run parameters")?;
            emit_reports(&output, std::slice::from_ref(&report))?;
        }
        Command::Sweep { file, output } => {
            let runs = load_sweep(&file)?;
            if runs.is_empty() {
                bail!("sweep file {} contains no runs", file.display());
            }
            info!(runs = runs.len(), file = %file.display(), "starting sweep");
            let reports = runs
                .iter()
                .enumerate()
                .map(|(index, parameters)| {
                    execute(parameters, None).with_context(|| format!("sweep entry {index}"))
                })
                .collect::<Result<Vec<_>>>()?;
            emit_reports(&output, &reports)?;
        }
        Command::Reference { params, output } => {
            let points = lotka_volterra::integrate(&params.into());
            let mut writer = report::open_output(output.output.as_deref())?;
            report::write_reference(&mut writer, &points, output.format)?;
        }
    }

    Ok(())
}

fn emit_reports(output: &OutputArgs, reports: &[RunReport]) -> Result<()> {
    let mut writer: Box<dyn Write> = report::open_output(output.output.as_deref())?;
    report::write_reports(&mut writer, reports, output.format)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}
