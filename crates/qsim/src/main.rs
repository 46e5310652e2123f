mod config;
mod logging;
mod render;
mod tui;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use config::Config;
use logging::{init_logging, LogOptions};
use qsim_core::linalg::MAX_DECIMALS;
use qsim_core::scenarios::{Oracle, OracleInput, SetupGate};
use qsim_core::{ScenarioConfig, ScenarioRegistry, Session, Simulator, StepReport, Verdict};

#[derive(Parser)]
#[command(name = "qsim")]
#[command(version, about = "Step through textbook quantum circuits", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Interactive mode (TUI) on the default scenario
    #[arg(short, long)]
    interactive: bool,

    /// Directory for the per-run log file
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Do not write a log file
    #[arg(long, global = true)]
    no_log_file: bool,

    /// Print info-level logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available scenarios
    List,

    /// Show a scenario's qubits, circuit and script
    Describe(ScenarioArgs),

    /// Run a scenario to the end and print every step
    ///
    /// Examples:
    ///     qsim run bell
    ///     qsim run teleportation --gate t --phase 0.25 --seed 7
    ///     qsim run deutsch-jozsa --oracle 12436578 --json
    #[command(verbatim_doc_comment)]
    Run {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Print the steps as JSON
        #[arg(long)]
        json: bool,

        /// Decimal places for amplitudes and Bloch vectors, at most 15
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=MAX_DECIMALS as i64))]
        decimals: Option<u8>,
    },

    /// Step through a scenario interactively
    Tui(ScenarioArgs),

    /// Deutsch-Jozsa oracle helpers
    Oracle {
        #[command(subcommand)]
        command: OracleCommand,
    },

    /// Manage ~/.qsim/config.yaml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum OracleCommand {
    /// Check a digit sequence and print the oracle's matrix
    Check {
        /// Eight distinct digits from 1 to 8, e.g. 12345678
        digits: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Set a value, e.g. `seed 42` or `teleportation.phase 0.5`
    Set { key: String, value: String },
    /// Print the config file location
    Path,
}

#[derive(Args, Clone, Debug)]
struct ScenarioArgs {
    /// Scenario name (see `qsim list`); defaults to the configured one
    scenario: Option<String>,

    /// Teleportation setup gate
    #[arg(long, value_enum)]
    gate: Option<GateArg>,

    /// Teleportation setup gate exponent, within [0, 1]
    #[arg(long)]
    phase: Option<f64>,

    /// Deutsch-Jozsa oracle digits
    #[arg(long)]
    oracle: Option<String>,

    /// Measurement seed
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum GateArg {
    X,
    T,
}

impl From<GateArg> for SetupGate {
    fn from(gate: GateArg) -> Self {
        match gate {
            GateArg::X => SetupGate::X,
            GateArg::T => SetupGate::T,
        }
    }
}

impl ScenarioArgs {
    fn bare(kind: &str) -> Self {
        Self {
            scenario: Some(kind.to_string()),
            gate: None,
            phase: None,
            oracle: None,
            seed: None,
        }
    }

    /// Saved presets for the scenario, overridden by the flags given.
    fn resolve(&self, config: &Config) -> (ScenarioConfig, Option<u64>) {
        let kind = self.scenario.as_deref().unwrap_or(&config.default_scenario);
        let mut scenario = config.scenario(kind);
        if let Some(gate) = self.gate {
            scenario.gate = Some(gate.into());
        }
        if let Some(phase) = self.phase {
            scenario.phase = Some(phase);
        }
        if let Some(oracle) = &self.oracle {
            scenario.oracle = Some(oracle.clone());
        }
        (scenario, self.seed.or(config.seed))
    }
}

#[derive(Serialize)]
struct RunOutput<'a> {
    scenario: &'a ScenarioConfig,
    seed: Option<u64>,
    steps: &'a [StepReport],
    verdict: &'a Verdict,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load()?;
    config.apply_env();

    let command = match (cli.command, cli.interactive) {
        (Some(command), _) => command,
        (None, true) => Commands::Tui(ScenarioArgs::bare(&config.default_scenario)),
        (None, false) => {
            eprintln!("No command given. Run `qsim --help` for usage.");
            return Ok(());
        }
    };

    let simulates = matches!(command, Commands::Run { .. } | Commands::Tui(_));
    let log_dir = cli.log_dir.clone().unwrap_or_else(|| config.log_dir.clone());
    let log = init_logging(&LogOptions {
        dir: (simulates && !cli.no_log_file).then_some(log_dir),
        verbose: cli.verbose,
        quiet: matches!(command, Commands::Tui(_)),
    })?;
    if let Some(path) = &log.path {
        tracing::info!(log_file = %path.display(), "qsim {} started", env!("CARGO_PKG_VERSION"));
    }

    let registry = ScenarioRegistry::with_builtins();

    match command {
        Commands::List => {
            for (name, title) in registry.list() {
                println!("{:<16} {}", name, title);
            }
        }
        Commands::Describe(args) => {
            let (scenario, _) = args.resolve(&config);
            let scenario = registry.build(&scenario)?;
            print!("{}", render::render_scenario(scenario.as_ref())?);
        }
        Commands::Run {
            scenario,
            json,
            decimals,
        } => {
            let decimals = decimals.map(usize::from).unwrap_or(config.decimals);
            run_scenario(&registry, &config, &scenario, json, decimals)?;
        }
        Commands::Tui(args) => {
            let (scenario, seed) = args.resolve(&config);
            tui::run_tui(registry, scenario, seed, config.decimals)?;
        }
        Commands::Oracle {
            command: OracleCommand::Check { digits },
        } => check_oracle(&digits)?,
        Commands::Config { command } => match command {
            ConfigCommand::Show => print!("{}", serde_yaml::to_string(&config)?),
            ConfigCommand::Set { key, value } => {
                // Edit the stored file, not the env-adjusted copy.
                let mut stored = Config::load()?;
                stored.set(&key, &value)?;
                stored.save()?;
                println!("Set {} = {}", key, value);
            }
            ConfigCommand::Path => println!("{}", Config::get_config_path()?.display()),
        },
    }

    Ok(())
}

fn run_scenario(
    registry: &ScenarioRegistry,
    config: &Config,
    args: &ScenarioArgs,
    json: bool,
    decimals: usize,
) -> Result<()> {
    let (scenario_config, seed) = args.resolve(config);
    let scenario = registry.build(&scenario_config)?;
    let simulator = match seed {
        Some(seed) => Simulator::seeded(seed),
        None => Simulator::new(),
    };
    let mut session = Session::new(scenario, simulator)?;

    if !json {
        println!("{}", session.scenario().title());
        println!("{}", session.circuit());
    }
    let reports = session.run_to_end()?;
    let verdict = session.finish()?;

    if json {
        let output = RunOutput {
            scenario: &scenario_config,
            seed,
            steps: &reports,
            verdict: &verdict,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for report in &reports {
            println!("{}\n", render::render_step(report, reports.len(), decimals));
        }
        println!("{}", render::render_verdict(&verdict));
    }
    Ok(())
}

fn check_oracle(digits: &str) -> Result<()> {
    match Oracle::validate(digits) {
        OracleInput::Acceptable => {
            let oracle = Oracle::parse(digits)?;
            println!("{} is a valid oracle:", oracle);
            println!("{}", oracle.matrix());
            Ok(())
        }
        status @ OracleInput::Intermediate => {
            bail!("'{}' is {}: 8 distinct digits from 1 to 8 are needed", digits, status)
        }
        status @ OracleInput::Invalid => {
            bail!("'{}' is {}: use each digit from 1 to 8 at most once", digits, status)
        }
    }
}
