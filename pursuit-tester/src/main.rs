mod logic;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{
    RunPlan, RunSummary, ScenarioCtx, ScenarioResult, Strategy, expand_scenarios, list_scenarios,
    run_episodes, run_scenarios,
};
use pursuit_game::{
    EpisodeConfig, FileRecordStorage, RotationSettings, SceneCatalog, SceneProgressionStore,
    SharedProgression, TrainingSession,
};
use util::{split_csv, timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RotationArg {
    /// Move to the next scene every `--episodes-per-scene` episodes
    Progressive,
    /// Stay on `--fixed-scene` forever
    Fixed,
}

#[derive(Debug, Parser)]
#[command(name = "pursuit-tester", version)]
#[command(about = "Headless runner for the pursuit arena: scripted episodes, scene rotation, logic checks")]
struct Args {
    /// Episodes to play with the scripted policies (0 to skip)
    #[arg(long, default_value_t = 10)]
    episodes: u64,

    /// Fixed timestep in seconds
    #[arg(long, default_value_t = 0.02)]
    dt: f64,

    /// Seed for random policies
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    #[arg(long, value_enum, default_value_t = Strategy::Pursue)]
    chaser_policy: Strategy,

    #[arg(long, value_enum, default_value_t = Strategy::Flee)]
    evader_policy: Strategy,

    /// Where the scene rotation counters are persisted
    #[arg(long, default_value = "target/pursuit-state/SceneRotationData.json")]
    state_file: PathBuf,

    #[arg(long, value_enum, default_value_t = RotationArg::Progressive)]
    rotation: RotationArg,

    /// Scene index used with `--rotation fixed`
    #[arg(long, default_value_t = 2)]
    fixed_scene: u32,

    #[arg(long, default_value_t = 200)]
    episodes_per_scene: u64,

    /// Zero the persisted counters and exit
    #[arg(long)]
    reset: bool,

    /// Logic scenarios to run (comma-separated, or `all`)
    #[arg(long)]
    scenarios: Option<String>,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    let catalog = SceneCatalog::load_from_static();
    let settings = rotation_settings(&args, &catalog)?;
    let storage = FileRecordStorage::new(&args.state_file);

    if args.reset {
        return reset_progression(storage, settings);
    }

    anyhow::ensure!(
        args.dt.is_finite() && args.dt > 0.0,
        "--dt must be a positive number of seconds, got {}",
        args.dt
    );

    announce_banner();
    let start_time = Instant::now();

    let run = run_training(&args, catalog, storage, settings)?;
    let scenarios = args
        .scenarios
        .as_deref()
        .map(|list| expand_scenarios(&split_csv(list)))
        .unwrap_or_default();
    let results = run_logic_scenarios(&args, &scenarios);

    write_reports(&args, run.as_ref(), &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎯 Pursuit Arena Tester".bright_cyan().bold());
    println!("{}", "=======================".cyan());
    log::debug!("tester started at {}", timestamp());
}

fn rotation_settings(args: &Args, catalog: &SceneCatalog) -> Result<RotationSettings> {
    let scene_count = catalog.count();
    let settings = match args.rotation {
        RotationArg::Progressive => RotationSettings::progressive(scene_count),
        RotationArg::Fixed => RotationSettings::fixed(scene_count, args.fixed_scene),
    }
    .with_episodes_per_scene(args.episodes_per_scene);
    settings
        .validate_against(catalog)
        .context("invalid scene rotation settings")?;
    if args.rotation == RotationArg::Fixed && args.fixed_scene >= scene_count {
        log::warn!(
            "fixed scene {} is out of range; using scene {}",
            args.fixed_scene,
            settings.clamp_index(args.fixed_scene)
        );
    }
    Ok(settings)
}

fn reset_progression(storage: FileRecordStorage, settings: RotationSettings) -> Result<()> {
    let path = storage.path().to_path_buf();
    let mut store = SceneProgressionStore::open(storage, settings)
        .context("failed to open scene progression")?;
    anyhow::ensure!(
        store.reset_episode_count(),
        "failed to write {}",
        path.display()
    );
    println!("Scene progression reset: {}", path.display());
    Ok(())
}

fn run_training(
    args: &Args,
    catalog: SceneCatalog,
    storage: FileRecordStorage,
    settings: RotationSettings,
) -> Result<Option<RunSummary>> {
    if args.episodes == 0 {
        return Ok(None);
    }
    let progression = SharedProgression::open(storage, settings)
        .context("failed to open scene progression")?;
    let mut session = TrainingSession::new(EpisodeConfig::load_from_static(), catalog, progression)
        .context("failed to start training session")?;
    let plan = RunPlan::new(args.episodes, args.dt, args.seed)
        .with_policies(args.chaser_policy, args.evader_policy);
    if args.verbose {
        println!(
            "Running {} episodes ({} vs {}) from '{}'",
            plan.episodes,
            plan.chaser,
            plan.evader,
            session.current_scene().name
        );
    }
    Ok(Some(run_episodes(&mut session, &plan, args.verbose)))
}

fn run_logic_scenarios(args: &Args, scenarios: &[String]) -> Vec<ScenarioResult> {
    if scenarios.is_empty() {
        return Vec::new();
    }
    let ctx = ScenarioCtx {
        seed: args.seed,
        dt: args.dt,
        verbose: args.verbose,
    };
    run_scenarios(scenarios, &ctx)
}

fn write_reports(
    args: &Args,
    run: Option<&RunSummary>,
    results: &[ScenarioResult],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, run, results)?,
        "markdown" => logic::reports::generate_markdown_report(&mut output_target, run, results)?,
        "csv" => logic::reports::generate_csv_report(&mut output_target, run)?,
        _ => {
            if run.is_none() && results.is_empty() {
                writeln!(&mut output_target, "Nothing to run.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    run,
                    results,
                    start_time.elapsed(),
                )?;
            }
            let duration = start_time.elapsed();
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
