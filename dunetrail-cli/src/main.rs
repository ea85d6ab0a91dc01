mod render;
mod shell;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, IsTerminal, Write, stdout};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use dunetrail_game::{
    AccountingMode, EstimateConfig, Expedition, Stage, StageDefinition, TravelerSetup,
    WeatherOdds, WeatherTimeline, estimate_consumption,
};

use shell::Shell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "dunetrail", version)]
#[command(about = "Plan a desert crossing: travel, mine, trade and rewind through history")]
struct Args {
    /// Stage file (sectioned text, or JSON with a .json extension)
    #[arg(long, default_value = "stage.txt")]
    stage: PathBuf,

    /// Starting date
    #[arg(long, default_value_t = 0)]
    date: u32,

    /// Starting node (defaults to the stage's start node)
    #[arg(long)]
    pos: Option<String>,

    /// Starting money (defaults to the stage budget)
    #[arg(long, allow_negative_numbers = true)]
    money: Option<i32>,

    /// Food carried at the start
    #[arg(long, default_value_t = 0)]
    food: i32,

    /// Water carried at the start
    #[arg(long, default_value_t = 0)]
    water: i32,

    /// The first-purchase price has already been used
    #[arg(long)]
    first_buy_used: bool,

    /// Price each day with the previous day's weather
    #[arg(long)]
    inverse: bool,

    /// Replace the stage forecast with a random one
    #[arg(long)]
    random_weather: bool,

    /// Seed for random weather and random runs
    #[arg(long)]
    seed: Option<u64>,

    /// Read commands from a file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,

    /// Print a consumption estimate for the stage and exit
    #[arg(long)]
    estimate: bool,

    /// Rounds for --estimate
    #[arg(long)]
    iterations: Option<usize>,

    /// Output format for --estimate
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write output to instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("using seed {seed}");

    let stage = prepare_stage(&args, seed)?;
    let mut output_target = OutputTarget::new(args.output.as_deref())?;

    if args.estimate {
        run_estimate(&args, &stage, seed, &mut output_target)?;
        output_target.flush()?;
        return Ok(());
    }

    let expedition = Expedition::with_setup(Rc::new(stage), &setup_from(&args))
        .context("invalid starting state")?;
    let interactive = args.script.is_none() && io::stdin().is_terminal();
    if interactive {
        announce_banner();
    }
    let mut shell = Shell::new(expedition, ChaCha20Rng::seed_from_u64(seed), output_target)
        .with_prompt(interactive);

    if let Some(script) = &args.script {
        let file = File::open(script)
            .with_context(|| format!("failed to open script {}", script.display()))?;
        shell.run(BufReader::new(file))?;
    } else {
        shell.run(io::stdin().lock())?;
    }

    let traveler = shell.expedition().traveler();
    log::info!(
        "session ended on day {} at {} (ok={})",
        traveler.date(),
        traveler.position(),
        traveler.is_ok()
    );
    Ok(())
}

fn announce_banner() {
    println!("{}", "🐪 Dunetrail".bright_yellow().bold());
    println!("{}", "============".yellow());
    println!("Type `help` for the list of commands.");
}

fn load_stage(path: &Path) -> Result<Stage> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = if path.extension().is_some_and(|ext| ext == "json") {
        StageDefinition::from_json(&text)
    } else {
        StageDefinition::parse(&text)
    };
    let definition = parsed.with_context(|| format!("failed to parse {}", path.display()))?;
    definition
        .into_stage()
        .with_context(|| format!("invalid stage {}", path.display()))
}

fn prepare_stage(args: &Args, seed: u64) -> Result<Stage> {
    let mut stage = load_stage(&args.stage)?;
    if args.inverse {
        stage = stage.with_accounting(AccountingMode::Inverse);
    }
    if args.random_weather {
        let forecast = WeatherTimeline::seeded(&WeatherOdds::default(), stage.day_count(), seed)
            .context("failed to generate weather")?;
        stage = stage.with_weather(forecast);
    }
    Ok(stage)
}

fn setup_from(args: &Args) -> TravelerSetup {
    TravelerSetup {
        date: args.date,
        position: args.pos.clone(),
        money: args.money,
        food: args.food,
        water: args.water,
        first_buy_used: args.first_buy_used,
    }
}

fn run_estimate(args: &Args, stage: &Stage, seed: u64, out: &mut OutputTarget) -> Result<()> {
    let mut config = EstimateConfig::default();
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let report = estimate_consumption(stage, &config, &mut rng).context("estimate failed")?;
    match args.report {
        ReportFormat::Console => render::write_console_report(out, &report)?,
        ReportFormat::Json => render::write_json_report(out, &report)?,
    }
    Ok(())
}

/// Buffered sink for shell and report output: stdout, or the `--output` file.
struct OutputTarget(BufWriter<Box<dyn Write>>);

impl OutputTarget {
    fn new(path: Option<&Path>) -> Result<Self> {
        let sink: Box<dyn Write> = match path {
            Some(path) => Box::new(
                File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?,
            ),
            None => Box::new(stdout()),
        };
        Ok(Self(BufWriter::new(sink)))
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}
