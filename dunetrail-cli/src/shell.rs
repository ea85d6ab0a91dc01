//! Line-oriented command shell over an [`Expedition`].
//!
//! Input lines are split on `;`, and every piece is run as one command.
//! Command failures are reported on the output and never end the session.
use colored::Colorize;
use rand_chacha::ChaCha20Rng;
use std::io::{self, BufRead, Write};
use thiserror::Error;

use dunetrail_game::{EstimateConfig, Expedition, ExpeditionError, Resource, TravelError};

use crate::render;

/// Problems with the shape of a command line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("not enough arguments for `{0}`")]
    MissingArgument(&'static str),
    #[error("too many arguments for `{0}`")]
    TooManyArguments(&'static str),
    #[error("expected a non-negative number, got '{0}'")]
    InvalidNumber(String),
    #[error("wrong separator usage in argument '{0}', expected resource:amount")]
    BadAmount(String),
    #[error("unknown resource '{0}'")]
    UnknownResource(String),
}

#[derive(Debug, Error)]
enum ShellError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Expedition(#[from] ExpeditionError),
    #[error("random run failed: {0}")]
    Estimate(TravelError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Go(Vec<String>),
    Stay,
    Mine,
    Buy { food: i32, water: i32 },
    Undo,
    Redo,
    UndoTo(u32),
    RedoTo(u32),
    History,
    Log,
    GraphInfo,
    StageInfo,
    Weather,
    Repeat {
        times: usize,
        command: Box<Command>,
        /// Label recorded for each repetition.
        label: String,
    },
    RandomRun(Option<usize>),
    Help,
    Quit,
}

fn number<T: std::str::FromStr>(text: &str) -> Result<T, CommandError> {
    text.parse()
        .map_err(|_| CommandError::InvalidNumber(text.to_string()))
}

fn no_args(name: &'static str, args: &[&str], command: Command) -> Result<Command, CommandError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(CommandError::TooManyArguments(name))
    }
}

fn single_arg<'a>(name: &'static str, args: &[&'a str]) -> Result<&'a str, CommandError> {
    match args {
        [] => Err(CommandError::MissingArgument(name)),
        [arg] => Ok(*arg),
        _ => Err(CommandError::TooManyArguments(name)),
    }
}

fn parse_buy(args: &[&str]) -> Result<Command, CommandError> {
    if args.len() > 2 {
        return Err(CommandError::TooManyArguments("buy"));
    }
    let (mut food, mut water) = (0, 0);
    for arg in args {
        let (code, amount) = arg
            .split_once(':')
            .ok_or_else(|| CommandError::BadAmount((*arg).to_string()))?;
        let amount: i32 = number(amount)?;
        if amount < 0 {
            return Err(CommandError::InvalidNumber(amount.to_string()));
        }
        match Resource::from_code(code) {
            Some(Resource::Food) => food = amount,
            Some(Resource::Water) => water = amount,
            None => return Err(CommandError::UnknownResource(code.to_string())),
        }
    }
    Ok(Command::Buy { food, water })
}

impl Command {
    /// Parse one `;`-free command.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] for unknown commands and malformed arguments.
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let Some((&name, args)) = tokens.split_first() else {
            return Err(CommandError::Unknown(String::new()));
        };
        match name {
            "go" if args.is_empty() => Err(CommandError::MissingArgument("go")),
            "go" => Ok(Self::Go(args.iter().map(ToString::to_string).collect())),
            "stay" => no_args("stay", args, Self::Stay),
            "mine" => no_args("mine", args, Self::Mine),
            "buy" => parse_buy(args),
            "undo" => no_args("undo", args, Self::Undo),
            "redo" => no_args("redo", args, Self::Redo),
            "undoto" => Ok(Self::UndoTo(number(single_arg("undoto", args)?)?)),
            "redoto" => Ok(Self::RedoTo(number(single_arg("redoto", args)?)?)),
            "history" => no_args("history", args, Self::History),
            "log" => no_args("log", args, Self::Log),
            "graph-info" => no_args("graph-info", args, Self::GraphInfo),
            "stage-info" => no_args("stage-info", args, Self::StageInfo),
            "weather" => no_args("weather", args, Self::Weather),
            "repeat" => {
                let [times, inner @ ..] = args else {
                    return Err(CommandError::MissingArgument("repeat"));
                };
                if inner.is_empty() {
                    return Err(CommandError::MissingArgument("repeat"));
                }
                let label = inner.join(" ");
                Ok(Self::Repeat {
                    times: number(times)?,
                    command: Box::new(Self::parse(&label)?),
                    label,
                })
            }
            "random-run" => match args {
                [] => Ok(Self::RandomRun(None)),
                [iterations] => Ok(Self::RandomRun(Some(number(iterations)?))),
                _ => Err(CommandError::TooManyArguments("random-run")),
            },
            "help" => no_args("help", args, Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }

    /// Whether a successful run creates a new history entry.
    #[must_use]
    pub const fn changes_state(&self) -> bool {
        matches!(self, Self::Go(_) | Self::Stay | Self::Mine | Self::Buy { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell<W: Write> {
    expedition: Expedition,
    rng: ChaCha20Rng,
    out: W,
    prompt: bool,
}

impl<W: Write> Shell<W> {
    pub const fn new(expedition: Expedition, rng: ChaCha20Rng, out: W) -> Self {
        Self {
            expedition,
            rng,
            out,
            prompt: false,
        }
    }

    /// Print a prompt before reading each line.
    #[must_use]
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    pub const fn expedition(&self) -> &Expedition {
        &self.expedition
    }

    /// Read and run lines until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error only when reading input or writing output fails.
    pub fn run<R: BufRead>(&mut self, input: R) -> io::Result<()> {
        let mut lines = input.lines();
        loop {
            if self.prompt {
                write!(self.out, "{}", "Traveling> ".yellow())?;
                self.out.flush()?;
            }
            let Some(line) = lines.next().transpose()? else {
                break;
            };
            if self.run_line(&line)? == Flow::Quit {
                break;
            }
        }
        self.out.flush()
    }

    /// Run every `;`-separated command on one line.
    ///
    /// # Errors
    ///
    /// Returns an error only when writing output fails.
    pub fn run_line(&mut self, line: &str) -> io::Result<Flow> {
        for piece in line.split(';').map(str::trim) {
            if piece.is_empty() {
                continue;
            }
            let label = piece.split_whitespace().collect::<Vec<_>>().join(" ");
            let outcome = Command::parse(&label)
                .map_err(ShellError::from)
                .and_then(|command| self.execute(&command, &label));
            match outcome {
                Ok(Flow::Quit) => return Ok(Flow::Quit),
                Ok(Flow::Continue) => {}
                Err(ShellError::Io(err)) => return Err(err),
                Err(err) => self.report(&err)?,
            }
        }
        Ok(Flow::Continue)
    }

    fn report(&mut self, err: &ShellError) -> io::Result<()> {
        let fatal = matches!(err, ShellError::Expedition(inner) if inner.is_fatal());
        if fatal {
            log::warn!("fatal lookup failure: {err}");
            writeln!(self.out, "{} {err}", "fatal stage inconsistency:".red().bold())
        } else {
            log::debug!("command failed: {err:?}");
            writeln!(self.out, "{}", err.to_string().red())
        }
    }

    fn execute(&mut self, command: &Command, label: &str) -> Result<Flow, ShellError> {
        let expedition = &mut self.expedition;
        let traveler = match command {
            Command::Go(route) => expedition.travel(route.as_slice())?,
            Command::Stay => expedition.stay()?,
            Command::Mine => expedition.mine()?,
            Command::Buy { food, water } => {
                let purchase = expedition.buy(*food, *water)?;
                writeln!(
                    self.out,
                    "Bought {} food and {} water for {}",
                    purchase.amount.food, purchase.amount.water, purchase.cost
                )?;
                self.expedition.traveler()
            }
            Command::Undo => expedition.undo()?,
            Command::Redo => expedition.redo()?,
            Command::UndoTo(date) => expedition.undo_to_date(*date)?,
            Command::RedoTo(date) => expedition.redo_to_date(*date)?,
            Command::Log => expedition.traveler(),
            Command::History => {
                for entry in self.expedition.history() {
                    writeln!(self.out, "{}: {}", entry.number, entry.label)?;
                }
                return Ok(Flow::Continue);
            }
            Command::GraphInfo => {
                writeln!(self.out, "{}", self.expedition.stage().graph())?;
                return Ok(Flow::Continue);
            }
            Command::StageInfo => {
                writeln!(self.out, "{}", self.expedition.stage())?;
                return Ok(Flow::Continue);
            }
            Command::Weather => {
                render::write_forecast(&mut self.out, self.expedition.stage().weather())?;
                return Ok(Flow::Continue);
            }
            Command::Repeat {
                times,
                command,
                label,
            } => {
                for _ in 0..*times {
                    if self.execute(command, label)? == Flow::Quit {
                        return Ok(Flow::Quit);
                    }
                }
                return Ok(Flow::Continue);
            }
            Command::RandomRun(iterations) => {
                self.random_run(*iterations)?;
                return Ok(Flow::Continue);
            }
            Command::Help => {
                render::write_help(&mut self.out)?;
                return Ok(Flow::Continue);
            }
            Command::Quit => return Ok(Flow::Quit),
        };
        render::write_state(&mut self.out, traveler)?;
        if command.changes_state() {
            self.expedition.record_command(label);
        }
        Ok(Flow::Continue)
    }

    fn random_run(&mut self, iterations: Option<usize>) -> Result<(), ShellError> {
        let mut config = EstimateConfig::default();
        if let Some(iterations) = iterations {
            config.iterations = iterations;
        }
        let report =
            dunetrail_game::estimate_consumption(self.expedition.stage(), &config, &mut self.rng)
                .map_err(ShellError::Estimate)?;
        render::write_console_report(&mut self.out, &report)?;
        Ok(())
    }
}
