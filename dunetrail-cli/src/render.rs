use colored::Colorize;
use std::io::{self, Write};

use dunetrail_game::{ConsumptionReport, Traveler, WeatherTimeline};

/// Traveler state with a colored validity banner.
pub fn write_state(out: &mut dyn Write, traveler: &Traveler) -> io::Result<()> {
    let banner = if traveler.is_ok() {
        "State: Ok".green()
    } else {
        "State: Error".red().bold()
    };
    writeln!(out, "{banner}")?;
    if let Some(weather) = traveler.weather_ahead() {
        writeln!(out, "Weather Tomorrow: {}", weather.to_string().cyan())?;
    }
    writeln!(out, "{}", traveler.status_table())
}

pub fn write_forecast(out: &mut dyn Write, forecast: &WeatherTimeline) -> io::Result<()> {
    for (day, weather) in forecast.iter().enumerate() {
        writeln!(out, "{day}: {weather}")?;
    }
    Ok(())
}

pub fn write_console_report(out: &mut dyn Write, report: &ConsumptionReport) -> io::Result<()> {
    writeln!(out, "{}", "📊 Consumption Estimate".bright_cyan().bold())?;
    writeln!(out, "{}", "=======================".cyan())?;
    write!(out, "{report}")
}

/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json_report(out: &mut dyn Write, report: &ConsumptionReport) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_help(out: &mut dyn Write) -> io::Result<()> {
    const COMMANDS: [(&str, &str); 17] = [
        ("go <id>...", "travel through each node in turn"),
        ("stay", "wait one day"),
        ("mine", "mine one day for income"),
        ("buy [food:N] [water:N]", "buy supplies"),
        ("undo", "step back one state"),
        ("redo", "step forward one state"),
        ("undoto <date>", "step back to a date"),
        ("redoto <date>", "step forward to a date"),
        ("history", "list recorded commands"),
        ("log", "print the current state"),
        ("graph-info", "print the map"),
        ("stage-info", "print the stage settings"),
        ("weather", "print the forecast"),
        ("repeat <n> <command>", "run a command n times"),
        ("random-run [n]", "estimate route consumption over n random forecasts"),
        ("help", "show this list"),
        ("quit | exit", "leave the shell"),
    ];
    for (usage, description) in COMMANDS {
        writeln!(out, "  {:24} {description}", usage.bold())?;
    }
    Ok(())
}
