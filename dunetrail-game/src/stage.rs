//! Immutable simulation context shared by the traveler and its history.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::economy::EconomicModel;
use crate::graph::{Graph, GraphError, NodeKind, Terminals};
use crate::weather::{WeatherError, WeatherTimeline};

/// Which day's weather prices a day of consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AccountingMode {
    /// Consumption uses the weather of the current date.
    #[default]
    Forward,
    /// Consumption uses the weather of the previous date.
    Inverse,
}

impl AccountingMode {
    /// Day whose weather prices consumption happening on `date`.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::BeforeFirstDay`] for inverse accounting on day 0.
    pub const fn consumption_day(self, date: u32) -> Result<u32, WeatherError> {
        match self {
            Self::Forward => Ok(date),
            Self::Inverse => match date.checked_sub(1) {
                Some(day) => Ok(day),
                None => Err(WeatherError::BeforeFirstDay),
            },
        }
    }

    /// Earliest date whose consumption can be priced.
    #[must_use]
    pub const fn first_day(self) -> u32 {
        match self {
            Self::Forward => 0,
            Self::Inverse => 1,
        }
    }
}

/// Scalar stage parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSettings {
    #[serde(default)]
    pub day_count: u32,
    /// Load capacity with an empty pack.
    #[serde(default)]
    pub load_capacity: i32,
    #[serde(default)]
    pub base_budget: i32,
    /// Money earned per day of mining.
    #[serde(default)]
    pub base_income: i32,
    #[serde(default)]
    pub economy: EconomicModel,
    #[serde(default)]
    pub accounting: AccountingMode,
}

/// Errors raised while assembling a stage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("day count must be positive")]
    NoDays,
}

/// Fully assembled simulation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    settings: StageSettings,
    graph: Graph,
    weather: WeatherTimeline,
    terminals: Terminals,
}

impl Stage {
    /// Assemble a stage, resolving and validating its start and end nodes.
    ///
    /// # Errors
    ///
    /// Returns an error when the day count is zero or the graph does not have
    /// exactly one start and one end node.
    pub fn assemble(
        settings: StageSettings,
        graph: Graph,
        weather: WeatherTimeline,
    ) -> Result<Self, StageError> {
        if settings.day_count == 0 {
            return Err(StageError::NoDays);
        }
        let terminals = graph.terminals()?;
        if weather.len() < settings.day_count as usize {
            log::warn!(
                "forecast covers {} of {} days; travel past it will fail",
                weather.len(),
                settings.day_count
            );
        }
        Ok(Self {
            settings,
            graph,
            weather,
            terminals,
        })
    }

    /// Replace the forecast, keeping everything else.
    #[must_use]
    pub fn with_weather(mut self, weather: WeatherTimeline) -> Self {
        self.weather = weather;
        self
    }

    #[must_use]
    pub fn with_accounting(mut self, accounting: AccountingMode) -> Self {
        self.settings.accounting = accounting;
        self
    }

    #[must_use]
    pub const fn settings(&self) -> &StageSettings {
        &self.settings
    }

    #[must_use]
    pub const fn day_count(&self) -> u32 {
        self.settings.day_count
    }

    #[must_use]
    pub const fn load_capacity(&self) -> i32 {
        self.settings.load_capacity
    }

    #[must_use]
    pub const fn base_budget(&self) -> i32 {
        self.settings.base_budget
    }

    #[must_use]
    pub const fn base_income(&self) -> i32 {
        self.settings.base_income
    }

    #[must_use]
    pub const fn economy(&self) -> &EconomicModel {
        &self.settings.economy
    }

    #[must_use]
    pub const fn accounting(&self) -> AccountingMode {
        self.settings.accounting
    }

    #[must_use]
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    #[must_use]
    pub const fn weather(&self) -> &WeatherTimeline {
        &self.weather
    }

    #[must_use]
    pub fn start_id(&self) -> &str {
        &self.terminals.start
    }

    #[must_use]
    pub fn end_id(&self) -> &str {
        &self.terminals.end
    }

    #[must_use]
    pub fn kind_of(&self, id: &str) -> Option<NodeKind> {
        self.graph.kind_of(id)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let economy = self.economy();
        writeln!(f, "Day Count: {}", self.day_count())?;
        writeln!(f, "Load: {}", self.load_capacity())?;
        writeln!(f, "Budget: {}", self.base_budget())?;
        writeln!(f, "Income: {}", self.base_income())?;
        writeln!(
            f,
            "Weight: food {} / water {}",
            economy.weight.food, economy.weight.water
        )?;
        writeln!(
            f,
            "Price: food {} / water {}",
            economy.base_price.food, economy.base_price.water
        )?;
        writeln!(f, "Start: {} / End: {}", self.start_id(), self.end_id())?;
        write!(f, "Accounting: {:?}", self.accounting())
    }
}
