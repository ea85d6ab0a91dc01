//! Traveler state machine: movement, waiting, mining and purchasing.
//!
//! The scalar state lives in [`TravelerState`], a plain value that the
//! timeline copies into history. [`Traveler`] pairs it with the shared
//! [`Stage`] the rules read from.
//!
//! Every fallible transition is computed on a scratch copy of the state and
//! committed only on success, so an error never leaves a half-applied move.
//! Transitions never validate the result; callers run
//! [`Traveler::check_state`] once a batch of transitions is done.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

use crate::constants::{MINING_INTENSITY, STAY_INTENSITY, TRAVEL_INTENSITY};
use crate::economy::{Purchase, Supplies};
use crate::graph::{GraphError, NodeKind};
use crate::stage::Stage;
use crate::weather::{Weather, WeatherError};

/// Errors raised by traveler transitions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TravelError {
    #[error("no such node with id '{0}'")]
    UnknownNode(String),
    #[error("you have to be at a mine to do this ('{0}' is not a mine)")]
    NotAtMine(String),
    #[error("traveler not in normal state")]
    Stranded,
    #[error("no destination given")]
    EmptyRoute,
    #[error("amount too large: {food} food and {water} water")]
    AmountTooLarge { food: i32, water: i32 },
    #[error("stage inconsistency: {0}")]
    Forecast(#[from] WeatherError),
    #[error("stage inconsistency: {0}")]
    Graph(#[from] GraphError),
}

impl TravelError {
    const fn too_large(amount: Supplies) -> Self {
        Self::AmountTooLarge {
            food: amount.food,
            water: amount.water,
        }
    }

    /// Whether the error points at a broken stage rather than a bad request.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Forecast(_) | Self::Graph(_))
    }
}

/// Scalar traveler state; one value per timeline snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TravelerState {
    pub date: u32,
    pub position: String,
    /// Remaining carrying capacity; negative means overloaded.
    pub load_space: i32,
    pub money: i32,
    pub food: i32,
    pub water: i32,
    pub ok: bool,
    /// The next purchase is still charged at base price.
    pub first_buy: bool,
}

impl TravelerState {
    /// Lifecycle defaults for `stage`: day 0 at the start node, empty pack.
    #[must_use]
    pub fn initial(stage: &Stage) -> Self {
        Self {
            date: 0,
            position: stage.start_id().to_string(),
            load_space: stage.load_capacity(),
            money: stage.base_budget(),
            food: 0,
            water: 0,
            ok: true,
            first_buy: true,
        }
    }

    #[must_use]
    pub const fn supplies(&self) -> Supplies {
        Supplies::new(self.food, self.water)
    }

    fn consume(&mut self, stage: &Stage, intensity: i32) -> Result<Supplies, WeatherError> {
        let day = stage.accounting().consumption_day(self.date)?;
        let weather = stage.weather().at(day)?;
        let economy = stage.economy();
        let used = economy.consumption(weather, intensity);
        self.food -= used.food;
        self.water -= used.water;
        let capacity = stage.load_capacity();
        if self.load_space < capacity {
            let freed = economy.weight_of(&used).unwrap_or(capacity);
            self.load_space = self.load_space.saturating_add(freed).min(capacity);
        }
        Ok(used)
    }

    fn stay(&mut self, stage: &Stage) -> Result<(), WeatherError> {
        self.consume(stage, STAY_INTENSITY)?;
        self.date += 1;
        Ok(())
    }

    fn travel(&mut self, stage: &Stage, destination: &str) -> Result<(), TravelError> {
        if !stage.graph().contains(destination) {
            return Err(TravelError::UnknownNode(destination.to_string()));
        }
        let mut remaining = stage
            .graph()
            .neighbor_distance(&self.position, destination)?;
        while remaining > 0 {
            if stage.weather().at(self.date)?.blocks_travel() {
                self.consume(stage, STAY_INTENSITY)?;
            } else {
                self.consume(stage, TRAVEL_INTENSITY)?;
                remaining -= 1;
            }
            self.date += 1;
        }
        self.position = destination.to_string();
        Ok(())
    }

    fn mine(&mut self, stage: &Stage) -> Result<(), TravelError> {
        if stage.kind_of(&self.position) != Some(NodeKind::Mine) {
            return Err(TravelError::NotAtMine(self.position.clone()));
        }
        self.consume(stage, MINING_INTENSITY)?;
        self.money += stage.base_income();
        self.date += 1;
        Ok(())
    }

    fn buy(&mut self, stage: &Stage, amount: Supplies) -> Result<Purchase, TravelError> {
        let too_large = || TravelError::too_large(amount);
        let purchase = stage
            .economy()
            .quote(amount, self.first_buy)
            .ok_or_else(too_large)?;
        let money = self.money.checked_sub(purchase.cost).ok_or_else(too_large)?;
        let load_space = self
            .load_space
            .checked_sub(purchase.weight)
            .ok_or_else(too_large)?;
        let food = self.food.checked_add(amount.food).ok_or_else(too_large)?;
        let water = self.water.checked_add(amount.water).ok_or_else(too_large)?;
        self.money = money;
        self.load_space = load_space;
        self.food = food;
        self.water = water;
        self.first_buy = false;
        Ok(purchase)
    }

    fn check(&mut self, stage: &Stage) -> bool {
        let day_count = stage.day_count();
        let in_time = self.date < day_count
            || (self.date == day_count && self.position == stage.end_id());
        self.ok = in_time && self.load_space >= 0;
        self.ok
    }
}

/// Optional overrides for the initial traveler state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelerSetup {
    #[serde(default)]
    pub date: u32,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub money: Option<i32>,
    #[serde(default)]
    pub food: i32,
    #[serde(default)]
    pub water: i32,
    /// The first-purchase price has already been used up.
    #[serde(default)]
    pub first_buy_used: bool,
}

/// Live traveler bound to its stage.
#[derive(Debug, Clone)]
pub struct Traveler {
    stage: Rc<Stage>,
    state: TravelerState,
}

impl Traveler {
    #[must_use]
    pub fn new(stage: Rc<Stage>) -> Self {
        let state = TravelerState::initial(&stage);
        Self { stage, state }
    }

    /// Create a traveler with setup overrides applied.
    ///
    /// Initial food and water take up load space.
    ///
    /// # Errors
    ///
    /// Returns [`TravelError::UnknownNode`] when the starting position is not
    /// part of the stage, and [`TravelError::AmountTooLarge`] when the pack
    /// weight does not fit the load space arithmetic.
    pub fn with_setup(stage: Rc<Stage>, setup: &TravelerSetup) -> Result<Self, TravelError> {
        let mut state = TravelerState::initial(&stage);
        if let Some(position) = &setup.position {
            if !stage.graph().contains(position) {
                return Err(TravelError::UnknownNode(position.clone()));
            }
            state.position.clone_from(position);
        }
        if let Some(money) = setup.money {
            state.money = money;
        }
        let pack = Supplies::new(setup.food, setup.water);
        state.date = setup.date;
        state.food = pack.food;
        state.water = pack.water;
        state.load_space = stage
            .economy()
            .weight_of(&pack)
            .and_then(|weight| state.load_space.checked_sub(weight))
            .ok_or_else(|| TravelError::too_large(pack))?;
        state.first_buy = !setup.first_buy_used;
        Ok(Self { stage, state })
    }

    /// Bind an existing state to a stage.
    #[must_use]
    pub const fn from_state(stage: Rc<Stage>, state: TravelerState) -> Self {
        Self { stage, state }
    }

    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    #[must_use]
    pub fn shared_stage(&self) -> Rc<Stage> {
        Rc::clone(&self.stage)
    }

    #[must_use]
    pub const fn state(&self) -> &TravelerState {
        &self.state
    }

    /// Value copy of the scalar state.
    #[must_use]
    pub fn snapshot(&self) -> TravelerState {
        self.state.clone()
    }

    /// Overwrite the scalar state; the stage is left alone.
    pub fn restore(&mut self, snapshot: &TravelerState) {
        self.state.clone_from(snapshot);
    }

    #[must_use]
    pub const fn date(&self) -> u32 {
        self.state.date
    }

    #[must_use]
    pub fn position(&self) -> &str {
        &self.state.position
    }

    #[must_use]
    pub const fn load_space(&self) -> i32 {
        self.state.load_space
    }

    #[must_use]
    pub const fn money(&self) -> i32 {
        self.state.money
    }

    #[must_use]
    pub const fn food(&self) -> i32 {
        self.state.food
    }

    #[must_use]
    pub const fn water(&self) -> i32 {
        self.state.water
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.state.ok
    }

    #[must_use]
    pub const fn first_buy(&self) -> bool {
        self.state.first_buy
    }

    /// Forecast for the current date, if the forecast reaches it.
    #[must_use]
    pub fn weather_ahead(&self) -> Option<Weather> {
        self.stage.weather().get(self.state.date)
    }

    /// Recompute and store the validity flag.
    ///
    /// Running out of time away from the end node, or carrying more than the
    /// capacity, invalidates the run. Food and water deficits do not.
    pub fn check_state(&mut self) -> bool {
        self.state.check(&self.stage)
    }

    /// Spend one day in place at stay intensity.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`TravelError::Forecast`] when the forecast does not
    /// cover the day; the traveler is left unchanged.
    pub fn stay(&mut self) -> Result<(), TravelError> {
        let mut next = self.state.clone();
        next.stay(&self.stage)?;
        self.state = next;
        Ok(())
    }

    /// Travel to `destination`, one day per unit of distance.
    ///
    /// Sandstorm days cost stay intensity and make no progress; every other
    /// day costs travel intensity and covers one unit.
    ///
    /// # Errors
    ///
    /// Returns [`TravelError::UnknownNode`] for an unknown destination and a
    /// fatal [`TravelError::Forecast`] when the trip runs past the forecast.
    /// The traveler is unchanged on error.
    pub fn move_to(&mut self, destination: &str) -> Result<(), TravelError> {
        let mut next = self.state.clone();
        next.travel(&self.stage, destination)?;
        self.state = next;
        Ok(())
    }

    /// Spend one day mining for the stage's base income.
    ///
    /// # Errors
    ///
    /// Returns [`TravelError::NotAtMine`] away from a mine node.
    pub fn mine(&mut self) -> Result<(), TravelError> {
        let mut next = self.state.clone();
        next.mine(&self.stage)?;
        self.state = next;
        Ok(())
    }

    /// Buy supplies. The first purchase of a run is at base price, every later
    /// one at double.
    ///
    /// # Errors
    ///
    /// Returns [`TravelError::AmountTooLarge`] when the cost, weight or new
    /// totals overflow; the traveler is unchanged.
    pub fn buy(&mut self, food: i32, water: i32) -> Result<Purchase, TravelError> {
        self.state.buy(&self.stage, Supplies::new(food, water))
    }

    /// Status table without the validity banner.
    #[must_use]
    pub fn status_table(&self) -> String {
        let state = &self.state;
        format!(
            "| Date | Position | Load Space |  Money  | Food | Water |\n|{:6}|{:>10}|{:12}|{:9}|{:6}|{:7}|",
            state.date, state.position, state.load_space, state.money, state.food, state.water
        )
    }
}

impl fmt::Display for Traveler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.state.ok { "Ok" } else { "Error" };
        writeln!(f, "State: {status}")?;
        if let Some(weather) = self.weather_ahead() {
            writeln!(f, "Weather Tomorrow: {weather}")?;
        }
        f.write_str(&self.status_table())
    }
}
