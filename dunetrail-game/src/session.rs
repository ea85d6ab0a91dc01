use std::rc::Rc;
use thiserror::Error;

use crate::economy::Purchase;
use crate::stage::Stage;
use crate::timeline::{CommandEntry, Timeline, TimelineError};
use crate::traveler::{TravelError, Traveler, TravelerSetup};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExpeditionError {
    #[error(transparent)]
    Travel(#[from] TravelError),
    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

impl ExpeditionError {
    /// Whether the error points at a broken stage rather than a bad request.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Travel(err) => err.is_fatal(),
            Self::Timeline(_) => false,
        }
    }
}

/// High-level session binding one traveler to its history.
///
/// Every successful state change is validated and pushed as a new snapshot;
/// failed commands leave both the traveler and the history untouched.
#[derive(Debug, Clone)]
pub struct Expedition {
    traveler: Traveler,
    timeline: Timeline,
}

impl Expedition {
    /// Start a session with a fresh traveler at the stage's start node.
    #[must_use]
    pub fn new(stage: Rc<Stage>) -> Self {
        Self::from_traveler(Traveler::new(stage))
    }

    /// Start a session with setup overrides applied.
    ///
    /// # Errors
    ///
    /// Returns [`TravelError::UnknownNode`] for an unknown starting position.
    pub fn with_setup(stage: Rc<Stage>, setup: &TravelerSetup) -> Result<Self, TravelError> {
        Traveler::with_setup(stage, setup).map(Self::from_traveler)
    }

    /// Bind a session to an existing traveler; its state becomes the first snapshot.
    #[must_use]
    pub fn from_traveler(mut traveler: Traveler) -> Self {
        traveler.check_state();
        let timeline = Timeline::new(traveler.snapshot());
        Self { traveler, timeline }
    }

    #[must_use]
    pub const fn traveler(&self) -> &Traveler {
        &self.traveler
    }

    #[must_use]
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    #[must_use]
    pub fn stage(&self) -> &Stage {
        self.traveler.stage()
    }

    /// Walk every hop of `route` in order.
    ///
    /// # Errors
    ///
    /// Fails when the traveler is stranded, the route is empty, or any hop
    /// fails. A failing hop aborts the whole route.
    pub fn travel<S: AsRef<str>>(&mut self, route: &[S]) -> Result<&Traveler, ExpeditionError> {
        self.ensure_ok()?;
        if route.is_empty() {
            return Err(TravelError::EmptyRoute.into());
        }
        let mut scratch = self.traveler.clone();
        for hop in route {
            scratch.move_to(hop.as_ref())?;
        }
        self.traveler = scratch;
        Ok(self.commit())
    }

    /// Wait one day in place.
    ///
    /// # Errors
    ///
    /// Fails when the traveler is stranded or the forecast runs out.
    pub fn stay(&mut self) -> Result<&Traveler, ExpeditionError> {
        self.ensure_ok()?;
        self.traveler.stay()?;
        Ok(self.commit())
    }

    /// Mine for one day.
    ///
    /// # Errors
    ///
    /// Fails when the traveler is stranded, not at a mine, or the forecast
    /// runs out.
    pub fn mine(&mut self) -> Result<&Traveler, ExpeditionError> {
        self.ensure_ok()?;
        self.traveler.mine()?;
        Ok(self.commit())
    }

    /// Buy supplies at the current position.
    ///
    /// # Errors
    ///
    /// Fails when the traveler is stranded or the amount is too large to
    /// price.
    pub fn buy(&mut self, food: i32, water: i32) -> Result<Purchase, ExpeditionError> {
        self.ensure_ok()?;
        let purchase = self.traveler.buy(food, water)?;
        self.commit();
        Ok(purchase)
    }

    /// # Errors
    ///
    /// Returns [`TimelineError::NoOlderState`] at the first snapshot.
    pub fn undo(&mut self) -> Result<&Traveler, ExpeditionError> {
        let state = self.timeline.undo()?;
        self.traveler.restore(state);
        Ok(&self.traveler)
    }

    /// # Errors
    ///
    /// Returns [`TimelineError::NoNewerState`] at the newest snapshot.
    pub fn redo(&mut self) -> Result<&Traveler, ExpeditionError> {
        let state = self.timeline.redo()?;
        self.traveler.restore(state);
        Ok(&self.traveler)
    }

    /// # Errors
    ///
    /// See [`Timeline::undo_to_date`].
    pub fn undo_to_date(&mut self, date: u32) -> Result<&Traveler, ExpeditionError> {
        let state = self.timeline.undo_to_date(date)?;
        self.traveler.restore(state);
        Ok(&self.traveler)
    }

    /// # Errors
    ///
    /// See [`Timeline::redo_to_date`].
    pub fn redo_to_date(&mut self, date: u32) -> Result<&Traveler, ExpeditionError> {
        let state = self.timeline.redo_to_date(date)?;
        self.traveler.restore(state);
        Ok(&self.traveler)
    }

    /// Label the most recent transition; see [`Timeline::record_command`].
    pub fn record_command(&mut self, label: &str) -> bool {
        self.timeline.record_command(label)
    }

    pub fn history(&self) -> impl Iterator<Item = CommandEntry<'_>> + '_ {
        self.timeline.commands()
    }

    fn ensure_ok(&self) -> Result<(), TravelError> {
        if self.traveler.is_ok() {
            Ok(())
        } else {
            Err(TravelError::Stranded)
        }
    }

    fn commit(&mut self) -> &Traveler {
        let ok = self.traveler.check_state();
        self.timeline.push(self.traveler.snapshot());
        log::debug!(
            "day {} at {}: ok={ok}",
            self.traveler.date(),
            self.traveler.position()
        );
        &self.traveler
    }
}
