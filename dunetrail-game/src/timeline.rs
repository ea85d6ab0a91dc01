//! Undo/redo history of traveler snapshots.
//!
//! Snapshots form a single line with a cursor on the active one. Pushing
//! while the cursor is behind the tail drops everything ahead of it, so there
//! is never more than one redo branch.
use thiserror::Error;

use crate::constants::HISTORY_EXEMPT_PREFIXES;
use crate::traveler::TravelerState;

/// Errors raised by history navigation. The cursor never moves on error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimelineError {
    #[error("no older states")]
    NoOlderState,
    #[error("no newer states")]
    NoNewerState,
    #[error("invalid date {0}")]
    InvalidDate(u32),
}

/// One labelled transition for [`Timeline::commands`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry<'a> {
    /// 1-based index of the transition.
    pub number: usize,
    pub label: &'a str,
}

#[derive(Debug, Clone)]
pub struct Timeline {
    cursor: usize,
    snapshots: Vec<TravelerState>,
    /// Slot `i` labels the transition from snapshot `i` into `i + 1`.
    commands: Vec<Option<String>>,
}

impl Timeline {
    /// Start a history whose only entry is `initial`.
    #[must_use]
    pub fn new(initial: TravelerState) -> Self {
        Self {
            cursor: 0,
            snapshots: vec![initial],
            commands: Vec::new(),
        }
    }

    /// Record `state` as the newest snapshot, discarding any redo states.
    pub fn push(&mut self, state: TravelerState) {
        self.cursor += 1;
        self.snapshots.truncate(self.cursor);
        self.commands.truncate(self.cursor - 1);
        self.snapshots.push(state);
        self.commands.push(None);
        log::debug!(
            "timeline push: cursor {} of {}",
            self.cursor,
            self.snapshots.len()
        );
    }

    /// Label the transition into the current snapshot.
    ///
    /// Navigation and inspection commands are never recorded, and neither is
    /// anything while the cursor sits on the initial snapshot. Returns whether
    /// the label was stored.
    pub fn record_command(&mut self, label: &str) -> bool {
        if HISTORY_EXEMPT_PREFIXES
            .iter()
            .any(|prefix| label.starts_with(prefix))
        {
            return false;
        }
        let Some(slot) = self
            .cursor
            .checked_sub(1)
            .and_then(|index| self.commands.get_mut(index))
        else {
            return false;
        };
        *slot = Some(label.to_string());
        true
    }

    /// Step back one snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::NoOlderState`] at the initial snapshot.
    pub fn undo(&mut self) -> Result<&TravelerState, TimelineError> {
        if self.cursor == 0 {
            return Err(TimelineError::NoOlderState);
        }
        self.seek(self.cursor - 1)
    }

    /// Step forward one snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::NoNewerState`] at the newest snapshot.
    pub fn redo(&mut self) -> Result<&TravelerState, TimelineError> {
        if self.at_tail() {
            return Err(TimelineError::NoNewerState);
        }
        self.seek(self.cursor + 1)
    }

    /// Move back to the nearest snapshot dated `date`, starting at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::NoOlderState`] at the initial snapshot and
    /// [`TimelineError::InvalidDate`] when no earlier snapshot has that date.
    pub fn undo_to_date(&mut self, date: u32) -> Result<&TravelerState, TimelineError> {
        if self.cursor == 0 {
            return Err(TimelineError::NoOlderState);
        }
        let index = self.snapshots[..=self.cursor]
            .iter()
            .rposition(|state| state.date == date)
            .ok_or(TimelineError::InvalidDate(date))?;
        self.seek(index)
    }

    /// Move forward to the nearest snapshot dated `date`, starting at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::NoNewerState`] at the newest snapshot and
    /// [`TimelineError::InvalidDate`] when no later snapshot has that date.
    pub fn redo_to_date(&mut self, date: u32) -> Result<&TravelerState, TimelineError> {
        if self.at_tail() {
            return Err(TimelineError::NoNewerState);
        }
        let offset = self.snapshots[self.cursor..]
            .iter()
            .position(|state| state.date == date)
            .ok_or(TimelineError::InvalidDate(date))?;
        self.seek(self.cursor + offset)
    }

    fn seek(&mut self, index: usize) -> Result<&TravelerState, TimelineError> {
        log::debug!("timeline seek: {} -> {}", self.cursor, index);
        self.cursor = index;
        Ok(&self.snapshots[index])
    }

    /// Labelled transitions leading up to the cursor, oldest first.
    pub fn commands(&self) -> impl Iterator<Item = CommandEntry<'_>> + '_ {
        self.commands[..self.cursor]
            .iter()
            .enumerate()
            .filter_map(|(slot, label)| {
                label.as_deref().map(|label| CommandEntry {
                    number: slot + 1,
                    label,
                })
            })
    }

    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn current(&self) -> &TravelerState {
        &self.snapshots[self.cursor]
    }

    #[must_use]
    pub fn snapshots(&self) -> &[TravelerState] {
        &self.snapshots
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false; a timeline holds at least its initial snapshot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    fn at_tail(&self) -> bool {
        self.cursor + 1 == self.snapshots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(date: u32, position: &str) -> TravelerState {
        TravelerState {
            date,
            position: position.to_string(),
            load_space: 10,
            money: 100,
            food: 0,
            water: 0,
            ok: true,
            first_buy: true,
        }
    }

    fn walked() -> Timeline {
        let mut timeline = Timeline::new(state(0, "a"));
        for (date, position) in [(1, "b"), (2, "c"), (3, "d")] {
            timeline.push(state(date, position));
            assert!(timeline.record_command(&format!("go {position}")));
        }
        timeline
    }

    #[test]
    fn push_then_undo_returns_previous_state() {
        let mut timeline = Timeline::new(state(0, "a"));
        timeline.push(state(1, "b"));
        assert_eq!(timeline.undo().unwrap(), &state(0, "a"));
        assert_eq!(timeline.cursor(), 0);
        assert_eq!(timeline.undo(), Err(TimelineError::NoOlderState));
    }

    #[test]
    fn undo_then_redo_is_a_round_trip() {
        let mut timeline = walked();
        let before = timeline.current().clone();
        timeline.undo().unwrap();
        assert_eq!(timeline.redo().unwrap(), &before);
        assert_eq!(timeline.redo(), Err(TimelineError::NoNewerState));
    }

    #[test]
    fn push_after_undo_discards_redo_branch() {
        let mut timeline = walked();
        timeline.undo().unwrap();
        timeline.undo().unwrap();
        timeline.push(state(2, "x"));
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline.redo(), Err(TimelineError::NoNewerState));
        let labels: Vec<_> = timeline.commands().map(|entry| entry.label).collect();
        assert_eq!(labels, ["go b"]);
    }

    #[test]
    fn date_seeks_scan_from_cursor() {
        let mut timeline = walked();
        assert_eq!(timeline.undo_to_date(3).unwrap().position, "d");
        assert_eq!(timeline.cursor(), 3);

        assert_eq!(timeline.undo_to_date(1).unwrap().position, "b");
        assert_eq!(timeline.undo_to_date(7), Err(TimelineError::InvalidDate(7)));
        assert_eq!(timeline.cursor(), 1);

        assert_eq!(timeline.redo_to_date(3).unwrap().position, "d");
        assert_eq!(timeline.redo_to_date(1), Err(TimelineError::NoNewerState));
    }

    #[test]
    fn redo_to_missing_date_leaves_cursor() {
        let mut timeline = walked();
        timeline.undo_to_date(0).unwrap();
        assert_eq!(timeline.redo_to_date(9), Err(TimelineError::InvalidDate(9)));
        assert_eq!(timeline.cursor(), 0);
        assert_eq!(timeline.undo_to_date(0), Err(TimelineError::NoOlderState));
    }

    #[test]
    fn exempt_and_initial_labels_are_dropped() {
        let mut timeline = Timeline::new(state(0, "a"));
        assert!(!timeline.record_command("stay"));
        timeline.push(state(1, "a"));
        assert!(!timeline.record_command("undo"));
        assert!(!timeline.record_command("history"));
        assert!(!timeline.record_command("logs"));
        assert!(timeline.record_command("stay"));
        assert_eq!(timeline.commands().count(), 1);
    }

    #[test]
    fn commands_stop_at_cursor_and_skip_unlabelled() {
        let mut timeline = Timeline::new(state(0, "a"));
        timeline.push(state(1, "b"));
        timeline.push(state(2, "c"));
        timeline.record_command("go c");
        timeline.push(state(3, "d"));
        timeline.record_command("go d");

        let entries: Vec<_> = timeline.commands().collect();
        assert_eq!(
            entries,
            [
                CommandEntry { number: 2, label: "go c" },
                CommandEntry { number: 3, label: "go d" },
            ]
        );

        timeline.undo().unwrap();
        assert_eq!(timeline.commands().count(), 1);
    }
}
