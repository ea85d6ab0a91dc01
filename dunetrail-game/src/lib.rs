//! Dunetrail Travel Engine
//!
//! Platform-agnostic core of the Dunetrail desert-crossing simulation: a
//! traveler moving over a weighted graph under a daily weather forecast,
//! spending food and water, mining for money and buying supplies, with every
//! step recorded in an undo/redo timeline.
//!
//! The crate has no I/O of its own. Stages come in as text or JSON through
//! [`loader`], and the command shell lives in the `dunetrail-cli` crate.

pub mod constants;
pub mod economy;
pub mod estimate;
pub mod graph;
pub mod loader;
pub mod session;
pub mod stage;
pub mod timeline;
pub mod traveler;
pub mod weather;

// Re-export commonly used types
pub use economy::{EconomicModel, Purchase, Resource, Supplies, WeatherCosts};
pub use estimate::{ConsumptionReport, EstimateConfig, RouteEstimate, estimate_consumption};
pub use graph::{Graph, GraphError, Node, NodeKind, Terminals};
pub use loader::{LoadError, PathWeight, StageDefinition, parse_stage};
pub use session::{Expedition, ExpeditionError};
pub use stage::{AccountingMode, Stage, StageError, StageSettings};
pub use timeline::{CommandEntry, Timeline, TimelineError};
pub use traveler::{TravelError, Traveler, TravelerSetup, TravelerState};
pub use weather::{Weather, WeatherError, WeatherOdds, WeatherTimeline};
