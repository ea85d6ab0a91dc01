//! Stage definitions: the sectioned text format, its JSON twin, and assembly
//! into a [`Stage`].
//!
//! A stage file is a list of `- <section>` headers, each followed by lines
//! in that section's shape:
//!
//! ```text
//! - day count
//! 30
//! - weight & base price
//! water:3:5
//! food:2:10
//! - base cost
//! sun:water:5
//! - special node
//! st:s
//! - adjacent relation
//! st:a,b
//! - path weight
//! st,a:2
//! - weather
//! sun,high,sand
//! ```
//!
//! Blank lines are ignored. Lines under an unknown header are skipped with a
//! warning so older stage files keep loading.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

use crate::economy::Resource;
use crate::graph::{Graph, NodeKind};
use crate::stage::{Stage, StageError, StageSettings};
use crate::weather::{Weather, WeatherTimeline};

/// Explicit distance between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathWeight {
    pub a: String,
    pub b: String,
    pub distance: u32,
}

/// Raw stage contents before graph assembly and validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    #[serde(default)]
    pub settings: StageSettings,
    /// Declared node count; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_count: Option<usize>,
    #[serde(default)]
    pub special: BTreeMap<String, NodeKind>,
    #[serde(default)]
    pub adjacency: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub path_weights: Vec<PathWeight>,
    #[serde(default)]
    pub weather: Vec<Weather>,
}

/// Errors raised while reading a stage definition.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("section '{section}' line {line}: {reason} (`{text}`)")]
    Malformed {
        section: &'static str,
        line: usize,
        text: String,
        reason: String,
    },
    #[error("invalid stage JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Stage(#[from] StageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    DayCount,
    Load,
    BaseBudget,
    BaseIncome,
    WeightAndPrice,
    BaseCost,
    NodeCount,
    Special,
    Adjacency,
    Weather,
    PathWeight,
}

impl Section {
    fn from_header(name: &str) -> Option<Self> {
        match name {
            "day count" => Some(Self::DayCount),
            "load" => Some(Self::Load),
            "base budget" => Some(Self::BaseBudget),
            "base income" => Some(Self::BaseIncome),
            "weight & base price" => Some(Self::WeightAndPrice),
            "base cost" => Some(Self::BaseCost),
            "node count" => Some(Self::NodeCount),
            "special node" => Some(Self::Special),
            "adjacent relation" | "adjacent releation" => Some(Self::Adjacency),
            "weather" => Some(Self::Weather),
            "path weight" => Some(Self::PathWeight),
            _ => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::DayCount => "day count",
            Self::Load => "load",
            Self::BaseBudget => "base budget",
            Self::BaseIncome => "base income",
            Self::WeightAndPrice => "weight & base price",
            Self::BaseCost => "base cost",
            Self::NodeCount => "node count",
            Self::Special => "special node",
            Self::Adjacency => "adjacent relation",
            Self::Weather => "weather",
            Self::PathWeight => "path weight",
        }
    }
}

fn number<T: FromStr>(text: &str) -> Result<T, String> {
    text.trim()
        .parse()
        .map_err(|_| format!("expected a number, got '{}'", text.trim()))
}

fn fields<const N: usize>(line: &str) -> Result<[&str; N], String> {
    let parts: Vec<&str> = line.split(':').map(str::trim).collect();
    <[&str; N]>::try_from(parts.as_slice())
        .map_err(|_| format!("expected {N} ':'-separated fields, got {}", parts.len()))
}

fn resource(code: &str) -> Result<Resource, String> {
    Resource::from_code(code).ok_or_else(|| format!("unknown resource type '{code}'"))
}

fn weather(code: &str) -> Result<Weather, String> {
    Weather::from_code(code).ok_or_else(|| format!("unknown weather type '{code}'"))
}

fn id_list(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|id| !id.is_empty())
}

impl StageDefinition {
    /// Parse the sectioned text format.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Malformed`] for the first line that does not fit
    /// its section.
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        let mut def = Self::default();
        let mut section: Option<Section> = None;
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(header) = line.strip_prefix("- ") {
                section = Section::from_header(header.trim());
                if section.is_none() {
                    log::warn!("unknown stage section '{}', skipping", header.trim());
                }
                continue;
            }
            let Some(current) = section else {
                continue;
            };
            def.apply_line(current, line)
                .map_err(|reason| LoadError::Malformed {
                    section: current.name(),
                    line: index + 1,
                    text: line.to_string(),
                    reason,
                })?;
        }
        Ok(def)
    }

    /// Parse the JSON rendition of a stage definition.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Json`] when the document does not match.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    fn apply_line(&mut self, section: Section, line: &str) -> Result<(), String> {
        let settings = &mut self.settings;
        match section {
            Section::DayCount => settings.day_count = number(line)?,
            Section::Load => settings.load_capacity = number(line)?,
            Section::BaseBudget => settings.base_budget = number(line)?,
            Section::BaseIncome => settings.base_income = number(line)?,
            Section::NodeCount => self.node_count = Some(number(line)?),
            Section::WeightAndPrice => {
                let [kind, weight, price] = fields::<3>(line)?;
                let kind = resource(kind)?;
                settings.economy.weight.set(kind, number(weight)?);
                settings.economy.base_price.set(kind, number(price)?);
            }
            Section::BaseCost => {
                let [sky, kind, cost] = fields::<3>(line)?;
                let sky = weather(sky)?;
                let kind = resource(kind)?;
                settings.economy.base_cost.row_mut(sky).set(kind, number(cost)?);
            }
            Section::Special => {
                let [id, code] = fields::<2>(line)?;
                let kind =
                    NodeKind::from_code(code).ok_or_else(|| format!("unknown node type '{code}'"))?;
                self.special.insert(id.to_string(), kind);
            }
            Section::Adjacency => {
                let [id, neighbors] = fields::<2>(line)?;
                if id.is_empty() {
                    return Err("missing node id".to_string());
                }
                self.adjacency
                    .entry(id.to_string())
                    .or_default()
                    .extend(id_list(neighbors).map(str::to_string));
            }
            Section::Weather => {
                for code in id_list(line) {
                    self.weather.push(weather(code)?);
                }
            }
            Section::PathWeight => {
                let [pair, distance] = fields::<2>(line)?;
                let ids: Vec<&str> = id_list(pair).collect();
                let [a, b] = <[&str; 2]>::try_from(ids.as_slice())
                    .map_err(|_| format!("expected two node ids, got {}", ids.len()))?;
                self.path_weights.push(PathWeight {
                    a: a.to_string(),
                    b: b.to_string(),
                    distance: number(distance)?,
                });
            }
        }
        Ok(())
    }

    /// Build the graph and validate the stage.
    ///
    /// # Errors
    ///
    /// Returns an error when a special node is not part of the graph, when
    /// start/end are missing or duplicated, or when the day count is zero.
    pub fn into_stage(self) -> Result<Stage, StageError> {
        let mut graph = Graph::new();
        for (id, neighbors) in &self.adjacency {
            graph.add_node(id);
            for neighbor in neighbors {
                graph.add_edge(id, neighbor);
            }
        }
        for (id, kind) in &self.special {
            graph.set_kind(id, *kind)?;
        }
        for weight in &self.path_weights {
            graph.set_distance(&weight.a, &weight.b, weight.distance);
        }
        if let Some(declared) = self.node_count
            && declared != graph.len()
        {
            log::warn!(
                "stage declares {declared} nodes but its graph has {}",
                graph.len()
            );
        }
        Stage::assemble(self.settings, graph, WeatherTimeline::new(self.weather))
    }
}

/// Parse and assemble a stage from the sectioned text format.
///
/// # Errors
///
/// Returns an error when parsing or assembly fails.
pub fn parse_stage(text: &str) -> Result<Stage, LoadError> {
    Ok(StageDefinition::parse(text)?.into_stage()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::Supplies;
    use crate::graph::GraphError;

    const SAMPLE: &str = "
- day count
10

- load
1200
- base budget
10000
- base income
1000
- weight & base price
water:3:5
food:2:10
- base cost
sun:water:5
sun:food:7
high:water:8
high:food:6
sand:water:10
sand:food:10
- node count
4
- special node
st:s
ed:e
m:m
- adjacent releation
st:m,ed
m:ed
- path weight
st,ed:3
- weather
sun,high,sand
sun, sun ,high
";

    #[test]
    fn parses_every_section() {
        let def = StageDefinition::parse(SAMPLE).unwrap();
        let settings = def.settings;
        assert_eq!(settings.day_count, 10);
        assert_eq!(settings.load_capacity, 1200);
        assert_eq!(settings.base_budget, 10000);
        assert_eq!(settings.base_income, 1000);
        assert_eq!(settings.economy.weight, Supplies::new(2, 3));
        assert_eq!(settings.economy.base_price, Supplies::new(10, 5));
        assert_eq!(settings.economy.base_cost.row(Weather::HighTemp), Supplies::new(6, 8));
        assert_eq!(def.node_count, Some(4));
        assert_eq!(def.special.get("m"), Some(&NodeKind::Mine));
        assert_eq!(def.adjacency["st"], vec!["m".to_string(), "ed".to_string()]);
        assert_eq!(def.weather.len(), 6);
        assert_eq!(def.weather[2], Weather::Sandstorm);
        assert_eq!(def.path_weights[0].distance, 3);
    }

    #[test]
    fn assembles_graph_with_weights() {
        let stage = parse_stage(SAMPLE).unwrap();
        assert_eq!(stage.start_id(), "st");
        assert_eq!(stage.end_id(), "ed");
        assert_eq!(stage.graph().neighbor_distance("ed", "st").unwrap(), 3);
        assert_eq!(stage.graph().neighbor_distance("st", "m").unwrap(), 1);
        assert!(stage.graph().node("ed").unwrap().is_neighbor("m"));
        assert_eq!(stage.weather().len(), 6);
    }

    #[test]
    fn malformed_line_reports_section_and_line() {
        let text = "- day count\n10\n- base cost\nsun:water\n";
        let err = StageDefinition::parse(text).unwrap_err();
        match err {
            LoadError::Malformed { section, line, .. } => {
                assert_eq!(section, "base cost");
                assert_eq!(line, 4);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unknown_weather_code_is_rejected() {
        let err = StageDefinition::parse("- weather\nsun,rain\n").unwrap_err();
        assert!(err.to_string().contains("unknown weather type 'rain'"));
    }

    #[test]
    fn unknown_sections_are_skipped() {
        let text = "junk before headers\n- mystery\n1:2:3\n- day count\n4\n";
        let def = StageDefinition::parse(text).unwrap();
        assert_eq!(def.settings.day_count, 4);
    }

    #[test]
    fn special_node_outside_graph_fails_assembly() {
        let text = "- day count\n3\n- special node\nst:s\nghost:e\n- adjacent relation\nst:a\n";
        let err = parse_stage(text).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Stage(StageError::Graph(GraphError::UnknownNode(ref id))) if id == "ghost"
        ));
    }

    #[test]
    fn json_definition_matches_text() {
        let def = StageDefinition::parse(SAMPLE).unwrap();
        let json = serde_json::to_string(&def).unwrap();
        let back = StageDefinition::from_json(&json).unwrap();
        assert_eq!(back, def);
        assert!(StageDefinition::from_json("{\"weather\": [\"Hail\"]}").is_err());
    }
}
