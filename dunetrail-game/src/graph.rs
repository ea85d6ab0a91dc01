//! Location graph: typed nodes, symmetric adjacency and distance overrides.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

use crate::constants::DEFAULT_EDGE_DISTANCE;

/// Category of a location, governing which actions are legal there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NodeKind {
    #[default]
    Normal,
    Village,
    Mine,
    Start,
    End,
}

impl NodeKind {
    /// Parse the single-letter code used by stage files (`s`, `e`, `v`, `m`).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "v" => Some(Self::Village),
            "m" => Some(Self::Mine),
            "s" => Some(Self::Start),
            "e" => Some(Self::End),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Village => "Village",
            Self::Mine => "Mine",
            Self::Start => "Start",
            Self::End => "End",
        }
    }

    /// Whether the kind is worth estimating travel costs toward.
    #[must_use]
    pub const fn is_destination(self) -> bool {
        matches!(self, Self::Village | Self::Mine | Self::End)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single location in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub neighbors: BTreeSet<String>,
    /// Explicit traversal distances keyed by neighbor id.
    #[serde(default)]
    pub distances: BTreeMap<String, u32>,
}

impl Node {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Normal,
            neighbors: BTreeSet::new(),
            distances: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn is_neighbor(&self, id: &str) -> bool {
        self.neighbors.contains(id)
    }
}

/// Errors raised by graph lookups and terminal resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("no such node with id '{0}'")]
    UnknownNode(String),
    #[error("stage has no {0} node")]
    MissingTerminal(NodeKind),
    #[error("stage has more than one {kind} node ('{first}' and '{second}')")]
    DuplicateTerminal {
        kind: NodeKind,
        first: String,
        second: String,
    },
}

/// Ids of the unique start and end nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminals {
    pub start: String,
    pub end: String,
}

/// Undirected location graph keyed by node id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    nodes: BTreeMap<String, Node>,
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node if absent and return it.
    pub fn add_node(&mut self, id: &str) -> &mut Node {
        self.nodes
            .entry(id.to_string())
            .or_insert_with(|| Node::new(id))
    }

    /// Connect two nodes in both directions, registering either if needed.
    pub fn add_edge(&mut self, a: &str, b: &str) {
        self.add_node(a).neighbors.insert(b.to_string());
        self.add_node(b).neighbors.insert(a.to_string());
    }

    /// Store an explicit distance for the pair, in both directions.
    ///
    /// Adjacency is left untouched.
    pub fn set_distance(&mut self, a: &str, b: &str, distance: u32) {
        self.add_node(a).distances.insert(b.to_string(), distance);
        self.add_node(b).distances.insert(a.to_string(), distance);
    }

    /// Assign a category to an existing node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] when `id` is not in the graph.
    pub fn set_kind(&mut self, id: &str, kind: NodeKind) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        node.kind = kind;
        Ok(())
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    #[must_use]
    pub fn kind_of(&self, id: &str) -> Option<NodeKind> {
        self.nodes.get(id).map(|node| node.kind)
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Distance from `from` to `to`: the stored override, else 1.
    ///
    /// `to` does not need to be a neighbor, or even a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] when `from` is not in the graph.
    pub fn neighbor_distance(&self, from: &str, to: &str) -> Result<u32, GraphError> {
        let node = self
            .nodes
            .get(from)
            .ok_or_else(|| GraphError::UnknownNode(from.to_string()))?;
        Ok(node
            .distances
            .get(to)
            .copied()
            .unwrap_or(DEFAULT_EDGE_DISTANCE))
    }

    /// Resolve the unique start and end nodes.
    ///
    /// # Errors
    ///
    /// Returns an error when either terminal is missing or duplicated.
    pub fn terminals(&self) -> Result<Terminals, GraphError> {
        let start = self.unique_of_kind(NodeKind::Start)?;
        let end = self.unique_of_kind(NodeKind::End)?;
        Ok(Terminals { start, end })
    }

    fn unique_of_kind(&self, kind: NodeKind) -> Result<String, GraphError> {
        let mut found = self.nodes.values().filter(|node| node.kind == kind);
        let first = found.next().ok_or(GraphError::MissingTerminal(kind))?;
        if let Some(second) = found.next() {
            return Err(GraphError::DuplicateTerminal {
                kind,
                first: first.id.clone(),
                second: second.id.clone(),
            });
        }
        Ok(first.id.clone())
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.nodes.values() {
            writeln!(f, "Node ID: {}", node.id)?;
            writeln!(f, "Node Type: {}", node.kind)?;
            write!(f, "Neighbors:")?;
            for neighbor in &node.neighbors {
                match node.distances.get(neighbor) {
                    Some(distance) => write!(f, " {neighbor}({distance})")?,
                    None => write!(f, " {neighbor}")?,
                }
            }
            writeln!(f)?;
            writeln!(f, "--------------------")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_graph() -> Graph {
        let mut graph = Graph::new();
        graph.add_edge("s", "a");
        graph.add_edge("a", "e");
        graph.set_kind("s", NodeKind::Start).unwrap();
        graph.set_kind("e", NodeKind::End).unwrap();
        graph
    }

    #[test]
    fn add_edge_is_symmetric_and_idempotent() {
        let mut graph = Graph::new();
        graph.add_edge("a", "b");
        graph.add_edge("a", "b");
        graph.add_edge("b", "a");

        assert_eq!(graph.len(), 2);
        assert!(graph.node("a").unwrap().is_neighbor("b"));
        assert!(graph.node("b").unwrap().is_neighbor("a"));
        assert_eq!(graph.node("a").unwrap().neighbors.len(), 1);
        assert_eq!(graph.kind_of("a"), Some(NodeKind::Normal));
    }

    #[test]
    fn distance_defaults_to_one_even_for_strangers() {
        let mut graph = line_graph();
        graph.set_distance("s", "a", 4);

        assert_eq!(graph.neighbor_distance("s", "a").unwrap(), 4);
        assert_eq!(graph.neighbor_distance("a", "s").unwrap(), 4);
        assert_eq!(graph.neighbor_distance("a", "e").unwrap(), 1);
        assert_eq!(graph.neighbor_distance("s", "e").unwrap(), 1);
        assert_eq!(graph.neighbor_distance("s", "nowhere").unwrap(), 1);
    }

    #[test]
    fn distance_from_unknown_node_fails() {
        let graph = line_graph();
        assert_eq!(
            graph.neighbor_distance("ghost", "s"),
            Err(GraphError::UnknownNode("ghost".to_string()))
        );
    }

    #[test]
    fn set_distance_does_not_create_adjacency() {
        let mut graph = Graph::new();
        graph.set_distance("x", "y", 3);
        assert!(graph.contains("x"));
        assert!(!graph.node("x").unwrap().is_neighbor("y"));
    }

    #[test]
    fn terminals_require_exactly_one_of_each() {
        let graph = line_graph();
        let terminals = graph.terminals().unwrap();
        assert_eq!(terminals.start, "s");
        assert_eq!(terminals.end, "e");

        let mut missing = Graph::new();
        missing.add_edge("s", "a");
        missing.set_kind("s", NodeKind::Start).unwrap();
        assert_eq!(
            missing.terminals(),
            Err(GraphError::MissingTerminal(NodeKind::End))
        );

        let mut doubled = line_graph();
        doubled.set_kind("a", NodeKind::Start).unwrap();
        assert!(matches!(
            doubled.terminals(),
            Err(GraphError::DuplicateTerminal {
                kind: NodeKind::Start,
                ..
            })
        ));
    }

    #[test]
    fn set_kind_rejects_unknown_node() {
        let mut graph = Graph::new();
        assert!(graph.set_kind("v1", NodeKind::Village).is_err());
    }

    #[test]
    fn node_codes_parse() {
        assert_eq!(NodeKind::from_code("m"), Some(NodeKind::Mine));
        assert_eq!(NodeKind::from_code("v"), Some(NodeKind::Village));
        assert_eq!(NodeKind::from_code("x"), None);
        assert!(NodeKind::End.is_destination());
        assert!(!NodeKind::Start.is_destination());
    }

    #[test]
    fn display_lists_nodes_and_weights() {
        let mut graph = line_graph();
        graph.set_distance("s", "a", 2);
        let text = graph.to_string();
        assert!(text.contains("Node ID: s"));
        assert!(text.contains("Node Type: Start"));
        assert!(text.contains("a(2)"));
    }
}
