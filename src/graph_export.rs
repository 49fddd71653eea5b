//! Dependency graph export for visualization and debugging.
//!
//! [`Registry::dependency_graph`] turns the current bindings into a
//! [`DependencyGraph`] that renders as Graphviz DOT or Mermaid, and, with the
//! `graph-export` feature, serializes to JSON or YAML for external tooling.

use std::collections::HashMap;
use std::fmt::Write as _;

#[cfg(feature = "graph-export")]
use serde::{Deserialize, Serialize};

use crate::descriptors::BindingDescriptor;
#[cfg(feature = "graph-export")]
use crate::error::RegistryError;
use crate::error::RegistryResult;
use crate::key::Key;
use crate::policy::Policy;
use crate::registry::Registry;
use crate::validation::{ValidationError, ValidationReport};

/// Graph format version written into [`GraphMetadata::version`].
pub const GRAPH_FORMAT_VERSION: &str = "1.0";

/// One bound type, or an unbound type that something depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphNode {
    /// Identifier used by edges; stable for a given registration order.
    pub id: String,
    /// Full type name
    pub type_name: String,
    /// Policy of the binding; `None` for a dependency with no binding.
    pub policy: Option<Policy>,
    /// Live tracked instances when the graph was taken
    pub live_instances: usize,
}

impl GraphNode {
    pub fn is_missing(&self) -> bool {
        self.policy.is_none()
    }
}

/// A declared dependency: `from` is built with a handle to `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    /// Position of the dependency in the constructor's argument list.
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphMetadata {
    pub binding_count: usize,
    pub exclusive_count: usize,
    pub per_request_count: usize,
    pub supplied_count: usize,
    /// Dependencies that have no binding
    pub missing_count: usize,
    pub has_circular_dependencies: bool,
    /// RFC 3339 timestamp; empty without the `graph-export` feature.
    pub exported_at: String,
    pub version: String,
}

/// Nodes and edges of a registry's binding graph.
///
/// # Examples
///
/// ```
/// use ferrous_registry::{Construct, Dep, Policy, Registry};
///
/// struct Config;
/// impl Construct for Config {
///     fn construct(_: ()) -> Self { Config }
/// }
///
/// struct Server { config: Dep<Config> }
/// impl Construct<(Config,)> for Server {
///     fn construct((config,): (Dep<Config>,)) -> Self { Server { config } }
/// }
///
/// let mut registry = Registry::new();
/// registry.register::<Config, ()>(Policy::Exclusive);
/// registry.register::<Server, (Config,)>(Policy::PerRequest);
///
/// let graph = registry.dependency_graph();
/// assert_eq!(graph.nodes.len(), 2);
/// assert_eq!(graph.edges.len(), 1);
///
/// let dot = graph.to_dot();
/// assert!(dot.starts_with("digraph Registry {"));
/// assert!(dot.contains("n1 -> n0"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub metadata: GraphMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Graphviz
    Dot,
    /// Mermaid flowchart, for markdown documentation
    Mermaid,
    #[cfg(feature = "graph-export")]
    Json,
    #[cfg(feature = "graph-export")]
    Yaml,
}

impl DependencyGraph {
    /// Builds the graph from binding descriptors. Bound types become nodes
    /// in descriptor order; unbound dependencies are appended after them.
    pub fn from_descriptors(descriptors: &[BindingDescriptor]) -> Self {
        let mut nodes: Vec<GraphNode> = Vec::with_capacity(descriptors.len());
        let mut ids: HashMap<Key, String> = HashMap::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let id = format!("n{}", nodes.len());
            ids.insert(descriptor.key, id.clone());
            nodes.push(GraphNode {
                id,
                type_name: descriptor.type_name().to_string(),
                policy: Some(descriptor.policy),
                live_instances: descriptor.live_instances,
            });
        }

        let mut edges = Vec::new();
        let mut missing_count = 0;
        for descriptor in descriptors {
            let from = ids[&descriptor.key].clone();
            for (position, dependency) in descriptor.dependencies.iter().enumerate() {
                let to = match ids.get(dependency) {
                    Some(id) => id.clone(),
                    None => {
                        let id = format!("n{}", nodes.len());
                        ids.insert(*dependency, id.clone());
                        nodes.push(GraphNode {
                            id: id.clone(),
                            type_name: dependency.display_name().to_string(),
                            policy: None,
                            live_instances: 0,
                        });
                        missing_count += 1;
                        id
                    }
                };
                edges.push(GraphEdge { from: from.clone(), to, position });
            }
        }

        let count = |policy: Policy| descriptors.iter().filter(|d| d.policy == policy).count();
        let has_circular_dependencies = ValidationReport::from_descriptors(descriptors)
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::CircularDependency { .. }));

        let metadata = GraphMetadata {
            binding_count: descriptors.len(),
            exclusive_count: count(Policy::Exclusive),
            per_request_count: count(Policy::PerRequest),
            supplied_count: count(Policy::Supplied),
            missing_count,
            has_circular_dependencies,
            exported_at: timestamp(),
            version: GRAPH_FORMAT_VERSION.to_string(),
        };

        DependencyGraph { nodes, edges, metadata }
    }

    pub fn node(&self, type_name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.type_name == type_name)
    }

    pub fn export(&self, format: ExportFormat) -> RegistryResult<String> {
        match format {
            ExportFormat::Dot => Ok(self.to_dot()),
            ExportFormat::Mermaid => Ok(self.to_mermaid()),
            #[cfg(feature = "graph-export")]
            ExportFormat::Json => self.to_json(),
            #[cfg(feature = "graph-export")]
            ExportFormat::Yaml => self.to_yaml(),
        }
    }

    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        out.push_str("digraph Registry {\n");
        out.push_str("  rankdir=TB;\n");
        out.push_str("  node [shape=box, style=filled];\n\n");

        for node in &self.nodes {
            let (label, color) = match node.policy {
                Some(policy) => (policy.as_str(), dot_color(policy)),
                None => ("unbound", "white"),
            };
            let style = if node.is_missing() { ", style=\"filled,dashed\"" } else { "" };
            let _ = writeln!(
                out,
                "  {} [label=\"{}\\n({})\", fillcolor={}{}];",
                node.id,
                escape_dot(&node.type_name),
                label,
                color,
                style
            );
        }

        out.push('\n');
        for edge in &self.edges {
            let _ = writeln!(out, "  {} -> {} [label=\"{}\"];", edge.from, edge.to, edge.position);
        }

        out.push_str("}\n");
        out
    }

    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for node in &self.nodes {
            let _ = writeln!(out, "  {}[\"{}\"]", node.id, escape_mermaid(&node.type_name));
        }
        for edge in &self.edges {
            let arrow = if self.is_missing_target(edge) { "-.->" } else { "-->" };
            let _ = writeln!(out, "  {} {} {}", edge.from, arrow, edge.to);
        }

        out.push_str("\n  classDef exclusive fill:#e1f5fe\n");
        out.push_str("  classDef perRequest fill:#fff3e0\n");
        out.push_str("  classDef supplied fill:#e8f5e8\n");
        out.push_str("  classDef unbound stroke-dasharray: 5 5\n");
        for node in &self.nodes {
            let class = match node.policy {
                Some(Policy::Exclusive) => "exclusive",
                Some(Policy::PerRequest) => "perRequest",
                Some(Policy::Supplied) => "supplied",
                None => "unbound",
            };
            let _ = writeln!(out, "  class {} {}", node.id, class);
        }

        out
    }

    #[cfg(feature = "graph-export")]
    pub fn to_json(&self) -> RegistryResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| RegistryError::Export(e.to_string()))
    }

    #[cfg(feature = "graph-export")]
    pub fn to_yaml(&self) -> RegistryResult<String> {
        serde_yaml::to_string(self).map_err(|e| RegistryError::Export(e.to_string()))
    }

    #[cfg(feature = "graph-export")]
    pub fn from_json(json: &str) -> RegistryResult<Self> {
        serde_json::from_str(json).map_err(|e| RegistryError::Export(e.to_string()))
    }

    fn is_missing_target(&self, edge: &GraphEdge) -> bool {
        self.nodes
            .iter()
            .any(|n| n.id == edge.to && n.is_missing())
    }
}

impl Registry {
    /// Snapshot of the binding graph.
    pub fn dependency_graph(&self) -> DependencyGraph {
        DependencyGraph::from_descriptors(&self.descriptors())
    }
}

fn dot_color(policy: Policy) -> &'static str {
    match policy {
        Policy::Exclusive => "lightblue",
        Policy::PerRequest => "lightyellow",
        Policy::Supplied => "lightgreen",
    }
}

fn escape_dot(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_mermaid(name: &str) -> String {
    name.replace('"', "#quot;")
        .replace('<', "#lt;")
        .replace('>', "#gt;")
}

#[cfg(feature = "graph-export")]
fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(not(feature = "graph-export"))]
fn timestamp() -> String {
    String::new()
}
