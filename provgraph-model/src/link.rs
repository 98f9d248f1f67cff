//! Link semantics: directed, typed, labeled edges between nodes.
//!
//! A link type constrains the categories of the nodes it may connect.
//! The compatibility table is the whole of the computational semantics
//! this crate knows about.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The type of a provenance link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    /// Data consumed by a calculation.
    InputCalc,
    /// Data consumed by a workflow.
    InputWork,
    /// Data produced by a calculation.
    Create,
    /// Data returned by a workflow.
    Return,
    /// A workflow calling a calculation.
    CallCalc,
    /// A workflow calling a sub-workflow.
    CallWork,
}

impl LinkType {
    /// The wire name used in archives and the store.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LinkType::InputCalc => "input_calc",
            LinkType::InputWork => "input_work",
            LinkType::Create => "create",
            LinkType::Return => "return",
            LinkType::CallCalc => "call_calc",
            LinkType::CallWork => "call_work",
        }
    }

    /// Parses a wire name. Returns `None` for an unknown type.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "input_calc" => Some(LinkType::InputCalc),
            "input_work" => Some(LinkType::InputWork),
            "create" => Some(LinkType::Create),
            "return" => Some(LinkType::Return),
            "call_calc" => Some(LinkType::CallCalc),
            "call_work" => Some(LinkType::CallWork),
            _ => None,
        }
    }

    /// The (source, target) category pair this link type connects.
    #[must_use]
    pub const fn endpoint_categories(&self) -> (NodeCategory, NodeCategory) {
        match self {
            LinkType::InputCalc => (NodeCategory::Data, NodeCategory::Calculation),
            LinkType::InputWork => (NodeCategory::Data, NodeCategory::Workflow),
            LinkType::Create => (NodeCategory::Calculation, NodeCategory::Data),
            LinkType::Return => (NodeCategory::Workflow, NodeCategory::Data),
            LinkType::CallCalc => (NodeCategory::Workflow, NodeCategory::Calculation),
            LinkType::CallWork => (NodeCategory::Workflow, NodeCategory::Workflow),
        }
    }

    /// Whether this link type may connect the given source and target
    /// categories.
    #[must_use]
    pub fn connects(&self, source: NodeCategory, target: NodeCategory) -> bool {
        self.endpoint_categories() == (source, target)
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The coarse category of a node, derived from its dotted type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    Calculation,
    Workflow,
    Data,
}

impl NodeCategory {
    /// Derives the category from a dotted node type tag.
    ///
    /// Returns `None` for a tag outside the known hierarchies; such
    /// nodes cannot participate in links.
    #[must_use]
    pub fn of_node_type(node_type: &str) -> Option<Self> {
        if node_type.starts_with("process.calculation.") {
            Some(NodeCategory::Calculation)
        } else if node_type.starts_with("process.workflow.") {
            Some(NodeCategory::Workflow)
        } else if node_type.starts_with("data.") {
            Some(NodeCategory::Data)
        } else {
            None
        }
    }
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeCategory::Calculation => "calculation",
            NodeCategory::Workflow => "workflow",
            NodeCategory::Data => "data",
        };
        f.write_str(name)
    }
}
