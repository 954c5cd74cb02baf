use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Identifier of a diagram node, unique within one document.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a level line. Minted from the same counter as node ids
/// but never compared against them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct LevelId(pub u32);

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const DEFAULT_TRANSFORMER_RADIUS_OUTER: f32 = 30.0;
pub const DEFAULT_TRANSFORMER_RADIUS_INNER: f32 = 20.0;
pub const DEFAULT_GENERATOR_RADIUS: f32 = 25.0;

/// Variant payload of a diagram node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Shield,
    PowerSource,
    /// `radius_outer > radius_inner` by convention only.
    Transformer {
        radius_outer: f32,
        radius_inner: f32,
    },
    Generator {
        radius: f32,
    },
}

impl NodeKind {
    pub const fn transformer() -> Self {
        NodeKind::Transformer {
            radius_outer: DEFAULT_TRANSFORMER_RADIUS_OUTER,
            radius_inner: DEFAULT_TRANSFORMER_RADIUS_INNER,
        }
    }

    pub const fn generator() -> Self {
        NodeKind::Generator {
            radius: DEFAULT_GENERATOR_RADIUS,
        }
    }

    /// Tag written to the `type` field of a project file.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Shield => "shield",
            NodeKind::PowerSource => "power_source",
            NodeKind::Transformer { .. } => "transformer",
            NodeKind::Generator { .. } => "generator",
        }
    }

    /// Name given to freshly placed nodes.
    pub fn default_name(&self) -> &'static str {
        match self {
            NodeKind::Shield => "Shield",
            NodeKind::PowerSource => "Power source",
            NodeKind::Transformer { .. } => "Transformer",
            NodeKind::Generator { .. } => "Generator",
        }
    }

    pub fn is_shield(&self) -> bool {
        matches!(self, NodeKind::Shield)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectNode {
    pub id: NodeId,
    pub name: String,
    pub position: Vec2,
    pub kind: NodeKind,
}

impl ProjectNode {
    pub fn new(
        id: NodeId,
        name: impl Into<String>,
        position: Vec2,
        kind: NodeKind,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            kind,
        }
    }

    pub fn is_shield(&self) -> bool {
        self.kind.is_shield()
    }
}

/// Directed link between two nodes. Duplicates and self-links are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    pub from: NodeId,
    pub to: NodeId,
}

impl Connection {
    pub const fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }

    pub fn touches(&self, id: NodeId) -> bool {
        self.from == id || self.to == id
    }
}

/// Horizontal reference line on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelLine {
    pub id: LevelId,
    pub y: f32,
}

impl LevelLine {
    pub const fn new(id: LevelId, y: f32) -> Self {
        Self { id, y }
    }
}
