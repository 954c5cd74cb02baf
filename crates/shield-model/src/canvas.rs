use crate::camera::Camera;
use crate::error::CanvasError;
use crate::geometry::Vec2;
use crate::node::{
    Connection, LevelId, LevelLine, NodeId, NodeKind, ProjectNode,
};

/// First id handed out by a fresh (or reset) document.
pub const INITIAL_ID: u32 = 1;
/// Largest id the counter hands out. `u32::MAX` is never minted.
pub const MAX_ID: u32 = u32::MAX - 1;

/// Structural change recorded by every mutating call, drained by observers.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasChange {
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
    NodeRenamed(NodeId),
    NodeMoved(NodeId),
    NodeReshaped(NodeId),
    ConnectionAdded(Connection),
    ConnectionRemoved(Connection),
    LevelAdded(LevelId),
    LevelMoved(LevelId),
    LevelRemoved(LevelId),
    CameraChanged,
    Reset,
}

/// A node taken out of the document together with the connections that
/// referenced it, enough to put both back.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    pub node: ProjectNode,
    pub connections: Vec<Connection>,
}

/// The diagram document: nodes in insertion order, connections, level
/// lines, camera, and the id counter.
///
/// Ids are minted from a counter that only grows, so an id freed by a
/// removal is never handed to another node.
#[derive(Debug, Clone)]
pub struct ProjectCanvasState {
    nodes: Vec<ProjectNode>,
    connections: Vec<Connection>,
    levels: Vec<LevelLine>,
    camera: Camera,
    next_id: u32,
    revision: u64,
    changes: Vec<CanvasChange>,
}

impl Default for ProjectCanvasState {
    fn default() -> Self {
        Self::with_camera(Camera::default())
    }
}

// Revision and pending changes are bookkeeping, not document content.
impl PartialEq for ProjectCanvasState {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
            && self.connections == other.connections
            && self.levels == other.levels
            && self.camera == other.camera
            && self.next_id == other.next_id
    }
}

impl ProjectCanvasState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(camera: Camera) -> Self {
        Self {
            nodes: Vec::new(),
            connections: Vec::new(),
            levels: Vec::new(),
            camera,
            next_id: INITIAL_ID,
            revision: 0,
            changes: Vec::new(),
        }
    }

    /// Assembles a document from decoded parts. The counter resumes after
    /// the largest node or level id.
    pub fn from_parts(
        nodes: Vec<ProjectNode>,
        connections: Vec<Connection>,
        levels: Vec<LevelLine>,
        camera: Camera,
    ) -> Self {
        let max_id = nodes
            .iter()
            .map(|n| n.id.0)
            .chain(levels.iter().map(|l| l.id.0))
            .max();
        let next_id = match max_id {
            Some(id) => id.saturating_add(1).max(INITIAL_ID),
            None => INITIAL_ID,
        };
        Self {
            nodes,
            connections,
            levels,
            camera,
            next_id,
            revision: 0,
            changes: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn nodes(&self) -> &[ProjectNode] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn levels(&self) -> &[LevelLine] {
        &self.levels
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn node(&self, id: NodeId) -> Option<&ProjectNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn level(&self, id: LevelId) -> Option<&LevelLine> {
        self.levels.iter().find(|l| l.id == id)
    }

    pub fn shield_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().filter(|n| n.is_shield()).map(|n| n.id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.connections.is_empty()
            && self.levels.is_empty()
    }

    /// The id the next `add_node` / `add_level` will return.
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    /// Incremented once per mutating call.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Takes the changes recorded since the last drain.
    pub fn drain_changes(&mut self) -> Vec<CanvasChange> {
        std::mem::take(&mut self.changes)
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    pub fn add_node(
        &mut self,
        kind: NodeKind,
        name: impl Into<String>,
        position: Vec2,
    ) -> Result<NodeId, CanvasError> {
        let id = NodeId(self.mint_id()?);
        self.nodes.push(ProjectNode::new(id, name, position, kind));
        tracing::debug!(node = %id, kind = kind.tag(), "node added");
        self.record(CanvasChange::NodeAdded(id));
        Ok(id)
    }

    /// Removes a node and every connection touching it.
    pub fn remove_node(
        &mut self,
        id: NodeId,
    ) -> Result<RemovedNode, CanvasError> {
        let pos = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or(CanvasError::UnknownNode(id))?;
        let node = self.nodes.remove(pos);

        let mut connections = Vec::new();
        self.connections.retain(|c| {
            if c.touches(id) {
                connections.push(*c);
                false
            } else {
                true
            }
        });

        tracing::debug!(
            node = %id,
            connections = connections.len(),
            "node removed"
        );
        for c in &connections {
            self.changes.push(CanvasChange::ConnectionRemoved(*c));
        }
        self.record(CanvasChange::NodeRemoved(id));
        Ok(RemovedNode { node, connections })
    }

    pub fn rename_node(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
    ) -> Result<(), CanvasError> {
        self.node_mut(id)?.name = name.into();
        self.record(CanvasChange::NodeRenamed(id));
        Ok(())
    }

    pub fn move_node(
        &mut self,
        id: NodeId,
        position: Vec2,
    ) -> Result<(), CanvasError> {
        self.node_mut(id)?.position = position;
        self.record(CanvasChange::NodeMoved(id));
        Ok(())
    }

    /// Replaces the variant payload (e.g. transformer radii). The variant
    /// itself may not change.
    pub fn reshape_node(
        &mut self,
        id: NodeId,
        kind: NodeKind,
    ) -> Result<(), CanvasError> {
        let node = self.node_mut(id)?;
        if std::mem::discriminant(&node.kind)
            != std::mem::discriminant(&kind)
        {
            return Err(CanvasError::VariantMismatch(id));
        }
        node.kind = kind;
        self.record(CanvasChange::NodeReshaped(id));
        Ok(())
    }

    fn node_mut(
        &mut self,
        id: NodeId,
    ) -> Result<&mut ProjectNode, CanvasError> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(CanvasError::UnknownNode(id))
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    /// Appends a connection and returns its index. Endpoints are not
    /// checked against the node set.
    pub fn add_connection(&mut self, from: NodeId, to: NodeId) -> usize {
        let connection = Connection::new(from, to);
        self.connections.push(connection);
        self.record(CanvasChange::ConnectionAdded(connection));
        self.connections.len() - 1
    }

    pub fn remove_connection(
        &mut self,
        index: usize,
    ) -> Result<Connection, CanvasError> {
        if index >= self.connections.len() {
            return Err(CanvasError::ConnectionOutOfRange(index));
        }
        let connection = self.connections.remove(index);
        self.record(CanvasChange::ConnectionRemoved(connection));
        Ok(connection)
    }

    /// Removes every connection `from -> to`, returning how many went.
    pub fn remove_connections_between(
        &mut self,
        from: NodeId,
        to: NodeId,
    ) -> usize {
        let target = Connection::new(from, to);
        let before = self.connections.len();
        self.connections.retain(|c| *c != target);
        let removed = before - self.connections.len();
        if removed > 0 {
            for _ in 0..removed {
                self.changes.push(CanvasChange::ConnectionRemoved(target));
            }
            self.revision = self.revision.wrapping_add(1);
        }
        removed
    }

    // ------------------------------------------------------------------
    // Level lines
    // ------------------------------------------------------------------

    pub fn add_level(&mut self, y: f32) -> Result<LevelId, CanvasError> {
        let id = LevelId(self.mint_id()?);
        self.levels.push(LevelLine::new(id, y));
        self.record(CanvasChange::LevelAdded(id));
        Ok(id)
    }

    pub fn move_level(
        &mut self,
        id: LevelId,
        y: f32,
    ) -> Result<(), CanvasError> {
        let level = self
            .levels
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(CanvasError::UnknownLevel(id))?;
        level.y = y;
        self.record(CanvasChange::LevelMoved(id));
        Ok(())
    }

    pub fn remove_level(
        &mut self,
        id: LevelId,
    ) -> Result<LevelLine, CanvasError> {
        let pos = self
            .levels
            .iter()
            .position(|l| l.id == id)
            .ok_or(CanvasError::UnknownLevel(id))?;
        let level = self.levels.remove(pos);
        self.record(CanvasChange::LevelRemoved(id));
        Ok(level)
    }

    // ------------------------------------------------------------------
    // Camera
    // ------------------------------------------------------------------

    pub fn pan(&mut self, delta: Vec2) {
        self.camera.pan(delta);
        self.record(CanvasChange::CameraChanged);
    }

    pub fn zoom_at(&mut self, pointer: Vec2, delta: f32) {
        self.camera.zoom_at(pointer, delta);
        self.record(CanvasChange::CameraChanged);
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
        self.record(CanvasChange::CameraChanged);
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Empties the document and restarts the id counter. Camera bounds
    /// survive, the view does not.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.connections.clear();
        self.levels.clear();
        self.camera.reset_view();
        self.next_id = INITIAL_ID;
        self.changes.clear();
        self.record(CanvasChange::Reset);
    }

    fn mint_id(&mut self) -> Result<u32, CanvasError> {
        if self.next_id > MAX_ID {
            tracing::warn!(next_id = self.next_id, "id space exhausted");
            return Err(CanvasError::IdSpaceExhausted);
        }
        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }

    fn record(&mut self, change: CanvasChange) {
        self.revision = self.revision.wrapping_add(1);
        self.changes.push(change);
    }
}
