use crate::serialization::{self, ConnectionRecord, ProjectError};
use crate::settings::EditorSettings;
use crate::topology::Topology;
use crate::versioned::Versioned;
use serde::Serialize;
use shield_model::{
    CanvasError, HistoryManager, NodeId, NodeKind, ProjectCanvasState,
    ProjectDocument, RemovedNode, ShieldData, ShieldStorage, Vec2,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

/// The active project and everything the editor keeps alongside it.
pub struct Store {
    pub canvas: ProjectCanvasState,
    pub shields: Versioned<ShieldStorage>,
    pub settings: EditorSettings,
    pub project_path: Option<PathBuf>,
    pub active_shield: Option<NodeId>,
    pub error_message: Option<String>,
    pub modified: bool,
    histories: HashMap<NodeId, HistoryManager>,
    // Bumped whenever the canvas is replaced wholesale, since a decoded
    // canvas starts its revision count from zero again.
    generation: u64,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

impl Store {
    pub fn new(settings: EditorSettings) -> Self {
        let settings = settings.sanitized();
        Self {
            canvas: ProjectCanvasState::with_camera(
                settings.camera.to_camera(),
            ),
            shields: Versioned::new(ShieldStorage::new()),
            settings,
            project_path: None,
            active_shield: None,
            error_message: None,
            modified: false,
            histories: HashMap::new(),
            generation: 0,
        }
    }

    /// Number of times the canvas has been replaced wholesale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cache key for anything derived from the canvas.
    pub fn canvas_key(&self) -> (u64, u64) {
        (self.generation, self.canvas.revision())
    }

    // ------------------------------------------------------------------
    // Project lifecycle
    // ------------------------------------------------------------------

    pub fn new_project(&mut self) {
        self.canvas.reset();
        self.shields.set(ShieldStorage::new());
        self.histories.clear();
        self.generation = self.generation.wrapping_add(1);
        self.project_path = None;
        self.active_shield = None;
        self.error_message = None;
        self.modified = false;
        tracing::info!("new project");
    }

    /// Makes `document` the active project, dropping all undo history.
    pub fn replace_document(&mut self, document: ProjectDocument) {
        let ProjectDocument { canvas, shields } = document;
        self.canvas = canvas;
        self.shields.set(shields);
        self.histories.clear();
        self.generation = self.generation.wrapping_add(1);
        self.active_shield = None;
        self.modified = false;
    }

    pub fn document(&self) -> ProjectDocument {
        ProjectDocument::new(self.canvas.clone(), self.shields.get().clone())
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Adds a node, naming it after its kind when `name` is blank. A
    /// shield gets an empty worksheet carrying the same name.
    pub fn add_node(
        &mut self,
        kind: NodeKind,
        name: &str,
        position: Vec2,
    ) -> Result<NodeId, CanvasError> {
        let name = if name.trim().is_empty() {
            kind.default_name().to_string()
        } else {
            name.to_string()
        };
        let id = self.canvas.add_node(kind, name.clone(), position)?;
        if kind.is_shield() {
            self.shields.get_mut().insert(id, ShieldData::new(name));
        }
        self.modified = true;
        Ok(id)
    }

    /// Removes a node and its connections. Its worksheet, if any, stays
    /// in the store but is no longer written on save.
    pub fn remove_node(
        &mut self,
        id: NodeId,
    ) -> Result<RemovedNode, CanvasError> {
        let removed = self.canvas.remove_node(id)?;
        if self.active_shield == Some(id) {
            self.active_shield = None;
        }
        self.modified = true;
        Ok(removed)
    }

    pub fn select_shield(
        &mut self,
        id: Option<NodeId>,
    ) -> Result<(), CanvasError> {
        if let Some(id) = id {
            self.require_shield(id)?;
        }
        self.active_shield = id;
        Ok(())
    }

    fn require_shield(&self, id: NodeId) -> Result<&str, CanvasError> {
        let node =
            self.canvas.node(id).ok_or(CanvasError::UnknownNode(id))?;
        if !node.is_shield() {
            return Err(CanvasError::NotAShield(id));
        }
        Ok(&node.name)
    }

    // ------------------------------------------------------------------
    // Worksheets and history
    // ------------------------------------------------------------------

    /// Applies an undoable edit to a shield's worksheet.
    ///
    /// The edit runs on a working copy; only when it succeeds is the
    /// previous worksheet pushed onto the shield's history and the copy
    /// committed. A failed edit leaves both untouched.
    pub fn edit_shield<R>(
        &mut self,
        id: NodeId,
        edit: impl FnOnce(&mut ShieldData) -> Result<R, CanvasError>,
    ) -> Result<R, CanvasError> {
        let name = self.require_shield(id)?.to_string();
        let current = self
            .shields
            .get()
            .get(id)
            .cloned()
            .unwrap_or_else(|| ShieldData::new(name));

        let mut working = current.clone();
        let output = edit(&mut working)?;

        self.history_mut(id).push_state(&current);
        self.shields.get_mut().insert(id, working);
        self.modified = true;
        Ok(output)
    }

    /// Steps the shield's worksheet back one edit. False when there is
    /// nothing to undo.
    pub fn undo_shield(&mut self, id: NodeId) -> bool {
        let Some(history) = self.histories.get_mut(&id) else {
            return false;
        };
        if !history.can_undo() {
            return false;
        }
        let Some(data) = self.shields.get_mut().get_mut(id) else {
            return false;
        };
        let undone = history.undo(data);
        self.modified |= undone;
        undone
    }

    pub fn redo_shield(&mut self, id: NodeId) -> bool {
        let Some(history) = self.histories.get_mut(&id) else {
            return false;
        };
        if !history.can_redo() {
            return false;
        }
        let Some(data) = self.shields.get_mut().get_mut(id) else {
            return false;
        };
        let redone = history.redo(data);
        self.modified |= redone;
        redone
    }

    pub fn history(&self, id: NodeId) -> Option<&HistoryManager> {
        self.histories.get(&id)
    }

    fn history_mut(&mut self, id: NodeId) -> &mut HistoryManager {
        let max = self.settings.history.max_history_size;
        self.histories
            .entry(id)
            .or_insert_with(|| HistoryManager::new(max))
    }

    /// Refreshes computed values of every stored worksheet. Not undoable.
    pub fn recalculate_all(&mut self) -> usize {
        let mut count = 0;
        for (_, data) in self.shields.get_mut().iter_mut() {
            data.recalculate();
            count += 1;
        }
        if count > 0 {
            self.modified = true;
        }
        tracing::debug!(worksheets = count, "worksheets recalculated");
        count
    }

    // ------------------------------------------------------------------
    // File operations
    // ------------------------------------------------------------------

    pub fn save_to_file(&mut self, path: &Path) -> Result<(), ProjectError> {
        serialization::save_to_file(
            &self.canvas,
            self.shields.get(),
            path,
            self.settings.project.pretty,
        )?;
        self.project_path = Some(path.to_path_buf());
        self.modified = false;
        tracing::info!(
            path = %path.display(),
            nodes = self.canvas.nodes().len(),
            connections = self.canvas.connections().len(),
            "project saved"
        );
        Ok(())
    }

    /// Loads a project. On any failure the current project is kept as
    /// it was.
    pub fn load_from_file(
        &mut self,
        path: &Path,
    ) -> Result<(), ProjectError> {
        let camera = self.settings.camera.to_camera();
        match serialization::load_from_file(path, camera) {
            Ok(document) => {
                self.replace_document(document);
                self.project_path = Some(path.to_path_buf());
                self.error_message = None;
                tracing::info!(
                    path = %path.display(),
                    nodes = self.canvas.nodes().len(),
                    connections = self.canvas.connections().len(),
                    worksheets = self.shields.get().len(),
                    "project loaded"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "load failed, keeping current project"
                );
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Derived data
    // ------------------------------------------------------------------

    pub fn topology_uncached(&self) -> Topology {
        Topology::from_canvas(&self.canvas)
    }

    pub fn summary_uncached(&self) -> ProjectSummary {
        ProjectSummary::build(&self.canvas, self.shields.get())
    }
}

/// Counts and totals describing one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub nodes: usize,
    pub nodes_by_kind: BTreeMap<&'static str, usize>,
    pub connections: usize,
    pub levels: usize,
    pub worksheets: usize,
    pub consumers: usize,
    pub installed_power_kw: f64,
    pub calculated_power_kw: f64,
    pub dangling_connections: Vec<ConnectionRecord>,
}

impl ProjectSummary {
    /// Worksheet figures cover live shield nodes only.
    pub fn build(
        canvas: &ProjectCanvasState,
        shields: &ShieldStorage,
    ) -> Self {
        let topology = Topology::from_canvas(canvas);
        let live: Vec<&ShieldData> = topology
            .shield_ids()
            .into_iter()
            .filter_map(|id| shields.get(id))
            .collect();

        Self {
            nodes: topology.node_count(),
            nodes_by_kind: topology.kind_counts().into_iter().collect(),
            connections: canvas.connections().len(),
            levels: canvas.levels().len(),
            worksheets: live.len(),
            consumers: live.iter().map(|s| s.consumer_count()).sum(),
            installed_power_kw: live
                .iter()
                .map(|s| s.installed_power)
                .sum(),
            calculated_power_kw: live
                .iter()
                .map(|s| s.calculated_power)
                .sum(),
            dangling_connections: topology
                .dangling_connections()
                .iter()
                .map(|c| ConnectionRecord {
                    from_id: c.from.0,
                    to_id: c.to.0,
                })
                .collect(),
        }
    }
}

impl fmt::Display for ProjectSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nodes:        {}", self.nodes)?;
        for (kind, count) in &self.nodes_by_kind {
            writeln!(f, "  {:<12}{}", kind, count)?;
        }
        writeln!(f, "connections:  {}", self.connections)?;
        writeln!(f, "levels:       {}", self.levels)?;
        writeln!(f, "worksheets:   {}", self.worksheets)?;
        writeln!(f, "consumers:    {}", self.consumers)?;
        writeln!(f, "installed:    {:.2} kW", self.installed_power_kw)?;
        write!(f, "calculated:   {:.2} kW", self.calculated_power_kw)?;
        if !self.dangling_connections.is_empty() {
            writeln!(f)?;
            write!(f, "dangling:    ")?;
            for c in &self.dangling_connections {
                write!(f, " {}->{}", c.from_id, c.to_id)?;
            }
        }
        Ok(())
    }
}
