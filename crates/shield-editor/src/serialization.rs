use serde::{Deserialize, Serialize};
use shield_model::canvas::MAX_ID;
use shield_model::{
    Camera, Connection, LevelId, LevelLine, NodeId, NodeKind,
    ProjectCanvasState, ProjectDocument, ProjectNode, ShieldData,
    ShieldStorage, Vec2,
};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const PROJECT_FILE_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt project file: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("failed to encode project: {0}")]
    Encode(serde_json::Error),
    #[error("shield data key {0:?} is not a node id")]
    NonNumericShieldKey(String),
    #[error("node id {0} appears more than once")]
    DuplicateNodeId(NodeId),
    #[error(
        "project file version {0} is newer than supported version {max}",
        max = PROJECT_FILE_VERSION
    )]
    UnsupportedVersion(u32),
    #[error("id {0} is outside the usable id range")]
    IdOutOfRange(u32),
    #[error("{0} is not a finite number")]
    NonFinite(String),
}

impl ProjectError {
    /// True for problems with the file's content rather than with
    /// reading or writing it.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ProjectError::Corrupt(_)
                | ProjectError::NonNumericShieldKey(_)
                | ProjectError::DuplicateNodeId(_)
                | ProjectError::UnsupportedVersion(_)
                | ProjectError::IdOutOfRange(_)
        )
    }
}

// ------------------------------------------------------------------
// Serialization structures
// ------------------------------------------------------------------

fn default_version() -> u32 {
    PROJECT_FILE_VERSION
}

fn default_scale() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum NodeRecord {
    Shield {
        id: u32,
        name: String,
        x: f32,
        y: f32,
    },
    PowerSource {
        id: u32,
        name: String,
        x: f32,
        y: f32,
    },
    Transformer {
        id: u32,
        name: String,
        x: f32,
        y: f32,
        radius_outer: f32,
        radius_inner: f32,
    },
    Generator {
        id: u32,
        name: String,
        x: f32,
        y: f32,
        radius: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub from_id: u32,
    pub to_id: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelRecord {
    pub id: u32,
    pub y_position: f32,
}

impl NodeRecord {
    fn id(&self) -> u32 {
        match self {
            NodeRecord::Shield { id, .. }
            | NodeRecord::PowerSource { id, .. }
            | NodeRecord::Transformer { id, .. }
            | NodeRecord::Generator { id, .. } => *id,
        }
    }

    /// Numeric fields with their file keys.
    fn numbers(&self) -> Vec<(&'static str, f32)> {
        match *self {
            NodeRecord::Shield { x, y, .. }
            | NodeRecord::PowerSource { x, y, .. } => {
                vec![("x", x), ("y", y)]
            }
            NodeRecord::Transformer {
                x,
                y,
                radius_outer,
                radius_inner,
                ..
            } => vec![
                ("x", x),
                ("y", y),
                ("radiusOuter", radius_outer),
                ("radiusInner", radius_inner),
            ],
            NodeRecord::Generator { x, y, radius, .. } => {
                vec![("x", x), ("y", y), ("radius", radius)]
            }
        }
    }
}

/// On-disk shape of a project. Unknown keys are ignored on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub offset_x: f32,
    #[serde(default)]
    pub offset_y: f32,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
    #[serde(default)]
    pub levels: Vec<LevelRecord>,
    /// Keyed by node id as a decimal string.
    #[serde(default)]
    pub shields_data: BTreeMap<String, ShieldData>,
}

impl ProjectFile {
    /// JSON has no NaN or infinity; serde_json would write them as
    /// `null` and the file would no longer load.
    pub fn check_finite(&self) -> Result<(), ProjectError> {
        use ProjectError::NonFinite;
        for (key, value) in [
            ("scale", self.scale),
            ("offsetX", self.offset_x),
            ("offsetY", self.offset_y),
        ] {
            if !value.is_finite() {
                return Err(NonFinite(key.to_string()));
            }
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let Some((key, _)) =
                node.numbers().into_iter().find(|(_, v)| !v.is_finite())
            {
                return Err(NonFinite(format!("nodes[{i}].{key}")));
            }
        }
        for (i, level) in self.levels.iter().enumerate() {
            if !level.y_position.is_finite() {
                return Err(NonFinite(format!("levels[{i}].yPosition")));
            }
        }
        for (key, data) in &self.shields_data {
            if let Some(field) = data.non_finite_field() {
                let path = format!("shieldsData[{key}].{field}");
                return Err(NonFinite(path));
            }
        }
        Ok(())
    }
}

// ------------------------------------------------------------------
// Serialization conversion functions
// ------------------------------------------------------------------

fn node_to_record(node: &ProjectNode) -> NodeRecord {
    let id = node.id.0;
    let name = node.name.clone();
    let Vec2 { x, y } = node.position;
    match node.kind {
        NodeKind::Shield => NodeRecord::Shield { id, name, x, y },
        NodeKind::PowerSource => {
            NodeRecord::PowerSource { id, name, x, y }
        }
        NodeKind::Transformer {
            radius_outer,
            radius_inner,
        } => NodeRecord::Transformer {
            id,
            name,
            x,
            y,
            radius_outer,
            radius_inner,
        },
        NodeKind::Generator { radius } => NodeRecord::Generator {
            id,
            name,
            x,
            y,
            radius,
        },
    }
}

fn record_to_node(record: NodeRecord) -> ProjectNode {
    let (id, name, x, y, kind) = match record {
        NodeRecord::Shield { id, name, x, y } => {
            (id, name, x, y, NodeKind::Shield)
        }
        NodeRecord::PowerSource { id, name, x, y } => {
            (id, name, x, y, NodeKind::PowerSource)
        }
        NodeRecord::Transformer {
            id,
            name,
            x,
            y,
            radius_outer,
            radius_inner,
        } => (
            id,
            name,
            x,
            y,
            NodeKind::Transformer {
                radius_outer,
                radius_inner,
            },
        ),
        NodeRecord::Generator {
            id,
            name,
            x,
            y,
            radius,
        } => (id, name, x, y, NodeKind::Generator { radius }),
    };
    ProjectNode::new(NodeId(id), name, Vec2::new(x, y), kind)
}

/// Builds the on-disk representation. Only worksheets belonging to live
/// shield nodes are written.
pub fn document_to_serializable(
    canvas: &ProjectCanvasState,
    shields: &ShieldStorage,
) -> ProjectFile {
    let camera = canvas.camera();

    let nodes = canvas.nodes().iter().map(node_to_record).collect();

    let connections = canvas
        .connections()
        .iter()
        .map(|c| ConnectionRecord {
            from_id: c.from.0,
            to_id: c.to.0,
        })
        .collect();

    let levels = canvas
        .levels()
        .iter()
        .map(|l| LevelRecord {
            id: l.id.0,
            y_position: l.y,
        })
        .collect();

    let shields_data = canvas
        .shield_ids()
        .filter_map(|id| {
            shields.get(id).map(|data| (id.to_string(), data.clone()))
        })
        .collect();

    ProjectFile {
        version: PROJECT_FILE_VERSION,
        scale: camera.zoom(),
        offset_x: camera.offset().x,
        offset_y: camera.offset().y,
        nodes,
        connections,
        levels,
        shields_data,
    }
}

/// Rebuilds a document from its on-disk representation. `camera`
/// supplies the zoom bounds; its view is replaced by the file's.
///
/// Connection and level endpoints are not checked against the node set.
pub fn serializable_to_document(
    file: ProjectFile,
    mut camera: Camera,
) -> Result<ProjectDocument, ProjectError> {
    if file.version > PROJECT_FILE_VERSION {
        return Err(ProjectError::UnsupportedVersion(file.version));
    }

    // Ids above MAX_ID would leave the canvas unable to mint.
    let ids = file.nodes.iter().map(NodeRecord::id);
    let level_ids = file.levels.iter().map(|l| l.id);
    if let Some(id) = ids.chain(level_ids).find(|&id| id > MAX_ID) {
        return Err(ProjectError::IdOutOfRange(id));
    }

    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(file.nodes.len());
    for record in file.nodes {
        let node = record_to_node(record);
        if !seen.insert(node.id) {
            return Err(ProjectError::DuplicateNodeId(node.id));
        }
        nodes.push(node);
    }

    let connections = file
        .connections
        .iter()
        .map(|c| Connection::new(NodeId(c.from_id), NodeId(c.to_id)))
        .collect();

    let levels = file
        .levels
        .iter()
        .map(|l| LevelLine::new(LevelId(l.id), l.y_position))
        .collect();

    let mut shields = ShieldStorage::new();
    for (key, data) in file.shields_data {
        let id = key
            .parse::<u32>()
            .map_err(|_| ProjectError::NonNumericShieldKey(key.clone()))?;
        shields.insert(NodeId(id), data);
    }

    camera.set_zoom(file.scale);
    camera.set_offset(Vec2::new(file.offset_x, file.offset_y));

    let canvas =
        ProjectCanvasState::from_parts(nodes, connections, levels, camera);
    Ok(ProjectDocument::new(canvas, shields))
}

pub fn encode_project(
    canvas: &ProjectCanvasState,
    shields: &ShieldStorage,
    pretty: bool,
) -> Result<String, ProjectError> {
    let file = document_to_serializable(canvas, shields);
    file.check_finite()?;
    let json = if pretty {
        serde_json::to_string_pretty(&file)
    } else {
        serde_json::to_string(&file)
    };
    json.map_err(ProjectError::Encode)
}

/// Parses a whole project. Nothing outside the returned document is
/// touched, so a failure leaves the caller's state as it was.
pub fn decode_project(
    json: &str,
    camera: Camera,
) -> Result<ProjectDocument, ProjectError> {
    let file: ProjectFile = serde_json::from_str(json)?;
    serializable_to_document(file, camera)
}

// ------------------------------------------------------------------
// File I/O operations
// ------------------------------------------------------------------

/// Writes the project through a sibling temporary file renamed over
/// `path`, so the destination holds either the old or the new content.
pub fn save_to_file(
    canvas: &ProjectCanvasState,
    shields: &ShieldStorage,
    path: &Path,
    pretty: bool,
) -> Result<(), ProjectError> {
    let json = encode_project(canvas, shields, pretty)?;

    let tmp_path = temp_path(path);
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        file.sync_all()?;
    }
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        std::fs::remove_file(&tmp_path).ok();
        return Err(e.into());
    }

    tracing::debug!(
        path = %path.display(),
        bytes = json.len(),
        "project written"
    );
    Ok(())
}

pub fn load_from_file(
    path: &Path,
    camera: Camera,
) -> Result<ProjectDocument, ProjectError> {
    let json = std::fs::read_to_string(path)?;
    decode_project(&json, camera)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------
