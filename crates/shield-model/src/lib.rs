pub mod camera;
pub mod canvas;
pub mod document;
pub mod electrical;
pub mod error;
pub mod geometry;
pub mod history;
pub mod node;
pub mod shield;
pub mod storage;

pub use camera::Camera;
pub use canvas::{CanvasChange, ProjectCanvasState, RemovedNode};
pub use document::ProjectDocument;
pub use error::CanvasError;
pub use geometry::Vec2;
pub use history::HistoryManager;
pub use node::{
    Connection, LevelId, LevelLine, NodeId, NodeKind, ProjectNode,
};
pub use shield::{ConsumerModel, ShieldData, ShieldSnapshot};
pub use storage::ShieldStorage;
