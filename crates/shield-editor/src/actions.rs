use crate::effects::Effect;
use crate::store::Store;
use shield_model::{
    CanvasError, ConsumerModel, LevelId, NodeId, NodeKind, ShieldData,
    Vec2,
};
use std::path::PathBuf;

/// Undoable edits of one shield worksheet
#[derive(Debug, Clone, PartialEq)]
pub enum ShieldEdit {
    /// Replace every field, consumers included (dialog "OK")
    Replace(Box<ShieldData>),
    /// Set the demand, simultaneity and diversity factors
    SetFactors {
        demand_ratio: f64,
        simultaneity_factor: f64,
        diversity_factor: f64,
    },
    /// Set the protection selection parameters
    SetProtection {
        current_threshold: f64,
        low_current_factor: f64,
        high_current_factor: f64,
    },
    AddConsumer(ConsumerModel),
    UpdateConsumer {
        index: usize,
        consumer: ConsumerModel,
    },
    RemoveConsumer { index: usize },
    MoveConsumer { from: usize, to: usize },
    /// Refresh consumer currents and panel totals
    Recalculate,
}

impl ShieldEdit {
    pub fn apply(self, data: &mut ShieldData) -> Result<(), CanvasError> {
        match self {
            ShieldEdit::Replace(new_data) => {
                *data = *new_data;
            }
            ShieldEdit::SetFactors {
                demand_ratio,
                simultaneity_factor,
                diversity_factor,
            } => {
                data.demand_ratio = demand_ratio;
                data.simultaneity_factor = simultaneity_factor;
                data.diversity_factor = diversity_factor;
            }
            ShieldEdit::SetProtection {
                current_threshold,
                low_current_factor,
                high_current_factor,
            } => {
                data.current_threshold = current_threshold;
                data.low_current_factor = low_current_factor;
                data.high_current_factor = high_current_factor;
            }
            ShieldEdit::AddConsumer(consumer) => {
                data.add_consumer(consumer);
            }
            ShieldEdit::UpdateConsumer { index, consumer } => {
                data.update_consumer(index, consumer)?;
            }
            ShieldEdit::RemoveConsumer { index } => {
                data.remove_consumer(index)?;
            }
            ShieldEdit::MoveConsumer { from, to } => {
                data.move_consumer(from, to)?;
            }
            ShieldEdit::Recalculate => {
                data.recalculate();
            }
        }
        Ok(())
    }
}

/// Actions that can be dispatched to modify the editor state
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // Node Actions
    /// Add a node; a blank name falls back to the kind's default
    AddNode {
        kind: NodeKind,
        name: String,
        position: Vec2,
    },
    /// Remove a node and every connection touching it
    RemoveNode { id: NodeId },
    RenameNode { id: NodeId, new_name: String },
    MoveNode { id: NodeId, position: Vec2 },
    /// Change variant parameters such as transformer radii
    ReshapeNode { id: NodeId, kind: NodeKind },

    // Connection Actions
    AddConnection { from: NodeId, to: NodeId },
    /// Remove a connection (by index)
    RemoveConnection { index: usize },
    RemoveConnectionsBetween { from: NodeId, to: NodeId },

    // Level Line Actions
    AddLevel { y: f32 },
    MoveLevel { id: LevelId, y: f32 },
    RemoveLevel { id: LevelId },

    // Camera Actions
    Pan { delta: Vec2 },
    ZoomAt { pointer: Vec2, delta: f32 },
    ResetView,

    // Worksheet Actions
    /// Choose the shield whose worksheet is open
    SelectShield { id: Option<NodeId> },
    EditShield { id: NodeId, edit: ShieldEdit },
    UndoShield { id: NodeId },
    RedoShield { id: NodeId },
    /// Recalculate every worksheet (not undoable)
    RecalculateAll,

    // File Operations
    NewProject,
    /// Save to the path the project was last saved to or loaded from
    Save,
    /// Save current project to file
    SaveToFile { path: PathBuf },
    /// Load project from file
    LoadFromFile { path: PathBuf },
    /// Clear any error message
    ClearErrorMessage,
}

/// Apply a single action to the store, returning deferred effects
pub fn update(store: &mut Store, action: Action) -> Vec<Effect> {
    let result = apply(store, action);
    match result {
        Ok(effects) => effects,
        Err(e) => {
            tracing::warn!(error = %e, "action rejected");
            store.error_message = Some(e.to_string());
            vec![]
        }
    }
}

fn apply(
    store: &mut Store,
    action: Action,
) -> Result<Vec<Effect>, CanvasError> {
    match action {
        // Node Actions
        Action::AddNode {
            kind,
            name,
            position,
        } => {
            store.add_node(kind, &name, position)?;
        }
        Action::RemoveNode { id } => {
            store.remove_node(id)?;
        }
        Action::RenameNode { id, new_name } => {
            store.canvas.rename_node(id, new_name)?;
            store.modified = true;
        }
        Action::MoveNode { id, position } => {
            store.canvas.move_node(id, position)?;
            store.modified = true;
        }
        Action::ReshapeNode { id, kind } => {
            store.canvas.reshape_node(id, kind)?;
            store.modified = true;
        }

        // Connection Actions
        Action::AddConnection { from, to } => {
            store.canvas.add_connection(from, to);
            store.modified = true;
        }
        Action::RemoveConnection { index } => {
            store.canvas.remove_connection(index)?;
            store.modified = true;
        }
        Action::RemoveConnectionsBetween { from, to } => {
            if store.canvas.remove_connections_between(from, to) > 0 {
                store.modified = true;
            }
        }

        // Level Line Actions
        Action::AddLevel { y } => {
            store.canvas.add_level(y)?;
            store.modified = true;
        }
        Action::MoveLevel { id, y } => {
            store.canvas.move_level(id, y)?;
            store.modified = true;
        }
        Action::RemoveLevel { id } => {
            store.canvas.remove_level(id)?;
            store.modified = true;
        }

        // Camera Actions
        Action::Pan { delta } => {
            store.canvas.pan(delta);
        }
        Action::ZoomAt { pointer, delta } => {
            store.canvas.zoom_at(pointer, delta);
        }
        Action::ResetView => {
            let mut camera = *store.canvas.camera();
            camera.reset_view();
            store.canvas.set_camera(camera);
        }

        // Worksheet Actions
        Action::SelectShield { id } => {
            store.select_shield(id)?;
        }
        Action::EditShield { id, edit } => {
            store.edit_shield(id, |data| edit.apply(data))?;
        }
        Action::UndoShield { id } => {
            store.undo_shield(id);
        }
        Action::RedoShield { id } => {
            store.redo_shield(id);
        }
        Action::RecalculateAll => {
            store.recalculate_all();
        }

        // File Operations
        Action::NewProject => {
            store.new_project();
        }
        Action::Save => match store.project_path.clone() {
            Some(path) => return Ok(vec![Effect::SaveToFile { path }]),
            None => {
                store.error_message =
                    Some(String::from("project has not been saved yet"));
            }
        },
        Action::SaveToFile { path } => {
            return Ok(vec![Effect::SaveToFile { path }]);
        }
        Action::LoadFromFile { path } => {
            return Ok(vec![Effect::LoadFromFile { path }]);
        }
        Action::ClearErrorMessage => {
            store.error_message = None;
        }
    }
    Ok(vec![])
}
