pub mod actions;
pub mod cache;
pub mod effects;
pub mod native;
pub mod serialization;
pub mod settings;
pub mod state;
pub mod store;
pub mod topology;
pub mod versioned;

pub use actions::{Action, ShieldEdit};
pub use effects::Effect;
pub use serialization::ProjectError;
pub use settings::EditorSettings;
pub use state::State;
pub use store::{ProjectSummary, Store};
pub use topology::Topology;
