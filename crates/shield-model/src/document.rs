use crate::canvas::ProjectCanvasState;
use crate::storage::ShieldStorage;

/// A whole project: the diagram plus every panel worksheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectDocument {
    pub canvas: ProjectCanvasState,
    pub shields: ShieldStorage,
}

impl ProjectDocument {
    pub fn new(canvas: ProjectCanvasState, shields: ShieldStorage) -> Self {
        Self { canvas, shields }
    }

    /// Consumers across all worksheets.
    pub fn consumer_count(&self) -> usize {
        self.shields
            .iter()
            .map(|(_, shield)| shield.consumer_count())
            .sum()
    }
}
