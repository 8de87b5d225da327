pub mod config;
pub mod dims;
pub mod hit;
pub mod history;
pub mod sequencer;
pub mod store;
pub mod tools;

pub use config::EditorConfig;
pub use dims::DimensionState;
pub use hit::Hit;
pub use sequencer::{SequenceReport, SupersededLink};
pub use store::{AnnotationStore, CorridorPatch, EditError, EdgePatch, FloorPatch, NodePatch};
pub use tools::{ModalKind, ModalState, ToolKind};
