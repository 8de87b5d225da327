pub mod export;
pub mod geometry;
pub mod id;
pub mod lint;
pub mod model;
pub mod plan_image;
pub mod segment;

pub use export::{export_filename, sanitize_identifier};
pub use geometry::{ImageDimensions, WorldPoint};
pub use id::ElementId;
pub use lint::{LintDiagnostic, LintSeverity, lint_document};
pub use model::*;
pub use segment::{PathValidation, SegmentStyle, validate_corridor_path};

// Re-export kurbo types so downstream crates don't need a direct dependency
pub use kurbo::{Point, Vec2};
