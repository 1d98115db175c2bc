//! Service layer - the import pipeline
//!
//! Each module covers one stage of the pipeline: value normalization,
//! header reconciliation, client resolution, row transformation, and the
//! orchestrating state machine.

pub mod headers;
pub mod import;
pub mod normalize;
pub mod resolver;
pub mod transform;

pub use import::{
    ImportOutcome, ImportService, ImportSession, ImportStage, PreviewEntry, BATCH_SIZE,
    PREVIEW_ROWS,
};
pub use transform::FieldIndex;
