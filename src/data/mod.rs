//! Labeled containers for compositional data and its transforms.

mod composition;
mod transformed;

pub use composition::{CompositionRow, CompositionTable, DEFAULT_INDEX_NAME};
pub use transformed::{LogRatioTable, TransformKind};
