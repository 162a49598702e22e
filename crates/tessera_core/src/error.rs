use thiserror::Error;

/// Failure of a single generation call.
///
/// Out-of-range configuration never shows up here; recipes are clamped
/// before they reach a generator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("heightmap size {0} is not of the form 2^n + 1")]
    InvalidHeightmapSize(usize),

    #[error("unbalanced branch: `]` at symbol {index} has no matching `[`")]
    UnbalancedBranch { index: usize },

    #[error("grammar expansion failed: {0}")]
    Grammar(String),

    #[error("mesh index {index} out of range for {vertex_count} vertices")]
    InvalidMeshIndex { index: u32, vertex_count: usize },

    #[error("generator panicked: {0}")]
    Panicked(String),
}
