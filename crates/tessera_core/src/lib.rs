pub mod error;
pub mod mesh;
pub mod rng;
pub mod seed;

// Re-export commonly used items
pub use error::GenerationError;
pub use mesh::{MeshBuilder, MeshGeometry, Submesh};
pub use rng::{RandomSource, SeededRandom, SequenceRandom};
pub use seed::WorldSeed;
