pub mod heightmap;
pub mod mesh_gen;

// Re-export commonly used items
pub use heightmap::{nearest_valid_size, size_for_exponent, synthesize, Heightmap};
pub use mesh_gen::{build_terrain_mesh, generate_terrain, GeneratedTerrain, TerrainRecipe};
