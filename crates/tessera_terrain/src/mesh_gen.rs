use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tessera_core::{GenerationError, MeshBuilder, MeshGeometry, RandomSource};

use crate::heightmap::{nearest_valid_size, synthesize, Heightmap};

pub const HEIGHT_SCALE_RANGE: (f32, f32) = (0.1, 10.0);
pub const ROUGHNESS_RANGE: (f32, f32) = (0.1, 1.0);
/// Shared by cell size and base height
pub const PLANE_RANGE: (f32, f32) = (0.1, 10.0);

/// Parameters for one terrain patch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainRecipe {
    /// Vertices per side; rounded to the nearest `2^n + 1` when clamped
    pub size: usize,
    pub height_scale: f32,
    pub roughness: f32,
    pub cell_size: f32,
    pub base_height: f32,
}

impl Default for TerrainRecipe {
    fn default() -> Self {
        Self {
            size: 129,
            height_scale: 5.0,
            roughness: 0.5,
            cell_size: 1.0,
            base_height: PLANE_RANGE.0,
        }
    }
}

impl TerrainRecipe {
    /// Low, smooth hills
    pub fn rolling_hills() -> Self {
        Self {
            size: 65,
            height_scale: 2.0,
            roughness: 0.35,
            cell_size: 2.0,
            ..Self::default()
        }
    }

    /// Tall, noisy relief
    pub fn jagged_peaks() -> Self {
        Self {
            size: 257,
            height_scale: 9.0,
            roughness: 0.8,
            cell_size: 0.5,
            ..Self::default()
        }
    }

    pub fn clamped(&self) -> Self {
        Self {
            size: nearest_valid_size(self.size),
            height_scale: self.height_scale.clamp(HEIGHT_SCALE_RANGE.0, HEIGHT_SCALE_RANGE.1),
            roughness: self.roughness.clamp(ROUGHNESS_RANGE.0, ROUGHNESS_RANGE.1),
            cell_size: self.cell_size.clamp(PLANE_RANGE.0, PLANE_RANGE.1),
            base_height: self.base_height.clamp(PLANE_RANGE.0, PLANE_RANGE.1),
        }
    }
}

/// Grid mesh over a heightmap, centered on the origin in XZ.
pub fn build_terrain_mesh(map: &Heightmap, recipe: &TerrainRecipe) -> MeshGeometry {
    let size = map.size();
    let half = size as f32 * 0.5;
    let uv_span = (size - 1).max(1) as f32;

    let mut builder = MeshBuilder::new();
    let group = builder.add_submesh("terrain");

    for y in 0..size {
        for x in 0..size {
            let position = Vec3::new(
                (x as f32 - half) * recipe.cell_size,
                recipe.base_height + map.get(x, y) * recipe.height_scale,
                (y as f32 - half) * recipe.cell_size,
            );
            builder.add_vertex(position, Vec2::new(x as f32 / uv_span, y as f32 / uv_span));
        }
    }

    let row = size as u32;
    for y in 0..row.saturating_sub(1) {
        for x in 0..row - 1 {
            let top_left = y * row + x;
            let top_right = top_left + 1;
            let bottom_left = (y + 1) * row + x;
            let bottom_right = bottom_left + 1;

            builder.add_triangle(group, top_left, bottom_left, top_right);
            builder.add_triangle(group, top_right, bottom_left, bottom_right);
        }
    }

    builder.build()
}

/// Terrain patch together with the heightmap it was built from
#[derive(Debug, Clone)]
pub struct GeneratedTerrain {
    pub heightmap: Heightmap,
    pub mesh: MeshGeometry,
}

/// Synthesize a heightmap and mesh it. The recipe is clamped first, so any
/// requested size is rounded to a valid one.
pub fn generate_terrain(
    recipe: &TerrainRecipe,
    rng: &mut dyn RandomSource,
) -> Result<GeneratedTerrain, GenerationError> {
    let recipe = recipe.clamped();
    let heightmap = synthesize(recipe.size, recipe.roughness, rng)?;
    let mesh = build_terrain_mesh(&heightmap, &recipe);

    let (lo, hi) = heightmap.min_max();
    log::info!(
        "Terrain generated: {}x{}, {} triangles, heights {:.3}..{:.3}",
        recipe.size,
        recipe.size,
        mesh.triangle_count(),
        lo,
        hi
    );

    Ok(GeneratedTerrain { heightmap, mesh })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{SeededRandom, SequenceRandom};

    fn small_recipe() -> TerrainRecipe {
        TerrainRecipe {
            size: 9,
            ..TerrainRecipe::default()
        }
    }

    #[test]
    fn test_counts() {
        let terrain = generate_terrain(&small_recipe(), &mut SeededRandom::new(3)).unwrap();
        let mesh = &terrain.mesh;

        assert_eq!(mesh.vertex_count(), 81);
        assert_eq!(mesh.triangle_count(), 8 * 8 * 2);
        assert_eq!(mesh.submeshes.len(), 1);
        assert!(mesh.submesh("terrain").is_some());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_uv_range() {
        let terrain = generate_terrain(&small_recipe(), &mut SeededRandom::new(3)).unwrap();
        let uvs = &terrain.mesh.uvs;

        assert!(uvs.iter().all(|uv| (0.0..=1.0).contains(&uv[0]) && (0.0..=1.0).contains(&uv[1])));
        assert_eq!(uvs[0], [0.0, 0.0]);
        assert_eq!(uvs[80], [1.0, 1.0]);
    }

    #[test]
    fn test_every_face_points_up() {
        let recipe = TerrainRecipe::jagged_peaks();
        let recipe = TerrainRecipe { size: 33, ..recipe };
        let terrain = generate_terrain(&recipe, &mut SeededRandom::new(11)).unwrap();

        assert!(terrain.mesh.face_normals().iter().all(|n| n.y > 0.0));
        assert!(terrain.mesh.smooth_normals().iter().all(|n| n[1] > 0.0));
    }

    #[test]
    fn test_vertex_placement() {
        let recipe = TerrainRecipe {
            size: 3,
            height_scale: 2.0,
            cell_size: 4.0,
            base_height: 1.0,
            ..TerrainRecipe::default()
        };
        let terrain = generate_terrain(&recipe, &mut SequenceRandom::constant(0.5)).unwrap();
        let v = &terrain.mesh.vertices;

        // Flat map at 0.5: y = 1 + 0.5 * 2
        assert!(v.iter().all(|p| (p[1] - 2.0).abs() < 1e-5));
        // Offsets use size/2 = 1.5
        assert_eq!(v[0][0], -6.0);
        assert_eq!(v[0][2], -6.0);
        assert_eq!(v[8][0], 2.0);
        assert_eq!(v[8][2], 2.0);
    }

    #[test]
    fn test_recipe_clamping() {
        let wild = TerrainRecipe {
            size: 100,
            height_scale: 50.0,
            roughness: 0.0,
            cell_size: -1.0,
            base_height: 0.0,
        };
        let clamped = wild.clamped();
        assert_eq!(clamped.size, 129);
        assert_eq!(clamped.height_scale, 10.0);
        assert_eq!(clamped.roughness, 0.1);
        assert_eq!(clamped.cell_size, 0.1);
        assert_eq!(clamped.base_height, 0.1);
    }

    #[test]
    fn test_build_from_existing_map() {
        let map = synthesize(5, 0.5, &mut SeededRandom::new(0)).unwrap();
        let mesh = build_terrain_mesh(&map, &TerrainRecipe::default());
        assert_eq!(mesh.vertex_count(), 25);
    }

    #[test]
    fn test_parse_recipe() {
        let recipe: TerrainRecipe = serde_json::from_str(r#"{ "size": 33, "roughness": 0.9 }"#).unwrap();
        assert_eq!(recipe.size, 33);
        assert_eq!(recipe.roughness, 0.9);
        assert_eq!(recipe.height_scale, 5.0);
    }
}
