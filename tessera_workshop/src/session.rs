use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tessera_core::seed::{LAYER_DUNGEON, LAYER_PLANT, LAYER_TERRAIN};
use tessera_core::{GenerationError, MeshGeometry, WorldSeed};
use tessera_procgen::{build_branch_mesh, extract, partition, DungeonLayout, GeneratedPlant};
use tessera_terrain::{generate_terrain, GeneratedTerrain};

use crate::config::WorkshopConfig;

/// Sides of the cylinder swept around each plant segment
const BRANCH_RADIAL_SEGMENTS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Dungeon,
    Terrain,
    Plant,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Dungeon, ArtifactKind::Terrain, ArtifactKind::Plant];

    fn layer(self) -> u64 {
        match self {
            ArtifactKind::Dungeon => LAYER_DUNGEON,
            ArtifactKind::Terrain => LAYER_TERRAIN,
            ArtifactKind::Plant => LAYER_PLANT,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Dungeon => "dungeon",
            ArtifactKind::Terrain => "terrain",
            ArtifactKind::Plant => "plant",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DungeonArtifact {
    pub layout: DungeonLayout,
    pub mesh: MeshGeometry,
}

#[derive(Debug, Clone)]
pub struct PlantArtifact {
    pub plant: GeneratedPlant,
    pub mesh: MeshGeometry,
}

/// Last published artifact of one kind plus its regeneration bookkeeping
#[derive(Debug)]
struct Slot<T> {
    current: Option<T>,
    round: u64,
    failures: u32,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            current: None,
            round: 0,
            failures: 0,
        }
    }
}

impl<T> Slot<T> {
    /// Publish a fresh artifact, or keep the old one when generation failed.
    fn publish(&mut self, kind: ArtifactKind, result: Result<T, GenerationError>) -> Result<&T, GenerationError> {
        self.round += 1;
        match result {
            Ok(artifact) => Ok(self.current.insert(artifact)),
            Err(err) => {
                self.failures += 1;
                if self.current.is_some() {
                    log::error!("{} generation failed, keeping previous artifact: {err}", kind.label());
                } else {
                    log::error!("{} generation failed, nothing published yet: {err}", kind.label());
                }
                Err(err)
            }
        }
    }
}

/// Generation session. Owns the recipes and the last valid artifact of each
/// kind; a failed regeneration never replaces what is already published.
#[derive(Debug)]
pub struct Workshop {
    seed: WorldSeed,
    config: WorkshopConfig,
    dungeon: Slot<DungeonArtifact>,
    terrain: Slot<GeneratedTerrain>,
    plant: Slot<PlantArtifact>,
}

impl Workshop {
    pub fn new(seed: WorldSeed, config: WorkshopConfig) -> Self {
        Self {
            seed,
            config,
            dungeon: Slot::default(),
            terrain: Slot::default(),
            plant: Slot::default(),
        }
    }

    /// Recipe edits take effect on the next regeneration.
    pub fn config_mut(&mut self) -> &mut WorkshopConfig {
        &mut self.config
    }

    pub fn dungeon(&self) -> Option<&DungeonArtifact> {
        self.dungeon.current.as_ref()
    }

    pub fn terrain(&self) -> Option<&GeneratedTerrain> {
        self.terrain.current.as_ref()
    }

    pub fn plant(&self) -> Option<&PlantArtifact> {
        self.plant.current.as_ref()
    }

    pub fn failures(&self, kind: ArtifactKind) -> u32 {
        match kind {
            ArtifactKind::Dungeon => self.dungeon.failures,
            ArtifactKind::Terrain => self.terrain.failures,
            ArtifactKind::Plant => self.plant.failures,
        }
    }

    fn round(&self, kind: ArtifactKind) -> u64 {
        match kind {
            ArtifactKind::Dungeon => self.dungeon.round,
            ArtifactKind::Terrain => self.terrain.round,
            ArtifactKind::Plant => self.plant.round,
        }
    }

    fn seed_for(&self, kind: ArtifactKind) -> WorldSeed {
        self.seed.for_layer(kind.layer(), self.round(kind))
    }

    pub fn regenerate(&mut self, kind: ArtifactKind) -> Result<(), GenerationError> {
        match kind {
            ArtifactKind::Dungeon => self.regenerate_dungeon().map(|_| ()),
            ArtifactKind::Terrain => self.regenerate_terrain().map(|_| ()),
            ArtifactKind::Plant => self.regenerate_plant().map(|_| ()),
        }
    }

    pub fn regenerate_dungeon(&mut self) -> Result<&DungeonArtifact, GenerationError> {
        let mut rng = self.seed_for(ArtifactKind::Dungeon).rng();
        let recipe = self.config.dungeon;
        let style = &self.config.wall_style;

        let result = guarded(|| {
            let layout = partition(&recipe, &mut rng);
            let mesh = extract(&layout.grid, style);
            mesh.validate()?;
            Ok(DungeonArtifact { layout, mesh })
        });
        self.dungeon.publish(ArtifactKind::Dungeon, result)
    }

    pub fn regenerate_terrain(&mut self) -> Result<&GeneratedTerrain, GenerationError> {
        let mut rng = self.seed_for(ArtifactKind::Terrain).rng();
        let recipe = &self.config.terrain;

        let result = guarded(|| generate_terrain(recipe, &mut rng));
        self.terrain.publish(ArtifactKind::Terrain, result)
    }

    pub fn regenerate_plant(&mut self) -> Result<&PlantArtifact, GenerationError> {
        let mut rng = self.seed_for(ArtifactKind::Plant).rng();
        let recipe = &self.config.plant;

        let result = guarded(|| {
            let plant = recipe.generate(&mut rng)?;
            let mesh = build_branch_mesh(&plant.segments, BRANCH_RADIAL_SEGMENTS);
            Ok(PlantArtifact { plant, mesh })
        });
        self.plant.publish(ArtifactKind::Plant, result)
    }
}

/// Run a generator, turning a panic into [`GenerationError::Panicked`].
pub fn guarded<T>(generate: impl FnOnce() -> Result<T, GenerationError>) -> Result<T, GenerationError> {
    panic::catch_unwind(AssertUnwindSafe(generate))
        .unwrap_or_else(|payload| Err(GenerationError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
