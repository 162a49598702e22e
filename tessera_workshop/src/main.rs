mod config;
mod session;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tessera_core::WorldSeed;
use tessera_terrain::size_for_exponent;

use config::WorkshopConfig;
use session::{ArtifactKind, Workshop};

#[derive(Parser, Debug)]
#[command(name = "tessera_workshop")]
#[command(about = "Generate floor plans, terrain and plants from recipes")]
struct Args {
    /// Session seed; every artifact derives its own stream from it
    #[arg(short, long, default_value = "1587")]
    seed: u64,

    /// JSON file with dungeon, wall_style, terrain and plant recipes
    #[arg(short, long)]
    recipes: Option<PathBuf>,

    /// Regenerate each artifact this many times
    #[arg(long, default_value = "1")]
    rounds: u32,

    /// Terrain size as an exponent n, giving 2^n + 1 vertices per side
    #[arg(long)]
    terrain_exponent: Option<u32>,

    /// Print the occupancy grid of the last floor plan
    #[arg(long)]
    show_grid: bool,

    #[command(subcommand)]
    artifact: Option<Artifact>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Artifact {
    /// Room-and-corridor floor plan with wall mesh
    Dungeon,
    /// Diamond-square terrain patch
    Terrain,
    /// L-system plant
    Plant,
    /// Everything
    All,
}

impl Artifact {
    fn kinds(self) -> Vec<ArtifactKind> {
        match self {
            Artifact::Dungeon => vec![ArtifactKind::Dungeon],
            Artifact::Terrain => vec![ArtifactKind::Terrain],
            Artifact::Plant => vec![ArtifactKind::Plant],
            Artifact::All => ArtifactKind::ALL.to_vec(),
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.recipes {
        Some(path) => match WorkshopConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => WorkshopConfig::default(),
    };

    println!("=== TESSERA WORKSHOP ===");
    println!("Seed: {}", args.seed);

    let kinds = args.artifact.unwrap_or(Artifact::All).kinds();
    let mut workshop = Workshop::new(WorldSeed::new(args.seed), config);
    if let Some(exponent) = args.terrain_exponent {
        workshop.config_mut().terrain.size = size_for_exponent(exponent);
    }

    for round in 0..args.rounds.max(1) {
        for &kind in &kinds {
            if workshop.regenerate(kind).is_err() {
                println!("[round {round}] {} failed, previous artifact kept", kind.label());
            }
        }
    }

    for &kind in &kinds {
        print_summary(&workshop, kind);
    }

    if args.show_grid {
        if let Some(dungeon) = workshop.dungeon() {
            println!("\n{}", dungeon.layout.grid);
        }
    }

    if kinds.iter().all(|&kind| match kind {
        ArtifactKind::Dungeon => workshop.dungeon().is_none(),
        ArtifactKind::Terrain => workshop.terrain().is_none(),
        ArtifactKind::Plant => workshop.plant().is_none(),
    }) {
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn print_summary(workshop: &Workshop, kind: ArtifactKind) {
    let failures = workshop.failures(kind);
    match kind {
        ArtifactKind::Dungeon => match workshop.dungeon() {
            Some(dungeon) => {
                let grid = &dungeon.layout.grid;
                println!(
                    "[DUNGEON] {}x{} grid, {} rooms, {} corridors, {} floor cells",
                    grid.width(),
                    grid.height(),
                    dungeon.layout.rooms.len(),
                    dungeon.layout.corridors.len(),
                    grid.floor_count()
                );
                println!(
                    "[DUNGEON] {} vertices, {} triangles in {} submeshes",
                    dungeon.mesh.vertex_count(),
                    dungeon.mesh.triangle_count(),
                    dungeon.mesh.submeshes.len()
                );
            }
            None => println!("[DUNGEON] nothing generated ({failures} failures)"),
        },
        ArtifactKind::Terrain => match workshop.terrain() {
            Some(terrain) => {
                let (lo, hi) = terrain.heightmap.min_max();
                println!(
                    "[TERRAIN] {0}x{0} heightmap, heights {1:.3}..{2:.3}",
                    terrain.heightmap.size(),
                    lo,
                    hi
                );
                println!(
                    "[TERRAIN] {} vertices, {} triangles",
                    terrain.mesh.vertex_count(),
                    terrain.mesh.triangle_count()
                );
            }
            None => println!("[TERRAIN] nothing generated ({failures} failures)"),
        },
        ArtifactKind::Plant => match workshop.plant() {
            Some(plant) => {
                println!(
                    "[PLANT] {} symbols, {} segments, {} dropped symbols",
                    plant.plant.expansion.symbols.chars().count(),
                    plant.plant.segments.len(),
                    plant.plant.expansion.dropped.len()
                );
                println!(
                    "[PLANT] branch mesh: {} vertices, {} triangles",
                    plant.mesh.vertex_count(),
                    plant.mesh.triangle_count()
                );
            }
            None => println!("[PLANT] nothing generated ({failures} failures)"),
        },
    }

    if failures > 0 {
        println!("[{}] {failures} failed regenerations", kind.label().to_uppercase());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["tessera_workshop"]);
        assert_eq!(args.seed, 1587);
        assert_eq!(args.rounds, 1);
        assert!(args.recipes.is_none());
        assert!(args.terrain_exponent.is_none());
        assert_eq!(args.artifact, None);
    }

    #[test]
    fn test_subcommand_selects_kinds() {
        let args = Args::parse_from(["tessera_workshop", "--seed", "42", "--rounds", "3", "terrain"]);
        assert_eq!(args.seed, 42);
        assert_eq!(args.rounds, 3);
        assert_eq!(args.artifact, Some(Artifact::Terrain));
        assert_eq!(Artifact::Terrain.kinds(), vec![ArtifactKind::Terrain]);
        assert_eq!(Artifact::All.kinds().len(), 3);
    }
}
