//! Property tests over random seeds and recipes
//!
//! - Partition: rooms stay inside their leaf and the grid, floor is connected
//! - Walls: merged runs cover every boundary edge exactly once
//! - Grammar: expansion length and determinism per seed
//! - Turtle: one segment per `F`, balanced input never errors

use std::collections::{HashSet, VecDeque};

use proptest::prelude::*;
use tessera_core::{RandomSource, SeededRandom};
use tessera_procgen::{
    boundary_edges, extract, interpret, partition, wall_runs, BoundaryEdge, DungeonRecipe, Grammar,
    OccupancyGrid, PlantRecipe, ProductionRule, TurtleParams, WallStyle,
};

fn recipe_strategy() -> impl Strategy<Value = DungeonRecipe> {
    (10i32..=120, 10i32..=120, 2i32..=10, 6i32..=20, 0u32..=12).prop_map(
        |(width, height, min_room_size, max_room_size, max_depth)| DungeonRecipe {
            width,
            height,
            min_room_size,
            max_room_size,
            max_depth,
        },
    )
}

/// Number of floor cells reachable from the first floor cell
fn reachable_floor(grid: &OccupancyGrid) -> usize {
    let Some((sx, sy, _)) = grid.iter().find(|&(x, y, _)| grid.is_floor(x, y)) else {
        return 0;
    };

    let mut seen = HashSet::from([(sx, sy)]);
    let mut queue = VecDeque::from([(sx, sy)]);
    while let Some((x, y)) = queue.pop_front() {
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let next = (x + dx, y + dy);
            if grid.is_floor(next.0, next.1) && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen.len()
}

// ============================================================
// Partition
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_rooms_fit_their_leaf(seed in any::<u64>(), recipe in recipe_strategy()) {
        let layout = partition(&recipe, &mut SeededRandom::new(seed));
        let clamped = recipe.clamped();

        prop_assert_eq!(layout.grid.width(), clamped.width);
        prop_assert_eq!(layout.grid.height(), clamped.height);
        prop_assert!(!layout.rooms.is_empty());

        for room in &layout.rooms {
            prop_assert!(room.width >= 1 && room.height >= 1);
            prop_assert!(room.area.contains(&room.bounds()), "{:?}", room);
            prop_assert!(room.area.x >= 0 && room.area.y >= 0);
            prop_assert!(room.area.x + room.area.width <= clamped.width);
            prop_assert!(room.area.y + room.area.height <= clamped.height);
        }
    }

    #[test]
    fn prop_floor_is_connected(seed in any::<u64>(), recipe in recipe_strategy()) {
        let layout = partition(&recipe, &mut SeededRandom::new(seed));
        prop_assert_eq!(reachable_floor(&layout.grid), layout.grid.floor_count());
        prop_assert_eq!(layout.corridors.len(), layout.rooms.len() - 1);
    }

    #[test]
    fn prop_partition_is_deterministic(seed in any::<u64>(), recipe in recipe_strategy()) {
        let a = partition(&recipe, &mut SeededRandom::new(seed));
        let b = partition(&recipe, &mut SeededRandom::new(seed));
        prop_assert_eq!(a.rooms, b.rooms);
        prop_assert_eq!(a.grid, b.grid);
    }
}

// ============================================================
// Walls
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_runs_partition_boundary_edges(seed in any::<u64>(), recipe in recipe_strategy()) {
        let layout = partition(&recipe, &mut SeededRandom::new(seed));
        let edges = boundary_edges(&layout.grid);
        let runs = wall_runs(&layout.grid);

        let mut covered: HashSet<BoundaryEdge> = HashSet::new();
        for run in &runs {
            prop_assert!(run.length >= 1);
            for edge in run.edges() {
                prop_assert!(covered.insert(edge), "edge {:?} covered twice", edge);
            }
        }
        prop_assert_eq!(covered, edges.into_iter().collect::<HashSet<_>>());
    }

    #[test]
    fn prop_mesh_matches_runs(seed in any::<u64>(), recipe in recipe_strategy()) {
        let layout = partition(&recipe, &mut SeededRandom::new(seed));
        let mesh = extract(&layout.grid, &WallStyle::default());
        let runs = wall_runs(&layout.grid);

        prop_assert!(mesh.validate().is_ok());
        prop_assert_eq!(mesh.vertex_count(), layout.grid.floor_count() * 4 + runs.len() * 8);
        prop_assert_eq!(mesh.triangle_count(), layout.grid.floor_count() * 2 + runs.len() * 4);
    }
}

// ============================================================
// Grammar and turtle
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_doubling_length(depth in 0u32..=8) {
        let grammar = Grammar::new().with_rule(ProductionRule::deterministic('F', "FF"));
        let out = grammar.expand("F", depth, &mut SeededRandom::new(0)).unwrap();
        prop_assert_eq!(out.symbols.len(), 1usize << depth);
    }

    #[test]
    fn prop_plant_is_deterministic(seed in any::<u64>()) {
        let recipe = PlantRecipe::stochastic_tree();
        let a = recipe.generate(&mut SeededRandom::new(seed)).unwrap();
        let b = recipe.generate(&mut SeededRandom::new(seed)).unwrap();
        prop_assert_eq!(a.expansion, b.expansion);
        prop_assert_eq!(a.segments, b.segments);
    }

    #[test]
    fn prop_one_segment_per_forward(seed in any::<u64>(), angle in 15.0f32..60.0) {
        let recipe = PlantRecipe::sapling();
        let expansion = recipe
            .grammar
            .expand(&recipe.axiom, recipe.depth, &mut SeededRandom::new(seed))
            .unwrap();
        let params = TurtleParams { length: 1.0, angle_degrees: angle, thickness: 1.0 };
        let segments = interpret(&expansion.symbols, &params).unwrap();

        prop_assert_eq!(segments.len(), expansion.symbols.matches('F').count());
        for segment in &segments {
            prop_assert!((segment.length() - 1.0).abs() < 1e-3);
            prop_assert!(segment.thickness > 0.0 && segment.thickness <= 1.0);
        }
    }

    #[test]
    fn prop_range_stays_in_bounds(seed in any::<u64>(), min in -50i32..50, span in 1i32..100) {
        let mut rng = SeededRandom::new(seed);
        for _ in 0..32 {
            let v = rng.range(min, min + span);
            prop_assert!(v >= min && v < min + span);
        }
    }
}
