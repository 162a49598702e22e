use glam::{IVec2, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tessera_core::{MeshBuilder, MeshGeometry};

use crate::dungeon::{Cell, OccupancyGrid, Room};

/// Accepted range for tile size, wall height and floor height
pub const WALL_DIMENSION_RANGE: (f32, f32) = (0.1, 16.0);

/// Side of a floor cell a wall can sit on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// +y in grid space, +Z in world space
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn offset(self) -> IVec2 {
        match self {
            Direction::North => IVec2::Y,
            Direction::South => IVec2::NEG_Y,
            Direction::East => IVec2::X,
            Direction::West => IVec2::NEG_X,
        }
    }

    /// Grid axis along which edges on this side are merged
    fn scan_step(self) -> IVec2 {
        match self {
            Direction::North | Direction::South => IVec2::X,
            Direction::East | Direction::West => IVec2::Y,
        }
    }
}

/// One floor cell side facing a wall or the grid border
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryEdge {
    pub cell: IVec2,
    pub direction: Direction,
}

/// Consecutive boundary edges on the same side, merged into one strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallRun {
    pub direction: Direction,
    /// First cell of the run
    pub start: IVec2,
    /// Cells covered
    pub length: i32,
}

impl WallRun {
    pub fn edges(&self) -> impl Iterator<Item = BoundaryEdge> + '_ {
        let step = self.direction.scan_step();
        (0..self.length).map(move |i| BoundaryEdge {
            cell: self.start + step * i,
            direction: self.direction,
        })
    }
}

/// Material slot names. Two distinct names split the mesh into floor and
/// wall submeshes, anything else produces one merged group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialSlots {
    pub floor: Option<String>,
    pub wall: Option<String>,
}

impl MaterialSlots {
    pub fn split(floor: impl Into<String>, wall: impl Into<String>) -> Self {
        Self {
            floor: Some(floor.into()),
            wall: Some(wall.into()),
        }
    }
}

/// World-space dimensions for the extracted floor plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallStyle {
    pub tile_size: f32,
    pub wall_height: f32,
    pub floor_height: f32,
    pub materials: MaterialSlots,
}

impl Default for WallStyle {
    fn default() -> Self {
        Self {
            tile_size: 1.0,
            wall_height: 3.0,
            floor_height: WALL_DIMENSION_RANGE.0,
            materials: MaterialSlots::split("floor", "wall"),
        }
    }
}

impl WallStyle {
    pub fn clamped(&self) -> Self {
        let (lo, hi) = WALL_DIMENSION_RANGE;
        Self {
            tile_size: self.tile_size.clamp(lo, hi),
            wall_height: self.wall_height.clamp(lo, hi),
            floor_height: self.floor_height.clamp(lo, hi),
            materials: self.materials.clone(),
        }
    }
}

pub fn is_boundary(grid: &OccupancyGrid, cell: IVec2, direction: Direction) -> bool {
    let neighbor = cell + direction.offset();
    grid.is_floor(cell.x, cell.y) && !grid.is_floor(neighbor.x, neighbor.y)
}

/// Every boundary edge, one per floor cell side.
pub fn boundary_edges(grid: &OccupancyGrid) -> Vec<BoundaryEdge> {
    let mut edges = Vec::new();
    for direction in Direction::ALL {
        for (x, y, _) in grid.iter() {
            let cell = IVec2::new(x, y);
            if is_boundary(grid, cell, direction) {
                edges.push(BoundaryEdge { cell, direction });
            }
        }
    }
    edges
}

/// Boundary edges greedily merged into runs along each scan line.
pub fn wall_runs(grid: &OccupancyGrid) -> Vec<WallRun> {
    let mut runs = Vec::new();

    for direction in Direction::ALL {
        let step = direction.scan_step();
        let (lines, line_len) = if step == IVec2::X {
            (grid.height(), grid.width())
        } else {
            (grid.width(), grid.height())
        };

        for line in 0..lines {
            // Perpendicular offset of this scan line
            let origin = if step == IVec2::X {
                IVec2::new(0, line)
            } else {
                IVec2::new(line, 0)
            };

            let mut i = 0;
            while i < line_len {
                if !is_boundary(grid, origin + step * i, direction) {
                    i += 1;
                    continue;
                }

                let start = i;
                while i < line_len && is_boundary(grid, origin + step * i, direction) {
                    i += 1;
                }

                runs.push(WallRun {
                    direction,
                    start: origin + step * start,
                    length: i - start,
                });
            }
        }
    }

    runs
}

/// Maps grid coordinates to world space, centering the grid on the origin
struct GridFrame {
    half_width: f32,
    half_height: f32,
    tile: f32,
}

impl GridFrame {
    fn new(grid: &OccupancyGrid, tile: f32) -> Self {
        Self {
            half_width: grid.width() as f32 * 0.5,
            half_height: grid.height() as f32 * 0.5,
            tile,
        }
    }

    fn x(&self, x: i32) -> f32 {
        (x as f32 - self.half_width) * self.tile
    }

    fn z(&self, y: i32) -> f32 {
        (y as f32 - self.half_height) * self.tile
    }
}

/// Floor quads plus merged, double-sided wall strips for an occupancy grid.
pub fn extract(grid: &OccupancyGrid, style: &WallStyle) -> MeshGeometry {
    let style = style.clamped();
    let frame = GridFrame::new(grid, style.tile_size);
    let tile = style.tile_size;

    let mut builder = MeshBuilder::new();
    let floor_group = builder.add_submesh(style.materials.floor.clone().unwrap_or_default());
    let wall_group = builder.add_submesh(style.materials.wall.clone().unwrap_or_default());

    // Floors: one quad per floor cell, UV 0..1 per tile
    for (x, y, _) in grid.iter().filter(|&(_, _, cell)| cell == Cell::Floor) {
        let (wx, wz) = (frame.x(x), frame.z(y));
        let h = style.floor_height;
        builder.add_quad(
            floor_group,
            [
                Vec3::new(wx, h, wz),
                Vec3::new(wx, h, wz + tile),
                Vec3::new(wx + tile, h, wz + tile),
                Vec3::new(wx + tile, h, wz),
            ],
            [Vec2::ZERO, Vec2::Y, Vec2::ONE, Vec2::X],
        );
    }

    // Walls: one strip per merged run
    let runs = wall_runs(grid);
    let up = Vec3::Y * style.wall_height;
    let v_len = style.wall_height / tile;

    for run in &runs {
        let length = run.length as f32 * tile;
        let (base, along) = match run.direction {
            Direction::North => (
                Vec3::new(frame.x(run.start.x), style.floor_height, frame.z(run.start.y) + tile),
                Vec3::X * length,
            ),
            Direction::South => (
                Vec3::new(frame.x(run.start.x), style.floor_height, frame.z(run.start.y)),
                Vec3::X * length,
            ),
            Direction::East => (
                Vec3::new(frame.x(run.start.x) + tile, style.floor_height, frame.z(run.start.y)),
                Vec3::Z * length,
            ),
            Direction::West => (
                Vec3::new(frame.x(run.start.x), style.floor_height, frame.z(run.start.y)),
                Vec3::Z * length,
            ),
        };

        // u follows the strip in tiles, v follows the height in tiles
        let u_len = run.length as f32;
        builder.add_double_sided_quad(
            wall_group,
            [base, base + up, base + up + along, base + along],
            [
                Vec2::ZERO,
                Vec2::new(0.0, v_len),
                Vec2::new(u_len, v_len),
                Vec2::new(u_len, 0.0),
            ],
        );
    }

    log::debug!(
        "Extracted {} floor cells and {} wall strips",
        grid.floor_count(),
        runs.len()
    );

    let mesh = builder.build();
    match (&style.materials.floor, &style.materials.wall) {
        (Some(floor), Some(wall)) if floor != wall => mesh,
        (Some(name), _) | (None, Some(name)) => mesh.merged(name.clone()),
        (None, None) => mesh.merged("default"),
    }
}

/// World-space box around a room, for debug overlays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomGizmo {
    pub center: Vec3,
    pub size: Vec3,
}

pub fn room_gizmo(room: &Room, grid: &OccupancyGrid, style: &WallStyle) -> RoomGizmo {
    let style = style.clamped();
    let tile = style.tile_size;
    let center_x = room.x as f32 + room.width as f32 * 0.5 - grid.width() as f32 * 0.5;
    let center_z = room.y as f32 + room.height as f32 * 0.5 - grid.height() as f32 * 0.5;

    RoomGizmo {
        center: Vec3::new(center_x * tile, style.wall_height * 0.5, center_z * tile),
        size: Vec3::new(room.width as f32 * tile, style.wall_height, room.height as f32 * tile),
    }
}
