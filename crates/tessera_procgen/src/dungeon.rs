use std::fmt;

use glam::IVec2;
use serde::{Deserialize, Serialize};
use tessera_core::RandomSource;

/// Accepted range for grid width and height
pub const DUNGEON_SIZE_RANGE: (i32, i32) = (20, 100);
pub const MIN_ROOM_SIZE_RANGE: (i32, i32) = (4, 8);
pub const MAX_ROOM_SIZE_RANGE: (i32, i32) = (8, 16);
pub const MAX_DEPTH_RANGE: (u32, u32) = (1, 10);
pub const DEFAULT_MAX_DEPTH: u32 = 4;

/// State of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Wall,
    Floor,
}

/// Binary occupancy grid, row-major. Out-of-bounds reads are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl OccupancyGrid {
    /// All-wall grid
    pub fn walled(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![Cell::Wall; (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y).then(|| (y * self.width + x) as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        self.offset(x, y).map(|i| self.cells[i])
    }

    /// Out-of-bounds cells count as wall.
    pub fn is_floor(&self, x: i32, y: i32) -> bool {
        self.get(x, y) == Some(Cell::Floor)
    }

    /// Returns false when the cell is out of bounds.
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        match self.offset(x, y) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    pub fn fill(&mut self, area: &Area, cell: Cell) {
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                self.set(x, y, cell);
            }
        }
    }

    pub fn floor_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == Cell::Floor).count()
    }

    /// Every cell with its coordinates, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, Cell)> + '_ {
        self.cells.iter().enumerate().map(move |(i, &cell)| {
            let i = i as i32;
            (i % self.width, i / self.width, cell)
        })
    }
}

impl fmt::Display for OccupancyGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let c = if self.is_floor(x, y) { '.' } else { '#' };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Axis-aligned integer rectangle; a node of the partition tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Area {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Area {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, other: &Area) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }
}

/// Carved room plus the partition leaf it was placed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub area: Area,
}

impl Room {
    pub fn center(&self) -> IVec2 {
        IVec2::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn bounds(&self) -> Area {
        Area::new(self.x, self.y, self.width, self.height)
    }
}

/// Parameters for the floor-plan partitioner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonRecipe {
    pub width: i32,
    pub height: i32,
    pub min_room_size: i32,
    pub max_room_size: i32,
    pub max_depth: u32,
}

impl Default for DungeonRecipe {
    fn default() -> Self {
        Self {
            width: 40,
            height: 40,
            min_room_size: 6,
            max_room_size: 12,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DungeonRecipe {
    /// Many small cells on a large grid
    pub fn catacombs() -> Self {
        Self {
            width: 80,
            height: 80,
            min_room_size: 4,
            max_room_size: 8,
            max_depth: 6,
        }
    }

    /// A handful of large halls
    pub fn great_halls() -> Self {
        Self {
            width: 60,
            height: 40,
            min_room_size: 8,
            max_room_size: 16,
            max_depth: 2,
        }
    }

    /// Pull every field into its accepted range.
    pub fn clamped(&self) -> Self {
        Self {
            width: self.width.clamp(DUNGEON_SIZE_RANGE.0, DUNGEON_SIZE_RANGE.1),
            height: self.height.clamp(DUNGEON_SIZE_RANGE.0, DUNGEON_SIZE_RANGE.1),
            min_room_size: self
                .min_room_size
                .clamp(MIN_ROOM_SIZE_RANGE.0, MIN_ROOM_SIZE_RANGE.1),
            max_room_size: self
                .max_room_size
                .clamp(MAX_ROOM_SIZE_RANGE.0, MAX_ROOM_SIZE_RANGE.1),
            max_depth: self.max_depth.clamp(MAX_DEPTH_RANGE.0, MAX_DEPTH_RANGE.1),
        }
    }
}

/// Output of one partition run
#[derive(Debug, Clone)]
pub struct DungeonLayout {
    pub grid: OccupancyGrid,
    /// Rooms in creation (depth-first) order
    pub rooms: Vec<Room>,
    /// Center pairs joined by corridors, in carve order
    pub corridors: Vec<(IVec2, IVec2)>,
}

/// Split the grid into areas, carve one room per leaf, and join consecutive
/// rooms with L-shaped corridors.
///
/// Rooms are connected in creation order, not by proximity, so corridors may
/// cut through unrelated rooms.
pub fn partition(recipe: &DungeonRecipe, rng: &mut dyn RandomSource) -> DungeonLayout {
    let recipe = recipe.clamped();
    let mut partitioner = Partitioner {
        recipe,
        rng,
        grid: OccupancyGrid::walled(recipe.width, recipe.height),
        rooms: Vec::new(),
    };

    partitioner.split(Area::new(0, 0, recipe.width, recipe.height), 0);

    let Partitioner {
        mut grid, rooms, ..
    } = partitioner;

    let corridors: Vec<(IVec2, IVec2)> = rooms
        .windows(2)
        .map(|pair| (pair[0].center(), pair[1].center()))
        .collect();
    for &(from, to) in &corridors {
        for cell in corridor_path(from, to) {
            grid.set(cell.x, cell.y, Cell::Floor);
        }
    }

    log::info!(
        "Dungeon generated: {}x{}, {} rooms, {} floor cells",
        grid.width(),
        grid.height(),
        rooms.len(),
        grid.floor_count()
    );

    DungeonLayout {
        grid,
        rooms,
        corridors,
    }
}

/// Cells visited by an L-shaped corridor: along x first, then along y.
/// Both endpoints are included.
pub fn corridor_path(from: IVec2, to: IVec2) -> Vec<IVec2> {
    let mut path = Vec::with_capacity(((to.x - from.x).abs() + (to.y - from.y).abs() + 1) as usize);
    let mut cursor = from;

    while cursor.x != to.x {
        path.push(cursor);
        cursor.x += (to.x - cursor.x).signum();
    }
    while cursor.y != to.y {
        path.push(cursor);
        cursor.y += (to.y - cursor.y).signum();
    }
    path.push(cursor);

    path
}

struct Partitioner<'a> {
    recipe: DungeonRecipe,
    rng: &'a mut dyn RandomSource,
    grid: OccupancyGrid,
    rooms: Vec<Room>,
}

impl Partitioner<'_> {
    fn split(&mut self, area: Area, depth: u32) {
        let min = self.recipe.min_room_size;

        if depth >= self.recipe.max_depth || area.width < min * 2 || area.height < min * 2 {
            self.create_room(area);
            return;
        }

        let vertical = self.rng.coin_flip();
        if vertical && area.width >= min * 2 {
            let split = self.rng.range(min, area.width - min);
            self.split(Area::new(area.x, area.y, split, area.height), depth + 1);
            self.split(
                Area::new(area.x + split, area.y, area.width - split, area.height),
                depth + 1,
            );
        } else if !vertical && area.height >= min * 2 {
            let split = self.rng.range(min, area.height - min);
            self.split(Area::new(area.x, area.y, area.width, split), depth + 1);
            self.split(
                Area::new(area.x, area.y + split, area.width, area.height - split),
                depth + 1,
            );
        } else {
            self.create_room(area);
        }
    }

    fn create_room(&mut self, area: Area) {
        let width = self.pick_extent(area.width);
        let height = self.pick_extent(area.height);

        let x = area.x + self.rng.range(0, (area.width - width).max(1));
        let y = area.y + self.rng.range(0, (area.height - height).max(1));

        let room = Room {
            x,
            y,
            width,
            height,
            area,
        };
        log::debug!("room {} at ({x}, {y}) {width}x{height} in {area:?}", self.rooms.len());

        self.grid.fill(&room.bounds(), Cell::Floor);
        self.rooms.push(room);
    }

    /// Room extent for an area side. Leaves at least one cell of slack, so
    /// rooms of neighboring leaves never touch.
    fn pick_extent(&mut self, available: i32) -> i32 {
        let upper = self.recipe.max_room_size.min(available - 1).max(1);
        let lower = self.recipe.min_room_size.min(upper);
        self.rng.range_inclusive(lower, upper)
    }
}
