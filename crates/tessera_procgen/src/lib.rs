pub mod dungeon;
pub mod lsystem;
pub mod turtle;
pub mod walls;

pub use dungeon::*;
pub use lsystem::*;
pub use turtle::*;
pub use walls::*;
