pub mod ai;
pub mod body;
pub mod character;
pub mod entity;
pub mod geometry;
pub mod goal;
pub mod ground;
pub mod level;
pub mod tile;
