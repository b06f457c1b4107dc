pub mod assets;
pub mod camera;
pub mod event;
pub mod game;
pub mod levels;
pub mod menu;
pub mod placement;
pub mod save;
pub mod scene;
pub mod stage;
