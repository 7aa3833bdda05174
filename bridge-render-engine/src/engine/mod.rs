pub mod core;
pub mod render;
pub mod scene;
pub mod systems;
