/// Uniform world scale applied to every bridge dimension
pub const WORLD_SCALE: f32 = 1.0;

/// Total bridge length along the X axis (shore to shore)
pub const BRIDGE_LENGTH: f32 = 400.0 * WORLD_SCALE;

/// Tower top height above the water line
pub const TOWER_HEIGHT: f32 = 60.0 * WORLD_SCALE;

/// Road deck height above the water line
pub const DECK_HEIGHT: f32 = 15.0 * WORLD_SCALE;

/// Tower footprint width
pub const TOWER_WIDTH: f32 = 8.0 * WORLD_SCALE;

/// Road deck width (both directions of traffic)
pub const ROAD_WIDTH: f32 = 12.0 * WORLD_SCALE;

/// Water plane elevation
pub const WATER_LEVEL: f32 = -2.0 * WORLD_SCALE;

/// Water plane side length
pub const WATER_SIZE: f32 = 1000.0 * WORLD_SCALE;
