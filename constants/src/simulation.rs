use bevy::math::Vec3;

/// Fixed car pool size; the live traffic density activates an index prefix of it
pub const MAX_CARS: usize = 400;

/// World units per second for a car with speed 1.0
pub const CAR_SPEED_SCALE: f32 = 10.0;

/// Sentinel position for pooled cars that are currently inactive
pub const HIDDEN_POSITION: Vec3 = Vec3::new(0.0, -1000.0, 0.0);

/// Number of road deck segments along the full bridge length
pub const DECK_SEGMENTS: usize = 100;

/// Main-span cable sample intervals between the towers
pub const CABLE_SAMPLES: usize = 100;

/// Back-span cable sample intervals from tower to shore
pub const BACK_SPAN_SAMPLES: usize = 30;

/// Star instances on the night sky dome
pub const STAR_COUNT: usize = 800;

/// Star dome radius
pub const STAR_DOME_RADIUS: f32 = 200.0;

/// Directional light illuminance (lux) for a model intensity of 1.0
pub const SUNLIGHT_LUX_PER_UNIT: f32 = 50_000.0;

/// Ambient light brightness for a model intensity of 1.0
pub const AMBIENT_BRIGHTNESS_PER_UNIT: f32 = 400.0;

/// Emissive boost applied to beacon instances during lighting-night
pub const BEACON_NIGHT_EMISSIVE: f32 = 2.0;
