use bevy::math::Vec3;

/// International Orange, the primary bridge steel colour
pub const BRIDGE_RED: Vec3 = Vec3::new(0.753, 0.212, 0.173);

/// Deep water body colour
pub const WATER_DEEP: Vec3 = Vec3::new(0.118, 0.227, 0.373);

/// Shallow / crest water colour
pub const WATER_SHALLOW: Vec3 = Vec3::new(0.290, 0.486, 0.616);

/// Daytime sky near the horizon
pub const SKY_DAY_BOTTOM: Vec3 = Vec3::new(0.800, 0.933, 1.000);

/// Daytime sky at the zenith (sky dome tint)
pub const SKY_DAY_TOP: Vec3 = Vec3::new(0.333, 0.600, 1.000);

/// Night sky near the horizon
pub const SKY_NIGHT_BOTTOM: Vec3 = Vec3::new(0.063, 0.125, 0.208);

/// Sunrise / golden hour tint
pub const SUNSET_ORANGE: Vec3 = Vec3::new(1.000, 0.600, 0.200);

/// Dusk tint the day sky fades towards
pub const SUNSET_PURPLE: Vec3 = Vec3::new(0.400, 0.200, 0.600);

/// Tower base concrete
pub const CONCRETE: Vec3 = Vec3::new(0.600, 0.600, 0.600);

/// Road deck asphalt
pub const ROAD: Vec3 = Vec3::new(0.200, 0.200, 0.200);

/// Light foggy blue used for daytime fog
pub const FOG_DAY: Vec3 = Vec3::new(0.878, 0.969, 0.980);

/// Near-black fog tint at night
pub const FOG_NIGHT: Vec3 = Vec3::new(0.039, 0.039, 0.063);

/// Warm near-white sunlight
pub const SUNLIGHT: Vec3 = Vec3::new(1.000, 1.000, 0.800);

/// Cool blue-tinted moonlight
pub const MOONLIGHT: Vec3 = Vec3::new(0.667, 0.667, 1.000);

/// Dark blue ambient fill at night
pub const AMBIENT_NIGHT: Vec3 = Vec3::new(0.067, 0.067, 0.133);

/// Neutral ambient fill by day
pub const AMBIENT_DAY: Vec3 = Vec3::new(1.000, 1.000, 1.000);

/// Warm beacon / street light bulb colour
pub const BEACON: Vec3 = Vec3::new(1.000, 1.000, 0.800);

/// Car headlight colour
pub const HEADLIGHT: Vec3 = Vec3::new(1.000, 1.000, 1.000);

/// Car taillight colour
pub const TAILLIGHT: Vec3 = Vec3::new(1.000, 0.000, 0.000);
