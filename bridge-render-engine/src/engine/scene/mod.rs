//! Procedural scene content: bridge structure, sky and water.

/// Day/night cycle state and the system that applies it to the sun,
/// ambient light, fog, sky dome, star field and scene lighting uniform.
pub mod atmosphere;

/// Deterministic voxel bridge generator: towers, deck, cables and beacons
/// derived from a handful of dimension parameters.
pub mod bridge;

/// Displaced-plane water material and its per-frame uniform feed.
pub mod water;
