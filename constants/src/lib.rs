//! Shared constants for the voxel bridge scene.
//!
//! Colour palette, bridge dimensions and simulation tuning values used by
//! both the geometry builder and the per-frame systems.

/// Scene colour palette (sRGB channel values).
pub mod colors;

/// Bridge dimension constants driving the one-time geometry build.
pub mod dimensions;

/// Simulation tuning: traffic pool sizing, speed scale, sample counts.
pub mod simulation;
