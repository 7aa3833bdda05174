//! GPU rendering infrastructure for the instanced voxel scene.

/// Custom instanced rendering plugin: per-instance transform, colour and
/// material data in a single vertex buffer draw per batch, with a scene
/// lighting uniform shared across all batches.
pub mod instanced_render_plugin;
