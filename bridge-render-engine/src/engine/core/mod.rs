//! Core application setup and state management.
//!
//! Handles application lifecycle, window configuration and plugin
//! initialisation for both native and WASM targets.

/// Application setup and plugin configuration for the Bevy engine.
///
/// Creates the main app with the instanced scene renderer, water material
/// plugin and platform-specific configuration, then spawns the scene.
pub mod app_setup;

/// Shared runtime state: the user-tunable simulation parameters.
pub mod app_state;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
