//! Per-frame gameplay and UI systems.

/// FPS counter text updates from the frame time diagnostics.
pub mod fps_tracking;

/// Keyboard control of time of day, fog density and traffic density.
pub mod parameters;

/// Car pool simulation feeding the three dynamic traffic batches.
pub mod traffic;
