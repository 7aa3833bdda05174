use bevy::prelude::*;

/// Externally owned simulation parameters. The UI collaborator (here, the
/// keyboard stand-in) writes them between frames; the core systems only
/// read. Out-of-range values are a caller contract violation, so writers
/// clamp before publishing.
#[derive(Resource, Debug, Clone, Copy)]
pub struct SimulationParameters {
    /// Time of day in hours, [0, 24)
    pub time_of_day: f32,
    /// Fog density percentage, [0, 100]
    pub fog_density: f32,
    /// Traffic density percentage, [0, 100]
    pub traffic_density: f32,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            time_of_day: 12.0,
            fog_density: 10.0,
            traffic_density: 50.0,
        }
    }
}

#[derive(Component)]
pub struct FpsText;
