/// Keyboard nudging of the externally owned simulation parameters
use bevy::prelude::*;

use crate::engine::core::app_state::SimulationParameters;

const TIME_OF_DAY_RATE: f32 = 2.0;
const DENSITY_RATE: f32 = 40.0;

/// Adjust time of day, fog density and traffic density from the keyboard.
/// Stands in for the external control panel; values are clamped to their
/// documented ranges (time of day wraps over 24h) so the per-frame systems
/// never see out-of-range input.
pub fn parameter_input_system(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut params: ResMut<SimulationParameters>,
) {
    let dt = time.delta_secs();

    if keyboard.pressed(KeyCode::KeyT) {
        params.time_of_day += TIME_OF_DAY_RATE * dt;
    }
    if keyboard.pressed(KeyCode::KeyR) {
        params.time_of_day -= TIME_OF_DAY_RATE * dt;
    }
    params.time_of_day = params.time_of_day.rem_euclid(24.0);

    if keyboard.pressed(KeyCode::KeyG) {
        params.fog_density += DENSITY_RATE * dt;
    }
    if keyboard.pressed(KeyCode::KeyF) {
        params.fog_density -= DENSITY_RATE * dt;
    }
    params.fog_density = params.fog_density.clamp(0.0, 100.0);

    if keyboard.pressed(KeyCode::KeyV) {
        params.traffic_density += DENSITY_RATE * dt;
    }
    if keyboard.pressed(KeyCode::KeyC) {
        params.traffic_density -= DENSITY_RATE * dt;
    }
    params.traffic_density = params.traffic_density.clamp(0.0, 100.0);
}
