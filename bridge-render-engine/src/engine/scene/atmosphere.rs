/// Time-of-day atmosphere model: sky, fog, sun and ambient lighting
use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;

use crate::engine::core::app_state::SimulationParameters;
use crate::engine::render::instanced_render_plugin::SceneLighting;
use constants::colors;
use constants::simulation::{
    AMBIENT_BRIGHTNESS_PER_UNIT, BEACON_NIGHT_EMISSIVE, SUNLIGHT_LUX_PER_UNIT,
};

/// Marker for the directional sun/moon light.
#[derive(Component)]
pub struct SceneSun;

/// Marker for the unlit sky dome sphere.
#[derive(Component)]
pub struct SkyDome;

/// Marker for the night star field batch.
#[derive(Component)]
pub struct StarField;

/// Pure per-frame atmosphere snapshot for one time of day. Carries no
/// identity; recomputed from scratch every frame.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct AtmosphereState {
    pub sky_color: Vec3,
    pub fog_color: Vec3,
    pub light_color: Vec3,
    pub light_intensity: f32,
    pub ambient_intensity: f32,
    pub sun_direction: Vec3,
}

impl Default for AtmosphereState {
    fn default() -> Self {
        Self::at(12.0)
    }
}

// The three night boundaries below are intentionally different: stars and
// the procedural sky swap over at 5/20, light colour and beacon glow at
// 6/19, and the colour segments run 5..19. Do not unify.

/// Night as far as star and procedural-sky visibility is concerned.
pub fn is_sky_night(time_of_day: f32) -> bool {
    time_of_day < 5.0 || time_of_day > 20.0
}

/// Night as far as light colour and beacon emissive are concerned.
pub fn is_lighting_night(time_of_day: f32) -> bool {
    time_of_day < 6.0 || time_of_day > 19.0
}

/// Sun/moon direction for a time of day: rises at t=6, sets around t=18.
/// `z_offset` differs between the scene light (-20) and the water shader
/// (-50).
pub fn sun_direction(time_of_day: f32, z_offset: f32) -> Vec3 {
    let angle = ((time_of_day - 6.0) / 24.0) * std::f32::consts::TAU;
    Vec3::new(angle.cos() * 100.0, angle.sin() * 100.0, z_offset)
}

impl AtmosphereState {
    /// Evaluate the atmosphere at `time_of_day` in [0, 24). Four segments
    /// with linear interpolation inside each: sunrise [5,7), day [7,17),
    /// sunset [17,19), night otherwise.
    pub fn at(time_of_day: f32) -> Self {
        let t = time_of_day;

        let (sky_color, fog_color, light_intensity, ambient_intensity) = if (5.0..7.0).contains(&t)
        {
            let p = (t - 5.0) / 2.0;
            (
                colors::SKY_NIGHT_BOTTOM.lerp(colors::SUNSET_ORANGE, p),
                colors::SKY_NIGHT_BOTTOM.lerp(colors::SUNSET_ORANGE, p),
                p * 1.5,
                0.3 + p * 0.3,
            )
        } else if (7.0..17.0).contains(&t) {
            (colors::SKY_DAY_BOTTOM, colors::FOG_DAY, 2.0, 0.8)
        } else if (17.0..19.0).contains(&t) {
            let p = (t - 17.0) / 2.0;
            (
                colors::SKY_DAY_BOTTOM.lerp(colors::SUNSET_PURPLE, p),
                colors::FOG_DAY.lerp(colors::SUNSET_PURPLE, p),
                2.0 - p * 1.8,
                0.8 - p * 0.5,
            )
        } else {
            (colors::SKY_NIGHT_BOTTOM, colors::FOG_NIGHT, 0.1, 0.2)
        };

        let light_color = if is_lighting_night(t) {
            colors::MOONLIGHT
        } else {
            colors::SUNLIGHT
        };

        Self {
            sky_color,
            fog_color,
            light_color,
            light_intensity,
            ambient_intensity,
            sun_direction: sun_direction(t, -20.0),
        }
    }

    pub fn ambient_color(&self, time_of_day: f32) -> Vec3 {
        if is_lighting_night(time_of_day) {
            colors::AMBIENT_NIGHT
        } else {
            colors::AMBIENT_DAY
        }
    }
}

/// Exponential-squared fog density for the scene fog, from the external
/// 0-100 fog parameter.
pub fn scene_fog_density(fog_density: f32) -> f32 {
    if fog_density > 0.0 {
        (fog_density / 100.0) * 0.02
    } else {
        0.0
    }
}

fn vec3_color(v: Vec3) -> Color {
    Color::srgb(v.x, v.y, v.z)
}

/// Recompute the atmosphere from the current time of day and publish it to
/// everything that consumes it: clear colour, sun light, ambient light,
/// camera fog, the instanced-scene lighting uniform, sky dome and stars.
/// Runs before the water material update so the water never sees stale fog.
pub fn apply_atmosphere(
    params: Res<SimulationParameters>,
    mut atmosphere: ResMut<AtmosphereState>,
    mut scene_lighting: ResMut<SceneLighting>,
    mut clear_color: ResMut<ClearColor>,
    mut ambient_light: ResMut<AmbientLight>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut sun: Query<(&mut DirectionalLight, &mut Transform), With<SceneSun>>,
    mut fog: Query<&mut DistanceFog>,
    mut sky_dome: Query<
        (&mut Visibility, &MeshMaterial3d<StandardMaterial>),
        (With<SkyDome>, Without<StarField>),
    >,
    mut stars: Query<&mut Visibility, With<StarField>>,
) {
    let t = params.time_of_day;
    let state = AtmosphereState::at(t);
    *atmosphere = state;

    clear_color.0 = vec3_color(state.sky_color);

    ambient_light.color = vec3_color(state.ambient_color(t));
    ambient_light.brightness = state.ambient_intensity * AMBIENT_BRIGHTNESS_PER_UNIT;

    if let Ok((mut light, mut transform)) = sun.single_mut() {
        light.color = vec3_color(state.light_color);
        light.illuminance = state.light_intensity * SUNLIGHT_LUX_PER_UNIT;
        *transform =
            Transform::from_translation(state.sun_direction).looking_at(Vec3::ZERO, Vec3::Y);
    }

    let fog_density = scene_fog_density(params.fog_density);
    for mut distance_fog in &mut fog {
        distance_fog.color = vec3_color(state.fog_color);
        distance_fog.falloff = FogFalloff::ExponentialSquared {
            density: fog_density,
        };
    }

    *scene_lighting = SceneLighting {
        sun_direction: state.sun_direction.normalize_or_zero(),
        light_color: state.light_color,
        light_intensity: state.light_intensity,
        ambient_color: state.ambient_color(t),
        ambient_intensity: state.ambient_intensity,
        fog_color: state.fog_color,
        fog_density,
        beacon_boost: if is_lighting_night(t) {
            BEACON_NIGHT_EMISSIVE
        } else {
            0.0
        },
    };

    // Stars and the procedural sky swap over on the 5/20 visibility boundary
    let sky_night = is_sky_night(t);
    for mut visibility in &mut stars {
        *visibility = if sky_night {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
    }
    if let Ok((mut visibility, material)) = sky_dome.single_mut() {
        *visibility = if sky_night {
            Visibility::Hidden
        } else {
            Visibility::Visible
        };
        if let Some(material) = materials.get_mut(&material.0) {
            material.base_color = vec3_color(state.sky_color.lerp(colors::SKY_DAY_TOP, 0.5));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn assert_channel(v: f32) {
        assert!(v.is_finite() && (0.0..=1.0).contains(&v), "channel {v}");
    }

    fn assert_valid(state: &AtmosphereState) {
        for color in [state.sky_color, state.fog_color, state.light_color] {
            assert_channel(color.x);
            assert_channel(color.y);
            assert_channel(color.z);
        }
        assert!(state.light_intensity.is_finite() && state.light_intensity >= 0.0);
        assert!(state.ambient_intensity.is_finite() && state.ambient_intensity >= 0.0);
        assert!(state.sun_direction.is_finite());
    }

    #[test]
    fn all_hours_produce_bounded_state() {
        for tenth in 0..240 {
            let t = tenth as f32 / 10.0;
            assert_valid(&AtmosphereState::at(t));
        }
    }

    #[test]
    fn noon_is_full_day() {
        let state = AtmosphereState::at(12.0);
        assert!((state.light_intensity - 2.0).abs() < EPSILON);
        assert!((state.ambient_intensity - 0.8).abs() < EPSILON);
        assert_eq!(state.sky_color, colors::SKY_DAY_BOTTOM);
        assert_eq!(state.light_color, colors::SUNLIGHT);
        assert!(!is_sky_night(12.0));
        assert!(!is_lighting_night(12.0));
    }

    #[test]
    fn six_am_is_half_sunrise() {
        let state = AtmosphereState::at(6.0);
        // p = 0.5 halfway through the sunrise window
        assert!((state.light_intensity - 0.75).abs() < EPSILON);
        assert!((state.ambient_intensity - 0.45).abs() < EPSILON);
        let expected = colors::SKY_NIGHT_BOTTOM.lerp(colors::SUNSET_ORANGE, 0.5);
        assert!((state.sky_color - expected).length() < EPSILON);
    }

    #[test]
    fn segment_boundary_values_match_their_formulas() {
        // Sunrise start matches the night sky colour (continuous at t=5)
        let sunrise_start = AtmosphereState::at(5.0);
        assert!((sunrise_start.sky_color - colors::SKY_NIGHT_BOTTOM).length() < EPSILON);
        assert!(sunrise_start.light_intensity.abs() < EPSILON);

        // Day holds constant across its whole window (sun angle aside)
        let day_start = AtmosphereState::at(7.0);
        let day_end = AtmosphereState::at(16.9);
        assert_eq!(day_start.sky_color, day_end.sky_color);
        assert_eq!(day_start.fog_color, day_end.fog_color);
        assert_eq!(day_start.light_intensity, day_end.light_intensity);
        assert_eq!(day_start.ambient_intensity, day_end.ambient_intensity);

        // Sunset begins exactly where day left off (continuous at t=17)
        let sunset_start = AtmosphereState::at(17.0);
        let day = AtmosphereState::at(12.0);
        assert!((sunset_start.sky_color - day.sky_color).length() < EPSILON);
        assert!((sunset_start.light_intensity - day.light_intensity).abs() < EPSILON);
        assert!((sunset_start.ambient_intensity - day.ambient_intensity).abs() < EPSILON);

        // Night values hold on both sides of midnight
        let dusk = AtmosphereState::at(19.0);
        let late = AtmosphereState::at(23.0);
        assert_eq!(dusk.sky_color, late.sky_color);
        assert_eq!(dusk.fog_color, late.fog_color);
        assert_eq!(dusk.light_intensity, late.light_intensity);
        let night = AtmosphereState::at(2.0);
        assert!((night.light_intensity - 0.1).abs() < EPSILON);
        assert!((night.ambient_intensity - 0.2).abs() < EPSILON);
    }

    #[test]
    fn sun_rises_at_six_and_sets_at_eighteen() {
        // Horizon crossings: y = 0 going up at t=6, down at t=18
        assert!(sun_direction(6.0, -20.0).y.abs() < 1e-3);
        assert!(sun_direction(18.0, -20.0).y.abs() < 1e-3);
        assert!(sun_direction(12.0, -20.0).y > 0.0);
        assert!(sun_direction(0.0, -20.0).y < 0.0);
    }

    #[test]
    fn night_boundaries_stay_distinct() {
        // 5/20 for stars and sky, 6/19 for lighting: the half-open gap
        // between them is lighting-night but not sky-night.
        assert!(is_lighting_night(5.5));
        assert!(!is_sky_night(5.5));
        assert!(is_lighting_night(19.5));
        assert!(!is_sky_night(19.5));
        assert!(is_sky_night(4.9) && is_lighting_night(4.9));
        assert!(is_sky_night(20.1) && is_lighting_night(20.1));
        assert!(!is_sky_night(12.0) && !is_lighting_night(12.0));
    }

    #[test]
    fn scene_fog_density_scales_from_external_parameter() {
        assert_eq!(scene_fog_density(0.0), 0.0);
        assert!((scene_fog_density(100.0) - 0.02).abs() < EPSILON);
        assert!((scene_fog_density(50.0) - 0.01).abs() < EPSILON);
    }
}
