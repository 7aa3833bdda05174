/// Displaced-plane water surface material and its per-frame uniform feed
use bevy::{
    prelude::*,
    reflect::TypePath,
    render::render_resource::{AsBindGroup, ShaderRef, ShaderType},
};

use crate::engine::core::app_state::SimulationParameters;
use crate::engine::scene::atmosphere::{AtmosphereState, sun_direction};
use constants::colors;

/// Uniform block consumed by `shaders/water.wgsl`. Field order and packing
/// mirror the WGSL struct.
#[derive(Debug, Clone, Copy, ShaderType)]
pub struct WaterUniform {
    pub deep_color: Vec4,
    pub shallow_color: Vec4,
    pub sun_direction: Vec4,
    pub fog_color: Vec4,
    pub time: f32,
    pub fog_density: f32,
    pub _padding: Vec2,
}

impl Default for WaterUniform {
    fn default() -> Self {
        Self {
            deep_color: colors::WATER_DEEP.extend(1.0),
            shallow_color: colors::WATER_SHALLOW.extend(1.0),
            sun_direction: Vec4::new(0.0, 50.0, 0.0, 0.0),
            fog_color: Vec4::ZERO,
            time: 0.0,
            fog_density: 0.0,
            _padding: Vec2::ZERO,
        }
    }
}

/// Custom water shader material: two travelling waves plus value noise
/// displace the plane, the fragment stage blends deep/shallow colour, adds
/// a synthetic-normal specular and applies exponential-squared fog.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone, Default)]
pub struct WaterMaterial {
    #[uniform(0)]
    pub params: WaterUniform,
}

impl Material for WaterMaterial {
    fn vertex_shader() -> ShaderRef {
        "shaders/water.wgsl".into()
    }

    fn fragment_shader() -> ShaderRef {
        "shaders/water.wgsl".into()
    }
}

/// Refresh every water material after the atmosphere has published its
/// frame state: elapsed time, sun direction (same angle family as the
/// atmosphere, z offset -50) and the atmosphere's fog colour. Fog density
/// is forwarded raw in its 0-100 range; the shader applies the 0.005 scale.
pub fn update_water_material(
    time: Res<Time>,
    params: Res<SimulationParameters>,
    atmosphere: Res<AtmosphereState>,
    mut materials: ResMut<Assets<WaterMaterial>>,
) {
    let sun = sun_direction(params.time_of_day, -50.0);
    for (_, material) in materials.iter_mut() {
        material.params.time = time.elapsed_secs();
        material.params.sun_direction = sun.extend(0.0);
        material.params.fog_density = params.fog_density;
        material.params.fog_color = atmosphere.fog_color.extend(1.0);
    }
}

// CPU mirrors of the WGSL surface functions, kept in lockstep with
// assets/shaders/water.wgsl so the maths stays unit-testable.

/// GLSL-style fract: always in [0, 1).
fn fract_glsl(v: f32) -> f32 {
    v - v.floor()
}

/// Hash of a 2D lattice point into [0, 1).
pub fn hash_2d(p: Vec2) -> f32 {
    fract_glsl((p.dot(Vec2::new(12.9898, 78.233))).sin() * 43758.5453123)
}

/// Bilinear value noise: hashed lattice corners blended with a smooth
/// Hermite weight.
pub fn value_noise(p: Vec2) -> f32 {
    let i = p.floor();
    let f = p - i;

    let a = hash_2d(i);
    let b = hash_2d(i + Vec2::new(1.0, 0.0));
    let c = hash_2d(i + Vec2::new(0.0, 1.0));
    let d = hash_2d(i + Vec2::new(1.0, 1.0));

    let u = f * f * (Vec2::splat(3.0) - 2.0 * f);
    a + (b - a) * u.x + (c - a) * u.y * (1.0 - u.x) + (d - b) * u.x * u.y
}

/// Vertex displacement: two travelling waves on different axes and phase
/// speeds plus a noise term.
pub fn surface_height(x: f32, z: f32, time: f32) -> f32 {
    let wave1 = (x * 0.1 + time * 0.5).sin() * 0.5;
    let wave2 = (z * 0.05 + time * 0.3).cos() * 0.5;
    let noise = value_noise(Vec2::new(x, z) * 0.2 + Vec2::splat(time * 0.2)) * 0.8;
    wave1 + wave2 + noise
}

/// Exponential-squared fog blend factor from view distance and the raw
/// 0-100 fog density parameter.
pub fn fog_factor(distance: f32, fog_density: f32) -> f32 {
    let k = distance * fog_density * 0.005;
    1.0 - (-(k * k)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_density_means_no_fog_at_any_distance() {
        for distance in [0.0, 10.0, 250.0, 10_000.0] {
            assert_eq!(fog_factor(distance, 0.0), 0.0);
        }
    }

    #[test]
    fn fog_grows_with_distance_and_saturates() {
        let near = fog_factor(10.0, 50.0);
        let mid = fog_factor(100.0, 50.0);
        let far = fog_factor(5_000.0, 50.0);
        assert!(near < mid && mid < far);
        assert!(far <= 1.0);
        assert!((fog_factor(100_000.0, 100.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn value_noise_stays_in_unit_range() {
        for i in 0..200 {
            let p = Vec2::new(i as f32 * 0.37 - 20.0, i as f32 * 0.91 - 40.0);
            let n = value_noise(p);
            assert!((0.0..=1.0).contains(&n), "noise {n} at {p}");
        }
    }

    #[test]
    fn value_noise_interpolates_corner_hashes() {
        // At integer lattice points the noise equals the corner hash
        let p = Vec2::new(3.0, -7.0);
        assert!((value_noise(p) - hash_2d(p)).abs() < 1e-4);
    }

    #[test]
    fn surface_height_is_bounded() {
        // Two half-amplitude waves plus 0.8 noise: |h| <= 1.8
        for i in 0..100 {
            let x = i as f32 * 7.3 - 350.0;
            let z = i as f32 * 3.1 - 150.0;
            let h = surface_height(x, z, i as f32 * 0.25);
            assert!(h.is_finite());
            assert!((-1.1..=1.9).contains(&h), "height {h}");
        }
    }
}
