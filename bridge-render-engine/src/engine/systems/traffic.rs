/// Per-frame traffic animation over a fixed-size car pool
use bevy::prelude::*;
use rand::Rng;

use crate::engine::core::app_state::SimulationParameters;
use crate::engine::render::instanced_render_plugin::{
    InstanceBatch, InstanceData, InstanceTransform,
};
use constants::colors;
use constants::dimensions::{BRIDGE_LENGTH, DECK_HEIGHT, ROAD_WIDTH};
use constants::simulation::{CAR_SPEED_SCALE, HIDDEN_POSITION, MAX_CARS};

const CAR_ROUGHNESS: f32 = 0.5;

/// Which of the three traffic instance batches an entity carries.
#[derive(Component, Clone, Copy, PartialEq, Eq)]
pub enum TrafficLayer {
    Chassis,
    Headlights,
    Taillights,
}

/// Static per-car properties, rolled once at startup. Only the derived
/// transforms change per frame; the agent itself persists for the process
/// lifetime, independent of the live density parameter.
#[derive(Debug, Clone, Copy)]
pub struct CarAgent {
    /// Signed speed; the sign encodes the direction of travel.
    pub speed: f32,
    /// Longitudinal start offset along the bridge.
    pub offset: f32,
    /// Static lateral jitter within the lane.
    pub lane_jitter: f32,
    pub color: Vec3,
    pub size: f32,
}

/// Fixed arena of car agents indexed 0..max_cars-1. The traffic density
/// activates an index prefix of it each frame; no agents are ever added or
/// removed.
#[derive(Resource)]
pub struct CarPool {
    pub agents: Vec<CarAgent>,
}

impl CarPool {
    pub fn generate(max_cars: usize, rng: &mut impl Rng) -> Self {
        let agents = (0..max_cars)
            .map(|_| {
                let direction = if rng.r#gen::<bool>() { 1.0 } else { -1.0 };
                let body = Color::hsl(rng.r#gen::<f32>() * 360.0, 0.8, 0.5).to_srgba();
                CarAgent {
                    speed: (0.2 + rng.r#gen::<f32>() * 0.3) * direction,
                    offset: rng.r#gen::<f32>() * BRIDGE_LENGTH,
                    lane_jitter: (rng.r#gen::<f32>() - 0.5) * (ROAD_WIDTH * 0.6),
                    color: Vec3::new(body.red, body.green, body.blue),
                    size: 0.8 + rng.r#gen::<f32>() * 0.4,
                }
            })
            .collect();
        Self { agents }
    }
}

impl Default for CarPool {
    fn default() -> Self {
        Self::generate(MAX_CARS, &mut rand::thread_rng())
    }
}

/// Number of active cars for a density in [0, 100]: an exact floor, and the
/// active set is always the pool prefix by index.
pub fn active_car_count(traffic_density: f32, max_cars: usize) -> usize {
    ((traffic_density / 100.0) * max_cars as f32).floor() as usize
}

/// Longitudinal car position: wraps over the bridge length, then recentred
/// to [-length/2, length/2).
pub fn longitudinal_position(time: f32, speed: f32, offset: f32, bridge_length: f32) -> f32 {
    let mut x = (time * CAR_SPEED_SCALE * speed + offset) % bridge_length;
    if x < 0.0 {
        x += bridge_length;
    }
    x - bridge_length / 2.0
}

/// Chassis transform for an active agent: lane by direction plus a fraction
/// of the static jitter, yaw facing the direction of travel, car-shaped
/// non-uniform scale.
pub fn chassis_transform(agent: &CarAgent, time: f32) -> InstanceTransform {
    let x = longitudinal_position(time, agent.speed, agent.offset, BRIDGE_LENGTH);
    let lane = if agent.speed > 0.0 {
        ROAD_WIDTH / 4.0
    } else {
        -ROAD_WIDTH / 4.0
    };
    let z = lane + agent.lane_jitter * 0.2;
    let yaw = if agent.speed > 0.0 {
        0.0
    } else {
        std::f32::consts::PI
    };

    InstanceTransform::with_yaw(
        Vec3::new(x, DECK_HEIGHT + 0.8, z),
        Vec3::new(agent.size * 2.0, agent.size, agent.size),
        yaw,
    )
}

/// The two light positions on one end of the car: ahead of the chassis for
/// headlights, behind for taillights, spread laterally either side.
fn light_pair(chassis: &InstanceTransform, agent: &CarAgent, ahead: bool) -> [InstanceTransform; 2]
{
    let travel = if agent.speed > 0.0 { 1.0 } else { -1.0 };
    let longitudinal = if ahead {
        travel * agent.size
    } else {
        -travel * agent.size
    };
    let base = chassis.position + Vec3::new(longitudinal, 0.0, 0.0);
    let scale = Vec3::splat(0.2);

    [
        InstanceTransform::new(base + Vec3::new(0.0, 0.0, 0.3), scale),
        InstanceTransform::new(base - Vec3::new(0.0, 0.0, 0.3), scale),
    ]
}

fn hidden_instance() -> InstanceTransform {
    InstanceTransform::new(HIDDEN_POSITION, Vec3::ONE)
}

/// Recompute every traffic instance for the frame. Inactive pool entries
/// are parked at the hidden sentinel rather than removed, so all three
/// batches keep their fixed sizes and are rewritten in full.
pub fn traffic_system(
    time: Res<Time>,
    params: Res<SimulationParameters>,
    pool: Res<CarPool>,
    mut batches: Query<(&mut InstanceBatch, &TrafficLayer)>,
) {
    let elapsed = time.elapsed_secs();
    let active = active_car_count(params.traffic_density, pool.agents.len());

    for (mut batch, layer) in &mut batches {
        batch.instances.clear();

        for (i, agent) in pool.agents.iter().enumerate() {
            if i >= active {
                let hidden = hidden_instance();
                match layer {
                    TrafficLayer::Chassis => {
                        batch.instances.push(InstanceData::lit(&hidden, agent.color, CAR_ROUGHNESS));
                    }
                    TrafficLayer::Headlights => {
                        batch
                            .instances
                            .extend([InstanceData::emissive(&hidden, colors::HEADLIGHT); 2]);
                    }
                    TrafficLayer::Taillights => {
                        batch
                            .instances
                            .extend([InstanceData::emissive(&hidden, colors::TAILLIGHT); 2]);
                    }
                }
                continue;
            }

            let chassis = chassis_transform(agent, elapsed);
            match layer {
                TrafficLayer::Chassis => {
                    batch
                        .instances
                        .push(InstanceData::lit(&chassis, agent.color, CAR_ROUGHNESS));
                }
                TrafficLayer::Headlights => {
                    for transform in light_pair(&chassis, agent, true) {
                        batch
                            .instances
                            .push(InstanceData::emissive(&transform, colors::HEADLIGHT));
                    }
                }
                TrafficLayer::Taillights => {
                    for transform in light_pair(&chassis, agent, false) {
                        batch
                            .instances
                            .push(InstanceData::emissive(&transform, colors::TAILLIGHT));
                    }
                }
            }
        }

        batch.needs_upload = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn test_pool(max_cars: usize) -> CarPool {
        CarPool::generate(max_cars, &mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn active_count_is_an_exact_floor() {
        assert_eq!(active_car_count(0.0, 400), 0);
        assert_eq!(active_car_count(100.0, 400), 400);
        assert_eq!(active_car_count(50.0, 400), 200);
        assert_eq!(active_car_count(0.4, 400), 1);
        assert_eq!(active_car_count(0.2, 400), 0);
        assert_eq!(active_car_count(33.0, 7), 2);
    }

    #[test]
    fn pool_size_is_independent_of_density() {
        let pool = test_pool(50);
        assert_eq!(pool.agents.len(), 50);
        for agent in &pool.agents {
            let magnitude = agent.speed.abs();
            assert!((0.2..=0.5).contains(&magnitude));
            assert!((0.0..BRIDGE_LENGTH).contains(&agent.offset));
            assert!(agent.lane_jitter.abs() <= ROAD_WIDTH * 0.3);
            assert!((0.8..=1.2).contains(&agent.size));
        }
    }

    #[test]
    fn longitudinal_position_stays_in_half_open_range() {
        for step in 0..500 {
            let t = step as f32 * 0.73;
            let x = longitudinal_position(t, 0.42, 123.0, BRIDGE_LENGTH);
            assert!((-BRIDGE_LENGTH / 2.0..BRIDGE_LENGTH / 2.0).contains(&x));

            let backwards = longitudinal_position(t, -0.42, 123.0, BRIDGE_LENGTH);
            assert!((-BRIDGE_LENGTH / 2.0..BRIDGE_LENGTH / 2.0).contains(&backwards));
        }
    }

    #[test]
    fn position_wraps_by_exactly_one_bridge_length() {
        let speed = 0.3;
        // Time for one full lap: length / (scale * speed)
        let lap = BRIDGE_LENGTH / (CAR_SPEED_SCALE * speed);
        let before = longitudinal_position(10.0, speed, 50.0, BRIDGE_LENGTH);
        let after = longitudinal_position(10.0 + lap, speed, 50.0, BRIDGE_LENGTH);
        assert!((before - after).abs() < 1e-3);
    }

    #[test]
    fn cars_face_their_direction_of_travel() {
        let mut forward = test_pool(1).agents[0];
        forward.speed = 0.4;
        let mut reverse = forward;
        reverse.speed = -0.4;

        let f = chassis_transform(&forward, 3.0);
        let r = chassis_transform(&reverse, 3.0);
        assert!(f.rotation.angle_between(Quat::IDENTITY) < 1e-4);
        assert!(
            (r.rotation.angle_between(Quat::IDENTITY) - std::f32::consts::PI).abs() < 1e-4
        );
        // Opposite directions use opposite lanes
        assert!(f.position.z > 0.0 - ROAD_WIDTH * 0.3 * 0.2);
        assert!(r.position.z < 0.0 + ROAD_WIDTH * 0.3 * 0.2);
    }

    #[test]
    fn headlights_lead_and_taillights_trail() {
        let mut agent = test_pool(1).agents[0];
        agent.speed = 0.4;
        agent.lane_jitter = 0.0;

        let chassis = chassis_transform(&agent, 1.0);
        let heads = light_pair(&chassis, &agent, true);
        let tails = light_pair(&chassis, &agent, false);

        for light in &heads {
            assert!((light.position.x - (chassis.position.x + agent.size)).abs() < 1e-4);
        }
        for light in &tails {
            assert!((light.position.x - (chassis.position.x - agent.size)).abs() < 1e-4);
        }
        // Lateral spread is symmetric
        assert!((heads[0].position.z + heads[1].position.z - 2.0 * chassis.position.z).abs() < 1e-4);
    }

    #[test]
    fn inactive_cars_are_parked_at_the_sentinel() {
        // Density zero: every agent is inactive regardless of pool size
        let pool = test_pool(10);
        let active = active_car_count(0.0, pool.agents.len());
        assert_eq!(active, 0);

        for agent in &pool.agents {
            // The per-layer writer substitutes the sentinel for indices
            // past the cutoff; mirror that arithmetic here.
            let hidden = hidden_instance();
            assert_eq!(hidden.position, HIDDEN_POSITION);
            let data = InstanceData::lit(&hidden, agent.color, CAR_ROUGHNESS);
            assert_eq!(data.position[1], HIDDEN_POSITION.y);
        }
    }
}
