use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;
use bevy::render::view::NoFrustumCulling;
use rand::Rng;

use crate::engine::core::app_state::{FpsText, SimulationParameters};
use crate::engine::core::window_config::create_window_config;
use crate::engine::render::instanced_render_plugin::{
    InstanceBatch, InstanceData, InstanceTransform, InstancedSceneRenderPlugin,
};
use crate::engine::scene::atmosphere::{
    AtmosphereState, SceneSun, SkyDome, StarField, apply_atmosphere,
};
use crate::engine::scene::bridge::{BridgeDimensions, BridgeGeometry, StructuralClass};
use crate::engine::scene::water::{WaterMaterial, update_water_material};
use crate::engine::systems::fps_tracking::fps_text_update_system;
use crate::engine::systems::parameters::parameter_input_system;
use crate::engine::systems::traffic::{CarPool, TrafficLayer, traffic_system};
use constants::colors;
use constants::dimensions::{WATER_LEVEL, WATER_SIZE};
use constants::simulation::{MAX_CARS, STAR_COUNT, STAR_DOME_RADIUS};

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .add_plugins(MaterialPlugin::<WaterMaterial>::default())
        .add_plugins(InstancedSceneRenderPlugin)
        .add_plugins(FrameTimeDiagnosticsPlugin::default());

    app.init_resource::<SimulationParameters>()
        .init_resource::<AtmosphereState>()
        .init_resource::<CarPool>()
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            // Atmosphere publishes before the water and instanced-scene
            // consumers read it; traffic publishes before extraction.
            (
                parameter_input_system,
                apply_atmosphere,
                update_water_material,
                traffic_system,
            )
                .chain(),
        )
        .add_systems(Update, fps_text_update_system);

    app
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}

/// One-time scene construction: camera, sun, bridge instance batches,
/// traffic batches, star field, sky dome, water plane and the FPS overlay.
fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut water_materials: ResMut<Assets<WaterMaterial>>,
) {
    println!("=== VOXEL BRIDGE SCENE ===");

    let unit_cube = meshes.add(Cuboid::new(1.0, 1.0, 1.0));
    let unit_sphere = meshes.add(Sphere::new(1.0).mesh().uv(8, 8));

    spawn_camera(&mut commands);
    spawn_sun(&mut commands);
    spawn_bridge(&mut commands, &unit_cube, &unit_sphere);
    spawn_traffic_batches(&mut commands, &unit_cube);
    spawn_star_field(&mut commands, &unit_sphere);
    spawn_sky_dome(&mut commands, &mut meshes, &mut materials);
    spawn_water(&mut commands, &mut meshes, &mut water_materials);
    spawn_ui(&mut commands);
}

fn spawn_camera(commands: &mut Commands) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(50.0, 40.0, 80.0).looking_at(Vec3::new(0.0, 15.0, 0.0), Vec3::Y),
        DistanceFog {
            color: Color::srgb(
                colors::FOG_DAY.x,
                colors::FOG_DAY.y,
                colors::FOG_DAY.z,
            ),
            falloff: FogFalloff::ExponentialSquared { density: 0.002 },
            ..default()
        },
    ));
}

fn spawn_sun(commands: &mut Commands) {
    commands.spawn((
        DirectionalLight {
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
        SceneSun,
    ));
}

/// Generate the bridge once and spawn one batch entity per structural
/// class. The counts never change afterwards; the batches upload on their
/// first frame and stay resident.
fn spawn_bridge(commands: &mut Commands, unit_cube: &Handle<Mesh>, unit_sphere: &Handle<Mesh>) {
    let geometry = BridgeGeometry::generate(&BridgeDimensions::default());

    let classes = [
        StructuralClass::PrimaryMember,
        StructuralClass::ConcreteBase,
        StructuralClass::RoadDeck,
        StructuralClass::Cable,
        StructuralClass::LightBeacon,
    ];

    for class in classes {
        let appearance = class.appearance();
        let instances: Vec<InstanceData> = geometry
            .class_instances(class)
            .iter()
            .map(|transform| {
                if appearance.emissive {
                    InstanceData::night_beacon(transform, appearance.color)
                } else {
                    InstanceData::lit(transform, appearance.color, appearance.roughness)
                }
            })
            .collect();

        println!(
            "  {:?}: {} instances",
            class,
            instances.len()
        );

        let mesh = if class == StructuralClass::LightBeacon {
            unit_sphere.clone()
        } else {
            unit_cube.clone()
        };

        commands.spawn((
            Mesh3d(mesh),
            InstanceBatch::fixed(instances),
            class,
            Transform::IDENTITY,
            Visibility::Visible,
            NoFrustumCulling,
        ));
    }
}

/// Three dynamic batches rewritten in full every frame by the traffic
/// system: chassis boxes plus headlight and taillight cubes.
fn spawn_traffic_batches(commands: &mut Commands, unit_cube: &Handle<Mesh>) {
    for layer in [
        TrafficLayer::Chassis,
        TrafficLayer::Headlights,
        TrafficLayer::Taillights,
    ] {
        commands.spawn((
            Mesh3d(unit_cube.clone()),
            InstanceBatch::dynamic(Vec::with_capacity(MAX_CARS * 2)),
            layer,
            Transform::IDENTITY,
            Visibility::Visible,
            NoFrustumCulling,
        ));
    }
}

/// Random emissive points on an upper dome, visible only while the sky is
/// in its night window.
fn spawn_star_field(commands: &mut Commands, unit_sphere: &Handle<Mesh>) {
    let mut rng = rand::thread_rng();
    let instances: Vec<InstanceData> = (0..STAR_COUNT)
        .map(|_| {
            let azimuth = rng.r#gen::<f32>() * std::f32::consts::TAU;
            let elevation = rng.r#gen::<f32>() * std::f32::consts::FRAC_PI_2 * 0.95;
            let radius = STAR_DOME_RADIUS + rng.r#gen::<f32>() * 50.0;
            let position = Vec3::new(
                azimuth.cos() * elevation.cos() * radius,
                elevation.sin() * radius,
                azimuth.sin() * elevation.cos() * radius,
            );
            let size = 0.2 + rng.r#gen::<f32>() * 0.3;
            InstanceData::emissive(
                &InstanceTransform::new(position, Vec3::splat(size)),
                Vec3::ONE,
            )
        })
        .collect();

    commands.spawn((
        Mesh3d(unit_sphere.clone()),
        InstanceBatch::fixed(instances),
        StarField,
        Transform::IDENTITY,
        Visibility::Hidden,
        NoFrustumCulling,
    ));
}

/// Unlit inside-out sphere standing in for the procedural day sky; the
/// atmosphere re-tints it every frame and hides it at night.
fn spawn_sky_dome(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
) {
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(
            colors::SKY_DAY_TOP.x,
            colors::SKY_DAY_TOP.y,
            colors::SKY_DAY_TOP.z,
        ),
        unlit: true,
        cull_mode: None,
        double_sided: true,
        ..default()
    });

    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(600.0).mesh().uv(16, 16))),
        MeshMaterial3d(material),
        SkyDome,
        Transform::IDENTITY,
        Visibility::Visible,
        NoFrustumCulling,
    ));
}

fn spawn_water(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    water_materials: &mut ResMut<Assets<WaterMaterial>>,
) {
    let mesh = meshes.add(
        Plane3d::default()
            .mesh()
            .size(WATER_SIZE, WATER_SIZE)
            .subdivisions(128),
    );

    commands.spawn((
        Mesh3d(mesh),
        MeshMaterial3d(water_materials.add(WaterMaterial::default())),
        Transform::from_xyz(0.0, WATER_LEVEL, 0.0),
        NoFrustumCulling,
    ));
}

fn spawn_ui(commands: &mut Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("FPS: "),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(1., 0., 0.)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    right: Val::Px(12.0),
                    ..default()
                },
                FpsText,
            ));
        });
}
