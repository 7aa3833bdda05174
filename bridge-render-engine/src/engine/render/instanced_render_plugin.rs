use bevy::{
    core_pipeline::core_3d::Transparent3d,
    ecs::system::{SystemParamItem, lifetimeless::*},
    pbr::{
        MeshPipeline, MeshPipelineKey, RenderMeshInstances, SetMeshBindGroup, SetMeshViewBindGroup,
    },
    prelude::*,
    render::{
        Render, RenderApp, RenderSet,
        extract_component::{ExtractComponent, ExtractComponentPlugin},
        extract_resource::{ExtractResource, ExtractResourcePlugin},
        mesh::{
            MeshVertexBufferLayoutRef, RenderMesh, RenderMeshBufferInfo, allocator::MeshAllocator,
        },
        render_asset::RenderAssets,
        render_phase::{
            AddRenderCommand, DrawFunctions, PhaseItem, PhaseItemExtraIndex, RenderCommand,
            RenderCommandResult, SetItemPipeline, TrackedRenderPass, ViewSortedRenderPhases,
        },
        render_resource::*,
        renderer::RenderDevice,
        sync_world::MainEntity,
        view::ExtractedView,
    },
};
use bytemuck::{Pod, Zeroable};

const INSTANCED_SCENE_SHADER_PATH: &str = "shaders/instanced_scene.wgsl";

/// Instanced rendering for all box/sphere primitive batches in the scene:
/// bridge structure, traffic, and the night star field. Each batch entity
/// owns a dense per-class instance array that is uploaded as an
/// instance-rate vertex buffer.
pub struct InstancedSceneRenderPlugin;

impl Plugin for InstancedSceneRenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneLighting>()
            .add_plugins(ExtractComponentPlugin::<InstanceBatch>::default())
            .add_plugins(ExtractResourcePlugin::<SceneLighting>::default());

        let Some(render_app) = app.get_sub_app_mut(RenderApp) else {
            return;
        };

        render_app
            .add_render_command::<Transparent3d, DrawInstancedScene>()
            .init_resource::<SpecializedMeshPipelines<InstancedScenePipeline>>()
            .init_resource::<PreparedSceneLightingBindGroup>()
            .add_systems(
                Render,
                (
                    prepare_scene_lighting_bind_group.in_set(RenderSet::PrepareBindGroups),
                    queue_instanced_batches.in_set(RenderSet::QueueMeshes),
                    prepare_instance_buffers.in_set(RenderSet::PrepareResources),
                ),
            );
    }

    fn finish(&self, app: &mut App) {
        let Some(render_app) = app.get_sub_app_mut(RenderApp) else {
            return;
        };
        render_app.init_resource::<InstancedScenePipeline>();
    }
}

/// One placement of the shared unit primitive: position, rotation and
/// non-uniform scale, plus flat colour and emissive behaviour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl InstanceTransform {
    pub fn new(position: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale,
        }
    }

    pub fn with_yaw(position: Vec3, scale: Vec3, yaw: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw),
            scale,
        }
    }
}

/// GPU layout for one instance. `position.w` selects night-gated emissive
/// (beacons), `scale.w` carries the class roughness and `color.w` the
/// emissive strength; emissive instances ignore roughness.
#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct InstanceData {
    pub position: [f32; 4],
    pub rotation: [f32; 4],
    pub scale: [f32; 4],
    pub color: [f32; 4],
}

impl InstanceData {
    /// Plain lit instance with no emissive term.
    pub fn lit(transform: &InstanceTransform, color: Vec3, roughness: f32) -> Self {
        Self::pack(transform, color, roughness, 0.0, false)
    }

    /// Instance whose colour is always emitted at full strength (car lights,
    /// stars).
    pub fn emissive(transform: &InstanceTransform, color: Vec3) -> Self {
        Self::pack(transform, color, 1.0, 1.0, false)
    }

    /// Instance whose emissive term is scaled by the scene's night beacon
    /// boost (tower beacons, street lights).
    pub fn night_beacon(transform: &InstanceTransform, color: Vec3) -> Self {
        Self::pack(transform, color, 1.0, 1.0, true)
    }

    fn pack(
        transform: &InstanceTransform,
        color: Vec3,
        roughness: f32,
        strength: f32,
        night_gated: bool,
    ) -> Self {
        Self {
            position: [
                transform.position.x,
                transform.position.y,
                transform.position.z,
                if night_gated { 1.0 } else { 0.0 },
            ],
            rotation: transform.rotation.to_array(),
            scale: [
                transform.scale.x,
                transform.scale.y,
                transform.scale.z,
                roughness,
            ],
            color: [color.x, color.y, color.z, strength],
        }
    }
}

/// Dense instance array for one structural or traffic class. The consumer
/// re-uploads the whole array whenever `needs_upload` is set; dynamic
/// writers re-flag it every frame, static geometry is uploaded once when the
/// GPU buffer is first created.
#[derive(Component, Clone, ExtractComponent)]
pub struct InstanceBatch {
    pub instances: Vec<InstanceData>,
    pub needs_upload: bool,
}

impl InstanceBatch {
    /// Batch for geometry that never changes after startup.
    pub fn fixed(instances: Vec<InstanceData>) -> Self {
        Self {
            instances,
            needs_upload: false,
        }
    }

    /// Batch that a per-frame system rewrites in full.
    pub fn dynamic(instances: Vec<InstanceData>) -> Self {
        Self {
            instances,
            needs_upload: true,
        }
    }
}

/// Per-frame lighting snapshot shared by every instanced batch, published by
/// the atmosphere before extraction.
#[derive(Resource, Clone, ExtractResource)]
pub struct SceneLighting {
    pub sun_direction: Vec3,
    pub light_color: Vec3,
    pub light_intensity: f32,
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    pub fog_color: Vec3,
    pub fog_density: f32,
    pub beacon_boost: f32,
}

impl Default for SceneLighting {
    fn default() -> Self {
        Self {
            sun_direction: Vec3::Y,
            light_color: Vec3::ONE,
            light_intensity: 1.0,
            ambient_color: Vec3::ONE,
            ambient_intensity: 0.5,
            fog_color: Vec3::ZERO,
            fog_density: 0.0,
            beacon_boost: 0.0,
        }
    }
}

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct SceneLightingUniform {
    sun_direction: [f32; 4],
    light_color: [f32; 4],
    ambient_color: [f32; 4],
    fog_color: [f32; 4],
}

impl From<&SceneLighting> for SceneLightingUniform {
    fn from(lighting: &SceneLighting) -> Self {
        Self {
            sun_direction: [
                lighting.sun_direction.x,
                lighting.sun_direction.y,
                lighting.sun_direction.z,
                lighting.beacon_boost,
            ],
            light_color: [
                lighting.light_color.x,
                lighting.light_color.y,
                lighting.light_color.z,
                lighting.light_intensity,
            ],
            ambient_color: [
                lighting.ambient_color.x,
                lighting.ambient_color.y,
                lighting.ambient_color.z,
                lighting.ambient_intensity,
            ],
            fog_color: [
                lighting.fog_color.x,
                lighting.fog_color.y,
                lighting.fog_color.z,
                lighting.fog_density,
            ],
        }
    }
}

#[derive(Component)]
pub struct InstanceBuffer {
    pub buffer: Buffer,
    pub length: usize,
}

#[derive(Resource)]
struct InstancedScenePipeline {
    shader: Handle<Shader>,
    mesh_pipeline: MeshPipeline,
    lighting_bind_group_layout: BindGroupLayout,
}

impl FromWorld for InstancedScenePipeline {
    fn from_world(world: &mut World) -> Self {
        let mesh_pipeline = world.resource::<MeshPipeline>();
        let render_device = world.resource::<RenderDevice>();

        Self {
            shader: world.load_asset(INSTANCED_SCENE_SHADER_PATH),
            mesh_pipeline: mesh_pipeline.clone(),
            lighting_bind_group_layout: create_scene_lighting_bind_group_layout(render_device),
        }
    }
}

impl SpecializedMeshPipeline for InstancedScenePipeline {
    type Key = MeshPipelineKey;

    fn specialize(
        &self,
        key: Self::Key,
        layout: &MeshVertexBufferLayoutRef,
    ) -> Result<RenderPipelineDescriptor, SpecializedMeshPipelineError> {
        let mut descriptor = self.mesh_pipeline.specialize(key, layout)?;
        descriptor.vertex.shader = self.shader.clone();
        descriptor.vertex.buffers.push(VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as u64,
            step_mode: VertexStepMode::Instance,
            attributes: vec![
                // Position + night-gate flag
                VertexAttribute {
                    format: VertexFormat::Float32x4,
                    offset: 0,
                    shader_location: 3,
                },
                // Rotation quaternion
                VertexAttribute {
                    format: VertexFormat::Float32x4,
                    offset: 16,
                    shader_location: 4,
                },
                // Non-uniform scale
                VertexAttribute {
                    format: VertexFormat::Float32x4,
                    offset: 32,
                    shader_location: 5,
                },
                // Colour + emissive strength
                VertexAttribute {
                    format: VertexFormat::Float32x4,
                    offset: 48,
                    shader_location: 6,
                },
            ],
        });

        descriptor.fragment.as_mut().unwrap().shader = self.shader.clone();

        // Update layout to include the scene lighting bind group
        descriptor
            .layout
            .push(self.lighting_bind_group_layout.clone());

        Ok(descriptor)
    }
}

#[derive(Resource, Default)]
struct PreparedSceneLightingBindGroup {
    bind_group: Option<BindGroup>,
}

/// Upload instance arrays. A buffer is only rebuilt when the batch is
/// flagged for upload or no GPU buffer exists yet, so static classes upload
/// once and dynamic classes every frame.
fn prepare_instance_buffers(
    mut commands: Commands,
    query: Query<(Entity, &InstanceBatch, Option<&InstanceBuffer>)>,
    render_device: Res<RenderDevice>,
) {
    for (entity, batch, existing) in &query {
        if existing.is_some() && !batch.needs_upload {
            continue;
        }
        let buffer = render_device.create_buffer_with_data(&BufferInitDescriptor {
            label: Some("instance_batch_buffer"),
            contents: bytemuck::cast_slice(batch.instances.as_slice()),
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
        });
        commands.entity(entity).insert(InstanceBuffer {
            buffer,
            length: batch.instances.len(),
        });
    }
}

fn prepare_scene_lighting_bind_group(
    mut prepared: ResMut<PreparedSceneLightingBindGroup>,
    render_device: Res<RenderDevice>,
    lighting: Res<SceneLighting>,
    pipeline: Res<InstancedScenePipeline>,
) {
    let uniform = SceneLightingUniform::from(lighting.as_ref());
    let buffer = render_device.create_buffer_with_data(&BufferInitDescriptor {
        label: Some("scene_lighting_uniform"),
        contents: bytemuck::cast_slice(&[uniform]),
        usage: BufferUsages::UNIFORM,
    });

    let bind_group = render_device.create_bind_group(
        "scene_lighting_bind_group",
        &pipeline.lighting_bind_group_layout,
        &[BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    );

    prepared.bind_group = Some(bind_group);
}

fn queue_instanced_batches(
    transparent_3d_draw_functions: Res<DrawFunctions<Transparent3d>>,
    instanced_scene_pipeline: Res<InstancedScenePipeline>,
    mut pipelines: ResMut<SpecializedMeshPipelines<InstancedScenePipeline>>,
    pipeline_cache: Res<PipelineCache>,
    meshes: Res<RenderAssets<RenderMesh>>,
    render_mesh_instances: Res<RenderMeshInstances>,
    batches: Query<(Entity, &MainEntity), With<InstanceBatch>>,
    mut transparent_render_phases: ResMut<ViewSortedRenderPhases<Transparent3d>>,
    views: Query<(&ExtractedView, &Msaa)>,
) {
    let draw_instanced_scene = transparent_3d_draw_functions
        .read()
        .id::<DrawInstancedScene>();

    for (view, msaa) in &views {
        let Some(transparent_phase) = transparent_render_phases.get_mut(&view.retained_view_entity)
        else {
            continue;
        };

        let msaa_key = MeshPipelineKey::from_msaa_samples(msaa.samples());
        let view_key = msaa_key | MeshPipelineKey::from_hdr(view.hdr);
        let rangefinder = view.rangefinder3d();

        for (entity, main_entity) in &batches {
            // Hidden batches (the star field by day) are absent from the
            // extracted mesh instances and skip queueing entirely.
            let Some(mesh_instance) = render_mesh_instances.render_mesh_queue_data(*main_entity)
            else {
                continue;
            };
            let Some(mesh) = meshes.get(mesh_instance.mesh_asset_id) else {
                continue;
            };

            let key =
                view_key | MeshPipelineKey::from_primitive_topology(mesh.primitive_topology());
            let Ok(pipeline) = pipelines.specialize(
                &pipeline_cache,
                &instanced_scene_pipeline,
                key,
                &mesh.layout,
            ) else {
                continue;
            };

            transparent_phase.add(Transparent3d {
                entity: (entity, *main_entity),
                pipeline,
                draw_function: draw_instanced_scene,
                distance: rangefinder.distance_translation(&mesh_instance.translation),
                batch_range: 0..1,
                extra_index: PhaseItemExtraIndex::None,
                indexed: true,
            });
        }
    }
}

type DrawInstancedScene = (
    SetItemPipeline,
    SetMeshViewBindGroup<0>,
    SetMeshBindGroup<1>,
    SetSceneLightingBindGroup<2>,
    DrawMeshInstanced,
);

struct SetSceneLightingBindGroup<const I: usize>;

impl<P: PhaseItem, const I: usize> RenderCommand<P> for SetSceneLightingBindGroup<I> {
    type Param = SRes<PreparedSceneLightingBindGroup>;
    type ViewQuery = ();
    type ItemQuery = ();

    #[inline]
    fn render<'w>(
        _item: &P,
        _view: (),
        _entity: Option<()>,
        prepared: SystemParamItem<'w, '_, Self::Param>,
        pass: &mut TrackedRenderPass<'w>,
    ) -> RenderCommandResult {
        let prepared = prepared.into_inner();
        if let Some(bind_group) = &prepared.bind_group {
            pass.set_bind_group(I, bind_group, &[]);
            RenderCommandResult::Success
        } else {
            RenderCommandResult::Failure("missing scene lighting bind group")
        }
    }
}

struct DrawMeshInstanced;

impl<P: PhaseItem> RenderCommand<P> for DrawMeshInstanced {
    type Param = (
        SRes<RenderAssets<RenderMesh>>,
        SRes<RenderMeshInstances>,
        SRes<MeshAllocator>,
    );
    type ViewQuery = ();
    type ItemQuery = Read<InstanceBuffer>;

    #[inline]
    fn render<'w>(
        item: &P,
        _view: (),
        instance_buffer: Option<&'w InstanceBuffer>,
        (meshes, render_mesh_instances, mesh_allocator): SystemParamItem<'w, '_, Self::Param>,
        pass: &mut TrackedRenderPass<'w>,
    ) -> RenderCommandResult {
        let mesh_allocator = mesh_allocator.into_inner();

        let Some(mesh_instance) = render_mesh_instances.render_mesh_queue_data(item.main_entity())
        else {
            return RenderCommandResult::Skip;
        };
        let Some(gpu_mesh) = meshes.into_inner().get(mesh_instance.mesh_asset_id) else {
            return RenderCommandResult::Skip;
        };
        let Some(instance_buffer) = instance_buffer else {
            return RenderCommandResult::Skip;
        };
        let Some(vertex_buffer_slice) =
            mesh_allocator.mesh_vertex_slice(&mesh_instance.mesh_asset_id)
        else {
            return RenderCommandResult::Skip;
        };

        pass.set_vertex_buffer(0, vertex_buffer_slice.buffer.slice(..));
        pass.set_vertex_buffer(1, instance_buffer.buffer.slice(..));

        match &gpu_mesh.buffer_info {
            RenderMeshBufferInfo::Indexed {
                index_format,
                count,
            } => {
                let Some(index_buffer_slice) =
                    mesh_allocator.mesh_index_slice(&mesh_instance.mesh_asset_id)
                else {
                    return RenderCommandResult::Skip;
                };

                pass.set_index_buffer(index_buffer_slice.buffer.slice(..), 0, *index_format);
                pass.draw_indexed(
                    index_buffer_slice.range.start..(index_buffer_slice.range.start + count),
                    vertex_buffer_slice.range.start as i32,
                    0..instance_buffer.length as u32,
                );
            }
            RenderMeshBufferInfo::NonIndexed => {
                pass.draw(vertex_buffer_slice.range, 0..instance_buffer.length as u32);
            }
        }
        RenderCommandResult::Success
    }
}

fn create_scene_lighting_bind_group_layout(render_device: &RenderDevice) -> BindGroupLayout {
    render_device.create_bind_group_layout(
        "scene_lighting_layout",
        &[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX_FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    )
}
