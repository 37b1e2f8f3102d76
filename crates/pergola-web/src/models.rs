//! glTF model loading and scene command application
//!
//! Drains the configurator's scene commands once per frame. Loads go
//! through the asset server; once the scene is spawned and its transforms
//! have propagated, its meshes are described back to the core.

use bevy::asset::LoadState;
use bevy::color::LinearRgba;
use bevy::prelude::*;
use bevy::render::alpha::AlphaMode;
use bevy::camera::primitives::MeshAabb;
use pergola_core::{
    AssetRequest, Bounds, LoadError, LoadTicket, LoadedAsset, MaterialInfo, MaterialSpec,
    MeshInfo, NodeId, PartTransform, Placement, SceneCommand,
};
use std::collections::HashMap;

use crate::app::ConfiguratorState;

pub struct ModelsPlugin;

impl Plugin for ModelsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingLoads>()
            .init_resource::<MaterialOverrides>()
            .add_systems(Update, advance_animation)
            .add_systems(Update, apply_scene_commands.after(advance_animation))
            .add_systems(Update, poll_pending_loads.after(apply_scene_commands));
    }
}

/// Frames to wait for a spawned scene to produce meshes before giving up
const MAX_SPAWN_FRAMES: u32 = 600;

/// Marker on the root entity of every asset the configurator asked for
#[derive(Component)]
pub struct ConfiguratorAsset;

enum PendingState {
    Fetching(Handle<Gltf>),
    /// Scene root spawned; meshes appear once the scene spawner runs
    Spawned { root: Entity, frames: u32, settled: bool },
}

struct PendingLoad {
    ticket: LoadTicket,
    request: AssetRequest,
    state: PendingState,
}

/// Loads requested by the core and not yet answered
#[derive(Resource, Default)]
pub struct PendingLoads {
    loads: Vec<PendingLoad>,
}

/// Materials the configurator has taken over, per mesh entity
#[derive(Resource, Default)]
pub struct MaterialOverrides {
    /// Per-entity copies so glTF-shared materials are not recolored together
    owned: HashMap<Entity, Handle<StandardMaterial>>,
    /// Materials saved by `StashMaterial`
    stashed: HashMap<Entity, StandardMaterial>,
    /// Mesh entities reported for each spawned root
    meshes_by_root: HashMap<Entity, Vec<Entity>>,
}

impl MaterialOverrides {
    fn track_root(&mut self, root: Entity, meshes: Vec<Entity>) {
        self.meshes_by_root.insert(root, meshes);
    }

    /// Drop everything held for `root` and the meshes below it
    fn forget_root(&mut self, root: Entity) {
        let meshes = self.meshes_by_root.remove(&root).unwrap_or_default();
        for entity in std::iter::once(root).chain(meshes) {
            self.owned.remove(&entity);
            self.stashed.remove(&entity);
        }
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.owned.is_empty() && self.stashed.is_empty() && self.meshes_by_root.is_empty()
    }
}

pub fn node_of(entity: Entity) -> NodeId {
    NodeId(entity.to_bits())
}

pub fn entity_of(node: NodeId) -> Entity {
    Entity::from_bits(node.0)
}

fn placement_transform(placement: &Placement) -> Transform {
    Transform::from_translation(Vec3::from_array(placement.position))
        .with_rotation(Quat::from_rotation_y(placement.yaw))
}

fn part_transform(transform: &Transform) -> PartTransform {
    let (x, y, z) = transform.rotation.to_euler(EulerRot::XYZ);
    PartTransform {
        position: transform.translation.to_array(),
        rotation: [x, y, z],
        scale: transform.scale.to_array(),
    }
}

fn to_bevy_transform(transform: &PartTransform) -> Transform {
    let [rx, ry, rz] = transform.rotation;
    Transform {
        translation: Vec3::from_array(transform.position),
        rotation: Quat::from_euler(EulerRot::XYZ, rx, ry, rz),
        scale: Vec3::from_array(transform.scale),
    }
}

fn color_hex(color: Color) -> u32 {
    let srgba = color.to_srgba();
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
    (channel(srgba.red) << 16) | (channel(srgba.green) << 8) | channel(srgba.blue)
}

/// Write a resolved preset into a Bevy material
fn write_material(material: &mut StandardMaterial, spec: &MaterialSpec) {
    let (r, g, b) = spec.rgb();
    material.base_color = Color::srgba(r, g, b, spec.opacity);
    material.metallic = spec.metallic;
    material.perceptual_roughness = spec.roughness;
    let (er, eg, eb) = spec.emissive_rgb();
    material.emissive = LinearRgba::rgb(er, eg, eb);
    material.alpha_mode = if spec.is_transparent() {
        AlphaMode::Blend
    } else {
        AlphaMode::Opaque
    };
}

fn advance_animation(time: Res<Time>, mut state: ResMut<ConfiguratorState>) {
    state.0.tick(time.delta_secs());
}

/// Apply every queued scene command to the ECS world
fn apply_scene_commands(
    mut commands: Commands,
    mut state: ResMut<ConfiguratorState>,
    mut pending: ResMut<PendingLoads>,
    asset_server: Res<AssetServer>,
    mut transforms: Query<&mut Transform>,
    mesh_materials: Query<&MeshMaterial3d<StandardMaterial>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut overrides: ResMut<MaterialOverrides>,
) {
    if !state.0.has_pending_commands() {
        return;
    }

    for command in state.0.drain_commands() {
        match command {
            SceneCommand::Load { ticket, request } => {
                tracing::info!("Loading model: {}", request.url);
                let handle: Handle<Gltf> = asset_server.load(request.url.clone());
                pending.loads.push(PendingLoad {
                    ticket,
                    request,
                    state: PendingState::Fetching(handle),
                });
            }
            SceneCommand::Remove { node } => {
                let entity = entity_of(node);
                if let Ok(mut entity_commands) = commands.get_entity(entity) {
                    entity_commands.despawn();
                }
                overrides.forget_root(entity);
            }
            SceneCommand::SetTransform { node, transform } => {
                if let Ok(mut current) = transforms.get_mut(entity_of(node)) {
                    *current = to_bevy_transform(&transform);
                }
            }
            SceneCommand::SetMaterial { node, material } => {
                let entity = entity_of(node);
                let handle = match overrides.owned.get(&entity) {
                    Some(handle) => handle.clone(),
                    None => {
                        let Ok(shared) = mesh_materials.get(entity) else {
                            tracing::warn!("Mesh {:?} has no MeshMaterial3d<StandardMaterial>", entity);
                            continue;
                        };
                        let cloned = materials.get(&shared.0).cloned().unwrap_or_default();
                        let handle = materials.add(cloned);
                        commands.entity(entity).insert(MeshMaterial3d(handle.clone()));
                        overrides.owned.insert(entity, handle.clone());
                        handle
                    }
                };
                if let Some(target) = materials.get_mut(&handle) {
                    write_material(target, &material);
                }
            }
            SceneCommand::StashMaterial { node } => {
                let entity = entity_of(node);
                let handle = overrides
                    .owned
                    .get(&entity)
                    .cloned()
                    .or_else(|| mesh_materials.get(entity).ok().map(|m| m.0.clone()));
                if let Some(current) = handle.and_then(|h| materials.get(&h).cloned()) {
                    overrides.stashed.insert(entity, current);
                }
            }
            SceneCommand::RestoreMaterial { node } => {
                let entity = entity_of(node);
                let Some(original) = overrides.stashed.remove(&entity) else {
                    continue;
                };
                let handle = materials.add(original);
                commands.entity(entity).insert(MeshMaterial3d(handle.clone()));
                overrides.owned.insert(entity, handle);
            }
        }
    }
}

/// Advance pending loads: fetch -> spawn -> describe to the core
fn poll_pending_loads(
    mut commands: Commands,
    mut state: ResMut<ConfiguratorState>,
    mut pending: ResMut<PendingLoads>,
    mut overrides: ResMut<MaterialOverrides>,
    asset_server: Res<AssetServer>,
    gltf_assets: Res<Assets<Gltf>>,
    children_query: Query<&Children>,
    mesh_query: Query<(&Mesh3d, &Transform, &GlobalTransform, Option<&ChildOf>)>,
    names: Query<&Name>,
    mesh_materials: Query<&MeshMaterial3d<StandardMaterial>>,
    materials: Res<Assets<StandardMaterial>>,
    meshes: Res<Assets<Mesh>>,
) {
    let mut finished = Vec::new();

    for (index, load) in pending.loads.iter_mut().enumerate() {
        match &mut load.state {
            PendingState::Fetching(handle) => match asset_server.get_load_state(handle.id()) {
                Some(LoadState::Loaded) => {
                    let scene = gltf_assets.get(&*handle).and_then(|gltf| {
                        gltf.default_scene
                            .clone()
                            .or_else(|| gltf.scenes.first().cloned())
                    });
                    let Some(scene) = scene else {
                        finished.push((index, Err(LoadError::Empty(load.request.url.clone()))));
                        continue;
                    };
                    let root = commands
                        .spawn((
                            SceneRoot(scene),
                            placement_transform(&load.request.placement),
                            ConfiguratorAsset,
                        ))
                        .id();
                    load.state = PendingState::Spawned {
                        root,
                        frames: 0,
                        settled: false,
                    };
                }
                Some(LoadState::Failed(err)) => {
                    tracing::error!("Failed to load model: {}", load.request.url);
                    finished.push((
                        index,
                        Err(LoadError::Failed {
                            url: load.request.url.clone(),
                            reason: err.to_string(),
                        }),
                    ));
                }
                _ => {
                    // Still loading
                }
            },
            PendingState::Spawned { root, frames, settled } => {
                *frames += 1;
                let mut mesh_entities = Vec::new();
                collect_meshes(*root, &children_query, &mesh_query, &mut mesh_entities);

                if mesh_entities.is_empty() {
                    if *frames > MAX_SPAWN_FRAMES {
                        commands.entity(*root).despawn();
                        finished.push((index, Err(LoadError::Empty(load.request.url.clone()))));
                    }
                    continue;
                }
                // Global transforms propagate after the frame the meshes appear
                if !*settled {
                    *settled = true;
                    continue;
                }

                overrides.track_root(*root, mesh_entities.clone());
                let meshes_info = mesh_entities
                    .into_iter()
                    .filter_map(|entity| {
                        describe_mesh(entity, &mesh_query, &names, &mesh_materials, &materials, &meshes)
                    })
                    .collect();
                finished.push((
                    index,
                    Ok(LoadedAsset {
                        root: node_of(*root),
                        meshes: meshes_info,
                    }),
                ));
            }
        }
    }

    // Answer in reverse so earlier indices stay valid
    for (index, result) in finished.into_iter().rev() {
        let load = pending.loads.remove(index);
        state.0.on_asset_loaded(load.ticket, result);
    }
}

/// Mesh entities below `entity`, in traversal order
fn collect_meshes(
    entity: Entity,
    children_query: &Query<&Children>,
    mesh_query: &Query<(&Mesh3d, &Transform, &GlobalTransform, Option<&ChildOf>)>,
    found: &mut Vec<Entity>,
) {
    if mesh_query.contains(entity) {
        found.push(entity);
    }
    if let Ok(children) = children_query.get(entity) {
        for child in children.iter() {
            collect_meshes(child, children_query, mesh_query, found);
        }
    }
}

fn describe_mesh(
    entity: Entity,
    mesh_query: &Query<(&Mesh3d, &Transform, &GlobalTransform, Option<&ChildOf>)>,
    names: &Query<&Name>,
    mesh_materials: &Query<&MeshMaterial3d<StandardMaterial>>,
    materials: &Assets<StandardMaterial>,
    meshes: &Assets<Mesh>,
) -> Option<MeshInfo> {
    let (mesh, transform, global, child_of) = mesh_query.get(entity).ok()?;

    // glTF primitives hang off the named node that owns the mesh
    let parent_name = child_of
        .and_then(|child_of| names.get(child_of.parent()).ok())
        .or_else(|| names.get(entity).ok())
        .map(|name| name.as_str().to_string())
        .unwrap_or_default();

    let material = mesh_materials
        .get(entity)
        .ok()
        .and_then(|handle| materials.get(&handle.0));
    let material = match material {
        Some(material) => MaterialInfo {
            color: material
                .base_color_texture
                .is_none()
                .then(|| color_hex(material.base_color)),
            kind: match material.alpha_mode {
                AlphaMode::Opaque => "StandardMaterial".to_string(),
                _ => "TransparentMaterial".to_string(),
            },
        },
        None => MaterialInfo {
            color: None,
            kind: "UnknownMaterial".to_string(),
        },
    };

    let bounds = meshes
        .get(&mesh.0)
        .and_then(|mesh| mesh.compute_aabb())
        .map(|aabb| {
            let center = Vec3::from(aabb.center);
            let half = Vec3::from(aabb.half_extents);
            Bounds {
                min: (center - half).to_array(),
                max: (center + half).to_array(),
            }
        })
        .unwrap_or_default();

    Some(MeshInfo {
        node: node_of(entity),
        parent_name,
        material,
        transform: part_transform(transform),
        world_y: global.translation().y,
        bounds,
    })
}
