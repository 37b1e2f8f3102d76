//! Primary structure - louver blades and add-on targets of the loaded pergola

use crate::animation::{drive_group, slider_progress, MotionModel};
use crate::classify::{classify, ClassifiedParts, GroupRole, STRUCTURE_SELECTORS};
use crate::geometry::GeometryTable;
use crate::panel::MountPhase;
use crate::scene::{LoadedAsset, SceneCommand};
use crate::types::{Addon, NodeId, SizeVariant};
use std::collections::HashMap;

/// Louver slider range; the slider value is the blade angle in degrees
const LOUVER_MAX_DEGREES: f32 = 100.0;

/// The loaded primary structure of the current size
#[derive(Debug, Clone)]
pub struct Structure {
    pub root: NodeId,
    pub parts: ClassifiedParts,
    /// Add-on target meshes, resolved once at load time
    pub addon_targets: HashMap<Addon, NodeId>,
    louver_progress: Option<f32>,
}

impl Structure {
    pub fn from_asset(asset: &LoadedAsset, size: SizeVariant, table: &GeometryTable) -> Self {
        let parts = classify(asset, &STRUCTURE_SELECTORS);

        let mut addon_targets = HashMap::new();
        for addon in Addon::ALL {
            let target = table.addon_target(addon, size);
            match parts.find(&target) {
                Some(part) => {
                    addon_targets.insert(addon, part.node);
                }
                None => {
                    tracing::debug!(addon = addon.as_str(), mesh = %target, "Add-on target not in structure");
                }
            }
        }

        Self {
            root: asset.root,
            parts,
            addon_targets,
            louver_progress: None,
        }
    }

    pub fn louver_count(&self) -> usize {
        self.parts
            .group(GroupRole::Louver)
            .map_or(0, |group| group.members.len())
    }

    /// Current louver angle in degrees, if the slider was used
    pub fn louver_degrees(&self) -> Option<f32> {
        self.louver_progress.map(|p| p * LOUVER_MAX_DEGREES)
    }

    /// Rotate every louver blade about its local X axis.
    /// Returns false when the angle was already applied.
    pub fn set_louver_angle(&mut self, value: f32, commands: &mut Vec<SceneCommand>) -> bool {
        let progress = slider_progress(value);
        if self.louver_progress == Some(progress) {
            return false;
        }
        self.louver_progress = Some(progress);

        let Some(group) = self.parts.group(GroupRole::Louver).cloned() else {
            return true;
        };
        let model = MotionModel::Rotate {
            axis: 0,
            max_angle: LOUVER_MAX_DEGREES.to_radians(),
        };
        for index in drive_group(&mut self.parts.parts, &group, &model, progress) {
            let part = &self.parts.parts[index];
            commands.push(SceneCommand::SetTransform {
                node: part.node,
                transform: part.live,
            });
        }
        true
    }
}

/// Load lifecycle of the primary structure; one per configurator
#[derive(Debug, Default)]
pub struct StructureSlot {
    generation: u64,
    state: StructureState,
}

#[derive(Debug, Default)]
enum StructureState {
    #[default]
    Unmounted,
    Loading,
    Mounted(Structure),
}

impl StructureSlot {
    pub fn phase(&self) -> MountPhase {
        match self.state {
            StructureState::Unmounted => MountPhase::Unmounted,
            StructureState::Loading => MountPhase::Loading,
            StructureState::Mounted(_) => MountPhase::Mounted,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a fresh load, superseding any earlier one
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.state = StructureState::Loading;
        self.generation
    }

    pub fn is_awaiting(&self, generation: u64) -> bool {
        matches!(self.state, StructureState::Loading) && self.generation == generation
    }

    /// Loading -> Mounted. Returns false when `generation` is stale.
    pub fn complete_load(&mut self, generation: u64, structure: Structure) -> bool {
        if !self.is_awaiting(generation) {
            return false;
        }
        self.state = StructureState::Mounted(structure);
        true
    }

    pub fn fail_load(&mut self, generation: u64) -> bool {
        if !self.is_awaiting(generation) {
            return false;
        }
        self.state = StructureState::Unmounted;
        true
    }

    /// Drop the structure; returns its root node when one was mounted
    pub fn clear(&mut self) -> Option<NodeId> {
        self.generation += 1;
        match std::mem::take(&mut self.state) {
            StructureState::Mounted(structure) => Some(structure.root),
            _ => None,
        }
    }

    pub fn get(&self) -> Option<&Structure> {
        match &self.state {
            StructureState::Mounted(structure) => Some(structure),
            _ => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut Structure> {
        match &mut self.state {
            StructureState::Mounted(structure) => Some(structure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Bounds, MaterialInfo, MeshInfo};
    use crate::types::PartTransform;

    fn mesh(node: u64, parent: &str, world_y: f32) -> MeshInfo {
        MeshInfo {
            node: NodeId(node),
            parent_name: parent.to_string(),
            material: MaterialInfo {
                color: Some(0x888888),
                kind: "MeshStandardMaterial".to_string(),
            },
            transform: PartTransform::default(),
            world_y,
            bounds: Bounds::default(),
        }
    }

    fn asset() -> LoadedAsset {
        LoadedAsset {
            root: NodeId(1),
            meshes: vec![
                mesh(2, "post_fl", 1.2),
                mesh(3, "louver_1", 2.6),
                mesh(4, "louver_2", 2.6),
                mesh(5, "led_strip_10x10", 2.5),
            ],
        }
    }

    #[test]
    fn test_resolves_addon_target_for_size() {
        let table = GeometryTable::default();
        let structure = Structure::from_asset(&asset(), SizeVariant::S10x10, &table);
        assert_eq!(structure.addon_targets.get(&Addon::Lighting), Some(&NodeId(5)));
        assert_eq!(structure.louver_count(), 2);

        // Naming convention is keyed to the size
        let other = Structure::from_asset(&asset(), SizeVariant::S13x13, &table);
        assert!(other.addon_targets.is_empty());
    }

    #[test]
    fn test_louver_angle() {
        let table = GeometryTable::default();
        let mut structure = Structure::from_asset(&asset(), SizeVariant::S10x10, &table);
        let mut commands = Vec::new();

        assert!(structure.set_louver_angle(45.0, &mut commands));
        assert_eq!(commands.len(), 2);
        for part in &structure.parts.parts {
            if part.name.starts_with("louver") {
                assert!((part.live.rotation[0] - 45f32.to_radians()).abs() < 1e-5);
            } else {
                assert!(part.is_at_initial());
            }
        }
        assert!((structure.louver_degrees().unwrap() - 45.0).abs() < 1e-4);

        assert!(!structure.set_louver_angle(45.0, &mut commands));
        assert_eq!(commands.len(), 2);

        structure.set_louver_angle(0.0, &mut commands);
        assert!(structure.parts.parts.iter().all(|p| p.is_at_initial()));
    }

    #[test]
    fn test_slot_discards_superseded_load() {
        let table = GeometryTable::default();
        let mut slot = StructureSlot::default();
        let first = slot.begin_load();
        let second = slot.begin_load();
        assert_eq!(slot.phase(), MountPhase::Loading);

        let structure = Structure::from_asset(&asset(), SizeVariant::S10x10, &table);
        assert!(!slot.complete_load(first, structure.clone()));
        assert!(slot.complete_load(second, structure));
        assert_eq!(slot.phase(), MountPhase::Mounted);

        assert_eq!(slot.clear(), Some(NodeId(1)));
        assert_eq!(slot.phase(), MountPhase::Unmounted);
        assert!(!slot.fail_load(second));
    }
}
