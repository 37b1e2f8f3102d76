//! Panel state - per side and family mount lifecycle
//!
//! ```text
//! Unmounted --toggle--> Loading --load ok--> Mounted --toggle--> Unmounted
//!                          |
//!                          +--load failed--> Unmounted
//! ```
//!
//! Every load gets a fresh generation number. Completions and animation
//! frames carrying an older generation belong to a released mount.

use crate::animation::{drive_group, slider_progress, FrameOutcome, MotionModel, SessionKey};
use crate::classify::{ClassifiedParts, GroupRole};
use crate::geometry::GlassLayout;
use crate::scene::SceneCommand;
use crate::types::{NodeId, PanelFamily, Side};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mount phase reported to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountPhase {
    #[default]
    Unmounted,
    Loading,
    Mounted,
}

/// A mounted panel: its scene node, classified parts and group motion
#[derive(Debug, Clone)]
pub struct MountedPanel {
    pub root: NodeId,
    pub parts: ClassifiedParts,
    pub motions: HashMap<GroupRole, MotionModel>,
    pub layout: GlassLayout,
    /// Last slider progress applied, if any
    slider: Option<f32>,
}

impl MountedPanel {
    pub fn new(
        root: NodeId,
        parts: ClassifiedParts,
        motions: HashMap<GroupRole, MotionModel>,
        layout: GlassLayout,
    ) -> Self {
        Self {
            root,
            parts,
            motions,
            layout,
            slider: None,
        }
    }

    pub fn slider(&self) -> Option<f32> {
        self.slider
    }

    /// Drive one group to `progress`, emitting the touched transforms
    pub fn drive_role(
        &mut self,
        role: GroupRole,
        progress: f32,
        commands: &mut Vec<SceneCommand>,
    ) -> FrameOutcome {
        let Some(group) = self.parts.group(role).cloned() else {
            return FrameOutcome::Empty;
        };
        if group.is_empty() {
            return FrameOutcome::Empty;
        }
        let model = self
            .motions
            .get(&role)
            .copied()
            .unwrap_or(MotionModel::Still);

        for index in drive_group(&mut self.parts.parts, &group, &model, progress) {
            let part = &self.parts.parts[index];
            commands.push(SceneCommand::SetTransform {
                node: part.node,
                transform: part.live,
            });
        }
        FrameOutcome::Applied
    }

    /// Drive every group to `progress`
    pub fn drive_all(&mut self, progress: f32, commands: &mut Vec<SceneCommand>) {
        let roles: Vec<GroupRole> = self.parts.groups.iter().map(|g| g.role).collect();
        for role in roles {
            self.drive_role(role, progress, commands);
        }
    }

    /// Slider-driven positioning from a 0..=100 value.
    /// Returns false when the value was already applied.
    pub fn apply_slider(&mut self, value: f32, commands: &mut Vec<SceneCommand>) -> bool {
        let progress = slider_progress(value);
        if self.slider == Some(progress) {
            return false;
        }
        self.drive_all(progress, commands);
        self.slider = Some(progress);
        true
    }

    pub fn roles(&self) -> Vec<GroupRole> {
        self.parts.groups.iter().map(|g| g.role).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub enum PanelMount {
    #[default]
    Unmounted,
    Loading {
        generation: u64,
        layout: GlassLayout,
    },
    Mounted {
        generation: u64,
        panel: MountedPanel,
    },
}

impl PanelMount {
    pub fn phase(&self) -> MountPhase {
        match self {
            PanelMount::Unmounted => MountPhase::Unmounted,
            PanelMount::Loading { .. } => MountPhase::Loading,
            PanelMount::Mounted { .. } => MountPhase::Mounted,
        }
    }
}

/// Mount table for every side × family
#[derive(Debug, Default)]
pub struct PanelBoard {
    mounts: HashMap<(Side, PanelFamily), PanelMount>,
    generations: HashMap<(Side, PanelFamily), u64>,
}

impl PanelBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, side: Side, family: PanelFamily) -> MountPhase {
        self.mounts
            .get(&(side, family))
            .map(PanelMount::phase)
            .unwrap_or_default()
    }

    /// Latest generation handed out for a slot
    pub fn generation(&self, side: Side, family: PanelFamily) -> u64 {
        self.generations.get(&(side, family)).copied().unwrap_or(0)
    }

    fn bump(&mut self, side: Side, family: PanelFamily) -> u64 {
        let generation = self.generations.entry((side, family)).or_insert(0);
        *generation += 1;
        *generation
    }

    /// Move an unmounted slot to Loading; returns the load's generation.
    /// `None` when the slot is not unmounted.
    pub fn begin_load(&mut self, side: Side, family: PanelFamily, layout: GlassLayout) -> Option<u64> {
        if self.phase(side, family) != MountPhase::Unmounted {
            return None;
        }
        let generation = self.bump(side, family);
        self.mounts
            .insert((side, family), PanelMount::Loading { generation, layout });
        Some(generation)
    }

    /// Layout of the load currently awaited for the slot, if `generation` is it
    pub fn awaiting(&self, side: Side, family: PanelFamily, generation: u64) -> Option<GlassLayout> {
        match self.mounts.get(&(side, family)) {
            Some(PanelMount::Loading { generation: g, layout }) if *g == generation => Some(*layout),
            _ => None,
        }
    }

    pub fn is_awaiting(&self, side: Side, family: PanelFamily, generation: u64) -> bool {
        self.awaiting(side, family, generation).is_some()
    }

    /// Loading -> Mounted. Returns the panel back when the load is stale.
    pub fn complete_load(
        &mut self,
        side: Side,
        family: PanelFamily,
        generation: u64,
        panel: MountedPanel,
    ) -> Result<(), MountedPanel> {
        if !self.is_awaiting(side, family, generation) {
            return Err(panel);
        }
        self.mounts
            .insert((side, family), PanelMount::Mounted { generation, panel });
        Ok(())
    }

    /// Loading -> Unmounted after a failed load. False when stale.
    pub fn fail_load(&mut self, side: Side, family: PanelFamily, generation: u64) -> bool {
        if !self.is_awaiting(side, family, generation) {
            return false;
        }
        self.mounts.insert((side, family), PanelMount::Unmounted);
        true
    }

    /// Any phase -> Unmounted. Returns the root node to remove, if mounted.
    /// The generation is bumped so in-flight loads and animations go stale.
    pub fn unmount(&mut self, side: Side, family: PanelFamily) -> Option<NodeId> {
        let previous = self.mounts.remove(&(side, family)).unwrap_or_default();
        if matches!(previous, PanelMount::Unmounted) {
            return None;
        }
        self.bump(side, family);
        match previous {
            PanelMount::Mounted { panel, .. } => Some(panel.root),
            _ => None,
        }
    }

    /// Unmount everything; returns the roots to remove
    pub fn clear_all(&mut self) -> Vec<NodeId> {
        let mut slots: Vec<(Side, PanelFamily)> = self.mounts.keys().copied().collect();
        slots.sort();
        slots
            .into_iter()
            .filter_map(|(side, family)| self.unmount(side, family))
            .collect()
    }

    pub fn mounted(&self, side: Side, family: PanelFamily) -> Option<&MountedPanel> {
        match self.mounts.get(&(side, family)) {
            Some(PanelMount::Mounted { panel, .. }) => Some(panel),
            _ => None,
        }
    }

    pub fn mounted_mut(&mut self, side: Side, family: PanelFamily) -> Option<&mut MountedPanel> {
        match self.mounts.get_mut(&(side, family)) {
            Some(PanelMount::Mounted { panel, .. }) => Some(panel),
            _ => None,
        }
    }

    /// All mounted panels, in side/family order
    pub fn iter_mounted(&self) -> impl Iterator<Item = (Side, PanelFamily, &MountedPanel)> {
        let mut slots: Vec<_> = self
            .mounts
            .iter()
            .filter_map(|(&(side, family), mount)| match mount {
                PanelMount::Mounted { panel, .. } => Some((side, family, panel)),
                _ => None,
            })
            .collect();
        slots.sort_by_key(|(side, family, _)| (*side, *family));
        slots.into_iter()
    }

    /// Apply one animation frame, checking the session's generation first
    pub fn drive(
        &mut self,
        key: &SessionKey,
        progress: f32,
        commands: &mut Vec<SceneCommand>,
    ) -> FrameOutcome {
        match self.mounts.get_mut(&(key.side, key.family)) {
            Some(PanelMount::Mounted { generation, panel }) if *generation == key.generation => {
                panel.drive_role(key.role, progress, commands)
            }
            _ => FrameOutcome::Stale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{AnimationGroup, PartRecord};
    use crate::scene::Bounds;
    use crate::types::PartTransform;

    fn panel(root: u64) -> MountedPanel {
        let parts = ClassifiedParts {
            parts: vec![
                PartRecord::new(NodeId(10), "door_leaf_1".to_string(), 1, PartTransform::default(), Bounds::default()),
                PartRecord::new(NodeId(11), "top_rail".to_string(), 2, PartTransform::default(), Bounds::default()),
            ],
            groups: vec![AnimationGroup { role: GroupRole::Door, members: vec![0] }],
        };
        let motions: HashMap<GroupRole, MotionModel> =
            [(GroupRole::Door, MotionModel::Translate { axis: 0, max_movement: 1.0 })]
                .into_iter()
                .collect();
        MountedPanel::new(NodeId(root), parts, motions, GlassLayout::Standalone)
    }

    #[test]
    fn test_mount_lifecycle() {
        let mut board = PanelBoard::new();
        assert_eq!(board.phase(Side::Front, PanelFamily::Glass), MountPhase::Unmounted);

        let generation = board.begin_load(Side::Front, PanelFamily::Glass, GlassLayout::Standalone).unwrap();
        assert_eq!(board.phase(Side::Front, PanelFamily::Glass), MountPhase::Loading);
        // Second toggle while loading does not start another load
        assert!(board.begin_load(Side::Front, PanelFamily::Glass, GlassLayout::Standalone).is_none());

        board.complete_load(Side::Front, PanelFamily::Glass, generation, panel(1)).unwrap();
        assert_eq!(board.phase(Side::Front, PanelFamily::Glass), MountPhase::Mounted);

        assert_eq!(board.unmount(Side::Front, PanelFamily::Glass), Some(NodeId(1)));
        assert_eq!(board.phase(Side::Front, PanelFamily::Glass), MountPhase::Unmounted);
        assert!(board.mounted(Side::Front, PanelFamily::Glass).is_none());
    }

    #[test]
    fn test_stale_completion_is_rejected() {
        let mut board = PanelBoard::new();
        let first = board.begin_load(Side::Left, PanelFamily::Zip, GlassLayout::Standalone).unwrap();
        assert_eq!(board.unmount(Side::Left, PanelFamily::Zip), None);
        let second = board.begin_load(Side::Left, PanelFamily::Zip, GlassLayout::Standalone).unwrap();
        assert!(second > first);

        assert!(board.complete_load(Side::Left, PanelFamily::Zip, first, panel(1)).is_err());
        assert!(!board.fail_load(Side::Left, PanelFamily::Zip, first));
        assert!(board.complete_load(Side::Left, PanelFamily::Zip, second, panel(2)).is_ok());
    }

    #[test]
    fn test_failed_load_returns_to_unmounted() {
        let mut board = PanelBoard::new();
        let generation = board.begin_load(Side::Rear, PanelFamily::Glass, GlassLayout::Standalone).unwrap();
        assert!(board.fail_load(Side::Rear, PanelFamily::Glass, generation));
        assert_eq!(board.phase(Side::Rear, PanelFamily::Glass), MountPhase::Unmounted);
        assert!(board.begin_load(Side::Rear, PanelFamily::Glass, GlassLayout::Standalone).is_some());
    }

    #[test]
    fn test_drive_checks_generation() {
        let mut board = PanelBoard::new();
        let generation = board.begin_load(Side::Front, PanelFamily::Glass, GlassLayout::Standalone).unwrap();
        board.complete_load(Side::Front, PanelFamily::Glass, generation, panel(1)).unwrap();

        let mut commands = Vec::new();
        let key = SessionKey {
            side: Side::Front,
            family: PanelFamily::Glass,
            role: GroupRole::Door,
            generation,
        };
        assert_eq!(board.drive(&key, 0.5, &mut commands), FrameOutcome::Applied);
        assert_eq!(commands.len(), 1);

        let old = SessionKey { generation: generation - 1, ..key };
        assert_eq!(board.drive(&old, 0.5, &mut commands), FrameOutcome::Stale);

        let shrink = SessionKey { role: GroupRole::Shrink, ..key };
        assert_eq!(board.drive(&shrink, 0.5, &mut commands), FrameOutcome::Empty);
    }

    #[test]
    fn test_slider_is_idempotent() {
        let mut p = panel(1);
        let mut commands = Vec::new();
        assert!(p.apply_slider(40.0, &mut commands));
        assert_eq!(commands.len(), 1);
        assert!(!p.apply_slider(40.0, &mut commands));
        assert_eq!(commands.len(), 1);
        assert!((p.parts.parts[0].live.position[0] + 0.4).abs() < 1e-6);

        assert!(p.apply_slider(0.0, &mut commands));
        assert!(p.parts.parts[0].is_at_initial());
    }

    #[test]
    fn test_clear_all() {
        let mut board = PanelBoard::new();
        let g = board.begin_load(Side::Front, PanelFamily::Glass, GlassLayout::Standalone).unwrap();
        board.complete_load(Side::Front, PanelFamily::Glass, g, panel(1)).unwrap();
        board.begin_load(Side::Right, PanelFamily::Zip, GlassLayout::Standalone).unwrap();

        let roots = board.clear_all();
        assert_eq!(roots, vec![NodeId(1)]);
        for side in Side::ALL {
            for family in PanelFamily::ALL {
                assert_eq!(board.phase(side, family), MountPhase::Unmounted);
            }
        }
        assert_eq!(board.iter_mounted().count(), 0);
    }
}
