//! Add-on toggles: Inactive -> Active -> Removed -> Inactive
//!
//! Activating swaps the target mesh's material for an emissive preset after
//! stashing the original once; closing restores the stash and forgets it.

use crate::scene::SceneCommand;
use crate::theme::MaterialPreset;
use crate::types::{Addon, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddonPhase {
    #[default]
    Inactive,
    Active,
    /// Just turned off; the next toggle only clears the marker
    Removed,
}

#[derive(Debug, Default)]
pub struct AddonBoard {
    phases: HashMap<Addon, AddonPhase>,
    /// Nodes whose original material is stashed on the host
    stashed: HashMap<Addon, NodeId>,
}

impl AddonBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, addon: Addon) -> AddonPhase {
        self.phases.get(&addon).copied().unwrap_or_default()
    }

    /// Nodes currently showing an add-on material
    pub fn lit_nodes(&self) -> HashSet<NodeId> {
        self.stashed
            .iter()
            .filter(|(addon, _)| self.phase(**addon) == AddonPhase::Active)
            .map(|(_, node)| *node)
            .collect()
    }

    /// Advance an add-on one step. `target` is the add-on's mesh in the
    /// current structure; without one, activation warns and changes nothing.
    pub fn toggle(
        &mut self,
        addon: Addon,
        target: Option<NodeId>,
        commands: &mut Vec<SceneCommand>,
    ) -> AddonPhase {
        let next = match self.phase(addon) {
            AddonPhase::Inactive => {
                let Some(node) = target else {
                    tracing::warn!(addon = addon.as_str(), "Add-on target mesh not found in current structure");
                    return AddonPhase::Inactive;
                };
                if !self.stashed.contains_key(&addon) {
                    commands.push(SceneCommand::StashMaterial { node });
                    self.stashed.insert(addon, node);
                }
                commands.push(SceneCommand::SetMaterial {
                    node,
                    material: MaterialPreset::Lighting.spec(),
                });
                AddonPhase::Active
            }
            AddonPhase::Active => {
                if let Some(node) = self.stashed.remove(&addon) {
                    commands.push(SceneCommand::RestoreMaterial { node });
                }
                AddonPhase::Removed
            }
            AddonPhase::Removed => AddonPhase::Inactive,
        };

        tracing::info!(addon = addon.as_str(), phase = ?next, "Add-on toggled");
        self.phases.insert(addon, next);
        next
    }

    /// Forget every add-on; the structure they pointed into is gone
    pub fn reset(&mut self) {
        self.phases.clear();
        self.stashed.clear();
    }
}
