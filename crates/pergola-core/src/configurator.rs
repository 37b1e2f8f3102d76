//! Configurator - the entry points a frontend calls
//!
//! Owns the current size and theme, the structure, every panel mount, the
//! add-on toggles and the animation driver. Nothing here talks to a
//! renderer: side effects are queued as [`SceneCommand`]s and drained by
//! the host once per frame. Asset loads are answered through
//! [`Configurator::on_asset_loaded`].

use crate::addon::{AddonBoard, AddonPhase};
use crate::animation::{
    AnimationDriver, Continuation, Direction, MotionModel, PlaySession, SessionKey,
};
use crate::classify::{classify, selectors_for};
use crate::config::Config;
use crate::geometry::{GeometryTable, GlassLayout};
use crate::panel::{MountPhase, MountedPanel, PanelBoard};
use crate::scene::{AssetRequest, LoadError, LoadTarget, LoadTicket, LoadedAsset, SceneCommand};
use crate::structure::{Structure, StructureSlot};
use crate::theme::{apply_theme, ThemeScope};
use crate::types::{Addon, PanelFamily, Placement, Side, SizeVariant, ThemeColor};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Mount state of one side × family, as shown by the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelStatus {
    pub side: Side,
    pub family: PanelFamily,
    pub phase: MountPhase,
    pub animating: bool,
    /// Last slider value applied (0..=100), if the slider was used
    pub open_percent: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonStatus {
    pub addon: Addon,
    pub phase: AddonPhase,
}

/// Snapshot of everything the UI reflects back to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfiguratorStatus {
    pub size: SizeVariant,
    pub theme: ThemeColor,
    pub structure: MountPhase,
    pub louver_degrees: Option<f32>,
    pub panels: Vec<PanelStatus>,
    pub addons: Vec<AddonStatus>,
}

pub struct Configurator {
    table: GeometryTable,
    mount_secs: f32,
    size: SizeVariant,
    theme: ThemeColor,
    structure: StructureSlot,
    panels: PanelBoard,
    addons: AddonBoard,
    driver: AnimationDriver,
    commands: Vec<SceneCommand>,
}

impl Configurator {
    pub fn new(config: &Config) -> Self {
        Self {
            table: GeometryTable::new(config.assets.clone()),
            mount_secs: config.animation.mount_secs,
            size: config.defaults.size,
            theme: config.defaults.theme,
            structure: StructureSlot::default(),
            panels: PanelBoard::new(),
            addons: AddonBoard::new(),
            driver: AnimationDriver::new(),
            commands: Vec::new(),
        }
    }

    /// Request the primary structure of the configured size
    pub fn start(&mut self) {
        info!(size = %self.size, theme = self.theme.as_str(), "Starting configurator");
        self.load_structure();
    }

    pub fn size(&self) -> SizeVariant {
        self.size
    }

    pub fn theme(&self) -> ThemeColor {
        self.theme
    }

    pub fn table(&self) -> &GeometryTable {
        &self.table
    }

    /// Switch the structure size.
    ///
    /// Every panel goes back to Unmounted, running animations are dropped,
    /// add-ons reset, and the new structure is requested. Panels are not
    /// remounted.
    pub fn select_size(&mut self, size: SizeVariant) {
        if size == self.size && self.structure.phase() != MountPhase::Unmounted {
            debug!(size = %size, "Size already selected");
            return;
        }
        info!(from = %self.size, to = %size, "Changing size");

        self.driver.cancel_all();
        for root in self.panels.clear_all() {
            self.commands.push(SceneCommand::Remove { node: root });
        }
        if let Some(root) = self.structure.clear() {
            self.commands.push(SceneCommand::Remove { node: root });
        }
        self.addons.reset();

        self.size = size;
        self.load_structure();
    }

    fn load_structure(&mut self) {
        let generation = self.structure.begin_load();
        let url = self.table.structure_asset(self.size);
        debug!(url = %url, generation, "Requesting structure");
        self.commands.push(SceneCommand::Load {
            ticket: LoadTicket {
                target: LoadTarget::Structure,
                generation,
            },
            request: AssetRequest {
                url,
                placement: Placement::default(),
            },
        });
    }

    /// Toggle a panel. Returns the phase after the toggle.
    ///
    /// Unmounted starts a load; Mounted removes the panel at once with no
    /// teardown animation. A toggle while Loading is ignored.
    ///
    /// Glass placement is fixed when its load starts: inset when the zip on
    /// the same side is loading or mounted. Adding or removing the zip later
    /// does not move a glass panel that is already there.
    pub fn toggle_panel(&mut self, side: Side, family: PanelFamily) -> MountPhase {
        match self.panels.phase(side, family) {
            MountPhase::Unmounted => {
                let layout = self.glass_layout(side, family);
                let Some(generation) = self.panels.begin_load(side, family, layout) else {
                    return self.panels.phase(side, family);
                };
                let url = self.table.panel_asset(self.size, side, family);
                let placement = self.table.placement(self.size, side, family, layout);
                info!(side = %side, family = %family, url = %url, generation, "Mounting panel");
                self.commands.push(SceneCommand::Load {
                    ticket: LoadTicket {
                        target: LoadTarget::Panel { side, family },
                        generation,
                    },
                    request: AssetRequest { url, placement },
                });
                MountPhase::Loading
            }
            MountPhase::Loading => {
                warn!(side = %side, family = %family, "Panel is still loading, toggle ignored");
                MountPhase::Loading
            }
            MountPhase::Mounted => {
                self.driver.cancel_panel(side, family);
                if let Some(root) = self.panels.unmount(side, family) {
                    self.commands.push(SceneCommand::Remove { node: root });
                }
                info!(side = %side, family = %family, "Unmounted panel");
                MountPhase::Unmounted
            }
        }
    }

    /// Glass sits further in when a zip screen shares the side
    fn glass_layout(&self, side: Side, family: PanelFamily) -> GlassLayout {
        if family == PanelFamily::Glass
            && self.panels.phase(side, family.companion()) != MountPhase::Unmounted
        {
            GlassLayout::WithCompanion
        } else {
            GlassLayout::Standalone
        }
    }

    /// Completion of a `SceneCommand::Load`.
    ///
    /// Stale completions are discarded and their instantiated root removed.
    pub fn on_asset_loaded(&mut self, ticket: LoadTicket, result: Result<LoadedAsset, LoadError>) {
        match ticket.target {
            LoadTarget::Structure => self.structure_loaded(ticket.generation, result),
            LoadTarget::Panel { side, family } => {
                self.panel_loaded(side, family, ticket.generation, result)
            }
        }
    }

    fn discard_stale(&mut self, ticket: LoadTicket, result: Result<LoadedAsset, LoadError>) {
        debug!(load = ?ticket.target, generation = ticket.generation, "Discarding stale load");
        if let Ok(asset) = result {
            self.commands.push(SceneCommand::Remove { node: asset.root });
        }
    }

    fn structure_loaded(&mut self, generation: u64, result: Result<LoadedAsset, LoadError>) {
        if !self.structure.is_awaiting(generation) {
            let ticket = LoadTicket {
                target: LoadTarget::Structure,
                generation,
            };
            self.discard_stale(ticket, result);
            return;
        }

        let asset = match result {
            Ok(asset) => asset,
            Err(e) => {
                warn!(size = %self.size, error = %e, "Structure failed to load");
                self.structure.fail_load(generation);
                return;
            }
        };

        let structure = Structure::from_asset(&asset, self.size, &self.table);
        apply_theme(
            self.theme,
            ThemeScope::Structure,
            &structure.parts.parts,
            &self.addons.lit_nodes(),
            &mut self.commands,
        );
        info!(
            size = %self.size,
            parts = structure.parts.parts.len(),
            louvers = structure.louver_count(),
            "Structure mounted"
        );
        self.structure.complete_load(generation, structure);
    }

    fn panel_loaded(
        &mut self,
        side: Side,
        family: PanelFamily,
        generation: u64,
        result: Result<LoadedAsset, LoadError>,
    ) {
        let Some(layout) = self.panels.awaiting(side, family, generation) else {
            let ticket = LoadTicket {
                target: LoadTarget::Panel { side, family },
                generation,
            };
            self.discard_stale(ticket, result);
            return;
        };

        let asset = match result {
            Ok(asset) if asset.meshes.is_empty() => {
                let url = self.table.panel_asset(self.size, side, family);
                warn!(side = %side, family = %family, error = %LoadError::Empty(url), "Panel failed to load");
                self.commands.push(SceneCommand::Remove { node: asset.root });
                self.panels.fail_load(side, family, generation);
                return;
            }
            Ok(asset) => asset,
            Err(e) => {
                warn!(side = %side, family = %family, error = %e, "Panel failed to load");
                self.panels.fail_load(side, family, generation);
                return;
            }
        };

        let parts = classify(&asset, selectors_for(family));
        let limit = self.table.movement_limit(self.size, side, family);
        let slide = self.table.slide_params(family, self.size, side);
        let motions: HashMap<_, _> = parts
            .groups
            .iter()
            .map(|group| (group.role, MotionModel::for_role(group.role, limit, slide)))
            .collect();

        apply_theme(
            self.theme,
            ThemeScope::Panel(family),
            &parts.parts,
            &HashSet::new(),
            &mut self.commands,
        );

        let panel = MountedPanel::new(asset.root, parts, motions, layout);
        let roles = panel.roles();
        if let Err(panel) = self.panels.complete_load(side, family, generation, panel) {
            self.commands.push(SceneCommand::Remove { node: panel.root });
            return;
        }

        // Open then close once so the user sees how the panel moves
        for role in roles {
            self.driver.play(PlaySession::new(
                SessionKey {
                    side,
                    family,
                    role,
                    generation,
                },
                Direction::Forward,
                self.mount_secs,
                Continuation::Reverse,
            ));
        }
        info!(side = %side, family = %family, generation, "Panel mounted");
    }

    /// Position a mounted panel from a 0..=100 slider value.
    /// The slider takes over from any running mount animation of the panel.
    pub fn set_panel_slider(&mut self, side: Side, family: PanelFamily, value: f32) -> bool {
        let Some(panel) = self.panels.mounted_mut(side, family) else {
            debug!(side = %side, family = %family, "Slider moved for a panel that is not mounted");
            return false;
        };
        self.driver.cancel_panel(side, family);
        panel.apply_slider(value, &mut self.commands)
    }

    /// Rotate the structure louvers; `degrees` is clamped to 0..=100
    pub fn set_louver_angle(&mut self, degrees: f32) -> bool {
        match self.structure.get_mut() {
            Some(structure) => structure.set_louver_angle(degrees, &mut self.commands),
            None => {
                debug!("Louver slider moved before the structure loaded");
                false
            }
        }
    }

    /// Recolor the structure and every mounted panel; later mounts use it too
    pub fn set_theme(&mut self, theme: ThemeColor) {
        info!(theme = theme.as_str(), "Applying theme");
        self.theme = theme;
        self.retheme_structure();

        let skip = HashSet::new();
        for (_, family, panel) in self.panels.iter_mounted() {
            apply_theme(
                theme,
                ThemeScope::Panel(family),
                &panel.parts.parts,
                &skip,
                &mut self.commands,
            );
        }
    }

    fn retheme_structure(&mut self) {
        if let Some(structure) = self.structure.get() {
            apply_theme(
                self.theme,
                ThemeScope::Structure,
                &structure.parts.parts,
                &self.addons.lit_nodes(),
                &mut self.commands,
            );
        }
    }

    /// Advance an add-on through its toggle cycle
    pub fn toggle_addon(&mut self, addon: Addon) -> AddonPhase {
        let target = self
            .structure
            .get()
            .and_then(|structure| structure.addon_targets.get(&addon).copied());
        let before = self.addons.phase(addon);
        let after = self.addons.toggle(addon, target, &mut self.commands);

        // The stash predates any theme change made while lit
        if before == AddonPhase::Active && after == AddonPhase::Removed {
            self.retheme_structure();
        }
        after
    }

    /// One frame: advance every running animation by `dt` seconds
    pub fn tick(&mut self, dt: f32) -> Vec<SessionKey> {
        let Self {
            driver,
            panels,
            commands,
            ..
        } = self;
        driver.tick(dt, |key, progress| panels.drive(key, progress, commands))
    }

    /// Take every queued scene command, in order
    pub fn drain_commands(&mut self) -> Vec<SceneCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn has_pending_commands(&self) -> bool {
        !self.commands.is_empty()
    }

    pub fn phase(&self, side: Side, family: PanelFamily) -> MountPhase {
        self.panels.phase(side, family)
    }

    pub fn panel(&self, side: Side, family: PanelFamily) -> Option<&MountedPanel> {
        self.panels.mounted(side, family)
    }

    pub fn structure(&self) -> Option<&Structure> {
        self.structure.get()
    }

    pub fn structure_phase(&self) -> MountPhase {
        self.structure.phase()
    }

    pub fn addon_phase(&self, addon: Addon) -> AddonPhase {
        self.addons.phase(addon)
    }

    pub fn is_animating(&self, side: Side, family: PanelFamily) -> bool {
        self.driver.is_animating(side, family)
    }

    pub fn is_idle(&self) -> bool {
        self.driver.is_idle()
    }

    pub fn status(&self) -> ConfiguratorStatus {
        let mut panels = Vec::with_capacity(Side::ALL.len() * PanelFamily::ALL.len());
        for side in Side::ALL {
            for family in PanelFamily::ALL {
                panels.push(PanelStatus {
                    side,
                    family,
                    phase: self.panels.phase(side, family),
                    animating: self.driver.is_animating(side, family),
                    open_percent: self
                        .panels
                        .mounted(side, family)
                        .and_then(|panel| panel.slider())
                        .map(|progress| progress * 100.0),
                });
            }
        }

        ConfiguratorStatus {
            size: self.size,
            theme: self.theme,
            structure: self.structure.phase(),
            louver_degrees: self.structure.get().and_then(|s| s.louver_degrees()),
            panels,
            addons: Addon::ALL
                .iter()
                .map(|&addon| AddonStatus {
                    addon,
                    phase: self.addons.phase(addon),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded_ticket(commands: &[SceneCommand]) -> LoadTicket {
        commands
            .iter()
            .find_map(|c| match c {
                SceneCommand::Load { ticket, .. } => Some(*ticket),
                _ => None,
            })
            .expect("no load command queued")
    }

    #[test]
    fn test_start_requests_structure() {
        let mut configurator = Configurator::new(&Config::default());
        configurator.start();
        let commands = configurator.drain_commands();
        assert_eq!(commands.len(), 1);
        match &commands[0] {
            SceneCommand::Load { ticket, request } => {
                assert_eq!(ticket.target, LoadTarget::Structure);
                assert_eq!(request.url, "models/structure/pergola_10x10.glb");
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(configurator.structure_phase(), MountPhase::Loading);
        assert!(!configurator.has_pending_commands());
    }

    #[test]
    fn test_glass_uses_companion_layout_next_to_zip() {
        let mut configurator = Configurator::new(&Config::default());
        configurator.toggle_panel(Side::Front, PanelFamily::Zip);
        configurator.drain_commands();

        configurator.toggle_panel(Side::Front, PanelFamily::Glass);
        let commands = configurator.drain_commands();
        let placement = match &commands[0] {
            SceneCommand::Load { request, .. } => request.placement,
            other => panic!("unexpected command {other:?}"),
        };
        let expected = configurator.table().placement(
            SizeVariant::S10x10,
            Side::Front,
            PanelFamily::Glass,
            GlassLayout::WithCompanion,
        );
        assert_eq!(placement, expected);

        // The zip going away leaves the glass on its inset placement
        let glass = loaded_ticket(&commands);
        configurator.on_asset_loaded(
            LoadTicket {
                target: LoadTarget::Panel {
                    side: Side::Front,
                    family: PanelFamily::Zip,
                },
                generation: configurator.panels.generation(Side::Front, PanelFamily::Zip),
            },
            Err(LoadError::Empty("zip_10ft.glb".to_string())),
        );
        assert_eq!(configurator.phase(Side::Front, PanelFamily::Zip), MountPhase::Unmounted);
        assert!(configurator.drain_commands().is_empty());
        assert_eq!(
            configurator
                .panels
                .awaiting(Side::Front, PanelFamily::Glass, glass.generation),
            Some(GlassLayout::WithCompanion)
        );
    }

    #[test]
    fn test_failed_load_returns_to_unmounted() {
        let mut configurator = Configurator::new(&Config::default());
        configurator.toggle_panel(Side::Left, PanelFamily::Zip);
        let ticket = loaded_ticket(&configurator.drain_commands());

        configurator.on_asset_loaded(
            ticket,
            Err(LoadError::Failed {
                url: "zip_10ft.glb".to_string(),
                reason: "404".to_string(),
            }),
        );
        assert_eq!(configurator.phase(Side::Left, PanelFamily::Zip), MountPhase::Unmounted);

        // A fresh toggle issues a new load
        assert_eq!(configurator.toggle_panel(Side::Left, PanelFamily::Zip), MountPhase::Loading);
    }

    #[test]
    fn test_empty_asset_is_a_failed_load() {
        let mut configurator = Configurator::new(&Config::default());
        configurator.toggle_panel(Side::Rear, PanelFamily::Glass);
        let ticket = loaded_ticket(&configurator.drain_commands());

        configurator.on_asset_loaded(
            ticket,
            Ok(LoadedAsset {
                root: crate::types::NodeId(77),
                meshes: Vec::new(),
            }),
        );
        assert_eq!(configurator.phase(Side::Rear, PanelFamily::Glass), MountPhase::Unmounted);
        assert_eq!(
            configurator.drain_commands(),
            vec![SceneCommand::Remove { node: crate::types::NodeId(77) }]
        );
    }

    #[test]
    fn test_status_lists_every_slot() {
        let configurator = Configurator::new(&Config::default());
        let status = configurator.status();
        assert_eq!(status.panels.len(), 8);
        assert!(status.panels.iter().all(|p| p.phase == MountPhase::Unmounted));
        assert_eq!(status.addons.len(), 1);
        assert_eq!(status.structure, MountPhase::Unmounted);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["size"], "10x10");
        assert_eq!(json["panels"][0]["phase"], "unmounted");
    }
}
