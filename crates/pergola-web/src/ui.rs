//! UI overlays using bevy_egui

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use pergola_core::{
    Addon, AddonPhase, ConfiguratorStatus, MountPhase, PanelFamily, Side, SizeVariant, ThemeColor,
};
use std::collections::HashMap;

use crate::app::{ConfiguratorState, UiLayout};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SliderValues>()
            .add_systems(Update, update_ui_layout)
            // Main UI system runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
            .add_systems(EguiPrimaryContextPass, ui_system);
    }
}

/// Slider positions the user last set; reset when a panel goes away
#[derive(Resource, Default)]
pub struct SliderValues {
    panels: HashMap<(Side, PanelFamily), f32>,
    louver_degrees: f32,
}

/// Update UI layout based on window size
fn update_ui_layout(
    windows: Query<&Window>,
    mut ui_layout: ResMut<UiLayout>,
) {
    if let Ok(window) = windows.single() {
        let width = window.width();
        let height = window.height();

        // Only update if dimensions changed significantly
        if (ui_layout.screen_width - width).abs() > 1.0
            || (ui_layout.screen_height - height).abs() > 1.0
        {
            ui_layout.update_for_screen(width, height);
        }
    }
}

fn phase_label(phase: MountPhase) -> (&'static str, egui::Color32) {
    match phase {
        MountPhase::Unmounted => ("Add", egui::Color32::GRAY),
        MountPhase::Loading => ("Loading…", egui::Color32::YELLOW),
        MountPhase::Mounted => ("Remove", egui::Color32::GREEN),
    }
}

fn addon_label(phase: AddonPhase) -> &'static str {
    match phase {
        AddonPhase::Inactive => "Add lighting",
        AddonPhase::Active => "Turn lighting off",
        AddonPhase::Removed => "Reset lighting",
    }
}

fn ui_system(
    mut contexts: EguiContexts,
    mut state: ResMut<ConfiguratorState>,
    mut sliders: ResMut<SliderValues>,
    mut ui_layout: ResMut<UiLayout>,
) {
    let is_mobile = ui_layout.is_mobile;
    let panel_width = ui_layout.panel_width();
    let ui_scale = ui_layout.ui_scale;

    // Get the egui context - early return if not available
    let Ok(ctx) = contexts.ctx_mut() else { return };

    if is_mobile {
        let mut style = (*ctx.style()).clone();
        style.spacing.button_padding = egui::vec2(12.0, 8.0);
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        ctx.set_style(style);

        egui::TopBottomPanel::top("mobile_toolbar").show(ctx, |ui| {
            let menu_text = if ui_layout.show_panel { "☰ Options" } else { "☰" };
            if ui.button(egui::RichText::new(menu_text).size(16.0 * ui_scale)).clicked() {
                ui_layout.show_panel = !ui_layout.show_panel;
            }
        });
    }

    if is_mobile && !ui_layout.show_panel {
        return;
    }

    let status = state.0.status();
    let configurator = &mut state.0;

    // Forget slider positions of panels that are no longer mounted
    for panel in &status.panels {
        if panel.phase != MountPhase::Mounted {
            sliders.panels.remove(&(panel.side, panel.family));
        }
    }
    if status.louver_degrees.is_none() {
        sliders.louver_degrees = 0.0;
    }

    egui::SidePanel::left("configurator_panel")
        .default_width(panel_width)
        .resizable(!is_mobile)
        .show(ctx, |ui| {
            ui.heading("Pergola");
            ui.separator();

            size_section(ui, configurator, &status);
            ui.separator();

            ui.label(egui::RichText::new("Side panels").strong());
            egui::Grid::new("panel_grid")
                .num_columns(3)
                .spacing([8.0, 6.0])
                .show(ui, |ui| {
                    ui.label("");
                    ui.label("Glass");
                    ui.label("Zip screen");
                    ui.end_row();

                    for side in Side::ALL {
                        ui.label(side.as_str());
                        for family in PanelFamily::ALL {
                            let phase = status
                                .panels
                                .iter()
                                .find(|p| p.side == side && p.family == family)
                                .map(|p| p.phase)
                                .unwrap_or_default();
                            let (text, color) = phase_label(phase);
                            let button = egui::Button::new(egui::RichText::new(text).color(color));
                            if ui.add_enabled(phase != MountPhase::Loading, button).clicked() {
                                configurator.toggle_panel(side, family);
                            }
                        }
                        ui.end_row();
                    }
                });

            let mounted: Vec<_> = status
                .panels
                .iter()
                .filter(|p| p.phase == MountPhase::Mounted)
                .collect();
            if !mounted.is_empty() {
                ui.separator();
                ui.label(egui::RichText::new("Open").strong());
                for panel in mounted {
                    let value = sliders.panels.entry((panel.side, panel.family)).or_insert(0.0);
                    let label = format!("{} {}", panel.side, panel.family);
                    let response = ui.add(
                        egui::Slider::new(value, 0.0..=100.0)
                            .suffix("%")
                            .text(label),
                    );
                    if response.changed() {
                        configurator.set_panel_slider(panel.side, panel.family, *value);
                    }
                }
            }

            ui.separator();
            ui.label(egui::RichText::new("Louvers").strong());
            let louvers = ui.add_enabled(
                status.structure == MountPhase::Mounted,
                egui::Slider::new(&mut sliders.louver_degrees, 0.0..=100.0).suffix("°"),
            );
            if louvers.changed() {
                configurator.set_louver_angle(sliders.louver_degrees);
            }

            ui.separator();
            ui.label(egui::RichText::new("Frame color").strong());
            ui.horizontal(|ui| {
                for theme in [ThemeColor::Black, ThemeColor::White] {
                    if ui.selectable_label(status.theme == theme, theme.as_str()).clicked()
                        && status.theme != theme
                    {
                        configurator.set_theme(theme);
                    }
                }
            });

            ui.separator();
            ui.label(egui::RichText::new("Add-ons").strong());
            for addon_status in &status.addons {
                let label = match addon_status.addon {
                    Addon::Lighting => addon_label(addon_status.phase),
                };
                let active = addon_status.phase == AddonPhase::Active;
                if ui.selectable_label(active, label).clicked() {
                    configurator.toggle_addon(addon_status.addon);
                }
            }
        });
}

fn size_section(
    ui: &mut egui::Ui,
    configurator: &mut pergola_core::Configurator,
    status: &ConfiguratorStatus,
) {
    ui.label(egui::RichText::new("Size").strong());
    ui.horizontal_wrapped(|ui| {
        for size in SizeVariant::ALL {
            if ui.selectable_label(status.size == size, size.label()).clicked()
                && status.size != size
            {
                configurator.select_size(size);
            }
        }
    });
    if status.structure == MountPhase::Loading {
        ui.colored_label(egui::Color32::YELLOW, "Loading structure…");
    }
}
