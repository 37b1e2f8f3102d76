//! Bevy application setup

use anyhow::Context;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_picking::DefaultPickingPlugins;
use pergola_core::{Config, Configurator, SizeVariant, ThemeColor};

use crate::models::ModelsPlugin;
use crate::scene::ScenePlugin;
use crate::ui::UiPlugin;

/// Defaults shipped with the build
const EMBEDDED_CONFIG: &str = include_str!("../config/pergola.toml");

/// The configurator core, shared by the UI and the scene systems
#[derive(Resource)]
pub struct ConfiguratorState(pub Configurator);

/// Camera controller settings
#[derive(Debug, Clone, Resource)]
pub struct CameraSettings {
    pub distance: f32,
    pub target_distance: f32, // For smooth zoom
    pub azimuth: f32,
    pub elevation: f32,
    pub target: Vec3,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub smooth_factor: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: 9.0,
            target_distance: 9.0,
            azimuth: 0.8,  // Front-left three-quarter view
            elevation: 0.35,
            target: Vec3::new(0.0, 1.2, 0.0),
            sensitivity: 0.005,
            zoom_speed: 0.1,
            smooth_factor: 0.15,
        }
    }
}

/// UI layout settings for responsive design
#[derive(Debug, Clone, Resource)]
pub struct UiLayout {
    /// Whether the control panel is visible
    pub show_panel: bool,
    pub screen_width: f32,
    pub screen_height: f32,
    /// Whether we're on a small screen (mobile/tablet)
    pub is_mobile: bool,
    /// Scale factor for UI elements on mobile
    pub ui_scale: f32,
}

impl Default for UiLayout {
    fn default() -> Self {
        Self {
            show_panel: true,
            screen_width: 1920.0,
            screen_height: 1080.0,
            is_mobile: false,
            ui_scale: 1.0,
        }
    }
}

impl UiLayout {
    /// Update layout based on screen dimensions
    pub fn update_for_screen(&mut self, width: f32, height: f32) {
        self.screen_width = width;
        self.screen_height = height;

        // Consider mobile if width < 800 or if it's a portrait orientation with width < 600
        self.is_mobile = width < 800.0 || (width < height && width < 600.0);

        // Scale up UI elements on mobile for better touch targets
        self.ui_scale = if self.is_mobile { 1.3 } else { 1.0 };
    }

    pub fn panel_width(&self) -> f32 {
        if self.is_mobile {
            (self.screen_width * 0.85).min(350.0)
        } else {
            280.0
        }
    }
}

/// Embedded configuration with URL overrides applied
fn resolve_config() -> anyhow::Result<Config> {
    let mut config =
        Config::from_toml(EMBEDDED_CONFIG).context("embedded pergola.toml is invalid")?;

    if let Some(size) = url_param("size") {
        config.defaults.size = size
            .parse::<SizeVariant>()
            .with_context(|| format!("bad ?size= parameter {size:?}"))?;
    }
    if let Some(theme) = url_param("theme") {
        config.defaults.theme = theme
            .parse::<ThemeColor>()
            .with_context(|| format!("bad ?theme= parameter {theme:?}"))?;
    }
    Ok(config)
}

#[cfg(target_arch = "wasm32")]
fn url_param(name: &str) -> Option<String> {
    let search = web_sys::window()?.location().search().ok()?;
    let params = web_sys::UrlSearchParams::new_with_str(&search).ok()?;
    params.get(name)
}

#[cfg(not(target_arch = "wasm32"))]
fn url_param(_name: &str) -> Option<String> {
    None
}

fn start_configurator(mut state: ResMut<ConfiguratorState>) {
    state.0.start();
}

/// Run the Bevy application
pub fn run() {
    let config = resolve_config().unwrap_or_else(|e| {
        tracing::warn!("Falling back to built-in configuration: {:#}", e);
        Config::default()
    });

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.93, 0.94, 0.95)))
        .add_plugins(DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Pergola Configurator".to_string(),
                    canvas: Some("#pergola-canvas".to_string()),
                    fit_canvas_to_parent: true,
                    prevent_default_event_handling: false,
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                // Models are served next to the page
                file_path: "".to_string(),
                // Don't look for .meta files - the CDN doesn't have them
                meta_check: bevy::asset::AssetMetaCheck::Never,
                ..default()
            })
        )
        // Picking must be added BEFORE EguiPlugin so it can detect PickingPlugin
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(EguiPlugin::default())
        .insert_resource(ConfiguratorState(Configurator::new(&config)))
        .init_resource::<CameraSettings>()
        .init_resource::<UiLayout>()
        .add_systems(Startup, start_configurator)
        .add_plugins(ScenePlugin)
        .add_plugins(ModelsPlugin)
        .add_plugins(UiPlugin)
        .run();
}
