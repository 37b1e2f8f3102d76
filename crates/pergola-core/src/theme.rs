//! Theme application - material presets keyed by mesh signature and color theme

use crate::classify::PartRecord;
use crate::scene::SceneCommand;
use crate::types::{NodeId, PanelFamily, ThemeColor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Name tokens of frame-like meshes (aluminium extrusions)
const FRAME_TOKENS: [&str; 10] = [
    "frame", "post", "beam", "rail", "louver", "bar", "cassette", "door", "panel", "gutter",
];

/// Glazing signature of the structure and the glass family
const GLASS_TOKEN: &str = "glass";

/// Glazing-shaped meshes of the zip family
const ZIP_SCREEN_TOKEN: &str = "screen";

/// Color token of the clear vinyl zip glazing; other screens are mesh fabric
const ZIP_GLAZING_COLOR: &str = "e6f2ff";

/// Resolved material parameters handed to the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpec {
    /// 0xRRGGBB
    pub base_color: u32,
    pub opacity: f32,
    pub metallic: f32,
    pub roughness: f32,
    /// 0xRRGGBB
    pub emissive: u32,
    pub emissive_intensity: f32,
}

impl MaterialSpec {
    /// Color as linear-agnostic (r, g, b) in 0.0-1.0
    pub fn rgb(&self) -> (f32, f32, f32) {
        split_rgb(self.base_color)
    }

    pub fn emissive_rgb(&self) -> (f32, f32, f32) {
        let (r, g, b) = split_rgb(self.emissive);
        (
            r * self.emissive_intensity,
            g * self.emissive_intensity,
            b * self.emissive_intensity,
        )
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

fn split_rgb(hex: u32) -> (f32, f32, f32) {
    (
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialPreset {
    Frame(ThemeColor),
    Glazing,
    TransparentScreen(ThemeColor),
    /// Emissive material of an active lighting add-on
    Lighting,
}

impl MaterialPreset {
    pub fn spec(&self) -> MaterialSpec {
        match self {
            MaterialPreset::Frame(ThemeColor::Black) => MaterialSpec {
                base_color: 0x1c1c1e,
                opacity: 1.0,
                metallic: 0.6,
                roughness: 0.45,
                emissive: 0x000000,
                emissive_intensity: 0.0,
            },
            MaterialPreset::Frame(ThemeColor::White) => MaterialSpec {
                base_color: 0xf0f0ee,
                opacity: 1.0,
                metallic: 0.3,
                roughness: 0.5,
                emissive: 0x000000,
                emissive_intensity: 0.0,
            },
            MaterialPreset::Glazing => MaterialSpec {
                base_color: 0xd6e6ee,
                opacity: 0.25,
                metallic: 0.0,
                roughness: 0.05,
                emissive: 0x000000,
                emissive_intensity: 0.0,
            },
            MaterialPreset::TransparentScreen(ThemeColor::Black) => MaterialSpec {
                base_color: 0x2a2a2a,
                opacity: 0.75,
                metallic: 0.0,
                roughness: 0.9,
                emissive: 0x000000,
                emissive_intensity: 0.0,
            },
            MaterialPreset::TransparentScreen(ThemeColor::White) => MaterialSpec {
                base_color: 0xdcdcd6,
                opacity: 0.6,
                metallic: 0.0,
                roughness: 0.9,
                emissive: 0x000000,
                emissive_intensity: 0.0,
            },
            MaterialPreset::Lighting => MaterialSpec {
                base_color: 0xfff6e0,
                opacity: 1.0,
                metallic: 0.0,
                roughness: 0.3,
                emissive: 0xffe8b8,
                emissive_intensity: 4.0,
            },
        }
    }
}

/// What kind of asset a part belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeScope {
    Structure,
    Panel(PanelFamily),
}

/// Pick the preset for a mesh from its derived name.
/// Returns `None` for meshes that keep their authored material.
pub fn preset_for(name: &str, scope: ThemeScope, theme: ThemeColor) -> Option<MaterialPreset> {
    let name = name.to_lowercase();

    match scope {
        ThemeScope::Panel(PanelFamily::Zip) if name.contains(ZIP_SCREEN_TOKEN) => {
            if name.contains(ZIP_GLAZING_COLOR) {
                return Some(MaterialPreset::Glazing);
            }
            return Some(MaterialPreset::TransparentScreen(theme));
        }
        ThemeScope::Panel(PanelFamily::Zip) => {}
        ThemeScope::Structure | ThemeScope::Panel(PanelFamily::Glass) => {
            if name.contains(GLASS_TOKEN) {
                return Some(MaterialPreset::Glazing);
            }
        }
    }

    if FRAME_TOKENS.iter().any(|token| name.contains(token)) {
        Some(MaterialPreset::Frame(theme))
    } else {
        None
    }
}

/// Walks parts and emits a material assignment for every themed mesh.
/// Nodes in `skip` (e.g. lit add-on targets) are left alone.
/// Returns the number of meshes themed.
pub fn apply_theme(
    theme: ThemeColor,
    scope: ThemeScope,
    parts: &[PartRecord],
    skip: &HashSet<NodeId>,
    commands: &mut Vec<SceneCommand>,
) -> usize {
    let mut themed = 0;
    for part in parts {
        if skip.contains(&part.node) {
            continue;
        }
        if let Some(preset) = preset_for(&part.name, scope, theme) {
            commands.push(SceneCommand::SetMaterial {
                node: part.node,
                material: preset.spec(),
            });
            themed += 1;
        }
    }
    tracing::debug!(?scope, theme = theme.as_str(), themed, "Applied theme");
    themed
}
