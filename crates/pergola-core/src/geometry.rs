//! Geometry table - placements, asset ids and motion parameters
//!
//! Every lookup is keyed by (size, side[, family]) and is total over the
//! closed enums, so there is no "missing row" at runtime. Rows that have no
//! meaning for a family return an explicit sentinel instead of a zero value.

use crate::config::AssetsConfig;
use crate::types::{Addon, Axis, PanelFamily, Placement, Side, SizeVariant, FOOT};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

/// Inset of a standalone glass run from the post line (metres)
const GLASS_INSET: f32 = 0.08;
/// Inset of a glass run when a zip screen shares the side
const GLASS_INSET_WITH_COMPANION: f32 = 0.16;
/// Bottom of the panels above the slab
const PANEL_BASE_HEIGHT: f32 = 0.02;
/// Height of the zip screen drop (cassette to floor)
const ZIP_DROP: f32 = 2.44;
/// Gap kept between a fully opened glass door and the post
const GLASS_END_CLEARANCE: f32 = 0.1;

/// Which glass placement table applies.
///
/// The caller decides; the table never inspects mount state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlassLayout {
    #[default]
    Standalone,
    /// A zip screen is mounted on the same side
    WithCompanion,
}

/// Translation limit of a panel's moving groups
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementLimit {
    pub axis: Axis,
    /// Signed travel at full progress: position = initial - progress * max_movement
    pub max_movement: f32,
}

/// Start-delay parameters of the ramp-delay group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SlideParams {
    Ramp { start_threshold: f32, multiplier: f32 },
    /// The family has no ramp-delay group
    NotApplicable,
}

/// Static lookup of transforms, assets and motion parameters
#[derive(Debug, Clone)]
pub struct GeometryTable {
    assets: AssetsConfig,
}

impl Default for GeometryTable {
    fn default() -> Self {
        Self::new(AssetsConfig::default())
    }
}

impl GeometryTable {
    pub fn new(assets: AssetsConfig) -> Self {
        Self { assets }
    }

    /// Structure dimensions in metres (width, depth)
    pub fn footprint(size: SizeVariant) -> (f32, f32) {
        let (width, depth) = size.feet();
        (width as f32 * FOOT, depth as f32 * FOOT)
    }

    /// Root placement of a panel asset.
    /// Glass runs are inset from the post line; zip screens sit on it.
    pub fn placement(
        &self,
        size: SizeVariant,
        side: Side,
        family: PanelFamily,
        layout: GlassLayout,
    ) -> Placement {
        let (width, depth) = Self::footprint(size);
        let inset = match (family, layout) {
            (PanelFamily::Zip, _) => 0.0,
            (PanelFamily::Glass, GlassLayout::Standalone) => GLASS_INSET,
            (PanelFamily::Glass, GlassLayout::WithCompanion) => GLASS_INSET_WITH_COMPANION,
        };
        let half_w = width / 2.0 - inset;
        let half_d = depth / 2.0 - inset;

        match side {
            Side::Front => Placement {
                position: [0.0, PANEL_BASE_HEIGHT, half_d],
                yaw: 0.0,
            },
            Side::Rear => Placement {
                position: [0.0, PANEL_BASE_HEIGHT, -half_d],
                yaw: 0.0,
            },
            Side::Left => Placement {
                position: [-half_w, PANEL_BASE_HEIGHT, 0.0],
                yaw: FRAC_PI_2,
            },
            Side::Right => Placement {
                position: [half_w, PANEL_BASE_HEIGHT, 0.0],
                yaw: -FRAC_PI_2,
            },
        }
    }

    /// Asset of the primary structure for a size
    pub fn structure_asset(&self, size: SizeVariant) -> String {
        format!(
            "{}/pergola_{}.glb",
            self.assets.structure_base.trim_end_matches('/'),
            size.slug()
        )
    }

    /// Asset of a panel. One asset per span class and family;
    /// zip assets come from the CDN, glass assets from the local models folder.
    pub fn panel_asset(&self, size: SizeVariant, side: Side, family: PanelFamily) -> String {
        let span = size.span_feet(side);
        match family {
            PanelFamily::Glass => format!(
                "{}/glass_{}ft.glb",
                self.assets.glass_base.trim_end_matches('/'),
                span
            ),
            PanelFamily::Zip => format!(
                "{}/zip_{}ft.glb",
                self.assets.zip_base.trim_end_matches('/'),
                span
            ),
        }
    }

    /// Travel of the translating groups
    pub fn movement_limit(&self, size: SizeVariant, side: Side, family: PanelFamily) -> MovementLimit {
        match family {
            PanelFamily::Glass => {
                let span = size.span_feet(side) as f32 * FOOT;
                MovementLimit {
                    axis: Axis::X,
                    max_movement: span / 2.0 - GLASS_END_CLEARANCE,
                }
            }
            // Negative: the bottom bar rises along +Z
            PanelFamily::Zip => MovementLimit {
                axis: Axis::Z,
                max_movement: -ZIP_DROP,
            },
        }
    }

    /// Ramp-delay parameters. Tuned per span; do not derive.
    pub fn slide_params(&self, family: PanelFamily, size: SizeVariant, side: Side) -> SlideParams {
        use Side::*;
        use SizeVariant::*;

        if family == PanelFamily::Zip {
            return SlideParams::NotApplicable;
        }

        let (start_threshold, multiplier) = match (size, side) {
            (S10x10, Front | Rear) => (0.5, 2.0),
            (S10x10, Left | Right) => (0.5, 2.0),
            (S10x13, Front | Rear) => (0.5, 2.0),
            (S10x13, Left | Right) => (0.4, 1.6667),
            (S13x13, Front | Rear) => (0.4, 1.6667),
            (S13x13, Left | Right) => (0.4, 1.6667),
            (S13x20, Front | Rear) => (0.4, 1.6667),
            (S13x20, Left) => (0.3, 1.4286),
            // Multiplier was never set for this run; its middle leaves stay put
            (S13x20, Right) => (0.3, 0.0),
        };

        SlideParams::Ramp {
            start_threshold,
            multiplier,
        }
    }

    /// Mesh name of an add-on's target inside the primary structure
    pub fn addon_target(&self, addon: Addon, size: SizeVariant) -> String {
        match addon {
            Addon::Lighting => format!("led_strip_{}", size.slug()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_combination_resolves() {
        let table = GeometryTable::default();
        for size in SizeVariant::ALL {
            for side in Side::ALL {
                for family in PanelFamily::ALL {
                    for layout in [GlassLayout::Standalone, GlassLayout::WithCompanion] {
                        let placement = table.placement(size, side, family, layout);
                        assert!(placement.position.iter().all(|v| v.is_finite()));
                    }
                    let asset = table.panel_asset(size, side, family);
                    assert!(asset.ends_with(".glb"));
                    let limit = table.movement_limit(size, side, family);
                    assert!(limit.max_movement != 0.0);
                    let _ = table.slide_params(family, size, side);
                }
            }
        }
    }

    #[test]
    fn test_glass_and_zip_differ() {
        let table = GeometryTable::default();
        let glass = table.placement(SizeVariant::S10x10, Side::Front, PanelFamily::Glass, GlassLayout::Standalone);
        let zip = table.placement(SizeVariant::S10x10, Side::Front, PanelFamily::Zip, GlassLayout::Standalone);
        assert!(glass.position[2] < zip.position[2]);

        let companion = table.placement(SizeVariant::S10x10, Side::Front, PanelFamily::Glass, GlassLayout::WithCompanion);
        assert!(companion.position[2] < glass.position[2]);
    }

    #[test]
    fn test_side_yaw() {
        let table = GeometryTable::default();
        let left = table.placement(SizeVariant::S13x13, Side::Left, PanelFamily::Zip, GlassLayout::Standalone);
        let right = table.placement(SizeVariant::S13x13, Side::Right, PanelFamily::Zip, GlassLayout::Standalone);
        assert!((left.yaw - FRAC_PI_2).abs() < 1e-6);
        assert!((right.yaw + FRAC_PI_2).abs() < 1e-6);
        assert!(left.position[0] < 0.0 && right.position[0] > 0.0);
    }

    #[test]
    fn test_asset_ids() {
        let table = GeometryTable::default();
        assert_eq!(
            table.structure_asset(SizeVariant::S10x13),
            "models/structure/pergola_10x13.glb"
        );
        assert_eq!(
            table.panel_asset(SizeVariant::S10x13, Side::Left, PanelFamily::Glass),
            "models/glass/glass_13ft.glb"
        );
        let zip = table.panel_asset(SizeVariant::S10x13, Side::Front, PanelFamily::Zip);
        assert!(zip.starts_with("https://"));
        assert!(zip.ends_with("/zip_10ft.glb"));
    }

    #[test]
    fn test_slide_params_table() {
        let table = GeometryTable::default();
        assert_eq!(
            table.slide_params(PanelFamily::Zip, SizeVariant::S10x10, Side::Front),
            SlideParams::NotApplicable
        );
        assert_eq!(
            table.slide_params(PanelFamily::Glass, SizeVariant::S10x10, Side::Front),
            SlideParams::Ramp { start_threshold: 0.5, multiplier: 2.0 }
        );
        // The unset row is kept as-is
        assert_eq!(
            table.slide_params(PanelFamily::Glass, SizeVariant::S13x20, Side::Right),
            SlideParams::Ramp { start_threshold: 0.3, multiplier: 0.0 }
        );
    }

    #[test]
    fn test_zip_moves_up() {
        let table = GeometryTable::default();
        let limit = table.movement_limit(SizeVariant::S10x10, Side::Front, PanelFamily::Zip);
        assert_eq!(limit.axis, Axis::Z);
        assert!(limit.max_movement < 0.0);
    }
}
