//! Part classification - names, stacking order and animation groups
//!
//! A freshly loaded asset arrives as a flat mesh list. Each mesh gets a
//! derived name (`{parent}_{color hex | material kind}`), a 1-based stacking
//! index from its world Y at load time, and is bucketed into at most one
//! animation group by substring match on the derived name.

use crate::scene::{Bounds, LoadedAsset, MeshInfo};
use crate::types::{NodeId, PanelFamily, PartTransform};
use serde::{Deserialize, Serialize};

/// Role of an animation group; decides its motion model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    /// Translates from the first moment of travel
    Door,
    /// Translates only past the ramp start threshold
    Normal,
    /// Scales to zero with one edge held in place
    Shrink,
    /// Structure louver blades, rotated by the louver slider
    Louver,
}

/// "contains `include` but not `exclude`" on the lowercase derived name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSelector {
    pub role: GroupRole,
    pub include: &'static str,
    pub exclude: Option<&'static str>,
}

impl GroupSelector {
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        name.contains(self.include) && self.exclude.map_or(true, |ex| !name.contains(ex))
    }
}

const GLASS_SELECTORS: [GroupSelector; 3] = [
    GroupSelector { role: GroupRole::Door, include: "door", exclude: Some("frame") },
    GroupSelector { role: GroupRole::Normal, include: "panel", exclude: Some("door") },
    GroupSelector { role: GroupRole::Shrink, include: "seal", exclude: None },
];

const ZIP_SELECTORS: [GroupSelector; 2] = [
    GroupSelector { role: GroupRole::Door, include: "bar", exclude: Some("guide") },
    GroupSelector { role: GroupRole::Shrink, include: "screen", exclude: None },
];

pub const STRUCTURE_SELECTORS: [GroupSelector; 1] = [GroupSelector {
    role: GroupRole::Louver,
    include: "louver",
    exclude: None,
}];

/// Group selectors of a panel family, in match priority order
pub fn selectors_for(family: PanelFamily) -> &'static [GroupSelector] {
    match family {
        PanelFamily::Glass => &GLASS_SELECTORS,
        PanelFamily::Zip => &ZIP_SELECTORS,
    }
}

/// One loaded mesh with its immutable load-time anchor
#[derive(Debug, Clone, PartialEq)]
pub struct PartRecord {
    pub node: NodeId,
    pub name: String,
    /// 1-based, ascending world Y at load time
    pub stack_index: usize,
    initial: PartTransform,
    /// Current local transform
    pub live: PartTransform,
    bounds: Bounds,
    /// Bounding box min and max at the initial scale
    edges: Option<[[f32; 3]; 2]>,
}

impl PartRecord {
    pub fn new(
        node: NodeId,
        name: String,
        stack_index: usize,
        initial: PartTransform,
        bounds: Bounds,
    ) -> Self {
        Self {
            node,
            name,
            stack_index,
            initial,
            live: initial,
            bounds,
            edges: None,
        }
    }

    pub fn initial(&self) -> &PartTransform {
        &self.initial
    }

    /// Put the live transform back on the load-time anchor
    pub fn reset(&mut self) {
        self.live = self.initial;
    }

    pub fn is_at_initial(&self) -> bool {
        self.live == self.initial
    }

    /// Local offset of the bounding box edge that stays fixed while the
    /// part shrinks along `axis`: the max edge for a positive `direction`,
    /// the min edge otherwise. Taken at the initial scale, computed on
    /// first use and cached.
    pub fn anchor_offset(&mut self, axis: usize, direction: f32) -> f32 {
        let scale = self.initial.scale;
        let bounds = self.bounds;
        let edges = self.edges.get_or_insert_with(|| {
            let scaled = |corner: [f32; 3]| {
                [corner[0] * scale[0], corner[1] * scale[1], corner[2] * scale[2]]
            };
            [scaled(bounds.min), scaled(bounds.max)]
        });
        if direction >= 0.0 {
            edges[1][axis]
        } else {
            edges[0][axis]
        }
    }
}

/// A named subset of a panel's parts sharing one motion model
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationGroup {
    pub role: GroupRole,
    /// Indices into the owning part list
    pub members: Vec<usize>,
}

impl AnimationGroup {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Classification result: parts in stacking order plus their groups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedParts {
    pub parts: Vec<PartRecord>,
    /// One entry per selector role that matched at least one part
    pub groups: Vec<AnimationGroup>,
}

impl ClassifiedParts {
    pub fn group(&self, role: GroupRole) -> Option<&AnimationGroup> {
        self.groups.iter().find(|g| g.role == role)
    }

    pub fn find(&self, name_prefix: &str) -> Option<&PartRecord> {
        let prefix = name_prefix.to_lowercase();
        self.parts
            .iter()
            .find(|p| p.name.to_lowercase().starts_with(&prefix))
    }

    /// Nodes of parts that belong to no group
    pub fn static_parts(&self) -> impl Iterator<Item = &PartRecord> {
        self.parts.iter().enumerate().filter_map(move |(i, part)| {
            let grouped = self.groups.iter().any(|g| g.members.contains(&i));
            (!grouped).then_some(part)
        })
    }
}

/// Derived name: parent name plus material color (hex) or material kind
pub fn derived_name(mesh: &MeshInfo) -> String {
    match mesh.material.color {
        Some(color) => format!("{}_{:06x}", mesh.parent_name, color & 0xff_ffff),
        None => format!("{}_{}", mesh.parent_name, mesh.material.kind),
    }
}

/// Classify a loaded asset.
/// Deterministic: stable sort on world Y, ties keep traversal order.
pub fn classify(asset: &LoadedAsset, selectors: &[GroupSelector]) -> ClassifiedParts {
    let mut order: Vec<usize> = (0..asset.meshes.len()).collect();
    order.sort_by(|&a, &b| {
        asset.meshes[a]
            .world_y
            .total_cmp(&asset.meshes[b].world_y)
    });

    let parts: Vec<PartRecord> = order
        .iter()
        .enumerate()
        .map(|(rank, &i)| {
            let mesh = &asset.meshes[i];
            PartRecord::new(
                mesh.node,
                derived_name(mesh),
                rank + 1,
                mesh.transform,
                mesh.bounds,
            )
        })
        .collect();

    let mut groups: Vec<AnimationGroup> = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let Some(selector) = selectors.iter().find(|s| s.matches(&part.name)) else {
            continue;
        };
        match groups.iter_mut().find(|g| g.role == selector.role) {
            Some(group) => group.members.push(i),
            None => groups.push(AnimationGroup {
                role: selector.role,
                members: vec![i],
            }),
        }
    }

    tracing::debug!(
        parts = parts.len(),
        groups = groups.len(),
        "Classified asset parts"
    );

    ClassifiedParts { parts, groups }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MaterialInfo;

    fn mesh(node: u64, parent: &str, color: Option<u32>, world_y: f32) -> MeshInfo {
        MeshInfo {
            node: NodeId(node),
            parent_name: parent.to_string(),
            material: MaterialInfo {
                color,
                kind: "MeshStandardMaterial".to_string(),
            },
            transform: PartTransform::default(),
            world_y,
            bounds: Bounds {
                min: [0.0; 3],
                max: [1.0, 2.0, 0.05],
            },
        }
    }

    fn glass_asset() -> LoadedAsset {
        LoadedAsset {
            root: NodeId(100),
            meshes: vec![
                mesh(1, "top_rail", Some(0x1c1c1e), 2.4),
                mesh(2, "door_leaf_1", Some(0x1c1c1e), 1.2),
                mesh(3, "panel_leaf_2", Some(0x1c1c1e), 1.2),
                mesh(4, "door_frame", Some(0x1c1c1e), 1.0),
                mesh(5, "brush_seal", None, 0.01),
                mesh(6, "panel_leaf_3", Some(0x1c1c1e), 1.2),
            ],
        }
    }

    #[test]
    fn test_derived_names() {
        let m = mesh(1, "Bar_Bottom", Some(0x0000ff), 0.0);
        assert_eq!(derived_name(&m), "Bar_Bottom_0000ff");
        let m = mesh(1, "screen", None, 0.0);
        assert_eq!(derived_name(&m), "screen_MeshStandardMaterial");
    }

    #[test]
    fn test_stacking_order_is_stable() {
        let classified = classify(&glass_asset(), selectors_for(PanelFamily::Glass));
        let names: Vec<&str> = classified.parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "brush_seal_MeshStandardMaterial",
                "door_frame_1c1c1e",
                "door_leaf_1_1c1c1e",
                "panel_leaf_2_1c1c1e",
                "panel_leaf_3_1c1c1e",
                "top_rail_1c1c1e",
            ]
        );
        let indices: Vec<usize> = classified.parts.iter().map(|p| p.stack_index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let a = classify(&glass_asset(), selectors_for(PanelFamily::Glass));
        let b = classify(&glass_asset(), selectors_for(PanelFamily::Glass));
        assert_eq!(a, b);
    }

    #[test]
    fn test_glass_groups() {
        let classified = classify(&glass_asset(), selectors_for(PanelFamily::Glass));

        let door = classified.group(GroupRole::Door).unwrap();
        let door_names: Vec<&str> = door.members.iter().map(|&i| classified.parts[i].name.as_str()).collect();
        assert_eq!(door_names, vec!["door_leaf_1_1c1c1e"]);

        let normal = classified.group(GroupRole::Normal).unwrap();
        assert_eq!(normal.members.len(), 2);

        let shrink = classified.group(GroupRole::Shrink).unwrap();
        assert_eq!(shrink.members.len(), 1);

        // Unmatched parts are kept but never grouped
        let statics: Vec<&str> = classified.static_parts().map(|p| p.name.as_str()).collect();
        assert_eq!(statics, vec!["door_frame_1c1c1e", "top_rail_1c1c1e"]);
    }

    #[test]
    fn test_zip_groups() {
        let asset = LoadedAsset {
            root: NodeId(100),
            meshes: vec![
                mesh(1, "cassette", Some(0x1c1c1e), 2.5),
                mesh(2, "screen", Some(0x333333), 1.2),
                mesh(3, "bar_bottom", Some(0x1c1c1e), 0.05),
                mesh(4, "guide_bar_left", Some(0x1c1c1e), 1.2),
            ],
        };
        let classified = classify(&asset, selectors_for(PanelFamily::Zip));
        assert_eq!(classified.group(GroupRole::Door).unwrap().members.len(), 1);
        assert_eq!(classified.group(GroupRole::Shrink).unwrap().members.len(), 1);
        assert!(classified.group(GroupRole::Normal).is_none());
        assert_eq!(classified.static_parts().count(), 2);
    }

    #[test]
    fn test_anchor_is_cached_at_initial_scale() {
        let mut part = PartRecord::new(
            NodeId(1),
            "screen".to_string(),
            1,
            PartTransform {
                scale: [1.0, 1.0, 2.0],
                ..Default::default()
            },
            Bounds {
                min: [0.0, 0.0, -0.5],
                max: [1.0, 1.0, 1.5],
            },
        );
        assert_eq!(part.anchor_offset(2, 1.0), 3.0);
        assert_eq!(part.anchor_offset(2, -1.0), -1.0);
        part.live.scale[2] = 0.1;
        assert_eq!(part.anchor_offset(2, 1.0), 3.0);
    }

    #[test]
    fn test_find_by_prefix() {
        let classified = classify(&glass_asset(), &STRUCTURE_SELECTORS);
        assert!(classified.groups.is_empty());
        assert_eq!(classified.find("TOP_RAIL").unwrap().node, NodeId(1));
        assert!(classified.find("led_strip").is_none());
    }
}
