//! Host boundary: what the renderer hands us and what we ask it to do

use crate::theme::MaterialSpec;
use crate::types::{NodeId, PanelFamily, PartTransform, Placement, Side};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Failed to load asset {url}: {reason}")]
    Failed { url: String, reason: String },
    #[error("Asset {0} contains no meshes")]
    Empty(String),
}

/// Local bounding box of a mesh
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

/// Material of a loaded mesh as the asset authored it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialInfo {
    /// Flat color as 0xRRGGBB, when the material has one
    pub color: Option<u32>,
    /// Material type name (e.g. "MeshStandardMaterial")
    pub kind: String,
}

/// One mesh of a freshly loaded asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshInfo {
    pub node: NodeId,
    /// Name of the node that owns the mesh
    pub parent_name: String,
    pub material: MaterialInfo,
    /// Local transform at load time
    pub transform: PartTransform,
    /// World-space Y at load time, before any reparenting
    pub world_y: f32,
    pub bounds: Bounds,
}

/// A loaded, instantiated asset
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoadedAsset {
    pub root: NodeId,
    /// Meshes in traversal order
    pub meshes: Vec<MeshInfo>,
}

/// What a load is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadTarget {
    Structure,
    Panel { side: Side, family: PanelFamily },
}

/// Identifies an asset load. A completion whose generation is no longer
/// current for its target is stale and gets discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadTicket {
    pub target: LoadTarget,
    pub generation: u64,
}

/// Asset to fetch and where to put its root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRequest {
    pub url: String,
    pub placement: Placement,
}

/// Side effects for the host to apply, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneCommand {
    /// Fetch and instantiate an asset; answer with `Configurator::on_asset_loaded`
    Load { ticket: LoadTicket, request: AssetRequest },
    /// Despawn a node and everything below it
    Remove { node: NodeId },
    SetTransform { node: NodeId, transform: PartTransform },
    SetMaterial { node: NodeId, material: MaterialSpec },
    /// Keep a copy of the node's current material
    StashMaterial { node: NodeId },
    /// Put the stashed material back and forget it
    RestoreMaterial { node: NodeId },
}
