//! Pergola Core - panel configuration and animation engine
//!
//! This crate holds everything the configurator decides without a renderer:
//! - Geometry table of placements, asset ids and motion parameters
//! - Part classification of loaded assets into animation groups
//! - Panel mount lifecycle with generation tokens against stale loads
//! - Motion models and a single `tick(dt)` animation driver
//! - Theme presets, add-on toggles and the configurator facade
//!
//! The host (see `pergola-web`) drains [`SceneCommand`]s every frame and
//! reports finished loads back through [`Configurator::on_asset_loaded`].

pub mod addon;
pub mod animation;
pub mod classify;
pub mod config;
pub mod configurator;
pub mod geometry;
pub mod panel;
pub mod scene;
pub mod structure;
pub mod theme;
pub mod types;

pub use addon::{AddonBoard, AddonPhase};
pub use animation::{AnimationDriver, Direction, FrameOutcome, MotionModel, PlaySession, SessionKey};
pub use classify::{classify, ClassifiedParts, GroupRole, PartRecord};
pub use config::{load_config, save_config, Config, ConfigError};
pub use configurator::{AddonStatus, Configurator, ConfiguratorStatus, PanelStatus};
pub use geometry::{GeometryTable, GlassLayout, MovementLimit, SlideParams};
pub use panel::{MountPhase, MountedPanel, PanelBoard};
pub use scene::{
    AssetRequest, Bounds, LoadError, LoadTarget, LoadTicket, LoadedAsset, MaterialInfo, MeshInfo,
    SceneCommand,
};
pub use structure::Structure;
pub use theme::{MaterialPreset, MaterialSpec, ThemeScope};
pub use types::{
    Addon, Axis, NodeId, PanelFamily, ParseError, PartTransform, Placement, Side, SizeVariant,
    ThemeColor,
};
