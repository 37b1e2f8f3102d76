//! Shared vocabulary: sizes, sides, panel families, themes and transforms

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown structure size: {0}")]
    UnknownSize(String),
    #[error("Unknown side: {0}")]
    UnknownSide(String),
    #[error("Unknown panel family: {0}")]
    UnknownFamily(String),
    #[error("Unknown theme color: {0}")]
    UnknownTheme(String),
    #[error("Unknown add-on: {0}")]
    UnknownAddon(String),
}

/// Feet to scene units (metres)
pub const FOOT: f32 = 0.3048;

/// Supported structure sizes (width × depth in feet)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SizeVariant {
    #[default]
    #[serde(rename = "10x10")]
    S10x10,
    #[serde(rename = "10x13")]
    S10x13,
    #[serde(rename = "13x13")]
    S13x13,
    #[serde(rename = "13x20")]
    S13x20,
}

impl SizeVariant {
    pub const ALL: [SizeVariant; 4] = [
        SizeVariant::S10x10,
        SizeVariant::S10x13,
        SizeVariant::S13x13,
        SizeVariant::S13x20,
    ];

    /// Short slug used in asset and mesh names ("10x10")
    pub fn slug(&self) -> &'static str {
        match self {
            SizeVariant::S10x10 => "10x10",
            SizeVariant::S10x13 => "10x13",
            SizeVariant::S13x13 => "13x13",
            SizeVariant::S13x20 => "13x20",
        }
    }

    /// Human-readable label for the UI
    pub fn label(&self) -> &'static str {
        match self {
            SizeVariant::S10x10 => "10'x10'",
            SizeVariant::S10x13 => "10'x13'",
            SizeVariant::S13x13 => "13'x13'",
            SizeVariant::S13x20 => "13'x20'",
        }
    }

    /// (width, depth) in feet
    pub fn feet(&self) -> (u32, u32) {
        match self {
            SizeVariant::S10x10 => (10, 10),
            SizeVariant::S10x13 => (10, 13),
            SizeVariant::S13x13 => (13, 13),
            SizeVariant::S13x20 => (13, 20),
        }
    }

    /// Span in feet covered by a panel on the given side
    pub fn span_feet(&self, side: Side) -> u32 {
        let (width, depth) = self.feet();
        match side {
            Side::Front | Side::Rear => width,
            Side::Left | Side::Right => depth,
        }
    }
}

impl fmt::Display for SizeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SizeVariant {
    type Err = ParseError;

    /// Accepts "10x10", "10'x10'" and "10X10"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '\'' && !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        SizeVariant::ALL
            .into_iter()
            .find(|size| size.slug() == normalized)
            .ok_or_else(|| ParseError::UnknownSize(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Front,
    Rear,
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Front, Side::Rear, Side::Left, Side::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Front => "front",
            Side::Rear => "rear",
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Side::ALL
            .into_iter()
            .find(|side| side.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::UnknownSide(s.to_string()))
    }
}

/// Overlay panel systems that can be mounted on a side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelFamily {
    /// Sliding glass doors
    Glass,
    /// Roll-up zip screen
    Zip,
}

impl PanelFamily {
    pub const ALL: [PanelFamily; 2] = [PanelFamily::Glass, PanelFamily::Zip];

    pub fn as_str(&self) -> &'static str {
        match self {
            PanelFamily::Glass => "glass",
            PanelFamily::Zip => "zip",
        }
    }

    /// The other family that can share a side
    pub fn companion(&self) -> PanelFamily {
        match self {
            PanelFamily::Glass => PanelFamily::Zip,
            PanelFamily::Zip => PanelFamily::Glass,
        }
    }
}

impl fmt::Display for PanelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PanelFamily {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PanelFamily::ALL
            .into_iter()
            .find(|family| family.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::UnknownFamily(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeColor {
    #[default]
    Black,
    White,
}

impl ThemeColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeColor::Black => "black",
            ThemeColor::White => "white",
        }
    }
}

impl FromStr for ThemeColor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "black" => Ok(ThemeColor::Black),
            "white" => Ok(ThemeColor::White),
            _ => Err(ParseError::UnknownTheme(s.to_string())),
        }
    }
}

/// Optional extras attached to the primary structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Addon {
    Lighting,
}

impl Addon {
    pub const ALL: [Addon; 1] = [Addon::Lighting];

    pub fn as_str(&self) -> &'static str {
        match self {
            Addon::Lighting => "lighting",
        }
    }
}

impl FromStr for Addon {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Addon::ALL
            .into_iter()
            .find(|addon| addon.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::UnknownAddon(s.to_string()))
    }
}

/// Local coordinate axis of a part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Opaque handle of a host scene node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Placement of a loaded asset root: position plus yaw (radians, about +Y)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Placement {
    pub position: [f32; 3],
    pub yaw: f32,
}

/// Local transform of a part.
/// Rotation is Euler XYZ in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartTransform {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for PartTransform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_parsing() {
        assert_eq!("10x10".parse::<SizeVariant>().unwrap(), SizeVariant::S10x10);
        assert_eq!("10'x10'".parse::<SizeVariant>().unwrap(), SizeVariant::S10x10);
        assert_eq!("13X20".parse::<SizeVariant>().unwrap(), SizeVariant::S13x20);
        assert!("12x12".parse::<SizeVariant>().is_err());
    }

    #[test]
    fn test_span_follows_side() {
        let size = SizeVariant::S10x13;
        assert_eq!(size.span_feet(Side::Front), 10);
        assert_eq!(size.span_feet(Side::Rear), 10);
        assert_eq!(size.span_feet(Side::Left), 13);
        assert_eq!(size.span_feet(Side::Right), 13);
    }

    #[test]
    fn test_enum_strings() {
        assert_eq!("FRONT".parse::<Side>().unwrap(), Side::Front);
        assert_eq!("zip".parse::<PanelFamily>().unwrap(), PanelFamily::Zip);
        assert_eq!(" White ".parse::<ThemeColor>().unwrap(), ThemeColor::White);
        assert_eq!("lighting".parse::<Addon>().unwrap(), Addon::Lighting);
        assert_eq!(PanelFamily::Glass.companion(), PanelFamily::Zip);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&SizeVariant::S13x13).unwrap();
        assert_eq!(json, "\"13x13\"");
        let side: Side = serde_json::from_str("\"left\"").unwrap();
        assert_eq!(side, Side::Left);
    }
}
