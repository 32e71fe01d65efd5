use thiserror::Error;

use crate::battle::hex::HexCoordinate;

#[derive(Error, Debug)]
pub enum MapError {
    /// A hex was added outside the map's declared dimensions
    #[error("Hex {coord} is outside the map bounds (width {width}, height {height})")]
    OutOfBounds {
        coord: HexCoordinate,
        width: u32,
        height: u32,
    },

    #[error("Invalid map dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// A route referenced a coordinate that has no stored hex
    #[error("Wrong hex: no hex stored at {0}")]
    WrongHex(HexCoordinate),

    #[error("Hexes {from} and {to} are not adjacent")]
    NotAdjacent {
        from: HexCoordinate,
        to: HexCoordinate,
    },

    #[error("Invalid engine config: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MapError>;
