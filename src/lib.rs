//! Hex Tactics - movement and line-of-sight engine for hex-grid combat

pub mod battle;
pub mod core;
