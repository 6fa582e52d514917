//! Authored data and tunables: volumes, config, presets, errors

pub mod config;
pub mod error;
pub mod presets;
pub mod volume;
