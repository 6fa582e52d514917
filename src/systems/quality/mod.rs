//! Adaptive quality: feedback controller, settings bundle, capability probe

pub mod capabilities;
pub mod controller;
pub mod settings;

pub use capabilities::Capabilities;
pub use controller::{PerformanceRegime, QualityController, QualitySettings, QualityUpdate};
pub use settings::{optimize, BaseSettings, GridResolution, OptimizedSettings};
