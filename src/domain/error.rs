//! Engine error types

use thiserror::Error;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Configuration and lifecycle errors.
///
/// Every variant is raised before any state is mutated, so a refused
/// transition leaves the engine exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("at least one volume is required to start the simulation")]
    NoVolumes,

    #[error("authored volumes have zero total volume")]
    EmptyVolume,

    #[error("density must be a positive finite number, got {0}")]
    InvalidDensity(f32),

    #[error("invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("volume min corner must not exceed max corner on any axis")]
    InvalidVolume,

    #[error("run needs {required} bytes of GPU memory, budget is {budget}")]
    MemoryBudgetExceeded { required: u64, budget: u64 },

    #[error("operation requires a running simulation")]
    NotSimulating,

    #[error("config parse error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Json(e.to_string())
    }
}
