//! Fluid Particles Engine - sizing, adaptive quality and GPU bookkeeping in WASM
//!
//! Architecture:
//! - core/        - Math kernel, object pool, logging and RNG utilities
//! - domain/      - Volumes, configuration, presets, errors
//! - systems/     - Sizing model, quality controller, GPU ledger and state cache
//! - simulation/  - Lifecycle orchestration and the JS facade

// Logging macros must be in scope before the other modules.
#[macro_use]
pub mod core;
pub mod domain;
pub mod systems;
pub mod simulation;

use wasm_bindgen::prelude::*;

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
pub use wasm_bindgen_rayon::init_thread_pool;

// Better error messages in debug mode
#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Initialize the engine
#[wasm_bindgen]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    console_log!("Fluid particles engine {} initialized", env!("CARGO_PKG_VERSION"));
}

/// Get engine version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// Re-export main types
pub use domain::config::{DegradeCadence, QualityParams, QualityPreset, SimulationConfig};
pub use domain::error::{EngineError, EngineResult};
pub use domain::volume::Volume;
pub use simulation::{FluidCore, FluidEngine, FluidSolver, LifecycleState, ParticleLayout, RenderContext};
pub use systems::sizing::{compute_plan, SizingPlan, SizingScale};

// Command stream opcodes for the JS replayer
#[wasm_bindgen]
pub fn op_create_texture() -> u32 { systems::gpu::command_queue::OP_CREATE_TEXTURE }
#[wasm_bindgen]
pub fn op_delete_texture() -> u32 { systems::gpu::command_queue::OP_DELETE_TEXTURE }
#[wasm_bindgen]
pub fn op_create_buffer() -> u32 { systems::gpu::command_queue::OP_CREATE_BUFFER }
#[wasm_bindgen]
pub fn op_delete_buffer() -> u32 { systems::gpu::command_queue::OP_DELETE_BUFFER }
#[wasm_bindgen]
pub fn op_use_program() -> u32 { systems::gpu::command_queue::OP_USE_PROGRAM }
#[wasm_bindgen]
pub fn op_bind_texture() -> u32 { systems::gpu::command_queue::OP_BIND_TEXTURE }
#[wasm_bindgen]
pub fn op_bind_buffer() -> u32 { systems::gpu::command_queue::OP_BIND_BUFFER }
#[wasm_bindgen]
pub fn op_draw_arrays() -> u32 { systems::gpu::command_queue::OP_DRAW_ARRAYS }
#[wasm_bindgen]
pub fn handle_none() -> u32 { systems::gpu::command_queue::NONE }
