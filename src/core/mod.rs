//! Leaf utilities: math kernel, object pool, logging, RNG

#[macro_use]
pub mod utils;
pub mod math;
pub mod pool;
