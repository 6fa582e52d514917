pub mod gpu;
pub mod quality;
pub mod sizing;
