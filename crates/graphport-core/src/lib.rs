pub mod engine;
pub mod graph;
pub mod params;
pub mod tensor;

pub use engine::*;
pub use graph::*;
pub use params::*;
pub use tensor::*;
