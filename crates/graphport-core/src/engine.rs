use anyhow::Result;

use crate::{Device, GraphIo, Tensor};

/// A tensor-execution engine that can turn serialized model bytes into an
/// executable. Device choice is made once here; the executable never moves
/// between devices.
pub trait Engine {
    type Executable: Executable;

    fn name(&self) -> &'static str;
    fn build(&self, model_bytes: &[u8], device: Device) -> Result<Self::Executable>;
}

pub trait Executable {
    fn io(&self) -> &GraphIo;

    /// Inputs are ordered to match `io().inputs`; outputs match
    /// `io().outputs`.
    fn run(&mut self, inputs: Vec<Tensor>) -> Result<Vec<Tensor>>;
}
