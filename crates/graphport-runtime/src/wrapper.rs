use anyhow::Result;
use graphport_core::{
    Device, Engine, Executable, GraphDescription, GraphIo, IOName, Parameters, Tensor, TensorSpec,
};
use graphport_onnx::{BindReport, ImportedModel};
use tracing::info;

/// Graph inputs not satisfied by any parameter, in declaration order.
/// These are the values the caller must supply at execution time.
pub fn free_inputs(graph: &GraphDescription, params: &Parameters) -> Vec<TensorSpec> {
    graph
        .inputs
        .iter()
        .filter(|spec| !params.contains(&spec.name.0))
        .cloned()
        .collect()
}

/// An executable wrapper around an imported graph: parameters bound back
/// into the model, an engine-built executable, and the binding outcome.
pub struct GraphWrapper<X: Executable> {
    executable: X,
    free_inputs: Vec<TensorSpec>,
    report: BindReport,
}

impl<X: Executable> GraphWrapper<X> {
    /// Bind the imported model's parameters and build it on `device`.
    pub fn build<E>(imported: &ImportedModel, engine: &E, device: Device) -> Result<Self>
    where
        E: Engine<Executable = X>,
    {
        let free = free_inputs(&imported.graph, &imported.params);
        let bound = imported.bind(&imported.params)?;
        let executable = engine.build(&bound.bytes, device)?;

        info!(
            engine = engine.name(),
            graph = %imported.graph.name,
            free_inputs = free.len(),
            bound = bound.report.bound,
            skipped = bound.report.skipped.len(),
            "graph wrapper ready"
        );

        Ok(Self {
            executable,
            free_inputs: free,
            report: bound.report,
        })
    }

    pub fn free_inputs(&self) -> &[TensorSpec] {
        &self.free_inputs
    }

    pub fn free_input_names(&self) -> Vec<IOName> {
        self.free_inputs.iter().map(|s| s.name.clone()).collect()
    }

    pub fn bind_report(&self) -> &BindReport {
        &self.report
    }

    pub fn io(&self) -> &GraphIo {
        self.executable.io()
    }

    /// Run one set of free-input tensors through the graph.
    pub fn run(&mut self, inputs: Vec<Tensor>) -> Result<Vec<Tensor>> {
        self.executable.run(inputs)
    }
}
