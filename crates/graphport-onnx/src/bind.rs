use std::collections::HashSet;

use anyhow::{Context, Result};
use graphport_core::Parameters;
use prost::Message;
use tracing::{info, warn};

use crate::import::{encode_tensor, ImportedModel};

/// What happened during parameter binding. A skipped name means the
/// parameter matched no slot in the graph; that is surfaced loudly
/// instead of being silently dropped, since it usually indicates a
/// name-mismatch bug between the model and its parameter maps.
#[derive(Clone, Debug, Default)]
pub struct BindReport {
    pub bound: usize,
    pub skipped: Vec<String>,
}

/// A re-serialized model with its parameters attached, ready to hand to
/// an execution engine.
pub struct BoundModel {
    pub bytes: Vec<u8>,
    pub report: BindReport,
}

impl ImportedModel {
    /// Re-attach `params` to the stripped graph as initializers, binding
    /// by name against the graph's slots (declared inputs plus every
    /// tensor name consumed by a node), and serialize the result.
    pub fn bind(&self, params: &Parameters) -> Result<BoundModel> {
        let source = self
            .model
            .graph
            .as_ref()
            .context("model carries no computation graph")?;

        let slots: HashSet<&str> = source
            .input
            .iter()
            .map(|vi| vi.name.as_str())
            .chain(
                source
                    .node
                    .iter()
                    .flat_map(|n| n.input.iter().map(String::as_str)),
            )
            .collect();

        let mut model = self.model.clone();
        let graph = model.graph.as_mut().expect("graph checked above");

        let mut report = BindReport::default();
        for (name, tensor) in params.iter_sorted() {
            if slots.contains(name) {
                graph.initializer.push(encode_tensor(name, tensor));
                report.bound += 1;
            } else {
                warn!(param = name, "parameter matches no graph slot, skipped");
                report.skipped.push(name.to_string());
            }
        }

        info!(
            bound = report.bound,
            skipped = report.skipped.len(),
            "parameter binding complete"
        );

        Ok(BoundModel {
            bytes: model.encode_to_vec(),
            report,
        })
    }
}
