use std::collections::HashMap;

use crate::Tensor;

/// Name-to-tensor mapping for one parameter class.
pub type ParamMap = HashMap<String, Tensor>;

/// The two parameter classes produced by model import: learned weights
/// (`args`) and fixed auxiliary statistics such as batch-norm running
/// means (`auxs`). Populated once at load time, read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct Parameters {
    pub args: ParamMap,
    pub auxs: ParamMap,
}

impl Parameters {
    pub fn contains(&self, name: &str) -> bool {
        self.args.contains_key(name) || self.auxs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.args.len() + self.auxs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.auxs.is_empty()
    }

    /// All parameters in deterministic (sorted-by-name) order, args first.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        let mut args: Vec<_> = self.args.iter().collect();
        args.sort_by(|a, b| a.0.cmp(b.0));
        let mut auxs: Vec<_> = self.auxs.iter().collect();
        auxs.sort_by(|a, b| a.0.cmp(b.0));
        args.into_iter()
            .chain(auxs)
            .map(|(k, v)| (k.as_str(), v))
    }
}
