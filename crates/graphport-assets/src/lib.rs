//! Asset handling for the tutorial pipeline: idempotent downloads,
//! archive extraction, the label map, and the bundled reference tensors.

pub mod archive;
pub mod fetch;
pub mod labels;
pub mod sample;

pub use archive::extract_archive;
pub use fetch::{fetch_all, fetch_if_absent};
pub use labels::load_labels;
pub use sample::load_reference_pair;
