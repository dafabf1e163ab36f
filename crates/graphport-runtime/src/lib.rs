//! Pipeline glue: wrapper construction (free inputs + explicit parameter
//! binding), the sequential batch runner, argmax validation, top-K
//! reporting, and image-to-batch preprocessing.

pub mod classify;
pub mod preprocess;
pub mod runner;
pub mod wrapper;

pub use classify::{argmax, matches_reference, render_top_k, top_k};
pub use preprocess::images_to_batch;
pub use runner::run_batches;
pub use wrapper::{free_inputs, GraphWrapper};
