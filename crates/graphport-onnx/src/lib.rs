//! ONNX model import: protobuf message types, the graph/parameter split,
//! and parameter re-binding. Operator semantics stay out of scope; the
//! execution engine owns them.

pub mod bind;
pub mod import;
pub mod proto;

pub use bind::{BindReport, BoundModel};
pub use import::{
    decode_tensor, encode_tensor, import_model, import_model_bytes, is_auxiliary,
    read_tensor_file, ImportedModel,
};
