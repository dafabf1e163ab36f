use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use bytes::Bytes;
use graphport_core::{DType, GraphDescription, IOName, Parameters, Shape, Tensor, TensorSpec};
use prost::Message;
use tracing::debug;

use crate::proto;
use crate::proto::tensor_proto::DataType;

/// Batch-norm statistic suffixes. Initializers named like these are
/// auxiliary (non-trainable) state rather than learned weights.
const AUX_SUFFIXES: &[&str] = &["moving_mean", "moving_var", "running_mean", "running_var"];

/// Result of importing an interchange-format model file: the immutable
/// graph description, the split parameter maps, and the initializer-
/// stripped protobuf kept for re-binding.
pub struct ImportedModel {
    pub graph: GraphDescription,
    pub params: Parameters,
    pub(crate) model: proto::ModelProto,
}

/// Parse a serialized ONNX model from disk into a graph description plus
/// trainable (`args`) and auxiliary (`auxs`) parameter maps.
pub fn import_model(path: &Path) -> Result<ImportedModel> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read model file {path:?}"))?;
    import_model_bytes(&bytes).with_context(|| format!("failed to import model {path:?}"))
}

pub fn import_model_bytes(bytes: &[u8]) -> Result<ImportedModel> {
    let mut model =
        proto::ModelProto::decode(bytes).context("failed to decode ONNX protobuf")?;
    ensure!(
        model.ir_version > 0,
        "missing IR version; not an ONNX model?"
    );

    let graph_proto = model
        .graph
        .as_mut()
        .context("model carries no computation graph")?;

    let mut params = Parameters::default();
    for tp in std::mem::take(&mut graph_proto.initializer) {
        let name = tp.name.clone();
        ensure!(!name.is_empty(), "initializer without a name");
        let tensor =
            decode_tensor(&tp).with_context(|| format!("bad initializer `{name}`"))?;
        if is_auxiliary(&name) {
            params.auxs.insert(name, tensor);
        } else {
            params.args.insert(name, tensor);
        }
    }

    let graph = describe_graph(graph_proto)?;
    debug!(
        graph = %graph.name,
        inputs = graph.inputs.len(),
        outputs = graph.outputs.len(),
        args = params.args.len(),
        auxs = params.auxs.len(),
        "imported model"
    );

    Ok(ImportedModel {
        graph,
        params,
        model,
    })
}

/// Decode a standalone `TensorProto` file (the model-zoo sample format).
pub fn read_tensor_file(path: &Path) -> Result<Tensor> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read tensor file {path:?}"))?;
    let tp = proto::TensorProto::decode(bytes.as_slice())
        .with_context(|| format!("failed to decode tensor file {path:?}"))?;
    decode_tensor(&tp)
}

pub fn is_auxiliary(name: &str) -> bool {
    AUX_SUFFIXES.iter().any(|s| name.ends_with(s))
}

fn describe_graph(graph: &proto::GraphProto) -> Result<GraphDescription> {
    let inputs = graph
        .input
        .iter()
        .map(spec_from_value_info)
        .collect::<Result<Vec<_>>>()?;
    let outputs = graph
        .output
        .iter()
        .map(spec_from_value_info)
        .collect::<Result<Vec<_>>>()?;

    Ok(GraphDescription {
        name: graph.name.clone(),
        inputs,
        outputs,
    })
}

fn spec_from_value_info(vi: &proto::ValueInfoProto) -> Result<TensorSpec> {
    let tensor_type = vi
        .r#type
        .as_ref()
        .and_then(|t| t.tensor_type.as_ref())
        .with_context(|| format!("graph value `{}` is not a tensor", vi.name))?;

    let dtype = elem_dtype(tensor_type.elem_type)
        .with_context(|| format!("graph value `{}`", vi.name))?;

    let dims = tensor_type
        .shape
        .as_ref()
        .map(|shape| {
            shape
                .dim
                .iter()
                .map(|d| match &d.value {
                    Some(proto::tensor_shape_proto::dimension::Value::DimValue(v)) if *v > 0 => {
                        Some(*v as usize)
                    }
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(TensorSpec {
        name: IOName(vi.name.clone()),
        dtype,
        dims,
    })
}

fn elem_dtype(raw: i32) -> Result<DType> {
    let ty = DataType::try_from(raw).unwrap_or(DataType::Undefined);
    match ty {
        DataType::Float => Ok(DType::F32),
        DataType::Double => Ok(DType::F64),
        DataType::Int64 => Ok(DType::I64),
        DataType::Int32 => Ok(DType::I32),
        DataType::Uint8 => Ok(DType::U8),
        other => bail!("unsupported tensor element type: {other:?}"),
    }
}

/// Decode a `TensorProto` into a host tensor. Values may live either in
/// `raw_data` (little-endian) or in the per-type repeated field.
pub fn decode_tensor(tp: &proto::TensorProto) -> Result<Tensor> {
    let mut dims = Vec::with_capacity(tp.dims.len());
    for d in &tp.dims {
        ensure!(*d >= 0, "negative tensor dimension {d}");
        dims.push(*d as usize);
    }
    let shape = Shape::from_slice(&dims);
    let dtype = elem_dtype(tp.data_type)?;

    if !tp.raw_data.is_empty() {
        return Tensor::from_bytes(dtype, shape, Bytes::copy_from_slice(&tp.raw_data));
    }

    match dtype {
        DType::F32 => Tensor::from_f32s(shape, &tp.float_data),
        DType::I64 => Tensor::from_i64s(shape, &tp.int64_data),
        DType::F64 => {
            let mut bytes = Vec::with_capacity(tp.double_data.len() * 8);
            for v in &tp.double_data {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
            Tensor::from_bytes(dtype, shape, Bytes::from(bytes))
        }
        DType::I32 => {
            let mut bytes = Vec::with_capacity(tp.int32_data.len() * 4);
            for v in &tp.int32_data {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
            Tensor::from_bytes(dtype, shape, Bytes::from(bytes))
        }
        DType::U8 => {
            let mut bytes = Vec::with_capacity(tp.int32_data.len());
            for v in &tp.int32_data {
                ensure!((0..=255).contains(v), "u8 tensor value {v} out of range");
                bytes.push(*v as u8);
            }
            Tensor::from_bytes(dtype, shape, Bytes::from(bytes))
        }
    }
}

/// Encode a host tensor back into a `TensorProto` initializer.
pub fn encode_tensor(name: &str, tensor: &Tensor) -> proto::TensorProto {
    let data_type = match tensor.dtype {
        DType::F32 => DataType::Float,
        DType::F64 => DataType::Double,
        DType::I64 => DataType::Int64,
        DType::I32 => DataType::Int32,
        DType::U8 => DataType::Uint8,
    };

    proto::TensorProto {
        dims: tensor.shape.0.iter().map(|d| *d as i64).collect(),
        data_type: data_type as i32,
        name: name.to_string(),
        raw_data: tensor.bytes.to_vec(),
        ..Default::default()
    }
}
