//! ONNX Runtime implementation of the execution-engine seam. Sessions are
//! built from in-memory model bytes so the caller can re-bind parameters
//! before handing the model over.

use anyhow::{bail, ensure, Context, Result};
use bytes::Bytes;
use graphport_core::{
    DType, Device, Engine, Executable, GraphIo, IOName, Shape, Tensor, TensorSpec,
};
use ort::{
    session::{builder::SessionBuilder, Session, SessionInputValue},
    value::{DynValue, TensorElementType, ValueType},
};

pub struct OrtEngine;

impl OrtEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OrtEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct OrtExecutable {
    io: GraphIo,
    session: Session,
    input_names: Vec<String>,
}

impl Engine for OrtEngine {
    type Executable = OrtExecutable;

    fn name(&self) -> &'static str {
        "onnxruntime"
    }

    fn build(&self, model_bytes: &[u8], device: Device) -> Result<Self::Executable> {
        let builder = Session::builder()
            .context("failed to create ORT session builder")?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| anyhow::anyhow!(e.to_string()))
            .context("failed to configure ORT session builder")?;

        let mut builder = configure_session_builder(builder, device)?;

        let session = builder
            .commit_from_memory(model_bytes)
            .context("failed to build ORT session from model bytes")?;

        let input_names = session
            .inputs()
            .iter()
            .map(|input| input.name().to_string())
            .collect();

        let io = build_graph_io(&session)?;

        Ok(OrtExecutable {
            io,
            session,
            input_names,
        })
    }
}

impl Executable for OrtExecutable {
    fn io(&self) -> &GraphIo {
        &self.io
    }

    fn run(&mut self, inputs: Vec<Tensor>) -> Result<Vec<Tensor>> {
        ensure!(
            inputs.len() == self.input_names.len(),
            "expected {} inputs, got {}",
            self.input_names.len(),
            inputs.len()
        );

        let mut ort_inputs = Vec::with_capacity(inputs.len());
        for (name, input) in self.input_names.iter().zip(inputs) {
            let value = tensor_to_ort_value(input)
                .with_context(|| format!("bad value for input `{name}`"))?;
            ort_inputs.push((name.clone(), SessionInputValue::from(value)));
        }

        let outputs = self.session.run(ort_inputs)?;
        let mut out_tensors = Vec::with_capacity(outputs.len());
        for (name, value) in outputs.iter() {
            out_tensors.push(
                ort_value_to_tensor(&value)
                    .with_context(|| format!("bad value for output `{name}`"))?,
            );
        }

        Ok(out_tensors)
    }
}

fn build_graph_io(session: &Session) -> Result<GraphIo> {
    let inputs = session
        .inputs()
        .iter()
        .map(|input| tensor_spec_from_value_type(input.name(), input.dtype()))
        .collect::<Result<Vec<_>>>()?;

    let outputs = session
        .outputs()
        .iter()
        .map(|output| tensor_spec_from_value_type(output.name(), output.dtype()))
        .collect::<Result<Vec<_>>>()?;

    Ok(GraphIo { inputs, outputs })
}

fn configure_session_builder(builder: SessionBuilder, device: Device) -> Result<SessionBuilder> {
    match device {
        Device::Cpu => Ok(builder),
        Device::Cuda { device_id } => configure_cuda(builder, device_id),
    }
}

fn configure_cuda(builder: SessionBuilder, device_id: u32) -> Result<SessionBuilder> {
    #[cfg(feature = "cuda")]
    {
        use ort::execution_providers::cuda::CUDAExecutionProvider;
        let ep = CUDAExecutionProvider::default()
            .with_device_id(device_id as i32)
            .build();
        builder
            .with_execution_providers([ep])
            .context("failed to enable ORT CUDA execution provider")
    }
    #[cfg(not(feature = "cuda"))]
    {
        let _ = (builder, device_id);
        bail!("CUDA requested but graphport-backend-ort was built without the `cuda` feature")
    }
}

fn tensor_spec_from_value_type(name: &str, value_type: &ValueType) -> Result<TensorSpec> {
    let ValueType::Tensor { ty, shape, .. } = value_type else {
        bail!("unsupported non-tensor IO value type");
    };

    let dtype = ort_element_to_dtype(*ty)?;
    let dims = shape
        .iter()
        .map(|d| if *d < 0 { None } else { Some(*d as usize) })
        .collect::<Vec<_>>();

    Ok(TensorSpec {
        name: IOName(name.to_string()),
        dtype,
        dims,
    })
}

fn ort_element_to_dtype(ty: TensorElementType) -> Result<DType> {
    match ty {
        TensorElementType::Float32 => Ok(DType::F32),
        TensorElementType::Float64 => Ok(DType::F64),
        TensorElementType::Int64 => Ok(DType::I64),
        TensorElementType::Int32 => Ok(DType::I32),
        TensorElementType::Uint8 => Ok(DType::U8),
        _ => bail!("unsupported tensor element type: {ty}"),
    }
}

fn tensor_to_ort_value(tensor: Tensor) -> Result<DynValue> {
    let shape: Vec<usize> = tensor.shape.0.iter().copied().collect();

    let value = match tensor.dtype {
        DType::F32 => {
            ort::value::Tensor::from_array((shape, tensor.to_f32s()?))?.into_dyn()
        }
        DType::F64 => {
            ort::value::Tensor::from_array((shape, tensor.to_f64s()?))?.into_dyn()
        }
        DType::I64 => {
            ort::value::Tensor::from_array((shape, tensor.to_i64s()?))?.into_dyn()
        }
        DType::I32 => {
            ort::value::Tensor::from_array((shape, tensor.to_i32s()?))?.into_dyn()
        }
        DType::U8 => {
            ort::value::Tensor::from_array((shape, tensor.bytes.to_vec()))?.into_dyn()
        }
    };

    Ok(value)
}

fn ort_value_to_tensor(value: &ort::value::ValueRef<'_>) -> Result<Tensor> {
    let ValueType::Tensor { ty, shape, .. } = value.dtype() else {
        bail!("non-tensor outputs are not supported");
    };

    let dims: Vec<usize> = shape.iter().map(|d| *d as usize).collect();
    let shape = Shape::from_slice(&dims);

    match *ty {
        TensorElementType::Float32 => {
            let array = value.try_extract_array::<f32>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            Tensor::from_bytes(DType::F32, shape, le_bytes(slice, f32::to_le_bytes))
        }
        TensorElementType::Float64 => {
            let array = value.try_extract_array::<f64>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            Tensor::from_bytes(DType::F64, shape, le_bytes(slice, f64::to_le_bytes))
        }
        TensorElementType::Int64 => {
            let array = value.try_extract_array::<i64>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            Tensor::from_bytes(DType::I64, shape, le_bytes(slice, i64::to_le_bytes))
        }
        TensorElementType::Int32 => {
            let array = value.try_extract_array::<i32>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            Tensor::from_bytes(DType::I32, shape, le_bytes(slice, i32::to_le_bytes))
        }
        TensorElementType::Uint8 => {
            let array = value.try_extract_array::<u8>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            Tensor::from_bytes(DType::U8, shape, Bytes::copy_from_slice(slice))
        }
        _ => bail!("unsupported output tensor element type: {ty}"),
    }
}

fn le_bytes<T: Copy, const N: usize>(slice: &[T], to_le: impl Fn(T) -> [u8; N]) -> Bytes {
    let mut bytes = Vec::with_capacity(slice.len() * N);
    for v in slice {
        bytes.extend_from_slice(&to_le(*v));
    }
    Bytes::from(bytes)
}
