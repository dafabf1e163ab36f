use anyhow::Result;
use graphport_core::{
    Device, Engine, Executable, GraphIo, Parameters, Shape, Tensor,
};
use graphport_onnx::proto::{
    self, tensor_shape_proto, type_proto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto,
    TensorShapeProto, TypeProto, ValueInfoProto,
};
use graphport_onnx::{encode_tensor, import_model_bytes};
use graphport_runtime::{free_inputs, matches_reference, run_batches, GraphWrapper};
use prost::Message;

fn f32_value_info(name: &str, dims: &[i64]) -> ValueInfoProto {
    ValueInfoProto {
        name: name.to_string(),
        r#type: Some(TypeProto {
            tensor_type: Some(type_proto::Tensor {
                elem_type: proto::tensor_proto::DataType::Float as i32,
                shape: Some(TensorShapeProto {
                    dim: dims
                        .iter()
                        .map(|d| tensor_shape_proto::Dimension {
                            value: Some(if *d > 0 {
                                tensor_shape_proto::dimension::Value::DimValue(*d)
                            } else {
                                tensor_shape_proto::dimension::Value::DimParam("N".into())
                            }),
                            ..Default::default()
                        })
                        .collect(),
                }),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// probs = data + fc_weight, with fc_weight shipped as an initializer.
/// The batch dimension is dynamic so multi-example batches broadcast.
fn add_model_bytes() -> Result<Vec<u8>> {
    let weight = Tensor::from_f32s(Shape::from_slice(&[1, 3]), &[10.0, 20.0, 30.0])?;
    Ok(ModelProto {
        ir_version: 8,
        producer_name: "graphport-tests".into(),
        opset_import: vec![OperatorSetIdProto {
            domain: String::new(),
            version: 13,
        }],
        graph: Some(GraphProto {
            name: "add_graph".into(),
            node: vec![NodeProto {
                name: "add0".into(),
                op_type: "Add".into(),
                input: vec!["data".into(), "fc_weight".into()],
                output: vec!["probs".into()],
                ..Default::default()
            }],
            input: vec![
                f32_value_info("data", &[-1, 3]),
                f32_value_info("fc_weight", &[1, 3]),
            ],
            output: vec![f32_value_info("probs", &[-1, 3])],
            initializer: vec![encode_tensor("fc_weight", &weight)],
            ..Default::default()
        }),
        ..Default::default()
    }
    .encode_to_vec())
}

// ---- stub engine: echoes its input, no runtime dependency ----

struct EchoEngine;
struct EchoExecutable {
    io: GraphIo,
}

impl Engine for EchoEngine {
    type Executable = EchoExecutable;

    fn name(&self) -> &'static str {
        "echo"
    }

    fn build(&self, _model_bytes: &[u8], _device: Device) -> Result<Self::Executable> {
        Ok(EchoExecutable {
            io: GraphIo::default(),
        })
    }
}

impl Executable for EchoExecutable {
    fn io(&self) -> &GraphIo {
        &self.io
    }

    fn run(&mut self, inputs: Vec<Tensor>) -> Result<Vec<Tensor>> {
        Ok(inputs)
    }
}

#[test]
fn free_inputs_subtract_both_parameter_maps() -> Result<()> {
    let imported = import_model_bytes(&add_model_bytes()?)?;
    let free = free_inputs(&imported.graph, &imported.params);
    assert_eq!(free.len(), 1);
    assert_eq!(free[0].name.0, "data");

    // With no parameters at all, every graph input is free.
    let all = free_inputs(&imported.graph, &Parameters::default());
    assert_eq!(all.len(), 2);
    Ok(())
}

#[test]
fn batch_order_is_preserved() -> Result<()> {
    let imported = import_model_bytes(&add_model_bytes()?)?;
    let mut wrapper = GraphWrapper::build(&imported, &EchoEngine, Device::Cpu)?;

    let batches = vec![
        Tensor::from_f32s(Shape::from_slice(&[1, 2]), &[1.0, 2.0])?,
        Tensor::from_f32s(Shape::from_slice(&[2, 2]), &[3.0, 4.0, 5.0, 6.0])?,
        Tensor::from_f32s(Shape::from_slice(&[1, 2]), &[7.0, 8.0])?,
    ];
    let rows = run_batches(&mut wrapper, batches)?;
    assert_eq!(
        rows,
        vec![
            vec![1.0, 2.0],
            vec![3.0, 4.0],
            vec![5.0, 6.0],
            vec![7.0, 8.0]
        ]
    );
    Ok(())
}

#[test]
fn wrapper_reports_binding_outcome() -> Result<()> {
    let imported = import_model_bytes(&add_model_bytes()?)?;
    let wrapper = GraphWrapper::build(&imported, &EchoEngine, Device::Cpu)?;
    assert_eq!(wrapper.bind_report().bound, 1);
    assert!(wrapper.bind_report().skipped.is_empty());
    assert_eq!(wrapper.free_input_names()[0].0, "data");
    Ok(())
}

// ---- end-to-end through ONNX Runtime ----

#[test]
fn bound_model_runs_and_matches_reference() -> Result<()> {
    let imported = import_model_bytes(&add_model_bytes()?)?;
    let engine = graphport_backend_ort::OrtEngine::new();
    let mut wrapper = GraphWrapper::build(&imported, &engine, Device::Cpu)?;

    // After binding, the session's only remaining input is the free one.
    assert_eq!(wrapper.io().inputs.len(), 1);
    assert_eq!(wrapper.io().inputs[0].name.0, "data");

    let input = Tensor::from_f32s(Shape::from_slice(&[1, 3]), &[1.0, 2.0, 3.0])?;
    let rows = run_batches(&mut wrapper, vec![input])?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], vec![11.0, 22.0, 33.0]);

    // Output vector length equals the label-category count for this model.
    assert_eq!(rows[0].len(), 3);

    // The reference output picks class 2; so does the prediction.
    let reference = [0.0f32, 0.1, 0.9];
    assert!(matches_reference(&rows[0], &reference));
    Ok(())
}

#[test]
fn repeated_runs_are_deterministic() -> Result<()> {
    let imported = import_model_bytes(&add_model_bytes()?)?;
    let engine = graphport_backend_ort::OrtEngine::new();
    let mut wrapper = GraphWrapper::build(&imported, &engine, Device::Cpu)?;

    let input = Tensor::from_f32s(Shape::from_slice(&[1, 3]), &[0.25, -1.0, 4.5])?;
    let first = run_batches(&mut wrapper, vec![input.clone()])?;
    let second = run_batches(&mut wrapper, vec![input])?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn multi_example_batches_keep_row_order() -> Result<()> {
    let imported = import_model_bytes(&add_model_bytes()?)?;
    let engine = graphport_backend_ort::OrtEngine::new();
    let mut wrapper = GraphWrapper::build(&imported, &engine, Device::Cpu)?;

    let batch = Tensor::from_f32s(
        Shape::from_slice(&[2, 3]),
        &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
    )?;
    let rows = run_batches(&mut wrapper, vec![batch])?;
    assert_eq!(rows[0], vec![10.0, 20.0, 30.0]);
    assert_eq!(rows[1], vec![11.0, 21.0, 31.0]);
    Ok(())
}
