use std::path::Path;

use anyhow::{Context, Result};
use graphport_core::Tensor;
use graphport_onnx::read_tensor_file;
use tracing::debug;

/// Load the bundled reference input/output pair from a model-zoo style
/// `test_data_set_*` directory (`input_0.pb` / `output_0.pb`, each a
/// serialized `TensorProto`).
pub fn load_reference_pair(dir: &Path) -> Result<(Tensor, Tensor)> {
    let input = read_tensor_file(&dir.join("input_0.pb"))
        .with_context(|| format!("missing reference input in {dir:?}"))?;
    let output = read_tensor_file(&dir.join("output_0.pb"))
        .with_context(|| format!("missing reference output in {dir:?}"))?;

    debug!(
        input_shape = %input.shape,
        output_shape = %output.shape,
        "loaded reference sample"
    );
    Ok((input, output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphport_core::Shape;
    use graphport_onnx::encode_tensor;
    use prost::Message as _;

    #[test]
    fn loads_a_reference_pair() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = Tensor::from_f32s(Shape::from_slice(&[1, 3, 2, 2]), &[0.0; 12])?;
        let output = Tensor::from_f32s(Shape::from_slice(&[1, 4]), &[0.1, 0.7, 0.1, 0.1])?;
        std::fs::write(
            dir.path().join("input_0.pb"),
            encode_tensor("input_0", &input).encode_to_vec(),
        )?;
        std::fs::write(
            dir.path().join("output_0.pb"),
            encode_tensor("output_0", &output).encode_to_vec(),
        )?;

        let (i, o) = load_reference_pair(dir.path())?;
        assert_eq!(i.shape, Shape::from_slice(&[1, 3, 2, 2]));
        assert_eq!(o.to_f32s()?, vec![0.1, 0.7, 0.1, 0.1]);
        Ok(())
    }

    #[test]
    fn missing_files_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_reference_pair(dir.path()).is_err());
    }
}
