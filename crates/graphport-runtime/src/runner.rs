use anyhow::{ensure, Context, Result};
use graphport_core::{Executable, Tensor};
use tracing::debug;

use crate::wrapper::GraphWrapper;

/// Run each batch through the wrapper, one at a time and in input order,
/// splitting the first output of every batch along its leading axis into
/// per-example score rows. The flattened result order equals input order.
pub fn run_batches<X: Executable>(
    wrapper: &mut GraphWrapper<X>,
    batches: Vec<Tensor>,
) -> Result<Vec<Vec<f32>>> {
    let mut rows = Vec::new();

    for (i, batch) in batches.into_iter().enumerate() {
        let batch_size = batch.shape.leading();
        let outputs = wrapper
            .run(vec![batch])
            .with_context(|| format!("inference failed on batch {i}"))?;
        let output = outputs
            .into_iter()
            .next()
            .with_context(|| format!("batch {i} produced no outputs"))?;

        rows.extend(split_rows(&output, batch_size)?);
        debug!(batch = i, examples = batch_size, "batch complete");
    }

    Ok(rows)
}

/// Split a batched output tensor into `batch_size` equal-length f32 rows.
fn split_rows(output: &Tensor, batch_size: usize) -> Result<Vec<Vec<f32>>> {
    let values = output.to_f32s()?;
    ensure!(batch_size > 0, "empty batch");
    ensure!(
        values.len().is_multiple_of(batch_size),
        "output of {} values does not divide into {batch_size} examples",
        values.len()
    );

    let row_len = values.len() / batch_size;
    Ok(values
        .chunks_exact(row_len)
        .map(|row| row.to_vec())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphport_core::{DType, Shape};

    #[test]
    fn splits_rows_in_order() -> Result<()> {
        let t = Tensor::from_f32s(
            Shape::from_slice(&[3, 2]),
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        )?;
        let rows = split_rows(&t, 3)?;
        assert_eq!(rows, vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
        Ok(())
    }

    #[test]
    fn uneven_split_is_rejected() -> Result<()> {
        let t = Tensor::from_f32s(Shape::from_slice(&[5]), &[0.0; 5])?;
        assert!(split_rows(&t, 2).is_err());
        Ok(())
    }

    #[test]
    fn non_f32_output_is_rejected() -> Result<()> {
        let t = Tensor::from_i64s(Shape::from_slice(&[2]), &[1, 2])?;
        assert_eq!(t.dtype, DType::I64);
        assert!(split_rows(&t, 2).is_err());
        Ok(())
    }
}
