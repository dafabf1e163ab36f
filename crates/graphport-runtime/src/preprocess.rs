use std::path::Path;

use anyhow::{ensure, Context, Result};
use graphport_core::{Shape, Tensor};
use image::imageops::FilterType;
use tracing::debug;

/// Default classifier input side length.
pub const INPUT_SIDE: u32 = 224;

/// Decode the named images, resize each to `side` x `side` RGB, scale to
/// [0, 1], and stack them into one NCHW f32 batch tensor.
pub fn images_to_batch(paths: &[impl AsRef<Path>], side: u32) -> Result<Tensor> {
    ensure!(!paths.is_empty(), "no images to preprocess");

    let plane = (side * side) as usize;
    let mut data = Vec::with_capacity(paths.len() * 3 * plane);

    for path in paths {
        let path = path.as_ref();
        let img = image::open(path)
            .with_context(|| format!("failed to decode image {path:?}"))?
            .resize_exact(side, side, FilterType::Triangle)
            .to_rgb8();

        // Channel-first layout: all of R, then G, then B.
        for c in 0..3usize {
            for px in img.pixels() {
                data.push(f32::from(px.0[c]) / 255.0);
            }
        }
        debug!(path = %path.display(), side, "image preprocessed");
    }

    Tensor::from_f32s(
        Shape::from_slice(&[paths.len(), 3, side as usize, side as usize]),
        &data,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphport_core::DType;

    fn write_png(dir: &Path, name: &str, rgb: [u8; 3]) -> Result<std::path::PathBuf> {
        let path = dir.join(name);
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb(rgb));
        img.save(&path)?;
        Ok(path)
    }

    #[test]
    fn batch_is_nchw_and_scaled() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let red = write_png(dir.path(), "red.png", [255, 0, 0])?;
        let blue = write_png(dir.path(), "blue.png", [0, 0, 255])?;

        let batch = images_to_batch(&[red, blue], 4)?;
        assert_eq!(batch.dtype, DType::F32);
        assert_eq!(batch.shape, Shape::from_slice(&[2, 3, 4, 4]));

        let v = batch.to_f32s()?;
        let plane = 16;
        // Example 0 is solid red: R plane ones, G and B planes zero.
        assert!(v[..plane].iter().all(|x| (*x - 1.0).abs() < 1e-6));
        assert!(v[plane..3 * plane].iter().all(|x| x.abs() < 1e-6));
        // Example 1 is solid blue: its B plane is ones.
        assert!(v[3 * plane + 2 * plane..].iter().all(|x| (*x - 1.0).abs() < 1e-6));
        Ok(())
    }

    #[test]
    fn empty_input_is_rejected() {
        let paths: [&Path; 0] = [];
        assert!(images_to_batch(&paths, 4).is_err());
    }

    #[test]
    fn undecodable_image_is_fatal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png")?;
        assert!(images_to_batch(&[path], 4).is_err());
        Ok(())
    }
}
