use std::fs::File;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use flate2::read::GzDecoder;
use tracing::{debug, info};

/// Extract a gzipped tarball into `unpack_root` unless `expected_dir`
/// (the directory the tarball is known to contain) already exists.
/// Returns whether extraction actually happened.
pub fn extract_archive(archive: &Path, unpack_root: &Path, expected_dir: &Path) -> Result<bool> {
    if expected_dir.exists() {
        debug!(path = %expected_dir.display(), "archive already extracted, skipping");
        return Ok(false);
    }

    info!(archive = %archive.display(), dest = %unpack_root.display(), "extracting archive");
    let file = File::open(archive)
        .with_context(|| format!("failed to open archive {archive:?}"))?;
    let mut tarball = tar::Archive::new(GzDecoder::new(file));
    tarball
        .unpack(unpack_root)
        .with_context(|| format!("failed to extract {archive:?}"))?;

    ensure!(
        expected_dir.exists(),
        "archive {archive:?} did not contain {expected_dir:?}"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_tarball(dest: &Path, inner_dir: &str) -> Result<()> {
        let file = File::create(dest)?;
        let gz = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(gz);

        let mut header = tar::Header::new_gnu();
        header.set_size(5);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(
            &mut header,
            format!("{inner_dir}/model.onnx"),
            &b"bytes"[..],
        )?;
        builder.into_inner()?.finish()?.flush()?;
        Ok(())
    }

    #[test]
    fn extracts_and_then_skips() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let archive = dir.path().join("model.tar.gz");
        make_tarball(&archive, "squeezenet")?;

        let expected = dir.path().join("squeezenet");
        assert!(extract_archive(&archive, dir.path(), &expected)?);
        assert!(expected.join("model.onnx").exists());

        // Second run must be a no-op even if the archive disappears.
        std::fs::remove_file(&archive)?;
        assert!(!extract_archive(&archive, dir.path(), &expected)?);
        Ok(())
    }

    #[test]
    fn malformed_archive_is_fatal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let archive = dir.path().join("model.tar.gz");
        std::fs::write(&archive, b"definitely not a tarball")?;

        let expected = dir.path().join("squeezenet");
        assert!(extract_archive(&archive, dir.path(), &expected).is_err());
        Ok(())
    }
}
