use std::path::Path;

use anyhow::{ensure, Context, Result};
use tracing::{debug, info};

/// Download `url` to `dest` unless `dest` already exists. Returns whether
/// a download actually happened. No retries; a failed fetch is fatal.
pub async fn fetch_if_absent(client: &reqwest::Client, url: &str, dest: &Path) -> Result<bool> {
    if dest.exists() {
        debug!(path = %dest.display(), "asset already present, skipping fetch");
        return Ok(false);
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {parent:?}"))?;
    }

    info!(%url, path = %dest.display(), "fetching asset");
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;
    ensure!(
        resp.status().is_success(),
        "fetch of {url} failed with status {}",
        resp.status()
    );
    let body = resp
        .bytes()
        .await
        .with_context(|| format!("failed to read body of {url}"))?;

    // Write-then-rename so an aborted run never leaves a truncated asset
    // that a later run would treat as complete.
    let partial = dest.with_extension("part");
    std::fs::write(&partial, &body)
        .with_context(|| format!("failed to write {partial:?}"))?;
    std::fs::rename(&partial, dest)
        .with_context(|| format!("failed to move {partial:?} into place"))?;

    Ok(true)
}

/// Fetch every (url, path) pair in order, aborting on the first failure.
pub async fn fetch_all(
    client: &reqwest::Client,
    pairs: &[(String, std::path::PathBuf)],
) -> Result<()> {
    for (url, dest) in pairs {
        fetch_if_absent(client, url, dest).await?;
    }
    Ok(())
}
