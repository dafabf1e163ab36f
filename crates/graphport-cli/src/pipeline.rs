use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use graphport_assets::{extract_archive, fetch_if_absent, load_labels, load_reference_pair};
use graphport_backend_ort::{OrtEngine, OrtExecutable};
use graphport_core::Device;
use graphport_onnx::import_model;
use graphport_runtime::{
    images_to_batch, matches_reference, render_top_k, run_batches, GraphWrapper,
    preprocess::INPUT_SIDE,
};
use tracing::info;

use crate::cli::CommonArgs;

/// The tutorial's sample photographs, fetched when the user names none.
const SAMPLE_IMAGES: &[(&str, &str)] = &[
    (
        "kitten.jpg",
        "https://s3.amazonaws.com/model-server/inputs/kitten.jpg",
    ),
    (
        "dog.jpg",
        "https://raw.githubusercontent.com/pytorch/hub/master/images/dog.jpg",
    ),
];

pub struct PreparedAssets {
    pub model_path: PathBuf,
    pub sample_dir: PathBuf,
    pub labels: Vec<String>,
    pub workdir: PathBuf,
}

/// Fetch and unpack everything the pipeline needs. Every step skips work
/// already on disk, so re-runs are cheap and offline-safe.
pub async fn prepare(client: &reqwest::Client, args: &CommonArgs) -> Result<PreparedAssets> {
    let workdir = args.workdir.clone();

    let archive_path = workdir.join(format!("{}.tar.gz", args.model_dir));
    fetch_if_absent(client, &args.archive_url, &archive_path).await?;

    let model_root = workdir.join(&args.model_dir);
    extract_archive(&archive_path, &workdir, &model_root)?;

    let labels_path = workdir.join("labels.json");
    fetch_if_absent(client, &args.labels_url, &labels_path).await?;
    let labels = load_labels(&labels_path)?;

    let model_path = model_root.join("model.onnx");
    ensure!(
        model_path.exists(),
        "archive did not provide {model_path:?}"
    );

    Ok(PreparedAssets {
        model_path,
        sample_dir: model_root.join("test_data_set_0"),
        labels,
        workdir,
    })
}

fn build_wrapper(assets: &PreparedAssets, device: Device) -> Result<GraphWrapper<OrtExecutable>> {
    let imported = import_model(&assets.model_path)?;
    info!(
        graph = %imported.graph.name,
        args = imported.params.args.len(),
        auxs = imported.params.auxs.len(),
        "model imported"
    );

    let wrapper = GraphWrapper::build(&imported, &OrtEngine::new(), device)?;
    let free: Vec<String> = wrapper
        .free_input_names()
        .into_iter()
        .map(|n| n.0)
        .collect();
    info!(free_inputs = ?free, "wrapper constructed");
    Ok(wrapper)
}

/// The notebook's validation step: run the bundled reference input and
/// compare argmax indices against the bundled reference output.
pub fn validate(assets: &PreparedAssets, device: Device) -> Result<()> {
    let mut wrapper = build_wrapper(assets, device)?;

    let (input, reference) = load_reference_pair(&assets.sample_dir)?;
    println!("input shape: {}", input.shape);

    let rows = run_batches(&mut wrapper, vec![input])?;
    let row = rows.first().context("model produced no output rows")?;
    println!("output shape: (1, {})", row.len());

    ensure!(
        row.len() == assets.labels.len(),
        "output vector has {} entries but the label map has {} categories",
        row.len(),
        assets.labels.len()
    );

    let reference_row = reference.to_f32s()?;
    println!("argmax match: {}", matches_reference(row, &reference_row));
    Ok(())
}

/// Classify images, printing a top-K panel per image.
pub async fn classify(
    client: &reqwest::Client,
    assets: &PreparedAssets,
    device: Device,
    top_k: usize,
    images: Vec<PathBuf>,
) -> Result<()> {
    let images = if images.is_empty() {
        fetch_sample_images(client, assets).await?
    } else {
        images
    };

    let mut wrapper = build_wrapper(assets, device)?;
    let batch = images_to_batch(&images, INPUT_SIDE)?;
    let rows = run_batches(&mut wrapper, vec![batch])?;
    ensure!(
        rows.len() == images.len(),
        "got {} result rows for {} images",
        rows.len(),
        images.len()
    );

    for (path, row) in images.iter().zip(&rows) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        print!("{}", render_top_k(&name, row, &assets.labels, top_k));
    }
    Ok(())
}

async fn fetch_sample_images(
    client: &reqwest::Client,
    assets: &PreparedAssets,
) -> Result<Vec<PathBuf>> {
    let image_dir = assets.workdir.join("images");
    let mut paths = Vec::with_capacity(SAMPLE_IMAGES.len());
    for (name, url) in SAMPLE_IMAGES {
        let dest = image_dir.join(name);
        fetch_if_absent(client, url, &dest).await?;
        paths.push(dest);
    }
    Ok(paths)
}
