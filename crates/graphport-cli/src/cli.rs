use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_ARCHIVE_URL: &str =
    "https://s3.amazonaws.com/download.onnx/models/opset_9/squeezenet.tar.gz";
pub const DEFAULT_LABELS_URL: &str =
    "https://s3.amazonaws.com/deep-learning-models/image-models/imagenet_class_index.json";

#[derive(Parser, Debug)]
#[command(name = "graphport", version, about = "ONNX image-classification demo pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the model's prediction against its bundled reference tensors
    Validate {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Classify images and print the top-K predictions for each
    Classify {
        #[command(flatten)]
        common: CommonArgs,

        /// How many predictions to show per image
        #[arg(long, default_value_t = 5)]
        top_k: usize,

        /// Image files; the tutorial's sample images are fetched when empty
        images: Vec<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Directory downloaded assets land in
    #[arg(long, default_value = "assets")]
    pub workdir: PathBuf,

    /// URL of the packaged model archive
    #[arg(long, default_value = DEFAULT_ARCHIVE_URL)]
    pub archive_url: String,

    /// Directory the archive extracts to, relative to the workdir
    #[arg(long, default_value = "squeezenet")]
    pub model_dir: String,

    /// URL of the class-index JSON
    #[arg(long, default_value = DEFAULT_LABELS_URL)]
    pub labels_url: String,

    /// Device for inference (cpu or cuda:N)
    #[arg(long, default_value = "cpu")]
    pub device: String,

    /// Log level (RUST_LOG syntax)
    #[arg(long, default_value = "info")]
    pub log: String,
}
