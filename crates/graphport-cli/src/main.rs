mod cli;
mod pipeline;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, CommonArgs};
use graphport_core::Device;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Validate { common } => {
            let (client, device) = setup(&common)?;
            let assets = pipeline::prepare(&client, &common).await?;
            pipeline::validate(&assets, device)
        }
        Command::Classify {
            common,
            top_k,
            images,
        } => {
            let (client, device) = setup(&common)?;
            let assets = pipeline::prepare(&client, &common).await?;
            pipeline::classify(&client, &assets, device, top_k, images).await
        }
    }
}

fn setup(common: &CommonArgs) -> Result<(reqwest::Client, Device)> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&common.log))
        .init();

    let device = parse_device(&common.device)?;
    Ok((reqwest::Client::new(), device))
}

fn parse_device(raw: &str) -> Result<Device> {
    if raw.eq_ignore_ascii_case("cpu") {
        return Ok(Device::Cpu);
    }

    if let Some(rest) = raw.strip_prefix("cuda:") {
        let device_id: u32 = rest.parse().context("invalid cuda device id")?;
        return Ok(Device::Cuda { device_id });
    }

    anyhow::bail!("unsupported device: {raw} (expected cpu or cuda:N)");
}
