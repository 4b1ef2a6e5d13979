use anyhow::{bail, Context, Result};
use clap::Parser;
use frame_restore::api::video::VideoRestorer;
use frame_restore::core::video::{RestorationConfig, ThresholdPolicy};
use log::info;
use std::path::PathBuf;
use std::time::Instant;

/// Restore a scrambled, partially corrupted frame sequence.
#[derive(Debug, Parser)]
#[command(name = "frame-restore", version, about)]
struct Args {
    /// Directory of input frames (png/jpg/bmp), read in file-name order
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory; receives corrupted_frames/ and reconstructed/
    #[arg(short, long)]
    output: PathBuf,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Threshold = mean - k * stddev
    #[arg(short, long)]
    k: Option<f64>,

    /// Worker threads for the distance matrix
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Downscale frames to WxH before comparing, e.g. 160x90
    #[arg(long, value_parser = parse_size)]
    sample: Option<(u32, u32)>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn parse_size(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{}'", s))?;
    let w = w.trim().parse().map_err(|e| format!("bad width: {}", e))?;
    let h = h.trim().parse().map_err(|e| format!("bad height: {}", e))?;
    Ok((w, h))
}

fn build_config(args: &Args) -> Result<RestorationConfig> {
    let mut config = match &args.config {
        Some(path) => RestorationConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RestorationConfig::default(),
    };
    if let Some(k) = args.k {
        config.threshold = ThresholdPolicy::MeanMinusStdDev { k };
    }
    if args.threads.is_some() {
        config.num_threads = args.threads;
    }
    if args.sample.is_some() {
        config.sample_size = args.sample;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    frame_restore::init_logging();
    let args = Args::parse();

    if !args.input.is_dir() {
        bail!("input directory {} does not exist", args.input.display());
    }

    let config = build_config(&args)?;
    let restorer = VideoRestorer::create(config)?;

    let start = Instant::now();
    let result = restorer
        .restore_directory(&args.input, &args.output)
        .context("restoration failed")?;
    let report = &result.report;

    if args.json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!(
            "Similarity mean {:.4}, stddev {:.4}, threshold {:.4}",
            report.profile.mean, report.profile.stddev, report.threshold
        );
        println!(
            "Corrupted frames: {} -> {}",
            report.corrupted.len(),
            result.corrupted_dir.display()
        );
        println!(
            "Reconstructed {} frames (path cost {:.4}) -> {}",
            report.ordering.len(),
            report.path_cost,
            result.reconstructed_dir.display()
        );
    }

    info!(
        "Total processing time: {:.2}s",
        start.elapsed().as_secs_f32()
    );
    Ok(())
}
