use clap::Parser;
use colmap_frame_prep::batch::{Batch, BatchSummary, FrameRange};
use colmap_frame_prep::io::{PrepConfig, PrepReport, object_from_json, timestamp_now, write_report};
use colmap_frame_prep::pipeline::ColmapCli;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, author)]
struct CfpCli {
    /// output root, frame projects go to <datapath>/frames/<offset:04>
    #[arg(long, default_value = "")]
    datapath: PathBuf,

    /// folder holding the solved rig in sparse/0
    #[arg(long, default_value = "")]
    cameraspath: PathBuf,

    #[arg(long, default_value = "0")]
    startframe: u32,

    /// exclusive
    #[arg(long, default_value = "250")]
    endframe: u32,

    /// accepted for compatibility, not applied
    #[arg(long, default_value = "1")]
    downscale: u32,

    /// colmap executable, overrides the config file
    #[arg(long)]
    colmap: Option<PathBuf>,

    /// JSON config, see `PrepConfig`
    #[arg(long)]
    config: Option<PathBuf>,

    /// stop after writing the frame projects
    #[arg(long)]
    prepare_only: bool,
}

fn run(cli: &CfpCli) -> colmap_frame_prep::Result<BatchSummary> {
    let mut config: PrepConfig = match &cli.config {
        Some(p) => object_from_json(p)?,
        None => PrepConfig::default(),
    };
    if let Some(colmap) = &cli.colmap {
        config.colmap = colmap.clone();
    }
    let range = FrameRange::new(cli.startframe, cli.endframe)?;
    let batch = Batch::new(&cli.datapath, &cli.cameraspath, range, config.clone());

    let summary = if cli.prepare_only {
        BatchSummary {
            frames_prepared: batch.prepare_all()?,
            frames_reconstructed: 0,
        }
    } else {
        let mut tool = ColmapCli::new(&config.colmap, config.ba_global_function_tolerance);
        batch.run(&mut tool)?
    };

    let report = PrepReport {
        timestamp: timestamp_now(),
        start_frame: range.start,
        end_frame: range.end,
        camera_model: config.camera_model,
        frames_prepared: summary.frames_prepared,
        frames_reconstructed: summary.frames_reconstructed,
    };
    write_report(cli.datapath.join("prep_report.json"), &report)?;
    Ok(summary)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = CfpCli::parse();
    log::info!(
        "params: startframe={} - endframe={} - downscale={} - datapath={}",
        cli.startframe,
        cli.endframe,
        cli.downscale,
        cli.datapath.display()
    );

    match run(&cli) {
        Ok(summary) => log::info!(
            "prepared {} frames, reconstructed {}",
            summary.frames_prepared,
            summary.frames_reconstructed
        ),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}
