//! Headless fly-through benchmark.
//!
//! Builds a grid of box-shaped instances, flies the camera along the
//! fly-through path and culls every frame with the selected strategy,
//! drawing through the software query service.
//!
//! Modes:
//! - 0: no culling
//! - 1: frustum culling
//! - 2: per-instance occlusion queries, one frame late
//! - 3: CHC++

mod framerate;
mod grid;

use anyhow::{ensure, Context, Result};
use chc_culling::chc::camera::CameraPath;
use chc_culling::chc::culling::{create_culler, CullingMode, FrameStats, SchedulerConfig};
use chc_culling::chc::hierarchy::HierarchyBuilder;
use chc_culling::chc::log::LogSeverity;
use chc_culling::chc::query::{QueryPool, SoftwareQueryService, SoftwareServiceConfig};
use chc_culling::chc::Engine;
use chc_culling::chc_info;
use clap::Parser;
use glam::Vec3;
use std::path::PathBuf;

use framerate::FramerateLog;

const SOURCE: &str = "chc_demo";

/// Occlusion culling fly-through over an instance grid.
#[derive(Parser, Debug)]
#[command(name = "chc_demo")]
#[command(about = "Flies a camera over a grid of instances and culls each frame")]
struct Args {
    /// Instances per grid side; the grid holds resolution² instances.
    resolution: u32,

    /// Number of frames along the path.
    #[arg(short, long, default_value_t = 600)]
    frames: usize,

    /// Culling mode: 0 none, 1 frustum, 2 occlusion, 3 CHC++.
    #[arg(short, long, default_value_t = 0)]
    mode: u32,

    /// Output file for frame times (optional).
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Instance extent along X, Y and Z.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [0.8, 1.0, 0.8])]
    mesh_size: Vec<f32>,

    /// Not-visible nodes batched per query flush (CHC++ only).
    #[arg(long, default_value_t = 4)]
    batch_size: usize,

    /// Software depth buffer width.
    #[arg(long, default_value_t = 160)]
    width: u32,

    /// Software depth buffer height.
    #[arg(long, default_value_t = 120)]
    height: u32,

    /// Polls before a query result becomes available.
    #[arg(long, default_value_t = 1)]
    latency: u32,

    /// Log every frame's statistics.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.verbose {
        Engine::set_min_severity(LogSeverity::Trace);
    }

    let mode = CullingMode::try_from(args.mode).context("Invalid --mode")?;
    ensure!(args.frames > 0, "--frames must be at least 1");
    ensure!(
        args.mesh_size.iter().all(|v| v.is_finite() && *v > 0.0),
        "--mesh-size must be three positive numbers"
    );
    let mesh_size = Vec3::from_slice(&args.mesh_size);

    let positions = grid::grid_positions(args.resolution)?;
    let mut pool = QueryPool::new();
    let mut hierarchy = HierarchyBuilder::new()
        .footprint(mesh_size)
        .positions(&positions)
        .build_with_pool(&mut pool)
        .context("Building the instance hierarchy")?;

    let service_config = SoftwareServiceConfig {
        width: args.width,
        height: args.height,
        poll_latency: args.latency,
    };
    let mut service = SoftwareQueryService::from_hierarchy(service_config, &hierarchy)
        .context("Creating the software query service")?;

    let scheduler_config = SchedulerConfig { batch_size: args.batch_size };
    let mut culler = create_culler(mode, &hierarchy, &mut pool, &scheduler_config)
        .context("Creating the culler")?;

    chc_info!(SOURCE, "Flying {} frames over {} instances ({}x{} depth buffer)",
        args.frames, positions.len(), args.width, args.height);

    let path = CameraPath::flythrough();
    let aspect = args.width as f32 / args.height as f32;
    let mut totals = FrameStats::default();
    let mut log = FramerateLog::start(args.frames);

    for frame in 0..args.frames {
        let u = frame as f32 / args.frames as f32;
        let camera = path.camera_at(u, args.resolution, mesh_size, aspect);

        service.set_view_projection(camera.view_projection_matrix());
        let stats = culler.render_frame(&mut hierarchy, &camera, &mut service);
        log.frame_done();

        chc_culling::chc_trace!(SOURCE, "Frame {}: {}", frame, stats);
        totals += stats;
    }

    let frames = log.len() as f64;
    chc_info!(SOURCE, "Mode {}: {} frames in {:.3}s ({:.1} fps)",
        mode, log.len(), log.total_seconds(), log.average_fps());
    chc_info!(SOURCE, "Average instances drawn per frame: {:.1}",
        totals.instances_drawn as f64 / frames);
    chc_info!(SOURCE, "Totals: {}", totals);

    if let Some(out) = &args.out {
        log.write(out)?;
        chc_info!(SOURCE, "Frame times written to {}", out.display());
    }

    Ok(())
}
