use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use braid_core::{
    AppConfig, AssetStore, HeadlessBackend, ObjWriter, ParameterUpdate, PlaybackClock, Scene,
    View,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> braid_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            source,
            frames,
            set,
            texture,
            realtime,
        } => run_frames(&source, frames, &set, texture, realtime),
        Commands::Export { source, output } => export_obj(&source, &output),
        Commands::DumpConfig { source, output } => dump_config(&source, output.as_deref()),
    }
}

fn run_frames(
    source: &ConfigSource,
    frames: usize,
    updates: &[ParameterUpdate],
    texture: Option<String>,
    realtime: bool,
) -> braid_core::Result<()> {
    let mut config = source.load()?;
    if texture.is_some() {
        config.shading.texture = texture;
    }
    tracing::info!(frames, realtime, "starting braid animation");

    let clock = if realtime {
        PlaybackClock::start()
    } else {
        PlaybackClock::manual()
    };
    let mut view = View::new(&config, clock, HeadlessBackend::new())?;

    let handle = view.handle();
    for update in updates {
        handle.set_parameter(*update);
    }

    let summary = view.run_frames(frames);

    if let Some(frame) = view.backend().last_frame() {
        for (strand, probe) in frame.probes.iter().enumerate() {
            tracing::info!(strand, time = frame.times[strand], colour = ?probe.to_array(), "probe");
        }
    }
    tracing::info!(
        frames = summary.frames,
        failures = summary.failures,
        elapsed = summary.elapsed(),
        "animation finished"
    );

    view.dispose();
    Ok(())
}

fn export_obj(source: &ConfigSource, output: &Path) -> braid_core::Result<()> {
    let config = source.load()?;
    let scene = Scene::build(&config, &mut AssetStore::new())?;

    let mut writer = ObjWriter::new(BufWriter::new(File::create(output)?));
    for strand in scene.strands() {
        writer.write_mesh(&format!("strand_{}", strand.id.0), &strand.mesh)?;
    }
    writer.finish()?;

    tracing::info!(?output, strands = scene.strands().len(), "exported braid mesh");
    Ok(())
}

fn dump_config(source: &ConfigSource, output: Option<&Path>) -> braid_core::Result<()> {
    let config = source.load()?;
    match output {
        Some(path) => {
            config.save(path)?;
            tracing::info!(?path, "wrote configuration");
        }
        None => println!("{}", config.to_json()?),
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Animated braided ribbon renderer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the configuration comes from.
#[derive(Args, Debug)]
struct ConfigSource {
    /// JSON configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Start from the jittered brush-stroke preset instead of the defaults.
    #[arg(long, conflicts_with = "config")]
    brush_stroke: bool,
}

impl ConfigSource {
    fn load(&self) -> braid_core::Result<AppConfig> {
        match &self.config {
            Some(path) => AppConfig::load(path),
            None if self.brush_stroke => Ok(AppConfig::brush_stroke()),
            None => Ok(AppConfig::default()),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the braid and drive the frame loop against the headless backend.
    Run {
        #[command(flatten)]
        source: ConfigSource,
        /// Number of frames to render.
        #[arg(short, long, default_value_t = 120)]
        frames: usize,
        /// Parameter writes applied before the first frame, e.g. `camera.z=6`.
        #[arg(short, long = "set", value_name = "NAME=VALUE")]
        set: Vec<ParameterUpdate>,
        /// Texture image to map onto the ribbons.
        #[arg(short, long)]
        texture: Option<String>,
        /// Pace frames against the wall clock instead of a simulated one.
        #[arg(long)]
        realtime: bool,
    },
    /// Write every strand tube to a Wavefront OBJ file.
    Export {
        #[command(flatten)]
        source: ConfigSource,
        /// Output path for the OBJ document.
        output: PathBuf,
    },
    /// Print the effective configuration as JSON, or write it to a file.
    DumpConfig {
        #[command(flatten)]
        source: ConfigSource,
        /// File to write instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
