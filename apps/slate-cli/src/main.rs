use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec4;
use slate_assets::{
    AssetLibrary, Mesh, ModelDescriptor, demo_triangle, encode_fragmentlit_material,
    encode_model, encode_unlit_material,
};
use slate_common::{Rgba, Transform};
use slate_kernel::{CameraEntry, ObjectEntry, Scene, SceneManifest};
use slate_render::{CameraConfig, RecordingGpu};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slate-cli", about = "CLI tool for slate scenes and assets")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Write a demo triangle model, its material and a scene manifest
    Mkmodel {
        /// Output directory
        #[arg(short, long, default_value = "demo")]
        out: PathBuf,
        /// Use the textured, lit material instead of a flat color
        #[arg(long)]
        lit: bool,
        /// Flat color as 0xRRGGBBAA
        #[arg(long, default_value = "0xFF8000FF", value_parser = parse_rgba)]
        color: Rgba,
    },
    /// Load a scene manifest and render frames on the recording backend
    Render {
        /// Scene manifest (YAML)
        manifest: PathBuf,
        /// Number of frames to run
        #[arg(short, long, default_value = "1")]
        frames: u32,
        /// Depth slider position, 0.0..=1.0
        #[arg(short, long, default_value = "0.0")]
        slider: f32,
        /// Report wide-mode support from the platform
        #[arg(long)]
        wide: bool,
        /// Texture directory (defaults to the manifest's directory)
        #[arg(long)]
        textures: Option<PathBuf>,
    },
}

fn parse_rgba(s: &str) -> Result<Rgba, String> {
    let hex = s.trim_start_matches("0x").trim_start_matches('#');
    u32::from_str_radix(hex, 16)
        .map(Rgba)
        .map_err(|e| format!("invalid color '{s}': {e}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match cli.command {
        Commands::Info => {
            println!("slate-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", slate_render::crate_info());
            println!("assets: {}", slate_assets::crate_info());
            println!("ecs: {}", slate_ecs::crate_info());
            println!("kernel: {}", slate_kernel::crate_info());
        }
        Commands::Mkmodel { out, lit, color } => make_demo(&out, lit, color)?,
        Commands::Render {
            manifest,
            frames,
            slider,
            wide,
            textures,
        } => render(&manifest, frames, slider, wide, textures)?,
    }

    Ok(())
}

fn make_demo(out: &Path, lit: bool, color: Rgba) -> anyhow::Result<()> {
    std::fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;

    let material = if lit {
        encode_fragmentlit_material("kitten", Vec4::ONE, Vec4::splat(0.25))
    } else {
        encode_unlit_material(color)
    };
    write(&out.join("triangle.slmtl"), &material)?;

    let model = encode_model(&ModelDescriptor {
        material_ref: "triangle".into(),
        mesh: Mesh::from_vertices(0, &demo_triangle(), 0.75),
    })?;
    write(&out.join("triangle.slmdl"), &model)?;

    let manifest = SceneManifest {
        name: "demo".into(),
        camera: CameraEntry {
            name: "Main Camera".into(),
            transform: Transform::from_position(glam::Vec3::new(0.0, 0.0, -3.0)),
            config: CameraConfig::default(),
        },
        objects: vec![ObjectEntry {
            name: "triangle".into(),
            layer: slate_common::LAYER_DEFAULT,
            transform: Transform::default(),
            model: Some("triangle.slmdl".into()),
            spin: Some(1.0),
        }],
    };
    write(&out.join("scene.yaml"), manifest.to_yaml()?.as_bytes())?;

    println!(
        "Wrote demo scene to {} ({} model bytes, {} material)",
        out.display(),
        model.len(),
        if lit { "fragmentlit" } else { "unlit" }
    );
    Ok(())
}

fn write(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

fn render(
    manifest: &Path,
    frames: u32,
    slider: f32,
    wide: bool,
    textures: Option<PathBuf>,
) -> anyhow::Result<()> {
    let texture_root = textures.unwrap_or_else(|| {
        manifest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    });
    let assets = AssetLibrary::new(texture_root);
    let mut gpu = RecordingGpu::new()
        .with_wide_support(wide)
        .with_slider(slider.clamp(0.0, 1.0));

    let mut scene = Scene::from_manifest(manifest, &assets, &mut gpu)
        .with_context(|| format!("loading scene {}", manifest.display()))?;
    tracing::info!(
        scene = scene.name(),
        objects = scene.object_count(),
        slider,
        wide,
        "scene loaded"
    );
    scene.awake();

    for frame in 0..frames {
        scene.update(1.0 / 60.0);
        let top = scene.main_top().and_then(|_| scene.draw_top(&mut gpu));
        if let Some(report) = top {
            println!(
                "frame {frame}: top iod={:.3} wide={} passes={} draws={}",
                report.iod, report.use_wide, report.passes, report.draws
            );
        }
        let bottom = scene.main_bottom().and_then(|_| scene.draw_bottom(&mut gpu));
        if let Some(report) = bottom {
            println!(
                "frame {frame}: bottom passes={} draws={}",
                report.passes, report.draws
            );
        }
    }

    print!("{}", gpu.summary());
    let released = scene.shutdown(&assets, &mut gpu);
    println!(
        "Shutdown: targets={}, textures={} (released {released})",
        gpu.live_targets(),
        gpu.live_textures()
    );
    Ok(())
}
