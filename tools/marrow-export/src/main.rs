//! marrow-export - skeletal rig export tool
//!
//! Converts skinned glTF/GLB characters to the Marrow viewer's plain-text
//! rig streams (rest.obj, rest.skel, handles.dmat, pose.dmat, rootpos.dmat,
//! texture.jpg)

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

// Use modules from library
use marrow_export::{export, manifest, source};
use marrow_export::{DEFAULT_FRAME_RATE, DEFAULT_WEIGHT_THRESHOLD};

#[derive(Parser)]
#[command(name = "marrow-export")]
#[command(about = "Marrow skeletal rig export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export rigs from a manifest file
    Build {
        /// Path to rigs.toml manifest
        #[arg(default_value = "rigs.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without exporting
    Check {
        /// Path to rigs.toml manifest
        #[arg(default_value = "rigs.toml")]
        manifest: PathBuf,
    },

    /// Export a single rig
    Export {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Output directory (default: the input's file stem)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skin name (default: first skin)
        #[arg(short, long)]
        skin: Option<String>,

        /// Animation name (default: first animation)
        #[arg(short, long)]
        animation: Option<String>,

        /// Frame rate for sampling
        #[arg(short, long, default_value_t = DEFAULT_FRAME_RATE)]
        frame_rate: f32,

        /// Minimum dominant weight for a vertex to bind to a bone
        #[arg(short = 't', long, default_value_t = DEFAULT_WEIGHT_THRESHOLD)]
        weight_threshold: f32,
    },

    /// List skins and animations in a glTF file
    Inspect {
        /// Input glTF/GLB file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { manifest, output } => {
            tracing::info!("Exporting rigs from {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete!");
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Export {
            input,
            output,
            skin,
            animation,
            frame_rate,
            weight_threshold,
        } => {
            let output = output.unwrap_or_else(|| {
                input
                    .file_stem()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("rig"))
            });
            tracing::info!("Exporting {:?} -> {:?}", input, output);

            let (rig, mut pose_source) =
                source::gltf::load_rig(&input, skin.as_deref(), animation.as_deref(), frame_rate)?;
            let options = export::ExportOptions { weight_threshold };
            export::export_rig(&rig, &mut pose_source, &output, &options)?;
            tracing::info!("Done!");
        }

        Commands::Inspect { input } => {
            source::gltf::inspect(&input)?;
        }
    }

    Ok(())
}
