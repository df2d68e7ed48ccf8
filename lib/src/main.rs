//! Kasynel CLI - command-line front end for the slicing core.
//!
//! Usage:
//!   kasynel-cli slice <input.stl> -o <output.gcode> [options]
//!   kasynel-cli slice <input.stl> --preset draft.json
//!   kasynel-cli info <input.stl>

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use kasynel_slicer::config::{
    load_material_profiles, load_preset, load_printer_profiles, InfillPattern, SupportPattern,
};
use kasynel_slicer::mesh::load_stl;
use kasynel_slicer::{CancelToken, PipelineStage, SliceSettings, Slicer};
use log::{info, warn, LevelFilter};
use std::path::PathBuf;

/// FDM slicer: triangle mesh in, G-code out
#[derive(Parser, Debug)]
#[command(name = "kasynel-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Slice an STL file and generate G-code
    Slice {
        /// Input STL file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output G-code file (defaults to the input name with .gcode)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Settings preset file (JSON), applied before the flags below
        #[arg(short, long, value_name = "PRESET")]
        preset: Option<PathBuf>,

        /// Printer profile file (printers.json)
        #[arg(long, value_name = "FILE")]
        printers: Option<PathBuf>,

        /// Printer name within --printers (defaults to the first entry)
        #[arg(long, value_name = "NAME")]
        printer: Option<String>,

        /// Material profile file (materials.json)
        #[arg(long, value_name = "FILE")]
        materials: Option<PathBuf>,

        /// Material name within --materials (defaults to the first entry)
        #[arg(long, value_name = "NAME")]
        material: Option<String>,

        /// Layer height in mm
        #[arg(long)]
        layer_height: Option<f64>,

        /// First layer height in mm
        #[arg(long)]
        first_layer_height: Option<f64>,

        /// Number of walls
        #[arg(long)]
        walls: Option<u32>,

        /// Infill density (0-100)
        #[arg(long)]
        infill_density: Option<f64>,

        /// Infill pattern (grid, lines, honeycomb)
        #[arg(long)]
        infill_pattern: Option<InfillPattern>,

        /// Brim width in mm (0 disables the brim)
        #[arg(long)]
        brim_width: Option<f64>,

        /// Generate supports
        #[arg(long)]
        support: bool,

        /// Support overhang threshold angle (degrees)
        #[arg(long)]
        support_angle: Option<f64>,

        /// Support pattern (lines, grid, zigzag)
        #[arg(long)]
        support_pattern: Option<SupportPattern>,

        /// Spiral (vase) mode
        #[arg(long)]
        spiralize: bool,
    },

    /// Show mesh information without slicing
    Info {
        /// Input STL file
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    match cli.command {
        Commands::Slice {
            input,
            output,
            preset,
            printers,
            printer,
            materials,
            material,
            layer_height,
            first_layer_height,
            walls,
            infill_density,
            infill_pattern,
            brim_width,
            support,
            support_angle,
            support_pattern,
            spiralize,
        } => {
            let mut settings = match preset {
                Some(path) => load_preset(&path)
                    .with_context(|| format!("failed to load preset {}", path.display()))?,
                None => SliceSettings::default(),
            };

            if let Some(path) = printers {
                let profiles = load_printer_profiles(&path)
                    .with_context(|| format!("failed to load {}", path.display()))?;
                let profile = match &printer {
                    Some(name) => profiles
                        .iter()
                        .find(|p| p.name == *name)
                        .with_context(|| format!("no printer named `{}`", name))?,
                    None => profiles.first().context("printers file is empty")?,
                };
                settings.apply_printer(profile);
            }
            if let Some(path) = materials {
                let profiles = load_material_profiles(&path)
                    .with_context(|| format!("failed to load {}", path.display()))?;
                let profile = match &material {
                    Some(name) => profiles
                        .iter()
                        .find(|m| m.name == *name)
                        .with_context(|| format!("no material named `{}`", name))?,
                    None => profiles.first().context("materials file is empty")?,
                };
                settings.apply_material(profile);
            }

            if let Some(v) = layer_height {
                settings.layer_height = v;
            }
            if let Some(v) = first_layer_height {
                settings.first_layer_height = v;
            }
            if let Some(v) = walls {
                settings.wall_count = v;
            }
            if let Some(v) = infill_density {
                settings.infill_density = v;
            }
            if let Some(v) = infill_pattern {
                settings.infill_pattern = v;
            }
            if let Some(v) = brim_width {
                settings.brim_enabled = v > 0.0;
                settings.brim_width = v;
            }
            if support {
                settings.support_enabled = true;
            }
            if let Some(v) = support_angle {
                settings.support_threshold = v;
            }
            if let Some(v) = support_pattern {
                settings.support_pattern = v;
            }
            if spiralize {
                settings.spiralize = true;
            }

            let output = output.unwrap_or_else(|| input.with_extension("gcode"));
            run_slice(&input, &output, settings)
        }
        Commands::Info { input } => run_info(&input),
    }
}

fn run_slice(input: &PathBuf, output: &PathBuf, settings: SliceSettings) -> Result<()> {
    let mesh = load_stl(input)
        .with_context(|| format!("failed to load mesh {}", input.display()))?;
    info!(
        "loaded {} ({} triangles)",
        input.display(),
        mesh.triangle_count()
    );
    info!("{}", settings);

    let progress = ProgressBar::new(100);
    progress.set_style(
        ProgressStyle::with_template("{msg:>11} [{bar:40}] {percent}%")
            .expect("static template")
            .progress_chars("=> "),
    );

    let slicer = Slicer::new(settings);
    let cancel = CancelToken::new();
    let (result, warnings) = slicer.slice(
        &mesh,
        |stage, fraction| {
            progress.set_message(stage.to_string());
            // Map the heavy middle stages onto the bar
            let base = match stage {
                PipelineStage::Preparing => 0.0,
                PipelineStage::Sectioning => 5.0,
                PipelineStage::Regions => 40.0,
                PipelineStage::Paths => 40.0,
                PipelineStage::Emitting => 90.0,
            };
            let span = match stage {
                PipelineStage::Preparing => 5.0,
                PipelineStage::Sectioning => 35.0,
                PipelineStage::Regions | PipelineStage::Paths => 50.0,
                PipelineStage::Emitting => 10.0,
            };
            progress.set_position((base + span * fraction) as u64);
        },
        &cancel,
    );
    progress.finish_and_clear();

    for warning in &warnings {
        warn!("{}", warning);
    }

    let job = result.context("slicing failed")?;
    job.gcode
        .write_to_file(output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    let estimates = job.gcode.estimates();
    let minutes = (estimates.print_time_s / 60.0).round() as u64;
    info!(
        "wrote {} ({} layers, ~{}m, {:.1}g filament)",
        output.display(),
        job.layer_count(),
        minutes,
        estimates.filament_g
    );
    Ok(())
}

fn run_info(input: &PathBuf) -> Result<()> {
    let mesh = load_stl(input)
        .with_context(|| format!("failed to load mesh {}", input.display()))?;
    let bounds = mesh
        .bounds()
        .context("mesh has no vertices")?;

    println!("file:      {}", input.display());
    println!("triangles: {}", mesh.triangle_count());
    println!("vertices:  {}", mesh.vertices().len());
    println!("size:      {}", bounds);
    println!(
        "bounds:    x {:.2}..{:.2}  y {:.2}..{:.2}  z {:.2}..{:.2}",
        bounds.min.x, bounds.max.x, bounds.min.y, bounds.max.y, bounds.min.z, bounds.max.z
    );
    Ok(())
}
