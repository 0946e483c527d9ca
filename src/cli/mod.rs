//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod export;
mod import;
mod inspect;

use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{default_config, find_config, load_config, SkinConfig};
use crate::progress::{ConsoleProgress, JsonProgress, ProgressReporter};

/// Process exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// skinsheet - Export character parts to spritesheets and import them back
#[derive(Parser)]
#[command(name = "skinsheet")]
#[command(about = "Export layered character parts to spritesheets and rebuild them from manifests")]
#[command(version)]
pub struct Cli {
    /// Project config file (default: nearest skinsheet.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit progress as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Show per-sheet detail
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable ANSI colours
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assemble pre-rendered frames into spritesheets and manifests
    Export {
        /// Export root (overrides project.out)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Pre-rendered frame root (overrides project.frames)
        #[arg(long)]
        frames: Option<PathBuf>,

        /// Cell size in pixels
        #[arg(long)]
        pixel_size: Option<u32>,

        /// Wrap directions after this many frames (0 = never)
        #[arg(long)]
        max_frames_width: Option<u32>,

        /// Put every animation of a variant into one sheet
        #[arg(long)]
        combine: bool,

        /// Row shift applied to each frame, positive moves content up
        #[arg(long, allow_hyphen_values = true)]
        y_offset: Option<i32>,

        /// Write every file into the export root with prefixed names
        #[arg(long)]
        flatten: bool,

        /// Keep captured colours as they are
        #[arg(long)]
        no_limit_colors: bool,

        /// Palette reference image
        #[arg(long)]
        palette: Option<PathBuf>,

        /// Only export these groups or group/variant pairs
        #[arg(long = "only", value_name = "GROUP[/VARIANT]")]
        only: Vec<String>,
    },

    /// Slice exported sheets back into per-part frames
    Import {
        /// Folder searched recursively for manifests
        folder: PathBuf,

        /// Import destination (overrides import.out)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Skip writing individual frame images
        #[arg(long)]
        no_frames: bool,

        /// Skip writing character.json
        #[arg(long)]
        no_compose: bool,
    },

    /// Validate a manifest and list the cells of each sheet
    Inspect {
        /// Manifest file
        manifest: PathBuf,
    },
}

/// Flags shared by every command.
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub json: bool,
    pub verbose: bool,
    pub no_color: bool,
}

impl GlobalArgs {
    /// Reporter matching the output flags.
    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        if self.json {
            Box::new(JsonProgress::new().with_verbose(self.verbose))
        } else {
            let colors = !self.no_color && std::io::stderr().is_terminal();
            Box::new(ConsoleProgress::new().with_colors(colors).with_verbose(self.verbose))
        }
    }

    /// Load the project config and its root directory.
    ///
    /// Without `--config` the nearest `skinsheet.toml` is used; if there is
    /// none, defaults apply and the working directory is the root.
    pub fn load_project(&self) -> Result<(SkinConfig, PathBuf), ExitCode> {
        let cwd = std::env::current_dir().unwrap_or_default();
        let config_path = self.config.clone().or_else(find_config);

        match config_path {
            Some(path) => {
                if self.verbose && !self.json {
                    eprintln!("Using config: {}", path.display());
                }
                let config = load_config(Some(&path)).map_err(|e| {
                    eprintln!("Error loading config: {}", e);
                    ExitCode::from(EXIT_ERROR)
                })?;
                let root = match path.parent() {
                    Some(p) if !p.as_os_str().is_empty() => absolute(&cwd, p),
                    _ => cwd,
                };
                Ok((config, root))
            }
            None => Ok((default_config(), cwd)),
        }
    }
}

/// Make a command-line path absolute against the working directory.
pub(crate) fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {
        config: cli.config,
        json: cli.json,
        verbose: cli.verbose,
        no_color: cli.no_color,
    };

    match cli.command {
        Commands::Export {
            out,
            frames,
            pixel_size,
            max_frames_width,
            combine,
            y_offset,
            flatten,
            no_limit_colors,
            palette,
            only,
        } => export::run_export(
            &global,
            export::ExportArgs {
                out,
                frames,
                pixel_size,
                max_frames_width,
                combine,
                y_offset,
                flatten,
                no_limit_colors,
                palette,
                only,
            },
        ),
        Commands::Import { folder, out, no_frames, no_compose } => {
            import::run_import(&global, &folder, out.as_deref(), no_frames, no_compose)
        }
        Commands::Inspect { manifest } => inspect::run_inspect(&manifest, global.json),
    }
}
