//! Export command implementation

use std::path::PathBuf;
use std::process::ExitCode;

use super::{absolute, GlobalArgs, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::capture::FrameDirectoryRenderer;
use crate::config::{merge_cli_overrides, CliOverrides};
use crate::export::{export_batch, ExportJob, VariantSpec};

/// Flags of the export command.
pub struct ExportArgs {
    pub out: Option<PathBuf>,
    pub frames: Option<PathBuf>,
    pub pixel_size: Option<u32>,
    pub max_frames_width: Option<u32>,
    pub combine: bool,
    pub y_offset: Option<i32>,
    pub flatten: bool,
    pub no_limit_colors: bool,
    pub palette: Option<PathBuf>,
    pub only: Vec<String>,
}

/// Run the export command
pub fn run_export(global: &GlobalArgs, args: ExportArgs) -> ExitCode {
    let (mut config, root) = match global.load_project() {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let cwd = std::env::current_dir().unwrap_or_default();
    let overrides = CliOverrides {
        out: args.out.map(|p| absolute(&cwd, &p)),
        frames: args.frames.map(|p| absolute(&cwd, &p)),
        pixel_size: args.pixel_size,
        max_frames_width: args.max_frames_width,
        combine_animations: args.combine.then_some(true),
        y_offset: args.y_offset,
        flatten_folders: args.flatten.then_some(true),
        limit_colors: args.no_limit_colors.then_some(false),
        palette: args.palette.map(|p| absolute(&cwd, &p)),
        ..Default::default()
    };
    merge_cli_overrides(&mut config, &overrides);

    let errors = config.validate();
    if !errors.is_empty() {
        for error in errors {
            eprintln!("Error: {}", error);
        }
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let mut job = match ExportJob::from_config(&config, &root) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    if !args.only.is_empty() {
        job.variants.retain(|v| selected(v, &args.only));
    }
    if job.variants.is_empty() {
        eprintln!("Error: no variants to export");
        if args.only.is_empty() {
            eprintln!("Add [[groups]] with variants to skinsheet.toml");
        }
        return ExitCode::from(EXIT_INVALID_ARGS);
    }
    if job.animations.is_empty() {
        eprintln!("Error: no animations configured");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let reporter = global.reporter();
    let mut renderer = FrameDirectoryRenderer::new(&job.frames_dir);
    let summary = export_batch(
        &mut renderer,
        &job.variants,
        &job.animations,
        &job.settings,
        reporter.as_ref(),
    );

    if !global.json {
        println!("{}", summary.summary());
    }
    if summary.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

/// Match a variant against `Group` or `Group/Variant` filters.
fn selected(variant: &VariantSpec, filters: &[String]) -> bool {
    filters.iter().any(|filter| match filter.split_once('/') {
        Some((group, name)) => variant.group == group && variant.name == name,
        None => variant.group == *filter,
    })
}
