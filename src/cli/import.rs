//! Import command implementation

use std::path::Path;
use std::process::ExitCode;

use super::{absolute, GlobalArgs, EXIT_ERROR, EXIT_SUCCESS};
use crate::config::{merge_cli_overrides, resolve_path, CliOverrides};
use crate::import::{import_folder, write_character, write_part, DirectoryStore, LayeredCharacter};
use crate::progress::ProgressEvent;

/// Run the import command
pub fn run_import(
    global: &GlobalArgs,
    folder: &Path,
    out: Option<&Path>,
    no_frames: bool,
    no_compose: bool,
) -> ExitCode {
    let (mut config, root) = match global.load_project() {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let cwd = std::env::current_dir().unwrap_or_default();
    let overrides = CliOverrides {
        import_out: out.map(|p| absolute(&cwd, p)),
        write_frames: no_frames.then_some(false),
        compose_character: no_compose.then_some(false),
        ..Default::default()
    };
    merge_cli_overrides(&mut config, &overrides);

    let out_dir = resolve_path(&root, &config.import.out);
    let folder = absolute(&cwd, folder);
    let reporter = global.reporter();

    let mut store = DirectoryStore::new(&out_dir);
    let run = match import_folder(&folder, &mut store, reporter.as_ref()) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut write_failed = false;
    for part in &run.parts {
        if let Err(e) = write_part(&out_dir, part, config.import.write_frames) {
            reporter.report(ProgressEvent::Error {
                unit: Some(part.part_name.clone()),
                message: format!("cannot write part: {}", e),
            });
            write_failed = true;
        }
    }

    if config.import.compose_character && !run.parts.is_empty() {
        let character = LayeredCharacter::new(run.parts);
        match write_character(&out_dir, &character) {
            Ok(path) => reporter.info("character", format!("wrote {}", path.display())),
            Err(e) => {
                reporter.report(ProgressEvent::Error {
                    unit: None,
                    message: format!("cannot write character: {}", e),
                });
                write_failed = true;
            }
        }
    }

    if !global.json {
        println!("{}", run.summary.summary());
    }
    if run.summary.is_success() && !write_failed {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}
