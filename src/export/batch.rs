//! Batch export driver.

use std::time::Instant;

use super::{export_variant, AnimationSpec, ExportSettings, VariantSpec};
use crate::capture::{CaptureSession, FrameRenderer};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::report::{RunSummary, UnitResult};

/// Export every variant in order, isolating failures per variant.
///
/// The renderer is claimed for the whole run through one [`CaptureSession`];
/// variants are exported strictly one after another.
pub fn export_batch(
    renderer: &mut dyn FrameRenderer,
    variants: &[VariantSpec],
    animations: &[AnimationSpec],
    settings: &ExportSettings,
    reporter: &dyn ProgressReporter,
) -> RunSummary {
    let start = Instant::now();
    reporter.report(ProgressEvent::RunStarted {
        operation: "export".to_string(),
        total_units: variants.len(),
    });

    let mut session = CaptureSession::open(renderer, settings.pixel_size);
    let mut summary = RunSummary::new();

    for variant in variants {
        let unit = variant.unit_id();
        reporter.report(ProgressEvent::UnitStarted { unit: unit.clone() });
        let unit_start = Instant::now();

        let result = match export_variant(&mut session, variant, animations, settings, reporter) {
            Ok(exported) => {
                reporter.info(
                    &unit,
                    format!(
                        "{} frames into {} sheet(s)",
                        exported.frames_captured,
                        exported.sheets.len()
                    ),
                );
                UnitResult::success(unit, exported.outputs(), unit_start.elapsed())
            }
            Err(err) => UnitResult::failed(unit, &err, unit_start.elapsed()),
        };

        reporter.report(result.completed_event());
        summary.add_result(result);
    }

    let summary = summary.with_duration(start.elapsed());
    reporter.report(summary.completed_event());
    summary
}
