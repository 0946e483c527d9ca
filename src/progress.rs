//! Run progress reporting.
//!
//! Export and import drivers emit [`ProgressEvent`]s instead of printing. The
//! CLI picks a reporter: coloured console text on stderr, or one JSON object
//! per line for tooling.
//!
//! # Example
//!
//! ```
//! use skinsheet::progress::{ConsoleProgress, ProgressEvent, ProgressReporter};
//! use skinsheet::report::UnitStatus;
//!
//! let reporter = ConsoleProgress::new();
//! reporter.report(ProgressEvent::RunStarted { operation: "export".to_string(), total_units: 1 });
//! reporter.report(ProgressEvent::UnitStarted { unit: "Torso/Leather".to_string() });
//! reporter.report(ProgressEvent::UnitCompleted {
//!     unit: "Torso/Leather".to_string(),
//!     status: UnitStatus::Success,
//!     duration_ms: 150,
//! });
//! ```

use serde_json::{json, Value};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::report::UnitStatus;

/// Events reported during an export or import run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started
    RunStarted {
        /// `export` or `import`
        operation: String,
        total_units: usize,
    },
    /// A unit started
    UnitStarted { unit: String },
    /// A unit finished
    UnitCompleted { unit: String, status: UnitStatus, duration_ms: u64 },
    /// Run finished
    RunCompleted { success: bool, duration_ms: u64, succeeded: usize, skipped: usize, failed: usize },
    /// Detail shown only in verbose mode
    Info { unit: Option<String>, message: String },
    /// Non-fatal problem
    Warning { unit: Option<String>, message: String },
    /// Error outside any unit
    Error { unit: Option<String>, message: String },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);

    /// Check if this reporter wants verbose output.
    fn is_verbose(&self) -> bool {
        false
    }

    /// Shorthand for a verbose detail line.
    fn info(&self, unit: &str, message: String) {
        if self.is_verbose() {
            self.report(ProgressEvent::Info { unit: Some(unit.to_string()), message });
        }
    }

    /// Shorthand for a unit-scoped warning.
    fn warn(&self, unit: &str, message: String) {
        self.report(ProgressEvent::Warning { unit: Some(unit.to_string()), message });
    }
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    use_colors: bool,
    verbose: bool,
    current: AtomicUsize,
    total: AtomicUsize,
    /// Output writer (for testing)
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .field("current", &self.current)
            .field("total", &self.total)
            .finish()
    }
}

impl ConsoleProgress {
    /// Create a console reporter writing to stderr.
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a console reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            use_colors: false,
            verbose: false,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            output: Mutex::new(Box::new(output)),
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn dim(&self, text: &str) -> String {
        self.color(text, "\x1b[2m")
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn unit_prefix(unit: Option<String>) -> String {
    match unit {
        Some(id) => format!("{}: ", id),
        None => String::new(),
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::RunStarted { operation, total_units } => {
                self.total.store(total_units, Ordering::SeqCst);
                self.current.store(0, Ordering::SeqCst);
                self.writeln(&format!(
                    "{} {} unit{}...",
                    self.cyan(&format!("[{}]", operation)),
                    total_units,
                    if total_units == 1 { "" } else { "s" }
                ));
            }
            ProgressEvent::UnitStarted { unit } => {
                if self.verbose {
                    let current = self.current.load(Ordering::SeqCst) + 1;
                    let total = self.total.load(Ordering::SeqCst);
                    self.writeln(&format!("[{}/{}] {}...", current, total, unit));
                }
            }
            ProgressEvent::UnitCompleted { unit, status, duration_ms } => {
                let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
                let total = self.total.load(Ordering::SeqCst);

                let status_str = match &status {
                    UnitStatus::Success => self.green("ok"),
                    UnitStatus::Skipped(_) => self.yellow("skipped"),
                    UnitStatus::Failed { .. } => self.red("FAILED"),
                };

                self.writeln(&format!(
                    "[{}/{}] {} {} ({})",
                    current,
                    total,
                    status_str,
                    unit,
                    format_duration(duration_ms)
                ));

                match status {
                    UnitStatus::Failed { kind, message } => {
                        self.writeln(&format!("        {}", self.red(&format!("{}: {}", kind, message))));
                    }
                    UnitStatus::Skipped(reason) => {
                        self.writeln(&format!("        {}", reason));
                    }
                    UnitStatus::Success => {}
                }
            }
            ProgressEvent::RunCompleted { success, duration_ms, succeeded, skipped, failed } => {
                let duration_str = format_duration(duration_ms);
                if success {
                    self.writeln(&format!(
                        "\n{} {} succeeded, {} skipped in {}",
                        self.green("[done]"),
                        succeeded,
                        skipped,
                        duration_str
                    ));
                } else {
                    self.writeln(&format!(
                        "\n{} {} succeeded, {} skipped, {} {} in {}",
                        self.red("[error]"),
                        succeeded,
                        skipped,
                        failed,
                        if failed == 1 { "failure" } else { "failures" },
                        duration_str
                    ));
                }
            }
            ProgressEvent::Info { unit, message } => {
                if self.verbose {
                    self.writeln(&self.dim(&format!("  {}{}", unit_prefix(unit), message)));
                }
            }
            ProgressEvent::Warning { unit, message } => {
                self.writeln(&format!("{} {}{}", self.yellow("[warn]"), unit_prefix(unit), message));
            }
            ProgressEvent::Error { unit, message } => {
                self.writeln(&format!("{} {}{}", self.red("[error]"), unit_prefix(unit), message));
            }
        }
    }

    fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// JSON-lines progress reporter for machine-readable output.
pub struct JsonProgress {
    verbose: bool,
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for JsonProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonProgress").field("verbose", &self.verbose).finish()
    }
}

impl JsonProgress {
    /// Create a JSON reporter writing to stderr.
    pub fn new() -> Self {
        Self { verbose: false, output: Mutex::new(Box::new(std::io::stderr())) }
    }

    /// Create a JSON reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { verbose: false, output: Mutex::new(Box::new(output)) }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn write_json(&self, value: Value) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", value);
        }
    }
}

impl Default for JsonProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn with_unit(mut value: Value, unit: Option<String>) -> Value {
    if let (Some(unit), Some(map)) = (unit, value.as_object_mut()) {
        map.insert("unit".to_string(), Value::String(unit));
    }
    value
}

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let value = match event {
            ProgressEvent::RunStarted { operation, total_units } => {
                json!({ "event": "run_started", "operation": operation, "total_units": total_units })
            }
            ProgressEvent::UnitStarted { unit } => json!({ "event": "unit_started", "unit": unit }),
            ProgressEvent::UnitCompleted { unit, status, duration_ms } => {
                let mut value = json!({
                    "event": "unit_completed",
                    "unit": unit,
                    "duration_ms": duration_ms,
                });
                let map = value.as_object_mut();
                if let Some(map) = map {
                    match status {
                        UnitStatus::Success => {
                            map.insert("status".into(), json!("success"));
                        }
                        UnitStatus::Skipped(reason) => {
                            map.insert("status".into(), json!("skipped"));
                            map.insert("reason".into(), json!(reason));
                        }
                        UnitStatus::Failed { kind, message } => {
                            map.insert("status".into(), json!("failed"));
                            map.insert("kind".into(), json!(kind.to_string()));
                            map.insert("error".into(), json!(message));
                        }
                    }
                }
                value
            }
            ProgressEvent::RunCompleted { success, duration_ms, succeeded, skipped, failed } => {
                json!({
                    "event": "run_completed",
                    "success": success,
                    "duration_ms": duration_ms,
                    "succeeded": succeeded,
                    "skipped": skipped,
                    "failed": failed,
                })
            }
            ProgressEvent::Info { unit, message } => {
                if !self.verbose {
                    return;
                }
                with_unit(json!({ "event": "info", "message": message }), unit)
            }
            ProgressEvent::Warning { unit, message } => {
                with_unit(json!({ "event": "warning", "message": message }), unit)
            }
            ProgressEvent::Error { unit, message } => {
                with_unit(json!({ "event": "error", "message": message }), unit)
            }
        };
        self.write_json(value);
    }

    fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Format a duration in milliseconds to a human-readable string.
fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::Arc;

    fn capture() -> (Arc<Mutex<Vec<u8>>>, TestWriter) {
        let output = Arc::new(Mutex::new(Vec::new()));
        let writer = TestWriter(Arc::clone(&output));
        (output, writer)
    }

    fn text(output: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8_lossy(&output.lock().unwrap()).into_owned()
    }

    #[test]
    fn test_null_progress() {
        let reporter = NullProgress::new();
        reporter.report(ProgressEvent::RunStarted { operation: "export".into(), total_units: 3 });
        reporter.info("a", "ignored".to_string());
        assert!(!reporter.is_verbose());
    }

    #[test]
    fn test_console_run_started() {
        let (output, writer) = capture();
        let reporter = ConsoleProgress::with_output(writer);
        reporter.report(ProgressEvent::RunStarted { operation: "import".into(), total_units: 5 });
        let text = text(&output);
        assert!(text.contains("[import]"));
        assert!(text.contains("5 units"));
    }

    #[test]
    fn test_console_unit_completed() {
        let (output, writer) = capture();
        let reporter = ConsoleProgress::with_output(writer);
        reporter.report(ProgressEvent::RunStarted { operation: "export".into(), total_units: 2 });
        reporter.report(ProgressEvent::UnitCompleted {
            unit: "Torso/Leather".into(),
            status: UnitStatus::Success,
            duration_ms: 150,
        });
        reporter.report(ProgressEvent::UnitCompleted {
            unit: "Hair/Long".into(),
            status: UnitStatus::Failed {
                kind: ErrorKind::RenderCaptureFailure,
                message: "frame not found".into(),
            },
            duration_ms: 50,
        });

        let text = text(&output);
        assert!(text.contains("[1/2] ok Torso/Leather (150ms)"));
        assert!(text.contains("[2/2] FAILED Hair/Long"));
        assert!(text.contains("render_capture_failure: frame not found"));
    }

    #[test]
    fn test_console_run_completed() {
        let (output, writer) = capture();
        let reporter = ConsoleProgress::with_output(writer);
        reporter.report(ProgressEvent::RunCompleted {
            success: false,
            duration_ms: 1500,
            succeeded: 2,
            skipped: 0,
            failed: 1,
        });
        let text = text(&output);
        assert!(text.contains("[error]"));
        assert!(text.contains("1 failure in 1.5s"));
    }

    #[test]
    fn test_console_info_only_when_verbose() {
        let (output, writer) = capture();
        let reporter = ConsoleProgress::with_output(writer);
        reporter.info("Body/Base", "sheet 6x8".to_string());
        assert!(text(&output).is_empty());

        let (output, writer) = capture();
        let reporter = ConsoleProgress::with_output(writer).with_verbose(true);
        reporter.info("Body/Base", "sheet 6x8".to_string());
        assert!(text(&output).contains("Body/Base: sheet 6x8"));
    }

    #[test]
    fn test_console_warning() {
        let (output, writer) = capture();
        let reporter = ConsoleProgress::with_output(writer);
        reporter.warn("Legs/Plate", "missing sheet 'run.png'".to_string());
        let text = text(&output);
        assert!(text.contains("[warn] Legs/Plate: missing sheet 'run.png'"));
    }

    #[test]
    fn test_json_unit_failed() {
        let (output, writer) = capture();
        let reporter = JsonProgress::with_output(writer);
        reporter.report(ProgressEvent::UnitCompleted {
            unit: "a/\"quoted\"".into(),
            status: UnitStatus::Failed {
                kind: ErrorKind::MalformedManifest,
                message: "bad".into(),
            },
            duration_ms: 7,
        });

        let line = text(&output);
        let value: Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["event"], "unit_completed");
        assert_eq!(value["unit"], "a/\"quoted\"");
        assert_eq!(value["status"], "failed");
        assert_eq!(value["kind"], "malformed_manifest");
        assert_eq!(value["duration_ms"], 7);
    }

    #[test]
    fn test_json_one_object_per_line() {
        let (output, writer) = capture();
        let reporter = JsonProgress::with_output(writer);
        reporter.report(ProgressEvent::RunStarted { operation: "export".into(), total_units: 2 });
        reporter.warn("x", "careful".to_string());
        reporter.info("x", "hidden".to_string());

        let text = text(&output);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let warning: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(warning["event"], "warning");
        assert_eq!(warning["unit"], "x");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0ms");
        assert_eq!(format_duration(999), "999ms");
        assert_eq!(format_duration(1500), "1.5s");
        assert_eq!(format_duration(90000), "1m 30s");
    }

    struct TestWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
