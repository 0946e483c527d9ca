//! CLI integration tests for `skinsheet export`, `import` and `inspect`.
//!
//! Each test builds a small project in a temporary directory (config plus a
//! pre-rendered frame tree) and runs the real binary against it.

use image::{Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Path to the skinsheet binary built for this test run.
fn skinsheet_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_skinsheet"))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(skinsheet_binary())
        .current_dir(dir)
        .args(args)
        .output()
        .expect("Failed to execute skinsheet")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

const CONFIG: &str = r#"
[project]
name = "knight"

[export]
pixel_size = 4
y_offset = 0
limit_colors = false

[import]
out = "imported"

[[animations]]
name = "idle"
fps = 10
frames_per_direction = 2
clip_length = 0.2
clip_frame_rate = 10.0
directions = ["S", { direction = "Back", angle = 0.0, x_angle = 20.0 }]

[[groups]]
name = "Body"
sort_order = 0
variants = ["Base"]

[[groups]]
name = "Hair"
sort_order = 7
variants = ["Long"]
"#;

/// Project with a config and frames for every variant/direction/frame.
fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("skinsheet.toml"), CONFIG).unwrap();
    for (v, variant) in ["Base", "Long"].iter().enumerate() {
        for (d, direction) in ["S", "Back"].iter().enumerate() {
            let dir = temp.path().join("frames").join(variant).join("idle").join(direction);
            fs::create_dir_all(&dir).unwrap();
            for f in 0..2u8 {
                let color = Rgba([v as u8 * 120 + 5, d as u8 * 90 + 5, f * 70 + 5, 255]);
                RgbaImage::from_pixel(4, 4, color)
                    .save(dir.join(format!("{:04}.png", f)))
                    .unwrap();
            }
        }
    }
    temp
}

// ============================================================================
// export
// ============================================================================

#[test]
fn test_export_writes_sheets_and_manifests() {
    let project = project();
    let output = run(project.path(), &["export"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("2 succeeded"));

    let out = project.path().join("SpriteExports");
    assert!(out.join("Body/Base/idle.png").is_file());
    assert!(out.join("Hair/Long/manifest.json").is_file());

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("Hair/Long/manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["exportPrefix"], "Hair_Long");
    assert_eq!(manifest["sortOrder"], 7);
    assert_eq!(manifest["animations"][0]["directions"][1], "Back");
}

#[test]
fn test_export_only_and_combine() {
    let project = project();
    let output = run(project.path(), &["export", "--only", "Hair", "--combine", "--out", "x"]);
    assert!(output.status.success());

    let out = project.path().join("x");
    assert!(out.join("Hair/Long/Long.png").is_file());
    assert!(!out.join("Body").exists());
}

#[test]
fn test_export_missing_frames_fails() {
    let project = project();
    fs::remove_dir_all(project.path().join("frames/Long")).unwrap();
    let output = run(project.path(), &["export"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("1 failed"));
}

#[test]
fn test_export_json_progress() {
    let project = project();
    let output = run(project.path(), &["--json", "export"]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let events: Vec<serde_json::Value> =
        stderr.lines().filter_map(|l| serde_json::from_str(l).ok()).collect();
    assert!(!events.is_empty());
    assert!(events.iter().any(|e| e["event"] == "run_completed"));
}

#[test]
fn test_export_without_groups_is_invalid() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("skinsheet.toml"), "[project]\nname = \"empty\"\n").unwrap();
    let output = run(temp.path(), &["export"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("skinsheet.toml"),
        "[project]\nname = \"bad\"\n[export]\npixel_size = 0\n",
    )
    .unwrap();
    let output = run(temp.path(), &["export"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("export.pixel_size"));
}

// ============================================================================
// import
// ============================================================================

#[test]
fn test_import_writes_frames_and_character() {
    let project = project();
    assert!(run(project.path(), &["export"]).status.success());

    let output = run(project.path(), &["import", "SpriteExports"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let imported = project.path().join("imported");
    assert!(imported.join("Textures/Body_Base/idle.png").is_file());
    assert!(imported.join("Hair_Long/idle/Back/001.png").is_file());
    assert!(imported.join("Body_Base.part.json").is_file());

    let frame = image::open(imported.join("Hair_Long/idle/Back/001.png")).unwrap().to_rgba8();
    assert_eq!(*frame.get_pixel(2, 2), Rgba([125, 95, 75, 255]));

    let character: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(imported.join("character.json")).unwrap())
            .unwrap();
    assert_eq!(character["layers"][0]["partName"], "Body_Base");
    assert_eq!(character["layers"][1]["partName"], "Hair_Long");
}

#[test]
fn test_import_no_frames_no_compose() {
    let project = project();
    assert!(run(project.path(), &["export"]).status.success());

    let output = run(project.path(), &["import", "SpriteExports", "--no-frames", "--no-compose"]);
    assert!(output.status.success());

    let imported = project.path().join("imported");
    assert!(imported.join("Body_Base.part.json").is_file());
    assert!(!imported.join("Body_Base").exists());
    assert!(!imported.join("character.json").exists());
}

#[test]
fn test_import_missing_folder() {
    let project = project();
    let output = run(project.path(), &["import", "nowhere"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("nowhere"));
}

// ============================================================================
// inspect
// ============================================================================

#[test]
fn test_inspect_json() {
    let project = project();
    assert!(run(project.path(), &["export"]).status.success());

    let output = run(
        project.path(),
        &["inspect", "SpriteExports/Body/Base/manifest.json", "--json"],
    );
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    assert_eq!(json["partName"], "Body_Base");
    let sheet = &json["sheets"][0];
    assert_eq!(sheet["file"], "idle.png");
    assert_eq!(sheet["found"]["height"], 8);
    assert_eq!(sheet["cells"].as_array().unwrap().len(), 4);
}

#[test]
fn test_inspect_text() {
    let project = project();
    assert!(run(project.path(), &["export"]).status.success());

    let output = run(project.path(), &["inspect", "SpriteExports/Hair/Long/manifest.json"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Hair_Long"));
    assert!(text.contains("idle_1_1"));
    assert!(text.contains("[found]"));
}

#[test]
fn test_inspect_malformed_manifest() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("manifest.json"), r#"{"exportPrefix": "X", "pixelSize": 0}"#)
        .unwrap();
    let output = run(temp.path(), &["inspect", "manifest.json"]);
    assert_eq!(output.status.code(), Some(1));
}
