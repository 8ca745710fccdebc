//! Integration tests for the `forge` binary
//!
//! Each test runs in its own temp directory with an isolated XDG config
//! home so no stray forge.toml is picked up.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn forge(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_forge"))
        .args(args)
        .current_dir(cwd)
        .env("XDG_CONFIG_HOME", cwd.join(".xdg"))
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute forge")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_generate_writes_sheet() {
    let tmp = TempDir::new().unwrap();
    let output = forge(tmp.path(), &["generate", "1234", "-t", "dragonType=fire", "-o", "fire.png"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("seed: 1234"), "{}", out);
    assert!(out.contains("dragonType: fire (explicit)"), "{}", out);
    assert!(out.contains("Saved: fire.png"), "{}", out);

    let img = image::open(tmp.path().join("fire.png")).unwrap();
    assert_eq!((img.width(), img.height()), (512, 640));
    // -o without --metadata writes the sheet only
    assert!(!tmp.path().join("fire.json").exists());
}

#[test]
fn test_generate_default_path_with_metadata() {
    let tmp = TempDir::new().unwrap();
    let output = forge(tmp.path(), &["generate", "ember-7"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    assert!(tmp.path().join("build/sheet_ember-7.png").exists());
    let meta: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(tmp.path().join("build/sheet_ember-7.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(meta["name"], "Forge #ember-7");
    assert_eq!(meta["image"], "sheet_ember-7.png");
    assert_eq!(meta["attributes"].as_array().unwrap().len(), 5);
}

#[test]
fn test_generate_is_repeatable() {
    let tmp = TempDir::new().unwrap();
    assert!(forge(tmp.path(), &["generate", "99", "-o", "a.png"]).status.success());
    assert!(forge(tmp.path(), &["generate", "99", "-o", "b.png"]).status.success());
    let a = std::fs::read(tmp.path().join("a.png")).unwrap();
    let b = std::fs::read(tmp.path().join("b.png")).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_generate_invalid_weapon() {
    let tmp = TempDir::new().unwrap();
    let output = forge(tmp.path(), &["generate", "1", "-t", "weapon=not-a-real-weapon", "-o", "x.png"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("not-a-real-weapon"), "{}", stderr(&output));
    assert!(!tmp.path().join("x.png").exists());
}

#[test]
fn test_generate_malformed_trait_argument() {
    let tmp = TempDir::new().unwrap();
    let output = forge(tmp.path(), &["generate", "1", "-t", "fire"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_generate_json_response() {
    let tmp = TempDir::new().unwrap();
    let output = forge(tmp.path(), &["generate", "1234", "-t", "dragonType=fire", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let body: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(body["success"], true);
    assert!(body["image"].as_str().unwrap().starts_with("data:image/png;base64,"));
    assert!(body["logs"]
        .as_array()
        .unwrap()
        .iter()
        .any(|l| l == "dragonType: fire (explicit)"));
    assert!(!tmp.path().join("build").exists());
}

#[test]
fn test_generate_json_failure() {
    let tmp = TempDir::new().unwrap();
    let output = forge(tmp.path(), &["generate", "1", "-t", "tail=spiked", "--json"]);
    assert_eq!(output.status.code(), Some(1));

    let body: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "unknown_category");
    assert!(body.get("image").is_none());
}

#[test]
fn test_batch_then_audit() {
    let tmp = TempDir::new().unwrap();
    let output = forge(tmp.path(), &["batch", "-n", "3", "--start", "10", "-o", "out", "-j", "2"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("6 files written"), "{}", stdout(&output));

    for seed in 10..13 {
        assert!(tmp.path().join(format!("out/sheet_{}.png", seed)).exists());
        assert!(tmp.path().join(format!("out/sheet_{}.json", seed)).exists());
    }

    let audit = forge(tmp.path(), &["audit", "out"]);
    assert!(audit.status.success(), "{}{}", stdout(&audit), stderr(&audit));

    let strict = forge(tmp.path(), &["audit", "out", "--require", "tail"]);
    assert_eq!(strict.status.code(), Some(1));
    assert!(stdout(&strict).contains("missing tail"), "{}", stdout(&strict));
}

#[test]
fn test_batch_reads_forge_toml() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("forge.toml"),
        "[output]\ndir = \"sheets\"\nmetadata = false\n\n[batch]\ncount = 2\nstart_seed = 500\n",
    )
    .unwrap();

    let output = forge(tmp.path(), &["batch"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(tmp.path().join("sheets/sheet_500.png").exists());
    assert!(tmp.path().join("sheets/sheet_501.png").exists());
    assert!(!tmp.path().join("sheets/sheet_500.json").exists());
    assert!(!tmp.path().join("sheets/sheet_502.png").exists());
}

#[test]
fn test_invalid_forge_toml() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("forge.toml"), "[batch]\ncount = 0\n").unwrap();

    let output = forge(tmp.path(), &["batch"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("forge.toml"), "{}", stderr(&output));
}

#[test]
fn test_inspect_and_slice() {
    let tmp = TempDir::new().unwrap();
    assert!(forge(tmp.path(), &["generate", "5", "-o", "sheet.png"]).status.success());

    let inspect = forge(tmp.path(), &["inspect", "sheet.png"]);
    assert!(inspect.status.success());
    let out = stdout(&inspect);
    assert!(out.contains("512x640 8-bit rgba"), "{}", out);
    assert!(out.contains("8 frames x 10 rows"), "{}", out);

    let slice = forge(tmp.path(), &["slice", "sheet.png", "--row", "attack", "--col", "2", "-o", "tile.png"]);
    assert!(slice.status.success(), "stderr: {}", stderr(&slice));
    let tile = image::open(tmp.path().join("tile.png")).unwrap();
    assert_eq!((tile.width(), tile.height()), (64, 64));

    let bad_row = forge(tmp.path(), &["slice", "sheet.png", "--row", "dance", "-o", "t.png"]);
    assert_eq!(bad_row.status.code(), Some(2));
}

#[test]
fn test_inspect_rejects_non_png() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("notes.txt"), "hello").unwrap();
    let output = forge(tmp.path(), &["inspect", "notes.txt"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Not a PNG"), "{}", stderr(&output));
}

#[test]
fn test_validate_builtin_library() {
    let tmp = TempDir::new().unwrap();
    let output = forge(tmp.path(), &["validate"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    for category in ["dragonType", "wings", "eyes", "horns", "weapon"] {
        assert!(out.contains(&format!("  {} [z ", category)), "{}", out);
    }
    assert!(out.contains("overlay drumstick: feed frames 1-6"), "{}", out);
    assert!(out.contains("512x640 sheet"), "{}", out);
}

#[test]
fn test_validate_missing_library() {
    let tmp = TempDir::new().unwrap();
    let output = forge(tmp.path(), &["validate", "no-such-library"]);
    assert_eq!(output.status.code(), Some(1));
}

const MINI_LIBRARY: &str = r#"
name = "mini"

[sheet]
frame_width = 4
frame_height = 4
frames = 2
rows = 2

[[category]]
name = "body"

[[category.value]]
name = "slime"
file = "slime.png"
"#;

fn write_mini_library(root: &Path, body_width: u32) {
    let lib = root.join("lib");
    std::fs::create_dir_all(&lib).unwrap();
    std::fs::write(lib.join("assets.toml"), MINI_LIBRARY).unwrap();
    image::RgbaImage::from_pixel(body_width, 8, image::Rgba([40, 200, 40, 255]))
        .save(lib.join("slime.png"))
        .unwrap();
}

#[test]
fn test_generate_from_library_directory() {
    let tmp = TempDir::new().unwrap();
    write_mini_library(tmp.path(), 8);

    let output = forge(tmp.path(), &["generate", "1", "--library", "lib", "-o", "mini.png"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("body: slime (random"), "{}", stdout(&output));
    let img = image::open(tmp.path().join("mini.png")).unwrap();
    assert_eq!((img.width(), img.height()), (8, 8));
}

#[test]
fn test_library_geometry_mismatch() {
    let tmp = TempDir::new().unwrap();
    write_mini_library(tmp.path(), 6);

    let output = forge(tmp.path(), &["generate", "1", "--library", "lib", "-o", "mini.png"]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Geometry mismatch for body/slime"), "{}", err);
    assert!(err.contains("failed while compositing"), "{}", err);
    assert!(!tmp.path().join("mini.png").exists());
}
