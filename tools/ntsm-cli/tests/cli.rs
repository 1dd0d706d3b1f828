//! End-to-end tests for the `ntsm` binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use ntsm_format::{Container, FLAG_COLLISION, FLAG_HAS_PARTICLES, FLAG_WORLD_SPACE};

const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n";

fn ntsm(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ntsm"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run ntsm")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn migrate_converts_tree() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    fs::create_dir_all(src.path().join("weapons")).unwrap();
    fs::write(src.path().join("weapons/sword.obj"), TRIANGLE).unwrap();
    fs::write(src.path().join("rock.OBJ"), TRIANGLE).unwrap();
    fs::write(src.path().join("notes.txt"), "ignored").unwrap();

    let out = ntsm(&[
        "migrate",
        "--src",
        path_str(src.path()),
        "--dst",
        path_str(dst.path()),
        "--yes",
    ]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("Found 2 assets to convert"));
    assert!(stdout.contains("Successfully converted: 2"));

    let bytes = fs::read(dst.path().join("weapons/sword.ntsm")).unwrap();
    let sword = Container::decode(&bytes).unwrap();
    assert_eq!(sword.name(), "sword");
    assert_eq!(&sword.glb[0..4], b"glTF");
    assert!(dst.path().join("rock.ntsm").is_file());
}

#[test]
fn migrate_applies_manifest() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    fs::write(src.path().join("torch.obj"), TRIANGLE).unwrap();
    fs::write(src.path().join("flame.bin"), [9u8; 16]).unwrap();

    let manifest = src.path().join("ntsm.toml");
    fs::write(
        &manifest,
        r#"
[defaults]
flags = ["world_space"]

[[asset]]
source = "torch.obj"
name = "wall_torch"
flags = ["collision"]
textures = [{ name = "flame", path = "flame.bin" }]

[[asset.emitters]]
position = [0.0, 0.5, 0.0]
texture_index = 0
"#,
    )
    .unwrap();

    let out = ntsm(&[
        "migrate",
        "--src",
        path_str(src.path()),
        "--dst",
        path_str(dst.path()),
        "--manifest",
        path_str(&manifest),
        "--yes",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let torch = Container::decode(&fs::read(dst.path().join("torch.ntsm")).unwrap()).unwrap();
    assert_eq!(torch.name(), "wall_torch");
    assert_eq!(
        torch.header.flags,
        FLAG_HAS_PARTICLES | FLAG_WORLD_SPACE | FLAG_COLLISION
    );
    assert_eq!(torch.emitters.len(), 1);
    assert_eq!(torch.emitters[0].position, [0.0, 0.5, 0.0]);
    assert_eq!(torch.find_texture("flame").unwrap().data, vec![9u8; 16]);
}

#[test]
fn migrate_dry_run_writes_nothing() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    fs::write(src.path().join("a.obj"), TRIANGLE).unwrap();
    let out_dir = dst.path().join("out");

    let out = ntsm(&[
        "migrate",
        "--src",
        path_str(src.path()),
        "--dst",
        path_str(&out_dir),
        "--dry-run",
        "--yes",
    ]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success());
    assert!(stdout.contains("DRY RUN"));
    assert!(!out_dir.exists());
}

#[test]
fn migrate_reports_failures() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    fs::write(src.path().join("good.obj"), TRIANGLE).unwrap();
    fs::write(src.path().join("bad.obj"), "v 0 0 0\nf 1 2 3\n").unwrap();

    let out = ntsm(&[
        "migrate",
        "--src",
        path_str(src.path()),
        "--dst",
        path_str(dst.path()),
        "--concurrency",
        "2",
        "--yes",
    ]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(!out.status.success());
    assert!(stdout.contains("Successfully converted: 1"));
    assert!(stdout.contains("Failed: 1"));
    assert!(dst.path().join("good.ntsm").is_file());
}

#[test]
fn migrate_declined_prompt_aborts() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    fs::write(src.path().join("a.obj"), TRIANGLE).unwrap();
    let out_dir = dst.path().join("out");

    // stdin is closed, which reads as an empty answer
    let out = Command::new(env!("CARGO_BIN_EXE_ntsm"))
        .args(["migrate", "--src", path_str(src.path()), "--dst", path_str(&out_dir)])
        .stdin(std::process::Stdio::null())
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success());
    assert!(stdout.contains("Proceed with migration? [y/N]"));
    assert!(stdout.contains("Migration aborted."));
    assert!(!out_dir.exists());
}

#[test]
fn migrate_empty_source_fails() {
    let src = tempfile::tempdir().unwrap();
    let out = ntsm(&["migrate", "--src", path_str(src.path()), "--yes"]);
    assert!(!out.status.success());
}

#[test]
fn inspect_and_extract() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("lamp.obj");
    fs::write(&src, TRIANGLE).unwrap();
    let dst = dir.path().join("out");

    let out = ntsm(&["migrate", "--src", path_str(&src), "--dst", path_str(&dst), "--yes"]);
    assert!(out.status.success());
    let file = dst.join("lamp.ntsm");

    let out = ntsm(&["inspect", path_str(&file)]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success());
    assert!(stdout.contains("Name:     lamp"));
    assert!(stdout.contains("GLB magic: ok"));

    let extracted = dir.path().join("extracted");
    let out = ntsm(&["extract", path_str(&file), "-o", path_str(&extracted)]);
    assert!(out.status.success());

    let container = Container::decode(&fs::read(&file).unwrap()).unwrap();
    assert_eq!(fs::read(extracted.join("lamp.glb")).unwrap(), container.glb);
}

#[test]
fn inspect_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("junk.ntsm");
    fs::write(&file, b"NOPE").unwrap();

    let out = ntsm(&["inspect", path_str(&file)]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Invalid NTSM file"));
}
