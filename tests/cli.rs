use assert_cmd::prelude::*;
use predicates::str::contains;
use std::fs;
use std::io::Write;
use std::process::Command;
use tempfile::{tempdir, NamedTempFile};

fn runtime() -> Command {
    Command::cargo_bin("primitives-runtime").expect("binary exists")
}

#[test]
fn cli_prints_the_cube_scene() {
    let mut cmd = runtime();
    cmd.args(["--preset", "cubes", "--summary-only"]);
    cmd.assert()
        .success()
        .stdout(contains("Scene: 3 objects (1 lights)"))
        .stdout(contains(" - #0 box pos=(0.00, 0.00, 0.00) color=(0.27, 0.67, 0.53)"))
        .stdout(contains(" - #1 box pos=(-2.00, 0.00, 0.00)"))
        .stdout(contains(" - #2 box pos=(2.00, 0.00, 0.00)"));
}

#[test]
fn cli_animates_and_tracks_resizes() {
    let mut cmd = runtime();
    cmd.args([
        "--preset",
        "primitives",
        "--seed",
        "7",
        "--frames",
        "3",
        "--fps",
        "1",
        "--width",
        "640",
        "--height",
        "480",
        "--resize-at",
        "2:320x240",
    ]);
    cmd.assert()
        .success()
        .stdout(contains("Scene: 5 objects (2 lights)"))
        .stdout(contains(" - #1 circle-sector pos=(22.50, 0.00, 0.00)"))
        .stdout(contains("Drew 3 frame(s) at 320x240"))
        .stdout(contains("Resized backing store 2 time(s)"))
        // Last frame fires at 2000 ms, and object 0 spins at 0.1 rad/s.
        .stdout(contains(" - #0 box rot=(0.20, 0.20, 0.00)"));
}

#[test]
fn cli_loads_manifest_assets() {
    let dir = tempdir().expect("temp dir");
    fs::write(
        dir.path().join("tri.obj"),
        "v 0 0 0\nv 2 0 0\nv 0 2 0\nf 1 2 3\n",
    )
    .expect("write mesh");
    let manifest = dir.path().join("scene.xml");
    fs::write(
        &manifest,
        r##"<scene preset="cubes">
  <object kind="sphere" x="1" radius="0.5" color="#ff0000"/>
  <asset kind="mesh" url="tri.obj" x="-1"/>
  <asset kind="mesh" url="missing.obj"/>
</scene>
"##,
    )
    .expect("write manifest");

    let mut cmd = runtime();
    cmd.arg(&manifest).args(["--frames", "2"]);
    cmd.assert()
        .success()
        .stdout(contains("Scene: 1 objects"))
        .stdout(contains(" - #0 sphere pos=(1.00, 0.00, 0.00) color=(1.00, 0.00, 0.00)"))
        .stdout(contains("Loaded 1 asset(s), 1 failed"))
        .stdout(contains(" - #1 mesh rot="));
}

#[test]
fn cli_rejects_invalid_manifest() {
    let mut tmp = NamedTempFile::new().expect("temp manifest");
    tmp.write_all(br#"<scene><object kind="box" depth="0"/></scene>"#)
        .expect("write manifest");

    let mut cmd = runtime();
    cmd.arg(tmp.path()).arg("--summary-only");
    cmd.assert().failure().stderr(contains("depth"));
}

#[test]
fn cli_rejects_bad_resize_argument() {
    let mut cmd = runtime();
    cmd.args(["--resize-at", "soon"]);
    cmd.assert().failure().stderr(contains("FRAME:WIDTHxHEIGHT"));
}
