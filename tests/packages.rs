use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

const PLIST_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
    <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \
    \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
    <plist version=\"1.0\">\n";

fn write_plist(path: &Path, body: &str) {
    fs::write(path, format!("{PLIST_HEADER}{body}\n</plist>\n")).expect("write plist fixture");
}

fn write_glyphs_dir(root: &Path, directory: &str) {
    let dir = root.join(directory);
    fs::create_dir_all(&dir).expect("create glyphs dir");
    write_plist(
        &dir.join("contents.plist"),
        "<dict>\n<key>A</key><string>A_.glif</string>\n</dict>",
    );
    fs::write(dir.join("A_.glif"), "<glyph name=\"A\" format=\"2\"/>\n")
        .expect("write glif fixture");
}

fn make_v3_package(parent: &Path) -> PathBuf {
    let root = parent.join("Integration.ufo");
    fs::create_dir_all(&root).expect("create package dir");
    write_plist(
        &root.join("metainfo.plist"),
        "<dict>\n<key>creator</key><string>org.example.editor</string>\n\
         <key>formatVersion</key><integer>3</integer>\n</dict>",
    );
    write_plist(
        &root.join("layercontents.plist"),
        "<array>\n<array><string>public.default</string><string>glyphs</string></array>\n\
         </array>",
    );
    write_glyphs_dir(&root, "glyphs");
    root
}

fn ufolint() -> Command {
    Command::cargo_bin("ufolint").expect("ufolint binary builds")
}

#[test]
fn conformant_package_exits_zero_with_no_failure_lines() {
    let tmp = TempDir::new().expect("create temp dir");
    let package = make_v3_package(tmp.path());

    let assert = ufolint().arg(&package).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf-8 stdout");
    assert!(!stdout.contains("[FAIL]"));
}

#[test]
fn advisory_failure_exits_one_and_lists_the_failure() {
    let tmp = TempDir::new().expect("create temp dir");
    let package = make_v3_package(tmp.path());
    fs::remove_file(package.join("glyphs").join("A_.glif")).expect("remove glif");

    let assert = ufolint().arg(&package).assert().failure();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf-8 stdout");
    assert!(stdout.contains("[FAIL]"));
    assert!(stdout.contains("A_.glif"));
}

#[test]
fn fatal_halt_exits_one() {
    let tmp = TempDir::new().expect("create temp dir");
    let missing = tmp.path().join("Absent.ufo");

    ufolint().arg(&missing).assert().failure();
}

#[test]
fn reruns_on_an_unmodified_package_are_byte_identical() {
    let tmp = TempDir::new().expect("create temp dir");
    let package = make_v3_package(tmp.path());
    fs::remove_file(package.join("glyphs").join("A_.glif")).expect("remove glif");

    let first = ufolint().arg(&package).assert().failure();
    let second = ufolint().arg(&package).assert().failure();
    assert_eq!(
        first.get_output().stdout,
        second.get_output().stdout
    );
}

#[test]
fn report_artifact_matches_the_streamed_failures() {
    let tmp = TempDir::new().expect("create temp dir");
    let package = make_v3_package(tmp.path());
    fs::remove_file(package.join("glyphs").join("A_.glif")).expect("remove glif");
    let report_path = tmp.path().join("report.json");

    ufolint()
        .arg("--report-path")
        .arg(&report_path)
        .arg(&package)
        .assert()
        .failure();

    let raw = fs::read(&report_path).expect("report file written");
    let report: Value = serde_json::from_slice(&raw).expect("report is valid json");

    assert_eq!(report["status"], "failed");
    let packages = report["packages"].as_array().expect("packages array");
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0]["format_version"], 3);
    assert_eq!(packages[0]["fatal"], false);

    let failures = packages[0]["failures"].as_array().expect("failures array");
    assert_eq!(failures.len(), 1);
    assert!(
        failures[0]["detail"]
            .as_str()
            .expect("failure detail")
            .contains("A_.glif")
    );
}

#[test]
fn conformant_package_report_is_marked_passed() {
    let tmp = TempDir::new().expect("create temp dir");
    let package = make_v3_package(tmp.path());
    let report_path = tmp.path().join("report.json");

    ufolint()
        .arg("--report-path")
        .arg(&report_path)
        .arg(&package)
        .assert()
        .success();

    let raw = fs::read(&report_path).expect("report file written");
    let report: Value = serde_json::from_slice(&raw).expect("report is valid json");
    assert_eq!(report["status"], "passed");
    assert_eq!(report["packages"][0]["failed"], 0);
}
