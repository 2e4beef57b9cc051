use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, bail};
use plist::Value;
use tracing::debug;

use crate::layout::{
    CONTENTS_FILE, FONTINFO_FILE, FORMAT_VERSION_KEY, GROUPS_FILE, KERNING_FILE,
    LAYERCONTENTS_FILE, LAYERINFO_FILE, LIB_FILE, METAINFO_FILE, PackageLayout, UFO_EXTENSION,
    UfoVersion,
};
use crate::model::CheckResult;
use crate::reader;
use crate::reporter::Reporter;
use crate::rules::{self, FileKind, value_type_name};
use crate::util::{dir_exists, file_exists};

/// Advisory failures are recorded on the reporter; a fatal check streams
/// its result and returns an error, which halts everything downstream.
pub fn run_checks(ufo_path: &Path, reporter: &mut Reporter) -> Result<PackageLayout> {
    reporter.banner(&ufo_path.display().to_string());

    let layout = resolve_layout(ufo_path, reporter)?;
    check_mandatory_files(&layout, reporter)?;

    let documents = check_well_formedness(&layout, reporter);
    check_conformance(&layout, &documents, reporter);

    Ok(layout)
}

fn resolve_layout(ufo_path: &Path, reporter: &mut Reporter) -> Result<PackageLayout> {
    reporter.section("UFO directory");
    let target = ufo_path.display().to_string();

    if dir_exists(ufo_path) {
        reporter.stream(&CheckResult::pass(&target));
    } else {
        return Err(halt(
            reporter,
            CheckResult::fatal(
                &target,
                format!("{target} does not appear to be a valid UFO directory"),
            ),
        ));
    }

    // Naming convention only, so a bare directory name stays usable.
    let has_ufo_extension = ufo_path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension == UFO_EXTENSION)
        .unwrap_or(false);
    if has_ufo_extension {
        reporter.record(CheckResult::pass(&target));
    } else {
        reporter.record(CheckResult::fail(
            &target,
            format!("{target} directory does not have a .{UFO_EXTENSION} extension"),
        ));
    }

    let metainfo_path = ufo_path.join(METAINFO_FILE);
    let metainfo_target = metainfo_path.display().to_string();
    if file_exists(&metainfo_path) {
        reporter.stream(&CheckResult::pass(&metainfo_target));
    } else {
        return Err(halt(
            reporter,
            CheckResult::fatal(
                &metainfo_target,
                format!("{METAINFO_FILE} was not found in {target}"),
            ),
        ));
    }

    match precheck_format_version(&metainfo_path) {
        Ok(()) => reporter.stream(&CheckResult::pass(&metainfo_target)),
        Err(detail) => {
            return Err(halt(
                reporter,
                CheckResult::fatal(&metainfo_target, detail),
            ));
        }
    }

    let format_version = match reader::import(ufo_path) {
        Ok(version) => {
            reporter.stream(&CheckResult::pass(&target));
            version
        }
        Err(err) => {
            // The only fatal check whose result is also retained for the
            // aggregate report.
            let result = CheckResult::fatal(&target, err.to_string());
            reporter.record(result);
            return Err(err.into());
        }
    };

    let Some(version) = UfoVersion::from_format_version(format_version) else {
        bail!("UFO v{format_version} is not supported");
    };
    reporter.note(&format!("found UFO v{}", version.as_number()));

    let glyph_layers = match version {
        UfoVersion::V2 => version.resolve_layers(ufo_path)?,
        UfoVersion::V3 => {
            let manifest_path = ufo_path.join(LAYERCONTENTS_FILE);
            let manifest_target = manifest_path.display().to_string();
            if file_exists(&manifest_path) {
                reporter.stream(&CheckResult::pass(&manifest_target));
            } else {
                return Err(halt(
                    reporter,
                    CheckResult::fatal(
                        &manifest_target,
                        format!("{LAYERCONTENTS_FILE} was not found in {target}"),
                    ),
                ));
            }

            match version.resolve_layers(ufo_path) {
                Ok(layers) => {
                    reporter.stream(&CheckResult::pass(&manifest_target));
                    layers
                }
                Err(err) => {
                    return Err(halt(
                        reporter,
                        CheckResult::fatal(&manifest_target, format!("{err:#}")),
                    ));
                }
            }
        }
    };

    // All declared layer directories are checked even when an earlier one
    // is missing; a missing directory is advisory here and surfaces again
    // through the mandatory-file sweep.
    for layer in &glyph_layers {
        let dir_path = ufo_path.join(&layer.directory);
        let dir_target = dir_path.display().to_string();
        if dir_exists(&dir_path) {
            reporter.record(CheckResult::pass(dir_target));
        } else {
            reporter.record(CheckResult::fail(
                &dir_target,
                format!(
                    "glyphs directory {} for layer '{}' was not found in {target}",
                    layer.directory, layer.name
                ),
            ));
        }
    }

    debug!(
        package = %target,
        version = version.as_number(),
        layers = glyph_layers.len(),
        "resolved package layout"
    );

    Ok(PackageLayout {
        path: ufo_path.to_path_buf(),
        version,
        glyph_layers,
    })
}

// formatVersion must be encoded as an integer before the value is trusted
// anywhere else; a permissive reader would hand back "3" or 3.0 here.
fn precheck_format_version(metainfo_path: &Path) -> Result<(), String> {
    let display = metainfo_path.display();
    let value = Value::from_file(metainfo_path)
        .map_err(|err| format!("failed to read the {FORMAT_VERSION_KEY} value in {display}: {err}"))?;

    let Some(dict) = value.as_dictionary() else {
        return Err(format!(
            "failed to read the {FORMAT_VERSION_KEY} value in {display}: root element is not a dictionary"
        ));
    };

    match dict.get(FORMAT_VERSION_KEY) {
        None => Err(format!(
            "failed to read the {FORMAT_VERSION_KEY} value in {display}"
        )),
        Some(Value::Integer(_)) => Ok(()),
        Some(other) => Err(format!(
            "{display} {FORMAT_VERSION_KEY} value must be specified as an integer, found {}",
            value_type_name(other)
        )),
    }
}

fn check_mandatory_files(layout: &PackageLayout, reporter: &mut Reporter) -> Result<()> {
    reporter.section(&format!(
        "UFO v{} mandatory files",
        layout.version.as_number()
    ));

    let mut missing = 0_usize;
    for path in layout.mandatory_files() {
        let target = path.display().to_string();
        if file_exists(&path) {
            reporter.record(CheckResult::pass(target));
        } else {
            missing += 1;
            reporter.record(CheckResult::fatal(
                &target,
                format!("{target} was not found in {}", layout.path.display()),
            ));
        }
    }

    if missing > 0 {
        bail!(
            "{missing} mandatory file(s) missing from {}",
            layout.path.display()
        );
    }
    Ok(())
}

struct GovernedFile {
    kind: FileKind,
    path: PathBuf,
    mandatory: bool,
    layer_dir: Option<PathBuf>,
}

struct DecodedFile {
    file: GovernedFile,
    value: Option<Value>,
}

// Fixed evaluation order: root plists first, then per-layer files in
// manifest order.
fn governed_files(layout: &PackageLayout) -> Vec<GovernedFile> {
    let root = &layout.path;
    let mut files = vec![
        GovernedFile {
            kind: FileKind::Metainfo,
            path: root.join(METAINFO_FILE),
            mandatory: true,
            layer_dir: None,
        },
        GovernedFile {
            kind: FileKind::Fontinfo,
            path: root.join(FONTINFO_FILE),
            mandatory: false,
            layer_dir: None,
        },
        GovernedFile {
            kind: FileKind::Groups,
            path: root.join(GROUPS_FILE),
            mandatory: false,
            layer_dir: None,
        },
        GovernedFile {
            kind: FileKind::Kerning,
            path: root.join(KERNING_FILE),
            mandatory: false,
            layer_dir: None,
        },
        GovernedFile {
            kind: FileKind::Lib,
            path: root.join(LIB_FILE),
            mandatory: false,
            layer_dir: None,
        },
    ];

    if layout.version == UfoVersion::V3 {
        files.push(GovernedFile {
            kind: FileKind::Layercontents,
            path: root.join(LAYERCONTENTS_FILE),
            mandatory: true,
            layer_dir: None,
        });
    }

    for layer in &layout.glyph_layers {
        let dir = root.join(&layer.directory);
        files.push(GovernedFile {
            kind: FileKind::Contents,
            path: dir.join(CONTENTS_FILE),
            mandatory: true,
            layer_dir: Some(dir.clone()),
        });
        if layout.version == UfoVersion::V3 {
            files.push(GovernedFile {
                kind: FileKind::Layerinfo,
                path: dir.join(LAYERINFO_FILE),
                mandatory: false,
                layer_dir: Some(dir),
            });
        }
    }

    files
}

// Decode-only sweep. Never halts: a malformed file in one place must not
// suppress detection of a malformed file elsewhere.
fn check_well_formedness(layout: &PackageLayout, reporter: &mut Reporter) -> Vec<DecodedFile> {
    reporter.section("XML formatting");

    let mut documents = Vec::new();
    for file in governed_files(layout) {
        if !file.mandatory && !file_exists(&file.path) {
            continue;
        }

        let target = file.path.display().to_string();
        match Value::from_file(&file.path) {
            Ok(value) => {
                reporter.record(CheckResult::pass(target));
                documents.push(DecodedFile {
                    file,
                    value: Some(value),
                });
            }
            Err(err) => {
                reporter.record(CheckResult::fail(&target, err.to_string()));
                documents.push(DecodedFile { file, value: None });
            }
        }
    }

    documents
}

fn check_conformance(layout: &PackageLayout, documents: &[DecodedFile], reporter: &mut Reporter) {
    reporter.section("plist spec");

    for document in documents {
        let Some(value) = &document.value else {
            continue;
        };

        let target = document.file.path.display().to_string();
        let spec = rules::file_spec(document.file.kind, layout.version);
        let mut violations = rules::evaluate(&target, value, spec);

        match (document.file.kind, document.file.layer_dir.as_deref()) {
            (FileKind::Contents, Some(layer_dir)) => {
                violations.extend(check_contents_references(&target, value, layer_dir));
            }
            (FileKind::Layercontents, _) => {
                violations.extend(check_layer_directory_names(&target, value));
            }
            _ => {}
        }

        if violations.is_empty() {
            reporter.record(CheckResult::pass(target));
        } else {
            for violation in violations {
                reporter.record(violation);
            }
        }
    }
}

fn check_contents_references(target: &str, doc: &Value, layer_dir: &Path) -> Vec<CheckResult> {
    let Some(dict) = doc.as_dictionary() else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for (glyph_name, value) in dict.iter() {
        let Some(file_name) = value.as_string() else {
            continue;
        };
        if !file_exists(&layer_dir.join(file_name)) {
            results.push(CheckResult::fail(
                target,
                format!(
                    "glyph '{glyph_name}' references {file_name}, which was not found in {}",
                    layer_dir.display()
                ),
            ));
        }
    }
    results
}

fn check_layer_directory_names(target: &str, doc: &Value) -> Vec<CheckResult> {
    let Some(entries) = doc.as_array() else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for entry in entries {
        let Some(pair) = entry.as_array() else {
            continue;
        };
        let Some(directory) = pair.get(1).and_then(Value::as_string) else {
            continue;
        };
        if directory != "glyphs" && !directory.starts_with("glyphs.") {
            results.push(CheckResult::fail(
                target,
                format!("layer directory '{directory}' must be 'glyphs' or begin with 'glyphs.'"),
            ));
        }
    }
    results
}

fn halt(reporter: &mut Reporter, result: CheckResult) -> anyhow::Error {
    reporter.stream(&result);
    match result.detail {
        Some(detail) => anyhow!(detail),
        None => anyhow!("fatal check failed for {}", result.target),
    }
}
