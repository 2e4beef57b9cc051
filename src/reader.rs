use std::path::Path;

use plist::Value;
use thiserror::Error;

use crate::layout::{FORMAT_VERSION_KEY, METAINFO_FILE};
use crate::rules::value_type_name;

/// `Invalid` means the package is structurally unreadable, `Type` means a
/// value was encoded with the wrong plist type, `Other` covers everything
/// else (typically io).
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{path} is not a valid UFO package: {detail}")]
    Invalid { path: String, detail: String },

    #[error("type error while reading {path}: {detail}")]
    Type { path: String, detail: String },

    #[error("failed to read {path}: {detail}")]
    Other { path: String, detail: String },
}

pub fn import(ufo_path: &Path) -> Result<i64, ImportError> {
    let metainfo_path = ufo_path.join(METAINFO_FILE);
    let path = ufo_path.display().to_string();

    let raw = std::fs::read(&metainfo_path).map_err(|err| ImportError::Other {
        path: path.clone(),
        detail: err.to_string(),
    })?;

    let value = Value::from_reader(std::io::Cursor::new(raw)).map_err(|err| {
        ImportError::Invalid {
            path: path.clone(),
            detail: err.to_string(),
        }
    })?;

    let Some(dict) = value.as_dictionary() else {
        return Err(ImportError::Invalid {
            path,
            detail: format!(
                "{METAINFO_FILE} root element is a {}, expected a dictionary",
                value_type_name(&value)
            ),
        });
    };

    match dict.get(FORMAT_VERSION_KEY) {
        None => Err(ImportError::Invalid {
            path,
            detail: format!("{METAINFO_FILE} does not declare a {FORMAT_VERSION_KEY}"),
        }),
        Some(Value::Integer(version)) => version.as_signed().ok_or_else(|| ImportError::Type {
            path,
            detail: format!("{FORMAT_VERSION_KEY} does not fit in a signed integer"),
        }),
        Some(other) => Err(ImportError::Type {
            path,
            detail: format!(
                "{FORMAT_VERSION_KEY} is encoded as a {}, expected an integer",
                value_type_name(other)
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{ImportError, import};
    use crate::layout::METAINFO_FILE;

    fn write_metainfo(dir: &std::path::Path, body: &str) {
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \
             \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
             <plist version=\"1.0\">\n<dict>\n{body}\n</dict>\n</plist>\n"
        );
        fs::write(dir.join(METAINFO_FILE), xml).expect("write metainfo fixture");
    }

    #[test]
    fn import_returns_declared_integer_version() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write_metainfo(
            dir.path(),
            "<key>creator</key><string>test</string>\
             <key>formatVersion</key><integer>3</integer>",
        );

        let version = import(dir.path()).expect("valid metainfo imports");
        assert_eq!(version, 3);
    }

    #[test]
    fn import_classifies_missing_metainfo_as_other() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = import(dir.path()).expect_err("missing metainfo must fail");
        assert!(matches!(err, ImportError::Other { .. }));
    }

    #[test]
    fn import_classifies_malformed_xml_as_invalid() {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::write(dir.path().join(METAINFO_FILE), "<plist><dict>").expect("write fixture");

        let err = import(dir.path()).expect_err("truncated plist must fail");
        assert!(matches!(err, ImportError::Invalid { .. }));
    }

    #[test]
    fn import_classifies_string_version_as_type_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write_metainfo(dir.path(), "<key>formatVersion</key><string>3</string>");

        let err = import(dir.path()).expect_err("string version must fail");
        assert!(matches!(err, ImportError::Type { .. }));
    }
}
