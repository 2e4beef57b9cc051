use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

pub const METAINFO_FILE: &str = "metainfo.plist";
pub const FONTINFO_FILE: &str = "fontinfo.plist";
pub const GROUPS_FILE: &str = "groups.plist";
pub const KERNING_FILE: &str = "kerning.plist";
pub const LIB_FILE: &str = "lib.plist";
pub const LAYERCONTENTS_FILE: &str = "layercontents.plist";
pub const CONTENTS_FILE: &str = "contents.plist";
pub const LAYERINFO_FILE: &str = "layerinfo.plist";

pub const FORMAT_VERSION_KEY: &str = "formatVersion";
pub const UFO_EXTENSION: &str = "ufo";

pub const DEFAULT_LAYER_NAME: &str = "public.default";
pub const DEFAULT_GLYPHS_DIR: &str = "glyphs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UfoVersion {
    V2,
    V3,
}

impl UfoVersion {
    pub fn from_format_version(value: i64) -> Option<Self> {
        match value {
            2 => Some(Self::V2),
            3 => Some(Self::V3),
            _ => None,
        }
    }

    pub fn as_number(self) -> u8 {
        match self {
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }

    /// V2 packages have no layer manifest; the single default layer is
    /// synthesized without touching the filesystem.
    pub fn resolve_layers(self, root: &Path) -> Result<Vec<GlyphLayer>> {
        match self {
            Self::V2 => Ok(vec![GlyphLayer {
                name: DEFAULT_LAYER_NAME.to_string(),
                directory: DEFAULT_GLYPHS_DIR.to_string(),
            }]),
            Self::V3 => load_layer_manifest(root),
        }
    }

    pub fn mandatory_files(self, root: &Path, layers: &[GlyphLayer]) -> Vec<PathBuf> {
        let mut files = vec![root.join(METAINFO_FILE)];
        if self == Self::V3 {
            files.push(root.join(LAYERCONTENTS_FILE));
        }
        for layer in layers {
            files.push(root.join(&layer.directory).join(CONTENTS_FILE));
        }
        files
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphLayer {
    pub name: String,
    pub directory: String,
}

#[derive(Debug, Clone)]
pub struct PackageLayout {
    pub path: PathBuf,
    pub version: UfoVersion,
    pub glyph_layers: Vec<GlyphLayer>,
}

impl PackageLayout {
    pub fn mandatory_files(&self) -> Vec<PathBuf> {
        self.version
            .mandatory_files(&self.path, &self.glyph_layers)
    }
}

fn load_layer_manifest(root: &Path) -> Result<Vec<GlyphLayer>> {
    let path = root.join(LAYERCONTENTS_FILE);
    let entries: Vec<(String, String)> = plist::from_file(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    if entries.is_empty() {
        bail!("{} declares no glyph layers", path.display());
    }

    Ok(entries
        .into_iter()
        .map(|(name, directory)| GlyphLayer { name, directory })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::{DEFAULT_GLYPHS_DIR, DEFAULT_LAYER_NAME, GlyphLayer, UfoVersion};

    #[test]
    fn v2_layers_are_synthesized_without_reading_the_filesystem() {
        let layers = UfoVersion::V2
            .resolve_layers(Path::new("/nonexistent/package.ufo"))
            .expect("v2 layer resolution is infallible");

        assert_eq!(
            layers,
            vec![GlyphLayer {
                name: DEFAULT_LAYER_NAME.to_string(),
                directory: DEFAULT_GLYPHS_DIR.to_string(),
            }]
        );
    }

    #[test]
    fn v3_layers_load_from_the_layer_manifest_in_order() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
            <plist version=\"1.0\">\n<array>\n\
            <array><string>public.default</string><string>glyphs</string></array>\n\
            <array><string>background</string><string>glyphs.background</string></array>\n\
            </array>\n</plist>\n";
        fs::write(dir.path().join("layercontents.plist"), xml).expect("write layer manifest");

        let layers = UfoVersion::V3
            .resolve_layers(dir.path())
            .expect("well-formed layer manifest loads");

        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].directory, "glyphs");
        assert_eq!(layers[1].name, "background");
        assert_eq!(layers[1].directory, "glyphs.background");
    }

    #[test]
    fn v3_empty_layer_manifest_is_rejected() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
            <plist version=\"1.0\">\n<array/>\n</plist>\n";
        fs::write(dir.path().join("layercontents.plist"), xml).expect("write layer manifest");

        assert!(UfoVersion::V3.resolve_layers(dir.path()).is_err());
    }

    #[test]
    fn mandatory_files_differ_by_version() {
        let root = Path::new("/tmp/test.ufo");
        let layers = vec![GlyphLayer {
            name: DEFAULT_LAYER_NAME.to_string(),
            directory: DEFAULT_GLYPHS_DIR.to_string(),
        }];

        let v2 = UfoVersion::V2.mandatory_files(root, &layers);
        assert_eq!(v2.len(), 2);
        assert!(v2.iter().any(|p| p.ends_with("metainfo.plist")));
        assert!(v2.iter().any(|p| p.ends_with("glyphs/contents.plist")));

        let v3 = UfoVersion::V3.mandatory_files(root, &layers);
        assert_eq!(v3.len(), 3);
        assert!(v3.iter().any(|p| p.ends_with("layercontents.plist")));
    }
}
