use plist::Value;

use crate::layout::UfoVersion;
use crate::model::CheckResult;

// Contents and Layerinfo occur once per glyph layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Metainfo,
    Fontinfo,
    Groups,
    Kerning,
    Lib,
    Layercontents,
    Contents,
    Layerinfo,
}

#[derive(Debug, Clone, Copy)]
pub enum Kind {
    NonEmptyString,
    Integer,
    IntegerIn(&'static [i64]),
    IntegerMin(i64),
    IntegerRange { min: i64, max: i64 },
    Number,
    StringIn(&'static [&'static str]),
    Dict,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub key: &'static str,
    pub kind: Kind,
    pub required: bool,
}

// Checked before any key rule.
#[derive(Debug, Clone, Copy)]
pub enum DocShape {
    Dict,
    DictOfStringArrays,
    DictOfNumberDicts,
    DictOfStrings,
    ArrayOfStringPairs,
}

pub struct FileSpec {
    pub shape: DocShape,
    pub rules: &'static [Rule],
}

const METAINFO_V2_SPEC: FileSpec = FileSpec {
    shape: DocShape::Dict,
    rules: &[
        Rule {
            key: "creator",
            kind: Kind::NonEmptyString,
            required: true,
        },
        Rule {
            key: "formatVersion",
            kind: Kind::IntegerIn(&[2, 3]),
            required: true,
        },
    ],
};

const METAINFO_V3_SPEC: FileSpec = FileSpec {
    shape: DocShape::Dict,
    rules: &[
        Rule {
            key: "creator",
            kind: Kind::NonEmptyString,
            required: true,
        },
        Rule {
            key: "formatVersion",
            kind: Kind::IntegerIn(&[2, 3]),
            required: true,
        },
        Rule {
            key: "formatVersionMinor",
            kind: Kind::IntegerMin(0),
            required: false,
        },
    ],
};

const FONTINFO_SPEC: FileSpec = FileSpec {
    shape: DocShape::Dict,
    rules: &[
        Rule {
            key: "familyName",
            kind: Kind::NonEmptyString,
            required: false,
        },
        Rule {
            key: "styleName",
            kind: Kind::NonEmptyString,
            required: false,
        },
        Rule {
            key: "styleMapStyleName",
            kind: Kind::StringIn(&["regular", "italic", "bold", "bold italic"]),
            required: false,
        },
        Rule {
            key: "unitsPerEm",
            kind: Kind::Number,
            required: false,
        },
        Rule {
            key: "ascender",
            kind: Kind::Number,
            required: false,
        },
        Rule {
            key: "descender",
            kind: Kind::Number,
            required: false,
        },
        Rule {
            key: "capHeight",
            kind: Kind::Number,
            required: false,
        },
        Rule {
            key: "xHeight",
            kind: Kind::Number,
            required: false,
        },
        Rule {
            key: "versionMajor",
            kind: Kind::Integer,
            required: false,
        },
        Rule {
            key: "versionMinor",
            kind: Kind::IntegerMin(0),
            required: false,
        },
        Rule {
            key: "openTypeOS2WeightClass",
            kind: Kind::IntegerRange { min: 1, max: 1000 },
            required: false,
        },
    ],
};

const GROUPS_SPEC: FileSpec = FileSpec {
    shape: DocShape::DictOfStringArrays,
    rules: &[],
};

const KERNING_SPEC: FileSpec = FileSpec {
    shape: DocShape::DictOfNumberDicts,
    rules: &[],
};

const LIB_SPEC: FileSpec = FileSpec {
    shape: DocShape::Dict,
    rules: &[],
};

const LAYERCONTENTS_SPEC: FileSpec = FileSpec {
    shape: DocShape::ArrayOfStringPairs,
    rules: &[],
};

const CONTENTS_SPEC: FileSpec = FileSpec {
    shape: DocShape::DictOfStrings,
    rules: &[],
};

const LAYERINFO_SPEC: FileSpec = FileSpec {
    shape: DocShape::Dict,
    rules: &[
        Rule {
            key: "color",
            kind: Kind::NonEmptyString,
            required: false,
        },
        Rule {
            key: "lib",
            kind: Kind::Dict,
            required: false,
        },
    ],
};

pub fn file_spec(kind: FileKind, version: UfoVersion) -> &'static FileSpec {
    match kind {
        FileKind::Metainfo => match version {
            UfoVersion::V2 => &METAINFO_V2_SPEC,
            UfoVersion::V3 => &METAINFO_V3_SPEC,
        },
        FileKind::Fontinfo => &FONTINFO_SPEC,
        FileKind::Groups => &GROUPS_SPEC,
        FileKind::Kerning => &KERNING_SPEC,
        FileKind::Lib => &LIB_SPEC,
        FileKind::Layercontents => &LAYERCONTENTS_SPEC,
        FileKind::Contents => &CONTENTS_SPEC,
        FileKind::Layerinfo => &LAYERINFO_SPEC,
    }
}

/// Evaluates one decoded document against its rule set and returns every
/// violation. An empty return means the file conforms.
pub fn evaluate(target: &str, doc: &Value, spec: &FileSpec) -> Vec<CheckResult> {
    let mut violations = Vec::new();

    if let Some(detail) = check_shape(doc, spec.shape) {
        violations.push(CheckResult::fail(target, detail));
        return violations;
    }

    let Some(dict) = doc.as_dictionary() else {
        return violations;
    };

    for rule in spec.rules {
        match dict.get(rule.key) {
            None if rule.required => violations.push(CheckResult::fail(
                target,
                format!("required key '{}' is missing", rule.key),
            )),
            None => {}
            Some(value) => {
                if let Some(detail) = check_kind(value, rule.kind) {
                    violations.push(CheckResult::fail(
                        target,
                        format!("key '{}' {detail}", rule.key),
                    ));
                }
            }
        }
    }

    violations
}

pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "array",
        Value::Dictionary(_) => "dictionary",
        Value::Boolean(_) => "boolean",
        Value::Data(_) => "data",
        Value::Date(_) => "date",
        Value::Real(_) => "real",
        Value::Integer(_) => "integer",
        Value::String(_) => "string",
        Value::Uid(_) => "uid",
        _ => "unknown",
    }
}

fn check_shape(doc: &Value, shape: DocShape) -> Option<String> {
    match shape {
        DocShape::Dict => match doc.as_dictionary() {
            Some(_) => None,
            None => Some(format!(
                "document must be a dictionary, found {}",
                value_type_name(doc)
            )),
        },
        DocShape::DictOfStrings => {
            let Some(dict) = doc.as_dictionary() else {
                return Some(format!(
                    "document must be a dictionary, found {}",
                    value_type_name(doc)
                ));
            };
            for (key, value) in dict.iter() {
                if value.as_string().is_none() {
                    return Some(format!(
                        "value for key '{key}' must be a string, found {}",
                        value_type_name(value)
                    ));
                }
            }
            None
        }
        DocShape::DictOfStringArrays => {
            let Some(dict) = doc.as_dictionary() else {
                return Some(format!(
                    "document must be a dictionary, found {}",
                    value_type_name(doc)
                ));
            };
            for (key, value) in dict.iter() {
                let Some(members) = value.as_array() else {
                    return Some(format!(
                        "value for key '{key}' must be an array of strings, found {}",
                        value_type_name(value)
                    ));
                };
                if let Some(member) = members.iter().find(|member| member.as_string().is_none()) {
                    return Some(format!(
                        "array for key '{key}' must contain only strings, found {}",
                        value_type_name(member)
                    ));
                }
            }
            None
        }
        DocShape::DictOfNumberDicts => {
            let Some(dict) = doc.as_dictionary() else {
                return Some(format!(
                    "document must be a dictionary, found {}",
                    value_type_name(doc)
                ));
            };
            for (key, value) in dict.iter() {
                let Some(inner) = value.as_dictionary() else {
                    return Some(format!(
                        "value for key '{key}' must be a dictionary of numbers, found {}",
                        value_type_name(value)
                    ));
                };
                for (inner_key, inner_value) in inner.iter() {
                    if !is_number(inner_value) {
                        return Some(format!(
                            "value for '{key}' / '{inner_key}' must be a number, found {}",
                            value_type_name(inner_value)
                        ));
                    }
                }
            }
            None
        }
        DocShape::ArrayOfStringPairs => {
            let Some(entries) = doc.as_array() else {
                return Some(format!(
                    "document must be an array, found {}",
                    value_type_name(doc)
                ));
            };
            for (index, entry) in entries.iter().enumerate() {
                let Some(pair) = entry.as_array() else {
                    return Some(format!(
                        "entry {index} must be a [name, directory] pair, found {}",
                        value_type_name(entry)
                    ));
                };
                if pair.len() != 2 || pair.iter().any(|member| member.as_string().is_none()) {
                    return Some(format!(
                        "entry {index} must be a pair of two strings"
                    ));
                }
            }
            None
        }
    }
}

fn check_kind(value: &Value, kind: Kind) -> Option<String> {
    match kind {
        Kind::NonEmptyString => match value.as_string() {
            Some(text) if !text.is_empty() => None,
            Some(_) => Some("must be a non-empty string".to_string()),
            None => Some(format!(
                "must be a non-empty string, found {}",
                value_type_name(value)
            )),
        },
        Kind::Integer => match as_signed_integer(value) {
            Some(_) => None,
            None => Some(format!(
                "must be an integer, found {}",
                value_type_name(value)
            )),
        },
        Kind::IntegerIn(allowed) => match as_signed_integer(value) {
            Some(actual) if allowed.contains(&actual) => None,
            Some(actual) => Some(format!("must be one of {allowed:?}, found {actual}")),
            None => Some(format!(
                "must be an integer, found {}",
                value_type_name(value)
            )),
        },
        Kind::IntegerMin(min) => match as_signed_integer(value) {
            Some(actual) if actual >= min => None,
            Some(actual) => Some(format!("must be an integer >= {min}, found {actual}")),
            None => Some(format!(
                "must be an integer, found {}",
                value_type_name(value)
            )),
        },
        Kind::IntegerRange { min, max } => match as_signed_integer(value) {
            Some(actual) if (min..=max).contains(&actual) => None,
            Some(actual) => Some(format!("must be an integer in {min}..={max}, found {actual}")),
            None => Some(format!(
                "must be an integer, found {}",
                value_type_name(value)
            )),
        },
        Kind::Number => {
            if is_number(value) {
                None
            } else {
                Some(format!(
                    "must be a number, found {}",
                    value_type_name(value)
                ))
            }
        }
        Kind::StringIn(allowed) => match value.as_string() {
            Some(text) if allowed.contains(&text) => None,
            Some(text) => Some(format!("must be one of {allowed:?}, found '{text}'")),
            None => Some(format!(
                "must be a string, found {}",
                value_type_name(value)
            )),
        },
        Kind::Dict => match value.as_dictionary() {
            Some(_) => None,
            None => Some(format!(
                "must be a dictionary, found {}",
                value_type_name(value)
            )),
        },
    }
}

fn is_number(value: &Value) -> bool {
    matches!(value, Value::Integer(_) | Value::Real(_))
}

fn as_signed_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(integer) => integer.as_signed(),
        _ => None,
    }
}
