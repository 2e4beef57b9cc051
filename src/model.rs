use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub target: String,
    pub failed: bool,
    pub fatal: bool,
    pub detail: Option<String>,
}

impl CheckResult {
    pub fn pass(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            failed: false,
            fatal: false,
            detail: None,
        }
    }

    pub fn fail(target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            failed: true,
            fatal: false,
            detail: Some(detail.into()),
        }
    }

    pub fn fatal(target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            failed: true,
            fatal: true,
            detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureEntry {
    pub target: String,
    pub fatal: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    pub path: String,
    pub format_version: Option<u8>,
    pub checks_total: usize,
    pub passed: usize,
    pub failed: usize,
    pub fatal: bool,
    pub failures: Vec<FailureEntry>,
}

#[derive(Debug, Serialize)]
pub struct LintRunReport {
    pub generated_at: String,
    pub status: String,
    pub packages: Vec<PackageReport>,
}
