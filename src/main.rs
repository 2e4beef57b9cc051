mod cli;
mod layout;
mod model;
mod reader;
mod reporter;
mod rules;
mod runner;
mod util;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::model::{FailureEntry, LintRunReport, PackageReport};
use crate::reporter::Reporter;
use crate::util::{now_utc_string, write_json_pretty};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut packages = Vec::with_capacity(cli.paths.len());
    let mut fatal_halts = 0_usize;
    let mut failure_total = 0_usize;

    for path in &cli.paths {
        let mut reporter = Reporter::new();
        let outcome = runner::run_checks(path, &mut reporter);

        let format_version = outcome
            .as_ref()
            .ok()
            .map(|layout| layout.version.as_number());
        let fatal = outcome.is_err();

        match outcome {
            Ok(_) => reporter.render_failures(),
            Err(err) => {
                fatal_halts += 1;
                error!(package = %path.display(), error = %err, "fatal check failure");
            }
        }

        failure_total += reporter.failures().len();
        packages.push(PackageReport {
            path: path.display().to_string(),
            format_version,
            checks_total: reporter.checks_total(),
            passed: reporter.passed(),
            failed: reporter.failures().len(),
            fatal,
            failures: reporter
                .failures()
                .iter()
                .map(|failure| FailureEntry {
                    target: failure.target.clone(),
                    fatal: failure.fatal,
                    detail: failure.detail.clone().unwrap_or_default(),
                })
                .collect(),
        });
    }

    if let Some(report_path) = &cli.report_path {
        let report = LintRunReport {
            generated_at: now_utc_string(),
            status: if fatal_halts > 0 || failure_total > 0 {
                "failed".to_string()
            } else {
                "passed".to_string()
            },
            packages,
        };
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote lint report");
    }

    if fatal_halts > 0 {
        bail!("{fatal_halts} package(s) failed a fatal check");
    }
    if failure_total > 0 {
        bail!("{failure_total} check failure(s) recorded");
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
