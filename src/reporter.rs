use crate::model::CheckResult;

/// Streams check outcomes as they are produced and owns the ordered
/// failure list. The reporter renders whatever it is handed; it never
/// decides fatality.
pub struct Reporter {
    failures: Vec<CheckResult>,
    checks_total: usize,
    passed: usize,
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            failures: Vec::new(),
            checks_total: 0,
            passed: 0,
        }
    }

    pub fn banner(&self, heading: &str) {
        println!();
        println!("{}", "~".repeat(heading.len()));
        println!("{heading}");
        println!("{}", "~".repeat(heading.len()));
    }

    pub fn section(&self, title: &str) {
        println!();
        println!("[{title}]");
    }

    pub fn note(&self, line: &str) {
        println!("{line}");
    }

    pub fn stream(&mut self, result: &CheckResult) {
        self.checks_total += 1;
        if result.failed {
            match result.detail.as_deref() {
                Some(detail) => println!("F  {} : {detail}", result.target),
                None => println!("F  {}", result.target),
            }
        } else {
            self.passed += 1;
            println!(".  {}", result.target);
        }
    }

    pub fn record(&mut self, result: CheckResult) {
        self.stream(&result);
        if result.failed {
            self.failures.push(result);
        }
    }

    pub fn render_failures(&self) {
        if self.failures.is_empty() {
            return;
        }

        println!();
        for failure in &self.failures {
            match failure.detail.as_deref() {
                Some(detail) => println!("[FAIL] {} : {detail}", failure.target),
                None => println!("[FAIL] {}", failure.target),
            }
        }
    }

    pub fn failures(&self) -> &[CheckResult] {
        &self.failures
    }

    pub fn checks_total(&self) -> usize {
        self.checks_total
    }

    pub fn passed(&self) -> usize {
        self.passed
    }
}

#[cfg(test)]
mod tests {
    use super::Reporter;
    use crate::model::CheckResult;

    #[test]
    fn record_retains_only_failed_results_in_order() {
        let mut reporter = Reporter::new();
        reporter.record(CheckResult::pass("a"));
        reporter.record(CheckResult::fail("b", "first failure"));
        reporter.record(CheckResult::pass("c"));
        reporter.record(CheckResult::fatal("d", "second failure"));

        let targets = reporter
            .failures()
            .iter()
            .map(|failure| failure.target.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(targets, vec!["b", "d"]);
        assert_eq!(reporter.checks_total(), 4);
        assert_eq!(reporter.passed(), 2);
    }

    #[test]
    fn stream_counts_without_retaining() {
        let mut reporter = Reporter::new();
        reporter.stream(&CheckResult::fatal("a", "halted"));

        assert!(reporter.failures().is_empty());
        assert_eq!(reporter.checks_total(), 1);
    }
}
