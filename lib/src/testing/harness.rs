// Test harness types: TestSuiteResult, TestSuiteDesc, TestRunSummary.
// Suites are declared with define_test_suite! and handed to the runner as a slice.

use super::TestConfig;

/// Maximum number of test suites recorded in one run summary.
pub const HARNESS_MAX_SUITES: usize = 16;

/// Result of executing a single test suite.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestSuiteResult {
    pub name: &'static str,
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub elapsed_ms: u32,
}

impl TestSuiteResult {
    /// Create a new result with just the suite name set.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            total: 0,
            passed: 0,
            failed: 0,
            elapsed_ms: 0,
        }
    }

    /// Fill in results from a (passed, total) tuple and elapsed time.
    pub fn fill(&mut self, passed: u32, total: u32, elapsed_ms: u32) {
        self.total = total;
        self.passed = passed;
        self.failed = total.saturating_sub(passed);
        self.elapsed_ms = elapsed_ms;
    }

    /// Check if all tests in this suite passed.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

pub type SuiteRunnerFn = fn(&TestConfig, &mut TestSuiteResult) -> i32;

#[derive(Clone, Copy)]
pub struct TestSuiteDesc {
    pub name: &'static str,
    pub run: SuiteRunnerFn,
}

/// Aggregated results from running all test suites.
#[derive(Clone, Copy, Debug)]
pub struct TestRunSummary {
    pub suites: [TestSuiteResult; HARNESS_MAX_SUITES],
    pub suite_count: usize,
    pub total_tests: u32,
    pub passed: u32,
    pub failed: u32,
    pub elapsed_ms: u32,
}

impl Default for TestRunSummary {
    fn default() -> Self {
        Self {
            suites: [TestSuiteResult::default(); HARNESS_MAX_SUITES],
            suite_count: 0,
            total_tests: 0,
            passed: 0,
            failed: 0,
            elapsed_ms: 0,
        }
    }
}

impl TestRunSummary {
    /// Add results from a single suite to the summary.
    ///
    /// Totals always accumulate; the per-suite record is dropped once
    /// `HARNESS_MAX_SUITES` results are stored.
    pub fn add_suite_result(&mut self, result: &TestSuiteResult) {
        if let Some(slot) = self.suites.get_mut(self.suite_count) {
            *slot = *result;
            self.suite_count += 1;
        }
        self.total_tests = self.total_tests.saturating_add(result.total);
        self.passed = self.passed.saturating_add(result.passed);
        self.failed = self.failed.saturating_add(result.failed);
        self.elapsed_ms = self.elapsed_ms.saturating_add(result.elapsed_ms);
    }

    /// Check if all tests across all suites passed.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn recorded_suites(&self) -> &[TestSuiteResult] {
        &self.suites[..self.suite_count]
    }
}

/// Measure elapsed time in milliseconds between two monotonic readings.
#[inline]
pub fn measure_elapsed_ms(start_ns: u64, end_ns: u64) -> u32 {
    let ms = end_ns.saturating_sub(start_ns) / 1_000_000;
    u32::try_from(ms).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_accumulates() {
        let mut summary = TestRunSummary::default();
        let mut a = TestSuiteResult::new("a");
        a.fill(3, 3, 2);
        let mut b = TestSuiteResult::new("b");
        b.fill(1, 2, 5);
        summary.add_suite_result(&a);
        summary.add_suite_result(&b);

        assert_eq!(summary.suite_count, 2);
        assert_eq!(summary.total_tests, 5);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.elapsed_ms, 7);
        assert!(!summary.all_passed());
        assert_eq!(summary.recorded_suites()[1].name, "b");
    }

    #[test]
    fn test_elapsed_saturates() {
        assert_eq!(measure_elapsed_ms(10, 5), 0);
        assert_eq!(measure_elapsed_ms(0, 3_000_000), 3);
        assert_eq!(measure_elapsed_ms(0, u64::MAX), u32::MAX);
    }
}
