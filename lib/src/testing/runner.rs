use super::TestResult;

/// Run one test case and log its outcome.
///
/// Failures are logged at info level so they show up with the default
/// klog configuration; passes only at debug.
pub fn run_single_test<F>(name: &str, test: F) -> TestResult
where
    F: FnOnce() -> TestResult,
{
    let result = test();
    match result {
        TestResult::Pass => crate::klog_debug!("  PASS {}", name),
        TestResult::Skipped => crate::klog_debug!("  SKIP {}", name),
        TestResult::Fail | TestResult::Panic => crate::klog_info!("  FAIL {}", name),
    }
    result
}
