#![no_std]

#[cfg(test)]
extern crate std;

pub use kfd_lib::testing::{
    HARNESS_MAX_SUITES, TestConfig, TestRunSummary, TestSuiteDesc, TestSuiteResult, Verbosity,
    config_from_cmdline, measure_elapsed_ms,
};
use kfd_lib::{clock, klog_debug, klog_info};

pub const TESTS_MAX_SUITES: usize = HARNESS_MAX_SUITES;

/// Every in-kernel suite, in run order.
pub static BUILTIN_SUITES: [&TestSuiteDesc; 3] = [
    &kfd_fs::tests::VFS_SUITE_DESC,
    &kfd_fs::tests::FILEIO_SUITE_DESC,
    &kfd_core::tests::SYSCALL_SUITE_DESC,
];

/// Run `suites` in order and collect their results.
pub fn tests_run_all(config: &TestConfig, suites: &[&TestSuiteDesc]) -> TestRunSummary {
    let mut summary = TestRunSummary::default();
    if !config.enabled {
        klog_info!("TESTS: Harness disabled");
        return summary;
    }

    klog_info!("TESTS: Starting {} test suites", suites.len());

    let start = clock::monotonic_ns();
    for (idx, desc) in suites.iter().enumerate() {
        if config.verbosity == Verbosity::Verbose {
            klog_info!("TESTS: running suite '{}'", desc.name);
        }

        let mut res = TestSuiteResult::new(desc.name);
        let rc = (desc.run)(config, &mut res);

        if config.verbosity != Verbosity::Quiet {
            klog_info!(
                "SUITE{} {} total={} pass={} fail={} elapsed={}ms",
                idx,
                res.name,
                res.total,
                res.passed,
                res.failed,
                res.elapsed_ms,
            );
        }
        summary.add_suite_result(&res);

        if rc != 0 && config.stop_on_failure {
            klog_info!("TESTS: stopping after failed suite '{}'", desc.name);
            break;
        }
    }
    let overall_ms = measure_elapsed_ms(start, clock::monotonic_ns());
    if overall_ms > summary.elapsed_ms {
        summary.elapsed_ms = overall_ms;
    }

    klog_info!(
        "TESTS SUMMARY: total={} passed={} failed={} elapsed_ms={}",
        summary.total_tests,
        summary.passed,
        summary.failed,
        summary.elapsed_ms,
    );
    summary
}

/// Run the built-in suites if `itests=on` is present on `cmdline`.
pub fn tests_run_from_cmdline(cmdline: Option<&str>) -> TestRunSummary {
    let config = config_from_cmdline(cmdline);
    klog_debug!("TESTS: verbosity={}", config.verbosity);
    tests_run_all(&config, &BUILTIN_SUITES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kfd_lib::testing::TestResult;
    use kfd_lib::{define_test_suite, fail, pass};

    fn ok() -> TestResult {
        pass!()
    }

    fn broken() -> TestResult {
        fail!("deliberate")
    }

    define_test_suite!(good, [ok, ok]);
    define_test_suite!(bad, [ok, broken]);

    fn enabled() -> TestConfig {
        TestConfig {
            enabled: true,
            ..TestConfig::default()
        }
    }

    #[test]
    fn test_builtin_suites_pass() {
        let summary = tests_run_all(&enabled(), &BUILTIN_SUITES);
        for suite in summary.recorded_suites() {
            assert_eq!(suite.failed, 0, "suite {} failed", suite.name);
        }
        assert_eq!(summary.suite_count, BUILTIN_SUITES.len());
        assert!(summary.total_tests > 0);
        assert!(summary.all_passed());
    }

    #[test]
    fn test_disabled_runs_nothing() {
        let summary = tests_run_all(&TestConfig::default(), &[&GOOD_SUITE_DESC]);
        assert_eq!(summary.suite_count, 0);
        assert_eq!(summary.total_tests, 0);

        let summary = tests_run_from_cmdline(Some("itests=off"));
        assert_eq!(summary.suite_count, 0);
    }

    #[test]
    fn test_failures_counted() {
        let summary = tests_run_all(&enabled(), &[&BAD_SUITE_DESC, &GOOD_SUITE_DESC]);
        assert_eq!(summary.suite_count, 2);
        assert_eq!(summary.total_tests, 4);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_passed());
    }

    #[test]
    fn test_stop_on_failure() {
        let config = TestConfig {
            stop_on_failure: true,
            ..enabled()
        };
        let summary = tests_run_all(&config, &[&BAD_SUITE_DESC, &GOOD_SUITE_DESC]);
        assert_eq!(summary.suite_count, 1);
        assert_eq!(summary.recorded_suites()[0].name, "bad");
    }
}
